//! Deprecated and removed API signatures, per language.
//!
//! Tables are ordered: the first rule matching a position wins, so specific
//! signatures come before general ones.

use lazy_static::lazy_static;
use regex::Regex;

use super::{compile, RuleCategory};
use crate::language::Language;

/// One deprecated API signature.
#[derive(Debug)]
pub struct DeprecatedRule {
    pub pattern: Regex,
    pub subject_module: &'static str,
    pub offending_name: &'static str,
    pub reason: &'static str,
    pub replacement: &'static str,
    pub category: RuleCategory,
}

type RuleSpec = (
    &'static str,
    &'static str,
    &'static str,
    RuleCategory,
    &'static str,
    &'static str,
);

macro_rules! rules {
    ($( $pattern:expr, $module:expr, $name:expr, $category:ident, $reason:expr, $replacement:expr; )*) => {
        vec![ $( ($pattern, $module, $name, RuleCategory::$category, $reason, $replacement) ),* ]
    };
}

fn build(table: &str, specs: Vec<RuleSpec>) -> Vec<DeprecatedRule> {
    specs
        .into_iter()
        .filter_map(|(pattern, subject_module, offending_name, category, reason, replacement)| {
            compile(pattern, table).map(|pattern| DeprecatedRule {
                pattern,
                subject_module,
                offending_name,
                reason,
                replacement,
                category,
            })
        })
        .collect()
}

lazy_static! {
    static ref JS_RULES: Vec<DeprecatedRule> = build("javascript", rules![
        r"\bnew\s+Buffer\s*\(", "buffer", "new Buffer()", Security,
            "may expose uninitialized memory (DEP0005)", "Buffer.from() / Buffer.alloc()";
        r"\bcrypto\.createCipher\s*\(", "crypto", "crypto.createCipher", Security,
            "derives keys with MD5 and no salt, and reuses IVs (DEP0106)", "crypto.createCipheriv()";
        r"\bcrypto\.createDecipher\s*\(", "crypto", "crypto.createDecipher", Security,
            "derives keys with MD5 and no salt (DEP0106)", "crypto.createDecipheriv()";
        r"\bcrypto\.pseudoRandomBytes\s*\(", "crypto", "crypto.pseudoRandomBytes", Security,
            "not cryptographically secure (DEP0115)", "crypto.randomBytes()";
        r"\btls\.createSecurePair\s*\(", "tls", "tls.createSecurePair", Security,
            "legacy TLS wrapper without modern verification (DEP0064)", "tls.TLSSocket";
        r"\bprocess\.binding\s*\(", "process", "process.binding", Security,
            "exposes internal bindings (DEP0111)", "public module APIs";
        r"\burl\.parse\s*\(", "url", "url.parse", Security,
            "inconsistent host parsing enables spoofing (DEP0169)", "new URL()";
        r#"\brequire\s*\(\s*["'](?:node:)?domain["']\s*\)"#, "domain", "domain", Deprecated,
            "the domain module is pending removal (DEP0032)", "AsyncLocalStorage / explicit error handling";
        r#"\brequire\s*\(\s*["'](?:node:)?punycode["']\s*\)"#, "punycode", "punycode", Deprecated,
            "the bundled punycode module is deprecated (DEP0040)", "the userland punycode package";
        r"\bfs\.exists\s*\(", "fs", "fs.exists", Deprecated,
            "callback does not follow the error-first convention (DEP0034)", "fs.access() / fs.existsSync()";
        r"\bfs\.rmdir(?:Sync)?\s*\([^)]*recursive\s*:\s*true", "fs", "fs.rmdir(recursive)", Deprecated,
            "recursive removal via rmdir is deprecated (DEP0147)", "fs.rm(path, { recursive: true })";
        r"\butil\.isArray\s*\(", "util", "util.isArray", Removed,
            "removed in Node.js 23 (DEP0044)", "Array.isArray()";
        r"\butil\.is(?:Boolean|Buffer|Date|Error|Function|Null|NullOrUndefined|Number|Object|Primitive|RegExp|String|Symbol|Undefined)\s*\(",
            "util", "util.is*", Removed,
            "type-check helpers were removed in Node.js 23", "typeof / instanceof checks";
        r"\butil\.(?:print|puts|debug|error|log)\s*\(", "util", "util.print/puts/debug/error/log", Removed,
            "logging helpers were removed from util", "console.log() / console.error()";
        r"\butil\._extend\s*\(", "util", "util._extend", Deprecated,
            "private helper (DEP0060)", "Object.assign()";
        r"\.getYear\s*\(\s*\)", "Date", "Date.prototype.getYear", Deprecated,
            "returns year minus 1900", "getFullYear()";
        r"\.substr\s*\(", "String", "String.prototype.substr", Deprecated,
            "legacy Annex B method", "slice() / substring()";
        r"(?:^|[^.\w$])(?:escape|unescape)\s*\(", "global", "escape/unescape", Deprecated,
            "legacy encoding functions mangle non-ASCII input", "encodeURIComponent() / decodeURIComponent()";
        r"\.__proto__\b", "Object", "__proto__", Deprecated,
            "legacy accessor", "Object.getPrototypeOf() / Object.setPrototypeOf()";
        r"\bReactDOM\.render\s*\(", "react-dom", "ReactDOM.render", Removed,
            "removed in React 19", "createRoot(container).render()";
        r"\bReactDOM\.hydrate\s*\(", "react-dom", "ReactDOM.hydrate", Removed,
            "removed in React 19", "hydrateRoot()";
        r"\bfindDOMNode\s*\(", "react-dom", "findDOMNode", Removed,
            "removed in React 19", "refs";
        r"\bcomponentWill(?:Mount|ReceiveProps|Update)\s*\(", "react", "componentWill* lifecycle", Deprecated,
            "unsafe with concurrent rendering", "componentDidMount / getDerivedStateFromProps / hooks";
    ]);

    static ref PY_RULES: Vec<DeprecatedRule> = build("python", rules![
        r"\bssl\.wrap_socket\s*\(", "ssl", "ssl.wrap_socket", Security,
            "removed in 3.12; performs no hostname verification", "ssl.SSLContext().wrap_socket()";
        r"\bssl\.PROTOCOL_(?:SSLv2|SSLv3|TLSv1|TLSv1_1)\b", "ssl", "ssl.PROTOCOL_SSLv*/TLSv1*", Security,
            "broken protocol versions", "ssl.PROTOCOL_TLS_CLIENT";
        r"\btempfile\.mktemp\s*\(", "tempfile", "tempfile.mktemp", Security,
            "race between name creation and use", "tempfile.mkstemp() / NamedTemporaryFile()";
        r"^\s*(?:import\s+imp\b|from\s+imp\s+import\b)", "imp", "imp", Removed,
            "removed in 3.12", "importlib";
        r"^\s*(?:import\s+distutils\b|from\s+distutils\b)", "distutils", "distutils", Removed,
            "removed in 3.12", "setuptools / sysconfig";
        r"^\s*(?:import\s+(?:asyncore|asynchat|smtpd)\b|from\s+(?:asyncore|asynchat|smtpd)\s+import\b)",
            "asyncore", "asyncore/asynchat/smtpd", Removed, "removed in 3.12", "asyncio";
        r"^\s*(?:import\s+(?:cgi|cgitb|pipes|crypt|telnetlib|nntplib|imghdr|sndhdr)\b|from\s+(?:cgi|cgitb|pipes|crypt|telnetlib|nntplib|imghdr|sndhdr)\s+import\b)",
            "stdlib", "dead battery module", Removed, "removed in 3.13 (PEP 594)", "a maintained third-party package";
        r"\bcollections\.(?:Mapping|MutableMapping|Sequence|MutableSequence|Set|MutableSet|Iterable|Iterator|Callable|Hashable|Sized|Container)\b",
            "collections", "collections ABC aliases", Removed, "removed in 3.10", "collections.abc";
        r"\bdatetime\.utcnow\s*\(", "datetime", "datetime.utcnow", Deprecated,
            "returns a naive datetime (deprecated in 3.12)", "datetime.now(timezone.utc)";
        r"\bdatetime\.utcfromtimestamp\s*\(", "datetime", "datetime.utcfromtimestamp", Deprecated,
            "returns a naive datetime (deprecated in 3.12)", "datetime.fromtimestamp(ts, timezone.utc)";
        r"\basyncio\.get_event_loop\s*\(", "asyncio", "asyncio.get_event_loop", Deprecated,
            "implicit loop creation is deprecated", "asyncio.run() / asyncio.get_running_loop()";
        r"\binspect\.getargspec\s*\(", "inspect", "inspect.getargspec", Removed,
            "removed in 3.11", "inspect.signature()";
        r"\btime\.clock\s*\(", "time", "time.clock", Removed,
            "removed in 3.8", "time.perf_counter() / time.process_time()";
        r"\bplatform\.(?:linux_distribution|dist)\s*\(", "platform", "platform.linux_distribution", Removed,
            "removed in 3.8", "the distro package / platform.freedesktop_os_release()";
        r"\bbase64\.(?:encodestring|decodestring)\s*\(", "base64", "base64.encodestring/decodestring", Removed,
            "removed in 3.9", "base64.encodebytes() / base64.decodebytes()";
        r"\bxml\.etree\.cElementTree\b", "xml", "xml.etree.cElementTree", Removed,
            "removed in 3.9", "xml.etree.ElementTree";
        r"\blogging\.warn\s*\(", "logging", "logging.warn", Deprecated,
            "alias deprecated since 3.3", "logging.warning()";
        r"\.assert(?:Equals|NotEquals|Almost|AlmostEquals|NotAlmostEquals|RegexpMatches|RaisesRegexp|ItemsEqual)\s*\(",
            "unittest", "unittest assert aliases", Removed, "removed in 3.12", "assertEqual / assertRegex / assertCountEqual";
        r"\bos\.errno\b", "os", "os.errno", Removed,
            "removed in 3.7", "import errno";
    ]);

    static ref GO_RULES: Vec<DeprecatedRule> = build("go", rules![
        r"\bx509\.(?:IsEncryptedPEMBlock|DecryptPEMBlock|EncryptPEMBlock)\s*\(", "crypto/x509", "x509 PEM encryption", Security,
            "legacy PEM encryption is insecure by design", "PKCS#8 with a modern KDF";
        r"\btls\.Version(?:SSL30|TLS10|TLS11)\b", "crypto/tls", "tls.VersionTLS10/11", Security,
            "broken protocol versions", "tls.VersionTLS12 or later";
        r"\belliptic\.(?:Marshal|Unmarshal|GenerateKey)\s*\(", "crypto/elliptic", "crypto/elliptic low-level API", Security,
            "unsafe low-level curve operations", "crypto/ecdh";
        r"\bioutil\.(?:ReadAll|ReadFile|WriteFile|ReadDir|TempFile|TempDir|NopCloser)\s*\(", "io/ioutil", "ioutil.*", Deprecated,
            "io/ioutil is deprecated since Go 1.16", "the io and os equivalents";
        r"\bioutil\.Discard\b", "io/ioutil", "ioutil.Discard", Deprecated,
            "io/ioutil is deprecated since Go 1.16", "io.Discard";
        r"\bstrings\.Title\s*\(", "strings", "strings.Title", Deprecated,
            "breaks on Unicode punctuation", "golang.org/x/text/cases";
        r"\brand\.Seed\s*\(", "math/rand", "rand.Seed", Deprecated,
            "the global source is seeded automatically since Go 1.20", "rand.New(rand.NewSource(seed))";
        r"\breflect\.(?:SliceHeader|StringHeader)\b", "reflect", "reflect.SliceHeader/StringHeader", Deprecated,
            "unsafe header types", "unsafe.Slice / unsafe.String";
        r"\bos\.SEEK_(?:SET|CUR|END)\b", "os", "os.SEEK_*", Deprecated,
            "deprecated constants", "io.SeekStart / io.SeekCurrent / io.SeekEnd";
    ]);

    static ref RUBY_RULES: Vec<DeprecatedRule> = build("ruby", rules![
        r"\bURI\.(?:escape|encode|unescape|decode)\s*[\(\s]", "URI", "URI.escape", Removed,
            "removed in Ruby 3.0", "URI.encode_www_form_component / CGI.escape";
        r"\b(?:File|Dir)\.exists\?", "File", "File.exists?", Removed,
            "removed in Ruby 3.2", "File.exist?";
        r"\b(?:Fixnum|Bignum)\b", "Integer", "Fixnum/Bignum", Removed,
            "removed in Ruby 3.2", "Integer";
        r"\.(?:taint|untaint|tainted\?|trust|untrust)\b", "Object", "taint tracking", Removed,
            "removed in Ruby 3.2", "nothing; taint tracking is gone";
    ]);

    static ref JAVA_RULES: Vec<DeprecatedRule> = build("java", rules![
        r"\bSystem\.setSecurityManager\s*\(", "java.lang", "SecurityManager", Security,
            "deprecated for removal (JEP 411)", "process isolation";
        r"\bRuntime\.runFinalizersOnExit\s*\(", "java.lang", "Runtime.runFinalizersOnExit", Removed,
            "inherently unsafe; removed", "shutdown hooks";
        r"\bnew\s+(?:Integer|Long|Short|Byte|Double|Float|Boolean|Character)\s*\(", "java.lang", "boxed constructors", Deprecated,
            "deprecated for removal", "valueOf()";
        r"\bnew\s+URL\s*\(", "java.net", "new URL(String)", Deprecated,
            "deprecated in Java 20", "URI.create(...).toURL()";
        r"\bCharacter\.isSpace\s*\(", "java.lang", "Character.isSpace", Deprecated,
            "deprecated", "Character.isWhitespace()";
        r"\.newInstance\s*\(\s*\)", "java.lang", "Class.newInstance", Deprecated,
            "bypasses checked exception handling", "getDeclaredConstructor().newInstance()";
        r"\bprotected\s+void\s+finalize\s*\(", "java.lang", "Object.finalize", Deprecated,
            "finalization is deprecated for removal (JEP 421)", "java.lang.ref.Cleaner / try-with-resources";
        r"\bThread\.currentThread\(\)\.stop\s*\(|\bThread\.(?:stop|suspend|resume)\s*\(", "java.lang", "Thread.stop", Removed,
            "inherently unsafe", "cooperative interruption";
    ]);

    static ref CSHARP_RULES: Vec<DeprecatedRule> = build("csharp", rules![
        r"\bBinaryFormatter\b", "System.Runtime.Serialization", "BinaryFormatter", Security,
            "deserialization of untrusted data allows code execution (SYSLIB0011)", "System.Text.Json";
        r"\bnew\s+RNGCryptoServiceProvider\s*\(", "System.Security.Cryptography", "RNGCryptoServiceProvider", Security,
            "obsolete (SYSLIB0023)", "RandomNumberGenerator.Create()";
        r"\bnew\s+(?:SHA1Managed|MD5CryptoServiceProvider|SHA1CryptoServiceProvider)\s*\(", "System.Security.Cryptography", "legacy hash providers", Security,
            "obsolete weak hash implementations", "SHA256.Create()";
        r"\bnew\s+WebClient\s*\(", "System.Net", "WebClient", Deprecated,
            "obsolete (SYSLIB0014)", "HttpClient";
        r"\bWebRequest\.Create\s*\(", "System.Net", "WebRequest.Create", Deprecated,
            "obsolete (SYSLIB0014)", "HttpClient";
        r"\bThread\.Abort\s*\(|\.Abort\s*\(\s*\)\s*;", "System.Threading", "Thread.Abort", Removed,
            "throws PlatformNotSupportedException on .NET 5+", "CancellationToken";
    ]);

    static ref RUST_RULES: Vec<DeprecatedRule> = build("rust", rules![
        r"\bmem::uninitialized\s*(?:::<[^>]*>)?\s*\(", "std::mem", "mem::uninitialized", Security,
            "undefined behaviour for most types", "MaybeUninit";
        r"\btry!\s*\(", "core", "try!", Deprecated,
            "reserved keyword in edition 2018", "the ? operator";
        r"\benv::home_dir\s*\(", "std::env", "env::home_dir", Deprecated,
            "incorrect on Windows", "the home or dirs crate";
        r"\.trim_(?:left|right)(?:_matches)?\s*\(", "core::str", "trim_left/trim_right", Deprecated,
            "direction-ambiguous names", "trim_start / trim_end";
        r"\.compare_and_swap\s*\(", "core::sync::atomic", "compare_and_swap", Deprecated,
            "deprecated since 1.50", "compare_exchange / compare_exchange_weak";
        r"\bONCE_INIT\b", "std::sync", "ONCE_INIT", Deprecated,
            "deprecated constant", "Once::new()";
    ]);
}

/// The deprecated-API table for `language`, in match order.
pub fn deprecated_rules(language: Language) -> &'static [DeprecatedRule] {
    match language {
        Language::JavaScript | Language::TypeScript => &JS_RULES,
        Language::Python => &PY_RULES,
        Language::Go => &GO_RULES,
        Language::Ruby => &RUBY_RULES,
        Language::Java => &JAVA_RULES,
        Language::CSharp => &CSHARP_RULES,
        Language::Rust => &RUST_RULES,
    }
}
