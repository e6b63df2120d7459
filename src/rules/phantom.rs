//! Known-good member tables for standard-library modules.
//!
//! A call `alias.member(` on an imported module whose `member` is missing from
//! the module's set is a phantom API. Sets list every public callable (and, for
//! Node modules, every named export) of the module on current runtimes,
//! including deprecated ones; deprecation is reported by a separate table.

use lazy_static::lazy_static;
use phf::phf_set;
use regex::Regex;

use crate::language::Language;
use crate::scope::LineIndex;

pub type MemberSet = phf::Set<&'static str>;

// --- Node.js -------------------------------------------------------------

static NODE_FS: MemberSet = phf_set! {
    "access", "accessSync", "appendFile", "appendFileSync", "chmod", "chmodSync",
    "chown", "chownSync", "close", "closeSync", "constants", "copyFile",
    "copyFileSync", "cp", "cpSync", "createReadStream", "createWriteStream",
    "exists", "existsSync", "fchmod", "fchmodSync", "fchown", "fchownSync",
    "fdatasync", "fdatasyncSync", "fstat", "fstatSync", "fsync", "fsyncSync",
    "ftruncate", "ftruncateSync", "futimes", "futimesSync", "glob", "globSync",
    "lchmod", "lchmodSync", "lchown", "lchownSync", "link", "linkSync", "lstat",
    "lstatSync", "lutimes", "lutimesSync", "mkdir", "mkdirSync", "mkdtemp",
    "mkdtempSync", "open", "openSync", "openAsBlob", "opendir", "opendirSync",
    "promises", "read", "readSync", "readdir", "readdirSync", "readFile",
    "readFileSync", "readlink", "readlinkSync", "readv", "readvSync", "realpath",
    "realpathSync", "rename", "renameSync", "rm", "rmSync", "rmdir", "rmdirSync",
    "stat", "statSync", "statfs", "statfsSync", "symlink", "symlinkSync",
    "truncate", "truncateSync", "unlink", "unlinkSync", "unwatchFile", "utimes",
    "utimesSync", "watch", "watchFile", "write", "writeSync", "writeFile",
    "writeFileSync", "writev", "writevSync", "Dir", "Dirent", "ReadStream",
    "Stats", "StatFs", "WriteStream", "F_OK", "R_OK", "W_OK", "X_OK",
};

static NODE_FS_PROMISES: MemberSet = phf_set! {
    "access", "appendFile", "chmod", "chown", "constants", "copyFile", "cp",
    "glob", "lchmod", "lchown", "lutimes", "link", "lstat", "mkdir", "mkdtemp",
    "open", "opendir", "readdir", "readFile", "readlink", "realpath", "rename",
    "rm", "rmdir", "stat", "statfs", "symlink", "truncate", "unlink", "utimes",
    "watch", "writeFile",
};

static NODE_PATH: MemberSet = phf_set! {
    "basename", "delimiter", "dirname", "extname", "format", "isAbsolute", "join",
    "matchesGlob", "normalize", "parse", "posix", "relative", "resolve", "sep",
    "toNamespacedPath", "win32",
};

static NODE_CRYPTO: MemberSet = phf_set! {
    "checkPrime", "checkPrimeSync", "constants", "createCipher", "createCipheriv",
    "createDecipher", "createDecipheriv", "createDiffieHellman",
    "createDiffieHellmanGroup", "createECDH", "createHash", "createHmac",
    "createPrivateKey", "createPublicKey", "createSecretKey", "createSign",
    "createVerify", "diffieHellman", "generateKey", "generateKeyPair",
    "generateKeyPairSync", "generateKeySync", "generatePrime", "generatePrimeSync",
    "getCipherInfo", "getCiphers", "getCurves", "getDiffieHellman", "getFips",
    "getHashes", "getRandomValues", "hash", "hkdf", "hkdfSync", "pbkdf2",
    "pbkdf2Sync", "privateDecrypt", "privateEncrypt", "pseudoRandomBytes",
    "publicDecrypt", "publicEncrypt", "randomBytes", "randomFill",
    "randomFillSync", "randomInt", "randomUUID", "scrypt", "scryptSync",
    "secureHeapUsed", "setEngine", "setFips", "sign", "subtle",
    "timingSafeEqual", "verify", "webcrypto", "Certificate", "Cipher",
    "Decipher", "DiffieHellman", "DiffieHellmanGroup", "ECDH", "Hash", "Hmac",
    "KeyObject", "Sign", "Verify", "X509Certificate",
};

static NODE_OS: MemberSet = phf_set! {
    "EOL", "arch", "availableParallelism", "constants", "cpus", "devNull",
    "endianness", "freemem", "getPriority", "homedir", "hostname", "loadavg",
    "machine", "networkInterfaces", "platform", "release", "setPriority",
    "tmpdir", "totalmem", "type", "uptime", "userInfo", "version",
};

static NODE_CHILD_PROCESS: MemberSet = phf_set! {
    "ChildProcess", "exec", "execFile", "execFileSync", "execSync", "fork",
    "spawn", "spawnSync",
};

static NODE_UTIL: MemberSet = phf_set! {
    "MIMEParams", "MIMEType", "TextDecoder", "TextEncoder", "_extend", "aborted",
    "callbackify", "debug", "debuglog", "deprecate", "error", "format",
    "formatWithOptions", "getCallSite", "getCallSites", "getSystemErrorMap",
    "getSystemErrorMessage", "getSystemErrorName", "inherits", "inspect",
    "isArray", "isBoolean", "isBuffer", "isDate", "isDeepStrictEqual", "isError",
    "isFunction", "isNull", "isNullOrUndefined", "isNumber", "isObject",
    "isPrimitive", "isRegExp", "isString", "isSymbol", "isUndefined", "log",
    "parseArgs", "parseEnv", "print", "promisify", "puts",
    "stripVTControlCharacters", "styleText", "toUSVString",
    "transferableAbortController", "transferableAbortSignal", "types",
};

// --- Python --------------------------------------------------------------

static PY_OS: MemberSet = phf_set! {
    "DirEntry", "PathLike", "_exit", "abort", "access", "add_dll_directory",
    "chdir", "chflags", "chmod", "chown", "chroot", "close", "closerange",
    "confstr", "cpu_count", "ctermid", "device_encoding", "dup", "dup2",
    "execl", "execle", "execlp", "execlpe", "execv", "execve", "execvp",
    "execvpe", "fchdir", "fchmod", "fchown", "fdatasync", "fdopen", "fork",
    "forkpty", "fpathconf", "fsdecode", "fsencode", "fspath", "fstat",
    "fstatvfs", "fsync", "ftruncate", "fwalk", "get_blocking", "get_exec_path",
    "get_inheritable", "get_terminal_size", "getcwd", "getcwdb", "getegid",
    "getenv", "getenvb", "geteuid", "getgid", "getgrouplist", "getgroups",
    "getloadavg", "getlogin", "getpgid", "getpgrp", "getpid", "getppid",
    "getpriority", "getrandom", "getresgid", "getresuid", "getsid", "getuid",
    "getxattr", "initgroups", "isatty", "kill", "killpg", "lchmod", "lchown",
    "link", "listdir", "listdrives", "listmounts", "listvolumes", "listxattr",
    "lockf", "lseek", "lstat", "major", "makedev", "makedirs", "memfd_create",
    "minor", "mkdir", "mkfifo", "mknod", "nice", "open", "openpty", "pathconf",
    "pidfd_open", "pipe", "pipe2", "popen", "posix_fadvise", "posix_fallocate",
    "posix_spawn", "posix_spawnp", "pread", "process_cpu_count", "putenv",
    "pwrite", "read", "readlink", "readv", "register_at_fork", "remove",
    "removedirs", "removexattr", "rename", "renames", "replace", "rmdir",
    "scandir", "sched_getaffinity", "sched_setaffinity", "sched_yield",
    "sendfile", "set_blocking", "set_inheritable", "setegid", "seteuid",
    "setgid", "setgroups", "setpgid", "setpgrp", "setpriority", "setregid",
    "setresgid", "setresuid", "setreuid", "setsid", "setuid", "setxattr",
    "spawnl", "spawnle", "spawnlp", "spawnlpe", "spawnv", "spawnve", "spawnvp",
    "spawnvpe", "startfile", "stat", "statvfs", "strerror", "symlink", "sync",
    "sysconf", "system", "tcgetpgrp", "tcsetpgrp", "times", "truncate",
    "ttyname", "umask", "uname", "unlink", "unsetenv", "unshare", "urandom",
    "utime", "wait", "wait3", "wait4", "waitid", "waitpid",
    "waitstatus_to_exitcode", "walk", "write", "writev",
};

static PY_OS_PATH: MemberSet = phf_set! {
    "abspath", "basename", "commonpath", "commonprefix", "dirname", "exists",
    "expanduser", "expandvars", "getatime", "getctime", "getmtime", "getsize",
    "isabs", "isdevdrive", "isdir", "isfile", "isjunction", "islink", "ismount",
    "join", "lexists", "normcase", "normpath", "realpath", "relpath",
    "samefile", "sameopenfile", "samestat", "split", "splitdrive", "splitext",
    "splitroot",
};

static PY_JSON: MemberSet = phf_set! {
    "JSONDecodeError", "JSONDecoder", "JSONEncoder", "dump", "dumps", "load",
    "loads",
};

static PY_RE: MemberSet = phf_set! {
    "Match", "Pattern", "compile", "error", "escape", "findall", "finditer",
    "fullmatch", "match", "purge", "search", "split", "sub", "subn", "template",
};

static PY_SYS: MemberSet = phf_set! {
    "_clear_type_cache", "_getframe", "activate_stack_trampoline",
    "addaudithook", "audit", "breakpointhook", "call_tracing",
    "deactivate_stack_trampoline", "displayhook", "exc_info", "excepthook",
    "exception", "exit", "get_asyncgen_hooks",
    "get_coroutine_origin_tracking_depth", "get_int_max_str_digits",
    "getallocatedblocks", "getdefaultencoding", "getdlopenflags",
    "getfilesystemencodeerrors", "getfilesystemencoding", "getprofile",
    "getrecursionlimit", "getrefcount", "getsizeof", "getswitchinterval",
    "gettrace", "getunicodeinternedsize", "getwindowsversion", "intern",
    "is_finalizing", "is_stack_trampoline_active", "set_asyncgen_hooks",
    "set_coroutine_origin_tracking_depth", "set_int_max_str_digits",
    "setdlopenflags", "setprofile", "setrecursionlimit", "setswitchinterval",
    "settrace", "unraisablehook",
};

static PY_SUBPROCESS: MemberSet = phf_set! {
    "CalledProcessError", "CompletedProcess", "Popen", "STARTUPINFO",
    "SubprocessError", "TimeoutExpired", "call", "check_call", "check_output",
    "getoutput", "getstatusoutput", "list2cmdline", "run",
};

static PY_TIME: MemberSet = phf_set! {
    "asctime", "clock_getres", "clock_gettime", "clock_gettime_ns",
    "clock_settime", "clock_settime_ns", "ctime", "get_clock_info", "gmtime",
    "localtime", "mktime", "monotonic", "monotonic_ns", "perf_counter",
    "perf_counter_ns", "process_time", "process_time_ns",
    "pthread_getcpuclockid", "sleep", "strftime", "strptime", "struct_time",
    "thread_time", "thread_time_ns", "time", "time_ns", "tzset",
};

static PY_MATH: MemberSet = phf_set! {
    "acos", "acosh", "asin", "asinh", "atan", "atan2", "atanh", "cbrt", "ceil",
    "comb", "copysign", "cos", "cosh", "degrees", "dist", "erf", "erfc", "exp",
    "exp2", "expm1", "fabs", "factorial", "floor", "fma", "fmod", "frexp",
    "fsum", "gamma", "gcd", "hypot", "isclose", "isfinite", "isinf", "isnan",
    "isqrt", "lcm", "ldexp", "lgamma", "log", "log10", "log1p", "log2", "modf",
    "nextafter", "perm", "pow", "prod", "radians", "remainder", "sin", "sinh",
    "sqrt", "sumprod", "tan", "tanh", "trunc", "ulp",
};

static PY_RANDOM: MemberSet = phf_set! {
    "Random", "SystemRandom", "betavariate", "binomialvariate", "choice",
    "choices", "expovariate", "gammavariate", "gauss", "getrandbits",
    "getstate", "lognormvariate", "normalvariate", "paretovariate", "randbytes",
    "randint", "random", "randrange", "sample", "seed", "setstate", "shuffle",
    "triangular", "uniform", "vonmisesvariate", "weibullvariate",
};

static PY_SHUTIL: MemberSet = phf_set! {
    "Error", "SameFileError", "chown", "copy", "copy2", "copyfile",
    "copyfileobj", "copymode", "copystat", "copytree", "disk_usage",
    "get_archive_formats", "get_terminal_size", "get_unpack_formats",
    "ignore_patterns", "make_archive", "move", "register_archive_format",
    "register_unpack_format", "rmtree", "unpack_archive",
    "unregister_archive_format", "unregister_unpack_format", "which",
};

static PY_HASHLIB: MemberSet = phf_set! {
    "blake2b", "blake2s", "file_digest", "md5", "new", "pbkdf2_hmac", "scrypt",
    "sha1", "sha224", "sha256", "sha384", "sha3_224", "sha3_256", "sha3_384",
    "sha3_512", "sha512", "shake_128", "shake_256",
};

// --- Go ------------------------------------------------------------------

static GO_STRINGS: MemberSet = phf_set! {
    "Builder", "Clone", "Compare", "Contains", "ContainsAny", "ContainsFunc",
    "ContainsRune", "Count", "Cut", "CutPrefix", "CutSuffix", "EqualFold",
    "Fields", "FieldsFunc", "FieldsFuncSeq", "FieldsSeq", "HasPrefix",
    "HasSuffix", "Index", "IndexAny", "IndexByte", "IndexFunc", "IndexRune",
    "Join", "LastIndex", "LastIndexAny", "LastIndexByte", "LastIndexFunc",
    "Lines", "Map", "NewReader", "NewReplacer", "Reader", "Repeat", "Replace",
    "ReplaceAll", "Replacer", "Split", "SplitAfter", "SplitAfterN",
    "SplitAfterSeq", "SplitN", "SplitSeq", "Title", "ToLower",
    "ToLowerSpecial", "ToTitle", "ToTitleSpecial", "ToUpper", "ToUpperSpecial",
    "ToValidUTF8", "Trim", "TrimFunc", "TrimLeft", "TrimLeftFunc", "TrimPrefix",
    "TrimRight", "TrimRightFunc", "TrimSpace", "TrimSuffix",
};

static GO_FMT: MemberSet = phf_set! {
    "Append", "Appendf", "Appendln", "Errorf", "FormatString", "Formatter",
    "Fprint", "Fprintf", "Fprintln", "Fscan", "Fscanf", "Fscanln", "GoStringer",
    "Print", "Printf", "Println", "Scan", "ScanState", "Scanf", "Scanln",
    "Scanner", "Sprint", "Sprintf", "Sprintln", "Sscan", "Sscanf", "Sscanln",
    "State", "Stringer",
};

static GO_OS: MemberSet = phf_set! {
    "Chdir", "Chmod", "Chown", "Chtimes", "Clearenv", "CopyFS", "Create",
    "CreateTemp", "DirEntry", "DirFS", "Environ", "Executable", "Exit", "Expand",
    "ExpandEnv", "File", "FileInfo", "FileMode", "FindProcess", "Getegid",
    "Getenv", "Geteuid", "Getgid", "Getgroups", "Getpagesize", "Getpid",
    "Getppid", "Getuid", "Getwd", "Hostname", "IsExist", "IsNotExist",
    "IsPathSeparator", "IsPermission", "IsTimeout", "Lchown", "Link",
    "LookupEnv", "Lstat", "Mkdir", "MkdirAll", "MkdirTemp", "NewFile",
    "NewSyscallError", "Open", "OpenFile", "OpenInRoot", "OpenRoot", "Pipe",
    "ProcAttr", "Process", "ProcessState", "ReadDir", "ReadFile", "Readlink",
    "Remove", "RemoveAll", "Rename", "Root", "SameFile", "Setenv", "Signal",
    "StartProcess", "Stat", "Symlink", "TempDir", "Truncate", "Unsetenv",
    "UserCacheDir", "UserConfigDir", "UserHomeDir", "WriteFile",
};

static GO_STRCONV: MemberSet = phf_set! {
    "AppendBool", "AppendFloat", "AppendInt", "AppendQuote", "AppendQuoteRune",
    "AppendQuoteRuneToASCII", "AppendQuoteRuneToGraphic", "AppendQuoteToASCII",
    "AppendQuoteToGraphic", "AppendUint", "Atoi", "CanBackquote", "FormatBool",
    "FormatComplex", "FormatFloat", "FormatInt", "FormatUint", "IsGraphic",
    "IsPrint", "Itoa", "NumError", "ParseBool", "ParseComplex", "ParseFloat",
    "ParseInt", "ParseUint", "Quote", "QuoteRune", "QuoteRuneToASCII",
    "QuoteRuneToGraphic", "QuoteToASCII", "QuoteToGraphic", "QuotedPrefix",
    "Unquote", "UnquoteChar",
};

static GO_ERRORS: MemberSet = phf_set! {
    "As", "ErrUnsupported", "Is", "Join", "New", "Unwrap",
};

/// Member set for a module as imported in `language`, if the module is covered.
pub fn known_members(language: Language, module: &str) -> Option<&'static MemberSet> {
    match language {
        Language::JavaScript | Language::TypeScript => {
            let module = module.strip_prefix("node:").unwrap_or(module);
            match module {
                "fs" => Some(&NODE_FS),
                "fs/promises" => Some(&NODE_FS_PROMISES),
                "path" | "path/posix" | "path/win32" => Some(&NODE_PATH),
                "crypto" => Some(&NODE_CRYPTO),
                "os" => Some(&NODE_OS),
                "child_process" => Some(&NODE_CHILD_PROCESS),
                "util" => Some(&NODE_UTIL),
                _ => None,
            }
        }
        Language::Python => match module {
            "os" => Some(&PY_OS),
            "os.path" | "posixpath" | "ntpath" => Some(&PY_OS_PATH),
            "json" => Some(&PY_JSON),
            "re" => Some(&PY_RE),
            "sys" => Some(&PY_SYS),
            "subprocess" => Some(&PY_SUBPROCESS),
            "time" => Some(&PY_TIME),
            "math" => Some(&PY_MATH),
            "random" => Some(&PY_RANDOM),
            "shutil" => Some(&PY_SHUTIL),
            "hashlib" => Some(&PY_HASHLIB),
            _ => None,
        },
        Language::Go => match module {
            "strings" => Some(&GO_STRINGS),
            "fmt" => Some(&GO_FMT),
            "os" => Some(&GO_OS),
            "strconv" => Some(&GO_STRCONV),
            "errors" => Some(&GO_ERRORS),
            _ => None,
        },
        _ => None,
    }
}

/// A covered module bound to a local name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleAlias {
    pub alias: String,
    pub module: String,
    /// 1-based line of the import.
    pub line: usize,
}

/// A name imported directly out of a covered module (`import { x } from 'fs'`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedImport {
    pub name: String,
    pub module: String,
    pub line: usize,
}

lazy_static! {
    static ref JS_NAMESPACE_IMPORT: Regex = Regex::new(
        r#"(?m)^\s*import\s+\*\s+as\s+([\w$]+)\s+from\s+["']([^"']+)["']"#
    ).unwrap();
    static ref JS_DEFAULT_IMPORT: Regex = Regex::new(
        r#"(?m)^\s*import\s+([\w$]+)\s*(?:,\s*\{[^}]*\})?\s+from\s+["']([^"']+)["']"#
    ).unwrap();
    static ref JS_REQUIRE: Regex = Regex::new(
        r#"(?m)^\s*(?:const|let|var|import)\s+([\w$]+)\s*=\s*require\(\s*["']([^"']+)["']\s*\)\s*;?\s*$"#
    ).unwrap();
    static ref JS_NAMED_IMPORT: Regex = Regex::new(
        r#"(?m)^\s*import\s+(?:[\w$]+\s*,\s*)?\{([^}]*)\}\s*from\s+["']([^"']+)["']"#
    ).unwrap();
    static ref JS_DESTRUCTURED_REQUIRE: Regex = Regex::new(
        r#"(?m)^\s*(?:const|let|var)\s+\{([^}]*)\}\s*=\s*require\(\s*["']([^"']+)["']\s*\)"#
    ).unwrap();

    static ref PY_IMPORT: Regex = Regex::new(
        r"(?m)^[ \t]*import[ \t]+([\w.]+(?:[ \t]+as[ \t]+\w+)?(?:[ \t]*,[ \t]*[\w.]+(?:[ \t]+as[ \t]+\w+)?)*)"
    ).unwrap();
    static ref PY_FROM_IMPORT: Regex = Regex::new(
        r"(?m)^[ \t]*from[ \t]+([\w.]+)[ \t]+import[ \t]+(\w+(?:[ \t]+as[ \t]+\w+)?(?:[ \t]*,[ \t]*\w+(?:[ \t]+as[ \t]+\w+)?)*)"
    ).unwrap();

    static ref GO_SINGLE_IMPORT: Regex = Regex::new(
        r#"(?m)^\s*import\s+(?:([\w.]+)\s+)?"([^"]+)""#
    ).unwrap();
    static ref GO_IMPORT_BLOCK: Regex = Regex::new(r"(?s)\bimport\s*\((.*?)\)").unwrap();
    static ref GO_BLOCK_ENTRY: Regex = Regex::new(r#"^\s*(?:([\w.]+)\s+)?"([^"]+)""#).unwrap();
}

/// Covered modules bound to local names in `content`.
///
/// Only modules with a member table are returned; anything else cannot be
/// judged and is ignored.
pub fn module_aliases(language: Language, content: &str) -> Vec<ModuleAlias> {
    let index = LineIndex::new(content);
    let mut out = Vec::new();
    let mut push = |alias: &str, module: &str, offset: usize| {
        if known_members(language, module).is_some() {
            out.push(ModuleAlias {
                alias: alias.to_string(),
                module: module.to_string(),
                line: index.line_of(offset) + 1,
            });
        }
    };

    match language {
        Language::JavaScript | Language::TypeScript => {
            for re in [&*JS_NAMESPACE_IMPORT, &*JS_DEFAULT_IMPORT, &*JS_REQUIRE] {
                for caps in re.captures_iter(content) {
                    push(&caps[1], &caps[2], caps.get(0).map_or(0, |m| m.start()));
                }
            }
        }
        Language::Python => {
            for caps in PY_IMPORT.captures_iter(content) {
                let offset = caps.get(0).map_or(0, |m| m.start());
                for item in caps[1].split(',') {
                    let (module, alias) = split_as(item);
                    match alias {
                        Some(alias) => push(alias, module, offset),
                        None => {
                            push(module, module, offset);
                            // `import os` also makes `os.path` reachable.
                            if module == "os" {
                                push("os.path", "os.path", offset);
                            }
                        }
                    }
                }
            }
            for caps in PY_FROM_IMPORT.captures_iter(content) {
                let offset = caps.get(0).map_or(0, |m| m.start());
                let package = &caps[1];
                for item in caps[2].split(',') {
                    let (name, alias) = split_as(item);
                    let module = format!("{}.{}", package, name);
                    push(alias.unwrap_or(name), &module, offset);
                }
            }
        }
        Language::Go => {
            let mut push_go = |alias: Option<&str>, path: &str, offset: usize| {
                let alias = match alias {
                    Some("_") | Some(".") => return,
                    Some(a) => a,
                    None => path.rsplit('/').next().unwrap_or(path),
                };
                push(alias, path, offset);
            };
            for caps in GO_SINGLE_IMPORT.captures_iter(content) {
                push_go(
                    caps.get(1).map(|m| m.as_str()),
                    &caps[2],
                    caps.get(0).map_or(0, |m| m.start()),
                );
            }
            for block in GO_IMPORT_BLOCK.captures_iter(content) {
                let Some(body) = block.get(1) else { continue };
                let mut offset = body.start();
                for line in body.as_str().split('\n') {
                    if let Some(caps) = GO_BLOCK_ENTRY.captures(line) {
                        push_go(caps.get(1).map(|m| m.as_str()), &caps[2], offset);
                    }
                    offset += line.len() + 1;
                }
            }
        }
        _ => {}
    }

    out.sort_by(|a, b| a.line.cmp(&b.line).then_with(|| a.alias.cmp(&b.alias)));
    out.dedup_by(|a, b| a.alias == b.alias && a.module == b.module);
    out
}

/// Names imported directly from covered Node modules.
pub fn named_imports(language: Language, content: &str) -> Vec<NamedImport> {
    if !language.is_js_family() {
        return Vec::new();
    }
    let index = LineIndex::new(content);
    let mut out = Vec::new();

    for re in [&*JS_NAMED_IMPORT, &*JS_DESTRUCTURED_REQUIRE] {
        for caps in re.captures_iter(content) {
            let module = &caps[2];
            if known_members(language, module).is_none() {
                continue;
            }
            let list = match caps.get(1) {
                Some(m) => m,
                None => continue,
            };
            let mut offset = list.start();
            for item in list.as_str().split(',') {
                // `a as b` in imports, `a: b` in destructuring; the exported name comes first.
                let name = item
                    .trim()
                    .trim_start_matches("type ")
                    .split(|c: char| c.is_whitespace() || c == ':')
                    .next()
                    .unwrap_or("");
                if !name.is_empty() && name != "default" {
                    let lead = item.len() - item.trim_start().len();
                    out.push(NamedImport {
                        name: name.to_string(),
                        module: module.to_string(),
                        line: index.line_of(offset + lead) + 1,
                    });
                }
                offset += item.len() + 1;
            }
        }
    }
    out.sort_by(|a, b| a.line.cmp(&b.line).then_with(|| a.name.cmp(&b.name)));
    out
}

fn split_as(item: &str) -> (&str, Option<&str>) {
    let mut parts = item.split_whitespace();
    let name = parts.next().unwrap_or("");
    match (parts.next(), parts.next()) {
        (Some("as"), Some(alias)) => (name, Some(alias)),
        _ => (name, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_members() {
        let fs = known_members(Language::TypeScript, "node:fs").unwrap();
        assert!(fs.contains("readFileSync"));
        assert!(!fs.contains("readFil"));
        assert!(known_members(Language::Python, "os.path").is_some());
        assert!(known_members(Language::Go, "strings").unwrap().contains("TrimSpace"));
        assert!(known_members(Language::Ruby, "json").is_none());
        assert!(known_members(Language::JavaScript, "lodash").is_none());
    }

    #[test]
    fn test_js_aliases() {
        let src = "import * as f from 'fs';\nconst p = require(\"path\");\nimport os from 'node:os';\nimport express from 'express';\n";
        let aliases = module_aliases(Language::JavaScript, src);
        let pairs: Vec<(&str, &str, usize)> = aliases
            .iter()
            .map(|a| (a.alias.as_str(), a.module.as_str(), a.line))
            .collect();
        assert_eq!(pairs, vec![("f", "fs", 1), ("p", "path", 2), ("os", "node:os", 3)]);
    }

    #[test]
    fn test_python_aliases() {
        let src = "import os, json as j\nfrom os import path as osp\nimport requests\n";
        let aliases = module_aliases(Language::Python, src);
        let names: Vec<&str> = aliases.iter().map(|a| a.alias.as_str()).collect();
        assert_eq!(names, vec!["j", "os", "os.path", "osp"]);
    }

    #[test]
    fn test_go_aliases() {
        let src = "package main\n\nimport (\n\t\"fmt\"\n\tstr \"strings\"\n\t_ \"os\"\n)\n";
        let aliases = module_aliases(Language::Go, src);
        let pairs: Vec<(&str, &str, usize)> = aliases
            .iter()
            .map(|a| (a.alias.as_str(), a.module.as_str(), a.line))
            .collect();
        assert_eq!(pairs, vec![("fmt", "fmt", 4), ("str", "strings", 5)]);
    }

    #[test]
    fn test_named_imports() {
        let src = "import {\n  readFile,\n  writeFil as w,\n} from 'fs';\nconst { join: j } = require('path');\nimport { x } from './local';\n";
        let names: Vec<(String, usize)> = named_imports(Language::TypeScript, src)
            .into_iter()
            .map(|n| (n.name, n.line))
            .collect();
        assert_eq!(
            names,
            vec![
                ("readFile".to_string(), 2),
                ("writeFil".to_string(), 3),
                ("join".to_string(), 5)
            ]
        );
    }
}
