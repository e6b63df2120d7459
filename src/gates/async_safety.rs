//! Async and error safety.
//!
//! Five checks share one scan:
//! - `unsafe-parse`: a parse call that throws (or returns an error) on bad
//!   input, outside any error handler of its language;
//! - `unhandled-then`: a promise chain with no rejection handler;
//! - `async-without-await`: an async function whose body never awaits;
//! - `floating-promise`: a statement that calls a local async function and
//!   drops the result;
//! - `async-promise-executor`: `new Promise(async ...)`, which swallows
//!   exceptions thrown by the executor.

use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;

use super::{fold_violations, Failure, Gate, GateContext, Provenance, Severity, Violation};
use crate::config::AsyncSafetyConfig;
use crate::language::{BlockStyle, GuardStyle, Language};
use crate::scanner::SourceFile;
use crate::scope::{
    extract_delimited, find_block, is_guarded_at, is_inside_string_literal, sanitize_line,
    BracePairs, LineIndex,
};

pub const ID: &str = "async-safety";

const LANGUAGES: &[Language] = &[
    Language::JavaScript,
    Language::TypeScript,
    Language::Python,
    Language::Ruby,
    Language::Java,
    Language::CSharp,
    Language::Go,
];

/// Header lines scanned for the `{` opening an async body.
const MAX_HEADER_LINES: usize = 4;

/// Header bytes scanned for the same `{`, for headers that never break a line.
const MAX_HEADER_BYTES: usize = 2048;

/// Lines followed when collecting a promise chain.
const MAX_CHAIN_LINES: usize = 20;

lazy_static! {
    static ref JS_PARSE: Vec<Regex> = vec![Regex::new(r"\bJSON\.parse\s*\(").unwrap()];
    static ref PY_PARSE: Vec<Regex> = vec![
        Regex::new(r"\bjson\.loads?\s*\(").unwrap(),
        Regex::new(r"\bast\.literal_eval\s*\(").unwrap(),
    ];
    static ref RUBY_PARSE: Vec<Regex> = vec![
        Regex::new(r"\bJSON\.parse\b").unwrap(),
        Regex::new(r"\b(?:Integer|Float)\(").unwrap(),
    ];
    static ref JAVA_PARSE: Vec<Regex> = vec![
        Regex::new(r"\b(?:Integer|Long|Short|Double|Float)\.(?:parse\w*|valueOf)\s*\(\s*[^)\d]").unwrap(),
        Regex::new(r"\.readValue\s*\(").unwrap(),
    ];
    static ref CSHARP_PARSE: Vec<Regex> = vec![
        Regex::new(r"\b(?:int|long|short|double|float|decimal|Int32|Int64|Guid|DateTime)\.Parse\s*\(").unwrap(),
        Regex::new(r"\bJsonSerializer\.Deserialize\b").unwrap(),
        Regex::new(r"\bJsonConvert\.DeserializeObject\b").unwrap(),
    ];
    static ref GO_PARSE: Vec<Regex> = vec![
        Regex::new(r"\bjson\.Unmarshal\s*\(").unwrap(),
        Regex::new(r"\bstrconv\.(?:Atoi|ParseInt|ParseUint|ParseFloat|ParseBool)\s*\(").unwrap(),
    ];

    static ref THEN_CALL: Regex = Regex::new(r"\.then\s*\(").unwrap();
    static ref CATCH_CALL: Regex = Regex::new(r"\.catch\s*\(").unwrap();
    /// Text before a promise expression that hands it to someone else.
    static ref HANDED_OFF: Regex =
        Regex::new(r"\b(?:return|await|yield)\b|(?:^|[^=!<>])=(?:[^=>]|$)").unwrap();
    static ref PROMISE_EXECUTOR: Regex = Regex::new(r"\bnew\s+Promise\s*\(\s*async\b").unwrap();

    static ref JS_ASYNC: Regex = Regex::new(r"\basync\b").unwrap();
    static ref JS_ASYNC_FUNCTION: Regex =
        Regex::new(r"^async\s+function\b\s*(\*)?\s*([\w$]*)").unwrap();
    static ref JS_ASYNC_ARROW: Regex =
        Regex::new(r"^async\s*(?:\([^)]*\)|[\w$]+)\s*(?::[^=;{]+)?=>").unwrap();
    static ref JS_ASYNC_METHOD: Regex = Regex::new(r"^async\s+(\*)?\s*([\w$]+)\s*\(").unwrap();
    static ref JS_BINDING: Regex = Regex::new(r"(?:const|let|var)\s+([\w$]+)\s*=\s*$").unwrap();
    static ref JS_AWAIT: Regex = Regex::new(r"\b(?:await|yield)\b").unwrap();

    static ref PY_ASYNC_DEF: Regex = Regex::new(r"(?m)^[ \t]*async[ \t]+def[ \t]+(\w+)").unwrap();
    static ref PY_AWAIT: Regex = Regex::new(r"\bawait\b|\basync\s+(?:for|with)\b|\byield\b").unwrap();

    static ref JS_CALL_STATEMENT: Regex = Regex::new(r"^\s*(?:this\.)?([\w$]+)\s*\(").unwrap();
    static ref PY_CALL_STATEMENT: Regex = Regex::new(r"^\s*(?:self\.)?(\w+)\s*\(").unwrap();
}

fn parse_calls(language: Language) -> &'static [Regex] {
    match language {
        Language::JavaScript | Language::TypeScript => &JS_PARSE,
        Language::Python => &PY_PARSE,
        Language::Ruby => &RUBY_PARSE,
        Language::Java => &JAVA_PARSE,
        Language::CSharp => &CSHARP_PARSE,
        Language::Go => &GO_PARSE,
        Language::Rust => &[],
    }
}

/// An async function declaration found in a file.
#[derive(Debug)]
struct AsyncDecl<'a> {
    name: Option<String>,
    /// 0-based header line.
    line: usize,
    /// `None` for expression-bodied arrows and bodiless declarations.
    body: Option<&'a str>,
}

pub struct AsyncSafetyGate {
    config: AsyncSafetyConfig,
}

impl AsyncSafetyGate {
    pub fn new(config: &AsyncSafetyConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    fn scan_file(&self, file: &SourceFile, language: Language, ctx: &GateContext) -> Vec<Violation> {
        let lines = file.lines();
        let mut out = Vec::new();

        if self.config.check_unsafe_parse {
            self.unsafe_parse(file, language, &lines, ctx, &mut out);
        }
        if language.is_js_family() {
            if self.config.check_unhandled_then {
                unhandled_then(file, language, &lines, ctx, &mut out);
            }
            promise_executors(file, language, &lines, ctx, &mut out);
        }
        if language.is_js_family() || language == Language::Python {
            let decls = async_declarations(&file.content, language, ctx);
            if self.config.check_async_without_await {
                async_without_await(file, language, &lines, &decls, ctx, &mut out);
            }
            if self.config.check_floating_promises {
                floating_calls(file, language, &lines, &decls, ctx, &mut out);
            }
        }
        out
    }

    fn unsafe_parse(
        &self,
        file: &SourceFile,
        language: Language,
        lines: &[&str],
        ctx: &GateContext,
        out: &mut Vec<Violation>,
    ) {
        let patterns = parse_calls(language);
        if patterns.is_empty() {
            return;
        }
        for (idx, raw) in lines.iter().enumerate() {
            if ctx.expired() {
                return;
            }
            if language.is_comment_line(raw.trim_start()) {
                continue;
            }
            let hit = patterns.iter().find_map(|re| {
                re.find_iter(raw)
                    .find(|m| !is_inside_string_literal(raw, m.start()))
            });
            let Some(m) = hit else { continue };
            if is_guarded_at(language, lines, idx, m.start(), self.config.guard_window) {
                continue;
            }
            let call = m.as_str().trim_end_matches(|c: char| c == '(' || c.is_whitespace());
            let reason = match language.guard_style() {
                GuardStyle::ErrorReturn => format!("error returned by `{}` is not checked", call),
                _ => format!("`{}` fails on malformed input and no handler encloses it", call),
            };
            out.push(Violation::new(&file.rel, idx + 1, "unsafe-parse", raw, reason));
        }
    }
}

fn unhandled_then(
    file: &SourceFile,
    language: Language,
    lines: &[&str],
    ctx: &GateContext,
    out: &mut Vec<Violation>,
) {
    let mut clean = Vec::with_capacity(lines.len());
    for line in lines {
        if ctx.expired() {
            return;
        }
        clean.push(sanitize_line(line, language));
    }
    let mut resume = 0;

    for idx in 0..clean.len() {
        if ctx.expired() {
            return;
        }
        if idx < resume {
            continue;
        }
        let Some(m) = THEN_CALL.find(&clean[idx]) else { continue };

        // A chain continued from earlier lines starts where the leading dots stop.
        let mut start = idx;
        while start > 0 && clean[start].trim_start().starts_with('.') {
            start -= 1;
        }
        let before = if start == idx {
            &clean[idx][..m.start()]
        } else {
            clean[start].as_str()
        };

        let end = chain_end(&clean, idx);
        resume = end + 1;
        if HANDED_OFF.is_match(before) {
            continue;
        }

        let chain = clean[idx..=end].join("\n");
        if CATCH_CALL.is_match(&chain) || has_rejection_callback(&chain) {
            continue;
        }
        out.push(Violation::new(
            &file.rel,
            idx + 1,
            "unhandled-then",
            lines[idx],
            "promise chain has no .catch() and no rejection callback",
        ));
    }
}

/// Last line of the statement holding a chain that starts on `idx`.
fn chain_end(clean: &[String], idx: usize) -> usize {
    let last = (idx + MAX_CHAIN_LINES).min(clean.len() - 1);
    let mut depth = 0i32;
    for line_no in idx..=last {
        for ch in clean[line_no].chars() {
            match ch {
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' => depth -= 1,
                _ => {}
            }
        }
        if depth > 0 {
            continue;
        }
        let trimmed = clean[line_no].trim_end();
        let continues = clean
            .get(line_no + 1)
            .is_some_and(|next| next.trim_start().starts_with('.'));
        if trimmed.ends_with(';') || !continues {
            return line_no;
        }
    }
    last
}

/// Whether any `.then(` in the chain is given a second (rejection) argument.
fn has_rejection_callback(chain: &str) -> bool {
    THEN_CALL.find_iter(chain).any(|m| {
        extract_delimited(chain, m.end(), '(', ')').is_some_and(has_top_level_comma)
    })
}

fn has_top_level_comma(args: &str) -> bool {
    let mut depth = 0i32;
    for ch in args.chars() {
        match ch {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            ',' if depth == 0 => return true,
            _ => {}
        }
    }
    false
}

fn promise_executors(
    file: &SourceFile,
    language: Language,
    lines: &[&str],
    ctx: &GateContext,
    out: &mut Vec<Violation>,
) {
    for (idx, raw) in lines.iter().enumerate() {
        if ctx.expired() {
            return;
        }
        if PROMISE_EXECUTOR.is_match(&sanitize_line(raw, language)) {
            out.push(Violation::new(
                &file.rel,
                idx + 1,
                "async-promise-executor",
                raw,
                "errors thrown inside an async executor never reject the promise",
            ));
        }
    }
}

fn async_declarations<'a>(text: &'a str, language: Language, ctx: &GateContext) -> Vec<AsyncDecl<'a>> {
    let index = LineIndex::new(text);
    let mut decls = Vec::new();
    if language == Language::Python {
        for caps in PY_ASYNC_DEF.captures_iter(text) {
            if ctx.expired() {
                break;
            }
            let Some(whole) = caps.get(0) else { continue };
            let line = index.line_of(whole.start());
            decls.push(AsyncDecl {
                name: caps.get(1).map(|n| n.as_str().to_string()),
                line,
                body: find_block(text, &index, line, BlockStyle::Indent).map(|b| b.body),
            });
        }
        return decls;
    }

    let braces = BracePairs::new(text);
    for m in JS_ASYNC.find_iter(text) {
        if ctx.expired() {
            break;
        }
        let line = index.line_of(m.start());
        let line_start = index.start_of(line).unwrap_or(0);
        let line_text = text[line_start..].lines().next().unwrap_or("");
        let column = m.start() - line_start;
        if language.is_comment_line(line_text.trim_start())
            || is_inside_string_literal(line_text, column)
        {
            continue;
        }

        let rest = &text[m.start()..];
        let name = if let Some(caps) = JS_ASYNC_FUNCTION.captures(rest) {
            caps.get(2)
                .map(|n| n.as_str())
                .filter(|n| !n.is_empty())
                .map(str::to_string)
        } else if JS_ASYNC_ARROW.is_match(rest) {
            JS_BINDING
                .captures(&line_text[..column])
                .and_then(|caps| caps.get(1))
                .map(|n| n.as_str().to_string())
        } else if let Some(caps) = JS_ASYNC_METHOD.captures(rest) {
            caps.get(2).map(|n| n.as_str().to_string())
        } else {
            // `async` used as an identifier.
            continue;
        };

        decls.push(AsyncDecl {
            name,
            line,
            body: brace_body_after(text, &braces, m.end()),
        });
    }
    decls
}

/// Body of the block opened by the first `{` after an async header.
///
/// Expression-bodied arrows and declarations ending in `;` have none.
fn brace_body_after<'a>(text: &'a str, braces: &BracePairs, from: usize) -> Option<&'a str> {
    let rest = text.get(from..)?;
    let mut depth = 0i32;
    let mut newlines = 0;
    let mut prev = '\0';

    for (i, ch) in rest.char_indices() {
        if i > MAX_HEADER_BYTES {
            return None;
        }
        match ch {
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            '\n' => {
                newlines += 1;
                if newlines > MAX_HEADER_LINES {
                    return None;
                }
            }
            ';' if depth <= 0 => return None,
            '>' if prev == '=' && depth <= 0 => {
                if !rest[i + 1..].trim_start().starts_with('{') {
                    return None;
                }
            }
            '{' if depth <= 0 => return braces.body_at(text, from + i),
            _ => {}
        }
        prev = ch;
    }
    None
}

fn is_stub_body(body: &str, language: Language) -> bool {
    body.lines().map(str::trim).all(|l| {
        l.is_empty()
            || language.is_comment_line(l)
            || (language == Language::Python
                && (l == "pass"
                    || l == "..."
                    || l.starts_with("raise NotImplementedError")
                    || l.starts_with("\"\"\"")
                    || l.starts_with('#')))
    })
}

fn async_without_await(
    file: &SourceFile,
    language: Language,
    lines: &[&str],
    decls: &[AsyncDecl<'_>],
    ctx: &GateContext,
    out: &mut Vec<Violation>,
) {
    let awaits: &Regex = if language == Language::Python {
        &PY_AWAIT
    } else {
        &JS_AWAIT
    };
    for decl in decls {
        if ctx.expired() {
            return;
        }
        let Some(body) = decl.body else { continue };
        if is_stub_body(body, language) || awaits.is_match(body) {
            continue;
        }
        let header = lines.get(decl.line).copied().unwrap_or("");
        let name = decl.name.as_deref().unwrap_or("anonymous function");
        out.push(Violation::new(
            &file.rel,
            decl.line + 1,
            "async-without-await",
            header,
            format!("async `{}` never awaits", name),
        ));
    }
}

fn floating_calls(
    file: &SourceFile,
    language: Language,
    lines: &[&str],
    decls: &[AsyncDecl<'_>],
    ctx: &GateContext,
    out: &mut Vec<Violation>,
) {
    let names: HashSet<&str> = decls.iter().filter_map(|d| d.name.as_deref()).collect();
    if names.is_empty() {
        return;
    }
    let declared: HashSet<usize> = decls.iter().map(|d| d.line).collect();
    let statement: &Regex = if language == Language::Python {
        &PY_CALL_STATEMENT
    } else {
        &JS_CALL_STATEMENT
    };

    for (idx, raw) in lines.iter().enumerate() {
        if ctx.expired() {
            return;
        }
        if declared.contains(&idx) {
            continue;
        }
        let clean = sanitize_line(raw, language);
        let Some(caps) = statement.captures(&clean) else { continue };
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else { continue };
        if !names.contains(name.as_str()) {
            continue;
        }
        // The call must be the whole statement.
        let Some(args) = extract_delimited(&clean, whole.end(), '(', ')') else { continue };
        let tail = clean[whole.end() + args.len() + 1..].trim();
        if !(tail.is_empty() || tail == ";") {
            continue;
        }
        out.push(Violation::new(
            &file.rel,
            idx + 1,
            "floating-promise",
            raw,
            format!("result of async `{}` is neither awaited nor returned", name.as_str()),
        ));
    }
}

fn severity_of(kind: &str) -> Severity {
    match kind {
        "unsafe-parse" => Severity::High,
        "async-without-await" => Severity::Low,
        _ => Severity::Medium,
    }
}

fn title_of(kind: &str) -> &'static str {
    match kind {
        "unsafe-parse" => "Unguarded parse call",
        "unhandled-then" => "Unhandled promise rejection",
        "async-without-await" => "Async function without await",
        "floating-promise" => "Floating promise",
        _ => "Async promise executor",
    }
}

fn hint_of(kind: &str) -> &'static str {
    match kind {
        "unsafe-parse" => "Wrap the call in an error handler or check its error result",
        "unhandled-then" => "Add .catch() or await the chain inside try/catch",
        "async-without-await" => "Drop the async keyword or await the asynchronous work",
        "floating-promise" => "Await the call, return it, or handle its rejection explicitly",
        _ => "Move the async work out of the executor and resolve with its result",
    }
}

impl Gate for AsyncSafetyGate {
    fn id(&self) -> &'static str {
        ID
    }

    fn title(&self) -> &'static str {
        "Async safety"
    }

    fn provenance(&self) -> Provenance {
        Provenance::AiDrift
    }

    fn enabled(&self) -> bool {
        self.config.enabled
    }

    fn run(&self, ctx: &GateContext) -> Vec<Failure> {
        if !self.config.enabled {
            return Vec::new();
        }

        let mut violations = Vec::new();
        for file in ctx.source_files(LANGUAGES) {
            if ctx.expired() {
                break;
            }
            if let Some(language) = file.language {
                violations.extend(self.scan_file(&file, language, ctx));
            }
        }

        fold_violations(violations, self.config.max_per_file, |v| {
            Failure::new(
                v.kind,
                title_of(v.kind),
                format!("{}: {}", v.reason, v.snippet),
                severity_of(v.kind),
                Provenance::AiDrift,
            )
            .in_file(v.file)
            .at_line(v.line)
            .with_hint(hint_of(v.kind))
        })
    }
}
