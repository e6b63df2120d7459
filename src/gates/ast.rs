//! Structural limits: function complexity, parameter count and length, and
//! the number of methods per class.
//!
//! Functions and classes are located with per-language header patterns and
//! the Scope Primitives' block extraction. Complexity is a keyword count over
//! the sanitized body; when a tree-sitter grammar exists for the file, its
//! count replaces the keyword count for every function both agree exists.

use lazy_static::lazy_static;
use regex::Regex;

use super::{Failure, FailureCollector, Gate, GateContext, Provenance, Severity};
use crate::config::AstConfig;
use crate::language::Language;
use crate::parser;
use crate::scanner::SourceFile;
use crate::scope::{extract_delimited, find_block, sanitize_line, LineIndex};

pub const ID: &str = "ast-analysis";

/// Names the method-shaped header patterns also match on control flow.
const NOT_FUNCTIONS: &[&str] = &[
    "if", "for", "foreach", "while", "switch", "catch", "function", "return", "else", "new",
    "typeof", "super", "using", "lock", "fixed", "when",
];

struct Patterns {
    functions: Vec<Regex>,
    class: Option<Regex>,
    branch: Regex,
}

fn compile(functions: &[&str], class: Option<&str>, branch: &str) -> Patterns {
    Patterns {
        functions: functions.iter().map(|p| Regex::new(p).unwrap()).collect(),
        class: class.map(|p| Regex::new(p).unwrap()),
        branch: Regex::new(branch).unwrap(),
    }
}

lazy_static! {
    static ref PY_ELSE: Regex = Regex::new(r"\belse\b").unwrap();
    static ref PYTHON: Patterns = compile(
        &[r"^\s*(?:async\s+)?def\s+(\w+)"],
        Some(r"^\s*class\s+(\w+)"),
        r"\b(?:if|elif|for|while|try|except|with|and|or)\b",
    );
    static ref JAVASCRIPT: Patterns = compile(
        &[
            r"^\s*(?:export\s+)?(?:default\s+)?(?:async\s+)?function\s*\*?\s*([A-Za-z_$][\w$]*)",
            r"^\s*(?:export\s+)?(?:const|let|var)\s+([A-Za-z_$][\w$]*)\s*(?::[^=]+)?=\s*(?:async\s+)?(?:function\b|\([^)]*\)\s*(?::\s*[^=]+)?=>|[A-Za-z_$][\w$]*\s*=>)",
            r"^\s*(?:(?:public|private|protected|static|async|readonly|override|abstract|get|set)\s+)*\*?([A-Za-z_$][\w$]*)\s*(?:<[^>]*>)?\s*\([^;]*\)\s*(?::\s*[^;{]+)?\{\s*$",
        ],
        Some(r"^\s*(?:export\s+)?(?:default\s+)?(?:abstract\s+)?class\s+([A-Za-z_$][\w$]*)"),
        r"\b(?:if|for|while|switch|case|catch)\b|&&|\|\||\?\?|\s\?\s",
    );
    static ref JVM: Patterns = compile(
        &[r"^\s*(?:(?:public|private|protected|internal|static|final|abstract|synchronized|async|override|virtual|sealed|native|default)\s+)+(?:<[^>]+>\s+)?(?:[\w<>\[\],.?]+\s+)?(\w+)\s*\("],
        Some(r"^\s*(?:(?:public|private|protected|internal|static|final|abstract|sealed|partial)\s+)*(?:class|record|struct)\s+(\w+)"),
        r"\b(?:if|for|foreach|while|switch|case|catch)\b|&&|\|\||\?\?|\s\?\s",
    );
    static ref GO: Patterns = compile(
        &[r"^func\s+(?:\([^)]*\)\s*)?(\w+)"],
        None,
        r"\b(?:if|for|switch|select|case)\b|&&|\|\|",
    );
    static ref RUBY: Patterns = compile(
        &[r"^\s*def\s+(?:self\.)?(\w+[?!=]?)"],
        Some(r"^\s*(?:class|module)\s+([\w:]+)"),
        r"\b(?:if|elsif|unless|while|until|for|when|rescue|and|or)\b|&&|\|\|",
    );
    static ref RUST: Patterns = compile(
        &[r#"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:(?:const|async|unsafe)\s+)*(?:extern\s+"[^"]*"\s+)?fn\s+(\w+)"#],
        Some(r"^\s*(?:unsafe\s+)?impl\b(?:<.*?>)?\s+(?:.*?\s+for\s+)?([\w:]+)"),
        r"\b(?:if|while|for|loop)\b|=>|&&|\|\|",
    );
}

fn patterns(language: Language) -> &'static Patterns {
    match language {
        Language::Python => &PYTHON,
        Language::JavaScript | Language::TypeScript => &JAVASCRIPT,
        Language::Java | Language::CSharp => &JVM,
        Language::Go => &GO,
        Language::Ruby => &RUBY,
        Language::Rust => &RUST,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FunctionSpan {
    name: String,
    /// 1-based header line.
    line: usize,
    /// 1-based last line.
    end_line: usize,
    params: usize,
    complexity: u32,
}

impl FunctionSpan {
    fn length(&self) -> usize {
        self.end_line - self.line + 1
    }

    fn contains(&self, other: &FunctionSpan) -> bool {
        self.line < other.line && other.end_line <= self.end_line
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ClassSpan {
    name: String,
    line: usize,
    end_line: usize,
}

/// Skip a balanced `<...>` or `[...]` generic list at the start of `rest`.
fn skip_generics(rest: &str) -> usize {
    let lead = rest.len() - rest.trim_start().len();
    let (open, close) = match rest[lead..].chars().next() {
        Some('<') => ('<', '>'),
        Some('[') => ('[', ']'),
        _ => return 0,
    };
    let mut depth = 0usize;
    for (i, ch) in rest[lead..].char_indices() {
        if ch == open {
            depth += 1;
        } else if ch == close {
            depth -= 1;
            if depth == 0 {
                return lead + i + 1;
            }
        }
    }
    0
}

/// Count entries in a parameter list, splitting on top-level commas.
///
/// Python's bare `*` and `/` markers are not parameters, and the
/// positional-only parameters before a `/` are not counted either.
fn count_params(list: &str) -> usize {
    let mut count = 0;
    let mut depth = 0i32;
    let mut prev = '\0';
    let mut current = String::new();
    let mut flush = |current: &mut String| {
        match current.trim() {
            "" | "*" => {}
            "/" => count = 0,
            _ => count += 1,
        }
        current.clear();
    };
    for ch in list.chars() {
        match ch {
            '(' | '[' | '{' | '<' => depth += 1,
            // The `>` of an arrow (`=>`, `->`) closes nothing.
            '>' if prev == '=' || prev == '-' => {}
            ')' | ']' | '}' | '>' => depth -= 1,
            ',' if depth == 0 => {
                flush(&mut current);
                prev = ch;
                continue;
            }
            _ => {}
        }
        current.push(ch);
        prev = ch;
    }
    flush(&mut current);
    count
}

/// Parameters of the function whose name ends at `name_end` on `line`.
fn parameter_count(content: &str, line_start: usize, line: &str, name_end: usize, language: Language) -> usize {
    let after = name_end + skip_generics(&line[name_end..]);
    match line[after..].find('(') {
        Some(i) => extract_delimited(content, line_start + after + i + 1, '(', ')')
            .map(count_params)
            .unwrap_or(0),
        // `def name a, b` without parentheses.
        None if language == Language::Ruby => count_params(line[name_end..].trim()),
        None => 0,
    }
}

/// Keyword-count complexity of a body: 1 plus one per branch token.
fn body_complexity(body: &str, language: Language) -> u32 {
    let branch = &patterns(language).branch;
    let mut in_docstring = false;
    let mut depth = 0i32;
    let mut complexity = 1;
    for line in body.lines() {
        if language == Language::Python {
            let quotes = line.matches("\"\"\"").count() + line.matches("'''").count();
            if quotes % 2 == 1 {
                in_docstring = !in_docstring;
                continue;
            }
            if in_docstring {
                continue;
            }
        }
        if language.is_comment_line(line.trim_start()) {
            continue;
        }
        let clean = sanitize_line(line, language);
        complexity += if language == Language::Python {
            python_branches(&clean, branch, &mut depth)
        } else {
            branch.find_iter(&clean).count() as u32
        };
    }
    complexity
}

/// Branch tokens on a sanitized Python line.
///
/// Inside brackets, `for` and a filtering `if` belong to a comprehension and
/// are not branches; an `if` with a following `else` is a conditional
/// expression and still counts. `depth` carries the bracket depth across lines.
fn python_branches(line: &str, branch: &Regex, depth: &mut i32) -> u32 {
    let mut count = 0;
    let mut last = 0;
    for m in branch.find_iter(line) {
        *depth += bracket_delta(&line[last..m.start()]);
        last = m.start();
        let counts = match m.as_str() {
            "for" => *depth <= 0,
            "if" => *depth <= 0 || PY_ELSE.is_match(&line[m.end()..]),
            _ => true,
        };
        if counts {
            count += 1;
        }
    }
    *depth = (*depth + bracket_delta(&line[last..])).max(0);
    count
}

fn bracket_delta(text: &str) -> i32 {
    text.chars()
        .map(|c| match c {
            '(' | '[' | '{' => 1,
            ')' | ']' | '}' => -1,
            _ => 0,
        })
        .sum()
}

fn extract_functions(content: &str, language: Language) -> Vec<FunctionSpan> {
    let pats = patterns(language);
    let index = LineIndex::new(content);
    let mut functions = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        if language.is_comment_line(line.trim_start()) {
            continue;
        }
        let Some(name) = pats
            .functions
            .iter()
            .find_map(|re| re.captures(line).and_then(|caps| caps.get(1)))
        else {
            continue;
        };
        if NOT_FUNCTIONS.contains(&name.as_str()) {
            continue;
        }
        let (Some(block), Some(line_start)) = (
            find_block(content, &index, idx, language.block_style()),
            index.start_of(idx),
        ) else {
            continue;
        };
        functions.push(FunctionSpan {
            name: name.as_str().to_string(),
            line: idx + 1,
            end_line: block.end_line + 1,
            params: parameter_count(content, line_start, line, name.end(), language),
            complexity: body_complexity(block.body, language),
        });
    }
    functions
}

fn extract_classes(content: &str, language: Language) -> Vec<ClassSpan> {
    let Some(class) = &patterns(language).class else {
        return Vec::new();
    };
    let index = LineIndex::new(content);
    content
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            let name = class.captures(line)?.get(1)?;
            let block = find_block(content, &index, idx, language.block_style())?;
            Some(ClassSpan {
                name: name.as_str().to_string(),
                line: idx + 1,
                end_line: block.end_line + 1,
            })
        })
        .collect()
}

/// Methods declared directly in a class: functions inside it that no other
/// function inside it contains.
fn method_count(class: &ClassSpan, functions: &[FunctionSpan]) -> usize {
    let members: Vec<&FunctionSpan> = functions
        .iter()
        .filter(|f| f.line > class.line && f.end_line <= class.end_line)
        .collect();
    members
        .iter()
        .filter(|f| !members.iter().any(|outer| outer.contains(f)))
        .count()
}

/// Replace keyword-count complexity with the grammar's count where one exists.
fn refine_complexity(file: &SourceFile, language: Language, functions: &mut [FunctionSpan]) {
    let Some(parser) = parser::for_file(language, &file.path) else {
        return;
    };
    match parser.functions(file.content.as_bytes()) {
        Ok(parsed) => {
            for function in functions.iter_mut() {
                let found = parsed
                    .iter()
                    .filter(|p| p.line == function.line)
                    .filter(|p| p.name.as_deref().map_or(true, |n| n == function.name))
                    .max_by_key(|p| p.end_line);
                if let Some(found) = found {
                    function.complexity = found.complexity;
                }
            }
        }
        Err(e) => {
            tracing::debug!(file = %file.rel, error = %e, "parse failed, keeping keyword complexity");
        }
    }
}

pub struct AstGate {
    config: AstConfig,
}

impl AstGate {
    pub fn new(config: &AstConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    fn check_file(&self, file: &SourceFile, language: Language, collector: &mut FailureCollector) {
        let mut functions = extract_functions(&file.content, language);
        refine_complexity(file, language, &mut functions);
        let c = &self.config;

        for f in &functions {
            if c.complexity > 0 && f.complexity as usize > c.complexity {
                let severity = if f.complexity as usize > c.complexity * 2 {
                    Severity::High
                } else {
                    Severity::Medium
                };
                collector.push(
                    Failure::new(
                        "high-complexity",
                        format!("High complexity: {}", f.name),
                        format!("`{}` has cyclomatic complexity {} (limit {})", f.name, f.complexity, c.complexity),
                        severity,
                        Provenance::Traditional,
                    )
                    .in_file(file.rel.clone())
                    .at_line(f.line)
                    .with_hint(format!("Split `{}` into smaller functions", f.name)),
                );
            }
            if c.max_params > 0 && f.params > c.max_params {
                collector.push(
                    Failure::new(
                        "too-many-params",
                        format!("Too many parameters: {}", f.name),
                        format!("`{}` takes {} parameters (limit {})", f.name, f.params, c.max_params),
                        Severity::Medium,
                        Provenance::Traditional,
                    )
                    .in_file(file.rel.clone())
                    .at_line(f.line)
                    .with_hint("Group related parameters into a struct or options object"),
                );
            }
            if c.max_function_lines > 0 && f.length() > c.max_function_lines {
                collector.push(
                    Failure::new(
                        "long-function",
                        format!("Long function: {}", f.name),
                        format!("`{}` spans {} lines (limit {})", f.name, f.length(), c.max_function_lines),
                        Severity::Low,
                        Provenance::Traditional,
                    )
                    .in_file(file.rel.clone())
                    .spanning(f.line, f.end_line),
                );
            }
        }

        if c.max_methods == 0 {
            return;
        }
        for class in extract_classes(&file.content, language) {
            let methods = method_count(&class, &functions);
            if methods > c.max_methods {
                collector.push(
                    Failure::new(
                        "too-many-methods",
                        format!("Too many methods: {}", class.name),
                        format!("`{}` declares {} methods (limit {})", class.name, methods, c.max_methods),
                        Severity::Medium,
                        Provenance::Traditional,
                    )
                    .in_file(file.rel.clone())
                    .spanning(class.line, class.end_line)
                    .with_hint("Extract a collaborator for one of its responsibilities"),
                );
            }
        }
    }
}

impl Gate for AstGate {
    fn id(&self) -> &'static str {
        ID
    }

    fn title(&self) -> &'static str {
        "Structural analysis"
    }

    fn provenance(&self) -> Provenance {
        Provenance::Traditional
    }

    fn enabled(&self) -> bool {
        self.config.enabled
    }

    fn run(&self, ctx: &GateContext) -> Vec<Failure> {
        if !self.config.enabled {
            return Vec::new();
        }

        let mut collector = FailureCollector::new(self.config.max_per_file);
        for file in ctx.source_files(Language::ALL) {
            if ctx.expired() {
                break;
            }
            if let Some(language) = file.language {
                self.check_file(&file, language, &mut collector);
            }
        }
        collector.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn run_with(config: AstConfig, files: &[(&str, &str)]) -> Vec<Failure> {
        let temp = TempDir::new().unwrap();
        for (name, body) in files {
            let path = temp.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, body).unwrap();
        }
        let ctx = GateContext::new(temp.path(), Arc::new(Config::default())).unwrap();
        AstGate::new(&config).run(&ctx)
    }

    fn ids(failures: &[Failure]) -> Vec<(&str, Option<usize>)> {
        failures.iter().map(|f| (f.id.as_str(), f.line)).collect()
    }

    #[test]
    fn test_python_complexity() {
        let mut src = String::from("def route(kind, value):\n    if kind == 0:\n        return value\n");
        for k in 1..=10 {
            src.push_str(&format!("    elif kind == {}:\n        return value * {}\n", k, k));
        }
        src.push_str("\ndef simple():\n    return 1\n");

        let failures = run_with(AstConfig::default(), &[("app.py", &src)]);
        assert_eq!(ids(&failures), vec![("high-complexity", Some(1))]);
        assert!(failures[0].details.contains("complexity 12"));
        assert_eq!(failures[0].severity, Severity::Medium);
        assert_eq!(failures[0].provenance, Provenance::Traditional);
    }

    #[test]
    fn test_rust_keyword_complexity() {
        let mut src = String::from("pub fn code(n: u8) -> u32 {\n    match n {\n");
        for k in 0..=10 {
            src.push_str(&format!("        {} => {},\n", k, k * 10));
        }
        src.push_str("        _ => 0,\n    }\n}\n");

        let failures = run_with(AstConfig::default(), &[("src/lib.rs", &src)]);
        assert_eq!(ids(&failures), vec![("high-complexity", Some(1))]);
        assert!(failures[0].details.contains("complexity 13"));
    }

    #[test]
    fn test_parameter_counts() {
        let js = "function build(a, b, c, d, e, f) {\n  return a;\n}\n\nfunction fine(a, { b, c }) {\n  return b;\n}\n";
        let py = "class A:\n    def ok(self, a, b, c, *, d):\n        return a\n";
        let failures = run_with(AstConfig::default(), &[("build.js", js), ("a.py", py)]);
        assert_eq!(ids(&failures), vec![("too-many-params", Some(1))]);
        assert!(failures[0].details.contains("takes 6 parameters"));
    }

    #[test]
    fn test_long_function_span() {
        let go = "package main\n\nfunc main() {\n\ta := 1\n\tb := 2\n\tc := 3\n\td := 4\n\te := 5\n\tfmt.Println(a, b, c, d, e)\n}\n";
        let config = AstConfig {
            max_function_lines: 5,
            ..AstConfig::default()
        };
        let failures = run_with(config, &[("main.go", go)]);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].id, "long-function");
        assert_eq!((failures[0].line, failures[0].end_line), (Some(3), Some(10)));
    }

    #[test]
    fn test_method_count_ignores_nested_functions() {
        let py = "class Service:\n    def a(self):\n        def inner():\n            return 1\n        return inner()\n\n    def b(self):\n        return 2\n\n    def c(self):\n        return 3\n\ndef free():\n    return 0\n";
        let config = AstConfig {
            max_methods: 2,
            ..AstConfig::default()
        };
        let failures = run_with(config, &[("service.py", py)]);
        assert_eq!(ids(&failures), vec![("too-many-methods", Some(1))]);
        assert!(failures[0].details.contains("3 methods"));
    }

    #[test]
    fn test_disabled_gate_reports_nothing() {
        let config = AstConfig {
            enabled: false,
            max_params: 1,
            ..AstConfig::default()
        };
        assert!(run_with(config, &[("a.js", "function f(a, b) {\n  return a;\n}\n")]).is_empty());
    }

    #[test]
    fn test_count_params() {
        assert_eq!(count_params(""), 0);
        assert_eq!(count_params("a, b"), 2);
        assert_eq!(count_params("m: HashMap<String, u32>, f: impl Fn(u8, u8)"), 2);
        assert_eq!(count_params("self, *args, **kwargs"), 3);
        assert_eq!(count_params("a, /, b, *, c"), 2);
        assert_eq!(count_params("self, a, /"), 0);
        assert_eq!(
            count_params("cb: () => void, a: number, b: number, c: number, d: number, e: number"),
            6
        );
        assert_eq!(count_params("f: fn(u8) -> u8, g: Box<dyn Fn() -> u8>, h: u8"), 3);
    }

    #[test]
    fn test_arrow_typed_parameters() {
        let ts = "export function f(cb: () => void, a: number, b: number, c: number, d: number, e: number) {\n  return a;\n}\n";
        let failures = run_with(AstConfig::default(), &[("f.ts", ts)]);
        assert_eq!(ids(&failures), vec![("too-many-params", Some(1))]);
        assert!(failures[0].details.contains("takes 6 parameters"));
    }

    #[test]
    fn test_comprehensions_are_not_branches() {
        let config = AstConfig {
            complexity: 1,
            ..AstConfig::default()
        };
        let py = "def f(xs):\n    return [x for x in xs if x]\n";
        assert!(run_with(config, &[("f.py", py)]).is_empty());

        let body = "    total = sum(\n        x for x in xs\n        if x\n    )\n    return [a if a else b for a in xs]\n";
        // The conditional expression is the only branch.
        assert_eq!(body_complexity(body, Language::Python), 2);
        assert_eq!(body_complexity("    for x in xs:\n        if x:\n            pass\n", Language::Python), 3);
    }
}
