//! Test quality: tests that cannot fail, tests that do not run, and tests
//! that stop the rest of the suite from running.

use lazy_static::lazy_static;
use regex::Regex;

use super::{fold_violations, Failure, Gate, GateContext, Provenance, Severity, Violation};
use crate::config::TestQualityConfig;
use crate::language::{BlockStyle, Language};
use crate::scanner::SourceFile;
use crate::scope::{extract_delimited, find_block, is_inside_string_literal, sanitize_line, LineIndex};

pub const ID: &str = "test-quality";

/// Lines between a test's header and the `{` opening its callback.
const MAX_HEADER_LINES: usize = 3;

struct Tautology {
    pattern: Regex,
    /// The assertion compares captures 1 and 2, and is tautological when they are equal.
    same_operands: bool,
}

/// How one language declares, asserts, focuses and skips tests.
struct TestSyntax {
    header: Regex,
    /// `None` means the body is a callback passed to the header call.
    block: Option<BlockStyle>,
    assertion: Regex,
    /// Header text that declares the expected outcome itself (`should_panic`).
    exempt: Option<&'static str>,
    focused: Option<Regex>,
    skipped: Regex,
    tautologies: Vec<Tautology>,
}

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap()
}

fn always(pattern: &str) -> Tautology {
    Tautology {
        pattern: re(pattern),
        same_operands: false,
    }
}

fn same(pattern: &str) -> Tautology {
    Tautology {
        pattern: re(pattern),
        same_operands: true,
    }
}

lazy_static! {
    static ref JS: TestSyntax = TestSyntax {
        header: re(r#"\b(?:it|test)\s*\(\s*(?:'[^']*'|"[^"]*"|`[^`]*`)"#),
        block: None,
        assertion: re(r"\bexpect\s*[.(]|\bassert\w*\s*[.(]|\.should\b|\bsinon\.assert\b|\bt\.(?:is|not|true|false|deepEqual|throws)\s*\("),
        exempt: None,
        focused: Some(re(r"\b(?:describe|it|test|context|suite)\.only\s*\(|\b(?:fit|fdescribe|fcontext)\s*\(")),
        skipped: re(r"\b(?:describe|it|test|context|suite)\.skip\s*\(|\b(?:xit|xdescribe|xtest|xcontext)\s*\("),
        tautologies: vec![
            same(r"expect\(\s*([^()]+?)\s*\)\s*\.(?:toBe|toEqual|toStrictEqual)\(\s*([^()]+?)\s*\)"),
            always(r"expect\(\s*(?:true|1)\s*\)\s*\.toBe(?:Truthy|Defined)\(\s*\)"),
            always(r"expect\(\s*(?:false|0|null)\s*\)\s*\.toBeFalsy\(\s*\)"),
            always(r"\bassert(?:\.ok)?\(\s*true\s*\)"),
        ],
    };

    static ref PYTHON: TestSyntax = TestSyntax {
        header: re(r"(?m)^[ \t]*(?:async[ \t]+)?def[ \t]+test\w*[ \t]*\("),
        block: Some(BlockStyle::Indent),
        assertion: re(r"\bassert\b|\bself\.assert\w+|\bpytest\.(?:raises|fail|warns)\b|\.assert_\w+\("),
        exempt: None,
        focused: None,
        skipped: re(r"@pytest\.mark\.skip(?:if)?\b|@unittest\.skip\w*|\bpytest\.skip\s*\(|\bself\.skipTest\s*\("),
        tautologies: vec![
            always(r"^\s*assert\s+(?:True|1)\s*(?:,.*)?$"),
            always(r"\bself\.assertTrue\(\s*True\s*\)"),
            same(r"\bassert\s+([\w.]+)\s*==\s*([\w.]+)\s*$"),
            same(r"\bself\.assertEqual\(\s*([^,()]+?)\s*,\s*([^,()]+?)\s*\)"),
        ],
    };

    static ref GO: TestSyntax = TestSyntax {
        header: re(r"(?m)^func[ \t]+Test\w*[ \t]*\([ \t]*\w+[ \t]+\*testing\.T[ \t]*\)"),
        block: Some(BlockStyle::Brace),
        assertion: re(r"\bt\.(?:Error|Errorf|Fatal|Fatalf|Fail|FailNow)\b|\b(?:assert|require)\.\w+\(|\bt\.Run\("),
        exempt: None,
        focused: None,
        skipped: re(r"\bt\.Skip(?:f|Now)?\s*\("),
        tautologies: vec![
            always(r"\bassert\.True\(\s*t\s*,\s*true\s*\)"),
            same(r"\bassert\.Equal\(\s*t\s*,\s*([^,()]+?)\s*,\s*([^,()]+?)\s*\)"),
        ],
    };

    static ref RUST: TestSyntax = TestSyntax {
        header: re(r"(?m)^[ \t]*#\[(?:tokio::)?test\][ \t]*\n(?:[ \t]*#\[.*\][ \t]*\n)*[ \t]*(?:pub[ \t]+)?(?:async[ \t]+)?fn[ \t]+\w+"),
        block: Some(BlockStyle::Brace),
        assertion: re(r"\b(?:assert|assert_eq|assert_ne|debug_assert\w*|panic|unreachable)!|\.(?:unwrap|expect)(?:_err)?\(|\?\s*;"),
        exempt: Some("should_panic"),
        focused: None,
        skipped: re(r"#\[ignore\b"),
        tautologies: vec![
            always(r"\bassert!\(\s*true\s*\)"),
            same(r"\bassert_eq!\(\s*([^,()]+?)\s*,\s*([^,()]+?)\s*\)"),
        ],
    };

    static ref JAVA: TestSyntax = TestSyntax {
        header: re(r"(?m)^[ \t]*@Test\b.*\n(?:[ \t]*@.*\n)*[ \t]*(?:(?:public|protected|private|static)[ \t]+)*void[ \t]+\w+"),
        block: Some(BlockStyle::Brace),
        assertion: re(r"\bassert\w*\s*\(|\bverify\s*\(|\bfail\s*\("),
        exempt: Some("expected"),
        focused: None,
        skipped: re(r"@(?:Disabled|Ignore)\b"),
        tautologies: vec![
            always(r"\bassertTrue\(\s*true\s*\)"),
            same(r"\bassertEquals\(\s*([^,()]+?)\s*,\s*([^,()]+?)\s*\)"),
        ],
    };

    static ref RUBY: TestSyntax = TestSyntax {
        header: re(r#"(?m)^[ \t]*it[ \t]*\(?[ \t]*(?:'[^']*'|"[^"]*")[ \t]*\)?[ \t]*do\b"#),
        block: Some(BlockStyle::Keyword),
        assertion: re(r"\bexpect\b|\bassert\w*\b|\.should\b|\bmust_\w+|\bis_expected\b"),
        exempt: None,
        focused: Some(re(r"\b(?:fit|fdescribe|fcontext)\b|\bfocus:\s*true|:focus\b")),
        skipped: re(r"\b(?:xit|xdescribe|xcontext)\b|^\s*(?:pending|skip)\b"),
        tautologies: vec![
            always(r"expect\(\s*true\s*\)\.to\s+(?:be|eq)\(?\s*true\)?"),
            always(r"\bassert\s+true\b"),
        ],
    };

    static ref CSHARP: TestSyntax = TestSyntax {
        header: re(r"(?m)^[ \t]*\[(?:Fact|Test|TestMethod)\][ \t]*\n(?:[ \t]*\[.*\][ \t]*\n)*[ \t]*(?:(?:public|private|internal|async|static)[ \t]+)*(?:void|Task)[ \t]+\w+"),
        block: Some(BlockStyle::Brace),
        assertion: re(r"\bAssert\.\w+|\.Should\(\)|\bVerify\s*\("),
        exempt: Some("ExpectedException"),
        focused: None,
        skipped: re(r"\[(?:Fact|Theory)\s*\(\s*Skip\s*=|\[Ignore\b"),
        tautologies: vec![
            always(r"\bAssert\.(?:True|IsTrue)\(\s*true\s*\)"),
            same(r"\bAssert\.(?:AreEqual|Equal)\(\s*([^,()]+?)\s*,\s*([^,()]+?)\s*\)"),
        ],
    };
}

fn syntax(language: Language) -> &'static TestSyntax {
    match language {
        Language::JavaScript | Language::TypeScript => &JS,
        Language::Python => &PYTHON,
        Language::Go => &GO,
        Language::Rust => &RUST,
        Language::Java => &JAVA,
        Language::Ruby => &RUBY,
        Language::CSharp => &CSHARP,
    }
}

/// Whether a file holds tests. Rust unit tests live beside the code.
fn holds_tests(file: &SourceFile) -> bool {
    file.is_test() || (file.language == Some(Language::Rust) && file.content.contains("#[cfg(test)]"))
}

/// Body of the callback opened by the first `{` still inside the header call.
fn callback_body(text: &str, from: usize) -> Option<&str> {
    let rest = text.get(from..)?;
    let mut depth = 0i32;
    let mut newlines = 0;
    for (i, ch) in rest.char_indices() {
        match ch {
            '(' | '[' => depth += 1,
            ')' | ']' => {
                depth -= 1;
                if depth < 0 {
                    // The call closed without a block callback.
                    return None;
                }
            }
            '\n' => {
                newlines += 1;
                if newlines > MAX_HEADER_LINES {
                    return None;
                }
            }
            '{' if depth == 0 => return extract_delimited(text, from + i + 1, '{', '}'),
            _ => {}
        }
    }
    None
}

pub struct TestQualityGate {
    config: TestQualityConfig,
}

impl TestQualityGate {
    pub fn new(config: &TestQualityConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    fn scan_file(&self, file: &SourceFile, language: Language, ctx: &GateContext) -> Vec<Violation> {
        let syntax = syntax(language);
        let mut out = Vec::new();

        for (idx, raw) in file.content.lines().enumerate() {
            if ctx.expired() {
                return out;
            }
            if language.is_comment_line(raw.trim_start()) {
                continue;
            }
            let clean = sanitize_line(raw, language);

            if self.config.check_focused
                && syntax.focused.as_ref().is_some_and(|re| re.is_match(&clean))
            {
                out.push(Violation::new(
                    &file.rel,
                    idx + 1,
                    "focused-test",
                    raw,
                    "focused test excludes the rest of the suite",
                ));
            }
            if self.config.check_skipped && syntax.skipped.is_match(&clean) {
                out.push(Violation::new(
                    &file.rel,
                    idx + 1,
                    "skipped-test",
                    raw,
                    "test is skipped",
                ));
            }
            if self.config.check_tautological && is_tautological(syntax, raw) {
                out.push(Violation::new(
                    &file.rel,
                    idx + 1,
                    "tautological-assertion",
                    raw,
                    "assertion can never fail",
                ));
            }
        }

        if self.config.check_empty_tests {
            empty_tests(file, syntax, &mut out);
        }
        out
    }
}

fn is_tautological(syntax: &TestSyntax, line: &str) -> bool {
    syntax.tautologies.iter().any(|t| {
        t.pattern.captures_iter(line).any(|caps| {
            let Some(whole) = caps.get(0) else { return false };
            if is_inside_string_literal(line, whole.start()) {
                return false;
            }
            if !t.same_operands {
                return true;
            }
            match (caps.get(1), caps.get(2)) {
                (Some(a), Some(b)) => a.as_str().trim() == b.as_str().trim(),
                _ => false,
            }
        })
    })
}

fn empty_tests(file: &SourceFile, syntax: &TestSyntax, out: &mut Vec<Violation>) {
    let text = file.content.as_str();
    let index = LineIndex::new(text);

    for m in syntax.header.find_iter(text) {
        if syntax.exempt.is_some_and(|word| m.as_str().contains(word)) {
            continue;
        }
        let line = index.line_of(m.end());
        let line_start = index.start_of(line).unwrap_or(0);
        let line_text = text[line_start..].lines().next().unwrap_or("");
        if let Some(language) = file.language {
            if language.is_comment_line(line_text.trim_start()) {
                continue;
            }
        }

        let body = match syntax.block {
            None => callback_body(text, m.end()),
            Some(style) => find_block(text, &index, line, style).map(|b| b.body),
        };
        let Some(body) = body else { continue };
        if syntax.assertion.is_match(body) {
            continue;
        }
        out.push(Violation::new(
            &file.rel,
            line + 1,
            "empty-test",
            line_text,
            "test makes no assertions",
        ));
    }
}

fn severity_of(kind: &str) -> Severity {
    match kind {
        "focused-test" => Severity::High,
        "skipped-test" => Severity::Low,
        _ => Severity::Medium,
    }
}

fn title_of(kind: &str) -> &'static str {
    match kind {
        "focused-test" => "Focused test",
        "skipped-test" => "Skipped test",
        "tautological-assertion" => "Tautological assertion",
        _ => "Test without assertions",
    }
}

fn hint_of(kind: &str) -> &'static str {
    match kind {
        "focused-test" => "Remove the focus marker before committing",
        "skipped-test" => "Fix and re-enable the test, or delete it",
        "tautological-assertion" => "Assert on the value produced by the code under test",
        _ => "Assert on the behaviour the test exercises",
    }
}

impl Gate for TestQualityGate {
    fn id(&self) -> &'static str {
        ID
    }

    fn title(&self) -> &'static str {
        "Test quality"
    }

    fn provenance(&self) -> Provenance {
        Provenance::AiDrift
    }

    fn enabled(&self) -> bool {
        let c = &self.config;
        c.enabled && (c.check_empty_tests || c.check_tautological || c.check_focused || c.check_skipped)
    }

    fn run(&self, ctx: &GateContext) -> Vec<Failure> {
        if !self.enabled() {
            return Vec::new();
        }

        let mut violations = Vec::new();
        for file in ctx.source_files(Language::ALL) {
            if ctx.expired() {
                break;
            }
            let Some(language) = file.language else { continue };
            if holds_tests(&file) {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn run(name: &str, body: &str) -> Vec<(String, usize)> {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
        let ctx = GateContext::new(temp.path(), Arc::new(Config::default())).unwrap();
        TestQualityGate::new(&TestQualityConfig::default())
            .run(&ctx)
            .into_iter()
            .map(|f| (f.id, f.line.unwrap_or(0)))
            .collect()
    }

    fn pairs(expected: &[(&str, usize)]) -> Vec<(String, usize)> {
        expected.iter().map(|(id, line)| (id.to_string(), *line)).collect()
    }

    #[test]
    fn test_javascript_suite() {
        let src = "describe('math', () => {\n\
                   \x20 it('adds', () => {\n    expect(add(1, 2)).toBe(3);\n  });\n\
                   \x20 it('does nothing', () => {\n    const x = add(1, 2);\n  });\n\
                   \x20 it.only('focused', () => {\n    expect(true).toBe(true);\n  });\n\
                   \x20 it.skip('later', () => {});\n});\n";
        assert_eq!(
            run("math.test.js", src),
            pairs(&[
                ("empty-test", 5),
                ("focused-test", 8),
                ("tautological-assertion", 9),
                ("skipped-test", 11),
            ])
        );
    }

    #[test]
    fn test_python_suite() {
        let src = "import pytest\n\ndef test_ok():\n    assert add(1, 2) == 3\n\n\
                   def test_empty():\n    add(1, 2)\n\n\
                   @pytest.mark.skip(reason='slow')\ndef test_slow():\n    assert True\n";
        assert_eq!(
            run("test_math.py", src),
            pairs(&[
                ("empty-test", 6),
                ("skipped-test", 9),
                ("tautological-assertion", 11),
            ])
        );
    }

    #[test]
    fn test_go_suite() {
        let src = "func TestAdd(t *testing.T) {\n\tif Add(1, 2) != 3 {\n\t\tt.Errorf(\"bad\")\n\t}\n}\n\n\
                   func TestNothing(t *testing.T) {\n\tAdd(1, 2)\n}\n";
        assert_eq!(run("math_test.go", src), pairs(&[("empty-test", 7)]));
    }

    #[test]
    fn test_rust_suite() {
        let src = "#[test]\nfn works() {\n    assert_eq!(1 + 1, 2);\n}\n\n\
                   #[test]\n#[ignore]\nfn slow() {\n    run();\n}\n\n\
                   #[test]\n#[should_panic]\nfn panics() {\n    run();\n}\n";
        assert_eq!(
            run("tests/api.rs", src),
            pairs(&[("skipped-test", 7), ("empty-test", 8)])
        );
    }

    #[test]
    fn test_non_test_files_ignored() {
        let src = "it.only('x', () => {});\n";
        assert!(run("src/app.js", src).is_empty());
    }
}
