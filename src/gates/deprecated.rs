//! Deprecated APIs: calls into APIs that are deprecated, removed or unsafe.

use super::{cap_failures, clip_snippet, Failure, Gate, GateContext, Provenance, Severity};
use crate::config::DeprecatedApisConfig;
use crate::language::Language;
use crate::rules::{deprecated_rules, DeprecatedRule, RuleCategory};
use crate::scope::is_inside_string_literal;

pub const ID: &str = "deprecated-apis";

pub struct DeprecatedApisGate {
    enabled: bool,
    block_security_deprecated: bool,
    max_per_file: usize,
}

impl DeprecatedApisGate {
    pub fn new(config: &DeprecatedApisConfig) -> Self {
        Self {
            enabled: config.enabled,
            block_security_deprecated: config.block_security_deprecated,
            max_per_file: config.max_per_file,
        }
    }

    fn classify(&self, category: RuleCategory) -> (Severity, Provenance) {
        match category {
            RuleCategory::Security if self.block_security_deprecated => {
                (Severity::Critical, Provenance::Security)
            }
            RuleCategory::Security => (Severity::High, Provenance::Security),
            RuleCategory::Removed => (Severity::High, Provenance::AiDrift),
            RuleCategory::Deprecated => (Severity::Medium, Provenance::AiDrift),
        }
    }
}

/// First rule in table order whose match starts in code, not inside a string.
fn first_match(language: Language, line: &str) -> Option<&'static DeprecatedRule> {
    deprecated_rules(language).iter().find(|rule| {
        rule.pattern
            .find_iter(line)
            .any(|m| !is_inside_string_literal(line, m.start()))
    })
}

impl Gate for DeprecatedApisGate {
    fn id(&self) -> &'static str {
        ID
    }

    fn title(&self) -> &'static str {
        "Deprecated APIs"
    }

    fn provenance(&self) -> Provenance {
        Provenance::AiDrift
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn run(&self, ctx: &GateContext) -> Vec<Failure> {
        if !self.enabled {
            return Vec::new();
        }

        let mut failures = Vec::new();
        for file in ctx.source_files(Language::ALL) {
            let Some(language) = file.language else { continue };
            for (idx, line) in file.content.lines().enumerate() {
                if ctx.expired() {
                    break;
                }
                if language.is_comment_line(line.trim_start()) {
                    continue;
                }
                let Some(rule) = first_match(language, line) else { continue };
                let (severity, provenance) = self.classify(rule.category);
                failures.push(
                    Failure::new(
                        "deprecated-api",
                        format!("Deprecated API: {}", rule.offending_name),
                        format!(
                            "{} ({}, {}): {}",
                            rule.reason,
                            rule.subject_module,
                            rule.category.as_str(),
                            clip_snippet(line)
                        ),
                        severity,
                        provenance,
                    )
                    .in_file(file.rel.clone())
                    .at_line(idx + 1)
                    .with_hint(format!("Use {}", rule.replacement)),
                );
            }
        }
        cap_failures(failures, self.max_per_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn run(config: DeprecatedApisConfig, name: &str, body: &str) -> Vec<Failure> {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(name), body).unwrap();
        let ctx = GateContext::new(temp.path(), Arc::new(Config::default())).unwrap();
        DeprecatedApisGate::new(&config).run(&ctx)
    }

    #[test]
    fn test_categories_drive_severity() {
        let src = "const b = new Buffer(10);\nconst s = name.substr(1);\nReactDOM.render(app, root);\n";
        let failures = run(DeprecatedApisConfig::default(), "a.js", src);
        assert_eq!(failures.len(), 3);

        assert_eq!(failures[0].line, Some(1));
        assert_eq!(failures[0].severity, Severity::Critical);
        assert_eq!(failures[0].provenance, Provenance::Security);
        assert!(failures[0].hint.as_deref().unwrap().starts_with("Use Buffer.from()"));

        assert_eq!(failures[1].severity, Severity::Medium);
        assert_eq!(failures[1].provenance, Provenance::AiDrift);

        assert_eq!(failures[2].severity, Severity::High);
        assert_eq!(failures[2].provenance, Provenance::AiDrift);
    }

    #[test]
    fn test_security_not_blocking_when_configured() {
        let config = DeprecatedApisConfig {
            block_security_deprecated: false,
            ..DeprecatedApisConfig::default()
        };
        let failures = run(config, "a.py", "import ssl\nsock = ssl.wrap_socket(s)\n");
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].severity, Severity::High);
    }

    #[test]
    fn test_strings_and_comments_skipped() {
        let src = "# datetime.utcnow() is gone\nmsg = \"datetime.utcnow()\"\nnow = datetime.now(timezone.utc)\n";
        assert!(run(DeprecatedApisConfig::default(), "a.py", src).is_empty());
    }

    #[test]
    fn test_one_finding_per_line() {
        let src = "x := ioutil.ReadAll(r); ioutil.WriteFile(p, x, 0644)\n";
        let failures = run(DeprecatedApisConfig::default(), "a.go", src);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].title, "Deprecated API: ioutil.*");
    }
}
