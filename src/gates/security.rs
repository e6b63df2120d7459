//! Security patterns: secrets, injection, unsafe deserialization, weak crypto.

use super::{cap_failures, Failure, Gate, GateContext, Provenance};
use crate::config::SecurityPatternsConfig;
use crate::language::Language;
use crate::rules::security_rules;
use crate::scope::is_inside_string_literal;

pub const ID: &str = "security-patterns";

pub struct SecurityPatternsGate {
    enabled: bool,
    include_tests: bool,
    max_per_file: usize,
}

impl SecurityPatternsGate {
    pub fn new(config: &SecurityPatternsConfig) -> Self {
        Self {
            enabled: config.enabled,
            include_tests: config.include_tests,
            max_per_file: config.max_per_file,
        }
    }
}

impl Gate for SecurityPatternsGate {
    fn id(&self) -> &'static str {
        ID
    }

    fn title(&self) -> &'static str {
        "Security patterns"
    }

    fn provenance(&self) -> Provenance {
        Provenance::Security
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
            if file.is_test() && !self.include_tests {
                continue;
            }

            for (idx, line) in file.content.lines().enumerate() {
                if ctx.expired() {
                    break;
                }
                if language.is_comment_line(line.trim_start()) {
                    continue;
                }
                for rule in security_rules(language) {
                    let Some(pos) = rule.find(line) else { continue };
                    // Code-shaped rules only count outside string literals;
                    // secret and header rules match the literal itself.
                    let literal_rule = matches!(
                        rule.id,
                        "hardcoded-secret"
                            | "aws-access-key"
                            | "private-key"
                            | "github-token"
                            | "cors-wildcard"
                    );
                    if !literal_rule && is_inside_string_literal(line, pos) {
                        continue;
                    }
                    failures.push(
                        Failure::new(
                            rule.id,
                            rule.title,
                            format!("{}: {}", rule.title, super::clip_snippet(line)),
                            rule.severity,
                            Provenance::Security,
                        )
                        .in_file(file.rel.clone())
                        .at_line(idx + 1)
                        .with_hint(rule.hint),
                    );
                }
            }
        }
        cap_failures(failures, self.max_per_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::gates::Severity;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn run(config: SecurityPatternsConfig, files: &[(&str, &str)]) -> Vec<Failure> {
        let temp = TempDir::new().unwrap();
        for (name, body) in files {
            let path = temp.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, body).unwrap();
        }
        let ctx = GateContext::new(temp.path(), Arc::new(Config::default())).unwrap();
        SecurityPatternsGate::new(&config).run(&ctx)
    }

    #[test]
    fn test_detects_and_classifies() {
        let src = "import os\n\ndef run(cmd):\n    os.system(cmd)\n    # os.system(cmd) in a comment\n";
        let failures = run(SecurityPatternsConfig::default(), &[("app.py", src)]);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].id, "command-injection");
        assert_eq!(failures[0].line, Some(4));
        assert_eq!(failures[0].severity, Severity::High);
        assert_eq!(failures[0].provenance, Provenance::Security);
    }

    #[test]
    fn test_skips_tests_by_default() {
        let src = "const secretKey = \"abcd1234efgh5678\";\n";
        let files = [("src/app.test.ts", src)];
        assert!(run(SecurityPatternsConfig::default(), &files).is_empty());

        let config = SecurityPatternsConfig {
            include_tests: true,
            ..SecurityPatternsConfig::default()
        };
        let failures = run(config, &files);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].severity, Severity::Critical);
    }

    #[test]
    fn test_code_rules_ignore_string_contents() {
        let src = "const help = \"never call eval(x) here\";\n";
        assert!(run(SecurityPatternsConfig::default(), &[("a.js", src)]).is_empty());
    }
}
