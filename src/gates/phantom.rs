//! Phantom APIs: calls to members that do not exist on an imported module.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

use super::{fold_violations, Failure, Gate, GateContext, Provenance, Severity, Violation};
use crate::config::PhantomApisConfig;
use crate::language::Language;
use crate::rules::{known_members, module_aliases, named_imports, MemberSet};
use crate::scanner::SourceFile;
use crate::scope::{sanitize_line, suggest};

pub const ID: &str = "phantom-apis";

const LANGUAGES: &[Language] = &[
    Language::JavaScript,
    Language::TypeScript,
    Language::Python,
    Language::Go,
];

lazy_static! {
    /// `subject.member(`, where subject may itself be dotted (`os.path`).
    static ref MEMBER_CALL: Regex =
        Regex::new(r"([A-Za-z_$][\w$]*(?:\.[A-Za-z_$][\w$]*)*)\.([A-Za-z_$][\w$]*)\s*\(").unwrap();
}

pub struct PhantomApisGate {
    enabled: bool,
    max_per_file: usize,
}

impl PhantomApisGate {
    pub fn new(config: &PhantomApisConfig) -> Self {
        Self {
            enabled: config.enabled,
            max_per_file: config.max_per_file,
        }
    }
}

fn violation(
    file: &str,
    line: usize,
    snippet: &str,
    module: &str,
    member: &str,
    known: &MemberSet,
) -> Violation {
    let hint = suggest(member, known.iter().copied()).map(|s| format!("Did you mean `{}`?", s));
    Violation::new(
        file,
        line,
        "phantom-api",
        snippet,
        format!("`{}` is not exported by `{}`", member, module),
    )
    .with_hint(hint)
}

fn scan_file(file: &SourceFile, language: Language, ctx: &GateContext, out: &mut Vec<Violation>) {
    let aliases: HashMap<String, String> = module_aliases(language, &file.content)
        .into_iter()
        .map(|a| (a.alias, a.module))
        .collect();

    for named in named_imports(language, &file.content) {
        let Some(known) = known_members(language, &named.module) else { continue };
        if !known.contains(named.name.as_str()) {
            let snippet = file.content.lines().nth(named.line - 1).unwrap_or("");
            out.push(violation(&file.rel, named.line, snippet, &named.module, &named.name, known));
        }
    }

    if aliases.is_empty() {
        return;
    }

    for (idx, raw) in file.content.lines().enumerate() {
        if ctx.expired() {
            break;
        }
        if language.is_comment_line(raw.trim_start()) {
            continue;
        }
        let line = sanitize_line(raw, language);
        for caps in MEMBER_CALL.captures_iter(&line) {
            let (Some(whole), Some(subject), Some(member)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };
            // A subject reached through another object (`this.fs.x()`) is not the import.
            let preceded = line[..whole.start()]
                .chars()
                .next_back()
                .is_some_and(|c| c == '.' || c == '$' || c.is_alphanumeric() || c == '_');
            if preceded {
                continue;
            }
            let Some(module) = aliases.get(subject.as_str()) else { continue };
            let Some(known) = known_members(language, module) else { continue };
            if !known.contains(member.as_str()) {
                out.push(violation(&file.rel, idx + 1, raw, module, member.as_str(), known));
            }
        }
    }
}

impl Gate for PhantomApisGate {
    fn id(&self) -> &'static str {
        ID
    }

    fn title(&self) -> &'static str {
        "Phantom APIs"
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

        let mut violations = Vec::new();
        for file in ctx.source_files(LANGUAGES) {
            if ctx.expired() {
                break;
            }
            if let Some(language) = file.language {
                scan_file(&file, language, ctx, &mut violations);
            }
        }

        fold_violations(violations, self.max_per_file, |v| {
            Failure::new(
                "phantom-api",
                "Phantom API",
                format!("{}: {}", v.reason, v.snippet),
                Severity::High,
                Provenance::AiDrift,
            )
            .in_file(v.file)
            .at_line(v.line)
            .maybe_hint(v.hint)
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

    fn run(files: &[(&str, &str)]) -> Vec<Failure> {
        let temp = TempDir::new().unwrap();
        for (name, body) in files {
            fs::write(temp.path().join(name), body).unwrap();
        }
        let ctx = GateContext::new(temp.path(), Arc::new(Config::default())).unwrap();
        PhantomApisGate::new(&PhantomApisConfig::default()).run(&ctx)
    }

    #[test]
    fn test_unknown_member_without_close_match() {
        let src = "import * as f from 'fs';\n\nf.nonExistentMethod();\n";
        let failures = run(&[("a.ts", src)]);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].id, "phantom-api");
        assert_eq!(failures[0].line, Some(3));
        assert_eq!(failures[0].hint, None);
    }

    #[test]
    fn test_typo_gets_suggestion() {
        let src = "const fs = require('fs');\nconst data = fs.readFil('x');\nfs.readFileSync('y');\n";
        let failures = run(&[("a.js", src)]);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].hint.as_deref(), Some("Did you mean `readFile`?"));
    }

    #[test]
    fn test_python_dotted_subjects() {
        let src = "import os\nimport json as j\n\nos.path.joinn('a', 'b')\nos.getcwd()\nj.loads('{}')\nj.parse('{}')\n";
        let failures = run(&[("a.py", src)]);
        let lines: Vec<usize> = failures.iter().filter_map(|f| f.line).collect();
        assert_eq!(lines, vec![4, 7]);
        assert_eq!(failures[0].hint.as_deref(), Some("Did you mean `join`?"));
    }

    #[test]
    fn test_go_and_named_imports() {
        let go = "package main\n\nimport \"strings\"\n\nfunc f() { strings.Trimspace(\" x \") }\n";
        let ts = "import { readFile, readFiles } from 'node:fs';\n";
        let failures = run(&[("a.go", go), ("b.ts", ts)]);
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].files[0], "a.go");
        assert_eq!(failures[0].hint.as_deref(), Some("Did you mean `TrimSpace`?"));
        assert_eq!(failures[1].files[0], "b.ts");
    }

    #[test]
    fn test_ignores_strings_comments_and_member_chains() {
        let src = "import * as fs from 'fs';\n// fs.bogus()\nconst s = 'fs.bogus()';\nthis.fs.bogus();\n";
        assert!(run(&[("a.ts", src)]).is_empty());
    }
}
