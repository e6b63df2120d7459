//! Hallucinated imports: imports of files and packages that do not exist.
//!
//! Relative imports are resolved against the file system. Bare package
//! imports are judged against the project's manifest for that ecosystem, and
//! only when one exists.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;

use super::{fold_violations, Failure, Gate, GateContext, Provenance, Severity, Violation};
use crate::config::HallucinatedImportsConfig;
use crate::language::Language;
use crate::manifest::{package_of, ManifestProvider, ProjectManifests};
use crate::rules::{is_node_builtin, is_python_stdlib};
use crate::scanner::SourceFile;
use crate::scope::{is_guarded, is_inside_string_literal, suggest, DEFAULT_WINDOW};

pub const ID: &str = "hallucinated-imports";

const LANGUAGES: &[Language] = &[
    Language::JavaScript,
    Language::TypeScript,
    Language::Python,
    Language::Go,
];

const JS_EXTENSIONS: &[&str] = &["ts", "tsx", "d.ts", "mts", "cts", "js", "jsx", "mjs", "cjs", "json"];

lazy_static! {
    static ref JS_FROM: Regex = Regex::new(r#"\bfrom\s+['"]([^'"]+)['"]"#).unwrap();
    static ref JS_SIDE_EFFECT: Regex = Regex::new(r#"^\s*import\s+['"]([^'"]+)['"]"#).unwrap();
    static ref JS_CALL: Regex =
        Regex::new(r#"\b(?:require|import)\s*\(\s*['"]([^'"]+)['"]\s*\)"#).unwrap();
    static ref PY_IMPORT: Regex =
        Regex::new(r"^\s*import\s+([\w.]+(?:\s+as\s+\w+)?(?:\s*,\s*[\w.]+(?:\s+as\s+\w+)?)*)").unwrap();
    static ref PY_FROM: Regex = Regex::new(r"^\s*from\s+(\.*)([\w.]*)\s+import\b").unwrap();
    static ref GO_SINGLE: Regex = Regex::new(r#"^\s*import\s+(?:[\w.]+\s+)?"([^"]+)""#).unwrap();
    static ref GO_BLOCK_ENTRY: Regex = Regex::new(r#"^\s*(?:[\w.]+\s+)?"([^"]+)""#).unwrap();
}

/// One import statement's target.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Import {
    /// Specifier as written (Python: the module path without leading dots).
    spec: String,
    /// Python relative level (number of leading dots); 0 elsewhere.
    level: usize,
    /// 1-based.
    line: usize,
    /// Inside an error handler (optional-dependency fallbacks).
    guarded: bool,
}

fn js_imports(content: &str, language: Language) -> Vec<Import> {
    let mut imports = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        if language.is_comment_line(line.trim_start()) {
            continue;
        }
        for re in [&*JS_FROM, &*JS_SIDE_EFFECT, &*JS_CALL] {
            for caps in re.captures_iter(line) {
                let (Some(whole), Some(spec)) = (caps.get(0), caps.get(1)) else { continue };
                if is_inside_string_literal(line, whole.start()) {
                    continue;
                }
                let import = Import {
                    spec: spec.as_str().to_string(),
                    level: 0,
                    line: idx + 1,
                    guarded: false,
                };
                if !imports.contains(&import) {
                    imports.push(import);
                }
            }
        }
    }
    imports
}

fn python_imports(content: &str) -> Vec<Import> {
    let lines: Vec<&str> = content.lines().collect();
    let mut imports = Vec::new();
    for (idx, line) in lines.iter().enumerate() {
        let guarded = || is_guarded(Language::Python, &lines, idx, DEFAULT_WINDOW);
        if let Some(caps) = PY_IMPORT.captures(line) {
            let Some(list) = caps.get(1) else { continue };
            let guarded = guarded();
            for item in list.as_str().split(',') {
                if let Some(module) = item.split_whitespace().next() {
                    imports.push(Import {
                        spec: module.to_string(),
                        level: 0,
                        line: idx + 1,
                        guarded,
                    });
                }
            }
        } else if let Some(caps) = PY_FROM.captures(line) {
            let level = caps.get(1).map_or(0, |m| m.as_str().len());
            let module = caps.get(2).map_or("", |m| m.as_str());
            imports.push(Import {
                spec: module.to_string(),
                level,
                line: idx + 1,
                guarded: guarded(),
            });
        }
    }
    imports
}

fn go_imports(content: &str) -> Vec<Import> {
    let mut imports = Vec::new();
    let mut in_block = false;
    for (idx, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.starts_with("import (") {
            in_block = true;
            continue;
        }
        if in_block && trimmed.starts_with(')') {
            in_block = false;
            continue;
        }
        let re: &Regex = if in_block { &GO_BLOCK_ENTRY } else { &GO_SINGLE };
        if let Some(spec) = re.captures(line).and_then(|caps| caps.get(1)) {
            imports.push(Import {
                spec: spec.as_str().to_string(),
                level: 0,
                line: idx + 1,
                guarded: false,
            });
        }
    }
    imports
}

fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut s = base.as_os_str().to_owned();
    s.push(suffix);
    PathBuf::from(s)
}

/// Whether a relative JS/TS specifier resolves the way bundlers resolve it.
fn resolve_js(dir: &Path, spec: &str) -> bool {
    let base = dir.join(spec);
    if base.is_file() {
        return true;
    }
    // ESM TypeScript names the emitted file: `./util.js` for `util.ts`.
    for (emitted, sources) in [(".js", ["ts", "tsx"]), (".mjs", ["mts", "ts"]), (".cjs", ["cts", "ts"])] {
        if let Some(stem) = spec.strip_suffix(emitted) {
            if sources
                .iter()
                .any(|ext| with_suffix(&dir.join(stem), &format!(".{}", ext)).is_file())
            {
                return true;
            }
        }
    }
    JS_EXTENSIONS.iter().any(|ext| {
        with_suffix(&base, &format!(".{}", ext)).is_file()
            || base.join(format!("index.{}", ext)).is_file()
    }) || base.join("package.json").is_file()
}

/// Whether dotted `module` exists as a module or package under `base`.
fn resolve_py(base: &Path, module: &str) -> bool {
    let path = base.join(module.replace('.', "/"));
    with_suffix(&path, ".py").is_file()
        || with_suffix(&path, ".pyi").is_file()
        || path.join("__init__.py").is_file()
        || path.is_dir()
}

pub struct HallucinatedImportsGate {
    enabled: bool,
    allowlist: HashSet<String>,
    max_per_file: usize,
}

impl HallucinatedImportsGate {
    pub fn new(config: &HallucinatedImportsConfig) -> Self {
        Self {
            enabled: config.enabled,
            allowlist: config.allowlist.iter().cloned().collect(),
            max_per_file: config.max_per_file,
        }
    }

    fn allowed(&self, name: &str) -> bool {
        self.allowlist.contains(name)
    }

    fn check_js(&self, file: &SourceFile, language: Language, manifests: &ProjectManifests, out: &mut Vec<Violation>) {
        let dir = file.path.parent().unwrap_or(Path::new(""));
        for import in js_imports(&file.content, language) {
            let spec = import.spec.as_str();
            let snippet = file.content.lines().nth(import.line - 1).unwrap_or("");

            if spec == "." || spec == ".." || spec.starts_with("./") || spec.starts_with("../") {
                if !resolve_js(dir, spec) {
                    out.push(relative_violation(file, &import, snippet));
                }
                continue;
            }

            // Absolute paths, path aliases, subpath imports and URL schemes.
            let aliased = spec.starts_with('/')
                || spec.starts_with("@/")
                || spec.starts_with('~')
                || spec.starts_with('#')
                || (spec.contains(':') && !spec.starts_with("node:"));
            if aliased || is_node_builtin(spec) {
                continue;
            }

            let package = package_of(spec);
            if self.allowed(package) || self.allowed(spec) {
                continue;
            }
            let Some(node) = &manifests.node else { continue };
            if node.is_declared(spec) {
                continue;
            }
            out.push(package_violation(file, &import, snippet, package, "package.json", node));
        }
    }

    fn check_python(&self, file: &SourceFile, root: &Path, manifests: &ProjectManifests, out: &mut Vec<Violation>) {
        let dir = file.path.parent().unwrap_or(Path::new(""));
        for import in python_imports(&file.content) {
            if import.guarded {
                continue;
            }
            let snippet = file.content.lines().nth(import.line - 1).unwrap_or("");

            if import.level > 0 {
                if import.spec.is_empty() {
                    continue;
                }
                let mut base = Some(dir);
                for _ in 1..import.level {
                    base = base.and_then(Path::parent);
                }
                if !base.is_some_and(|b| resolve_py(b, &import.spec)) {
                    out.push(relative_violation(file, &import, snippet));
                }
                continue;
            }

            let top = import.spec.split('.').next().unwrap_or(&import.spec);
            if is_python_stdlib(top) || self.allowed(top) {
                continue;
            }
            let local = [dir.to_path_buf(), root.to_path_buf(), root.join("src")]
                .iter()
                .any(|base| resolve_py(base, top));
            if local {
                continue;
            }
            let Some(python) = &manifests.python else { continue };
            if python.is_declared(top) {
                continue;
            }
            out.push(package_violation(file, &import, snippet, top, "the project's requirements", python));
        }
    }

    fn check_go(&self, file: &SourceFile, manifests: &ProjectManifests, out: &mut Vec<Violation>) {
        let Some(go) = &manifests.go else { return };
        for import in go_imports(&file.content) {
            if self.allowed(&import.spec) || go.is_declared(&import.spec) {
                continue;
            }
            let snippet = file.content.lines().nth(import.line - 1).unwrap_or("");
            out.push(package_violation(file, &import, snippet, &import.spec, "go.mod", go));
        }
    }
}

fn relative_violation(file: &SourceFile, import: &Import, snippet: &str) -> Violation {
    let shown = format!("{}{}", ".".repeat(import.level), import.spec);
    Violation::new(
        &file.rel,
        import.line,
        "hallucinated-import",
        snippet,
        format!("`{}` does not resolve to a file", shown),
    )
    .with_hint(Some("Check the path; no file or package matches it".to_string()))
}

fn package_violation(
    file: &SourceFile,
    import: &Import,
    snippet: &str,
    package: &str,
    manifest_name: &str,
    manifest: &dyn ManifestProvider,
) -> Violation {
    let declared = manifest.declared_packages();
    let hint = match suggest(package, declared.iter().map(String::as_str)) {
        Some(close) => format!("Did you mean `{}`?", close),
        None => format!("Add `{}` to {} or remove the import", package, manifest_name),
    };
    Violation::new(
        &file.rel,
        import.line,
        "hallucinated-import",
        snippet,
        format!("`{}` is not declared in {}", package, manifest_name),
    )
    .with_hint(Some(hint))
}

impl Gate for HallucinatedImportsGate {
    fn id(&self) -> &'static str {
        ID
    }

    fn title(&self) -> &'static str {
        "Hallucinated imports"
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

        let manifests = ProjectManifests::load(ctx.cwd());
        let mut violations = Vec::new();
        for file in ctx.source_files(LANGUAGES) {
            if ctx.expired() {
                break;
            }
            match file.language {
                Some(language) if language.is_js_family() => {
                    self.check_js(&file, language, &manifests, &mut violations)
                }
                Some(Language::Python) => self.check_python(&file, ctx.cwd(), &manifests, &mut violations),
                Some(Language::Go) => self.check_go(&file, &manifests, &mut violations),
                _ => {}
            }
        }

        fold_violations(violations, self.max_per_file, |v| {
            Failure::new(
                "hallucinated-import",
                "Hallucinated import",
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

    fn run_with(config: HallucinatedImportsConfig, files: &[(&str, &str)]) -> Vec<Failure> {
        let temp = TempDir::new().unwrap();
        for (name, body) in files {
            let path = temp.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, body).unwrap();
        }
        let ctx = GateContext::new(temp.path(), Arc::new(Config::default())).unwrap();
        HallucinatedImportsGate::new(&config).run(&ctx)
    }

    fn lines(failures: &[Failure]) -> Vec<usize> {
        failures.iter().filter_map(|f| f.line).collect()
    }

    #[test]
    fn test_relative_js_imports() {
        let failures = run_with(
            HallucinatedImportsConfig::default(),
            &[
                (
                    "src/a.ts",
                    "import { x } from './b';\nimport y from './missing';\nimport z from '../lib/util.js';\n",
                ),
                ("src/b.ts", "export const x = 1;\n"),
                ("lib/util.ts", "export default 1;\n"),
            ],
        );
        assert_eq!(lines(&failures), vec![2]);
        assert!(failures[0].details.contains("./missing"));
    }

    #[test]
    fn test_bare_js_imports_against_package_json() {
        let package_json = r#"{"dependencies": {"react": "^18"}, "devDependencies": {"@types/node": "^20"}}"#;
        let src = "import React from 'react';\nimport fs from 'node:fs';\nimport path from 'path';\n\
                   const lp = require('left-pad');\nimport x from '@scope/pkg/sub';\n\
                   import '@/components/x';\nimport r from 'react-dom/client';\n";
        let files = [("package.json", package_json), ("a.js", src)];

        let failures = run_with(HallucinatedImportsConfig::default(), &files);
        assert_eq!(lines(&failures), vec![4, 5, 7]);
        assert!(failures[1].details.contains("`@scope/pkg`"));

        let config = HallucinatedImportsConfig {
            allowlist: vec!["left-pad".to_string()],
            ..HallucinatedImportsConfig::default()
        };
        assert_eq!(lines(&run_with(config, &files)), vec![5, 7]);
    }

    #[test]
    fn test_python_imports() {
        let main = "import os\nimport requests\nimport numpy as np\nfrom . import helpers\n\
                    from .models import User\nfrom .ghost import x\nimport app.utils\n\
                    try:\n    import ujson as json\nexcept ImportError:\n    import json\n";
        let failures = run_with(
            HallucinatedImportsConfig::default(),
            &[
                ("requirements.txt", "requests\n"),
                ("app/__init__.py", ""),
                ("app/helpers.py", ""),
                ("app/models.py", ""),
                ("app/utils.py", ""),
                ("app/main.py", main),
            ],
        );
        assert_eq!(lines(&failures), vec![3, 6]);
        assert!(failures[0].details.contains("`numpy`"));
        assert!(failures[1].details.contains("`.ghost`"));
    }

    #[test]
    fn test_go_imports_against_go_mod() {
        let go_mod = "module example.com/app\n\nrequire (\n\tgithub.com/pkg/errors v0.9.1\n)\n";
        let main = "package main\n\nimport (\n\t\"fmt\"\n\t\"example.com/app/internal/db\"\n\t\"github.com/pkg/errors\"\n\t\"github.com/made/up\"\n)\n";
        let failures = run_with(
            HallucinatedImportsConfig::default(),
            &[("go.mod", go_mod), ("main.go", main)],
        );
        assert_eq!(lines(&failures), vec![7]);
    }

    #[test]
    fn test_no_manifest_means_no_package_verdicts() {
        let failures = run_with(
            HallucinatedImportsConfig::default(),
            &[
                ("a.js", "import x from 'whatever';\n"),
                ("b.py", "import numpy\n"),
            ],
        );
        assert!(failures.is_empty());
    }
}
