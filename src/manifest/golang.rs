//! Go module manifest provider.
//!
//! Go imports name packages, but go.mod only declares root modules, so an
//! import is declared when it equals a module path or lies beneath one.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::{ManifestProvider, ManifestStats};

/// Modules a go.mod makes importable.
pub struct GoManifest {
    /// The module being built (e.g. `example.com/app`).
    root_module: String,
    /// Required modules: path → version.
    required: BTreeMap<String, String>,
    /// Replaced modules: path → local path or replacement module.
    replaced: BTreeMap<String, String>,
}

impl GoManifest {
    pub fn from_root(root: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(root.join("go.mod"))?;
        Self::parse_go_mod(&content)
    }

    fn parse_go_mod(content: &str) -> anyhow::Result<Self> {
        let mut root_module = String::new();
        let mut required = BTreeMap::new();
        let mut replaced = BTreeMap::new();

        let mut in_require_block = false;
        let mut in_replace_block = false;

        for line in content.lines() {
            let line = line.split("//").next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }

            if let Some(module) = line.strip_prefix("module ") {
                root_module = module.trim().trim_matches('"').to_string();
                continue;
            }

            match line {
                "require (" => {
                    in_require_block = true;
                    continue;
                }
                "replace (" => {
                    in_replace_block = true;
                    continue;
                }
                ")" => {
                    in_require_block = false;
                    in_replace_block = false;
                    continue;
                }
                _ => {}
            }

            if let Some(rest) = line.strip_prefix("require ") {
                if let Some((module, version)) = parse_require_line(rest) {
                    required.insert(module, version);
                }
            } else if let Some(rest) = line.strip_prefix("replace ") {
                if let Some((from, to)) = parse_replace_line(rest) {
                    replaced.insert(from, to);
                }
            } else if in_require_block {
                if let Some((module, version)) = parse_require_line(line) {
                    required.insert(module, version);
                }
            } else if in_replace_block {
                if let Some((from, to)) = parse_replace_line(line) {
                    replaced.insert(from, to);
                }
            }
        }

        if root_module.is_empty() {
            anyhow::bail!("no module declaration found in go.mod");
        }

        Ok(Self {
            root_module,
            required,
            replaced,
        })
    }

    /// Go stdlib packages have no dot in their first path element
    /// (`fmt`, `net/http`, `encoding/json`).
    fn is_stdlib(import_path: &str) -> bool {
        let first = import_path.split('/').next().unwrap_or("");
        !first.contains('.')
    }
}

fn under(import_path: &str, module: &str) -> bool {
    import_path == module
        || import_path
            .strip_prefix(module)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// `github.com/pkg/errors v0.9.1` → (module, version).
fn parse_require_line(line: &str) -> Option<(String, String)> {
    let mut parts = line.split_whitespace();
    let module = parts.next()?;
    let version = parts.next().unwrap_or("");
    Some((module.to_string(), version.to_string()))
}

/// `example.com/lib => ../lib` → (from, to).
fn parse_replace_line(line: &str) -> Option<(String, String)> {
    let (from, to) = line.split_once("=>")?;
    let from = from.split_whitespace().next()?;
    let to = to.split_whitespace().next()?;
    Some((from.to_string(), to.to_string()))
}

impl ManifestProvider for GoManifest {
    fn is_declared(&self, import_name: &str) -> bool {
        Self::is_stdlib(import_name)
            || under(import_name, &self.root_module)
            || self.replaced.keys().any(|m| under(import_name, m))
            || self.required.keys().any(|m| under(import_name, m))
    }

    fn declared_packages(&self) -> Vec<String> {
        self.required.keys().chain(self.replaced.keys()).cloned().collect()
    }

    fn stats(&self) -> ManifestStats {
        ManifestStats {
            package_count: self.required.len() + self.replaced.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GO_MOD: &str = r#"
module example.com/app

go 1.22.0

require (
	github.com/pkg/errors v0.9.1
	google.golang.org/grpc v1.78.0
	golang.org/x/sync v0.7.0 // indirect
)

require github.com/spf13/cobra v1.8.0

replace example.com/shared => ../shared
"#;

    #[test]
    fn test_parse_go_mod() {
        let manifest = GoManifest::parse_go_mod(GO_MOD).unwrap();
        assert_eq!(manifest.root_module, "example.com/app");
        assert_eq!(manifest.required.len(), 4);
        assert_eq!(manifest.required["golang.org/x/sync"], "v0.7.0");
        assert_eq!(manifest.replaced["example.com/shared"], "../shared");
    }

    #[test]
    fn test_is_declared() {
        let manifest = GoManifest::parse_go_mod(GO_MOD).unwrap();
        assert!(manifest.is_declared("net/http"));
        assert!(manifest.is_declared("example.com/app/internal/db"));
        assert!(manifest.is_declared("google.golang.org/grpc/credentials"));
        assert!(manifest.is_declared("example.com/shared/util"));
        assert!(!manifest.is_declared("google.golang.org/grpcx"));
        assert!(!manifest.is_declared("github.com/made/up"));
    }

    #[test]
    fn test_missing_module_line() {
        assert!(GoManifest::parse_go_mod("go 1.22\n").is_err());
    }
}
