//! Project manifests: which third-party packages a project declares.
//!
//! Used to tell a real dependency from a hallucinated one. Each ecosystem has
//! its own provider behind one trait:
//!
//! ```text
//! ManifestProvider trait
//!     ├── NodeManifest    (package.json)
//!     ├── PythonManifest  (pyproject.toml, requirements*.txt, setup.cfg)
//!     └── GoManifest      (go.mod)
//! ```
//!
//! A project without a manifest for an ecosystem gets no provider for it, and
//! bare imports in that ecosystem are not judged.

use std::path::Path;

mod golang;
mod node;
mod python;

pub use golang::GoManifest;
pub use node::{package_of, NodeManifest};
pub use python::PythonManifest;

/// Ecosystems a project root can declare dependencies for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestKind {
    Node,
    Python,
    Go,
}

/// Import validation against one ecosystem's manifest.
pub trait ManifestProvider: Send + Sync {
    /// Whether `import_name` is declared (or belongs to the project itself).
    fn is_declared(&self, import_name: &str) -> bool;

    /// Every declared package, for "did you mean" suggestions.
    fn declared_packages(&self) -> Vec<String>;

    fn stats(&self) -> ManifestStats {
        ManifestStats::default()
    }
}

/// Statistics about a loaded manifest.
#[derive(Debug, Clone, Default)]
pub struct ManifestStats {
    pub package_count: usize,
}

/// Detect which manifests exist directly under `dir`.
pub fn detect_manifest_kinds(dir: &Path) -> Vec<ManifestKind> {
    let mut kinds = Vec::new();
    if dir.join("package.json").is_file() {
        kinds.push(ManifestKind::Node);
    }
    let has_python = dir.join("pyproject.toml").exists()
        || dir.join("requirements.txt").exists()
        || dir.join("setup.cfg").exists();
    if has_python {
        kinds.push(ManifestKind::Python);
    }
    if dir.join("go.mod").is_file() {
        kinds.push(ManifestKind::Go);
    }
    kinds
}

/// The manifests found at a project root, loaded once per run.
#[derive(Default)]
pub struct ProjectManifests {
    pub node: Option<NodeManifest>,
    pub python: Option<PythonManifest>,
    pub go: Option<GoManifest>,
}

impl ProjectManifests {
    /// Load every manifest present under `root`. An unparsable manifest is
    /// logged and treated as absent.
    pub fn load(root: &Path) -> Self {
        let mut manifests = Self::default();
        for kind in detect_manifest_kinds(root) {
            match kind {
                ManifestKind::Node => {
                    manifests.node = loaded("package.json", NodeManifest::from_root(root));
                }
                ManifestKind::Python => {
                    manifests.python = loaded("python", PythonManifest::from_root(root));
                }
                ManifestKind::Go => {
                    manifests.go = loaded("go.mod", GoManifest::from_root(root));
                }
            }
        }
        manifests
    }
}

fn loaded<T: ManifestProvider>(what: &str, result: anyhow::Result<T>) -> Option<T> {
    match result {
        Ok(manifest) => {
            tracing::debug!(
                manifest = what,
                packages = manifest.stats().package_count,
                "loaded manifest"
            );
            Some(manifest)
        }
        Err(e) => {
            tracing::warn!(manifest = what, error = %e, "ignoring unreadable manifest");
            None
        }
    }
}

/// Common utility functions for manifest parsing.
pub mod utils {
    /// Extract package name from a requirement string.
    ///
    /// - `requests==2.31.0` → `requests`
    /// - `aiohttp>=3.0,<4` → `aiohttp`
    /// - `package[extra]>=1.0` → `package`
    /// - `pywin32; sys_platform == "win32"` → `pywin32`
    pub fn extract_package_name(req: &str) -> String {
        req.split(|c: char| matches!(c, '=' | '>' | '<' | '~' | '!' | '[' | ';' | ' ' | '@'))
            .next()
            .unwrap_or("")
            .trim()
            .to_string()
    }

    /// Check if a Python import name matches a distribution name.
    ///
    /// Import names often differ from the names packages are installed under:
    /// - py prefix: `pyyaml` → import `yaml`
    /// - python- prefix: `python-dateutil` → import `dateutil`
    /// - namespace packages: `google.cloud-storage` → import `google`
    /// - hyphens vs underscores: `typing-extensions` → import `typing_extensions`
    pub fn import_matches_package(import_name: &str, package_name: &str) -> bool {
        let pkg = package_name.to_lowercase();
        let imp = import_name.to_lowercase();

        if pkg == imp || pkg.replace('-', "_") == imp.replace('-', "_") {
            return true;
        }

        for prefix in ["py", "python-"] {
            if let Some(stripped) = pkg.strip_prefix(prefix) {
                if stripped.replace('-', "_") == imp {
                    return true;
                }
            }
        }

        if pkg.starts_with(&format!("{}.", imp)) || pkg.starts_with(&format!("{}-", imp)) {
            return true;
        }

        for suffix in ["-py", ".py", "-python", "-client", "-api"] {
            if pkg.strip_suffix(suffix) == Some(imp.as_str()) {
                return true;
            }
        }

        let squash = |s: &str| s.replace(|c: char| matches!(c, '-' | '_' | '.'), "");
        squash(&pkg) == squash(&imp)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_extract_package_name() {
            assert_eq!(extract_package_name("requests>=2.0"), "requests");
            assert_eq!(extract_package_name("aiohttp>=3.0,<4"), "aiohttp");
            assert_eq!(extract_package_name("package[extra]>=1.0"), "package");
            assert_eq!(extract_package_name("pywin32; sys_platform == 'win32'"), "pywin32");
            assert_eq!(extract_package_name("simple"), "simple");
        }

        #[test]
        fn test_import_matches_package() {
            assert!(import_matches_package("requests", "requests"));
            assert!(import_matches_package("yaml", "pyyaml"));
            assert!(import_matches_package("dateutil", "python-dateutil"));
            assert!(import_matches_package("google", "google.cloud-storage"));
            assert!(import_matches_package("typing_extensions", "typing-extensions"));
            assert!(import_matches_package("jwt", "jwt-python"));
            assert!(!import_matches_package("numpy", "pandas"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_detect_manifest_kinds() {
        let temp = TempDir::new().unwrap();
        assert!(detect_manifest_kinds(temp.path()).is_empty());

        std::fs::write(temp.path().join("package.json"), "{}").unwrap();
        std::fs::write(temp.path().join("go.mod"), "module example.com/x\n").unwrap();
        assert_eq!(
            detect_manifest_kinds(temp.path()),
            vec![ManifestKind::Node, ManifestKind::Go]
        );
    }

    #[test]
    fn test_unparsable_manifest_is_absent() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("package.json"), "{ not json").unwrap();
        std::fs::write(temp.path().join("requirements.txt"), "requests\n").unwrap();

        let manifests = ProjectManifests::load(temp.path());
        assert!(manifests.node.is_none());
        assert!(manifests.python.is_some());
        assert!(manifests.go.is_none());
    }
}
