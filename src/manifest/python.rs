//! Standard Python manifest provider.
//!
//! Parses standard Python project files:
//! - pyproject.toml (PEP 621 and Poetry dependency tables)
//! - requirements.txt and requirements*.txt
//! - setup.cfg

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use super::utils::{extract_package_name, import_matches_package};
use super::{ManifestProvider, ManifestStats};

/// Packages declared by a Python project's configuration files.
pub struct PythonManifest {
    root: PathBuf,
    /// Declared distributions, lowercased.
    packages: HashSet<String>,
}

impl PythonManifest {
    pub fn from_root(root: &Path) -> anyhow::Result<Self> {
        let mut manifest = Self {
            root: root.to_path_buf(),
            packages: HashSet::new(),
        };

        manifest.parse_requirements_txt()?;
        manifest.parse_pyproject_toml()?;
        manifest.parse_setup_cfg()?;

        Ok(manifest)
    }

    fn insert(&mut self, requirement: &str) {
        let name = extract_package_name(requirement);
        if !name.is_empty() && !name.starts_with(|c: char| c == '#' || c == '[' || c == '{') {
            self.packages.insert(name.to_lowercase());
        }
    }

    /// Parse requirements*.txt files at root.
    fn parse_requirements_txt(&mut self) -> anyhow::Result<()> {
        let Ok(entries) = fs::read_dir(&self.root) else {
            return Ok(());
        };
        let mut files: Vec<PathBuf> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("requirements") && n.ends_with(".txt"))
            })
            .collect();
        files.sort();

        for path in files {
            let content = fs::read_to_string(&path)?;
            for line in content.lines() {
                let line = line.trim();
                // Comments, blank lines and pip options (-r, -e, --index-url).
                if line.is_empty() || line.starts_with('#') || line.starts_with('-') {
                    continue;
                }
                self.insert(line);
            }
        }
        Ok(())
    }

    /// Parse pyproject.toml dependency arrays and tables.
    fn parse_pyproject_toml(&mut self) -> anyhow::Result<()> {
        let path = self.root.join("pyproject.toml");
        if !path.exists() {
            return Ok(());
        }

        let content = fs::read_to_string(&path)?;
        let mut section = String::new();
        let mut in_deps = false;
        let mut depth = 0usize;

        for line in content.lines() {
            let trimmed = line.trim();

            if in_deps {
                self.parse_array_line(trimmed, &mut depth, &mut in_deps);
                continue;
            }

            if trimmed.starts_with('[') {
                section = trimmed.trim_matches(|c| c == '[' || c == ']').trim().to_string();
                continue;
            }

            let Some((key, value)) = trimmed.split_once('=') else { continue };
            let key = key.trim().trim_matches('"');
            let value = value.trim();

            // [tool.poetry.dependencies], [tool.poetry.group.dev.dependencies]
            if section.starts_with("tool.poetry") && section.ends_with("dependencies") {
                if key != "python" {
                    self.insert(key);
                }
                continue;
            }

            let dependency_array = key == "dependencies"
                || section == "project.optional-dependencies"
                || section == "dependency-groups";
            if dependency_array && value.starts_with('[') {
                in_deps = true;
                depth = 0;
                self.parse_array_line(value, &mut depth, &mut in_deps);
            }
        }

        Ok(())
    }

    /// Consume one line of a TOML string array, tracking bracket depth.
    fn parse_array_line(&mut self, line: &str, depth: &mut usize, in_deps: &mut bool) {
        *depth += line.matches('[').count();
        for item in line.split(',') {
            let cleaned = item
                .trim()
                .trim_start_matches('[')
                .trim_end_matches(']')
                .trim()
                .trim_matches(|c| c == '"' || c == '\'');
            if !cleaned.is_empty() {
                self.insert(cleaned);
            }
        }
        *depth = depth.saturating_sub(line.matches(']').count());
        if *depth == 0 {
            *in_deps = false;
        }
    }

    /// Parse setup.cfg [options] install_requires.
    fn parse_setup_cfg(&mut self) -> anyhow::Result<()> {
        let path = self.root.join("setup.cfg");
        if !path.exists() {
            return Ok(());
        }

        let content = fs::read_to_string(&path)?;
        let mut in_install_requires = false;

        for line in content.lines() {
            let trimmed = line.trim();

            if trimmed.starts_with('[') {
                in_install_requires = false;
            }

            if trimmed.starts_with("install_requires") {
                in_install_requires = true;
                if let Some((_, value)) = trimmed.split_once('=') {
                    let value = value.trim();
                    if !value.is_empty() {
                        self.insert(value);
                    }
                }
                continue;
            }

            if in_install_requires {
                // Continuation lines are indented.
                if !line.starts_with(' ') && !line.starts_with('\t') && !trimmed.is_empty() {
                    in_install_requires = false;
                    continue;
                }
                self.insert(trimmed);
            }
        }

        Ok(())
    }
}

impl ManifestProvider for PythonManifest {
    fn is_declared(&self, import_name: &str) -> bool {
        let top = import_name.split('.').next().unwrap_or(import_name).to_lowercase();
        self.packages.contains(&top)
            || self.packages.iter().any(|pkg| import_matches_package(&top, pkg))
    }

    fn declared_packages(&self) -> Vec<String> {
        let mut packages: Vec<String> = self.packages.iter().cloned().collect();
        packages.sort();
        packages
    }

    fn stats(&self) -> ManifestStats {
        ManifestStats {
            package_count: self.packages.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_requirements_txt() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("requirements.txt"),
            "# Comment\nrequests>=2.0\nflask==2.0.1\npandas[sql]>=1.3.0\n-r other.txt\n--index-url https://example.org\n",
        )
        .unwrap();
        fs::write(temp.path().join("requirements-dev.txt"), "pytest\n").unwrap();

        let manifest = PythonManifest::from_root(temp.path()).unwrap();
        assert!(manifest.packages.contains("requests"));
        assert!(manifest.packages.contains("flask"));
        assert!(manifest.packages.contains("pandas"));
        assert!(manifest.packages.contains("pytest"));
        assert!(!manifest.packages.contains("-r"));
        assert_eq!(manifest.stats().package_count, 4);
    }

    #[test]
    fn test_parse_pyproject_pep621() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("pyproject.toml"),
            "[project]\nname = \"myproject\"\ndependencies = [\n    \"requests>=2.0\",\n    \"flask\",\n]\n\n[project.optional-dependencies]\ndev = [\"pytest\", \"black\"]\n",
        )
        .unwrap();

        let manifest = PythonManifest::from_root(temp.path()).unwrap();
        assert!(manifest.packages.contains("requests"));
        assert!(manifest.packages.contains("flask"));
        assert!(manifest.packages.contains("pytest"));
        assert!(manifest.packages.contains("black"));
        assert!(!manifest.packages.contains("myproject"));
    }

    #[test]
    fn test_parse_pyproject_poetry() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("pyproject.toml"),
            "[tool.poetry.dependencies]\npython = \"^3.11\"\nhttpx = \"^0.27\"\npydantic = { version = \"^2\" }\n\n[tool.black]\nline-length = 100\n",
        )
        .unwrap();

        let manifest = PythonManifest::from_root(temp.path()).unwrap();
        assert!(manifest.packages.contains("httpx"));
        assert!(manifest.packages.contains("pydantic"));
        assert!(!manifest.packages.contains("python"));
        assert!(!manifest.packages.contains("line-length"));
    }

    #[test]
    fn test_setup_cfg_and_import_matching() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("setup.cfg"),
            "[options]\ninstall_requires =\n    PyYAML>=6\n    python-dateutil\n\n[flake8]\nmax-line-length = 100\n",
        )
        .unwrap();

        let manifest = PythonManifest::from_root(temp.path()).unwrap();
        assert!(manifest.is_declared("yaml"));
        assert!(manifest.is_declared("dateutil.parser"));
        assert!(!manifest.is_declared("numpy"));
    }
}
