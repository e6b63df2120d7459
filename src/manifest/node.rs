//! package.json manifest provider.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::{ManifestProvider, ManifestStats};

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PackageJson {
    name: Option<String>,
    dependencies: BTreeMap<String, serde_json::Value>,
    dev_dependencies: BTreeMap<String, serde_json::Value>,
    peer_dependencies: BTreeMap<String, serde_json::Value>,
    optional_dependencies: BTreeMap<String, serde_json::Value>,
}

/// Packages declared in a project's package.json, all dependency kinds merged.
pub struct NodeManifest {
    name: Option<String>,
    packages: HashSet<String>,
}

impl NodeManifest {
    pub fn from_root(root: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(root.join("package.json"))?;
        Self::parse(&content)
    }

    fn parse(content: &str) -> anyhow::Result<Self> {
        let pkg: PackageJson = serde_json::from_str(content)?;
        let packages = [
            pkg.dependencies,
            pkg.dev_dependencies,
            pkg.peer_dependencies,
            pkg.optional_dependencies,
        ]
        .into_iter()
        .flat_map(|deps| deps.into_keys())
        .collect();
        Ok(Self {
            name: pkg.name,
            packages,
        })
    }
}

/// The package an import specifier loads from.
///
/// `lodash/fp` → `lodash`, `@scope/pkg/sub` → `@scope/pkg`.
pub fn package_of(specifier: &str) -> &str {
    let mut slashes = specifier.match_indices('/');
    let cut = if specifier.starts_with('@') {
        slashes.nth(1)
    } else {
        slashes.next()
    };
    match cut {
        Some((i, _)) => &specifier[..i],
        None => specifier,
    }
}

impl ManifestProvider for NodeManifest {
    fn is_declared(&self, import_name: &str) -> bool {
        let package = package_of(import_name);
        self.packages.contains(package) || self.name.as_deref() == Some(package)
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
