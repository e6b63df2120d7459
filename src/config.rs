//! Configuration schema for rigour.
//!
//! Configuration lives in `rigour.yml` at the project root. Every field has a
//! default, so an empty (or missing) file yields a working setup.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::gates::{Severity, FAST_GATE_IDS};

/// Config file names searched for, in order.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &["rigour.yml", "rigour.yaml", ".rigour.yml"];

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub version: u32,
    /// Extra ignore globs, merged with the built-in ignores.
    pub ignore: Vec<String>,
    pub gates: GatesConfig,
    pub hooks: HooksConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: 1,
            ignore: Vec::new(),
            gates: GatesConfig::default(),
            hooks: HooksConfig::default(),
        }
    }
}

impl Config {
    /// Parse a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse configuration from YAML text. Empty text yields the defaults.
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Config::default());
        }
        serde_yaml::from_str(content)
    }

    /// Find a config file in `dir`, if any.
    pub fn discover(dir: &Path) -> Option<PathBuf> {
        DEFAULT_CONFIG_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|p| p.is_file())
    }

    /// Load the config discovered in `dir`, or the defaults when there is none.
    pub fn load_or_default(dir: &Path) -> Result<Self, ConfigError> {
        match Self::discover(dir) {
            Some(path) => Self::load(path),
            None => Ok(Config::default()),
        }
    }

    /// The severity at or above which a run fails. Falls back to `high`.
    pub fn block_threshold(&self) -> Severity {
        self.gates
            .block_on_severity
            .parse()
            .unwrap_or(Severity::High)
    }

    /// Render the configuration as YAML (used by `rigour init`).
    pub fn to_yaml(&self) -> anyhow::Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Per-gate settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatesConfig {
    pub block_on_severity: String,
    pub content: ContentConfig,
    pub file_size: FileSizeConfig,
    pub required_files: RequiredFilesConfig,
    pub ast: AstConfig,
    pub security_patterns: SecurityPatternsConfig,
    pub phantom_apis: PhantomApisConfig,
    pub deprecated_apis: DeprecatedApisConfig,
    pub async_safety: AsyncSafetyConfig,
    pub test_quality: TestQualityConfig,
    pub hallucinated_imports: HallucinatedImportsConfig,
}

impl Default for GatesConfig {
    fn default() -> Self {
        Self {
            block_on_severity: "high".to_string(),
            content: ContentConfig::default(),
            file_size: FileSizeConfig::default(),
            required_files: RequiredFilesConfig::default(),
            ast: AstConfig::default(),
            security_patterns: SecurityPatternsConfig::default(),
            phantom_apis: PhantomApisConfig::default(),
            deprecated_apis: DeprecatedApisConfig::default(),
            async_safety: AsyncSafetyConfig::default(),
            test_quality: TestQualityConfig::default(),
            hallucinated_imports: HallucinatedImportsConfig::default(),
        }
    }
}

/// Forbidden-text settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ContentConfig {
    pub enabled: bool,
    pub forbid_todos: bool,
    pub forbid_fixme: bool,
    /// Extra regexes that must not appear in source files.
    pub patterns: Vec<String>,
    pub max_per_file: usize,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            forbid_todos: true,
            forbid_fixme: true,
            patterns: Vec::new(),
            max_per_file: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FileSizeConfig {
    pub enabled: bool,
    pub max_lines: usize,
}

impl Default for FileSizeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_lines: 500,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RequiredFilesConfig {
    pub enabled: bool,
    pub files: Vec<String>,
}

impl Default for RequiredFilesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            files: Vec::new(),
        }
    }
}

/// Structural limits for functions and classes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AstConfig {
    pub enabled: bool,
    /// Maximum cyclomatic complexity per function.
    pub complexity: usize,
    pub max_params: usize,
    pub max_methods: usize,
    pub max_function_lines: usize,
    pub max_per_file: usize,
}

impl Default for AstConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            complexity: 10,
            max_params: 5,
            max_methods: 12,
            max_function_lines: 80,
            max_per_file: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityPatternsConfig {
    pub enabled: bool,
    /// Also scan test files (default: false).
    pub include_tests: bool,
    pub max_per_file: usize,
}

impl Default for SecurityPatternsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            include_tests: false,
            max_per_file: 20,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PhantomApisConfig {
    pub enabled: bool,
    pub max_per_file: usize,
}

impl Default for PhantomApisConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_per_file: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DeprecatedApisConfig {
    pub enabled: bool,
    /// Escalate security-category deprecations to critical.
    pub block_security_deprecated: bool,
    pub max_per_file: usize,
}

impl Default for DeprecatedApisConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            block_security_deprecated: true,
            max_per_file: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AsyncSafetyConfig {
    pub enabled: bool,
    pub check_unsafe_parse: bool,
    pub check_unhandled_then: bool,
    pub check_async_without_await: bool,
    pub check_floating_promises: bool,
    /// Lines scanned backward/forward when looking for a guard.
    pub guard_window: usize,
    pub max_per_file: usize,
}

impl Default for AsyncSafetyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            check_unsafe_parse: true,
            check_unhandled_then: true,
            check_async_without_await: true,
            check_floating_promises: true,
            guard_window: crate::scope::DEFAULT_WINDOW,
            max_per_file: 20,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TestQualityConfig {
    pub enabled: bool,
    pub check_empty_tests: bool,
    pub check_tautological: bool,
    pub check_focused: bool,
    pub check_skipped: bool,
    pub max_per_file: usize,
}

impl Default for TestQualityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            check_empty_tests: true,
            check_tautological: true,
            check_focused: true,
            check_skipped: true,
            max_per_file: 20,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HallucinatedImportsConfig {
    pub enabled: bool,
    /// Package names never reported (internal aliases, generated modules).
    pub allowlist: Vec<String>,
    pub max_per_file: usize,
}

impl Default for HallucinatedImportsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowlist: Vec::new(),
            max_per_file: 10,
        }
    }
}

/// Settings for the real-time hook path.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HooksConfig {
    pub timeout_ms: u64,
    /// Gates to run in hook mode; must be a subset of the fast-gate list.
    /// Empty means all fast gates.
    pub fast_gates: Vec<String>,
}

impl Default for HooksConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5000,
            fast_gates: Vec::new(),
        }
    }
}

/// Validate a configuration for correctness.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    config
        .gates
        .block_on_severity
        .parse::<Severity>()
        .map_err(|_| ConfigError::InvalidSeverity(config.gates.block_on_severity.clone()))?;

    for pattern in &config.gates.content.patterns {
        regex::Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;
    }

    for pattern in &config.ignore {
        globset::Glob::new(pattern).map_err(|e| ConfigError::InvalidGlob {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;
    }

    for gate in &config.hooks.fast_gates {
        if !FAST_GATE_IDS.contains(&gate.as_str()) {
            return Err(ConfigError::UnknownFastGate(gate.clone()));
        }
    }

    let g = &config.gates;
    let caps = [
        ("content", g.content.max_per_file),
        ("ast", g.ast.max_per_file),
        ("security_patterns", g.security_patterns.max_per_file),
        ("phantom_apis", g.phantom_apis.max_per_file),
        ("deprecated_apis", g.deprecated_apis.max_per_file),
        ("async_safety", g.async_safety.max_per_file),
        ("test_quality", g.test_quality.max_per_file),
        ("hallucinated_imports", g.hallucinated_imports.max_per_file),
    ];
    if let Some((gate, _)) = caps.into_iter().find(|(_, cap)| *cap == 0) {
        return Err(ConfigError::ZeroCap(gate));
    }

    Ok(())
}
