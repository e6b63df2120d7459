//! The read-only context shared by every gate of a run.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::error::ConfigError;
use crate::language::Language;
use crate::scanner::{FileScanner, SourceFile};

/// A cooperative wall-clock budget.
///
/// Scan loops poll [`Deadline::expired`]; nothing is interrupted from outside,
/// so whatever a gate returns after expiry can simply be discarded.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
        }
    }

    pub fn expired(&self) -> bool {
        Instant::now() >= self.at
    }
}

/// Working directory, effective file set, configuration and optional deadline.
///
/// Built once per run and never mutated afterwards; gates only read from it.
#[derive(Debug)]
pub struct GateContext {
    cwd: PathBuf,
    config: Arc<Config>,
    scanner: FileScanner,
    deadline: Option<Deadline>,
}

impl GateContext {
    /// Context over `cwd`, with the config's ignore globs added to the defaults.
    pub fn new<P: AsRef<Path>>(cwd: P, config: Arc<Config>) -> Result<Self, ConfigError> {
        let cwd = cwd.as_ref().to_path_buf();
        let scanner = FileScanner::new(&cwd, &config.ignore)?;
        Ok(Self {
            cwd,
            config,
            scanner,
            deadline: None,
        })
    }

    /// Restrict the file set to paths matching `patterns` (ignores still apply).
    pub fn with_file_patterns(mut self, patterns: &[String]) -> Result<Self, ConfigError> {
        self.scanner = self.scanner.with_patterns(patterns)?;
        Ok(self)
    }

    /// Use an explicit file list instead of walking `cwd`.
    pub fn with_files(mut self, files: Vec<PathBuf>) -> Self {
        self.scanner = self.scanner.with_files(files);
        self
    }

    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn scanner(&self) -> &FileScanner {
        &self.scanner
    }

    /// Whether the run's deadline, if any, has passed.
    pub fn expired(&self) -> bool {
        self.deadline.is_some_and(|d| d.expired())
    }

    /// Read every file in the set written in one of `languages`.
    ///
    /// Unreadable files are skipped; reading stops early once the deadline passes.
    pub fn source_files(&self, languages: &[Language]) -> Vec<SourceFile> {
        let paths = self.scanner.find_languages(languages);
        self.scanner.read_all(&paths, || self.expired())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_source_files_respects_ignores() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.ts"), "export const a = 1;\n").unwrap();
        fs::create_dir(temp.path().join("gen")).unwrap();
        fs::write(temp.path().join("gen/b.ts"), "export const b = 1;\n").unwrap();

        let mut config = Config::default();
        config.ignore.push("gen/**".to_string());
        let ctx = GateContext::new(temp.path(), Arc::new(config)).unwrap();

        let files = ctx.source_files(&[Language::TypeScript]);
        let rels: Vec<&str> = files.iter().map(|f| f.rel.as_str()).collect();
        assert_eq!(rels, vec!["a.ts"]);
    }

    #[test]
    fn test_expired_deadline_reads_nothing() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.py"), "x = 1\n").unwrap();

        let ctx = GateContext::new(temp.path(), Arc::new(Config::default()))
            .unwrap()
            .with_deadline(Deadline::after(Duration::ZERO));
        assert!(ctx.expired());
        assert!(ctx.source_files(&[Language::Python]).is_empty());
    }

    #[test]
    fn test_explicit_files_drop_missing() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.py"), "x = 1\n").unwrap();

        let ctx = GateContext::new(temp.path(), Arc::new(Config::default()))
            .unwrap()
            .with_files(vec![PathBuf::from("a.py"), PathBuf::from("gone.py")]);
        let files = ctx.source_files(&[Language::Python]);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].rel, "a.py");
    }
}
