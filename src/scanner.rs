//! File discovery and bulk reads.
//!
//! Discovery walks the working directory once, pruning heavy directories and
//! honouring the merged ignore globs. Reads run in fixed-width parallel
//! batches to cap open descriptors and memory on large trees.

use globset::{Glob, GlobSet, GlobSetBuilder};
use once_cell::sync::OnceCell;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use walkdir::WalkDir;

use crate::error::ConfigError;
use crate::language::Language;

/// Ignore globs that always apply. User globs are added to these, never replace them.
pub const DEFAULT_IGNORES: &[&str] = &[
    "**/node_modules/**",
    "**/.git/**",
    "**/dist/**",
    "**/build/**",
    "**/target/**",
    "**/vendor/**",
    "**/.venv/**",
    "**/venv/**",
    "**/__pycache__/**",
    "**/coverage/**",
    "**/.next/**",
    "**/*.min.js",
    "**/*.d.ts",
];

/// Directory names pruned during the walk without consulting the globs.
const PRUNED_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "target",
    "vendor",
    ".venv",
    "venv",
    "__pycache__",
    ".next",
];

/// Number of files read concurrently per batch.
pub const READ_BATCH: usize = 10;

/// Files larger than this are skipped.
pub const MAX_FILE_BYTES: u64 = 1_000_000;

/// A source file that was successfully read.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Absolute path on disk.
    pub path: PathBuf,
    /// Path relative to the working directory, `/`-separated. Used in Failures.
    pub rel: String,
    pub language: Option<Language>,
    pub content: String,
}

impl SourceFile {
    pub fn lines(&self) -> Vec<&str> {
        self.content.lines().collect()
    }

    /// Whether this looks like a test file by name or directory.
    pub fn is_test(&self) -> bool {
        is_test_path(&self.rel)
    }
}

/// Whether a relative path names a test file.
pub fn is_test_path(rel: &str) -> bool {
    let name = rel.rsplit('/').next().unwrap_or(rel);
    let in_test_dir = rel
        .split('/')
        .any(|seg| seg == "test" || seg == "tests" || seg == "__tests__" || seg == "spec");

    in_test_dir
        || name.contains(".test.")
        || name.contains(".spec.")
        || name.starts_with("test_")
        || name.ends_with("_test.py")
        || name.ends_with("_test.go")
        || name.ends_with("_spec.rb")
        || name.ends_with("Test.java")
        || name.ends_with("Tests.cs")
}

/// Discovers and reads files under a root directory.
pub struct FileScanner {
    root: PathBuf,
    ignore: GlobSet,
    include: Option<GlobSet>,
    explicit: Option<Vec<PathBuf>>,
    discovered: OnceCell<Vec<PathBuf>>,
    invocations: AtomicUsize,
}

impl std::fmt::Debug for FileScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileScanner")
            .field("root", &self.root)
            .field("explicit", &self.explicit)
            .field("invocations", &self.invocations.load(Ordering::Relaxed))
            .finish()
    }
}

impl FileScanner {
    /// Create a scanner rooted at `root`, adding `extra_ignores` to the defaults.
    pub fn new<P: AsRef<Path>>(root: P, extra_ignores: &[String]) -> Result<Self, ConfigError> {
        let patterns = DEFAULT_IGNORES
            .iter()
            .map(|s| s.to_string())
            .chain(extra_ignores.iter().cloned());
        let ignore = build_globset(patterns)?;

        Ok(Self {
            root: root.as_ref().to_path_buf(),
            ignore,
            include: None,
            explicit: None,
            discovered: OnceCell::new(),
            invocations: AtomicUsize::new(0),
        })
    }

    /// Restrict discovery to files matching any of `patterns`.
    pub fn with_patterns(mut self, patterns: &[String]) -> Result<Self, ConfigError> {
        if !patterns.is_empty() {
            self.include = Some(build_globset(patterns.iter().cloned())?);
        }
        Ok(self)
    }

    /// Use an explicit file list instead of walking the tree.
    /// Entries that do not exist are dropped.
    pub fn with_files(mut self, files: Vec<PathBuf>) -> Self {
        let root = self.root.clone();
        let existing = files
            .into_iter()
            .map(|f| if f.is_absolute() { f } else { root.join(f) })
            .filter(|f| f.is_file())
            .collect();
        self.explicit = Some(existing);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of find/read calls made by gates so far.
    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::Relaxed)
    }

    /// Resolve the shared file set without counting it as a gate invocation.
    pub fn prime(&self) -> usize {
        self.all_files().len()
    }

    /// All discovered files, in sorted order.
    fn all_files(&self) -> &[PathBuf] {
        self.discovered.get_or_init(|| {
            let mut files = match &self.explicit {
                Some(list) => list
                    .iter()
                    .filter(|p| !self.is_ignored(p))
                    .cloned()
                    .collect(),
                None => self.walk(),
            };
            files.sort();
            files.dedup();
            files
        })
    }

    fn walk(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| {
                if e.depth() == 0 || !e.file_type().is_dir() {
                    return true;
                }
                let name = e.file_name().to_string_lossy();
                !PRUNED_DIRS.contains(&name.as_ref())
            });

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::debug!(error = %e, "skipping unreadable directory entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if self.is_ignored(path) {
                continue;
            }
            files.push(path.to_path_buf());
        }
        files
    }

    fn is_ignored(&self, path: &Path) -> bool {
        let rel = self.relative(path);
        if self.ignore.is_match(&rel) {
            return true;
        }
        match &self.include {
            Some(include) => !include.is_match(&rel),
            None => false,
        }
    }

    /// Path relative to the root with `/` separators.
    pub fn relative(&self, path: &Path) -> String {
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        rel.to_string_lossy().replace('\\', "/")
    }

    /// Files whose language is one of `languages`.
    pub fn find_languages(&self, languages: &[Language]) -> Vec<PathBuf> {
        self.invocations.fetch_add(1, Ordering::Relaxed);
        self.all_files()
            .iter()
            .filter(|p| {
                Language::from_path(p)
                    .map(|l| languages.contains(&l))
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }

    /// Files with any supported language.
    pub fn find_sources(&self) -> Vec<PathBuf> {
        self.find_languages(Language::ALL)
    }

    /// Files whose relative path matches one of `patterns`.
    pub fn find_matching(&self, patterns: &[&str]) -> Vec<PathBuf> {
        self.invocations.fetch_add(1, Ordering::Relaxed);
        let set = match build_globset(patterns.iter().map(|s| s.to_string())) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "invalid scan pattern");
                return Vec::new();
            }
        };
        self.all_files()
            .iter()
            .filter(|p| set.is_match(self.relative(p)))
            .cloned()
            .collect()
    }

    /// Read files in bounded parallel batches.
    ///
    /// Unreadable, binary and oversized files are skipped. `should_stop` is
    /// checked between batches so a deadline can cut the read short.
    pub fn read_all<F>(&self, paths: &[PathBuf], should_stop: F) -> Vec<SourceFile>
    where
        F: Fn() -> bool + Sync,
    {
        self.invocations.fetch_add(1, Ordering::Relaxed);
        let mut out = Vec::with_capacity(paths.len());
        for batch in paths.chunks(READ_BATCH) {
            if should_stop() {
                break;
            }
            let read: Vec<SourceFile> = batch
                .par_iter()
                .filter_map(|p| self.read_one(p))
                .collect();
            out.extend(read);
        }
        out
    }

    fn read_one(&self, path: &Path) -> Option<SourceFile> {
        match read_source(path) {
            Ok(content) => Some(SourceFile {
                path: path.to_path_buf(),
                rel: self.relative(path),
                language: Language::from_path(path),
                content,
            }),
            Err(e) => {
                tracing::debug!(file = %path.display(), error = %e, "skipping file");
                None
            }
        }
    }
}

fn read_source(path: &Path) -> anyhow::Result<String> {
    let metadata = std::fs::metadata(path)?;
    if metadata.len() > MAX_FILE_BYTES {
        anyhow::bail!("file too large ({} bytes)", metadata.len());
    }
    let bytes = std::fs::read(path)?;
    if bytes.iter().take(8192).any(|&b| b == 0) {
        anyhow::bail!("binary file");
    }
    Ok(String::from_utf8(bytes)?)
}

fn build_globset<I>(patterns: I) -> Result<GlobSet, ConfigError>
where
    I: IntoIterator<Item = String>,
{
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(&pattern).map_err(|e| ConfigError::InvalidGlob {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| ConfigError::InvalidGlob {
        pattern: String::new(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        std::fs::create_dir_all(root.join("src")).unwrap();
        std::fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        std::fs::create_dir_all(root.join("generated")).unwrap();
        std::fs::write(root.join("src/app.ts"), "export const a = 1;\n").unwrap();
        std::fs::write(root.join("src/util.py"), "x = 1\n").unwrap();
        std::fs::write(root.join("src/notes.md"), "# notes\n").unwrap();
        std::fs::write(root.join("node_modules/pkg/index.js"), "module.exports = 1;\n").unwrap();
        std::fs::write(root.join("generated/api.ts"), "export {};\n").unwrap();
        temp
    }

    #[test]
    fn test_default_ignores_always_apply() {
        let temp = tree();
        let scanner = FileScanner::new(temp.path(), &["**/generated/**".to_string()]).unwrap();
        let files: Vec<String> = scanner
            .find_sources()
            .iter()
            .map(|p| scanner.relative(p))
            .collect();
        assert_eq!(files, vec!["src/app.ts", "src/util.py"]);
    }

    #[test]
    fn test_find_matching_and_invocation_count() {
        let temp = tree();
        let scanner = FileScanner::new(temp.path(), &[]).unwrap();
        assert_eq!(scanner.invocations(), 0);
        scanner.prime();
        assert_eq!(scanner.invocations(), 0);

        let md = scanner.find_matching(&["**/*.md"]);
        assert_eq!(md.len(), 1);
        assert_eq!(scanner.invocations(), 1);
    }

    #[test]
    fn test_include_patterns_narrow_discovery() {
        let temp = tree();
        let scanner = FileScanner::new(temp.path(), &[])
            .unwrap()
            .with_patterns(&["**/*.py".to_string()])
            .unwrap();
        let files = scanner.find_sources();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("util.py"));
    }

    #[test]
    fn test_explicit_files_drop_missing() {
        let temp = tree();
        let scanner = FileScanner::new(temp.path(), &[])
            .unwrap()
            .with_files(vec![PathBuf::from("src/app.ts"), PathBuf::from("src/gone.ts")]);
        let files = scanner.find_sources();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_read_all_skips_binary_files() {
        let temp = tree();
        std::fs::write(temp.path().join("src/blob.js"), [0u8, 1, 2, 3]).unwrap();
        let scanner = FileScanner::new(temp.path(), &[]).unwrap();
        let paths = scanner.find_languages(&[Language::JavaScript, Language::TypeScript]);
        assert_eq!(paths.len(), 2);
        let read = scanner.read_all(&paths, || false);
        assert_eq!(read.len(), 1);
        assert_eq!(read[0].rel, "src/app.ts");
        assert_eq!(read[0].language, Some(Language::TypeScript));
    }

    #[test]
    fn test_read_all_honours_stop() {
        let temp = tree();
        let scanner = FileScanner::new(temp.path(), &[]).unwrap();
        let paths = scanner.find_sources();
        assert!(scanner.read_all(&paths, || true).is_empty());
    }

    #[test]
    fn test_is_test_path() {
        assert!(is_test_path("src/app.test.ts"));
        assert!(is_test_path("tests/test_api.py"));
        assert!(is_test_path("pkg/handler_test.go"));
        assert!(!is_test_path("src/contest.ts"));
    }
}
