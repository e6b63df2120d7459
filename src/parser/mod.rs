//! Full-syntax-tree function metrics for languages with a tree-sitter grammar.
//!
//! This module provides:
//! - `Parser` trait: function spans and cyclomatic complexity from a real parse
//! - `for_file`: parser lookup by `Language` (and extension, for TSX)
//! - query-driven tree-sitter grammars for Python, JavaScript, TypeScript and Go
//!
//! The `ast-analysis` gate uses these to refine its heuristic complexity; for
//! every other language (or with the `tree-sitter` feature off) the heuristic
//! stands alone.

use std::path::Path;

use crate::language::Language;

#[cfg(feature = "tree-sitter")]
pub mod treesitter;

#[cfg(feature = "tree-sitter")]
pub mod languages;

/// One function (or method, or arrow function) found by a parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionMetrics {
    /// `None` for anonymous functions.
    pub name: Option<String>,
    /// 1-indexed first line of the function node.
    pub line: usize,
    /// 1-indexed last line of the function node.
    pub end_line: usize,
    /// Cyclomatic complexity: 1 plus one per branch point, nested functions included.
    pub complexity: u32,
}

/// Function metrics from a full parse.
pub trait Parser: Send + Sync {
    /// Every function in `source`, in document order.
    fn functions(&self, source: &[u8]) -> anyhow::Result<Vec<FunctionMetrics>>;

    /// Grammar name, e.g. `go` or `tsx`.
    fn language(&self) -> &str;
}

#[cfg(feature = "tree-sitter")]
use once_cell::sync::Lazy;

#[cfg(feature = "tree-sitter")]
mod registry {
    use once_cell::sync::Lazy;

    use super::languages::{go, javascript, python, typescript};
    use super::treesitter::{Grammar, QueryParser};

    fn compiled(grammar: Grammar) -> Option<QueryParser> {
        let name = grammar.name;
        QueryParser::compile(grammar)
            .map_err(|e| tracing::warn!(language = name, error = %format!("{:#}", e), "grammar disabled"))
            .ok()
    }

    pub(super) static PYTHON: Lazy<Option<QueryParser>> = Lazy::new(|| compiled(python::grammar()));
    pub(super) static JAVASCRIPT: Lazy<Option<QueryParser>> =
        Lazy::new(|| compiled(javascript::grammar()));
    pub(super) static TYPESCRIPT: Lazy<Option<QueryParser>> =
        Lazy::new(|| compiled(typescript::typescript_grammar()));
    pub(super) static TSX: Lazy<Option<QueryParser>> =
        Lazy::new(|| compiled(typescript::tsx_grammar()));
    pub(super) static GO: Lazy<Option<QueryParser>> = Lazy::new(|| compiled(go::grammar()));
}

/// The parser for a file's language, if it has one. Queries are compiled on
/// first use and shared for the rest of the process.
#[cfg(feature = "tree-sitter")]
pub fn for_file(language: Language, path: &Path) -> Option<&'static dyn Parser> {
    let slot = match language {
        Language::Python => &registry::PYTHON,
        Language::JavaScript => &registry::JAVASCRIPT,
        Language::TypeScript if path.extension().is_some_and(|e| e == "tsx") => &registry::TSX,
        Language::TypeScript => &registry::TYPESCRIPT,
        Language::Go => &registry::GO,
        _ => return None,
    };
    Lazy::force(slot).as_ref().map(|p| p as &'static dyn Parser)
}

/// No parsers without the tree-sitter grammars.
#[cfg(not(feature = "tree-sitter"))]
pub fn for_file(_language: Language, _path: &Path) -> Option<&'static dyn Parser> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(feature = "tree-sitter")]
    fn test_for_file() {
        let py = for_file(Language::Python, Path::new("a.py")).unwrap();
        assert_eq!(py.language(), "python");
        let tsx = for_file(Language::TypeScript, Path::new("App.tsx")).unwrap();
        assert_eq!(tsx.language(), "tsx");
        let ts = for_file(Language::TypeScript, Path::new("app.ts")).unwrap();
        assert_eq!(ts.language(), "typescript");
    }

    #[test]
    fn test_unsupported_language() {
        assert!(for_file(Language::Ruby, Path::new("a.rb")).is_none());
        assert!(for_file(Language::Rust, Path::new("lib.rs")).is_none());
    }
}
