//! Source language detection.
//!
//! A file's language is resolved once from its extension and then passed
//! explicitly into the scope primitives and rule tables.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Languages the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    JavaScript,
    TypeScript,
    Python,
    Go,
    Ruby,
    Java,
    CSharp,
    Rust,
}

/// How a language expresses "this code is protected by an error handler".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardStyle {
    /// `try { ... } catch (e) { ... }`
    Brace,
    /// `try:` / `except:` blocks delimited by indentation.
    Indent,
    /// `begin` / `rescue` / `end` blocks.
    Keyword,
    /// Calls return an error value that is checked afterwards (`if err != nil`).
    ErrorReturn,
    /// Errors are explicit in the type system; nothing is implicitly guarded.
    None,
}

/// How a language delimits function and class bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStyle {
    Brace,
    Indent,
    Keyword,
}

impl Language {
    /// All supported languages.
    pub const ALL: &'static [Language] = &[
        Language::JavaScript,
        Language::TypeScript,
        Language::Python,
        Language::Go,
        Language::Ruby,
        Language::Java,
        Language::CSharp,
        Language::Rust,
    ];

    /// Resolve a language from a bare extension (without the dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "js" | "jsx" | "mjs" | "cjs" => Some(Language::JavaScript),
            "ts" | "tsx" | "mts" | "cts" => Some(Language::TypeScript),
            "py" | "pyi" => Some(Language::Python),
            "go" => Some(Language::Go),
            "rb" => Some(Language::Ruby),
            "java" => Some(Language::Java),
            "cs" => Some(Language::CSharp),
            "rs" => Some(Language::Rust),
            _ => None,
        }
    }

    /// Resolve a language from a file path.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Python => "python",
            Language::Go => "go",
            Language::Ruby => "ruby",
            Language::Java => "java",
            Language::CSharp => "csharp",
            Language::Rust => "rust",
        }
    }

    pub fn guard_style(&self) -> GuardStyle {
        match self {
            Language::JavaScript | Language::TypeScript | Language::Java | Language::CSharp => {
                GuardStyle::Brace
            }
            Language::Python => GuardStyle::Indent,
            Language::Ruby => GuardStyle::Keyword,
            Language::Go => GuardStyle::ErrorReturn,
            Language::Rust => GuardStyle::None,
        }
    }

    pub fn block_style(&self) -> BlockStyle {
        match self {
            Language::Python => BlockStyle::Indent,
            Language::Ruby => BlockStyle::Keyword,
            _ => BlockStyle::Brace,
        }
    }

    /// JavaScript and TypeScript share most rule tables.
    pub fn is_js_family(&self) -> bool {
        matches!(self, Language::JavaScript | Language::TypeScript)
    }

    /// Whether a trimmed line is a whole-line comment in this language.
    pub fn is_comment_line(&self, trimmed: &str) -> bool {
        match self {
            Language::Python | Language::Ruby => trimmed.starts_with('#'),
            _ => {
                trimmed.starts_with("//")
                    || trimmed.starts_with("/*")
                    || trimmed.starts_with("* ")
                    || trimmed == "*"
                    || trimmed.starts_with("*/")
            }
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
