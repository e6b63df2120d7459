//! Static rule tables.
//!
//! Tables are plain data compiled into the binary. Regex-backed tables are
//! compiled once on first use and never mutated afterwards; every lookup is
//! keyed by [`Language`](crate::language::Language), never by a string.

pub mod deprecated;
pub mod phantom;
pub mod security;
pub mod stdlib;

pub use deprecated::{deprecated_rules, DeprecatedRule};
pub use phantom::{known_members, module_aliases, named_imports, MemberSet, ModuleAlias, NamedImport};
pub use security::{security_rules, SecurityRule};
pub use stdlib::{is_node_builtin, is_python_stdlib};

use regex::Regex;

/// Why a rule exists. Drives severity and provenance of matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleCategory {
    /// Deprecated because it is exploitable or cryptographically weak.
    Security,
    /// Already removed from current runtimes; calling it fails.
    Removed,
    /// Still works but has a supported replacement.
    Deprecated,
}

impl RuleCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleCategory::Security => "security",
            RuleCategory::Removed => "removed",
            RuleCategory::Deprecated => "deprecated",
        }
    }
}

/// Compile a table pattern. Tables are static, so a failure is a bug in the
/// table; the rule is dropped with a warning rather than taking the run down.
pub(crate) fn compile(pattern: &str, table: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!(table, pattern, error = %e, "dropping invalid rule");
            None
        }
    }
}
