//! Gates: independent analysis units behind one contract.
//!
//! A gate is built once per run from its config section, holds only that
//! validated config, and exposes a single `run` that never fails: per-file
//! problems skip the file, invalid configuration disables the gate at
//! construction. Gates never depend on each other.

mod ast;
mod async_safety;
mod content;
mod context;
mod deprecated;
mod file_size;
mod hallucinated_imports;
mod phantom;
mod required_files;
mod security;
mod test_quality;
mod types;

pub use ast::AstGate;
pub use async_safety::AsyncSafetyGate;
pub use content::ContentGate;
pub use context::{Deadline, GateContext};
pub use deprecated::DeprecatedApisGate;
pub use file_size::FileSizeGate;
pub use hallucinated_imports::HallucinatedImportsGate;
pub use phantom::PhantomApisGate;
pub use required_files::RequiredFilesGate;
pub use security::SecurityPatternsGate;
pub use test_quality::TestQualityGate;
pub use types::{
    cap_failures, clip_snippet, fold_violations, Failure, FailureCollector, Provenance, Severity,
    Violation,
};

use crate::config::Config;

/// Every gate id, in registration order.
pub const ALL_GATE_IDS: &[&str] = &[
    content::ID,
    file_size::ID,
    required_files::ID,
    ast::ID,
    security::ID,
    phantom::ID,
    deprecated::ID,
    async_safety::ID,
    test_quality::ID,
    hallucinated_imports::ID,
];

/// Gates cheap enough for the real-time hook budget.
///
/// Membership is an explicit opt-in: a gate is listed here only when its cost
/// is linear in the size of the files it is given and it needs no tree walk.
pub const FAST_GATE_IDS: &[&str] = &[
    content::ID,
    file_size::ID,
    security::ID,
    phantom::ID,
    deprecated::ID,
    async_safety::ID,
    hallucinated_imports::ID,
];

/// The analysis-unit contract.
pub trait Gate: Send + Sync {
    /// Stable machine id, used as the summary key.
    fn id(&self) -> &'static str;

    fn title(&self) -> &'static str;

    fn provenance(&self) -> Provenance;

    /// Disabled gates are reported as skipped and their `run` is a no-op.
    fn enabled(&self) -> bool {
        true
    }

    /// Analyse the context's files. Must not panic on malformed input and must
    /// return nothing, without touching the file system, when disabled.
    fn run(&self, ctx: &GateContext) -> Vec<Failure>;
}

/// Construct every gate from the configuration, enabled or not.
pub fn build_gates(config: &Config) -> Vec<Box<dyn Gate>> {
    let g = &config.gates;
    vec![
        Box::new(ContentGate::new(&g.content)),
        Box::new(FileSizeGate::new(&g.file_size)),
        Box::new(RequiredFilesGate::new(&g.required_files)),
        Box::new(AstGate::new(&g.ast)),
        Box::new(SecurityPatternsGate::new(&g.security_patterns)),
        Box::new(PhantomApisGate::new(&g.phantom_apis)),
        Box::new(DeprecatedApisGate::new(&g.deprecated_apis)),
        Box::new(AsyncSafetyGate::new(&g.async_safety)),
        Box::new(TestQualityGate::new(&g.test_quality)),
        Box::new(HallucinatedImportsGate::new(&g.hallucinated_imports)),
    ]
}

/// Construct the fast subset, restricted to `selected` when it is non-empty.
pub fn build_fast_gates(config: &Config, selected: &[String]) -> Vec<Box<dyn Gate>> {
    build_gates(config)
        .into_iter()
        .filter(|g| FAST_GATE_IDS.contains(&g.id()))
        .filter(|g| selected.is_empty() || selected.iter().any(|s| s == g.id()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_matches_ids() {
        let gates = build_gates(&Config::default());
        let ids: Vec<&str> = gates.iter().map(|g| g.id()).collect();
        assert_eq!(ids, ALL_GATE_IDS);
    }

    #[test]
    fn test_fast_gates_are_registered() {
        for id in FAST_GATE_IDS {
            assert!(ALL_GATE_IDS.contains(id), "{} is not a gate", id);
        }
        assert!(!FAST_GATE_IDS.contains(&"ast-analysis"));
        assert!(!FAST_GATE_IDS.contains(&"required-files"));
    }

    #[test]
    fn test_build_fast_gates_selection() {
        let config = Config::default();
        assert_eq!(build_fast_gates(&config, &[]).len(), FAST_GATE_IDS.len());

        let selected = vec!["async-safety".to_string()];
        let gates = build_fast_gates(&config, &selected);
        assert_eq!(gates.len(), 1);
        assert_eq!(gates[0].id(), "async-safety");
    }
}
