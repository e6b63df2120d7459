//! Scoring for rigour runs.
//!
//! Every score starts at 100 and loses a fixed penalty per failure:
//! critical 25, high 10, medium 4, low 1 (see [`Severity::penalty`]).
//! Sub-scores apply the same formula to one provenance only.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::gates::{Failure, Provenance, Severity};

/// Best possible score.
pub const MAX_SCORE: u32 = 100;

/// The three scores carried by a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scores {
    /// All failures.
    pub score: u32,
    /// Only `ai-drift` failures.
    pub ai_health_score: u32,
    /// Only `traditional` failures.
    pub structural_score: u32,
}

impl Default for Scores {
    fn default() -> Self {
        Self {
            score: MAX_SCORE,
            ai_health_score: MAX_SCORE,
            structural_score: MAX_SCORE,
        }
    }
}

/// `max(0, 100 - Σ penalty)` over `failures`.
pub fn score_of<'a, I>(failures: I) -> u32
where
    I: IntoIterator<Item = &'a Failure>,
{
    let penalty: u64 = failures
        .into_iter()
        .map(|f| u64::from(f.severity.penalty()))
        .sum();
    MAX_SCORE.saturating_sub(penalty.min(u64::from(MAX_SCORE)) as u32)
}

/// Calculate the overall score and both provenance sub-scores.
pub fn calculate(failures: &[Failure]) -> Scores {
    let restricted = |provenance: Provenance| {
        score_of(failures.iter().filter(|f| f.provenance == provenance))
    };
    Scores {
        score: score_of(failures),
        ai_health_score: restricted(Provenance::AiDrift),
        structural_score: restricted(Provenance::Traditional),
    }
}

/// Failure counts per severity; every severity is present, zero or not.
pub fn severity_breakdown(failures: &[Failure]) -> BTreeMap<String, usize> {
    let mut counts: BTreeMap<String, usize> = Severity::ALL
        .iter()
        .map(|s| (s.as_str().to_string(), 0))
        .collect();
    for f in failures {
        *counts.entry(f.severity.as_str().to_string()).or_default() += 1;
    }
    counts
}

/// Failure counts per provenance; every provenance is present, zero or not.
pub fn provenance_breakdown(failures: &[Failure]) -> BTreeMap<String, usize> {
    let mut counts: BTreeMap<String, usize> = Provenance::ALL
        .iter()
        .map(|p| (p.as_str().to_string(), 0))
        .collect();
    for f in failures {
        *counts.entry(f.provenance.as_str().to_string()).or_default() += 1;
    }
    counts
}

/// Whether any failure is at or above `threshold`.
pub fn blocks(failures: &[Failure], threshold: Severity) -> bool {
    failures.iter().any(|f| f.severity >= threshold)
}
