//! Core types shared by every gate: severity, provenance and the Failure record.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Severity of a reported defect.
///
/// Variants are declared in ascending order so that `Ord` matches urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: &'static [Severity] = &[
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }

    /// Score penalty for one failure of this severity.
    pub fn penalty(&self) -> u32 {
        match self {
            Severity::Critical => 25,
            Severity::High => 10,
            Severity::Medium => 4,
            Severity::Low => 1,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "critical" => Ok(Severity::Critical),
            "high" => Ok(Severity::High),
            "medium" => Ok(Severity::Medium),
            "low" => Ok(Severity::Low),
            _ => Err(format!("unknown severity: {}", s)),
        }
    }
}

/// Where a defect comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provenance {
    Security,
    AiDrift,
    Traditional,
    Governance,
}

impl Provenance {
    pub const ALL: &'static [Provenance] = &[
        Provenance::Security,
        Provenance::AiDrift,
        Provenance::Traditional,
        Provenance::Governance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::Security => "security",
            Provenance::AiDrift => "ai-drift",
            Provenance::Traditional => "traditional",
            Provenance::Governance => "governance",
        }
    }
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single reported defect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub id: String,
    pub title: String,
    pub details: String,
    pub files: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(rename = "endLine", default, skip_serializing_if = "Option::is_none")]
    pub end_line: Option<usize>,
    pub severity: Severity,
    pub provenance: Provenance,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl Failure {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        details: impl Into<String>,
        severity: Severity,
        provenance: Provenance,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            details: details.into(),
            files: Vec::new(),
            line: None,
            end_line: None,
            severity,
            provenance,
            hint: None,
        }
    }

    pub fn in_file(mut self, file: impl Into<String>) -> Self {
        self.files.push(file.into());
        self
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn spanning(mut self, start: usize, end: usize) -> Self {
        self.line = Some(start);
        self.end_line = Some(end);
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn maybe_hint(mut self, hint: Option<String>) -> Self {
        self.hint = hint;
        self
    }

    /// The file used for ordering and capping (the first one listed).
    pub fn primary_file(&self) -> &str {
        self.files.first().map(|s| s.as_str()).unwrap_or("")
    }
}

/// A pre-aggregation finding, local to one gate.
///
/// Gates collect these while scanning and fold them into [`Failure`]s
/// (grouped by file, capped per file) before returning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub file: String,
    pub line: usize,
    pub kind: &'static str,
    pub snippet: String,
    pub reason: String,
    pub hint: Option<String>,
}

impl Violation {
    pub fn new(
        file: impl Into<String>,
        line: usize,
        kind: &'static str,
        snippet: &str,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            line,
            kind,
            snippet: clip_snippet(snippet),
            reason: reason.into(),
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: Option<String>) -> Self {
        self.hint = hint;
        self
    }
}

const SNIPPET_MAX: usize = 120;

/// Trim a source line for display, keeping it on one short line.
pub fn clip_snippet(line: &str) -> String {
    let trimmed = line.trim();
    if trimmed.chars().count() <= SNIPPET_MAX {
        return trimmed.to_string();
    }
    let mut clipped: String = trimmed.chars().take(SNIPPET_MAX).collect();
    clipped.push_str("...");
    clipped
}

/// Enforces the per-(id, file) finding ceiling.
///
/// Once a pair reaches the cap, exactly one "limit exceeded" marker is
/// emitted for it and every later finding for the pair is dropped.
#[derive(Debug)]
pub struct FailureCollector {
    cap: usize,
    counts: HashMap<(String, String), usize>,
    failures: Vec<Failure>,
}

impl FailureCollector {
    pub fn new(cap: usize) -> Self {
        Self {
            cap: cap.max(1),
            counts: HashMap::new(),
            failures: Vec::new(),
        }
    }

    pub fn push(&mut self, failure: Failure) {
        let key = (failure.id.clone(), failure.primary_file().to_string());
        let count = self.counts.entry(key).or_insert(0);
        *count += 1;

        if *count <= self.cap {
            self.failures.push(failure);
        } else if *count == self.cap + 1 {
            let marker = Failure {
                title: format!("{} limit exceeded", failure.title),
                details: format!(
                    "More than {} findings of this kind in {}; further findings were suppressed",
                    self.cap,
                    failure.primary_file()
                ),
                line: None,
                end_line: None,
                hint: Some("Fix the reported findings and re-run to see the rest".to_string()),
                ..failure
            };
            self.failures.push(marker);
        }
    }

    pub fn extend<I: IntoIterator<Item = Failure>>(&mut self, failures: I) {
        for failure in failures {
            self.push(failure);
        }
    }

    pub fn finish(self) -> Vec<Failure> {
        self.failures
    }
}

/// Fold violations into failures: grouped by file, ordered by line, capped.
pub fn fold_violations<F>(violations: Vec<Violation>, cap: usize, to_failure: F) -> Vec<Failure>
where
    F: Fn(Violation) -> Failure,
{
    let mut by_file: BTreeMap<String, Vec<Violation>> = BTreeMap::new();
    for v in violations {
        by_file.entry(v.file.clone()).or_default().push(v);
    }

    let mut collector = FailureCollector::new(cap);
    for (_, mut group) in by_file {
        group.sort_by(|a, b| a.line.cmp(&b.line).then_with(|| a.kind.cmp(b.kind)));
        for v in group {
            collector.push(to_failure(v));
        }
    }
    collector.finish()
}

/// Cap already-built failures, after ordering them by file and line.
///
/// For gates whose findings carry per-rule metadata that a [`Violation`]
/// cannot hold.
pub fn cap_failures(mut failures: Vec<Failure>, cap: usize) -> Vec<Failure> {
    failures.sort_by(|a, b| {
        a.primary_file()
            .cmp(b.primary_file())
            .then_with(|| a.line.cmp(&b.line))
            .then_with(|| a.id.cmp(&b.id))
    });
    let mut collector = FailureCollector::new(cap);
    collector.extend(failures);
    collector.finish()
}
