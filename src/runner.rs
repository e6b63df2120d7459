//! The orchestrator: runs every configured gate and builds the Report.
//!
//! A run moves through `Idle → Discovering → Executing → Aggregating → Done`.
//! Gates execute concurrently on the rayon pool; their failures are merged
//! and sorted afterwards, so scheduling never shows in the output.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;

use crate::config::Config;
use crate::error::ConfigError;
use crate::gates::{build_gates, Failure, Gate, GateContext};
use crate::report::{GateStatus, Report, Stats, Status, SCHEMA_VERSION};
use crate::score;

/// Phases of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Discovering,
    Executing,
    Aggregating,
    Done,
}

/// One gate's contribution before aggregation.
pub(crate) struct GateOutcome {
    pub(crate) id: &'static str,
    pub(crate) status: GateStatus,
    pub(crate) failures: Vec<Failure>,
}

/// Executes a set of gates over one directory, once.
pub struct Runner {
    ctx: GateContext,
    gates: Vec<Box<dyn Gate>>,
    state: RunState,
}

impl Runner {
    /// Create a runner for `cwd` with every gate built from `config`.
    pub fn new<P: AsRef<Path>>(cwd: P, config: Config) -> Result<Self, ConfigError> {
        let gates = build_gates(&config);
        let ctx = GateContext::new(cwd, Arc::new(config))?;
        Ok(Self {
            ctx,
            gates,
            state: RunState::Idle,
        })
    }

    /// Restrict the shared file set to paths matching `patterns`.
    pub fn with_file_patterns(mut self, patterns: &[String]) -> Result<Self, ConfigError> {
        self.ctx = self.ctx.with_file_patterns(patterns)?;
        Ok(self)
    }

    /// Replace the configured gates.
    pub fn with_gates(mut self, gates: Vec<Box<dyn Gate>>) -> Self {
        self.gates = gates;
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// File-scanner calls made by gates so far.
    pub fn scanner_invocations(&self) -> usize {
        self.ctx.scanner().invocations()
    }

    fn enter(&mut self, state: RunState) {
        tracing::debug!(from = ?self.state, to = ?state, "runner state");
        self.state = state;
    }

    /// Run every gate and build the report. Never fails; a gate that panics
    /// is logged and reported as skipped.
    pub fn run(&mut self) -> Report {
        debug_assert_eq!(self.state, RunState::Idle, "a Runner runs once");
        let started = Instant::now();

        self.enter(RunState::Discovering);
        let files = self.ctx.scanner().prime();
        tracing::debug!(files, root = %self.ctx.cwd().display(), "file set resolved");

        self.enter(RunState::Executing);
        let ctx = &self.ctx;
        let outcomes: Vec<GateOutcome> = self
            .gates
            .par_iter()
            .map(|g| execute(g.as_ref(), ctx))
            .collect();

        self.enter(RunState::Aggregating);
        let report = aggregate(outcomes, self.ctx.config(), started);

        self.enter(RunState::Done);
        report
    }
}

/// Run one gate, containing any panic to that gate.
pub(crate) fn execute(gate: &dyn Gate, ctx: &GateContext) -> GateOutcome {
    let id = gate.id();
    if !gate.enabled() {
        tracing::debug!(gate = id, "gate disabled");
        return GateOutcome {
            id,
            status: GateStatus::Skipped,
            failures: Vec::new(),
        };
    }

    let started = Instant::now();
    tracing::debug!(gate = id, "gate started");
    match panic::catch_unwind(AssertUnwindSafe(|| gate.run(ctx))) {
        Ok(failures) => {
            tracing::debug!(
                gate = id,
                failures = failures.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "gate finished"
            );
            GateOutcome {
                id,
                status: if failures.is_empty() {
                    GateStatus::Pass
                } else {
                    GateStatus::Fail
                },
                failures,
            }
        }
        Err(_) => {
            tracing::error!(gate = id, "gate panicked, its findings are dropped");
            GateOutcome {
                id,
                status: GateStatus::Skipped,
                failures: Vec::new(),
            }
        }
    }
}

/// Report order: file, then line with unlined failures last, then id.
pub fn compare_failures(a: &Failure, b: &Failure) -> Ordering {
    a.primary_file()
        .cmp(b.primary_file())
        .then_with(|| match (a.line, b.line) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.id.cmp(&b.id))
}

/// Flatten and stably sort every gate's failures.
pub(crate) fn merge_failures(outcomes: impl IntoIterator<Item = Vec<Failure>>) -> Vec<Failure> {
    let mut failures: Vec<Failure> = outcomes.into_iter().flatten().collect();
    for f in &failures {
        debug_assert!(
            f.line.is_none() || !f.files.is_empty(),
            "failure {} has a line but no file",
            f.id
        );
    }
    failures.sort_by(compare_failures);
    failures
}

fn aggregate(outcomes: Vec<GateOutcome>, config: &Config, started: Instant) -> Report {
    let mut summary = BTreeMap::new();
    let mut per_gate = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        summary.insert(outcome.id.to_string(), outcome.status);
        per_gate.push(outcome.failures);
    }
    let failures = merge_failures(per_gate);

    let scores = score::calculate(&failures);
    let status = if score::blocks(&failures, config.block_threshold()) {
        Status::Fail
    } else {
        Status::Pass
    };

    Report {
        schema_version: SCHEMA_VERSION,
        status,
        summary,
        stats: Stats {
            score: scores.score,
            ai_health_score: scores.ai_health_score,
            structural_score: scores.structural_score,
            severity_breakdown: score::severity_breakdown(&failures),
            provenance_breakdown: score::provenance_breakdown(&failures),
            duration_ms: started.elapsed().as_millis() as u64,
        },
        failures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gates::{Provenance, Severity};
    use std::fs;
    use tempfile::TempDir;

    struct Fixed {
        id: &'static str,
        enabled: bool,
        failures: Vec<Failure>,
    }

    impl Gate for Fixed {
        fn id(&self) -> &'static str {
            self.id
        }
        fn title(&self) -> &'static str {
            "Fixed"
        }
        fn provenance(&self) -> Provenance {
            Provenance::Traditional
        }
        fn enabled(&self) -> bool {
            self.enabled
        }
        fn run(&self, ctx: &GateContext) -> Vec<Failure> {
            let _ = ctx.scanner().find_sources();
            self.failures.clone()
        }
    }

    struct Panics;

    impl Gate for Panics {
        fn id(&self) -> &'static str {
            "panics"
        }
        fn title(&self) -> &'static str {
            "Panics"
        }
        fn provenance(&self) -> Provenance {
            Provenance::Traditional
        }
        fn run(&self, _ctx: &GateContext) -> Vec<Failure> {
            panic!("boom")
        }
    }

    fn failure(id: &str, file: &str, line: Option<usize>, severity: Severity) -> Failure {
        let f = Failure::new(id, id, "", severity, Provenance::Traditional).in_file(file);
        match line {
            Some(l) => f.at_line(l),
            None => f,
        }
    }

    #[test]
    fn test_ordering_and_summary() {
        let temp = TempDir::new().unwrap();
        let gates: Vec<Box<dyn Gate>> = vec![
            Box::new(Fixed {
                id: "b-gate",
                enabled: true,
                failures: vec![
                    failure("z", "b.js", None, Severity::Low),
                    failure("y", "a.js", Some(9), Severity::Low),
                ],
            }),
            Box::new(Fixed {
                id: "a-gate",
                enabled: true,
                failures: vec![
                    failure("x", "b.js", Some(2), Severity::Low),
                    failure("a", "a.js", Some(9), Severity::Low),
                ],
            }),
            Box::new(Fixed {
                id: "off",
                enabled: false,
                failures: vec![failure("never", "a.js", Some(1), Severity::Critical)],
            }),
            Box::new(Fixed {
                id: "clean",
                enabled: true,
                failures: vec![],
            }),
        ];

        let mut runner = Runner::new(temp.path(), Config::default()).unwrap().with_gates(gates);
        let report = runner.run();
        assert_eq!(runner.state(), RunState::Done);

        let order: Vec<(&str, &str, Option<usize>)> = report
            .failures
            .iter()
            .map(|f| (f.primary_file(), f.id.as_str(), f.line))
            .collect();
        assert_eq!(
            order,
            vec![
                ("a.js", "a", Some(9)),
                ("a.js", "y", Some(9)),
                ("b.js", "x", Some(2)),
                ("b.js", "z", None),
            ]
        );
        assert_eq!(report.summary["a-gate"], GateStatus::Fail);
        assert_eq!(report.summary["off"], GateStatus::Skipped);
        assert_eq!(report.summary["clean"], GateStatus::Pass);
        assert_eq!(report.status, Status::Pass);
        assert_eq!(report.stats.score, 96);
        assert_eq!(report.stats.structural_score, 96);
        assert_eq!(report.stats.ai_health_score, 100);
    }

    #[test]
    fn test_disabled_gates_do_not_scan() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.js"), "JSON.parse(x);\n").unwrap();

        let mut config = Config::default();
        config.gates.async_safety.enabled = false;
        let gates: Vec<Box<dyn Gate>> = build_gates(&config)
            .into_iter()
            .filter(|g| g.id() == "async-safety")
            .collect();

        let mut runner = Runner::new(temp.path(), config).unwrap().with_gates(gates);
        let report = runner.run();
        assert!(report.failures.is_empty());
        assert_eq!(report.summary["async-safety"], GateStatus::Skipped);
        assert_eq!(runner.scanner_invocations(), 0);
    }

    #[test]
    fn test_block_threshold() {
        let temp = TempDir::new().unwrap();
        let gate = || -> Vec<Box<dyn Gate>> {
            vec![Box::new(Fixed {
                id: "g",
                enabled: true,
                failures: vec![failure("m", "a.js", Some(1), Severity::Medium)],
            })]
        };

        let report = Runner::new(temp.path(), Config::default()).unwrap().with_gates(gate()).run();
        assert_eq!(report.status, Status::Pass);

        let mut config = Config::default();
        config.gates.block_on_severity = "medium".to_string();
        let report = Runner::new(temp.path(), config).unwrap().with_gates(gate()).run();
        assert_eq!(report.status, Status::Fail);
    }

    #[test]
    fn test_panicking_gate_is_contained() {
        let temp = TempDir::new().unwrap();
        let gates: Vec<Box<dyn Gate>> = vec![
            Box::new(Panics),
            Box::new(Fixed {
                id: "ok",
                enabled: true,
                failures: vec![failure("h", "a.js", Some(1), Severity::High)],
            }),
        ];
        let report = Runner::new(temp.path(), Config::default()).unwrap().with_gates(gates).run();
        assert_eq!(report.summary["panics"], GateStatus::Skipped);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.status, Status::Fail);
    }
}
