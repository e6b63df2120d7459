//! The fast/hook run: a latency-bounded check of a few files.
//!
//! Editors and agents call this synchronously around a file write, so it
//! runs only the fast gates, only over the files it is given, and under a
//! wall-clock budget. Running out of budget is not an error: the result is a
//! pass with no failures and `timed_out` set. Blocking an edit forever is
//! worse than missing a check.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::gates::{build_fast_gates, Deadline, Failure, GateContext};
use crate::runner::{execute, merge_failures};
use crate::score;

/// Hook verdict; `fail` means the edit should be blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HookStatus {
    Pass,
    Fail,
}

/// The result of one hook run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookResult {
    pub status: HookStatus,
    pub failures: Vec<Failure>,
    /// Files that existed and were handed to the gates.
    pub files_checked: usize,
    /// The budget ran out; `status` is `pass` regardless of findings.
    pub timed_out: bool,
    pub duration_ms: u64,
}

impl HookResult {
    fn pass(files_checked: usize, timed_out: bool, started: Instant) -> Self {
        Self {
            status: HookStatus::Pass,
            failures: Vec::new(),
            files_checked,
            timed_out,
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }

    pub fn blocked(&self) -> bool {
        self.status == HookStatus::Fail
    }
}

/// Check `files` (absolute, or relative to `cwd`) with the fast gates.
///
/// `timeout` overrides `hooks.timeout_ms`. Missing files are dropped; with
/// nothing left to check the result is a pass.
pub fn run_hook(cwd: &Path, files: &[PathBuf], config: &Config, timeout: Option<Duration>) -> HookResult {
    let started = Instant::now();
    let budget = timeout.unwrap_or(Duration::from_millis(config.hooks.timeout_ms));
    let deadline = Deadline::after(budget);

    let existing: Vec<PathBuf> = files
        .iter()
        .map(|f| if f.is_absolute() { f.clone() } else { cwd.join(f) })
        .filter(|f| f.is_file())
        .collect();
    if existing.is_empty() {
        tracing::debug!(requested = files.len(), "no hook target exists, nothing to check");
        return HookResult::pass(0, false, started);
    }
    let files_checked = existing.len();

    let ctx = match GateContext::new(cwd, Arc::new(config.clone())) {
        Ok(ctx) => ctx.with_files(existing).with_deadline(deadline),
        Err(e) => {
            tracing::warn!(error = %e, "hook context failed, passing");
            return HookResult::pass(files_checked, false, started);
        }
    };

    let gates = build_fast_gates(config, &config.hooks.fast_gates);
    let outcomes: Vec<Vec<Failure>> = gates
        .par_iter()
        .map(|g| execute(g.as_ref(), &ctx).failures)
        .collect();

    if deadline.expired() {
        tracing::warn!(budget_ms = budget.as_millis() as u64, "hook deadline exceeded, passing");
        return HookResult::pass(files_checked, true, started);
    }

    let failures = merge_failures(outcomes);
    let status = if score::blocks(&failures, config.block_threshold()) {
        HookStatus::Fail
    } else {
        HookStatus::Pass
    };
    HookResult {
        status,
        failures,
        files_checked,
        timed_out: false,
        duration_ms: started.elapsed().as_millis() as u64,
    }
}
