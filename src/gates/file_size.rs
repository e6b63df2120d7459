//! Oversized source files.

use super::{Failure, FailureCollector, Gate, GateContext, Provenance, Severity};
use crate::config::FileSizeConfig;
use crate::language::Language;

pub const ID: &str = "file-size";

pub struct FileSizeGate {
    enabled: bool,
    max_lines: usize,
}

impl FileSizeGate {
    pub fn new(config: &FileSizeConfig) -> Self {
        Self {
            enabled: config.enabled && config.max_lines > 0,
            max_lines: config.max_lines,
        }
    }
}

impl Gate for FileSizeGate {
    fn id(&self) -> &'static str {
        ID
    }

    fn title(&self) -> &'static str {
        "File size"
    }

    fn provenance(&self) -> Provenance {
        Provenance::Traditional
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn run(&self, ctx: &GateContext) -> Vec<Failure> {
        if !self.enabled {
            return Vec::new();
        }

        let mut collector = FailureCollector::new(1);
        for file in ctx.source_files(Language::ALL) {
            if ctx.expired() {
                break;
            }
            let lines = file.content.lines().count();
            if lines <= self.max_lines {
                continue;
            }
            // Twice the limit is a structural problem, not just a long file.
            let severity = if lines > self.max_lines * 2 {
                Severity::Medium
            } else {
                Severity::Low
            };
            collector.push(
                Failure::new(
                    "file-too-large",
                    "File too large",
                    format!("{} lines (limit {})", lines, self.max_lines),
                    severity,
                    Provenance::Traditional,
                )
                .in_file(file.rel)
                .with_hint("Split the file by responsibility"),
            );
        }
        collector.finish()
    }
}
