//! Forbidden text: unfinished-work markers and user-supplied patterns.

use lazy_static::lazy_static;
use regex::Regex;

use super::{fold_violations, Failure, Gate, GateContext, Provenance, Severity, Violation};
use crate::config::ContentConfig;
use crate::language::Language;
use crate::scope::is_inside_string_literal;

pub const ID: &str = "content-check";

const KIND_TODO: &str = "todo";
const KIND_FIXME: &str = "fixme";
const KIND_PATTERN: &str = "pattern";

lazy_static! {
    static ref TODO_MARKER: Regex = Regex::new(r"\b(TODO|XXX|HACK)\b\s*:?\s*(.*)").unwrap();
    static ref FIXME_MARKER: Regex = Regex::new(r"\bFIXME\b\s*:?\s*(.*)").unwrap();
}

/// Pre-compiled pattern with its source text.
struct CompiledPattern {
    regex: Regex,
    source: String,
}

pub struct ContentGate {
    enabled: bool,
    forbid_todos: bool,
    forbid_fixme: bool,
    patterns: Vec<CompiledPattern>,
    max_per_file: usize,
}

impl ContentGate {
    pub fn new(config: &ContentConfig) -> Self {
        let mut enabled = config.enabled;
        let mut patterns = Vec::with_capacity(config.patterns.len());
        for source in &config.patterns {
            match Regex::new(source) {
                Ok(regex) => patterns.push(CompiledPattern {
                    regex,
                    source: source.clone(),
                }),
                Err(e) => {
                    tracing::warn!(gate = ID, pattern = %source, error = %e, "invalid pattern, gate disabled");
                    enabled = false;
                }
            }
        }
        Self {
            enabled,
            forbid_todos: config.forbid_todos,
            forbid_fixme: config.forbid_fixme,
            patterns,
            max_per_file: config.max_per_file,
        }
    }

    fn scan_line(&self, file: &str, line_no: usize, line: &str, out: &mut Vec<Violation>) {
        if self.forbid_todos {
            if let Some(m) = TODO_MARKER.find(line) {
                if !is_inside_string_literal(line, m.start()) {
                    out.push(Violation::new(file, line_no, KIND_TODO, line, "unfinished-work marker"));
                }
            }
        }
        if self.forbid_fixme {
            if let Some(m) = FIXME_MARKER.find(line) {
                if !is_inside_string_literal(line, m.start()) {
                    out.push(Violation::new(file, line_no, KIND_FIXME, line, "known-broken marker"));
                }
            }
        }
        for p in &self.patterns {
            let hit = p
                .regex
                .find_iter(line)
                .any(|m| !is_inside_string_literal(line, m.start()));
            if hit {
                out.push(Violation::new(
                    file,
                    line_no,
                    KIND_PATTERN,
                    line,
                    format!("forbidden pattern {:?}", p.source),
                ));
            }
        }
    }
}

impl Gate for ContentGate {
    fn id(&self) -> &'static str {
        ID
    }

    fn title(&self) -> &'static str {
        "Forbidden content"
    }

    fn provenance(&self) -> Provenance {
        Provenance::Traditional
    }

    fn enabled(&self) -> bool {
        self.enabled && (self.forbid_todos || self.forbid_fixme || !self.patterns.is_empty())
    }

    fn run(&self, ctx: &GateContext) -> Vec<Failure> {
        if !self.enabled() {
            return Vec::new();
        }

        let mut violations = Vec::new();
        for file in ctx.source_files(Language::ALL) {
            for (idx, line) in file.content.lines().enumerate() {
                if ctx.expired() {
                    break;
                }
                self.scan_line(&file.rel, idx + 1, line, &mut violations);
            }
        }

        fold_violations(violations, self.max_per_file, |v| {
            let severity = match v.kind {
                KIND_TODO => Severity::Low,
                _ => Severity::Medium,
            };
            Failure::new(
                "forbidden-content",
                "Forbidden content",
                format!("{}: {}", v.reason, v.snippet),
                severity,
                Provenance::Traditional,
            )
            .in_file(v.file)
            .at_line(v.line)
            .with_hint("Resolve the marker or move it to the issue tracker")
        })
    }
}
