//! The Report: the one contract other tooling reads.
//!
//! Two output forms:
//! - JSON: `Report` serialized as is; field names and enum values only change
//!   together with [`SCHEMA_VERSION`]
//! - Pretty: colored terminal output for humans

use colored::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::ReportError;
use crate::gates::{Failure, Severity};

/// Version of the JSON shape below.
pub const SCHEMA_VERSION: u32 = 1;

/// Overall verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Pass,
    Fail,
}

/// Per-gate outcome in the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GateStatus {
    Pass,
    Fail,
    Skipped,
}

/// Scores, breakdowns and timing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub score: u32,
    pub ai_health_score: u32,
    pub structural_score: u32,
    pub severity_breakdown: BTreeMap<String, usize>,
    pub provenance_breakdown: BTreeMap<String, usize>,
    pub duration_ms: u64,
}

/// The result of one full run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub schema_version: u32,
    pub status: Status,
    /// Ordered by file, then line (unlined last), then id.
    pub failures: Vec<Failure>,
    /// Gate id to outcome.
    pub summary: BTreeMap<String, GateStatus>,
    pub stats: Stats,
}

impl Report {
    pub fn passed(&self) -> bool {
        self.status == Status::Pass
    }

    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Write `report` as JSON to `path` without ever leaving a partial file.
///
/// The JSON goes to a sibling temp file first, which is then renamed over
/// `path`.
pub fn write_report(report: &Report, path: &Path) -> Result<(), ReportError> {
    let json = report.to_json()?;
    let io_err = |source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = std::path::PathBuf::from(tmp);

    fs::write(&tmp, json).map_err(io_err)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(io_err(e));
    }
    tracing::info!(path = %path.display(), failures = report.failures.len(), "report written");
    Ok(())
}

// =============================================================================
// Pretty Format
// =============================================================================

/// Write the report in pretty (human-readable) format.
pub fn write_pretty(path: &str, report: &Report) {
    // Header
    println!();
    print!("  ");
    print!("{}", "rigour".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();

    print!("  {}", "Scanning: ".dimmed());
    println!("{}", path);
    println!();

    write_result_summary(report);
    println!();

    if !report.failures.is_empty() {
        write_failures(&report.failures);
        println!();
    }

    write_gate_summary(&report.summary);
    println!();
}

fn write_result_summary(report: &Report) {
    if report.passed() {
        print!("  {}", "✓ PASS".green());
    } else {
        print!("  {}", "✗ FAIL".red());
    }

    print!("  Score: ");
    write_colored_score(report.stats.score);
    print!("  AI health: ");
    write_colored_score(report.stats.ai_health_score);
    print!("  Structural: ");
    write_colored_score(report.stats.structural_score);
    print!("  {}", format!("({} ms)", report.stats.duration_ms).dimmed());
    println!();
}

fn write_colored_score(s: u32) {
    match s {
        s if s >= 90 => print!("{}", s.to_string().green().bold()),
        s if s >= 75 => print!("{}", s.to_string().green()),
        s if s >= 50 => print!("{}", s.to_string().yellow()),
        s if s >= 25 => print!("{}", s.to_string().yellow().bold()),
        _ => print!("{}", s.to_string().red()),
    }
}

fn write_failures(failures: &[Failure]) {
    println!("  {} ({}):", "Failures".bold(), failures.len());
    println!();

    for f in failures {
        write_severity_tag(f.severity);
        print!("   ");
        print!("{:<24}", f.id.dimmed());
        print!("{}", f.files.join(", ").blue());
        match (f.line, f.end_line) {
            (Some(start), Some(end)) => print!("{}", format!(":{}-{}", start, end).dimmed()),
            (Some(line), None) => print!("{}", format!(":{}", line).dimmed()),
            _ => {}
        }
        println!();

        // Title and details on the next lines, indented
        println!("             {}", f.title.bold());
        if !f.details.is_empty() {
            println!("             {}", f.details);
        }
        if let Some(hint) = &f.hint {
            println!("             {}", format!("hint: {}", hint).dimmed());
        }
        println!();
    }
}

fn write_severity_tag(severity: Severity) {
    match severity {
        Severity::Critical => print!("    {} ", "CRIT".red().bold()),
        Severity::High => print!("    {} ", "HIGH".red()),
        Severity::Medium => print!("    {} ", "MED ".yellow()),
        Severity::Low => print!("    {} ", "LOW ".blue()),
    }
}

fn write_gate_summary(summary: &BTreeMap<String, GateStatus>) {
    println!("  {}", "Gates:".bold());
    for (id, status) in summary {
        let tag = match status {
            GateStatus::Pass => "PASS".green(),
            GateStatus::Fail => "FAIL".red(),
            GateStatus::Skipped => "SKIPPED".dimmed(),
        };
        println!("    {:<24} {}", id, tag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gates::Provenance;
    use tempfile::TempDir;

    fn sample() -> Report {
        let failure = Failure::new(
            "unsafe-parse",
            "Unsafe parse",
            "JSON.parse outside try/catch",
            Severity::High,
            Provenance::AiDrift,
        )
        .in_file("app.js")
        .at_line(3);
        let mut summary = BTreeMap::new();
        summary.insert("async-safety".to_string(), GateStatus::Fail);
        summary.insert("ast-analysis".to_string(), GateStatus::Skipped);
        Report {
            schema_version: SCHEMA_VERSION,
            status: Status::Fail,
            failures: vec![failure],
            summary,
            stats: Stats {
                score: 90,
                ai_health_score: 90,
                structural_score: 100,
                severity_breakdown: BTreeMap::new(),
                provenance_breakdown: BTreeMap::new(),
                duration_ms: 12,
            },
        }
    }

    #[test]
    fn test_json_field_names() {
        let json: serde_json::Value = serde_json::from_str(&sample().to_json().unwrap()).unwrap();
        assert_eq!(json["schema_version"], 1);
        assert_eq!(json["status"], "FAIL");
        assert_eq!(json["summary"]["ast-analysis"], "SKIPPED");
        assert_eq!(json["failures"][0]["severity"], "high");
        assert_eq!(json["failures"][0]["provenance"], "ai-drift");
        assert_eq!(json["stats"]["ai_health_score"], 90);
        assert!(json["failures"][0].get("endLine").is_none());
    }

    #[test]
    fn test_write_report_replaces_atomically() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out/report.json");
        fs::create_dir_all(temp.path().join("out")).unwrap();
        fs::write(&path, "stale").unwrap();

        write_report(&sample(), &path).unwrap();

        let written: Report = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, sample());
        assert!(!temp.path().join("out/report.json.tmp").exists());
    }

    #[test]
    fn test_write_report_into_missing_directory() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/dir/report.json");
        write_report(&sample(), &path).unwrap();
        assert!(path.is_file());
    }
}
