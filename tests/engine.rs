//! Integration tests for the full gate pipeline.
//!
//! Each test builds a small project tree in a temp directory and runs the
//! public entry points against it: `Runner` for full runs, `run_hook` for
//! the fast path.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rigour::gates::{build_gates, ALL_GATE_IDS};
use rigour::{run_hook, Config, Failure, GateStatus, HookStatus, Report, Runner, Severity, Status};
use tempfile::TempDir;

fn write(root: &Path, rel: &str, body: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, body).unwrap();
}

fn run(root: &Path, config: Config) -> Report {
    Runner::new(root, config).expect("context should build").run()
}

/// A tree with something for most gates to find.
fn fixture() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write(
        root,
        "package.json",
        r#"{ "name": "app", "dependencies": { "express": "^4.18.0" } }"#,
    );
    write(
        root,
        "src/server.js",
        "const express = require('express');\n\
         const lodash = require('lodash');\n\
         // TODO: validate body\n\
         function handle(req) {\n\
           const body = JSON.parse(req.body);\n\
           return body;\n\
         }\n",
    );
    write(
        root,
        "src/files.ts",
        "import * as f from 'fs';\n\nexport function load() {\n  return f.readFil('a.txt');\n}\n",
    );
    write(
        root,
        "src/app.test.js",
        "describe('app', () => {\n  it.only('works', () => {\n    expect(true).toBe(true);\n  });\n});\n",
    );
    write(root, "node_modules/lodash/index.js", "JSON.parse(x);\n");
    temp
}

fn keys(failures: &[Failure]) -> HashSet<(String, String, Option<usize>)> {
    failures
        .iter()
        .map(|f| (f.id.clone(), f.primary_file().to_string(), f.line))
        .collect()
}

#[test]
fn test_lone_unguarded_parse() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "app.js", "JSON.parse(x)\n");

    let report = run(temp.path(), Config::default());
    assert_eq!(report.failures.len(), 1, "failures: {:?}", report.failures);
    let f = &report.failures[0];
    assert_eq!(f.id, "unsafe-parse");
    assert_eq!(f.severity, Severity::High);
    assert_eq!(f.files, vec!["app.js".to_string()]);
    assert_eq!(f.line, Some(1));
    assert_eq!(report.summary["async-safety"], GateStatus::Fail);
    assert_eq!(report.summary["phantom-apis"], GateStatus::Pass);
    assert_eq!(report.summary["deprecated-apis"], GateStatus::Pass);
    assert_eq!(report.status, Status::Fail);
    assert_eq!(report.stats.score, 90);
    assert_eq!(report.stats.ai_health_score, 90);
    assert_eq!(report.stats.structural_score, 100);
}

#[test]
fn test_phantom_member_on_alias() {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "a.ts",
        "import * as f from 'fs';\n\nf.nonExistentMethod();\n",
    );

    let report = run(temp.path(), Config::default());
    let phantom: Vec<&Failure> = report
        .failures
        .iter()
        .filter(|f| f.id == "phantom-api")
        .collect();
    assert_eq!(phantom.len(), 1);
    assert_eq!(phantom[0].line, Some(3));
    assert_eq!(phantom[0].hint, None);
}

#[test]
fn test_fixture_findings() {
    let temp = fixture();
    let report = run(temp.path(), Config::default());
    let found = keys(&report.failures);

    assert!(found.contains(&("unsafe-parse".into(), "src/server.js".into(), Some(5))));
    assert!(found.contains(&("hallucinated-import".into(), "src/server.js".into(), Some(2))));
    assert!(found.contains(&("forbidden-content".into(), "src/server.js".into(), Some(3))));
    assert!(found.contains(&("phantom-api".into(), "src/files.ts".into(), Some(4))));
    assert!(found.contains(&("focused-test".into(), "src/app.test.js".into(), Some(2))));

    // Default ignores keep vendored code out of every gate.
    assert!(report
        .failures
        .iter()
        .all(|f| !f.primary_file().starts_with("node_modules")));

    let hint = report
        .failures
        .iter()
        .find(|f| f.id == "phantom-api")
        .and_then(|f| f.hint.clone());
    assert_eq!(hint.as_deref(), Some("Did you mean `readFile`?"));

    for id in ALL_GATE_IDS {
        assert!(report.summary.contains_key(*id), "{} missing from summary", id);
    }
    let total: usize = report.stats.severity_breakdown.values().sum();
    assert_eq!(total, report.failures.len());
    let total: usize = report.stats.provenance_breakdown.values().sum();
    assert_eq!(total, report.failures.len());
}

#[test]
fn test_rerun_is_identical() {
    let temp = fixture();
    let mut first = run(temp.path(), Config::default());
    let mut second = run(temp.path(), Config::default());
    first.stats.duration_ms = 0;
    second.stats.duration_ms = 0;
    assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
}

#[test]
fn test_adding_a_gate_never_removes_failures() {
    let temp = fixture();
    let config = Config::default();
    let full = Runner::new(temp.path(), config.clone()).unwrap().run();
    let full_keys = keys(&full.failures);

    for skipped in ALL_GATE_IDS {
        let gates = build_gates(&config)
            .into_iter()
            .filter(|g| g.id() != *skipped)
            .collect();
        let partial = Runner::new(temp.path(), config.clone())
            .unwrap()
            .with_gates(gates)
            .run();
        assert!(partial.failures.len() <= full.failures.len());
        assert!(
            keys(&partial.failures).is_subset(&full_keys),
            "dropping {} changed other gates' output",
            skipped
        );
    }
}

#[test]
fn test_all_disabled_touches_no_files() {
    let temp = fixture();
    let mut config = Config::default();
    let g = &mut config.gates;
    g.content.enabled = false;
    g.file_size.enabled = false;
    g.required_files.enabled = false;
    g.ast.enabled = false;
    g.security_patterns.enabled = false;
    g.phantom_apis.enabled = false;
    g.deprecated_apis.enabled = false;
    g.async_safety.enabled = false;
    g.test_quality.enabled = false;
    g.hallucinated_imports.enabled = false;

    let mut runner = Runner::new(temp.path(), config).unwrap();
    let report = runner.run();
    assert!(report.failures.is_empty());
    assert!(report.summary.values().all(|s| *s == GateStatus::Skipped));
    assert_eq!(report.status, Status::Pass);
    assert_eq!(report.stats.score, 100);
    assert_eq!(runner.scanner_invocations(), 0);
}

#[test]
fn test_findings_are_capped_per_file() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "noisy.py", &"# TODO\n".repeat(40));

    let report = run(temp.path(), Config::default());
    let markers: Vec<&Failure> = report
        .failures
        .iter()
        .filter(|f| f.id == "forbidden-content")
        .collect();
    assert_eq!(markers.len(), 6);
    assert_eq!(markers[5].line, None);
    assert!(markers[5].title.ends_with("limit exceeded"));
}

#[test]
fn test_file_patterns_restrict_the_run() {
    let temp = fixture();
    let report = Runner::new(temp.path(), Config::default())
        .unwrap()
        .with_file_patterns(&["src/files.ts".to_string()])
        .unwrap()
        .run();
    assert!(!report.failures.is_empty());
    assert!(report
        .failures
        .iter()
        .all(|f| f.primary_file() == "src/files.ts"));
}

#[test]
fn test_hook_fails_open_on_large_file() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "big.js", &"JSON.parse(x);\n".repeat(50_000));

    let started = Instant::now();
    let result = run_hook(
        temp.path(),
        &[PathBuf::from("big.js")],
        &Config::default(),
        Some(Duration::from_millis(1)),
    );
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(result.timed_out);
    assert_eq!(result.status, HookStatus::Pass);
    assert!(result.failures.is_empty());
}

#[test]
fn test_hook_budget_holds_on_unclosed_async_bodies() {
    // Every header opens a body that never closes, just under the read limit.
    let temp = TempDir::new().unwrap();
    let body = "async function f() {\n".repeat(42_000);
    assert!(body.len() < 1_000_000);
    write(temp.path(), "unclosed.js", &body);

    let budget = Duration::from_secs(2);
    let started = Instant::now();
    let result = run_hook(temp.path(), &[PathBuf::from("unclosed.js")], &Config::default(), Some(budget));
    let elapsed = started.elapsed();

    assert!(elapsed < budget + Duration::from_secs(3), "hook took {:?}", elapsed);
    assert_eq!(result.status, HookStatus::Pass);
    assert_eq!(result.files_checked, 1);
    assert!(result.failures.iter().all(|f| f.id != "async-without-await"));
}

#[test]
fn test_hook_blocks_on_edit() {
    let temp = fixture();
    let result = run_hook(
        temp.path(),
        &[PathBuf::from("src/server.js"), PathBuf::from("src/missing.js")],
        &Config::default(),
        None,
    );
    assert_eq!(result.files_checked, 1);
    assert!(!result.timed_out);
    assert_eq!(result.status, HookStatus::Fail);
    assert!(result.failures.iter().any(|f| f.id == "unsafe-parse"));
    assert!(result
        .failures
        .iter()
        .all(|f| f.primary_file() == "src/server.js"));
}
