//! Rigour - static governance gates for AI-assisted codebases.
//!
//! A run builds every configured gate, executes them over one directory and
//! folds their failures into a scored PASS/FAIL [`Report`]. The hook path
//! runs the fast subset over a handful of files under a time budget and
//! fails open when the budget runs out.
//!
//! # Architecture
//!
//! - `gates`: the `Gate` contract and one module per analysis unit
//! - `scope`: body extraction, error-handling guards and fuzzy name matching
//!   shared by the gates
//! - `rules`: read-only rule tables (known APIs, deprecations, security
//!   patterns, standard libraries)
//! - `scanner`: ignore-aware file discovery, cached per run
//! - `parser`: optional tree-sitter parsers used to refine complexity
//! - `runner`, `score`, `report`, `hook`: orchestration and output
//!
//! # Adding a Gate
//!
//! Implement `Gate` in a new module under `src/gates/`, give it a config
//! section in `config.rs` and register it in `build_gates`.

pub mod cli;
pub mod config;
pub mod error;
pub mod gates;
pub mod hook;
pub mod language;
pub mod logging;
pub mod manifest;
pub mod parser;
pub mod report;
pub mod rules;
pub mod runner;
pub mod scanner;
pub mod scope;
pub mod score;

pub use config::Config;
pub use error::{ConfigError, ReportError};
pub use gates::{build_fast_gates, build_gates, Failure, Gate, GateContext, Provenance, Severity};
pub use hook::{run_hook, HookResult, HookStatus};
pub use language::Language;
pub use report::{GateStatus, Report, Status};
pub use runner::Runner;
pub use scanner::FileScanner;
