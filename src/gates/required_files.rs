//! Governance: files the project must carry.

use super::{Failure, Gate, GateContext, Provenance, Severity};
use crate::config::RequiredFilesConfig;

pub const ID: &str = "required-files";

pub struct RequiredFilesGate {
    enabled: bool,
    files: Vec<String>,
}

impl RequiredFilesGate {
    pub fn new(config: &RequiredFilesConfig) -> Self {
        Self {
            enabled: config.enabled,
            files: config.files.clone(),
        }
    }
}

impl Gate for RequiredFilesGate {
    fn id(&self) -> &'static str {
        ID
    }

    fn title(&self) -> &'static str {
        "Required files"
    }

    fn provenance(&self) -> Provenance {
        Provenance::Governance
    }

    fn enabled(&self) -> bool {
        self.enabled && !self.files.is_empty()
    }

    fn run(&self, ctx: &GateContext) -> Vec<Failure> {
        if !self.enabled() {
            return Vec::new();
        }

        let mut failures = Vec::new();
        for path in &self.files {
            let full = ctx.cwd().join(path);
            let problem = match std::fs::metadata(&full) {
                Ok(meta) if meta.is_dir() => Some("is a directory, not a file"),
                Ok(_) => None,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Some("does not exist"),
                Err(e) => {
                    tracing::debug!(file = %full.display(), error = %e, "cannot stat required file");
                    Some("cannot be read")
                }
            };
            if let Some(problem) = problem {
                failures.push(
                    Failure::new(
                        "missing-required-file",
                        "Missing required file",
                        format!("required file {:?} {}", path, problem),
                        Severity::Medium,
                        Provenance::Governance,
                    )
                    .in_file(path.clone())
                    .with_hint(format!("Add {}", path)),
                );
            }
        }
        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_missing_and_directory() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("README.md"), "# x").unwrap();
        std::fs::create_dir(temp.path().join("LICENSE")).unwrap();
        let ctx = GateContext::new(temp.path(), Arc::new(Config::default())).unwrap();

        let gate = RequiredFilesGate::new(&RequiredFilesConfig {
            enabled: true,
            files: vec![
                "README.md".to_string(),
                "LICENSE".to_string(),
                "SECURITY.md".to_string(),
            ],
        });
        let failures = gate.run(&ctx);
        assert_eq!(failures.len(), 2);
        assert!(failures[0].details.contains("is a directory"));
        assert!(failures[1].details.contains("does not exist"));
        assert_eq!(failures[1].provenance, Provenance::Governance);
        assert_eq!(ctx.scanner().invocations(), 0);
    }
}
