//! Command-line interface for rigour.

use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::{self, Config, DEFAULT_CONFIG_NAMES};
use crate::hook;
use crate::report::{self, Report};
use crate::runner::Runner;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Static governance gates for AI-assisted codebases.
///
/// Rigour runs a set of independent gates (hallucinated imports, phantom and
/// deprecated APIs, async safety, test quality, security patterns, structural
/// limits) over a directory and renders one scored PASS/FAIL verdict.
#[derive(Parser)]
#[command(name = "rigour")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log debug output to stderr (RIGOUR_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run every enabled gate over a directory
    Check(CheckArgs),
    /// Run the fast gates over a few files under a time budget
    Hook(HookArgs),
    /// Write a default rigour.yml
    Init(InitArgs),
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Pretty,
    Json,
}

/// Arguments for the check command.
#[derive(Parser)]
pub struct CheckArgs {
    /// Directory to check
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Path to config YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "pretty")]
    pub format: Format,

    /// Also write the JSON report to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Only check files matching these globs (relative to the directory)
    #[arg(long = "files", value_name = "GLOB")]
    pub files: Vec<String>,
}

/// Arguments for the hook command.
#[derive(Parser)]
pub struct HookArgs {
    /// Files that were just written
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Working directory the files belong to
    #[arg(long, default_value = ".")]
    pub cwd: PathBuf,

    /// Path to config YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Time budget in milliseconds (default: hooks.timeout_ms)
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

/// Arguments for the init command.
#[derive(Parser)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = "rigour.yml")]
    pub output: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// Load `explicit`, or discover a config file in `dir`, or fall back to
/// defaults. The result is validated.
fn resolve_config(dir: &Path, explicit: Option<&Path>) -> anyhow::Result<Config> {
    let config = match explicit {
        Some(p) => {
            tracing::debug!(path = %p.display(), "loading config");
            Config::load(p)?
        }
        None => {
            tracing::debug!(looked_for = %DEFAULT_CONFIG_NAMES.join(", "), "discovering config");
            Config::load_or_default(dir)?
        }
    };
    config::validate(&config)?;
    Ok(config)
}

fn spinner(enabled: bool) -> ProgressBar {
    if !enabled || !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message("running gates");
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn exit_code(report: &Report) -> i32 {
    if report.passed() {
        EXIT_SUCCESS
    } else {
        EXIT_FAILED
    }
}

/// Run the check command.
pub fn run_check(args: &CheckArgs) -> anyhow::Result<i32> {
    let root = match args.path.canonicalize() {
        Ok(p) if p.is_dir() => p,
        Ok(p) => {
            eprintln!("Error: not a directory: {}", p.display());
            return Ok(EXIT_ERROR);
        }
        Err(e) => {
            eprintln!("Error: cannot access path {:?}: {}", args.path, e);
            return Ok(EXIT_ERROR);
        }
    };

    let config = match resolve_config(&root, args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: invalid configuration: {:#}", e);
            eprintln!("Run 'rigour init' to create a config file");
            return Ok(EXIT_ERROR);
        }
    };

    let mut runner = Runner::new(&root, config)?;
    if !args.files.is_empty() {
        runner = runner.with_file_patterns(&args.files)?;
    }

    let progress = spinner(args.format == Format::Pretty);
    let report = runner.run();
    progress.finish_and_clear();

    if let Some(output) = &args.output {
        if let Err(e) = report::write_report(&report, output) {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    }

    match args.format {
        Format::Json => println!("{}", report.to_json()?),
        Format::Pretty => report::write_pretty(&args.path.to_string_lossy(), &report),
    }

    Ok(exit_code(&report))
}

/// Run the hook command.
///
/// Fail-open: only a blocking verdict exits non-zero. A broken config is
/// reported on stderr and the edit is let through.
pub fn run_hook(args: &HookArgs) -> anyhow::Result<i32> {
    let config = match resolve_config(&args.cwd, args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(error = %format!("{:#}", e), "hook config unusable, passing");
            eprintln!("Warning: rigour hook skipped: {:#}", e);
            return Ok(EXIT_SUCCESS);
        }
    };

    let timeout = args.timeout_ms.map(Duration::from_millis);
    let result = hook::run_hook(&args.cwd, &args.files, &config, timeout);
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(if result.blocked() { EXIT_FAILED } else { EXIT_SUCCESS })
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    if args.output.exists() && !args.force {
        eprintln!("Error: file already exists: {}", args.output.display());
        eprintln!("Remove it or pass --force to overwrite");
        return Ok(EXIT_ERROR);
    }

    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() && parent != Path::new(".") {
            if let Err(e) = std::fs::create_dir_all(parent) {
                eprintln!("Error: failed to create directory: {}", e);
                return Ok(EXIT_ERROR);
            }
        }
    }

    let yaml = Config::default().to_yaml()?;
    if let Err(e) = std::fs::write(&args.output, yaml) {
        eprintln!("Error: failed to write config: {}", e);
        return Ok(EXIT_ERROR);
    }

    println!("Created {}", args.output.display());
    println!();
    println!("Next steps:");
    println!("  1. Edit {} to tune gates for your project", args.output.display());
    println!("  2. Run: rigour check .");

    Ok(EXIT_SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["rigour", "check", "src", "--format", "json"]).unwrap();
        match cli.command {
            Commands::Check(args) => {
                assert_eq!(args.path, PathBuf::from("src"));
                assert!(args.format == Format::Json);
            }
            _ => panic!("expected check"),
        }

        let cli = Cli::try_parse_from(["rigour", "-v", "hook", "a.ts", "b.ts", "--timeout-ms", "50"])
            .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Hook(args) => {
                assert_eq!(args.files.len(), 2);
                assert_eq!(args.timeout_ms, Some(50));
            }
            _ => panic!("expected hook"),
        }

        assert!(Cli::try_parse_from(["rigour", "hook"]).is_err());
    }

    #[test]
    fn test_init_writes_loadable_config() {
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("rigour.yml");
        let args = InitArgs {
            output: output.clone(),
            force: false,
        };
        assert_eq!(run_init(&args).unwrap(), EXIT_SUCCESS);
        let config = Config::load(&output).unwrap();
        assert!(config::validate(&config).is_ok());

        assert_eq!(run_init(&args).unwrap(), EXIT_ERROR);
    }

    #[test]
    fn test_check_exit_codes() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("clean.js"), "const x = 1;\n").unwrap();
        let mut args = CheckArgs {
            path: temp.path().to_path_buf(),
            config: None,
            format: Format::Json,
            output: None,
            files: vec![],
        };
        assert_eq!(run_check(&args).unwrap(), EXIT_SUCCESS);

        fs::write(temp.path().join("bad.js"), "const d = JSON.parse(input);\n").unwrap();
        assert_eq!(run_check(&args).unwrap(), EXIT_FAILED);

        fs::write(temp.path().join("rigour.yml"), "gates:\n  block_on_severity: severe\n").unwrap();
        assert_eq!(run_check(&args).unwrap(), EXIT_ERROR);

        args.path = temp.path().join("missing");
        assert_eq!(run_check(&args).unwrap(), EXIT_ERROR);
    }

    #[test]
    fn test_hook_bad_config_passes() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("bad.js"), "JSON.parse(input);\n").unwrap();
        fs::write(temp.path().join("rigour.yml"), "gates: [not, a, map]\n").unwrap();
        let args = HookArgs {
            files: vec![PathBuf::from("bad.js")],
            cwd: temp.path().to_path_buf(),
            config: None,
            timeout_ms: None,
        };
        assert_eq!(run_hook(&args).unwrap(), EXIT_SUCCESS);
    }
}
