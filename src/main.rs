//! Rigour CLI entry point.

use clap::Parser;
use rigour::cli::{self, Cli, Commands, EXIT_ERROR};
use rigour::logging;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = match &cli.command {
        Commands::Check(args) => cli::run_check(args),
        Commands::Hook(args) => cli::run_hook(args),
        Commands::Init(args) => cli::run_init(args),
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            EXIT_ERROR
        }
    };

    std::process::exit(exit_code);
}
