//! machine-lock: claim and release test machines from shell scripts.
//!
//! Parses arguments, dispatches to the command handler, and maps the outcome
//! to an exit code.

mod cli;
mod commands;

use cli::Cli;
use machine_lock::exit_codes;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse_args();

    match commands::dispatch(cli) {
        Ok(code) => ExitCode::from(code as u8),
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
