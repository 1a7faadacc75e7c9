//! Command implementations for machine-lock.
//!
//! Each handler returns the process exit code for outcomes that are not
//! errors (granted vs. busy); storage and input failures propagate as
//! `MachineLockError` and are mapped in `main`.

mod claim;
mod status;

use crate::cli::{Cli, Command};
use machine_lock::config::Config;
use machine_lock::error::Result;

/// Resolve the effective config and dispatch a command to its implementation.
pub fn dispatch(cli: Cli) -> Result<i32> {
    let config = resolve_config(&cli)?;

    match cli.command {
        Command::Lock(args) => claim::cmd_lock(&config, args),
        Command::Unlock(args) => claim::cmd_unlock(&config, args),
        Command::Status(args) => status::cmd_status(&config, args),
        Command::List => status::cmd_list(&config),
    }
}

fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::resolve(cli.config.as_deref())?;
    if let Some(dir) = &cli.dir {
        config.store_dir = dir.clone();
    }
    config.validate()?;
    Ok(config)
}

/// Pid a claim made from the command line is tied to: the invoking shell or
/// test runner, since this process exits right away.
pub(crate) fn default_owner_pid() -> u32 {
    #[cfg(unix)]
    {
        std::os::unix::process::parent_id()
    }
    #[cfg(not(unix))]
    {
        std::process::id()
    }
}
