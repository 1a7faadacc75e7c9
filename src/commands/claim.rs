//! Implementation of the `lock` and `unlock` commands.

use super::default_owner_pid;
use crate::cli::{LockArgs, UnlockArgs};
use machine_lock::config::{Config, OwnershipPolicy};
use machine_lock::error::Result;
use machine_lock::exit_codes;
use machine_lock::locks::MachineLock;

fn mode_name(shared: bool) -> &'static str {
    if shared { "shared" } else { "exclusive" }
}

/// Execute `machine-lock lock`.
pub fn cmd_lock(config: &Config, args: LockArgs) -> Result<i32> {
    let lock = MachineLock::from_config(&args.name, config)?
        .with_auto_reclaim(config.auto_reclaim || args.auto)
        .with_holder_pid(args.owner_pid.unwrap_or_else(default_owner_pid));

    if lock.lock(!args.shared)? {
        println!(
            "Locked {} ({}) for pid {}",
            args.name,
            mode_name(args.shared),
            lock.holder_pid()
        );
        Ok(exit_codes::SUCCESS)
    } else {
        eprintln!("Busy: {}", lock.record()?);
        Ok(exit_codes::LOCK_BUSY)
    }
}

/// Execute `machine-lock unlock`.
pub fn cmd_unlock(config: &Config, args: UnlockArgs) -> Result<i32> {
    let ownership = if args.strict {
        OwnershipPolicy::Strict
    } else {
        config.ownership
    };
    let lock = MachineLock::from_config(&args.name, config)?
        .with_ownership(ownership)
        .with_holder_pid(args.owner_pid.unwrap_or_else(default_owner_pid));

    if lock.unlock(!args.shared)? {
        println!("Unlocked {} ({})", args.name, mode_name(args.shared));
        Ok(exit_codes::SUCCESS)
    } else {
        eprintln!(
            "Refused: pid {} is not a holder of {}",
            lock.holder_pid(),
            lock.record()?
        );
        Ok(exit_codes::LOCK_BUSY)
    }
}
