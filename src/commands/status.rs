//! Implementation of the `status` and `list` commands.

use crate::cli::StatusArgs;
use machine_lock::config::Config;
use machine_lock::error::Result;
use machine_lock::exit_codes;
use machine_lock::locks::{LockRecord, LockStore, MachineLock};

/// Execute `machine-lock status <NAME>`.
pub fn cmd_status(config: &Config, args: StatusArgs) -> Result<i32> {
    let lock = MachineLock::from_config(&args.name, config)?;
    print_record(&lock.record()?);
    Ok(exit_codes::SUCCESS)
}

/// Execute `machine-lock list`.
pub fn cmd_list(config: &Config) -> Result<i32> {
    let store = LockStore::open(&config.store_dir)?;
    let records = store.list()?;

    if records.is_empty() {
        println!("No machines in {}.", store.dir().display());
        return Ok(exit_codes::SUCCESS);
    }

    println!("Machines ({}):", records.len());
    println!();
    for record in &records {
        print_record(record);
    }

    let held = records.iter().filter(|r| !r.is_unlocked()).count();
    println!("{} of {} machine(s) held.", held, records.len());
    Ok(exit_codes::SUCCESS)
}

fn print_record(record: &LockRecord) {
    println!("  {}:", record.resource);
    println!("    Mode:       {}", record.mode);
    println!(
        "    Updated:    {}",
        record.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    for holder in &record.holders {
        println!(
            "    Holder:     {} pid {} since {} ({})",
            holder.owner,
            holder.pid,
            holder.claimed_at.format("%Y-%m-%d %H:%M:%S UTC"),
            holder.age_string()
        );
    }
    println!();
}
