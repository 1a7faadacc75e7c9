//! CLI argument parsing for machine-lock.
//!
//! Uses clap derive macros for declarative argument definitions; the
//! implementations live in the `commands` module.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// machine-lock: claim and release test machines shared by independent runners.
///
/// Claims are recorded in a host-local store directory, one record per
/// machine. `lock` never waits: it exits 2 when the machine is busy.
#[derive(Parser, Debug)]
#[command(name = "machine-lock")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// YAML config file (store_dir, auto_reclaim, ownership, audit_log).
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Store directory; overrides the config file and MACHINE_LOCK_DIR.
    #[arg(long, global = true, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Claim a machine.
    ///
    /// Exclusive by default. The claim is tied to the calling process (the
    /// parent of this command) unless --owner-pid is given.
    Lock(LockArgs),

    /// Release a claim on a machine.
    ///
    /// Succeeds when nothing is held. Under the default permissive policy
    /// any caller may release any claim.
    Unlock(UnlockArgs),

    /// Show the record for one machine.
    Status(StatusArgs),

    /// List every machine record in the store.
    List,
}

/// Arguments for the `lock` command.
#[derive(Parser, Debug)]
pub struct LockArgs {
    /// Machine name (e.g., a DUT hostname).
    pub name: String,

    /// Take a shared claim instead of an exclusive one.
    #[arg(long)]
    pub shared: bool,

    /// Reclaim the machine first if every recorded holder has exited.
    #[arg(long)]
    pub auto: bool,

    /// Process whose lifetime the claim is tied to.
    #[arg(long, value_name = "PID")]
    pub owner_pid: Option<u32>,
}

/// Arguments for the `unlock` command.
#[derive(Parser, Debug)]
pub struct UnlockArgs {
    /// Machine name.
    pub name: String,

    /// Release one shared claim instead of the exclusive one.
    #[arg(long)]
    pub shared: bool,

    /// Refuse (exit 2) unless the caller is a recorded holder.
    #[arg(long)]
    pub strict: bool,

    /// Process to release on behalf of.
    #[arg(long, value_name = "PID")]
    pub owner_pid: Option<u32>,
}

/// Arguments for the `status` command.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Machine name.
    pub name: String,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_debug_assert() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_lock_defaults_to_exclusive() {
        let cli = Cli::try_parse_from(["machine-lock", "lock", "dut-1"]).unwrap();
        if let Command::Lock(args) = cli.command {
            assert_eq!(args.name, "dut-1");
            assert!(!args.shared);
            assert!(!args.auto);
            assert_eq!(args.owner_pid, None);
        } else {
            panic!("Expected Lock command");
        }
    }

    #[test]
    fn parse_lock_full() {
        let cli = Cli::try_parse_from([
            "machine-lock",
            "--dir",
            "/tmp/locks",
            "lock",
            "dut-1",
            "--shared",
            "--auto",
            "--owner-pid",
            "1234",
        ])
        .unwrap();
        assert_eq!(cli.dir, Some(PathBuf::from("/tmp/locks")));
        if let Command::Lock(args) = cli.command {
            assert!(args.shared);
            assert!(args.auto);
            assert_eq!(args.owner_pid, Some(1234));
        } else {
            panic!("Expected Lock command");
        }
    }

    #[test]
    fn parse_unlock_strict_with_global_after_subcommand() {
        let cli = Cli::try_parse_from([
            "machine-lock",
            "unlock",
            "dut-1",
            "--strict",
            "--config",
            "lab.yaml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("lab.yaml")));
        if let Command::Unlock(args) = cli.command {
            assert_eq!(args.name, "dut-1");
            assert!(args.strict);
            assert!(!args.shared);
        } else {
            panic!("Expected Unlock command");
        }
    }

    #[test]
    fn parse_status_and_list() {
        let cli = Cli::try_parse_from(["machine-lock", "status", "dut-1"]).unwrap();
        assert!(matches!(cli.command, Command::Status(ref a) if a.name == "dut-1"));

        let cli = Cli::try_parse_from(["machine-lock", "list"]).unwrap();
        assert!(matches!(cli.command, Command::List));
    }

    #[test]
    fn lock_requires_name() {
        assert!(Cli::try_parse_from(["machine-lock", "lock"]).is_err());
    }
}
