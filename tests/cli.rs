//! Cross-process tests driving the `machine-lock` binary.

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn machine_lock(store: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_machine-lock"))
        .arg("--dir")
        .arg(store)
        .args(args)
        .env_remove("MACHINE_LOCK_DIR")
        .env_remove("MACHINE_LOCK_AUTO_RECLAIM")
        .output()
        .expect("failed to run machine-lock")
}

fn code(output: &Output) -> i32 {
    output.status.code().expect("terminated by signal")
}

#[test]
fn claim_made_by_one_process_blocks_another() {
    let store = TempDir::new().unwrap();

    // The claim is tied to this test process, which outlives both commands.
    assert_eq!(code(&machine_lock(store.path(), &["lock", "dut-1"])), 0);
    assert_eq!(
        code(&machine_lock(store.path(), &["lock", "dut-1", "--shared"])),
        2
    );
    assert_eq!(
        code(&machine_lock(store.path(), &["lock", "dut-1", "--auto"])),
        2
    );

    assert_eq!(code(&machine_lock(store.path(), &["unlock", "dut-1"])), 0);
    assert_eq!(
        code(&machine_lock(store.path(), &["lock", "dut-1", "--shared"])),
        0
    );
    assert_eq!(
        code(&machine_lock(store.path(), &["lock", "dut-1", "--shared"])),
        0
    );
}

#[cfg(unix)]
#[test]
fn claim_of_exited_runner_is_reclaimed_with_auto() {
    let store = TempDir::new().unwrap();
    let mut runner = Command::new("sleep").arg("30").spawn().unwrap();
    let runner_pid = runner.id().to_string();

    let out = machine_lock(
        store.path(),
        &["lock", "dut-1", "--auto", "--owner-pid", &runner_pid],
    );
    assert_eq!(code(&out), 0);
    assert_eq!(
        code(&machine_lock(store.path(), &["lock", "dut-1", "--auto"])),
        2
    );

    runner.kill().unwrap();
    runner.wait().unwrap();

    // Without --auto the stale claim stands.
    assert_eq!(code(&machine_lock(store.path(), &["lock", "dut-1"])), 2);
    assert_eq!(
        code(&machine_lock(store.path(), &["lock", "dut-1", "--auto"])),
        0
    );

    let status = machine_lock(store.path(), &["status", "dut-1"]);
    assert_eq!(code(&status), 0);
    let stdout = String::from_utf8_lossy(&status.stdout);
    assert!(stdout.contains("exclusive"));
    assert!(stdout.contains(&format!("pid {}", std::process::id())));
}

#[test]
fn unlock_is_idempotent_and_list_shows_machines() {
    let store = TempDir::new().unwrap();

    for _ in 0..2 {
        assert_eq!(code(&machine_lock(store.path(), &["unlock", "dut-2"])), 0);
        assert_eq!(
            code(&machine_lock(store.path(), &["unlock", "dut-2", "--shared"])),
            0
        );
    }
    assert_eq!(code(&machine_lock(store.path(), &["lock", "dut-3"])), 0);

    let list = machine_lock(store.path(), &["list"]);
    assert_eq!(code(&list), 0);
    let stdout = String::from_utf8_lossy(&list.stdout);
    assert!(stdout.contains("dut-2"));
    assert!(stdout.contains("dut-3"));
    assert!(stdout.contains("1 of 2 machine(s) held."));
}

#[test]
fn invalid_name_exits_with_user_error() {
    let store = TempDir::new().unwrap();
    let out = machine_lock(store.path(), &["lock", "  "]);
    assert_eq!(code(&out), 1);
    assert!(String::from_utf8_lossy(&out.stderr).contains("must not be empty"));
}
