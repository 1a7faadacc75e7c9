//! Point-in-time liveness check for recorded holders.
//!
//! A holder is alive while its process exists on this host and is the same
//! process that made the claim. There is no heartbeat: a process that is alive
//! but stuck is never judged dead. When the check cannot be performed the
//! answer is [`Liveness::Unknown`], which callers must treat as alive.
//!
//! Recycled pids are detected on Linux by comparing the boot-relative start
//! time recorded at claim time with the current one. Both are kernel clock
//! ticks since boot, so wall-clock steps cannot make a live holder look dead.

use super::holder::{Holder, get_host_string};

/// Outcome of a liveness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Alive,
    Dead,
    Unknown,
}

/// Check whether the process behind `holder` is still running.
pub fn check_holder(holder: &Holder) -> Liveness {
    if holder.host != get_host_string() {
        return Liveness::Unknown;
    }

    match check_pid(holder.pid) {
        Liveness::Alive if is_recycled(holder) => Liveness::Dead,
        other => other,
    }
}

/// Whether the live process at `holder.pid` is provably not the one that
/// made the claim. Holders without a recorded start time are never recycled.
fn is_recycled(holder: &Holder) -> bool {
    let (Some(recorded_ticks), Some(recorded_boot)) = (holder.start_ticks, &holder.boot_id) else {
        return false;
    };
    if current_boot_id().as_deref() != Some(recorded_boot.as_str()) {
        return false;
    }
    matches!(process_start_ticks(holder.pid), Some(ticks) if ticks != recorded_ticks)
}

/// Check whether `pid` names a running process on this host.
#[cfg(unix)]
pub fn check_pid(pid: u32) -> Liveness {
    let Ok(raw) = libc::pid_t::try_from(pid) else {
        return Liveness::Unknown;
    };
    // 0 and negative values address process groups.
    if raw <= 0 {
        return Liveness::Unknown;
    }

    // SAFETY: signal 0 performs only the existence/permission check.
    let rc = unsafe { libc::kill(raw, 0) };
    if rc == 0 {
        return Liveness::Alive;
    }

    match std::io::Error::last_os_error().raw_os_error() {
        Some(libc::ESRCH) => Liveness::Dead,
        // Exists, owned by someone we may not signal.
        Some(libc::EPERM) => Liveness::Alive,
        _ => Liveness::Unknown,
    }
}

#[cfg(not(unix))]
pub fn check_pid(_pid: u32) -> Liveness {
    Liveness::Unknown
}

/// Start time of `pid` in clock ticks since boot, from `/proc/<pid>/stat`.
#[cfg(target_os = "linux")]
pub(crate) fn process_start_ticks(pid: u32) -> Option<u64> {
    let stat = std::fs::read_to_string(format!("/proc/{}/stat", pid)).ok()?;
    // The command name may contain spaces and parentheses; fields resume
    // after the last ')'. starttime is field 22, i.e. index 19 from there.
    let rest = stat.get(stat.rfind(')')? + 1..)?;
    rest.split_whitespace().nth(19)?.parse().ok()
}

#[cfg(not(target_os = "linux"))]
pub(crate) fn process_start_ticks(_pid: u32) -> Option<u64> {
    None
}

/// Identifier of the current kernel boot.
#[cfg(target_os = "linux")]
pub(crate) fn current_boot_id() -> Option<String> {
    let id = std::fs::read_to_string("/proc/sys/kernel/random/boot_id").ok()?;
    let id = id.trim();
    (!id.is_empty()).then(|| id.to_string())
}

#[cfg(not(target_os = "linux"))]
pub(crate) fn current_boot_id() -> Option<String> {
    None
}
