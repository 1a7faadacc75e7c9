//! Resource handles: the `lock`/`unlock` state machine.

use super::guard::ClaimGuard;
use super::holder::Holder;
use super::liveness::{Liveness, check_holder};
use super::store::LockStore;
use super::types::{ClaimMode, LockMode, LockRecord};
use crate::config::{Config, OwnershipPolicy};
use crate::error::Result;
use crate::events::{Event, EventAction, append_event};
use serde_json::json;
use std::path::Path;

/// Result of applying a claim request to a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum GrantOutcome {
    /// A new holder entry was added.
    Granted,
    /// The caller already is the exclusive holder; nothing changed.
    AlreadyHeld,
    /// Contention; nothing changed.
    Denied,
}

/// Result of applying a release request to a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ReleaseOutcome {
    /// Holder entries were removed.
    Released { removed: Vec<Holder>, remaining: usize },
    /// The targeted mode was not held; nothing changed.
    NotHeld,
    /// Strict ownership and the caller is not a holder; nothing changed.
    Refused,
}

/// Apply a claim for `holder` to `record`.
pub(crate) fn grant(record: &mut LockRecord, claim: ClaimMode, holder: Holder) -> GrantOutcome {
    match (record.mode, claim) {
        (LockMode::Unlocked, _) => {
            record.mode = claim.lock_mode();
            record.holders = vec![holder];
            GrantOutcome::Granted
        }
        (LockMode::Shared, ClaimMode::Shared) => {
            record.holders.push(holder);
            GrantOutcome::Granted
        }
        (LockMode::Shared, ClaimMode::Exclusive) => GrantOutcome::Denied,
        (LockMode::Exclusive, ClaimMode::Exclusive)
            if record.holders.iter().any(|h| h.token == holder.token) =>
        {
            GrantOutcome::AlreadyHeld
        }
        (LockMode::Exclusive, _) => GrantOutcome::Denied,
    }
}

/// Release one claim of kind `claim` on behalf of the caller identified by
/// `token` and `pid`.
pub(crate) fn release(
    record: &mut LockRecord,
    claim: ClaimMode,
    token: &str,
    pid: u32,
    ownership: OwnershipPolicy,
) -> ReleaseOutcome {
    if record.mode != claim.lock_mode() {
        return ReleaseOutcome::NotHeld;
    }

    let own = record
        .holders
        .iter()
        .position(|h| h.token == token)
        .or_else(|| record.holders.iter().position(|h| h.pid == pid));

    let index = match (own, ownership) {
        (Some(index), _) => index,
        // Oldest claim first.
        (None, OwnershipPolicy::Permissive) => 0,
        (None, OwnershipPolicy::Strict) => return ReleaseOutcome::Refused,
    };

    let removed = match claim {
        ClaimMode::Exclusive => std::mem::take(&mut record.holders),
        ClaimMode::Shared => vec![record.holders.remove(index)],
    };

    if record.holders.is_empty() {
        record.clear();
    }

    ReleaseOutcome::Released {
        removed,
        remaining: record.holders.len(),
    }
}

/// Release the entry made by handle `token`, if it still holds `claim`.
///
/// Never touches entries of other callers, whatever the ownership policy.
pub(crate) fn release_own(record: &mut LockRecord, claim: ClaimMode, token: &str) -> ReleaseOutcome {
    if record.mode != claim.lock_mode() {
        return ReleaseOutcome::NotHeld;
    }
    let Some(index) = record.holders.iter().position(|h| h.token == token) else {
        return ReleaseOutcome::NotHeld;
    };

    let removed = vec![record.holders.remove(index)];
    if record.holders.is_empty() {
        record.clear();
    }

    ReleaseOutcome::Released {
        removed,
        remaining: record.holders.len(),
    }
}

/// A caller's handle on one named resource.
///
/// The handle carries configuration only. Every call re-reads and re-writes
/// the record, so claims made through one handle can be released through
/// another, in the same or a different process.
#[derive(Debug, Clone)]
pub struct MachineLock {
    resource: String,
    store: LockStore,
    auto_reclaim: bool,
    ownership: OwnershipPolicy,
    audit_log: bool,
    pid: u32,
    token: String,
}

impl MachineLock {
    /// Create a handle for `resource` in `store_dir`.
    ///
    /// Creates the store directory and an `Unlocked` record on first use.
    /// Auto-reclaim is off, ownership is permissive, the audit log is on, and
    /// claims are tied to the current process.
    pub fn new<P: AsRef<Path>>(resource: &str, store_dir: P) -> Result<Self> {
        let store = LockStore::open(store_dir)?;
        store.ensure(resource)?;

        Ok(Self {
            resource: resource.to_string(),
            store,
            auto_reclaim: false,
            ownership: OwnershipPolicy::default(),
            audit_log: true,
            pid: std::process::id(),
            token: uuid::Uuid::new_v4().to_string(),
        })
    }

    /// Create a handle using the store and policies from `config`.
    pub fn from_config(resource: &str, config: &Config) -> Result<Self> {
        Ok(Self::new(resource, &config.store_dir)?
            .with_auto_reclaim(config.auto_reclaim)
            .with_ownership(config.ownership)
            .with_audit_log(config.audit_log))
    }

    /// Reclaim records whose holders have all exited before evaluating `lock`.
    pub fn with_auto_reclaim(mut self, auto_reclaim: bool) -> Self {
        self.auto_reclaim = auto_reclaim;
        self
    }

    pub fn with_ownership(mut self, ownership: OwnershipPolicy) -> Self {
        self.ownership = ownership;
        self
    }

    /// Tie claims to `pid` instead of the current process, e.g. the test
    /// runner that invoked a short-lived helper.
    pub fn with_holder_pid(mut self, pid: u32) -> Self {
        self.pid = pid;
        self
    }

    pub fn with_audit_log(mut self, audit_log: bool) -> Self {
        self.audit_log = audit_log;
        self
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn holder_pid(&self) -> u32 {
        self.pid
    }

    pub fn store(&self) -> &LockStore {
        &self.store
    }

    /// Try to claim the resource, exclusively or shared. Never waits.
    ///
    /// `Ok(false)` means the claim cannot be granted right now; errors are
    /// reserved for an unusable store.
    pub fn lock(&self, exclusive: bool) -> Result<bool> {
        let claim = ClaimMode::from_exclusive(exclusive);
        let mut txn = self.store.begin(&self.resource)?;

        let mut reclaimed = None;
        if self.auto_reclaim && !txn.record().is_unlocked() {
            reclaimed = self.reclaim_if_abandoned(txn.record_mut());
        }

        let holder = Holder::new(self.pid, &self.token);
        let outcome = grant(txn.record_mut(), claim, holder);
        txn.commit()?;

        if let Some(dead) = reclaimed {
            self.audit(Event::new(EventAction::Reclaim, &self.resource).with_details(json!({
                "previous_mode": dead.0.as_str(),
                "dead_pids": dead.1,
            })));
        }

        match outcome {
            GrantOutcome::Granted => {
                log::debug!(
                    "granted {} claim on '{}' to pid {}",
                    claim.lock_mode(),
                    self.resource,
                    self.pid
                );
                self.audit(Event::new(EventAction::Lock, &self.resource).with_details(json!({
                    "mode": claim.lock_mode().as_str(),
                    "pid": self.pid,
                    "holders": txn.record().holders.len(),
                })));
                Ok(true)
            }
            GrantOutcome::AlreadyHeld => Ok(true),
            GrantOutcome::Denied => {
                log::debug!(
                    "denied {} claim on '{}': record is {}",
                    claim.lock_mode(),
                    self.resource,
                    txn.record().mode
                );
                Ok(false)
            }
        }
    }

    /// Release a claim of the given kind.
    ///
    /// Releasing a mode that is not held succeeds without changes. Under the
    /// permissive policy any caller can release any claim; under the strict
    /// policy a non-holder gets `Ok(false)`.
    pub fn unlock(&self, exclusive: bool) -> Result<bool> {
        self.apply_release(exclusive, |record, claim| {
            release(record, claim, &self.token, self.pid, self.ownership)
        })
    }

    /// Release only the claim this handle made. A claim that was already
    /// cleared, and any claim taken after that, are left alone.
    pub(super) fn unlock_own(&self, exclusive: bool) -> Result<bool> {
        self.apply_release(exclusive, |record, claim| {
            release_own(record, claim, &self.token)
        })
    }

    fn apply_release<F>(&self, exclusive: bool, f: F) -> Result<bool>
    where
        F: FnOnce(&mut LockRecord, ClaimMode) -> ReleaseOutcome,
    {
        let claim = ClaimMode::from_exclusive(exclusive);
        let mut txn = self.store.begin(&self.resource)?;

        let outcome = f(txn.record_mut(), claim);
        txn.commit()?;

        match outcome {
            ReleaseOutcome::Released { removed, remaining } => {
                let by_holder = removed
                    .iter()
                    .any(|h| h.token == self.token || h.pid == self.pid);
                if !by_holder {
                    log::info!(
                        "pid {} released {} claim on '{}' held by pid(s) {:?}",
                        self.pid,
                        claim.lock_mode(),
                        self.resource,
                        removed.iter().map(|h| h.pid).collect::<Vec<_>>()
                    );
                }
                self.audit(
                    Event::new(EventAction::Unlock, &self.resource).with_details(json!({
                        "mode": claim.lock_mode().as_str(),
                        "pid": self.pid,
                        "released_pids": removed.iter().map(|h| h.pid).collect::<Vec<_>>(),
                        "by_holder": by_holder,
                        "remaining": remaining,
                    })),
                );
                Ok(true)
            }
            ReleaseOutcome::NotHeld => Ok(true),
            ReleaseOutcome::Refused => {
                log::debug!(
                    "refused {} release on '{}': pid {} is not a holder",
                    claim.lock_mode(),
                    self.resource,
                    self.pid
                );
                Ok(false)
            }
        }
    }

    /// Current mode of the record.
    pub fn mode(&self) -> Result<LockMode> {
        Ok(self.store.read(&self.resource)?.mode)
    }

    /// Snapshot of the record.
    pub fn record(&self) -> Result<LockRecord> {
        self.store.read(&self.resource)
    }

    /// Like [`lock`](Self::lock), but returns a guard that releases the claim
    /// when dropped.
    ///
    /// The guard releases only the entry this handle added. If the claim was
    /// force-released and taken by someone else in the meantime, dropping the
    /// guard leaves the new claim in place.
    pub fn try_claim(&self, exclusive: bool) -> Result<Option<ClaimGuard<'_>>> {
        if self.lock(exclusive)? {
            Ok(Some(ClaimGuard::new(self, exclusive)))
        } else {
            Ok(None)
        }
    }

    /// Reset `record` if every holder is definitely dead. Returns the previous
    /// mode and the dead pids when a reclaim happened.
    fn reclaim_if_abandoned(&self, record: &mut LockRecord) -> Option<(LockMode, Vec<u32>)> {
        let mut dead = Vec::with_capacity(record.holders.len());
        for holder in &record.holders {
            match check_holder(holder) {
                Liveness::Dead => dead.push(holder.pid),
                Liveness::Alive => return None,
                Liveness::Unknown => {
                    log::warn!(
                        "cannot determine liveness of pid {} on {} holding '{}'; treating it as alive",
                        holder.pid,
                        holder.host,
                        self.resource
                    );
                    return None;
                }
            }
        }

        let previous = record.mode;
        log::info!(
            "reclaiming {} record '{}' from exited pid(s) {:?}",
            previous,
            self.resource,
            dead
        );
        record.clear();
        Some((previous, dead))
    }

    fn audit(&self, event: Event) {
        if !self.audit_log {
            return;
        }
        if let Err(e) = append_event(self.store.dir(), &event) {
            log::warn!("failed to append {} event: {}", event.action, e);
        }
    }
}
