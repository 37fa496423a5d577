// In-memory ingress edit lock table
// Single-owner locks with a table-wide TTL, expired lazily on every access

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::ingress::ResourceKey;

/// Default lock TTL (24 hours)
pub const DEFAULT_LOCK_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// An acquired lock entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LockEntry {
    pub owner: String,
    pub acquired_at: DateTime<Utc>,
}

/// Result of an acquire attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// The entry as recorded under the table lock
    Granted(LockEntry),
    /// Held by someone else; not an error
    Denied { holder: String },
}

impl AcquireOutcome {
    pub fn is_granted(&self) -> bool {
        matches!(self, AcquireOutcome::Granted(_))
    }
}

/// Result of a release attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    Released,
    NoOp,
}

/// Returns true when an entry acquired at `acquired_at` has outlived `ttl` at `now`.
pub fn is_expired(now: DateTime<Utc>, acquired_at: DateTime<Utc>, ttl: TimeDelta) -> bool {
    now.signed_duration_since(acquired_at) > ttl
}

/// Exclusive edit locks keyed by ingress.
///
/// Every operation runs under one table-wide mutex and purges expired entries
/// before deciding, so a stale lock never blocks an acquisition and never
/// shows up in a snapshot.
pub struct LockTable {
    entries: Mutex<HashMap<ResourceKey, LockEntry>>,
    ttl: TimeDelta,
    clock: Arc<dyn Clock>,
}

impl LockTable {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let ttl = TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX);
        info!(ttl_secs = ttl.num_seconds(), "LockTable initialized");

        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self::new(ttl, Arc::new(SystemClock))
    }

    pub fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    fn purge(&self, entries: &mut HashMap<ResourceKey, LockEntry>, now: DateTime<Utc>) -> usize {
        let before = entries.len();
        entries.retain(|key, entry| {
            let keep = !is_expired(now, entry.acquired_at, self.ttl);
            if !keep {
                debug!(key = %key, owner = %entry.owner, "Lock expired");
            }
            keep
        });
        before - entries.len()
    }

    /// Acquire the lock on `key` for `owner`.
    ///
    /// Re-acquiring a lock the owner already holds refreshes its timestamp.
    pub fn acquire(&self, key: &ResourceKey, owner: &str) -> AcquireOutcome {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        self.purge(&mut entries, now);

        if let Some(existing) = entries.get_mut(key) {
            if existing.owner != owner {
                debug!(key = %key, owner = %owner, holder = %existing.owner, "Lock denied");
                return AcquireOutcome::Denied {
                    holder: existing.owner.clone(),
                };
            }
            existing.acquired_at = now;
            debug!(key = %key, owner = %owner, "Lock refreshed");
            return AcquireOutcome::Granted(existing.clone());
        }

        let entry = LockEntry {
            owner: owner.to_string(),
            acquired_at: now,
        };
        entries.insert(key.clone(), entry.clone());

        debug!(key = %key, owner = %owner, "Lock acquired");
        AcquireOutcome::Granted(entry)
    }

    /// Release the lock on `key` if `owner` holds it; anything else is a no-op.
    pub fn release(&self, key: &ResourceKey, owner: &str) -> ReleaseOutcome {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        self.purge(&mut entries, now);

        match entries.get(key) {
            Some(entry) if entry.owner == owner => {
                entries.remove(key);
                debug!(key = %key, owner = %owner, "Lock released");
                ReleaseOutcome::Released
            }
            _ => ReleaseOutcome::NoOp,
        }
    }

    pub fn is_held_by(&self, key: &ResourceKey, owner: &str) -> bool {
        self.holder(key)
            .map(|entry| entry.owner == owner)
            .unwrap_or(false)
    }

    /// Live entry for `key`, if any
    pub fn holder(&self, key: &ResourceKey) -> Option<LockEntry> {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        self.purge(&mut entries, now);
        entries.get(key).cloned()
    }

    /// Point-in-time view of all live locks
    pub fn snapshot(&self) -> BTreeMap<ResourceKey, LockEntry> {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        self.purge(&mut entries, now);
        entries
            .iter()
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect()
    }

    /// Drop expired entries, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        self.purge(&mut entries, now)
    }

    pub fn len(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        self.purge(&mut entries, now);
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for LockTable {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_LOCK_TTL)
    }
}

/// Periodically purge expired locks so an idle table does not retain them.
///
/// Correctness never depends on this task; every table operation purges on access.
pub fn spawn_lock_sweeper(
    table: Arc<LockTable>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let removed = table.purge_expired();
            if removed > 0 {
                debug!(count = removed, "Cleaned up expired lock entries");
            }
        }
    })
}
