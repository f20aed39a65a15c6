// notified.rs — In-memory record of the last state notified per commit.
//
// Keys come from `hasher::key_for_commit`. Entries are never evicted and
// the table is lost on restart, so a restarted process re-notifies once.
//
// Reconciliations run concurrently, so check-then-notify goes through
// `claim()`: under one lock it checks the last notified state, and
// reserves the key for the state being sent. Reservations are held per
// state, so while any pass holds (key, state) every other claim for that
// pair backs off, whatever other states are in flight for the key. The
// reservation is turned into a record by `Claim::commit()` after a
// successful dispatch, and simply released if the claim is dropped
// (dispatch failed).

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::run_state::RunState;

#[derive(Debug, Default)]
struct Entry {
    notified: Option<RunState>,
    in_flight: HashSet<RunState>,
}

impl Entry {
    fn is_vacant(&self) -> bool {
        self.notified.is_none() && self.in_flight.is_empty()
    }
}

/// Last notified state per notification key.
#[derive(Debug, Default)]
pub struct NotificationTracker {
    entries: Mutex<HashMap<String, Entry>>,
}

impl NotificationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        // The map holds plain values; a panic mid-update can't leave it torn.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// False when `state` is already the last state notified for `key`.
    pub fn should_notify(&self, key: &str, state: RunState) -> bool {
        self.last_notified(key) != Some(state)
    }

    /// Record `state` as notified for `key`, replacing any previous value.
    pub fn record(&self, key: &str, state: RunState) {
        self.lock().entry(key.to_string()).or_default().notified = Some(state);
    }

    pub fn last_notified(&self, key: &str) -> Option<RunState> {
        self.lock().get(key).and_then(|e| e.notified)
    }

    /// Number of keys with a notified state.
    pub fn len(&self) -> usize {
        self.lock().values().filter(|e| e.notified.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reserve `key` for notifying `state`.
    ///
    /// Returns `None` if `state` was already notified, or another pass is
    /// currently notifying it.
    pub fn claim(&self, key: &str, state: RunState) -> Option<Claim<'_>> {
        let mut entries = self.lock();
        let entry = entries.entry(key.to_string()).or_default();
        if entry.notified == Some(state) || !entry.in_flight.insert(state) {
            return None;
        }
        Some(Claim {
            tracker: self,
            key: key.to_string(),
            state,
            committed: false,
        })
    }

    fn release(&self, key: &str, state: RunState, committed: bool) {
        let mut entries = self.lock();
        let Some(entry) = entries.get_mut(key) else {
            return;
        };
        if committed {
            entry.notified = Some(state);
        }
        entry.in_flight.remove(&state);
        if entry.is_vacant() {
            entries.remove(key);
        }
    }
}

/// A reservation from [`NotificationTracker::claim`].
///
/// Dropping it without calling [`Claim::commit`] leaves the tracker as it
/// was before the claim.
#[derive(Debug)]
pub struct Claim<'a> {
    tracker: &'a NotificationTracker,
    key: String,
    state: RunState,
    committed: bool,
}

impl Claim<'_> {
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Record the claimed state as notified.
    pub fn commit(mut self) {
        self.tracker.release(&self.key, self.state, true);
        self.committed = true;
    }
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.tracker.release(&self.key, self.state, false);
        }
    }
}
