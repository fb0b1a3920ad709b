use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use thiserror::Error;

use crate::RequestId;

/// Guard entries, mapping a request to the moment its vote mark expires
pub type GuardEntries = HashMap<RequestId, DateTime<Utc>>;

#[derive(Debug, Error)]
pub enum GuardStoreError {
    #[error("Could not access vote guard storage: {0}")]
    Io(#[from] std::io::Error),
    #[error("Vote guard storage is malformed: {0}")]
    Format(#[from] serde_json::Error),
}

/// Represents a durable medium the vote guard is persisted to
pub trait GuardStore: Send + Sync {
    fn load(&self) -> Result<GuardEntries, GuardStoreError>;
    fn save(&self, entries: &GuardEntries) -> Result<(), GuardStoreError>;
}

/// A guard store that only lives as long as the process
#[derive(Debug, Default)]
pub struct MemoryGuardStore {
    entries: DashMap<RequestId, DateTime<Utc>>,
}

impl GuardStore for MemoryGuardStore {
    fn load(&self) -> Result<GuardEntries, GuardStoreError> {
        Ok(self
            .entries
            .iter()
            .map(|e| (e.key().clone(), *e.value()))
            .collect())
    }

    fn save(&self, entries: &GuardEntries) -> Result<(), GuardStoreError> {
        self.entries.clear();

        for (id, expires_at) in entries {
            self.entries.insert(id.clone(), *expires_at);
        }

        Ok(())
    }
}

/// Keeps track of which requests this client already liked.
///
/// A request can be marked once per window. Expired marks are dropped when the
/// guard is opened and whenever it is checked.
pub struct VoteGuard {
    window: Duration,
    entries: GuardEntries,
    store: Box<dyn GuardStore>,
}

impl VoteGuard {
    /// Opens the guard, reading whatever the store has persisted so far
    pub fn open<S>(store: S, window: Duration, now: DateTime<Utc>) -> Result<Self, GuardStoreError>
    where
        S: GuardStore + 'static,
    {
        let mut guard = Self {
            window,
            entries: store.load()?,
            store: Box::new(store),
        };

        guard.prune(now);
        Ok(guard)
    }

    /// Returns true if the request has an unexpired mark
    pub fn has_voted(&mut self, request_id: &str, now: DateTime<Utc>) -> bool {
        self.prune(now);
        self.entries.contains_key(request_id)
    }

    /// Marks the request as voted and persists the guard.
    /// The in-memory mark stays even if persisting fails.
    pub fn mark(&mut self, request_id: &str, now: DateTime<Utc>) -> Result<(), GuardStoreError> {
        self.prune(now);
        self.entries
            .insert(request_id.to_string(), now + self.window);

        self.store.save(&self.entries)
    }

    /// Returns when the mark for a request expires, if it has one
    pub fn expires_at(&self, request_id: &str) -> Option<DateTime<Utc>> {
        self.entries.get(request_id).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn prune(&mut self, now: DateTime<Utc>) {
        self.entries.retain(|_, expires_at| *expires_at > now);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    /// Shares entries between guards to simulate a reload
    #[derive(Default, Clone)]
    struct SharedStore(Arc<MemoryGuardStore>);

    impl GuardStore for SharedStore {
        fn load(&self) -> Result<GuardEntries, GuardStoreError> {
            self.0.load()
        }

        fn save(&self, entries: &GuardEntries) -> Result<(), GuardStoreError> {
            self.0.save(entries)
        }
    }

    #[test]
    fn marks_once_per_window() {
        let now = Utc::now();
        let mut guard = VoteGuard::open(MemoryGuardStore::default(), Duration::hours(24), now).unwrap();

        assert!(!guard.has_voted("a", now));
        guard.mark("a", now).unwrap();

        assert!(guard.has_voted("a", now + Duration::hours(23)));
        assert!(!guard.has_voted("b", now));
        assert!(!guard.has_voted("a", now + Duration::hours(24)));
        assert!(guard.is_empty());
    }

    #[test]
    fn survives_reopening() {
        let store = SharedStore::default();
        let now = Utc::now();

        let mut guard = VoteGuard::open(store.clone(), Duration::hours(24), now).unwrap();
        guard.mark("a", now).unwrap();
        drop(guard);

        let mut reopened = VoteGuard::open(store.clone(), Duration::hours(24), now).unwrap();
        assert!(reopened.has_voted("a", now));
        assert_eq!(reopened.expires_at("a"), Some(now + Duration::hours(24)));

        let expired = VoteGuard::open(store, Duration::hours(24), now + Duration::days(2)).unwrap();
        assert!(expired.is_empty());
    }
}
