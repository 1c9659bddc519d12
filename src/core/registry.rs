//! # Worker registry - the single source of truth for "what is running".
//!
//! Maps worker names to shared [`WorkerHandle`]s.
//!
//! ## Architecture
//! ```text
//! Controller.create ──► insert_if_absent(handle)  (check + insert under one write lock)
//! Controller.stop   ──► get(name)
//! Controller.list   ──► snapshot()
//! Controller.stop_all ─► snapshot() … remove(handle)      (after bounded join)
//! runner (worker exit) ─────────────► remove(handle)      (self-removal)
//! ```
//!
//! ## Rules
//! - At most one entry per name; racing inserts: exactly one wins
//! - Removal is **conditional on the handle id**: a worker that outlived a
//!   drain never removes a newer worker that reused its name
//! - Both removal paths are idempotent; whichever runs first wins
//! - No lock is held across an await on a worker

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::workers::WorkerHandle;

/// Concurrent name → handle map.
#[derive(Default)]
pub struct WorkerRegistry {
    workers: RwLock<HashMap<String, Arc<WorkerHandle>>>,
}

impl WorkerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `handle` unless its name is taken.
    ///
    /// On conflict returns the live handle that owns the name.
    pub async fn insert_if_absent(
        &self,
        handle: Arc<WorkerHandle>,
    ) -> Result<(), Arc<WorkerHandle>> {
        let mut workers = self.workers.write().await;
        match workers.entry(handle.name().to_string()) {
            Entry::Occupied(existing) => Err(Arc::clone(existing.get())),
            Entry::Vacant(slot) => {
                slot.insert(handle);
                Ok(())
            }
        }
    }

    /// Returns the handle registered under `name`.
    pub async fn get(&self, name: &str) -> Option<Arc<WorkerHandle>> {
        self.workers.read().await.get(name).cloned()
    }

    /// Removes the entry for `handle.name()` if it is still this very handle.
    ///
    /// Returns `true` if an entry was removed.
    pub async fn remove(&self, handle: &WorkerHandle) -> bool {
        let mut workers = self.workers.write().await;
        match workers.get(handle.name()) {
            Some(current) if current.id() == handle.id() => {
                workers.remove(handle.name());
                true
            }
            _ => false,
        }
    }

    /// Point-in-time copy of every entry, sorted by name.
    pub async fn snapshot(&self) -> Vec<Arc<WorkerHandle>> {
        let workers = self.workers.read().await;
        let mut all: Vec<Arc<WorkerHandle>> = workers.values().cloned().collect();
        drop(workers);
        all.sort_unstable_by(|a, b| a.name().cmp(b.name()));
        all
    }

    /// Returns sorted list of registered names.
    pub async fn names(&self) -> Vec<String> {
        let workers = self.workers.read().await;
        let mut names: Vec<String> = workers.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Number of registered workers.
    pub async fn len(&self) -> usize {
        self.workers.read().await.len()
    }

    /// Returns true if registry is empty.
    pub async fn is_empty(&self) -> bool {
        self.workers.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workers::WorkerSpec;
    use std::time::Duration;

    fn handle(name: &str) -> Arc<WorkerHandle> {
        Arc::new(WorkerHandle::new(WorkerSpec::fixed(name, Duration::from_secs(1))))
    }

    #[tokio::test]
    async fn insert_rejects_taken_name() {
        let reg = WorkerRegistry::new();
        let first = handle("w");
        assert!(reg.insert_if_absent(first.clone()).await.is_ok());

        let existing = reg.insert_if_absent(handle("w")).await.unwrap_err();
        assert_eq!(existing.id(), first.id());
        assert_eq!(reg.len().await, 1);
    }

    #[tokio::test]
    async fn stale_handle_does_not_remove_newer_entry() {
        let reg = WorkerRegistry::new();
        let old = handle("w");
        reg.insert_if_absent(old.clone()).await.unwrap();
        assert!(reg.remove(&old).await);

        let new = handle("w");
        reg.insert_if_absent(new.clone()).await.unwrap();
        assert!(!reg.remove(&old).await);
        assert_eq!(reg.get("w").await.map(|h| h.id()), Some(new.id()));
    }

    #[tokio::test]
    async fn removal_is_idempotent() {
        let reg = WorkerRegistry::new();
        let h = handle("w");
        reg.insert_if_absent(h.clone()).await.unwrap();
        assert!(reg.remove(&h).await);
        assert!(!reg.remove(&h).await);
        assert!(reg.is_empty().await);
    }

    #[tokio::test]
    async fn snapshot_is_sorted() {
        let reg = WorkerRegistry::new();
        for name in ["c", "a", "b"] {
            reg.insert_if_absent(handle(name)).await.unwrap();
        }
        let names: Vec<String> = reg
            .snapshot()
            .await
            .iter()
            .map(|h| h.name().to_string())
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(reg.names().await, names);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_inserts_have_one_winner() {
        let reg = Arc::new(WorkerRegistry::new());
        let mut joins = Vec::new();
        for _ in 0..16 {
            let reg = Arc::clone(&reg);
            joins.push(tokio::spawn(
                async move { reg.insert_if_absent(handle("x")).await.is_ok() },
            ));
        }
        let mut wins = 0;
        for j in joins {
            if j.await.unwrap() {
                wins += 1;
            }
        }
        assert_eq!(wins, 1);
        assert_eq!(reg.len().await, 1);
    }
}
