//! Registry of live child processes eligible for forced termination
//!
//! Insertion happens on the main thread right after a spawn; removal can
//! come from the main thread or from the shutdown thread. Removal is
//! idempotent, so either side may remove an entry the other already took.

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A child process the harness can stop on shutdown.
pub trait ProcessHandle: Send + Sync {
    fn pid(&self) -> u32;

    /// Ask the process to exit (SIGTERM or equivalent).
    fn terminate(&self) -> io::Result<()>;

    /// Force the process to exit (SIGKILL or equivalent).
    fn kill(&self) -> io::Result<()>;
}

/// Registry-assigned key; independent of the OS pid so pid reuse cannot alias entries
pub type TrackingId = u64;

#[derive(Default)]
pub struct ProcessRegistry {
    next_id: AtomicU64,
    entries: Mutex<HashMap<TrackingId, Arc<dyn ProcessHandle>>>,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<TrackingId, Arc<dyn ProcessHandle>>> {
        // Entries stay valid even if a holder panicked mid-operation.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn track(&self, handle: Arc<dyn ProcessHandle>) -> TrackingId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().insert(id, handle);
        id
    }

    /// Track `handle` until the returned guard is dropped.
    pub fn track_scoped(&self, handle: Arc<dyn ProcessHandle>) -> TrackGuard<'_> {
        let id = self.track(handle);
        TrackGuard { registry: self, id }
    }

    /// Remove an entry; removing an absent id is a no-op.
    pub fn untrack(&self, id: TrackingId) -> Option<Arc<dyn ProcessHandle>> {
        self.lock().remove(&id)
    }

    /// Entries at this instant, ordered by tracking id.
    pub fn snapshot(&self) -> Vec<(TrackingId, Arc<dyn ProcessHandle>)> {
        let mut entries: Vec<_> = self.lock().iter().map(|(id, handle)| (*id, Arc::clone(handle))).collect();
        entries.sort_by_key(|(id, _)| *id);
        entries
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Removes its entry from the registry when dropped.
pub struct TrackGuard<'a> {
    registry: &'a ProcessRegistry,
    id: TrackingId,
}

impl TrackGuard<'_> {
    pub fn id(&self) -> TrackingId {
        self.id
    }
}

impl Drop for TrackGuard<'_> {
    fn drop(&mut self) {
        self.registry.untrack(self.id);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    struct Noop(u32);

    impl ProcessHandle for Noop {
        fn pid(&self) -> u32 {
            self.0
        }
        fn terminate(&self) -> io::Result<()> {
            Ok(())
        }
        fn kill(&self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_track_and_untrack() {
        let registry = ProcessRegistry::new();
        let id = registry.track(Arc::new(Noop(10)));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.untrack(id).unwrap().pid(), 10);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_untrack_is_idempotent() {
        let registry = ProcessRegistry::new();
        let id = registry.track(Arc::new(Noop(10)));
        assert!(registry.untrack(id).is_some());
        assert!(registry.untrack(id).is_none());
        assert!(registry.untrack(999).is_none());
    }

    #[test]
    fn test_same_pid_tracked_twice_gets_distinct_ids() {
        let registry = ProcessRegistry::new();
        let a = registry.track(Arc::new(Noop(7)));
        let b = registry.track(Arc::new(Noop(7)));
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_guard_removes_on_drop() {
        let registry = ProcessRegistry::new();
        {
            let guard = registry.track_scoped(Arc::new(Noop(1)));
            assert_eq!(registry.snapshot()[0].0, guard.id());
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_guard_tolerates_concurrent_removal() {
        let registry = ProcessRegistry::new();
        let guard = registry.track_scoped(Arc::new(Noop(1)));
        registry.untrack(guard.id());
        drop(guard);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_concurrent_mutation() {
        let registry = Arc::new(ProcessRegistry::new());
        let workers: Vec<_> = (0..4)
            .map(|n| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        let id = registry.track(Arc::new(Noop(n * 1000 + i)));
                        registry.untrack(id);
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }
        assert!(registry.is_empty());
    }
}
