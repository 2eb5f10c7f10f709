//! Change notifier: Copy-on-write listener registry.
//!
//! The listener list is an immutable snapshot behind an [`ArcSwap`].
//! Subscribing or unsubscribing publishes a new snapshot; notifying loads
//! the snapshot current at call time and walks it without holding any lock,
//! so a listener may unsubscribe itself (or others) mid-dispatch.

use arc_swap::ArcSwap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Callback invoked on every change. Runs on the notifying (producer)
/// thread, so it must be cheap: mark dirty, wake a consumer, return.
pub type Listener = Arc<dyn Fn() + Send + Sync>;

/// Handle returned by [`ChangeNotifier::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Observer registry that fires a "changed" signal.
pub struct ChangeNotifier {
    listeners: ArcSwap<Vec<(ListenerId, Listener)>>,
    next_id: AtomicU64,
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("listeners", &self.listener_count())
            .finish_non_exhaustive()
    }
}

impl ChangeNotifier {
    /// Create a notifier with no listeners.
    pub fn new() -> Self {
        Self {
            listeners: ArcSwap::from_pointee(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a listener.
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let listener: Listener = Arc::new(listener);
        self.listeners.rcu(|current| {
            let mut next = Vec::with_capacity(current.len() + 1);
            next.extend(current.iter().cloned());
            next.push((id, Arc::clone(&listener)));
            next
        });
        id
    }

    /// Remove a listener. Returns whether it was registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let previous = self.listeners.rcu(|current| {
            current
                .iter()
                .filter(|(existing, _)| *existing != id)
                .cloned()
                .collect::<Vec<_>>()
        });
        previous.iter().any(|(existing, _)| *existing == id)
    }

    /// Invoke every listener registered at the time of the call.
    pub fn notify_all(&self) {
        let snapshot = self.listeners.load_full();
        for (_, listener) in snapshot.iter() {
            listener();
        }
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.load().len()
    }
}
