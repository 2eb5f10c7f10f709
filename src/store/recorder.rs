//! Recorder: An ordered store paired with a change notifier.
//!
//! This is the handle producers and consumers share. Producers call
//! [`Recorder::add`]/[`Recorder::remove`] and then
//! [`Recorder::notify_listeners`] once per batch, or [`Recorder::record`]
//! for one-shot items. Consumers subscribe a cheap wake-up callback and read
//! through cursors or snapshots.

use super::notifier::{ChangeNotifier, ListenerId};
use super::ordered::{LiveCursor, OrderedStore};
use crate::record::Key;
use std::sync::Arc;
use tracing::debug;

/// Shared, clonable recorder of items of type `T`.
#[derive(Debug)]
pub struct Recorder<T> {
    store: OrderedStore<T>,
    notifier: Arc<ChangeNotifier>,
}

impl<T> Clone for Recorder<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            notifier: Arc::clone(&self.notifier),
        }
    }
}

impl<T> Default for Recorder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync + 'static> Recorder<T> {
    /// Append without notifying.
    pub fn add(&self, item: T) -> Key {
        self.store.add(item)
    }

    /// Append and notify listeners.
    pub fn record(&self, item: T) -> Key {
        let key = self.store.add(item);
        self.notifier.notify_all();
        key
    }

    /// Remove without notifying. Absent keys are ignored.
    pub fn remove(&self, key: Key) -> bool {
        self.store.remove(key)
    }

    /// Drop all entries and notify listeners.
    ///
    /// Keys keep increasing afterwards, so cursors positioned before the
    /// clear never see a reused key.
    pub fn clear(&self) {
        let dropped = self.store.len();
        self.store.clear();
        debug!(dropped, "recorder cleared");
        self.notifier.notify_all();
    }
}

impl<T> Recorder<T> {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self {
            store: OrderedStore::new(),
            notifier: Arc::new(ChangeNotifier::new()),
        }
    }

    /// Look up a present entry.
    pub fn get(&self, key: Key) -> Option<Arc<T>> {
        self.store.get(key)
    }

    /// Number of present entries.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Whether no entries are present.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Live cursor from the first entry.
    pub fn cursor(&self) -> LiveCursor<T> {
        self.store.cursor()
    }

    /// Live cursor that only yields entries recorded after this call.
    pub fn cursor_at_end(&self) -> LiveCursor<T> {
        self.store.cursor_at_end()
    }

    /// Copy of all present entries, see [`OrderedStore::snapshot`].
    pub fn snapshot(&self) -> Vec<(Key, Arc<T>)> {
        self.store.snapshot()
    }

    /// The underlying store handle.
    pub fn store(&self) -> &OrderedStore<T> {
        &self.store
    }

    /// Register a change listener.
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.notifier.subscribe(listener)
    }

    /// Remove a change listener.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.notifier.unsubscribe(id)
    }

    /// Fire the change signal.
    pub fn notify_listeners(&self) {
        self.notifier.notify_all();
    }

    /// The notifier shared by all clones of this recorder.
    pub fn notifier(&self) -> &Arc<ChangeNotifier> {
        &self.notifier
    }
}
