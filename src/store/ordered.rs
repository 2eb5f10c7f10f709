//! Ordered store: Thread-safe append-only map with live cursors.
//!
//! Entries live in a lock-free skip list, so readers never hold anything a
//! producer waits on. Producers serialize only on the key counter: a key is
//! assigned and its entry inserted under one short mutex, so readers observe
//! entries in exactly the order their keys were assigned. Cursors remember
//! only the last key they returned and re-query the map on every poll, which
//! makes them "live": a cursor that ran dry yields new entries as soon as
//! they are added.

use crate::record::Key;
use crossbeam_skiplist::SkipMap;
use parking_lot::Mutex;
use std::ops::Bound;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

/// Snapshot passes retried when removals race with them.
const SNAPSHOT_RETRIES: usize = 8;

/// Shared state behind a store handle.
#[derive(Debug)]
struct Entries<T> {
    /// Last key handed out. Never decreases, not even on `clear`.
    last_key: Mutex<u64>,
    /// Bumped after every removal, so a reader can tell whether the map
    /// lost entries while it walked it.
    removals: AtomicU64,
    /// Present entries, ordered by key.
    map: SkipMap<u64, Arc<T>>,
}

/// Thread-safe, append-only, key-ordered store.
///
/// This is a cheap handle: clones share the same entries. Values are kept
/// behind `Arc` and never handed out mutably, so an entry visible to one
/// reader looks the same to every other reader for as long as it exists.
#[derive(Debug)]
pub struct OrderedStore<T> {
    inner: Arc<Entries<T>>,
}

impl<T> Clone for OrderedStore<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for OrderedStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync + 'static> OrderedStore<T> {
    /// Append an item and return its freshly assigned key.
    pub fn add(&self, item: T) -> Key {
        let item = Arc::new(item);
        let mut last_key = self.inner.last_key.lock();
        *last_key += 1;
        let key = *last_key;
        self.inner.map.insert(key, item);
        Key(key)
    }

    /// Remove an entry.
    ///
    /// Returns whether something was removed. Removing an absent or
    /// never-assigned key is a no-op.
    pub fn remove(&self, key: Key) -> bool {
        let removed = self.inner.map.remove(&key.0).is_some();
        if removed {
            self.inner.removals.fetch_add(1, Ordering::SeqCst);
        }
        removed
    }

    /// Drop every entry. The key counter keeps counting.
    pub fn clear(&self) {
        self.inner.map.clear();
        self.inner.removals.fetch_add(1, Ordering::SeqCst);
    }
}

impl<T> OrderedStore<T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Entries {
                last_key: Mutex::new(0),
                removals: AtomicU64::new(0),
                map: SkipMap::new(),
            }),
        }
    }

    /// Look up a present entry.
    pub fn get(&self, key: Key) -> Option<Arc<T>> {
        self.inner
            .map
            .get(&key.0)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Number of present entries.
    pub fn len(&self) -> usize {
        self.inner.map.len()
    }

    /// Whether no entries are present.
    pub fn is_empty(&self) -> bool {
        self.inner.map.is_empty()
    }

    /// The most recently assigned key, if any key was ever assigned.
    ///
    /// The entry itself may already have been removed.
    pub fn last_key(&self) -> Option<Key> {
        match *self.inner.last_key.lock() {
            0 => None,
            key => Some(Key(key)),
        }
    }

    /// Copy out every present entry in key order.
    ///
    /// Producers keep adding and removing while the copy is taken. Entries
    /// added meanwhile may or may not be included, but they only ever extend
    /// the result. A pass that raced with a removal is taken again, so a
    /// record replaced by a newer one is not returned next to its successor.
    /// After a bounded number of retries the last pass is returned as is.
    pub fn snapshot(&self) -> Vec<(Key, Arc<T>)> {
        let mut attempt = 0;
        loop {
            let removals = self.inner.removals.load(Ordering::SeqCst);
            let entries: Vec<_> = self
                .inner
                .map
                .iter()
                .map(|entry| (Key(*entry.key()), Arc::clone(entry.value())))
                .collect();
            attempt += 1;
            if removals == self.inner.removals.load(Ordering::SeqCst)
                || attempt >= SNAPSHOT_RETRIES
            {
                return entries;
            }
            trace!(attempt, "snapshot raced with a removal");
        }
    }

    /// A live cursor starting before the first entry.
    pub fn cursor(&self) -> LiveCursor<T> {
        LiveCursor {
            store: self.clone(),
            after: 0,
        }
    }

    /// A live cursor that yields only entries with keys greater than `key`.
    pub fn cursor_after(&self, key: Key) -> LiveCursor<T> {
        LiveCursor {
            store: self.clone(),
            after: key.0,
        }
    }

    /// A live cursor that yields only entries added after this call.
    pub fn cursor_at_end(&self) -> LiveCursor<T> {
        let after = *self.inner.last_key.lock();
        LiveCursor {
            store: self.clone(),
            after,
        }
    }

    /// First present entry with a key strictly greater than `after`.
    fn first_after(&self, after: u64) -> Option<(Key, Arc<T>)> {
        self.inner
            .map
            .lower_bound(Bound::Excluded(&after))
            .map(|entry| (Key(*entry.key()), Arc::clone(entry.value())))
    }
}

/// Forward cursor over an [`OrderedStore`] that is never permanently exhausted.
///
/// `next()` returning `None` means "nothing right now". Polling again after
/// more entries were added yields them in key order. For that reason this
/// iterator does not implement `FusedIterator`; do not wrap it in `fuse()`
/// if you intend to poll it across time.
#[derive(Debug)]
pub struct LiveCursor<T> {
    store: OrderedStore<T>,
    /// Last key returned (0 = before the first key).
    after: u64,
}

impl<T> LiveCursor<T> {
    /// Return the next entry with its key, advancing the cursor.
    pub fn poll(&mut self) -> Option<(Key, Arc<T>)> {
        let (key, item) = self.store.first_after(self.after)?;
        self.after = key.0;
        Some((key, item))
    }

    /// Whether an entry is available right now.
    pub fn has_next(&self) -> bool {
        self.store.first_after(self.after).is_some()
    }

    /// Key of the last entry returned, if any.
    pub const fn position(&self) -> Option<Key> {
        match self.after {
            0 => None,
            key => Some(Key(key)),
        }
    }

    /// Drain every entry available right now.
    pub fn drain_available(&mut self) -> Vec<(Key, Arc<T>)> {
        let mut items = Vec::new();
        while let Some(entry) = self.poll() {
            items.push(entry);
        }
        items
    }
}

impl<T> Iterator for LiveCursor<T> {
    type Item = Arc<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.poll().map(|(_, item)| item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_add_assigns_increasing_keys() {
        let store = OrderedStore::new();
        let a = store.add("a");
        let b = store.add("b");
        assert!(a < b);
        assert_eq!(a.get(), 1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_store_remove_is_idempotent() {
        let store = OrderedStore::new();
        let a = store.add(1);
        let b = store.add(2);

        assert!(store.remove(a));
        assert!(!store.remove(a));
        assert!(!store.remove(Key(999)));

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(b).as_deref(), Some(&2));
    }

    #[test]
    fn test_store_clear_keeps_counter() {
        let store = OrderedStore::new();
        store.add("x");
        let before = store.add("y");
        store.clear();
        assert!(store.is_empty());

        let after = store.add("z");
        assert!(after > before);
        assert_eq!(store.last_key(), Some(after));
    }

    #[test]
    fn test_cursor_is_live() {
        let store = OrderedStore::new();
        let mut cursor = store.cursor();
        assert!(!cursor.has_next());
        assert_eq!(cursor.next(), None);

        store.add("first");
        assert!(cursor.has_next());
        assert_eq!(cursor.next().as_deref(), Some(&"first"));
        assert_eq!(cursor.next(), None);

        store.add("second");
        store.add("third");
        let rest: Vec<_> = cursor.by_ref().map(|s| *s).collect();
        assert_eq!(rest, vec!["second", "third"]);
        assert_eq!(cursor.position(), Some(Key(3)));
    }

    #[test]
    fn test_cursor_skips_removed_entries() {
        let store = OrderedStore::new();
        let mut cursor = store.cursor();
        let a = store.add('a');
        store.add('b');
        store.remove(a);

        assert_eq!(cursor.next().as_deref(), Some(&'b'));
        assert_eq!(cursor.next(), None);
    }

    #[test]
    fn test_cursor_at_end_ignores_history() {
        let store = OrderedStore::new();
        store.add(1);
        store.add(2);

        let mut cursor = store.cursor_at_end();
        assert_eq!(cursor.next(), None);

        store.add(3);
        assert_eq!(cursor.next().as_deref(), Some(&3));
    }

    #[test]
    fn test_cursor_at_end_after_clear() {
        let store = OrderedStore::new();
        store.add(1);
        store.add(2);
        store.clear();

        // Must not restart at key 1 just because the map is empty.
        let mut cursor = store.cursor_at_end();
        let key = store.add(3);
        assert_eq!(cursor.poll().map(|(k, _)| k), Some(key));
    }

    #[test]
    fn test_cursor_after_key() {
        let store = OrderedStore::new();
        let a = store.add("a");
        store.add("b");
        let mut cursor = store.cursor_after(a);
        assert_eq!(cursor.next().as_deref(), Some(&"b"));
    }

    #[test]
    fn test_snapshot_is_ordered() {
        let store = OrderedStore::new();
        for i in 0..10 {
            store.add(i);
        }
        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 10);
        assert!(snapshot.windows(2).all(|w| w[0].0 < w[1].0));
        assert_eq!(*snapshot[9].1, 9);
    }

    #[test]
    fn test_drain_available() {
        let store = OrderedStore::new();
        let mut cursor = store.cursor();
        store.add(1);
        store.add(2);
        assert_eq!(cursor.drain_available().len(), 2);
        assert!(cursor.drain_available().is_empty());
    }
}
