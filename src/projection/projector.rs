//! `FilteredProjector`: Incremental, filtered line view over a store.

use super::line::{Delta, Document, Line, LineEnd};
use crate::record::{Key, Record};
use crate::store::OrderedStore;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Maps a stored item to a displayable record, or discards it.
pub type MapFn<T, L> = Box<dyn Fn(&T) -> Option<Record<L>> + Send>;

/// Line-level filter over rendered line text.
pub type Predicate = Box<dyn Fn(&str) -> bool + Send>;

/// Projects an [`OrderedStore`] into a [`Document`] of lines.
///
/// Each [`update`](Self::update) re-derives the line list from a consistent
/// snapshot of the source and returns only what changed since the previous
/// call. Mapped records are cached per key, so the mapping runs once for
/// every stored item.
///
/// # Example
///
/// ```
/// use livelog::{FilteredProjector, OrderedStore, Record};
///
/// let store = OrderedStore::new();
/// let mut view = FilteredProjector::identity(store.clone());
///
/// store.add(Record::new((), "Hello "));
/// store.add(Record::new((), "World\n"));
/// view.update();
/// assert_eq!(view.document().text(), "Hello World\n");
/// ```
pub struct FilteredProjector<T, L> {
    source: OrderedStore<T>,
    map: MapFn<T, L>,
    predicate: Option<Predicate>,
    cache: BTreeMap<Key, Option<Arc<Record<L>>>>,
    document: Document<L>,
    invalidated: bool,
}

impl<L: Clone + Send + 'static> FilteredProjector<Record<L>, L> {
    /// Projector over records, shown as they are.
    pub fn identity(source: OrderedStore<Record<L>>) -> Self {
        Self::new(source, |record: &Record<L>| Some(record.clone()))
    }
}

impl<T, L> FilteredProjector<T, L> {
    /// Create a projector mapping items of `source` with `map`.
    pub fn new<F>(source: OrderedStore<T>, map: F) -> Self
    where
        F: Fn(&T) -> Option<Record<L>> + Send + 'static,
    {
        Self {
            source,
            map: Box::new(map),
            predicate: None,
            cache: BTreeMap::new(),
            document: Document::new(),
            invalidated: false,
        }
    }

    /// Show only lines whose text satisfies `predicate`.
    pub fn set_filter<P>(&mut self, predicate: P)
    where
        P: Fn(&str) -> bool + Send + 'static,
    {
        self.predicate = Some(Box::new(predicate));
    }

    /// Show every line.
    pub fn clear_filter(&mut self) {
        self.predicate = None;
    }

    /// Whether a line filter is installed.
    pub fn has_filter(&self) -> bool {
        self.predicate.is_some()
    }

    /// Replace the mapping. The next update rebuilds the whole document.
    pub fn set_mapping<F>(&mut self, map: F)
    where
        F: Fn(&T) -> Option<Record<L>> + Send + 'static,
    {
        self.map = Box::new(map);
        self.invalidate();
    }

    /// Switch to another source. The next update rebuilds the whole document.
    pub fn set_source(&mut self, source: OrderedStore<T>) {
        self.source = source;
        self.invalidate();
    }

    /// The source being projected.
    pub const fn source(&self) -> &OrderedStore<T> {
        &self.source
    }

    /// The document as of the last update.
    pub const fn document(&self) -> &Document<L> {
        &self.document
    }

    fn invalidate(&mut self) {
        debug!(cached = self.cache.len(), "projection invalidated");
        self.cache.clear();
        self.invalidated = true;
    }

    /// Bring the document up to date with the source.
    ///
    /// If the mapping or the predicate panics, the panic propagates and the
    /// previous document is left untouched.
    pub fn update(&mut self) -> Delta<L> {
        let snapshot = self.source.snapshot();

        let mut cache = BTreeMap::new();
        let mut mapped = Vec::with_capacity(snapshot.len());
        for (key, item) in &snapshot {
            let record = match self.cache.get(key) {
                Some(hit) => hit.clone(),
                None => (self.map)(&**item).map(Arc::new),
            };
            if let Some(record) = &record {
                mapped.push((*key, Arc::clone(record)));
            }
            cache.insert(*key, record);
        }

        let mut lines = merge_lines(mapped);
        if let Some(predicate) = &self.predicate {
            lines.retain(|line| predicate(line.text()));
        }

        self.cache = cache;
        let full = std::mem::take(&mut self.invalidated);
        let delta = self.document.replace(lines, full);
        trace!(
            items = snapshot.len(),
            kept = delta.keep_lines,
            removed = delta.removed.len(),
            inserted = delta.inserted.len(),
            "projection updated"
        );
        delta
    }
}

impl<T, L> fmt::Debug for FilteredProjector<T, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilteredProjector")
            .field("filtered", &self.predicate.is_some())
            .field("cached", &self.cache.len())
            .field("lines", &self.document.line_count())
            .finish_non_exhaustive()
    }
}

/// Merge mapped records into lines.
///
/// A record joins the last line when that line is open and on the same
/// channel. A record on another channel closes the open line as broken.
fn merge_lines<L>(records: Vec<(Key, Arc<Record<L>>)>) -> Vec<Line<L>> {
    let mut lines: Vec<Line<L>> = Vec::new();

    for (key, record) in records {
        match lines.last_mut() {
            Some(line) if line.is_open() && line.channel() == record.channel => {
                line.push(key, record);
                continue;
            }
            Some(line) if line.is_open() => line.close(LineEnd::Broken),
            _ => {}
        }
        lines.push(Line::start(key, record));
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::LineSegmenter;
    use crate::record::ChannelId;
    use crate::store::Recorder;

    fn add_all(store: &OrderedStore<Record<()>>, texts: &[&str]) {
        for text in texts {
            store.add(Record::new((), *text));
        }
    }

    #[test]
    fn test_merge_and_filter_lines() {
        let store = OrderedStore::new();
        let mut view = FilteredProjector::identity(store.clone());

        add_all(&store, &["XYZ\n", "Foo ", "Bar", "\n", "Hello "]);
        view.update();
        add_all(&store, &["World", "!"]);
        view.update();
        assert_eq!(view.document().text(), "XYZ\nFoo Bar\nHello World!");

        view.set_filter(|line| line.contains("Hello World!") || line.contains('X'));
        view.update();
        assert_eq!(view.document().text(), "XYZ\nHello World!");

        view.clear_filter();
        view.update();
        assert_eq!(view.document().text(), "XYZ\nFoo Bar\nHello World!");
    }

    #[test]
    fn test_update_keeps_stable_prefix() {
        let store = OrderedStore::new();
        let mut view = FilteredProjector::identity(store.clone());

        add_all(&store, &["one\n", "two\n", "thr"]);
        let delta = view.update();
        assert_eq!(delta.keep_lines, 0);
        assert_eq!(delta.inserted.len(), 3);

        add_all(&store, &["ee\n"]);
        let delta = view.update();
        assert_eq!(delta.keep_lines, 2);
        assert_eq!(delta.keep_len, "one\ntwo\n".len());
        assert_eq!(delta.removed.len(), 1);
        assert_eq!(delta.inserted.len(), 1);
        assert_eq!(delta.inserted[0].text(), "three\n");

        assert!(view.update().is_empty());
    }

    #[test]
    fn test_channel_switch_breaks_line() {
        let store = OrderedStore::new();
        let mut view = FilteredProjector::identity(store.clone());

        store.add(Record::new((), "out").with_channel(ChannelId(1)));
        store.add(Record::new((), "err\n").with_channel(ChannelId(2)));
        store.add(Record::new((), " more").with_channel(ChannelId(1)));
        view.update();

        let ends: Vec<_> = view.document().lines().iter().map(Line::end).collect();
        assert_eq!(ends, vec![LineEnd::Broken, LineEnd::Terminated, LineEnd::Open]);
        assert_eq!(view.document().text(), "out\nerr\n more");
    }

    #[test]
    fn test_deltas_reproduce_document() {
        let store = OrderedStore::new();
        let mut view = FilteredProjector::identity(store.clone());
        let mut mirror = String::new();

        for chunk in ["a", "b\n", "c\n", "d", "e", "\n", "f"] {
            store.add(Record::new((), chunk));
            view.update().apply_to(&mut mirror);
            assert_eq!(mirror, view.document().text());
        }

        view.set_filter(|line| line.starts_with('c'));
        view.update().apply_to(&mut mirror);
        assert_eq!(mirror, "c\n");
    }

    #[test]
    fn test_empty_source() {
        let store: OrderedStore<Record<()>> = OrderedStore::new();
        let mut view = FilteredProjector::identity(store);
        assert!(view.update().is_empty());
        assert!(view.document().is_empty());
        assert_eq!(view.document().text(), "");
    }

    #[test]
    fn test_mapping_discards_before_merge() {
        let store = OrderedStore::new();
        let mut view = FilteredProjector::new(store.clone(), |text: &String| {
            (!text.starts_with('#')).then(|| Record::new((), text.as_str()))
        });

        store.add("Hello ".to_string());
        store.add("#hidden ".to_string());
        store.add("World\n".to_string());
        view.update();
        assert_eq!(view.document().text(), "Hello World\n");
    }

    #[test]
    fn test_mapping_runs_once_per_key() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let store = OrderedStore::new();
        let mut view = FilteredProjector::new(store.clone(), move |n: &u32| {
            counter.fetch_add(1, Ordering::SeqCst);
            Some(Record::new((), format!("{n}\n")))
        });

        store.add(1);
        store.add(2);
        view.update();
        store.add(3);
        view.update();
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        view.set_mapping(|n: &u32| Some(Record::new((), format!("<{n}>\n"))));
        let delta = view.update();
        assert_eq!(delta.keep_lines, 0);
        assert_eq!(view.document().text(), "<1>\n<2>\n<3>\n");
    }

    #[test]
    fn test_set_source_rebuilds() {
        let first = OrderedStore::new();
        let second = OrderedStore::new();
        first.add(Record::new((), "first\n"));
        second.add(Record::new((), "second\n"));

        let mut view = FilteredProjector::identity(first);
        view.update();
        view.set_source(second);
        let delta = view.update();
        assert_eq!(delta.removed.len(), 1);
        assert_eq!(view.document().text(), "second\n");
    }

    #[test]
    fn test_panicking_mapping_leaves_document() {
        let store = OrderedStore::new();
        let mut view = FilteredProjector::new(store.clone(), |n: &i32| {
            assert!(*n >= 0, "negative");
            Some(Record::new((), format!("{n}\n")))
        });

        store.add(1);
        view.update();
        store.add(-1);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| view.update()));
        assert!(result.is_err());
        assert_eq!(view.document().text(), "1\n");
    }

    #[test]
    fn test_in_progress_replacement_never_duplicates() {
        let recorder = Recorder::new();
        let mut seg = LineSegmenter::new(recorder.clone(), ());
        let mut view = FilteredProjector::identity(recorder.store().clone());
        let mut mirror = String::new();

        for chunk in ["Hel", "lo", " Wor", "ld\nnext", " line\n"] {
            seg.write(ChannelId(0), chunk);
            view.update().apply_to(&mut mirror);
            assert_eq!(mirror, view.document().text());
        }
        assert_eq!(mirror, "Hello World\nnext line\n");
    }
}
