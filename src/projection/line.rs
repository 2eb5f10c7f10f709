//! Lines, documents and the deltas between them.

use crate::record::{ChannelId, Key, Record};
use std::fmt;
use std::sync::Arc;

/// How a line ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineEnd {
    /// Still in progress; more fragments may join it. Only ever the last line.
    Open,
    /// Closed by a terminated record.
    Terminated,
    /// Closed because a fragment from another channel started a new line.
    Broken,
}

/// One rendered line: consecutive same-channel fragments.
pub struct Line<L> {
    fragments: Vec<(Key, Arc<Record<L>>)>,
    end: LineEnd,
    text: String,
}

impl<L> Line<L> {
    /// Start a line with its first fragment.
    pub(crate) fn start(key: Key, record: Arc<Record<L>>) -> Self {
        let mut line = Self {
            fragments: Vec::with_capacity(1),
            end: LineEnd::Open,
            text: String::new(),
        };
        line.push(key, record);
        line
    }

    /// Append a fragment to an open line.
    pub(crate) fn push(&mut self, key: Key, record: Arc<Record<L>>) {
        debug_assert!(self.is_open());
        self.text.push_str(&record.text);
        if record.terminated {
            self.close(LineEnd::Terminated);
        }
        self.fragments.push((key, record));
    }

    /// Close the line.
    pub(crate) fn close(&mut self, end: LineEnd) {
        debug_assert!(end != LineEnd::Open);
        self.end = end;
        if !self.text.ends_with('\n') {
            self.text.push('\n');
        }
    }

    /// Fragments in key order.
    pub fn fragments(&self) -> &[(Key, Arc<Record<L>>)] {
        &self.fragments
    }

    /// Keys of the fragments, in order.
    pub fn keys(&self) -> impl Iterator<Item = Key> + '_ {
        self.fragments.iter().map(|(key, _)| *key)
    }

    /// How the line ends.
    pub const fn end(&self) -> LineEnd {
        self.end
    }

    /// Whether more fragments may still join this line.
    pub fn is_open(&self) -> bool {
        self.end == LineEnd::Open
    }

    /// Channel shared by every fragment.
    pub fn channel(&self) -> Option<ChannelId> {
        self.fragments.first().and_then(|(_, record)| record.channel)
    }

    /// Rendered text. Closed lines always end in `'\n'`.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Rendered length in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Whether the rendered text is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Rendered text split by label.
    ///
    /// A newline added to close the line is attributed to the last fragment.
    pub fn segments(&self) -> impl Iterator<Item = (&L, &str)> + '_ {
        let mut offset = 0;
        let count = self.fragments.len();
        self.fragments
            .iter()
            .enumerate()
            .map(move |(idx, (_, record))| {
                let end = if idx + 1 == count {
                    self.text.len()
                } else {
                    offset + record.text.len()
                };
                let segment = &self.text[offset..end];
                offset = end;
                (&record.label, segment)
            })
    }
}

impl<L> Clone for Line<L> {
    fn clone(&self) -> Self {
        Self {
            fragments: self.fragments.clone(),
            end: self.end,
            text: self.text.clone(),
        }
    }
}

impl<L> PartialEq for Line<L> {
    fn eq(&self, other: &Self) -> bool {
        self.end == other.end && self.keys().eq(other.keys())
    }
}

impl<L> Eq for Line<L> {}

impl<L> fmt::Debug for Line<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Line")
            .field("keys", &self.keys().collect::<Vec<_>>())
            .field("end", &self.end)
            .field("text", &self.text)
            .finish()
    }
}

/// Change from one document to the next: keep a prefix, replace the rest.
pub struct Delta<L> {
    /// Lines kept unchanged at the start.
    pub keep_lines: usize,
    /// Byte length of the kept lines.
    pub keep_len: usize,
    /// Lines removed after the kept prefix.
    pub removed: Vec<Line<L>>,
    /// Lines inserted after the kept prefix.
    pub inserted: Vec<Line<L>>,
}

impl<L> Delta<L> {
    /// Whether applying the delta changes nothing.
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.inserted.is_empty()
    }

    /// Byte length of the removed text.
    pub fn removed_len(&self) -> usize {
        self.removed.iter().map(Line::len).sum()
    }

    /// Apply to a plain-text rendering of the previous document.
    pub fn apply_to(&self, text: &mut String) {
        text.truncate(self.keep_len);
        for line in &self.inserted {
            text.push_str(line.text());
        }
    }
}

impl<L> Clone for Delta<L> {
    fn clone(&self) -> Self {
        Self {
            keep_lines: self.keep_lines,
            keep_len: self.keep_len,
            removed: self.removed.clone(),
            inserted: self.inserted.clone(),
        }
    }
}

impl<L> fmt::Debug for Delta<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delta")
            .field("keep_lines", &self.keep_lines)
            .field("keep_len", &self.keep_len)
            .field("removed", &self.removed)
            .field("inserted", &self.inserted)
            .finish()
    }
}

/// Ordered lines plus their concatenated text.
pub struct Document<L> {
    lines: Vec<Line<L>>,
    text: String,
}

impl<L> Default for Document<L> {
    fn default() -> Self {
        Self {
            lines: Vec::new(),
            text: String::new(),
        }
    }
}

impl<L> Document<L> {
    /// An empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// The lines, in order.
    pub fn lines(&self) -> &[Line<L>] {
        &self.lines
    }

    /// Full rendered text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Whether the document has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Apply a delta produced against this document.
    pub fn apply(&mut self, delta: &Delta<L>) {
        self.lines.truncate(delta.keep_lines);
        self.lines.extend(delta.inserted.iter().cloned());
        delta.apply_to(&mut self.text);
    }

    /// Replace the content with `next`, keeping the longest common prefix.
    ///
    /// With `full` set nothing is kept, even lines that compare equal.
    pub(crate) fn replace(&mut self, mut next: Vec<Line<L>>, full: bool) -> Delta<L> {
        let keep_lines = if full {
            0
        } else {
            self.lines
                .iter()
                .zip(&next)
                .take_while(|(old, new)| old == new)
                .count()
        };
        let keep_len = self.lines[..keep_lines].iter().map(Line::len).sum();

        let inserted = next.split_off(keep_lines);
        let removed = self.lines.split_off(keep_lines);

        self.text.truncate(keep_len);
        for line in &inserted {
            self.text.push_str(line.text());
        }
        self.lines.extend(inserted.iter().cloned());

        Delta {
            keep_lines,
            keep_len,
            removed,
            inserted,
        }
    }
}

impl<L> Clone for Document<L> {
    fn clone(&self) -> Self {
        Self {
            lines: self.lines.clone(),
            text: self.text.clone(),
        }
    }
}

impl<L> fmt::Debug for Document<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("lines", &self.lines)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(text: &str, terminated: bool) -> Arc<Record<u8>> {
        Arc::new(Record::fragment(0, text, None, terminated))
    }

    #[test]
    fn test_line_text_and_end() {
        let mut line = Line::start(Key(1), rec("Foo ", false));
        assert!(line.is_open());
        assert_eq!(line.text(), "Foo ");

        line.push(Key(2), rec("Bar", true));
        assert_eq!(line.end(), LineEnd::Terminated);
        assert_eq!(line.text(), "Foo Bar\n");
    }

    #[test]
    fn test_broken_line_gets_newline() {
        let mut line = Line::start(Key(1), rec("half", false));
        line.close(LineEnd::Broken);
        assert_eq!(line.text(), "half\n");
        assert_eq!(line.end(), LineEnd::Broken);
    }

    #[test]
    fn test_segments_cover_text() {
        let mut line = Line::start(Key(1), Arc::new(Record::fragment(1u8, "a", None, false)));
        line.push(Key(2), Arc::new(Record::fragment(2u8, "b", None, false)));
        line.close(LineEnd::Broken);

        let segments: Vec<_> = line.segments().map(|(l, s)| (*l, s.to_string())).collect();
        assert_eq!(segments, vec![(1, "a".to_string()), (2, "b\n".to_string())]);
    }

    #[test]
    fn test_equality_ignores_labels() {
        let a = Line::start(Key(3), Arc::new(Record::fragment(1u8, "x\n", None, true)));
        let b = Line::start(Key(3), Arc::new(Record::fragment(9u8, "y\n", None, true)));
        let c = Line::start(Key(4), Arc::new(Record::fragment(1u8, "x\n", None, true)));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_replace_keeps_common_prefix() {
        let mut doc = Document::new();
        let first = vec![
            Line::start(Key(1), rec("a\n", true)),
            Line::start(Key(2), rec("b", false)),
        ];
        let delta = doc.replace(first, false);
        assert_eq!(delta.keep_lines, 0);
        assert_eq!(doc.text(), "a\nb");

        let second = vec![
            Line::start(Key(1), rec("a\n", true)),
            Line::start(Key(3), rec("bc", false)),
        ];
        let delta = doc.replace(second, false);
        assert_eq!(delta.keep_lines, 1);
        assert_eq!(delta.keep_len, 2);
        assert_eq!(delta.removed.len(), 1);
        assert_eq!(delta.removed_len(), 1);
        assert_eq!(doc.text(), "a\nbc");
        assert_eq!(doc.line_count(), 2);
    }

    #[test]
    fn test_apply_mirrors_replace() {
        let mut source = Document::new();
        let mut mirror = Document::new();
        let mut plain = String::new();

        for lines in [
            vec![Line::start(Key(1), rec("x", false))],
            vec![
                Line::start(Key(2), rec("xy\n", true)),
                Line::start(Key(3), rec("z", false)),
            ],
            vec![Line::start(Key(2), rec("xy\n", true))],
        ] {
            let delta = source.replace(lines, false);
            mirror.apply(&delta);
            delta.apply_to(&mut plain);
            assert_eq!(mirror.text(), source.text());
            assert_eq!(plain, source.text());
        }
        assert_eq!(plain, "xy\n");
    }

    #[test]
    fn test_full_replace_keeps_nothing() {
        let mut doc = Document::new();
        doc.replace(vec![Line::start(Key(1), rec("a\n", true))], false);
        let delta = doc.replace(vec![Line::start(Key(1), rec("a\n", true))], true);
        assert_eq!(delta.keep_lines, 0);
        assert_eq!(delta.removed.len(), 1);
        assert_eq!(delta.inserted.len(), 1);
        assert!(!delta.is_empty());
    }
}
