//! Line segmenter: Turns arbitrary text chunks into line records.
//!
//! Output streams deliver chunks with no line alignment. For every channel
//! the segmenter keeps the unterminated tail (`remainder`) and the key of the
//! record currently showing it. Completed lines become immutable terminated
//! records; the tail is re-published as a single in-progress record that is
//! removed and re-added (under a new key) whenever it grows.
//!
//! ```text
//! write("Hello ")   store: [#1 "Hello " …]
//! write("World\n")  store: [#2 "Hello World\n"]          (#1 removed)
//! write("!")        store: [#2 "Hello World\n", #3 "!" …]
//! ```

use crate::record::{ChannelId, Key, Record};
use crate::store::Recorder;
use std::collections::HashMap;
use tracing::trace;

/// Per-channel segmentation state.
#[derive(Debug, Clone)]
struct ChannelState<L> {
    /// Label stamped on records emitted for this channel.
    label: L,
    /// Key of the in-progress record, if one is published.
    last_key: Option<Key>,
    /// Text after the last newline.
    remainder: String,
    /// Bytes of an incomplete UTF-8 sequence from the previous byte write.
    pending: Vec<u8>,
}

impl<L> ChannelState<L> {
    const fn new(label: L) -> Self {
        Self {
            label,
            last_key: None,
            remainder: String::new(),
            pending: Vec::new(),
        }
    }
}

/// Splits streamed text into line records, one state machine per channel.
///
/// A segmenter is owned by a single writer at a time; share it behind a
/// mutex (see [`ChannelWriter`](super::ChannelWriter)) when several threads
/// write to it.
#[derive(Debug)]
pub struct LineSegmenter<L> {
    recorder: Recorder<Record<L>>,
    default_label: L,
    channels: HashMap<ChannelId, ChannelState<L>>,
}

impl<L: Clone + Send + Sync + 'static> LineSegmenter<L> {
    /// Create a segmenter writing into `recorder`.
    ///
    /// Channels that were never given a label via [`set_label`](Self::set_label)
    /// use `default_label`.
    pub fn new(recorder: Recorder<Record<L>>, default_label: L) -> Self {
        Self {
            recorder,
            default_label,
            channels: HashMap::new(),
        }
    }

    /// Set the label used for records emitted on `channel` from now on.
    pub fn set_label(&mut self, channel: ChannelId, label: L) {
        self.channels
            .entry(channel)
            .and_modify(|state| state.label = label.clone())
            .or_insert_with(|| ChannelState::new(label));
    }

    /// The recorder this segmenter writes into.
    pub const fn recorder(&self) -> &Recorder<Record<L>> {
        &self.recorder
    }

    /// Key of the in-progress record for `channel`, if any.
    pub fn in_progress(&self, channel: ChannelId) -> Option<Key> {
        self.channels.get(&channel).and_then(|state| state.last_key)
    }

    /// Unterminated text buffered for `channel`.
    pub fn remainder(&self, channel: ChannelId) -> &str {
        self.channels
            .get(&channel)
            .map_or("", |state| state.remainder.as_str())
    }

    /// Feed a text chunk to `channel`.
    ///
    /// Emits one terminated record per completed line and republishes the
    /// unterminated tail, then notifies listeners once. Empty chunks are
    /// ignored.
    pub fn write(&mut self, channel: ChannelId, chunk: &str) {
        if chunk.is_empty() {
            return;
        }

        let recorder = &self.recorder;
        let state = self
            .channels
            .entry(channel)
            .or_insert_with(|| ChannelState::new(self.default_label.clone()));

        state.remainder.push_str(chunk);

        let mut consumed = 0;
        let mut completed = 0usize;
        while let Some(offset) = state.remainder[consumed..].find('\n') {
            let end = consumed + offset + 1;
            if let Some(key) = state.last_key.take() {
                recorder.remove(key);
            }
            recorder.add(Record::fragment(
                state.label.clone(),
                &state.remainder[consumed..end],
                Some(channel),
                true,
            ));
            consumed = end;
            completed += 1;
        }
        state.remainder.drain(..consumed);

        if !state.remainder.is_empty() {
            if let Some(key) = state.last_key.take() {
                recorder.remove(key);
            }
            let key = recorder.add(Record::fragment(
                state.label.clone(),
                state.remainder.as_str(),
                Some(channel),
                false,
            ));
            state.last_key = Some(key);
        }

        trace!(
            channel = channel.0,
            completed,
            pending = state.remainder.len(),
            "segmented chunk"
        );
        recorder.notify_listeners();
    }

    /// Feed raw bytes to `channel`.
    ///
    /// A multi-byte character split across calls is held back until its
    /// remaining bytes arrive. Invalid sequences become U+FFFD.
    pub fn write_bytes(&mut self, channel: ChannelId, bytes: &[u8]) {
        let state = self
            .channels
            .entry(channel)
            .or_insert_with(|| ChannelState::new(self.default_label.clone()));

        let mut buf = std::mem::take(&mut state.pending);
        buf.extend_from_slice(bytes);
        let (text, pending) = decode_utf8(&buf);
        state.pending = pending;

        self.write(channel, &text);
    }
}

/// Decode as much UTF-8 as possible.
///
/// Returns the decoded text and the bytes of a trailing incomplete sequence.
fn decode_utf8(bytes: &[u8]) -> (String, Vec<u8>) {
    let mut out = String::with_capacity(bytes.len());
    let mut chunks = bytes.utf8_chunks().peekable();

    while let Some(chunk) = chunks.next() {
        out.push_str(chunk.valid());
        let invalid = chunk.invalid();
        if invalid.is_empty() {
            continue;
        }
        // Only the very end can hold a character whose bytes are still coming
        let truncated = chunks.peek().is_none()
            && std::str::from_utf8(invalid).is_err_and(|err| err.error_len().is_none());
        if truncated {
            return (out, invalid.to_vec());
        }
        out.push(char::REPLACEMENT_CHARACTER);
    }

    (out, Vec::new())
}
