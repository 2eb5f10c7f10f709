//! Record: The atomic unit of the event log.
//!
//! A record is one addressable piece of logged text plus a display label,
//! an optional channel tag and a termination flag. Records are immutable
//! once inserted into a store; replacing text means removing the old key and
//! adding a new record under a fresh key.

use std::fmt;

/// Sequence key assigned by an [`OrderedStore`](crate::store::OrderedStore).
///
/// Keys are strictly increasing per store and never reused, so the total
/// order over keys is the chronological order of insertion.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Key(pub(crate) u64);

impl Key {
    /// The raw sequence number.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tag for a logical stream of text (e.g. one process's stdout).
///
/// Fragments are only ever merged onto the same rendered line when they
/// share a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChannelId(pub u32);

impl ChannelId {
    /// Create a channel tag.
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

/// A single piece of logged text.
///
/// `L` is an opaque label attached by the producer (usually a display
/// style). The core never looks inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record<L> {
    /// Caller-supplied label, passed through untouched.
    pub label: L,
    /// Text payload. Terminated records usually end in `'\n'`.
    pub text: String,
    /// Stream this fragment belongs to.
    pub channel: Option<ChannelId>,
    /// This text ends a line; nothing will be merged onto it.
    pub terminated: bool,
}

impl<L> Record<L> {
    /// Create a record without a channel, terminated iff the text ends in a newline.
    pub fn new(label: L, text: impl Into<String>) -> Self {
        let text = text.into();
        let terminated = text.ends_with('\n');
        Self {
            label,
            text,
            channel: None,
            terminated,
        }
    }

    /// Create a fragment with every field explicit.
    pub fn fragment(
        label: L,
        text: impl Into<String>,
        channel: Option<ChannelId>,
        terminated: bool,
    ) -> Self {
        Self {
            label,
            text: text.into(),
            channel,
            terminated,
        }
    }

    /// Builder: attach a channel tag.
    #[must_use]
    pub fn with_channel(mut self, channel: ChannelId) -> Self {
        self.channel = Some(channel);
        self
    }

    /// Builder: force the terminated flag.
    #[must_use]
    pub fn with_terminated(mut self, terminated: bool) -> Self {
        self.terminated = terminated;
        self
    }

    /// The text payload.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }
}
