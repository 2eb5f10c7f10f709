//! Message types for actor communication.

use crate::projection::{MapFn, Predicate};
use std::fmt;

/// Commands accepted by a [`ProjectorActor`](super::ProjectorActor).
pub enum ProjectorCommand<T, L> {
    /// Install a line filter.
    SetFilter(Predicate),
    /// Remove the line filter.
    ClearFilter,
    /// Replace the mapping; the whole document is rebuilt.
    SetMapping(MapFn<T, L>),
    /// Re-run the projection even without a store change.
    Refresh,
    /// Stop the actor thread.
    Shutdown,
}

impl<T, L> fmt::Debug for ProjectorCommand<T, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetFilter(_) => f.write_str("SetFilter(..)"),
            Self::ClearFilter => f.write_str("ClearFilter"),
            Self::SetMapping(_) => f.write_str("SetMapping(..)"),
            Self::Refresh => f.write_str("Refresh"),
            Self::Shutdown => f.write_str("Shutdown"),
        }
    }
}
