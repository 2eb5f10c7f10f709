//! Error types.
//!
//! The store, notifier, segmenter and projector are infallible by
//! construction. Errors only come from the edges: spawning the render
//! thread, talking to it after it stopped, and writing to a terminal.

use std::io;
use thiserror::Error;

/// Errors produced by the actor and presentation layers.
#[derive(Debug, Error)]
pub enum Error {
    /// The OS refused to spawn a worker thread.
    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        /// Thread name that was requested.
        name: String,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// Writing to the output failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The projector actor has shut down and no longer accepts commands.
    #[error("projector actor has shut down")]
    ActorClosed,
}

/// Result type for fallible livelog operations.
pub type Result<T> = std::result::Result<T, Error>;
