//! Store module: Concurrent storage and change signalling for the event log.
//!
//! This module contains:
//! - [`OrderedStore`]: Append-only, key-ordered map with live cursors
//! - [`ChangeNotifier`]: Copy-on-write listener registry
//! - [`Recorder`]: The two combined behind one clonable handle
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  add/remove   ┌──────────────┐  snapshot/cursor  ┌──────────────┐
//! │  Producers   │ ────────────▶ │ OrderedStore │ ◀──────────────── │   Consumer   │
//! │ (N threads)  │               └──────────────┘                   │ (1 thread)   │
//! │              │  notify_all   ┌──────────────┐   wake (cheap)    │              │
//! │              │ ────────────▶ │ChangeNotifier│ ────────────────▶ │              │
//! └──────────────┘               └──────────────┘                   └──────────────┘
//! ```

mod notifier;
mod ordered;
mod recorder;

pub use notifier::{ChangeNotifier, Listener, ListenerId};
pub use ordered::{LiveCursor, OrderedStore};
pub use recorder::Recorder;
