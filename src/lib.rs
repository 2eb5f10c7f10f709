//! # Livelog
//!
//! A live event log for consoles and log viewers.
//!
//! Many producer threads append text records to a shared, key-ordered
//! store. A single consumer per view turns the store into a document of
//! lines and redraws only what changed.
//!
//! ## Core Concepts
//!
//! - **Ordered store**: Append-only map with monotonically increasing keys and
//!   live cursors that keep working while producers write
//! - **Change notifier**: Copy-on-write listener registry, safe to mutate
//!   during dispatch
//! - **Line segmenter**: Turns unaligned output chunks into line records, with
//!   one in-progress record per channel that is replaced as it grows
//! - **Filtered projector**: Merges same-line fragments, filters whole lines
//!   and reports the changed suffix as a [`Delta`]
//!
//! ## Example
//!
//! ```
//! use livelog::{ChannelId, FilteredProjector, LineSegmenter, Recorder};
//!
//! let recorder = Recorder::new();
//! let mut out = LineSegmenter::new(recorder.clone(), ());
//! let mut view = FilteredProjector::identity(recorder.store().clone());
//!
//! out.write(ChannelId(0), "Hello ");
//! out.write(ChannelId(0), "World\n50%");
//! out.write(ChannelId(0), "\r100%");
//!
//! let mut screen = String::new();
//! view.update().apply_to(&mut screen);
//! assert_eq!(screen, "Hello World\n50%\r100%");
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod actor;
pub mod capture;
pub mod error;
pub mod present;
pub mod projection;
pub mod record;
pub mod store;
pub mod style;

// Re-exports for convenience
pub use actor::{ProjectorActor, ProjectorCommand, ProjectorHandle, RenderConfig};
pub use capture::{
    log_view, ChannelWriter, ConsoleCapture, ConsoleConfig, LevelFilter, LineSegmenter,
    LogFields, LogFormatter, LogLayer, LogMessage, LogRecorder, OutputEvent, OutputSource,
};
pub use error::{Error, Result};
pub use present::AnsiPresenter;
pub use projection::{Delta, Document, FilteredProjector, Line, LineEnd};
pub use record::{ChannelId, Key, Record};
pub use store::{ChangeNotifier, ListenerId, LiveCursor, OrderedStore, Recorder};
pub use style::{Modifiers, Rgb, Style};
