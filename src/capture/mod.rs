//! Capture: Producers that turn raw output into records.
//!
//! - [`LineSegmenter`] splits streamed text into line records per channel
//! - [`ChannelWriter`] exposes a channel as `std::io::Write`
//! - [`ConsoleCapture`] routes stdout/stderr onto four styled channels
//! - [`LogRecorder`] and [`LogLayer`] capture `tracing` events

mod console;
mod log;
mod segmenter;
mod writer;

pub use console::{console_channel, ConsoleCapture, ConsoleConfig, OutputEvent, OutputSource};
pub use log::{
    level_style, log_view, LevelFilter, LogFields, LogFormatter, LogLayer, LogMessage,
    LogRecorder,
};
pub use segmenter::LineSegmenter;
pub use writer::{ChannelWriter, SharedSegmenter};
