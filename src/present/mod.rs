//! Present: Showing a projected document on a terminal.
//!
//! - [`AnsiPresenter`]: Applies deltas to an inline terminal region
//! - [`OutputBuffer`]: Accumulates escape sequences for one flush

mod output;
mod presenter;

pub use output::OutputBuffer;
pub use presenter::{line_rows, AnsiPresenter};
