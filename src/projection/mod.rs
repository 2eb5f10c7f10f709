//! Projection: Turning stored records into a filtered document of lines.
//!
//! ```text
//! store snapshot ──map──▶ records ──merge──▶ lines ──filter──▶ document
//!                                                                 │
//!                                    previous document ──prefix──▶ Delta
//! ```
//!
//! Fragments on the same channel merge onto one line until a terminated
//! record closes it. Only the part of the document after the longest
//! unchanged prefix is reported as changed.

mod line;
mod projector;

pub use line::{Delta, Document, Line, LineEnd};
pub use projector::{FilteredProjector, MapFn, Predicate};
