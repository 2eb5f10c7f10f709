//! Actor Model: Background projection driven by store notifications.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  notify   ┌──────────────┐  wake (1 slot)  ┌──────────────┐
//! │  Producers   │ ────────▶ │   Recorder   │ ──────────────▶ │  Projector   │
//! └──────────────┘           └──────────────┘                 │   Thread     │
//!                                                             │              │
//! ┌──────────────┐      ProjectorCommand                      │              │
//! │  UI / Main   │ ─────────────────────────────────────────▶ │              │
//! │              │ ◀───────────────────────────────────────── │              │
//! └──────────────┘            Delta                           └──────────────┘
//! ```

mod messages;
mod projector;

pub use messages::ProjectorCommand;
pub use projector::{ProjectorActor, ProjectorHandle, RenderConfig};
