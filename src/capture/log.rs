//! Log capture: Structured log messages, their recorder and formatting.
//!
//! [`LogLayer`] plugs into a `tracing` subscriber and turns every event into
//! a [`LogMessage`] in a [`LogRecorder`]. The log view then maps messages to
//! styled, terminated records with [`log_view`], dropping what the
//! [`LevelFilter`] rejects and formatting the rest with a [`LogFormatter`].

use crate::record::{Key, Record};
use crate::store::Recorder;
use crate::style::{Rgb, Style};
use bitflags::bitflags;
use chrono::{DateTime, Local};
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};
use std::fmt::{self, Write as _};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

/// Events from this crate are never recorded by [`LogLayer`].
const SELF_TARGET: &str = env!("CARGO_CRATE_NAME");

/// A captured log message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogMessage {
    /// When the message was logged.
    pub time: DateTime<Local>,
    /// Severity.
    pub level: Level,
    /// Logical source, `::`-separated (a `tracing` target).
    pub source: String,
    /// Message text.
    pub text: String,
    /// Error detail attached to the message.
    pub error: Option<String>,
    /// Call site, when location recording is enabled.
    pub location: Option<String>,
    /// Any other structured fields.
    pub fields: Vec<(String, String)>,
}

impl LogMessage {
    /// Create a message stamped with the current time.
    pub fn new(level: Level, source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            time: Local::now(),
            level,
            source: source.into(),
            text: text.into(),
            error: None,
            location: None,
            fields: Vec::new(),
        }
    }

    /// Builder: attach an error detail.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Builder: attach a structured field.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }
}

/// Recorder of log messages that also tracks which sources have logged.
#[derive(Debug, Clone, Default)]
pub struct LogRecorder {
    recorder: Recorder<LogMessage>,
    sources: Arc<Mutex<BTreeSet<String>>>,
    record_location: Arc<AtomicBool>,
}

impl LogRecorder {
    /// Create an empty log recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message and notify listeners.
    pub fn message_logged(&self, message: LogMessage) -> Key {
        {
            let mut sources = self.sources.lock();
            if !sources.contains(&message.source) {
                sources.insert(message.source.clone());
            }
        }
        self.recorder.record(message)
    }

    /// Every source seen so far, sorted.
    pub fn sources(&self) -> Vec<String> {
        self.sources.lock().iter().cloned().collect()
    }

    /// Whether call-site locations are attached to new messages.
    pub fn records_location(&self) -> bool {
        self.record_location.load(Ordering::Relaxed)
    }

    /// Enable or disable call-site recording.
    pub fn set_record_location(&self, enable: bool) {
        self.record_location.store(enable, Ordering::Relaxed);
    }

    /// The underlying recorder.
    pub const fn recorder(&self) -> &Recorder<LogMessage> {
        &self.recorder
    }

    /// Drop all recorded messages. Known sources are kept.
    pub fn clear(&self) {
        self.recorder.clear();
    }

    /// A `tracing` layer feeding this recorder.
    pub fn layer(&self) -> LogLayer {
        LogLayer::new(self.clone())
    }
}

/// `tracing` layer that records events into a [`LogRecorder`].
#[derive(Debug, Clone)]
pub struct LogLayer {
    recorder: LogRecorder,
}

impl LogLayer {
    /// Create a layer feeding `recorder`.
    pub const fn new(recorder: LogRecorder) -> Self {
        Self { recorder }
    }
}

impl<S: Subscriber> Layer<S> for LogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if meta.target().starts_with(SELF_TARGET) {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let mut message = LogMessage::new(*meta.level(), meta.target(), visitor.message);
        message.error = visitor.error;
        message.fields = visitor.fields;
        if self.recorder.records_location() {
            message.location = match (meta.file(), meta.line()) {
                (Some(file), Some(line)) => Some(format!("{file}:{line}")),
                _ => meta.module_path().map(str::to_owned),
            };
        }

        self.recorder.message_logged(message);
    }
}

/// Collects the fields of a `tracing` event.
#[derive(Default)]
struct MessageVisitor {
    message: String,
    error: Option<String>,
    fields: Vec<(String, String)>,
}

impl MessageVisitor {
    fn push(&mut self, name: &str, value: String) {
        match name {
            "message" => self.message = value,
            "error" => self.error = Some(value),
            _ => self.fields.push((name.to_owned(), value)),
        }
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.push(field.name(), value.to_owned());
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.push(field.name(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.push(field.name(), format!("{value:?}"));
    }
}

bitflags! {
    /// Parts of a log message shown by [`LogFormatter`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LogFields: u8 {
        /// Timestamp.
        const TIME = 0b0000_0001;
        /// Source (target).
        const SOURCE = 0b0000_0010;
        /// Level.
        const LEVEL = 0b0000_0100;
        /// Error detail.
        const ERROR = 0b0000_1000;
        /// Structured fields and call site.
        const ATTACHMENT = 0b0001_0000;
    }
}

impl Default for LogFields {
    fn default() -> Self {
        Self::TIME | Self::SOURCE | Self::LEVEL | Self::ERROR
    }
}

/// Formats log messages into single terminated records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LogFormatter {
    visible: LogFields,
}

impl LogFormatter {
    /// Formatter showing the default fields.
    pub fn new() -> Self {
        Self::default()
    }

    /// Formatter showing exactly `visible`.
    pub const fn with_fields(visible: LogFields) -> Self {
        Self { visible }
    }

    /// Whether `field` is shown.
    pub const fn is_visible(&self, field: LogFields) -> bool {
        self.visible.contains(field)
    }

    /// Show or hide `field`.
    pub fn set_visible(&mut self, field: LogFields, visible: bool) {
        self.visible.set(field, visible);
    }

    /// Flip the visibility of `field`.
    pub fn toggle(&mut self, field: LogFields) {
        self.visible.toggle(field);
    }

    /// Render `message`, always ending in a newline.
    pub fn format(&self, message: &LogMessage) -> String {
        let mut out = String::with_capacity(message.text.len() + 48);

        if self.is_visible(LogFields::TIME) {
            let _ = write!(out, "[{}] ", message.time.format("%Y-%m-%d %H:%M:%S%.3f"));
        }
        if self.is_visible(LogFields::LEVEL) {
            let _ = write!(out, "[{}] ", message.level);
        }
        if self.is_visible(LogFields::SOURCE) {
            let _ = write!(out, "{}: ", message.source);
        }
        out.push_str(&message.text);

        if self.is_visible(LogFields::ATTACHMENT) {
            for (name, value) in &message.fields {
                let _ = write!(out, " {name}={value}");
            }
            if let Some(location) = &message.location {
                let _ = write!(out, " @ {location}");
            }
        }
        if self.is_visible(LogFields::ERROR) {
            if let Some(error) = &message.error {
                let _ = write!(out, "\n  caused by: {error}");
            }
        }

        if !out.ends_with('\n') {
            out.push('\n');
        }
        out
    }
}

/// Level threshold per source.
///
/// Sources are `::`-separated paths; the most specific configured prefix
/// wins. `None` silences a source entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelFilter {
    default: Option<Level>,
    overrides: HashMap<String, Option<Level>>,
}

impl Default for LevelFilter {
    fn default() -> Self {
        Self::new(Some(Level::TRACE))
    }
}

impl LevelFilter {
    /// Filter with a default threshold and no overrides.
    pub fn new(default: Option<Level>) -> Self {
        Self {
            default,
            overrides: HashMap::new(),
        }
    }

    /// Set the threshold for `source` and everything below it.
    pub fn set(&mut self, source: impl Into<String>, level: Option<Level>) {
        self.overrides.insert(source.into(), level);
    }

    /// Builder form of [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, source: impl Into<String>, level: Option<Level>) -> Self {
        self.set(source, level);
        self
    }

    /// Threshold in effect for `source`.
    pub fn level_for(&self, source: &str) -> Option<Level> {
        let mut path = source;
        loop {
            if let Some(level) = self.overrides.get(path) {
                return *level;
            }
            match path.rfind("::") {
                Some(idx) => path = &path[..idx],
                None => return self.default,
            }
        }
    }

    /// Whether `message` passes the filter.
    pub fn accepts(&self, message: &LogMessage) -> bool {
        self.level_for(&message.source)
            .is_some_and(|threshold| message.level <= threshold)
    }
}

/// Display style for a level.
pub fn level_style(level: Level) -> Style {
    let fg = match level {
        Level::ERROR => Rgb::RED,
        Level::WARN => Rgb::ORANGE,
        Level::INFO => Rgb::DEFAULT_FG,
        Level::DEBUG => Rgb::BLUE,
        _ => Rgb::GRAY,
    };
    Style::normal(fg)
}

/// Mapping from log messages to styled records for a projector.
pub fn log_view(
    formatter: LogFormatter,
    filter: LevelFilter,
) -> impl Fn(&LogMessage) -> Option<Record<Style>> + Send + Sync + 'static {
    move |message| {
        if !filter.accepts(message) {
            return None;
        }
        Some(Record::fragment(
            level_style(message.level),
            formatter.format(message),
            None,
            true,
        ))
    }
}
