//! Console capture: Routes stdout/stderr output onto styled channels.
//!
//! Output is either *contextual* (produced by code the console belongs to)
//! or *global* (anything else in the process). Each of the four
//! combinations gets its own channel and style, so stderr text never lands
//! mid-line in stdout text and global output is visually set apart.

use super::segmenter::LineSegmenter;
use super::writer::{ChannelWriter, SharedSegmenter};
use crate::record::{ChannelId, Record};
use crate::store::Recorder;
use crate::style::{Rgb, Style};
use parking_lot::Mutex;
use std::sync::Arc;

/// Which standard stream produced the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputSource {
    /// Standard output.
    Stdout,
    /// Standard error.
    Stderr,
}

/// A chunk of captured process output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputEvent {
    /// Stream that produced the text.
    pub source: OutputSource,
    /// Whether the output belongs to this console's own context.
    pub contextual: bool,
    /// Raw text, not necessarily line aligned.
    pub text: String,
}

impl OutputEvent {
    /// Create an output event.
    pub fn new(source: OutputSource, contextual: bool, text: impl Into<String>) -> Self {
        Self {
            source,
            contextual,
            text: text.into(),
        }
    }
}

/// Styles for the four console channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Contextual stdout.
    pub stdout: Style,
    /// Contextual stderr.
    pub stderr: Style,
    /// Stdout from outside the console's context.
    pub global_stdout: Style,
    /// Stderr from outside the console's context.
    pub global_stderr: Style,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            stdout: Style::normal(Rgb::DEFAULT_FG),
            stderr: Style::normal(Rgb::RED),
            global_stdout: Style::italic(Rgb::DEFAULT_FG),
            global_stderr: Style::italic(Rgb::RED),
        }
    }
}

/// Channel assigned to a (source, contextual) pair.
pub const fn console_channel(source: OutputSource, contextual: bool) -> ChannelId {
    match (source, contextual) {
        (OutputSource::Stdout, true) => ChannelId(0),
        (OutputSource::Stderr, true) => ChannelId(1),
        (OutputSource::Stdout, false) => ChannelId(2),
        (OutputSource::Stderr, false) => ChannelId(3),
    }
}

/// Records console output as styled line records.
#[derive(Debug, Clone)]
pub struct ConsoleCapture {
    recorder: Recorder<Record<Style>>,
    segmenter: SharedSegmenter<Style>,
}

impl Default for ConsoleCapture {
    fn default() -> Self {
        Self::new(ConsoleConfig::default())
    }
}

impl ConsoleCapture {
    /// Create a capture with its own recorder.
    pub fn new(config: ConsoleConfig) -> Self {
        Self::with_recorder(Recorder::new(), config)
    }

    /// Create a capture writing into an existing recorder.
    pub fn with_recorder(recorder: Recorder<Record<Style>>, config: ConsoleConfig) -> Self {
        let mut segmenter = LineSegmenter::new(recorder.clone(), config.stdout);
        for (source, contextual, style) in [
            (OutputSource::Stdout, true, config.stdout),
            (OutputSource::Stderr, true, config.stderr),
            (OutputSource::Stdout, false, config.global_stdout),
            (OutputSource::Stderr, false, config.global_stderr),
        ] {
            segmenter.set_label(console_channel(source, contextual), style);
        }

        Self {
            recorder,
            segmenter: Arc::new(Mutex::new(segmenter)),
        }
    }

    /// Record a chunk of output.
    pub fn output_occurred(&self, event: &OutputEvent) {
        let channel = console_channel(event.source, event.contextual);
        self.segmenter.lock().write(channel, &event.text);
    }

    /// A writer feeding one of the console channels.
    pub fn writer(&self, source: OutputSource, contextual: bool) -> ChannelWriter<Style> {
        ChannelWriter::new(
            Arc::clone(&self.segmenter),
            console_channel(source, contextual),
        )
    }

    /// The recorder holding captured lines.
    pub const fn recorder(&self) -> &Recorder<Record<Style>> {
        &self.recorder
    }

    /// The shared segmenter.
    pub const fn segmenter(&self) -> &SharedSegmenter<Style> {
        &self.segmenter
    }

    /// Drop all captured output.
    pub fn clear(&self) {
        self.recorder.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_routes_by_source_and_context() {
        let console = ConsoleCapture::default();
        console.output_occurred(&OutputEvent::new(OutputSource::Stdout, true, "out\n"));
        console.output_occurred(&OutputEvent::new(OutputSource::Stderr, false, "err\n"));

        let records: Vec<_> = console
            .recorder()
            .snapshot()
            .into_iter()
            .map(|(_, r)| (r.channel, r.label))
            .collect();
        let config = ConsoleConfig::default();
        assert_eq!(
            records,
            vec![
                (Some(ChannelId(0)), config.stdout),
                (Some(ChannelId(3)), config.global_stderr),
            ]
        );
    }

    #[test]
    fn test_stderr_does_not_join_stdout_line() {
        let console = ConsoleCapture::default();
        console.output_occurred(&OutputEvent::new(OutputSource::Stdout, true, "half"));
        console.output_occurred(&OutputEvent::new(OutputSource::Stderr, true, "oops\n"));
        console.output_occurred(&OutputEvent::new(OutputSource::Stdout, true, " line\n"));

        let texts: Vec<_> = console
            .recorder()
            .snapshot()
            .into_iter()
            .map(|(_, r)| r.text.clone())
            .collect();
        assert_eq!(texts, vec!["oops\n", "half line\n"]);
    }

    #[test]
    fn test_writer_handle() {
        let console = ConsoleCapture::default();
        let mut err = console.writer(OutputSource::Stderr, true);
        writeln!(err, "failure").unwrap();

        let (_, record) = console.recorder().snapshot().remove(0);
        assert_eq!(record.label, ConsoleConfig::default().stderr);
        assert!(record.terminated);
    }
}
