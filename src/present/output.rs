//! `OutputBuffer`: Single-syscall output buffer for ANSI sequences.

use crate::style::{Modifiers, Rgb, Style};
use std::io::{self, Write};

/// Pre-allocated buffer for building ANSI escape sequences.
///
/// All output is accumulated here, then flushed in a single `write()` call
/// so the terminal never shows a half-applied update.
#[derive(Debug, Clone, Default)]
pub struct OutputBuffer {
    data: Vec<u8>,
    /// Last style emitted, to skip redundant SGR sequences.
    style: Option<Style>,
}

impl OutputBuffer {
    /// Create a new output buffer with the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            style: None,
        }
    }

    /// Clear the buffer for reuse.
    #[inline]
    pub fn clear(&mut self) {
        self.data.clear();
        self.style = None;
    }

    /// Get the buffer contents.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Get the buffer length.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Write text, turning `'\n'` into CR LF.
    pub fn write_text(&mut self, text: &str) {
        let mut rows = text.split('\n');
        if let Some(first) = rows.next() {
            self.data.extend_from_slice(first.as_bytes());
        }
        for row in rows {
            self.data.extend_from_slice(b"\r\n");
            self.data.extend_from_slice(row.as_bytes());
        }
    }

    /// Move the cursor up `rows` rows.
    #[inline]
    pub fn cursor_up(&mut self, rows: usize) {
        if rows > 0 {
            let _ = write!(self.data, "\x1b[{rows}A");
        }
    }

    /// Move the cursor to column 0.
    #[inline]
    pub fn carriage_return(&mut self) {
        self.data.push(b'\r');
    }

    /// Clear from the cursor to the end of the screen.
    #[inline]
    pub fn clear_down(&mut self) {
        self.data.extend_from_slice(b"\x1b[J");
    }

    /// Set foreground color (true color).
    #[inline]
    pub fn set_fg(&mut self, color: Rgb) {
        let _ = write!(self.data, "\x1b[38;2;{};{};{}m", color.r, color.g, color.b);
    }

    /// Switch to `style`, emitting nothing if it is already active.
    pub fn set_style(&mut self, style: Style) {
        if self.style == Some(style) {
            return;
        }
        if self.style.is_some_and(|old| !old.modifiers.is_empty()) {
            self.reset_attrs();
        }
        self.set_fg(style.fg);
        for (flag, code) in [
            (Modifiers::BOLD, 1),
            (Modifiers::DIM, 2),
            (Modifiers::ITALIC, 3),
            (Modifiers::UNDERLINE, 4),
        ] {
            if style.modifiers.contains(flag) {
                let _ = write!(self.data, "\x1b[{code}m");
            }
        }
        self.style = Some(style);
    }

    /// Reset all attributes.
    #[inline]
    pub fn reset_attrs(&mut self) {
        self.data.extend_from_slice(b"\x1b[0m");
        self.style = None;
    }

    /// Flush to a writer in a single call.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying writer fails.
    pub fn flush_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.data)?;
        writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_text_crlf() {
        let mut buf = OutputBuffer::default();
        buf.write_text("a\nb\n");
        assert_eq!(buf.as_bytes(), b"a\r\nb\r\n");
    }

    #[test]
    fn test_style_not_repeated() {
        let mut buf = OutputBuffer::default();
        buf.set_style(Style::normal(Rgb::RED));
        let len = buf.len();
        buf.set_style(Style::normal(Rgb::RED));
        assert_eq!(buf.len(), len);
        assert_eq!(buf.as_bytes(), b"\x1b[38;2;200;0;0m");
    }

    #[test]
    fn test_modifiers_reset_on_change() {
        let mut buf = OutputBuffer::default();
        buf.set_style(Style::italic(Rgb::GRAY));
        buf.set_style(Style::normal(Rgb::GRAY));
        assert_eq!(
            buf.as_bytes(),
            b"\x1b[38;2;128;128;128m\x1b[3m\x1b[0m\x1b[38;2;128;128;128m".as_slice()
        );
    }

    #[test]
    fn test_cursor_up_zero_is_noop() {
        let mut buf = OutputBuffer::default();
        buf.cursor_up(0);
        assert!(buf.is_empty());
        buf.cursor_up(3);
        assert_eq!(buf.as_bytes(), b"\x1b[3A");
    }
}
