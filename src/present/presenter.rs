//! `AnsiPresenter`: Applies projection deltas to an inline terminal region.
//!
//! The document is printed below the prompt, not on an alternate screen.
//! For each delta the presenter walks the cursor back over the rows the
//! removed lines occupy, clears to the end of the screen and prints the
//! inserted lines. Rows are measured with display width, so wide
//! characters and wrapped lines are accounted for.

use super::output::OutputBuffer;
use crate::error::Result;
use crate::projection::Delta;
use crate::style::Style;
use crossterm::terminal;
use std::io::{self, Stdout, Write};
use unicode_width::UnicodeWidthStr;

/// Number of terminal rows `text` occupies at `width` columns.
///
/// A trailing newline ends the last row rather than starting a new one.
/// Carriage returns rewind to column 0, so only the widest segment counts.
pub fn line_rows(text: &str, width: u16) -> usize {
    let cols = usize::from(width.max(1));
    let body = text.strip_suffix('\n').unwrap_or(text);
    body.split('\n')
        .map(|row| {
            let widest = row
                .split('\r')
                .map(UnicodeWidthStr::width)
                .max()
                .unwrap_or(0);
            widest.div_ceil(cols).max(1)
        })
        .sum()
}

/// Presents [`Delta`]s of styled lines on an ANSI terminal.
#[derive(Debug)]
pub struct AnsiPresenter<W: Write> {
    out: W,
    buffer: OutputBuffer,
    width: u16,
}

impl AnsiPresenter<Stdout> {
    /// Presenter on stdout, sized to the current terminal.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal size cannot be read.
    pub fn for_terminal() -> Result<Self> {
        let (width, _height) = terminal::size()?;
        Ok(Self::new(io::stdout(), width))
    }
}

impl<W: Write> AnsiPresenter<W> {
    /// Presenter writing to `out`, assuming `width` columns.
    pub fn new(out: W, width: u16) -> Self {
        Self {
            out,
            buffer: OutputBuffer::with_capacity(4096),
            width,
        }
    }

    /// Terminal width in columns.
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Update the width after a terminal resize.
    pub fn set_width(&mut self, width: u16) {
        self.width = width;
    }

    /// The underlying writer.
    pub const fn get_ref(&self) -> &W {
        &self.out
    }

    /// Consume the presenter, returning the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Rows to move up before rewriting: everything the removed lines
    /// cover, except the row the cursor already sits on after an open line.
    fn rows_to_rewind(&self, delta: &Delta<Style>) -> usize {
        let rows: usize = delta
            .removed
            .iter()
            .map(|line| line_rows(line.text(), self.width))
            .sum();
        let on_last = delta.removed.last().is_some_and(|line| line.is_open());
        rows - usize::from(on_last)
    }

    /// Apply one delta to the terminal.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the output fails.
    pub fn present(&mut self, delta: &Delta<Style>) -> Result<()> {
        if delta.is_empty() {
            return Ok(());
        }

        let rewind = self.rows_to_rewind(delta);
        self.buffer.clear();
        self.buffer.cursor_up(rewind);
        self.buffer.carriage_return();
        self.buffer.clear_down();

        for line in &delta.inserted {
            for (style, text) in line.segments() {
                self.buffer.set_style(*style);
                self.buffer.write_text(text);
            }
        }
        self.buffer.reset_attrs();

        self.buffer.flush_to(&mut self.out)?;
        Ok(())
    }
}
