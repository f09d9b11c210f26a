//! Incremental scrollback renderer
//!
//! Lines before the trailing prompt are written once. The prompt line is
//! the only "live" line and is redrawn in place with the current input.

use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use std::io::{self, Write};
use vpsterm_core::{LineKind, OutputLine};

/// Foreground color for a line kind
pub fn line_color(kind: LineKind) -> Color {
    match kind {
        LineKind::Info => Color::Grey,
        LineKind::Success => Color::Green,
        LineKind::Error => Color::Red,
        LineKind::Prompt => Color::Cyan,
        LineKind::Data => Color::White,
    }
}

pub struct Renderer<W: Write> {
    out: W,
    /// Lines already written for good
    committed: usize,
}

impl<W: Write> Renderer<W> {
    pub fn new(out: W) -> Self {
        Self { out, committed: 0 }
    }

    /// Write a transient status on the live line
    pub fn status(&mut self, text: &str) -> io::Result<()> {
        queue!(
            self.out,
            Print('\r'),
            Clear(ClearType::CurrentLine),
            SetForegroundColor(Color::DarkGrey),
            Print(text),
            ResetColor
        )?;
        self.out.flush()
    }

    /// Bring the screen up to date with `lines`
    ///
    /// `clear` wipes the screen first; it is also implied when the
    /// buffer shrank below what was already written.
    pub fn render(&mut self, lines: &[OutputLine], input: &str, clear: bool) -> io::Result<()> {
        if clear || lines.len() < self.committed {
            queue!(self.out, Clear(ClearType::All), MoveTo(0, 0))?;
            self.committed = 0;
        }
        queue!(self.out, Print('\r'), Clear(ClearType::CurrentLine))?;

        let live = match lines.last() {
            Some(last) if last.is_prompt() => lines.len() - 1,
            _ => lines.len(),
        };

        for line in &lines[self.committed..live] {
            self.write_line(line)?;
            queue!(self.out, Print("\r\n"))?;
        }
        self.committed = live;

        if let Some(prompt) = lines.get(live) {
            self.write_line(prompt)?;
            queue!(self.out, Print(input))?;
        }
        self.out.flush()
    }

    /// Move below the live line
    pub fn finish(&mut self) -> io::Result<()> {
        queue!(self.out, Print("\r\n"))?;
        self.out.flush()
    }

    fn write_line(&mut self, line: &OutputLine) -> io::Result<()> {
        queue!(
            self.out,
            SetForegroundColor(line_color(line.kind)),
            Print(&line.text),
            ResetColor
        )
    }

    #[cfg(test)]
    pub(crate) fn into_inner(self) -> W {
        self.out
    }
}
