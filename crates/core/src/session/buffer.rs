//! Scrollback buffer

use crate::types::OutputLine;

/// Rendered lines of a session, oldest first
///
/// Append-only apart from `clear`. No length cap: a session of
/// realistic length stays small.
#[derive(Debug, Clone, Default)]
pub struct ScrollbackBuffer {
    lines: Vec<OutputLine>,
}

impl ScrollbackBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: OutputLine) {
        self.lines.push(line);
    }

    pub fn extend(&mut self, lines: impl IntoIterator<Item = OutputLine>) {
        self.lines.extend(lines);
    }

    /// Append submitted text to the trailing prompt line
    ///
    /// Returns false if the buffer does not end with a prompt.
    pub fn echo_input(&mut self, input: &str) -> bool {
        match self.lines.last_mut() {
            Some(line) if line.is_prompt() => {
                line.text.push_str(input);
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[OutputLine] {
        &self.lines
    }

    /// Last `n` lines, for viewports
    pub fn tail(&self, n: usize) -> &[OutputLine] {
        let start = self.lines.len().saturating_sub(n);
        &self.lines[start..]
    }

    pub fn last(&self) -> Option<&OutputLine> {
        self.lines.last()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
