//! Tagged output lines

use serde::{Deserialize, Serialize};

/// Presentation class of an output line
///
/// Assigned by whoever emits the line. Renderers map it to a color or
/// CSS class and never inspect the text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    Info,
    Success,
    Error,
    Prompt,
    Data,
}

/// One line of scrollback
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutputLine {
    pub kind: LineKind,
    pub text: String,
}

impl OutputLine {
    pub fn new(kind: LineKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(LineKind::Info, text)
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(LineKind::Success, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(LineKind::Error, text)
    }

    pub fn prompt(text: impl Into<String>) -> Self {
        Self::new(LineKind::Prompt, text)
    }

    pub fn data(text: impl Into<String>) -> Self {
        Self::new(LineKind::Data, text)
    }

    /// Empty spacer line
    pub fn blank() -> Self {
        Self::new(LineKind::Info, "")
    }

    pub fn is_prompt(&self) -> bool {
        self.kind == LineKind::Prompt
    }
}
