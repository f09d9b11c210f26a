//! Keyboard input understood by the input editor

use serde::{Deserialize, Serialize};

/// Key event forwarded by a host view
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "key", content = "char", rename_all = "lowercase")]
pub enum KeyInput {
    /// Printable character
    Char(char),
    Backspace,
    /// Submit the current line
    Enter,
    /// Browse history backward
    Up,
    /// Browse history forward
    Down,
}
