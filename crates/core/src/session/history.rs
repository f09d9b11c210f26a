//! Command history and the line editor that browses it

/// Submitted lines in order. Entries are never edited or removed.
#[derive(Debug, Clone, Default)]
pub struct CommandHistory {
    entries: Vec<String>,
}

impl CommandHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: impl Into<String>) {
        self.entries.push(entry.into());
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(String::as_str)
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Current input line plus history browsing state
///
/// `cursor` is `None` while not browsing; otherwise it always indexes an
/// existing history entry.
#[derive(Debug, Clone, Default)]
pub struct InputEditor {
    line: String,
    cursor: Option<usize>,
}

impl InputEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(&self) -> &str {
        &self.line
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn insert(&mut self, c: char) {
        self.line.push(c);
    }

    pub fn backspace(&mut self) {
        self.line.pop();
    }

    /// Step back: from "not browsing" to the newest entry, then older
    /// entries, stopping at the oldest
    pub fn history_up(&mut self, history: &CommandHistory) {
        if history.is_empty() {
            return;
        }
        let index = match self.cursor {
            None => history.len() - 1,
            Some(i) => i.saturating_sub(1),
        };
        self.show(history, index);
    }

    /// Step forward; past the newest entry, stop browsing with an
    /// empty line
    pub fn history_down(&mut self, history: &CommandHistory) {
        let Some(i) = self.cursor else {
            return;
        };
        if i + 1 < history.len() {
            self.show(history, i + 1);
        } else {
            self.cursor = None;
            self.line.clear();
        }
    }

    /// Hand over the line and reset to an empty, non-browsing editor
    pub fn take_line(&mut self) -> String {
        self.cursor = None;
        std::mem::take(&mut self.line)
    }

    fn show(&mut self, history: &CommandHistory, index: usize) {
        if let Some(entry) = history.get(index) {
            self.cursor = Some(index);
            self.line = entry.to_string();
        }
    }
}
