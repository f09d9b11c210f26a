//! Synchronous terminal state machine
//!
//! Owns everything a single simulated session mutates. No timers and no
//! clock reads here: callers pass `now`, and the async controller in
//! [`controller`](super::controller) decides when `finish_connect` runs.

use super::buffer::ScrollbackBuffer;
use super::history::{CommandHistory, InputEditor};
use crate::error::{CoreError, Result};
use crate::interpreter::{self, Action, CommandContext, Outcome};
use crate::types::{ConnectionPhase, KeyInput, OutputLine, ServerIdentity, SystemProfile};
use chrono::{DateTime, Local};
use serde::Serialize;

/// Point-in-time copy of a session for host views
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub phase: ConnectionPhase,
    pub identity: ServerIdentity,
    pub prompt: String,
    pub input: String,
    pub history_len: usize,
    pub lines: Vec<OutputLine>,
}

/// One simulated terminal
#[derive(Debug)]
pub struct Terminal {
    identity: ServerIdentity,
    profile: &'static SystemProfile,
    phase: ConnectionPhase,
    closed: bool,
    buffer: ScrollbackBuffer,
    history: CommandHistory,
    editor: InputEditor,
}

impl Terminal {
    pub fn new(identity: ServerIdentity) -> Self {
        let profile = SystemProfile::for_provider(identity.provider);
        Self {
            identity,
            profile,
            phase: ConnectionPhase::Disconnected,
            closed: false,
            buffer: ScrollbackBuffer::new(),
            history: CommandHistory::new(),
            editor: InputEditor::new(),
        }
    }

    pub fn identity(&self) -> &ServerIdentity {
        &self.identity
    }

    pub fn profile(&self) -> &'static SystemProfile {
        self.profile
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn buffer(&self) -> &ScrollbackBuffer {
        &self.buffer
    }

    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    /// Current (unsubmitted) input line
    pub fn input(&self) -> &str {
        self.editor.line()
    }

    pub fn history_cursor(&self) -> Option<usize> {
        self.editor.cursor()
    }

    pub fn prompt(&self) -> String {
        interpreter::prompt(&self.identity, self.profile)
    }

    /// `disconnected -> connecting`. A session connects at most once.
    pub fn begin_connect(&mut self) -> Result<()> {
        if self.closed || self.phase != ConnectionPhase::Disconnected {
            return Err(CoreError::InvalidState(format!(
                "cannot connect a session that is {}{}",
                self.phase,
                if self.closed { " (closed)" } else { "" }
            )));
        }
        self.phase = ConnectionPhase::Connecting;
        Ok(())
    }

    /// `connecting -> connected`, writing the banner and first prompt
    pub fn finish_connect(&mut self, now: DateTime<Local>) -> Result<()> {
        if self.phase != ConnectionPhase::Connecting {
            return Err(CoreError::InvalidState(format!(
                "cannot finish connecting a session that is {}",
                self.phase
            )));
        }
        self.phase = ConnectionPhase::Connected;
        self.buffer
            .extend(interpreter::banner(&self.identity, self.profile, now));
        self.push_prompt();
        Ok(())
    }

    /// Record and evaluate one line
    ///
    /// Blank input changes nothing and yields `Ok(None)`. Any other line
    /// is recorded in history before dispatch, so `history` lists itself.
    pub fn submit_line(&mut self, line: &str, now: DateTime<Local>) -> Result<Option<Outcome>> {
        self.ensure_connected()?;
        if line.trim().is_empty() {
            return Ok(None);
        }

        self.history.push(line);
        let ctx = CommandContext {
            identity: &self.identity,
            profile: self.profile,
            history: self.history.entries(),
            now,
        };
        let Some(outcome) = interpreter::evaluate(line, &ctx) else {
            return Ok(None);
        };

        match outcome.action {
            Action::Continue => {
                self.buffer.echo_input(line);
                self.buffer.extend(outcome.lines.iter().cloned());
                self.push_prompt();
            }
            Action::Clear => {
                self.buffer.clear();
                self.push_prompt();
            }
            Action::Terminate => {
                self.buffer.echo_input(line);
                self.buffer.extend(outcome.lines.iter().cloned());
                self.phase = ConnectionPhase::Disconnected;
                self.closed = true;
            }
        }
        Ok(Some(outcome))
    }

    /// Apply one key. Only `Enter` can produce an outcome.
    pub fn handle_key(&mut self, key: KeyInput, now: DateTime<Local>) -> Result<Option<Outcome>> {
        self.ensure_connected()?;
        match key {
            KeyInput::Char(c) if !c.is_control() => self.editor.insert(c),
            KeyInput::Char(_) => {}
            KeyInput::Backspace => self.editor.backspace(),
            KeyInput::Up => self.editor.history_up(&self.history),
            KeyInput::Down => self.editor.history_down(&self.history),
            KeyInput::Enter => {
                let line = self.editor.take_line();
                return self.submit_line(&line, now);
            }
        }
        Ok(None)
    }

    /// Move to `disconnected` from any phase
    ///
    /// Returns true only on the call that actually closed the session.
    pub fn close(&mut self) -> bool {
        if self.closed {
            return false;
        }
        self.closed = true;
        self.phase = ConnectionPhase::Disconnected;
        self.editor.take_line();
        true
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            identity: self.identity.clone(),
            prompt: self.prompt(),
            input: self.editor.line().to_string(),
            history_len: self.history.len(),
            lines: self.buffer.lines().to_vec(),
        }
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.phase.is_connected() {
            Ok(())
        } else {
            Err(CoreError::NotConnected(self.phase))
        }
    }

    fn push_prompt(&mut self) {
        let prompt = self.prompt();
        self.buffer.push(OutputLine::prompt(prompt));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LineKind, MetricsSnapshot, Provider};

    fn identity() -> ServerIdentity {
        ServerIdentity::new("Test-1", "10.0.0.5")
            .with_provider(Provider::Gcp)
            .with_region("us-east-1")
            .with_metrics(MetricsSnapshot {
                cpu_percent: 15.0,
                memory_percent: 22.0,
                disk_percent: 30.0,
                uptime_hours: 0.0,
            })
    }

    fn connected() -> Terminal {
        let mut term = Terminal::new(identity());
        term.begin_connect().unwrap();
        term.finish_connect(Local::now()).unwrap();
        term
    }

    fn submit(term: &mut Terminal, line: &str) -> Option<Outcome> {
        term.submit_line(line, Local::now()).unwrap()
    }

    fn type_line(term: &mut Terminal, line: &str) {
        for c in line.chars() {
            term.handle_key(KeyInput::Char(c), Local::now()).unwrap();
        }
    }

    #[test]
    fn test_phase_progression() {
        let mut term = Terminal::new(identity());
        assert_eq!(term.phase(), ConnectionPhase::Disconnected);
        term.begin_connect().unwrap();
        assert_eq!(term.phase(), ConnectionPhase::Connecting);
        assert!(term.buffer().is_empty());
        term.finish_connect(Local::now()).unwrap();
        assert_eq!(term.phase(), ConnectionPhase::Connected);
    }

    #[test]
    fn test_connect_twice_rejected() {
        let mut term = connected();
        assert!(matches!(term.begin_connect(), Err(CoreError::InvalidState(_))));
        assert!(term.finish_connect(Local::now()).is_err());
    }

    #[test]
    fn test_buffer_ends_with_prompt_while_connected() {
        let mut term = connected();
        assert!(term.buffer().last().unwrap().is_prompt());
        for line in ["ls", "foobar", "echo hi", "mkdir", "history", "  "] {
            submit(&mut term, line);
            let last = term.buffer().last().unwrap();
            assert!(last.is_prompt());
            assert_eq!(last.text, "root@gcp-instance-1:~$ ");
        }
    }

    #[test]
    fn test_command_echo_on_prompt_line() {
        let mut term = connected();
        let before = term.buffer().len();
        submit(&mut term, "whoami");
        let lines = term.buffer().lines();
        assert_eq!(lines[before - 1].text, "root@gcp-instance-1:~$ whoami");
        assert_eq!(lines[before].text, "root");
        assert_eq!(lines.len(), before + 2);
    }

    #[test]
    fn test_clear_leaves_single_prompt() {
        let mut term = connected();
        for _ in 0..5 {
            submit(&mut term, "ps aux");
        }
        assert!(term.buffer().len() > 10);
        let outcome = submit(&mut term, "clear").unwrap();
        assert_eq!(outcome.action, Action::Clear);
        assert_eq!(term.buffer().len(), 1);
        assert_eq!(term.buffer().lines()[0].kind, LineKind::Prompt);
    }

    #[test]
    fn test_history_counts_non_blank_submissions() {
        let mut term = connected();
        let lines = ["ls", "   ", "pwd", "", "\t", "nope", "clear"];
        for line in lines {
            submit(&mut term, line);
        }
        assert_eq!(term.history().len(), 4);
        assert_eq!(term.history().entries(), &["ls", "pwd", "nope", "clear"]);
    }

    #[test]
    fn test_blank_submission_is_noop() {
        let mut term = connected();
        let before = term.buffer().len();
        assert!(submit(&mut term, "   ").is_none());
        assert_eq!(term.buffer().len(), before);
    }

    #[test]
    fn test_history_lists_itself() {
        let mut term = connected();
        submit(&mut term, "ls");
        let outcome = submit(&mut term, "history").unwrap();
        let texts: Vec<_> = outcome.lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["    1  ls", "    2  history"]);
    }

    #[test]
    fn test_exit_disconnects() {
        let mut term = connected();
        let outcome = submit(&mut term, "exit").unwrap();
        assert!(outcome.terminate());
        assert_eq!(term.phase(), ConnectionPhase::Disconnected);
        assert!(term.is_closed());
        assert!(!term.buffer().last().unwrap().is_prompt());
        assert!(matches!(
            term.submit_line("ls", Local::now()),
            Err(CoreError::NotConnected(ConnectionPhase::Disconnected))
        ));
        assert!(!term.close());
    }

    #[test]
    fn test_submit_before_connected() {
        let mut term = Terminal::new(identity());
        term.begin_connect().unwrap();
        assert!(matches!(
            term.submit_line("ls", Local::now()),
            Err(CoreError::NotConnected(ConnectionPhase::Connecting))
        ));
        assert!(term.history().is_empty());
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut term = connected();
        assert!(term.close());
        assert!(!term.close());
        assert_eq!(term.phase(), ConnectionPhase::Disconnected);
        assert!(term.begin_connect().is_err());
    }

    #[test]
    fn test_close_while_connecting_blocks_finish() {
        let mut term = Terminal::new(identity());
        term.begin_connect().unwrap();
        assert!(term.close());
        assert!(term.finish_connect(Local::now()).is_err());
        assert!(term.buffer().is_empty());
    }

    #[test]
    fn test_typing_and_enter() {
        let mut term = connected();
        type_line(&mut term, "echo hi");
        assert_eq!(term.input(), "echo hi");
        let outcome = term.handle_key(KeyInput::Enter, Local::now()).unwrap().unwrap();
        assert_eq!(outcome.lines[0].text, "hi");
        assert_eq!(term.input(), "");
        assert_eq!(term.history_cursor(), None);
    }

    #[test]
    fn test_key_history_round_trip() {
        let mut term = connected();
        for line in ["ls", "pwd", "whoami"] {
            submit(&mut term, line);
        }
        for k in 0..=3 {
            for _ in 0..k {
                term.handle_key(KeyInput::Up, Local::now()).unwrap();
            }
            for _ in 0..k {
                term.handle_key(KeyInput::Down, Local::now()).unwrap();
            }
            assert_eq!(term.input(), "");
        }
        assert_eq!(term.history().len(), 3);
    }

    #[test]
    fn test_recall_and_resubmit() {
        let mut term = connected();
        submit(&mut term, "pwd");
        term.handle_key(KeyInput::Up, Local::now()).unwrap();
        assert_eq!(term.input(), "pwd");
        assert_eq!(term.history_cursor(), Some(0));
        let outcome = term.handle_key(KeyInput::Enter, Local::now()).unwrap().unwrap();
        assert_eq!(outcome.lines[0].text, "/root");
        assert_eq!(term.history().len(), 2);
        assert_eq!(term.history_cursor(), None);
    }

    #[test]
    fn test_enter_on_empty_line() {
        let mut term = connected();
        assert!(term.handle_key(KeyInput::Enter, Local::now()).unwrap().is_none());
        assert!(term.history().is_empty());
    }

    #[test]
    fn test_control_chars_ignored() {
        let mut term = connected();
        term.handle_key(KeyInput::Char('\u{7}'), Local::now()).unwrap();
        assert_eq!(term.input(), "");
    }

    #[test]
    fn test_snapshot() {
        let mut term = connected();
        type_line(&mut term, "ls");
        let snap = term.snapshot();
        assert_eq!(snap.phase, ConnectionPhase::Connected);
        assert_eq!(snap.input, "ls");
        assert_eq!(snap.prompt, "root@gcp-instance-1:~$ ");
        assert_eq!(snap.lines.len(), term.buffer().len());
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["phase"], "connected");
        assert_eq!(json["historyLen"], 0);
    }
}
