//! Command interpreter for the simulated shell
//!
//! `evaluate` is a pure function of its inputs: the scrollback, history
//! and cursor all live with the caller ([`Terminal`](crate::session::Terminal)).
//! Dispatch goes through a static verb table; anything not in the table
//! falls through to `bash: <verb>: command not found`.

mod banner;
mod commands;

pub use banner::banner;

use crate::types::{OutputLine, ServerIdentity, SystemProfile};
use chrono::{DateTime, Local};

/// Everything a handler may read
///
/// `now` is passed in rather than read from the clock so that `date`
/// stays deterministic under test.
#[derive(Debug, Clone, Copy)]
pub struct CommandContext<'a> {
    pub identity: &'a ServerIdentity,
    pub profile: &'a SystemProfile,
    /// Submitted lines, including the one being evaluated
    pub history: &'a [String],
    pub now: DateTime<Local>,
}

/// Parsed input line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invocation<'a> {
    /// First word, as typed
    pub verb: &'a str,
    /// Everything after the verb and its separating whitespace
    pub rest: &'a str,
}

impl<'a> Invocation<'a> {
    /// Split a line into verb and remainder. `None` for blank input.
    pub fn parse(line: &'a str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim_start()),
            None => (line, ""),
        };
        Some(Self { verb, rest })
    }

    pub fn args(&self) -> impl Iterator<Item = &'a str> {
        self.rest.split_whitespace()
    }

    pub fn first_arg(&self) -> Option<&'a str> {
        self.args().next()
    }

    /// True if any `-xyz` style argument contains `flag`
    pub fn has_flag(&self, flag: char) -> bool {
        self.args()
            .filter_map(|arg| arg.strip_prefix('-'))
            .any(|flags| flags.contains(flag))
    }
}

/// What the caller must do with its session after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Append the lines, then a fresh prompt
    Continue,
    /// Wipe the scrollback and show only a prompt
    Clear,
    /// Append the lines and disconnect
    Terminate,
}

/// Result of evaluating one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub lines: Vec<OutputLine>,
    pub action: Action,
}

impl Outcome {
    pub fn lines(lines: Vec<OutputLine>) -> Self {
        Self {
            lines,
            action: Action::Continue,
        }
    }

    pub fn line(line: OutputLine) -> Self {
        Self::lines(vec![line])
    }

    pub fn clear() -> Self {
        Self {
            lines: Vec::new(),
            action: Action::Clear,
        }
    }

    pub fn terminate_with(lines: Vec<OutputLine>) -> Self {
        Self {
            lines,
            action: Action::Terminate,
        }
    }

    /// Session must move to `disconnected`
    pub fn terminate(&self) -> bool {
        self.action == Action::Terminate
    }
}

/// Fixed handler signature
pub type Handler = fn(&Invocation<'_>, &CommandContext<'_>) -> Outcome;

struct CommandEntry {
    name: &'static str,
    handler: Handler,
}

const COMMANDS: &[CommandEntry] = &[
    CommandEntry { name: "ls", handler: commands::ls },
    CommandEntry { name: "pwd", handler: commands::pwd },
    CommandEntry { name: "whoami", handler: commands::whoami },
    CommandEntry { name: "clear", handler: commands::clear },
    CommandEntry { name: "date", handler: commands::date },
    CommandEntry { name: "uname", handler: commands::uname },
    CommandEntry { name: "htop", handler: commands::htop },
    CommandEntry { name: "ps", handler: commands::ps },
    CommandEntry { name: "df", handler: commands::df },
    CommandEntry { name: "free", handler: commands::free },
    CommandEntry { name: "cat", handler: commands::cat },
    CommandEntry { name: "mkdir", handler: commands::mkdir },
    CommandEntry { name: "touch", handler: commands::touch },
    CommandEntry { name: "echo", handler: commands::echo },
    CommandEntry { name: "history", handler: commands::history },
    CommandEntry { name: "cd", handler: commands::cd },
    CommandEntry { name: "exit", handler: commands::exit },
];

/// Look up the handler for a verb (case-insensitive)
pub fn lookup(verb: &str) -> Option<Handler> {
    COMMANDS
        .iter()
        .find(|entry| entry.name.eq_ignore_ascii_case(verb))
        .map(|entry| entry.handler)
}

/// Names of every recognized verb, in table order
pub fn command_names() -> impl Iterator<Item = &'static str> {
    COMMANDS.iter().map(|entry| entry.name)
}

/// Evaluate one input line. `None` for blank input.
pub fn evaluate(line: &str, ctx: &CommandContext<'_>) -> Option<Outcome> {
    let invocation = Invocation::parse(line)?;
    let handler = lookup(invocation.verb).unwrap_or(commands::not_found);
    tracing::trace!(verb = invocation.verb, "Dispatching command");
    Some(handler(&invocation, ctx))
}

/// `<user>@<hostname>:~$ `
pub fn prompt(identity: &ServerIdentity, profile: &SystemProfile) -> String {
    format!("{}@{}:~$ ", identity.username, profile.hostname)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LineKind, MetricsSnapshot, Provider};
    use chrono::TimeZone;

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

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()
    }

    fn run(line: &str, history: &[String]) -> Option<Outcome> {
        let identity = identity();
        let ctx = CommandContext {
            identity: &identity,
            profile: SystemProfile::for_provider(identity.provider),
            history,
            now: now(),
        };
        evaluate(line, &ctx)
    }

    fn texts(outcome: &Outcome) -> Vec<&str> {
        outcome.lines.iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn test_parse_invocation() {
        let inv = Invocation::parse("  echo   hello  world ").unwrap();
        assert_eq!(inv.verb, "echo");
        assert_eq!(inv.rest, "hello  world");
        assert_eq!(inv.args().count(), 2);
        assert!(Invocation::parse("   \t ").is_none());
    }

    #[test]
    fn test_has_flag() {
        let inv = Invocation::parse("ls -la").unwrap();
        assert!(inv.has_flag('l'));
        assert!(inv.has_flag('a'));
        assert!(!Invocation::parse("ls docs").unwrap().has_flag('l'));
    }

    #[test]
    fn test_blank_input_is_noop() {
        assert!(run("", &[]).is_none());
        assert!(run("   ", &[]).is_none());
    }

    #[test]
    fn test_unknown_command() {
        let outcome = run("foobar", &[]).unwrap();
        assert_eq!(texts(&outcome), vec!["bash: foobar: command not found"]);
        assert_eq!(outcome.lines[0].kind, LineKind::Error);
        assert_eq!(outcome.action, Action::Continue);
    }

    #[test]
    fn test_unknown_command_keeps_typed_case() {
        let outcome = run("FooBar --x", &[]).unwrap();
        assert_eq!(texts(&outcome), vec!["bash: FooBar: command not found"]);
    }

    #[test]
    fn test_verbs_are_case_insensitive() {
        assert_eq!(texts(&run("WHOAMI", &[]).unwrap()), vec!["root"]);
        assert_eq!(texts(&run("Pwd", &[]).unwrap()), vec!["/root"]);
    }

    #[test]
    fn test_whoami_and_pwd() {
        assert_eq!(texts(&run("whoami", &[]).unwrap()), vec!["root"]);
        assert_eq!(texts(&run("pwd", &[]).unwrap()), vec!["/root"]);
    }

    #[test]
    fn test_recognized_verbs_are_deterministic() {
        for name in command_names().filter(|n| !matches!(*n, "date" | "history")) {
            assert_eq!(run(name, &[]), run(name, &[]), "verb {}", name);
        }
    }

    #[test]
    fn test_every_table_entry_dispatches() {
        for name in command_names() {
            let outcome = run(name, &[name.to_string()]).unwrap();
            let not_found = format!("bash: {}: command not found", name);
            assert!(outcome.lines.iter().all(|l| l.text != not_found), "verb {}", name);
        }
    }

    #[test]
    fn test_clear_action() {
        let outcome = run("clear", &[]).unwrap();
        assert_eq!(outcome.action, Action::Clear);
        assert!(outcome.lines.is_empty());
    }

    #[test]
    fn test_exit_terminates() {
        let outcome = run("exit", &[]).unwrap();
        assert!(outcome.terminate());
        assert!(outcome.lines.iter().any(|l| l.text.contains("10.0.0.5")));
    }

    #[test]
    fn test_prompt_format() {
        let identity = identity();
        let profile = SystemProfile::for_provider(identity.provider);
        assert_eq!(prompt(&identity, profile), "root@gcp-instance-1:~$ ");
    }

    #[test]
    fn test_lookup() {
        assert!(lookup("ls").is_some());
        assert!(lookup("LS").is_some());
        assert!(lookup("rm").is_none());
    }
}
