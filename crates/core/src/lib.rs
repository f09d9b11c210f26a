//! VPS Terminal Core - simulated SSH session for the VPS dashboard
//!
//! This crate provides:
//! - Domain types (server identity, provider profiles, tagged output lines)
//! - Command interpreter for the scripted shell
//! - Terminal state machine (scrollback, history, input editor)
//! - Async session controller with cancellable timers
//! - Error types

// Version constants
pub const APP_VERSION_STRING: &str = "0.1.0";
/// Simulated handshake time before a session reports `connected`
pub const CONNECT_DELAY_MS: u64 = 1200;
/// Delay between disconnect and the host's close callback
pub const CLOSE_DELAY_MS: u64 = 1000;

pub mod error;
pub mod interpreter;
pub mod session;
pub mod types;

// Re-export common types
pub use error::{CoreError, Result};
pub use interpreter::{evaluate, Action, CommandContext, Outcome};
pub use session::{
    LogObserver, SessionObserver, SessionOptions, SessionSnapshot, SessionTiming, Terminal,
    TerminalSession,
};
pub use types::{
    ConnectionPhase, KeyInput, LineKind, MetricsSnapshot, OutputLine, Provider, ServerIdentity,
    SystemProfile,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_constants_defined() {
        assert!(APP_VERSION_STRING.starts_with("0.1"));
        assert!((1000..=1500).contains(&CONNECT_DELAY_MS));
    }
}
