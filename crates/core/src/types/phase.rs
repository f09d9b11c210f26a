//! Connection phase of a simulated session

use serde::{Deserialize, Serialize};
use std::fmt;

/// Visible connection state of a terminal session
///
/// Moves forward `Disconnected -> Connecting -> Connected`, or to `Error`.
/// Once connected only `exit` or an explicit close returns it to
/// `Disconnected`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionPhase {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    /// Reserved for a real backend; nothing enters it today.
    Error,
}

impl ConnectionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Error => "error",
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for ConnectionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_disconnected() {
        assert_eq!(ConnectionPhase::default(), ConnectionPhase::Disconnected);
    }

    #[test]
    fn test_phase_serialization() {
        let json = serde_json::to_string(&ConnectionPhase::Connecting).unwrap();
        assert_eq!(json, "\"connecting\"");
        let phase: ConnectionPhase = serde_json::from_str("\"connected\"").unwrap();
        assert!(phase.is_connected());
    }
}
