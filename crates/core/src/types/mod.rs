//! Domain types for the simulated terminal

mod identity;
mod key;
mod line;
mod phase;
mod profile;

pub use identity::{MetricsSnapshot, Provider, ServerIdentity};
pub use key::KeyInput;
pub use line::{LineKind, OutputLine};
pub use phase::ConnectionPhase;
pub use profile::SystemProfile;
