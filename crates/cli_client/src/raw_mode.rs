//! Raw mode terminal wrapper for crossterm
//!
//! Ensures terminal is restored to normal mode on drop (even on panic).

use anyhow::Result;
use crossterm::terminal;

/// Guard that enables raw mode and restores normal mode on drop.
///
/// # Example
/// ```no_run
/// let _guard = RawModeGuard::enable()?;
/// // Keys now arrive one at a time, without local echo
/// # Ok::<(), anyhow::Error>(())
/// ```
pub struct RawModeGuard;

impl RawModeGuard {
    /// Enable raw mode for the terminal.
    ///
    /// Fails when stdin is not a TTY; the caller then falls back to
    /// line-buffered input.
    pub fn enable() -> Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        // Best-effort restore
        let _ = terminal::disable_raw_mode();
    }
}
