//! Async session controller
//!
//! Wraps a [`Terminal`] with the two timed behaviours: the simulated
//! handshake (`connecting -> connected` after `connect_delay`) and the
//! deferred `on_close` callback. Both timers race a cancellation token
//! that fires when the session is dropped, so no update lands on a
//! disposed session.

use super::terminal::{SessionSnapshot, Terminal};
use crate::error::{CoreError, Result};
use crate::interpreter::Outcome;
use crate::types::{ConnectionPhase, KeyInput, ServerIdentity};
use crate::{CLOSE_DELAY_MS, CONNECT_DELAY_MS};
use chrono::Local;
use std::sync::Arc;
use std::time::Duration;
use std::fmt;
use tokio::sync::{broadcast, watch, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Buffered phase transitions per subscriber
const PHASE_EVENT_CAPACITY: usize = 16;

/// Callback run once after the session disconnects
pub type CloseCallback = Box<dyn FnOnce() + Send + 'static>;

/// Receives lifecycle notifications (toasts, logs)
pub trait SessionObserver: Send + Sync {
    fn on_connected(&self, _identity: &ServerIdentity) {}

    fn on_disconnected(&self, _identity: &ServerIdentity) {}
}

/// Observer that reports through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl SessionObserver for LogObserver {
    fn on_connected(&self, identity: &ServerIdentity) {
        info!(
            "Connected to {} ({}) as {}",
            identity.name,
            identity.address(),
            identity.username
        );
    }

    fn on_disconnected(&self, identity: &ServerIdentity) {
        info!("Disconnected from {} ({})", identity.name, identity.address());
    }
}

/// Cosmetic delays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTiming {
    /// Simulated handshake time
    pub connect_delay: Duration,
    /// Pause between disconnect and `on_close`
    pub close_delay: Duration,
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self {
            connect_delay: Duration::from_millis(CONNECT_DELAY_MS),
            close_delay: Duration::from_millis(CLOSE_DELAY_MS),
        }
    }
}

/// Construction options for [`TerminalSession`]
pub struct SessionOptions {
    pub timing: SessionTiming,
    pub observer: Arc<dyn SessionObserver>,
    pub on_close: Option<CloseCallback>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            timing: SessionTiming::default(),
            observer: Arc::new(LogObserver),
            on_close: None,
        }
    }
}

impl SessionOptions {
    pub fn with_timing(mut self, timing: SessionTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn on_close(mut self, callback: impl FnOnce() + Send + 'static) -> Self {
        self.on_close = Some(Box::new(callback));
        self
    }
}

struct Shared {
    identity: ServerIdentity,
    terminal: Mutex<Terminal>,
    phase_tx: watch::Sender<ConnectionPhase>,
    /// Every transition, in order; `phase_tx` only keeps the latest
    events_tx: broadcast::Sender<ConnectionPhase>,
    on_close: Mutex<Option<CloseCallback>>,
    observer: Arc<dyn SessionObserver>,
    timing: SessionTiming,
    /// Fires on drop; parent of `connect_cancel`
    disposed: CancellationToken,
    /// Fires on close or drop
    connect_cancel: CancellationToken,
}

impl Shared {
    fn set_phase(&self, phase: ConnectionPhase) {
        self.phase_tx.send_replace(phase);
        // No subscribers is fine
        let _ = self.events_tx.send(phase);
    }
}

/// A running simulated terminal
///
/// Independent of every other session: no state is shared between
/// instances. Dropping it cancels any pending timer.
pub struct TerminalSession {
    shared: Arc<Shared>,
}

impl TerminalSession {
    /// Create a session for `identity`. Nothing happens until `start`.
    pub fn new(identity: ServerIdentity, options: SessionOptions) -> Result<Self> {
        identity.validate()?;
        let (phase_tx, _) = watch::channel(ConnectionPhase::Disconnected);
        let (events_tx, _) = broadcast::channel(PHASE_EVENT_CAPACITY);
        let disposed = CancellationToken::new();
        let connect_cancel = disposed.child_token();
        Ok(Self {
            shared: Arc::new(Shared {
                terminal: Mutex::new(Terminal::new(identity.clone())),
                identity,
                phase_tx,
                events_tx,
                on_close: Mutex::new(options.on_close),
                observer: options.observer,
                timing: options.timing,
                disposed,
                connect_cancel,
            }),
        })
    }

    pub fn identity(&self) -> &ServerIdentity {
        &self.shared.identity
    }

    pub fn phase(&self) -> ConnectionPhase {
        *self.shared.phase_tx.borrow()
    }

    /// Watch phase changes
    pub fn subscribe(&self) -> watch::Receiver<ConnectionPhase> {
        self.shared.phase_tx.subscribe()
    }

    /// Receive every phase transition from now on
    ///
    /// Unlike [`subscribe`](Self::subscribe), no intermediate phase is
    /// skipped when transitions happen in quick succession.
    pub fn phase_events(&self) -> broadcast::Receiver<ConnectionPhase> {
        self.shared.events_tx.subscribe()
    }

    /// Resolve once the session reaches `target`
    pub async fn wait_for_phase(&self, target: ConnectionPhase) -> Result<()> {
        let mut rx = self.subscribe();
        rx.wait_for(|phase| *phase == target)
            .await
            .map(|_| ())
            .map_err(|_| CoreError::InvalidState("session dropped".to_string()))
    }

    /// Begin the simulated handshake
    pub async fn start(&self) -> Result<()> {
        self.shared.terminal.lock().await.begin_connect()?;
        self.shared.set_phase(ConnectionPhase::Connecting);
        debug!("Connecting to {}", self.shared.identity.address());

        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            tokio::select! {
                _ = shared.connect_cancel.cancelled() => {
                    debug!("Connect timer cancelled for {}", shared.identity.address());
                    return;
                }
                _ = tokio::time::sleep(shared.timing.connect_delay) => {}
            }

            // Notify under the lock so a racing close reports after us
            let mut terminal = shared.terminal.lock().await;
            if shared.connect_cancel.is_cancelled() {
                return;
            }
            if let Err(e) = terminal.finish_connect(Local::now()) {
                debug!("Skipping connect transition: {}", e);
                return;
            }
            shared.set_phase(ConnectionPhase::Connected);
            shared.observer.on_connected(&shared.identity);
        });
        Ok(())
    }

    /// Submit a whole line
    pub async fn submit_line(&self, line: &str) -> Result<Option<Outcome>> {
        let mut terminal = self.shared.terminal.lock().await;
        let outcome = terminal.submit_line(line, Local::now())?;
        self.after_outcome(outcome.as_ref());
        Ok(outcome)
    }

    /// Apply one key from the host view
    pub async fn handle_key(&self, key: KeyInput) -> Result<Option<Outcome>> {
        let mut terminal = self.shared.terminal.lock().await;
        let outcome = terminal.handle_key(key, Local::now())?;
        self.after_outcome(outcome.as_ref());
        Ok(outcome)
    }

    /// Close from the host side. Idempotent.
    pub async fn close(&self) {
        let mut terminal = self.shared.terminal.lock().await;
        if terminal.close() {
            self.shared.connect_cancel.cancel();
            self.disconnected();
        }
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.shared.terminal.lock().await.snapshot()
    }

    /// Run `f` against the terminal state
    pub async fn with_terminal<R>(&self, f: impl FnOnce(&Terminal) -> R) -> R {
        f(&*self.shared.terminal.lock().await)
    }

    fn after_outcome(&self, outcome: Option<&Outcome>) {
        if outcome.is_some_and(Outcome::terminate) {
            self.disconnected();
        }
    }

    /// Called with the terminal lock held
    fn disconnected(&self) {
        self.shared.set_phase(ConnectionPhase::Disconnected);
        self.shared.observer.on_disconnected(&self.shared.identity);
        self.schedule_close_callback();
    }

    fn schedule_close_callback(&self) {
        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            let Some(callback) = shared.on_close.lock().await.take() else {
                return;
            };
            tokio::select! {
                _ = shared.disposed.cancelled() => {
                    debug!("Session disposed before close callback ran");
                }
                _ = tokio::time::sleep(shared.timing.close_delay) => callback(),
            }
        });
    }
}

impl fmt::Debug for TerminalSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TerminalSession")
            .field("identity", &self.shared.identity)
            .field("phase", &self.phase())
            .finish()
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        self.shared.disposed.cancel();
    }
}
