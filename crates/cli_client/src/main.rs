//! Terminal client for the simulated VPS shell
//! Features: raw-mode key editing, colored line kinds, line-buffered fallback

mod raw_mode;
mod render;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::{execute, terminal::SetTitle};
use render::Renderer;
use std::collections::VecDeque;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use vpsterm_core::{
    Action, ConnectionPhase, CoreError, KeyInput, MetricsSnapshot, Outcome, Provider,
    ServerIdentity, SessionOptions, SessionTiming, TerminalSession, CLOSE_DELAY_MS,
    CONNECT_DELAY_MS,
};

/// Simulated SSH terminal for one VPS
#[derive(Parser, Debug)]
#[command(name = "cli_client")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    /// Load the server identity from a JSON file
    #[arg(short, long, conflicts_with = "host")]
    identity: Option<PathBuf>,

    #[command(flatten)]
    server: ServerArgs,

    /// Simulated handshake time, in milliseconds
    #[arg(long, default_value_t = CONNECT_DELAY_MS)]
    connect_delay_ms: u64,

    /// Delay between logout and exit, in milliseconds
    #[arg(long, default_value_t = CLOSE_DELAY_MS)]
    close_delay_ms: u64,

    /// Log level for stderr (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,
}

#[derive(ClapArgs, Debug)]
struct ServerArgs {
    /// Server host
    #[arg(long, required_unless_present = "identity")]
    host: Option<String>,

    /// Display name (defaults to the host)
    #[arg(long)]
    name: Option<String>,

    #[arg(short, long, default_value_t = 22)]
    port: u16,

    #[arg(short, long, default_value = "root")]
    username: String,

    /// Provider tag (gcp, aws, azure, digitalocean, vultr, linode)
    #[arg(long, default_value = "other")]
    provider: Provider,

    #[arg(long, default_value = "")]
    region: String,

    #[arg(long, default_value_t = 0.0)]
    cpu: f64,

    #[arg(long, default_value_t = 0.0)]
    memory: f64,

    #[arg(long, default_value_t = 0.0)]
    disk: f64,

    #[arg(long, default_value_t = 0.0)]
    uptime_hours: f64,
}

impl Args {
    fn load_identity(&self) -> Result<ServerIdentity> {
        if let Some(path) = &self.identity {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            return ServerIdentity::from_json(&json)
                .with_context(|| format!("Invalid identity in {}", path.display()));
        }

        let server = &self.server;
        let host = server.host.clone().unwrap_or_default();
        let name = server.name.clone().unwrap_or_else(|| host.clone());
        Ok(ServerIdentity::new(name, host)
            .with_port(server.port)
            .with_username(server.username.as_str())
            .with_provider(server.provider)
            .with_region(server.region.as_str())
            .with_metrics(MetricsSnapshot {
                cpu_percent: server.cpu,
                memory_percent: server.memory,
                disk_percent: server.disk,
                uptime_hours: server.uptime_hours,
            }))
    }

    fn timing(&self) -> SessionTiming {
        SessionTiming {
            connect_delay: Duration::from_millis(self.connect_delay_ms),
            close_delay: Duration::from_millis(self.close_delay_ms),
        }
    }
}

/// Input forwarded from the reader thread
#[derive(Debug, Clone, PartialEq, Eq)]
enum ClientInput {
    Key(KeyInput),
    Line(String),
    /// Ctrl+C / Ctrl+D: close from the host side
    Interrupt,
}

/// Translate a crossterm key event
fn map_key(event: KeyEvent) -> Option<ClientInput> {
    if event.kind != KeyEventKind::Press {
        return None;
    }
    let ctrl = event.modifiers.contains(KeyModifiers::CONTROL);
    let key = match event.code {
        KeyCode::Char('c') | KeyCode::Char('d') if ctrl => return Some(ClientInput::Interrupt),
        KeyCode::Char(_) if ctrl => return None,
        KeyCode::Char(c) => KeyInput::Char(c),
        KeyCode::Backspace => KeyInput::Backspace,
        KeyCode::Enter => KeyInput::Enter,
        KeyCode::Up => KeyInput::Up,
        KeyCode::Down => KeyInput::Down,
        _ => return None,
    };
    Some(ClientInput::Key(key))
}

/// Read raw key events on a plain thread so a blocked read never holds
/// up runtime shutdown
fn spawn_key_reader(tx: mpsc::Sender<ClientInput>) {
    std::thread::spawn(move || loop {
        if tx.is_closed() {
            break;
        }
        match event::poll(Duration::from_millis(100)) {
            Ok(false) => continue,
            Ok(true) => {}
            Err(_) => break,
        }
        match event::read() {
            Ok(Event::Key(key)) => {
                if let Some(input) = map_key(key) {
                    if tx.blocking_send(input).is_err() {
                        break;
                    }
                }
            }
            Ok(_) => {}
            Err(_) => break,
        }
    });
}

/// Line-buffered input for piped stdin / non-TTY
fn spawn_line_reader(tx: mpsc::Sender<ClientInput>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(ClientInput::Line(line)).is_err() {
                break;
            }
        }
    });
}

/// Forward one input to the session
async fn apply(session: &TerminalSession, input: ClientInput) -> Result<Option<Outcome>> {
    let result = match input {
        ClientInput::Key(key) => session.handle_key(key).await,
        ClientInput::Line(line) => session.submit_line(&line).await,
        ClientInput::Interrupt => {
            session.close().await;
            return Ok(None);
        }
    };
    match result {
        Ok(outcome) => Ok(outcome),
        // Typing ahead while connecting, or after logout
        Err(CoreError::NotConnected(phase)) => {
            debug!("Input ignored while {}", phase);
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Start the session and drive it until its close callback fires
///
/// Input that arrives during the handshake is held back and replayed
/// once connected, so a piped script is not lost. End of input logs out
/// after everything queued has run.
async fn run<W: Write>(
    session: &TerminalSession,
    input_rx: &mut mpsc::Receiver<ClientInput>,
    mut closed: oneshot::Receiver<()>,
    renderer: &mut Renderer<W>,
) -> Result<()> {
    let mut phase_rx = session.subscribe();
    session.start().await?;

    let mut pending = VecDeque::new();
    let mut input_open = true;
    let mut logged_out = false;
    loop {
        tokio::select! {
            _ = &mut closed => break,
            changed = phase_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            input = input_rx.recv(), if input_open => match input {
                Some(ClientInput::Interrupt) => {
                    apply(session, ClientInput::Interrupt).await?;
                }
                Some(input) => pending.push_back(input),
                None => input_open = false,
            },
        }

        if session.phase() == ConnectionPhase::Connecting {
            continue;
        }

        let mut clear = false;
        while let Some(input) = pending.pop_front() {
            if let Some(outcome) = apply(session, input).await? {
                clear |= outcome.action == Action::Clear;
            }
        }
        if !input_open && !logged_out {
            // stdin is gone: log out
            logged_out = true;
            session.close().await;
        }

        session
            .with_terminal(|terminal| {
                renderer.render(terminal.buffer().lines(), terminal.input(), clear)
            })
            .await?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(&args.log_level)?;

    let identity = args.load_identity()?;
    let address = identity.address();

    let (close_tx, closed) = oneshot::channel::<()>();
    let options = SessionOptions::default()
        .with_timing(args.timing())
        .on_close(move || {
            let _ = close_tx.send(());
        });
    let session = TerminalSession::new(identity, options).context("Cannot open terminal")?;

    let mut stdout = std::io::stdout();
    let _ = execute!(stdout, SetTitle(format!("[VPS] {}", session.identity().name)));

    // Fallback: continue without raw mode in non-TTY environments
    let guard = match raw_mode::RawModeGuard::enable() {
        Ok(guard) => Some(guard),
        Err(e) => {
            debug!("Raw mode not available: {}", e);
            None
        }
    };

    let (input_tx, mut input_rx) = mpsc::channel::<ClientInput>(64);
    if guard.is_some() {
        spawn_key_reader(input_tx);
    } else {
        spawn_line_reader(input_tx);
    }

    let mut renderer = Renderer::new(stdout);
    renderer.status(&format!("Connecting to {}...", address))?;

    run(&session, &mut input_rx, closed, &mut renderer).await?;

    renderer.finish()?;
    drop(guard);
    println!("Connection to {} closed.", address);
    Ok(())
}

/// Setup logging with tracing
fn setup_logging(level: &str) -> Result<()> {
    let log_level = level.parse::<Level>().unwrap_or(Level::WARN);

    let filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .context("Failed to initialise logging")?;

    Ok(())
}
