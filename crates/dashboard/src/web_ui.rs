//! Web UI Module for the VPS terminal dashboard
//!
//! - JSON API for creating, driving and closing simulated terminals
//! - HTML terminal page (Catppuccin Mocha theme), one CSS class per line kind
//! - Phase changes via SSE
//! - Pass-through proxy to the external SSH test backend

use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast::error::RecvError;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use vpsterm_core::{
    ConnectionPhase, CoreError, KeyInput, LineKind, OutputLine, ServerIdentity, SessionSnapshot,
};

use crate::backend::{BackendError, SshBackend, SshCredentials, SshTestResponse};
use crate::session::{SessionManager, SessionSummary};

/// Number of consecutive ports tried when the requested one is taken
const PORT_FALLBACK_ATTEMPTS: u16 = 10;

/// API error, rendered as `{ success: false, error }`
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Session {0} not found")]
    SessionNotFound(String),

    #[error("Session limit reached ({0} open terminals)")]
    LimitReached(usize),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::SessionNotFound(_) => StatusCode::NOT_FOUND,
            Self::LimitReached(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::Core(CoreError::NotConnected(_) | CoreError::InvalidState(_)) => {
                StatusCode::CONFLICT
            }
            Self::Core(CoreError::InvalidIdentity(_) | CoreError::Serialization(_)) => {
                StatusCode::BAD_REQUEST
            }
        }
    }
}

/// JSON error body
#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!("API error: {}", self);
        }
        let body = ErrorBody {
            success: false,
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// State shared across web server
#[derive(Clone)]
pub struct WebState {
    sessions: Arc<SessionManager>,
    backend: Arc<SshBackend>,
}

impl WebState {
    pub fn new(sessions: Arc<SessionManager>, backend: Arc<SshBackend>) -> Self {
        Self { sessions, backend }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub sessions: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedResponse {
    pub id: String,
    pub phase: ConnectionPhase,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalView {
    pub id: String,
    #[serde(flatten)]
    pub snapshot: SessionSnapshot,
}

#[derive(Debug, Deserialize)]
pub struct InputRequest {
    pub line: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputResponse {
    pub lines: Vec<OutputLine>,
    pub terminate: bool,
    pub phase: ConnectionPhase,
}

/// Simple health check
pub async fn health(State(state): State<WebState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        sessions: state.sessions.session_count().await,
    })
}

/// Open a terminal for a server identity
pub async fn create_terminal(
    State(state): State<WebState>,
    Json(identity): Json<ServerIdentity>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let (id, session) = state.sessions.create_session(identity).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            id,
            phase: session.phase(),
        }),
    ))
}

pub async fn list_terminals(State(state): State<WebState>) -> Json<Vec<SessionSummary>> {
    Json(state.sessions.list_sessions().await)
}

pub async fn get_terminal(
    State(state): State<WebState>,
    Path(id): Path<String>,
) -> Result<Json<TerminalView>, ApiError> {
    let session = state.sessions.get_session(&id).await?;
    let snapshot = session.snapshot().await;
    Ok(Json(TerminalView { id, snapshot }))
}

/// Submit a whole line
pub async fn submit_input(
    State(state): State<WebState>,
    Path(id): Path<String>,
    Json(request): Json<InputRequest>,
) -> Result<Json<InputResponse>, ApiError> {
    let session = state.sessions.get_session(&id).await?;
    let outcome = session.submit_line(&request.line).await?;
    let (lines, terminate) = match outcome {
        Some(outcome) => {
            let terminate = outcome.terminate();
            (outcome.lines, terminate)
        }
        None => (Vec::new(), false),
    };
    Ok(Json(InputResponse {
        lines,
        terminate,
        phase: session.phase(),
    }))
}

/// Apply one key and return the updated view
pub async fn send_key(
    State(state): State<WebState>,
    Path(id): Path<String>,
    Json(key): Json<KeyInput>,
) -> Result<Json<TerminalView>, ApiError> {
    let session = state.sessions.get_session(&id).await?;
    session.handle_key(key).await?;
    let snapshot = session.snapshot().await;
    Ok(Json(TerminalView { id, snapshot }))
}

pub async fn close_terminal(
    State(state): State<WebState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.sessions.close_session(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// SSE stream of phase changes; ends once the session disconnects
///
/// Starts with the current phase, then reports every later transition.
pub async fn phase_events(
    State(state): State<WebState>,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let session = state.sessions.get_session(&id).await?;
    let mut events = session.phase_events();
    let mut last = session.phase();
    drop(session);

    let stream = async_stream::stream! {
        yield Ok(phase_event(last));
        while last != ConnectionPhase::Disconnected {
            match events.recv().await {
                // Already reported as the current phase
                Ok(phase) if phase == last => continue,
                Ok(phase) => {
                    last = phase;
                    yield Ok(phase_event(phase));
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Phase stream for {} lagged by {}", id, skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(30))
            .text("keepalive"),
    ))
}

fn phase_event(phase: ConnectionPhase) -> Event {
    Event::default().event("phase").data(phase.as_str())
}

/// Session list page
pub async fn index_page(State(state): State<WebState>) -> Html<String> {
    let sessions = state.sessions.list_sessions().await;
    Html(HtmlTemplate::render_index(&sessions))
}

/// Rendered terminal page
pub async fn terminal_page(
    State(state): State<WebState>,
    Path(id): Path<String>,
) -> Result<Html<String>, ApiError> {
    let session = state.sessions.get_session(&id).await?;
    let snapshot = session.snapshot().await;
    Ok(Html(HtmlTemplate::render(&id, &snapshot)))
}

/// Proxy `POST /ssh/connect`
pub async fn ssh_connect(
    State(state): State<WebState>,
    Json(credentials): Json<SshCredentials>,
) -> (StatusCode, Json<SshTestResponse>) {
    proxy_result(state.backend.connect(&credentials).await)
}

/// Proxy `POST /ssh/system-info`
pub async fn ssh_system_info(
    State(state): State<WebState>,
    Json(credentials): Json<SshCredentials>,
) -> (StatusCode, Json<SshTestResponse>) {
    proxy_result(state.backend.system_info(&credentials).await)
}

fn proxy_result(
    result: std::result::Result<(StatusCode, SshTestResponse), BackendError>,
) -> (StatusCode, Json<SshTestResponse>) {
    match result {
        Ok((status, body)) => (status, Json(body)),
        Err(e) => {
            warn!("SSH backend request failed: {}", e);
            (e.status(), Json(SshTestResponse::failure(e.to_string())))
        }
    }
}

/// CSS class for a line kind
fn css_class(kind: LineKind) -> &'static str {
    match kind {
        LineKind::Info => "info",
        LineKind::Success => "success",
        LineKind::Error => "error",
        LineKind::Prompt => "prompt",
        LineKind::Data => "data",
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// HTML template renderer with Catppuccin Mocha theme
pub struct HtmlTemplate;

impl HtmlTemplate {
    /// Render the list of open terminals
    pub fn render_index(sessions: &[SessionSummary]) -> String {
        let rows: String = if sessions.is_empty() {
            "<li class=\"empty\">No open terminals</li>\n".to_string()
        } else {
            sessions
                .iter()
                .map(|s| {
                    format!(
                        "<li><a href=\"/terminals/{id}\">{name}</a> <span>{address}</span> <span class=\"status {phase}\">{phase}</span></li>\n",
                        id = escape_html(&s.id),
                        name = escape_html(&s.name),
                        address = escape_html(&s.address),
                        phase = s.phase,
                    )
                })
                .collect()
        };

        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>VPS Terminals</title>
    <style>
        body {{
            background-color: #1E1E2E;
            color: #CDD6F4;
            font-family: "JetBrains Mono", Menlo, Consolas, monospace;
            padding: 20px;
        }}
        h1 {{ color: #CBA6F7; }}
        a {{ color: #89B4FA; }}
        li {{ margin-bottom: 0.5rem; }}
        .status.connected {{ color: #A6E3A1; }}
        .status.connecting {{ color: #F9E2AF; }}
        .status.disconnected, .status.error {{ color: #F38BA8; }}
    </style>
</head>
<body>
    <h1>VPS Terminals</h1>
    <ul>
{rows}    </ul>
</body>
</html>"#
        )
    }

    /// Render the scrollback of one terminal
    pub fn render(id: &str, snapshot: &SessionSnapshot) -> String {
        let lines: String = snapshot
            .lines
            .iter()
            .map(|line| {
                format!(
                    "<div class=\"line {}\">{}</div>\n",
                    css_class(line.kind),
                    escape_html(&line.text)
                )
            })
            .collect();

        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{name} - SSH Terminal</title>
    <style>
        :root {{
            --ctp-base: #1E1E2E;
            --ctp-surface: #313244;
            --ctp-primary: #CBA6F7;
            --ctp-text: #CDD6F4;
            --ctp-green: #A6E3A1;
            --ctp-red: #F38BA8;
            --ctp-yellow: #F9E2AF;
            --ctp-blue: #89B4FA;
        }}
        body {{
            background-color: var(--ctp-base);
            color: var(--ctp-text);
            font-family: "JetBrains Mono", Menlo, Consolas, monospace;
            margin: 0;
            padding: 20px;
        }}
        .header {{ color: var(--ctp-primary); margin-bottom: 1rem; }}
        .status {{ font-size: 0.9rem; opacity: 0.8; }}
        .status.connected {{ color: var(--ctp-green); }}
        .status.connecting {{ color: var(--ctp-yellow); }}
        .status.disconnected, .status.error {{ color: var(--ctp-red); }}
        .screen {{
            background-color: var(--ctp-surface);
            border-radius: 8px;
            padding: 1rem;
            white-space: pre;
            overflow-x: auto;
        }}
        .line {{ min-height: 1.2em; }}
        .line.success {{ color: var(--ctp-green); }}
        .line.error {{ color: var(--ctp-red); }}
        .line.prompt {{ color: var(--ctp-blue); }}
        .line.info {{ color: var(--ctp-text); opacity: 0.85; }}
        .line.data {{ color: var(--ctp-text); }}
        form {{ margin-top: 0.5rem; }}
        input {{
            width: 100%;
            background: transparent;
            color: var(--ctp-text);
            border: none;
            border-bottom: 1px solid var(--ctp-primary);
            font: inherit;
        }}
    </style>
</head>
<body>
    <div class="header">{name} &mdash; {address}</div>
    <div id="status" class="status {phase}">{phase}</div>
    <div class="screen">
{lines}    </div>
    <form id="input-form">
        <input id="input" autocomplete="off" autofocus value="{input}">
    </form>
    <script>
        const form = document.getElementById('input-form');
        form.addEventListener('submit', async (event) => {{
            event.preventDefault();
            const line = document.getElementById('input').value;
            await fetch('/api/terminals/{id}/input', {{
                method: 'POST',
                headers: {{ 'Content-Type': 'application/json' }},
                body: JSON.stringify({{ line }}),
            }});
            window.location.reload();
        }});

        const events = new EventSource('/api/terminals/{id}/events');
        events.addEventListener('phase', (event) => {{
            const statusEl = document.getElementById('status');
            if (statusEl.textContent !== event.data) {{
                window.location.reload();
            }}
        }});
    </script>
</body>
</html>"#,
            name = escape_html(&snapshot.identity.name),
            address = escape_html(&snapshot.identity.address()),
            phase = snapshot.phase,
            lines = lines,
            input = escape_html(&snapshot.input),
            id = escape_html(id),
        )
    }
}

/// Web server for the terminal dashboard
pub struct WebServer {
    state: WebState,
}

impl WebServer {
    pub fn new(state: WebState) -> Self {
        Self { state }
    }

    /// Build the router
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(index_page))
            .route("/health", get(health))
            .route("/api/terminals", get(list_terminals).post(create_terminal))
            .route(
                "/api/terminals/:id",
                get(get_terminal).delete(close_terminal),
            )
            .route("/api/terminals/:id/input", post(submit_input))
            .route("/api/terminals/:id/keys", post(send_key))
            .route("/api/terminals/:id/events", get(phase_events))
            .route("/terminals/:id", get(terminal_page))
            .route("/api/ssh/connect", post(ssh_connect))
            .route("/api/ssh/system-info", post(ssh_system_info))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(self.state.clone())
    }

    /// Start the web server
    ///
    /// Tries the requested port and the next few if it is taken.
    /// Returns the actual bound address.
    pub async fn start(&self, bind_addr: SocketAddr) -> Result<SocketAddr> {
        if !bind_addr.ip().is_loopback() {
            warn!(
                "Dashboard bound to non-loopback address {}; terminals are reachable from the network",
                bind_addr
            );
        }

        for port_offset in 0..PORT_FALLBACK_ATTEMPTS {
            let port = bind_addr.port().saturating_add(port_offset);
            let addr = SocketAddr::new(bind_addr.ip(), port);

            match tokio::net::TcpListener::bind(addr).await {
                Ok(listener) => {
                    let addr = listener
                        .local_addr()
                        .context("Failed to read bound address")?;
                    info!("Web server listening on http://{}", addr);

                    let app = self.router();
                    tokio::spawn(async move {
                        if let Err(e) = axum::serve(listener, app.into_make_service()).await {
                            tracing::error!("Web server error: {}", e);
                        }
                    });

                    return Ok(addr);
                }
                Err(e) => {
                    if bind_addr.port() == 0 {
                        return Err(e).context("Failed to bind web server");
                    }
                    if port_offset == 0 {
                        warn!("Port {} in use, trying next port...", port);
                    }
                }
            }
        }

        Err(anyhow::anyhow!(
            "No available ports for web server (tried {}-{})",
            bind_addr.port(),
            bind_addr.port().saturating_add(PORT_FALLBACK_ATTEMPTS - 1)
        ))
    }

    /// Open browser to the web dashboard
    pub fn open_browser(url: &str) -> Result<()> {
        open::that(url).context("Failed to open browser")
    }
}
