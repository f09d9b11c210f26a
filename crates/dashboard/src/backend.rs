//! Client for the external SSH test backend
//!
//! The dashboard does not speak SSH. Real connectivity checks are
//! forwarded as JSON to `/ssh/connect` and `/ssh/system-info` on a
//! separate service, and its answer is passed back unchanged.

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Default request timeout for the backend
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Backend failures that never produced a usable response
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("SSH backend timed out after {0:?}")]
    Timeout(Duration),

    #[error("SSH backend unreachable: {0}")]
    Unreachable(String),

    #[error("Invalid response from SSH backend: {0}")]
    InvalidResponse(String),
}

impl BackendError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::Unreachable(_) | Self::InvalidResponse(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

fn default_port() -> u16 {
    22
}

/// Login details forwarded to the backend
#[derive(Clone, Serialize, Deserialize)]
pub struct SshCredentials {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for SshCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SshCredentials")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl SshCredentials {
    pub fn validate(&self) -> Result<(), BackendError> {
        if self.host.trim().is_empty() {
            return Err(BackendError::InvalidRequest("host is required".to_string()));
        }
        if self.username.trim().is_empty() {
            return Err(BackendError::InvalidRequest("username is required".to_string()));
        }
        if self.port == 0 {
            return Err(BackendError::InvalidRequest("port must be non-zero".to_string()));
        }
        Ok(())
    }
}

/// Backend response body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SshTestResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl SshTestResponse {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            details: None,
        }
    }
}

/// HTTP client for the SSH test backend
pub struct SshBackend {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl SshBackend {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build SSH backend client: {}", e))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `POST /ssh/connect`
    pub async fn connect(
        &self,
        credentials: &SshCredentials,
    ) -> Result<(StatusCode, SshTestResponse), BackendError> {
        self.post("/ssh/connect", credentials).await
    }

    /// `POST /ssh/system-info`
    pub async fn system_info(
        &self,
        credentials: &SshCredentials,
    ) -> Result<(StatusCode, SshTestResponse), BackendError> {
        self.post("/ssh/system-info", credentials).await
    }

    async fn post(
        &self,
        path: &str,
        credentials: &SshCredentials,
    ) -> Result<(StatusCode, SshTestResponse), BackendError> {
        credentials.validate()?;
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(
            "Forwarding {} for {}@{}:{}",
            path,
            credentials.username,
            credentials.host,
            credentials.port
        );

        let response = self
            .client
            .post(&url)
            .json(credentials)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = StatusCode::from_u16(response.status().as_u16())
            .unwrap_or(StatusCode::BAD_GATEWAY);
        let body = response
            .json::<SshTestResponse>()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BackendError::Timeout(self.timeout)
                } else {
                    BackendError::InvalidResponse(e.to_string())
                }
            })?;

        tracing::debug!("SSH backend answered {} (success: {})", status, body.success);
        Ok((status, body))
    }

    fn classify(&self, err: reqwest::Error) -> BackendError {
        if err.is_timeout() {
            BackendError::Timeout(self.timeout)
        } else {
            BackendError::Unreachable(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::post, Json, Router};

    fn credentials() -> SshCredentials {
        SshCredentials {
            host: "10.0.0.5".to_string(),
            port: 22,
            username: "root".to_string(),
            password: "hunter2".to_string(),
        }
    }

    /// Serve `router` on an ephemeral loopback port
    async fn stub(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", credentials());
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_credentials_default_port() {
        let creds: SshCredentials =
            serde_json::from_str(r#"{"host":"h","username":"u","password":"p"}"#).unwrap();
        assert_eq!(creds.port, 22);
    }

    #[test]
    fn test_response_shape() {
        let ok: SshTestResponse = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert!(ok.success);
        assert_eq!(serde_json::to_string(&ok).unwrap(), r#"{"success":true}"#);

        let failed = SshTestResponse::failure("auth failed");
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["error"], "auth failed");
        assert!(json.get("details").is_none());
    }

    #[tokio::test]
    async fn test_connect_passes_response_through() {
        let router = Router::new().route(
            "/ssh/connect",
            post(|Json(body): Json<serde_json::Value>| async move {
                Json(serde_json::json!({
                    "success": true,
                    "details": { "host": body["host"], "port": body["port"] }
                }))
            }),
        );
        let base = stub(router).await;
        let backend = SshBackend::new(&format!("{}/", base), Duration::from_secs(5)).unwrap();
        assert_eq!(backend.base_url(), base);

        let (status, body) = backend.connect(&credentials()).await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert!(body.success);
        assert_eq!(body.details.unwrap()["host"], "10.0.0.5");
    }

    #[tokio::test]
    async fn test_backend_failure_status_is_kept() {
        let router = Router::new().route(
            "/ssh/system-info",
            post(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(serde_json::json!({ "success": false, "error": "Authentication failed" })),
                )
            }),
        );
        let backend = SshBackend::new(&stub(router).await, Duration::from_secs(5)).unwrap();
        let (status, body) = backend.system_info(&credentials()).await.unwrap();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body.error.as_deref(), Some("Authentication failed"));
    }

    #[tokio::test]
    async fn test_timeout() {
        let router = Router::new().route(
            "/ssh/connect",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Json(serde_json::json!({ "success": true }))
            }),
        );
        let backend = SshBackend::new(&stub(router).await, Duration::from_millis(100)).unwrap();
        let err = backend.connect(&credentials()).await.unwrap_err();
        assert!(matches!(err, BackendError::Timeout(_)));
        assert_eq!(err.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[tokio::test]
    async fn test_non_json_response() {
        let router = Router::new().route("/ssh/connect", post(|| async { "plain text" }));
        let backend = SshBackend::new(&stub(router).await, Duration::from_secs(5)).unwrap();
        let err = backend.connect(&credentials()).await.unwrap_err();
        assert!(matches!(err, BackendError::InvalidResponse(_)));
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_invalid_credentials_never_sent() {
        let backend = SshBackend::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        let mut creds = credentials();
        creds.username.clear();
        let err = backend.connect(&creds).await.unwrap_err();
        assert!(matches!(err, BackendError::InvalidRequest(_)));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
