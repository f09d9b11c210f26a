//! Server identity handed to a terminal by its host view

use crate::error::{CoreError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Hosting provider tag
///
/// Selects the canned [`SystemProfile`](super::SystemProfile). Any tag
/// outside the fixed set, including an empty one, becomes `Other`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "Option<String>", into = "String")]
pub enum Provider {
    Gcp,
    Aws,
    Azure,
    DigitalOcean,
    Vultr,
    Linode,
    #[default]
    Other,
}

impl Provider {
    pub const ALL: [Provider; 7] = [
        Provider::Gcp,
        Provider::Aws,
        Provider::Azure,
        Provider::DigitalOcean,
        Provider::Vultr,
        Provider::Linode,
        Provider::Other,
    ];

    /// Wire tag (lowercase)
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Gcp => "gcp",
            Self::Aws => "aws",
            Self::Azure => "azure",
            Self::DigitalOcean => "digitalocean",
            Self::Vultr => "vultr",
            Self::Linode => "linode",
            Self::Other => "other",
        }
    }

    /// Human readable provider name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Gcp => "Google Cloud",
            Self::Aws => "Amazon Web Services",
            Self::Azure => "Microsoft Azure",
            Self::DigitalOcean => "DigitalOcean",
            Self::Vultr => "Vultr",
            Self::Linode => "Linode",
            Self::Other => "Other",
        }
    }

    /// Parse a tag, falling back to `Other`
    pub fn from_tag(tag: &str) -> Self {
        let tag = tag.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.tag().eq_ignore_ascii_case(tag))
            .unwrap_or_default()
    }
}

impl From<String> for Provider {
    fn from(tag: String) -> Self {
        Self::from_tag(&tag)
    }
}

impl From<Option<String>> for Provider {
    fn from(tag: Option<String>) -> Self {
        tag.map(Self::from).unwrap_or_default()
    }
}

impl From<Provider> for String {
    fn from(provider: Provider) -> Self {
        provider.tag().to_string()
    }
}

impl std::str::FromStr for Provider {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from_tag(s))
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Resource usage figures shown in the banner and in `htop`/`free`/`df`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetricsSnapshot {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub disk_percent: f64,
    pub uptime_hours: f64,
}

/// Server the terminal pretends to be connected to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerIdentity {
    pub name: String,
    pub host: String,
    #[serde(deserialize_with = "null_port")]
    pub port: u16,
    #[serde(deserialize_with = "null_username")]
    pub username: String,
    pub provider: Provider,
    #[serde(deserialize_with = "null_default")]
    pub region: String,
    #[serde(deserialize_with = "null_default")]
    pub cpu_usage_percent: f64,
    #[serde(deserialize_with = "null_default")]
    pub memory_usage_percent: f64,
    #[serde(deserialize_with = "null_default")]
    pub disk_usage_percent: f64,
    #[serde(deserialize_with = "null_default")]
    pub uptime_hours: f64,
}

const DEFAULT_PORT: u16 = 22;
const DEFAULT_USERNAME: &str = "root";

// Dashboard rows carry nullable columns; `null` means "use the default".
fn null_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_port<'de, D>(deserializer: D) -> std::result::Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u16>::deserialize(deserializer)?.unwrap_or(DEFAULT_PORT))
}

fn null_username<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .unwrap_or_else(|| DEFAULT_USERNAME.to_string()))
}

impl Default for ServerIdentity {
    fn default() -> Self {
        Self {
            name: String::new(),
            host: String::new(),
            port: DEFAULT_PORT,
            username: DEFAULT_USERNAME.to_string(),
            provider: Provider::Other,
            region: String::new(),
            cpu_usage_percent: 0.0,
            memory_usage_percent: 0.0,
            disk_usage_percent: 0.0,
            uptime_hours: 0.0,
        }
    }
}

impl ServerIdentity {
    /// Create identity with default port, user and provider
    pub fn new(name: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            ..Default::default()
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn with_provider(mut self, provider: Provider) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_metrics(mut self, metrics: MetricsSnapshot) -> Self {
        self.cpu_usage_percent = metrics.cpu_percent;
        self.memory_usage_percent = metrics.memory_percent;
        self.disk_usage_percent = metrics.disk_percent;
        self.uptime_hours = metrics.uptime_hours;
        self
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cpu_percent: self.cpu_usage_percent,
            memory_percent: self.memory_usage_percent,
            disk_percent: self.disk_usage_percent,
            uptime_hours: self.uptime_hours,
        }
    }

    /// `host:port` as shown in the banner
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Reject identities no terminal can be opened for
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(CoreError::InvalidIdentity("host is empty".to_string()));
        }
        if self.port == 0 {
            return Err(CoreError::InvalidIdentity("port must be non-zero".to_string()));
        }
        if self.username.trim().is_empty() {
            return Err(CoreError::InvalidIdentity("username is empty".to_string()));
        }
        Ok(())
    }

    /// Parse from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_from_tag() {
        assert_eq!(Provider::from_tag("gcp"), Provider::Gcp);
        assert_eq!(Provider::from_tag("AWS"), Provider::Aws);
        assert_eq!(Provider::from_tag("hetzner"), Provider::Other);
        assert_eq!(Provider::from_tag(""), Provider::Other);
    }

    #[test]
    fn test_identity_json_defaults() {
        let identity = ServerIdentity::from_json(r#"{"name":"web","host":"10.0.0.5"}"#).unwrap();
        assert_eq!(identity.port, 22);
        assert_eq!(identity.username, "root");
        assert_eq!(identity.provider, Provider::Other);
    }

    #[test]
    fn test_identity_json_camel_case() {
        let identity = ServerIdentity::from_json(
            r#"{"name":"Test-1","host":"10.0.0.5","port":2222,"provider":"digitalocean",
                "cpuUsagePercent":15,"memoryUsagePercent":22.5,"uptimeHours":3}"#,
        )
        .unwrap();
        assert_eq!(identity.port, 2222);
        assert_eq!(identity.provider, Provider::DigitalOcean);
        assert_eq!(identity.metrics().cpu_percent, 15.0);
        assert_eq!(identity.metrics().memory_percent, 22.5);
        assert_eq!(identity.uptime_hours, 3.0);

        let json = serde_json::to_value(&identity).unwrap();
        assert_eq!(json["provider"], "digitalocean");
        assert_eq!(json["diskUsagePercent"], 0.0);
    }

    #[test]
    fn test_identity_json_nulls_take_defaults() {
        let identity = ServerIdentity::from_json(
            r#"{"name":"web","host":"10.0.0.5","port":null,"username":null,
                "provider":null,"region":null,"cpuUsagePercent":null,
                "memoryUsagePercent":null,"diskUsagePercent":null,"uptimeHours":null}"#,
        )
        .unwrap();
        assert_eq!(identity, ServerIdentity::new("web", "10.0.0.5"));
        assert!(identity.validate().is_ok());
    }

    #[test]
    fn test_validate() {
        assert!(ServerIdentity::new("a", "10.0.0.5").validate().is_ok());
        assert!(ServerIdentity::new("a", " ").validate().is_err());
        assert!(ServerIdentity::new("a", "h").with_port(0).validate().is_err());
        assert!(ServerIdentity::new("a", "h").with_username("").validate().is_err());
    }

    #[test]
    fn test_address() {
        let identity = ServerIdentity::new("a", "10.0.0.5").with_port(2200);
        assert_eq!(identity.address(), "10.0.0.5:2200");
    }
}
