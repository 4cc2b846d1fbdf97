use std::env;
use std::time::Duration;

pub struct Config {
    pub host: String,
    pub port: u16,
    /// Base URL of the auth service exposing `POST /auth/introspect`.
    pub auth_service_url: String,
    pub email_adapter_url: String,
    /// When unset the Slack platform is served by the stub adapter.
    pub slack_adapter_url: Option<String>,
    /// When unset the WhatsApp platform is served by the stub adapter.
    pub whatsapp_adapter_url: Option<String>,
    /// Timeout applied to every back-end adapter request.
    pub upstream_timeout_secs: u64,
    pub introspection_timeout_secs: u64,
    /// Sleep between two iterations of the event stream loop.
    pub sse_heartbeat_secs: u64,
    /// Upper bound on a single blocking audit log read inside the event stream.
    pub audit_block_ms: u64,
    /// Approximate number of audit records retained.
    pub audit_max_len: usize,
    pub shutdown_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8005,
            auth_service_url: "http://localhost:8001".to_string(),
            email_adapter_url: "http://localhost:8002".to_string(),
            slack_adapter_url: None,
            whatsapp_adapter_url: None,
            upstream_timeout_secs: 20,
            introspection_timeout_secs: 10,
            sse_heartbeat_secs: 5,
            audit_block_ms: 1000,
            audit_max_len: 5000,
            shutdown_timeout_secs: 5,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// [`Config::default`] for anything unset.
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parse_or("PORT", defaults.port)?,
            auth_service_url: env::var("AUTH_SERVICE_URL").unwrap_or(defaults.auth_service_url),
            email_adapter_url: env::var("EMAIL_ADAPTER_URL")
                .unwrap_or(defaults.email_adapter_url),
            slack_adapter_url: non_empty("SLACK_ADAPTER_URL"),
            whatsapp_adapter_url: non_empty("WHATSAPP_ADAPTER_URL"),
            upstream_timeout_secs: parse_or("UPSTREAM_TIMEOUT_SECS", defaults.upstream_timeout_secs)?,
            introspection_timeout_secs: parse_or(
                "INTROSPECTION_TIMEOUT_SECS",
                defaults.introspection_timeout_secs,
            )?,
            sse_heartbeat_secs: parse_or("MCP_SSE_HEARTBEAT_SECONDS", defaults.sse_heartbeat_secs)?,
            audit_block_ms: parse_or("AUDIT_BLOCK_MS", defaults.audit_block_ms)?,
            audit_max_len: parse_or("AUDIT_LOG_MAX_LEN", defaults.audit_max_len)?,
            shutdown_timeout_secs: parse_or("SHUTDOWN_TIMEOUT", defaults.shutdown_timeout_secs)?,
        })
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    pub fn introspection_timeout(&self) -> Duration {
        Duration::from_secs(self.introspection_timeout_secs)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.sse_heartbeat_secs)
    }

    pub fn audit_block(&self) -> Duration {
        Duration::from_millis(self.audit_block_ms)
    }
}

fn parse_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", key, e)),
        Err(_) => Ok(default),
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}
