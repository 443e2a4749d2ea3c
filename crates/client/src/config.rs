// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;

/// Configuration for the payroll API client.
#[derive(Clone, clap::Args)]
pub struct ClientConfig {
    /// Base URL of the payroll API (all endpoint paths are relative to it).
    #[arg(long, default_value = "http://127.0.0.1:8000/api/v1", env = "DESTAJO_API_URL")]
    pub api_url: String,

    /// Transport timeout in milliseconds (applies to every call, renewal included).
    #[arg(long, default_value_t = 30000, env = "DESTAJO_TIMEOUT_MS")]
    pub timeout_ms: u64,

    /// Value sent in the `X-Client-Type` header.
    #[arg(long, default_value = "web", env = "DESTAJO_CLIENT_TYPE")]
    pub client_type: String,

    /// Username for signing in when no session can be restored.
    #[arg(long, env = "DESTAJO_USERNAME")]
    pub username: Option<String>,

    /// Password for signing in when no session can be restored.
    #[arg(long, env = "DESTAJO_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Log filter (tracing `EnvFilter` syntax).
    #[arg(long, default_value = "info", env = "DESTAJO_LOG_LEVEL")]
    pub log_level: String,

    /// Log output format: `text` or `json`.
    #[arg(long, default_value = "text", env = "DESTAJO_LOG_FORMAT")]
    pub log_format: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8000/api/v1".to_owned(),
            timeout_ms: 30000,
            client_type: "web".to_owned(),
            username: None,
            password: None,
            log_level: "info".to_owned(),
            log_format: "text".to_owned(),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_url", &self.api_url)
            .field("timeout_ms", &self.timeout_ms)
            .field("client_type", &self.client_type)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| ".."))
            .field("log_level", &self.log_level)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl ClientConfig {
    /// Config pointing at `api_url` with every other field defaulted.
    pub fn for_url(api_url: impl Into<String>) -> Self {
        Self { api_url: api_url.into(), ..Self::default() }
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_ms)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            anyhow::bail!("api url must start with http:// or https://: {}", self.api_url);
        }
        if self.timeout_ms == 0 {
            anyhow::bail!("timeout must be greater than zero");
        }
        match self.log_format.as_str() {
            "text" | "json" => Ok(()),
            other => anyhow::bail!("unknown log format: {other}"),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
