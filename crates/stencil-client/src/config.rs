//! Client configuration loaded from environment variables.

use std::time::Duration;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the backend API; `/templates/...` is appended.
    /// Env: `STENCIL_API_URL`
    /// Default: `http://127.0.0.1:8000/api`
    pub api_url: String,

    /// Base URL that server-relative artifact references resolve against.
    /// Env: `STENCIL_MEDIA_URL`
    /// Default: `http://127.0.0.1:8000`
    pub media_url: String,

    /// Delay between polls while watching a job.
    /// Env: `STENCIL_POLL_INTERVAL_MS`
    /// Default: `2000`
    pub poll_interval: Duration,

    /// Maximum number of polls before giving up on a job.
    /// Env: `STENCIL_MAX_POLLS`
    /// Default: `60`
    pub max_polls: u32,

    /// Connect timeout for the HTTP transport. No timeout when unset.
    /// Env: `STENCIL_CONNECT_TIMEOUT_SECS`
    pub connect_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8000/api".to_string(),
            media_url: "http://127.0.0.1:8000".to_string(),
            poll_interval: Duration::from_millis(2000),
            max_polls: 60,
            connect_timeout: None,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("STENCIL_API_URL") {
            config.api_url = url;
        }

        if let Some(url) = lookup("STENCIL_MEDIA_URL") {
            config.media_url = url;
        }

        if let Some(val) = lookup("STENCIL_POLL_INTERVAL_MS") {
            match val.parse::<u64>() {
                Ok(ms) if ms > 0 => config.poll_interval = Duration::from_millis(ms),
                _ => tracing::warn!(value = %val, "Invalid STENCIL_POLL_INTERVAL_MS, using default"),
            }
        }

        if let Some(val) = lookup("STENCIL_MAX_POLLS") {
            match val.parse::<u32>() {
                Ok(n) if n > 0 => config.max_polls = n,
                _ => tracing::warn!(value = %val, "Invalid STENCIL_MAX_POLLS, using default"),
            }
        }

        if let Some(val) = lookup("STENCIL_CONNECT_TIMEOUT_SECS") {
            match val.parse::<u64>() {
                Ok(secs) if secs > 0 => config.connect_timeout = Some(Duration::from_secs(secs)),
                _ => tracing::warn!(value = %val, "Invalid STENCIL_CONNECT_TIMEOUT_SECS, ignoring"),
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_lookup(|_| None);
        assert_eq!(config.api_url, "http://127.0.0.1:8000/api");
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.max_polls, 60);
        assert!(config.connect_timeout.is_none());
    }

    #[test]
    fn test_overrides_and_bad_values() {
        let config = ClientConfig::from_lookup(|key| match key {
            "STENCIL_API_URL" => Some("https://stencil.example/api".into()),
            "STENCIL_POLL_INTERVAL_MS" => Some("fast".into()),
            "STENCIL_MAX_POLLS" => Some("5".into()),
            "STENCIL_CONNECT_TIMEOUT_SECS" => Some("3".into()),
            _ => None,
        });
        assert_eq!(config.api_url, "https://stencil.example/api");
        assert_eq!(config.poll_interval, Duration::from_millis(2000));
        assert_eq!(config.max_polls, 5);
        assert_eq!(config.connect_timeout, Some(Duration::from_secs(3)));
    }
}
