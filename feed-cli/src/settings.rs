use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use feed_client::HttpConfig;

pub(crate) const DEFAULT_HTTP_URL: &str = "http://127.0.0.1:3000";
const DEFAULT_TOKEN_FILE: &str = ".feed_token";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub(crate) http_url: String,
    pub(crate) token_file: String,
    pub(crate) log_level: String,
    pub(crate) http_timeout_secs: u64,
    pub(crate) connect_timeout_secs: u64,
}

impl Settings {
    pub(crate) fn from_env() -> Result<Self> {
        let http_url = non_blank_env("FEED_HTTP_URL").unwrap_or_else(|| DEFAULT_HTTP_URL.to_string());
        let token_file =
            non_blank_env("FEED_TOKEN_FILE").unwrap_or_else(|| DEFAULT_TOKEN_FILE.to_string());
        let log_level = resolve_log_level(non_blank_env("LOG_LEVEL"), non_blank_env("RUST_LOG"));
        let http_timeout_secs = parse_u64_env("FEED_HTTP_TIMEOUT_SECS", 15)?;
        let connect_timeout_secs = parse_u64_env("FEED_CONNECT_TIMEOUT_SECS", 5)?;

        Ok(Self {
            http_url,
            token_file,
            log_level,
            http_timeout_secs,
            connect_timeout_secs,
        })
    }

    /// HTTP-конфигурация клиента; `server` из флага `--server` важнее env.
    pub(crate) fn http_config(&self, server: Option<String>) -> HttpConfig {
        let base_url = normalize_server(server.unwrap_or_else(|| self.http_url.clone()));
        HttpConfig {
            base_url,
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.http_timeout_secs),
        }
    }
}

fn non_blank_env(key: &str) -> Option<String> {
    let value = std::env::var(key).ok()?;
    let value = value.trim().to_string();
    if value.is_empty() {
        return None;
    }
    Some(value)
}

/// `LOG_LEVEL` важнее `RUST_LOG`; без обоих `info`.
fn resolve_log_level(log_level: Option<String>, rust_log: Option<String>) -> String {
    log_level
        .or(rust_log)
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
}

fn parse_u64_env(key: &str, default: u64) -> Result<u64> {
    let raw = std::env::var(key).unwrap_or_else(|_| default.to_string());
    parse_positive(key, &raw)
}

fn parse_positive(key: &str, raw: &str) -> Result<u64> {
    let value = raw
        .trim()
        .parse::<u64>()
        .with_context(|| format!("Failed to parse {key}, expecting positive integer"))?;

    if value == 0 {
        return Err(anyhow!("{key} must be > 0"));
    }
    Ok(value)
}

pub(crate) fn normalize_server(server: String) -> String {
    if server.starts_with("http://") || server.starts_with("https://") {
        return server;
    }

    format!("http://{server}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings {
            http_url: DEFAULT_HTTP_URL.to_string(),
            token_file: DEFAULT_TOKEN_FILE.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            http_timeout_secs: 15,
            connect_timeout_secs: 5,
        }
    }

    #[test]
    fn normalize_server_keeps_scheme() {
        let s = normalize_server("https://example.com:8080".to_string());
        assert_eq!(s, "https://example.com:8080");
    }

    #[test]
    fn normalize_server_adds_http_scheme() {
        let s = normalize_server("127.0.0.1:3000".to_string());
        assert_eq!(s, "http://127.0.0.1:3000");
    }

    #[test]
    fn http_config_prefers_flag_over_env_value() {
        let config = settings().http_config(Some("localhost:9999".to_string()));
        assert_eq!(config.base_url, "http://localhost:9999");
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
    }

    #[test]
    fn http_config_defaults_to_settings_url() {
        let config = settings().http_config(None);
        assert_eq!(config.base_url, DEFAULT_HTTP_URL);
    }

    #[test]
    fn log_level_defaults_to_info() {
        assert_eq!(resolve_log_level(None, None), "info");
        assert_eq!(resolve_log_level(None, Some("debug".to_string())), "debug");
        assert_eq!(
            resolve_log_level(Some("warn".to_string()), Some("debug".to_string())),
            "warn"
        );
    }

    #[test]
    fn parse_positive_rejects_zero_and_garbage() {
        assert!(parse_positive("X", "0").is_err());
        assert!(parse_positive("X", "ten").is_err());
        assert_eq!(parse_positive("X", " 7 ").expect("valid"), 7);
    }
}
