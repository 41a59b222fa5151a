//! Environment variable loading.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use super::{ServerConfig, TlsConfig};

/// Read `name` and parse it, treating an unset or blank variable as absent.
pub(super) fn parse_env<T>(name: &str) -> Result<Option<T>, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| format!("Invalid value for {name}: '{value}' ({e})")),
        _ => Ok(None),
    }
}

fn parse_bool_env(name: &str) -> Result<Option<bool>, String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            other => Err(format!("Invalid value for {name}: '{other}' (expected true/false)")),
        },
        _ => Ok(None),
    }
}

fn string_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Build a configuration from defaults overlaid with environment variables.
pub(super) fn load_from_env() -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let mut config = ServerConfig::default();

    if let Some(host) = string_env("HOST") {
        config.host = host;
    }
    if let Some(port) = parse_env("PORT")? {
        config.port = port;
    }

    match (string_env("TLS_CERT_PATH"), string_env("TLS_KEY_PATH")) {
        (Some(cert), Some(key)) => {
            config.tls = Some(TlsConfig {
                cert_path: PathBuf::from(cert),
                key_path: PathBuf::from(key),
            });
        }
        (None, None) => {}
        _ => return Err("TLS_CERT_PATH and TLS_KEY_PATH must be set together".into()),
    }

    if let Some(value) = parse_env("MAX_TEXT_LENGTH")? {
        config.max_text_length = value;
    }
    if let Some(value) = parse_env("SYNTHESIS_TIMEOUT")? {
        config.synthesis_timeout_seconds = value;
    }
    if let Some(value) = string_env("GOOGLE_TTS_BASE_URL") {
        config.google_tts_base_url = value;
    }
    if let Some(value) = parse_env("RATE_LIMIT_REQUESTS")? {
        config.rate_limit_requests = value;
    }
    if let Some(value) = parse_env("RATE_LIMIT_WINDOW")? {
        config.rate_limit_window_seconds = value;
    }
    if let Some(value) = parse_env("IP_RATE_LIMIT_PER_SECOND")? {
        config.ip_rate_limit_per_second = value;
    }
    if let Some(value) = parse_env("IP_RATE_LIMIT_BURST")? {
        config.ip_rate_limit_burst = value;
    }
    if let Some(value) = string_env("CORS_ALLOWED_ORIGINS") {
        config.cors_allowed_origins = Some(value);
    }
    if let Some(value) = parse_bool_env("ALLOW_INSECURE_ENDPOINTS")? {
        config.allow_insecure_endpoints = value;
    }
    if let Some(value) = parse_env("CACHE_TTL")? {
        config.cache_ttl_seconds = value;
    }
    if let Some(value) = parse_env("SESSION_IDLE_TIMEOUT")? {
        config.session_idle_timeout_seconds = value;
    }
    if let Some(value) = parse_env("HISTORY_LIMIT")? {
        config.history_limit = value;
    }
    if let Some(value) = parse_env("MAX_CREDENTIAL_BYTES")? {
        config.max_credential_bytes = value;
    }

    Ok(config)
}
