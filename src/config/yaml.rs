use serde::Deserialize;
use std::path::PathBuf;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Values given here
/// override environment variables.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 3001
///   tls:
///     cert_path: "/etc/fourier/cert.pem"
///     key_path: "/etc/fourier/key.pem"
///
/// synthesis:
///   max_text_length: 5000
///   timeout_seconds: 30
///   google_base_url: "https://texttospeech.googleapis.com"
///
/// rate_limit:
///   requests: 10
///   window_seconds: 60
///
/// security:
///   cors_allowed_origins: "https://app.example.com"
///   ip_rate_limit_per_second: 20
///   ip_rate_limit_burst: 40
///
/// cache:
///   ttl_seconds: 3600
///
/// session:
///   idle_timeout_seconds: 1800
///   history_limit: 20
///   max_credential_bytes: 65536
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub synthesis: Option<SynthesisYaml>,
    pub rate_limit: Option<RateLimitYaml>,
    pub security: Option<SecurityYaml>,
    pub cache: Option<CacheYaml>,
    pub session: Option<SessionYaml>,
}

/// Server configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub tls: Option<TlsYaml>,
}

/// TLS configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TlsYaml {
    pub enabled: Option<bool>,
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

/// Synthesis limits and upstream endpoint from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SynthesisYaml {
    pub max_text_length: Option<usize>,
    pub timeout_seconds: Option<u64>,
    pub google_base_url: Option<String>,
}

/// Per-session rate limit from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RateLimitYaml {
    /// Synthesis requests allowed per window
    pub requests: Option<u32>,
    pub window_seconds: Option<u64>,
}

/// Security configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SecurityYaml {
    /// CORS allowed origins (comma-separated list or "*" for all)
    pub cors_allowed_origins: Option<String>,
    /// Maximum requests per second per IP address
    pub ip_rate_limit_per_second: Option<u32>,
    /// Maximum burst size for the per-IP governor
    pub ip_rate_limit_burst: Option<u32>,
    /// Accept plain-HTTP loopback token endpoints (development only)
    pub allow_insecure_endpoints: Option<bool>,
}

/// Cache configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct CacheYaml {
    pub ttl_seconds: Option<u64>,
}

/// Session configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SessionYaml {
    pub idle_timeout_seconds: Option<u64>,
    pub history_limit: Option<usize>,
    pub max_credential_bytes: Option<usize>,
}

impl YamlConfig {
    /// Read and parse a YAML configuration file.
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Cannot read config file {}: {e}", path.display()))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| format!("Invalid YAML in {}: {e}", path.display()).into())
    }
}
