//! Gateway configuration.
//!
//! Values are layered, later layers winning: built-in defaults, `.env`
//! (loaded into the process environment by `main`), real environment
//! variables, then an optional YAML file. The merged result is validated
//! before the server starts.
//!
//! ```rust,no_run
//! use fourier_gateway::config::ServerConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::from_env()?;
//! println!("quota {} per {:?}", config.rate_limit_requests, config.rate_limit_window());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::time::Duration;

mod env;
mod merge;
mod validation;
mod yaml;

pub use yaml::YamlConfig;

use crate::core::credentials::{CredentialPolicy, DEFAULT_MAX_CREDENTIAL_BYTES};
use crate::core::gateway::{DEFAULT_MAX_TEXT_LENGTH, DEFAULT_SYNTHESIS_TIMEOUT};
use crate::core::history::DEFAULT_HISTORY_LIMIT;
use crate::core::session::DEFAULT_SESSION_IDLE_TIMEOUT;
use crate::core::tts::GOOGLE_TTS_URL;

/// PEM certificate chain and private key for serving HTTPS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsConfig {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

/// Everything the gateway needs at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Serve HTTPS when set
    pub tls: Option<TlsConfig>,

    // Synthesis
    /// Maximum characters per synthesis request
    pub max_text_length: usize,
    /// Upper bound on a single provider call, in seconds
    pub synthesis_timeout_seconds: u64,
    /// Root of the Google Cloud Text-to-Speech REST API
    pub google_tts_base_url: String,

    // Per-session rate limiting
    pub rate_limit_requests: u32,
    pub rate_limit_window_seconds: u64,

    // Security settings
    /// Coarse per-IP governor in front of every route
    pub ip_rate_limit_per_second: u32,
    pub ip_rate_limit_burst: u32,
    /// Comma-separated origins, or `*`
    pub cors_allowed_origins: Option<String>,
    /// Accept plain-HTTP loopback token endpoints in uploaded keys.
    /// Development only.
    pub allow_insecure_endpoints: bool,

    // Cache settings
    pub cache_ttl_seconds: u64,

    // Sessions
    pub session_idle_timeout_seconds: u64,
    pub history_limit: usize,
    pub max_credential_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            tls: None,
            max_text_length: DEFAULT_MAX_TEXT_LENGTH,
            synthesis_timeout_seconds: DEFAULT_SYNTHESIS_TIMEOUT.as_secs(),
            google_tts_base_url: GOOGLE_TTS_URL.to_string(),
            rate_limit_requests: 10,
            rate_limit_window_seconds: 60,
            ip_rate_limit_per_second: 20,
            ip_rate_limit_burst: 40,
            cors_allowed_origins: None,
            allow_insecure_endpoints: false,
            cache_ttl_seconds: 3600,
            session_idle_timeout_seconds: DEFAULT_SESSION_IDLE_TIMEOUT.as_secs(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            max_credential_bytes: DEFAULT_MAX_CREDENTIAL_BYTES,
        }
    }
}

impl ServerConfig {
    /// Defaults overlaid with environment variables.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let config = merge::merge_config(None)?;
        validation::validate_config(&config)?;
        Ok(config)
    }

    /// Environment configuration with the YAML file at `path` applied on top.
    ///
    /// Fails when the file is unreadable or malformed, when an environment
    /// variable does not parse, or when the merged values are rejected.
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let yaml_config = yaml::YamlConfig::from_file(path)?;
        let config = merge::merge_config(Some(yaml_config))?;
        validation::validate_config(&config)?;
        Ok(config)
    }

    /// `host:port` to bind.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_tls_enabled(&self) -> bool {
        self.tls.is_some()
    }

    pub fn synthesis_timeout(&self) -> Duration {
        Duration::from_secs(self.synthesis_timeout_seconds)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_seconds)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    pub fn session_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.session_idle_timeout_seconds)
    }

    pub fn credential_policy(&self) -> CredentialPolicy {
        CredentialPolicy {
            max_bytes: self.max_credential_bytes,
            allow_insecure_endpoints: self.allow_insecure_endpoints,
        }
    }
}
