//! Merging YAML overrides onto the environment-derived configuration.

use std::path::PathBuf;

use super::yaml::YamlConfig;
use super::{ServerConfig, TlsConfig, env};

/// Load the environment configuration and apply any YAML values on top.
pub(super) fn merge_config(
    yaml: Option<YamlConfig>,
) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let mut config = env::load_from_env()?;
    let Some(yaml) = yaml else {
        return Ok(config);
    };

    if let Some(server) = yaml.server {
        if let Some(host) = server.host {
            config.host = host;
        }
        if let Some(port) = server.port {
            config.port = port;
        }
        if let Some(tls) = server.tls {
            if tls.enabled == Some(false) {
                config.tls = None;
            } else {
                match (tls.cert_path, tls.key_path) {
                    (Some(cert), Some(key)) => {
                        config.tls = Some(TlsConfig {
                            cert_path: PathBuf::from(cert),
                            key_path: PathBuf::from(key),
                        });
                    }
                    (None, None) if tls.enabled.is_none() => {}
                    _ => {
                        return Err(
                            "server.tls requires both cert_path and key_path when enabled".into(),
                        );
                    }
                }
            }
        }
    }

    if let Some(synthesis) = yaml.synthesis {
        if let Some(value) = synthesis.max_text_length {
            config.max_text_length = value;
        }
        if let Some(value) = synthesis.timeout_seconds {
            config.synthesis_timeout_seconds = value;
        }
        if let Some(value) = synthesis.google_base_url {
            config.google_tts_base_url = value;
        }
    }

    if let Some(rate_limit) = yaml.rate_limit {
        if let Some(value) = rate_limit.requests {
            config.rate_limit_requests = value;
        }
        if let Some(value) = rate_limit.window_seconds {
            config.rate_limit_window_seconds = value;
        }
    }

    if let Some(security) = yaml.security {
        if let Some(value) = security.ip_rate_limit_per_second {
            config.ip_rate_limit_per_second = value;
        }
        if let Some(value) = security.ip_rate_limit_burst {
            config.ip_rate_limit_burst = value;
        }
        if let Some(value) = security.cors_allowed_origins {
            config.cors_allowed_origins = Some(value);
        }
        if let Some(value) = security.allow_insecure_endpoints {
            config.allow_insecure_endpoints = value;
        }
    }

    if let Some(value) = yaml.cache.and_then(|cache| cache.ttl_seconds) {
        config.cache_ttl_seconds = value;
    }

    if let Some(session) = yaml.session {
        if let Some(value) = session.idle_timeout_seconds {
            config.session_idle_timeout_seconds = value;
        }
        if let Some(value) = session.history_limit {
            config.history_limit = value;
        }
        if let Some(value) = session.max_credential_bytes {
            config.max_credential_bytes = value;
        }
    }

    Ok(config)
}
