//! Configuration validation logic.

use super::ServerConfig;

/// Reject settings the gateway cannot run with.
pub(super) fn validate_config(config: &ServerConfig) -> Result<(), String> {
    if config.rate_limit_requests == 0 {
        return Err("RATE_LIMIT_REQUESTS must be greater than 0".to_string());
    }
    if config.rate_limit_window_seconds == 0 {
        return Err("RATE_LIMIT_WINDOW must be greater than 0".to_string());
    }
    if config.max_text_length == 0 {
        return Err("MAX_TEXT_LENGTH must be greater than 0".to_string());
    }
    if config.synthesis_timeout_seconds == 0 {
        return Err("SYNTHESIS_TIMEOUT must be greater than 0".to_string());
    }
    if config.ip_rate_limit_per_second == 0 || config.ip_rate_limit_burst == 0 {
        return Err("IP rate limit and burst must be greater than 0".to_string());
    }
    if config.max_credential_bytes == 0 {
        return Err("MAX_CREDENTIAL_BYTES must be greater than 0".to_string());
    }
    url::Url::parse(&config.google_tts_base_url)
        .map_err(|e| format!("Invalid GOOGLE_TTS_BASE_URL '{}': {e}", config.google_tts_base_url))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ServerConfig::default()).is_ok());
    }

    #[test]
    fn test_zero_values_rejected() {
        let cases: [(&str, fn(&mut ServerConfig)); 4] = [
            ("RATE_LIMIT_REQUESTS", |c| c.rate_limit_requests = 0),
            ("RATE_LIMIT_WINDOW", |c| c.rate_limit_window_seconds = 0),
            ("MAX_TEXT_LENGTH", |c| c.max_text_length = 0),
            ("SYNTHESIS_TIMEOUT", |c| c.synthesis_timeout_seconds = 0),
        ];
        for (name, mutate) in cases {
            let mut config = ServerConfig::default();
            mutate(&mut config);
            let err = validate_config(&config).unwrap_err();
            assert!(err.contains(name), "{err}");
        }
    }

    #[test]
    fn test_bad_base_url_rejected() {
        let config = ServerConfig {
            google_tts_base_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(validate_config(&config).unwrap_err().contains("GOOGLE_TTS_BASE_URL"));
    }
}
