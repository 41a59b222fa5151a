use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::credentials::Credential;

// =============================================================================
// Defaults and limits
// =============================================================================

pub const DEFAULT_LANGUAGE: &str = "en-US";
pub const DEFAULT_VOICE: &str = "en-US-Chirp3-HD-Charon";
pub const DEFAULT_SPEED: f32 = 1.0;
pub const MIN_SPEED: f32 = 0.25;
pub const MAX_SPEED: f32 = 4.0;

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

fn default_voice() -> String {
    DEFAULT_VOICE.to_string()
}

fn default_speed() -> f32 {
    DEFAULT_SPEED
}

// =============================================================================
// Request / response types
// =============================================================================

/// One synthesis call. Built per request and never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisRequest {
    pub text: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_voice")]
    pub voice: String,
    /// Speaking rate multiplier, 1.0 is normal speed.
    #[serde(default = "default_speed")]
    pub speed: f32,
}

impl SynthesisRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: default_language(),
            voice: default_voice(),
            speed: DEFAULT_SPEED,
        }
    }

    pub fn with_voice(mut self, language: impl Into<String>, voice: impl Into<String>) -> Self {
        self.language = language.into();
        self.voice = voice.into();
        self
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }
}

/// A voice as offered for one language. Multi-language voices appear once per
/// language code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub name: String,
    pub language_code: String,
    pub gender: String,
}

// =============================================================================
// Errors
// =============================================================================

/// Failure reported by, or while talking to, the speech provider.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Authentication rejected: {0}")]
    Auth(String),

    #[error("Provider quota exceeded: {0}")]
    Quota(String),

    #[error("Request rejected by provider: {0}")]
    InvalidRequest(String),

    #[error("Transient provider failure: {0}")]
    Transient(String),

    #[error("Provider did not respond within {0:?}")]
    Timeout(Duration),

    #[error("Unexpected provider response: {0}")]
    InvalidResponse(String),
}

pub type ProviderResult<T> = Result<T, ProviderError>;

impl ProviderError {
    /// Classify a non-success HTTP status from the provider.
    pub fn from_status(status: StatusCode, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Auth(detail),
            StatusCode::TOO_MANY_REQUESTS => Self::Quota(detail),
            StatusCode::REQUEST_TIMEOUT => Self::Transient(detail),
            s if s.is_server_error() => Self::Transient(detail),
            _ => Self::InvalidRequest(detail),
        }
    }

    /// Whether the same call may succeed if the caller tries again later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Quota(_) | Self::Transient(_) | Self::Timeout(_))
    }

    /// Short machine-readable category.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Auth(_) => "auth",
            Self::Quota(_) => "quota",
            Self::InvalidRequest(_) => "invalid_request",
            Self::Transient(_) => "transient",
            Self::Timeout(_) => "timeout",
            Self::InvalidResponse(_) => "invalid_response",
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::from_status(status, err.to_string());
        }
        if err.is_decode() {
            return Self::InvalidResponse(err.to_string());
        }
        // Connect, timeout and body errors never reached a verdict from the provider
        Self::Transient(err.to_string())
    }
}

// =============================================================================
// Provider trait
// =============================================================================

/// External text-to-speech backend.
///
/// Implementations receive the caller's credential for every call and must
/// not keep it, or anything derived from it, past the call.
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Provider name for logs.
    fn name(&self) -> &'static str;

    /// Render `request` to encoded audio bytes.
    async fn synthesize(
        &self,
        request: &SynthesisRequest,
        credential: &Credential,
    ) -> ProviderResult<Bytes>;

    /// Voices available to `credential`.
    async fn list_voices(&self, credential: &Credential) -> ProviderResult<Vec<Voice>>;
}
