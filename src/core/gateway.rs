//! The single entry point for speech synthesis.
//!
//! Checks run in a fixed order and stop at the first failure:
//! 1. input validation (never counted, never reaches the provider)
//! 2. per-caller rate limit
//! 3. credential presence
//! 4. provider call, bounded by the synthesis timeout
//!
//! Audio comes back exactly as the provider produced it. Nothing is cached
//! or retried here.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use thiserror::Error;
use tracing::{info, warn};

use crate::core::credentials::CredentialHolder;
use crate::core::rate_limit::{CallerKey, RateLimitDecision, RateLimiter};
use crate::core::tts::{MAX_SPEED, MIN_SPEED, ProviderError, SpeechProvider, SynthesisRequest};

pub const DEFAULT_MAX_TEXT_LENGTH: usize = 5000;
pub const DEFAULT_SYNTHESIS_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Rate limit exceeded, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("No service account credential configured for this session")]
    NoCredential,

    #[error("Speech provider error: {0}")]
    Upstream(#[from] ProviderError),
}

impl GatewayError {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. } => true,
            Self::Upstream(err) => err.is_retryable(),
            Self::InvalidInput(_) | Self::NoCredential => false,
        }
    }
}

pub struct SynthesisGateway {
    limiter: RateLimiter,
    provider: Arc<dyn SpeechProvider>,
    max_text_length: usize,
    timeout: Duration,
}

impl SynthesisGateway {
    pub fn new(
        limiter: RateLimiter,
        provider: Arc<dyn SpeechProvider>,
        max_text_length: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            limiter,
            provider,
            max_text_length,
            timeout,
        }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn provider(&self) -> &dyn SpeechProvider {
        self.provider.as_ref()
    }

    pub fn max_text_length(&self) -> usize {
        self.max_text_length
    }

    /// Check a request against the input rules without touching any state.
    pub fn validate(&self, request: &SynthesisRequest) -> Result<(), GatewayError> {
        if request.text.trim().is_empty() {
            return Err(GatewayError::InvalidInput("text must not be empty".into()));
        }
        let length = request.text.chars().count();
        if length > self.max_text_length {
            return Err(GatewayError::InvalidInput(format!(
                "text is {length} characters, limit is {}",
                self.max_text_length
            )));
        }
        if !request.speed.is_finite() || !(MIN_SPEED..=MAX_SPEED).contains(&request.speed) {
            return Err(GatewayError::InvalidInput(format!(
                "speed must be between {MIN_SPEED} and {MAX_SPEED}"
            )));
        }
        if request.language.trim().is_empty() {
            return Err(GatewayError::InvalidInput("language must not be empty".into()));
        }
        if request.voice.trim().is_empty() {
            return Err(GatewayError::InvalidInput("voice must not be empty".into()));
        }
        Ok(())
    }

    /// Synthesize `request` for `caller` using the credential in `credentials`.
    ///
    /// The rate-limit slot is taken before the credential check but handed
    /// back when no credential is present, so a caller who has not uploaded
    /// a key yet does not burn quota. Once the provider has been contacted
    /// the slot stays spent, whatever the outcome.
    pub async fn synthesize(
        &self,
        caller: &CallerKey,
        credentials: &CredentialHolder,
        request: &SynthesisRequest,
    ) -> Result<Bytes, GatewayError> {
        self.validate(request)?;

        let permit = match self.limiter.allow(caller) {
            RateLimitDecision::Allowed(permit) => permit,
            RateLimitDecision::Denied { retry_after } => {
                info!(
                    session = %caller,
                    retry_after_ms = retry_after.as_millis() as u64,
                    "Synthesis rate limited"
                );
                return Err(GatewayError::RateLimited { retry_after });
            }
        };

        let Some(credential) = credentials.get() else {
            self.limiter.refund(permit);
            return Err(GatewayError::NoCredential);
        };

        let result = tokio::time::timeout(
            self.timeout,
            self.provider.synthesize(request, &credential),
        )
        .await
        .unwrap_or(Err(ProviderError::Timeout(self.timeout)));

        match result {
            Ok(audio) => {
                info!(
                    session = %caller,
                    provider = self.provider.name(),
                    bytes = audio.len(),
                    remaining = permit.remaining(),
                    "Synthesis completed"
                );
                Ok(audio)
            }
            Err(err) => {
                warn!(
                    session = %caller,
                    provider = self.provider.name(),
                    kind = err.kind(),
                    retryable = err.is_retryable(),
                    error = %err,
                    "Synthesis failed upstream"
                );
                Err(GatewayError::Upstream(err))
            }
        }
    }
}
