use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::ServerConfig;
use crate::core::gateway::SynthesisGateway;
use crate::core::rate_limit::RateLimiter;
use crate::core::session::SessionStore;
use crate::core::tts::{GoogleTTS, ProviderResult, SpeechProvider};
use crate::core::voices::VoiceCatalog;

/// How often idle rate-limit windows and sessions are swept.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(30);

/// Shared state for all handlers.
pub struct AppState {
    pub config: ServerConfig,
    pub sessions: SessionStore,
    pub gateway: SynthesisGateway,
    pub voices: VoiceCatalog,
    shutdown: CancellationToken,
}

impl AppState {
    /// Build state backed by Google Cloud Text-to-Speech at the configured base URL.
    pub fn new(config: ServerConfig) -> ProviderResult<Arc<Self>> {
        let provider = GoogleTTS::with_base_url(config.google_tts_base_url.clone())?;
        Ok(Self::with_provider(config, Arc::new(provider)))
    }

    /// Build state around any speech provider.
    pub fn with_provider(config: ServerConfig, provider: Arc<dyn SpeechProvider>) -> Arc<Self> {
        let limiter = RateLimiter::new(config.rate_limit_requests, config.rate_limit_window());
        let gateway = SynthesisGateway::new(
            limiter,
            provider,
            config.max_text_length,
            config.synthesis_timeout(),
        );
        let sessions = SessionStore::new(
            config.session_idle_timeout(),
            config.credential_policy(),
            config.history_limit,
        );
        let voices = VoiceCatalog::new(config.cache_ttl());

        Arc::new(Self {
            config,
            sessions,
            gateway,
            voices,
            shutdown: CancellationToken::new(),
        })
    }

    /// Remove expired rate-limit windows and idle sessions.
    pub fn sweep(&self) -> (usize, usize) {
        let windows = self.gateway.limiter().evict_idle();
        let sessions = self.sessions.evict_idle();
        if windows > 0 || sessions > 0 {
            tracing::debug!(windows, sessions, "Swept idle state");
        }
        (windows, sessions)
    }

    /// Run [`sweep`](Self::sweep) every `interval` until [`shutdown`](Self::shutdown).
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let state = Arc::clone(self);
        let token = self.shutdown.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        state.sweep();
                    }
                }
            }
            tracing::debug!("Sweeper stopped");
        })
    }

    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}
