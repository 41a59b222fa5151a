pub mod credentials;
pub mod gateway;
pub mod history;
pub mod rate_limit;
pub mod session;
pub mod tts;
pub mod voices;

pub use credentials::{Credential, CredentialError, CredentialHolder, CredentialPolicy};
pub use gateway::{GatewayError, SynthesisGateway};
pub use history::{History, HistoryEntry, HistorySummary};
pub use rate_limit::{CallerKey, RateLimitDecision, RateLimiter};
pub use session::{Session, SessionStore};
pub use tts::{GoogleTTS, ProviderError, SpeechProvider, SynthesisRequest, Voice};
pub use voices::VoiceCatalog;
