//! Google Cloud Text-to-Speech provider.
//!
//! Authenticates with the session's uploaded service account (JWT bearer
//! grant against the key's `token_uri`) and speaks the v1 REST API.
//!
//! # API Reference
//!
//! - Synthesis: `POST https://texttospeech.googleapis.com/v1/text:synthesize`
//! - Voice list: `GET https://texttospeech.googleapis.com/v1/voices`

pub mod auth;
pub mod config;
pub mod messages;
pub mod provider;

pub use auth::GOOGLE_CLOUD_PLATFORM_SCOPE;
pub use config::{GoogleAudioEncoding, SsmlGender, VoiceName};
pub use provider::GoogleTTS;

/// Root of the Cloud Text-to-Speech REST API.
pub const GOOGLE_TTS_URL: &str = "https://texttospeech.googleapis.com";
