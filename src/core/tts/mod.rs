mod base;
pub mod google;

pub use base::{
    DEFAULT_LANGUAGE, DEFAULT_SPEED, DEFAULT_VOICE, MAX_SPEED, MIN_SPEED, ProviderError,
    ProviderResult, SpeechProvider, SynthesisRequest, Voice,
};
pub use google::{GOOGLE_TTS_URL, GoogleTTS, VoiceName};
