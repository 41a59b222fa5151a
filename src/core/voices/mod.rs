//! Voice listings per credential, cached for `CACHE_TTL`.

mod languages;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::Serialize;
use xxhash_rust::xxh3::xxh3_128;

use crate::core::credentials::Credential;
use crate::core::tts::{ProviderResult, SpeechProvider, Voice, VoiceName};

pub use languages::{LanguageOption, language_display_name, language_options};

/// Upper bound on distinct service accounts with a cached voice list.
const MAX_CACHED_ACCOUNTS: u64 = 1_000;

/// A voice as presented to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoiceOption {
    pub name: String,
    pub language_code: String,
    pub gender: String,
    /// Model family parsed from the name, e.g. `Chirp3`.
    pub audio_type: Option<String>,
}

impl From<&Voice> for VoiceOption {
    fn from(voice: &Voice) -> Self {
        Self {
            name: voice.name.clone(),
            language_code: voice.language_code.clone(),
            gender: voice.gender.clone(),
            audio_type: VoiceName::parse(&voice.name).map(|parsed| parsed.audio_type),
        }
    }
}

/// Cache key for a credential: the account identity, never the key material.
fn credential_cache_key(credential: &Credential) -> String {
    let mut s = String::with_capacity(128);
    s.push_str(credential.client_email());
    s.push('|');
    s.push_str(credential.project_id());
    let hash = xxh3_128(s.as_bytes());
    format!("{hash:032x}")
}

pub struct VoiceCatalog {
    cache: Cache<String, Arc<Vec<Voice>>>,
}

impl VoiceCatalog {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(MAX_CACHED_ACCOUNTS)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Voices for `credential`, fetched from `provider` on a cache miss.
    ///
    /// Concurrent misses for the same account share one upstream call.
    /// Failures are not cached.
    pub async fn voices(
        &self,
        provider: &dyn SpeechProvider,
        credential: &Credential,
    ) -> ProviderResult<Arc<Vec<Voice>>> {
        let key = credential_cache_key(credential);
        self.cache
            .try_get_with(key, async {
                tracing::info!(
                    provider = provider.name(),
                    client_email = %credential.client_email(),
                    "Fetching voice list"
                );
                provider.list_voices(credential).await.map(Arc::new)
            })
            .await
            .map_err(|e| (*e).clone())
    }

    /// Voices for `credential`, optionally restricted to one language code.
    pub async fn voice_options(
        &self,
        provider: &dyn SpeechProvider,
        credential: &Credential,
        language: Option<&str>,
    ) -> ProviderResult<Vec<VoiceOption>> {
        let voices = self.voices(provider, credential).await?;
        let mut options: Vec<VoiceOption> = voices
            .iter()
            .filter(|voice| language.is_none_or(|code| voice.language_code == code))
            .map(VoiceOption::from)
            .collect();
        options.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(options)
    }

    /// Languages that have at least one voice for `credential`.
    pub async fn languages(
        &self,
        provider: &dyn SpeechProvider,
        credential: &Credential,
    ) -> ProviderResult<Vec<LanguageOption>> {
        let voices = self.voices(provider, credential).await?;
        Ok(language_options(
            voices.iter().map(|voice| voice.language_code.as_str()),
        ))
    }

    /// Forget the cached list for `credential`'s account.
    pub async fn invalidate(&self, credential: &Credential) {
        self.cache.invalidate(&credential_cache_key(credential)).await;
    }
}
