//! Google Cloud Text-to-Speech over REST.
//!
//! Each call mints an access token from the caller's service account, then
//! hits the v1 REST surface:
//! - `POST {base}/v1/text:synthesize` returns base64 `audioContent`
//! - `GET {base}/v1/voices` lists voices with their language codes

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use reqwest::redirect::Policy;
use reqwest::{Client, Response};
use tracing::{debug, warn};

use super::GOOGLE_TTS_URL;
use super::auth::fetch_access_token;
use super::config::{GoogleAudioEncoding, SsmlGender};
use super::messages::{
    AudioConfig, GoogleErrorResponse, ListVoicesResponse, SynthesisInput, SynthesizeRequest,
    SynthesizeResponse, VoiceSelectionParams,
};
use crate::core::credentials::Credential;
use crate::core::tts::base::{
    ProviderError, ProviderResult, SpeechProvider, SynthesisRequest, Voice,
};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Gender reported for voices that omit it.
const UNSPECIFIED_GENDER: &str = "SSML_VOICE_GENDER_UNSPECIFIED";

pub struct GoogleTTS {
    client: Client,
    base_url: String,
}

impl GoogleTTS {
    pub fn new() -> ProviderResult<Self> {
        Self::with_base_url(GOOGLE_TTS_URL)
    }

    /// Point the provider at another API root, e.g. a regional endpoint or a
    /// mock server.
    pub fn with_base_url(base_url: impl Into<String>) -> ProviderResult<Self> {
        // Redirects would carry the signed assertion past the token_uri check
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .redirect(Policy::none())
            .build()
            .map_err(|e| ProviderError::Transient(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Turn a non-success response into a classified error, preferring the
/// message from Google's error envelope.
async fn error_from_response(response: Response) -> ProviderError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let detail = match serde_json::from_str::<GoogleErrorResponse>(&body) {
        Ok(envelope) => match envelope.error.status {
            Some(code) => format!("{code}: {}", envelope.error.message),
            None => envelope.error.message,
        },
        Err(_) => format!("HTTP {status}"),
    };
    ProviderError::from_status(status, detail)
}

#[async_trait]
impl SpeechProvider for GoogleTTS {
    fn name(&self) -> &'static str {
        "google"
    }

    async fn synthesize(
        &self,
        request: &SynthesisRequest,
        credential: &Credential,
    ) -> ProviderResult<Bytes> {
        let token = fetch_access_token(&self.client, credential).await?;

        let body = SynthesizeRequest {
            input: SynthesisInput {
                text: &request.text,
            },
            voice: VoiceSelectionParams {
                language_code: &request.language,
                name: &request.voice,
                ssml_gender: SsmlGender::Neutral,
            },
            audio_config: AudioConfig {
                audio_encoding: GoogleAudioEncoding::Mp3,
                speaking_rate: request.speed,
            },
        };

        let response = self
            .client
            .post(format!("{}/v1/text:synthesize", self.base_url))
            .bearer_auth(token.as_str())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let err = error_from_response(response).await;
            warn!(kind = err.kind(), error = %err, "Google synthesis rejected");
            return Err(err);
        }

        let payload: SynthesizeResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        let encoded = payload
            .audio_content
            .filter(|content| !content.is_empty())
            .ok_or_else(|| ProviderError::InvalidResponse("response has no audioContent".into()))?;
        let audio = STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| ProviderError::InvalidResponse(format!("audioContent: {e}")))?;

        debug!(
            bytes = audio.len(),
            voice = %request.voice,
            "Google synthesis completed"
        );
        Ok(Bytes::from(audio))
    }

    async fn list_voices(&self, credential: &Credential) -> ProviderResult<Vec<Voice>> {
        let token = fetch_access_token(&self.client, credential).await?;

        let response = self
            .client
            .get(format!("{}/v1/voices", self.base_url))
            .bearer_auth(token.as_str())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let payload: ListVoicesResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        let voices = payload
            .voices
            .into_iter()
            .flat_map(|voice| {
                let gender = voice
                    .ssml_gender
                    .unwrap_or_else(|| UNSPECIFIED_GENDER.to_string());
                voice
                    .language_codes
                    .into_iter()
                    .map(move |language_code| Voice {
                        name: voice.name.clone(),
                        language_code,
                        gender: gender.clone(),
                    })
            })
            .collect::<Vec<_>>();

        debug!(count = voices.len(), "Fetched Google voices");
        Ok(voices)
    }
}
