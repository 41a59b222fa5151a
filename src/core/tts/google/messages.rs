//! Wire types for the Cloud Text-to-Speech REST API and the OAuth2 token
//! endpoint.

use serde::{Deserialize, Serialize};

use super::config::{GoogleAudioEncoding, SsmlGender};

// =============================================================================
// text:synthesize
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesizeRequest<'a> {
    pub input: SynthesisInput<'a>,
    pub voice: VoiceSelectionParams<'a>,
    pub audio_config: AudioConfig,
}

#[derive(Debug, Serialize)]
pub struct SynthesisInput<'a> {
    pub text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceSelectionParams<'a> {
    pub language_code: &'a str,
    pub name: &'a str,
    pub ssml_gender: SsmlGender,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioConfig {
    pub audio_encoding: GoogleAudioEncoding,
    pub speaking_rate: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesizeResponse {
    /// Base64-encoded audio in the requested encoding.
    #[serde(default)]
    pub audio_content: Option<String>,
}

// =============================================================================
// voices
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ListVoicesResponse {
    #[serde(default)]
    pub voices: Vec<GoogleVoice>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleVoice {
    #[serde(default)]
    pub language_codes: Vec<String>,
    pub name: String,
    #[serde(default)]
    pub ssml_gender: Option<String>,
}

// =============================================================================
// Errors and tokens
// =============================================================================

/// Error envelope returned by Google APIs.
#[derive(Debug, Deserialize)]
pub struct GoogleErrorResponse {
    pub error: GoogleErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct GoogleErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Error envelope returned by the OAuth2 token endpoint.
#[derive(Debug, Deserialize)]
pub struct TokenErrorResponse {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

#[derive(Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_synthesize_request_shape() {
        let request = SynthesizeRequest {
            input: SynthesisInput { text: "hello" },
            voice: VoiceSelectionParams {
                language_code: "en-US",
                name: "en-US-Chirp3-HD-Charon",
                ssml_gender: SsmlGender::Neutral,
            },
            audio_config: AudioConfig {
                audio_encoding: GoogleAudioEncoding::Mp3,
                speaking_rate: 1.5,
            },
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "input": {"text": "hello"},
                "voice": {
                    "languageCode": "en-US",
                    "name": "en-US-Chirp3-HD-Charon",
                    "ssmlGender": "NEUTRAL"
                },
                "audioConfig": {"audioEncoding": "MP3", "speakingRate": 1.5}
            })
        );
    }

    #[test]
    fn test_voices_response_tolerates_missing_fields() {
        let response: ListVoicesResponse = serde_json::from_value(json!({
            "voices": [
                {"languageCodes": ["en-US"], "name": "en-US-Standard-A", "ssmlGender": "FEMALE"},
                {"name": "xx-XX-Odd-A"}
            ]
        }))
        .unwrap();
        assert_eq!(response.voices.len(), 2);
        assert!(response.voices[1].language_codes.is_empty());
        assert!(response.voices[1].ssml_gender.is_none());

        let empty: ListVoicesResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.voices.is_empty());
    }
}
