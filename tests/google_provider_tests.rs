//! Google provider against a mock token endpoint and TTS API.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fourier_gateway::core::credentials::{Credential, CredentialPolicy};
use fourier_gateway::core::tts::{GoogleTTS, ProviderError, SpeechProvider, SynthesisRequest};

const FIXTURE: &str = include_str!("fixtures/service_account.json");
const ACCESS_TOKEN: &str = "ya29.test-access-token";

/// Fixture credential whose `token_uri` points at the mock server.
fn credential_for(server: &MockServer) -> Credential {
    let mut value: Value = serde_json::from_str(FIXTURE).unwrap();
    value["token_uri"] = json!(format!("{}/token", server.uri()));
    let policy = CredentialPolicy {
        allow_insecure_endpoints: true,
        ..Default::default()
    };
    Credential::from_json(value.to_string().as_bytes(), &policy).unwrap()
}

async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains(
            "grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer",
        ))
        .and(body_string_contains("assertion="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": ACCESS_TOKEN,
            "expires_in": 3599,
            "token_type": "Bearer"
        })))
        .mount(server)
        .await;
}

fn provider_for(server: &MockServer) -> GoogleTTS {
    GoogleTTS::with_base_url(format!("{}/", server.uri())).unwrap()
}

async fn synthesize_with_status(status: u16, body: Value) -> ProviderError {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("POST"))
        .and(path("/v1/text:synthesize"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(&server)
        .await;

    provider_for(&server)
        .synthesize(&SynthesisRequest::new("hello"), &credential_for(&server))
        .await
        .unwrap_err()
}

#[tokio::test]
async fn test_synthesize_success() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    let audio = b"ID3\x04fake-mp3-frames";
    Mock::given(method("POST"))
        .and(path("/v1/text:synthesize"))
        .and(header("authorization", format!("Bearer {ACCESS_TOKEN}").as_str()))
        .and(body_partial_json(json!({
            "input": {"text": "Bonjour"},
            "voice": {"languageCode": "fr-FR", "name": "fr-FR-Neural2-A"},
            "audioConfig": {"audioEncoding": "MP3", "speakingRate": 1.5}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "audioContent": STANDARD.encode(audio)
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = SynthesisRequest::new("Bonjour")
        .with_voice("fr-FR", "fr-FR-Neural2-A")
        .with_speed(1.5);
    let bytes = provider_for(&server)
        .synthesize(&request, &credential_for(&server))
        .await
        .unwrap();

    assert_eq!(bytes.as_ref(), audio);
}

#[tokio::test]
async fn test_fresh_token_per_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": ACCESS_TOKEN,
            "expires_in": 3599
        })))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/text:synthesize"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "audioContent": STANDARD.encode(b"audio")
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let credential = credential_for(&server);
    for _ in 0..2 {
        provider
            .synthesize(&SynthesisRequest::new("hello"), &credential)
            .await
            .unwrap();
    }
    // `expect(2)` is verified when the server drops
}

#[tokio::test]
async fn test_missing_audio_content_is_invalid_response() {
    let err = synthesize_with_status(200, json!({})).await;
    assert!(matches!(err, ProviderError::InvalidResponse(_)), "{err:?}");

    let err = synthesize_with_status(200, json!({"audioContent": "%%% not base64"})).await;
    assert!(matches!(err, ProviderError::InvalidResponse(_)), "{err:?}");
}

#[tokio::test]
async fn test_upstream_status_classification() {
    let envelope = |code: u16, status: &str| {
        json!({"error": {"code": code, "message": "upstream said no", "status": status}})
    };

    let err = synthesize_with_status(401, envelope(401, "UNAUTHENTICATED")).await;
    assert_eq!(
        err,
        ProviderError::Auth("UNAUTHENTICATED: upstream said no".into())
    );
    assert!(!err.is_retryable());

    let err = synthesize_with_status(429, envelope(429, "RESOURCE_EXHAUSTED")).await;
    assert!(matches!(err, ProviderError::Quota(_)));
    assert!(err.is_retryable());

    let err = synthesize_with_status(500, envelope(500, "INTERNAL")).await;
    assert!(matches!(err, ProviderError::Transient(_)));
    assert!(err.is_retryable());

    let err = synthesize_with_status(400, envelope(400, "INVALID_ARGUMENT")).await;
    assert!(matches!(err, ProviderError::InvalidRequest(_)));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_rejected_grant_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid JWT Signature."
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/text:synthesize"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = provider_for(&server)
        .synthesize(&SynthesisRequest::new("hello"), &credential_for(&server))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ProviderError::Auth("invalid_grant: Invalid JWT Signature.".into())
    );
}

#[tokio::test]
async fn test_token_endpoint_redirect_is_not_followed() {
    let server = MockServer::start().await;
    let elsewhere = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(307)
                .insert_header("location", format!("{}/internal", elsewhere.uri()).as_str()),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": ACCESS_TOKEN,
            "expires_in": 3599,
            "token_type": "Bearer"
        })))
        .expect(0)
        .mount(&elsewhere)
        .await;

    let err = provider_for(&server)
        .synthesize(&SynthesisRequest::new("hello"), &credential_for(&server))
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Auth(_)), "{err:?}");
    assert!(elsewhere.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_token_endpoint_outage_is_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = provider_for(&server)
        .list_voices(&credential_for(&server))
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Transient(_)), "{err:?}");
}

#[tokio::test]
async fn test_list_voices_flattens_language_codes() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/v1/voices"))
        .and(header("authorization", format!("Bearer {ACCESS_TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "voices": [
                {
                    "languageCodes": ["en-US"],
                    "name": "en-US-Chirp3-HD-Charon",
                    "ssmlGender": "MALE",
                    "naturalSampleRateHertz": 24000
                },
                {
                    "languageCodes": ["es-ES", "es-US"],
                    "name": "es-ES-Polyglot-1",
                    "naturalSampleRateHertz": 24000
                }
            ]
        })))
        .mount(&server)
        .await;

    let voices = provider_for(&server)
        .list_voices(&credential_for(&server))
        .await
        .unwrap();

    let flat: Vec<_> = voices
        .iter()
        .map(|v| (v.name.as_str(), v.language_code.as_str(), v.gender.as_str()))
        .collect();
    assert_eq!(
        flat,
        [
            ("en-US-Chirp3-HD-Charon", "en-US", "MALE"),
            ("es-ES-Polyglot-1", "es-ES", "SSML_VOICE_GENDER_UNSPECIFIED"),
            ("es-ES-Polyglot-1", "es-US", "SSML_VOICE_GENDER_UNSPECIFIED"),
        ]
    );
}
