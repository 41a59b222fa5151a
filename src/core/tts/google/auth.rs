//! OAuth2 access tokens for a service account (JWT bearer grant).
//!
//! A fresh token is minted for every provider call and dropped when the call
//! ends, so clearing a session's credential leaves nothing usable behind.

use jsonwebtoken::{Algorithm, Header, encode};
use reqwest::Client;
use serde::Serialize;
use time::OffsetDateTime;
use tracing::debug;
use zeroize::Zeroizing;

use super::messages::{TokenErrorResponse, TokenResponse};
use crate::core::credentials::Credential;
use crate::core::tts::base::{ProviderError, ProviderResult};

/// OAuth2 scope covering Cloud Text-to-Speech.
pub const GOOGLE_CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime requested for the signed assertion, in seconds.
const ASSERTION_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

/// Sign the JWT assertion the token endpoint expects.
pub fn sign_assertion(credential: &Credential, issued_at: i64) -> ProviderResult<Zeroizing<String>> {
    let key = credential
        .signing_key()
        .map_err(|e| ProviderError::Auth(e.to_string()))?;

    let mut header = Header::new(Algorithm::RS256);
    header.typ = Some("JWT".to_string());
    header.kid = Some(credential.private_key_id().to_string());

    let claims = Claims {
        iss: credential.client_email(),
        scope: GOOGLE_CLOUD_PLATFORM_SCOPE,
        aud: credential.token_uri(),
        iat: issued_at,
        exp: issued_at + ASSERTION_LIFETIME_SECS,
    };

    encode(&header, &claims, &key)
        .map(Zeroizing::new)
        .map_err(|e| ProviderError::Auth(format!("Failed to sign token request: {e}")))
}

/// Exchange the credential for a bearer token at its `token_uri`.
pub async fn fetch_access_token(
    client: &Client,
    credential: &Credential,
) -> ProviderResult<Zeroizing<String>> {
    let assertion = sign_assertion(credential, OffsetDateTime::now_utc().unix_timestamp())?;

    let response = client
        .post(credential.token_uri())
        .form(&[
            ("grant_type", JWT_BEARER_GRANT),
            ("assertion", assertion.as_str()),
        ])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<TokenErrorResponse>(&body)
            .map(|e| match e.error_description {
                Some(description) => format!("{}: {description}", e.error),
                None => e.error,
            })
            .unwrap_or_else(|_| format!("token endpoint returned {status}"));

        // Anything the endpoint rejects outright means the key is unusable
        return Err(if status.is_server_error() || status.as_u16() == 429 {
            ProviderError::from_status(status, detail)
        } else {
            ProviderError::Auth(detail)
        });
    }

    let token: TokenResponse = response
        .json()
        .await
        .map_err(|e| ProviderError::InvalidResponse(format!("token response: {e}")))?;
    debug!(
        client_email = %credential.client_email(),
        expires_in = ?token.expires_in,
        "Obtained access token"
    );
    Ok(Zeroizing::new(token.access_token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::credentials::CredentialPolicy;
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use jsonwebtoken::decode_header;

    const FIXTURE: &str = include_str!("../../../../tests/fixtures/service_account.json");

    fn credential() -> Credential {
        let policy = CredentialPolicy {
            allow_insecure_endpoints: true,
            ..Default::default()
        };
        Credential::from_json(FIXTURE.as_bytes(), &policy).unwrap()
    }

    #[test]
    fn test_assertion_header() {
        let credential = credential();
        let assertion = sign_assertion(&credential, 1_700_000_000).unwrap();

        let header = decode_header(assertion.as_str()).unwrap();
        assert_eq!(header.alg, Algorithm::RS256);
        assert_eq!(header.kid.as_deref(), Some(credential.private_key_id()));
    }

    #[test]
    fn test_assertion_claims() {
        let credential = credential();
        let assertion = sign_assertion(&credential, 1_700_000_000).unwrap();

        let payload = assertion.split('.').nth(1).unwrap();
        let claims: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap();

        assert_eq!(claims["iss"], credential.client_email());
        assert_eq!(claims["scope"], GOOGLE_CLOUD_PLATFORM_SCOPE);
        assert_eq!(claims["aud"], credential.token_uri());
        assert_eq!(claims["iat"], 1_700_000_000);
        assert_eq!(claims["exp"], 1_700_003_600);
    }
}
