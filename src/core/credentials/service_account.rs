//! Service-account key parsing and validation.
//!
//! An upload is accepted only when every field the token exchange needs is
//! present and well-formed. The private key is checked by actually loading it
//! as an RS256 signing key, so a truncated or non-RSA PEM is rejected at
//! upload time rather than on the first synthesis call.

use std::fmt;

use jsonwebtoken::EncodingKey;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::Zeroize;

use crate::utils::url_validation::{UrlValidationError, validate_endpoint_url};

/// Value the `type` field of a service-account key must carry.
pub const SERVICE_ACCOUNT_TYPE: &str = "service_account";

/// Default upper bound on an uploaded key file. Real keys are around 2.3 KB.
pub const DEFAULT_MAX_CREDENTIAL_BYTES: usize = 64 * 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("Credential file is empty")]
    Empty,

    #[error("Credential file is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },

    #[error("Credential file is not valid JSON: {0}")]
    Malformed(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Expected a service account key, got type '{0}'")]
    WrongType(String),

    #[error("private_key is not a PEM-encoded RSA key")]
    InvalidPrivateKey,

    #[error("client_email is not a valid email address")]
    InvalidClientEmail,

    #[error("token_uri is not allowed: {0}")]
    InvalidTokenUri(#[from] UrlValidationError),
}

pub type CredentialResult<T> = Result<T, CredentialError>;

/// Limits applied to uploaded credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialPolicy {
    /// Largest accepted upload in bytes.
    pub max_bytes: usize,
    /// Accept plain-HTTP loopback token endpoints. Development and tests only.
    pub allow_insecure_endpoints: bool,
}

impl Default for CredentialPolicy {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_CREDENTIAL_BYTES,
            allow_insecure_endpoints: false,
        }
    }
}

/// Key file as uploaded. Every field is optional so missing ones can be
/// reported by name instead of as a generic deserialization failure.
#[derive(Deserialize, Default, Zeroize)]
struct ServiceAccountFile {
    #[serde(rename = "type")]
    account_type: Option<String>,
    project_id: Option<String>,
    private_key_id: Option<String>,
    private_key: Option<String>,
    client_email: Option<String>,
    client_id: Option<String>,
    token_uri: Option<String>,
}

impl Drop for ServiceAccountFile {
    fn drop(&mut self) {
        self.zeroize();
    }
}

/// Validated service-account material.
///
/// Held behind an `Arc` by the owning session; the secret fields are wiped
/// when the last reference is dropped. `Debug` never prints the key.
#[derive(Zeroize)]
pub struct Credential {
    project_id: String,
    private_key_id: String,
    private_key: String,
    client_email: String,
    client_id: Option<String>,
    token_uri: String,
}

/// Non-secret view of a credential, safe to log and return to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CredentialSummary {
    pub client_email: String,
    pub project_id: String,
}

fn require(value: &Option<String>, field: &'static str) -> CredentialResult<()> {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(CredentialError::MissingField(field)),
    }
}

fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

impl Credential {
    /// Parse and validate an uploaded key file.
    pub fn from_json(raw: &[u8], policy: &CredentialPolicy) -> CredentialResult<Self> {
        if raw.is_empty() {
            return Err(CredentialError::Empty);
        }
        if raw.len() > policy.max_bytes {
            return Err(CredentialError::TooLarge {
                size: raw.len(),
                limit: policy.max_bytes,
            });
        }

        let mut file: ServiceAccountFile = serde_json::from_slice(raw)
            .map_err(|e| CredentialError::Malformed(e.to_string()))?;

        require(&file.account_type, "type")?;
        if file.account_type.as_deref() != Some(SERVICE_ACCOUNT_TYPE) {
            return Err(CredentialError::WrongType(
                file.account_type.take().unwrap_or_default(),
            ));
        }
        require(&file.project_id, "project_id")?;
        require(&file.private_key_id, "private_key_id")?;
        require(&file.private_key, "private_key")?;
        require(&file.client_email, "client_email")?;
        require(&file.token_uri, "token_uri")?;

        // From here on the material lives in `credential`, which wipes itself
        // if a later check fails.
        let credential = Credential {
            project_id: file.project_id.take().unwrap_or_default(),
            private_key_id: file.private_key_id.take().unwrap_or_default(),
            private_key: file.private_key.take().unwrap_or_default(),
            client_email: file.client_email.take().unwrap_or_default(),
            client_id: file.client_id.take(),
            token_uri: file.token_uri.take().unwrap_or_default(),
        };

        if !looks_like_email(&credential.client_email) {
            return Err(CredentialError::InvalidClientEmail);
        }
        EncodingKey::from_rsa_pem(credential.private_key.as_bytes())
            .map_err(|_| CredentialError::InvalidPrivateKey)?;
        validate_endpoint_url(&credential.token_uri, policy.allow_insecure_endpoints)?;

        Ok(credential)
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn private_key_id(&self) -> &str {
        &self.private_key_id
    }

    pub fn client_email(&self) -> &str {
        &self.client_email
    }

    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    pub fn token_uri(&self) -> &str {
        &self.token_uri
    }

    /// Build the RS256 signing key from the stored PEM.
    pub fn signing_key(&self) -> CredentialResult<EncodingKey> {
        EncodingKey::from_rsa_pem(self.private_key.as_bytes())
            .map_err(|_| CredentialError::InvalidPrivateKey)
    }

    pub fn summary(&self) -> CredentialSummary {
        CredentialSummary {
            client_email: self.client_email.clone(),
            project_id: self.project_id.clone(),
        }
    }
}

impl Drop for Credential {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("private_key_id", &"[REDACTED]")
            .field("private_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}
