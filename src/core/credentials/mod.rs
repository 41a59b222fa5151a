//! Uploaded service-account credentials, scoped to a session.

mod holder;
mod service_account;

pub use holder::CredentialHolder;
pub use service_account::{
    Credential, CredentialError, CredentialPolicy, CredentialResult, CredentialSummary,
    DEFAULT_MAX_CREDENTIAL_BYTES, SERVICE_ACCOUNT_TYPE,
};
