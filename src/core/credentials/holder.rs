use std::sync::Arc;

use arc_swap::ArcSwapOption;

use super::{Credential, CredentialPolicy, CredentialResult};

/// Session-scoped slot for at most one credential.
///
/// Replacement is a single pointer swap: readers see either the old or the
/// new credential, never neither and never both. A reader that already holds
/// the old `Arc` keeps it alive until its call finishes; the material is wiped
/// as soon as that last reference goes away.
#[derive(Default)]
pub struct CredentialHolder {
    current: ArcSwapOption<Credential>,
    policy: CredentialPolicy,
}

impl CredentialHolder {
    pub fn new(policy: CredentialPolicy) -> Self {
        Self {
            current: ArcSwapOption::empty(),
            policy,
        }
    }

    /// Validate `raw` and make it the current credential.
    ///
    /// On failure the previous credential, if any, stays in place.
    pub fn set(&self, raw: &[u8]) -> CredentialResult<Arc<Credential>> {
        let credential = Arc::new(Credential::from_json(raw, &self.policy)?);
        self.current.store(Some(Arc::clone(&credential)));
        tracing::info!(
            client_email = %credential.client_email(),
            project_id = %credential.project_id(),
            "Service account credential stored"
        );
        Ok(credential)
    }

    pub fn get(&self) -> Option<Arc<Credential>> {
        self.current.load_full()
    }

    /// Drop the holder's reference. Returns whether a credential was present.
    pub fn clear(&self) -> bool {
        self.current.swap(None).is_some()
    }

    pub fn is_set(&self) -> bool {
        self.current.load().is_some()
    }

    pub fn policy(&self) -> &CredentialPolicy {
        &self.policy
    }
}

impl std::fmt::Debug for CredentialHolder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialHolder")
            .field("is_set", &self.is_set())
            .finish()
    }
}
