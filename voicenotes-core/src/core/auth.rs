//! Authentication collaborator: who is the current principal?

use std::sync::RwLock;

/// Source of the signed-in principal that scopes every note operation.
pub trait AuthProvider: Send + Sync {
    /// The current principal's id, or `None` when nobody is signed in.
    fn current_principal_id(&self) -> Option<String>;
}

/// In-process session holding the signed-in principal.
///
/// Credential checks happen elsewhere; a `Session` only records the outcome.
#[derive(Debug, Default)]
pub struct Session {
    principal: RwLock<Option<String>>,
}

impl Session {
    /// A session with nobody signed in.
    pub fn new() -> Self {
        Self::default()
    }

    /// A session already signed in as `principal_id`.
    pub fn signed_in(principal_id: impl Into<String>) -> Self {
        Self {
            principal: RwLock::new(Some(principal_id.into())),
        }
    }

    pub fn sign_in(&self, principal_id: impl Into<String>) {
        let principal_id = principal_id.into();
        log::info!("signed in as {principal_id}");
        if let Ok(mut principal) = self.principal.write() {
            *principal = Some(principal_id);
        }
    }

    pub fn sign_out(&self) {
        if let Ok(mut principal) = self.principal.write() {
            if let Some(previous) = principal.take() {
                log::info!("signed out {previous}");
            }
        }
    }
}

impl AuthProvider for Session {
    fn current_principal_id(&self) -> Option<String> {
        self.principal.read().ok().and_then(|p| p.clone())
    }
}
