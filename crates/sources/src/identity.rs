//! Resolve the signed-in principal to a display nickname.
//!
//! ## Resolution rules
//! - No principal signed in → `Unauthenticated` (terminal, never retried here)
//! - No profile document → logged, nickname defaults to `anonymous`
//! - Profile with a blank nickname → nickname defaults to `anonymous`
//! - Store failure → `ServiceUnavailable` propagates to the caller

use std::sync::Arc;

use domain::{PipelineError, Result, UserProfile};
use tracing::{debug, error, instrument, warn};

use crate::traits::{IdentityProvider, ProfileRepository};

/// Reads the injected identity provider and the profile store.
#[derive(Clone)]
pub struct UserIdentityResolver {
    identity: Arc<dyn IdentityProvider>,
    profiles: Arc<dyn ProfileRepository>,
}

impl UserIdentityResolver {
    pub fn new(identity: Arc<dyn IdentityProvider>, profiles: Arc<dyn ProfileRepository>) -> Self {
        Self { identity, profiles }
    }

    /// Resolve the current principal's profile.
    #[instrument(skip(self))]
    pub async fn resolve(&self) -> Result<UserProfile> {
        let uid = self.identity.current_principal().ok_or_else(|| {
            warn!("No principal is signed in");
            PipelineError::Unauthenticated
        })?;

        match self.profiles.get_profile(&uid).await {
            Ok(profile) if profile.nickname.trim().is_empty() => {
                debug!("Profile for {} has no nickname, using default", uid);
                Ok(UserProfile::anonymous(uid))
            }
            Ok(profile) => {
                debug!("Resolved {} to nickname '{}'", uid, profile.nickname);
                Ok(profile)
            }
            Err(err) if err.is_not_found() => {
                warn!("No profile document for principal {}", uid);
                Ok(UserProfile::anonymous(uid))
            }
            Err(err) => Err(err),
        }
    }

    /// Resolve straight to a nickname, absorbing every failure.
    ///
    /// `None` means no nickname could be resolved (signed out or store down);
    /// the failure has already been logged.
    pub async fn resolve_nickname(&self) -> Option<String> {
        match self.resolve().await {
            Ok(profile) => Some(profile.nickname),
            Err(PipelineError::Unauthenticated) => None,
            Err(err) => {
                error!("Failed to resolve nickname: {}", err);
                None
            }
        }
    }
}
