//! Capabilities the identity branch reads from.
//!
//! The profile store and the photo store are deliberately separate traits:
//! they may live in the same physical store or in two different ones.

use async_trait::async_trait;
use domain::{IngredientPhotoRecord, Result, Uid, UserProfile};

/// Answers "who is signed in right now".
///
/// Injected into the identity resolver so tests can sign a fake principal in
/// and out.
pub trait IdentityProvider: Send + Sync {
    /// The current principal id, or `None` when signed out.
    fn current_principal(&self) -> Option<Uid>;
}

/// Keyed lookup of profile documents by principal id.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Fails with `NotFound` when the principal has no profile document.
    async fn get_profile(&self, uid: &str) -> Result<UserProfile>;
}

/// Secondary lookup of ingredient photos by owner nickname.
#[async_trait]
pub trait IngredientPhotoRepository: Send + Sync {
    /// Every record whose owner nickname equals `nickname` exactly.
    async fn find_by_nickname(&self, nickname: &str) -> Result<Vec<IngredientPhotoRecord>>;
}
