//! Ingredient-photo feed scoped to one nickname.
//!
//! The resolver itself is stateless; the host decides when to re-run it
//! (nickname change, view activation) and every run queries the store fresh,
//! since other screens may have added or removed photos.

use std::sync::Arc;

use domain::{ANONYMOUS_NICKNAME, IngredientPhotoRecord, Result};
use tracing::{debug, instrument};

use crate::traits::IngredientPhotoRepository;

/// Why a feed refresh was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedTrigger {
    /// The resolved nickname changed
    NicknameChanged,
    /// The consuming view regained focus
    Activated,
}

#[derive(Clone)]
pub struct IngredientFeedResolver {
    photos: Arc<dyn IngredientPhotoRepository>,
}

impl IngredientFeedResolver {
    pub fn new(photos: Arc<dyn IngredientPhotoRepository>) -> Self {
        Self { photos }
    }

    /// Whether a nickname can scope a feed query at all.
    ///
    /// Blank nicknames and the anonymous sentinel never reach the store. The
    /// comparison is exact, so a user who picked `anonymous` as a real
    /// nickname gets no feed.
    pub fn is_queryable(nickname: &str) -> bool {
        !nickname.trim().is_empty() && nickname != ANONYMOUS_NICKNAME
    }

    /// List the photos owned by `nickname` (exact match).
    #[instrument(skip(self))]
    pub async fn list_for(
        &self,
        nickname: &str,
        trigger: FeedTrigger,
    ) -> Result<Vec<IngredientPhotoRecord>> {
        if !Self::is_queryable(nickname) {
            debug!("Nickname unresolved, skipping feed query ({:?})", trigger);
            return Ok(Vec::new());
        }

        let records: Vec<IngredientPhotoRecord> = self
            .photos
            .find_by_nickname(nickname)
            .await?
            .into_iter()
            .filter(|record| record.owner_nickname == nickname)
            .collect();

        debug!(
            "Feed for '{}' has {} photos ({:?})",
            nickname,
            records.len(),
            trigger
        );
        Ok(records)
    }
}
