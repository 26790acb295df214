//! In-memory implementations of the identity capabilities.
//!
//! Used by the CLI (for the signed-in principal) and by tests. Clones share
//! state, so a test can keep a handle to a repository it has handed to a
//! resolver and inspect how often the resolver actually queried it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use domain::{IngredientPhotoRecord, PipelineError, Result, Uid, UserProfile};

use crate::traits::{IdentityProvider, IngredientPhotoRepository, ProfileRepository};

/// Identity provider whose principal is set explicitly.
#[derive(Debug, Default)]
pub struct StaticIdentityProvider {
    principal: RwLock<Option<Uid>>,
}

impl StaticIdentityProvider {
    pub fn signed_in(uid: impl Into<Uid>) -> Self {
        Self {
            principal: RwLock::new(Some(uid.into())),
        }
    }

    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn sign_in(&self, uid: impl Into<Uid>) {
        *self.principal.write().unwrap_or_else(PoisonError::into_inner) = Some(uid.into());
    }

    pub fn sign_out(&self) {
        *self.principal.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl IdentityProvider for StaticIdentityProvider {
    fn current_principal(&self) -> Option<Uid> {
        self.principal
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[derive(Debug, Default)]
struct ProfileState {
    profiles: RwLock<HashMap<Uid, UserProfile>>,
    failure: RwLock<Option<PipelineError>>,
    lookups: AtomicUsize,
}

/// Profile store backed by a HashMap keyed by uid.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProfileRepository {
    state: Arc<ProfileState>,
}

impl InMemoryProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, profile: UserProfile) {
        self.state
            .profiles
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(profile.uid.clone(), profile);
    }

    /// Make every subsequent lookup fail with `error`
    pub fn fail_with(&self, error: PipelineError) {
        *self.state.failure.write().unwrap_or_else(PoisonError::into_inner) = Some(error);
    }

    /// Number of lookups that reached this store
    pub fn lookup_count(&self) -> usize {
        self.state.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn get_profile(&self, uid: &str) -> Result<UserProfile> {
        self.state.lookups.fetch_add(1, Ordering::SeqCst);

        if let Some(err) = self
            .state
            .failure
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
        {
            return Err(err);
        }

        self.state
            .profiles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(uid)
            .cloned()
            .ok_or_else(|| PipelineError::not_found("profile", uid))
    }
}

#[derive(Debug, Default)]
struct PhotoState {
    records: RwLock<Vec<IngredientPhotoRecord>>,
    failure: RwLock<Option<PipelineError>>,
    queries: AtomicUsize,
}

/// Photo store backed by a Vec, scanned on every query.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPhotoRepository {
    state: Arc<PhotoState>,
}

impl InMemoryPhotoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: IngredientPhotoRecord) {
        self.state
            .records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }

    pub fn fail_with(&self, error: PipelineError) {
        *self.state.failure.write().unwrap_or_else(PoisonError::into_inner) = Some(error);
    }

    /// Number of queries that reached this store
    pub fn query_count(&self) -> usize {
        self.state.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IngredientPhotoRepository for InMemoryPhotoRepository {
    async fn find_by_nickname(&self, nickname: &str) -> Result<Vec<IngredientPhotoRecord>> {
        self.state.queries.fetch_add(1, Ordering::SeqCst);

        if let Some(err) = self
            .state
            .failure
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
        {
            return Err(err);
        }

        Ok(self
            .state
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|record| record.owner_nickname == nickname)
            .cloned()
            .collect())
    }
}
