//! # Sources Crate
//!
//! This crate implements the identity branch of the recommendation pipeline.
//!
//! ## Components
//!
//! ### UserIdentityResolver
//! Resolves the signed-in principal to a display nickname:
//! - Reads an injected `IdentityProvider` (never a process-wide singleton)
//! - Looks the principal up in the `ProfileRepository`
//! - Absorbs a missing profile into the `anonymous` nickname
//!
//! ### IngredientFeedResolver
//! Lists the ingredient photos owned by a nickname:
//! - Reads the `IngredientPhotoRepository` (a separate store)
//! - Skips the query entirely while the nickname is unresolved
//!
//! ## Example Usage
//!
//! ```ignore
//! use sources::{IngredientFeedResolver, UserIdentityResolver, FeedTrigger};
//!
//! let identity = UserIdentityResolver::new(provider, profiles);
//! let feed = IngredientFeedResolver::new(photos);
//!
//! let nickname = identity.resolve_nickname().await.unwrap_or_default();
//! let photos = feed.list_for(&nickname, FeedTrigger::NicknameChanged).await?;
//! ```

// Public modules
pub mod document_store;
pub mod feed;
pub mod identity;
pub mod memory;
pub mod traits;

// Re-export commonly used types
pub use document_store::{DocumentPhotoRepository, DocumentProfileRepository, DocumentStoreConfig};
pub use feed::{FeedTrigger, IngredientFeedResolver};
pub use identity::UserIdentityResolver;
pub use memory::{InMemoryPhotoRepository, InMemoryProfileRepository, StaticIdentityProvider};
pub use traits::{IdentityProvider, IngredientPhotoRepository, ProfileRepository};
