//! Core domain types for the ingredient-to-recipe pipeline.
//!
//! Everything here is a plain value: labels and recipes are transient copies of
//! what the external services returned, and profiles and photo records are
//! read-only views of documents owned by the stores.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Type Aliases and Sentinels
// =============================================================================

/// Catalog identifier of a recipe (opaque string, e.g. "52772")
pub type RecipeId = String;

/// Opaque identifier of an authenticated principal
pub type Uid = String;

/// Ingredient value used when no label could be selected
pub const UNIDENTIFIED_INGREDIENT: &str = "unidentified";

/// Nickname used when a principal has no usable profile.
///
/// The value is reserved: it never scopes an ingredient-feed query, so a
/// profile whose stored nickname is literally `anonymous` has an empty feed.
pub const ANONYMOUS_NICKNAME: &str = "anonymous";

// =============================================================================
// Image and Labels
// =============================================================================

/// Reference to an already-uploaded image (its address).
///
/// Two references are the same trigger if their addresses are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn url(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named detection returned by the vision service.
///
/// Lists of labels keep the service's own ordering, which is not necessarily
/// sorted by confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    pub confidence: f32,
}

impl Label {
    pub fn new(name: impl Into<String>, confidence: f32) -> Self {
        Self {
            name: name.into(),
            confidence,
        }
    }
}

// =============================================================================
// Ingredient
// =============================================================================

/// The single ingredient chosen from a label list.
///
/// Never absent: when nothing could be chosen the value is `Unidentified`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ingredient {
    Identified(String),
    Unidentified,
}

impl Ingredient {
    /// Normalize a label name into an ingredient (trimmed, lowercase).
    ///
    /// A name that is blank after trimming yields `Unidentified`.
    pub fn from_label_name(name: &str) -> Self {
        let normalized = name.trim().to_lowercase();
        if normalized.is_empty() {
            Self::Unidentified
        } else {
            Self::Identified(normalized)
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Identified(name) => name,
            Self::Unidentified => UNIDENTIFIED_INGREDIENT,
        }
    }

    pub fn is_identified(&self) -> bool {
        matches!(self, Self::Identified(_))
    }
}

impl fmt::Display for Ingredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Recipe-related Types
// =============================================================================

/// Lightweight catalog listing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeSummary {
    pub id: RecipeId,
    pub title: String,
    pub thumbnail_url: String,
}

/// Full recipe content, fetched lazily one at a time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeDetail {
    pub title: String,
    pub thumbnail_url: String,
    pub instructions: String,
    pub video_url: Option<String>,
}

// =============================================================================
// Identity and Store Records
// =============================================================================

/// Read-only copy of a profile document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub uid: Uid,
    pub nickname: String,
}

impl UserProfile {
    pub fn new(uid: impl Into<Uid>, nickname: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            nickname: nickname.into(),
        }
    }

    /// Profile for a principal whose document is missing or has no nickname
    pub fn anonymous(uid: impl Into<Uid>) -> Self {
        Self::new(uid, ANONYMOUS_NICKNAME)
    }

    pub fn is_anonymous(&self) -> bool {
        self.nickname == ANONYMOUS_NICKNAME
    }
}

/// A stored ingredient photograph owned by a nickname
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientPhotoRecord {
    pub id: String,
    pub image_url: String,
    pub owner_nickname: String,
}

impl IngredientPhotoRecord {
    /// The photo as an analyzable image reference
    pub fn image_ref(&self) -> ImageRef {
        ImageRef::new(self.image_url.clone())
    }
}
