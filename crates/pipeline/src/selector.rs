//! The IngredientSelector wraps one selection policy.
//!
//! This module provides the selector the orchestrator calls between label
//! detection and recipe search, plus `PolicyKind` for picking a policy from
//! configuration.

use std::fmt;
use std::str::FromStr;

use domain::{Ingredient, Label};
use thiserror::Error;
use tracing::debug;

use crate::policies::{DEFAULT_ORDINAL, HighestConfidencePolicy, PositionalPolicy};
use crate::traits::SelectionPolicy;

/// Which selection policy to build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    /// Fixed position in service order (the default)
    Positional { ordinal: usize },
    /// Highest reported confidence
    HighestConfidence,
}

impl Default for PolicyKind {
    fn default() -> Self {
        Self::Positional {
            ordinal: DEFAULT_ORDINAL,
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Positional { ordinal } => write!(f, "positional({})", ordinal),
            Self::HighestConfidence => f.write_str("highest-confidence"),
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("unknown ingredient policy '{0}' (expected 'positional' or 'highest-confidence')")]
pub struct UnknownPolicy(pub String);

/// Parses the policy name only; a positional policy gets the default ordinal.
impl FromStr for PolicyKind {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positional" => Ok(Self::default()),
            "highest-confidence" | "highest_confidence" => Ok(Self::HighestConfidence),
            other => Err(UnknownPolicy(other.to_string())),
        }
    }
}

/// Picks one ingredient out of a label list.
///
/// ## Usage
/// ```ignore
/// let selector = IngredientSelector::default();
/// let ingredient = selector.select_ingredient(&labels);
/// ```
pub struct IngredientSelector {
    policy: Box<dyn SelectionPolicy>,
}

impl IngredientSelector {
    /// Create a selector around any policy.
    pub fn new(policy: impl SelectionPolicy + 'static) -> Self {
        Self {
            policy: Box::new(policy),
        }
    }

    /// Build the selector a `PolicyKind` describes.
    pub fn from_kind(kind: PolicyKind) -> Self {
        match kind {
            PolicyKind::Positional { ordinal } => Self::new(PositionalPolicy::new(ordinal)),
            PolicyKind::HighestConfidence => Self::new(HighestConfidencePolicy),
        }
    }

    pub fn policy_name(&self) -> &str {
        self.policy.name()
    }

    /// Select the ingredient for a label list. Never panics.
    pub fn select_ingredient(&self, labels: &[Label]) -> Ingredient {
        let ingredient = self.policy.select(labels);
        debug!(
            "{} selected '{}' from {} labels",
            self.policy.name(),
            ingredient,
            labels.len()
        );
        ingredient
    }
}

impl Default for IngredientSelector {
    fn default() -> Self {
        Self::from_kind(PolicyKind::default())
    }
}
