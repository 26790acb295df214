//! Policy that picks the label at a fixed position.
//!
//! The label list keeps the vision service's ordering, so this deliberately
//! ignores confidence. Position 3 (the fourth label) is the established
//! default; the first few labels are usually broad categories such as
//! "Food" or "Vegetable".

use crate::traits::SelectionPolicy;
use domain::{Ingredient, Label};

/// Zero-based ordinal used when none is configured
pub const DEFAULT_ORDINAL: usize = 3;

/// Picks `labels[ordinal]`.
///
/// ## Algorithm
/// 1. Look up the label at `ordinal`
/// 2. Normalize its name (trim, lowercase)
/// 3. Fall back to `Unidentified` when the list is too short
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionalPolicy {
    ordinal: usize,
}

impl PositionalPolicy {
    /// Create a positional policy for a zero-based ordinal.
    pub fn new(ordinal: usize) -> Self {
        Self { ordinal }
    }

    pub fn ordinal(&self) -> usize {
        self.ordinal
    }
}

impl Default for PositionalPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ORDINAL)
    }
}

impl SelectionPolicy for PositionalPolicy {
    fn name(&self) -> &str {
        "PositionalPolicy"
    }

    fn select(&self, labels: &[Label]) -> Ingredient {
        labels
            .get(self.ordinal)
            .map(|label| Ingredient::from_label_name(&label.name))
            .unwrap_or(Ingredient::Unidentified)
    }
}
