//! Core traits for ingredient selection.
//!
//! This module defines the SelectionPolicy trait that lets the selector swap
//! how one ingredient is picked out of a label list.

use domain::{Ingredient, Label};

/// Core trait for picking an ingredient out of an ordered label list.
///
/// ## Contract
/// - Total: every input, including an empty slice, yields an `Ingredient`
/// - Pure: the same labels always yield the same ingredient
/// - `Send + Sync` so a policy can be shared by concurrent analysis chains
pub trait SelectionPolicy: Send + Sync {
    /// Returns the name of this policy (for logging/debugging)
    fn name(&self) -> &str;

    /// Pick an ingredient, or `Ingredient::Unidentified` when none qualifies.
    fn select(&self, labels: &[Label]) -> Ingredient;
}
