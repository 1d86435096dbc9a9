//! Folding the operation log into a render plan.
//!
//! The fold is a pure function from a log prefix to a flat, ordered
//! effect list, so plan construction is unit-testable without a
//! transcoder in sight.

use clipforge_project_model::operation::{EditOperation, OpDescriptor};
use serde::{Deserialize, Serialize};

/// A single effect in the flattened chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedEffect {
    /// Effect identifier, passed through to the media backend.
    pub effect: String,

    /// Opaque effect parameters.
    pub parameters: serde_json::Value,
}

/// The complete ordered effect chain for one render.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RenderPlan {
    pub effects: Vec<PlannedEffect>,
}

impl RenderPlan {
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }
}

/// Reduce an ordered sequence of operation batches into one flat effect
/// chain.
///
/// Batches are flattened in version order and intra-batch order is
/// preserved. Effects are never deduplicated: a later batch targeting
/// the same effect type as an earlier one is still applied in sequence,
/// because the ordering itself is part of the visual result.
pub fn fold_operations(operations: &[EditOperation]) -> RenderPlan {
    let effects = operations
        .iter()
        .flat_map(|operation| operation.ops.iter())
        .map(|op: &OpDescriptor| PlannedEffect {
            effect: op.effect.clone(),
            parameters: op.parameters.clone(),
        })
        .collect();
    RenderPlan { effects }
}
