//! Aggregation weight configuration.
//!
//! Each domain carries five per-level defaults plus node-specific overrides.
//! Values are user-editable in [0.1, 5.0] at one decimal of precision and are
//! validated here, at the point of assignment - the aggregation pass performs
//! no defensive clamping of its own.

use crate::taxonomy::{Domain, NodeId, MAX_TAXONOMY_DEPTH};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Smallest assignable weight.
pub const WEIGHT_MIN: f64 = 0.1;
/// Largest assignable weight.
pub const WEIGHT_MAX: f64 = 5.0;

/// Rejected weight assignment.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum WeightError {
    #[error("weight {value} out of range {WEIGHT_MIN}..={WEIGHT_MAX}")]
    OutOfRange { value: f64 },

    #[error("level {depth} out of range 1..={MAX_TAXONOMY_DEPTH}")]
    InvalidLevel { depth: usize },
}

fn check_weight(value: f64) -> Result<f64, WeightError> {
    if !value.is_finite() || !(WEIGHT_MIN..=WEIGHT_MAX).contains(&value) {
        return Err(WeightError::OutOfRange { value });
    }
    // Stored at one decimal of precision.
    Ok((value * 10.0).round() / 10.0)
}

/// Weight configuration for one domain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeightConfig {
    /// Per-level defaults, index 0 = level 1.
    level_defaults: [f64; MAX_TAXONOMY_DEPTH],
    /// Node-specific overrides, preferred over the level default.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    node_overrides: BTreeMap<NodeId, f64>,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            level_defaults: [1.0; MAX_TAXONOMY_DEPTH],
            node_overrides: BTreeMap::new(),
        }
    }
}

impl WeightConfig {
    /// Set the default weight for a 1-based level.
    pub fn set_level_default(&mut self, depth: usize, weight: f64) -> Result<(), WeightError> {
        if depth == 0 || depth > MAX_TAXONOMY_DEPTH {
            return Err(WeightError::InvalidLevel { depth });
        }
        self.level_defaults[depth - 1] = check_weight(weight)?;
        Ok(())
    }

    /// Set a node-specific override.
    pub fn set_node_override(
        &mut self,
        id: impl Into<NodeId>,
        weight: f64,
    ) -> Result<(), WeightError> {
        self.node_overrides.insert(id.into(), check_weight(weight)?);
        Ok(())
    }

    /// Remove a node-specific override, falling back to the level default.
    pub fn clear_node_override(&mut self, id: &NodeId) {
        self.node_overrides.remove(id);
    }

    /// Explicit lookup of a node override.
    pub fn node_override(&self, id: &NodeId) -> Option<f64> {
        self.node_overrides.get(id).copied()
    }

    /// Effective weight for a node: its override if set, else its level's
    /// default. An unrecognized depth defaults to 1.0; there is no failure
    /// mode here.
    pub fn effective_weight(&self, id: &NodeId, depth: usize) -> f64 {
        if let Some(w) = self.node_override(id) {
            return w;
        }
        if depth == 0 || depth > MAX_TAXONOMY_DEPTH {
            return 1.0;
        }
        self.level_defaults[depth - 1]
    }
}

/// The pair of per-domain weight configurations.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DomainWeights {
    pub risk: WeightConfig,
    pub process: WeightConfig,
}

impl DomainWeights {
    pub fn for_domain(&self, domain: Domain) -> &WeightConfig {
        match domain {
            Domain::Risk => &self.risk,
            Domain::Process => &self.process,
        }
    }

    pub fn for_domain_mut(&mut self, domain: Domain) -> &mut WeightConfig {
        match domain {
            Domain::Risk => &mut self.risk,
            Domain::Process => &mut self.process,
        }
    }
}
