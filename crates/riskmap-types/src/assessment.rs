//! Assessment rows and controls.
//!
//! An `AssessmentRow` is one risk × process intersection under assessment.
//! Its classification is denormalized into one fixed-size ancestry path per
//! domain so the engine can match a row against any taxonomy level without
//! re-walking the tree.
//!
//! Scores are computed, never stored: `gross_score` is always the product of
//! its two components, so the stored form cannot diverge.

use crate::taxonomy::{Domain, NodeId, MAX_TAXONOMY_DEPTH};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Lower bound of the probability/impact scale.
pub const SCALE_MIN: u8 = 1;
/// Upper bound of the probability/impact scale.
pub const SCALE_MAX: u8 = 5;
/// Largest possible score on the configured scale (probability × impact).
pub const SCALE_MAX_SCORE: f64 = (SCALE_MAX as f64) * (SCALE_MAX as f64);

/// System default risk appetite (3 × 3 on the 1-5 scales).
pub const DEFAULT_RISK_APPETITE: f64 = 9.0;

/// A probability or impact component outside the configured scale.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("score component {value} out of range {SCALE_MIN}..={SCALE_MAX}")]
pub struct ScaleError {
    pub value: u8,
}

fn check_component(value: u8) -> Result<u8, ScaleError> {
    if (SCALE_MIN..=SCALE_MAX).contains(&value) {
        Ok(value)
    } else {
        Err(ScaleError { value })
    }
}

fn product(a: Option<u8>, b: Option<u8>) -> Option<f64> {
    Some(f64::from(a?) * f64::from(b?))
}

// ============================================================================
// ANCESTRY PATH
// ============================================================================

/// Per-domain ancestry chain of a row, one slot per taxonomy level.
///
/// Levels fill from level 1 downward without gaps. A row may attach at any
/// depth, so slots below its attachment depth stay empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct AncestryPath([Option<NodeId>; MAX_TAXONOMY_DEPTH]);

impl AncestryPath {
    /// Build a path from an ancestor chain ordered root-first.
    ///
    /// Ids beyond [`MAX_TAXONOMY_DEPTH`] are dropped.
    pub fn from_chain<I, T>(chain: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<NodeId>,
    {
        let mut slots: [Option<NodeId>; MAX_TAXONOMY_DEPTH] = Default::default();
        for (slot, id) in slots.iter_mut().zip(chain.into_iter()) {
            *slot = Some(id.into());
        }
        Self(slots)
    }

    /// Node id at a 1-based level, if the row's chain reaches that deep.
    pub fn level(&self, depth: usize) -> Option<&NodeId> {
        if depth == 0 || depth > MAX_TAXONOMY_DEPTH {
            return None;
        }
        self.0[depth - 1].as_ref()
    }

    /// The row's own attachment: deepest filled id and its 1-based depth.
    pub fn deepest(&self) -> Option<(&NodeId, usize)> {
        self.0
            .iter()
            .enumerate()
            .rev()
            .find_map(|(i, slot)| slot.as_ref().map(|id| (id, i + 1)))
    }

    /// True iff the id appears anywhere in the chain, the deepest id included.
    pub fn contains(&self, id: &NodeId) -> bool {
        self.0.iter().flatten().any(|n| n == id)
    }

    pub fn is_empty(&self) -> bool {
        self.0[0].is_none()
    }
}

// ============================================================================
// CONTROLS
// ============================================================================

/// A mitigating control with its residual ("net") assessment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Control {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_probability: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_impact: Option<u8>,
}

impl Control {
    /// A control that exists but has not been scored yet.
    pub fn unscored(id: Uuid) -> Self {
        Self {
            id,
            net_probability: None,
            net_impact: None,
        }
    }

    /// A fully scored control; components are validated into the 1-5 scale.
    pub fn scored(id: Uuid, net_probability: u8, net_impact: u8) -> Result<Self, ScaleError> {
        Ok(Self {
            id,
            net_probability: Some(check_component(net_probability)?),
            net_impact: Some(check_component(net_impact)?),
        })
    }

    /// Residual score, product of the two components when both are present.
    pub fn net_score(&self) -> Option<f64> {
        product(self.net_probability, self.net_impact)
    }
}

/// Associates a [`Control`] with an [`AssessmentRow`].
///
/// Optional overrides take precedence over the control's own values for this
/// one row only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ControlLink {
    pub control_id: Uuid,
    pub row_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_probability: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_impact: Option<u8>,
}

impl ControlLink {
    pub fn new(control_id: Uuid, row_id: Uuid) -> Self {
        Self {
            control_id,
            row_id,
            net_probability: None,
            net_impact: None,
        }
    }

    pub fn override_probability(&mut self, value: u8) -> Result<(), ScaleError> {
        self.net_probability = Some(check_component(value)?);
        Ok(())
    }

    pub fn override_impact(&mut self, value: u8) -> Result<(), ScaleError> {
        self.net_impact = Some(check_component(value)?);
        Ok(())
    }
}

// ============================================================================
// ASSESSMENT ROW
// ============================================================================

/// One risk × process intersection under assessment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssessmentRow {
    pub id: Uuid,
    pub risk_path: AncestryPath,
    pub process_path: AncestryPath,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gross_probability: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gross_impact: Option<u8>,
    /// Always present; defaults to [`DEFAULT_RISK_APPETITE`].
    pub risk_appetite: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embedded_controls: Vec<Control>,
}

impl AssessmentRow {
    pub fn new(id: Uuid, risk_path: AncestryPath, process_path: AncestryPath) -> Self {
        Self {
            id,
            risk_path,
            process_path,
            gross_probability: None,
            gross_impact: None,
            risk_appetite: DEFAULT_RISK_APPETITE,
            embedded_controls: Vec::new(),
        }
    }

    /// Set both gross components; each is validated into the 1-5 scale.
    pub fn set_gross(&mut self, probability: u8, impact: u8) -> Result<(), ScaleError> {
        self.gross_probability = Some(check_component(probability)?);
        self.gross_impact = Some(check_component(impact)?);
        Ok(())
    }

    /// Inherent exposure before controls, product of the gross components.
    pub fn gross_score(&self) -> Option<f64> {
        product(self.gross_probability, self.gross_impact)
    }

    /// Ancestry path for the given domain.
    pub fn path(&self, domain: Domain) -> &AncestryPath {
        match domain {
            Domain::Risk => &self.risk_path,
            Domain::Process => &self.process_path,
        }
    }
}
