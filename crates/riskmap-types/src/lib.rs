//! Shared Types for riskmap
//!
//! This crate is the single source of truth for the types crossing the
//! engine boundary:
//!
//! ```text
//! ┌──────────────────┐          ┌──────────────────┐
//! │  riskmap-engine  │  types   │  Matrix / Sunburst│
//! │  (aggregation)   │ ◄──────► │  presentation     │
//! └──────────────────┘          └──────────────────┘
//! ```
//!
//! ## Rules
//!
//! 1. Every type here is serde-serializable - these cross the UI boundary
//! 2. Derived scores (`gross_score`, `net_score`) are computed, never stored,
//!    so they cannot diverge from their components
//! 3. Range validation happens at the point of assignment, not inside the
//!    aggregation pass

pub mod aggregate;
pub mod assessment;
pub mod settings;
pub mod taxonomy;
pub mod weights;

pub use aggregate::{AggregateNode, ExposureTree};
pub use assessment::{
    AncestryPath, AssessmentRow, Control, ControlLink, ScaleError, DEFAULT_RISK_APPETITE,
    SCALE_MAX, SCALE_MAX_SCORE, SCALE_MIN,
};
pub use settings::{AggregationMode, EngineSettings, ViewMode};
pub use taxonomy::{Domain, NodeId, TaxonomyNode, MAX_TAXONOMY_DEPTH};
pub use weights::{DomainWeights, WeightConfig, WeightError, WEIGHT_MAX, WEIGHT_MIN};
