//! riskmap-engine - hierarchical score aggregation.
//!
//! Given a taxonomy forest, a set of assessment rows with their controls, a
//! weight configuration, and the active settings, one call produces a
//! consistent exposure score at every node of the tree:
//!
//! ```text
//! Taxonomy + Rows + Weights + Settings
//!         │
//!         ▼
//! Empty-Branch Filter (depth-1 only, before aggregation)
//!         │
//!         ▼
//! Tree Aggregator ── Leaf Scorer ── Net-Score Resolver
//!         │                └─ Weight Resolver
//!         ▼
//! View Projector (display value + missing-data reason)
//!         │
//!         ├──► ExposureTree  (sunburst: full tree + max_abs_delta)
//!         └──► MatrixProjection (heat-map: per leaf-pair lookup)
//! ```
//!
//! The engine is a pure function of its inputs: no I/O, no shared state,
//! bit-identical output for identical inputs. Both presentation surfaces
//! run through the same scoring path, which is what keeps them numerically
//! consistent.
//!
//! # Example
//!
//! ```
//! use riskmap_engine::aggregate_tree;
//! use riskmap_types::{
//!     AncestryPath, AssessmentRow, Domain, EngineSettings, NodeId, TaxonomyNode, WeightConfig,
//! };
//! use uuid::Uuid;
//!
//! let forest = vec![
//!     TaxonomyNode::new("ops", "Operational").with_child(TaxonomyNode::new("fraud", "Fraud")),
//! ];
//! let mut row = AssessmentRow::new(
//!     Uuid::new_v4(),
//!     AncestryPath::from_chain(["ops", "fraud"]),
//!     AncestryPath::from_chain(["payments"]),
//! );
//! row.set_gross(3, 4).unwrap();
//!
//! let tree = aggregate_tree(
//!     &forest,
//!     Domain::Risk,
//!     &[row],
//!     &WeightConfig::default(),
//!     &[],
//!     &[],
//!     &EngineSettings::default(),
//! )
//! .unwrap();
//! assert_eq!(tree.find(&NodeId::new("ops")).unwrap().display, Some(12.0));
//! ```

mod aggregate;
mod arena;
mod error;
mod matcher;
mod matrix;
mod net;
mod score;
mod view;

// Re-exports
pub use aggregate::aggregate_tree;
pub use arena::{ArenaEntry, TaxonomyArena};
pub use error::EngineError;
pub use matcher::{row_matches, row_matches_pair};
pub use matrix::{matrix_cells, MatrixCell, MatrixProjection};
pub use net::{net_score_of, resolve_net, ControlIndex, NetOutcome};
pub use score::{combine, round1, score_leaf, score_rows, LeafScore, Sample};
pub use view::{
    project, Projection, ViewInputs, REASON_CONTROLS_UNSCORED, REASON_NO_APPETITE,
    REASON_NO_DATA, REASON_NO_GROSS, REASON_NO_NET,
};
