//! Engine error types.
//!
//! Only malformed taxonomy input is fatal. Data-level anomalies (stale row
//! references, zero total weight, missing weight config) degrade locally to
//! "no data" and never surface here.

use riskmap_types::{NodeId, MAX_TAXONOMY_DEPTH};
use thiserror::Error;

/// Fatal input errors for one aggregation call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    /// A taxonomy node sits deeper than the supported level count. The whole
    /// call is refused rather than truncating levels.
    #[error("taxonomy depth exceeded: node '{id}' at depth {depth} (max {MAX_TAXONOMY_DEPTH})")]
    DepthExceeded {
        /// The offending node.
        id: NodeId,
        /// Its derived depth.
        depth: usize,
    },

    /// The same id appears twice in one domain's forest. Weight overrides
    /// and output lookups would be ambiguous.
    #[error("duplicate taxonomy node id '{id}'")]
    DuplicateNodeId {
        /// The repeated id.
        id: NodeId,
    },
}

impl EngineError {
    /// Stable error code for this error type.
    pub fn code(&self) -> &'static str {
        match self {
            Self::DepthExceeded { .. } => "DEPTH_EXCEEDED",
            Self::DuplicateNodeId { .. } => "DUPLICATE_NODE_ID",
        }
    }
}
