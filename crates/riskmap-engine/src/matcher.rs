//! Row matching - which rows contribute to which taxonomy node.
//!
//! A row matches a node iff the node's id appears anywhere in the row's
//! ancestry chain for that domain, its own deepest id included. One row
//! therefore contributes to its exact attachment node and every ancestor up
//! to the root simultaneously.
//!
//! A row whose chain references an id not present in the current tree (stale
//! data during taxonomy edits) simply never matches; it is not an error.

use riskmap_types::{AssessmentRow, Domain, NodeId};

/// True iff the row's ancestry for `domain` includes `node_id`.
pub fn row_matches(row: &AssessmentRow, domain: Domain, node_id: &NodeId) -> bool {
    row.path(domain).contains(node_id)
}

/// True iff the row sits at the intersection of both coordinates - used by
/// the heat-map projection, where a cell is a (risk, process) pair.
pub fn row_matches_pair(row: &AssessmentRow, risk_id: &NodeId, process_id: &NodeId) -> bool {
    row.risk_path.contains(risk_id) && row.process_path.contains(process_id)
}
