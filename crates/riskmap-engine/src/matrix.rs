//! Heat-map projection - one display value per (risk leaf, process leaf)
//! cell.
//!
//! A cell scores the rows sitting at the intersection of both coordinates,
//! with the same arithmetic and view projection as the tree pass, so a cell
//! and the corresponding taxonomy nodes can never disagree. Weights are keyed
//! on the cell's risk coordinate at each row's risk attachment depth.

use crate::arena::TaxonomyArena;
use crate::error::EngineError;
use crate::matcher::row_matches_pair;
use crate::net::ControlIndex;
use crate::score::score_rows;
use crate::view::{project, ViewInputs};
use riskmap_types::{
    AssessmentRow, Control, ControlLink, DomainWeights, EngineSettings, NodeId, TaxonomyNode,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// One heat-map cell in serializable form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatrixCell {
    pub risk: NodeId,
    pub process: NodeId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<f64>,
}

/// Heat-map lookup: `(risk leaf, process leaf) -> display value`.
///
/// Cells no row matches are omitted entirely; cells with matching rows whose
/// aggregate is still absent for the active view carry `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatrixProjection {
    cells: BTreeMap<(NodeId, NodeId), Option<f64>>,
}

impl MatrixProjection {
    /// Display value for a cell: `None` for an omitted cell as well as for a
    /// present-but-absent one; use [`MatrixProjection::contains`] to tell
    /// them apart.
    pub fn get(&self, risk: &NodeId, process: &NodeId) -> Option<f64> {
        self.cells
            .get(&(risk.clone(), process.clone()))
            .copied()
            .flatten()
    }

    pub fn contains(&self, risk: &NodeId, process: &NodeId) -> bool {
        self.cells.contains_key(&(risk.clone(), process.clone()))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cells in deterministic (risk, process) order, for serialization.
    pub fn to_cells(&self) -> Vec<MatrixCell> {
        self.cells
            .iter()
            .map(|((risk, process), display)| MatrixCell {
                risk: risk.clone(),
                process: process.clone(),
                display: *display,
            })
            .collect()
    }
}

/// Score every (risk leaf, process leaf) cell.
///
/// Both taxonomies are validated the same way as in the tree pass, so a
/// malformed tree fails identically on either surface.
pub fn matrix_cells(
    risk_forest: &[TaxonomyNode],
    process_forest: &[TaxonomyNode],
    rows: &[AssessmentRow],
    weights: &DomainWeights,
    links: &[ControlLink],
    controls: &[Control],
    settings: &EngineSettings,
) -> Result<MatrixProjection, EngineError> {
    let risk_arena = TaxonomyArena::build(risk_forest)?;
    let process_arena = TaxonomyArena::build(process_forest)?;
    let index = ControlIndex::build(links, controls);

    let mut projection = MatrixProjection::default();

    for risk_idx in risk_arena.leaves() {
        let risk_id = &risk_arena.entry(risk_idx).id;
        // Rows on this risk leaf, narrowed once per matrix row.
        let risk_rows: Vec<&AssessmentRow> = rows
            .iter()
            .filter(|row| row.risk_path.contains(risk_id))
            .collect();
        if risk_rows.is_empty() {
            continue;
        }

        for process_idx in process_arena.leaves() {
            let process_id = &process_arena.entry(process_idx).id;
            let cell_rows: Vec<&AssessmentRow> = risk_rows
                .iter()
                .copied()
                .filter(|row| row_matches_pair(row, risk_id, process_id))
                .collect();
            if cell_rows.is_empty() {
                continue;
            }

            let score = score_rows(
                cell_rows,
                |row| {
                    let depth = row
                        .risk_path
                        .deepest()
                        .map(|(_, depth)| depth)
                        .unwrap_or(0);
                    weights.risk.effective_weight(risk_id, depth)
                },
                settings.aggregation_mode,
                &index,
            );
            let result = project(
                &ViewInputs {
                    gross: score.gross,
                    net: score.net,
                    appetite: score.appetite,
                    controls_unscored: score.controls_unscored,
                },
                settings.view_mode,
            );
            projection
                .cells
                .insert((risk_id.clone(), process_id.clone()), result.display);
        }
    }

    debug!(cells = projection.len(), "heat-map cells scored");
    Ok(projection)
}
