//! Net-score resolution - residual exposure after controls.
//!
//! Operates purely on one row and its effective control set (embedded
//! controls plus everything reachable through links); no taxonomy knowledge.
//!
//! The weakest-effective-control rule: the most effective single control
//! bounds each dimension independently, so the net score is
//! `min(probabilities) × min(impacts)`. Not an average, and not per-control
//! multiplication.

use riskmap_types::{AssessmentRow, Control, ControlLink};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Controls and links pre-indexed by id, built once per engine call so the
/// per-row resolution never re-scans the full link set.
#[derive(Debug)]
pub struct ControlIndex<'a> {
    controls_by_id: BTreeMap<Uuid, &'a Control>,
    links_by_row: BTreeMap<Uuid, Vec<&'a ControlLink>>,
}

impl<'a> ControlIndex<'a> {
    pub fn build(links: &'a [ControlLink], controls: &'a [Control]) -> Self {
        let controls_by_id = controls.iter().map(|c| (c.id, c)).collect();
        let mut links_by_row: BTreeMap<Uuid, Vec<&'a ControlLink>> = BTreeMap::new();
        for link in links {
            links_by_row.entry(link.row_id).or_default().push(link);
        }
        Self {
            controls_by_id,
            links_by_row,
        }
    }

    fn links_for(&self, row_id: Uuid) -> &[&'a ControlLink] {
        self.links_by_row
            .get(&row_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Outcome of resolving one row's residual score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NetOutcome {
    pub score: Option<f64>,
    /// Whether the row has any controls at all. "Has controls but none are
    /// scored yet" is a distinct state from "no controls".
    pub has_controls: bool,
}

/// Resolve one row's net score against the pre-built index.
pub fn resolve_net(row: &AssessmentRow, index: &ControlIndex<'_>) -> NetOutcome {
    let links = index.links_for(row.id);

    // Controls-free risk is its own net exposure.
    if row.embedded_controls.is_empty() && links.is_empty() {
        return NetOutcome {
            score: row.gross_score(),
            has_controls: false,
        };
    }

    let mut probabilities: Vec<u8> = Vec::new();
    let mut impacts: Vec<u8> = Vec::new();

    for control in &row.embedded_controls {
        probabilities.extend(control.net_probability);
        impacts.extend(control.net_impact);
    }
    for link in links {
        // A link-level override beats the control's own value for this row.
        // A link to a control missing from the current set (stale data)
        // still counts through its overrides.
        let control = index.controls_by_id.get(&link.control_id);
        probabilities.extend(
            link.net_probability
                .or_else(|| control.and_then(|c| c.net_probability)),
        );
        impacts.extend(link.net_impact.or_else(|| control.and_then(|c| c.net_impact)));
    }

    let score = match (probabilities.iter().min(), impacts.iter().min()) {
        (Some(&p), Some(&i)) => Some(f64::from(p) * f64::from(i)),
        // Controls exist but neither dimension is scored on this side.
        _ => None,
    };
    NetOutcome {
        score,
        has_controls: true,
    }
}

/// One-shot resolution without a pre-built index. This is the call contract
/// for external callers; the aggregation pass uses [`resolve_net`] with a
/// shared [`ControlIndex`].
pub fn net_score_of(
    row: &AssessmentRow,
    links: &[ControlLink],
    controls: &[Control],
) -> Option<f64> {
    resolve_net(row, &ControlIndex::build(links, controls)).score
}
