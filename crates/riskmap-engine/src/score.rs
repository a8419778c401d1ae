//! Shared aggregation arithmetic and the leaf scorer.
//!
//! The same `(value, weight)` combination rule is used at every level: leaf
//! scoring over matching rows, and parent folds over child aggregates. That
//! single code path is what keeps the heat-map and sunburst numerically
//! identical for the same node.

use crate::matcher::row_matches;
use crate::net::{resolve_net, ControlIndex};
use riskmap_types::{AggregationMode, AssessmentRow, Domain, NodeId, WeightConfig};
use tracing::warn;

/// Round to one decimal, half away from zero.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Coerce non-finite arithmetic results to absent; `NaN`/`Infinity` must
/// never reach a display value.
pub(crate) fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// One contribution to an aggregate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub value: f64,
    pub weight: f64,
}

/// Fold samples per the aggregation mode.
///
/// Weighted: Σ(value·weight)/Σ(weight) over entries with weight > 0, rounded
/// to one decimal. Zero total weight is "no data", not an arithmetic error.
/// Max: the maximum value, ignoring weight entirely.
pub fn combine(samples: &[Sample], mode: AggregationMode) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    match mode {
        AggregationMode::Weighted => {
            let mut numerator = 0.0;
            let mut total_weight = 0.0;
            for sample in samples {
                if !sample.weight.is_finite() || sample.weight <= 0.0 {
                    // Rejected upstream at assignment; an entry that still
                    // arrives here must not flip the average.
                    warn!(weight = sample.weight, "excluding non-positive weight from aggregate");
                    continue;
                }
                numerator += sample.value * sample.weight;
                total_weight += sample.weight;
            }
            if total_weight <= 0.0 {
                return None;
            }
            finite(round1(numerator / total_weight))
        }
        AggregationMode::Max => samples
            .iter()
            .map(|s| s.value)
            .fold(None, |acc: Option<f64>, v| {
                Some(acc.map_or(v, |m| m.max(v)))
            })
            .and_then(finite),
    }
}

/// The three independent aggregates of one leaf, plus what the view
/// projector needs to explain an absent value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LeafScore {
    pub gross: Option<f64>,
    pub net: Option<f64>,
    pub appetite: Option<f64>,
    /// How many rows matched the node at all.
    pub matched_rows: usize,
    /// At least one matching row has controls that are not scored yet.
    pub controls_unscored: bool,
}

/// Score an arbitrary row subset against one weight rule.
///
/// `weight_of` receives each contributing row; the leaf scorer ties the
/// weight to the node being scored and the row's own attachment depth, the
/// heat-map ties it to the cell's risk coordinate.
pub fn score_rows<'a, I, F>(
    rows: I,
    weight_of: F,
    mode: AggregationMode,
    controls: &ControlIndex<'_>,
) -> LeafScore
where
    I: IntoIterator<Item = &'a AssessmentRow>,
    F: Fn(&AssessmentRow) -> f64,
{
    let mut gross_samples: Vec<Sample> = Vec::new();
    let mut net_samples: Vec<Sample> = Vec::new();
    let mut appetite: Option<f64> = None;
    let mut matched_rows = 0;
    let mut controls_unscored = false;

    for row in rows {
        matched_rows += 1;
        let weight = weight_of(row);

        if let Some(value) = row.gross_score() {
            gross_samples.push(Sample { value, weight });
        }

        let net = resolve_net(row, controls);
        match net.score {
            Some(value) => net_samples.push(Sample { value, weight }),
            None if net.has_controls => controls_unscored = true,
            None => {}
        }

        // Appetite is a threshold: the tightest constraint always governs,
        // independent of the aggregation mode.
        if row.risk_appetite.is_finite() {
            appetite = Some(appetite.map_or(row.risk_appetite, |a: f64| a.min(row.risk_appetite)));
        } else {
            warn!(row = %row.id, appetite = row.risk_appetite, "ignoring non-finite risk appetite");
        }
    }

    LeafScore {
        gross: combine(&gross_samples, mode),
        net: combine(&net_samples, mode),
        appetite,
        matched_rows,
        controls_unscored,
    }
}

/// Score one leaf node: every matching row contributes, weighted by the
/// effective weight of the *scored node* at the row's own attachment depth,
/// so an override on the node applies uniformly to all its rows.
pub fn score_leaf(
    rows: &[AssessmentRow],
    domain: Domain,
    node_id: &NodeId,
    mode: AggregationMode,
    weights: &WeightConfig,
    controls: &ControlIndex<'_>,
) -> LeafScore {
    score_rows(
        rows.iter().filter(|row| row_matches(row, domain, node_id)),
        |row| {
            let depth = row
                .path(domain)
                .deepest()
                .map(|(_, depth)| depth)
                .unwrap_or(0);
            weights.effective_weight(node_id, depth)
        },
        mode,
        controls,
    )
}
