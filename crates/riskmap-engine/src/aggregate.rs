//! Tree aggregation - one post-order pass from leaf rows to a fully scored
//! taxonomy tree.
//!
//! Leaves are scored from matching assessment rows; every internal node folds
//! its children's aggregates upward using the same weighted/max rule, keyed by
//! each child's own effective weight. Appetite always folds via minimum. A
//! child with an absent value is excluded from its parent's aggregate, never
//! treated as zero.
//!
//! The engine is a pure, synchronous, single-pass function: no shared state,
//! no I/O, idempotent for identical inputs.

use crate::arena::TaxonomyArena;
use crate::error::EngineError;
use crate::matcher::row_matches;
use crate::net::{resolve_net, ControlIndex};
use crate::score::{combine, score_leaf, Sample};
use crate::view::{project, Projection, ViewInputs, REASON_NO_DATA};
use riskmap_types::{
    AggregateNode, AssessmentRow, Control, ControlLink, Domain, EngineSettings, ExposureTree,
    TaxonomyNode, ViewMode, WeightConfig, SCALE_MAX_SCORE,
};
use tracing::debug;

#[derive(Debug, Clone, Default)]
struct NodeResult {
    gross: Option<f64>,
    net: Option<f64>,
    appetite: Option<f64>,
    display: Option<f64>,
    missing_reason: Option<String>,
}

/// Aggregate one domain's full tree.
///
/// All inputs are borrowed for the duration of the call; the output is
/// freshly allocated. Fails only on malformed taxonomy input (depth > 5,
/// duplicate ids); every data-level anomaly degrades to an absent value with
/// a missing-data reason.
pub fn aggregate_tree(
    forest: &[TaxonomyNode],
    domain: Domain,
    rows: &[AssessmentRow],
    weights: &WeightConfig,
    links: &[ControlLink],
    controls: &[Control],
    settings: &EngineSettings,
) -> Result<ExposureTree, EngineError> {
    let arena = TaxonomyArena::build(forest)?;
    let index = ControlIndex::build(links, controls);
    debug!(
        domain = %domain,
        nodes = arena.len(),
        rows = rows.len(),
        mode = settings.aggregation_mode.to_db_str(),
        view = settings.view_mode.to_db_str(),
        hide_empty = settings.hide_empty,
        "aggregating exposure tree"
    );

    // Empty-branch filtering happens before aggregation so that a removed
    // branch does not exist at all in the output sibling set. Only depth-1
    // branches are ever removed.
    let kept_roots: Vec<usize> = if settings.hide_empty {
        arena
            .roots()
            .iter()
            .copied()
            .filter(|&root| {
                branch_has_data(&arena, root, rows, domain, &index, settings.view_mode)
            })
            .collect()
    } else {
        arena.roots().to_vec()
    };

    let mut results: Vec<NodeResult> = vec![NodeResult::default(); arena.len()];

    for idx in arena.post_order_from(&kept_roots) {
        let entry = arena.entry(idx);
        results[idx] = if entry.is_leaf() {
            let score = score_leaf(
                rows,
                domain,
                &entry.id,
                settings.aggregation_mode,
                weights,
                &index,
            );
            let Projection {
                display,
                missing_reason,
            } = project(
                &ViewInputs {
                    gross: score.gross,
                    net: score.net,
                    appetite: score.appetite,
                    controls_unscored: score.controls_unscored,
                },
                settings.view_mode,
            );
            let missing_reason = if score.matched_rows == 0 {
                Some(REASON_NO_DATA.to_string())
            } else {
                missing_reason
            };
            NodeResult {
                gross: score.gross,
                net: score.net,
                appetite: score.appetite,
                display,
                missing_reason,
            }
        } else {
            fold_children(&arena, idx, &results, weights, settings)
        };
    }

    let roots: Vec<AggregateNode> = kept_roots
        .iter()
        .map(|&root| build_output(&arena, root, &results))
        .collect();

    let max_abs_delta = if settings.view_mode.is_delta() {
        roots
            .iter()
            .flat_map(|r| r.walk())
            .filter_map(|n| n.display)
            .fold(0.0, |acc: f64, v| acc.max(v.abs()))
    } else {
        SCALE_MAX_SCORE
    };

    debug!(
        kept_roots = roots.len(),
        max_abs_delta, "exposure tree aggregated"
    );
    Ok(ExposureTree {
        roots,
        max_abs_delta,
    })
}

/// Fold an internal node from its already-computed children.
fn fold_children(
    arena: &TaxonomyArena,
    idx: usize,
    results: &[NodeResult],
    weights: &WeightConfig,
    settings: &EngineSettings,
) -> NodeResult {
    let entry = arena.entry(idx);
    let mut gross_samples: Vec<Sample> = Vec::new();
    let mut net_samples: Vec<Sample> = Vec::new();
    let mut appetite: Option<f64> = None;
    let mut any_child_display = false;

    for &child_idx in &entry.children {
        let child = arena.entry(child_idx);
        let child_result = &results[child_idx];
        let weight = weights.effective_weight(&child.id, child.depth);

        if let Some(value) = child_result.gross {
            gross_samples.push(Sample { value, weight });
        }
        if let Some(value) = child_result.net {
            net_samples.push(Sample { value, weight });
        }
        if let Some(value) = child_result.appetite {
            appetite = Some(appetite.map_or(value, |a: f64| a.min(value)));
        }
        any_child_display |= child_result.display.is_some();
    }

    let gross = combine(&gross_samples, settings.aggregation_mode);
    let net = combine(&net_samples, settings.aggregation_mode);
    let Projection {
        display,
        missing_reason,
    } = project(
        &ViewInputs {
            gross,
            net,
            appetite,
            controls_unscored: false,
        },
        settings.view_mode,
    );

    // "Some descendants have data" must never be reported as "no data",
    // even when the parent's own display ends up absent.
    let missing_reason = if any_child_display {
        None
    } else {
        missing_reason
    };

    NodeResult {
        gross,
        net,
        appetite,
        display,
        missing_reason,
    }
}

/// Recursive "has data" check for the empty-branch filter: does any leaf in
/// this subtree carry the component(s) the active view needs? Short-circuits
/// on the first satisfying row.
fn branch_has_data(
    arena: &TaxonomyArena,
    root: usize,
    rows: &[AssessmentRow],
    domain: Domain,
    controls: &ControlIndex<'_>,
    view: ViewMode,
) -> bool {
    let mut any_gross = false;
    let mut any_net = false;
    let mut any_appetite = false;

    let satisfied = |any_gross: bool, any_net: bool, any_appetite: bool| match view {
        ViewMode::Gross => any_gross,
        ViewMode::Net => any_net,
        ViewMode::DeltaGrossNet => any_gross && any_net,
        ViewMode::DeltaVsAppetite => any_gross && any_appetite,
    };

    for idx in arena.subtree(root) {
        let entry = arena.entry(idx);
        if !entry.is_leaf() {
            continue;
        }
        for row in rows.iter().filter(|r| row_matches(r, domain, &entry.id)) {
            any_gross |= row.gross_score().is_some();
            any_net |= resolve_net(row, controls).score.is_some();
            any_appetite |= row.risk_appetite.is_finite();
            if satisfied(any_gross, any_net, any_appetite) {
                return true;
            }
        }
    }
    false
}

fn build_output(arena: &TaxonomyArena, idx: usize, results: &[NodeResult]) -> AggregateNode {
    let entry = arena.entry(idx);
    let result = &results[idx];
    AggregateNode {
        id: entry.id.clone(),
        name: entry.name.clone(),
        depth: entry.depth,
        gross: result.gross,
        net: result.net,
        appetite: result.appetite,
        display: result.display,
        missing_reason: result.missing_reason.clone(),
        children: entry
            .children
            .iter()
            .map(|&child| build_output(arena, child, results))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{REASON_NO_GROSS, REASON_NO_NET};
    use riskmap_types::{AggregationMode, AncestryPath, NodeId};
    use uuid::Uuid;

    fn make_row(risk: &[&str], process: &[&str]) -> AssessmentRow {
        AssessmentRow::new(
            Uuid::new_v4(),
            AncestryPath::from_chain(risk.iter().copied()),
            AncestryPath::from_chain(process.iter().copied()),
        )
    }

    fn scored_row(risk: &[&str], prob: u8, impact: u8) -> AssessmentRow {
        let mut row = make_row(risk, &["p1"]);
        row.set_gross(prob, impact).unwrap();
        row
    }

    fn two_leaf_tree() -> Vec<TaxonomyNode> {
        vec![TaxonomyNode::new("root", "Root")
            .with_child(TaxonomyNode::new("a", "A"))
            .with_child(TaxonomyNode::new("b", "B"))]
    }

    fn run(
        forest: &[TaxonomyNode],
        rows: &[AssessmentRow],
        settings: &EngineSettings,
    ) -> ExposureTree {
        aggregate_tree(
            forest,
            Domain::Risk,
            rows,
            &WeightConfig::default(),
            &[],
            &[],
            settings,
        )
        .unwrap()
    }

    #[test]
    fn test_leaf_and_ancestor_scored_from_same_row() {
        let rows = vec![scored_row(&["root", "a"], 3, 4)];
        let tree = run(&two_leaf_tree(), &rows, &EngineSettings::default());

        let a = tree.find(&NodeId::new("a")).unwrap();
        assert_eq!(a.gross, Some(12.0));
        assert_eq!(a.display, Some(12.0));

        let root = tree.find(&NodeId::new("root")).unwrap();
        assert_eq!(root.gross, Some(12.0));
        assert_eq!(root.missing_reason, None);
    }

    #[test]
    fn test_parent_takes_present_child_not_zero() {
        // One child with data, one without, equal weights: the parent's
        // aggregate equals the present child's value.
        let rows = vec![scored_row(&["root", "a"], 3, 4)];
        let tree = run(&two_leaf_tree(), &rows, &EngineSettings::default());

        let root = tree.find(&NodeId::new("root")).unwrap();
        assert_eq!(root.gross, Some(12.0));
        assert_eq!(root.display, Some(12.0));
        assert_eq!(root.missing_reason, None);

        let b = tree.find(&NodeId::new("b")).unwrap();
        assert_eq!(b.display, None);
        assert_eq!(b.missing_reason.as_deref(), Some(REASON_NO_DATA));
    }

    #[test]
    fn test_monotonic_absence_propagates_with_reasons() {
        // No rows anywhere: every node absent, every node carries a reason.
        let tree = run(&two_leaf_tree(), &[], &EngineSettings::default());
        for node in tree.walk() {
            assert_eq!(node.display, None);
            assert!(node.missing_reason.is_some(), "node {} has no reason", node.id);
        }
        // Leaves report "no data"; the internal fold reports the view reason.
        assert_eq!(
            tree.find(&NodeId::new("a")).unwrap().missing_reason.as_deref(),
            Some(REASON_NO_DATA)
        );
        assert_eq!(
            tree.find(&NodeId::new("root")).unwrap().missing_reason.as_deref(),
            Some(REASON_NO_GROSS)
        );
    }

    #[test]
    fn test_appetite_folds_min_regardless_of_mode() {
        let mut r1 = scored_row(&["root", "a"], 2, 2);
        r1.risk_appetite = 6.0;
        let mut r2 = scored_row(&["root", "b"], 4, 4);
        r2.risk_appetite = 12.0;
        let rows = vec![r1, r2];

        for mode in [AggregationMode::Weighted, AggregationMode::Max] {
            let settings = EngineSettings::default().with_aggregation(mode);
            let tree = run(&two_leaf_tree(), &rows, &settings);
            let root = tree.find(&NodeId::new("root")).unwrap();
            assert_eq!(root.appetite, Some(6.0), "mode {mode:?}");
        }
    }

    #[test]
    fn test_child_fold_uses_child_weights() {
        // Children a (gross 12) and b (gross 1); override b's weight to 2.
        let rows = vec![
            scored_row(&["root", "a"], 3, 4),
            scored_row(&["root", "b"], 1, 1),
        ];
        let mut weights = WeightConfig::default();
        weights.set_node_override("b", 2.0).unwrap();

        let tree = aggregate_tree(
            &two_leaf_tree(),
            Domain::Risk,
            &rows,
            &weights,
            &[],
            &[],
            &EngineSettings::default(),
        )
        .unwrap();

        // Leaf b scores with the override too (weight tied to the node),
        // but single-row leaves are unaffected by their own weight; the
        // root fold sees (12, w=1) and (1, w=2): round(14/3, 1) = 4.7.
        let root = tree.find(&NodeId::new("root")).unwrap();
        assert_eq!(root.gross, Some(4.7));
    }

    #[test]
    fn test_max_mode_takes_worst_child() {
        let rows = vec![
            scored_row(&["root", "a"], 3, 4),
            scored_row(&["root", "b"], 1, 1),
        ];
        let settings = EngineSettings::default().with_aggregation(AggregationMode::Max);
        let tree = run(&two_leaf_tree(), &rows, &settings);
        assert_eq!(tree.find(&NodeId::new("root")).unwrap().gross, Some(12.0));
    }

    #[test]
    fn test_hide_empty_removes_dataless_depth1_branch() {
        let forest = vec![
            TaxonomyNode::new("r1", "With data").with_child(TaxonomyNode::new("r1.1", "Leaf")),
            TaxonomyNode::new("r2", "Empty").with_child(TaxonomyNode::new("r2.1", "Leaf")),
        ];
        let rows = vec![scored_row(&["r1", "r1.1"], 2, 3)];

        let shown = run(&forest, &rows, &EngineSettings::default());
        assert_eq!(shown.roots.len(), 2);

        let settings = EngineSettings::default().with_hide_empty(true);
        let hidden = run(&forest, &rows, &settings);
        assert_eq!(hidden.roots.len(), 1);
        assert_eq!(hidden.roots[0].id, NodeId::new("r1"));
        // Values for the surviving branch are unchanged by the removal.
        assert_eq!(
            hidden.find(&NodeId::new("r1")).unwrap().gross,
            shown.find(&NodeId::new("r1")).unwrap().gross
        );
    }

    #[test]
    fn test_hide_empty_never_filters_below_depth_one() {
        // r1 has data in one sub-branch only; the empty depth-2 branch stays.
        let forest = vec![TaxonomyNode::new("r1", "Root")
            .with_child(TaxonomyNode::new("r1.1", "Scored"))
            .with_child(TaxonomyNode::new("r1.2", "Empty"))];
        let rows = vec![scored_row(&["r1", "r1.1"], 2, 3)];

        let settings = EngineSettings::default().with_hide_empty(true);
        let tree = run(&forest, &rows, &settings);
        assert!(tree.find(&NodeId::new("r1.2")).is_some());
    }

    #[test]
    fn test_hide_empty_considers_view_mode() {
        // Rows carry gross scores but no appetite is unrepresentable
        // (appetite always present), so use the net view: a branch whose
        // rows have unscored controls has no net data.
        let forest = vec![
            TaxonomyNode::new("r1", "Gross only"),
            TaxonomyNode::new("r2", "Scored"),
        ];
        let mut gross_only = scored_row(&["r1"], 3, 3);
        gross_only
            .embedded_controls
            .push(Control::unscored(Uuid::new_v4()));
        let rows = vec![gross_only, scored_row(&["r2"], 2, 2)];

        let settings = EngineSettings::default()
            .with_view(ViewMode::Net)
            .with_hide_empty(true);
        let tree = run(&forest, &rows, &settings);
        assert!(tree.find(&NodeId::new("r1")).is_none());
        assert!(tree.find(&NodeId::new("r2")).is_some());
    }

    #[test]
    fn test_net_reason_distinguishes_unscored_controls() {
        let forest = vec![
            TaxonomyNode::new("r1", "Unscored controls"),
            TaxonomyNode::new("r2", "No controls"),
        ];
        let mut with_controls = make_row(&["r1"], &["p1"]);
        with_controls
            .embedded_controls
            .push(Control::unscored(Uuid::new_v4()));
        let no_controls = make_row(&["r2"], &["p1"]);
        let rows = vec![with_controls, no_controls];

        let settings = EngineSettings::default().with_view(ViewMode::Net);
        let tree = run(&forest, &rows, &settings);

        let r1 = tree.find(&NodeId::new("r1")).unwrap();
        let r2 = tree.find(&NodeId::new("r2")).unwrap();
        assert_eq!(r1.display, None);
        assert_eq!(r2.display, None);
        assert_ne!(r1.missing_reason, r2.missing_reason);
        assert_eq!(r2.missing_reason.as_deref(), Some(REASON_NO_NET));
    }

    #[test]
    fn test_max_abs_delta_scans_delta_views_only() {
        let mut row = scored_row(&["root", "a"], 4, 4);
        row.risk_appetite = 6.0;
        let rows = vec![row];

        let absolute = run(&two_leaf_tree(), &rows, &EngineSettings::default());
        assert_eq!(absolute.max_abs_delta, SCALE_MAX_SCORE);

        let settings = EngineSettings::default().with_view(ViewMode::DeltaVsAppetite);
        let delta = run(&two_leaf_tree(), &rows, &settings);
        // gross 16 - appetite 6 = 10 at both the leaf and the root.
        assert_eq!(delta.max_abs_delta, 10.0);
    }

    #[test]
    fn test_deterministic_output() {
        let rows = vec![
            scored_row(&["root", "a"], 3, 4),
            scored_row(&["root", "b"], 2, 5),
        ];
        let settings = EngineSettings::default().with_view(ViewMode::DeltaGrossNet);
        let first = run(&two_leaf_tree(), &rows, &settings);
        let second = run(&two_leaf_tree(), &rows, &settings);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_depth_violation_refuses_whole_call() {
        let mut node = TaxonomyNode::new("n6", "Too deep");
        for i in (1..6).rev() {
            node = TaxonomyNode::new(format!("n{i}"), "Level").with_child(node);
        }
        let err = aggregate_tree(
            &[node],
            Domain::Risk,
            &[],
            &WeightConfig::default(),
            &[],
            &[],
            &EngineSettings::default(),
        )
        .unwrap_err();
        assert_eq!(err.code(), "DEPTH_EXCEEDED");
    }
}
