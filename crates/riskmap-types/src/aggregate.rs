//! Engine output - the fully aggregated exposure tree.
//!
//! `AggregateNode` is a pure derived projection: recomputed on every engine
//! call, never persisted. Both presentation surfaces (tabular heat-map and
//! radial sunburst) consume this same structure, which is what guarantees
//! they show identical numbers for the same node.

use crate::taxonomy::NodeId;
use serde::{Deserialize, Serialize};

/// Aggregated scores for one taxonomy node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AggregateNode {
    pub id: NodeId,
    /// Display name, carried through from the taxonomy untouched.
    pub name: String,
    /// 1-based taxonomy level.
    pub depth: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gross: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appetite: Option<f64>,
    /// The value for the active view mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<f64>,
    /// Why `display` is absent, when it is.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<AggregateNode>,
}

impl AggregateNode {
    /// Depth-first lookup by node id.
    pub fn find(&self, id: &NodeId) -> Option<&AggregateNode> {
        if &self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }

    /// Depth-first pre-order iteration over this node and its descendants.
    pub fn walk(&self) -> impl Iterator<Item = &AggregateNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }
}

/// One aggregation pass over a domain's full tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExposureTree {
    pub roots: Vec<AggregateNode>,
    /// Color-scale calibration bound for the active view mode: the largest
    /// absolute display value for delta modes, the scale maximum otherwise.
    pub max_abs_delta: f64,
}

impl ExposureTree {
    /// Depth-first lookup by node id across all roots.
    pub fn find(&self, id: &NodeId) -> Option<&AggregateNode> {
        self.roots.iter().find_map(|r| r.find(id))
    }

    /// Iterate every node in the tree, pre-order, roots in document order.
    pub fn walk(&self) -> impl Iterator<Item = &AggregateNode> {
        self.roots.iter().flat_map(|r| r.walk())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(id: &str, display: Option<f64>) -> AggregateNode {
        AggregateNode {
            id: NodeId::new(id),
            name: id.to_string(),
            depth: 2,
            gross: display,
            net: None,
            appetite: None,
            display,
            missing_reason: None,
            children: Vec::new(),
        }
    }

    #[test]
    fn test_find_descends() {
        let mut root = leaf("root", None);
        root.depth = 1;
        root.children = vec![leaf("a", Some(4.0)), leaf("b", None)];
        let tree = ExposureTree {
            roots: vec![root],
            max_abs_delta: 25.0,
        };
        assert_eq!(tree.find(&NodeId::new("a")).unwrap().display, Some(4.0));
        assert!(tree.find(&NodeId::new("missing")).is_none());
    }

    #[test]
    fn test_walk_is_preorder() {
        let mut root = leaf("root", None);
        root.children = vec![leaf("a", None), leaf("b", None)];
        let tree = ExposureTree {
            roots: vec![root],
            max_abs_delta: 25.0,
        };
        let order: Vec<&str> = tree.walk().map(|n| n.id.as_str()).collect();
        assert_eq!(order, vec!["root", "a", "b"]);
    }

    #[test]
    fn test_absent_fields_omitted() {
        let node = leaf("a", None);
        let json = serde_json::to_value(&node).unwrap();
        assert!(json.get("display").is_none());
        assert!(json.get("missing_reason").is_none());
        assert!(json.get("children").is_none());
    }
}
