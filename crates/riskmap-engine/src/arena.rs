//! Taxonomy arena - flat parent/child index built once per aggregation call.
//!
//! The engine never walks the nested `TaxonomyNode` structure during
//! aggregation. One top-down pass flattens it into an arena with explicit
//! parent indices and derived depths, which:
//!
//! - validates depth (> 5 is refused, not truncated) up front,
//! - makes cyclic parentage unrepresentable by construction (each owned node
//!   is visited exactly once),
//! - gives the aggregation pass a defined post-order to fold over.

use crate::error::EngineError;
use riskmap_types::{NodeId, TaxonomyNode, MAX_TAXONOMY_DEPTH};
use std::collections::BTreeMap;

/// One flattened taxonomy node.
#[derive(Debug, Clone)]
pub struct ArenaEntry {
    pub id: NodeId,
    pub name: String,
    /// 1-based level; roots of the forest are depth 1.
    pub depth: usize,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

impl ArenaEntry {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Flat index over one domain's taxonomy forest.
#[derive(Debug, Clone)]
pub struct TaxonomyArena {
    entries: Vec<ArenaEntry>,
    roots: Vec<usize>,
    by_id: BTreeMap<NodeId, usize>,
}

impl TaxonomyArena {
    /// Flatten a forest, validating depth and id uniqueness.
    pub fn build(forest: &[TaxonomyNode]) -> Result<Self, EngineError> {
        let mut arena = Self {
            entries: Vec::new(),
            roots: Vec::new(),
            by_id: BTreeMap::new(),
        };
        for root in forest {
            let idx = arena.insert(root, None, 1)?;
            arena.roots.push(idx);
        }
        Ok(arena)
    }

    fn insert(
        &mut self,
        node: &TaxonomyNode,
        parent: Option<usize>,
        depth: usize,
    ) -> Result<usize, EngineError> {
        if depth > MAX_TAXONOMY_DEPTH {
            return Err(EngineError::DepthExceeded {
                id: node.id.clone(),
                depth,
            });
        }
        if self.by_id.contains_key(&node.id) {
            return Err(EngineError::DuplicateNodeId {
                id: node.id.clone(),
            });
        }

        let idx = self.entries.len();
        self.entries.push(ArenaEntry {
            id: node.id.clone(),
            name: node.name.clone(),
            depth,
            parent,
            children: Vec::new(),
        });
        self.by_id.insert(node.id.clone(), idx);

        for child in &node.children {
            let child_idx = self.insert(child, Some(idx), depth + 1)?;
            self.entries[idx].children.push(child_idx);
        }
        Ok(idx)
    }

    pub fn entry(&self, idx: usize) -> &ArenaEntry {
        &self.entries[idx]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    pub fn lookup(&self, id: &NodeId) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    /// Indices of every leaf, in document order.
    pub fn leaves(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.entries.len()).filter(|&i| self.entries[i].is_leaf())
    }

    /// Post-order over the given subtree roots: children before parent,
    /// document order among siblings. Drives the aggregation fold.
    pub fn post_order_from(&self, roots: &[usize]) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.entries.len());
        for &root in roots {
            self.post_order_into(root, &mut order);
        }
        order
    }

    fn post_order_into(&self, idx: usize, out: &mut Vec<usize>) {
        for &child in &self.entries[idx].children {
            self.post_order_into(child, out);
        }
        out.push(idx);
    }

    /// Indices of the whole subtree under `root`, pre-order.
    pub fn subtree(&self, root: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(idx) = stack.pop() {
            out.push(idx);
            stack.extend(self.entries[idx].children.iter().rev());
        }
        out
    }
}
