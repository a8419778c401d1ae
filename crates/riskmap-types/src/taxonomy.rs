//! Taxonomy types - the two classification forests (risk, process).
//!
//! A taxonomy is an ordered forest of named nodes, at most five levels deep.
//! The engine treats it as an immutable input for the duration of one
//! aggregation pass; editing and persistence live elsewhere.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum depth of a taxonomy tree. Roots of the forest are depth 1.
pub const MAX_TAXONOMY_DEPTH: usize = 5;

/// Which of the two classification trees a value belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Domain {
    Risk,
    Process,
}

impl Domain {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "risk" => Some(Self::Risk),
            "process" => Some(Self::Process),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            Self::Risk => "risk",
            Self::Process => "process",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

/// Stable opaque identifier for a taxonomy node, unique within its domain.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A node in one of the two taxonomy trees.
///
/// Depth is implied by ancestry, not stored; the engine's arena builder
/// derives and validates it. A node with no children is a leaf - the most
/// specific classification level for its domain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaxonomyNode {
    pub id: NodeId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TaxonomyNode>,
}

impl TaxonomyNode {
    pub fn new(id: impl Into<NodeId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            children: Vec::new(),
        }
    }

    /// Builder-style child attachment, used heavily in tests.
    pub fn with_child(mut self, child: TaxonomyNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}
