//! Identifier types for nodes and edges.
//!
//! Both identifiers are small newtypes over strings rather than raw string
//! concatenations: node ids come from a collision-resistant factory
//! ([`crate::graph::NodeStore::create`]), and edge ids are derived
//! deterministically from the ordered `(from, to)` pair so that the same
//! connection always maps to the same id.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque unique identifier for a conversational node.
///
/// Generated via UUID v4 by [`NodeId::generate`]; uniqueness is additionally
/// checked against the live registry by the node store's factory, so rapid
/// creation in a tight loop can never hand out the same id twice.
///
/// # Examples
/// ```
/// use convograph::types::NodeId;
///
/// let a = NodeId::generate();
/// let b = NodeId::generate();
/// assert_ne!(a, b);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Draws a fresh random id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
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

/// Deterministic identifier for a directed edge.
///
/// Derived from the ordered `(from, to)` node pair, so the edge store can
/// detect duplicate connections by id alone.
///
/// # Examples
/// ```
/// use convograph::types::{EdgeId, NodeId};
///
/// let a = NodeId::from("a");
/// let b = NodeId::from("b");
/// assert_eq!(EdgeId::for_pair(&a, &b), EdgeId::for_pair(&a, &b));
/// assert_ne!(EdgeId::for_pair(&a, &b), EdgeId::for_pair(&b, &a));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(String);

impl EdgeId {
    /// Derives the id for the directed pair `from -> to`.
    #[must_use]
    pub fn for_pair(from: &NodeId, to: &NodeId) -> Self {
        Self(format!("{from}->{to}"))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_node_ids_are_unique_in_a_tight_loop() {
        let mut seen = std::collections::HashSet::new();
        for _ in 0..10_000 {
            assert!(seen.insert(NodeId::generate()));
        }
    }

    #[test]
    fn edge_id_is_deterministic_and_directed() {
        let from = NodeId::from("left");
        let to = NodeId::from("right");
        let id = EdgeId::for_pair(&from, &to);
        assert_eq!(id.as_str(), "left->right");
        assert_eq!(id, EdgeId::for_pair(&from, &to));
        assert_ne!(id, EdgeId::for_pair(&to, &from));
    }
}
