//! Directed edges between conversational nodes.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::types::{EdgeId, NodeId};

/// Advisory delivery state, for display feeds only. Never gates
/// propagation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeStatus {
    #[default]
    Idle,
    Pending,
    Active,
}

/// A directed link: the `from` node's replies are forwarded to `to`.
///
/// Edges reference nodes by id and never own them; an edge whose endpoint
/// has been removed is skipped by the propagation walk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// Deterministic id derived from `(from, to)`.
    pub id: EdgeId,
    pub from: NodeId,
    pub to: NodeId,
    pub status: EdgeStatus,
}

/// Owns the edge set. Insertion order is preserved so fan-out walks the
/// same sequence every run.
///
/// # Examples
/// ```
/// use convograph::graph::EdgeStore;
/// use convograph::types::NodeId;
///
/// let edges = EdgeStore::new();
/// let a = NodeId::from("a");
/// let b = NodeId::from("b");
///
/// assert!(edges.connect(&a, &b).is_some());
/// assert!(edges.connect(&a, &b).is_none()); // duplicate: no-op
/// assert!(edges.connect(&a, &a).is_none()); // self-loop: no-op
/// assert_eq!(edges.outgoing_from(&a).len(), 1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct EdgeStore {
    inner: Arc<RwLock<Vec<Edge>>>,
}

impl EdgeStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the directed edge `from -> to` with status [`EdgeStatus::Idle`].
    ///
    /// Self-loops and duplicates of an existing `(from, to)` pair are
    /// silent no-ops returning `None`.
    pub fn connect(&self, from: &NodeId, to: &NodeId) -> Option<EdgeId> {
        if from == to {
            tracing::debug!(node = %from, "ignoring self-loop connection");
            return None;
        }
        let id = EdgeId::for_pair(from, to);
        let mut guard = self.inner.write();
        if guard.iter().any(|e| e.id == id) {
            tracing::debug!(edge = %id, "ignoring duplicate connection");
            return None;
        }
        guard.push(Edge {
            id: id.clone(),
            from: from.clone(),
            to: to.clone(),
            status: EdgeStatus::Idle,
        });
        Some(id)
    }

    /// Removes the edge. Returns `false` if it did not exist.
    pub fn disconnect(&self, id: &EdgeId) -> bool {
        let mut guard = self.inner.write();
        let before = guard.len();
        guard.retain(|e| &e.id != id);
        guard.len() != before
    }

    /// Removes every edge.
    pub fn clear(&self) {
        self.inner.write().clear();
    }

    /// Removes every edge that starts or ends at `node`. Returns how many
    /// were dropped. Called by the node-removal cascade.
    pub fn remove_touching(&self, node: &NodeId) -> usize {
        let mut guard = self.inner.write();
        let before = guard.len();
        guard.retain(|e| &e.from != node && &e.to != node);
        before - guard.len()
    }

    /// Snapshot of the edges leaving `node`, in insertion order.
    ///
    /// Propagation consumes this: the returned clone is a consistent view
    /// that concurrent structural edits cannot corrupt mid-walk.
    #[must_use]
    pub fn outgoing_from(&self, node: &NodeId) -> Vec<Edge> {
        self.inner
            .read()
            .iter()
            .filter(|e| &e.from == node)
            .cloned()
            .collect()
    }

    /// Looks up a single edge by id.
    #[must_use]
    pub fn get(&self, id: &EdgeId) -> Option<Edge> {
        self.inner.read().iter().find(|e| &e.id == id).cloned()
    }

    /// Updates the advisory status. Returns `false` if the edge is gone,
    /// which can legitimately happen while a delivery is in flight.
    pub fn set_status(&self, id: &EdgeId, status: EdgeStatus) -> bool {
        let mut guard = self.inner.write();
        match guard.iter_mut().find(|e| &e.id == id) {
            Some(edge) => {
                edge.status = status;
                true
            }
            None => false,
        }
    }

    /// Snapshot of all edges in insertion order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Edge> {
        self.inner.read().clone()
    }

    /// Number of edges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Returns `true` if no edges exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}
