//! Registry and lifecycle owner for conversational nodes.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;

use crate::message::Turn;
use crate::node::ChatNode;
use crate::types::NodeId;

/// Owns every [`ChatNode`] and serializes all mutation through one lock.
///
/// The store is a cheap-clone handle; clones share the same registry.
/// Critical sections are short and never held across an await point: the
/// only suspension in the system is the gateway call, which happens between
/// store operations, not inside them.
///
/// # Examples
/// ```
/// use convograph::graph::NodeStore;
///
/// let nodes = NodeStore::new();
/// let id = nodes.create("llama3.1");
/// assert!(nodes.get(&id).is_some());
/// nodes.remove(&id);
/// assert!(nodes.get(&id).is_none());
/// ```
#[derive(Clone, Debug, Default)]
pub struct NodeStore {
    inner: Arc<RwLock<FxHashMap<NodeId, ChatNode>>>,
}

impl NodeStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a node with a fresh unique id, empty logs, `busy = false`.
    ///
    /// The factory double-checks the drawn id against the registry while
    /// holding the write lock, so even a tight creation loop cannot produce
    /// a collision.
    pub fn create(&self, initial_model_id: impl Into<String>) -> NodeId {
        let model_id = initial_model_id.into();
        let mut guard = self.inner.write();
        let id = loop {
            let candidate = NodeId::generate();
            if !guard.contains_key(&candidate) {
                break candidate;
            }
        };
        guard.insert(id.clone(), ChatNode::new(id.clone(), model_id));
        id
    }

    /// Removes a node. Idempotent: unknown ids are a silent no-op.
    pub fn remove(&self, id: &NodeId) {
        self.inner.write().remove(id);
    }

    /// Returns a snapshot of the node, or `None` if absent.
    #[must_use]
    pub fn get(&self, id: &NodeId) -> Option<ChatNode> {
        self.inner.read().get(id).cloned()
    }

    /// Returns `true` if the node currently exists.
    #[must_use]
    pub fn contains(&self, id: &NodeId) -> bool {
        self.inner.read().contains_key(id)
    }

    /// Rebinds the node to a different model. Returns `false` for unknown
    /// ids. Requests already dispatched keep the binding they started with.
    pub fn set_model(&self, id: &NodeId, model_id: impl Into<String>) -> bool {
        self.with_mut(id, |node| node.model_id = model_id.into())
            .is_some()
    }

    /// Clears history and transcript without destroying the node or
    /// touching its busy flag. Returns `false` for unknown ids.
    pub fn reset_context(&self, id: &NodeId) -> bool {
        self.with_mut(id, ChatNode::clear_context).is_some()
    }

    /// Snapshot of the node's model-visible history.
    #[must_use]
    pub fn history(&self, id: &NodeId) -> Option<Vec<Turn>> {
        self.inner.read().get(id).map(|n| n.history.clone())
    }

    /// Appends a user turn to history and transcript.
    pub fn append_user_turn(&self, id: &NodeId, text: &str) -> bool {
        self.with_mut(id, |node| node.push_user(text)).is_some()
    }

    /// Appends an assistant turn to history and transcript.
    pub fn append_assistant_turn(&self, id: &NodeId, text: &str) -> bool {
        self.with_mut(id, |node| node.push_assistant(text)).is_some()
    }

    /// Appends an error line to the transcript only.
    pub fn append_error_line(&self, id: &NodeId, text: &str) -> bool {
        self.with_mut(id, |node| node.push_error(text)).is_some()
    }

    /// Renders the node's transcript, or `None` if absent.
    #[must_use]
    pub fn render_transcript(&self, id: &NodeId) -> Option<String> {
        self.inner.read().get(id).map(ChatNode::render_transcript)
    }

    /// Ids of all live nodes, in no particular order.
    #[must_use]
    pub fn ids(&self) -> Vec<NodeId> {
        self.inner.read().keys().cloned().collect()
    }

    /// Number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Returns `true` if no nodes exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Runs `f` against the node under the write lock. `None` if absent.
    ///
    /// This is the single serialized mutation point the request lifecycle
    /// builds on: check-busy-and-mark, append, and reconcile each happen
    /// inside one closure so no interleaving can split them.
    pub(crate) fn with_mut<R>(&self, id: &NodeId, f: impl FnOnce(&mut ChatNode) -> R) -> Option<R> {
        self.inner.write().get_mut(id).map(f)
    }
}
