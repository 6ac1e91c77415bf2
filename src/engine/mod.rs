//! The propagation engine.
//!
//! [`Canvas`] is the top-level aggregate: it owns the node and edge stores,
//! a handle to the model gateway, the live settings, and the event channel.
//! The request lifecycle (two-phase turn protocol) lives in `lifecycle`;
//! the cascade walk lives in `propagation`.

mod lifecycle;
mod propagation;

pub use lifecycle::{BeginTurn, TurnTicket};

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::event_bus::{CanvasEvent, EventBus};
use crate::gateway::ModelGateway;
use crate::graph::{EdgeStore, NodeStore};
use crate::settings::LiveSettings;
use crate::types::{EdgeId, NodeId};

/// Default bound on chain depth per propagation walk.
///
/// A per-target history check cannot stop a true cycle whose payload text
/// changes every hop; the bound does. `None` in [`CanvasConfig`] opts back
/// into unbounded chaining.
pub const DEFAULT_MAX_CHAIN_DEPTH: u32 = 32;

/// Engine construction-time configuration.
#[derive(Clone, Copy, Debug)]
pub struct CanvasConfig {
    /// Maximum hop depth for one propagation walk; `None` = unbounded.
    pub max_chain_depth: Option<u32>,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            max_chain_depth: Some(DEFAULT_MAX_CHAIN_DEPTH),
        }
    }
}

/// How a submission entered the node.
///
/// Piped turns are distinguished only in that they are programmatically
/// triggered: they pass through the same lifecycle, plus the duplicate
/// check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnSource {
    /// Typed by the user at the node's input boundary.
    Typed,
    /// Forwarded from an upstream node's reply.
    Piped,
}

impl fmt::Display for TurnSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Typed => write!(f, "typed"),
            Self::Piped => write!(f, "piped"),
        }
    }
}

/// Terminal result of one submission.
///
/// Gateway failures terminate here as [`TurnOutcome::Failed`]: they are
/// recorded on the node's transcript and never escape the submission
/// boundary as an `Err`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The model replied; the assistant turn was appended.
    Replied {
        /// Final output with thought segments stripped.
        text: String,
        /// Extracted thought segments, in order of appearance.
        thoughts: Vec<String>,
    },
    /// The gateway failed; an error line was appended to the transcript.
    Failed { message: String },
    /// Piped payload already present in the target's history; nothing was
    /// submitted. An explicit no-op signal, not a failure.
    Suppressed,
    /// The node was removed while its request was in flight; the
    /// resolution was dropped.
    Discarded,
}

/// Submission precondition violations, the only errors that cross the
/// submission boundary.
#[derive(Debug, Error, Diagnostic)]
pub enum EngineError {
    /// The node id did not resolve.
    #[error("unknown node: {id}")]
    #[diagnostic(code(convograph::engine::unknown_node))]
    UnknownNode { id: NodeId },

    /// The node already has a request in flight. One pending turn per
    /// node; callers wait for the reply instead of queueing.
    #[error("node {id} already has a request in flight")]
    #[diagnostic(
        code(convograph::engine::node_busy),
        help("Disable the node's input while it is busy, or retry after the pending reply resolves.")
    )]
    NodeBusy { id: NodeId },
}

/// The live conversation graph and its propagation engine.
///
/// Cheap to clone; clones share all state. Every mutation funnels through
/// the stores' serialized entry points, and the only suspension points are
/// gateway awaits, so no lock is ever held across an await.
///
/// # Examples
/// ```no_run
/// use std::sync::Arc;
/// use convograph::engine::Canvas;
/// use convograph::gateway::OllamaGateway;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let canvas = Canvas::builder(Arc::new(OllamaGateway::from_env())).build();
/// canvas.settings().set_auto_run(true);
///
/// let a = canvas.create_node("llama3.1");
/// let b = canvas.create_node("llama3.1");
/// canvas.connect(&a, &b);
///
/// // B receives A's reply automatically once it arrives.
/// canvas.submit(&a, "Summarize the plan in one line.").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Canvas {
    nodes: NodeStore,
    edges: EdgeStore,
    gateway: Arc<dyn ModelGateway>,
    settings: LiveSettings,
    config: CanvasConfig,
    event_bus: Arc<EventBus>,
    event_tx: flume::Sender<CanvasEvent>,
}

impl Canvas {
    /// Starts a builder around the given gateway.
    #[must_use]
    pub fn builder(gateway: Arc<dyn ModelGateway>) -> CanvasBuilder {
        CanvasBuilder {
            gateway,
            config: CanvasConfig::default(),
            settings: LiveSettings::new(),
        }
    }

    /// Creates a node bound to `model_id` and returns its fresh id.
    pub fn create_node(&self, model_id: impl Into<String>) -> NodeId {
        let id = self.nodes.create(model_id);
        tracing::debug!(node = %id, "node created");
        id
    }

    /// Removes a node and cascades removal of every edge touching it.
    /// Idempotent. An in-flight request for the node resolves as a
    /// discarded no-op.
    pub fn remove_node(&self, id: &NodeId) {
        self.nodes.remove(id);
        let dropped = self.edges.remove_touching(id);
        tracing::debug!(node = %id, edges_dropped = dropped, "node removed");
    }

    /// Connects `from -> to`. Self-loops and duplicates are silent no-ops.
    pub fn connect(&self, from: &NodeId, to: &NodeId) -> Option<EdgeId> {
        self.edges.connect(from, to)
    }

    /// Removes one edge by id.
    pub fn disconnect(&self, id: &EdgeId) -> bool {
        self.edges.disconnect(id)
    }

    /// Removes every edge.
    pub fn clear_edges(&self) {
        self.edges.clear();
    }

    /// Model identifiers offered by the gateway.
    pub async fn list_models(&self) -> Result<Vec<String>, crate::gateway::GatewayError> {
        self.gateway.list_models().await
    }

    /// The node store.
    #[must_use]
    pub fn nodes(&self) -> &NodeStore {
        &self.nodes
    }

    /// The edge store.
    #[must_use]
    pub fn edges(&self) -> &EdgeStore {
        &self.edges
    }

    /// The live settings handle (auto-run gate).
    #[must_use]
    pub fn settings(&self) -> &LiveSettings {
        &self.settings
    }

    /// The engine configuration.
    #[must_use]
    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    /// The event bus carrying lifecycle events.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.event_bus
    }

    pub(crate) fn emit(&self, event: CanvasEvent) {
        // The bus keeps a receiver alive, so this only fails after drop.
        let _ = self.event_tx.send(event);
    }
}

/// Fluent construction for [`Canvas`].
pub struct CanvasBuilder {
    gateway: Arc<dyn ModelGateway>,
    config: CanvasConfig,
    settings: LiveSettings,
}

impl CanvasBuilder {
    /// Overrides the chain depth bound (`None` = unbounded).
    #[must_use]
    pub fn max_chain_depth(mut self, bound: Option<u32>) -> Self {
        self.config.max_chain_depth = bound;
        self
    }

    /// Uses an existing settings handle, e.g. one shared with a control
    /// panel.
    #[must_use]
    pub fn settings(mut self, settings: LiveSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Sets the initial auto-run state.
    #[must_use]
    pub fn auto_run(self, enabled: bool) -> Self {
        self.settings.set_auto_run(enabled);
        self
    }

    /// Finishes construction.
    #[must_use]
    pub fn build(self) -> Canvas {
        let event_bus = Arc::new(EventBus::new());
        let event_tx = event_bus.sender();
        Canvas {
            nodes: NodeStore::new(),
            edges: EdgeStore::new(),
            gateway: self.gateway,
            settings: self.settings,
            config: self.config,
            event_bus,
            event_tx,
        }
    }
}
