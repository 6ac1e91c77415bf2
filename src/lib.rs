//! # Convograph: a propagating graph of live model conversations
//!
//! Convograph models a canvas of independent conversational nodes, each
//! bound to its own language model and carrying its own history, wired
//! together by directed edges. When auto-run is enabled, a node's reply
//! fans out along its outgoing edges and becomes the input of every
//! downstream node, chaining hop by hop, with duplicate payloads
//! suppressed per target.
//!
//! ## Core concepts
//!
//! - **Nodes**: per-conversation state (model binding, history, transcript,
//!   busy flag), owned by [`graph::NodeStore`]
//! - **Edges**: directed forwarding links with advisory status, owned by
//!   [`graph::EdgeStore`]
//! - **Lifecycle**: at most one in-flight model call per node, driven as an
//!   explicit begin/complete protocol ([`engine::Canvas::begin_turn`] /
//!   [`engine::Canvas::complete_turn`])
//! - **Propagation**: fan-out, chaining, de-duplication, and a live
//!   auto-run gate re-read at every hop ([`engine::Canvas::propagate`])
//! - **Gateway**: the model backend behind the [`gateway::ModelGateway`]
//!   trait; an Ollama client ships behind the default `ollama` feature
//!
//! ## Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use convograph::engine::Canvas;
//! use convograph::gateway::OllamaGateway;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let canvas = Canvas::builder(Arc::new(OllamaGateway::from_env()))
//!     .auto_run(true)
//!     .build();
//!
//! let models = canvas.list_models().await?;
//! let writer = canvas.create_node(models[0].clone());
//! let critic = canvas.create_node(models[0].clone());
//! canvas.connect(&writer, &critic);
//!
//! // The critic automatically receives and answers the writer's reply.
//! canvas.submit(&writer, "Draft a haiku about rain.").await?;
//! println!("{}", canvas.nodes().render_transcript(&critic).unwrap());
//! # Ok(())
//! # }
//! ```
//!
//! ## Module guide
//!
//! - [`message`] - Conversation turns and roles
//! - [`transcript`] - Display log entries and rendering
//! - [`node`] - The conversational node value type
//! - [`graph`] - Node and edge stores
//! - [`engine`] - Canvas, request lifecycle, propagation
//! - [`gateway`] - Model backend trait and the Ollama client
//! - [`thoughts`] - Thought-tag extraction from raw replies
//! - [`settings`] - The live auto-run gate
//! - [`event_bus`] - Lifecycle event feed and sinks
//! - [`telemetry`] - Tracing setup

pub mod engine;
pub mod event_bus;
pub mod gateway;
pub mod graph;
pub mod message;
pub mod node;
pub mod settings;
pub mod telemetry;
pub mod thoughts;
pub mod transcript;
pub mod types;
