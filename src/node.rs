//! The conversational node value type.
//!
//! A [`ChatNode`] binds a model identifier to an ordered conversation:
//! `history` is the model-visible sequence of [`Turn`]s, `transcript` the
//! display log (a superset that also carries error lines). Nodes are plain
//! values owned by [`crate::graph::NodeStore`]; all mutation happens through
//! the store's serialized entry points.

use serde::{Deserialize, Serialize};

use crate::message::Turn;
use crate::transcript::{self, TranscriptEntry};
use crate::types::NodeId;

/// A single conversational node bound to one model.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatNode {
    /// Opaque unique identifier.
    pub id: NodeId,
    /// The model this node submits to. Mutable; an in-flight request keeps
    /// the binding it was dispatched with.
    pub model_id: String,
    /// Model-visible conversation context, in order.
    pub history: Vec<Turn>,
    /// Display log: history plus error lines.
    pub transcript: Vec<TranscriptEntry>,
    /// True while a model call for this node is in flight.
    pub busy: bool,
}

impl ChatNode {
    pub(crate) fn new(id: NodeId, model_id: impl Into<String>) -> Self {
        Self {
            id,
            model_id: model_id.into(),
            history: Vec::new(),
            transcript: Vec::new(),
            busy: false,
        }
    }

    /// Appends a user turn to both history and transcript.
    pub(crate) fn push_user(&mut self, text: &str) {
        self.history.push(Turn::user(text));
        self.transcript.push(TranscriptEntry::user(text));
    }

    /// Appends an assistant turn to both history and transcript.
    pub(crate) fn push_assistant(&mut self, text: &str) {
        self.history.push(Turn::assistant(text));
        self.transcript.push(TranscriptEntry::assistant(text));
    }

    /// Appends an error line to the transcript only.
    pub(crate) fn push_error(&mut self, text: &str) {
        self.transcript.push(TranscriptEntry::error(text));
    }

    /// Clears history and transcript. The busy flag is left alone: a reset
    /// does not cancel an in-flight request, its resolution is discarded or
    /// appended to the fresh log depending on timing.
    pub(crate) fn clear_context(&mut self) {
        self.history.clear();
        self.transcript.clear();
    }

    /// Returns `true` if any user turn in history equals `text` exactly.
    ///
    /// This is the propagation de-duplication predicate: a piped payload a
    /// node has already received must not be delivered again.
    #[must_use]
    pub fn has_user_turn(&self, text: &str) -> bool {
        self.history.iter().any(|t| t.is_user() && t.content == text)
    }

    /// Renders the transcript as a newline-separated block.
    #[must_use]
    pub fn render_transcript(&self) -> String {
        transcript::render(&self.transcript)
    }
}
