//! Per-node request lifecycle: the two-phase turn protocol.
//!
//! A submission is `begin_turn` (snapshot history-before, mark busy, append
//! the user turn, hand back a ticket carrying the request payload) followed
//! by `complete_turn` (apply the gateway's success or failure). The two
//! phases are separately drivable so the state machine can be exercised
//! without a real gateway; [`Canvas::run_turn`] and [`Canvas::submit`]
//! compose them around the actual await.

use tracing::instrument;

use super::{Canvas, EngineError, TurnOutcome, TurnSource};
use crate::event_bus::CanvasEvent;
use crate::gateway::{GatewayError, GatewayReply};
use crate::message::Turn;
use crate::thoughts;
use crate::types::NodeId;

/// Claim on a node's single in-flight slot, produced by
/// [`Canvas::begin_turn`].
///
/// Carries the request payload (history before this turn, plus the new
/// user turn) and the model binding captured at begin time; a later
/// `set_model` does not affect a dispatched request.
#[derive(Clone, Debug)]
pub struct TurnTicket {
    node_id: NodeId,
    model_id: String,
    request: Vec<Turn>,
}

impl TurnTicket {
    /// The node this ticket belongs to.
    #[must_use]
    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    /// The model binding captured when the turn began.
    #[must_use]
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// The payload for the gateway: prior history plus exactly one new
    /// user turn, never a duplicated one.
    #[must_use]
    pub fn request(&self) -> &[Turn] {
        &self.request
    }
}

/// Result of the begin phase.
#[derive(Clone, Debug)]
pub enum BeginTurn {
    /// Preconditions held; the node is now busy.
    Started(TurnTicket),
    /// Piped duplicate: nothing was mutated, nothing to complete.
    Suppressed,
}

enum Prepared {
    Ticket(TurnTicket),
    Duplicate,
}

impl Canvas {
    /// Phase one: validate, mark busy, append the user turn, build the
    /// request payload.
    ///
    /// Fails with [`EngineError::NodeBusy`] while a request is in flight
    /// (one pending turn per node) and [`EngineError::UnknownNode`] for
    /// ids that do not resolve. For piped turns, a payload already present
    /// as a user turn in the target's history returns
    /// [`BeginTurn::Suppressed`] without touching the node or the gateway.
    pub fn begin_turn(
        &self,
        id: &NodeId,
        text: &str,
        source: TurnSource,
    ) -> Result<BeginTurn, EngineError> {
        let prepared = self
            .nodes()
            .with_mut(id, |node| {
                if node.busy {
                    return Err(EngineError::NodeBusy { id: id.clone() });
                }
                if source == TurnSource::Piped && node.has_user_turn(text) {
                    return Ok(Prepared::Duplicate);
                }
                // Payload = history before this turn + the new user turn,
                // assembled before the append so the new turn can never be
                // duplicated inside the outgoing request.
                let mut request = node.history.clone();
                request.push(Turn::user(text));
                node.busy = true;
                node.push_user(text);
                Ok(Prepared::Ticket(TurnTicket {
                    node_id: id.clone(),
                    model_id: node.model_id.clone(),
                    request,
                }))
            })
            .ok_or_else(|| EngineError::UnknownNode { id: id.clone() })??;

        match prepared {
            Prepared::Duplicate => {
                tracing::debug!(node = %id, "duplicate piped payload suppressed");
                self.emit(CanvasEvent::duplicate_suppressed(id.clone()));
                Ok(BeginTurn::Suppressed)
            }
            Prepared::Ticket(ticket) => {
                self.emit(CanvasEvent::turn_started(id.clone(), source));
                Ok(BeginTurn::Started(ticket))
            }
        }
    }

    /// Phase two: reconcile the gateway's resolution into the node.
    ///
    /// On success the final output (thought segments stripped) becomes an
    /// assistant turn; on failure the message becomes a transcript error
    /// line. Either way the busy flag clears. A resolution for a node that
    /// was removed mid-flight is discarded without effect.
    pub fn complete_turn(
        &self,
        ticket: TurnTicket,
        result: Result<GatewayReply, GatewayError>,
    ) -> TurnOutcome {
        match result {
            Ok(reply) => {
                let extraction = thoughts::extract(&reply.text);
                let applied = self.nodes().with_mut(&ticket.node_id, |node| {
                    node.busy = false;
                    node.push_assistant(&extraction.final_output);
                });
                if applied.is_none() {
                    tracing::debug!(node = %ticket.node_id, "reply for removed node discarded");
                    self.emit(CanvasEvent::turn_discarded(ticket.node_id));
                    return TurnOutcome::Discarded;
                }
                self.emit(CanvasEvent::turn_replied(
                    ticket.node_id,
                    extraction.final_output.chars().count(),
                    extraction.thoughts.len(),
                ));
                TurnOutcome::Replied {
                    text: extraction.final_output,
                    thoughts: extraction.thoughts,
                }
            }
            Err(err) => {
                let message = err.to_string();
                let applied = self.nodes().with_mut(&ticket.node_id, |node| {
                    node.busy = false;
                    node.push_error(&message);
                });
                if applied.is_none() {
                    tracing::debug!(node = %ticket.node_id, "failure for removed node discarded");
                    self.emit(CanvasEvent::turn_discarded(ticket.node_id));
                    return TurnOutcome::Discarded;
                }
                tracing::warn!(node = %ticket.node_id, error = %message, "turn failed");
                self.emit(CanvasEvent::turn_failed(ticket.node_id, message.clone()));
                TurnOutcome::Failed { message }
            }
        }
    }

    /// Runs one full turn: begin, await the gateway, complete.
    ///
    /// Does not propagate; that decision belongs to the caller (the typed
    /// [`Canvas::submit`] path or a piped delivery) reading the live gate
    /// after this resolves.
    pub async fn run_turn(
        &self,
        id: &NodeId,
        text: &str,
        source: TurnSource,
    ) -> Result<TurnOutcome, EngineError> {
        let ticket = match self.begin_turn(id, text, source)? {
            BeginTurn::Started(ticket) => ticket,
            BeginTurn::Suppressed => return Ok(TurnOutcome::Suppressed),
        };
        let result = self.gateway.invoke(ticket.model_id(), ticket.request()).await;
        Ok(self.complete_turn(ticket, result))
    }

    /// Submits user-typed text to a node and, if the live auto-run gate
    /// reads enabled at the moment the reply lands, drives the full
    /// downstream cascade to quiescence before returning.
    ///
    /// Gateway failures come back as [`TurnOutcome::Failed`], recorded on
    /// the node's transcript; `Err` is reserved for busy/unknown-node
    /// precondition violations.
    #[instrument(skip(self, text), fields(node = %id))]
    pub async fn submit(&self, id: &NodeId, text: &str) -> Result<TurnOutcome, EngineError> {
        let outcome = self.run_turn(id, text, TurnSource::Typed).await?;
        if let TurnOutcome::Replied { text: reply, .. } = &outcome {
            if self.settings().auto_run_enabled() {
                self.propagate(id, reply).await;
            }
        }
        Ok(outcome)
    }
}
