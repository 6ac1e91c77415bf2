use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::engine::TurnSource;
use crate::types::NodeId;

/// One observable engine transition.
///
/// Events are advisory: dropping them never changes engine behavior. They
/// carry enough metadata for a status feed (which node, when, how large the
/// reply was) without duplicating conversation content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CanvasEvent {
    /// A submission passed its preconditions and went busy.
    TurnStarted {
        node: NodeId,
        source: TurnSource,
        when: DateTime<Utc>,
    },
    /// A reply was applied to the node's log.
    TurnReplied {
        node: NodeId,
        reply_chars: usize,
        thought_segments: usize,
        when: DateTime<Utc>,
    },
    /// A gateway failure was captured as a transcript error line.
    TurnFailed {
        node: NodeId,
        message: String,
        when: DateTime<Utc>,
    },
    /// A resolution arrived for a node that no longer exists and was
    /// discarded.
    TurnDiscarded { node: NodeId, when: DateTime<Utc> },
    /// A piped payload was already present in the target's history.
    DuplicateSuppressed { node: NodeId, when: DateTime<Utc> },
    /// A propagation walk hit the configured depth bound.
    ChainTruncated {
        origin: NodeId,
        depth: u32,
        when: DateTime<Utc>,
    },
}

impl CanvasEvent {
    pub(crate) fn turn_started(node: NodeId, source: TurnSource) -> Self {
        Self::TurnStarted {
            node,
            source,
            when: Utc::now(),
        }
    }

    pub(crate) fn turn_replied(node: NodeId, reply_chars: usize, thought_segments: usize) -> Self {
        Self::TurnReplied {
            node,
            reply_chars,
            thought_segments,
            when: Utc::now(),
        }
    }

    pub(crate) fn turn_failed(node: NodeId, message: impl Into<String>) -> Self {
        Self::TurnFailed {
            node,
            message: message.into(),
            when: Utc::now(),
        }
    }

    pub(crate) fn turn_discarded(node: NodeId) -> Self {
        Self::TurnDiscarded {
            node,
            when: Utc::now(),
        }
    }

    pub(crate) fn duplicate_suppressed(node: NodeId) -> Self {
        Self::DuplicateSuppressed {
            node,
            when: Utc::now(),
        }
    }

    pub(crate) fn chain_truncated(origin: NodeId, depth: u32) -> Self {
        Self::ChainTruncated {
            origin,
            depth,
            when: Utc::now(),
        }
    }

    /// The node this event concerns.
    #[must_use]
    pub fn node(&self) -> &NodeId {
        match self {
            Self::TurnStarted { node, .. }
            | Self::TurnReplied { node, .. }
            | Self::TurnFailed { node, .. }
            | Self::TurnDiscarded { node, .. }
            | Self::DuplicateSuppressed { node, .. } => node,
            Self::ChainTruncated { origin, .. } => origin,
        }
    }
}

impl fmt::Display for CanvasEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TurnStarted { node, source, .. } => {
                write!(f, "turn started on {node} ({source})")
            }
            Self::TurnReplied {
                node, reply_chars, ..
            } => write!(f, "reply of {reply_chars} chars on {node}"),
            Self::TurnFailed { node, message, .. } => write!(f, "turn failed on {node}: {message}"),
            Self::TurnDiscarded { node, .. } => {
                write!(f, "discarded resolution for removed node {node}")
            }
            Self::DuplicateSuppressed { node, .. } => {
                write!(f, "duplicate payload suppressed for {node}")
            }
            Self::ChainTruncated { origin, depth, .. } => {
                write!(f, "chain from {origin} truncated at depth {depth}")
            }
        }
    }
}
