//! Reply propagation: fan-out, chaining, and the cascade supervisor.
//!
//! Every outgoing edge gets its own spawned delivery task; siblings are
//! unordered and never block each other; the only ordering is cause
//! (origin reply) before effect (each target's submission). The supervisor
//! drains a [`JoinSet`], spawning the next hop whenever a delivery's own
//! reply lands with the live auto-run gate still enabled, and resolves
//! once the whole cascade is quiescent.

use tokio::task::JoinSet;
use tracing::instrument;

use super::{Canvas, TurnOutcome, TurnSource};
use crate::event_bus::CanvasEvent;
use crate::graph::{Edge, EdgeStatus};
use crate::types::NodeId;

/// A reply that still needs to fan out: `origin`'s outgoing edges carry
/// `payload` at the given hop depth.
struct Hop {
    origin: NodeId,
    payload: String,
    depth: u32,
}

impl Canvas {
    /// Forwards `payload` along every edge leaving `origin`, chaining
    /// through downstream replies while the live auto-run gate re-reads
    /// enabled, and returns once every spawned hop has resolved.
    ///
    /// Per hop: the edge set is snapshotted (structural edits mid-walk see
    /// a consistent view), targets that no longer resolve are skipped
    /// silently, and targets whose history already contains the payload as
    /// a user turn are suppressed without a gateway call. A failing hop
    /// terminates its own branch only.
    #[instrument(skip(self, payload), fields(origin = %origin))]
    pub async fn propagate(&self, origin: &NodeId, payload: &str) {
        let mut deliveries: JoinSet<Option<Hop>> = JoinSet::new();
        self.fan_out(&mut deliveries, origin.clone(), payload.to_string(), 0);

        while let Some(delivered) = deliveries.join_next().await {
            match delivered {
                Ok(Some(hop)) => self.fan_out(&mut deliveries, hop.origin, hop.payload, hop.depth),
                Ok(None) => {}
                Err(err) => tracing::warn!(error = %err, "delivery task aborted"),
            }
        }
    }

    /// Spawns one delivery task per resolvable outgoing edge.
    fn fan_out(
        &self,
        deliveries: &mut JoinSet<Option<Hop>>,
        origin: NodeId,
        payload: String,
        depth: u32,
    ) {
        if let Some(bound) = self.config.max_chain_depth {
            if depth >= bound {
                tracing::warn!(origin = %origin, depth, "chain reached depth bound");
                self.emit(CanvasEvent::chain_truncated(origin, depth));
                return;
            }
        }

        for edge in self.edges.outgoing_from(&origin) {
            if !self.nodes.contains(&edge.to) {
                tracing::debug!(edge = %edge.id, "skipping edge whose target no longer resolves");
                continue;
            }
            let canvas = self.clone();
            let payload = payload.clone();
            deliveries.spawn(async move { canvas.deliver(edge, payload, depth).await });
        }
    }

    /// Delivers one payload across one edge. Returns the follow-on hop if
    /// the target replied and the gate re-read enabled at that moment.
    async fn deliver(self, edge: Edge, payload: String, depth: u32) -> Option<Hop> {
        self.edges.set_status(&edge.id, EdgeStatus::Active);
        let outcome = self.run_turn(&edge.to, &payload, TurnSource::Piped).await;
        self.edges.set_status(&edge.id, EdgeStatus::Idle);

        match outcome {
            Ok(TurnOutcome::Replied { text, .. }) => {
                if self.settings.auto_run_enabled() {
                    Some(Hop {
                        origin: edge.to,
                        payload: text,
                        depth: depth + 1,
                    })
                } else {
                    tracing::debug!(node = %edge.to, "auto-run disabled, chain stops here");
                    None
                }
            }
            // Suppressed duplicates, contained failures, and discarded
            // resolutions all terminate this branch; siblings continue.
            Ok(_) => None,
            Err(err) => {
                tracing::warn!(target = %edge.to, error = %err, "piped delivery rejected");
                None
            }
        }
    }
}
