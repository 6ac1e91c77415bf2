use std::io::{self, Result as IoResult, Write};
use std::sync::{Arc, Mutex};
use tokio::{sync::oneshot, task};

use super::event::CanvasEvent;

/// Output target consuming whole events.
pub trait EventSink: Send + Sync {
    fn handle(&mut self, event: &CanvasEvent) -> IoResult<()>;
}

/// Line-per-event stdout sink.
#[derive(Default)]
pub struct StdOutSink;

impl EventSink for StdOutSink {
    fn handle(&mut self, event: &CanvasEvent) -> IoResult<()> {
        let mut handle = io::stdout();
        writeln!(handle, "{event}")?;
        handle.flush()
    }
}

/// In-memory sink for tests and snapshots.
#[derive(Clone, Default)]
pub struct MemorySink {
    entries: Arc<Mutex<Vec<CanvasEvent>>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every captured event.
    #[must_use]
    pub fn snapshot(&self) -> Vec<CanvasEvent> {
        self.entries.lock().unwrap().clone()
    }

    /// Drops all captured events.
    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

impl EventSink for MemorySink {
    fn handle(&mut self, event: &CanvasEvent) -> IoResult<()> {
        self.entries.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// Receives engine events and broadcasts them to attached sinks.
///
/// Producers hold a cloned sender; consumers either read the receiver
/// directly (see [`EventBus::drain`]) or attach sinks and call
/// [`EventBus::listen`]. The listener is idempotent and competes with
/// direct receivers for events, so pick one consumption style per bus.
pub struct EventBus {
    channel: (flume::Sender<CanvasEvent>, flume::Receiver<CanvasEvent>),
    sinks: Arc<Mutex<Vec<Box<dyn EventSink>>>>,
    listener: Mutex<Option<ListenerState>>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    /// Creates a bus with no sinks attached.
    #[must_use]
    pub fn new() -> Self {
        Self {
            channel: flume::unbounded(),
            sinks: Arc::new(Mutex::new(Vec::new())),
            listener: Mutex::new(None),
        }
    }

    /// Sender handle for event producers.
    #[must_use]
    pub fn sender(&self) -> flume::Sender<CanvasEvent> {
        self.channel.0.clone()
    }

    /// Receiver handle for direct consumption.
    #[must_use]
    pub fn receiver(&self) -> flume::Receiver<CanvasEvent> {
        self.channel.1.clone()
    }

    /// Removes and returns everything currently queued.
    #[must_use]
    pub fn drain(&self) -> Vec<CanvasEvent> {
        self.channel.1.try_iter().collect()
    }

    /// Attaches a sink; takes effect for events the listener handles after
    /// this call.
    pub fn add_sink<S: EventSink + 'static>(&self, sink: S) {
        self.sinks.lock().unwrap().push(Box::new(sink));
    }

    /// Spawns the background task that forwards events to sinks.
    /// Idempotent: subsequent calls are no-ops.
    pub fn listen(&self) {
        let mut guard = self.listener.lock().unwrap();
        if guard.is_some() {
            return;
        }

        let receiver = self.channel.1.clone();
        let sinks = self.sinks.clone();
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let handle = task::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    recv = receiver.recv_async() => match recv {
                        Err(_) => break,
                        Ok(event) => {
                            let mut sinks = sinks.lock().unwrap();
                            for sink in sinks.iter_mut() {
                                if let Err(err) = sink.handle(&event) {
                                    tracing::warn!(error = %err, "event sink failed");
                                }
                            }
                        }
                    }
                }
            }
        });

        *guard = Some(ListenerState {
            shutdown_tx,
            handle,
        });
    }

    /// Stops the background listener, waiting for it to wind down.
    pub async fn stop(&self) {
        let state = self.listener.lock().unwrap().take();
        if let Some(state) = state {
            let _ = state.shutdown_tx.send(());
            let _ = state.handle.await;
        }
    }
}

impl Drop for EventBus {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.listener.lock() {
            if let Some(state) = guard.take() {
                let _ = state.shutdown_tx.send(());
                state.handle.abort();
            }
        }
    }
}

struct ListenerState {
    shutdown_tx: oneshot::Sender<()>,
    handle: task::JoinHandle<()>,
}
