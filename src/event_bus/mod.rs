//! Lifecycle event feed for observers.
//!
//! The engine emits a [`CanvasEvent`] at every interesting transition:
//! turn started, reply applied, failure captured, duplicate suppressed,
//! chain truncated. Observers either drain the flume channel directly
//! (tests, status bars) or attach [`EventSink`]s and start the background
//! listener.

mod bus;
mod event;

pub use bus::{EventBus, EventSink, MemorySink, StdOutSink};
pub use event::CanvasEvent;
