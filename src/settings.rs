//! Live, process-wide settings read at the moment of use.
//!
//! The auto-run gate is consumed asynchronously at several points in time
//! (once per produced reply, once per chain hop). It is therefore modeled
//! as a cheap-clone capability handle that readers query when they need the
//! value, never a boolean captured into a closure: toggling mid-chain takes
//! effect on the next hop's decision, not the current one.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cloneable handle to the mutable runtime toggles.
#[derive(Clone, Debug, Default)]
pub struct LiveSettings {
    auto_run: Arc<AtomicBool>,
}

impl LiveSettings {
    /// Creates settings with auto-run disabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the auto-run gate as of this instant.
    #[must_use]
    pub fn auto_run_enabled(&self) -> bool {
        self.auto_run.load(Ordering::SeqCst)
    }

    /// Flips the auto-run gate; visible to every holder of this handle.
    pub fn set_auto_run(&self, enabled: bool) {
        self.auto_run.store(enabled, Ordering::SeqCst);
    }
}
