use std::sync::{Arc, RwLock};

use floatdeck_schema::CapabilityStatus;

/// Shared handle over the advanced-AI toggle and the last observed
/// capability status. Single-writer discipline: the poller writes status
/// (and may clear the toggle on probe failure), the user surface writes
/// the toggle. Readers only ever see whole snapshots.
#[derive(Debug, Clone)]
pub struct AiControls {
    inner: Arc<RwLock<AiState>>,
}

#[derive(Debug, Clone, Copy)]
struct AiState {
    status: CapabilityStatus,
    advanced_enabled: bool,
}

impl Default for AiControls {
    fn default() -> Self {
        Self::new()
    }
}

impl AiControls {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(AiState {
                status: CapabilityStatus::Checking,
                advanced_enabled: false,
            })),
        }
    }

    pub fn status(&self) -> CapabilityStatus {
        self.inner.read().expect("ai controls lock").status
    }

    pub fn set_status(&self, status: CapabilityStatus) {
        self.inner.write().expect("ai controls lock").status = status;
    }

    pub fn advanced_enabled(&self) -> bool {
        self.inner.read().expect("ai controls lock").advanced_enabled
    }

    pub fn set_advanced_enabled(&self, on: bool) {
        self.inner.write().expect("ai controls lock").advanced_enabled = on;
    }

    /// Probe failure: status becomes `error` and the toggle is forced off
    /// so no message can stay routed at an unreachable model.
    pub fn mark_probe_failed(&self) {
        let mut state = self.inner.write().expect("ai controls lock");
        state.status = CapabilityStatus::Error;
        state.advanced_enabled = false;
    }

    /// Routing decision for the next message: the toggle requests the
    /// advanced path, the capability gate has the last word.
    pub fn route_advanced(&self) -> bool {
        let state = self.inner.read().expect("ai controls lock");
        state.advanced_enabled && state.status == CapabilityStatus::Loaded
    }
}
