use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use floatdeck_gateway::Gateway;
use floatdeck_schema::CapabilityStatus;

use crate::AiControls;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Background probe of backend AI availability. Runs from session start
/// until the token is cancelled, independent of any chat activity; it
/// writes only the capability status (and clears the advanced toggle on
/// probe failure).
pub struct CapabilityPoller {
    gateway: Arc<dyn Gateway>,
    controls: AiControls,
    interval: Duration,
}

impl CapabilityPoller {
    pub fn new(gateway: Arc<dyn Gateway>, controls: AiControls) -> Self {
        Self {
            gateway,
            controls,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// One probe tick. Success overwrites the status wholesale; failure
    /// degrades to `error` and forces the advanced toggle off.
    pub async fn probe_once(&self) {
        match self.gateway.ai_status().await {
            Ok(status) => {
                let prev = self.controls.status();
                if status == CapabilityStatus::Loaded && prev != CapabilityStatus::Loaded {
                    info!("advanced model is now available");
                }
                self.controls.set_status(status);
            }
            Err(err) => {
                warn!(%err, "capability probe failed");
                self.controls.mark_probe_failed();
            }
        }
    }

    /// Start the repeating probe loop. The first tick fires immediately.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => self.probe_once().await,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use floatdeck_gateway::StubGateway;

    #[tokio::test]
    async fn successful_probe_overwrites_status() {
        let mut stub = StubGateway::new();
        stub.ai_status = CapabilityStatus::NotLoaded;
        let stub = Arc::new(stub);
        let controls = AiControls::new();
        let poller = CapabilityPoller::new(stub, controls.clone());

        poller.probe_once().await;
        assert_eq!(controls.status(), CapabilityStatus::NotLoaded);
    }

    #[tokio::test]
    async fn probe_reports_loaded_status() {
        let mut stub = StubGateway::new();
        stub.ai_status = CapabilityStatus::Loaded;
        let controls = AiControls::new();
        let poller = CapabilityPoller::new(Arc::new(stub), controls.clone());

        poller.probe_once().await;
        assert_eq!(controls.status(), CapabilityStatus::Loaded);
    }

    #[tokio::test]
    async fn failed_probe_forces_advanced_toggle_off() {
        let stub = Arc::new(StubGateway::new());
        stub.fail_endpoint("ai-status");
        let controls = AiControls::new();
        controls.set_status(CapabilityStatus::Loaded);
        controls.set_advanced_enabled(true);

        let poller = CapabilityPoller::new(stub, controls.clone());
        poller.probe_once().await;

        assert_eq!(controls.status(), CapabilityStatus::Error);
        assert!(!controls.advanced_enabled());
    }

    #[tokio::test(start_paused = true)]
    async fn spawned_loop_probes_immediately_then_on_interval() {
        let mut stub = StubGateway::new();
        stub.ai_status = CapabilityStatus::Loaded;
        let stub = Arc::new(stub);
        let controls = AiControls::new();
        let poller = CapabilityPoller::new(stub.clone() as Arc<dyn Gateway>, controls.clone())
            .with_interval(Duration::from_secs(30));

        let cancel = CancellationToken::new();
        let handle = poller.spawn(cancel.clone());

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(stub.calls().len(), 1);
        assert_eq!(controls.status(), CapabilityStatus::Loaded);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(stub.calls().len(), 2);

        cancel.cancel();
        handle.await.unwrap();
        let after_cancel = stub.calls().len();
        tokio::time::sleep(Duration::from_secs(90)).await;
        assert_eq!(stub.calls().len(), after_cancel);
    }

    #[tokio::test]
    async fn recovery_after_failure_restores_status() {
        let mut stub = StubGateway::new();
        stub.ai_status = CapabilityStatus::Loaded;
        let stub = Arc::new(stub);
        let controls = AiControls::new();
        let poller = CapabilityPoller::new(stub.clone() as Arc<dyn Gateway>, controls.clone());

        stub.fail_endpoint("ai-status");
        poller.probe_once().await;
        assert_eq!(controls.status(), CapabilityStatus::Error);

        stub.clear_failures();
        poller.probe_once().await;
        assert_eq!(controls.status(), CapabilityStatus::Loaded);
        // Recovery does not silently re-enable the toggle.
        assert!(!controls.advanced_enabled());
    }
}
