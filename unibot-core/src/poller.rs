use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, trace};

use crate::controller::{AgentController, TickOutcome};

/// Background status poller.
///
/// Ticks immediately on spawn and then every `period`. Ticks never overlap:
/// a slow backend delays the next tick instead of queueing one behind it.
/// The timer is re-armed whenever the controller's session epoch changes,
/// so a new session gets a full period after its own immediate refresh.
pub struct StatusPoller {
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl StatusPoller {
    pub fn spawn(controller: AgentController, period: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(poll_loop(controller, period, shutdown_rx));

        info!("Status poller started with interval: {:?}", period);
        Self {
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    /// Stop ticking and wait for an in-flight tick to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
        info!("Status poller stopped");
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

async fn poll_loop(
    controller: AgentController,
    period: Duration,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    let mut epoch_rx = controller.subscribe_epoch();
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = &mut shutdown_rx => break,
            changed = epoch_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                debug!("Session changed, re-arming status timer");
                ticker.reset();
            }
            _ = ticker.tick() => {
                match controller.refresh_status().await {
                    TickOutcome::Failed(message) => debug!("Status tick failed: {}", message),
                    outcome => trace!(?outcome, "Status tick"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::AgentBackend;
    use crate::error::UnibotResult;
    use crate::models::{AgentStatus, QuestionPage, Secret, SessionToken, StartRequest};
    use crate::store::SessionStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::time::sleep;

    #[derive(Default)]
    struct CountingBackend {
        status_calls: AtomicU32,
    }

    impl CountingBackend {
        fn calls(&self) -> u32 {
            self.status_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AgentBackend for CountingBackend {
        async fn start_single(&self, _request: &StartRequest) -> UnibotResult<SessionToken> {
            Ok(SessionToken::new("S1").unwrap())
        }

        async fn start_batch(&self, request: &StartRequest) -> UnibotResult<SessionToken> {
            self.start_single(request).await
        }

        async fn stop(&self, _session: &SessionToken) -> UnibotResult<()> {
            Ok(())
        }

        async fn get_status(
            &self,
            _session: Option<&SessionToken>,
        ) -> UnibotResult<Option<AgentStatus>> {
            self.status_calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(AgentStatus::idle()))
        }

        async fn get_logs(&self, _session: &SessionToken) -> UnibotResult<Vec<String>> {
            Ok(Vec::new())
        }

        async fn list_questions(&self, _limit: u32, _offset: u64) -> UnibotResult<QuestionPage> {
            Ok(QuestionPage::default())
        }
    }

    fn setup() -> (Arc<CountingBackend>, AgentController) {
        let backend = Arc::new(CountingBackend::default());
        let controller = AgentController::new(backend.clone(), SessionStore::in_memory());
        (backend, controller)
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_is_immediate() {
        let (backend, controller) = setup();
        let poller = StatusPoller::spawn(controller, Duration::from_millis(1500));

        sleep(Duration::from_millis(10)).await;
        assert_eq!(backend.calls(), 1);

        sleep(Duration::from_millis(1480)).await;
        assert_eq!(backend.calls(), 1);

        sleep(Duration::from_millis(20)).await;
        assert_eq!(backend.calls(), 2);

        poller.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_session_rearms_timer() {
        let (backend, controller) = setup();
        let poller = StatusPoller::spawn(controller.clone(), Duration::from_millis(1500));

        sleep(Duration::from_millis(1000)).await;
        let request = StartRequest::new("a@x.com", Secret::new("p"), "191");
        controller.start_single(request).await;
        // Initial tick plus the refresh that follows a start.
        assert_eq!(backend.calls(), 2);

        // The old schedule would have ticked at 1500.
        sleep(Duration::from_millis(1400)).await;
        assert_eq!(backend.calls(), 2);

        sleep(Duration::from_millis(200)).await;
        assert_eq!(backend.calls(), 3);

        poller.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_ticking() {
        let (backend, controller) = setup();
        let poller = StatusPoller::spawn(controller, Duration::from_millis(1500));

        sleep(Duration::from_millis(10)).await;
        poller.shutdown().await;

        sleep(Duration::from_millis(5000)).await;
        assert_eq!(backend.calls(), 1);
    }
}
