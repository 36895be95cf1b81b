//! Mock implementations for testing
//!
//! These mocks enable controller integration testing without real I/O.

use super::{ChatController, ChatSnapshot, ControllerHandle, ViewEvent};
use crate::state_machine::{ChatContext, Phase};
use crate::transport::{ChatReply, ChatTransport, HealthReport, TransportError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, watch, Notify};

// ============================================================================
// Mock Transport
// ============================================================================

/// Mock transport that returns queued replies and health reports
pub struct MockTransport {
    replies: Mutex<VecDeque<Result<ChatReply, TransportError>>>,
    health: Mutex<VecDeque<HealthReport>>,
    /// Record of all chat requests made, as (text, session id)
    pub requests: Mutex<Vec<(String, Option<String>)>>,
    /// Number of health checks made
    pub health_checks: Mutex<usize>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            health: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            health_checks: Mutex::new(0),
        }
    }

    pub fn queue_reply(&self, reply: ChatReply) {
        self.replies.lock().unwrap().push_back(Ok(reply));
    }

    pub fn queue_error(&self, error: TransportError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    /// Queue a health report; once drained the service reports reachable
    pub fn queue_health(&self, report: HealthReport) {
        self.health.lock().unwrap().push_back(report);
    }

    pub fn recorded_requests(&self) -> Vec<(String, Option<String>)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn health_check_count(&self) -> usize {
        *self.health_checks.lock().unwrap()
    }

    fn record(&self, text: &str, session_id: Option<&str>) {
        self.requests
            .lock()
            .unwrap()
            .push((text.to_string(), session_id.map(str::to_string)));
    }

    fn next_reply(&self) -> Result<ChatReply, TransportError> {
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::network("No mock reply queued")))
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatTransport for MockTransport {
    async fn send_message(
        &self,
        text: &str,
        session_id: Option<&str>,
    ) -> Result<ChatReply, TransportError> {
        self.record(text, session_id);
        self.next_reply()
    }

    async fn check_health(&self) -> HealthReport {
        *self.health_checks.lock().unwrap() += 1;
        self.health
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| HealthReport::reachable(Duration::from_millis(1)))
    }
}

// ============================================================================
// Gated Mock Transport (for in-flight testing)
// ============================================================================

/// Mock transport whose chat requests wait until the test releases them
pub struct GatedMockTransport {
    inner: MockTransport,
    release: Notify,
    /// Notified when a request starts (for test synchronization)
    pub request_started: Arc<Notify>,
}

impl GatedMockTransport {
    pub fn new() -> Self {
        Self {
            inner: MockTransport::new(),
            release: Notify::new(),
            request_started: Arc::new(Notify::new()),
        }
    }

    pub fn queue_reply(&self, reply: ChatReply) {
        self.inner.queue_reply(reply);
    }

    /// Let one waiting (or the next) request complete
    pub fn release_one(&self) {
        self.release.notify_one();
    }

    pub fn recorded_requests(&self) -> Vec<(String, Option<String>)> {
        self.inner.recorded_requests()
    }
}

#[async_trait]
impl ChatTransport for GatedMockTransport {
    async fn send_message(
        &self,
        text: &str,
        session_id: Option<&str>,
    ) -> Result<ChatReply, TransportError> {
        self.inner.record(text, session_id);
        self.request_started.notify_one();
        self.release.notified().await;
        self.inner.next_reply()
    }

    async fn check_health(&self) -> HealthReport {
        self.inner.check_health().await
    }
}

// ============================================================================
// Test Controller Builder
// ============================================================================

/// Running controller plus the receivers a test needs
pub struct TestController<T: ChatTransport + 'static> {
    pub handle: ControllerHandle,
    pub views: broadcast::Receiver<ViewEvent>,
    pub snapshots: watch::Receiver<ChatSnapshot>,
    pub transport: Arc<T>,
    _task: tokio::task::JoinHandle<()>,
}

pub struct TestControllerBuilder {
    welcome: String,
    delay: Duration,
    interval: Duration,
    health_poll: Option<Duration>,
}

impl TestControllerBuilder {
    pub fn new() -> Self {
        Self {
            welcome: "Hi!".to_string(),
            delay: Duration::ZERO,
            interval: Duration::ZERO,
            health_poll: None,
        }
    }

    pub fn welcome(mut self, text: impl Into<String>) -> Self {
        self.welcome = text.into();
        self
    }

    pub fn timing(mut self, delay: Duration, interval: Duration) -> Self {
        self.delay = delay;
        self.interval = interval;
        self
    }

    pub fn health_poll(mut self, period: Duration) -> Self {
        self.health_poll = Some(period);
        self
    }

    pub fn build<T: ChatTransport + 'static>(self, transport: T) -> TestController<T> {
        let transport = Arc::new(transport);
        let context = ChatContext::new(&self.welcome).with_timing(self.delay, self.interval);
        let (mut controller, handle) = ChatController::new(context, transport.clone());
        if let Some(period) = self.health_poll {
            controller = controller.with_health_poll(period);
        }

        // Subscribe before the controller starts so no event is missed
        let views = handle.subscribe();
        let snapshots = handle.watch();
        let task = controller.spawn();

        TestController {
            handle,
            views,
            snapshots,
            transport,
            _task: task,
        }
    }
}

impl Default for TestControllerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ChatTransport + 'static> TestController<T> {
    /// Wait until the snapshot satisfies `predicate`
    pub async fn wait_for(
        &mut self,
        predicate: impl FnMut(&ChatSnapshot) -> bool,
        timeout: Duration,
    ) -> Option<ChatSnapshot> {
        match tokio::time::timeout(timeout, self.snapshots.wait_for(predicate)).await {
            Ok(Ok(snapshot)) => Some(snapshot.clone()),
            _ => None,
        }
    }

    /// Wait until the controller accepts input again
    pub async fn wait_idle(&mut self) -> ChatSnapshot {
        self.wait_for(|s| s.phase == Phase::Idle, Duration::from_secs(2))
            .await
            .expect("controller never became idle")
    }

    /// Wait for the next view event matching `predicate`
    pub async fn wait_for_view(
        &mut self,
        mut predicate: impl FnMut(&ViewEvent) -> bool,
        timeout: Duration,
    ) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            match tokio::time::timeout(Duration::from_millis(50), self.views.recv()).await {
                Ok(Ok(event)) if predicate(&event) => return true,
                Ok(Err(broadcast::error::RecvError::Closed)) => return false,
                _ => continue,
            }
        }
        false
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::Sender;
    use crate::runtime::ControllerError;
    use crate::state_machine::{Connectivity, BACKEND_DOWN_MESSAGE, GENERIC_ERROR_PREFIX};

    const WAIT: Duration = Duration::from_secs(2);

    #[tokio::test]
    async fn test_mock_transport() {
        let mock = MockTransport::new();
        mock.queue_reply(ChatReply::new("Hello"));

        let reply = mock.send_message("Hi", None).await.unwrap();
        assert_eq!(reply.answer, "Hello");

        // Second call should fail (no more replies)
        assert!(mock.send_message("Hi", Some("abc")).await.is_err());
        assert_eq!(
            mock.recorded_requests(),
            vec![
                ("Hi".to_string(), None),
                ("Hi".to_string(), Some("abc".to_string()))
            ]
        );
        assert!(mock.check_health().await.reachable);
    }

    /// Mount with a reachable backend
    #[tokio::test]
    async fn test_mount_reports_online_with_latency() {
        let transport = MockTransport::new();
        transport.queue_health(HealthReport::reachable(Duration::from_millis(42)));

        let mut tc = TestControllerBuilder::new().build(transport);
        let snapshot = tc
            .wait_for(|s| s.connectivity.state != Connectivity::Checking, WAIT)
            .await
            .unwrap();

        assert_eq!(snapshot.connectivity.to_string(), "online (42 ms)");
        assert_eq!(tc.transport.health_check_count(), 1);
    }

    #[tokio::test]
    async fn test_welcome_streams_character_by_character() {
        let mut tc = TestControllerBuilder::new()
            .welcome("Hey")
            .build(MockTransport::new());

        let mut revealed = Vec::new();
        let deadline = tokio::time::Instant::now() + WAIT;
        while tokio::time::Instant::now() < deadline {
            match tokio::time::timeout(WAIT, tc.views.recv()).await {
                Ok(Ok(ViewEvent::MessageUpdated { message })) => revealed.push(message.text),
                Ok(Ok(ViewEvent::InputEnabled { enabled: true })) => break,
                Ok(Ok(_)) => {}
                _ => break,
            }
        }

        assert_eq!(revealed, vec!["H", "He", "Hey"]);
        let snapshot = tc.wait_idle().await;
        assert_eq!(snapshot.messages.len(), 1);
        assert_eq!(snapshot.messages[0].sender, Sender::Bot);
        assert_eq!(snapshot.messages[0].text, "Hey");
        assert!(snapshot.input_enabled());
    }

    #[tokio::test]
    async fn test_submit_while_welcoming_is_noop() {
        let mut tc = TestControllerBuilder::new()
            .timing(Duration::from_secs(60), Duration::from_secs(60))
            .build(MockTransport::new());

        tc.handle.submit("Hello").await.unwrap();
        assert!(
            tc.wait_for_view(|e| matches!(e, ViewEvent::Rejected { .. }), WAIT)
                .await
        );

        let snapshot = tc.handle.snapshot();
        assert_eq!(snapshot.phase, Phase::Welcoming { revealed: 0 });
        assert_eq!(snapshot.messages.len(), 1);
        assert!(tc.transport.recorded_requests().is_empty());
    }

    /// First exchange issues a session, the second keeps it
    #[tokio::test]
    async fn test_send_cycle_and_session_first_wins() {
        let transport = MockTransport::new();
        transport.queue_reply(ChatReply::new("Hi!").with_session("abc"));
        transport.queue_reply(ChatReply::new("Again!").with_session("xyz"));

        let mut tc = TestControllerBuilder::new().build(transport);
        tc.wait_idle().await;

        tc.handle.submit("Hello").await.unwrap();
        let snapshot = tc
            .wait_for(|s| s.messages.len() == 3 && s.phase == Phase::Idle, WAIT)
            .await
            .unwrap();
        assert_eq!(snapshot.messages[1].sender, Sender::User);
        assert_eq!(snapshot.messages[1].text, "Hello");
        assert_eq!(snapshot.messages[2].sender, Sender::Bot);
        assert_eq!(snapshot.messages[2].text, "Hi!");
        assert_eq!(snapshot.session_id.as_deref(), Some("abc"));

        tc.handle.submit("Once more").await.unwrap();
        let snapshot = tc
            .wait_for(|s| s.messages.len() == 5 && s.phase == Phase::Idle, WAIT)
            .await
            .unwrap();
        assert_eq!(snapshot.messages[4].text, "Again!");
        assert_eq!(snapshot.session_id.as_deref(), Some("abc"));

        assert_eq!(
            tc.transport.recorded_requests(),
            vec![
                ("Hello".to_string(), None),
                ("Once more".to_string(), Some("abc".to_string())),
            ]
        );
    }

    /// Failure while online shows the generic error, a repeat shows backend down
    #[tokio::test]
    async fn test_send_failure_flips_offline() {
        let transport = MockTransport::new();
        transport.queue_error(TransportError::status(500));
        transport.queue_error(TransportError::network("Connection failed"));

        let mut tc = TestControllerBuilder::new().build(transport);
        tc.wait_for(
            |s| s.phase == Phase::Idle && s.connectivity.state == Connectivity::Online,
            WAIT,
        )
        .await
        .unwrap();

        tc.handle.submit("Hello").await.unwrap();
        let snapshot = tc
            .wait_for(|s| s.messages.len() == 3 && s.phase == Phase::Idle, WAIT)
            .await
            .unwrap();
        let error = &snapshot.messages[2];
        assert!(error.is_error);
        assert_eq!(error.sender, Sender::Bot);
        assert_eq!(
            error.text,
            format!("{GENERIC_ERROR_PREFIX}HTTP error! status: 500")
        );
        assert_eq!(snapshot.connectivity.state, Connectivity::Offline);
        // The user message is never retracted
        assert_eq!(snapshot.messages[1].text, "Hello");

        tc.handle.submit("Still there?").await.unwrap();
        let snapshot = tc
            .wait_for(|s| s.messages.len() == 5 && s.phase == Phase::Idle, WAIT)
            .await
            .unwrap();
        assert_eq!(snapshot.messages[4].text, BACKEND_DOWN_MESSAGE);
        assert!(snapshot.messages[4].is_error);
    }

    #[tokio::test]
    async fn test_failure_after_failed_mount_check_shows_backend_down() {
        let transport = MockTransport::new();
        transport.queue_health(HealthReport::unreachable());
        transport.queue_error(TransportError::network("Connection failed"));

        let mut tc = TestControllerBuilder::new().build(transport);
        tc.wait_for(
            |s| s.phase == Phase::Idle && s.connectivity.state == Connectivity::Offline,
            WAIT,
        )
        .await
        .unwrap();

        tc.handle.submit("Hello").await.unwrap();
        let snapshot = tc
            .wait_for(|s| s.messages.len() == 3 && s.phase == Phase::Idle, WAIT)
            .await
            .unwrap();
        assert_eq!(snapshot.messages[2].text, BACKEND_DOWN_MESSAGE);
    }

    /// A second submit while the first is in flight is dropped, not queued
    #[tokio::test]
    async fn test_submit_while_sending_is_noop() {
        let transport = GatedMockTransport::new();
        transport.queue_reply(ChatReply::new("First answer"));
        let started = transport.request_started.clone();

        let mut tc = TestControllerBuilder::new().build(transport);
        tc.wait_idle().await;

        tc.handle.submit("First").await.unwrap();
        started.notified().await;
        tc.wait_for(|s| s.phase == Phase::Sending, WAIT).await.unwrap();

        tc.handle.submit("Second").await.unwrap();
        assert!(
            tc.wait_for_view(|e| matches!(e, ViewEvent::Rejected { .. }), WAIT)
                .await
        );
        let snapshot = tc.handle.snapshot();
        assert_eq!(snapshot.messages.len(), 2);
        assert_eq!(snapshot.phase, Phase::Sending);

        tc.transport.release_one();
        let snapshot = tc
            .wait_for(|s| s.messages.len() == 3 && s.phase == Phase::Idle, WAIT)
            .await
            .unwrap();
        assert_eq!(snapshot.messages[2].text, "First answer");
        assert_eq!(tc.transport.recorded_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_blank_submit_is_noop() {
        let mut tc = TestControllerBuilder::new().build(MockTransport::new());
        tc.wait_idle().await;

        tc.handle.submit("   ").await.unwrap();
        assert!(
            tc.wait_for_view(|e| matches!(e, ViewEvent::Rejected { .. }), WAIT)
                .await
        );
        assert_eq!(tc.handle.snapshot().messages.len(), 1);
        assert!(tc.transport.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_manual_refresh_rechecks_health() {
        let transport = MockTransport::new();
        transport.queue_health(HealthReport::unreachable());
        transport.queue_health(HealthReport::reachable(Duration::from_millis(9)));

        let mut tc = TestControllerBuilder::new().build(transport);
        tc.wait_for(|s| s.connectivity.state == Connectivity::Offline, WAIT)
            .await
            .unwrap();

        tc.handle.refresh_status().await.unwrap();
        let snapshot = tc
            .wait_for(|s| s.connectivity.state == Connectivity::Online, WAIT)
            .await
            .unwrap();
        assert_eq!(snapshot.connectivity.to_string(), "online (9 ms)");
        assert_eq!(tc.transport.health_check_count(), 2);
    }

    #[tokio::test]
    async fn test_health_poll_repeats_checks() {
        let mut tc = TestControllerBuilder::new()
            .health_poll(Duration::from_millis(10))
            .build(MockTransport::new());

        let deadline = tokio::time::Instant::now() + WAIT;
        while tc.transport.health_check_count() < 3 && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(tc.transport.health_check_count() >= 3);
        tc.wait_for(|s| s.connectivity.state == Connectivity::Online, WAIT)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_closes_handle() {
        let tc = TestControllerBuilder::new().build(MockTransport::new());
        tc.handle.shutdown();

        let result = tc.handle.submit("Hello").await;
        assert!(matches!(result, Err(ControllerError::Closed)));
    }
}
