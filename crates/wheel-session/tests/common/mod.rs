#![allow(dead_code)]

//! Shared test harness: a scripted engine plus a deterministic session
//! driver.
//!
//! Tests own both sides of every exchange.  User triggers go straight into
//! `Session::handle_event`; engine requests are received from the scripted
//! queue and answered explicitly; queued outcome/push events are applied
//! one at a time with `pump`.  Nothing advances unless the test says so.

use std::time::Duration;

use tokio::sync::{broadcast, mpsc};

use wheel_proto::config::WheelConfig;
use wheel_session::connection::PushFeeds;
use wheel_session::engine::{EngineHandle, EngineRequest};
use wheel_session::session::{Session, SessionEvent, SessionSignal};
use wheel_session::state::SessionStore;

const WAIT: Duration = Duration::from_secs(2);

pub struct Harness {
    pub session: Session,
    pub events: mpsc::Receiver<SessionEvent>,
    pub engine_rx: mpsc::Receiver<EngineRequest>,
    pub feeds: PushFeeds,
    pub store: SessionStore,
    pub signals: broadcast::Receiver<SessionSignal>,
}

impl Harness {
    /// A fully bootstrapped session: catalog served, startup config pulled,
    /// initial background answered with "no media".
    pub async fn ready(lists: &[&str]) -> Self {
        Self::ready_with(lists, WheelConfig::default()).await
    }

    pub async fn ready_with(lists: &[&str], config: WheelConfig) -> Self {
        let (engine, engine_rx) = EngineHandle::channel(16);
        let (session, events) = Session::new(engine);
        let feeds = PushFeeds {
            slot_list: broadcast::channel(16).0,
            roll_stopped: broadcast::channel(16).0,
        };
        let store = session.store();
        let signals = session.signals();
        let mut harness = Self {
            session,
            events,
            engine_rx,
            feeds,
            store,
            signals,
        };

        harness.session.bootstrap(&harness.feeds).await;

        // Bootstrap issues the catalog fetch and the startup config pull.
        for _ in 0..2 {
            match harness.recv_request().await {
                EngineRequest::ListCatalog { reply } => {
                    let _ = reply.send(Ok(lists.iter().map(ToString::to_string).collect()));
                }
                EngineRequest::GetConfig { reply } => {
                    let _ = reply.send(Ok(config.clone()));
                }
                other => panic!("unexpected bootstrap request: {other:?}"),
            }
        }
        harness.pump().await;
        harness.pump().await;

        // A loaded catalog always triggers the initial background request.
        match harness.recv_request().await {
            EngineRequest::RandomBackground { reply, .. } => {
                let _ = reply.send(Ok(None));
            }
            other => panic!("unexpected request after catalog load: {other:?}"),
        }
        harness.pump().await;

        harness
    }

    /// Next request the scripted engine received.
    pub async fn recv_request(&mut self) -> EngineRequest {
        tokio::time::timeout(WAIT, self.engine_rx.recv())
            .await
            .expect("timed out waiting for an engine request")
            .expect("engine request channel closed")
    }

    /// Apply the next queued session event (request outcome or push).
    pub async fn pump(&mut self) {
        let event = tokio::time::timeout(WAIT, self.events.recv())
            .await
            .expect("timed out waiting for a session event")
            .expect("session event channel closed");
        self.session.handle_event(event).await;
    }

    /// Assert that nothing is pending: no engine request was issued and no
    /// session event is queued.
    pub async fn assert_idle(&mut self) {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
        assert!(
            self.engine_rx.try_recv().is_err(),
            "engine unexpectedly received a request"
        );
        assert!(
            self.events.try_recv().is_err(),
            "unexpected queued session event"
        );
    }

    /// Open the settings panel, serving both fetches successfully.
    pub async fn open_settings(&mut self, config: WheelConfig, devices: Vec<(String, String)>) {
        self.session.handle_event(SessionEvent::OpenSettings).await;
        match self.recv_request().await {
            EngineRequest::GetConfig { reply } => {
                let _ = reply.send(Ok(config));
            }
            other => panic!("expected GetConfig, got {other:?}"),
        }
        match self.recv_request().await {
            EngineRequest::AudioDevices { reply } => {
                let _ = reply.send(Ok(devices));
            }
            other => panic!("expected AudioDevices, got {other:?}"),
        }
        self.pump().await;
    }

    /// Drive the wheel into `Rolling`, accepting the start request.
    pub async fn to_rolling(&mut self) {
        self.session.handle_event(SessionEvent::RollClicked).await;
        match self.recv_request().await {
            EngineRequest::StartRoll { reply, .. } => {
                let _ = reply.send(Ok(()));
            }
            other => panic!("expected StartRoll, got {other:?}"),
        }
        self.pump().await;
    }

    /// Drive the wheel from `Rolling` into `Stopping`, accepting the stop
    /// request (the confirmation push has not fired yet).
    pub async fn to_stopping(&mut self) {
        self.session.handle_event(SessionEvent::RollClicked).await;
        match self.recv_request().await {
            EngineRequest::StopRoll { reply } => {
                let _ = reply.send(Ok(()));
            }
            other => panic!("expected StopRoll, got {other:?}"),
        }
        self.pump().await;
    }

    /// Count of currently visible error notices.
    pub async fn error_notices(&self) -> usize {
        self.store
            .snapshot()
            .await
            .notices
            .visible()
            .filter(|n| n.severity == wheel_session::notice::Severity::Error)
            .count()
    }
}
