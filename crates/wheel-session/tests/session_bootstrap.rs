//! Session startup: catalog loading, default list selection, the initial
//! background request, and fullscreen-on-start.

mod common;

use common::Harness;
use wheel_proto::config::WheelConfig;
use wheel_session::engine::{EngineHandle, EngineRequest};
use wheel_session::session::{HotKey, Session, SessionEvent, SessionSignal};
use wheel_session::state::{EMPTY_SLOT, SLOT_COUNT};

#[tokio::test]
async fn catalog_load_selects_the_first_list() {
    let h = Harness::ready(&["games", "movies", "songs"]).await;

    let state = h.store.snapshot().await;
    assert_eq!(state.lists, vec!["games", "movies", "songs"]);
    assert_eq!(state.current_list, "games");
    assert!(!state.refreshing_lists);
    assert_eq!(state.slots, vec![EMPTY_SLOT; SLOT_COUNT]);
}

#[tokio::test]
async fn empty_catalog_leaves_selection_empty() {
    let h = Harness::ready(&[]).await;

    let state = h.store.snapshot().await;
    assert!(state.lists.is_empty());
    assert!(state.current_list.is_empty());
    assert!(!state.roll_enabled());
}

#[tokio::test]
async fn catalog_failure_surfaces_a_notice() {
    let (engine, mut engine_rx) = EngineHandle::channel(16);
    let (mut session, mut events) = Session::new(engine);
    let feeds = wheel_session::connection::PushFeeds {
        slot_list: tokio::sync::broadcast::channel(16).0,
        roll_stopped: tokio::sync::broadcast::channel(16).0,
    };
    let store = session.store();
    session.bootstrap(&feeds).await;

    for _ in 0..2 {
        match engine_rx.recv().await.unwrap() {
            EngineRequest::ListCatalog { reply } => {
                let _ = reply.send(Err(wheel_session::engine::EngineError::Disconnected));
            }
            EngineRequest::GetConfig { reply } => {
                let _ = reply.send(Ok(WheelConfig::default()));
            }
            other => panic!("unexpected bootstrap request: {other:?}"),
        }
    }
    for _ in 0..2 {
        let event = events.recv().await.unwrap();
        session.handle_event(event).await;
    }

    let state = store.snapshot().await;
    assert!(state.lists.is_empty());
    assert!(!state.refreshing_lists);
    assert!(!state.notices.is_empty());
}

#[tokio::test]
async fn start_fullscreen_config_emits_one_signal() {
    let config = WheelConfig {
        start_fullscreen: true,
        ..WheelConfig::default()
    };
    let mut h = Harness::ready_with(&["games"], config).await;

    let mut fullscreen_signals = 0;
    while let Ok(signal) = h.signals.try_recv() {
        if let SessionSignal::SetFullscreen(on) = signal {
            assert!(on);
            fullscreen_signals += 1;
        }
    }
    assert_eq!(fullscreen_signals, 1);
    assert!(h.store.snapshot().await.fullscreen);
}

#[tokio::test]
async fn fullscreen_toggle_flips_and_signals() {
    let mut h = Harness::ready(&["games"]).await;
    assert!(!h.store.snapshot().await.fullscreen);

    h.session
        .handle_event(SessionEvent::Key(HotKey::ToggleFullscreen))
        .await;
    assert!(h.store.snapshot().await.fullscreen);

    let mut saw_on = false;
    while let Ok(signal) = h.signals.try_recv() {
        if let SessionSignal::SetFullscreen(on) = signal {
            saw_on = on;
        }
    }
    assert!(saw_on);

    h.session
        .handle_event(SessionEvent::Key(HotKey::ToggleFullscreen))
        .await;
    assert!(!h.store.snapshot().await.fullscreen);
}
