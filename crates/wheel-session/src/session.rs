//! Session — single-owner event loop for all mutable session state.
//!
//! All inputs funnel into one mpsc queue as [`SessionEvent`]s: user
//! triggers from the host shell, push events forwarded by the
//! subscriptions, and the outcomes of engine requests that were spawned
//! earlier.  The `Session` owns [`SessionState`] exclusively; after each
//! event that mutates state it broadcasts a [`SessionSignal`] to all
//! listeners before touching anything else.
//!
//! Engine calls never block the loop: the optimistic state change happens
//! inline, then the request is awaited in a spawned task whose result
//! re-enters the queue as an event.

use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};

use wheel_proto::config::WheelConfig;

use crate::background::{Background, Generation};
use crate::connection::PushFeeds;
use crate::engine::{EngineError, EngineHandle};
use crate::settings;
use crate::state::{RollState, SessionStore};
use crate::subscription::SubscriptionSet;
use crate::txn::Txn;

/// Keyboard shortcuts the host shell forwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotKey {
    /// Open the settings panel (honored only while the wheel is stopped).
    OpenSettings,
    /// Close whatever overlay is open (escape).
    CloseOverlay,
    ToggleFullscreen,
}

/// All inputs into the session loop.
#[derive(Debug)]
pub enum SessionEvent {
    // ── User triggers ────────────────────────────────────────────────────
    /// The roll/stop toggle button.
    RollClicked,
    ListSelected(String),
    /// A wheel slot was clicked; its text is offered to the clipboard.
    SlotClicked(usize),
    OpenSettings,
    CloseSettings,
    SaveSettings,
    FieldEdited { name: String, value: String },
    Key(HotKey),
    Shutdown,

    // ── Engine pushes (forwarded by the subscriptions) ───────────────────
    SlotListUpdated(Vec<String>),
    RollStopped,

    // ── Request outcomes (sent back by spawned request tasks) ────────────
    CatalogLoaded(Result<Vec<String>, EngineError>),
    RollSettled(Result<(), EngineError>),
    StopSettled(Result<(), EngineError>),
    BackgroundLoaded {
        generation: u64,
        result: Result<Option<(String, String)>, EngineError>,
    },
    ConfigLoaded(Result<WheelConfig, EngineError>),
    SettingsLoaded(Result<(WheelConfig, Vec<(String, String)>), EngineError>),
    SettingsSaved {
        saved: WheelConfig,
        result: Result<(), EngineError>,
    },
}

/// Broadcasts from the session to whoever is rendering it.
#[derive(Debug, Clone)]
pub enum SessionSignal {
    /// State changed; take a fresh snapshot.
    Updated,
    CopyToClipboard(String),
    SetFullscreen(bool),
}

pub struct Session {
    store: SessionStore,
    engine: EngineHandle,
    subs: SubscriptionSet,
    event_tx: mpsc::Sender<SessionEvent>,
    signal_tx: broadcast::Sender<SessionSignal>,
    /// Last-wins token source for background requests.
    bg_generation: Generation,
    /// In-flight optimistic Stopped → Rolling exchange.
    pending_roll: Option<Txn<RollState>>,
    /// In-flight optimistic Rolling → Stopping exchange.
    pending_stop: Option<Txn<RollState>>,
    should_quit: bool,
}

impl Session {
    /// Create a session talking to `engine`.  The returned receiver feeds
    /// [`run`](Self::run); hosts enqueue events through [`sender`](Self::sender).
    pub fn new(engine: EngineHandle) -> (Self, mpsc::Receiver<SessionEvent>) {
        let (event_tx, event_rx) = mpsc::channel(256);
        let (signal_tx, _) = broadcast::channel(64);
        let session = Self {
            store: SessionStore::new(),
            engine,
            subs: SubscriptionSet::new(),
            event_tx,
            signal_tx,
            bg_generation: Generation::new(),
            pending_roll: None,
            pending_stop: None,
            should_quit: false,
        };
        (session, event_rx)
    }

    pub fn store(&self) -> SessionStore {
        self.store.clone()
    }

    pub fn sender(&self) -> mpsc::Sender<SessionEvent> {
        self.event_tx.clone()
    }

    pub fn signals(&self) -> broadcast::Receiver<SessionSignal> {
        self.signal_tx.subscribe()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Establish the push subscriptions and kick off the startup requests
    /// (catalog, then the initial background; config for fullscreen-on-start).
    pub async fn bootstrap(&mut self, feeds: &PushFeeds) {
        self.subscribe(feeds);
        self.refresh_catalog().await;
        self.pull_startup_config();
    }

    /// Run until a `Shutdown` event or the event queue closing.
    pub async fn run(mut self, mut event_rx: mpsc::Receiver<SessionEvent>) -> anyhow::Result<()> {
        let mut notice_tick = tokio::time::interval(Duration::from_millis(250));
        notice_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                maybe = event_rx.recv() => match maybe {
                    Some(event) => self.handle_event(event).await,
                    None => break,
                },
                _ = notice_tick.tick() => {
                    let mut state = self.store.write().await;
                    if state.notices.tick() {
                        drop(state);
                        self.notify();
                    }
                }
            }
            if self.should_quit {
                break;
            }
        }

        self.subs.shutdown();
        Ok(())
    }

    // ── Event dispatch ────────────────────────────────────────────────────

    pub async fn handle_event(&mut self, event: SessionEvent) {
        debug!("session event: {event:?}");
        match event {
            SessionEvent::RollClicked => self.on_roll_clicked().await,
            SessionEvent::ListSelected(name) => self.on_list_selected(name).await,
            SessionEvent::SlotClicked(index) => self.on_slot_clicked(index).await,
            SessionEvent::OpenSettings => self.on_open_settings().await,
            SessionEvent::CloseSettings => self.on_close_settings().await,
            SessionEvent::SaveSettings => self.on_save_settings().await,
            SessionEvent::FieldEdited { name, value } => self.on_field_edited(name, value).await,
            SessionEvent::Key(key) => self.on_key(key).await,
            SessionEvent::Shutdown => {
                self.subs.shutdown();
                self.should_quit = true;
            }

            SessionEvent::SlotListUpdated(items) => self.on_slot_list(items).await,
            SessionEvent::RollStopped => self.on_roll_stopped().await,

            SessionEvent::CatalogLoaded(result) => self.on_catalog_loaded(result).await,
            SessionEvent::RollSettled(result) => self.on_roll_settled(result).await,
            SessionEvent::StopSettled(result) => self.on_stop_settled(result).await,
            SessionEvent::BackgroundLoaded { generation, result } => {
                self.on_background_loaded(generation, result).await
            }
            SessionEvent::ConfigLoaded(result) => self.on_config_loaded(result).await,
            SessionEvent::SettingsLoaded(result) => self.on_settings_loaded(result).await,
            SessionEvent::SettingsSaved { saved, result } => {
                self.on_settings_saved(saved, result).await
            }
        }
    }

    fn notify(&self) {
        let _ = self.signal_tx.send(SessionSignal::Updated);
    }

    fn signal(&self, signal: SessionSignal) {
        let _ = self.signal_tx.send(signal);
    }

    // ── Subscriptions ─────────────────────────────────────────────────────

    fn subscribe(&mut self, feeds: &PushFeeds) {
        let mut slot_rx = feeds.slot_list.subscribe();
        let tx = self.event_tx.clone();
        self.subs.spawn("slot-list", async move {
            loop {
                match slot_rx.recv().await {
                    Ok(items) => {
                        if tx.send(SessionEvent::SlotListUpdated(items)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("slot-list subscription lagged by {n} events");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        let mut stop_rx = feeds.roll_stopped.subscribe();
        let tx = self.event_tx.clone();
        self.subs.spawn("roll-stopped", async move {
            loop {
                match stop_rx.recv().await {
                    Ok(()) => {
                        if tx.send(SessionEvent::RollStopped).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("roll-stopped subscription lagged by {n} events");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    // ── Roll lifecycle ────────────────────────────────────────────────────

    async fn on_roll_clicked(&mut self) {
        let mut state = self.store.write().await;
        match state.roll {
            RollState::Stopped => {
                if state.lists.is_empty() {
                    debug!("roll refused: catalog is empty");
                    return;
                }
                let list = state.current_list.clone();
                self.pending_roll = Some(Txn::apply(&mut state.roll, RollState::Rolling));
                drop(state);
                self.notify();

                let engine = self.engine.clone();
                let tx = self.event_tx.clone();
                tokio::spawn(async move {
                    let result = engine.start_roll(list).await;
                    let _ = tx.send(SessionEvent::RollSettled(result)).await;
                });
            }
            RollState::Rolling => {
                self.pending_stop = Some(Txn::apply(&mut state.roll, RollState::Stopping));
                drop(state);
                self.notify();

                let engine = self.engine.clone();
                let tx = self.event_tx.clone();
                tokio::spawn(async move {
                    let result = engine.stop_roll().await;
                    let _ = tx.send(SessionEvent::StopSettled(result)).await;
                });
            }
            RollState::Stopping => {
                debug!("roll click ignored while stopping");
            }
        }
    }

    async fn on_roll_settled(&mut self, result: Result<(), EngineError>) {
        match result {
            Ok(()) => {
                if let Some(txn) = self.pending_roll.take() {
                    txn.commit();
                }
            }
            Err(e) => {
                warn!("start-roll request failed: {e}");
                let mut state = self.store.write().await;
                if let Some(txn) = self.pending_roll.take() {
                    txn.rollback(&mut state.roll);
                }
                state.notices.error(format!("Failed to start the roll: {e}"));
                drop(state);
                self.notify();
            }
        }
    }

    async fn on_stop_settled(&mut self, result: Result<(), EngineError>) {
        match result {
            Ok(()) => {
                if let Some(txn) = self.pending_stop.take() {
                    txn.commit();
                }
            }
            Err(e) => {
                warn!("stop-roll request failed: {e}");
                let mut state = self.store.write().await;
                if let Some(txn) = self.pending_stop.take() {
                    txn.rollback(&mut state.roll);
                }
                state.notices.error(format!("Failed to stop the roll: {e}"));
                drop(state);
                self.notify();
            }
        }
    }

    async fn on_slot_list(&mut self, items: Vec<String>) {
        let mut state = self.store.write().await;
        state.slots = items;
        drop(state);
        self.notify();
    }

    async fn on_roll_stopped(&mut self) {
        let mut state = self.store.write().await;
        if state.roll != RollState::Stopping {
            debug!("stop confirmation ignored in {:?}", state.roll);
            return;
        }
        // The confirmation push is authoritative: a stop reply still in
        // flight must not roll this transition back later.
        if let Some(txn) = self.pending_stop.take() {
            txn.commit();
        }
        state.roll = RollState::Stopped;
        drop(state);
        self.notify();
    }

    // ── Catalog and background ────────────────────────────────────────────

    async fn refresh_catalog(&mut self) {
        {
            let mut state = self.store.write().await;
            state.refreshing_lists = true;
        }
        self.notify();

        let engine = self.engine.clone();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = engine.list_catalog().await;
            let _ = tx.send(SessionEvent::CatalogLoaded(result)).await;
        });
    }

    async fn on_catalog_loaded(&mut self, result: Result<Vec<String>, EngineError>) {
        let mut state = self.store.write().await;
        state.refreshing_lists = false;
        match result {
            Ok(names) => {
                state.lists = names;
                state.current_list = state.lists.first().cloned().unwrap_or_default();
                let list = state.current_list.clone();
                drop(state);
                self.notify();
                self.request_background(list);
            }
            Err(e) => {
                warn!("catalog request failed: {e}");
                state.notices.error(format!("Failed to load lists: {e}"));
                drop(state);
                self.notify();
            }
        }
    }

    async fn on_list_selected(&mut self, name: String) {
        let mut state = self.store.write().await;
        if state.roll != RollState::Stopped {
            debug!("list selection ignored while {:?}", state.roll);
            return;
        }
        state.current_list = name.clone();
        drop(state);
        self.notify();
        self.request_background(name);
    }

    /// Issue a background request for `list`, superseding any in flight.
    fn request_background(&mut self, list: String) {
        let generation = self.bg_generation.begin();
        let engine = self.engine.clone();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = engine.random_background(list).await;
            let _ = tx
                .send(SessionEvent::BackgroundLoaded { generation, result })
                .await;
        });
    }

    async fn on_background_loaded(
        &mut self,
        generation: u64,
        result: Result<Option<(String, String)>, EngineError>,
    ) {
        if !self.bg_generation.is_current(generation) {
            debug!("discarding stale background response (generation {generation})");
            return;
        }
        let mut state = self.store.write().await;
        match result {
            Ok(media) => {
                state.background = Background::from_media(media);
            }
            Err(e) => {
                warn!("background request failed: {e}");
                state.background = None;
                state
                    .notices
                    .error(format!("Failed to load background: {e}"));
            }
        }
        drop(state);
        self.notify();
    }

    // ── Settings ──────────────────────────────────────────────────────────

    async fn on_open_settings(&mut self) {
        let mut state = self.store.write().await;
        if state.settings.active || state.settings.loading {
            return;
        }
        state.settings.loading = true;
        drop(state);
        self.notify();

        let engine = self.engine.clone();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            // Both must succeed before the panel shows anything.
            let result: Result<_, EngineError> = async {
                let config = engine.get_config().await?;
                let devices = engine.audio_devices().await?;
                Ok((config, devices))
            }
            .await;
            let _ = tx.send(SessionEvent::SettingsLoaded(result)).await;
        });
    }

    async fn on_settings_loaded(
        &mut self,
        result: Result<(WheelConfig, Vec<(String, String)>), EngineError>,
    ) {
        let mut state = self.store.write().await;
        state.settings.loading = false;
        match result {
            Ok((config, devices)) => {
                state.config = config.clone();
                state.audio_devices = devices;
                state.settings.draft = config;
                state.settings.active = true;
            }
            Err(e) => {
                warn!("settings fetch failed: {e}");
                state.notices.error(format!("Failed to open settings: {e}"));
            }
        }
        drop(state);
        self.notify();
    }

    async fn on_close_settings(&mut self) {
        let mut state = self.store.write().await;
        if !state.settings.active {
            return;
        }
        state.settings.active = false;
        state.settings.draft = state.config.clone();
        drop(state);
        self.notify();
    }

    async fn on_field_edited(&mut self, name: String, value: String) {
        let mut state = self.store.write().await;
        if !state.settings.active {
            debug!("field edit ignored while settings closed");
            return;
        }
        if let Err(e) = settings::apply_field(&mut state.settings.draft, &name, &value) {
            warn!("settings edit rejected: {e}");
            state.notices.error(e.to_string());
        }
        drop(state);
        self.notify();
    }

    async fn on_save_settings(&mut self) {
        let state = self.store.write().await;
        if !state.settings.active {
            return;
        }
        let draft = state.settings.draft.clone();
        drop(state);

        let engine = self.engine.clone();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = engine.set_config(draft.clone()).await;
            let _ = tx
                .send(SessionEvent::SettingsSaved {
                    saved: draft,
                    result,
                })
                .await;
        });
    }

    async fn on_settings_saved(&mut self, saved: WheelConfig, result: Result<(), EngineError>) {
        let mut state = self.store.write().await;
        match result {
            Ok(()) => {
                state.config = saved;
                state.settings.active = false;
                state.settings.draft = state.config.clone();
            }
            Err(e) => {
                warn!("settings save failed: {e}");
                state.notices.error(format!("Failed to save settings: {e}"));
            }
        }
        drop(state);
        self.notify();
    }

    // ── Startup config / host shell ───────────────────────────────────────

    fn pull_startup_config(&mut self) {
        let engine = self.engine.clone();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = engine.get_config().await;
            let _ = tx.send(SessionEvent::ConfigLoaded(result)).await;
        });
    }

    async fn on_config_loaded(&mut self, result: Result<WheelConfig, EngineError>) {
        let mut state = self.store.write().await;
        match result {
            Ok(config) => {
                let enter_fullscreen = config.start_fullscreen && !state.fullscreen;
                state.config = config;
                if enter_fullscreen {
                    state.fullscreen = true;
                }
                drop(state);
                if enter_fullscreen {
                    self.signal(SessionSignal::SetFullscreen(true));
                }
                self.notify();
            }
            Err(e) => {
                warn!("startup config pull failed: {e}");
                state.notices.error(format!("Failed to load settings: {e}"));
                drop(state);
                self.notify();
            }
        }
    }

    async fn on_slot_clicked(&mut self, index: usize) {
        let state = self.store.snapshot().await;
        if let Some(text) = state.slots.get(index) {
            self.signal(SessionSignal::CopyToClipboard(text.clone()));
        }
    }

    async fn on_key(&mut self, key: HotKey) {
        match key {
            HotKey::OpenSettings => {
                let stopped = self.store.snapshot().await.roll == RollState::Stopped;
                if stopped {
                    self.on_open_settings().await;
                } else {
                    debug!("settings shortcut ignored while rolling");
                }
            }
            HotKey::CloseOverlay => self.on_close_settings().await,
            HotKey::ToggleFullscreen => {
                let mut state = self.store.write().await;
                state.fullscreen = !state.fullscreen;
                let fullscreen = state.fullscreen;
                drop(state);
                self.signal(SessionSignal::SetFullscreen(fullscreen));
                self.notify();
            }
        }
    }
}
