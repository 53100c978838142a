//! SessionState — shared read-only data for everything outside the session
//! loop.
//!
//! The host reads this through [`SessionStore::snapshot`], but never mutates
//! it.  The [`Session`](crate::session::Session) event loop is the only
//! thing that writes to it.

use std::sync::Arc;

use tokio::sync::{RwLock, RwLockWriteGuard};

use wheel_proto::config::WheelConfig;

use crate::background::Background;
use crate::notice::NoticeBoard;
use crate::settings::SettingsPanel;

/// Number of visible wheel slots.
pub const SLOT_COUNT: usize = 5;

/// Placeholder shown in a slot before the first slot-list push arrives.
pub const EMPTY_SLOT: &str = "-----";

/// Where the wheel is in its roll lifecycle.
///
/// `Stopping` is only left via the engine's stop-confirmation push, never
/// via the stop request's own reply — acceptance of a stop and the wheel
/// physically coming to rest are separate moments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RollState {
    #[default]
    Stopped,
    Rolling,
    Stopping,
}

/// The full shared state of one session.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub roll: RollState,
    /// Visible wheel content; replaced wholesale per push, never patched.
    pub slots: Vec<String>,
    /// Names of the selectable lists, as reported by the engine.
    pub lists: Vec<String>,
    /// Currently selected list; empty when the catalog is empty.
    pub current_list: String,
    /// True while a catalog fetch is in flight.
    pub refreshing_lists: bool,
    pub background: Option<Background>,
    /// Last known-good engine configuration.  Replaced wholesale on pull
    /// and after a successful save; never merged.
    pub config: WheelConfig,
    pub settings: SettingsPanel,
    /// (id, display name) pairs, refreshed each time the panel opens.
    pub audio_devices: Vec<(String, String)>,
    pub fullscreen: bool,
    pub notices: NoticeBoard,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            roll: RollState::Stopped,
            slots: vec![EMPTY_SLOT.to_string(); SLOT_COUNT],
            lists: Vec::new(),
            current_list: String::new(),
            refreshing_lists: false,
            background: None,
            config: WheelConfig::default(),
            settings: SettingsPanel::default(),
            audio_devices: Vec::new(),
            fullscreen: false,
            notices: NoticeBoard::new(),
        }
    }

    /// The list selector is only usable while the wheel is at rest.
    pub fn selector_enabled(&self) -> bool {
        self.roll == RollState::Stopped
    }

    /// The roll/stop button is disabled with nothing to roll on, and while
    /// a stop is waiting for its confirmation push.
    pub fn roll_enabled(&self) -> bool {
        !self.lists.is_empty() && self.roll != RollState::Stopping
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

/// Cheaply cloneable handle to the session state.
///
/// Reads are open to anyone; writes stay inside this crate so all mutation
/// funnels through the session loop.
#[derive(Clone)]
pub struct SessionStore {
    state: Arc<RwLock<SessionState>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(SessionState::new())),
        }
    }

    pub async fn snapshot(&self) -> SessionState {
        self.state.read().await.clone()
    }

    pub(crate) async fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().await
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let state = SessionState::new();
        assert_eq!(state.roll, RollState::Stopped);
        assert_eq!(state.slots, vec![EMPTY_SLOT; SLOT_COUNT]);
        assert!(state.current_list.is_empty());
        assert!(state.background.is_none());
    }

    #[test]
    fn test_roll_enabled_requires_catalog() {
        let mut state = SessionState::new();
        assert!(!state.roll_enabled());
        state.lists = vec!["games".to_string()];
        assert!(state.roll_enabled());
        state.roll = RollState::Stopping;
        assert!(!state.roll_enabled());
    }

    #[test]
    fn test_selector_enabled_only_while_stopped() {
        let mut state = SessionState::new();
        assert!(state.selector_enabled());
        state.roll = RollState::Rolling;
        assert!(!state.selector_enabled());
        state.roll = RollState::Stopping;
        assert!(!state.selector_enabled());
    }
}
