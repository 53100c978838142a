//! Notice queue — transient status messages surfaced to the user.
//!
//! The session converts every request failure into a notice here; how the
//! host presents them is its own business.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub message: String,
    pub severity: Severity,
    expires: Instant,
}

#[derive(Debug, Clone)]
pub struct NoticeBoard {
    notices: VecDeque<Notice>,
    max_visible: usize,
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self {
            notices: VecDeque::new(),
            max_visible: 4,
        }
    }

    pub fn push(&mut self, message: impl Into<String>, severity: Severity, duration: Duration) {
        // Remove duplicates (same message)
        let msg = message.into();
        self.notices.retain(|n| n.message != msg);
        self.notices.push_back(Notice {
            message: msg,
            severity,
            expires: Instant::now() + duration,
        });
        // Cap queue
        while self.notices.len() > self.max_visible * 2 {
            self.notices.pop_front();
        }
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(message, Severity::Info, Duration::from_secs(3));
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(message, Severity::Success, Duration::from_secs(3));
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(message, Severity::Warning, Duration::from_secs(4));
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(message, Severity::Error, Duration::from_secs(5));
    }

    /// Remove expired notices.  Returns `true` if anything was dropped.
    pub fn tick(&mut self) -> bool {
        let before = self.notices.len();
        let now = Instant::now();
        self.notices.retain(|n| n.expires > now);
        self.notices.len() != before
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }

    /// Newest-first view, capped at the visible limit.
    pub fn visible(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter().rev().take(self.max_visible)
    }
}

impl Default for NoticeBoard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_messages_replace() {
        let mut board = NoticeBoard::new();
        board.error("engine unreachable");
        board.error("engine unreachable");
        assert_eq!(board.visible().count(), 1);
    }

    #[test]
    fn test_queue_is_capped() {
        let mut board = NoticeBoard::new();
        for i in 0..20 {
            board.info(format!("notice {i}"));
        }
        assert!(board.notices.len() <= board.max_visible * 2);
        assert_eq!(board.visible().count(), board.max_visible);
    }

    #[test]
    fn test_tick_expires_notices() {
        let mut board = NoticeBoard::new();
        board.push("gone already", Severity::Info, Duration::from_secs(0));
        assert!(board.tick());
        assert!(board.is_empty());
    }

    #[test]
    fn test_visible_is_newest_first() {
        let mut board = NoticeBoard::new();
        board.info("older");
        board.info("newer");
        let first = board.visible().next().map(|n| n.message.clone());
        assert_eq!(first.as_deref(), Some("newer"));
    }
}
