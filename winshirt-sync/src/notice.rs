//! User-visible notices (the toast equivalent).
//!
//! Every table-level failure produces one notice; a whole-set sync produces
//! one aggregate notice. Notices are also logged.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
}

/// Fan-out point for notices.
#[derive(Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Notice>,
}

impl Notifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(128);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }

    pub fn success(&self, title: impl Into<String>, message: impl Into<String>) {
        let notice = self.build(NoticeLevel::Success, title, message);
        info!("{}: {}", notice.title, notice.message);
        self.emit(notice);
    }

    pub fn warning(&self, title: impl Into<String>, message: impl Into<String>) {
        let notice = self.build(NoticeLevel::Warning, title, message);
        warn!("{}: {}", notice.title, notice.message);
        self.emit(notice);
    }

    pub fn error(&self, title: impl Into<String>, message: impl Into<String>) {
        let notice = self.build(NoticeLevel::Error, title, message);
        error!("{}: {}", notice.title, notice.message);
        self.emit(notice);
    }

    fn build(&self, level: NoticeLevel, title: impl Into<String>, message: impl Into<String>) -> Notice {
        Notice {
            level,
            title: title.into(),
            message: message.into(),
        }
    }

    fn emit(&self, notice: Notice) {
        let _ = self.tx.send(notice);
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}
