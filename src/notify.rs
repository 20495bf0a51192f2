//! User-visible notices.
//!
//! The client surfaces every surfaced-and-rethrown error as a transient
//! notice on a broadcast bus, in addition to returning it to the caller.
//! Consumers (the CLI, an embedding UI) subscribe and render; nobody is
//! required to listen, and a lagging receiver only drops old notices.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    /// Stable tag matching `ApiError::kind`, e.g. "conflict" or "session_expired".
    pub kind: String,
    pub message: String,
}

impl Notice {
    pub fn error(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            kind: kind.into(),
            message: message.into(),
        }
    }

    pub fn warning(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            kind: kind.into(),
            message: message.into(),
        }
    }
}

pub type NoticeBus = broadcast::Sender<Notice>;

pub fn init_notice_bus() -> (NoticeBus, broadcast::Receiver<Notice>) {
    broadcast::channel(64)
}
