//! Transient user-facing notices (the toasts of the mobile app).

use crate::error::AppError;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub id: u64,
    pub level: NoticeLevel,
    pub message: String,
}

/// Observable queue of notices. Clones share the same queue.
#[derive(Clone)]
pub struct NoticeBoard {
    counter: Arc<AtomicU64>,
    notices: Arc<watch::Sender<Vec<Notice>>>,
    ttl: Option<Duration>,
}

impl Default for NoticeBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl NoticeBoard {
    pub fn new() -> Self {
        let (notices, _) = watch::channel(Vec::new());
        Self {
            counter: Arc::new(AtomicU64::new(1)),
            notices: Arc::new(notices),
            ttl: None,
        }
    }

    /// Notices dismiss themselves after `ttl`.
    pub fn with_ttl(ttl: Option<Duration>) -> Self {
        Self { ttl, ..Self::new() }
    }

    pub fn watch(&self) -> watch::Receiver<Vec<Notice>> {
        self.notices.subscribe()
    }

    pub fn current(&self) -> Vec<Notice> {
        self.notices.borrow().clone()
    }

    /// Latest message, if any.
    pub fn last_message(&self) -> Option<String> {
        self.notices.borrow().last().map(|n| n.message.clone())
    }

    fn push(&self, level: NoticeLevel, message: String) -> u64 {
        let id = self.counter.fetch_add(1, Ordering::Relaxed);
        self.notices.send_modify(|notices| {
            notices.push(Notice { id, level, message });
        });
        if let Some(ttl) = self.ttl {
            self.expire_after(id, ttl);
        }
        id
    }

    pub fn info(&self, message: impl Into<String>) -> u64 {
        self.push(NoticeLevel::Info, message.into())
    }

    pub fn error(&self, error: &AppError) -> u64 {
        tracing::warn!(error = %error, "surfacing error notice");
        self.push(NoticeLevel::Error, error.user_message())
    }

    /// Posts the error of a failed result and passes the result through.
    pub fn report<T>(&self, result: Result<T, AppError>) -> Result<T, AppError> {
        if let Err(err) = &result {
            self.error(err);
        }
        result
    }

    pub fn dismiss(&self, id: u64) -> bool {
        self.notices.send_if_modified(|notices| {
            let before = notices.len();
            notices.retain(|n| n.id != id);
            notices.len() != before
        })
    }

    /// Dismisses notice `id` after `after` has elapsed. Needs a tokio
    /// runtime; without one the notice stays until dismissed.
    pub fn expire_after(&self, id: u64, after: Duration) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let board = self.clone();
        runtime.spawn(async move {
            tokio::time::sleep(after).await;
            board.dismiss(id);
        });
    }
}
