//! User-visible notices and transaction status tracking

use crate::chain::{ChainError, TxReceipt};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NoticeLevel {
    Pending,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.level, self.message)
    }
}

/// Sink for notices shown to the user
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);

    fn pending(&self, message: &str) {
        self.notify(Notice::new(NoticeLevel::Pending, message));
    }

    fn success(&self, message: &str) {
        self.notify(Notice::new(NoticeLevel::Success, message));
    }

    fn warning(&self, message: &str) {
        self.notify(Notice::new(NoticeLevel::Warning, message));
    }

    fn error(&self, message: &str) {
        self.notify(Notice::new(NoticeLevel::Error, message));
    }
}

/// Routes notices to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Error => log::error!("{}", notice.message),
            NoticeLevel::Warning => log::warn!("{}", notice.message),
            _ => log::info!("{}", notice.message),
        }
    }
}

/// Keeps every notice in order, for tests and scripted front-ends
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.notices.lock().iter().map(|n| n.message.clone()).collect()
    }

    pub fn last(&self) -> Option<Notice> {
        self.notices.lock().last().cloned()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }
}

/// Messages shown while a transaction is in flight and once it settles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxMessages {
    pub pending: String,
    pub success: String,
    pub error: String,
}

impl TxMessages {
    pub fn new(success: impl Into<String>) -> Self {
        Self {
            pending: "Approve transaction...".to_string(),
            success: success.into(),
            error: "Encountered error 🤯".to_string(),
        }
    }
}

/// Announce `submission` as pending, then as success or error when it settles
pub async fn track_transaction<F>(
    notifier: &dyn Notifier,
    messages: &TxMessages,
    submission: F,
) -> Result<TxReceipt, ChainError>
where
    F: Future<Output = Result<TxReceipt, ChainError>>,
{
    notifier.pending(&messages.pending);
    match submission.await {
        Ok(receipt) => {
            log::info!("Transaction {} confirmed", receipt.tx_hash);
            notifier.success(&messages.success);
            Ok(receipt)
        }
        Err(e) => {
            log::error!("Transaction failed: {}", e);
            notifier.error(&messages.error);
            Err(e)
        }
    }
}
