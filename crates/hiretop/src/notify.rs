//! Outbound notification port.
//!
//! Delivery is always best-effort: callers dispatch through [`dispatch`], which downgrades a
//! transport failure into [`NotificationResult::Failed`] so the surrounding operation still
//! succeeds.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::warn;

/// A templated message addressed to a single recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub to: String,
    pub subject: String,
    pub template: String,
    pub context: BTreeMap<String, String>,
}

impl Notification {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            template: template.into(),
            context: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.context.insert(key.to_string(), value.into());
        self
    }
}

pub trait Notifier: Send + Sync {
    fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
    #[error("notification rejected: {0}")]
    Rejected(String),
}

/// Observable outcome of a best-effort dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NotificationResult {
    Sent,
    Failed { reason: String },
}

impl NotificationResult {
    pub fn is_sent(&self) -> bool {
        matches!(self, NotificationResult::Sent)
    }
}

pub fn dispatch<N>(notifier: &N, notification: &Notification) -> NotificationResult
where
    N: Notifier + ?Sized,
{
    match notifier.send(notification) {
        Ok(()) => NotificationResult::Sent,
        Err(err) => {
            warn!(
                template = %notification.template,
                error = %err,
                "notification dispatch failed"
            );
            NotificationResult::Failed {
                reason: err.to_string(),
            }
        }
    }
}

/// Records deliveries in memory. Can be switched to fail every send.
#[derive(Debug, Default, Clone)]
pub struct MemoryNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
    failure: Option<String>,
}

impl MemoryNotifier {
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            sent: Arc::default(),
            failure: Some(reason.into()),
        }
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().expect("notifier mutex poisoned").clone()
    }

    pub fn sent_to(&self, email: &str) -> Vec<Notification> {
        self.sent()
            .into_iter()
            .filter(|notification| notification.to == email)
            .collect()
    }
}

impl Notifier for MemoryNotifier {
    fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        if let Some(reason) = &self.failure {
            return Err(NotifyError::Transport(reason.clone()));
        }
        self.sent
            .lock()
            .expect("notifier mutex poisoned")
            .push(notification.clone());
        Ok(())
    }
}
