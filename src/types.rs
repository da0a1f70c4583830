use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Postfix queue ID, the key that ties qmgr and delivery lines together.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(pub String);

impl TransactionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderFragment {
    pub queue_id: TransactionId,
    pub from: String,
    pub line_no: usize,
}

/// One deferred/bounced delivery attempt, before the sender is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureFragment {
    pub queue_id: TransactionId,
    pub local_time: String, // "Jun  1 10:00:05", no year
    pub to: String,
    pub relay: String,
    pub delay: String,
    pub delays: String,
    pub dsn: String,
    pub status: String,
    pub reason: String,
    pub line_no: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BounceRecord {
    pub date: DateTime<Utc>,
    pub queue_id: TransactionId,
    pub from: String,
    pub to: String,
    pub relay: String,
    pub delay: String,
    pub delays: String,
    pub dsn: String,
    pub status: String,
    pub reason: String,
}

impl BounceRecord {
    pub fn from_fragments(
        date: DateTime<Utc>,
        sender: &SenderFragment,
        failure: &FailureFragment,
    ) -> Self {
        Self {
            date,
            queue_id: failure.queue_id.clone(),
            from: sender.from.clone(),
            to: failure.to.clone(),
            relay: failure.relay.clone(),
            delay: failure.delay.clone(),
            delays: failure.delays.clone(),
            dsn: failure.dsn.clone(),
            status: failure.status.clone(),
            reason: failure.reason.clone(),
        }
    }
}
