use crate::dsn::ReasonTable;
use crate::error::LineError;
use crate::patterns::{BOUNCED_TEXT, DEFERRED_TEXT, DELIVERY_RECORD, REMOTE_REPLY};
use crate::types::{FailureFragment, TransactionId};

/// Pulls delivery fields and a readable reason out of deferred/bounced lines.
pub struct FailureExtractor {
    reasons: ReasonTable,
}

impl FailureExtractor {
    pub fn new(reasons: ReasonTable) -> Self {
        Self { reasons }
    }

    pub fn extract(&self, line_no: usize, line: &str) -> Result<FailureFragment, LineError> {
        let caps = DELIVERY_RECORD
            .captures(line)
            .ok_or_else(|| LineError::malformed_failure(line_no, line))?;

        let dsn = caps[7].to_string();
        let reason = self.resolve_reason(line, &dsn);

        Ok(FailureFragment {
            queue_id: TransactionId::new(&caps[2]),
            local_time: caps[1].to_string(),
            to: caps[3].to_string(),
            relay: caps[4].to_string(),
            delay: caps[5].to_string(),
            delays: caps[6].to_string(),
            dsn,
            status: caps[8].to_string(),
            reason,
            line_no,
        })
    }

    /// First hit wins: remote reply, deferred text, bounced text, table, "".
    pub fn resolve_reason(&self, line: &str, dsn: &str) -> String {
        for pattern in [&*REMOTE_REPLY, &*DEFERRED_TEXT, &*BOUNCED_TEXT] {
            if let Some(caps) = pattern.captures(line) {
                return caps[1].trim().to_string();
            }
        }

        self.reasons
            .lookup(dsn)
            .map(|reason| reason.trim().to_string())
            .unwrap_or_default()
    }
}

impl Default for FailureExtractor {
    fn default() -> Self {
        Self::new(ReasonTable::default())
    }
}
