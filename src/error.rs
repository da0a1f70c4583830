//! Per-line problems found while correlating a batch.
//!
//! None of these abort the batch: the offending line (or record) is skipped
//! and the error is kept in the correlation report.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineError {
    #[error("line {line_no}: failure line has no queue id: {line}")]
    MissingQueueId { line_no: usize, line: String },

    #[error("line {line_no}: failure line does not match the delivery record format: {line}")]
    MalformedFailure { line_no: usize, line: String },

    #[error("line {line_no}: error parsing sender: {line}")]
    MalformedSender { line_no: usize, line: String },

    #[error("line {line_no}: cannot parse timestamp '{value}': {reason}")]
    InvalidTimestamp {
        line_no: usize,
        value: String,
        reason: String,
    },
}

impl LineError {
    pub fn line_no(&self) -> usize {
        match self {
            LineError::MissingQueueId { line_no, .. }
            | LineError::MalformedFailure { line_no, .. }
            | LineError::MalformedSender { line_no, .. }
            | LineError::InvalidTimestamp { line_no, .. } => *line_no,
        }
    }

    pub fn missing_queue_id(line_no: usize, line: &str) -> Self {
        Self::MissingQueueId {
            line_no,
            line: line.to_string(),
        }
    }

    pub fn malformed_failure(line_no: usize, line: &str) -> Self {
        Self::MalformedFailure {
            line_no,
            line: line.to_string(),
        }
    }

    pub fn malformed_sender(line_no: usize, line: &str) -> Self {
        Self::MalformedSender {
            line_no,
            line: line.to_string(),
        }
    }
}
