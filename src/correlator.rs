//! Bounce correlation over one batch of Postfix log lines.
//!
//! A bounce is spread over several lines that only share the queue ID:
//! `postfix/qmgr` admits the message and names the sender, and a delivery
//! agent later reports `status=deferred` or `status=bounced` for each
//! recipient. The correlator indexes admissions first, so delivery lines may
//! appear before or after the admission that makes them eligible.

use crate::classifier::{LineClass, LineClassifier};
use crate::dsn::ReasonTable;
use crate::error::LineError;
use crate::extractor::FailureExtractor;
use crate::patterns::{QUEUE_ID, SENDER};
use crate::timestamp::TimestampNormalizer;
use crate::types::{BounceRecord, FailureFragment, SenderFragment, TransactionId};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CorrelationStats {
    pub lines_scanned: usize,
    pub admissions: usize,
    pub sender_fragments: usize,
    pub duplicate_senders: usize,
    pub failure_lines: usize,
    pub ineligible_failures: usize,
    pub failure_fragments: usize,
    pub skipped_lines: usize,
    pub timestamp_errors: usize,
    pub dropped_without_sender: usize,
    pub records: usize,
}

#[derive(Debug, Clone, Default)]
pub struct CorrelationReport {
    pub records: Vec<BounceRecord>,
    pub warnings: Vec<LineError>,
    pub stats: CorrelationStats,
}

/// Fragments of one batch, keyed by queue ID.
#[derive(Debug, Default)]
pub struct FragmentArena {
    eligible: HashSet<TransactionId>,
    senders: HashMap<TransactionId, SenderFragment>,
    failures: Vec<FailureFragment>,
}

impl FragmentArena {
    pub fn is_eligible(&self, id: &TransactionId) -> bool {
        self.eligible.contains(id)
    }

    pub fn eligible_count(&self) -> usize {
        self.eligible.len()
    }

    pub fn sender(&self, id: &TransactionId) -> Option<&SenderFragment> {
        self.senders.get(id)
    }

    pub fn failures(&self) -> &[FailureFragment] {
        &self.failures
    }

    /// Returns false when the ID already has a sender.
    fn insert_sender(&mut self, fragment: SenderFragment) -> bool {
        if self.senders.contains_key(&fragment.queue_id) {
            return false;
        }
        self.senders.insert(fragment.queue_id.clone(), fragment);
        true
    }

    /// Failures stay in line order; the join looks senders up by ID.
    fn push_failure(&mut self, fragment: FailureFragment) {
        self.failures.push(fragment);
    }
}

pub struct Correlator {
    classifier: LineClassifier,
    extractor: FailureExtractor,
    normalizer: TimestampNormalizer,
}

impl Correlator {
    pub fn new(
        classifier: LineClassifier,
        reasons: ReasonTable,
        normalizer: TimestampNormalizer,
    ) -> Self {
        Self {
            classifier,
            extractor: FailureExtractor::new(reasons),
            normalizer,
        }
    }

    pub fn correlate<S: AsRef<str>>(&self, lines: &[S]) -> CorrelationReport {
        let mut report = CorrelationReport::default();
        let arena = self.build_arena(lines, &mut report);
        self.join(&arena, &mut report);

        report.stats.records = report.records.len();
        log::debug!(
            "Correlated {} lines: {} records, {} warnings, {} fragments without sender",
            report.stats.lines_scanned,
            report.stats.records,
            report.warnings.len(),
            report.stats.dropped_without_sender
        );
        report
    }

    /// Passes (a) and (b): eligibility index, then sender and failure fragments.
    pub fn build_arena<S: AsRef<str>>(
        &self,
        lines: &[S],
        report: &mut CorrelationReport,
    ) -> FragmentArena {
        let mut arena = FragmentArena::default();
        let mut sender_lines = Vec::new();
        let mut failure_lines = Vec::new();

        for (idx, line) in lines.iter().enumerate() {
            let line = line.as_ref();
            let line_no = idx + 1;
            report.stats.lines_scanned += 1;

            match self.classifier.classify(line) {
                LineClass::Admission {
                    queue_id,
                    has_sender,
                } => {
                    if has_sender {
                        sender_lines.push((line_no, line, queue_id.clone()));
                    }
                    if let Some(id) = queue_id {
                        report.stats.admissions += 1;
                        arena.eligible.insert(id);
                    }
                }
                LineClass::Failure => failure_lines.push((line_no, line)),
                LineClass::Ignored => {}
            }
        }

        for (line_no, line) in failure_lines {
            report.stats.failure_lines += 1;
            let Some(caps) = QUEUE_ID.captures(line) else {
                Self::skip(report, LineError::missing_queue_id(line_no, line));
                continue;
            };
            if !arena.is_eligible(&TransactionId::new(&caps[1])) {
                report.stats.ineligible_failures += 1;
                continue;
            }

            match self.extractor.extract(line_no, line) {
                Ok(fragment) => {
                    report.stats.failure_fragments += 1;
                    arena.push_failure(fragment);
                }
                Err(e) => Self::skip(report, e),
            }
        }

        for (line_no, line, queue_id) in sender_lines {
            let Some(queue_id) = queue_id else {
                Self::skip(report, LineError::malformed_sender(line_no, line));
                continue;
            };
            if !arena.is_eligible(&queue_id) {
                continue;
            }
            let Some(caps) = SENDER.captures(line) else {
                Self::skip(report, LineError::malformed_sender(line_no, line));
                continue;
            };

            let fragment = SenderFragment {
                queue_id,
                from: caps[1].to_string(),
                line_no,
            };
            if arena.insert_sender(fragment) {
                report.stats.sender_fragments += 1;
            } else {
                report.stats.duplicate_senders += 1;
            }
        }

        arena
    }

    /// Pass (c): one record per failure fragment whose queue ID has a sender.
    pub fn join(&self, arena: &FragmentArena, report: &mut CorrelationReport) {
        for failure in arena.failures() {
            let Some(sender) = arena.sender(&failure.queue_id) else {
                log::debug!(
                    "No sender for {} (line {}), dropping {} fragment",
                    failure.queue_id,
                    failure.line_no,
                    failure.status
                );
                report.stats.dropped_without_sender += 1;
                continue;
            };

            match self.normalizer.normalize(&failure.local_time) {
                Ok(date) => report
                    .records
                    .push(BounceRecord::from_fragments(date, sender, failure)),
                Err(reason) => {
                    report.stats.timestamp_errors += 1;
                    let err = LineError::InvalidTimestamp {
                        line_no: failure.line_no,
                        value: failure.local_time.clone(),
                        reason,
                    };
                    log::debug!("{err}");
                    report.warnings.push(err);
                }
            }
        }
    }

    fn skip(report: &mut CorrelationReport, err: LineError) {
        log::debug!("Skipping {err}");
        report.stats.skipped_lines += 1;
        report.warnings.push(err);
    }
}
