use crate::patterns::{QUEUE_ID, SENDER, STATUS_BOUNCED, STATUS_DEFERRED};
use crate::types::TransactionId;

pub const DEFAULT_ADMISSION_TAG: &str = "postfix/qmgr";

/// What a raw log line is worth to the correlator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineClass {
    /// Queue manager accepted a message. `queue_id` is `None` for qmgr lines
    /// that carry no ID (warnings, statistics).
    Admission {
        queue_id: Option<TransactionId>,
        has_sender: bool,
    },
    /// A deferred or bounced delivery attempt.
    Failure,
    Ignored,
}

pub struct LineClassifier {
    admission_tag: String,
}

impl Default for LineClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_ADMISSION_TAG)
    }
}

impl LineClassifier {
    pub fn new(admission_tag: &str) -> Self {
        Self {
            admission_tag: admission_tag.to_string(),
        }
    }

    pub fn classify(&self, line: &str) -> LineClass {
        if line.contains(&self.admission_tag) {
            let queue_id = QUEUE_ID
                .captures(line)
                .map(|caps| TransactionId::new(&caps[1]));
            LineClass::Admission {
                queue_id,
                has_sender: SENDER.is_match(line),
            }
        } else if line.contains(STATUS_DEFERRED) || line.contains(STATUS_BOUNCED) {
            LineClass::Failure
        } else {
            LineClass::Ignored
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admission_with_sender() {
        let classifier = LineClassifier::default();
        let class = classifier
            .classify("Jun  1 10:00:00 host postfix/qmgr[123]: ABC123: from=<s@d.com>, size=100, nrcpt=1 (queue active)");
        assert_eq!(
            class,
            LineClass::Admission {
                queue_id: Some(TransactionId::new("ABC123")),
                has_sender: true,
            }
        );
    }

    #[test]
    fn test_admission_without_sender() {
        let classifier = LineClassifier::default();
        let class = classifier.classify("Jun  1 10:00:09 host postfix/qmgr[123]: ABC123: removed");
        assert_eq!(
            class,
            LineClass::Admission {
                queue_id: Some(TransactionId::new("ABC123")),
                has_sender: false,
            }
        );
    }

    #[test]
    fn test_failure_lines() {
        let classifier = LineClassifier::default();
        assert_eq!(
            classifier.classify("host postfix/smtp[1]: A1: to=<x@y>, status=deferred (timeout)"),
            LineClass::Failure
        );
        assert_eq!(
            classifier.classify("host postfix/smtp[1]: A1: to=<x@y>, status=bounced (gone)"),
            LineClass::Failure
        );
        assert_eq!(
            classifier.classify("host postfix/smtp[1]: A1: to=<x@y>, status=sent (250 ok)"),
            LineClass::Ignored
        );
    }

    #[test]
    fn test_sender_outside_admission_is_ignored() {
        let classifier = LineClassifier::default();
        assert_eq!(
            classifier.classify("Jun  1 10:00:00 host postfix/pickup[9]: ABC123: uid=0 from=<root>"),
            LineClass::Ignored
        );
    }

    #[test]
    fn test_custom_admission_tag() {
        let classifier = LineClassifier::new("postfix-out/qmgr");
        assert!(matches!(
            classifier.classify("host postfix-out/qmgr[5]: Q9: from=<a@b>"),
            LineClass::Admission { has_sender: true, .. }
        ));
        assert_eq!(
            classifier.classify("host postfix/qmgr[5]: Q9: from=<a@b>"),
            LineClass::Ignored
        );
    }
}
