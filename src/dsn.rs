//! Delivery status (DSN) code knowledge: canned reasons and the soft/hard split.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Status code -> human readable explanation, used when a delivery line
/// carries no reply text of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReasonTable(BTreeMap<String, String>);

impl Default for ReasonTable {
    fn default() -> Self {
        let entries = [
            ("5.0.0", "Mailbox does not exist"), // yahoo
            ("5.1.1", "Mailbox does not exist"), // gmail
            ("5.2.1", "Mailbox Disabled"),       // gmail
            ("5.2.2", "Mailbox full"),           // icloud
            ("4.2.2", "Mailbox full"),           // gmail
            ("5.4.4", "A record not found"),
        ];
        Self(
            entries
                .iter()
                .map(|(code, reason)| (code.to_string(), reason.to_string()))
                .collect(),
        )
    }
}

impl ReasonTable {
    pub fn new(entries: BTreeMap<String, String>) -> Self {
        Self(entries)
    }

    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    pub fn lookup(&self, dsn: &str) -> Option<&str> {
        self.0.get(dsn).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Codes listed here are soft bounces; everything else is hard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DsnPolicy {
    soft: Vec<String>,
}

impl Default for DsnPolicy {
    fn default() -> Self {
        Self::new(
            ["5.2.0", "5.2.1", "5.2.2", "5.3.1", "5.4.5", "5.5.3"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
    }
}

impl DsnPolicy {
    pub fn new(soft: Vec<String>) -> Self {
        Self { soft }
    }

    pub fn soft_codes(&self) -> &[String] {
        &self.soft
    }

    /// Soft only on an exact match; empty and partial codes ("", "5.2") are hard.
    pub fn is_hard(&self, dsn: &str) -> bool {
        let dsn = dsn.trim();
        dsn.is_empty() || !self.soft.iter().any(|code| code == dsn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_reason_table() {
        let table = ReasonTable::default();
        assert_eq!(table.lookup("5.1.1"), Some("Mailbox does not exist"));
        assert_eq!(table.lookup("4.2.2"), Some("Mailbox full"));
        assert_eq!(table.lookup("4.4.3"), None);
        assert_eq!(table.len(), 6);
    }

    #[test]
    fn test_soft_and_hard_codes() {
        let policy = DsnPolicy::default();
        assert!(!policy.is_hard("5.2.2"));
        assert!(!policy.is_hard("5.5.3"));
        assert!(policy.is_hard("5.1.1"));
        assert!(policy.is_hard("4.2.2"));
    }

    #[test]
    fn test_partial_codes_are_hard() {
        let policy = DsnPolicy::default();
        assert!(policy.is_hard("5.2"));
        assert!(policy.is_hard(""));
    }

    #[test]
    fn test_reason_table_from_yaml() {
        let table: ReasonTable = serde_yaml::from_str("\"5.7.1\": Rejected by policy\n").unwrap();
        assert_eq!(table.lookup("5.7.1"), Some("Rejected by policy"));
        assert_eq!(table.lookup("5.1.1"), None);
    }
}
