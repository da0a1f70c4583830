use crate::correlator::CorrelationStats;
use crate::dsn::DsnPolicy;
use crate::types::BounceRecord;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize)]
pub struct RunStatistics {
    pub batches: usize,
    pub failed_sources: usize,
    pub files_written: usize,
    pub hard_bounces: usize,
    pub soft_bounces: usize,
    pub by_status: BTreeMap<String, usize>,
    pub correlation: CorrelationStats,
    pub start_time: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl Default for RunStatistics {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStatistics {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            batches: 0,
            failed_sources: 0,
            files_written: 0,
            hard_bounces: 0,
            soft_bounces: 0,
            by_status: BTreeMap::new(),
            correlation: CorrelationStats::default(),
            start_time: now,
            last_updated: now,
        }
    }

    pub fn record_batch(&mut self, stats: &CorrelationStats, records: &[BounceRecord], policy: &DsnPolicy) {
        self.batches += 1;
        self.last_updated = Utc::now();

        let total = &mut self.correlation;
        total.lines_scanned += stats.lines_scanned;
        total.admissions += stats.admissions;
        total.sender_fragments += stats.sender_fragments;
        total.duplicate_senders += stats.duplicate_senders;
        total.failure_lines += stats.failure_lines;
        total.ineligible_failures += stats.ineligible_failures;
        total.failure_fragments += stats.failure_fragments;
        total.skipped_lines += stats.skipped_lines;
        total.timestamp_errors += stats.timestamp_errors;
        total.dropped_without_sender += stats.dropped_without_sender;
        total.records += stats.records;

        for record in records {
            if policy.is_hard(&record.dsn) {
                self.hard_bounces += 1;
            } else {
                self.soft_bounces += 1;
            }
            *self.by_status.entry(record.status.clone()).or_insert(0) += 1;
        }
    }

    pub fn record_failed_source(&mut self) {
        self.failed_sources += 1;
        self.last_updated = Utc::now();
    }

    pub fn record_file_written(&mut self) {
        self.files_written += 1;
    }

    pub fn print_summary(&self) {
        let c = &self.correlation;
        println!("📊 Bounce Parser Statistics");
        println!("═══════════════════════════════════════");
        println!("  Batches processed: {}", self.batches);
        if self.failed_sources > 0 {
            println!("  Unreadable sources: {}", self.failed_sources);
        }
        println!("  Lines scanned: {}", c.lines_scanned);
        println!("  Admissions: {}", c.admissions);
        println!("  Failure lines: {}", c.failure_lines);
        println!("  ├─ Not admitted: {}", c.ineligible_failures);
        println!("  ├─ Skipped (malformed): {}", c.skipped_lines);
        println!("  ├─ Without sender: {}", c.dropped_without_sender);
        println!("  └─ Bad timestamp: {}", c.timestamp_errors);
        println!("  Duplicate sender lines: {}", c.duplicate_senders);
        println!();
        println!("  Bounce records: {}", c.records);
        println!("  ├─ Hard: {}", self.hard_bounces);
        println!("  └─ Soft: {}", self.soft_bounces);
        for (status, count) in &self.by_status {
            println!("     {status}: {count}");
        }
        println!("  Files written: {}", self.files_written);
        println!(
            "  Started: {}",
            self.start_time.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
}
