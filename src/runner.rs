//! Drives the correlator over a log directory and writes the exports.

use crate::config::{Config, CorrelationScope};
use crate::correlator::{CorrelationReport, Correlator};
use crate::error::LineError;
use crate::export;
use crate::source;
use crate::statistics::RunStatistics;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Where the lines of one batch came from, so per-line warnings can name
/// a file and a line inside it.
#[derive(Debug, Default)]
pub struct BatchOrigin {
    /// Each file with the batch line number of its first line.
    files: Vec<(PathBuf, usize)>,
    lines: usize,
}

impl BatchOrigin {
    pub fn single(path: &Path, lines: usize) -> Self {
        let mut origin = Self::default();
        origin.push(path, lines);
        origin
    }

    pub fn push(&mut self, path: &Path, lines: usize) {
        self.files.push((path.to_path_buf(), self.lines + 1));
        self.lines += lines;
    }

    /// Maps a 1-based batch line number to its file and file-local line.
    pub fn locate(&self, line_no: usize) -> Option<(&Path, usize)> {
        if line_no == 0 || line_no > self.lines {
            return None;
        }
        let idx = self.files.partition_point(|(_, start)| *start <= line_no);
        let (path, start) = &self.files[idx.checked_sub(1)?];
        Some((path.as_path(), line_no - start + 1))
    }

    pub fn describe(&self, warning: &LineError) -> String {
        match self.locate(warning.line_no()) {
            Some((path, line)) => format!("{}:{line}: {warning}", path.display()),
            None => warning.to_string(),
        }
    }
}

pub struct Runner {
    config: Config,
    correlator: Correlator,
    stats: RunStatistics,
}

impl Runner {
    pub fn new(config: Config) -> Result<Self> {
        let correlator = config.correlator()?;
        Ok(Self {
            config,
            correlator,
            stats: RunStatistics::new(),
        })
    }

    pub fn statistics(&self) -> &RunStatistics {
        &self.stats
    }

    pub fn correlate_file(&self, path: &Path) -> Result<CorrelationReport> {
        let lines = source::read_lines(path)?;
        Ok(self.correlator.correlate(&lines))
    }

    pub fn run(&mut self, log_dir: &Path) -> Result<()> {
        let files = source::discover_log_files(log_dir)?;
        log::info!("Found {} log files under {}", files.len(), log_dir.display());

        match self.config.correlation_scope {
            CorrelationScope::PerFile => {
                for path in &files {
                    self.process_file(path)?;
                }
            }
            CorrelationScope::Combined => self.process_combined(log_dir, &files)?,
        }
        Ok(())
    }

    fn process_file(&mut self, path: &Path) -> Result<()> {
        let lines = match source::read_lines(path) {
            Ok(lines) => lines,
            Err(e) => {
                log::error!("{e:#}");
                self.stats.record_failed_source();
                return Ok(());
            }
        };
        let report = self.correlator.correlate(&lines);
        log_warnings(&BatchOrigin::single(path, lines.len()), &report);
        self.finish_batch(path, &report)
    }

    fn process_combined(&mut self, log_dir: &Path, files: &[PathBuf]) -> Result<()> {
        let mut lines = Vec::new();
        let mut origin = BatchOrigin::default();
        for path in files {
            match source::read_lines(path) {
                Ok(mut file_lines) => {
                    origin.push(path, file_lines.len());
                    lines.append(&mut file_lines);
                }
                Err(e) => {
                    log::error!("{e:#}");
                    self.stats.record_failed_source();
                }
            }
        }

        let report = self.correlator.correlate(&lines);
        log_warnings(&origin, &report);
        let target = self
            .config
            .output
            .directory
            .clone()
            .unwrap_or_else(|| log_dir.to_path_buf())
            .join("bounces");
        self.finish_batch(&target, &report)
    }

    fn finish_batch(&mut self, source: &Path, report: &CorrelationReport) -> Result<()> {
        self.stats
            .record_batch(&report.stats, &report.records, &self.config.soft_dsn);

        if report.records.is_empty() {
            log::debug!("No bounces in {}", source.display());
            return Ok(());
        }

        let out_dir = self.config.output.directory.as_deref();
        if let Some(dir) = out_dir {
            std::fs::create_dir_all(dir)?;
        }

        if self.config.output.json {
            let path = export::output_path(source, out_dir, "json");
            match export::write_json(&path, &report.records) {
                Ok(()) => {
                    self.stats.record_file_written();
                    log::info!(
                        "Processed {} -> {} ({} bounces)",
                        source.display(),
                        path.display(),
                        report.records.len()
                    );
                }
                Err(e) => log::error!("Failed to write output file {}: {e:#}", path.display()),
            }
        }

        if self.config.output.xlsx {
            let path = export::output_path(source, out_dir, "xlsx");
            match export::write_xlsx(&path, &report.records) {
                Ok(()) => {
                    self.stats.record_file_written();
                    log::info!("Created Excel file: {}", path.display());
                }
                Err(e) => log::error!("Failed to write Excel file {}: {e:#}", path.display()),
            }
        }

        if self.config.output.csv {
            let path = export::output_path(source, out_dir, "csv");
            match export::write_csv_file(&path, &report.records) {
                Ok(()) => {
                    self.stats.record_file_written();
                    log::info!("Created CSV file: {}", path.display());
                }
                Err(e) => log::error!("Failed to write CSV file {}: {e:#}", path.display()),
            }
        }

        Ok(())
    }
}

fn log_warnings(origin: &BatchOrigin, report: &CorrelationReport) {
    for warning in &report.warnings {
        log::warn!("Skipping {}", origin.describe(warning));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QMGR: &str = "Jun  1 10:00:00 host postfix/qmgr[123]: ABC123: from=<s@d.com>, size=10, nrcpt=1 (queue active)";
    const BOUNCE: &str = "Jun  1 10:00:05 host postfix/smtp[124]: ABC123: to=<r@d.com>, relay=mx.d.com, delay=1.2, delays=0.1/0/0.5/0.6, dsn=5.1.1, status=bounced (host said: 550 no such user)";

    fn config() -> Config {
        Config {
            year: Some(2025),
            ..Config::default()
        }
    }

    #[test]
    fn test_per_file_does_not_join_across_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("maillog.1"), format!("{QMGR}\n")).unwrap();
        std::fs::write(dir.path().join("maillog.2"), format!("{QMGR}\n{BOUNCE}\n")).unwrap();
        std::fs::write(dir.path().join("maillog.3"), format!("{BOUNCE}\n")).unwrap();

        let mut runner = Runner::new(config()).unwrap();
        runner.run(dir.path()).unwrap();

        assert!(dir.path().join("maillog.2.json").exists());
        assert!(dir.path().join("maillog.2.xlsx").exists());
        assert!(!dir.path().join("maillog.2.csv").exists());
        assert!(!dir.path().join("maillog.1.json").exists());
        assert!(!dir.path().join("maillog.3.json").exists());
        assert_eq!(runner.statistics().batches, 3);
        assert_eq!(runner.statistics().correlation.records, 1);
        assert_eq!(runner.statistics().files_written, 2);
    }

    #[test]
    fn test_combined_scope_joins_rotated_logs() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        std::fs::write(dir.path().join("maillog.1"), format!("{QMGR}\n")).unwrap();
        std::fs::write(dir.path().join("maillog.2"), format!("{BOUNCE}\n")).unwrap();

        let mut config = config();
        config.correlation_scope = CorrelationScope::Combined;
        config.output.xlsx = false;
        config.output.directory = Some(out.clone());

        let mut runner = Runner::new(config).unwrap();
        runner.run(dir.path()).unwrap();

        let json = std::fs::read_to_string(out.join("bounces.json")).unwrap();
        let records: Vec<serde_json::Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["from"], "s@d.com");
        assert!(!out.join("bounces.xlsx").exists());
    }

    #[test]
    fn test_origin_maps_batch_lines_to_files() {
        let mut origin = BatchOrigin::default();
        origin.push(Path::new("/var/log/maillog.1"), 3);
        origin.push(Path::new("/var/log/maillog.2"), 0);
        origin.push(Path::new("/var/log/maillog.3"), 2);

        assert_eq!(origin.locate(1), Some((Path::new("/var/log/maillog.1"), 1)));
        assert_eq!(origin.locate(3), Some((Path::new("/var/log/maillog.1"), 3)));
        assert_eq!(origin.locate(4), Some((Path::new("/var/log/maillog.3"), 1)));
        assert_eq!(origin.locate(5), Some((Path::new("/var/log/maillog.3"), 2)));
        assert_eq!(origin.locate(0), None);
        assert_eq!(origin.locate(6), None);
    }

    #[test]
    fn test_warnings_name_the_source_file() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("maillog.1");
        let second = dir.path().join("maillog.2");
        std::fs::write(&first, format!("{QMGR}\n")).unwrap();
        std::fs::write(&second, "noise\nJun  1 10:00:07 host postfix/smtp[9]: status=bounced (gone)\n").unwrap();

        let runner = Runner::new(config()).unwrap();
        let mut lines = source::read_lines(&first).unwrap();
        let mut origin = BatchOrigin::single(&first, lines.len());
        let mut more = source::read_lines(&second).unwrap();
        origin.push(&second, more.len());
        lines.append(&mut more);

        let report = runner.correlator.correlate(&lines);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].line_no(), 3);
        let message = origin.describe(&report.warnings[0]);
        assert!(message.starts_with(&format!("{}:2: line 3:", second.display())));
    }
}
