use crate::classifier::{LineClassifier, DEFAULT_ADMISSION_TAG};
use crate::correlator::Correlator;
use crate::dsn::{DsnPolicy, ReasonTable};
use crate::timestamp::{TimestampNormalizer, DEFAULT_UTC_OFFSET_MINUTES, DEFAULT_ZONE_NAME};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory scanned recursively for log files.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    #[serde(default = "default_admission_tag")]
    pub admission_tag: String,
    #[serde(default)]
    pub timezone: TimezoneConfig,
    /// Year assumed for syslog timestamps. Defaults to the current year,
    /// which misdates December lines read in January.
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub correlation_scope: CorrelationScope,
    #[serde(default)]
    pub soft_dsn: DsnPolicy,
    #[serde(default)]
    pub bounce_reasons: ReasonTable,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimezoneConfig {
    pub name: String,
    pub utc_offset_minutes: i32,
}

impl Default for TimezoneConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_ZONE_NAME.to_string(),
            utc_offset_minutes: DEFAULT_UTC_OFFSET_MINUTES,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationScope {
    /// Each file is its own batch; queue IDs never join across files.
    #[default]
    PerFile,
    /// All files form one batch, so rotated logs can still join.
    Combined,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub json: bool,
    /// `Bounces` workbook next to the JSON.
    #[serde(default = "default_true")]
    pub xlsx: bool,
    #[serde(default)]
    pub csv: bool,
    /// Write next to each log file when unset.
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            json: true,
            xlsx: true,
            csv: false,
            directory: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_admission_tag() -> String {
    DEFAULT_ADMISSION_TAG.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_dir: None,
            admission_tag: default_admission_tag(),
            timezone: TimezoneConfig::default(),
            year: None,
            correlation_scope: CorrelationScope::default(),
            soft_dsn: DsnPolicy::default(),
            bounce_reasons: ReasonTable::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.admission_tag.trim().is_empty() {
            anyhow::bail!("admission_tag must not be empty");
        }
        if TimestampNormalizer::offset_from_minutes(self.timezone.utc_offset_minutes).is_none() {
            anyhow::bail!(
                "timezone.utc_offset_minutes out of range: {}",
                self.timezone.utc_offset_minutes
            );
        }
        if !self.output.json && !self.output.xlsx && !self.output.csv {
            log::warn!("JSON, XLSX and CSV output are all disabled; nothing will be written");
        }
        Ok(())
    }

    pub fn normalizer(&self) -> anyhow::Result<TimestampNormalizer> {
        let offset = TimestampNormalizer::offset_from_minutes(self.timezone.utc_offset_minutes)
            .with_context(|| {
                format!(
                    "Invalid UTC offset for {}: {} minutes",
                    self.timezone.name, self.timezone.utc_offset_minutes
                )
            })?;
        Ok(match self.year {
            Some(year) => TimestampNormalizer::new(year, offset),
            None => TimestampNormalizer::current_year(offset),
        })
    }

    pub fn correlator(&self) -> anyhow::Result<Correlator> {
        Ok(Correlator::new(
            LineClassifier::new(&self.admission_tag),
            self.bounce_reasons.clone(),
            self.normalizer()?,
        ))
    }
}
