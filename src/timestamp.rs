//! Syslog timestamps carry no year and no zone. Both are supplied here.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDateTime, TimeZone, Utc};

/// Asia/Jakarta (WIB) has no daylight saving, so a fixed offset is exact.
pub const DEFAULT_ZONE_NAME: &str = "Asia/Jakarta";
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 7 * 60;

#[derive(Debug, Clone)]
pub struct TimestampNormalizer {
    year: i32,
    offset: FixedOffset,
}

impl TimestampNormalizer {
    pub fn new(year: i32, offset: FixedOffset) -> Self {
        Self { year, offset }
    }

    /// Uses the current calendar year as seen in `offset`.
    pub fn current_year(offset: FixedOffset) -> Self {
        let year = Utc::now().with_timezone(&offset).year();
        Self::new(year, offset)
    }

    pub fn offset_from_minutes(minutes: i32) -> Option<FixedOffset> {
        FixedOffset::east_opt(minutes.checked_mul(60)?)
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// `UTC+07:00`, `UTC-00:30`
    pub fn utc_offset_label(&self) -> String {
        format!("UTC{}", self.offset)
    }

    /// `"Jun  1 10:00:05"` -> UTC instant in `self.year`.
    pub fn normalize(&self, local: &str) -> Result<DateTime<Utc>, String> {
        // Syslog pads single-digit days with a space; collapse it.
        let compact = local.split_whitespace().collect::<Vec<_>>().join(" ");
        let value = format!("{} {}", self.year, compact);

        let naive = NaiveDateTime::parse_from_str(&value, "%Y %b %d %H:%M:%S")
            .map_err(|e| format!("{e} (value: {value})"))?;

        self.offset
            .from_local_datetime(&naive)
            .single()
            .map(|local| local.with_timezone(&Utc))
            .ok_or_else(|| format!("ambiguous local time: {value}"))
    }
}
