//! Writers for correlated bounce records.

use crate::types::BounceRecord;
use anyhow::{Context, Result};
use chrono::SecondsFormat;
use rust_xlsxwriter::{Color, Format, FormatPattern, Workbook};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Column titles shared by the spreadsheet and CSV exports.
pub const TABLE_HEADER: [&str; 8] = ["Date", "From", "To", "Relay", "Delay", "DSN", "Status", "Reason"];

pub const SHEET_NAME: &str = "Bounces";

const HEADER_FILL: u32 = 0xCCCCCC;

pub fn to_json(records: &[BounceRecord]) -> Result<String> {
    Ok(serde_json::to_string(records)?)
}

pub fn write_json(path: &Path, records: &[BounceRecord]) -> Result<()> {
    let json = to_json(records)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

/// One table row per record, in `TABLE_HEADER` order, date as RFC 3339.
pub fn table_row(record: &BounceRecord) -> [String; 8] {
    [
        record.date.to_rfc3339_opts(SecondsFormat::Secs, true),
        record.from.clone(),
        record.to.clone(),
        record.relay.clone(),
        record.delay.clone(),
        record.dsn.clone(),
        record.status.clone(),
        record.reason.clone(),
    ]
}

/// Builds the `Bounces` workbook: a bold grey header row, then one row per record.
pub fn build_workbook(records: &[BounceRecord]) -> Result<Workbook> {
    let mut workbook = Workbook::new();
    let header_format = Format::new()
        .set_bold()
        .set_pattern(FormatPattern::Solid)
        .set_background_color(Color::RGB(HEADER_FILL));

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;
    for (col, title) in TABLE_HEADER.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, &header_format)?;
    }
    for (idx, record) in records.iter().enumerate() {
        let row = idx as u32 + 1;
        for (col, cell) in table_row(record).iter().enumerate() {
            sheet.write_string(row, col as u16, cell.as_str())?;
        }
    }
    Ok(workbook)
}

pub fn write_xlsx(path: &Path, records: &[BounceRecord]) -> Result<()> {
    let mut workbook = build_workbook(records)?;
    workbook
        .save(path)
        .with_context(|| format!("Failed to save {}", path.display()))
}

pub fn write_csv<W: Write>(mut out: W, records: &[BounceRecord]) -> Result<()> {
    writeln!(out, "{}", TABLE_HEADER.join(","))?;
    for record in records {
        let cells: Vec<String> = table_row(record).iter().map(|cell| csv_escape(cell)).collect();
        writeln!(out, "{}", cells.join(","))?;
    }
    Ok(())
}

pub fn write_csv_file(path: &Path, records: &[BounceRecord]) -> Result<()> {
    let file = fs::File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut out = std::io::BufWriter::new(file);
    write_csv(&mut out, records)?;
    out.flush()?;
    Ok(())
}

fn csv_escape(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// `<dir or source dir>/<source file name>.<ext>`
pub fn output_path(source: &Path, directory: Option<&Path>, ext: &str) -> PathBuf {
    let mut name = source
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "bounces".into());
    name.push(".");
    name.push(ext);

    match directory {
        Some(dir) => dir.join(name),
        None => source.with_file_name(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransactionId;
    use calamine::{open_workbook, Reader, Xlsx};
    use chrono::{TimeZone, Utc};

    fn record(reason: &str) -> BounceRecord {
        BounceRecord {
            date: Utc.with_ymd_and_hms(2025, 6, 1, 3, 0, 5).unwrap(),
            queue_id: TransactionId::new("ABC123"),
            from: "s@d.com".to_string(),
            to: "r@d.com".to_string(),
            relay: "mx.d.com[1.2.3.4]:25".to_string(),
            delay: "1.2".to_string(),
            delays: "0.1/0/0.5/0.6".to_string(),
            dsn: "5.1.1".to_string(),
            status: "bounced".to_string(),
            reason: reason.to_string(),
        }
    }

    #[test]
    fn test_csv_header_and_rows() {
        let mut out = Vec::new();
        write_csv(&mut out, &[record("550 no such user")]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Date,From,To,Relay,Delay,DSN,Status,Reason");
        assert_eq!(
            lines[1],
            "2025-06-01T03:00:05Z,s@d.com,r@d.com,mx.d.com[1.2.3.4]:25,1.2,5.1.1,bounced,550 no such user"
        );
    }

    #[test]
    fn test_csv_quotes_awkward_reasons() {
        let mut out = Vec::new();
        write_csv(&mut out, &[record("550 \"user\" unknown, sorry")]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with(",\"550 \"\"user\"\" unknown, sorry\"\n"));
    }

    #[test]
    fn test_xlsx_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zimbra.log.xlsx");
        write_xlsx(&path, &[record("550 no such user"), record("552 mailbox full")]).unwrap();

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        assert_eq!(workbook.sheet_names(), vec![SHEET_NAME.to_string()]);
        let range = workbook.worksheet_range(SHEET_NAME).unwrap();
        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], TABLE_HEADER.map(String::from).to_vec());
        assert_eq!(rows[1][0], "2025-06-01T03:00:05Z");
        assert_eq!(rows[1][3], "mx.d.com[1.2.3.4]:25");
        assert_eq!(rows[1][7], "550 no such user");
        assert_eq!(rows[2][7], "552 mailbox full");
    }

    #[test]
    fn test_xlsx_header_only_for_no_records() {
        let mut workbook = build_workbook(&[]).unwrap();
        let bytes = workbook.save_to_buffer().unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_json_array() {
        let json = to_json(&[record("x"), record("y")]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
        assert_eq!(value[1]["reason"], "y");
        assert_eq!(value[0]["from"], "s@d.com");
    }

    #[test]
    fn test_output_path() {
        let source = Path::new("/var/log/zimbra/maillog.1");
        assert_eq!(
            output_path(source, None, "json"),
            PathBuf::from("/var/log/zimbra/maillog.1.json")
        );
        assert_eq!(
            output_path(source, Some(Path::new("/tmp/out")), "csv"),
            PathBuf::from("/tmp/out/maillog.1.csv")
        );
    }
}
