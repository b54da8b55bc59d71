// services/logpulse-client/src/export.rs
//
// CSV export of fetched log entries

use std::io;

use chrono::{DateTime, Local, TimeZone, Utc};

use svckit::types::LogEntry;

pub const LOCAL_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportColumns {
    #[default]
    Basic,
    /// Adds the IP and user columns.
    WithProvenance,
}

impl ExportColumns {
    pub fn header(&self) -> &'static [&'static str] {
        match self {
            ExportColumns::Basic => &["ID", "Timestamp", "Source", "Level", "Content"],
            ExportColumns::WithProvenance => &["ID", "Timestamp", "Source", "Level", "Content", "IP", "User"],
        }
    }
}

/// Entries as CSV with timestamps in the local time zone.
pub fn export_csv(entries: &[LogEntry], columns: ExportColumns) -> Result<String, csv::Error> {
    export_csv_in(entries, columns, &Local)
}

pub fn export_csv_in<Tz>(entries: &[LogEntry], columns: ExportColumns, tz: &Tz) -> Result<String, csv::Error>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut buffer = Vec::new();
    write_csv(&mut buffer, entries, columns, tz)?;
    String::from_utf8(buffer).map_err(|e| csv::Error::from(io::Error::new(io::ErrorKind::InvalidData, e)))
}

pub fn write_csv<W, Tz>(out: W, entries: &[LogEntry], columns: ExportColumns, tz: &Tz) -> Result<(), csv::Error>
where
    W: io::Write,
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(columns.header())?;

    for entry in entries {
        let timestamp = entry.timestamp.with_timezone(tz).format(LOCAL_TIME_FORMAT).to_string();
        let mut record = vec![
            entry.id.as_str(),
            timestamp.as_str(),
            entry.source.as_str(),
            entry.log_level.as_str(),
            entry.content.as_str(),
        ];
        if columns == ExportColumns::WithProvenance {
            record.push(entry.ip.as_deref().unwrap_or_default());
            record.push(entry.user.as_deref().unwrap_or_default());
        }
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// `logpulse_logs_<YYYYMMDDTHHMMSS>.csv`
pub fn export_filename(now: DateTime<Utc>) -> String {
    format!("logpulse_logs_{}.csv", now.format("%Y%m%dT%H%M%S"))
}
