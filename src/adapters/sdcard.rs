//! CSV persistence adapter — per-day record files on a mounted filesystem.
//!
//! Implements [`RecordSink`] over a mounted root path (the SD card's VFS
//! mount point on target, any directory on the host).  Files rotate by
//! calendar day and optional site tag: `{site_}YYYY-MM-DD.csv`, with the
//! header row written once when the file is created.
//!
//! Mounting the medium is platform bring-up and happens in `main()`; this
//! adapter only ever sees the mounted root.

use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::PathBuf;

use log::{info, warn};

use crate::app::ports::{RecordSink, StorageError};
use crate::record::MeasurementRecord;

pub struct CsvRecordSink {
    root: PathBuf,
}

impl CsvRecordSink {
    /// `root` must already be a mounted, writable directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, record: &MeasurementRecord) -> PathBuf {
        self.root.join(record.file_name().as_str())
    }
}

impl RecordSink for CsvRecordSink {
    /// Append one row, creating the day's file (with header) on first use.
    ///
    /// Open, write, close per record: the card may lose power at any time,
    /// and an unflushed handle held across a deep-sleep cycle would lose
    /// the row anyway.
    fn append(&mut self, record: &MeasurementRecord) -> Result<(), StorageError> {
        let path = self.path_for(record);
        let fresh = !path.exists();

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                warn!("csv: open {:?} failed: {}", path, e);
                StorageError::IoError
            })?;

        let with_site = !record.site.is_empty();
        if fresh {
            info!("csv: new file {:?}", path);
            writeln!(file, "{}", MeasurementRecord::csv_header(with_site))
                .map_err(|_| StorageError::IoError)?;
        }
        writeln!(file, "{}", record.csv_row()).map_err(|_| StorageError::IoError)?;
        file.sync_all().map_err(|_| StorageError::IoError)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::AggregatedReading;
    use crate::clock::CalendarTime;

    fn reading(day: u8, ppm: Option<u16>) -> AggregatedReading {
        AggregatedReading {
            concentration_median: ppm,
            valid_count: ppm.map_or(0, |_| 5),
            total_count: 7,
            temperature_c: Some(23.4),
            humidity_pct: Some(55.1),
            timestamp: CalendarTime::new(2026, 8, day, 7, 30, 0).unwrap(),
        }
    }

    fn record(day: u8, site: &str) -> MeasurementRecord {
        MeasurementRecord {
            reading: reading(day, Some(412)),
            site: heapless::String::try_from(site).unwrap(),
            shift: if site.is_empty() { None } else { Some(1) },
        }
    }

    fn temp_root(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("co2log-sink-{}-{}", tag, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn creates_file_with_header_then_appends() {
        let root = temp_root("header");
        let mut sink = CsvRecordSink::new(&root);

        sink.append(&record(30, "")).unwrap();
        sink.append(&record(30, "")).unwrap();

        let text = std::fs::read_to_string(root.join("2026-08-30.csv")).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Date;Time;CO2_PPM;Temperature;Humidity");
        assert_eq!(lines[1], "2026-08-30;07:30:00;412;23.4;55.1");
        assert_eq!(lines[1], lines[2]);
    }

    #[test]
    fn rotates_by_day_and_prefixes_site() {
        let root = temp_root("rotate");
        let mut sink = CsvRecordSink::new(&root);

        sink.append(&record(30, "field-2")).unwrap();
        sink.append(&record(31, "field-2")).unwrap();

        assert!(root.join("field-2_2026-08-30.csv").exists());
        assert!(root.join("field-2_2026-08-31.csv").exists());

        let text = std::fs::read_to_string(root.join("field-2_2026-08-30.csv")).unwrap();
        assert!(text.starts_with("Date;Time;CO2_PPM;Temperature;Humidity;Site;Shift\n"));
        assert!(text.contains(";field-2;1"));
    }

    #[test]
    fn sentinel_row_for_failed_cycle() {
        let root = temp_root("sentinel");
        let mut sink = CsvRecordSink::new(&root);

        let rec = MeasurementRecord {
            reading: AggregatedReading {
                concentration_median: None,
                valid_count: 1,
                total_count: 7,
                temperature_c: None,
                humidity_pct: None,
                timestamp: CalendarTime::new(2026, 8, 30, 11, 0, 0).unwrap(),
            },
            site: heapless::String::new(),
            shift: None,
        };
        sink.append(&rec).unwrap();

        let text = std::fs::read_to_string(root.join("2026-08-30.csv")).unwrap();
        assert!(text.contains("2026-08-30;11:00:00;-1;-99.0;-99.0"));
    }

    #[test]
    fn missing_root_reports_io_error() {
        let mut sink = CsvRecordSink::new("/nonexistent/co2log");
        assert!(matches!(
            sink.append(&record(30, "")),
            Err(StorageError::IoError)
        ));
    }
}
