//! Persisted measurement records — row encoding and file naming.
//!
//! One record is written per fired slot, whether or not the cycle produced
//! usable data: a row with the `-1` concentration sentinel is evidence that
//! the slot ran and failed, which matters for field audits.  Downstream
//! consumers use the valid/total counts to judge confidence.
//!
//! Row format (semicolon-separated, one decimal for climate fields):
//!
//! ```text
//! Date;Time;CO2_PPM;Temperature;Humidity[;Site;Shift]
//! 2026-08-30;07:30:00;412;23.4;55.1;greenhouse-2;1
//! ```
//!
//! `Site` and `Shift` (1-based index of the active window) are only emitted
//! when a site tag is configured.

use core::fmt::Write as _;

use crate::aggregate::AggregatedReading;
use crate::config::MAX_SITE_LEN;

/// Sentinel concentration for "no data" rows.
pub const NO_DATA_PPM: i32 = -1;
/// Sentinel for failed climate reads, one decimal.
pub const NO_DATA_CLIMATE: f32 = -99.0;

/// Maximum encoded row length (with site and shift columns).
pub const MAX_ROW_LEN: usize = 96;
/// Maximum file name length: `{site}_YYYY-MM-DD.csv`.
pub const MAX_FILE_NAME_LEN: usize = MAX_SITE_LEN + 16;

/// A finished record, ready for the sink.
#[derive(Debug, Clone)]
pub struct MeasurementRecord {
    pub reading: AggregatedReading,
    /// Site tag; empty = omit the site/shift columns.
    pub site: heapless::String<MAX_SITE_LEN>,
    /// 1-based index of the window the slot fired in.
    pub shift: Option<u8>,
}

impl MeasurementRecord {
    /// Header row matching [`csv_row`](Self::csv_row)'s column layout.
    pub fn csv_header(with_site: bool) -> &'static str {
        if with_site {
            "Date;Time;CO2_PPM;Temperature;Humidity;Site;Shift"
        } else {
            "Date;Time;CO2_PPM;Temperature;Humidity"
        }
    }

    /// Encode the record as one CSV row (no trailing newline).
    pub fn csv_row(&self) -> heapless::String<MAX_ROW_LEN> {
        let mut row = heapless::String::new();
        let r = &self.reading;

        let ppm = r
            .concentration_median
            .map_or(NO_DATA_PPM, |v| i32::from(v));
        let temp = r.temperature_c.unwrap_or(NO_DATA_CLIMATE);
        let hum = r.humidity_pct.unwrap_or(NO_DATA_CLIMATE);

        // Capacity is sized for the worst case; a write can only fail if the
        // site tag plus sentinels exceed MAX_ROW_LEN, which the config
        // validator rules out.
        let _ = write!(
            row,
            "{};{};{};{:.1};{:.1}",
            r.timestamp.date_string(),
            r.timestamp.time_string(),
            ppm,
            temp,
            hum
        );
        if !self.site.is_empty() {
            let _ = write!(row, ";{};{}", self.site, self.shift.unwrap_or(0));
        }
        row
    }

    /// The file this record belongs in: one file per calendar day, site
    /// prefix when configured.
    pub fn file_name(&self) -> heapless::String<MAX_FILE_NAME_LEN> {
        let mut name = heapless::String::new();
        if self.site.is_empty() {
            let _ = write!(name, "{}.csv", self.reading.timestamp.date_string());
        } else {
            let _ = write!(name, "{}_{}.csv", self.site, self.reading.timestamp.date_string());
        }
        name
    }
}
