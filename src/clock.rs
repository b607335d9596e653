//! Calendar time — the value type every scheduling decision is built on.
//!
//! [`CalendarTime`] is produced by the RTC driver and consumed by the slot
//! scheduler and the sleep planner.  It is deliberately *not* cached between
//! decisions: an acquisition cycle takes tens of seconds and may cross a slot
//! boundary, so callers re-read the clock before every decision.
//!
//! The weekday is always derived from the civil date (Sakamoto's method)
//! rather than trusted from the RTC chip — field units have shipped with the
//! weekday register never set.

use core::fmt::Write as _;

use crate::error::ClockError;

/// A single wall-clock instant, 2000-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarTime {
    /// Full year, e.g. 2026.
    pub year: u16,
    /// 1–12.
    pub month: u8,
    /// 1–31.
    pub day: u8,
    /// 0–23.
    pub hour: u8,
    /// 0–59.
    pub minute: u8,
    /// 0–59.
    pub second: u8,
    /// 1 = Monday … 7 = Sunday, derived from the date.
    pub weekday: u8,
}

impl CalendarTime {
    /// Construct from calendar fields, deriving the weekday.
    /// Fails with [`ClockError::OutOfRange`] if any field is out of range.
    pub fn new(
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
    ) -> Result<Self, ClockError> {
        let t = Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            weekday: 1,
        };
        if !t.fields_in_range() {
            return Err(ClockError::OutOfRange);
        }
        Ok(Self {
            weekday: weekday_from_date(year, month, day),
            ..t
        })
    }

    /// Convert a Unix timestamp (seconds since 1970-01-01 UTC) to calendar
    /// fields.  Used to seed the RTC from the build-time timestamp.
    ///
    /// Days-to-civil conversion per Howard Hinnant's algorithm.
    pub fn from_unix(secs: u64) -> Self {
        let days = (secs / 86_400) as i64;
        let rem = secs % 86_400;

        let z = days + 719_468;
        let era = z.div_euclid(146_097);
        let doe = z.rem_euclid(146_097); // [0, 146096]
        let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365; // [0, 399]
        let y = yoe + era * 400;
        let doy = doe - (365 * yoe + yoe / 4 - yoe / 100); // [0, 365]
        let mp = (5 * doy + 2) / 153; // [0, 11]
        let day = (doy - (153 * mp + 2) / 5 + 1) as u8; // [1, 31]
        let month = if mp < 10 { mp + 3 } else { mp - 9 } as u8; // [1, 12]
        let year = (if month <= 2 { y + 1 } else { y }) as u16;

        Self {
            year,
            month,
            day,
            hour: (rem / 3600) as u8,
            minute: (rem / 60 % 60) as u8,
            second: (rem % 60) as u8,
            weekday: weekday_from_date(year, month, day),
        }
    }

    /// Whether every field lies inside its legal range.  The RTC driver
    /// rejects decoded register blocks that fail this.
    pub fn fields_in_range(&self) -> bool {
        (2000..=2099).contains(&self.year)
            && (1..=12).contains(&self.month)
            && (1..=31).contains(&self.day)
            && self.hour < 24
            && self.minute < 60
            && self.second < 60
    }

    /// Seconds elapsed since local midnight.  The sleep planner and the
    /// day/night classifier both work in this domain.
    pub fn seconds_of_day(&self) -> u32 {
        u32::from(self.hour) * 3600 + u32::from(self.minute) * 60 + u32::from(self.second)
    }

    /// `YYYY-MM-DD` for record rows and file names.
    pub fn date_string(&self) -> heapless::String<10> {
        let mut s = heapless::String::new();
        // Infallible: 10 chars exactly fit the capacity.
        let _ = write!(s, "{:04}-{:02}-{:02}", self.year, self.month, self.day);
        s
    }

    /// `HH:MM:SS` for record rows.
    pub fn time_string(&self) -> heapless::String<8> {
        let mut s = heapless::String::new();
        let _ = write!(s, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second);
        s
    }
}

/// Sakamoto's weekday algorithm.  Returns 1 = Monday … 7 = Sunday.
pub fn weekday_from_date(year: u16, month: u8, day: u8) -> u8 {
    const T: [u16; 12] = [0, 3, 2, 5, 0, 3, 5, 1, 4, 6, 2, 4];
    let y = if month < 3 { year - 1 } else { year };
    // Sakamoto yields 0 = Sunday; remap to ISO 1 = Monday … 7 = Sunday.
    let dow =
        (y + y / 4 - y / 100 + y / 400 + T[(month - 1) as usize] + u16::from(day)) % 7;
    if dow == 0 { 7 } else { dow as u8 }
}
