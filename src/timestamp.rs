//! MS-DOS date/time handling.
//!
//! ZIP headers store the last modification time as a pair of 16-bit MS-DOS
//! fields:
//!
//! ```text
//! time: hhhhhmmm mmmsssss   (seconds / 2)
//! date: yyyyyyym mmmddddd   (years since 1980)
//! ```
//!
//! # Precision
//!
//! The format has a 2-second resolution, no timezone and a range of
//! 1980-01-01 to 2107-12-31. Conversions here treat the stored value as UTC.
//! Odd seconds are rounded down and out-of-range times are clamped, so a
//! round-trip through an archive is lossy by nature.
//!
//! # Example
//!
//! ```rust
//! use zipkit::DosDateTime;
//!
//! let ts = DosDateTime::new(2024, 3, 15, 10, 30, 45).unwrap();
//! assert_eq!(ts.second(), 44);
//! assert_eq!(DosDateTime::from_unix_secs(ts.as_unix_secs()), ts);
//! ```

use std::time::{Duration, SystemTime, UNIX_EPOCH};

const SECONDS_PER_DAY: i64 = 86_400;

/// Unix time of 1980-01-01T00:00:00Z, the earliest representable DOS time.
const DOS_EPOCH_UNIX: i64 = 315_532_800;

/// Unix time of 2107-12-31T23:59:58Z, the latest representable DOS time.
const DOS_MAX_UNIX: i64 = 4_354_819_198;

/// A modification timestamp in MS-DOS format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DosDateTime {
    // Field order makes the derived ordering chronological.
    date: u16,
    time: u16,
}

impl DosDateTime {
    /// Creates a timestamp from calendar components.
    ///
    /// Odd seconds are rounded down to the 2-second resolution. Returns `None`
    /// if a component is out of range.
    pub fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Option<Self> {
        if !(1980..=2107).contains(&year)
            || !(1..=12).contains(&month)
            || day == 0
            || day > days_in_month(year as i64, month as u32) as u8
            || hour > 23
            || minute > 59
            || second > 59
        {
            return None;
        }
        let date = ((year - 1980) << 9) | ((month as u16) << 5) | day as u16;
        let time = ((hour as u16) << 11) | ((minute as u16) << 5) | (second as u16 / 2);
        Some(Self { date, time })
    }

    /// Creates a timestamp from the raw header fields.
    pub const fn from_raw(time: u16, date: u16) -> Self {
        Self { date, time }
    }

    /// Returns the raw time field.
    pub const fn raw_time(&self) -> u16 {
        self.time
    }

    /// Returns the raw date field.
    pub const fn raw_date(&self) -> u16 {
        self.date
    }

    /// Converts Unix seconds to a DOS timestamp, clamping to the DOS range.
    pub fn from_unix_secs(secs: i64) -> Self {
        let secs = secs.clamp(DOS_EPOCH_UNIX, DOS_MAX_UNIX);
        let days = secs.div_euclid(SECONDS_PER_DAY);
        let rem = secs.rem_euclid(SECONDS_PER_DAY);
        let (year, month, day) = civil_from_days(days);

        let date = (((year - 1980) as u16) << 9) | ((month as u16) << 5) | day as u16;
        let time = (((rem / 3600) as u16) << 11)
            | ((((rem % 3600) / 60) as u16) << 5)
            | ((rem % 60) as u16 / 2);
        Self { date, time }
    }

    /// Converts a system time to a DOS timestamp, clamping to the DOS range.
    pub fn from_system_time(time: SystemTime) -> Self {
        let secs = match time.duration_since(UNIX_EPOCH) {
            Ok(d) => d.as_secs().min(i64::MAX as u64) as i64,
            Err(e) => -(e.duration().as_secs().min(i64::MAX as u64) as i64),
        };
        Self::from_unix_secs(secs)
    }

    /// Returns the current time as a DOS timestamp.
    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now())
    }

    /// Returns the timestamp as Unix seconds.
    ///
    /// Raw values with out-of-range components (e.g. month 0 written by some
    /// tools) are normalized rather than rejected.
    pub fn as_unix_secs(&self) -> i64 {
        let month = (self.month() as u32).clamp(1, 12);
        let day = (self.day() as i64).max(1);
        let days = days_from_civil(self.year() as i64, month, 1) + day - 1;
        days * SECONDS_PER_DAY
            + self.hour() as i64 * 3600
            + self.minute() as i64 * 60
            + self.second() as i64
    }

    /// Returns the timestamp as a [`SystemTime`].
    pub fn as_system_time(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(self.as_unix_secs().max(0) as u64)
    }

    /// Returns the year (1980-2107).
    pub const fn year(&self) -> u16 {
        (self.date >> 9) + 1980
    }

    /// Returns the month (1-12 for valid values).
    pub const fn month(&self) -> u8 {
        ((self.date >> 5) & 0x0F) as u8
    }

    /// Returns the day of the month (1-31 for valid values).
    pub const fn day(&self) -> u8 {
        (self.date & 0x1F) as u8
    }

    /// Returns the hour (0-23).
    pub const fn hour(&self) -> u8 {
        (self.time >> 11) as u8
    }

    /// Returns the minute (0-59).
    pub const fn minute(&self) -> u8 {
        ((self.time >> 5) & 0x3F) as u8
    }

    /// Returns the second, always even.
    pub const fn second(&self) -> u8 {
        ((self.time & 0x1F) * 2) as u8
    }
}

impl Default for DosDateTime {
    /// 1980-01-01 00:00:00.
    fn default() -> Self {
        Self::from_raw(0, (1 << 5) | 1)
    }
}

impl From<SystemTime> for DosDateTime {
    fn from(time: SystemTime) -> Self {
        Self::from_system_time(time)
    }
}

impl std::fmt::Display for DosDateTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year(),
            self.month(),
            self.day(),
            self.hour(),
            self.minute(),
            self.second()
        )
    }
}

fn is_leap_year(year: i64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(year: i64, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ if is_leap_year(year) => 29,
        _ => 28,
    }
}

/// Days since 1970-01-01 for a proleptic Gregorian date.
fn days_from_civil(year: i64, month: u32, day: u32) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = y.div_euclid(400);
    let yoe = y - era * 400;
    let mp = (month as i64 + 9) % 12;
    let doy = (153 * mp + 2) / 5 + day as i64 - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

/// Inverse of [`days_from_civil`].
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dos_epoch() {
        let ts = DosDateTime::from_unix_secs(DOS_EPOCH_UNIX);
        assert_eq!(ts, DosDateTime::default());
        assert_eq!(ts.as_unix_secs(), DOS_EPOCH_UNIX);
        assert_eq!(ts.to_string(), "1980-01-01 00:00:00");
    }

    #[test]
    fn test_components() {
        let ts = DosDateTime::new(2024, 2, 29, 23, 59, 59).unwrap();
        assert_eq!(ts.year(), 2024);
        assert_eq!(ts.month(), 2);
        assert_eq!(ts.day(), 29);
        assert_eq!(ts.hour(), 23);
        assert_eq!(ts.minute(), 59);
        assert_eq!(ts.second(), 58);
    }

    #[test]
    fn test_invalid_components() {
        assert!(DosDateTime::new(1979, 12, 31, 0, 0, 0).is_none());
        assert!(DosDateTime::new(2023, 2, 29, 0, 0, 0).is_none());
        assert!(DosDateTime::new(2024, 13, 1, 0, 0, 0).is_none());
        assert!(DosDateTime::new(2024, 1, 1, 24, 0, 0).is_none());
    }

    #[test]
    fn test_known_unix_value() {
        // 2009-02-13T23:31:30Z
        let ts = DosDateTime::from_unix_secs(1_234_567_890);
        assert_eq!(ts.to_string(), "2009-02-13 23:31:30");
        assert_eq!(ts.as_unix_secs(), 1_234_567_890);
    }

    #[test]
    fn test_odd_seconds_round_down() {
        let ts = DosDateTime::from_unix_secs(1_234_567_891);
        assert_eq!(ts.as_unix_secs(), 1_234_567_890);
    }

    #[test]
    fn test_clamping() {
        assert_eq!(DosDateTime::from_unix_secs(0), DosDateTime::default());
        let max = DosDateTime::from_unix_secs(i64::MAX);
        assert_eq!(max.to_string(), "2107-12-31 23:59:58");
    }

    #[test]
    fn test_raw_roundtrip() {
        let ts = DosDateTime::new(2020, 6, 1, 12, 0, 0).unwrap();
        let back = DosDateTime::from_raw(ts.raw_time(), ts.raw_date());
        assert_eq!(ts, back);
    }

    #[test]
    fn test_ordering_is_chronological() {
        let a = DosDateTime::new(2020, 1, 1, 23, 0, 0).unwrap();
        let b = DosDateTime::new(2020, 1, 2, 0, 0, 0).unwrap();
        assert!(a < b);
    }
}
