//! FAT Timestamps
//!
//! Directory entries store local time packed into two 16-bit words with a
//! 2-second resolution. `stat` reports them as seconds since 2000-01-01.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

/// Packed FAT date and time words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FatTimestamp {
    /// bits 0-4 day, bits 5-8 month, bits 9-15 years since 1980
    pub date: u16,
    /// bits 0-4 seconds/2, bits 5-10 minutes, bits 11-15 hours
    pub time: u16,
}

impl FatTimestamp {
    /// The earliest representable stamp, 1980-01-01 00:00:00.
    pub const EPOCH: FatTimestamp = FatTimestamp { date: (1 << 5) | 1, time: 0 };

    /// Pack a local date-time. Values outside 1980..=2107 are clamped.
    pub fn from_datetime(dt: &NaiveDateTime) -> Self {
        let year = dt.year();
        if year < 1980 {
            return Self::EPOCH;
        }
        if year > 2107 {
            return FatTimestamp {
                date: (127 << 9) | (12 << 5) | 31,
                time: (23 << 11) | (59 << 5) | 29,
            };
        }
        let date = (((year - 1980) as u16) << 9) | ((dt.month() as u16) << 5) | dt.day() as u16;
        let time = ((dt.hour() as u16) << 11) | ((dt.minute() as u16) << 5) | (dt.second() as u16 / 2);
        FatTimestamp { date, time }
    }

    /// Unpack into a date-time, or `None` if the words are not a valid date.
    pub fn to_datetime(&self) -> Option<NaiveDateTime> {
        let year = ((self.date >> 9) & 0x7f) as i32 + 1980;
        let month = ((self.date >> 5) & 0x0f) as u32;
        let day = (self.date & 0x1f) as u32;
        let hour = ((self.time >> 11) & 0x1f) as u32;
        let minute = ((self.time >> 5) & 0x3f) as u32;
        let second = (self.time & 0x1f) as u32 * 2;
        NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)
    }

    /// Seconds since 2000-01-01 00:00:00; stamps before 2000 report 0.
    pub fn seconds_since_2000(&self) -> u64 {
        let Some(dt) = self.to_datetime() else {
            return 0;
        };
        let Some(epoch) = NaiveDate::from_ymd_opt(2000, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0)) else {
            return 0;
        };
        let secs = (dt - epoch).num_seconds();
        if secs < 0 {
            0
        } else {
            secs as u64
        }
    }
}
