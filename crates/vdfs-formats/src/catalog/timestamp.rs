//! MS-DOS date/time encoding used by the header timestamp
//!
//! ```text
//! bits 31-25  year - 1980
//! bits 24-21  month (1-12)
//! bits 20-16  day (1-31)
//! bits 15-11  hour
//! bits 10-5   minute
//! bits 4-0    second / 2
//! ```

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, Timelike};

/// Encode a local date/time, clamping the year to the representable range
pub fn to_dos(datetime: NaiveDateTime) -> u32 {
    let year = (datetime.year().clamp(1980, 2107) - 1980) as u32;
    let date = (year << 9) | (datetime.month() << 5) | datetime.day();
    let time = (datetime.hour() << 11) | (datetime.minute() << 5) | (datetime.second() / 2);
    (date << 16) | time
}

/// Decode a timestamp, returning `None` for impossible dates
pub fn from_dos(value: u32) -> Option<NaiveDateTime> {
    let date = value >> 16;
    let time = value & 0xFFFF;

    let year = 1980 + (date >> 9) as i32;
    let month = (date >> 5) & 0x0F;
    let day = date & 0x1F;

    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(
        time >> 11,
        (time >> 5) & 0x3F,
        (time & 0x1F) * 2,
    )
}

/// Current local time as a DOS timestamp
pub fn now() -> u32 {
    to_dos(Local::now().naive_local())
}
