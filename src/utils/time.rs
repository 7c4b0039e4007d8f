//! Time and scan-angle unit conversions
//!
//! Archive records store time as integer seconds plus an integer fractional
//! count, and scan angles as integer digitizer counts. These functions
//! convert between the stored integers and floating-point units.

/// Seconds per fractional-time count.
pub const TIME_FRACTION_SECONDS: f64 = 1.6e-6;

/// Degrees per scan-angle count.
pub const SCAN_ANGLE_DEGREES: f64 = 0.045;

pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Dates (year, month, day) on which a leap second was added.
const LEAP_DATES: [(u16, u8, u8); 18] = [
    (1981, 6, 30),
    (1982, 6, 30),
    (1983, 6, 30),
    (1985, 6, 30),
    (1987, 12, 31),
    (1989, 12, 31),
    (1990, 12, 31),
    (1992, 6, 30),
    (1993, 6, 30),
    (1994, 6, 30),
    (1995, 12, 31),
    (1997, 6, 30),
    (1998, 12, 31),
    (2005, 12, 31),
    (2008, 12, 31),
    (2012, 6, 30),
    (2015, 6, 30),
    (2016, 12, 31),
];

/// Converts integer time values into floating point seconds.
pub fn time_int_to_soe(seconds: u32, fraction: u32) -> f64 {
    seconds as f64 + TIME_FRACTION_SECONDS * fraction as f64
}

/// Converts floating point seconds into integer time values, rounding the
/// fractional part to the nearest count.
pub fn time_soe_to_int(soe: f64) -> (u32, u32) {
    let seconds = soe.floor();
    let fraction = ((soe - seconds) / TIME_FRACTION_SECONDS + 0.5).floor();
    (seconds as u32, fraction as u32)
}

/// Converts scan angle counts into degrees.
pub fn scan_counts_to_degrees(counts: i16) -> f64 {
    counts as f64 * SCAN_ANGLE_DEGREES
}

/// Converts scan angle degrees into counts, rounding to the nearest count.
pub fn scan_degrees_to_counts(degrees: f64) -> i16 {
    (degrees / SCAN_ANGLE_DEGREES + 0.5).floor() as i16
}

/// Offset in seconds between UTC and GPS time on the given date.
pub fn gps_utc_offset(year: u16, month: u8, day: u8) -> u32 {
    LEAP_DATES
        .iter()
        .filter(|&&d| d < (year, month, day))
        .count() as u32
}
