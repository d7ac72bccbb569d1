//! Calendar arithmetic for the daily simulation walk.
//!
//! The simulators step through every calendar day of a window and need
//! month keys, month-end detection and month offsets on each step. These
//! helpers work on raw year/month/day fields and Rata Die day numbers so the
//! hot loop never builds a `jiff::Span`.

use jiff::civil::Date;

/// Average year length used to turn elapsed days into elapsed years.
pub const DAYS_PER_YEAR: f64 = 365.25;

#[inline]
pub fn is_leap_year(year: i16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

#[inline]
pub fn days_in_month(year: i16, month: i8) -> i8 {
    const DAYS: [i8; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
    if month == 2 && is_leap_year(year) {
        29
    } else {
        DAYS[(month - 1) as usize]
    }
}

/// `(year, month)` pair identifying the calendar month a date falls in.
#[inline]
pub fn month_key(d: Date) -> (i16, i8) {
    (d.year(), d.month())
}

/// First calendar day of the month containing `d`.
#[inline]
pub fn first_of_month(d: Date) -> Date {
    jiff::civil::date(d.year(), d.month(), 1)
}

/// Whether `d` is the last calendar day of its month.
#[inline]
pub fn is_last_day_of_month(d: Date) -> bool {
    d.day() == days_in_month(d.year(), d.month())
}

/// Shift a date by whole months, clamping the day to the target month's
/// length (Jan 31 + 1 month = Feb 28/29). Saturates at `Date::MIN` and
/// `Date::MAX`.
pub fn add_months(d: Date, months: i32) -> Date {
    let zero_based = i64::from(d.year()) * 12 + i64::from(d.month() - 1) + i64::from(months);
    let year = zero_based.div_euclid(12);
    if year > i64::from(Date::MAX.year()) {
        return Date::MAX;
    }
    if year < i64::from(Date::MIN.year()) {
        return Date::MIN;
    }
    let year = year as i16;
    let month = (zero_based.rem_euclid(12) + 1) as i8;
    let day = d.day().min(days_in_month(year, month));
    jiff::civil::date(year, month, day)
}

#[inline]
fn rata_die(d: Date) -> i32 {
    let y = d.year() as i32;
    let m = d.month() as i32;
    let day = d.day() as i32;

    // March-based year so the leap day sits at the end
    let a = (14 - m) / 12;
    let y2 = y - a;
    let m2 = m + 12 * a - 3;

    day + (153 * m2 + 2) / 5 + 365 * y2 + y2 / 4 - y2 / 100 + y2 / 400 - 306
}

#[inline]
fn rd_to_date(rd: i32) -> Date {
    let z = rd + 306;
    let h = 100 * z - 25;
    let a = h / 3_652_425;
    let b = a - a / 4;
    let y = (100 * b + h) / 36_525;
    let c = b + z - 365 * y - y / 4;
    let m = (5 * c + 456) / 153;
    let day = c - (153 * m - 457) / 5;

    let (year, month) = if m > 12 { (y + 1, m - 12) } else { (y, m) };

    jiff::civil::date(year as i16, month as i8, day as i8)
}

/// Signed number of days from `d1` to `d2`.
#[inline]
pub fn days_between(d1: Date, d2: Date) -> i32 {
    rata_die(d2) - rata_die(d1)
}

#[inline]
pub fn add_days(d: Date, n: i32) -> Date {
    rd_to_date(rata_die(d) + n)
}

/// Elapsed years between two dates on a 365.25-day year.
pub fn years_between(start: Date, end: Date) -> f64 {
    f64::from(days_between(start, end)) / DAYS_PER_YEAR
}

/// Every calendar day from `start` to `end`, both inclusive. Empty when
/// `end < start`.
pub fn calendar_days(start: Date, end: Date) -> Vec<Date> {
    let span = days_between(start, end);
    if span < 0 {
        return Vec::new();
    }
    let first = rata_die(start);
    (0..=span).map(|offset| rd_to_date(first + offset)).collect()
}
