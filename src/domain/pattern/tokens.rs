//! Date token formatting: `{today:YYYY-MM-DD}`-style format strings.

use chrono::{Datelike, NaiveDate};

/// Day the vault's week is considered to start on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeekStart {
    #[default]
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl WeekStart {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name.to_ascii_lowercase().as_str() {
            "monday" => WeekStart::Monday,
            "tuesday" => WeekStart::Tuesday,
            "wednesday" => WeekStart::Wednesday,
            "thursday" => WeekStart::Thursday,
            "friday" => WeekStart::Friday,
            "saturday" => WeekStart::Saturday,
            "sunday" => WeekStart::Sunday,
            _ => return None,
        })
    }

    fn as_chrono_weekday(self) -> chrono::Weekday {
        match self {
            WeekStart::Monday => chrono::Weekday::Mon,
            WeekStart::Tuesday => chrono::Weekday::Tue,
            WeekStart::Wednesday => chrono::Weekday::Wed,
            WeekStart::Thursday => chrono::Weekday::Thu,
            WeekStart::Friday => chrono::Weekday::Fri,
            WeekStart::Saturday => chrono::Weekday::Sat,
            WeekStart::Sunday => chrono::Weekday::Sun,
        }
    }
}

impl From<chrono::Weekday> for WeekStart {
    fn from(value: chrono::Weekday) -> Self {
        match value {
            chrono::Weekday::Mon => WeekStart::Monday,
            chrono::Weekday::Tue => WeekStart::Tuesday,
            chrono::Weekday::Wed => WeekStart::Wednesday,
            chrono::Weekday::Thu => WeekStart::Thursday,
            chrono::Weekday::Fri => WeekStart::Friday,
            chrono::Weekday::Sat => WeekStart::Saturday,
            chrono::Weekday::Sun => WeekStart::Sunday,
        }
    }
}

/// The start-of-week date containing `ref_date`, offset by `weeks_offset`
/// whole weeks (negative = past, positive = future).
pub fn week_start(ref_date: NaiveDate, week_start: WeekStart, weeks_offset: i64) -> NaiveDate {
    let start_weekday = week_start.as_chrono_weekday();
    let days_since_start = ref_date.weekday().num_days_from(start_weekday) as i64;
    let this_week_start = ref_date - chrono::Duration::days(days_since_start);
    this_week_start + chrono::Duration::weeks(weeks_offset)
}

/// The first day of the month containing `ref_date`, offset by whole months.
pub fn month_start(ref_date: NaiveDate, months_offset: i32) -> NaiveDate {
    let total_months = ref_date.year() * 12 + (ref_date.month0() as i32) + months_offset;
    let year = total_months.div_euclid(12);
    let month0 = total_months.rem_euclid(12);
    NaiveDate::from_ymd_opt(year, (month0 + 1) as u32, 1).expect("valid y/m/1")
}

/// Replace format tokens (longest-first) in `fmt` with `date`'s components.
///
/// Recognized tokens: `YYYY|YY|MM|M|DD|D|MMMM|MMM|dddd|ddd`.
pub fn format_date(date: NaiveDate, fmt: &str) -> String {
    let replacements: [(&str, String); 10] = [
        ("YYYY", date.format("%Y").to_string()),
        ("MMMM", date.format("%B").to_string()),
        ("dddd", date.format("%A").to_string()),
        ("MMM", date.format("%b").to_string()),
        ("ddd", date.format("%a").to_string()),
        ("YY", date.format("%y").to_string()),
        ("MM", format!("{:02}", date.month())),
        ("DD", format!("{:02}", date.day())),
        ("M", format!("{}", date.month())),
        ("D", format!("{}", date.day())),
    ];

    let mut out = fmt.to_string();
    for (token, value) in replacements {
        out = out.replace(token, &value);
    }
    out
}

/// Default format for a plain date token.
pub const DEFAULT_DATE_FORMAT: &str = "YYYY-MM-DD";
/// Default format for a month token.
pub const DEFAULT_MONTH_FORMAT: &str = "YYYY-MM";
