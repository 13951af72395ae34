//! Bank holidays for England with their "spent" dates
//!
//! Timesheet systems book a weekend holiday on the following Monday. The calendar
//! itself comes from the caller as `(date, name)` pairs; regional entries for
//! Scotland and Northern Ireland are dropped.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static REGIONAL_HOLIDAY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(Scotland|Northern Ireland)\]").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holiday {
    pub date: NaiveDate,
    pub name: String,
    /// The working day the holiday is booked against
    pub spent_date: NaiveDate,
}

/// Saturday and Sunday move to the following Monday; other days stay put
pub fn spent_date(date: NaiveDate) -> NaiveDate {
    match date.weekday() {
        Weekday::Sat => date + Duration::days(2),
        Weekday::Sun => date + Duration::days(1),
        _ => date,
    }
}

/// English holidays from a UK calendar, sorted by date
pub fn england_holidays<I, S>(calendar: I) -> Vec<Holiday>
where
    I: IntoIterator<Item = (NaiveDate, S)>,
    S: Into<String>,
{
    let mut holidays: Vec<Holiday> = calendar
        .into_iter()
        .map(|(date, name)| (date, name.into()))
        .filter(|(_, name)| !REGIONAL_HOLIDAY_REGEX.is_match(name))
        .map(|(date, name)| Holiday {
            date,
            name,
            spent_date: spent_date(date),
        })
        .collect();
    holidays.sort_by_key(|h| h.date);
    holidays
}
