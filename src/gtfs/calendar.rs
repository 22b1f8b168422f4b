use std::str::FromStr;

use chrono::{Datelike, NaiveDate, Weekday};

use crate::gtfs::table::{self, FieldError, Fields};

const DATE_FORMAT: &str = "%Y%m%d";

// GtfsDate is a service date written as YYYYMMDD.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct GtfsDate(pub NaiveDate);

impl FromStr for GtfsDate {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s, DATE_FORMAT).map(GtfsDate)
    }
}

impl std::fmt::Display for GtfsDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

// Calendar is one row of calendar.txt: a weekly pattern over a date range.
#[derive(Debug, Clone)]
pub struct Calendar {
    pub service_id: String,
    pub monday: bool,
    pub tuesday: bool,
    pub wednesday: bool,
    pub thursday: bool,
    pub friday: bool,
    pub saturday: bool,
    pub sunday: bool,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Calendar {
    pub fn runs_on(&self, weekday: Weekday) -> bool {
        match weekday {
            Weekday::Mon => self.monday,
            Weekday::Tue => self.tuesday,
            Weekday::Wed => self.wednesday,
            Weekday::Thu => self.thursday,
            Weekday::Fri => self.friday,
            Weekday::Sat => self.saturday,
            Weekday::Sun => self.sunday,
        }
    }

    // dates lists every date of the range on which the weekly pattern runs.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start_date
            .iter_days()
            .take_while(move |date| *date <= self.end_date)
            .filter(move |date| self.runs_on(date.weekday()))
    }
}

impl TryFrom<&Fields> for Calendar {
    type Error = FieldError;

    fn try_from(fields: &Fields) -> Result<Self, Self::Error> {
        let start_date = table::parse_required::<GtfsDate>(fields, "start_date")?.0;
        let end_date = table::parse_required::<GtfsDate>(fields, "end_date")?.0;
        if end_date < start_date {
            return Err(FieldError::invalid(
                "end_date",
                &GtfsDate(end_date).to_string(),
                "before start_date",
            ));
        }
        Ok(Calendar {
            service_id: table::required(fields, "service_id")?,
            monday: parse_day(fields, "monday")?,
            tuesday: parse_day(fields, "tuesday")?,
            wednesday: parse_day(fields, "wednesday")?,
            thursday: parse_day(fields, "thursday")?,
            friday: parse_day(fields, "friday")?,
            saturday: parse_day(fields, "saturday")?,
            sunday: parse_day(fields, "sunday")?,
            start_date,
            end_date,
        })
    }
}

fn parse_day(fields: &Fields, name: &'static str) -> Result<bool, FieldError> {
    match table::required(fields, name)?.as_str() {
        "0" => Ok(false),
        "1" => Ok(true),
        other => Err(FieldError::invalid(name, other, "expected 0 or 1")),
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ExceptionType {
    Added,
    Removed,
}

impl FromStr for ExceptionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1" => Ok(ExceptionType::Added),
            "2" => Ok(ExceptionType::Removed),
            _ => Err(String::from("expected 1 or 2")),
        }
    }
}

// CalendarDate is one row of calendar_dates.txt: an exception to a calendar,
// or on its own, a single service date.
#[derive(Debug, Clone)]
pub struct CalendarDate {
    pub service_id: String,
    pub date: NaiveDate,
    pub exception_type: ExceptionType,
}

impl TryFrom<&Fields> for CalendarDate {
    type Error = FieldError;

    fn try_from(fields: &Fields) -> Result<Self, Self::Error> {
        Ok(CalendarDate {
            service_id: table::required(fields, "service_id")?,
            date: table::parse_required::<GtfsDate>(fields, "date")?.0,
            exception_type: table::parse_required(fields, "exception_type")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> Fields {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_calendar_dates() {
        // 2026-10-12 is a Monday
        let calendar = Calendar::try_from(&fields(&[
            ("service_id", "weekend"),
            ("monday", "0"),
            ("tuesday", "0"),
            ("wednesday", "0"),
            ("thursday", "0"),
            ("friday", "0"),
            ("saturday", "1"),
            ("sunday", "1"),
            ("start_date", "20261012"),
            ("end_date", "20261025"),
        ]))
        .unwrap();
        assert_eq!(
            calendar.dates().collect::<Vec<_>>(),
            vec![date(2026, 10, 17), date(2026, 10, 18), date(2026, 10, 24), date(2026, 10, 25)]
        );
    }

    #[test]
    fn test_calendar_rejects_inverted_range() {
        let result = Calendar::try_from(&fields(&[
            ("service_id", "s"),
            ("monday", "1"),
            ("tuesday", "1"),
            ("wednesday", "1"),
            ("thursday", "1"),
            ("friday", "1"),
            ("saturday", "0"),
            ("sunday", "0"),
            ("start_date", "20261012"),
            ("end_date", "20261001"),
        ]));
        assert!(matches!(result, Err(FieldError::Invalid { field: "end_date", .. })));
    }

    #[test]
    fn test_calendar_date() {
        let calendar_date = CalendarDate::try_from(&fields(&[
            ("service_id", "holiday"),
            ("date", "20261225"),
            ("exception_type", "2"),
        ]))
        .unwrap();
        assert_eq!(calendar_date.date, date(2026, 12, 25));
        assert_eq!(calendar_date.exception_type, ExceptionType::Removed);
        assert_eq!(GtfsDate(calendar_date.date).to_string(), "20261225");
    }
}
