//! Which services still run, and on which dates.

use std::collections::{BTreeSet, HashSet};

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;

use crate::gtfs::calendar::{Calendar, CalendarDate, ExceptionType};
use crate::gtfs::trips::Trip;
use crate::gtfs::GtfsSchedule;
use crate::mt::MServiceDate;

// today_in returns the current date where the agency operates.
pub fn today_in(timezone: Option<Tz>) -> NaiveDate {
    match timezone {
        Some(tz) => Utc::now().with_timezone(&tz).date_naive(),
        None => Utc::now().date_naive(),
    }
}

// service_dates expands weekly calendars into dates, then applies the
// calendar_dates exceptions on top. The result is sorted by date.
pub fn service_dates<'a, C, D>(calendars: C, calendar_dates: D) -> Vec<MServiceDate>
where
    C: IntoIterator<Item = &'a Calendar>,
    D: IntoIterator<Item = &'a CalendarDate>,
{
    let mut dates = calendars
        .into_iter()
        .flat_map(|calendar| {
            calendar.dates().map(move |date| MServiceDate {
                date,
                service_id: calendar.service_id.clone(),
            })
        })
        .collect::<BTreeSet<_>>();

    for calendar_date in calendar_dates {
        let service_date = MServiceDate {
            date: calendar_date.date,
            service_id: calendar_date.service_id.clone(),
        };
        match calendar_date.exception_type {
            ExceptionType::Added => {
                dates.insert(service_date);
            }
            ExceptionType::Removed => {
                dates.remove(&service_date);
            }
        }
    }
    dates.into_iter().collect()
}

// extract_useful_service_ids keeps the services that still run on or after
// today; anything that only ran in the past is useless to riders.
pub fn extract_useful_service_ids(gtfs: &GtfsSchedule, today: NaiveDate) -> HashSet<String> {
    let service_ids = service_dates(&gtfs.calendars, &gtfs.calendar_dates)
        .into_iter()
        .filter(|service_date| service_date.date >= today)
        .map(|service_date| service_date.service_id)
        .collect::<HashSet<_>>();
    tracing::info!(
        "found {} useful service IDs from {}",
        service_ids.len(),
        today.format("%Y-%m-%d")
    );
    service_ids
}

pub fn exclude_useless_calendar(calendar: &Calendar, service_ids: &HashSet<String>) -> bool {
    !service_ids.contains(&calendar.service_id)
}

pub fn exclude_useless_calendar_date(calendar_date: &CalendarDate, service_ids: &HashSet<String>) -> bool {
    !service_ids.contains(&calendar_date.service_id)
}

pub fn exclude_useless_trip(trip: &Trip, service_ids: &HashSet<String>) -> bool {
    !service_ids.contains(&trip.service_id)
}
