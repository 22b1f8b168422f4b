use std::collections;
use std::fmt;
use std::num;
use std::str::FromStr;

use thiserror::Error;

use crate::gtfs::table::{self, FieldError, Fields};

// StopTimes is a collection of stop times, indexed by trip_id.
// Each trip's stop times are kept sorted by stop_sequence.
#[derive(Debug, Clone, Default)]
pub struct StopTimes {
    pub stop_times: collections::HashMap<String, Vec<StopTime>>,
}

impl StopTimes {
    pub fn iter(&self) -> impl Iterator<Item = &StopTime> {
        self.stop_times.values().flatten()
    }

    pub fn for_trip(&self, trip_id: &str) -> &[StopTime] {
        self.stop_times.get(trip_id).map(Vec::as_slice).unwrap_or_default()
    }
}

impl From<Vec<StopTime>> for StopTimes {
    fn from(stop_times: Vec<StopTime>) -> Self {
        let mut by_trip = stop_times.into_iter().fold(
            collections::HashMap::<String, Vec<StopTime>>::new(),
            |mut acc, stop_time| {
                acc.entry(stop_time.trip_id.clone()).or_default().push(stop_time);
                acc
            },
        );
        for trip_stop_times in by_trip.values_mut() {
            trip_stop_times.sort_by_key(|stop_time| stop_time.stop_sequence);
        }
        StopTimes { stop_times: by_trip }
    }
}

#[derive(Debug, Clone)]
pub struct StopTime {
    pub trip_id: String,
    pub stop_id: Option<String>,
    pub arrival_time: Option<GtfsTime>,
    pub departure_time: Option<GtfsTime>,
    pub stop_sequence: u32,
    pub stop_headsign: Option<String>,
}

// StopTime implements TryFrom<&Fields> by interpreting the keys as field names, and
// the values as string-encoded values for those fields.
impl TryFrom<&Fields> for StopTime {
    type Error = FieldError;

    fn try_from(fields: &Fields) -> Result<Self, Self::Error> {
        Ok(StopTime {
            trip_id: table::required(fields, "trip_id")?,
            stop_id: table::optional(fields, "stop_id"),
            arrival_time: table::parse_optional(fields, "arrival_time")?,
            departure_time: table::parse_optional(fields, "departure_time")?,
            stop_sequence: table::parse_required(fields, "stop_sequence")?,
            stop_headsign: table::optional(fields, "stop_headsign"),
        })
    }
}

// GtfsTime is a time of day measured from the start of the service day.
// GTFS allows hours past 24 for trips running after midnight, so this
// cannot be a chrono::NaiveTime.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd)]
pub struct GtfsTime(pub u32);

impl fmt::Display for GtfsTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.0 / 3600, (self.0 / 60) % 60, self.0 % 60)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ParseTimeError {
    #[error("Improper number of segments")]
    ImproperNumberOfSegments,
    #[error("Invalid hour segment: {0}")]
    InvalidHourSegment(num::ParseIntError),
    #[error("Invalid minute segment: {0}")]
    InvalidMinuteSegment(num::ParseIntError),
    #[error("Invalid second segment: {0}")]
    InvalidSecondSegment(num::ParseIntError),
    #[error("Invalid time '{0}:{1}:{2}'")]
    InvalidTime(u32, u32, u32),
}

impl FromStr for GtfsTime {
    type Err = ParseTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments = s.split(':').collect::<Vec<&str>>();
        if segments.len() != 3 {
            return Err(ParseTimeError::ImproperNumberOfSegments);
        }
        let hours = segments[0].parse::<u32>().map_err(ParseTimeError::InvalidHourSegment)?;
        let minutes = segments[1].parse::<u32>().map_err(ParseTimeError::InvalidMinuteSegment)?;
        let seconds = segments[2].parse::<u32>().map_err(ParseTimeError::InvalidSecondSegment)?;
        if minutes > 59 || seconds > 59 {
            return Err(ParseTimeError::InvalidTime(hours, minutes, seconds));
        }
        hours
            .checked_mul(3600)
            .and_then(|total| total.checked_add(minutes * 60 + seconds))
            .map(GtfsTime)
            .ok_or(ParseTimeError::InvalidTime(hours, minutes, seconds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stop_time(trip_id: &str, stop_id: &str, stop_sequence: u32) -> StopTime {
        StopTime {
            trip_id: trip_id.to_string(),
            stop_id: Some(stop_id.to_string()),
            arrival_time: None,
            departure_time: None,
            stop_sequence,
            stop_headsign: None,
        }
    }

    #[test]
    fn test_parse_time_past_midnight() {
        assert_eq!("25:10:05".parse::<GtfsTime>(), Ok(GtfsTime(25 * 3600 + 10 * 60 + 5)));
        assert_eq!(GtfsTime(25 * 3600 + 10 * 60 + 5).to_string(), "25:10:05");
        assert_eq!(" 7:00".parse::<GtfsTime>(), Err(ParseTimeError::ImproperNumberOfSegments));
        assert_eq!("07:75:00".parse::<GtfsTime>(), Err(ParseTimeError::InvalidTime(7, 75, 0)));
    }

    #[test]
    fn test_parse_time_overflow_is_an_error() {
        assert_eq!(
            "9999999:00:00".parse::<GtfsTime>(),
            Err(ParseTimeError::InvalidTime(9999999, 0, 0))
        );
        // 1193046 hours fit, but not with 59:59 on top
        assert_eq!(
            "1193046:59:59".parse::<GtfsTime>(),
            Err(ParseTimeError::InvalidTime(1193046, 59, 59))
        );
    }

    #[test]
    fn test_stop_times_sorted_by_sequence() {
        let stop_times = StopTimes::from(vec![
            stop_time("t1", "c", 30),
            stop_time("t2", "x", 1),
            stop_time("t1", "a", 1),
            stop_time("t1", "b", 2),
        ]);
        let ids = stop_times
            .for_trip("t1")
            .iter()
            .filter_map(|st| st.stop_id.as_deref())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(stop_times.iter().count(), 4);
        assert!(stop_times.for_trip("nope").is_empty());
    }

    #[test]
    fn test_stop_time_requires_sequence() {
        let fields: Fields = [("trip_id", "t1"), ("stop_id", "a")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(StopTime::try_from(&fields).err(), Some(FieldError::Required("stop_sequence")));
    }

    #[test]
    fn test_stop_time_fields() {
        let fields = |pairs: &[(&str, &str)]| -> Fields {
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
        };
        // columns that are never read do not get in the way
        let stop_time = StopTime::try_from(&fields(&[
            ("trip_id", "t1"),
            ("stop_id", "112038"),
            ("stop_sequence", "4"),
            ("arrival_time", "24:05:00"),
            ("pickup_type", "9"),
            ("shape_dist_traveled", "far"),
        ]))
        .unwrap();
        assert_eq!(stop_time.arrival_time, Some(GtfsTime(24 * 3600 + 5 * 60)));

        let result = StopTime::try_from(&fields(&[
            ("trip_id", "t1"),
            ("stop_sequence", "4"),
            ("arrival_time", "9999999:00:00"),
        ]));
        assert!(matches!(result, Err(FieldError::Invalid { field: "arrival_time", .. })));
    }
}
