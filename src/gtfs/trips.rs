use std::collections;
use std::fmt;
use std::iter;
use std::str::FromStr;

use crate::gtfs::table::{self, FieldError, Fields};

// Trips is a collection of trips, indexed by trip_id.
pub struct Trips {
    pub trips: collections::HashMap<String, Trip>,
}

impl From<Vec<Trip>> for Trips {
    fn from(trips: Vec<Trip>) -> Self {
        Trips {
            trips: trips.into_iter().map(|trip| (trip.trip_id.clone(), trip)).collect(),
        }
    }
}

impl<'a> iter::IntoIterator for &'a Trips {
    type Item = &'a Trip;
    type IntoIter = collections::hash_map::Values<'a, String, Trip>;

    fn into_iter(self) -> Self::IntoIter {
        self.trips.values()
    }
}

#[derive(Debug, Clone)]
pub struct Trip {
    pub trip_id: String,
    pub route_id: String,
    pub service_id: String,
    pub trip_headsign: Option<String>,
    pub direction_id: Option<Direction>,
    pub block_id: Option<String>,
    pub shape_id: Option<String>,
}

impl Trip {
    pub fn trip_headsign_or_default(&self) -> &str {
        self.trip_headsign.as_deref().unwrap_or_default()
    }

    // trips without a direction_id are treated as running in direction 0
    pub fn direction_id_or_default(&self) -> u8 {
        self.direction_id.map(Direction::id).unwrap_or(0)
    }
}

impl fmt::Display for Trip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "trip {} (route: {}, service: {}, headsign: '{}', direction: {})",
            self.trip_id,
            self.route_id,
            self.service_id,
            self.trip_headsign_or_default(),
            self.direction_id
                .map(|d| d.id().to_string())
                .unwrap_or_else(|| String::from("none")),
        )
    }
}

// represents two arbitrary opposing directions
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Direction {
    A,
    B,
}

impl Direction {
    pub fn id(self) -> u8 {
        match self {
            Direction::A => 0,
            Direction::B => 1,
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "0" => Ok(Direction::A),
            "1" => Ok(Direction::B),
            _ => Err(String::from("expected 0 or 1")),
        }
    }
}

// Trip implements TryFrom<&Fields> by interpreting the keys as field names, and
// the values as string-encoded values for those fields.
impl TryFrom<&Fields> for Trip {
    type Error = FieldError;

    fn try_from(fields: &Fields) -> Result<Self, Self::Error> {
        Ok(Trip {
            trip_id: table::required(fields, "trip_id")?,
            route_id: table::required(fields, "route_id")?,
            service_id: table::required(fields, "service_id")?,
            trip_headsign: table::optional(fields, "trip_headsign"),
            direction_id: table::parse_optional(fields, "direction_id")?,
            block_id: table::optional(fields, "block_id"),
            shape_id: table::optional(fields, "shape_id"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> Fields {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_trip_defaults() {
        let trip = Trip::try_from(&fields(&[
            ("trip_id", "t1"),
            ("route_id", "7-CRS"),
            ("service_id", "weekday"),
            ("trip_headsign", ""),
        ]))
        .unwrap();
        assert_eq!(trip.trip_headsign_or_default(), "");
        assert_eq!(trip.direction_id_or_default(), 0);
        assert_eq!(trip.block_id, None);
    }

    #[test]
    fn test_trip_direction() {
        let trip = Trip::try_from(&fields(&[
            ("trip_id", "t1"),
            ("route_id", "7-CRS"),
            ("service_id", "weekday"),
            ("direction_id", "1"),
        ]))
        .unwrap();
        assert_eq!(trip.direction_id, Some(Direction::B));
        assert_eq!(trip.direction_id_or_default(), 1);

        let result = Trip::try_from(&fields(&[
            ("trip_id", "t1"),
            ("route_id", "7-CRS"),
            ("service_id", "weekday"),
            ("direction_id", "2"),
        ]));
        assert!(matches!(result, Err(FieldError::Invalid { field: "direction_id", .. })));
    }

    #[test]
    fn test_trip_ignores_unread_columns() {
        let trip = Trip::try_from(&fields(&[
            ("trip_id", "t1"),
            ("route_id", "7-CRS"),
            ("service_id", "weekday"),
            ("wheelchair_accessible", "yes"),
            ("bikes_allowed", "7"),
        ]))
        .unwrap();
        assert_eq!(trip.trip_id, "t1");
    }

    #[test]
    fn test_trip_requires_service() {
        let result = Trip::try_from(&fields(&[("trip_id", "t1"), ("route_id", "7-CRS")]));
        assert_eq!(result.err(), Some(FieldError::Required("service_id")));
    }
}
