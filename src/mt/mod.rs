pub mod output;

use std::fmt;

use chrono::NaiveDate;
use hex_color::HexColor;

use crate::error::AgencyError;
use crate::gtfs::routes::RouteType;

// hex formats a color the way GTFS writes it: six upper-case digits, no '#'.
pub fn hex(color: HexColor) -> String {
    format!("{:02X}{:02X}{:02X}", color.r, color.g, color.b)
}

#[derive(Debug, Clone)]
pub struct MAgency {
    pub id: String,
    pub timezone: String,
    pub color: HexColor,
    pub route_type: RouteType,
}

#[derive(Debug, Clone)]
pub struct MRoute {
    pub id: u64,
    pub short_name: String,
    pub long_name: String,
    pub color: Option<HexColor>,
}

// MTrip is one direction of a generated route. Its id packs the route id
// and the headsign id so that every direction of a route is distinct.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct MTrip {
    pub route_id: u64,
    pub headsign_id: u8,
    pub headsign: String,
}

impl MTrip {
    pub fn new(route_id: u64) -> Self {
        MTrip {
            route_id,
            headsign_id: 0,
            headsign: String::new(),
        }
    }

    pub fn with_headsign(route_id: u64, headsign_id: u8, headsign: impl Into<String>) -> Self {
        MTrip {
            route_id,
            headsign_id,
            headsign: headsign.into(),
        }
    }

    pub fn id(&self) -> u64 {
        self.route_id * 100 + u64::from(self.headsign_id)
    }

    pub fn set_headsign(&mut self, headsign: impl Into<String>, headsign_id: u8) -> Result<(), AgencyError> {
        let headsign = headsign.into();
        if headsign.trim().is_empty() {
            return Err(AgencyError::Fatal(format!(
                "Trying to set an empty headsign on {} (headsign id {})!",
                self, headsign_id
            )));
        }
        self.headsign = headsign;
        self.headsign_id = headsign_id;
        Ok(())
    }
}

impl fmt::Display for MTrip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MTrip{{id: {}, headsign: '{}'}}", self.id(), self.headsign)
    }
}

#[derive(Debug, Clone)]
pub struct MStop {
    pub id: String,
    pub code: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct MTripStop {
    pub trip_id: u64,
    pub stop_id: String,
    pub stop_sequence: u32,
}

#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub struct MServiceDate {
    pub date: NaiveDate,
    pub service_id: String,
}

// GeneratedSpec is everything produced for one agency, in output order.
#[derive(Debug, Clone)]
pub struct GeneratedSpec {
    pub agency: MAgency,
    pub routes: Vec<MRoute>,
    pub trips: Vec<MTrip>,
    pub stops: Vec<MStop>,
    pub trip_stops: Vec<MTripStop>,
    pub service_dates: Vec<MServiceDate>,
}

impl GeneratedSpec {
    pub fn empty(agency: MAgency) -> Self {
        GeneratedSpec {
            agency,
            routes: Vec::new(),
            trips: Vec::new(),
            stops: Vec::new(),
            trip_stops: Vec::new(),
            service_dates: Vec::new(),
        }
    }

    pub fn trips_of(&self, route_id: u64) -> impl Iterator<Item = &MTrip> {
        self.trips.iter().filter(move |trip| trip.route_id == route_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trip_id() {
        assert_eq!(MTrip::new(7).id(), 700);
        assert_eq!(MTrip::with_headsign(99, 1, "PM").id(), 9901);
    }

    #[test]
    fn test_set_empty_headsign_is_fatal() {
        let mut trip = MTrip::new(7);
        assert!(matches!(trip.set_headsign("  ", 1), Err(AgencyError::Fatal(_))));
        trip.set_headsign("PM", 1).unwrap();
        assert_eq!(trip.id(), 701);
        assert_eq!(trip.headsign, "PM");
    }

    #[test]
    fn test_hex() {
        assert_eq!(hex(HexColor::rgb(0x00, 0x2C, 0x77)), "002C77");
    }
}
