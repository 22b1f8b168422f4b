use std::collections;
use std::iter;
use std::str::FromStr;

use crate::gtfs::table::{self, FieldError, Fields};

// Stops is a collection of stops, indexed by stop_id.
pub struct Stops {
    pub stops: collections::HashMap<String, Stop>,
}

impl From<Vec<Stop>> for Stops {
    fn from(stops: Vec<Stop>) -> Self {
        Stops {
            stops: stops.into_iter().map(|stop| (stop.stop_id.clone(), stop)).collect(),
        }
    }
}

impl<'a> iter::IntoIterator for &'a Stops {
    type Item = &'a Stop;
    type IntoIter = collections::hash_map::Values<'a, String, Stop>;

    fn into_iter(self) -> Self::IntoIter {
        self.stops.values()
    }
}

#[derive(Debug, Clone)]
pub struct Stop {
    pub stop_id: String,
    pub stop_code: Option<String>,
    pub stop_name: Option<String>,
    pub stop_lat: Option<f64>,
    pub stop_lon: Option<f64>,
    pub location_type: LocationType,
    pub parent_station: Option<String>,
    pub wheelchair_boarding: Option<bool>,
}

impl Stop {
    pub fn stop_name_or_default(&self) -> &str {
        self.stop_name.as_deref().unwrap_or_default()
    }
}

// Stop implements TryFrom<&Fields> by interpreting the keys as field names, and
// the values as string-encoded values for those fields.
impl TryFrom<&Fields> for Stop {
    type Error = FieldError;

    fn try_from(fields: &Fields) -> Result<Self, Self::Error> {
        let location_type = table::parse_optional::<LocationType>(fields, "location_type")?.unwrap_or_default();
        let stop = Stop {
            stop_id: table::required(fields, "stop_id")?,
            stop_code: table::optional(fields, "stop_code"),
            stop_name: table::optional(fields, "stop_name"),
            stop_lat: table::parse_optional(fields, "stop_lat")?,
            stop_lon: table::parse_optional(fields, "stop_lon")?,
            location_type,
            parent_station: table::optional(fields, "parent_station"),
            wheelchair_boarding: table::parse_flag(fields, "wheelchair_boarding")?,
        };

        // stops, stations and entrances must be locatable and named;
        // generic nodes and boarding areas inherit from their parent.
        if location_type.is_located() {
            if stop.stop_name.is_none() {
                return Err(FieldError::Required("stop_name"));
            }
            if stop.stop_lat.is_none() {
                return Err(FieldError::Required("stop_lat"));
            }
            if stop.stop_lon.is_none() {
                return Err(FieldError::Required("stop_lon"));
            }
        } else if stop.parent_station.is_none() {
            return Err(FieldError::Required("parent_station"));
        }
        Ok(stop)
    }
}

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum LocationType {
    #[default]
    Stop,
    Station,
    EntranceExit,
    GenericNode,
    BoardingArea,
}

impl LocationType {
    pub fn is_located(self) -> bool {
        matches!(self, LocationType::Stop | LocationType::Station | LocationType::EntranceExit)
    }
}

impl FromStr for LocationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "0" => Ok(LocationType::Stop),
            "1" => Ok(LocationType::Station),
            "2" => Ok(LocationType::EntranceExit),
            "3" => Ok(LocationType::GenericNode),
            "4" => Ok(LocationType::BoardingArea),
            _ => Err(String::from("expected 0 to 4")),
        }
    }
}
