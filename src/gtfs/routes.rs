use std::collections;
use std::fmt;
use std::iter;
use std::str::FromStr;

use hex_color::HexColor;

use crate::gtfs::table::{self, FieldError, Fields};

// Routes is a collection of routes, indexed by route_id.
pub struct Routes {
    pub routes: collections::HashMap<String, Route>,
}

impl From<Vec<Route>> for Routes {
    fn from(routes: Vec<Route>) -> Self {
        Routes {
            routes: routes
                .into_iter()
                .map(|route| (route.route_id.clone(), route))
                .collect(),
        }
    }
}

impl<'a> iter::IntoIterator for &'a Routes {
    type Item = &'a Route;
    type IntoIter = collections::hash_map::Values<'a, String, Route>;

    fn into_iter(self) -> Self::IntoIter {
        self.routes.values()
    }
}

#[derive(Debug, Clone)]
pub struct Route {
    pub route_id: String,
    pub agency_id: Option<String>,
    name: RouteName,
    pub route_type: RouteType,
    pub route_color: Option<HexColor>,
    pub route_text_color: Option<HexColor>,
    pub route_sort_order: Option<usize>,
}

impl Route {
    pub fn route_long_name(&self) -> Option<&str> {
        self.name.long()
    }

    pub fn route_short_name(&self) -> Option<&str> {
        self.name.short()
    }

    pub fn route_long_name_or_default(&self) -> &str {
        self.route_long_name().unwrap_or_default()
    }

    pub fn name(&self) -> &str {
        match &self.name {
            RouteName::Long(name) => name,
            RouteName::Short(name) => name,
            RouteName::LongAndShort(long, _) => long,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Route {} ({})", self.route_id, self.name())
    }
}

// Route implements TryFrom<&Fields> by interpreting the keys as field names, and
// the values as string-encoded values for those fields.
impl TryFrom<&Fields> for Route {
    type Error = FieldError;

    fn try_from(fields: &Fields) -> Result<Self, Self::Error> {
        Ok(Route {
            route_id: table::required(fields, "route_id")?,
            agency_id: table::optional(fields, "agency_id"),
            name: RouteName::try_from(fields)?,
            route_type: table::parse_required(fields, "route_type")?,
            route_color: parse_color(fields, "route_color")?,
            route_text_color: parse_color(fields, "route_text_color")?,
            route_sort_order: table::parse_optional(fields, "route_sort_order")?,
        })
    }
}

// GTFS colors are six hex digits without the leading '#'.
fn parse_color(fields: &Fields, name: &'static str) -> Result<Option<HexColor>, FieldError> {
    table::optional(fields, name)
        .map(|s| HexColor::from_str(&(String::from("#") + &s)).map_err(|e| FieldError::invalid(name, &s, e)))
        .transpose()
}

// RouteName is a type that represents the name of a route.
// It represents the requirement that a route must have at
// least one of a short name or a long name.
#[derive(Debug, Clone)]
pub enum RouteName {
    Short(String),
    Long(String),
    LongAndShort(String, String),
}

impl RouteName {
    pub fn long(&self) -> Option<&str> {
        match self {
            RouteName::Long(name) => Some(name),
            RouteName::LongAndShort(name, _) => Some(name),
            RouteName::Short(_) => None,
        }
    }

    pub fn short(&self) -> Option<&str> {
        match self {
            RouteName::Short(name) => Some(name),
            RouteName::LongAndShort(_, name) => Some(name),
            RouteName::Long(_) => None,
        }
    }
}

impl TryFrom<&Fields> for RouteName {
    type Error = FieldError;

    fn try_from(fields: &Fields) -> Result<Self, Self::Error> {
        match (
            table::optional(fields, "route_short_name"),
            table::optional(fields, "route_long_name"),
        ) {
            (Some(short), Some(long)) => Ok(RouteName::LongAndShort(long, short)),
            (Some(short), None) => Ok(RouteName::Short(short)),
            (None, Some(long)) => Ok(RouteName::Long(long)),
            (None, None) => Err(FieldError::Required("route_short_name or route_long_name")),
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum RouteType {
    TramStreetcarLightRail,
    SubwayMetro,
    Rail,
    Bus,
    Ferry,
    CableTram,
    AerialLift,
    Funicular,
    Trolleybus,
    Monorail,
}

impl RouteType {
    pub fn code(self) -> u8 {
        match self {
            RouteType::TramStreetcarLightRail => 0,
            RouteType::SubwayMetro => 1,
            RouteType::Rail => 2,
            RouteType::Bus => 3,
            RouteType::Ferry => 4,
            RouteType::CableTram => 5,
            RouteType::AerialLift => 6,
            RouteType::Funicular => 7,
            RouteType::Trolleybus => 11,
            RouteType::Monorail => 12,
        }
    }
}

impl FromStr for RouteType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<u16>().map_err(|err| err.to_string())? {
            0 => Ok(RouteType::TramStreetcarLightRail),
            1 => Ok(RouteType::SubwayMetro),
            2 => Ok(RouteType::Rail),
            3 => Ok(RouteType::Bus),
            4 => Ok(RouteType::Ferry),
            5 => Ok(RouteType::CableTram),
            6 => Ok(RouteType::AerialLift),
            7 => Ok(RouteType::Funicular),
            11 => Ok(RouteType::Trolleybus),
            12 => Ok(RouteType::Monorail),
            // extended route types: 7xx are bus services
            700..=799 => Ok(RouteType::Bus),
            _ => Err(String::from("unknown route type")),
        }
    }
}
