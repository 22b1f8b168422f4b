//! The callbacks an agency implements to steer generation.
//!
//! [`AgencyTools`] carries a default for every callback except the agency's
//! identity. Defaults that an agency may want to fall back on after its own
//! rule are also exposed as free functions (`default_*`), since a trait
//! override cannot call the method it replaces.

pub mod clean;
pub mod service;
pub mod split;

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::NaiveDate;
use hex_color::HexColor;

use crate::error::AgencyError;
use crate::gtfs::agencies::Agency;
use crate::gtfs::calendar::{Calendar, CalendarDate};
use crate::gtfs::routes::{Route, RouteType};
use crate::gtfs::stop_times::StopTime;
use crate::gtfs::trips::Trip;
use crate::gtfs::GtfsSchedule;
use crate::mt::{MRoute, MTrip};

pub trait AgencyTools {
    // agency_name is used in log output only.
    fn agency_name(&self) -> &str;

    fn agency_color(&self) -> HexColor;

    fn agency_route_type(&self) -> RouteType;

    /// Called once before any other callback, with the date generation runs for.
    fn prepare(&mut self, _gtfs: &GtfsSchedule, _today: NaiveDate) {}

    /// When true, nothing but the agency itself is generated.
    fn excluding_all(&self) -> bool {
        false
    }

    fn exclude_agency(&self, _agency: &Agency) -> bool {
        false
    }

    fn exclude_calendar(&self, _calendar: &Calendar) -> bool {
        false
    }

    fn exclude_calendar_date(&self, _calendar_date: &CalendarDate) -> bool {
        false
    }

    fn exclude_route(&self, route: &Route) -> bool {
        default_exclude_route(self, route)
    }

    fn exclude_trip(&self, _trip: &Trip) -> bool {
        false
    }

    fn route_id(&self, route: &Route) -> Result<u64, AgencyError> {
        route.route_id.parse::<u64>().map_err(|e| {
            AgencyError::Fatal(format!("Unexpected route ID '{}' for {}: {}!", route.route_id, route, e))
        })
    }

    fn route_short_name(&self, route: &Route) -> String {
        route.route_short_name().unwrap_or_default().to_string()
    }

    fn route_long_name(&self, route: &Route) -> String {
        clean::clean_label(route.route_long_name_or_default())
    }

    fn route_color(&self, route: &Route) -> Result<Option<HexColor>, AgencyError> {
        Ok(route.route_color)
    }

    /// Orders two stops of the same generated trip when their GTFS trips
    /// disagree or are silent. `None` means no opinion.
    fn compare_early(&self, _trip: &MTrip, _stop_a: &str, _stop_b: &str) -> Option<Ordering> {
        None
    }

    fn split_trip(&self, route: &MRoute, _trip: &Trip, _gtfs: &GtfsSchedule) -> Vec<MTrip> {
        default_split_trip(route)
    }

    /// Returns, for every stop time, the ids of the split trips it belongs to.
    fn split_trip_stops(
        &self,
        route: &MRoute,
        trip: &Trip,
        stop_times: &[&StopTime],
        split_trips: &[MTrip],
    ) -> Result<Vec<Vec<u64>>, AgencyError> {
        default_split_trip_stops(route, trip, stop_times, split_trips)
    }

    fn set_trip_headsign(
        &self,
        _route: &MRoute,
        mtrip: &mut MTrip,
        trip: &Trip,
        _gtfs: &GtfsSchedule,
    ) -> Result<(), AgencyError> {
        mtrip.set_headsign(
            self.clean_trip_headsign(trip.trip_headsign_or_default()),
            trip.direction_id_or_default(),
        )
    }

    fn clean_trip_headsign(&self, trip_headsign: &str) -> String {
        clean::clean_label(trip_headsign)
    }

    /// Called when two GTFS trips produce the same generated trip with
    /// different headsigns. Returning false aborts the run.
    fn merge_headsign(&self, mtrip: &mut MTrip, mtrip_to_merge: &MTrip) -> Result<bool, AgencyError> {
        Ok(default_merge_headsign(mtrip, mtrip_to_merge))
    }

    fn clean_stop_name(&self, stop_name: &str) -> String {
        clean::clean_label(stop_name)
    }
}

// keep only routes of the agency's own mode
pub fn default_exclude_route<T: AgencyTools + ?Sized>(tools: &T, route: &Route) -> bool {
    route.route_type != tools.agency_route_type()
}

pub fn default_split_trip(route: &MRoute) -> Vec<MTrip> {
    vec![MTrip::new(route.id)]
}

pub fn default_split_trip_stops(
    route: &MRoute,
    trip: &Trip,
    stop_times: &[&StopTime],
    split_trips: &[MTrip],
) -> Result<Vec<Vec<u64>>, AgencyError> {
    match split_trips {
        [single] => Ok(vec![vec![single.id()]; stop_times.len()]),
        _ => Err(AgencyError::Fatal(format!(
            "Route {} split {} into {} trips without a rule to assign its stops!",
            route.id,
            trip,
            split_trips.len()
        ))),
    }
}

pub fn default_merge_headsign(mtrip: &mut MTrip, mtrip_to_merge: &MTrip) -> bool {
    let merged = mtrip.headsign.split(" / ").collect::<HashSet<_>>();
    if mtrip_to_merge.headsign.is_empty() || merged.contains(mtrip_to_merge.headsign.as_str()) {
        return true;
    }
    if mtrip.headsign.is_empty() {
        mtrip.headsign = mtrip_to_merge.headsign.clone();
    } else {
        mtrip.headsign = format!("{} / {}", mtrip.headsign, mtrip_to_merge.headsign);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DefaultTools;

    impl AgencyTools for DefaultTools {
        fn agency_name(&self) -> &str {
            "test"
        }

        fn agency_color(&self) -> HexColor {
            HexColor::rgb(0, 0, 0)
        }

        fn agency_route_type(&self) -> RouteType {
            RouteType::Bus
        }
    }

    #[test]
    fn test_default_merge_headsign() {
        let mut trip = MTrip::with_headsign(1, 0, "Downtown");
        assert!(default_merge_headsign(&mut trip, &MTrip::with_headsign(1, 0, "Mall")));
        assert_eq!(trip.headsign, "Downtown / Mall");
        assert!(default_merge_headsign(&mut trip, &MTrip::with_headsign(1, 0, "Downtown")));
        assert_eq!(trip.headsign, "Downtown / Mall");

        let mut empty = MTrip::new(1);
        assert!(DefaultTools.merge_headsign(&mut empty, &MTrip::with_headsign(1, 0, "Mall")).unwrap());
        assert_eq!(empty.headsign, "Mall");
    }

    #[test]
    fn test_default_clean_is_label_only() {
        assert_eq!(DefaultTools.clean_stop_name("  main   street "), "Main Street");
        assert_eq!(DefaultTools.clean_trip_headsign("downtown"), "Downtown");
    }

    #[test]
    fn test_default_split_trip_stops_needs_single_trip() {
        let route = MRoute {
            id: 3,
            short_name: String::from("3"),
            long_name: String::new(),
            color: None,
        };
        let trip = Trip {
            trip_id: String::from("t"),
            route_id: String::from("3"),
            service_id: String::from("s"),
            trip_headsign: None,
            direction_id: None,
            block_id: None,
            shape_id: None,
        };
        let split = DefaultTools.split_trip(&route, &trip, &empty_schedule());
        assert_eq!(split, vec![MTrip::new(3)]);
        assert_eq!(
            DefaultTools.split_trip_stops(&route, &trip, &[], &split).unwrap(),
            Vec::<Vec<u64>>::new()
        );
        let two = vec![MTrip::with_headsign(3, 0, "A"), MTrip::with_headsign(3, 1, "B")];
        assert!(DefaultTools.split_trip_stops(&route, &trip, &[], &two).is_err());
    }

    fn empty_schedule() -> GtfsSchedule {
        GtfsSchedule {
            agencies: Vec::<Agency>::new().into(),
            routes: Vec::<Route>::new().into(),
            trips: Vec::<Trip>::new().into(),
            stops: Vec::<crate::gtfs::stops::Stop>::new().into(),
            stop_times: Vec::<StopTime>::new().into(),
            calendars: Vec::new(),
            calendar_dates: Vec::new(),
        }
    }
}
