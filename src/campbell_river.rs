//! Campbell River Transit System (BC Transit) bus rules.
//!
//! Feed: https://www.bctransit.com/data/gtfs/campbell-river.zip
//! (listed on https://www.bctransit.com/open-data).

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use chrono::NaiveDate;
use hex_color::HexColor;
use regex::Regex;

use crate::error::AgencyError;
use crate::gtfs::calendar::{Calendar, CalendarDate};
use crate::gtfs::routes::{Route, RouteType};
use crate::gtfs::stop_times::StopTime;
use crate::gtfs::trips::Trip;
use crate::gtfs::GtfsSchedule;
use crate::mt::{MRoute, MTrip};
use crate::tools::split::{RouteTripSpec, SplitError};
use crate::tools::{self, clean, service, AgencyTools};

// the BC Transit feed bundles several systems; 14 is Campbell River
const INCLUDE_AGENCY_ID: &str = "14";

// from the corporate graphic standards
const AGENCY_COLOR_GREEN: HexColor = HexColor::rgb(0x34, 0xB2, 0x33);
const AGENCY_COLOR_BLUE: HexColor = HexColor::rgb(0x00, 0x2C, 0x77);

const AGENCY_COLOR: HexColor = AGENCY_COLOR_GREEN;

const ROUTE_PETERSEN: u64 = 7;

pub struct CampbellRiverAgency {
    service_ids: Option<HashSet<String>>,
    route_trips: HashMap<u64, RouteTripSpec>,
}

impl CampbellRiverAgency {
    pub fn new() -> Result<Self, SplitError> {
        Ok(CampbellRiverAgency {
            service_ids: None,
            route_trips: route_trip_specs()?,
        })
    }
}

fn route_trip_specs() -> Result<HashMap<u64, RouteTripSpec>, SplitError> {
    let specs = [
        RouteTripSpec::builder(1, 0, "Campbellton", 1, "Willow Pt")
            .add_trip_sort(
                0,
                &[
                    "112038", // Erickson at Reef Cres
                    "110804",
                    "110856", // 16th Ave at Tamarac
                ],
            )
            .add_trip_sort(
                1,
                &[
                    "112076", // 16th Ave at Tamarac St
                    "112030", "112032", "112083", "112029", "110760", "110762", "110993", "110763",
                    "112038", // Erickson at Reef Cres
                ],
            )
            .compile_both_trip_sort()?,
        RouteTripSpec::builder(2, 0, "Campbellton", 1, "Willow Pt")
            .add_trip_sort(
                0,
                &[
                    "112038", // Westbound Erickson at Reef Cres
                    "110775",
                    "110856", // Westbound 16th Ave at Tamarac
                ],
            )
            .add_trip_sort(
                1,
                &[
                    "112076", // Eastbound 16th Ave at Tamarac St
                    "110790",
                    "112038", // Westbound Erickson at Reef Cres
                ],
            )
            .compile_both_trip_sort()?,
    ];
    Ok(specs.into_iter().map(|spec| (spec.route_id(), spec)).collect())
}

fn route_color_for(route_short_name: u32) -> HexColor {
    match route_short_name {
        1 => HexColor::rgb(0x00, 0x4B, 0x8D),
        2 => HexColor::rgb(0x8C, 0xC6, 0x3F),
        3 => HexColor::rgb(0xF3, 0x74, 0x21),
        4 => HexColor::rgb(0x49, 0x18, 0x6D),
        5 => HexColor::rgb(0x00, 0xAE, 0xEF),
        6 => HexColor::rgb(0x00, 0x8C, 0x6A),
        7 => HexColor::rgb(0xEC, 0x1A, 0x8D),
        8 => HexColor::rgb(0xE2, 0x70, 0xAB),
        12 => HexColor::rgb(0xB2, 0xA9, 0x7E),
        15 => HexColor::rgb(0x8D, 0x0B, 0x3A),
        16 => HexColor::rgb(0x5D, 0x86, 0xA0),
        99 => HexColor::rgb(0xFF, 0xC1, 0x0E),
        _ => AGENCY_COLOR_BLUE,
    }
}

fn exchange(s: &str) -> String {
    static EXCHANGE: OnceLock<Regex> = OnceLock::new();
    EXCHANGE
        .get_or_init(|| Regex::new(r"(?i)(^|\W)(exchange)(\W|$)").unwrap())
        .replace_all(s, "${1}Exch${3}")
        .into_owned()
}

fn remove_express_and_local(s: &str) -> String {
    static ENDS_WITH_EXPRESS: OnceLock<Regex> = OnceLock::new();
    static ENDS_WITH_LOCAL: OnceLock<Regex> = OnceLock::new();
    let s = ENDS_WITH_EXPRESS
        .get_or_init(|| Regex::new(r"(?i) express.*$").unwrap())
        .replace_all(s, "");
    ENDS_WITH_LOCAL
        .get_or_init(|| Regex::new(r"(?i) local.*$").unwrap())
        .replace_all(&s, "")
        .into_owned()
}

fn unexpected_trip(trip: &Trip) -> AgencyError {
    AgencyError::Fatal(format!("Unexpected route trip to set for {}!", trip))
}

impl AgencyTools for CampbellRiverAgency {
    fn agency_name(&self) -> &str {
        "Campbell River Transit System bus"
    }

    fn agency_color(&self) -> HexColor {
        AGENCY_COLOR
    }

    fn agency_route_type(&self) -> RouteType {
        RouteType::Bus
    }

    fn prepare(&mut self, gtfs: &GtfsSchedule, today: NaiveDate) {
        self.service_ids = Some(service::extract_useful_service_ids(gtfs, today));
    }

    fn excluding_all(&self) -> bool {
        self.service_ids.as_ref().is_some_and(HashSet::is_empty)
    }

    fn exclude_calendar(&self, calendar: &Calendar) -> bool {
        match &self.service_ids {
            Some(service_ids) => service::exclude_useless_calendar(calendar, service_ids),
            None => false,
        }
    }

    fn exclude_calendar_date(&self, calendar_date: &CalendarDate) -> bool {
        match &self.service_ids {
            Some(service_ids) => service::exclude_useless_calendar_date(calendar_date, service_ids),
            None => false,
        }
    }

    fn exclude_route(&self, route: &Route) -> bool {
        if route.agency_id.as_deref() != Some(INCLUDE_AGENCY_ID) {
            return true;
        }
        tools::default_exclude_route(self, route)
    }

    fn exclude_trip(&self, trip: &Trip) -> bool {
        match &self.service_ids {
            Some(service_ids) => service::exclude_useless_trip(trip, service_ids),
            None => false,
        }
    }

    // the route short name is the route number riders know
    fn route_id(&self, route: &Route) -> Result<u64, AgencyError> {
        let short_name = route.route_short_name().unwrap_or_default();
        short_name.parse::<u64>().map_err(|e| {
            AgencyError::Fatal(format!("Unexpected route short name '{}' for {}: {}!", short_name, route, e))
        })
    }

    fn route_long_name(&self, route: &Route) -> String {
        let route_long_name = clean::clean_slashes(route.route_long_name_or_default());
        let route_long_name = clean::clean_numbers(&route_long_name);
        let route_long_name = clean::clean_street_types(&route_long_name);
        clean::clean_label(&route_long_name)
    }

    fn route_color(&self, route: &Route) -> Result<Option<HexColor>, AgencyError> {
        if route.route_color.is_some() {
            return Ok(route.route_color);
        }
        let short_name = route.route_short_name().unwrap_or_default();
        let rsn = short_name.parse::<u32>().map_err(|e| {
            AgencyError::Fatal(format!("Unexpected route color for {} ('{}'): {}!", route, short_name, e))
        })?;
        Ok(Some(route_color_for(rsn)))
    }

    fn compare_early(&self, trip: &MTrip, stop_a: &str, stop_b: &str) -> Option<Ordering> {
        self.route_trips
            .get(&trip.route_id)
            .and_then(|spec| spec.compare(trip.headsign_id, stop_a, stop_b))
    }

    fn split_trip(&self, route: &MRoute, _trip: &Trip, _gtfs: &GtfsSchedule) -> Vec<MTrip> {
        match self.route_trips.get(&route.id) {
            Some(spec) => spec.all_trips(),
            None => tools::default_split_trip(route),
        }
    }

    fn split_trip_stops(
        &self,
        route: &MRoute,
        trip: &Trip,
        stop_times: &[&StopTime],
        split_trips: &[MTrip],
    ) -> Result<Vec<Vec<u64>>, AgencyError> {
        let Some(spec) = self.route_trips.get(&route.id) else {
            return tools::default_split_trip_stops(route, trip, stop_times, split_trips);
        };
        let stop_ids = stop_times
            .iter()
            .map(|stop_time| stop_time.stop_id.as_deref().unwrap_or_default())
            .collect::<Vec<_>>();
        let assigned = spec.split_trip_stops(&trip.trip_id, &stop_ids)?;
        Ok(assigned
            .into_iter()
            .map(|directions| directions.into_iter().map(|d| spec.trip_id(d)).collect())
            .collect())
    }

    fn set_trip_headsign(
        &self,
        route: &MRoute,
        mtrip: &mut MTrip,
        trip: &Trip,
        _gtfs: &GtfsSchedule,
    ) -> Result<(), AgencyError> {
        if self.route_trips.contains_key(&route.id) {
            return Ok(()); // split
        }
        let headsign = trip.trip_headsign_or_default();
        let direction_id = trip.direction_id_or_default();
        if route.id == ROUTE_PETERSEN {
            let is_any = |names: &[&str]| headsign.is_empty() || names.iter().any(|n| headsign.eq_ignore_ascii_case(n));
            return match direction_id {
                0 if is_any(&["Petersen A.M. Loop", "Petersen AM Loop"]) => mtrip.set_headsign("AM", 0),
                1 if is_any(&["Petersen P.M. Loop", "Petersen PM Loop"]) => mtrip.set_headsign("PM", 1),
                _ => Err(unexpected_trip(trip)),
            };
        }
        mtrip.set_headsign(self.clean_trip_headsign(headsign), direction_id)
    }

    fn clean_trip_headsign(&self, trip_headsign: &str) -> String {
        let trip_headsign = exchange(trip_headsign);
        let trip_headsign = clean::keep_to_and_remove_via(&trip_headsign);
        let trip_headsign = remove_express_and_local(&trip_headsign);
        let trip_headsign = clean::clean_and(&trip_headsign);
        let trip_headsign = clean::clean_at(&trip_headsign);
        let trip_headsign = clean::clean_street_types(&trip_headsign);
        let trip_headsign = clean::clean_numbers(&trip_headsign);
        clean::clean_label(&trip_headsign)
    }

    fn merge_headsign(&self, mtrip: &mut MTrip, mtrip_to_merge: &MTrip) -> Result<bool, AgencyError> {
        Err(AgencyError::Fatal(format!(
            "Unexpected trips to merge {} & {}!",
            mtrip, mtrip_to_merge
        )))
    }

    fn clean_stop_name(&self, stop_name: &str) -> String {
        let stop_name = clean::clean_bounds(stop_name);
        let stop_name = clean::clean_at(&stop_name);
        let stop_name = exchange(&stop_name);
        let stop_name = clean::clean_street_types(&stop_name);
        let stop_name = clean::clean_numbers(&stop_name);
        clean::clean_label(&stop_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gtfs::table::Fields;
    use crate::gtfs::trips::Direction;

    fn agency() -> CampbellRiverAgency {
        CampbellRiverAgency::new().unwrap()
    }

    fn route(pairs: &[(&str, &str)]) -> Route {
        let mut fields: Fields = [("route_id", "r"), ("route_type", "3"), ("agency_id", "14")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        fields.extend(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        Route::try_from(&fields).unwrap()
    }

    fn mroute(id: u64) -> MRoute {
        MRoute {
            id,
            short_name: id.to_string(),
            long_name: String::new(),
            color: None,
        }
    }

    fn trip(headsign: &str, direction_id: Option<Direction>) -> Trip {
        Trip {
            trip_id: String::from("t1"),
            route_id: String::from("r"),
            service_id: String::from("current"),
            trip_headsign: Some(headsign.to_string()).filter(|s| !s.is_empty()),
            direction_id,
            block_id: None,
            shape_id: None,
        }
    }

    fn stop_time(stop_id: &str, stop_sequence: u32) -> StopTime {
        StopTime {
            trip_id: String::from("t1"),
            stop_id: Some(stop_id.to_string()),
            arrival_time: None,
            departure_time: None,
            stop_sequence,
            stop_headsign: None,
        }
    }

    fn empty_schedule() -> GtfsSchedule {
        GtfsSchedule {
            agencies: Vec::<crate::gtfs::agencies::Agency>::new().into(),
            routes: Vec::<Route>::new().into(),
            trips: Vec::<Trip>::new().into(),
            stops: Vec::<crate::gtfs::stops::Stop>::new().into(),
            stop_times: Vec::<StopTime>::new().into(),
            calendars: Vec::new(),
            calendar_dates: Vec::new(),
        }
    }

    #[test]
    fn test_clean_trip_headsign() {
        let agency = agency();
        assert_eq!(agency.clean_trip_headsign("Willow Point via Alder"), "Willow Pt");
        assert_eq!(agency.clean_trip_headsign("Community Centre Exchange"), "Community Centre Exch");
        assert_eq!(agency.clean_trip_headsign("Campbellton Express"), "Campbellton");
        assert_eq!(agency.clean_trip_headsign("north island college local"), "North Island College");
        assert_eq!(agency.clean_trip_headsign("Dogwood to Campbellton via 2nd Ave"), "Campbellton");
        assert_eq!(agency.clean_trip_headsign("Petersen and SECOND Avenue"), "Petersen & 2nd Ave");
        assert_eq!(agency.clean_trip_headsign("Dogwood at Exchange"), "Dogwood / Exch");
    }

    #[test]
    fn test_clean_stop_name() {
        let agency = agency();
        assert_eq!(agency.clean_stop_name("Westbound Erickson at Reef Cres"), "Erickson / Reef Cres");
        assert_eq!(
            agency.clean_stop_name("Campbell River Community Centre Exchange Bay B"),
            "Campbell River Community Centre Exch Bay B"
        );
        assert_eq!(
            agency.clean_stop_name("Eastbound 16th Avenue at Tamarac Street"),
            "16th Ave / Tamarac St"
        );
    }

    #[test]
    fn test_route_long_name() {
        let agency = agency();
        let r = route(&[("route_short_name", "1"), ("route_long_name", "Willow Point/Campbellton")]);
        assert_eq!(agency.route_long_name(&r), "Willow Pt / Campbellton");
        let r = route(&[("route_short_name", "8"), ("route_long_name", "second avenue loop")]);
        assert_eq!(agency.route_long_name(&r), "2nd Ave Loop");
        let r = route(&[("route_short_name", "8")]);
        assert_eq!(agency.route_long_name(&r), "");
    }

    #[test]
    fn test_route_id_from_short_name() {
        let agency = agency();
        assert_eq!(agency.route_id(&route(&[("route_short_name", "99")])).unwrap(), 99);
        assert!(matches!(
            agency.route_id(&route(&[("route_short_name", "99X")])),
            Err(AgencyError::Fatal(_))
        ));
    }

    #[test]
    fn test_route_color() {
        let agency = agency();
        let r = route(&[("route_short_name", "5")]);
        assert_eq!(agency.route_color(&r).unwrap(), Some(HexColor::rgb(0x00, 0xAE, 0xEF)));
        let r = route(&[("route_short_name", "42")]);
        assert_eq!(agency.route_color(&r).unwrap(), Some(AGENCY_COLOR_BLUE));
        let r = route(&[("route_short_name", "5"), ("route_color", "123456")]);
        assert_eq!(agency.route_color(&r).unwrap(), Some(HexColor::rgb(0x12, 0x34, 0x56)));
        assert_eq!(agency.agency_color(), HexColor::rgb(0x34, 0xB2, 0x33));
    }

    #[test]
    fn test_exclude_route_of_other_agencies() {
        let agency = agency();
        assert!(!agency.exclude_route(&route(&[("route_short_name", "1")])));
        assert!(agency.exclude_route(&route(&[("route_short_name", "1"), ("agency_id", "12")])));
        assert!(agency.exclude_route(&route(&[("route_short_name", "1"), ("route_type", "4")])));
    }

    #[test]
    fn test_service_ids_filter_trips_and_calendars() {
        let mut agency = agency();
        let current = trip("Campbellton", None);
        // nothing is filtered before prepare
        assert!(!agency.exclude_trip(&current));
        assert!(!agency.excluding_all());

        let mut gtfs = empty_schedule();
        gtfs.calendar_dates = vec![
            CalendarDate {
                service_id: String::from("current"),
                date: NaiveDate::from_ymd_opt(2026, 10, 20).unwrap(),
                exception_type: crate::gtfs::calendar::ExceptionType::Added,
            },
            CalendarDate {
                service_id: String::from("past"),
                date: NaiveDate::from_ymd_opt(2026, 1, 20).unwrap(),
                exception_type: crate::gtfs::calendar::ExceptionType::Added,
            },
        ];
        agency.prepare(&gtfs, NaiveDate::from_ymd_opt(2026, 10, 17).unwrap());
        assert!(!agency.excluding_all());
        assert!(!agency.exclude_trip(&current));
        let mut past = trip("Campbellton", None);
        past.service_id = String::from("past");
        assert!(agency.exclude_trip(&past));
        assert!(agency.exclude_calendar_date(&gtfs.calendar_dates[1]));

        agency.prepare(&gtfs, NaiveDate::from_ymd_opt(2027, 1, 1).unwrap());
        assert!(agency.excluding_all());
    }

    #[test]
    fn test_route_7_headsigns() {
        let agency = agency();
        let gtfs = empty_schedule();
        let route = mroute(7);

        let mut mtrip = MTrip::new(7);
        agency
            .set_trip_headsign(&route, &mut mtrip, &trip("PETERSEN A.M. LOOP", Some(Direction::A)), &gtfs)
            .unwrap();
        assert_eq!((mtrip.headsign.as_str(), mtrip.id()), ("AM", 700));

        let mut mtrip = MTrip::new(7);
        agency
            .set_trip_headsign(&route, &mut mtrip, &trip("", Some(Direction::B)), &gtfs)
            .unwrap();
        assert_eq!((mtrip.headsign.as_str(), mtrip.id()), ("PM", 701));

        let mut mtrip = MTrip::new(7);
        let result = agency.set_trip_headsign(&route, &mut mtrip, &trip("Downtown", Some(Direction::A)), &gtfs);
        assert!(matches!(result, Err(AgencyError::Fatal(message)) if message.starts_with("Unexpected route trip")));

        let mut mtrip = MTrip::new(7);
        let result = agency.set_trip_headsign(&route, &mut mtrip, &trip("Petersen PM Loop", Some(Direction::A)), &gtfs);
        assert!(result.is_err());
    }

    #[test]
    fn test_other_route_headsign() {
        let agency = agency();
        let mut mtrip = MTrip::new(5);
        agency
            .set_trip_headsign(&mroute(5), &mut mtrip, &trip("Willow Point via Alder", Some(Direction::B)), &empty_schedule())
            .unwrap();
        assert_eq!((mtrip.headsign.as_str(), mtrip.id()), ("Willow Pt", 501));
    }

    #[test]
    fn test_split_routes() {
        let agency = agency();
        let gtfs = empty_schedule();
        let route = mroute(1);
        let gtrip = trip("Campbellton", None);

        let split = agency.split_trip(&route, &gtrip, &gtfs);
        assert_eq!(split.len(), 2);
        let mut first = split[0].clone();
        agency.set_trip_headsign(&route, &mut first, &gtrip, &gtfs).unwrap();
        assert_eq!(first, split[0]);

        let stop_times = [stop_time("112038", 1), stop_time("110804", 2), stop_time("110856", 3)];
        let stop_times = stop_times.iter().collect::<Vec<_>>();
        let assigned = agency.split_trip_stops(&route, &gtrip, &stop_times, &split).unwrap();
        assert_eq!(assigned, vec![vec![100], vec![100], vec![100]]);

        // enters direction 1 partway, then carries on as direction 0
        let stop_times = ["110760", "110762", "110763", "112038", "110804", "110856"]
            .iter()
            .zip(1..)
            .map(|(stop_id, stop_sequence)| stop_time(stop_id, stop_sequence))
            .collect::<Vec<_>>();
        let stop_times = stop_times.iter().collect::<Vec<_>>();
        let assigned = agency.split_trip_stops(&route, &gtrip, &stop_times, &split).unwrap();
        assert_eq!(
            assigned,
            vec![vec![101], vec![101], vec![101], vec![100, 101], vec![100], vec![100]]
        );

        let stop_times = [stop_time("123456", 1), stop_time("110856", 2)];
        let stop_times = stop_times.iter().collect::<Vec<_>>();
        assert!(matches!(
            agency.split_trip_stops(&route, &gtrip, &stop_times, &split),
            Err(AgencyError::Split(_))
        ));

        assert_eq!(
            agency.compare_early(&split[1], "112076", "112038"),
            Some(Ordering::Less)
        );
        assert_eq!(agency.compare_early(&MTrip::new(5), "112076", "112038"), None);
        assert_eq!(agency.split_trip(&mroute(5), &gtrip, &gtfs), vec![MTrip::new(5)]);
    }

    #[test]
    fn test_merge_is_fatal() {
        let agency = agency();
        let mut a = MTrip::with_headsign(5, 0, "Campbellton");
        let b = MTrip::with_headsign(5, 0, "Willow Pt");
        let result = agency.merge_headsign(&mut a, &b);
        assert!(matches!(result, Err(AgencyError::Fatal(message)) if message.starts_with("Unexpected trips to merge")));
    }
}
