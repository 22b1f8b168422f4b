//! Drives an [`AgencyTools`] over a loaded GTFS schedule and collects the
//! generated routes, trips, stops and service dates.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::time::{Duration, Instant};

use chrono::NaiveDate;

use crate::error::AgencyError;
use crate::gtfs::agencies::Agency;
use crate::gtfs::routes::Route;
use crate::gtfs::stop_times::StopTime;
use crate::gtfs::trips::Trip;
use crate::gtfs::GtfsSchedule;
use crate::mt::{GeneratedSpec, MAgency, MRoute, MStop, MTrip, MTripStop};
use crate::tools::{service, AgencyTools};

pub struct Generator<T: AgencyTools> {
    tools: T,
}

impl<T: AgencyTools> Generator<T> {
    pub fn new(tools: T) -> Self {
        Generator { tools }
    }

    pub fn run(&mut self, gtfs: &GtfsSchedule, today: NaiveDate) -> Result<GeneratedSpec, AgencyError> {
        let start = Instant::now();
        tracing::info!("Generating {} data...", self.tools.agency_name());
        self.tools.prepare(gtfs, today);
        let tools = &self.tools;

        let agencies = gtfs
            .agencies
            .into_iter()
            .filter(|agency| !tools.exclude_agency(agency))
            .collect::<Vec<_>>();
        let mut routes = gtfs
            .routes
            .into_iter()
            .filter(|route| !tools.exclude_route(route) && belongs_to(route, &agencies))
            .collect::<Vec<_>>();
        routes.sort_by(|a, b| a.route_id.cmp(&b.route_id));
        let agency = self.agency(&agencies, &routes);

        if tools.excluding_all() {
            tracing::info!("no service left on or after {}, generating the agency only", today);
            return Ok(GeneratedSpec::empty(agency));
        }

        let calendars = gtfs.calendars.iter().filter(|calendar| !tools.exclude_calendar(calendar));
        let calendar_dates = gtfs
            .calendar_dates
            .iter()
            .filter(|calendar_date| !tools.exclude_calendar_date(calendar_date));
        let service_dates = service::service_dates(calendars, calendar_dates);
        let scheduled = service_dates
            .iter()
            .map(|service_date| service_date.service_id.as_str())
            .collect::<HashSet<_>>();

        let mut mroutes = BTreeMap::new();
        let mut route_ids = HashMap::new();
        for route in &routes {
            let id = tools.route_id(route)?;
            route_ids.insert(route.route_id.as_str(), id);
            if mroutes.contains_key(&id) {
                continue;
            }
            mroutes.insert(
                id,
                MRoute {
                    id,
                    short_name: tools.route_short_name(route),
                    long_name: tools.route_long_name(route),
                    color: tools.route_color(route)?,
                },
            );
        }

        let mut trips = gtfs
            .trips
            .into_iter()
            .filter(|trip| route_ids.contains_key(trip.route_id.as_str()))
            .filter(|trip| !tools.exclude_trip(trip) && scheduled.contains(trip.service_id.as_str()))
            .collect::<Vec<_>>();
        trips.sort_by(|a, b| a.trip_id.cmp(&b.trip_id));
        tracing::debug!("{} routes and {} trips kept", mroutes.len(), trips.len());

        let mut mtrips: BTreeMap<u64, MTrip> = BTreeMap::new();
        let mut stop_lists: BTreeMap<u64, Vec<String>> = BTreeMap::new();
        let mut used_services = HashSet::new();
        for trip in trips {
            let mroute = &mroutes[&route_ids[trip.route_id.as_str()]];
            let (split, trip_stop_lists) = self.generate_trip(mroute, trip, gtfs)?;

            for mtrip in split {
                match mtrips.get_mut(&mtrip.id()) {
                    Some(existing) if existing.headsign != mtrip.headsign => {
                        if !tools.merge_headsign(existing, &mtrip)? {
                            return Err(AgencyError::Fatal(format!(
                                "Can not merge {} & {} from {}!",
                                existing, mtrip, trip
                            )));
                        }
                    }
                    Some(_) => {}
                    None => {
                        mtrips.insert(mtrip.id(), mtrip);
                    }
                }
            }

            for (mtrip_id, stop_ids) in trip_stop_lists {
                let mtrip = &mtrips[&mtrip_id];
                let merged = match stop_lists.get(&mtrip_id) {
                    Some(existing) => merge_stop_lists(existing, &stop_ids, |a, b| tools.compare_early(mtrip, a, b)),
                    None => stop_ids,
                };
                stop_lists.insert(mtrip_id, merged);
            }
            used_services.insert(trip.service_id.as_str());
        }

        let trip_stops = stop_lists
            .iter()
            .flat_map(|(trip_id, stop_ids)| {
                stop_ids.iter().zip(1..).map(move |(stop_id, stop_sequence)| MTripStop {
                    trip_id: *trip_id,
                    stop_id: stop_id.clone(),
                    stop_sequence,
                })
            })
            .collect::<Vec<_>>();

        let stop_ids = stop_lists.values().flatten().map(String::as_str).collect::<BTreeSet<_>>();
        let mut stops = Vec::with_capacity(stop_ids.len());
        for stop_id in stop_ids {
            let stop = gtfs
                .stops
                .stops
                .get(stop_id)
                .ok_or_else(|| AgencyError::Fatal(format!("Unexpected stop ID '{}' in stop times!", stop_id)))?;
            stops.push(MStop {
                id: stop.stop_id.clone(),
                code: stop.stop_code.clone().unwrap_or_default(),
                name: tools.clean_stop_name(stop.stop_name_or_default()),
                lat: stop.stop_lat.unwrap_or_default(),
                lon: stop.stop_lon.unwrap_or_default(),
            });
        }

        // a direction nothing ran in is dropped, and so is a route left without directions
        let mtrips = mtrips
            .into_values()
            .filter(|mtrip| stop_lists.get(&mtrip.id()).is_some_and(|stop_ids| !stop_ids.is_empty()))
            .collect::<Vec<_>>();
        let mroutes = mroutes
            .into_values()
            .filter(|mroute| mtrips.iter().any(|mtrip| mtrip.route_id == mroute.id))
            .collect::<Vec<_>>();
        let service_dates = service_dates
            .into_iter()
            .filter(|service_date| used_services.contains(service_date.service_id.as_str()))
            .collect::<Vec<_>>();

        tracing::info!(
            "generated {} routes, {} trips, {} stops, {} trip stops, {} service dates",
            mroutes.len(),
            mtrips.len(),
            stops.len(),
            trip_stops.len(),
            service_dates.len()
        );
        tracing::info!(
            "Generating {} data... DONE in {}",
            tools.agency_name(),
            pretty_duration(start.elapsed())
        );

        Ok(GeneratedSpec {
            agency,
            routes: mroutes,
            trips: mtrips,
            stops,
            trip_stops,
            service_dates,
        })
    }

    // generate_trip splits one GTFS trip and returns its generated trips
    // along with the ordered stop ids each of them received.
    fn generate_trip(
        &self,
        mroute: &MRoute,
        trip: &Trip,
        gtfs: &GtfsSchedule,
    ) -> Result<(Vec<MTrip>, BTreeMap<u64, Vec<String>>), AgencyError> {
        let tools = &self.tools;
        let mut split = tools.split_trip(mroute, trip, gtfs);
        match split.as_mut_slice() {
            [] => {
                return Err(AgencyError::Fatal(format!("No trip generated for {}!", trip)));
            }
            [single] => tools.set_trip_headsign(mroute, single, trip, gtfs)?,
            _ => {}
        }

        let stop_times = gtfs
            .stop_times
            .for_trip(&trip.trip_id)
            .iter()
            .filter(|stop_time| stop_time.stop_id.is_some())
            .collect::<Vec<&StopTime>>();
        let assigned = tools.split_trip_stops(mroute, trip, &stop_times, &split)?;
        if assigned.len() != stop_times.len() {
            return Err(AgencyError::Fatal(format!(
                "Split of {} assigned {} stops out of {}!",
                trip,
                assigned.len(),
                stop_times.len()
            )));
        }

        let mut stop_lists: BTreeMap<u64, Vec<String>> = BTreeMap::new();
        for (stop_time, mtrip_ids) in stop_times.iter().zip(assigned) {
            let stop_id = stop_time.stop_id.as_deref().unwrap_or_default();
            for mtrip_id in mtrip_ids {
                if !split.iter().any(|mtrip| mtrip.id() == mtrip_id) {
                    return Err(AgencyError::Fatal(format!(
                        "Stop {} of {} assigned to unknown trip {}!",
                        stop_id, trip, mtrip_id
                    )));
                }
                let stop_ids = stop_lists.entry(mtrip_id).or_default();
                if stop_ids.last().map(String::as_str) != Some(stop_id) {
                    stop_ids.push(stop_id.to_string());
                }
            }
        }
        Ok((split, stop_lists))
    }

    // agency picks the kept agency the kept routes point to, falling back on
    // the first kept agency.
    fn agency(&self, agencies: &[&Agency], routes: &[&Route]) -> MAgency {
        let agency = routes
            .iter()
            .find_map(|route| route.agency_id.as_deref())
            .and_then(|id| agencies.iter().find(|agency| agency.agency_id.as_deref() == Some(id)))
            .or(agencies.first());
        MAgency {
            id: agency.and_then(|agency| agency.agency_id.clone()).unwrap_or_default(),
            timezone: agency
                .map(|agency| agency.agency_timezone.name())
                .unwrap_or("UTC")
                .to_string(),
            color: self.tools.agency_color(),
            route_type: self.tools.agency_route_type(),
        }
    }
}

fn belongs_to(route: &Route, agencies: &[&Agency]) -> bool {
    match route.agency_id.as_deref() {
        Some(id) => agencies.iter().any(|agency| agency.agency_id.as_deref() == Some(id)),
        None => !agencies.is_empty(),
    }
}

/// Merges the stop list of one more GTFS trip into the list already built
/// for the same generated trip, keeping both orders where they agree.
///
/// When the lists diverge, a stop that shows up later in the other list is
/// deferred; when neither or both do, `compare` decides, and without an
/// opinion the existing stop goes first.
pub fn merge_stop_lists<F>(existing: &[String], new: &[String], compare: F) -> Vec<String>
where
    F: Fn(&str, &str) -> Option<Ordering>,
{
    let mut merged = Vec::with_capacity(existing.len().max(new.len()));
    let (mut i, mut j) = (0, 0);
    while i < existing.len() && j < new.len() {
        let (a, b) = (&existing[i], &new[j]);
        if a == b {
            merged.push(a.clone());
            i += 1;
            j += 1;
            continue;
        }
        let b_later_in_existing = existing[i + 1..].contains(b);
        let a_later_in_new = new[j + 1..].contains(a);
        let new_first = match (b_later_in_existing, a_later_in_new) {
            (true, false) => false,
            (false, true) => true,
            _ => compare(a, b) == Some(Ordering::Greater),
        };
        if new_first {
            merged.push(b.clone());
            j += 1;
        } else {
            merged.push(a.clone());
            i += 1;
        }
    }
    merged.extend_from_slice(&existing[i..]);
    merged.extend_from_slice(&new[j..]);
    merged
}

fn pretty_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs > 0 {
        format!("{:.1}s", duration.as_secs_f64())
    } else {
        format!("{}ms", duration.as_millis())
    }
}
