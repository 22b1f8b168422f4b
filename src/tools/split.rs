//! Splitting a route into its two directions from literal, ordered stop lists.
//!
//! Some feeds publish a route's trips without usable direction ids, or as one
//! long round trip. A [`RouteTripSpec`] names the two directions of such a
//! route and, for each, the ordered stops it runs through; every stop of a
//! GTFS trip is then assigned to one direction (or both, at a terminal).

use std::cmp::Ordering;
use std::collections::HashMap;

use thiserror::Error;

use crate::mt::MTrip;

#[derive(Debug, Error, PartialEq)]
pub enum SplitError {
    #[error("route {route_id}: direction {direction_id} is not one of the route's directions")]
    UnknownDirection { route_id: u64, direction_id: u8 },
    #[error("route {route_id}: no trip sort for direction {direction_id}")]
    MissingTripSort { route_id: u64, direction_id: u8 },
    #[error("route {route_id}: trip sort for direction {direction_id} needs at least 2 stops")]
    TripSortTooShort { route_id: u64, direction_id: u8 },
    #[error("route {route_id}: trip {trip_id} matches both directions equally")]
    AmbiguousTrip { route_id: u64, trip_id: String },
    #[error("route {route_id}: can not assign stop {stop_id} (#{position}) of trip {trip_id} to a direction")]
    UnassignedStop {
        route_id: u64,
        trip_id: String,
        stop_id: String,
        position: usize,
    },
}

pub struct RouteTripSpecBuilder {
    route_id: u64,
    headsigns: [(u8, String); 2],
    trip_sorts: Vec<(u8, Vec<String>)>,
}

impl RouteTripSpecBuilder {
    pub fn add_trip_sort(mut self, direction_id: u8, stop_ids: &[&str]) -> Self {
        self.trip_sorts
            .push((direction_id, stop_ids.iter().map(|s| s.to_string()).collect()));
        self
    }

    pub fn compile_both_trip_sort(self) -> Result<RouteTripSpec, SplitError> {
        let route_id = self.route_id;
        if let Some((direction_id, _)) = self
            .trip_sorts
            .iter()
            .find(|(direction_id, _)| self.headsigns.iter().all(|(id, _)| id != direction_id))
        {
            return Err(SplitError::UnknownDirection {
                route_id,
                direction_id: *direction_id,
            });
        }

        let mut directions = Vec::with_capacity(2);
        for (direction_id, headsign) in self.headsigns {
            let stop_ids = self
                .trip_sorts
                .iter()
                .rev()
                .find(|(id, _)| *id == direction_id)
                .map(|(_, stop_ids)| stop_ids.clone())
                .ok_or(SplitError::MissingTripSort { route_id, direction_id })?;
            if stop_ids.len() < 2 {
                return Err(SplitError::TripSortTooShort { route_id, direction_id });
            }
            let mut index = HashMap::new();
            for (i, stop_id) in stop_ids.iter().enumerate() {
                index.entry(stop_id.clone()).or_insert(i);
            }
            directions.push(DirectionSort {
                direction_id,
                headsign,
                stop_ids,
                index,
            });
        }
        Ok(RouteTripSpec { route_id, directions })
    }
}

#[derive(Debug, Clone)]
struct DirectionSort {
    direction_id: u8,
    headsign: String,
    stop_ids: Vec<String>,
    // first position of every stop in stop_ids
    index: HashMap<String, usize>,
}

impl DirectionSort {
    fn first(&self) -> &str {
        &self.stop_ids[0]
    }

    fn last(&self) -> &str {
        &self.stop_ids[self.stop_ids.len() - 1]
    }

    // ordered_matches counts the trip's stops found in this sort in
    // increasing order, skipping any that would go backwards.
    fn ordered_matches(&self, stop_ids: &[&str]) -> usize {
        let mut last_index = None;
        let mut matches = 0;
        for stop_id in stop_ids {
            if let Some(&i) = self.index.get(*stop_id) {
                if last_index.map_or(true, |last| i > last) {
                    last_index = Some(i);
                    matches += 1;
                }
            }
        }
        matches
    }
}

#[derive(Debug, Clone)]
pub struct RouteTripSpec {
    route_id: u64,
    directions: Vec<DirectionSort>,
}

impl RouteTripSpec {
    pub fn builder(
        route_id: u64,
        first_direction_id: u8,
        first_headsign: &str,
        second_direction_id: u8,
        second_headsign: &str,
    ) -> RouteTripSpecBuilder {
        RouteTripSpecBuilder {
            route_id,
            headsigns: [
                (first_direction_id, first_headsign.to_string()),
                (second_direction_id, second_headsign.to_string()),
            ],
            trip_sorts: Vec::new(),
        }
    }

    pub fn route_id(&self) -> u64 {
        self.route_id
    }

    pub fn all_trips(&self) -> Vec<MTrip> {
        self.directions
            .iter()
            .map(|direction| MTrip::with_headsign(self.route_id, direction.direction_id, direction.headsign.clone()))
            .collect()
    }

    pub fn trip_id(&self, direction_id: u8) -> u64 {
        MTrip::with_headsign(self.route_id, direction_id, "").id()
    }

    // compare orders two stops by their position in the direction's sort.
    pub fn compare(&self, direction_id: u8, stop_a: &str, stop_b: &str) -> Option<Ordering> {
        let direction = self.directions.iter().find(|d| d.direction_id == direction_id)?;
        let a = direction.index.get(stop_a)?;
        let b = direction.index.get(stop_b)?;
        Some(a.cmp(b))
    }

    /// Assigns every stop of one GTFS trip to the direction(s) it belongs to.
    ///
    /// A stretch of the trip running from a direction's first stop to that
    /// direction's last stop belongs to the direction, terminals included.
    /// Stops leading into a stretch belong to the other direction when they
    /// follow its order up to the terminal it ends at; stops carrying on after
    /// a stretch likewise belong to the direction starting at its last stop.
    /// When the trip holds no stretch at all (a short turn, say) the whole
    /// trip goes to the direction whose sort it follows best.
    pub fn split_trip_stops(&self, trip_id: &str, stop_ids: &[&str]) -> Result<Vec<Vec<u8>>, SplitError> {
        let mut assigned: Vec<Vec<u8>> = vec![Vec::new(); stop_ids.len()];
        let mut stretches = Vec::new();

        for direction in &self.directions {
            let mut i = 0;
            while i < stop_ids.len() {
                if stop_ids[i] == direction.first() {
                    if let Some(offset) = stop_ids[i + 1..].iter().position(|s| *s == direction.last()) {
                        let end = i + 1 + offset;
                        assign(&mut assigned[i..=end], direction.direction_id);
                        stretches.push((i, end, direction.direction_id));
                        // the terminal may also start the next stretch
                        i = end;
                        continue;
                    }
                }
                i += 1;
            }
        }

        for (start, end, direction_id) in stretches {
            if let Some(before) = self.other_direction(direction_id, |d| d.last() == stop_ids[start]) {
                let mut bound = before.stop_ids.len() - 1;
                let mut k = start;
                while k > 0 && assigned[k - 1].is_empty() {
                    match before.index.get(stop_ids[k - 1]) {
                        Some(&i) if i < bound => {
                            bound = i;
                            k -= 1;
                        }
                        _ => break,
                    }
                }
                if k < start {
                    assign(&mut assigned[k..=start], before.direction_id);
                }
            }
            if let Some(after) = self.other_direction(direction_id, |d| d.first() == stop_ids[end]) {
                let mut bound = 0;
                let mut k = end;
                while k + 1 < stop_ids.len() && assigned[k + 1].is_empty() {
                    match after.index.get(stop_ids[k + 1]) {
                        Some(&i) if i > bound => {
                            bound = i;
                            k += 1;
                        }
                        _ => break,
                    }
                }
                if k > end {
                    assign(&mut assigned[end..=k], after.direction_id);
                }
            }
        }

        if assigned.iter().all(Vec::is_empty) && !stop_ids.is_empty() {
            let direction_id = self.best_direction(trip_id, stop_ids)?;
            assign(&mut assigned, direction_id);
        }

        if let Some(position) = assigned.iter().position(Vec::is_empty) {
            return Err(SplitError::UnassignedStop {
                route_id: self.route_id,
                trip_id: trip_id.to_string(),
                stop_id: stop_ids[position].to_string(),
                position,
            });
        }
        Ok(assigned)
    }

    fn other_direction<P>(&self, direction_id: u8, predicate: P) -> Option<&DirectionSort>
    where
        P: Fn(&DirectionSort) -> bool,
    {
        self.directions
            .iter()
            .find(|direction| direction.direction_id != direction_id && predicate(direction))
    }

    fn best_direction(&self, trip_id: &str, stop_ids: &[&str]) -> Result<u8, SplitError> {
        let mut scores = self
            .directions
            .iter()
            .map(|direction| (direction.ordered_matches(stop_ids), direction.direction_id))
            .collect::<Vec<_>>();
        scores.sort_by(|a, b| b.0.cmp(&a.0));
        match scores.as_slice() {
            [(best, _), (second, _), ..] if best == second && *best >= 2 => Err(SplitError::AmbiguousTrip {
                route_id: self.route_id,
                trip_id: trip_id.to_string(),
            }),
            [(best, direction_id), ..] if *best >= 2 => Ok(*direction_id),
            _ => Err(SplitError::UnassignedStop {
                route_id: self.route_id,
                trip_id: trip_id.to_string(),
                stop_id: stop_ids[0].to_string(),
                position: 0,
            }),
        }
    }
}

fn assign(stops: &mut [Vec<u8>], direction_id: u8) {
    for directions in stops {
        if !directions.contains(&direction_id) {
            directions.push(direction_id);
        }
    }
}
