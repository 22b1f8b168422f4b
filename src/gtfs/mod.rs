pub mod agencies;
pub mod calendar;
pub mod routes;
pub mod stop_times;
pub mod stops;
pub mod table;
pub mod trips;

use std::fmt;
use std::io;

use thiserror::Error;
use zip::result::ZipError;

use table::{FieldError, Fields};

pub struct GtfsSchedule {
    pub agencies: agencies::Agencies,
    pub routes: routes::Routes,
    pub trips: trips::Trips,
    pub stops: stops::Stops,
    pub stop_times: stop_times::StopTimes,
    pub calendars: Vec<calendar::Calendar>,
    pub calendar_dates: Vec<calendar::CalendarDate>,
}

#[derive(Debug, Error)]
pub enum GtfsLoadError {
    #[error("Failed to read archive: {0}")]
    Archive(ZipError),
    #[error("Failed to open {file}: {source}")]
    Open { file: &'static str, source: ZipError },
    #[error("No header found in {file}")]
    NoHeader { file: &'static str },
    #[error("Error reading {file}: {source}")]
    Csv { file: &'static str, source: csv::Error },
    #[error("Error loading {file} line {line}: {source}")]
    Record {
        file: &'static str,
        line: usize,
        source: FieldError,
    },
}

impl GtfsSchedule {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, GtfsLoadError> {
        let archive = zip::ZipArchive::new(io::Cursor::new(bytes)).map_err(GtfsLoadError::Archive)?;
        Self::try_from(archive)
    }
}

impl fmt::Display for GtfsSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} agencies, {} routes, {} trips, {} stops, {} stop times, {} calendars, {} calendar dates",
            self.agencies.agencies.len(),
            self.routes.routes.len(),
            self.trips.trips.len(),
            self.stops.stops.len(),
            self.stop_times.iter().count(),
            self.calendars.len(),
            self.calendar_dates.len(),
        )
    }
}

impl<R: io::Read + io::Seek> TryFrom<zip::ZipArchive<R>> for GtfsSchedule {
    type Error = GtfsLoadError;

    fn try_from(mut archive: zip::ZipArchive<R>) -> Result<Self, Self::Error> {
        let agencies = read_file(&mut archive, "agency.txt")?;
        tracing::debug!("loaded {} agencies", agencies.len());
        let routes = read_file(&mut archive, "routes.txt")?;
        tracing::debug!("loaded {} routes", routes.len());
        let trips = read_file(&mut archive, "trips.txt")?;
        tracing::debug!("loaded {} trips", trips.len());
        let stops = read_file(&mut archive, "stops.txt")?;
        tracing::debug!("loaded {} stops", stops.len());
        let stop_times = read_file(&mut archive, "stop_times.txt")?;
        tracing::debug!("loaded {} stop times", stop_times.len());
        // a feed needs at least one of the calendar files, but either may be missing
        let calendars = read_optional_file(&mut archive, "calendar.txt")?;
        let calendar_dates = read_optional_file(&mut archive, "calendar_dates.txt")?;
        tracing::debug!(
            "loaded {} calendars and {} calendar dates",
            calendars.len(),
            calendar_dates.len()
        );

        Ok(Self {
            agencies: agencies::Agencies::from(agencies),
            routes: routes::Routes::from(routes),
            trips: trips::Trips::from(trips),
            stops: stops::Stops::from(stops),
            stop_times: stop_times::StopTimes::from(stop_times),
            calendars,
            calendar_dates,
        })
    }
}

fn csv_reader<R: io::Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new().flexible(true).from_reader(reader)
}

fn read_file<R, T>(archive: &mut zip::ZipArchive<R>, file: &'static str) -> Result<Vec<T>, GtfsLoadError>
where
    R: io::Read + io::Seek,
    T: for<'a> TryFrom<&'a Fields, Error = FieldError>,
{
    let reader = archive
        .by_name(file)
        .map_err(|source| GtfsLoadError::Open { file, source })?;
    table::load_records(file, csv_reader(reader))
}

fn read_optional_file<R, T>(archive: &mut zip::ZipArchive<R>, file: &'static str) -> Result<Vec<T>, GtfsLoadError>
where
    R: io::Read + io::Seek,
    T: for<'a> TryFrom<&'a Fields, Error = FieldError>,
{
    match archive.by_name(file) {
        Ok(reader) => table::load_records(file, csv_reader(reader)),
        Err(ZipError::FileNotFound) => Ok(Vec::new()),
        Err(source) => Err(GtfsLoadError::Open { file, source }),
    }
}
