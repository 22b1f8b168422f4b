use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::gtfs::calendar::GtfsDate;
use crate::mt::{hex, GeneratedSpec};

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to create {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("Failed to write {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },
}

pub const AGENCY_FILE: &str = "gtfs_rts_agency";
pub const ROUTES_FILE: &str = "gtfs_rts_routes";
pub const TRIPS_FILE: &str = "gtfs_rts_trips";
pub const STOPS_FILE: &str = "gtfs_rts_stops";
pub const TRIP_STOPS_FILE: &str = "gtfs_rts_trip_stops";
pub const SERVICE_DATES_FILE: &str = "gtfs_schedule_service_dates";

// write_all writes every generated file into out_dir, each name prefixed
// with file_prefix. Files are header-less csv.
pub fn write_all(spec: &GeneratedSpec, out_dir: &Path, file_prefix: &str) -> Result<Vec<PathBuf>, OutputError> {
    fs::create_dir_all(out_dir).map_err(|source| OutputError::Io {
        path: out_dir.to_path_buf(),
        source,
    })?;
    let path = |name: &str| out_dir.join(format!("{}{}", file_prefix, name));

    let written = vec![
        write_rows(
            path(AGENCY_FILE),
            std::iter::once(vec![
                spec.agency.id.clone(),
                spec.agency.timezone.clone(),
                hex(spec.agency.color),
                spec.agency.route_type.code().to_string(),
            ]),
        )?,
        write_rows(
            path(ROUTES_FILE),
            spec.routes.iter().map(|route| {
                vec![
                    route.id.to_string(),
                    route.short_name.clone(),
                    route.long_name.clone(),
                    route.color.map(hex).unwrap_or_default(),
                ]
            }),
        )?,
        write_rows(
            path(TRIPS_FILE),
            spec.trips.iter().map(|trip| {
                vec![
                    trip.id().to_string(),
                    trip.headsign_id.to_string(),
                    trip.headsign.clone(),
                    trip.route_id.to_string(),
                ]
            }),
        )?,
        write_rows(
            path(STOPS_FILE),
            spec.stops.iter().map(|stop| {
                vec![
                    stop.id.clone(),
                    stop.code.clone(),
                    stop.name.clone(),
                    format!("{:.6}", stop.lat),
                    format!("{:.6}", stop.lon),
                ]
            }),
        )?,
        write_rows(
            path(TRIP_STOPS_FILE),
            spec.trip_stops.iter().map(|trip_stop| {
                vec![
                    trip_stop.trip_id.to_string(),
                    trip_stop.stop_id.clone(),
                    trip_stop.stop_sequence.to_string(),
                ]
            }),
        )?,
        write_rows(
            path(SERVICE_DATES_FILE),
            spec.service_dates
                .iter()
                .map(|service_date| vec![service_date.service_id.clone(), GtfsDate(service_date.date).to_string()]),
        )?,
    ];

    for path in &written {
        tracing::debug!("wrote {}", path.display());
    }
    Ok(written)
}

fn write_rows<I>(path: PathBuf, rows: I) -> Result<PathBuf, OutputError>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(&path)
        .map_err(|source| OutputError::Csv {
            path: path.clone(),
            source,
        })?;
    for row in rows {
        writer.write_record(&row).map_err(|source| OutputError::Csv {
            path: path.clone(),
            source,
        })?;
    }
    writer.flush().map_err(|source| OutputError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}
