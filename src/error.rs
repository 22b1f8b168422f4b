use thiserror::Error;

use crate::fetch::FetchError;
use crate::gtfs::GtfsLoadError;
use crate::mt::output::OutputError;
use crate::tools::split::SplitError;

// AgencyError is raised by agency callbacks. A Fatal error means the feed
// contains something the agency rules do not expect and the run must stop.
#[derive(Debug, Error)]
pub enum AgencyError {
    #[error("{0}")]
    Fatal(String),
    #[error(transparent)]
    Split(#[from] SplitError),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Load(#[from] GtfsLoadError),
    #[error(transparent)]
    Agency(#[from] AgencyError),
    #[error(transparent)]
    Output(#[from] OutputError),
}
