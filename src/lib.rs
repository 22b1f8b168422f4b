pub mod campbell_river;
pub mod cli;
pub mod error;
pub mod fetch;
pub mod generator;
pub mod gtfs;
pub mod logger;
pub mod mt;
pub mod tools;

pub use error::{AgencyError, Error};
