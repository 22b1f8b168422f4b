use std::collections::HashMap;
use std::fmt;
use std::io;
use std::iter;
use std::str::FromStr;

use thiserror::Error;

use crate::gtfs::GtfsLoadError;

// Fields is one csv record, keyed by the names in the file's header row.
pub type Fields = HashMap<String, String>;

// FieldError is an error that occurs when building a record from its fields.
#[derive(Debug, Error, PartialEq)]
pub enum FieldError {
    #[error("{0} is required")]
    Required(&'static str),
    #[error("invalid {field} '{value}': {reason}")]
    Invalid {
        field: &'static str,
        value: String,
        reason: String,
    },
}

impl FieldError {
    pub fn invalid(field: &'static str, value: &str, reason: impl fmt::Display) -> Self {
        FieldError::Invalid {
            field,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

// load_records consumes a csv::Reader<R> and builds one T per record.
// Each record is zipped with the header into a Fields map before conversion,
// so column order in the file does not matter.
pub fn load_records<R, T>(file: &'static str, mut r: csv::Reader<R>) -> Result<Vec<T>, GtfsLoadError>
where
    R: io::Read,
    T: for<'a> TryFrom<&'a Fields, Error = FieldError>,
{
    let header = r
        .headers()
        .cloned()
        .map_err(|_| GtfsLoadError::NoHeader { file })?;
    let names = header
        .iter()
        .map(|s| s.trim_start_matches('\u{feff}').trim().to_string())
        .collect::<Vec<_>>();

    r.into_records()
        .enumerate()
        .map(|(i, record_result)| {
            let record = record_result.map_err(|source| GtfsLoadError::Csv { file, source })?;
            let fields = iter::zip(names.iter().cloned(), record.iter().map(|s| s.trim().to_string()))
                .collect::<Fields>();
            // line numbers are 1-based and the header takes the first line
            T::try_from(&fields).map_err(|source| GtfsLoadError::Record {
                file,
                line: i + 2,
                source,
            })
        })
        .collect()
}

// optional returns the value of a field, treating empty cells as absent.
pub fn optional(fields: &Fields, name: &str) -> Option<String> {
    fields.get(name).filter(|s| !s.is_empty()).cloned()
}

pub fn required(fields: &Fields, name: &'static str) -> Result<String, FieldError> {
    optional(fields, name).ok_or(FieldError::Required(name))
}

pub fn parse_optional<T>(fields: &Fields, name: &'static str) -> Result<Option<T>, FieldError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    fields
        .get(name)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<T>().map_err(|e| FieldError::invalid(name, s, e)))
        .transpose()
}

pub fn parse_required<T>(fields: &Fields, name: &'static str) -> Result<T, FieldError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    parse_optional(fields, name)?.ok_or(FieldError::Required(name))
}

// parse_flag reads the GTFS tri-state "0 = unknown, 1 = yes, 2 = no" columns.
pub fn parse_flag(fields: &Fields, name: &'static str) -> Result<Option<bool>, FieldError> {
    match fields.get(name).map(|s| s.as_str()) {
        None | Some("") | Some("0") => Ok(None),
        Some("1") => Ok(Some(true)),
        Some("2") => Ok(Some(false)),
        Some(s) => Err(FieldError::invalid(name, s, "expected 0, 1 or 2")),
    }
}
