use std::iter;
use std::str::FromStr;

use chrono_tz::Tz;

use crate::gtfs::table::{self, FieldError, Fields};

// Agencies is the content of agency.txt, in file order.
pub struct Agencies {
    pub agencies: Vec<Agency>,
}

impl From<Vec<Agency>> for Agencies {
    fn from(agencies: Vec<Agency>) -> Self {
        Agencies { agencies }
    }
}

impl<'a> iter::IntoIterator for &'a Agencies {
    type Item = &'a Agency;
    type IntoIter = std::slice::Iter<'a, Agency>;

    fn into_iter(self) -> Self::IntoIter {
        self.agencies.iter()
    }
}

impl Agencies {
    // GTFS requires every agency of a feed to share one timezone.
    pub fn timezone(&self) -> Option<Tz> {
        self.agencies.first().map(|agency| agency.agency_timezone)
    }
}

#[derive(Debug, Clone)]
pub struct Agency {
    pub agency_id: Option<String>,
    pub agency_name: String,
    pub agency_url: Option<String>,
    pub agency_timezone: Tz,
}

impl TryFrom<&Fields> for Agency {
    type Error = FieldError;

    fn try_from(fields: &Fields) -> Result<Self, Self::Error> {
        let timezone = table::required(fields, "agency_timezone")?;
        Ok(Agency {
            agency_id: table::optional(fields, "agency_id"),
            agency_name: table::required(fields, "agency_name")?,
            agency_url: table::optional(fields, "agency_url"),
            agency_timezone: Tz::from_str(&timezone)
                .map_err(|e| FieldError::invalid("agency_timezone", &timezone, e))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> Fields {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_agency_timezone() {
        let agency = Agency::try_from(&fields(&[
            ("agency_id", "14"),
            ("agency_name", "Campbell River Transit System"),
            ("agency_timezone", "America/Vancouver"),
        ]))
        .unwrap();
        assert_eq!(agency.agency_timezone, chrono_tz::America::Vancouver);
        assert_eq!(agency.agency_id.as_deref(), Some("14"));
    }

    #[test]
    fn test_agency_bad_timezone() {
        let result = Agency::try_from(&fields(&[("agency_name", "x"), ("agency_timezone", "Mars/Olympus")]));
        assert!(matches!(result, Err(FieldError::Invalid { field: "agency_timezone", .. })));
    }
}
