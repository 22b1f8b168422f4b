use std::fs;
use std::io;
use std::path::PathBuf;

use curl::easy::Easy;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to download archive: {0}")]
    Curl(#[from] curl::Error),
    #[error("Failed to download {url}: HTTP {code}")]
    Status { url: String, code: u32 },
    #[error("Failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
}

fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

// load_archive returns the raw bytes of a GTFS zip, downloading it first
// when the location is an http(s) URL.
pub fn load_archive(location: &str) -> Result<Vec<u8>, FetchError> {
    if !is_remote(location) {
        let path = PathBuf::from(location);
        return fs::read(&path).map_err(|source| FetchError::Read { path, source });
    }

    let mut buf = Vec::new();
    let mut easy = Easy::new();
    easy.url(location)?;
    easy.get(true)?;
    easy.follow_location(true)?;
    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            buf.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()?;
    }

    match easy.response_code()? {
        200 => {
            tracing::info!("downloaded {} bytes from {}", buf.len(), location);
            Ok(buf)
        }
        code => Err(FetchError::Status {
            url: location.to_string(),
            code,
        }),
    }
}
