use std::path::PathBuf;

/// Errors raised by the touch test core.
///
/// None of these are fatal to a session: a failed spawn skips one spawn tick
/// and a failed export leaves the in-memory log intact for a retry.
#[derive(thiserror::Error, Debug)]
pub enum TouchError {
    #[error("zone of size {zone_size} cannot fit targets of radius {margin}")]
    ZoneTooSmall { zone_size: f64, margin: f64 },

    #[error("csv serialization failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("export is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TouchError>;
