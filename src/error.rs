use std::fmt::{self, Display};
use std::io;

/// Provides `VaxError` and maps to other errors to
/// convert to a `VaxError`
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum VaxError {
    IoError(io::Error),
    JsonError(serde_json::Error),
    CSVError(csv::Error),
    /// A friendship, preference or candidate record that cannot be interpreted.
    MalformedRecord(String),
    /// A parameter value outside of its admissible range.
    InvalidParameter(String),
    ReportError(String),
    VaxError(String),
}

impl From<io::Error> for VaxError {
    fn from(error: io::Error) -> Self {
        VaxError::IoError(error)
    }
}

impl From<serde_json::Error> for VaxError {
    fn from(error: serde_json::Error) -> Self {
        VaxError::JsonError(error)
    }
}

impl From<csv::Error> for VaxError {
    fn from(error: csv::Error) -> Self {
        VaxError::CSVError(error)
    }
}

impl From<String> for VaxError {
    fn from(error: String) -> Self {
        VaxError::VaxError(error)
    }
}

impl From<&str> for VaxError {
    fn from(error: &str) -> Self {
        VaxError::VaxError(error.to_string())
    }
}

impl std::error::Error for VaxError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VaxError::IoError(error) => Some(error),
            VaxError::JsonError(error) => Some(error),
            VaxError::CSVError(error) => Some(error),
            _ => None,
        }
    }
}

impl Display for VaxError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            VaxError::MalformedRecord(msg) => write!(f, "Error: malformed record: {msg}"),
            VaxError::InvalidParameter(msg) => write!(f, "Error: invalid parameter: {msg}"),
            VaxError::ReportError(msg) => write!(f, "Error: report: {msg}"),
            VaxError::VaxError(msg) => write!(f, "Error: {msg}"),
            _ => write!(f, "Error: {self:?}"),
        }
    }
}
