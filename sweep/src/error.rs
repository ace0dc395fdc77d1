use std::{
    error::Error,
    fmt::{self, Display},
    io,
};

/// The result type used in the sweep crate.
pub type Result<T> = std::result::Result<T, SweepErr>;

/// The sweep crate's error type.
#[derive(Debug)]
pub enum SweepErr {
    /// The config is not valid JSON or does not follow the schema.
    Json(serde_json::Error),
    /// The config file could not be read or written.
    Io(io::Error),
    /// A parameter describes an empty or inverted search space.
    InvalidParameter {
        name: &'static str,
        reason: &'static str,
    },
}

impl Display for SweepErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SweepErr::Json(e) => write!(f, "invalid sweep config: {e}"),
            SweepErr::Io(e) => write!(f, "sweep config io error: {e}"),
            SweepErr::InvalidParameter { name, reason } => {
                write!(f, "invalid sweep parameter {name}: {reason}")
            }
        }
    }
}

impl Error for SweepErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SweepErr::Json(e) => Some(e),
            SweepErr::Io(e) => Some(e),
            SweepErr::InvalidParameter { .. } => None,
        }
    }
}

impl From<serde_json::Error> for SweepErr {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<io::Error> for SweepErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}
