use std::{
    error::Error,
    fmt::{self, Display},
};

use ndarray::ShapeError;
use rand_distr::uniform::Error as UniformError;

use crate::autoencoder::ParamId;

/// The result type used in the entire sparse autoencoder crate.
pub type Result<T> = std::result::Result<T, SaeErr>;

/// The sparse autoencoder crate's error type.
#[derive(Debug)]
pub enum SaeErr {
    /// A configured size was zero.
    InvalidSize { what: &'static str, got: usize },
    /// The size of an axis disagrees with the configured one.
    ShapeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    /// A tensor has the wrong amount of axes.
    RankMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    /// The presence or size of the component axis disagrees with the configured one.
    ComponentMismatch {
        got: Option<usize>,
        expected: Option<usize>,
    },
    /// An optimizer was handed a parameter it holds no state for.
    UnknownParameter(ParamId),
    /// An index fell outside of the axis it addresses.
    IndexOutOfBounds {
        what: &'static str,
        index: usize,
        len: usize,
    },
    /// A sampling distribution could not be built.
    InvalidDistribution(String),
    /// A statistic was requested over an empty sample.
    EmptySample,
    /// An ndarray layout conversion failed.
    Layout(ShapeError),
}

impl Display for SaeErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaeErr::InvalidSize { what, got } => {
                write!(f, "{what} must be a positive integer, got {got}")
            }
            SaeErr::ShapeMismatch {
                what,
                got,
                expected,
            } => write!(
                f,
                "shape mismatch for {what}: got {got} features, expected {expected}"
            ),
            SaeErr::RankMismatch {
                what,
                got,
                expected,
            } => write!(f, "rank mismatch for {what}: got {got} axes, expected {expected}"),
            SaeErr::ComponentMismatch { got, expected } => write!(
                f,
                "component axis mismatch: got {}, expected {}",
                describe_components(*got),
                describe_components(*expected)
            ),
            SaeErr::UnknownParameter(id) => {
                write!(f, "the optimizer holds no state for parameter {id}")
            }
            SaeErr::IndexOutOfBounds { what, index, len } => {
                write!(f, "index {index} is out of bounds for {what} of length {len}")
            }
            SaeErr::InvalidDistribution(msg) => write!(f, "invalid distribution: {msg}"),
            SaeErr::EmptySample => write!(f, "cannot compute a statistic over an empty sample"),
            SaeErr::Layout(e) => write!(f, "layout error: {e}"),
        }
    }
}

fn describe_components(n: Option<usize>) -> String {
    match n {
        Some(n) => format!("{n} components"),
        None => "no component axis".to_string(),
    }
}

impl Error for SaeErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SaeErr::Layout(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ShapeError> for SaeErr {
    fn from(value: ShapeError) -> Self {
        Self::Layout(value)
    }
}

impl From<UniformError> for SaeErr {
    fn from(value: UniformError) -> Self {
        Self::InvalidDistribution(value.to_string())
    }
}
