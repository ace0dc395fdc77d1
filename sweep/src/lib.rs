//! The hyperparameter search space of a sparse autoencoder training sweep, serialized for an
//! external sweep service.

mod config;
pub mod error;
mod parameter;

pub use config::{Goal, Method, Metric, SweepConfig, SweepParameterConfig};
pub use error::{Result, SweepErr};
pub use parameter::Parameter;
