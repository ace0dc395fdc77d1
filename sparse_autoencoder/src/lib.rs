pub mod autoencoder;
pub mod error;
pub mod initialization;
pub mod loss;
pub mod optimization;
pub mod stats;
pub mod tensor_shape;

pub use error::{Result, SaeErr};
