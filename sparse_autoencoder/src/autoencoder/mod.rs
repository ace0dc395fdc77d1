mod abstract_autoencoder;
pub mod components;
mod model;
mod types;

pub use abstract_autoencoder::{Autoencoder, ForwardPassResult};
pub use model::{OuterBiasMode, SparseAutoencoder, SparseAutoencoderConfig};
pub use types::{ParamId, Parameter, ResetOptimizerParameterDetails};
