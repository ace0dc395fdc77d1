use ndarray::{ArrayD, ArrayViewD};
use rand::Rng;

use crate::{
    Result,
    autoencoder::{Parameter, ResetOptimizerParameterDetails},
};

/// An encoder maps input activations `(batch, component?, input_features)` to learnt activations
/// `(batch, component?, learnt_features)`.
pub trait Encoder {
    fn input_features(&self) -> usize;

    fn learnt_features(&self) -> usize;

    fn n_components(&self) -> Option<usize>;

    /// The weight, `(component?, learnt_features, input_features)`. Each row is a dictionary
    /// vector.
    fn weight(&self) -> &Parameter;

    /// The bias, `(component?, learnt_features)`.
    fn bias(&self) -> &Parameter;

    /// Returns the parameters and axes whose optimizer state must be zeroed when a dictionary
    /// vector of this encoder is reinitialized.
    fn reset_optimizer_parameter_details(&self) -> Vec<ResetOptimizerParameterDetails>;

    /// Computes the learnt activations for the given input.
    ///
    /// # Arguments
    /// * `x` - The input, `(batch, component?, input_features)`.
    ///
    /// # Returns
    /// The learnt activations or an error if the input's shape disagrees with this encoder.
    fn forward(&self, x: ArrayViewD<'_, f32>) -> Result<ArrayD<f32>>;

    /// Reinitializes every parameter in place, shapes are kept.
    fn reset_parameters<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<()>;

    /// Mutable access to every parameter, for optimizers and resampling routines.
    fn parameters_mut(&mut self) -> Vec<&mut Parameter>;
}
