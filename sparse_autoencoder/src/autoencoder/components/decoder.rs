use ndarray::{ArrayD, ArrayViewD};
use rand::Rng;

use crate::{
    Result,
    autoencoder::{Parameter, ResetOptimizerParameterDetails},
};

/// A decoder maps learnt activations `(batch, component?, learnt_features)` back to the input
/// space `(batch, component?, decoded_features)`.
pub trait Decoder {
    fn learnt_features(&self) -> usize;

    fn decoded_features(&self) -> usize;

    fn n_components(&self) -> Option<usize>;

    /// The weight, `(component?, decoded_features, learnt_features)`. Each column is a dictionary
    /// vector.
    fn weight(&self) -> &Parameter;

    /// The bias, `(component?, decoded_features)`, absent when the decoder relies on a tied
    /// outer bias.
    fn bias(&self) -> Option<&Parameter>;

    /// Returns the parameters and axes whose optimizer state must be zeroed when a dictionary
    /// vector of this decoder is reinitialized.
    fn reset_optimizer_parameter_details(&self) -> Vec<ResetOptimizerParameterDetails>;

    /// Reconstructs activations from learnt features.
    ///
    /// # Arguments
    /// * `learnt` - The learnt activations, `(batch, component?, learnt_features)`.
    ///
    /// # Returns
    /// The decoded activations or an error if the input's shape disagrees with this decoder.
    fn forward(&self, learnt: ArrayViewD<'_, f32>) -> Result<ArrayD<f32>>;

    /// Reinitializes every parameter in place, shapes are kept.
    fn reset_parameters<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<()>;

    /// Mutable access to every parameter, for optimizers and resampling routines.
    fn parameters_mut(&mut self) -> Vec<&mut Parameter>;
}
