use ndarray::{ArrayD, ArrayViewD};
use rand::Rng;

use super::{
    ResetOptimizerParameterDetails,
    components::{Decoder, Encoder, OuterBias},
};
use crate::Result;

/// The output of an autoencoder's forward pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardPassResult {
    learned_activations: ArrayD<f32>,
    decoded_activations: ArrayD<f32>,
}

impl ForwardPassResult {
    /// Creates a new `ForwardPassResult`.
    ///
    /// # Arguments
    /// * `learned_activations` - `(batch, component?, learnt_features)`.
    /// * `decoded_activations` - `(batch, component?, input_features)`.
    pub fn new(learned_activations: ArrayD<f32>, decoded_activations: ArrayD<f32>) -> Self {
        Self {
            learned_activations,
            decoded_activations,
        }
    }

    pub fn learned_activations(&self) -> ArrayViewD<'_, f32> {
        self.learned_activations.view()
    }

    pub fn decoded_activations(&self) -> ArrayViewD<'_, f32> {
        self.decoded_activations.view()
    }

    /// Consumes the result, returning `(learned_activations, decoded_activations)`.
    pub fn into_parts(self) -> (ArrayD<f32>, ArrayD<f32>) {
        (self.learned_activations, self.decoded_activations)
    }
}

/// A sparse autoencoder composed of an encoder, a decoder and two outer biases.
///
/// Every component supports an optional component axis. Parameters carry it first, activations
/// carry it right after the batch axis.
pub trait Autoencoder {
    type Encoder: Encoder;
    type Decoder: Decoder;
    type OuterBias<'a>: OuterBias
    where
        Self: 'a;

    fn encoder(&self) -> &Self::Encoder;

    fn decoder(&self) -> &Self::Decoder;

    fn pre_encoder_bias(&self) -> Self::OuterBias<'_>;

    fn post_decoder_bias(&self) -> Self::OuterBias<'_>;

    /// Returns the parameters and axes whose optimizer state must be zeroed when dictionary
    /// vectors are reinitialized.
    ///
    /// Outer biases are assumed fixed here. Implementors whose outer biases are trained must
    /// override this method to include them.
    fn reset_optimizer_parameter_details(&self) -> Vec<ResetOptimizerParameterDetails> {
        let mut details = self.encoder().reset_optimizer_parameter_details();
        details.extend(self.decoder().reset_optimizer_parameter_details());
        details
    }

    /// Makes a forward pass through the autoencoder.
    ///
    /// # Arguments
    /// * `x` - Source activations, `(batch, component?, input_features)`.
    ///
    /// # Returns
    /// The learnt and decoded activations, or an error if `x` disagrees with the configured shapes.
    fn forward(&self, x: ArrayViewD<'_, f32>) -> Result<ForwardPassResult>;

    /// Reinitializes every component, shapes are kept.
    fn reset_parameters<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<()>;
}
