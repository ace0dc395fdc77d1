use ndarray::{ArrayD, ArrayViewD};

use super::TiedBiasPosition;
use crate::{Result, autoencoder::Parameter};

/// A bias applied outside of the encoder and decoder, without a learnt forward pass of its own.
pub trait OuterBias {
    /// The bias, `(component?, input_features)`.
    fn bias(&self) -> &Parameter;

    fn position(&self) -> TiedBiasPosition;

    /// Applies the bias to `x`, `(batch, component?, input_features)`.
    fn apply(&self, x: ArrayViewD<'_, f32>) -> Result<ArrayD<f32>>;
}
