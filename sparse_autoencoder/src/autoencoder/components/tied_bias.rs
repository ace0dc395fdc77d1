use ndarray::{ArrayD, ArrayViewD};

use super::OuterBias;
use crate::{Result, SaeErr, autoencoder::Parameter};

/// Where a tied bias is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TiedBiasPosition {
    /// Subtracted from the input before the encoder.
    PreEncoder,
    /// Added to the decoder's output.
    PostDecoder,
}

/// A view over a bias parameter shared by both ends of an autoencoder.
///
/// Both positions borrow the same parameter, so tying needs no shared ownership.
#[derive(Debug, Clone, Copy)]
pub struct TiedBias<'a> {
    bias: &'a Parameter,
    position: TiedBiasPosition,
}

impl<'a> TiedBias<'a> {
    /// Creates a new `TiedBias`.
    ///
    /// # Arguments
    /// * `bias` - The shared bias, `(component?, input_features)`.
    /// * `position` - Where the bias is applied.
    pub fn new(bias: &'a Parameter, position: TiedBiasPosition) -> Self {
        Self { bias, position }
    }
}

impl OuterBias for TiedBias<'_> {
    fn bias(&self) -> &Parameter {
        self.bias
    }

    fn position(&self) -> TiedBiasPosition {
        self.position
    }

    fn apply(&self, x: ArrayViewD<'_, f32>) -> Result<ArrayD<f32>> {
        let bias = self.bias.view();

        // x is (batch, component?, features) and the bias is (component?, features)
        if x.ndim() != bias.ndim() + 1 {
            return Err(SaeErr::RankMismatch {
                what: "tied bias input",
                got: x.ndim(),
                expected: bias.ndim() + 1,
            });
        }

        if let Some((&got, &expected)) = x.shape()[1..]
            .iter()
            .zip(bias.shape())
            .find(|(got, expected)| got != expected)
        {
            return Err(SaeErr::ShapeMismatch {
                what: "tied bias input",
                got,
                expected,
            });
        }

        let y = match self.position {
            TiedBiasPosition::PreEncoder => &x - &bias,
            TiedBiasPosition::PostDecoder => &x + &bias,
        };

        Ok(y)
    }
}
