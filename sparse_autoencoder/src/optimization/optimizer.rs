use ndarray::ArrayViewD;

use crate::{Result, autoencoder::Parameter};

/// Defines the strategy for updating parameters based on calculated gradients.
pub trait Optimizer {
    /// Updates a single parameter in place.
    ///
    /// # Arguments
    /// * `grad` - The gradient of the loss with respect to `param`.
    /// * `param` - The parameter to update.
    ///
    /// # Returns
    /// An error if the shapes of `grad` and `param` differ, or if the optimizer holds no state
    /// for `param`.
    fn update_param(&mut self, grad: ArrayViewD<'_, f32>, param: &mut Parameter) -> Result<()>;
}
