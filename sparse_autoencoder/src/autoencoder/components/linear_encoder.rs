use std::fmt::{self, Display};

use log::debug;
use ndarray::{ArrayD, ArrayViewD, IxDyn};
use rand::Rng;

use super::{Encoder, linear};
use crate::{
    Result,
    autoencoder::{Parameter, ResetOptimizerParameterDetails},
    initialization, tensor_shape,
};

/// A linear layer followed by a ReLU, used as the encoder of a sparse autoencoder (excluding any
/// outer tied bias).
///
/// With `m` learnt features, `n` input features and `x̄` the input after the tied bias:
///
/// ```text
/// W_e ∈ R^{m×n}, b_e ∈ R^m
/// f = ReLU(x̄ W_eᵀ + b_e)
/// ```
#[derive(Debug)]
pub struct LinearEncoder {
    input_features: usize,
    learnt_features: usize,
    n_components: Option<usize>,
    weight: Parameter,
    bias: Parameter,
}

impl LinearEncoder {
    /// Creates a new `LinearEncoder` with freshly initialized parameters.
    ///
    /// # Arguments
    /// * `input_features` - The amount of input features to the autoencoder.
    /// * `learnt_features` - The amount of learnt features in the autoencoder.
    /// * `n_components` - The amount of source model components the autoencoder is trained on.
    /// * `rng` - A random number generator.
    ///
    /// # Returns
    /// A new `LinearEncoder` or an error if any size is zero.
    pub fn new<R: Rng + ?Sized>(
        input_features: usize,
        learnt_features: usize,
        n_components: Option<usize>,
        rng: &mut R,
    ) -> Result<Self> {
        let weight_shape = tensor_shape::shape_with_optional_dimensions(
            n_components,
            &[learnt_features, input_features],
        )?;
        let bias_shape =
            tensor_shape::shape_with_optional_dimensions(n_components, &[learnt_features])?;

        let mut encoder = Self {
            input_features,
            learnt_features,
            n_components,
            weight: Parameter::new(ArrayD::zeros(IxDyn(&weight_shape))),
            bias: Parameter::new(ArrayD::zeros(IxDyn(&bias_shape))),
        };

        encoder.reset_parameters(rng)?;
        Ok(encoder)
    }
}

impl Encoder for LinearEncoder {
    fn input_features(&self) -> usize {
        self.input_features
    }

    fn learnt_features(&self) -> usize {
        self.learnt_features
    }

    fn n_components(&self) -> Option<usize> {
        self.n_components
    }

    fn weight(&self) -> &Parameter {
        &self.weight
    }

    fn bias(&self) -> &Parameter {
        &self.bias
    }

    /// A learnt feature lives in a row of the weight and in a single entry of the bias.
    fn reset_optimizer_parameter_details(&self) -> Vec<ResetOptimizerParameterDetails> {
        vec![
            ResetOptimizerParameterDetails::new(&self.weight, -2),
            ResetOptimizerParameterDetails::new(&self.bias, -1),
        ]
    }

    fn forward(&self, x: ArrayViewD<'_, f32>) -> Result<ArrayD<f32>> {
        tensor_shape::validate_activation(
            "encoder input",
            x.shape(),
            self.n_components,
            self.input_features,
        )?;

        let mut z = linear::project(x, self.weight.view(), Some(self.bias.view()))?;
        z.mapv_inplace(|z| z.max(0.));
        Ok(z)
    }

    /// Fan-in is taken per component, so unlike a batched `kaiming_uniform_` over the whole
    /// `(component, learnt, input)` tensor a component axis never changes the bounds.
    fn reset_parameters<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<()> {
        // NOTE: the weight's gain assumes a ReLU, it must change along with the activation.
        let fan_in = initialization::fan_in(self.weight.shape());
        let weight = initialization::kaiming_uniform(self.weight.shape(), fan_in, rng)?;
        let bias = initialization::linear_uniform(self.bias.shape(), fan_in, rng)?;

        self.weight.assign(weight.view())?;
        self.bias.assign(bias.view())?;

        debug!(fan_in = fan_in; "reset encoder parameters ({})", self);
        Ok(())
    }

    fn parameters_mut(&mut self) -> Vec<&mut Parameter> {
        vec![&mut self.weight, &mut self.bias]
    }
}

impl Display for LinearEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "input_features={}, learnt_features={}, n_components={:?}",
            self.input_features, self.learnt_features, self.n_components
        )
    }
}
