use std::fmt::{self, Display};

use log::debug;
use ndarray::{ArrayD, ArrayViewD, IxDyn};
use rand::Rng;

use super::{Decoder, linear};
use crate::{
    Result,
    autoencoder::{Parameter, ResetOptimizerParameterDetails},
    initialization, tensor_shape,
};

/// Whether the decoder owns a bias or relies on the autoencoder's tied outer bias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecoderBias {
    #[default]
    Tied,
    Untied,
}

/// A linear layer without activation, used as the decoder of a sparse autoencoder.
///
/// ```text
/// W_d ∈ R^{n×m}, b_d ∈ R^n (untied only)
/// x̂ = f W_dᵀ + b_d
/// ```
#[derive(Debug)]
pub struct LinearDecoder {
    learnt_features: usize,
    decoded_features: usize,
    n_components: Option<usize>,
    weight: Parameter,
    bias: Option<Parameter>,
}

impl LinearDecoder {
    /// Creates a new `LinearDecoder` with freshly initialized parameters.
    ///
    /// # Arguments
    /// * `learnt_features` - The amount of learnt features in the autoencoder.
    /// * `decoded_features` - The amount of features reconstructed, the autoencoder's input size.
    /// * `n_components` - The amount of source model components the autoencoder is trained on.
    /// * `bias` - Whether the decoder owns a bias.
    /// * `rng` - A random number generator.
    ///
    /// # Returns
    /// A new `LinearDecoder` or an error if any size is zero.
    pub fn new<R: Rng + ?Sized>(
        learnt_features: usize,
        decoded_features: usize,
        n_components: Option<usize>,
        bias: DecoderBias,
        rng: &mut R,
    ) -> Result<Self> {
        let weight_shape = tensor_shape::shape_with_optional_dimensions(
            n_components,
            &[decoded_features, learnt_features],
        )?;

        let bias = match bias {
            DecoderBias::Tied => None,
            DecoderBias::Untied => {
                let shape =
                    tensor_shape::shape_with_optional_dimensions(n_components, &[decoded_features])?;
                Some(Parameter::new(ArrayD::zeros(IxDyn(&shape))))
            }
        };

        let mut decoder = Self {
            learnt_features,
            decoded_features,
            n_components,
            weight: Parameter::new(ArrayD::zeros(IxDyn(&weight_shape))),
            bias,
        };

        decoder.reset_parameters(rng)?;
        Ok(decoder)
    }
}

impl Decoder for LinearDecoder {
    fn learnt_features(&self) -> usize {
        self.learnt_features
    }

    fn decoded_features(&self) -> usize {
        self.decoded_features
    }

    fn n_components(&self) -> Option<usize> {
        self.n_components
    }

    fn weight(&self) -> &Parameter {
        &self.weight
    }

    fn bias(&self) -> Option<&Parameter> {
        self.bias.as_ref()
    }

    /// A learnt feature lives in a column of the weight. The bias is indexed by decoded features,
    /// so it is never part of a feature reset.
    fn reset_optimizer_parameter_details(&self) -> Vec<ResetOptimizerParameterDetails> {
        vec![ResetOptimizerParameterDetails::new(&self.weight, -1)]
    }

    fn forward(&self, learnt: ArrayViewD<'_, f32>) -> Result<ArrayD<f32>> {
        tensor_shape::validate_activation(
            "decoder input",
            learnt.shape(),
            self.n_components,
            self.learnt_features,
        )?;

        linear::project(
            learnt,
            self.weight.view(),
            self.bias.as_ref().map(Parameter::view),
        )
    }

    fn reset_parameters<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<()> {
        let fan_in = initialization::fan_in(self.weight.shape());
        let weight = initialization::linear_uniform(self.weight.shape(), fan_in, rng)?;
        self.weight.assign(weight.view())?;

        if let Some(bias) = &mut self.bias {
            let values = initialization::linear_uniform(bias.shape(), fan_in, rng)?;
            bias.assign(values.view())?;
        }

        debug!(fan_in = fan_in; "reset decoder parameters ({})", self);
        Ok(())
    }

    fn parameters_mut(&mut self) -> Vec<&mut Parameter> {
        let mut params = vec![&mut self.weight];
        params.extend(self.bias.as_mut());
        params
    }
}

impl Display for LinearDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "learnt_features={}, decoded_features={}, n_components={:?}, untied_bias={}",
            self.learnt_features,
            self.decoded_features,
            self.n_components,
            self.bias.is_some()
        )
    }
}
