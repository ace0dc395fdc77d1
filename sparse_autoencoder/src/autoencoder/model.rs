use log::{debug, trace};
use ndarray::{ArrayD, ArrayViewD, Axis, Ix2, IxDyn};
use rand::Rng;

use super::{
    Autoencoder, ForwardPassResult, Parameter, ResetOptimizerParameterDetails,
    components::{
        Decoder, DecoderBias, Encoder, LinearDecoder, LinearEncoder, OuterBias, TiedBias,
        TiedBiasPosition,
    },
};
use crate::{Result, SaeErr, stats, tensor_shape};

/// Whether the tied outer bias is a fixed statistic or a trained parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OuterBiasMode {
    #[default]
    Fixed,
    Trainable,
}

/// The sizes and tying strategy of a `SparseAutoencoder`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SparseAutoencoderConfig {
    pub input_features: usize,
    pub learnt_features: usize,
    pub n_components: Option<usize>,
    pub outer_bias: OuterBiasMode,
    pub decoder_bias: DecoderBias,
}

impl SparseAutoencoderConfig {
    /// Creates a new `SparseAutoencoderConfig` with a fixed tied bias and no decoder bias.
    ///
    /// # Arguments
    /// * `input_features` - The size of the source activations.
    /// * `learnt_features` - The amount of learnt features.
    /// * `n_components` - The amount of independent autoencoders trained in parallel, if any.
    pub fn new(input_features: usize, learnt_features: usize, n_components: Option<usize>) -> Self {
        Self {
            input_features,
            learnt_features,
            n_components,
            outer_bias: OuterBiasMode::default(),
            decoder_bias: DecoderBias::default(),
        }
    }

    /// Creates a new `SparseAutoencoderConfig` whose learnt features are a multiple of its input.
    ///
    /// # Arguments
    /// * `input_features` - The size of the source activations.
    /// * `width_multiplier` - The ratio of learnt features to input features.
    /// * `n_components` - The amount of independent autoencoders trained in parallel, if any.
    ///
    /// # Returns
    /// The config or an error if either size is zero or the product overflows.
    pub fn from_width_multiplier(
        input_features: usize,
        width_multiplier: usize,
        n_components: Option<usize>,
    ) -> Result<Self> {
        if width_multiplier == 0 {
            return Err(SaeErr::InvalidSize {
                what: "width_multiplier",
                got: width_multiplier,
            });
        }

        let learnt_features =
            input_features
                .checked_mul(width_multiplier)
                .ok_or(SaeErr::InvalidSize {
                    what: "learnt_features",
                    got: usize::MAX,
                })?;

        Ok(Self::new(input_features, learnt_features, n_components))
    }

    pub fn with_outer_bias(self, outer_bias: OuterBiasMode) -> Self {
        Self { outer_bias, ..self }
    }

    pub fn with_decoder_bias(self, decoder_bias: DecoderBias) -> Self {
        Self {
            decoder_bias,
            ..self
        }
    }
}

/// A sparse autoencoder with a linear encoder, a linear decoder and a single bias tied between
/// the input and the output.
#[derive(Debug)]
pub struct SparseAutoencoder {
    config: SparseAutoencoderConfig,
    encoder: LinearEncoder,
    decoder: LinearDecoder,
    tied_bias: Parameter,
    /// The last statistic the tied bias was initialized with, restored on reset.
    tied_bias_init: Option<ArrayD<f32>>,
}

impl SparseAutoencoder {
    /// Creates a new `SparseAutoencoder` with freshly initialized parameters and a zero tied bias.
    ///
    /// # Arguments
    /// * `config` - The sizes and tying strategy.
    /// * `rng` - A random number generator.
    ///
    /// # Returns
    /// A new `SparseAutoencoder` or an error if any size is zero.
    pub fn new<R: Rng + ?Sized>(config: SparseAutoencoderConfig, rng: &mut R) -> Result<Self> {
        let SparseAutoencoderConfig {
            input_features,
            learnt_features,
            n_components,
            outer_bias,
            decoder_bias,
        } = config;

        let encoder = LinearEncoder::new(input_features, learnt_features, n_components, rng)?;
        let decoder =
            LinearDecoder::new(learnt_features, input_features, n_components, decoder_bias, rng)?;

        let bias_shape =
            tensor_shape::shape_with_optional_dimensions(n_components, &[input_features])?;
        let zeros = ArrayD::zeros(IxDyn(&bias_shape));
        let tied_bias = match outer_bias {
            OuterBiasMode::Fixed => Parameter::fixed(zeros),
            OuterBiasMode::Trainable => Parameter::new(zeros),
        };

        debug!("built sparse autoencoder: {config:?}");

        Ok(Self {
            config,
            encoder,
            decoder,
            tied_bias,
            tied_bias_init: None,
        })
    }

    pub fn config(&self) -> &SparseAutoencoderConfig {
        &self.config
    }

    /// The bias shared by the pre-encoder and post-decoder positions.
    pub fn tied_bias(&self) -> &Parameter {
        &self.tied_bias
    }

    /// Sets the tied bias to the geometric median of a sample of source activations, computed
    /// independently for every component.
    ///
    /// # Arguments
    /// * `sample` - Source activations, `(batch, component?, input_features)`.
    ///
    /// # Returns
    /// An error if the sample disagrees with the configured shapes or is empty.
    pub fn initialize_tied_parameters(&mut self, sample: ArrayViewD<'_, f32>) -> Result<()> {
        let SparseAutoencoderConfig {
            input_features,
            n_components,
            ..
        } = self.config;

        tensor_shape::validate_activation(
            "tied bias sample",
            sample.shape(),
            n_components,
            input_features,
        )?;

        let median = match n_components {
            None => {
                let points = sample.view().into_dimensionality::<Ix2>()?;
                stats::geometric_median(points, stats::MAX_ITERATIONS, stats::TOLERANCE)?
                    .into_dyn()
            }
            Some(_) => {
                let mut median = ArrayD::zeros(IxDyn(self.tied_bias.shape()));
                for (c, mut row) in median.outer_iter_mut().enumerate() {
                    let points = sample.index_axis(Axis(1), c).into_dimensionality::<Ix2>()?;
                    let m =
                        stats::geometric_median(points, stats::MAX_ITERATIONS, stats::TOLERANCE)?;
                    row.assign(&m);
                }
                median
            }
        };

        self.tied_bias.assign(median.view())?;
        self.tied_bias_init = Some(median);

        debug!(
            samples = sample.len_of(Axis(0));
            "initialized tied bias with the geometric median"
        );
        Ok(())
    }

    /// Every parameter of the autoencoder.
    pub fn parameters(&self) -> Vec<&Parameter> {
        let mut params = vec![self.encoder.weight(), self.encoder.bias(), self.decoder.weight()];
        params.extend(self.decoder.bias());
        params.push(&self.tied_bias);
        params
    }

    /// Mutable access to every parameter, for optimizers and resampling routines.
    pub fn parameters_mut(&mut self) -> Vec<&mut Parameter> {
        let mut params = self.encoder.parameters_mut();
        params.extend(self.decoder.parameters_mut());
        params.push(&mut self.tied_bias);
        params
    }
}

impl Autoencoder for SparseAutoencoder {
    type Encoder = LinearEncoder;
    type Decoder = LinearDecoder;
    type OuterBias<'a> = TiedBias<'a>;

    fn encoder(&self) -> &LinearEncoder {
        &self.encoder
    }

    fn decoder(&self) -> &LinearDecoder {
        &self.decoder
    }

    fn pre_encoder_bias(&self) -> TiedBias<'_> {
        TiedBias::new(&self.tied_bias, TiedBiasPosition::PreEncoder)
    }

    fn post_decoder_bias(&self) -> TiedBias<'_> {
        TiedBias::new(&self.tied_bias, TiedBiasPosition::PostDecoder)
    }

    fn reset_optimizer_parameter_details(&self) -> Vec<ResetOptimizerParameterDetails> {
        let mut details = self.encoder.reset_optimizer_parameter_details();
        details.extend(self.decoder.reset_optimizer_parameter_details());

        if self.tied_bias.is_trainable() {
            details.push(ResetOptimizerParameterDetails::whole(&self.tied_bias));
        }

        details
    }

    fn forward(&self, x: ArrayViewD<'_, f32>) -> Result<ForwardPassResult> {
        let SparseAutoencoderConfig {
            input_features,
            n_components,
            ..
        } = self.config;

        tensor_shape::validate_activation(
            "autoencoder input",
            x.shape(),
            n_components,
            input_features,
        )?;

        let centered = self.pre_encoder_bias().apply(x.view())?;
        let learned = self.encoder.forward(centered.view())?;
        let decoded = self.decoder.forward(learned.view())?;
        let decoded = self.post_decoder_bias().apply(decoded.view())?;

        trace!(
            "forward pass: {:?} -> {:?} -> {:?}",
            x.shape(),
            learned.shape(),
            decoded.shape()
        );

        Ok(ForwardPassResult::new(learned, decoded))
    }

    fn reset_parameters<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<()> {
        self.encoder.reset_parameters(rng)?;
        self.decoder.reset_parameters(rng)?;

        match &self.tied_bias_init {
            Some(init) => self.tied_bias.assign(init.view())?,
            None => self.tied_bias.view_mut().fill(0.),
        }

        Ok(())
    }
}
