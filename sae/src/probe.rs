use std::{
    env,
    fmt::{self, Display},
    str::FromStr,
};

use anyhow::{Context, Result};
use log::debug;
use ndarray::{ArrayD, IxDyn};
use ndarray_rand::RandomExt;
use rand::{SeedableRng, rngs::StdRng};
use rand_distr::StandardNormal;
use sparse_autoencoder::{
    autoencoder::{Autoencoder, SparseAutoencoder, SparseAutoencoderConfig},
    loss::{self, LossFn, SaeLoss},
    tensor_shape,
};

const DEFAULT_INPUT_FEATURES: usize = 16;
const DEFAULT_WIDTH_MULTIPLIER: usize = 8;
const DEFAULT_BATCH: usize = 64;
const DEFAULT_L1_COEFFICIENT: f32 = 1e-3;

/// The autoencoder and batch a probe is run with.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeConfig {
    pub input_features: usize,
    pub width_multiplier: usize,
    pub n_components: Option<usize>,
    pub batch: usize,
    pub l1_coefficient: f32,
    pub seed: Option<u64>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            input_features: DEFAULT_INPUT_FEATURES,
            width_multiplier: DEFAULT_WIDTH_MULTIPLIER,
            n_components: None,
            batch: DEFAULT_BATCH,
            l1_coefficient: DEFAULT_L1_COEFFICIENT,
            seed: None,
        }
    }
}

impl ProbeConfig {
    /// Reads the config from `SAE_*` environment variables, unset ones take their default.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from a key-value lookup.
    ///
    /// # Arguments
    /// * `lookup` - Returns the raw value of a variable, or `None` if it is unset.
    ///
    /// # Returns
    /// The config or an error naming the first variable that failed to parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let Self {
            input_features,
            width_multiplier,
            batch,
            l1_coefficient,
            ..
        } = Self::default();

        Ok(Self {
            input_features: parse_or(&lookup, "SAE_INPUT_FEATURES", input_features)?,
            width_multiplier: parse_or(&lookup, "SAE_WIDTH_MULTIPLIER", width_multiplier)?,
            n_components: parse_opt(&lookup, "SAE_COMPONENTS")?,
            batch: parse_or(&lookup, "SAE_BATCH", batch)?,
            l1_coefficient: parse_or(&lookup, "SAE_L1_COEFFICIENT", l1_coefficient)?,
            seed: parse_opt(&lookup, "SAE_SEED")?,
        })
    }
}

fn parse_opt<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .with_context(|| format!("invalid {key}: '{raw}'"))
        })
        .transpose()
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    Ok(parse_opt(lookup, key)?.unwrap_or(default))
}

/// What a single forward pass over random activations produced.
#[derive(Debug)]
pub struct ProbeReport {
    pub learned_shape: Vec<usize>,
    pub decoded_shape: Vec<usize>,
    /// The fraction of learnt activations that are not zero.
    pub density: f32,
    pub mse: Vec<f32>,
    pub loss: Vec<f32>,
}

impl Display for ProbeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "learned activations: {:?}", self.learned_shape)?;
        writeln!(f, "decoded activations: {:?}", self.decoded_shape)?;
        writeln!(f, "density: {:.4}", self.density)?;
        writeln!(f, "reconstruction mse: {:?}", self.mse)?;
        write!(f, "loss: {:?}", self.loss)
    }
}

/// Builds an autoencoder, centres it on a random sample and makes a forward pass over it.
pub fn run(config: &ProbeConfig) -> Result<ProbeReport> {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let sae_config = SparseAutoencoderConfig::from_width_multiplier(
        config.input_features,
        config.width_multiplier,
        config.n_components,
    )?;
    let mut sae = SparseAutoencoder::new(sae_config, &mut rng)?;

    let shape =
        tensor_shape::activation_shape(config.batch, config.n_components, config.input_features)?;
    let x = ArrayD::<f32>::random_using(IxDyn(&shape), StandardNormal, &mut rng);

    sae.initialize_tied_parameters(x.view())?;
    let result = sae.forward(x.view())?;

    let mse = loss::reconstruction_mse(x.view(), result.decoded_activations())?;
    let total = SaeLoss::new(config.l1_coefficient).loss(x.view(), &result)?;

    let learned = result.learned_activations();
    let active = learned.iter().filter(|&&v| v > 0.).count();
    let density = active as f32 / learned.len() as f32;

    debug!(active = active; "probe forward pass done");

    Ok(ProbeReport {
        learned_shape: learned.shape().to_vec(),
        decoded_shape: result.decoded_activations().shape().to_vec(),
        density,
        mse: mse.iter().copied().collect(),
        loss: total.iter().copied().collect(),
    })
}
