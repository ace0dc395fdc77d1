use ndarray::{ArrayD, ArrayViewD, Axis};

use crate::{Result, SaeErr, autoencoder::ForwardPassResult, tensor_shape};

/// A training objective over an autoencoder's forward pass.
pub trait LossFn {
    /// Computes the loss averaged over the batch.
    ///
    /// # Arguments
    /// * `source` - The autoencoder's input, `(batch, component?, input_features)`.
    /// * `result` - The forward pass made over `source`.
    ///
    /// # Returns
    /// One value per component, `(component)`, or a scalar array without a component axis.
    fn loss(&self, source: ArrayViewD<'_, f32>, result: &ForwardPassResult) -> Result<ArrayD<f32>>;
}

/// The mean squared reconstruction error.
///
/// Squared errors are averaged over features, then over the batch.
///
/// # Arguments
/// * `source` - The autoencoder's input, `(batch, component?, input_features)`.
/// * `decoded` - The reconstruction, same shape as `source`.
///
/// # Returns
/// The error per component, or an error on mismatching shapes or an empty batch.
pub fn reconstruction_mse(
    source: ArrayViewD<'_, f32>,
    decoded: ArrayViewD<'_, f32>,
) -> Result<ArrayD<f32>> {
    check_activation_rank("reconstruction", decoded.ndim())?;
    tensor_shape::ensure_same_shape("reconstruction", decoded.shape(), source.shape())?;

    let squared = (&decoded - &source).mapv(|x| x.powi(2));
    let per_item = feature_axis_mean(squared)?;
    batch_mean(per_item)
}

/// The L1 norm of the learnt activations, averaged over the batch.
///
/// # Arguments
/// * `learned` - The learnt activations, `(batch, component?, learnt_features)`.
///
/// # Returns
/// The penalty per component, or an error on an empty batch.
pub fn l1_sparsity(learned: ArrayViewD<'_, f32>) -> Result<ArrayD<f32>> {
    check_activation_rank("learnt activations", learned.ndim())?;

    let feature_axis = Axis(learned.ndim() - 1);
    let per_item = learned.mapv(f32::abs).sum_axis(feature_axis);
    batch_mean(per_item)
}

/// The usual sparse autoencoder objective, reconstruction error plus an L1 penalty on the learnt
/// activations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SaeLoss {
    l1_coefficient: f32,
}

impl SaeLoss {
    /// Creates a new `SaeLoss`.
    ///
    /// # Arguments
    /// * `l1_coefficient` - The weight of the sparsity penalty.
    pub fn new(l1_coefficient: f32) -> Self {
        Self { l1_coefficient }
    }

    pub fn l1_coefficient(&self) -> f32 {
        self.l1_coefficient
    }
}

impl LossFn for SaeLoss {
    fn loss(&self, source: ArrayViewD<'_, f32>, result: &ForwardPassResult) -> Result<ArrayD<f32>> {
        let mse = reconstruction_mse(source, result.decoded_activations())?;
        let l1 = l1_sparsity(result.learned_activations())?;

        Ok(mse + l1 * self.l1_coefficient)
    }
}

fn check_activation_rank(what: &'static str, ndim: usize) -> Result<()> {
    match ndim {
        2 | 3 => Ok(()),
        got => Err(SaeErr::RankMismatch {
            what,
            got,
            expected: 3,
        }),
    }
}

fn feature_axis_mean(x: ArrayD<f32>) -> Result<ArrayD<f32>> {
    let feature_axis = Axis(x.ndim() - 1);
    x.mean_axis(feature_axis).ok_or(SaeErr::InvalidSize {
        what: "features",
        got: 0,
    })
}

fn batch_mean(per_item: ArrayD<f32>) -> Result<ArrayD<f32>> {
    per_item.mean_axis(Axis(0)).ok_or(SaeErr::EmptySample)
}
