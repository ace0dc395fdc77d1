//! Random parameter initialization schemes.

use ndarray::{ArrayD, IxDyn};
use ndarray_rand::RandomExt;
use rand::Rng;
use rand_distr::Uniform;

use crate::Result;

/// The gain recommended for layers followed by a ReLU.
const RELU_GAIN: f32 = std::f32::consts::SQRT_2;

/// Returns the fan-in of a weight tensor: the size of its last (contracted) axis.
pub fn fan_in(shape: &[usize]) -> usize {
    shape.last().copied().unwrap_or(0)
}

/// Samples a tensor uniformly from `[-bound, bound]`.
///
/// # Arguments
/// * `shape` - The shape of the sampled tensor.
/// * `bound` - The absolute value of both limits.
/// * `rng` - A random number generator.
///
/// # Returns
/// An error if the bound is not finite.
pub fn uniform<R: Rng + ?Sized>(shape: &[usize], bound: f32, rng: &mut R) -> Result<ArrayD<f32>> {
    let distribution = Uniform::new_inclusive(-bound, bound)?;
    Ok(ArrayD::random_using(IxDyn(shape), distribution, rng))
}

/// Samples a tensor using Kaiming uniform initialization, assuming a ReLU follows the layer.
///
/// The bound is `gain * sqrt(3 / fan_in)`. A different nonlinearity needs a different gain.
///
/// # Arguments
/// * `shape` - The shape of the sampled tensor.
/// * `fan_in` - The number of input units in the weight tensor.
/// * `rng` - A random number generator.
///
/// # Returns
/// An error if the calculated range is invalid.
pub fn kaiming_uniform<R: Rng + ?Sized>(
    shape: &[usize],
    fan_in: usize,
    rng: &mut R,
) -> Result<ArrayD<f32>> {
    let std_dev = RELU_GAIN / (fan_in as f32).sqrt();
    let bound = 3f32.sqrt() * std_dev;
    uniform(shape, bound, rng)
}

/// Samples a tensor uniformly from `[-1/sqrt(fan_in), 1/sqrt(fan_in)]`, the default bias scheme
/// of a linear layer. The bound collapses to 0 when `fan_in` is 0.
///
/// # Arguments
/// * `shape` - The shape of the sampled tensor.
/// * `fan_in` - The fan-in of the weight this tensor accompanies.
/// * `rng` - A random number generator.
pub fn linear_uniform<R: Rng + ?Sized>(
    shape: &[usize],
    fan_in: usize,
    rng: &mut R,
) -> Result<ArrayD<f32>> {
    let bound = if fan_in > 0 {
        1. / (fan_in as f32).sqrt()
    } else {
        0.
    };
    uniform(shape, bound, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn seeded_rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn kaiming_bounds() {
        let mut rng = seeded_rng();
        let w = kaiming_uniform(&[8, 4], 4, &mut rng).unwrap();
        let bound = (6f32 / 4.).sqrt();

        assert_eq!(w.shape(), &[8, 4]);
        assert!(w.iter().all(|v| v.abs() <= bound));
        assert!(w.iter().any(|&v| v != 0.));
    }

    #[test]
    fn linear_bounds() {
        let mut rng = seeded_rng();
        let b = linear_uniform(&[3, 8], 16, &mut rng).unwrap();

        assert_eq!(b.shape(), &[3, 8]);
        assert!(b.iter().all(|v| v.abs() <= 0.25));
    }

    #[test]
    fn zero_fan_in() {
        let mut rng = seeded_rng();
        let b = linear_uniform(&[5], 0, &mut rng).unwrap();
        assert!(b.iter().all(|&v| v == 0.));
    }

    #[test]
    fn fan_in_is_last_axis() {
        assert_eq!(fan_in(&[3, 8, 4]), 4);
        assert_eq!(fan_in(&[8, 4]), 4);
        assert_eq!(fan_in(&[]), 0);
    }

    #[test]
    fn seeded_sampling_is_reproducible() {
        let a = kaiming_uniform(&[4, 4], 4, &mut seeded_rng()).unwrap();
        let b = kaiming_uniform(&[4, 4], 4, &mut seeded_rng()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn non_finite_bound() {
        let mut rng = seeded_rng();
        assert!(uniform(&[2], f32::INFINITY, &mut rng).is_err());
    }
}
