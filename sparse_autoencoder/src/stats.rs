use ndarray::{Array1, ArrayView1, ArrayView2, Axis};

use crate::{Result, SaeErr};

/// The default cap on Weiszfeld iterations.
pub const MAX_ITERATIONS: usize = 100;

/// The default convergence threshold on the distance moved by the estimate between iterations.
pub const TOLERANCE: f32 = 1e-5;

/// Keeps points that coincide with the estimate from dividing by zero.
const MIN_DISTANCE: f32 = 1e-8;

/// Computes the geometric median of a set of points with Weiszfeld's algorithm.
///
/// The geometric median minimizes the sum of euclidean distances to every point, which makes it
/// a better centre than the mean for heavy tailed activations.
///
/// # Arguments
/// * `points` - One point per row, `(n_points, features)`.
/// * `max_iterations` - The maximum amount of refinement steps.
/// * `tolerance` - Stop once the estimate moves less than this.
///
/// # Returns
/// The median, `(features)`, or an error if there are no points.
pub fn geometric_median(
    points: ArrayView2<'_, f32>,
    max_iterations: usize,
    tolerance: f32,
) -> Result<Array1<f32>> {
    if points.nrows() == 0 {
        return Err(SaeErr::EmptySample);
    }

    let mut median = points.mean_axis(Axis(0)).ok_or(SaeErr::EmptySample)?;
    if points.nrows() == 1 {
        return Ok(median);
    }

    for _ in 0..max_iterations {
        let weights = points
            .rows()
            .into_iter()
            .map(|row| 1. / distance(row, median.view()).max(MIN_DISTANCE))
            .collect::<Array1<f32>>();

        let next = weights.dot(&points) / weights.sum();
        let moved = distance(next.view(), median.view());
        median = next;

        if moved < tolerance {
            break;
        }
    }

    Ok(median)
}

fn distance(a: ArrayView1<'_, f32>, b: ArrayView1<'_, f32>) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f32>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, arr1, arr2};

    #[test]
    fn empty() {
        let points = Array2::<f32>::zeros((0, 3));
        assert!(matches!(
            geometric_median(points.view(), MAX_ITERATIONS, TOLERANCE),
            Err(SaeErr::EmptySample)
        ));
    }

    #[test]
    fn single_point() {
        let points = arr2(&[[1.5, -2., 0.]]);
        let median = geometric_median(points.view(), MAX_ITERATIONS, TOLERANCE).unwrap();
        assert_eq!(median, arr1(&[1.5f32, -2., 0.]));
    }

    #[test]
    fn symmetric_points() {
        let points = arr2(&[[1., 0.], [-1., 0.], [0., 1.], [0., -1.]]);
        let median = geometric_median(points.view(), MAX_ITERATIONS, TOLERANCE).unwrap();
        assert!(median.iter().all(|v| v.abs() < 1e-4));
    }

    #[test]
    fn resists_outliers() {
        // the mean of these is pulled to x = 20.8, the median stays near the cluster
        let points = arr2(&[[0., 0.], [1., 0.], [0., 1.], [1., 1.], [100., 100.]]);
        let median = geometric_median(points.view(), MAX_ITERATIONS, TOLERANCE).unwrap();

        assert!(median[0] < 2. && median[1] < 2.);
        assert!(median[0] > 0. && median[1] > 0.);
    }

    #[test]
    fn collinear_points() {
        let points = arr2(&[[0.], [1.], [10.]]);
        let median = geometric_median(points.view(), 1000, 1e-7).unwrap();
        assert!((median[0] - 1.).abs() < 1e-2);
    }
}
