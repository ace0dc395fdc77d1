use ndarray::{Array3, ArrayD, ArrayViewD, Axis, Ix1, Ix2, Ix3, Zip, linalg};

use crate::{Result, SaeErr};

/// Computes `x · Wᵀ + b`, contracting the last axis of `x` with the last axis of `weight`.
///
/// Without a component axis `x` is `(batch, in)`, `weight` is `(out, in)` and `bias` is `(out)`.
/// With one, `x` is `(batch, component, in)`, `weight` is `(component, out, in)` and `bias` is
/// `(component, out)`; components are projected in parallel.
///
/// Shapes must already be validated by the caller.
pub(super) fn project(
    x: ArrayViewD<'_, f32>,
    weight: ArrayViewD<'_, f32>,
    bias: Option<ArrayViewD<'_, f32>>,
) -> Result<ArrayD<f32>> {
    match weight.ndim() {
        2 => {
            let x = x.into_dimensionality::<Ix2>()?;
            let w = weight.into_dimensionality::<Ix2>()?;

            let mut z = x.dot(&w.t());
            if let Some(b) = bias {
                z += &b.into_dimensionality::<Ix1>()?;
            }

            Ok(z.into_dyn())
        }
        3 => {
            let x = x.into_dimensionality::<Ix3>()?;
            let w = weight.into_dimensionality::<Ix3>()?;
            let (batch, components, _) = x.dim();
            let out = w.dim().1;

            let mut z = Array3::<f32>::zeros((batch, components, out));
            Zip::from(z.axis_iter_mut(Axis(1)))
                .and(x.axis_iter(Axis(1)))
                .and(w.axis_iter(Axis(0)))
                .par_for_each(|mut z, x, w| {
                    linalg::general_mat_mul(1.0, &x, &w.t(), 0.0, &mut z);
                });

            if let Some(b) = bias {
                z += &b.into_dimensionality::<Ix2>()?;
            }

            Ok(z.into_dyn())
        }
        rank => Err(SaeErr::RankMismatch {
            what: "weight",
            got: rank,
            expected: 3,
        }),
    }
}
