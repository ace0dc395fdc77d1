//! Shape helpers shared by every component.
//!
//! Parameters carry the component axis first, activations carry it right after the batch axis.
//! Keeping both rules here means no component builds a shape on its own.

use crate::{Result, SaeErr};

/// Builds a parameter shape, prepending the component axis when there is one.
///
/// # Arguments
/// * `n_components` - The amount of independent autoencoders trained in parallel, if any.
/// * `dims` - The remaining axis sizes.
///
/// # Returns
/// The full shape or an error if any of the sizes is zero.
pub fn shape_with_optional_dimensions(
    n_components: Option<usize>,
    dims: &[usize],
) -> Result<Vec<usize>> {
    let mut shape = Vec::with_capacity(dims.len() + 1);

    if let Some(n) = n_components {
        shape.push(positive("n_components", n)?);
    }

    for &dim in dims {
        shape.push(positive("dimension", dim)?);
    }

    Ok(shape)
}

/// Builds an activation shape `(batch, component?, features)`.
///
/// # Arguments
/// * `batch` - The amount of batch items.
/// * `n_components` - The amount of components, if any.
/// * `features` - The size of the feature axis.
///
/// # Returns
/// The full shape or an error if any of the sizes is zero.
pub fn activation_shape(
    batch: usize,
    n_components: Option<usize>,
    features: usize,
) -> Result<Vec<usize>> {
    let mut shape = vec![positive("batch", batch)?];
    shape.extend(shape_with_optional_dimensions(n_components, &[features])?);
    Ok(shape)
}

/// Checks that an activation tensor's shape agrees with a component's configuration.
///
/// # Arguments
/// * `what` - A name for the tensor, used in the error.
/// * `shape` - The activation's shape, `(batch, component?, features)`.
/// * `n_components` - The configured amount of components.
/// * `features` - The configured size of the feature axis.
///
/// # Returns
/// An error describing the first disagreement found.
pub fn validate_activation(
    what: &'static str,
    shape: &[usize],
    n_components: Option<usize>,
    features: usize,
) -> Result<()> {
    match (shape.len(), n_components) {
        (2, None) => {}
        (3, Some(n)) if shape[1] == n => {}
        (3, Some(n)) => {
            return Err(SaeErr::ComponentMismatch {
                got: Some(shape[1]),
                expected: Some(n),
            });
        }
        (2, Some(n)) => {
            return Err(SaeErr::ComponentMismatch {
                got: None,
                expected: Some(n),
            });
        }
        (3, None) => {
            return Err(SaeErr::ComponentMismatch {
                got: Some(shape[1]),
                expected: None,
            });
        }
        (rank, n) => {
            return Err(SaeErr::RankMismatch {
                what,
                got: rank,
                expected: if n.is_some() { 3 } else { 2 },
            });
        }
    }

    let got = shape[shape.len() - 1];
    if got != features {
        return Err(SaeErr::ShapeMismatch {
            what,
            got,
            expected: features,
        });
    }

    Ok(())
}

/// Checks that two tensors have exactly the same shape.
///
/// # Arguments
/// * `what` - A name for the checked tensor, used in the error.
/// * `got` - The checked tensor's shape.
/// * `expected` - The shape it must have.
pub fn ensure_same_shape(what: &'static str, got: &[usize], expected: &[usize]) -> Result<()> {
    if got.len() != expected.len() {
        return Err(SaeErr::RankMismatch {
            what,
            got: got.len(),
            expected: expected.len(),
        });
    }

    if let Some((&got, &expected)) = got.iter().zip(expected).find(|(got, expected)| got != expected) {
        return Err(SaeErr::ShapeMismatch {
            what,
            got,
            expected,
        });
    }

    Ok(())
}

/// Resolves a possibly negative axis index against a rank.
pub fn resolve_axis(axis: isize, ndim: usize) -> Result<usize> {
    let resolved = if axis < 0 {
        ndim as isize + axis
    } else {
        axis
    };

    if resolved < 0 || resolved as usize >= ndim {
        return Err(SaeErr::IndexOutOfBounds {
            what: "axes",
            index: axis.unsigned_abs(),
            len: ndim,
        });
    }

    Ok(resolved as usize)
}

fn positive(what: &'static str, n: usize) -> Result<usize> {
    if n == 0 {
        return Err(SaeErr::InvalidSize { what, got: n });
    }

    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn without_components() {
        let shape = shape_with_optional_dimensions(None, &[8, 4]).unwrap();
        assert_eq!(shape, vec![8, 4]);
    }

    #[test]
    fn with_components() {
        let shape = shape_with_optional_dimensions(Some(3), &[8, 4]).unwrap();
        assert_eq!(shape, vec![3, 8, 4]);
    }

    #[test]
    fn zero_sizes_are_rejected() {
        assert!(matches!(
            shape_with_optional_dimensions(Some(0), &[8]),
            Err(SaeErr::InvalidSize {
                what: "n_components",
                ..
            })
        ));
        assert!(matches!(
            shape_with_optional_dimensions(None, &[8, 0]),
            Err(SaeErr::InvalidSize { .. })
        ));
        assert!(activation_shape(0, None, 4).is_err());
    }

    #[test]
    fn component_axis_follows_batch() {
        assert_eq!(activation_shape(5, Some(3), 4).unwrap(), vec![5, 3, 4]);
        assert_eq!(activation_shape(5, None, 4).unwrap(), vec![5, 4]);
    }

    #[test]
    fn validation() {
        assert!(validate_activation("x", &[2, 4], None, 4).is_ok());
        assert!(validate_activation("x", &[2, 3, 4], Some(3), 4).is_ok());

        assert!(matches!(
            validate_activation("x", &[2, 5], None, 4),
            Err(SaeErr::ShapeMismatch {
                got: 5,
                expected: 4,
                ..
            })
        ));
        assert!(matches!(
            validate_activation("x", &[2, 4], Some(3), 4),
            Err(SaeErr::ComponentMismatch {
                got: None,
                expected: Some(3)
            })
        ));
        assert!(matches!(
            validate_activation("x", &[2, 3, 4], None, 4),
            Err(SaeErr::ComponentMismatch {
                got: Some(3),
                expected: None
            })
        ));
        assert!(matches!(
            validate_activation("x", &[2, 2, 4], Some(3), 4),
            Err(SaeErr::ComponentMismatch {
                got: Some(2),
                expected: Some(3)
            })
        ));
        assert!(matches!(
            validate_activation("x", &[4], None, 4),
            Err(SaeErr::RankMismatch {
                got: 1,
                expected: 2,
                ..
            })
        ));
    }

    #[test]
    fn same_shape() {
        assert!(ensure_same_shape("grad", &[3, 4], &[3, 4]).is_ok());
        assert!(matches!(
            ensure_same_shape("grad", &[3, 5], &[3, 4]),
            Err(SaeErr::ShapeMismatch {
                got: 5,
                expected: 4,
                ..
            })
        ));
        assert!(matches!(
            ensure_same_shape("grad", &[3], &[3, 4]),
            Err(SaeErr::RankMismatch { .. })
        ));
    }

    #[test]
    fn negative_axes() {
        assert_eq!(resolve_axis(-1, 3).unwrap(), 2);
        assert_eq!(resolve_axis(-2, 2).unwrap(), 0);
        assert_eq!(resolve_axis(1, 2).unwrap(), 1);
        assert!(resolve_axis(-3, 2).is_err());
        assert!(resolve_axis(2, 2).is_err());
    }
}
