use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::{Result, SweepErr};

/// A single hyperparameter of a sweep.
///
/// Serialized the way sweep services expect it: `{"value": x}`, `{"values": [..]}` or
/// `{"min": a, "max": b}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Parameter<T> {
    /// The same value in every run.
    Fixed { value: T },
    /// One of an enumerated set of values.
    Values { values: Vec<T> },
    /// Any value within inclusive limits.
    Range { min: T, max: T },
}

impl<T> Parameter<T> {
    pub fn fixed(value: T) -> Self {
        Self::Fixed { value }
    }

    pub fn one_of(values: impl Into<Vec<T>>) -> Self {
        Self::Values {
            values: values.into(),
        }
    }

    pub fn range(min: T, max: T) -> Self {
        Self::Range { min, max }
    }

    /// The fixed value, if the parameter is not swept.
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Fixed { value } => Some(value),
            _ => None,
        }
    }

    /// The enumerated values, if the parameter is swept over a list.
    pub fn values(&self) -> Option<&[T]> {
        match self {
            Self::Values { values } => Some(values),
            _ => None,
        }
    }

    /// The `(min, max)` limits, if the parameter is swept over a range.
    pub fn bounds(&self) -> Option<(&T, &T)> {
        match self {
            Self::Range { min, max } => Some((min, max)),
            _ => None,
        }
    }

    /// Whether runs of the sweep may use different values.
    pub fn is_swept(&self) -> bool {
        !matches!(self, Self::Fixed { .. })
    }

    /// Iterates over every value written in the parameter: the fixed value, the listed values or
    /// both limits of the range.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let (fixed, listed, bounds) = match self {
            Self::Fixed { value } => (Some(value), &[][..], None),
            Self::Values { values } => (None, &values[..], None),
            Self::Range { min, max } => (None, &[][..], Some([min, max])),
        };

        fixed
            .into_iter()
            .chain(listed)
            .chain(bounds.into_iter().flatten())
    }
}

impl<T: PartialOrd> Parameter<T> {
    /// Checks that the parameter describes a non-empty search space.
    ///
    /// # Arguments
    /// * `name` - The parameter's name, used in the error.
    pub fn validate(&self, name: &'static str) -> Result<()> {
        match self {
            Self::Values { values } if values.is_empty() => Err(SweepErr::InvalidParameter {
                name,
                reason: "the list of values is empty",
            }),
            Self::Range { min, max } if min.partial_cmp(max).is_none_or(Ordering::is_gt) => {
                Err(SweepErr::InvalidParameter {
                    name,
                    reason: "min must not exceed max",
                })
            }
            _ => Ok(()),
        }
    }
}
