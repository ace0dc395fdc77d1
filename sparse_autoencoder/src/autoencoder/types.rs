use std::{
    fmt::{self, Display},
    sync::atomic::{AtomicU64, Ordering},
};

use ndarray::{ArrayD, ArrayViewD, ArrayViewMutD};

use crate::{Result, tensor_shape};

static NEXT_PARAM_ID: AtomicU64 = AtomicU64::new(0);

/// An opaque handle identifying a single parameter tensor for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParamId(u64);

impl ParamId {
    fn next() -> Self {
        Self(NEXT_PARAM_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl Display for ParamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "param#{}", self.0)
    }
}

/// A parameter tensor owned by a single component.
///
/// The shape is fixed at construction; every mutation goes through methods that keep it.
#[derive(Debug)]
pub struct Parameter {
    id: ParamId,
    data: ArrayD<f32>,
    trainable: bool,
}

impl Parameter {
    /// Creates a new trainable `Parameter`.
    ///
    /// # Arguments
    /// * `data` - The initial values.
    pub fn new(data: ArrayD<f32>) -> Self {
        Self {
            id: ParamId::next(),
            data,
            trainable: true,
        }
    }

    /// Creates a new `Parameter` that is not updated by gradient steps, e.g. a dataset statistic.
    ///
    /// # Arguments
    /// * `data` - The initial values.
    pub fn fixed(data: ArrayD<f32>) -> Self {
        Self {
            trainable: false,
            ..Self::new(data)
        }
    }

    pub fn id(&self) -> ParamId {
        self.id
    }

    pub fn is_trainable(&self) -> bool {
        self.trainable
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn ndim(&self) -> usize {
        self.data.ndim()
    }

    pub fn view(&self) -> ArrayViewD<'_, f32> {
        self.data.view()
    }

    /// Mutable access to the values. The view cannot be used to reshape the parameter.
    pub fn view_mut(&mut self) -> ArrayViewMutD<'_, f32> {
        self.data.view_mut()
    }

    /// Overwrites every value of this parameter.
    ///
    /// # Arguments
    /// * `values` - The new values, must have exactly this parameter's shape.
    ///
    /// # Returns
    /// An error if the shapes differ.
    pub fn assign(&mut self, values: ArrayViewD<'_, f32>) -> Result<()> {
        tensor_shape::ensure_same_shape("parameter assignment", values.shape(), self.shape())?;
        self.data.assign(&values);
        Ok(())
    }

    /// Resolves a possibly negative axis against this parameter's rank.
    pub fn resolve_axis(&self, axis: isize) -> Result<usize> {
        tensor_shape::resolve_axis(axis, self.ndim())
    }
}

/// Identifies the axis of a parameter along which a single learnt feature's values live.
///
/// When a dictionary vector is reinitialized externally, the optimizer state of the same slice
/// along `axis` has to be zeroed. Parameters without a learnt feature axis, such as a trainable
/// outer bias, carry no axis and have their state reset as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResetOptimizerParameterDetails {
    pub parameter: ParamId,
    pub axis: Option<isize>,
}

impl ResetOptimizerParameterDetails {
    /// Creates a new `ResetOptimizerParameterDetails`.
    ///
    /// # Arguments
    /// * `parameter` - The parameter to reset.
    /// * `axis` - The axis to reset along, negative values count from the end.
    pub fn new(parameter: &Parameter, axis: isize) -> Self {
        Self {
            parameter: parameter.id(),
            axis: Some(axis),
        }
    }

    /// Creates a new `ResetOptimizerParameterDetails` for a parameter that is not indexed by
    /// learnt features.
    pub fn whole(parameter: &Parameter) -> Self {
        Self {
            parameter: parameter.id(),
            axis: None,
        }
    }
}
