use std::collections::HashMap;

use log::{debug, trace};
use ndarray::{ArrayD, ArrayViewD, Axis, IxDyn, Zip};
use rayon::prelude::*;

use super::Optimizer;
use crate::{
    Result, SaeErr,
    autoencoder::{ParamId, Parameter, ResetOptimizerParameterDetails},
    tensor_shape,
};

/// The hyperparameters of an `Adam` optimizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdamConfig {
    pub learning_rate: f32,
    pub beta1: f32,
    pub beta2: f32,
    pub epsilon: f32,
    /// L2 penalty added to every gradient.
    pub weight_decay: f32,
}

impl Default for AdamConfig {
    fn default() -> Self {
        Self {
            learning_rate: 1e-3,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            weight_decay: 0.,
        }
    }
}

#[derive(Debug)]
struct MomentState {
    v: ArrayD<f32>,
    s: ArrayD<f32>,
    beta1_t: f32,
    beta2_t: f32,
}

impl MomentState {
    fn zeros(shape: &[usize]) -> Self {
        Self {
            v: ArrayD::zeros(IxDyn(shape)),
            s: ArrayD::zeros(IxDyn(shape)),
            beta1_t: 1.,
            beta2_t: 1.,
        }
    }

    fn clear(&mut self) {
        self.v.fill(0.);
        self.s.fill(0.);
    }
}

/// The Adam optimizer, holding first and second moment estimates for every trainable parameter.
#[derive(Debug)]
pub struct Adam {
    config: AdamConfig,
    states: HashMap<ParamId, MomentState>,
}

impl Adam {
    /// Creates a new `Adam` optimizer.
    ///
    /// # Arguments
    /// * `config` - The hyperparameters.
    /// * `params` - The parameters to optimize. Fixed parameters are skipped.
    ///
    /// # Returns
    /// A new `Adam` instance.
    pub fn new<'a, I>(config: AdamConfig, params: I) -> Self
    where
        I: IntoIterator<Item = &'a Parameter>,
    {
        let states = params
            .into_iter()
            .filter(|param| param.is_trainable())
            .map(|param| (param.id(), MomentState::zeros(param.shape())))
            .collect();

        Self { config, states }
    }

    pub fn config(&self) -> &AdamConfig {
        &self.config
    }

    /// The first moment estimate of a parameter, if it is being optimized.
    pub fn first_moment(&self, id: ParamId) -> Option<ArrayViewD<'_, f32>> {
        self.states.get(&id).map(|state| state.v.view())
    }

    /// The second moment estimate of a parameter, if it is being optimized.
    pub fn second_moment(&self, id: ParamId) -> Option<ArrayViewD<'_, f32>> {
        self.states.get(&id).map(|state| state.s.view())
    }

    /// Updates every parameter with its gradient.
    ///
    /// # Arguments
    /// * `params` - The parameters to update.
    /// * `grads` - One gradient per parameter, in the same order.
    ///
    /// # Returns
    /// An error if the amounts or shapes differ, or if a trainable parameter is unknown.
    pub fn step(
        &mut self,
        params: &mut [&mut Parameter],
        grads: &[ArrayViewD<'_, f32>],
    ) -> Result<()> {
        if params.len() != grads.len() {
            return Err(SaeErr::ShapeMismatch {
                what: "gradients",
                got: grads.len(),
                expected: params.len(),
            });
        }

        for (param, grad) in params.iter_mut().zip(grads) {
            self.update_param(grad.view(), param)?;
        }

        Ok(())
    }

    /// Zeroes the moment estimates of every parameter.
    pub fn reset_state_all_parameters(&mut self) {
        self.states.par_iter_mut().for_each(|(_, state)| state.clear());
        debug!(parameters = self.states.len(); "reset adam state");
    }

    /// Zeroes the moment estimates of specific learnt features, e.g. after their dictionary
    /// vectors were resampled.
    ///
    /// # Arguments
    /// * `details` - The parameters holding the features and the axis each feature lives on.
    ///   Parameters without an axis have their whole state zeroed.
    /// * `neuron_indices` - The learnt features to reset.
    /// * `component` - Restricts the reset to one component of parameters with a component axis.
    ///   When omitted, the features are reset in every component.
    ///
    /// # Returns
    /// An error if a parameter is unknown or an index is out of bounds. Nothing is reset then.
    pub fn reset_neurons_state(
        &mut self,
        details: &[ResetOptimizerParameterDetails],
        neuron_indices: &[usize],
        component: Option<usize>,
    ) -> Result<()> {
        let mut targets = Vec::with_capacity(details.len());
        for detail in details {
            let state = self
                .states
                .get(&detail.parameter)
                .ok_or(SaeErr::UnknownParameter(detail.parameter))?;

            let shape = state.v.shape();
            check_component(shape, component)?;
            let axis = detail
                .axis
                .map(|axis| feature_axis(shape, axis, component, neuron_indices))
                .transpose()?;

            targets.push((detail.parameter, axis));
        }

        for (id, axis) in targets {
            if let Some(state) = self.states.get_mut(&id) {
                zero_features(&mut state.v, component, axis, neuron_indices);
                zero_features(&mut state.s, component, axis, neuron_indices);
            }
        }

        debug!(
            parameters = details.len(),
            neurons = neuron_indices.len();
            "reset adam state for learnt features in component {:?}",
            component
        );
        Ok(())
    }
}

/// Checks that a parameter has a component axis to restrict the reset to, and that the component
/// exists.
fn check_component(shape: &[usize], component: Option<usize>) -> Result<()> {
    match component {
        Some(_) if shape.len() < 2 => Err(SaeErr::ComponentMismatch {
            got: component,
            expected: None,
        }),
        Some(c) if c >= shape[0] => Err(SaeErr::IndexOutOfBounds {
            what: "components",
            index: c,
            len: shape[0],
        }),
        _ => Ok(()),
    }
}

/// Resolves the axis of a feature within the slice `zero_features` writes to, checking every
/// index it will touch.
fn feature_axis(
    shape: &[usize],
    axis: isize,
    component: Option<usize>,
    neuron_indices: &[usize],
) -> Result<usize> {
    let resolved = tensor_shape::resolve_axis(axis, shape.len())?;

    let sliced_axis = match component {
        None => resolved,
        Some(_) if resolved == 0 => {
            return Err(SaeErr::ComponentMismatch {
                got: component,
                expected: None,
            });
        }
        Some(_) => resolved - 1,
    };

    let len = shape[resolved];
    if let Some(&index) = neuron_indices.iter().find(|&&i| i >= len) {
        return Err(SaeErr::IndexOutOfBounds {
            what: "learnt features",
            index,
            len,
        });
    }

    Ok(sliced_axis)
}

fn zero_features(
    moment: &mut ArrayD<f32>,
    component: Option<usize>,
    axis: Option<usize>,
    neuron_indices: &[usize],
) {
    let mut moment = match component {
        Some(c) => moment.index_axis_mut(Axis(0), c),
        None => moment.view_mut(),
    };

    match axis {
        Some(axis) => {
            for &i in neuron_indices {
                moment.index_axis_mut(Axis(axis), i).fill(0.);
            }
        }
        None => moment.fill(0.),
    }
}

impl Optimizer for Adam {
    fn update_param(&mut self, grad: ArrayViewD<'_, f32>, param: &mut Parameter) -> Result<()> {
        if !param.is_trainable() {
            trace!("skipping fixed parameter {}", param.id());
            return Ok(());
        }

        tensor_shape::ensure_same_shape("gradient", grad.shape(), param.shape())?;

        let AdamConfig {
            learning_rate: lr,
            beta1: b1,
            beta2: b2,
            epsilon: eps,
            weight_decay: wd,
        } = self.config;

        let id = param.id();
        let state = self
            .states
            .get_mut(&id)
            .ok_or(SaeErr::UnknownParameter(id))?;

        state.beta1_t *= b1;
        state.beta2_t *= b2;

        let bc1 = 1. - state.beta1_t;
        let bc2 = 1. - state.beta2_t;
        let step_size = lr * (bc2.sqrt() / bc1);

        Zip::from(param.view_mut())
            .and(grad)
            .and(&mut state.v)
            .and(&mut state.s)
            .for_each(|p, &g, v, s| {
                let g = g + wd * *p;
                *v = b1 * *v + (1. - b1) * g;
                *s = b2 * *s + (1. - b2) * g.powi(2);
                *p -= step_size * *v / (s.sqrt() + eps);
            });

        Ok(())
    }
}
