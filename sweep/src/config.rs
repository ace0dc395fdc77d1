use std::{fs, path::Path};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{Parameter, Result, SweepErr};

/// The search strategy of a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    #[default]
    Bayes,
    Grid,
    Random,
}

/// Whether the sweep's metric should be driven down or up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Goal {
    Minimize,
    Maximize,
}

/// The logged value a sweep optimizes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub goal: Goal,
}

impl Metric {
    pub fn minimize(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            goal: Goal::Minimize,
        }
    }

    pub fn maximize(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            goal: Goal::Maximize,
        }
    }
}

/// The hyperparameters swept over when training a sparse autoencoder.
///
/// Missing fields take their default when deserializing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepParameterConfig {
    /// Adam learning rate.
    pub lr: Parameter<f64>,
    /// Decay rate of Adam's first moment estimates.
    pub adam_beta_1: Parameter<f64>,
    /// Decay rate of Adam's second moment estimates.
    pub adam_beta_2: Parameter<f64>,
    /// Adam's numerical stability term.
    pub adam_epsilon: Parameter<f64>,
    /// L2 penalty applied by Adam.
    pub adam_weight_decay: Parameter<f64>,
    /// Weight of the L1 penalty on the learnt activations.
    pub l1_coefficient: Parameter<f64>,
    /// Ratio of learnt features to source activation features.
    ///
    /// Defaults to a fixed 8. The `1..=256` limits some sweep definitions attach to a fixed value
    /// are not kept, since a fixed value is never sampled from them.
    pub width_multiplier: Parameter<usize>,
}

impl Default for SweepParameterConfig {
    fn default() -> Self {
        Self {
            lr: Parameter::fixed(0.001),
            adam_beta_1: Parameter::fixed(0.9),
            adam_beta_2: Parameter::fixed(0.999),
            adam_epsilon: Parameter::fixed(1e-8),
            adam_weight_decay: Parameter::fixed(0.),
            l1_coefficient: Parameter::one_of([0.001, 0.004, 0.006, 0.008, 1.]),
            width_multiplier: Parameter::fixed(8),
        }
    }
}

impl SweepParameterConfig {
    /// Every parameter's name along with whether it is swept, in declaration order.
    fn swept_flags(&self) -> [(&'static str, bool); 7] {
        [
            ("lr", self.lr.is_swept()),
            ("adam_beta_1", self.adam_beta_1.is_swept()),
            ("adam_beta_2", self.adam_beta_2.is_swept()),
            ("adam_epsilon", self.adam_epsilon.is_swept()),
            ("adam_weight_decay", self.adam_weight_decay.is_swept()),
            ("l1_coefficient", self.l1_coefficient.is_swept()),
            ("width_multiplier", self.width_multiplier.is_swept()),
        ]
    }

    fn ranged(&self) -> Option<&'static str> {
        [
            ("lr", self.lr.bounds().is_some()),
            ("adam_beta_1", self.adam_beta_1.bounds().is_some()),
            ("adam_beta_2", self.adam_beta_2.bounds().is_some()),
            ("adam_epsilon", self.adam_epsilon.bounds().is_some()),
            ("adam_weight_decay", self.adam_weight_decay.bounds().is_some()),
            ("l1_coefficient", self.l1_coefficient.bounds().is_some()),
            ("width_multiplier", self.width_multiplier.bounds().is_some()),
        ]
        .into_iter()
        .find_map(|(name, ranged)| ranged.then_some(name))
    }

    /// Checks that every parameter describes a non-empty search space and that every width
    /// multiplier is positive.
    pub fn validate(&self) -> Result<()> {
        self.lr.validate("lr")?;
        self.adam_beta_1.validate("adam_beta_1")?;
        self.adam_beta_2.validate("adam_beta_2")?;
        self.adam_epsilon.validate("adam_epsilon")?;
        self.adam_weight_decay.validate("adam_weight_decay")?;
        self.l1_coefficient.validate("l1_coefficient")?;
        self.width_multiplier.validate("width_multiplier")?;

        if self.width_multiplier.iter().any(|&w| w == 0) {
            return Err(SweepErr::InvalidParameter {
                name: "width_multiplier",
                reason: "must be a positive integer",
            });
        }

        Ok(())
    }
}

/// A sweep over sparse autoencoder training runs, as consumed by the sweep service.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SweepConfig {
    #[serde(default)]
    pub method: Method,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<Metric>,
    #[serde(default)]
    pub parameters: SweepParameterConfig,
}

impl SweepConfig {
    pub fn with_method(self, method: Method) -> Self {
        Self { method, ..self }
    }

    pub fn with_metric(self, metric: Metric) -> Self {
        Self {
            metric: Some(metric),
            ..self
        }
    }

    /// Checks every parameter, and that a grid search only lists discrete values.
    pub fn validate(&self) -> Result<()> {
        self.parameters.validate()?;

        match self.parameters.ranged() {
            Some(name) if self.method == Method::Grid => Err(SweepErr::InvalidParameter {
                name,
                reason: "a grid search needs a fixed value or a list of values",
            }),
            _ => Ok(()),
        }
    }

    /// The names of the parameters that vary between runs.
    pub fn swept_parameters(&self) -> Vec<&'static str> {
        self.parameters
            .swept_flags()
            .into_iter()
            .filter_map(|(name, swept)| swept.then_some(name))
            .collect()
    }

    /// Serializes the config as pretty printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses and validates a config.
    ///
    /// # Arguments
    /// * `json` - The config as JSON. Missing fields take their default.
    ///
    /// # Returns
    /// The config, or an error if the JSON is malformed or the config invalid.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;

        debug!("loaded sweep config from {}", path.display());
        Ok(config)
    }
}
