//! Hyper-parameters of a multilayer perceptron and its training run.
//!
//! A configuration can be built in code or parsed from JSON:
//!
//! ```json
//! {
//!   "geometry": [2, 20, 2],
//!   "learning_rate": 0.05,
//!   "num_epochs": 10,
//!   "batch_size": 30,
//!   "random_seed": 1234
//! }
//! ```
//!
//! `geometry` lists the input dimension, every hidden layer size and the number of classes.
//! Only `geometry` and `learning_rate` are required.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

fn default_num_epochs() -> usize {
    10
}

fn default_batch_size() -> usize {
    30
}

fn default_random_seed() -> u64 {
    1234
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MlpConfig {
    /// Layer sizes: input dimension, hidden sizes..., number of classes.
    pub geometry: Vec<usize>,

    /// Step size of gradient descent.
    pub learning_rate: f64,

    #[serde(default = "default_num_epochs")]
    pub num_epochs: usize,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Seed for parameter initialization and shuffling.
    #[serde(default = "default_random_seed")]
    pub random_seed: u64,
}

impl MlpConfig {
    pub fn new(geometry: Vec<usize>, learning_rate: f64) -> Self {
        Self {
            geometry,
            learning_rate,
            num_epochs: default_num_epochs(),
            batch_size: default_batch_size(),
            random_seed: default_random_seed(),
        }
    }

    pub fn with_num_epochs(self, num_epochs: usize) -> Self {
        Self { num_epochs, ..self }
    }

    pub fn with_batch_size(self, batch_size: usize) -> Self {
        Self { batch_size, ..self }
    }

    pub fn with_random_seed(self, random_seed: u64) -> Self {
        Self {
            random_seed,
            ..self
        }
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn num_hidden_layers(&self) -> usize {
        self.geometry.len().saturating_sub(2)
    }

    pub fn validate(&self) -> Result<()> {
        if self.geometry.len() < 2 {
            return Err(Error::Config(format!(
                "geometry needs at least an input and an output size, got {:?}",
                self.geometry
            )));
        }
        if let Some(position) = self.geometry.iter().position(|&size| size == 0) {
            return Err(Error::Config(format!(
                "layer size at position {} is zero",
                position
            )));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(Error::Config(format!(
                "learning rate must be positive and finite, got {}",
                self.learning_rate
            )));
        }
        if self.batch_size == 0 {
            return Err(Error::Config("batch size must be positive".to_string()));
        }
        Ok(())
    }

    /// Check that `geometry` starts with `input_dim` and ends with `num_classes` of a dataset.
    pub fn ensure_fits(&self, input_dim: usize, num_classes: usize) -> Result<()> {
        let (first, last) = (self.geometry.first(), self.geometry.last());
        if first != Some(&input_dim) || last != Some(&num_classes) {
            return Err(Error::Config(format!(
                "geometry {:?} does not fit data with {} features and {} classes",
                self.geometry, input_dim, num_classes
            )));
        }
        Ok(())
    }
}
