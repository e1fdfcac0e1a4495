use std::fmt;

use serde::{Deserialize, Serialize};

use crate::activation::ActivationType;

/// Hyperparameters for one training run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hyperparameters {
    /// Learning rate for SGD
    pub learning_rate: f64,

    /// SGD momentum factor
    pub momentum: f64,

    /// Nonlinearity used by both hidden layers
    pub activation: ActivationType,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Hyperparameters {
            learning_rate: 0.1,
            momentum: 0.9,
            activation: ActivationType::ReLU6,
        }
    }
}

impl fmt::Display for Hyperparameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "lr={} momentum={} activation={}",
            self.learning_rate, self.momentum, self.activation
        )
    }
}
