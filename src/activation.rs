use std::fmt;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Slope applied to negative inputs by `LeakyReLU`.
pub const LEAKY_SLOPE: f32 = 0.01;

/// Upper clamp of the bounded ReLU.
pub const RELU6_CAP: f32 = 6.0;

/// Enum representing the hidden-layer nonlinearities a model can be built with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivationType {
    #[serde(rename = "relu6")]
    ReLU6,
    #[serde(rename = "leakyrelu")]
    LeakyReLU,
    #[serde(rename = "relu")]
    ReLU,
}

impl ActivationType {
    /// Every selectable activation, in sweep order.
    pub const ALL: [ActivationType; 3] = [
        ActivationType::ReLU6,
        ActivationType::LeakyReLU,
        ActivationType::ReLU,
    ];

    /// Applies the activation function to a given input
    pub fn apply(&self, x: f32) -> f32 {
        match self {
            ActivationType::ReLU6 => x.clamp(0.0, RELU6_CAP),
            ActivationType::LeakyReLU => if x > 0.0 { x } else { LEAKY_SLOPE * x },
            ActivationType::ReLU => x.max(0.0),
        }
    }

    /// Computes the derivative of the activation function at the preactivation `x`
    pub fn derivative(&self, x: f32) -> f32 {
        match self {
            ActivationType::ReLU6 => if x > 0.0 && x < RELU6_CAP { 1.0 } else { 0.0 },
            ActivationType::LeakyReLU => if x > 0.0 { 1.0 } else { LEAKY_SLOPE },
            ActivationType::ReLU => if x > 0.0 { 1.0 } else { 0.0 },
        }
    }

    pub fn forward(&self, preactivation: &Array2<f32>) -> Array2<f32> {
        preactivation.mapv(|x| self.apply(x))
    }

    /// Short name used in results records and config files.
    pub fn name(&self) -> &'static str {
        match self {
            ActivationType::ReLU6 => "relu6",
            ActivationType::LeakyReLU => "leakyrelu",
            ActivationType::ReLU => "relu",
        }
    }
}

impl fmt::Display for ActivationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_activation_functions() {
        // ReLU6 tests
        assert_eq!(ActivationType::ReLU6.apply(-1.0), 0.0);
        assert_eq!(ActivationType::ReLU6.apply(3.0), 3.0);
        assert_eq!(ActivationType::ReLU6.apply(9.0), 6.0);

        // LeakyReLU tests
        assert!((ActivationType::LeakyReLU.apply(-2.0) + 0.02).abs() < 1e-7);
        assert_eq!(ActivationType::LeakyReLU.apply(2.0), 2.0);

        // ReLU tests
        assert_eq!(ActivationType::ReLU.apply(-1.0), 0.0);
        assert_eq!(ActivationType::ReLU.apply(2.0), 2.0);
    }

    #[test]
    fn test_activation_derivatives() {
        assert_eq!(ActivationType::ReLU6.derivative(-1.0), 0.0);
        assert_eq!(ActivationType::ReLU6.derivative(1.0), 1.0);
        assert_eq!(ActivationType::ReLU6.derivative(7.0), 0.0);

        assert_eq!(ActivationType::LeakyReLU.derivative(-1.0), LEAKY_SLOPE);
        assert_eq!(ActivationType::LeakyReLU.derivative(2.0), 1.0);

        assert_eq!(ActivationType::ReLU.derivative(-1.0), 0.0);
        assert_eq!(ActivationType::ReLU.derivative(2.0), 1.0);
    }

    #[test]
    fn test_forward_matrix() {
        let z = array![[-1.0, 0.5], [7.0, 2.0]];
        let out = ActivationType::ReLU6.forward(&z);
        assert_eq!(out, array![[0.0, 0.5], [6.0, 2.0]]);
    }

    #[test]
    fn test_names_round_trip_through_serde_names() {
        for activation in ActivationType::ALL {
            assert_eq!(activation.to_string(), activation.name());
        }
        assert_eq!(ActivationType::LeakyReLU.name(), "leakyrelu");
    }
}
