pub mod feed_forward;

use std::fmt::Debug;
use ndarray::{Array1, Array2};
use crate::activation::ActivationType;

/// Trainable state of a dense layer, plus the caches backprop reads.
///
/// Weights are stored `(inputs × neurons)` so a batch `(n × inputs)` maps to
/// `(n × neurons)` with a single matrix product.
#[derive(Debug, Clone)]
pub struct LayerParams {
    pub neurons: usize,
    pub inputs: usize,
    pub weights: Array2<f32>,
    pub bias: Array1<f32>,
    /// `None` for the output layer, whose logits go straight to log-softmax.
    pub activation: Option<ActivationType>,
    pub weight_grads: Array2<f32>,
    pub bias_grads: Array1<f32>,
    pub input_cache: Array2<f32>,
    pub preactivation_cache: Array2<f32>,
}

impl LayerParams {
    pub fn parameter_count(&self) -> usize {
        self.weights.len() + self.bias.len()
    }
}

pub trait Layer: Debug {
    /// Training forward pass; caches what `backward` needs.
    fn forward(&mut self, input: &Array2<f32>) -> Array2<f32>;

    /// Inference forward pass, leaves the caches alone.
    fn infer(&self, input: &Array2<f32>) -> Array2<f32>;

    /// Stores parameter gradients and returns the gradient for the layer below.
    fn backward(&mut self, grad_output: &Array2<f32>) -> Array2<f32>;

    fn params(&self) -> &LayerParams;
    fn params_mut(&mut self) -> &mut LayerParams;

    fn parameter_count(&self) -> usize {
        self.params().parameter_count()
    }

    fn zero_grads(&mut self) {
        let params = self.params_mut();
        params.weight_grads.fill(0.0);
        params.bias_grads.fill(0.0);
    }
}

pub use feed_forward::FeedForwardLayer;
