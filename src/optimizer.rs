use ndarray::{Array1, Array2};

use crate::layers::Layer;

/// Stochastic gradient descent with classical momentum.
///
/// The velocity buffer of each parameter starts as its first gradient, then
/// follows `v = momentum * v + grad`; parameters move by `-learning_rate * v`.
#[derive(Debug, Clone)]
pub struct Optimizer {
    pub learning_rate: f32,
    pub momentum: f32,
    velocity: Vec<Option<(Array2<f32>, Array1<f32>)>>,
}

impl Optimizer {
    pub fn new(learning_rate: f32, momentum: f32) -> Self {
        Self { learning_rate, momentum, velocity: Vec::new() }
    }

    /// Applies one update to every layer, reading the gradients left by the
    /// last backward pass.
    pub fn step(&mut self, layers: &mut [Box<dyn Layer>]) {
        if self.velocity.len() < layers.len() {
            self.velocity.resize(layers.len(), None);
        }

        let (learning_rate, momentum) = (self.learning_rate, self.momentum);
        for (layer, velocity) in layers.iter_mut().zip(self.velocity.iter_mut()) {
            let params = layer.params_mut();

            let (weight_v, bias_v) = match velocity.take() {
                Some((mut weight_v, mut bias_v)) if momentum != 0.0 => {
                    weight_v.zip_mut_with(&params.weight_grads, |v, &g| *v = momentum * *v + g);
                    bias_v.zip_mut_with(&params.bias_grads, |v, &g| *v = momentum * *v + g);
                    (weight_v, bias_v)
                }
                _ => (params.weight_grads.clone(), params.bias_grads.clone()),
            };

            params.weights.scaled_add(-learning_rate, &weight_v);
            params.bias.scaled_add(-learning_rate, &bias_v);
            *velocity = Some((weight_v, bias_v));
        }
    }
}
