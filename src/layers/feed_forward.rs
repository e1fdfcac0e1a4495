use crate::activation::ActivationType;
use crate::layers::Layer;
use ndarray::{Array1, Array2, Axis};
use rand::Rng;

use super::LayerParams;

#[derive(Debug, Clone)]
pub struct FeedForwardLayer {
    pub params: LayerParams,
}

impl FeedForwardLayer {
    /// Builds a dense layer initialized like a standard linear layer: weights
    /// and bias drawn uniformly from `±1/sqrt(inputs)`.
    pub fn new<R: Rng>(
        inputs: usize,
        neurons: usize,
        activation: Option<ActivationType>,
        rng: &mut R,
    ) -> Self {
        assert!(inputs > 0 && neurons > 0, "Layer dimensions must be non-zero");
        let bound = 1.0 / (inputs as f32).sqrt();

        let weights: Array2<f32> = Array2::from_shape_fn((inputs, neurons), |_| rng.random_range(-bound..bound));
        let bias: Array1<f32> = Array1::from_shape_fn(neurons, |_| rng.random_range(-bound..bound));

        let params = LayerParams {
            neurons,
            inputs,
            weights,
            bias,
            activation,
            weight_grads: Array2::zeros((inputs, neurons)),
            bias_grads: Array1::zeros(neurons),
            input_cache: Array2::zeros((0, inputs)),
            preactivation_cache: Array2::zeros((0, neurons)),
        };

        FeedForwardLayer {
            params
        }
    }

    fn preactivation(&self, input: &Array2<f32>) -> Array2<f32> {
        assert_eq!(input.ncols(), self.params.inputs, "Input size does not match layer's input size");
        input.dot(&self.params.weights) + &self.params.bias
    }

    fn activate(&self, preactivation: &Array2<f32>) -> Array2<f32> {
        match self.params.activation {
            Some(activation) => activation.forward(preactivation),
            None => preactivation.clone(),
        }
    }
}

impl Layer for FeedForwardLayer {
    fn forward(&mut self, input: &Array2<f32>) -> Array2<f32> {
        let preactivation = self.preactivation(input);
        let output = self.activate(&preactivation);
        self.params.input_cache = input.clone();
        self.params.preactivation_cache = preactivation;
        output
    }

    fn infer(&self, input: &Array2<f32>) -> Array2<f32> {
        self.activate(&self.preactivation(input))
    }

    fn backward(&mut self, grad_output: &Array2<f32>) -> Array2<f32> {
        let delta = match self.params.activation {
            Some(activation) => {
                grad_output * &self.params.preactivation_cache.mapv(|x| activation.derivative(x))
            }
            None => grad_output.clone(),
        };

        // (inputs × n)·(n × neurons) matches the weight layout
        self.params.weight_grads = self.params.input_cache.t().dot(&delta);
        self.params.bias_grads = delta.sum_axis(Axis(0));

        delta.dot(&self.params.weights.t())
    }

    fn params(&self) -> &LayerParams {
        &self.params
    }

    fn params_mut(&mut self) -> &mut LayerParams {
        &mut self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::{rngs::StdRng, SeedableRng};

    fn layer(activation: Option<ActivationType>) -> FeedForwardLayer {
        let mut rng = StdRng::seed_from_u64(7);
        FeedForwardLayer::new(3, 2, activation, &mut rng)
    }

    #[test]
    fn test_initialization_bounds() {
        let layer = layer(Some(ActivationType::ReLU));
        let bound = 1.0 / 3f32.sqrt();
        assert_eq!(layer.params.weights.dim(), (3, 2));
        assert_eq!(layer.params.bias.len(), 2);
        assert!(layer.params.weights.iter().all(|w| w.abs() <= bound));
        assert_eq!(layer.parameter_count(), 3 * 2 + 2);
    }

    #[test]
    fn test_forward_shape_and_relu() {
        let mut layer = layer(Some(ActivationType::ReLU));
        let output = layer.forward(&array![[1.0, 2.0, 3.0], [-1.0, 0.0, 1.0]]);
        assert_eq!(output.dim(), (2, 2));
        assert!(output.iter().all(|&x| x >= 0.0));
        assert_eq!(layer.params.input_cache.nrows(), 2);
    }

    #[test]
    #[should_panic(expected = "Input size does not match layer's input size")]
    fn test_forward_invalid_input_size() {
        let mut layer = layer(None);
        layer.forward(&array![[1.0, 2.0]]);
    }

    #[test]
    fn test_backward_gradients() {
        let mut layer = layer(None);
        let input = array![[0.5, -1.0, 2.0]];
        layer.forward(&input);
        // d(sum of outputs)/dW[i][j] = input[i]
        let grad_input = layer.backward(&array![[1.0, 1.0]]);
        assert_eq!(layer.params.weight_grads.column(0).to_vec(), vec![0.5, -1.0, 2.0]);
        assert_eq!(layer.params.bias_grads.to_vec(), vec![1.0, 1.0]);
        let row_sums = layer.params.weights.sum_axis(Axis(1));
        for (g, w) in grad_input.row(0).iter().zip(row_sums.iter()) {
            assert!((g - w).abs() < 1e-6);
        }
    }
}
