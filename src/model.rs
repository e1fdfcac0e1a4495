use ndarray::Array2;
use rand::Rng;

use crate::activation::ActivationType;
use crate::layers::{FeedForwardLayer, Layer};
use crate::loss::{log_softmax, Loss};
use crate::optimizer::Optimizer;
use crate::utils::argmax_rows;

/// Pixels in one flattened MNIST image.
pub const MNIST_INPUT_SIZE: usize = 28 * 28;

/// Shape of a fully-connected classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub input_size: usize,
    pub hidden_sizes: Vec<usize>,
    pub output_size: usize,
}

impl ModelConfig {
    /// Two hidden layers of 500 and 256 units.
    pub fn new(input_size: usize, output_size: usize) -> Self {
        Self {
            input_size,
            hidden_sizes: vec![500, 256],
            output_size,
        }
    }

    pub fn with_hidden_sizes(mut self, hidden_sizes: Vec<usize>) -> Self {
        self.hidden_sizes = hidden_sizes;
        self
    }
}

/// Accuracy and loss of a model over a labelled batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub correct: usize,
    pub total: usize,
    pub loss: f32,
}

impl Evaluation {
    pub fn accuracy(&self) -> f64 {
        self.correct as f64 / self.total as f64
    }
}

#[derive(Debug)]
pub struct Model {
    pub layers: Vec<Box<dyn Layer>>,
    pub loss: Loss,
    activation: ActivationType,
}

impl Model {
    /// Create a classifier mapping flattened inputs to class log-probabilities
    ///
    /// # Arguments
    ///
    /// * `config` - Input width, hidden widths and class count
    /// * `activation` - Nonlinearity after every hidden layer
    /// * `rng` - Source for weight initialization
    pub fn new<R: Rng>(config: &ModelConfig, activation: ActivationType, rng: &mut R) -> Self {
        let mut layers: Vec<Box<dyn Layer>> = Vec::with_capacity(config.hidden_sizes.len() + 1);
        let mut inputs = config.input_size;
        for &neurons in &config.hidden_sizes {
            layers.push(Box::new(FeedForwardLayer::new(inputs, neurons, Some(activation), rng)));
            inputs = neurons;
        }
        layers.push(Box::new(FeedForwardLayer::new(inputs, config.output_size, None, rng)));

        Model {
            layers,
            loss: Loss::NegativeLogLikelihood,
            activation,
        }
    }

    pub fn activation(&self) -> ActivationType {
        self.activation
    }

    pub fn input_size(&self) -> usize {
        self.layers[0].params().inputs
    }

    pub fn output_size(&self) -> usize {
        self.layers[self.layers.len() - 1].params().neurons
    }

    /// Training forward pass over a batch `(n × input_size)`; returns
    /// `(n × output_size)` log-probabilities and keeps caches for `backward`.
    pub fn forward(&mut self, input: &Array2<f32>) -> Array2<f32> {
        let mut layers = self.layers.iter_mut();
        let mut current = match layers.next() {
            Some(first) => first.forward(input),
            None => input.clone(),
        };
        for layer in layers {
            current = layer.forward(&current);
        }
        log_softmax(&current)
    }

    pub fn infer(&self, input: &Array2<f32>) -> Array2<f32> {
        let mut layers = self.layers.iter();
        let mut current = match layers.next() {
            Some(first) => first.infer(input),
            None => input.clone(),
        };
        for layer in layers {
            current = layer.infer(&current);
        }
        log_softmax(&current)
    }

    /// Index of the most likely class for each row.
    pub fn predict(log_probs: &Array2<f32>) -> Vec<usize> {
        argmax_rows(log_probs)
    }

    pub fn calculate_loss(&self, log_probs: &Array2<f32>, labels: &[usize]) -> f32 {
        self.loss.calculate(log_probs, labels)
    }

    /// Back-propagates the loss of the last `forward` output into every layer's gradients.
    pub fn backward(&mut self, log_probs: &Array2<f32>, labels: &[usize]) {
        let mut grad = self.loss.gradient(log_probs, labels);
        for layer in self.layers.iter_mut().rev() {
            grad = layer.backward(&grad);
        }
    }

    pub fn update_parameters(&mut self, optimizer: &mut Optimizer) {
        optimizer.step(&mut self.layers);
    }

    pub fn zero_gradients(&mut self) {
        for layer in &mut self.layers {
            layer.zero_grads();
        }
    }

    pub fn parameter_count(&self) -> usize {
        self.layers.iter().map(|layer| layer.parameter_count()).sum()
    }

    pub fn evaluate(&self, inputs: &Array2<f32>, labels: &[usize]) -> Evaluation {
        let log_probs = self.infer(inputs);
        let correct = count_correct(&Self::predict(&log_probs), labels);
        Evaluation {
            correct,
            total: labels.len(),
            loss: self.calculate_loss(&log_probs, labels),
        }
    }
}

pub fn count_correct(predictions: &[usize], labels: &[usize]) -> usize {
    predictions.iter().zip(labels).filter(|(p, l)| p == l).count()
}
