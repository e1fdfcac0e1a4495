//! Hyperparameter sweeps.
//!
//! A [`GridSearch`] holds a base [`Hyperparameters`] set and a list of
//! [`Dimension`]s. When enabled it expands them into concrete configurations
//! according to its [`SweepStrategy`] and runs a caller-supplied closure once
//! per configuration, strictly in order. When disabled it yields the base set
//! alone.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::activation::ActivationType;
use crate::hyperparameters::Hyperparameters;
use crate::utils::linspace;

/// One swept hyperparameter and its candidate values.
#[derive(Debug, Clone, PartialEq)]
pub enum Dimension {
    LearningRate(Vec<f64>),
    Momentum(Vec<f64>),
    Activation(Vec<ActivationType>),
}

impl Dimension {
    pub fn name(&self) -> &'static str {
        match self {
            Dimension::LearningRate(_) => "lr",
            Dimension::Momentum(_) => "momentum",
            Dimension::Activation(_) => "activation",
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Dimension::LearningRate(values) | Dimension::Momentum(values) => values.len(),
            Dimension::Activation(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Overwrites the matching field of `hyperparameters` with candidate `index`.
    fn apply(&self, index: usize, hyperparameters: &mut Hyperparameters) {
        match self {
            Dimension::LearningRate(values) => hyperparameters.learning_rate = values[index],
            Dimension::Momentum(values) => hyperparameters.momentum = values[index],
            Dimension::Activation(values) => hyperparameters.activation = values[index],
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepStrategy {
    /// Every combination of every dimension, last dimension varying fastest.
    #[default]
    Cartesian,
    /// Each dimension swept on its own, the others held at their base value.
    OneAtATime,
    /// `samples` combinations drawn uniformly with a fixed seed.
    Random { samples: usize, seed: u64 },
}

#[derive(Debug, Clone)]
pub struct GridSearch {
    base: Hyperparameters,
    dimensions: Vec<Dimension>,
    strategy: SweepStrategy,
    enabled: bool,
}

impl GridSearch {
    /// A disabled search over no dimensions.
    pub fn new(base: Hyperparameters) -> Self {
        Self {
            base,
            dimensions: Vec::new(),
            strategy: SweepStrategy::default(),
            enabled: false,
        }
    }

    /// The sweep used for MNIST: ten learning rates in [0.01, 0.05], ten
    /// momenta in [0.5, 1.0] and every activation.
    pub fn mnist_default(base: Hyperparameters) -> Self {
        Self::new(base)
            .with_dimension(Dimension::LearningRate(linspace(0.01, 0.05, 10)))
            .with_dimension(Dimension::Momentum(linspace(0.5, 1.0, 10)))
            .with_dimension(Dimension::Activation(ActivationType::ALL.to_vec()))
    }

    pub fn with_dimension(mut self, dimension: Dimension) -> Self {
        self.dimensions.push(dimension);
        self
    }

    pub fn with_strategy(mut self, strategy: SweepStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn base(&self) -> &Hyperparameters {
        &self.base
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    pub fn strategy(&self) -> SweepStrategy {
        self.strategy
    }

    /// Every configuration a run would visit, in order.
    pub fn configurations(&self) -> Vec<Hyperparameters> {
        if !self.enabled {
            return vec![self.base];
        }
        match self.strategy {
            SweepStrategy::Cartesian => self.cartesian(),
            SweepStrategy::OneAtATime => self.one_at_a_time(),
            SweepStrategy::Random { samples, seed } => self.random(samples, seed),
        }
    }

    fn cartesian(&self) -> Vec<Hyperparameters> {
        if self.dimensions.iter().any(Dimension::is_empty) {
            return Vec::new();
        }

        let total: usize = self.dimensions.iter().map(Dimension::len).product();
        let mut configurations = Vec::with_capacity(total);
        let mut indices = vec![0; self.dimensions.len()];
        for _ in 0..total {
            let mut hyperparameters = self.base;
            for (dimension, &index) in self.dimensions.iter().zip(&indices) {
                dimension.apply(index, &mut hyperparameters);
            }
            configurations.push(hyperparameters);

            // odometer increment, rightmost first
            for (position, dimension) in self.dimensions.iter().enumerate().rev() {
                indices[position] += 1;
                if indices[position] < dimension.len() {
                    break;
                }
                indices[position] = 0;
            }
        }
        configurations
    }

    fn one_at_a_time(&self) -> Vec<Hyperparameters> {
        let mut configurations = Vec::new();
        for dimension in &self.dimensions {
            for index in 0..dimension.len() {
                let mut hyperparameters = self.base;
                dimension.apply(index, &mut hyperparameters);
                configurations.push(hyperparameters);
            }
        }
        configurations
    }

    fn random(&self, samples: usize, seed: u64) -> Vec<Hyperparameters> {
        let mut rng = fastrand::Rng::with_seed(seed);
        (0..samples)
            .map(|_| {
                let mut hyperparameters = self.base;
                for dimension in self.dimensions.iter().filter(|d| !d.is_empty()) {
                    dimension.apply(rng.usize(..dimension.len()), &mut hyperparameters);
                }
                hyperparameters
            })
            .collect()
    }

    /// Calls `run_one` with the index and hyperparameters of each
    /// configuration in turn, stopping at the first error.
    pub fn run<T, E, F>(&self, mut run_one: F) -> Result<Vec<T>, E>
    where
        F: FnMut(usize, &Hyperparameters) -> Result<T, E>,
    {
        let configurations = self.configurations();
        if self.enabled {
            let names: Vec<&str> = self.dimensions.iter().map(Dimension::name).collect();
            info!(
                "Grid search over [{}]: {} configurations ({:?})",
                names.join(", "),
                configurations.len(),
                self.strategy
            );
        }

        let mut outputs = Vec::with_capacity(configurations.len());
        for (index, hyperparameters) in configurations.iter().enumerate() {
            outputs.push(run_one(index, hyperparameters)?);
        }
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_grid() -> GridSearch {
        GridSearch::new(Hyperparameters::default())
            .with_dimension(Dimension::LearningRate(vec![0.01, 0.02]))
            .with_dimension(Dimension::Activation(vec![ActivationType::ReLU, ActivationType::LeakyReLU, ActivationType::ReLU6]))
    }

    #[test]
    fn test_disabled_yields_base() {
        let grid = small_grid();
        assert_eq!(grid.configurations(), vec![Hyperparameters::default()]);
    }

    #[test]
    fn test_default_strategy_is_cartesian() {
        assert_eq!(SweepStrategy::default(), SweepStrategy::Cartesian);
        assert_eq!(GridSearch::new(Hyperparameters::default()).strategy(), SweepStrategy::Cartesian);
    }

    #[test]
    fn test_cartesian_order() {
        let mut grid = small_grid();
        grid.set_enabled(true);
        let configurations = grid.configurations();
        assert_eq!(configurations.len(), 6);
        assert_eq!(configurations[0].learning_rate, 0.01);
        assert_eq!(configurations[0].activation, ActivationType::ReLU);
        assert_eq!(configurations[1].activation, ActivationType::LeakyReLU);
        assert_eq!(configurations[3].learning_rate, 0.02);
        assert_eq!(configurations[3].activation, ActivationType::ReLU);
        assert!(configurations.iter().all(|hp| hp.momentum == 0.9));
    }

    #[test]
    fn test_cartesian_with_empty_dimension() {
        let mut grid = small_grid().with_dimension(Dimension::Momentum(Vec::new()));
        grid.set_enabled(true);
        assert!(grid.configurations().is_empty());
    }

    #[test]
    fn test_one_at_a_time() {
        let mut grid = small_grid().with_strategy(SweepStrategy::OneAtATime);
        grid.set_enabled(true);
        let configurations = grid.configurations();
        assert_eq!(configurations.len(), 5);
        assert_eq!(configurations[1].learning_rate, 0.02);
        assert_eq!(configurations[1].activation, ActivationType::ReLU6);
        assert_eq!(configurations[2].learning_rate, 0.1);
        assert_eq!(configurations[2].activation, ActivationType::ReLU);
    }

    #[test]
    fn test_random_is_seeded() {
        let mut grid = small_grid().with_strategy(SweepStrategy::Random { samples: 8, seed: 42 });
        grid.set_enabled(true);
        let first = grid.configurations();
        assert_eq!(first.len(), 8);
        assert_eq!(first, grid.configurations());
        assert!(first.iter().all(|hp| hp.learning_rate == 0.01 || hp.learning_rate == 0.02));
    }

    #[test]
    fn test_mnist_default_size() {
        let mut grid = GridSearch::mnist_default(Hyperparameters::default());
        grid.set_enabled(true);
        assert_eq!(grid.configurations().len(), 300);
    }

    #[test]
    fn test_run_stops_at_first_error() {
        let mut grid = small_grid();
        grid.set_enabled(true);
        let mut calls = 0;
        let result: Result<Vec<()>, String> = grid.run(|index, _| {
            calls += 1;
            if index == 2 { Err("boom".to_string()) } else { Ok(()) }
        });
        assert_eq!(result, Err("boom".to_string()));
        assert_eq!(calls, 3);
    }
}
