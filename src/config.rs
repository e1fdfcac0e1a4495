//! Run configuration, loaded from TOML with every field defaulted.
//!
//! ```toml
//! case = 2
//! data_dir = "./data/data_mnist"
//! results_path = "results.txt"
//! seed = 7
//!
//! [hyperparameters]
//! learning_rate = 0.1
//! momentum = 0.9
//! activation = "relu6"
//!
//! [grid]
//! enabled = true
//! strategy = "one_at_a_time"
//! learning_rates = [0.01, 0.03, 0.05]
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::activation::ActivationType;
use crate::case::CaseSpec;
use crate::error::ConfigError;
use crate::grid_search::{Dimension, GridSearch, SweepStrategy};
use crate::hyperparameters::Hyperparameters;
use crate::mnist::DEFAULT_MIRROR;
use crate::utils::linspace;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub enabled: bool,
    pub strategy: SweepStrategy,
    pub learning_rates: Vec<f64>,
    pub momenta: Vec<f64>,
    pub activations: Vec<ActivationType>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            strategy: SweepStrategy::Cartesian,
            learning_rates: linspace(0.01, 0.05, 10),
            momenta: linspace(0.5, 1.0, 10),
            activations: ActivationType::ALL.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Case to run
    pub case: u32,
    /// Where the MNIST files are cached
    pub data_dir: PathBuf,
    /// Base URL the gzip files are fetched from
    pub mirror: String,
    pub results_path: PathBuf,
    /// Seed for weight initialization; random when absent
    pub seed: Option<u64>,
    pub hyperparameters: Hyperparameters,
    pub grid: GridConfig,
    /// Overrides the built-in case catalog when non-empty
    pub cases: Vec<CaseSpec>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            case: 1,
            data_dir: PathBuf::from("./data/data_mnist"),
            mirror: DEFAULT_MIRROR.to_string(),
            results_path: PathBuf::from("results.txt"),
            seed: None,
            hyperparameters: Hyperparameters::default(),
            grid: GridConfig::default(),
            cases: Vec::new(),
        }
    }
}

impl RunConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        contents.parse()
    }

    pub fn case_specs(&self) -> Vec<CaseSpec> {
        if self.cases.is_empty() {
            CaseSpec::default_catalog()
        } else {
            self.cases.clone()
        }
    }

    pub fn grid_search(&self) -> GridSearch {
        let mut grid = GridSearch::new(self.hyperparameters)
            .with_strategy(self.grid.strategy)
            .with_dimension(Dimension::LearningRate(self.grid.learning_rates.clone()))
            .with_dimension(Dimension::Momentum(self.grid.momenta.clone()))
            .with_dimension(Dimension::Activation(self.grid.activations.clone()));
        grid.set_enabled(self.grid.enabled);
        grid
    }
}

impl std::str::FromStr for RunConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(s)?)
    }
}
