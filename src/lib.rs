mod activation;
mod hyperparameters;
mod loss;
mod model;
mod optimizer;
mod trainer;
mod utils;

pub mod case;
pub mod config;
pub mod error;
pub mod grid_search;
pub mod layers;
pub mod mnist;
pub mod results;
pub mod runner;

pub use activation::ActivationType;
pub use case::{Case, CaseBuilder, CaseSpec, Limits};
pub use config::RunConfig;
pub use grid_search::{Dimension, GridSearch, SweepStrategy};
pub use hyperparameters::Hyperparameters;
pub use layers::{FeedForwardLayer, Layer};
pub use loss::{log_softmax, Loss};
pub use mnist::{Dataset, MnistLoader};
pub use model::{Evaluation, Model, ModelConfig, MNIST_INPUT_SIZE};
pub use optimizer::Optimizer;
pub use results::{ResultsSink, TrainingStats};
pub use runner::{CaseRunner, RunReport};
pub use trainer::{StopReason, Timer, Trainer, TrainingResult};
pub use utils::linspace;
