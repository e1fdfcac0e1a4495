use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

use crate::case::Case;
use crate::grid_search::GridSearch;
use crate::model::{Evaluation, Model, ModelConfig};
use crate::results::{ResultsSink, TrainingStats};
use crate::trainer::{Trainer, TrainingResult};

/// What one configuration achieved on a case.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunReport {
    pub result: TrainingResult,
    pub test: Evaluation,
    pub parameter_count: usize,
    pub within_size_limit: bool,
    pub meets_accuracy: bool,
}

impl RunReport {
    pub fn passed(&self) -> bool {
        self.within_size_limit && self.meets_accuracy
    }
}

/// Trains a fresh model per grid configuration and checks it against the case limits.
#[derive(Debug, Clone)]
pub struct CaseRunner {
    model_config: Option<ModelConfig>,
    seed: Option<u64>,
    stop_margin: Option<Duration>,
}

impl CaseRunner {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            model_config: None,
            seed,
            stop_margin: None,
        }
    }

    /// Overrides the default 500/256 architecture sized from the case.
    pub fn with_model_config(mut self, model_config: ModelConfig) -> Self {
        self.model_config = Some(model_config);
        self
    }

    pub fn with_stop_margin(mut self, stop_margin: Duration) -> Self {
        self.stop_margin = Some(stop_margin);
        self
    }

    pub fn run(&self, case: &Case, grid_search: &GridSearch, sink: &mut ResultsSink) -> anyhow::Result<Vec<RunReport>> {
        info!(
            "Case #{} ({}): {} train / {} test examples, {}s budget",
            case.id,
            case.description,
            case.train_labels.len(),
            case.test_labels.len(),
            case.limits.time_limit
        );

        let model_config = self
            .model_config
            .clone()
            .unwrap_or_else(|| ModelConfig::new(case.input_size(), case.output_size));
        let time_budget = Duration::try_from_secs_f64(case.limits.time_limit)?;
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let reports = grid_search.run(|index, hyperparameters| -> anyhow::Result<RunReport> {
            let mut model = Model::new(&model_config, hyperparameters.activation, &mut rng);
            let mut trainer = Trainer::new(*hyperparameters);
            if let Some(margin) = self.stop_margin {
                trainer = trainer.with_stop_margin(margin);
            }

            let result = trainer.train(&mut model, &case.train_inputs, &case.train_labels, time_budget);
            sink.record(TrainingStats::from(&result));

            let test = model.evaluate(&case.test_inputs, &case.test_labels);
            let parameter_count = model.parameter_count();
            let report = RunReport {
                result,
                test,
                parameter_count,
                within_size_limit: parameter_count <= case.limits.size_limit,
                meets_accuracy: test.accuracy() >= case.limits.test_limit,
            };

            info!(
                "Run {}: {} | steps={} loss={:.5} train={}/{} test={:.4} stop={} in {:.2?}",
                index,
                hyperparameters,
                result.steps,
                result.loss,
                result.correct,
                result.total,
                test.accuracy(),
                result.stop_reason,
                result.elapsed
            );
            if !report.within_size_limit {
                warn!("Model has {} parameters, limit is {}", parameter_count, case.limits.size_limit);
            }
            if !report.meets_accuracy {
                warn!("Test accuracy {:.4} below {}", test.accuracy(), case.limits.test_limit);
            }
            Ok(report)
        })?;

        if let Some(best) = reports
            .iter()
            .filter(|report| report.passed())
            .min_by_key(|report| report.result.steps)
        {
            info!("Best passing run: {} in {} steps", best.result.hyperparameters, best.result.steps);
        }

        Ok(reports)
    }
}
