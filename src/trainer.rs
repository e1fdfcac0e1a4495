use std::fmt;
use std::time::{Duration, Instant};

use ndarray::Array2;
use tracing::{debug, warn};

use crate::hyperparameters::Hyperparameters;
use crate::model::{count_correct, Model};
use crate::optimizer::Optimizer;

/// Training stops once less than this much of the budget remains.
pub const DEFAULT_STOP_MARGIN: Duration = Duration::from_millis(100);

const PROGRESS_EVERY: usize = 100;

/// Wall-clock budget measured from construction.
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    start: Instant,
    budget: Duration,
}

impl Timer {
    pub fn start(budget: Duration) -> Self {
        Self { start: Instant::now(), budget }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Seconds left in the budget; negative once it is overrun.
    pub fn time_left(&self) -> f64 {
        self.budget.as_secs_f64() - self.elapsed().as_secs_f64()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Every training example classified correctly.
    PerfectFit,
    /// Less than the stop margin left in the budget.
    TimeBudget,
    /// Loss became NaN or infinite.
    Diverged,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StopReason::PerfectFit => "perfect fit",
            StopReason::TimeBudget => "time budget",
            StopReason::Diverged => "diverged",
        };
        f.write_str(name)
    }
}

/// Outcome of one training run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingResult {
    /// Optimizer steps applied.
    pub steps: usize,
    /// Loss at the final forward pass.
    pub loss: f32,
    pub correct: usize,
    pub total: usize,
    pub elapsed: Duration,
    pub stop_reason: StopReason,
    pub hyperparameters: Hyperparameters,
}

impl TrainingResult {
    pub fn train_accuracy(&self) -> f64 {
        self.correct as f64 / self.total as f64
    }
}

#[derive(Debug, Clone)]
pub struct Trainer {
    hyperparameters: Hyperparameters,
    stop_margin: Duration,
}

impl Trainer {
    pub fn new(hyperparameters: Hyperparameters) -> Self {
        Self {
            hyperparameters,
            stop_margin: DEFAULT_STOP_MARGIN,
        }
    }

    pub fn with_stop_margin(mut self, stop_margin: Duration) -> Self {
        self.stop_margin = stop_margin;
        self
    }

    pub fn hyperparameters(&self) -> &Hyperparameters {
        &self.hyperparameters
    }

    /// Full-batch gradient descent on `inputs` until every example is
    /// classified correctly or the budget runs out.
    ///
    /// The model is updated in place; its final parameters are those of the
    /// last completed step.
    pub fn train(
        &self,
        model: &mut Model,
        inputs: &Array2<f32>,
        labels: &[usize],
        time_budget: Duration,
    ) -> TrainingResult {
        let timer = Timer::start(time_budget);
        let mut optimizer = Optimizer::new(
            self.hyperparameters.learning_rate as f32,
            self.hyperparameters.momentum as f32,
        );
        let margin = self.stop_margin.as_secs_f64();
        let mut step = 0;

        loop {
            let time_left = timer.time_left();

            model.zero_gradients();
            let output = model.forward(inputs);
            let predictions = Model::predict(&output);
            let correct = count_correct(&predictions, labels);
            let total = predictions.len();
            let loss = model.calculate_loss(&output, labels);

            let stop_reason = if correct == total {
                Some(StopReason::PerfectFit)
            } else if !loss.is_finite() {
                warn!("Loss diverged to {} at step {} ({})", loss, step, self.hyperparameters);
                Some(StopReason::Diverged)
            } else if time_left < margin {
                Some(StopReason::TimeBudget)
            } else {
                None
            };

            if let Some(stop_reason) = stop_reason {
                return TrainingResult {
                    steps: step,
                    loss,
                    correct,
                    total,
                    elapsed: timer.elapsed(),
                    stop_reason,
                    hyperparameters: self.hyperparameters,
                };
            }

            if step % PROGRESS_EVERY == 0 {
                debug!("Step = {} Prediction = {}/{} Error = {}", step, correct, total, loss);
            }

            model.backward(&output, labels);
            model.update_parameters(&mut optimizer);
            step += 1;
        }
    }
}
