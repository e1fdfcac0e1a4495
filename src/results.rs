use std::fmt;
use std::fs;
use std::path::Path;

use tracing::info;

use crate::activation::ActivationType;
use crate::error::ResultsError;
use crate::trainer::TrainingResult;

/// Summary of one run as stored in the results file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingStats {
    pub step: usize,
    /// Final loss rounded to five decimals
    pub loss: f64,
    pub learning_rate: f64,
    pub activation: ActivationType,
    pub momentum: f64,
}

impl From<&TrainingResult> for TrainingStats {
    fn from(result: &TrainingResult) -> Self {
        TrainingStats {
            step: result.steps,
            loss: round_to(result.loss as f64, 5),
            learning_rate: result.hyperparameters.learning_rate,
            activation: result.hyperparameters.activation,
            momentum: result.hyperparameters.momentum,
        }
    }
}

/// Rendered as a field mapping, one record per line in the results file.
impl fmt::Display for TrainingStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{'step': {}, 'loss': {}, 'lr': {}, 'activ': '{}', 'moment': {}}}",
            self.step, self.loss, self.learning_rate, self.activation, self.momentum
        )
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Append-only collection of run statistics, flushed once at the end of a process.
#[derive(Debug, Default, Clone)]
pub struct ResultsSink {
    records: Vec<TrainingStats>,
}

impl ResultsSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, stats: TrainingStats) {
        self.records.push(stats);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in insertion order.
    pub fn records(&self) -> &[TrainingStats] {
        &self.records
    }

    /// Records ordered by step count; equal steps keep insertion order.
    pub fn sorted(&self) -> Vec<TrainingStats> {
        let mut sorted = self.records.clone();
        sorted.sort_by_key(|stats| stats.step);
        sorted
    }

    pub fn render(&self) -> String {
        self.sorted()
            .iter()
            .map(|stats| stats.to_string())
            .collect::<Vec<_>>()
            .join(",\n")
    }

    /// Writes the sorted records to `path` if there are any. Returns whether a
    /// file was written.
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<bool, ResultsError> {
        if self.is_empty() {
            return Ok(false);
        }
        let path = path.as_ref();
        fs::write(path, self.render()).map_err(|source| ResultsError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Wrote {} results to {}", self.len(), path.display());
        Ok(true)
    }
}
