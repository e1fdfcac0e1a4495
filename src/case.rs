use std::collections::BTreeSet;

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::CaseError;
use crate::mnist::Dataset;

/// Number of classes every case predicts over, whatever its digit subset.
pub const OUTPUT_SIZE: usize = 10;

/// Difficulty limits attached to a case.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Wall-clock training budget in seconds
    pub time_limit: f64,
    /// Maximum number of trainable parameters
    pub size_limit: usize,
    /// Minimum accuracy required on the test split
    pub test_limit: f64,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            time_limit: 2.0,
            size_limit: 1_000_000,
            test_limit: 0.95,
        }
    }
}

/// Which digits a case uses and the limits it is held to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseSpec {
    pub id: u32,
    pub digits: Vec<usize>,
    #[serde(default)]
    pub limits: Limits,
}

impl CaseSpec {
    pub fn new(id: u32, digits: Vec<usize>) -> Self {
        Self { id, digits, limits: Limits::default() }
    }

    /// Case 1 is digits 0/1, case 2 is digits 8/9, cases 3 to 10 use all ten digits.
    pub fn default_catalog() -> Vec<CaseSpec> {
        let mut specs = vec![CaseSpec::new(1, vec![0, 1]), CaseSpec::new(2, vec![8, 9])];
        specs.extend((3..=10).map(|id| CaseSpec::new(id, (0..10).collect())));
        specs
    }
}

#[derive(Debug, Clone)]
pub struct Case {
    pub id: u32,
    pub description: String,
    pub digits: BTreeSet<usize>,
    pub train_inputs: Array2<f32>,
    pub train_labels: Vec<usize>,
    pub test_inputs: Array2<f32>,
    pub test_labels: Vec<usize>,
    pub output_size: usize,
    pub limits: Limits,
}

impl Case {
    pub fn input_size(&self) -> usize {
        self.train_inputs.ncols()
    }
}

/// Carves cases out of a loaded train/test pair.
#[derive(Debug, Clone)]
pub struct CaseBuilder {
    train: Dataset,
    test: Dataset,
    specs: Vec<CaseSpec>,
}

impl CaseBuilder {
    pub fn new(train: Dataset, test: Dataset, specs: Vec<CaseSpec>) -> Self {
        Self { train, test, specs }
    }

    pub fn with_default_cases(train: Dataset, test: Dataset) -> Self {
        Self::new(train, test, CaseSpec::default_catalog())
    }

    pub fn case_ids(&self) -> Vec<u32> {
        self.specs.iter().map(|spec| spec.id).collect()
    }

    pub fn build(&self, id: u32) -> Result<Case, CaseError> {
        let spec = self
            .specs
            .iter()
            .find(|spec| spec.id == id)
            .ok_or(CaseError::UnknownCase(id))?;

        let digits: BTreeSet<usize> = spec.digits.iter().copied().collect();
        let (train_inputs, train_labels) = select(&self.train, &digits);
        let (test_inputs, test_labels) = select(&self.test, &digits);

        Ok(Case {
            id,
            description: describe(&spec.digits),
            digits,
            train_inputs,
            train_labels,
            test_inputs,
            test_labels,
            output_size: OUTPUT_SIZE,
            limits: spec.limits,
        })
    }
}

/// Keeps the examples whose label is in `digits`, preserving their order.
pub fn select(dataset: &Dataset, digits: &BTreeSet<usize>) -> (Array2<f32>, Vec<usize>) {
    let indices: Vec<usize> = dataset
        .labels
        .iter()
        .enumerate()
        .filter(|(_, label)| digits.contains(*label))
        .map(|(i, _)| i)
        .collect();
    let inputs = dataset.images.select(Axis(0), &indices);
    let labels = indices.iter().map(|&i| dataset.labels[i]).collect();
    (inputs, labels)
}

fn describe(digits: &[usize]) -> String {
    let list: Vec<String> = digits.iter().map(|d| d.to_string()).collect();
    format!("Digits: {}", list.join(","))
}
