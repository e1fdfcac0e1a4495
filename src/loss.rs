use ndarray::{Array2, Axis};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Loss {
    /// Mean negative log-likelihood over log-softmax outputs.
    NegativeLogLikelihood,
}

impl Loss {
    pub fn calculate(&self, log_probs: &Array2<f32>, labels: &[usize]) -> f32 {
        assert_eq!(log_probs.nrows(), labels.len(), "Label count does not match batch size");
        match self {
            Loss::NegativeLogLikelihood => {
                let total: f32 = labels
                    .iter()
                    .enumerate()
                    .map(|(row, &label)| -log_probs[[row, label]])
                    .sum();
                total / labels.len() as f32
            }
        }
    }

    /// Gradient of the loss with respect to the logits that fed the log-softmax.
    pub fn gradient(&self, log_probs: &Array2<f32>, labels: &[usize]) -> Array2<f32> {
        assert_eq!(log_probs.nrows(), labels.len(), "Label count does not match batch size");
        match self {
            Loss::NegativeLogLikelihood => {
                // softmax(z) - onehot(y), averaged over the batch
                let scale = 1.0 / labels.len().max(1) as f32;
                let mut grad = log_probs.mapv(f32::exp);
                for (row, &label) in labels.iter().enumerate() {
                    grad[[row, label]] -= 1.0;
                }
                grad * scale
            }
        }
    }
}

/// Row-wise log-softmax, shifted by the row max for stability.
pub fn log_softmax(logits: &Array2<f32>) -> Array2<f32> {
    let mut out = logits.clone();
    for mut row in out.axis_iter_mut(Axis(0)) {
        let max = row.fold(f32::NEG_INFINITY, |m, &x| m.max(x));
        let log_sum = row.iter().map(|&x| (x - max).exp()).sum::<f32>().ln() + max;
        row.mapv_inplace(|x| x - log_sum);
    }
    out
}
