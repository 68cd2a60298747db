use anyhow::Result;

use crate::error::PredictError;
use crate::features::FeatureVector;

/// Contract shared by the status classifiers. Labels are the dense codes
/// produced by the label encoder, so a binary model sees `0` and `1`.
pub trait ClassifierModel: Send + Sync {
    /// Fit the model on rows in canonical feature order.
    fn fit(&mut self, x: &[FeatureVector], y: &[usize]) -> Result<()>;

    /// Probability that a row belongs to label code `1`.
    fn predict_proba(&self, x: &[f32]) -> Result<f32, PredictError>;

    /// Predicted label code for one row.
    fn predict(&self, x: &[f32]) -> Result<usize, PredictError> {
        label_code(self.predict_proba(x)?)
    }

    /// Optional human readable name for the model
    fn name(&self) -> &str {
        "classifier"
    }
}

/// Threshold a binary probability into a label code. Anything that is not
/// a probability means the model file is broken.
pub fn label_code(p: f32) -> Result<usize, PredictError> {
    if !p.is_finite() || !(0.0..=1.0).contains(&p) {
        return Err(PredictError::UnknownCode {
            code: if p.is_finite() { p.round() as i64 } else { -1 },
            vocabulary_size: 2,
        });
    }
    Ok(usize::from(p >= 0.5))
}
