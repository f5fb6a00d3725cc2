//! Regression metrics: mean squared error and correlation.

use crate::error::{Error, Result};
use crate::metric::{Metric, ensure_parallel};
use crate::stats;
use crate::types::{FieldType, Label, Prediction, ScoreMap};

/// Scores scalar predictions against scalar targets.
///
/// Reports `mse`, `pearsonr` and `spearmanr`. The two correlations are left
/// out when either sequence is constant.
#[derive(Debug, Clone, Default)]
pub struct RegressionMetrics;

impl RegressionMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Metric for RegressionMetrics {
    fn name(&self) -> &'static str {
        "regression"
    }

    fn description(&self) -> &'static str {
        "Mean squared error, Pearson and Spearman correlation for scalar outputs"
    }

    fn is_compatible(&self, prediction_type: &FieldType, _label_type: Option<&FieldType>) -> bool {
        matches!(prediction_type, FieldType::RegressionScore)
    }

    fn compute(
        &self,
        labels: &[Label],
        predictions: &[Prediction],
        _label_type: &FieldType,
        _prediction_type: &FieldType,
    ) -> Result<ScoreMap> {
        ensure_parallel(labels, predictions)?;
        if labels.is_empty() {
            return Ok(ScoreMap::new());
        }

        let targets = labels
            .iter()
            .enumerate()
            .map(|(index, label)| match label {
                Label::Score(value) => Ok(*value),
                _ => Err(Error::UnexpectedRecord {
                    index,
                    expected: "a score label",
                }),
            })
            .collect::<Result<Vec<_>>>()?;
        let outputs = predictions
            .iter()
            .enumerate()
            .map(|(index, pred)| match pred {
                Prediction::Score(value) => Ok(*value),
                _ => Err(Error::UnexpectedRecord {
                    index,
                    expected: "a score prediction",
                }),
            })
            .collect::<Result<Vec<_>>>()?;

        let mut scores = ScoreMap::new();
        scores.insert_opt("mse", stats::mean_squared_error(&targets, &outputs));
        scores.insert_opt("pearsonr", stats::pearson(&targets, &outputs));
        scores.insert_opt("spearmanr", stats::spearman(&targets, &outputs));
        Ok(scores)
    }
}
