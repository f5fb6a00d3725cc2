//! The shared metric interface and the closed set of metric families.

use crate::error::{Error, Result};
use crate::generation::GenerationMetrics;
use crate::multiclass::MulticlassMetrics;
use crate::paired::MulticlassPairedMetrics;
use crate::regression::RegressionMetrics;
use crate::types::{ExampleMetadata, FieldType, Label, Prediction, ScoreMap};

/// Capability shared by every metric family.
///
/// Implementations are pure: the same inputs always produce the same
/// [`ScoreMap`], and nothing is retained between calls.
///
/// # Required Methods
///
/// - [`name`](Metric::name) - Stable family identifier (e.g. "regression")
/// - [`is_compatible`](Metric::is_compatible) - Whether the family can score a field
/// - [`compute`](Metric::compute) - Score one batch
///
/// # Optional Methods
///
/// - [`description`](Metric::description) - Human-readable summary
/// - [`compute_with_metadata`](Metric::compute_with_metadata) - Score a batch
///   with per-example identifiers and lineage (defaults to `compute`)
pub trait Metric: Send + Sync {
    /// Returns the family name.
    fn name(&self) -> &'static str;

    /// Returns a one-line description of what the family reports.
    fn description(&self) -> &'static str {
        ""
    }

    /// Whether this family can score predictions of `prediction_type`
    /// against labels of `label_type`.
    fn is_compatible(&self, prediction_type: &FieldType, label_type: Option<&FieldType>) -> bool;

    /// Score a batch of parallel labels and predictions.
    ///
    /// An empty batch yields an empty map. Length or shape mismatches are
    /// errors; undefined statistics are left out of the map.
    fn compute(
        &self,
        labels: &[Label],
        predictions: &[Prediction],
        label_type: &FieldType,
        prediction_type: &FieldType,
    ) -> Result<ScoreMap>;

    /// Score a batch with example identifiers and metadata.
    ///
    /// # Default Implementation
    ///
    /// Ignores the identifiers and metadata and calls [`compute`](Metric::compute).
    fn compute_with_metadata(
        &self,
        labels: &[Label],
        predictions: &[Prediction],
        label_type: &FieldType,
        prediction_type: &FieldType,
        ids: &[String],
        metadata: &[ExampleMetadata],
    ) -> Result<ScoreMap> {
        let _ = (ids, metadata);
        self.compute(labels, predictions, label_type, prediction_type)
    }
}

/// Every metric family the dispatcher knows how to run.
#[derive(Debug, Clone)]
pub enum MetricFamily {
    /// Error and correlation for scalar outputs
    Regression(RegressionMetrics),
    /// Accuracy, precision/recall/F1 and binary curve areas
    Multiclass(MulticlassMetrics),
    /// Prediction drift between derived examples and their parents
    MulticlassPaired(MulticlassPairedMetrics),
    /// BLEU and ROUGE-L for generated text
    GenerationOverlap(GenerationMetrics),
}

impl MetricFamily {
    fn inner(&self) -> &dyn Metric {
        match self {
            Self::Regression(metric) => metric,
            Self::Multiclass(metric) => metric,
            Self::MulticlassPaired(metric) => metric,
            Self::GenerationOverlap(metric) => metric,
        }
    }
}

impl Metric for MetricFamily {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn description(&self) -> &'static str {
        self.inner().description()
    }

    fn is_compatible(&self, prediction_type: &FieldType, label_type: Option<&FieldType>) -> bool {
        self.inner().is_compatible(prediction_type, label_type)
    }

    fn compute(
        &self,
        labels: &[Label],
        predictions: &[Prediction],
        label_type: &FieldType,
        prediction_type: &FieldType,
    ) -> Result<ScoreMap> {
        self.inner()
            .compute(labels, predictions, label_type, prediction_type)
    }

    fn compute_with_metadata(
        &self,
        labels: &[Label],
        predictions: &[Prediction],
        label_type: &FieldType,
        prediction_type: &FieldType,
        ids: &[String],
        metadata: &[ExampleMetadata],
    ) -> Result<ScoreMap> {
        self.inner().compute_with_metadata(
            labels,
            predictions,
            label_type,
            prediction_type,
            ids,
            metadata,
        )
    }
}

impl From<RegressionMetrics> for MetricFamily {
    fn from(metric: RegressionMetrics) -> Self {
        Self::Regression(metric)
    }
}

impl From<MulticlassMetrics> for MetricFamily {
    fn from(metric: MulticlassMetrics) -> Self {
        Self::Multiclass(metric)
    }
}

impl From<MulticlassPairedMetrics> for MetricFamily {
    fn from(metric: MulticlassPairedMetrics) -> Self {
        Self::MulticlassPaired(metric)
    }
}

impl From<GenerationMetrics> for MetricFamily {
    fn from(metric: GenerationMetrics) -> Self {
        Self::GenerationOverlap(metric)
    }
}

/// Fail unless labels and predictions are parallel.
pub(crate) fn ensure_parallel(labels: &[Label], predictions: &[Prediction]) -> Result<()> {
    if labels.len() != predictions.len() {
        return Err(Error::LengthMismatch {
            labels: labels.len(),
            predictions: predictions.len(),
        });
    }
    Ok(())
}
