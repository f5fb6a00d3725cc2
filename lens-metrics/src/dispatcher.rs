//! Field-level metric dispatch.
//!
//! The dispatcher borrows a [`MetricRegistry`], picks the families that can
//! score a field, runs them and flattens their results into one
//! [`ScoreMap`]. Examples without a label are removed before any family
//! sees the batch.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{Error, Result};
use crate::metric::Metric;
use crate::registry::MetricRegistry;
use crate::types::{ExampleMetadata, FieldType, Label, Prediction, ScoreMap};

/// Per-example identifiers and metadata, parallel with the predictions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lineage {
    pub ids: Vec<String>,
    pub metadata: Vec<ExampleMetadata>,
}

/// One prediction field together with its reference labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldBatch {
    pub label_type: FieldType,
    pub prediction_type: FieldType,
    /// `None` marks an example that has no reference label
    pub labels: Vec<Option<Label>>,
    pub predictions: Vec<Prediction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lineage: Option<Lineage>,
}

impl FieldBatch {
    /// Batch with every example labeled and no lineage.
    #[must_use]
    pub fn new(
        label_type: FieldType,
        prediction_type: FieldType,
        labels: Vec<Label>,
        predictions: Vec<Prediction>,
    ) -> Self {
        Self {
            label_type,
            prediction_type,
            labels: labels.into_iter().map(Some).collect(),
            predictions,
            lineage: None,
        }
    }

    #[must_use]
    pub fn with_lineage(mut self, ids: Vec<String>, metadata: Vec<ExampleMetadata>) -> Self {
        self.lineage = Some(Lineage { ids, metadata });
        self
    }

    /// Check shapes and keep only the labeled examples.
    fn labeled(&self) -> Result<LabeledBatch> {
        if self.labels.len() != self.predictions.len() {
            return Err(Error::LengthMismatch {
                labels: self.labels.len(),
                predictions: self.predictions.len(),
            });
        }
        if let Some(lineage) = &self.lineage {
            if lineage.ids.len() != self.predictions.len()
                || lineage.metadata.len() != self.predictions.len()
            {
                return Err(Error::LineageMismatch {
                    predictions: self.predictions.len(),
                    ids: lineage.ids.len(),
                    metadata: lineage.metadata.len(),
                });
            }
        }

        let keep: Vec<usize> = self
            .labels
            .iter()
            .enumerate()
            .filter_map(|(i, label)| label.as_ref().map(|_| i))
            .collect();
        let dropped = self.labels.len() - keep.len();
        if dropped > 0 {
            tracing::debug!(dropped, kept = keep.len(), "dropping unlabeled examples");
        }

        Ok(LabeledBatch {
            labels: self.labels.iter().flatten().cloned().collect(),
            predictions: keep.iter().map(|&i| self.predictions[i].clone()).collect(),
            lineage: self.lineage.as_ref().map(|lineage| Lineage {
                ids: keep.iter().map(|&i| lineage.ids[i].clone()).collect(),
                metadata: keep.iter().map(|&i| lineage.metadata[i].clone()).collect(),
            }),
        })
    }
}

struct LabeledBatch {
    labels: Vec<Label>,
    predictions: Vec<Prediction>,
    lineage: Option<Lineage>,
}

/// Runs every compatible family of a registry over a field.
#[derive(Debug, Clone, Copy)]
pub struct MetricDispatcher<'r> {
    registry: &'r MetricRegistry,
}

impl<'r> MetricDispatcher<'r> {
    #[must_use]
    pub fn new(registry: &'r MetricRegistry) -> Self {
        Self { registry }
    }

    /// Names of the families that would score `batch`, in run order.
    pub fn applicable(&self, batch: &FieldBatch) -> Vec<&'static str> {
        self.registry
            .families()
            .iter()
            .filter(|family| {
                family.is_compatible(&batch.prediction_type, Some(&batch.label_type))
            })
            .map(|family| family.name())
            .collect()
    }

    /// Score one field with every compatible family.
    ///
    /// Results are merged into a single map; when two families report the
    /// same name the later family's value is kept. The first family error
    /// aborts the field.
    #[instrument(
        name = "metrics::evaluate",
        skip(self, batch),
        fields(prediction_type = batch.prediction_type.as_str(), examples = batch.predictions.len())
    )]
    pub fn evaluate(&self, batch: &FieldBatch) -> Result<ScoreMap> {
        batch.prediction_type.validate()?;
        let labeled = batch.labeled()?;

        let mut scores = ScoreMap::new();
        for family in self.registry.families() {
            let name = family.name();
            if !family.is_compatible(&batch.prediction_type, Some(&batch.label_type)) {
                tracing::debug!(family = name, "skipping incompatible family");
                continue;
            }

            tracing::debug!(family = name, examples = labeled.labels.len(), "running family");
            let family_scores = match &labeled.lineage {
                Some(lineage) => family.compute_with_metadata(
                    &labeled.labels,
                    &labeled.predictions,
                    &batch.label_type,
                    &batch.prediction_type,
                    &lineage.ids,
                    &lineage.metadata,
                )?,
                None => family.compute(
                    &labeled.labels,
                    &labeled.predictions,
                    &batch.label_type,
                    &batch.prediction_type,
                )?,
            };

            for key in scores.merge(family_scores) {
                tracing::warn!(family = name, key = %key, "score reported twice, keeping later value");
            }
        }
        Ok(scores)
    }

    /// Score several named fields independently.
    ///
    /// A failing field is logged and reported in its own slot; the other
    /// fields are still evaluated.
    pub fn evaluate_fields<'b, I, S>(&self, fields: I) -> BTreeMap<String, Result<ScoreMap>>
    where
        I: IntoIterator<Item = (S, &'b FieldBatch)>,
        S: Into<String>,
    {
        fields
            .into_iter()
            .map(|(field, batch)| {
                let field = field.into();
                let result = self.evaluate(batch);
                if let Err(e) = &result {
                    tracing::warn!(field = %field, error = %e, "field evaluation failed");
                }
                (field, result)
            })
            .collect()
    }
}
