//! Paired metrics for counterfactual and perturbation testing.
//!
//! A generated example points back at the example it was derived from through
//! the `parentId` entry of its metadata. For every such pair inside a batch we
//! measure how far the prediction moved: whether the argmax class changed and
//! the Jensen-Shannon divergence between the two distributions.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::metric::{Metric, ensure_parallel};
use crate::multiclass::{multiclass_vocab, predicted_classes, probability_rows};
use crate::stats;
use crate::types::{ExampleMetadata, FieldType, Label, Prediction, ScoreMap};

/// A resolved lineage edge, as positions into the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExamplePair {
    pub child: usize,
    pub parent: usize,
}

/// Find every child→parent edge whose parent is part of the batch.
///
/// Edges are returned in child order. A `parentId` that names no example in
/// the batch is skipped.
pub fn find_pairs(ids: &[String], metadata: &[ExampleMetadata]) -> Result<Vec<ExamplePair>> {
    let mut positions = HashMap::with_capacity(ids.len());
    for (pos, id) in ids.iter().enumerate() {
        if positions.insert(id.as_str(), pos).is_some() {
            return Err(Error::DuplicateIdentifier(id.clone()));
        }
    }

    let mut pairs = Vec::new();
    for (child, meta) in metadata.iter().enumerate() {
        let Some(parent_id) = meta.parent_id.as_deref() else {
            continue;
        };
        match positions.get(parent_id) {
            Some(&parent) => pairs.push(ExamplePair { child, parent }),
            None => tracing::trace!(child, parent_id, "parent not in batch, skipping"),
        }
    }
    Ok(pairs)
}

/// Measures prediction instability between derived examples and their parents.
///
/// Reports `num_pairs`, `swap_rate` (share of pairs whose argmax class
/// differs) and `mean_jsd`. Labels are not consulted.
#[derive(Debug, Clone, Default)]
pub struct MulticlassPairedMetrics;

impl MulticlassPairedMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Metric for MulticlassPairedMetrics {
    fn name(&self) -> &'static str {
        "multiclass_paired"
    }

    fn description(&self) -> &'static str {
        "Swap rate and Jensen-Shannon divergence between derived examples and their parents"
    }

    fn is_compatible(&self, prediction_type: &FieldType, _label_type: Option<&FieldType>) -> bool {
        matches!(prediction_type, FieldType::MulticlassPreds { .. })
    }

    /// Without lineage there is nothing to pair, so the map is always empty.
    fn compute(
        &self,
        labels: &[Label],
        predictions: &[Prediction],
        _label_type: &FieldType,
        _prediction_type: &FieldType,
    ) -> Result<ScoreMap> {
        ensure_parallel(labels, predictions)?;
        Ok(ScoreMap::new())
    }

    fn compute_with_metadata(
        &self,
        labels: &[Label],
        predictions: &[Prediction],
        _label_type: &FieldType,
        prediction_type: &FieldType,
        ids: &[String],
        metadata: &[ExampleMetadata],
    ) -> Result<ScoreMap> {
        ensure_parallel(labels, predictions)?;
        if ids.len() != predictions.len() || metadata.len() != predictions.len() {
            return Err(Error::LineageMismatch {
                predictions: predictions.len(),
                ids: ids.len(),
                metadata: metadata.len(),
            });
        }

        let pairs = find_pairs(ids, metadata)?;
        if pairs.is_empty() {
            return Ok(ScoreMap::new());
        }

        let vocab = multiclass_vocab(prediction_type)?;
        let rows = probability_rows(predictions, vocab.len())?;
        let classes = predicted_classes(&rows)?;

        let mut swaps = 0usize;
        let mut divergences = Vec::with_capacity(pairs.len());
        for pair in &pairs {
            if classes[pair.child] != classes[pair.parent] {
                swaps += 1;
            }
            // Rows are validated distributions, so this is always defined.
            let jsd = stats::jensen_shannon(rows[pair.child], rows[pair.parent]).ok_or(
                Error::UnexpectedRecord {
                    index: pair.child,
                    expected: "a probability vector comparable with its parent",
                },
            )?;
            divergences.push(jsd);
        }

        let num_pairs = pairs.len();
        tracing::debug!(num_pairs, swaps, "scored example pairs");

        let mut scores = ScoreMap::new();
        scores.insert("num_pairs", num_pairs as f64);
        scores.insert("swap_rate", swaps as f64 / num_pairs as f64);
        scores.insert_opt("mean_jsd", stats::mean(&divergences));
        Ok(scores)
    }
}
