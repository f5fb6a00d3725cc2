//! Multiclass classification metrics.
//!
//! Predicted classes are the argmax of each probability vector, with ties
//! going to the lowest vocabulary index. When the field declares a null
//! class, precision, recall and F1 pool the counts of every other class, so
//! a two-class vocabulary reduces to ordinary binary scoring with the
//! non-null class as positive.

use crate::error::{Error, Result};
use crate::metric::{Metric, ensure_parallel};
use crate::stats;
use crate::types::{FieldType, Label, Prediction, ScoreMap};

/// Scores probability vectors against category labels.
///
/// Always reports `accuracy`. With a null class it adds `precision`,
/// `recall` and `f1`; for binary fields it also adds `auc` and `aucpr` when
/// they are defined.
#[derive(Debug, Clone, Default)]
pub struct MulticlassMetrics;

impl MulticlassMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Metric for MulticlassMetrics {
    fn name(&self) -> &'static str {
        "multiclass"
    }

    fn description(&self) -> &'static str {
        "Accuracy, precision, recall, F1 and binary ROC/PR areas for class probabilities"
    }

    fn is_compatible(&self, prediction_type: &FieldType, _label_type: Option<&FieldType>) -> bool {
        matches!(prediction_type, FieldType::MulticlassPreds { .. })
    }

    fn compute(
        &self,
        labels: &[Label],
        predictions: &[Prediction],
        _label_type: &FieldType,
        prediction_type: &FieldType,
    ) -> Result<ScoreMap> {
        ensure_parallel(labels, predictions)?;
        if labels.is_empty() {
            return Ok(ScoreMap::new());
        }

        let vocab = multiclass_vocab(prediction_type)?;
        let null_idx = prediction_type.null_idx();

        let rows = probability_rows(predictions, vocab.len())?;
        let true_classes = label_indices(labels, vocab)?;
        let predicted = predicted_classes(&rows)?;

        let mut scores = ScoreMap::new();
        let correct = true_classes
            .iter()
            .zip(&predicted)
            .filter(|(t, p)| t == p)
            .count();
        scores.insert_opt("accuracy", ratio(correct, labels.len()));

        let Some(null_idx) = null_idx else {
            return Ok(scores);
        };

        let counts = PositiveCounts::tally(&true_classes, &predicted, null_idx);
        scores.insert_opt("precision", counts.precision());
        scores.insert_opt("recall", counts.recall());
        scores.insert_opt("f1", counts.f1());

        if vocab.len() == 2 {
            let is_positive: Vec<bool> = true_classes.iter().map(|&t| t != null_idx).collect();
            let positive_scores: Vec<f64> = rows.iter().map(|row| 1.0 - row[null_idx]).collect();
            scores.insert_opt("auc", stats::roc_auc(&is_positive, &positive_scores));
            scores.insert_opt(
                "aucpr",
                stats::average_precision(&is_positive, &positive_scores),
            );
        }

        Ok(scores)
    }
}

/// Confusion counts with every non-null class treated as positive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct PositiveCounts {
    /// Correct predictions of a non-null class
    true_positives: usize,
    /// Predictions of any non-null class
    predicted_positives: usize,
    /// Examples whose true class is not null
    actual_positives: usize,
}

impl PositiveCounts {
    fn tally(true_classes: &[usize], predicted: &[usize], null_idx: usize) -> Self {
        let mut counts = Self::default();
        for (&truth, &guess) in true_classes.iter().zip(predicted) {
            if guess != null_idx {
                counts.predicted_positives += 1;
            }
            if truth != null_idx {
                counts.actual_positives += 1;
                if truth == guess {
                    counts.true_positives += 1;
                }
            }
        }
        counts
    }

    fn precision(&self) -> Option<f64> {
        ratio(self.true_positives, self.predicted_positives)
    }

    fn recall(&self) -> Option<f64> {
        ratio(self.true_positives, self.actual_positives)
    }

    fn f1(&self) -> Option<f64> {
        let false_positives = self.predicted_positives - self.true_positives;
        let false_negatives = self.actual_positives - self.true_positives;
        ratio(
            2 * self.true_positives,
            2 * self.true_positives + false_positives + false_negatives,
        )
    }
}

fn ratio(numerator: usize, denominator: usize) -> Option<f64> {
    if denominator == 0 {
        return None;
    }
    Some(numerator as f64 / denominator as f64)
}

/// Vocabulary of a valid multiclass descriptor.
pub(crate) fn multiclass_vocab(prediction_type: &FieldType) -> Result<&[String]> {
    prediction_type.validate()?;
    prediction_type.vocab().ok_or_else(|| {
        Error::InvalidFieldType(format!(
            "expected multiclass_preds, got {}",
            prediction_type.as_str()
        ))
    })
}

/// Borrow every prediction as a probability vector of the vocabulary's length.
///
/// Entries must be finite and non-negative with a positive total, so every
/// row is a distribution once normalized.
pub(crate) fn probability_rows(predictions: &[Prediction], vocab_len: usize) -> Result<Vec<&[f64]>> {
    predictions
        .iter()
        .enumerate()
        .map(|(index, pred)| match pred {
            Prediction::Probabilities(row) if row.len() != vocab_len => {
                Err(Error::VocabularyMismatch {
                    index,
                    expected: vocab_len,
                    actual: row.len(),
                })
            }
            Prediction::Probabilities(row) if is_distribution(row) => Ok(row.as_slice()),
            Prediction::Probabilities(_) => Err(Error::UnexpectedRecord {
                index,
                expected: "non-negative finite probabilities with a positive sum",
            }),
            _ => Err(Error::UnexpectedRecord {
                index,
                expected: "a probability vector",
            }),
        })
        .collect()
}

fn is_distribution(row: &[f64]) -> bool {
    row.iter().all(|p| p.is_finite() && *p >= 0.0) && row.iter().sum::<f64>() > 0.0
}

/// Argmax class of every row.
pub(crate) fn predicted_classes(rows: &[&[f64]]) -> Result<Vec<usize>> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            stats::argmax(row).ok_or(Error::UnexpectedRecord {
                index,
                expected: "a probability vector with at least one number",
            })
        })
        .collect()
}

fn label_indices(labels: &[Label], vocab: &[String]) -> Result<Vec<usize>> {
    labels
        .iter()
        .enumerate()
        .map(|(index, label)| match label {
            Label::Category(name) => vocab
                .iter()
                .position(|entry| entry == name)
                .ok_or_else(|| Error::UnknownLabel(name.clone())),
            _ => Err(Error::UnexpectedRecord {
                index,
                expected: "a category label",
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_scores(actual: &ScoreMap, expected: &[(&str, f64)]) {
        assert_eq!(
            actual.len(),
            expected.len(),
            "keys: {:?}",
            actual.keys().collect::<Vec<_>>()
        );
        for (name, value) in expected {
            let got = actual.get(name).unwrap_or_else(|| panic!("missing {name}"));
            assert!((got - value).abs() < 1e-4, "{name}: expected {value}, got {got}");
        }
    }

    fn run(labels: &[&str], preds: &[&[f64]], field: FieldType) -> Result<ScoreMap> {
        let labels: Vec<_> = labels.iter().map(|l| Label::category(*l)).collect();
        let preds: Vec<_> = preds
            .iter()
            .map(|p| Prediction::Probabilities(p.to_vec()))
            .collect();
        MulticlassMetrics::new().compute(&labels, &preds, &FieldType::CategoryLabel, &field)
    }

    fn three_way() -> FieldType {
        FieldType::multiclass(["0", "1", "2"], Some(0))
    }

    #[test]
    fn compatible_only_with_multiclass_preds() {
        let metric = MulticlassMetrics::new();
        assert!(metric.is_compatible(&FieldType::multiclass([""], None), None));
        assert!(!metric.is_compatible(&FieldType::RegressionScore, None));
        assert!(!metric.is_compatible(&FieldType::GeneratedText, None));
    }

    #[test]
    fn perfect_predictions() {
        let scores = run(
            &["1", "2", "0", "1"],
            &[&[0.0, 1.0, 0.0], &[0.0, 0.0, 1.0], &[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]],
            three_way(),
        )
        .unwrap();
        assert_scores(
            &scores,
            &[("accuracy", 1.0), ("f1", 1.0), ("precision", 1.0), ("recall", 1.0)],
        );
    }

    #[test]
    fn some_incorrect_predictions() {
        let scores = run(
            &["1", "2", "0", "1"],
            &[&[0.1, 0.4, 0.5], &[0.0, 0.1, 0.9], &[0.1, 0.0, 0.9], &[0.0, 1.0, 0.0]],
            three_way(),
        )
        .unwrap();
        assert_scores(
            &scores,
            &[
                ("accuracy", 0.5),
                ("f1", 0.57143),
                ("precision", 0.5),
                ("recall", 0.66667),
            ],
        );
    }

    #[test]
    fn all_incorrect_predictions() {
        let scores = run(
            &["1", "2", "0", "1"],
            &[&[0.1, 0.4, 0.5], &[0.2, 0.7, 0.1], &[0.1, 0.0, 0.9], &[1.0, 0.0, 0.0]],
            three_way(),
        )
        .unwrap();
        assert_scores(
            &scores,
            &[("accuracy", 0.0), ("f1", 0.0), ("precision", 0.0), ("recall", 0.0)],
        );
    }

    #[test]
    fn without_null_index_only_accuracy_is_reported() {
        let scores = run(
            &["1", "2", "0", "1"],
            &[&[0.1, 0.4, 0.5], &[0.0, 0.1, 0.9], &[0.1, 0.0, 0.9], &[0.0, 1.0, 0.0]],
            FieldType::multiclass(["0", "1", "2"], None),
        )
        .unwrap();
        assert_scores(&scores, &[("accuracy", 0.5)]);
    }

    #[test]
    fn single_class_present_omits_auc() {
        let scores = run(
            &["1", "1"],
            &[&[0.1, 0.9], &[0.2, 0.8]],
            FieldType::multiclass(["0", "1"], Some(0)),
        )
        .unwrap();
        assert_scores(
            &scores,
            &[
                ("accuracy", 1.0),
                ("aucpr", 1.0),
                ("f1", 1.0),
                ("precision", 1.0),
                ("recall", 1.0),
            ],
        );
    }

    #[test]
    fn binary_with_null_class_reports_curve_areas() {
        let scores = run(
            &["1", "0", "1"],
            &[&[0.1, 0.9], &[0.9, 0.1], &[0.8, 0.2]],
            FieldType::multiclass(["0", "1"], Some(0)),
        )
        .unwrap();
        assert_scores(
            &scores,
            &[
                ("accuracy", 0.66667),
                ("auc", 1.0),
                ("aucpr", 1.0),
                ("f1", 0.66667),
                ("precision", 1.0),
                ("recall", 0.5),
            ],
        );
    }

    #[test]
    fn null_class_at_index_one_flips_the_positive_score() {
        // Positive class is "0"; its probability is 1 - p[1].
        let scores = run(
            &["0", "1"],
            &[&[0.7, 0.3], &[0.4, 0.6]],
            FieldType::multiclass(["0", "1"], Some(1)),
        )
        .unwrap();
        assert_eq!(scores.get("auc"), Some(1.0));
        assert_eq!(scores.get("precision"), Some(1.0));
    }

    #[test]
    fn multiclass_vocab_has_no_curve_areas() {
        let scores = run(
            &["1", "0", "2", "3"],
            &[
                &[0.1, 0.4, 0.2, 0.3],
                &[0.9, 0.1, 0.0, 0.0],
                &[0.0, 0.3, 0.5, 0.2],
                &[0.1, 0.1, 0.5, 0.3],
            ],
            FieldType::multiclass(["0", "1", "2", "3"], Some(0)),
        )
        .unwrap();
        assert_scores(
            &scores,
            &[
                ("accuracy", 0.75),
                ("f1", 0.66667),
                ("precision", 0.66667),
                ("recall", 0.66667),
            ],
        );
    }

    #[test]
    fn no_positive_predictions_omits_precision() {
        let scores = run(
            &["1", "0"],
            &[&[0.9, 0.1], &[0.8, 0.2]],
            FieldType::multiclass(["0", "1"], Some(0)),
        )
        .unwrap();
        assert!(!scores.contains_key("precision"));
        assert_eq!(scores.get("recall"), Some(0.0));
        assert_eq!(scores.get("f1"), Some(0.0));
    }

    #[test]
    fn all_null_labels_omit_recall_and_curves() {
        let scores = run(
            &["0", "0"],
            &[&[0.9, 0.1], &[0.8, 0.2]],
            FieldType::multiclass(["0", "1"], Some(0)),
        )
        .unwrap();
        assert_eq!(scores.get("accuracy"), Some(1.0));
        assert!(!scores.contains_key("recall"));
        assert!(!scores.contains_key("precision"));
        assert!(!scores.contains_key("f1"));
        assert!(!scores.contains_key("auc"));
        assert!(!scores.contains_key("aucpr"));
    }

    #[test]
    fn argmax_ties_pick_the_lowest_index() {
        let scores = run(
            &["0", "1"],
            &[&[0.25, 0.25, 0.25, 0.25], &[0.25, 0.25, 0.25, 0.25]],
            FieldType::multiclass(["0", "1", "2", "3"], None),
        )
        .unwrap();
        assert_scores(&scores, &[("accuracy", 0.5)]);
    }

    #[test]
    fn empty_batch_returns_empty_map() {
        assert!(run(&[], &[], three_way()).unwrap().is_empty());
    }

    #[test]
    fn probability_length_must_match_vocab() {
        let err = run(&["1"], &[&[0.5, 0.5]], three_way()).unwrap_err();
        assert!(matches!(
            err,
            Error::VocabularyMismatch {
                index: 0,
                expected: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn unknown_label_is_rejected() {
        let err = run(&["7"], &[&[0.2, 0.3, 0.5]], three_way()).unwrap_err();
        assert!(matches!(err, Error::UnknownLabel(label) if label == "7"));
    }

    #[test]
    fn length_mismatch_is_an_error() {
        let err = run(&["1", "2"], &[&[0.2, 0.3, 0.5]], three_way()).unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { .. }));
    }

    #[test]
    fn rows_that_are_not_distributions_are_rejected() {
        for row in [[0.0, 0.0, 0.0], [-0.5, 1.0, 0.5], [f64::NAN, 0.5, 0.5]] {
            let err = run(&["1", "2"], &[&[0.2, 0.3, 0.5], &row], three_way()).unwrap_err();
            assert!(
                matches!(err, Error::UnexpectedRecord { index: 1, .. }),
                "{row:?}: {err}"
            );
        }
    }

    #[test]
    fn out_of_range_null_index_is_rejected() {
        let field = FieldType::multiclass(["0", "1"], Some(2));
        let err = run(&["1"], &[&[0.2, 0.8]], field).unwrap_err();
        assert!(matches!(err, Error::InvalidFieldType(_)));
    }
}
