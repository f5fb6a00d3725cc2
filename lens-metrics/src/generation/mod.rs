//! Overlap metrics for generated text.
//!
//! Generated outputs are compared against reference text with corpus-level
//! BLEU and per-example ROUGE-L. When a model returns ranked candidates only
//! the top one is scored and every key gains an `@1` suffix.

mod bleu;
mod rouge;
mod stem;

pub use bleu::corpus_bleu;
pub use rouge::{rouge_l, tokenize};
pub use stem::stem;

use crate::config::{BleuConfig, RougeConfig};
use crate::error::{Error, Result};
use crate::metric::{Metric, ensure_parallel};
use crate::stats;
use crate::types::{FieldType, Label, Prediction, ScoreMap};

/// Scores generated text against references with BLEU and ROUGE-L.
///
/// Reports `corpus_bleu` (0-100) and `rougeL` (0-1). Either measure can be
/// switched off through its config section.
#[derive(Debug, Clone, Default)]
pub struct GenerationMetrics {
    bleu: BleuConfig,
    rouge: RougeConfig,
}

impl GenerationMetrics {
    /// Create the family with explicit parameters.
    ///
    /// Fails with [`Error::Config`] when `bleu` does not pass
    /// [`BleuConfig::validate`].
    pub fn new(bleu: BleuConfig, rouge: RougeConfig) -> Result<Self> {
        bleu.validate()?;
        Ok(Self { bleu, rouge })
    }

    pub fn bleu_config(&self) -> &BleuConfig {
        &self.bleu
    }

    pub fn rouge_config(&self) -> &RougeConfig {
        &self.rouge
    }
}

impl Metric for GenerationMetrics {
    fn name(&self) -> &'static str {
        "generation_overlap"
    }

    fn description(&self) -> &'static str {
        "Corpus BLEU and mean ROUGE-L between generated and reference text"
    }

    fn is_compatible(&self, prediction_type: &FieldType, _label_type: Option<&FieldType>) -> bool {
        prediction_type.is_generation()
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

        let references = labels
            .iter()
            .enumerate()
            .map(|(index, label)| match label {
                Label::Text(text) => Ok(text.as_str()),
                _ => Err(Error::UnexpectedRecord {
                    index,
                    expected: "a text label",
                }),
            })
            .collect::<Result<Vec<_>>>()?;
        let outputs = predictions
            .iter()
            .enumerate()
            .map(|(index, pred)| {
                pred.top_text().ok_or(Error::UnexpectedRecord {
                    index,
                    expected: "a text or candidate prediction",
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut scores = ScoreMap::new();
        if self.bleu.enabled {
            scores.insert("corpus_bleu", corpus_bleu(&outputs, &references, &self.bleu)?);
        }
        if self.rouge.enabled {
            let per_example: Vec<f64> = references
                .iter()
                .zip(&outputs)
                .map(|(reference, output)| rouge_l(reference, output, self.rouge.use_stemmer))
                .collect();
            scores.insert_opt("rougeL", stats::mean(&per_example));
        }

        if matches!(prediction_type, FieldType::GeneratedTextCandidates) {
            scores = scores.with_suffix("@1");
        }
        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFERENCES: [&str; 3] = ["This is a test.", "Test one", "A third test"];

    fn labels(texts: &[&str]) -> Vec<Label> {
        texts.iter().copied().map(Label::text).collect()
    }

    fn run(refs: &[&str], preds: &[&str]) -> ScoreMap {
        let preds: Vec<_> = preds.iter().copied().map(Prediction::text).collect();
        GenerationMetrics::default()
            .compute(
                &labels(refs),
                &preds,
                &FieldType::TextSegment,
                &FieldType::GeneratedText,
            )
            .unwrap()
    }

    fn assert_close(scores: &ScoreMap, name: &str, expected: f64) {
        let got = scores.get(name).unwrap_or_else(|| panic!("missing {name}"));
        assert!((got - expected).abs() < 1e-5, "{name}: expected {expected}, got {got}");
    }

    #[test]
    fn compatible_with_generated_text_only() {
        let metric = GenerationMetrics::default();
        assert!(metric.is_compatible(&FieldType::GeneratedText, None));
        assert!(metric.is_compatible(&FieldType::GeneratedTextCandidates, None));
        assert!(!metric.is_compatible(&FieldType::TextSegment, None));
        assert!(!metric.is_compatible(&FieldType::RegressionScore, None));
    }

    #[test]
    fn identical_text_scores_perfectly() {
        let texts = ["This is a test.", "Test two", "A third test example"];
        let scores = run(&texts, &texts);
        assert_eq!(scores.len(), 2);
        assert_close(&scores, "corpus_bleu", 100.0);
        assert_close(&scores, "rougeL", 1.0);
    }

    #[test]
    fn some_incorrect_predictions() {
        let scores = run(
            &REFERENCES,
            &["This is a test.", "Test two", "A third test example"],
        );
        assert_close(&scores, "corpus_bleu", 68.037493);
        assert_close(&scores, "rougeL", 0.785714);
    }

    #[test]
    fn mostly_incorrect_predictions() {
        let scores = run(
            &REFERENCES,
            &["these test.", "Test two", "A third test example"],
        );
        assert_close(&scores, "corpus_bleu", 29.508062);
        assert_close(&scores, "rougeL", 0.563492);
    }

    #[test]
    fn candidates_score_the_top_one_with_suffix() {
        let preds = vec![
            Prediction::Candidates(vec![
                ("This is a test.".into(), -0.1),
                ("unrelated".into(), -2.0),
            ]),
            Prediction::Candidates(vec![("Test two".into(), -0.3)]),
            Prediction::Candidates(vec![("A third test example".into(), -0.5)]),
        ];
        let scores = GenerationMetrics::default()
            .compute(
                &labels(&REFERENCES),
                &preds,
                &FieldType::TextSegment,
                &FieldType::GeneratedTextCandidates,
            )
            .unwrap();
        assert_eq!(scores.keys().collect::<Vec<_>>(), ["corpus_bleu@1", "rougeL@1"]);
        assert_close(&scores, "corpus_bleu@1", 68.037493);
        assert_close(&scores, "rougeL@1", 0.785714);
    }

    #[test]
    fn exact_top_candidate_scores_perfectly() {
        let preds = vec![
            Prediction::Candidates(vec![
                ("This is a test.".into(), -0.1),
                ("Something else entirely".into(), -1.5),
            ]),
            Prediction::Candidates(vec![
                ("Test one".into(), -0.2),
                ("Test two".into(), -0.4),
            ]),
            Prediction::Candidates(vec![
                ("A third test".into(), -0.3),
                ("A wrong guess".into(), -2.0),
            ]),
        ];
        let scores = GenerationMetrics::default()
            .compute(
                &labels(&REFERENCES),
                &preds,
                &FieldType::TextSegment,
                &FieldType::GeneratedTextCandidates,
            )
            .unwrap();
        assert_eq!(scores.len(), 2);
        assert_close(&scores, "corpus_bleu@1", 100.0);
        assert_close(&scores, "rougeL@1", 1.0);
    }

    #[test]
    fn invalid_bleu_parameters_are_rejected_up_front() {
        let zero_order = BleuConfig {
            max_order: 0,
            ..BleuConfig::default()
        };
        assert!(matches!(
            GenerationMetrics::new(zero_order, RougeConfig::default()),
            Err(Error::Config(_))
        ));

        let no_smoothing = BleuConfig {
            smooth_value: 0.0,
            ..BleuConfig::default()
        };
        assert!(matches!(
            GenerationMetrics::new(no_smoothing, RougeConfig::default()),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn empty_candidate_list_scores_as_empty_text() {
        let scores = GenerationMetrics::default()
            .compute(
                &labels(&["reference"]),
                &[Prediction::Candidates(Vec::new())],
                &FieldType::TextSegment,
                &FieldType::GeneratedTextCandidates,
            )
            .unwrap();
        assert_eq!(scores.get("corpus_bleu@1"), Some(0.0));
        assert_eq!(scores.get("rougeL@1"), Some(0.0));
    }

    #[test]
    fn empty_batch_returns_empty_map() {
        assert!(run(&[], &[]).is_empty());
    }

    #[test]
    fn disabled_measures_are_skipped() {
        let metric = GenerationMetrics::new(
            BleuConfig {
                enabled: false,
                ..BleuConfig::default()
            },
            RougeConfig::default(),
        )
        .unwrap();
        let scores = metric
            .compute(
                &labels(&["a b"]),
                &[Prediction::text("a b")],
                &FieldType::TextSegment,
                &FieldType::GeneratedText,
            )
            .unwrap();
        assert_eq!(scores.keys().collect::<Vec<_>>(), ["rougeL"]);
    }

    #[test]
    fn non_text_label_is_rejected() {
        let err = GenerationMetrics::default()
            .compute(
                &[Label::Score(1.0)],
                &[Prediction::text("a")],
                &FieldType::RegressionScore,
                &FieldType::GeneratedText,
            )
            .unwrap_err();
        assert!(matches!(err, Error::UnexpectedRecord { index: 0, .. }));
    }

    #[test]
    fn non_text_prediction_is_rejected() {
        let err = GenerationMetrics::default()
            .compute(
                &labels(&["a", "b"]),
                &[Prediction::text("a"), Prediction::Score(2.0)],
                &FieldType::TextSegment,
                &FieldType::GeneratedText,
            )
            .unwrap_err();
        assert!(matches!(err, Error::UnexpectedRecord { index: 1, .. }));
    }
}
