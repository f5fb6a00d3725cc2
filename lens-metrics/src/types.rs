//! Core type definitions for the metrics framework.
//!
//! Field types describe the semantic shape of a prediction or label field;
//! labels and predictions are the per-example records scored against them.

use std::collections::BTreeMap;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Semantic shape of a prediction or label field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldType {
    /// A single real-valued score
    RegressionScore,
    /// A probability vector aligned with `vocab`
    MulticlassPreds {
        /// Class names, in probability-vector order
        vocab: Vec<String>,
        /// Index of the null / negative class, if the task has one
        #[serde(default, skip_serializing_if = "Option::is_none")]
        null_idx: Option<usize>,
    },
    /// A category name drawn from some vocabulary
    CategoryLabel,
    /// Free text
    TextSegment,
    /// Model-generated text
    GeneratedText,
    /// Ranked list of generated candidates with scores
    GeneratedTextCandidates,
}

impl FieldType {
    /// Create a multiclass descriptor.
    #[must_use]
    pub fn multiclass<S: Into<String>>(
        vocab: impl IntoIterator<Item = S>,
        null_idx: Option<usize>,
    ) -> Self {
        Self::MulticlassPreds {
            vocab: vocab.into_iter().map(Into::into).collect(),
            null_idx,
        }
    }

    /// Short name of the variant.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RegressionScore => "regression_score",
            Self::MulticlassPreds { .. } => "multiclass_preds",
            Self::CategoryLabel => "category_label",
            Self::TextSegment => "text_segment",
            Self::GeneratedText => "generated_text",
            Self::GeneratedTextCandidates => "generated_text_candidates",
        }
    }

    /// Vocabulary of a multiclass field.
    pub fn vocab(&self) -> Option<&[String]> {
        match self {
            Self::MulticlassPreds { vocab, .. } => Some(vocab),
            _ => None,
        }
    }

    /// Null class index of a multiclass field.
    pub fn null_idx(&self) -> Option<usize> {
        match self {
            Self::MulticlassPreds { null_idx, .. } => *null_idx,
            _ => None,
        }
    }

    /// True for fields holding generated text (single or ranked candidates).
    pub fn is_generation(&self) -> bool {
        matches!(self, Self::GeneratedText | Self::GeneratedTextCandidates)
    }

    /// Check the descriptor's invariants.
    ///
    /// Vocabulary entries must be unique and `null_idx` must index into the
    /// vocabulary. Other variants are always valid.
    pub fn validate(&self) -> Result<()> {
        let Self::MulticlassPreds { vocab, null_idx } = self else {
            return Ok(());
        };

        let mut seen = HashSet::with_capacity(vocab.len());
        for entry in vocab {
            if !seen.insert(entry.as_str()) {
                return Err(Error::InvalidFieldType(format!(
                    "duplicate vocabulary entry '{entry}'"
                )));
            }
        }

        match null_idx {
            Some(idx) if *idx >= vocab.len() => Err(Error::InvalidFieldType(format!(
                "null_idx {idx} out of range for vocabulary of {}",
                vocab.len()
            ))),
            _ => Ok(()),
        }
    }
}

/// A reference label for one example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    /// Regression target
    Score(f64),
    /// Class name
    Category(String),
    /// Reference text
    Text(String),
}

impl Label {
    pub fn category(name: impl Into<String>) -> Self {
        Self::Category(name.into())
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }
}

/// A model prediction for one example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Prediction {
    /// Regression output
    Score(f64),
    /// Class probabilities aligned with the field vocabulary
    Probabilities(Vec<f64>),
    /// Generated text
    Text(String),
    /// Generated candidates, best first
    Candidates(Vec<(String, f64)>),
}

impl Prediction {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Text of the top-ranked candidate, or the text itself.
    ///
    /// An empty candidate list yields the empty string. Returns `None` for
    /// non-text predictions.
    pub fn top_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Candidates(candidates) => {
                Some(candidates.first().map_or("", |(text, _)| text.as_str()))
            }
            Self::Score(_) | Self::Probabilities(_) => None,
        }
    }
}

/// Per-example metadata carrying lineage information.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExampleMetadata {
    /// Identifier of the example this one was derived from
    #[serde(rename = "parentId", default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    /// Any other annotations
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ExampleMetadata {
    /// Metadata linking an example to its parent.
    #[must_use]
    pub fn with_parent(parent_id: impl Into<String>) -> Self {
        Self {
            parent_id: Some(parent_id.into()),
            extra: BTreeMap::new(),
        }
    }
}

/// Metric name to value.
///
/// Only finite values are stored, so an undefined statistic is simply absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreMap(BTreeMap<String, f64>);

impl ScoreMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a score, dropping NaN and infinities.
    ///
    /// Returns whether the value was stored.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }
        self.0.insert(name.into(), value);
        true
    }

    /// Insert an optional score; `None` leaves the map untouched.
    pub fn insert_opt(&mut self, name: impl Into<String>, value: Option<f64>) -> bool {
        match value {
            Some(value) => self.insert(name, value),
            None => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(name, value)| (name.as_str(), *value))
    }

    /// Merge another map into this one.
    ///
    /// Values from `other` win; the names that were already present are
    /// returned.
    pub fn merge(&mut self, other: ScoreMap) -> Vec<String> {
        let mut collisions = Vec::new();
        for (name, value) in other.0 {
            if self.0.insert(name.clone(), value).is_some() {
                collisions.push(name);
            }
        }
        collisions
    }

    /// Append a suffix to every key.
    #[must_use]
    pub fn with_suffix(self, suffix: &str) -> Self {
        if suffix.is_empty() {
            return self;
        }
        Self(
            self.0
                .into_iter()
                .map(|(name, value)| (format!("{name}{suffix}"), value))
                .collect(),
        )
    }
}

impl IntoIterator for ScoreMap {
    type Item = (String, f64);
    type IntoIter = std::collections::btree_map::IntoIter<String, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
