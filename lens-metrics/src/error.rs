//! Error types for metric computation.

use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a single metric call.
///
/// Degenerate statistics, unresolved lineage and empty batches are not
/// errors: they surface as omitted keys or empty score maps instead.
#[derive(Debug, Error)]
pub enum Error {
    /// Labels and predictions are not parallel.
    #[error("length mismatch: {labels} labels vs {predictions} predictions")]
    LengthMismatch { labels: usize, predictions: usize },

    /// A probability vector does not line up with the vocabulary.
    #[error("prediction {index} has {actual} probabilities, vocabulary has {expected}")]
    VocabularyMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },

    /// Identifiers or metadata are not parallel with the predictions.
    #[error(
        "lineage mismatch: {predictions} predictions, {ids} ids, {metadata} metadata entries"
    )]
    LineageMismatch {
        predictions: usize,
        ids: usize,
        metadata: usize,
    },

    /// The same identifier appears twice in one batch.
    #[error("duplicate example id: {0}")]
    DuplicateIdentifier(String),

    /// A record does not have the shape the metric expects.
    #[error("record {index}: expected {expected}")]
    UnexpectedRecord { index: usize, expected: &'static str },

    /// A category label that is not part of the vocabulary.
    #[error("label not in vocabulary: {0}")]
    UnknownLabel(String),

    /// A field type descriptor that breaks its own invariants.
    #[error("invalid field type: {0}")]
    InvalidFieldType(String),

    /// Invalid or unreadable configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_mismatch_displays_both_counts() {
        let err = Error::LengthMismatch {
            labels: 3,
            predictions: 4,
        };
        assert_eq!(err.to_string(), "length mismatch: 3 labels vs 4 predictions");
    }

    #[test]
    fn vocabulary_mismatch_names_the_offending_record() {
        let err = Error::VocabularyMismatch {
            index: 2,
            expected: 3,
            actual: 2,
        };
        assert_eq!(
            err.to_string(),
            "prediction 2 has 2 probabilities, vocabulary has 3"
        );
    }

    #[test]
    fn error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
