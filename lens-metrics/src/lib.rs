//! Metric families for scoring model predictions against reference labels.
//!
//! This crate compares a batch of predictions with its labels and reports a
//! flat map of named scores. Which metrics run is decided by the declared
//! [`FieldType`] of the prediction field.
//!
//! # Architecture
//!
//! - **Families** implement [`Metric`]: regression, multiclass
//!   classification, paired divergence over example lineage, and text
//!   generation overlap
//! - **Registry** ([`MetricRegistry`]) holds the families, built once from
//!   code or from a [`MetricsConfig`]
//! - **Dispatcher** ([`MetricDispatcher`]) borrows a registry, picks the
//!   compatible families for a [`FieldBatch`] and merges their scores
//!
//! ```
//! use lens_metrics::{FieldBatch, FieldType, Label, MetricDispatcher, MetricRegistry, Prediction};
//!
//! let registry = MetricRegistry::with_defaults();
//! let batch = FieldBatch::new(
//!     FieldType::RegressionScore,
//!     FieldType::RegressionScore,
//!     vec![Label::Score(1.0), Label::Score(2.0)],
//!     vec![Prediction::Score(1.5), Prediction::Score(2.0)],
//! );
//! let scores = MetricDispatcher::new(&registry).evaluate(&batch).unwrap();
//! assert_eq!(scores.get("mse"), Some(0.125));
//! ```

mod config;
mod dispatcher;
mod error;
mod generation;
mod metric;
mod multiclass;
mod paired;
mod registry;
mod regression;
mod stats;
mod types;

// Configuration
pub use config::{
    BleuConfig, FamilyConfig, GenerationConfig, MetricsConfig, RougeConfig, load_config_from_file,
    load_config_or_default, parse_config, validate_config,
};

// Dispatch
pub use dispatcher::{FieldBatch, Lineage, MetricDispatcher};
pub use registry::MetricRegistry;

// Error types
pub use error::{Error, Result};

// Metric families
pub use generation::{GenerationMetrics, corpus_bleu, rouge_l, stem, tokenize};
pub use metric::{Metric, MetricFamily};
pub use multiclass::MulticlassMetrics;
pub use paired::{ExamplePair, MulticlassPairedMetrics, find_pairs};
pub use regression::RegressionMetrics;

// Data model
pub use types::{ExampleMetadata, FieldType, Label, Prediction, ScoreMap};
