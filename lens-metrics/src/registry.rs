//! Metric registry
//!
//! The MetricRegistry is built once at startup and then only read:
//! - Registering metric families explicitly or from configuration
//! - Looking up families by name
//! - Providing the evaluation order to the dispatcher

use crate::config::{MetricsConfig, validate_config};
use crate::error::Result;
use crate::generation::GenerationMetrics;
use crate::metric::{Metric, MetricFamily};
use crate::multiclass::MulticlassMetrics;
use crate::paired::MulticlassPairedMetrics;
use crate::regression::RegressionMetrics;

/// Ordered collection of metric families.
///
/// Families run in registration order, which also decides which value wins
/// when two families report the same score name.
#[derive(Debug, Clone, Default)]
pub struct MetricRegistry {
    families: Vec<MetricFamily>,
}

impl MetricRegistry {
    /// Create a new empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every family with default parameters
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(RegressionMetrics::new());
        registry.register(MulticlassMetrics::new());
        registry.register(MulticlassPairedMetrics::new());
        registry.register(GenerationMetrics::default());
        registry
    }

    /// Registry holding the families enabled in `config`
    pub fn from_config(config: &MetricsConfig) -> Result<Self> {
        validate_config(config)?;

        let mut registry = Self::new();
        if config.regression.enabled {
            registry.register(RegressionMetrics::new());
        }
        if config.multiclass.enabled {
            registry.register(MulticlassMetrics::new());
        }
        if config.paired.enabled {
            registry.register(MulticlassPairedMetrics::new());
        }
        let generation = &config.generation;
        if generation.enabled {
            registry.register(GenerationMetrics::new(
                generation.bleu.clone(),
                generation.rouge.clone(),
            )?);
        }

        tracing::debug!(families = ?registry.names(), "built metric registry");
        Ok(registry)
    }

    /// Register a family, replacing any family with the same name in place
    pub fn register(&mut self, family: impl Into<MetricFamily>) -> &mut Self {
        let family = family.into();
        match self.families.iter_mut().find(|f| f.name() == family.name()) {
            Some(existing) => *existing = family,
            None => self.families.push(family),
        }
        self
    }

    /// Get a family by name
    pub fn get(&self, name: &str) -> Option<&MetricFamily> {
        self.families.iter().find(|f| f.name() == name)
    }

    /// All families in registration order
    pub fn families(&self) -> &[MetricFamily] {
        &self.families
    }

    /// Family names in registration order
    pub fn names(&self) -> Vec<&'static str> {
        self.families.iter().map(|f| f.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.families.len()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }
}
