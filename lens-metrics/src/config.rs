//! Metric configuration loaded from TOML.
//!
//! Every section and field is optional; an empty file enables all families
//! with their standard parameters.
//!
//! ```toml
//! [paired]
//! enabled = false
//!
//! [generation.bleu]
//! max_order = 2
//!
//! [generation.rouge]
//! use_stemmer = false
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Top-level metric configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub regression: FamilyConfig,
    pub multiclass: FamilyConfig,
    pub paired: FamilyConfig,
    pub generation: GenerationConfig,
}

/// Switch for a family without parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FamilyConfig {
    pub enabled: bool,
}

impl Default for FamilyConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Generation-overlap family settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub enabled: bool,
    pub bleu: BleuConfig,
    pub rouge: RougeConfig,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bleu: BleuConfig::default(),
            rouge: RougeConfig::default(),
        }
    }
}

/// Corpus BLEU parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BleuConfig {
    pub enabled: bool,
    /// Highest n-gram order considered
    pub max_order: usize,
    /// Numerator used for orders with no matching n-grams
    pub smooth_value: f64,
}

impl BleuConfig {
    /// Highest n-gram order accepted by [`validate`](Self::validate).
    pub const MAX_ORDER: usize = 16;

    /// Check that the parameters give a well-defined score.
    ///
    /// `max_order` must be between 1 and [`MAX_ORDER`](Self::MAX_ORDER);
    /// `smooth_value` must be finite and positive.
    pub fn validate(&self) -> Result<()> {
        if self.max_order == 0 || self.max_order > Self::MAX_ORDER {
            return Err(Error::Config(format!(
                "generation.bleu.max_order must be between 1 and {}, got {}",
                Self::MAX_ORDER,
                self.max_order
            )));
        }
        if !self.smooth_value.is_finite() || self.smooth_value <= 0.0 {
            return Err(Error::Config(format!(
                "generation.bleu.smooth_value must be positive, got {}",
                self.smooth_value
            )));
        }
        Ok(())
    }
}

impl Default for BleuConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_order: 4,
            smooth_value: 0.1,
        }
    }
}

/// ROUGE-L parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RougeConfig {
    pub enabled: bool,
    /// Porter-stem tokens longer than three characters
    pub use_stemmer: bool,
}

impl Default for RougeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            use_stemmer: true,
        }
    }
}

/// Load and validate configuration from a TOML file.
pub fn load_config_from_file(path: impl AsRef<Path>) -> Result<MetricsConfig> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("failed to read config file {}: {}", path.display(), e))
    })?;

    let config = parse_config(&content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Parse configuration from a TOML string.
pub fn parse_config(toml_content: &str) -> Result<MetricsConfig> {
    toml::from_str(toml_content).map_err(|e| Error::Config(format!("invalid config TOML: {}", e)))
}

/// Load configuration, falling back to defaults when the file is missing or
/// invalid.
pub fn load_config_or_default(path: impl AsRef<Path>) -> MetricsConfig {
    let path = path.as_ref();
    match load_config_from_file(path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "using default metrics config");
            MetricsConfig::default()
        }
    }
}

/// Check parameter ranges.
pub fn validate_config(config: &MetricsConfig) -> Result<()> {
    config.generation.bleu.validate()
}
