//! Evaluation configuration, loadable from TOML.
//!
//! ```toml
//! metrics = ["map", "ndcg", "P@10"]
//! non_judged = 0.0
//! significance = "paired"
//! parallel = true
//! ```
//!
//! Every key is optional; missing keys take their default.

use super::compare::TestKind;
use super::metric::{Metric, MetricSet};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings for an evaluation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Metrics to compute, in report order.
    pub metrics: Vec<Metric>,
    /// Relevance assigned to unjudged documents in relevance lookups.
    pub non_judged: f64,
    /// Test used when comparing runs.
    pub significance: TestKind,
    /// Evaluate runs in parallel (needs the `parallel` feature).
    pub parallel: bool,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            metrics: MetricSet::standard().metrics().to_vec(),
            non_judged: 0.0,
            significance: TestKind::Paired,
            parallel: false,
        }
    }
}

impl EvalConfig {
    /// Start building a config.
    #[must_use]
    pub fn builder() -> EvalConfigBuilder {
        EvalConfigBuilder::new()
    }

    /// Parse from TOML text.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] on malformed TOML, an unknown metric name, or an
    /// empty metric list.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s).map_err(|e| Error::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if the file cannot be read, otherwise as
    /// [`EvalConfig::from_toml_str`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        log::debug!(
            "loaded config from {}: {} metrics",
            path.display(),
            config.metrics.len()
        );
        Ok(config)
    }

    /// Serialize to TOML.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if serialization fails.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| Error::config(e.to_string()))
    }

    /// The configured metrics as a metric set.
    #[must_use]
    pub fn measures(&self) -> MetricSet {
        MetricSet::new("config", self.metrics.clone())
    }

    fn validate(&self) -> Result<()> {
        if self.metrics.is_empty() {
            return Err(Error::config("metric list is empty"));
        }
        if !self.non_judged.is_finite() {
            return Err(Error::config(format!(
                "non_judged must be finite, got {}",
                self.non_judged
            )));
        }
        if self.parallel && !cfg!(feature = "parallel") {
            log::warn!("parallel evaluation requested but the `parallel` feature is disabled");
        }
        Ok(())
    }
}

/// Builder for [`EvalConfig`].
#[derive(Debug, Clone, Default)]
pub struct EvalConfigBuilder {
    metrics: Option<Vec<Metric>>,
    non_judged: f64,
    significance: TestKind,
    parallel: bool,
}

impl EvalConfigBuilder {
    /// Builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the metric list.
    #[must_use]
    pub fn with_metrics(mut self, metrics: impl IntoIterator<Item = Metric>) -> Self {
        self.metrics = Some(metrics.into_iter().collect());
        self
    }

    /// Append one metric (starting from an empty list, not the standard set).
    #[must_use]
    pub fn add_metric(mut self, metric: Metric) -> Self {
        self.metrics.get_or_insert_with(Vec::new).push(metric);
        self
    }

    /// Relevance for unjudged documents.
    #[must_use]
    pub fn with_non_judged(mut self, non_judged: f64) -> Self {
        self.non_judged = non_judged;
        self
    }

    /// Significance test kind.
    #[must_use]
    pub fn with_significance(mut self, test: TestKind) -> Self {
        self.significance = test;
        self
    }

    /// Enable or disable parallel evaluation.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Finish.
    ///
    /// Without any metric call the standard set is used.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] for an explicitly empty metric list or a non-finite
    /// `non_judged`.
    pub fn build(self) -> Result<EvalConfig> {
        let config = EvalConfig {
            metrics: self
                .metrics
                .unwrap_or_else(|| MetricSet::standard().metrics().to_vec()),
            non_judged: self.non_judged,
            significance: self.significance,
            parallel: self.parallel,
        };
        config.validate()?;
        Ok(config)
    }
}
