use super::calibration;
use super::moves::SelectionPolicy;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}

/// Which force-extension relation the relaxation uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// Analytic Gaussian-chain relation.
    #[default]
    Gaussian,
    /// Tabulated non-linear relation from a calibration file.
    Tabulated,
}

fn default_bond_length() -> f64 {
    calibration::DEFAULT_BOND_LENGTH
}

fn default_accuracy() -> f64 {
    calibration::DEFAULT_ACCURACY
}

fn default_relaxation() -> f64 {
    1.0
}

fn default_damping() -> f64 {
    1.0
}

fn default_max_sweeps() -> usize {
    10_000
}

fn default_strict_table() -> bool {
    true
}

/// Parameters of a relaxation run.
///
/// Deserializable from TOML for file-driven setups; the
/// [`RelaxationConfigBuilder`] covers programmatic construction.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RelaxationConfig {
    /// Force-extension relation variant.
    #[serde(default)]
    pub strategy: StrategyKind,
    /// Index selection policy for proposed moves.
    #[serde(default)]
    pub selection: SelectionPolicy,
    /// Mean squared bond length of the underlying model.
    #[serde(default = "default_bond_length")]
    pub bond_length: f64,
    /// Relaxation parameter of the equivalent chain (tabulated variant).
    #[serde(default = "default_relaxation")]
    pub relaxation: f64,
    /// Extension grid step of the calibration table.
    #[serde(default = "default_accuracy")]
    pub accuracy: f64,
    /// Whether out-of-range table lookups are hard errors (clamped otherwise).
    #[serde(default = "default_strict_table")]
    pub strict_table: bool,
    /// Calibration curve for the tabulated strategy.
    #[serde(default)]
    pub calibration_file: Option<PathBuf>,
    /// Convergence threshold on the mean applied shift per sweep.
    pub threshold: f64,
    /// Under-relaxation factor applied to every shift before it lands.
    #[serde(default = "default_damping")]
    pub damping: f64,
    /// Hard cap on the number of relaxation sweeps.
    #[serde(default = "default_max_sweeps")]
    pub max_sweeps: usize,
}

impl RelaxationConfig {
    pub fn builder() -> RelaxationConfigBuilder {
        RelaxationConfigBuilder::default()
    }

    /// Loads a configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }
}

#[derive(Default)]
pub struct RelaxationConfigBuilder {
    strategy: Option<StrategyKind>,
    selection: Option<SelectionPolicy>,
    bond_length: Option<f64>,
    relaxation: Option<f64>,
    accuracy: Option<f64>,
    strict_table: Option<bool>,
    calibration_file: Option<PathBuf>,
    threshold: Option<f64>,
    damping: Option<f64>,
    max_sweeps: Option<usize>,
}

impl RelaxationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = Some(strategy);
        self
    }
    pub fn selection(mut self, selection: SelectionPolicy) -> Self {
        self.selection = Some(selection);
        self
    }
    pub fn bond_length(mut self, bond_length: f64) -> Self {
        self.bond_length = Some(bond_length);
        self
    }
    pub fn relaxation(mut self, relaxation: f64) -> Self {
        self.relaxation = Some(relaxation);
        self
    }
    pub fn accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = Some(accuracy);
        self
    }
    pub fn strict_table(mut self, strict: bool) -> Self {
        self.strict_table = Some(strict);
        self
    }
    pub fn calibration_file(mut self, path: PathBuf) -> Self {
        self.calibration_file = Some(path);
        self
    }
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }
    pub fn damping(mut self, damping: f64) -> Self {
        self.damping = Some(damping);
        self
    }
    pub fn max_sweeps(mut self, max_sweeps: usize) -> Self {
        self.max_sweeps = Some(max_sweeps);
        self
    }

    pub fn build(self) -> Result<RelaxationConfig, ConfigError> {
        Ok(RelaxationConfig {
            strategy: self.strategy.unwrap_or_default(),
            selection: self.selection.unwrap_or_default(),
            bond_length: self.bond_length.unwrap_or_else(default_bond_length),
            relaxation: self.relaxation.unwrap_or_else(default_relaxation),
            accuracy: self.accuracy.unwrap_or_else(default_accuracy),
            strict_table: self.strict_table.unwrap_or_else(default_strict_table),
            calibration_file: self.calibration_file,
            threshold: self
                .threshold
                .ok_or(ConfigError::MissingParameter("threshold"))?,
            damping: self.damping.unwrap_or_else(default_damping),
            max_sweeps: self.max_sweeps.unwrap_or_else(default_max_sweeps),
        })
    }
}
