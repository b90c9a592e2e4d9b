use thiserror::Error;

use super::calibration::CalibrationError;
use super::config::ConfigError;
use super::topology::TopologyError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Monomer index {index} is out of range for a population of {len}")]
    InvalidIndex { index: usize, len: usize },

    #[error("The network holds no crosslinks to relax")]
    NoCrosslinks,

    #[error("Relaxation failed to converge after {sweeps} sweeps")]
    Convergence { sweeps: usize },

    #[error("Topology lookup failed: {source}")]
    Topology {
        #[from]
        source: TopologyError,
    },

    #[error("Force-extension calibration failed: {source}")]
    Calibration {
        #[from]
        source: CalibrationError,
    },

    #[error("Configuration error: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },
}
