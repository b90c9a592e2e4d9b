use nalgebra::Vector3;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Mean bond length of the underlying lattice model, in lattice units.
pub const DEFAULT_BOND_LENGTH: f64 = 2.68;

/// Step of the uniform extension grid the calibration curve is resampled onto.
pub const DEFAULT_ACCURACY: f64 = 0.1;

#[derive(Debug, Error)]
pub enum CalibrationError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Malformed calibration data at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Calibration extensions must increase monotonically (line {line})")]
    NotMonotonic { line: usize },

    #[error("Calibration curve holds no usable samples")]
    Empty,

    #[error("No force-extension table has been built; set a valid calibration file first")]
    TableUnavailable,

    #[error("Extension {length:.4} exceeds the calibrated maximum {max:.4}")]
    ExtensionOutOfRange { length: f64, max: f64 },
}

/// The analytic Gaussian-chain force-extension relation.
///
/// An ideal chain of `n` segments with mean squared bond length `b²` behaves
/// as an entropic spring. The uniform relations use an equivalent relaxation
/// chain of stiffness `spring_constant = relaxation · b² / 3`; the
/// per-segment relations take the actual segment count of a strand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianChain {
    bond_length: f64,
    relaxation: f64,
    spring_constant: f64,
}

impl GaussianChain {
    pub fn new(bond_length: f64, relaxation: f64) -> Self {
        Self {
            bond_length,
            relaxation,
            spring_constant: relaxation * bond_length * bond_length / 3.0,
        }
    }

    /// Sets the relaxation parameter and recomputes the spring constant.
    pub fn set_relaxation(&mut self, relaxation: f64) {
        self.relaxation = relaxation;
        self.spring_constant = relaxation * self.bond_length * self.bond_length / 3.0;
        info!(
            relaxation,
            spring_constant = self.spring_constant,
            "relaxation parameter updated"
        );
    }

    pub fn relaxation(&self) -> f64 {
        self.relaxation
    }

    pub fn bond_length(&self) -> f64 {
        self.bond_length
    }

    pub fn spring_constant(&self) -> f64 {
        self.spring_constant
    }

    /// Force of the equivalent relaxation chain at the given extension.
    pub fn force(&self, extension: &Vector3<f64>) -> Vector3<f64> {
        extension / self.spring_constant
    }

    /// Extension of the equivalent relaxation chain under the given force.
    pub fn extension(&self, force: &Vector3<f64>) -> Vector3<f64> {
        force * self.spring_constant
    }

    /// Entropic force of a strand of `segments` bonds stretched by `extension`.
    pub fn segment_force(&self, extension: &Vector3<f64>, segments: f64) -> Vector3<f64> {
        extension * 3.0 / (segments.sqrt() * self.bond_length * self.bond_length)
    }

    /// Displacement that relaxes a strand of `segments` bonds under `force`.
    ///
    /// Carries the restoring sign: the displacement points against the
    /// extension that produced the force.
    pub fn segment_extension(&self, force: &Vector3<f64>, segments: f64) -> Vector3<f64> {
        force / (-3.0) * segments.sqrt() * self.bond_length * self.bond_length
    }
}

/// A tabulated non-linear force-extension relation.
///
/// Built from a two-column calibration file (`force extension` pairs in
/// increasing order; `#` and blank lines are skipped), resampled onto a
/// uniform extension grid at step `accuracy` with entry 0 pinned to zero
/// force. Immutable after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct ForceExtensionTable {
    accuracy: f64,
    strict: bool,
    /// Force magnitude at extension `index * accuracy`.
    grid: Vec<f64>,
    min_force: f64,
    max_force: f64,
    min_extension: f64,
    max_extension: f64,
}

impl ForceExtensionTable {
    /// Loads and resamples a calibration file.
    pub fn from_path(
        path: &Path,
        accuracy: f64,
        strict: bool,
    ) -> Result<Self, CalibrationError> {
        let content = std::fs::read_to_string(path).map_err(|e| CalibrationError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let samples = Self::parse_samples(&content)?;
        let table = Self::build(&samples, accuracy, strict)?;
        debug!(
            path = %path.display(),
            entries = table.grid.len(),
            max_extension = table.max_extension,
            max_force = table.max_force,
            "force-extension table built"
        );
        Ok(table)
    }

    /// Builds a table directly from `(force, extension)` pairs in increasing
    /// extension order, without the implicit origin sample.
    pub fn from_samples(
        samples: &[(f64, f64)],
        accuracy: f64,
        strict: bool,
    ) -> Result<Self, CalibrationError> {
        let mut seeded = vec![(0.0, 0.0)];
        seeded.extend(
            samples
                .iter()
                .copied()
                .filter(|&(f, e)| !(f == 0.0 && e == 0.0)),
        );
        Self::build(&seeded, accuracy, strict)
    }

    /// Parses the two-column calibration format.
    ///
    /// The origin sample is seeded implicitly; comment and blank lines are
    /// consumed and never re-examined, so a non-data line cannot stall the
    /// parser.
    fn parse_samples(content: &str) -> Result<Vec<(f64, f64)>, CalibrationError> {
        let mut samples: Vec<(f64, f64)> = vec![(0.0, 0.0)];
        for (number, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut fields = line.split_whitespace();
            let force = Self::parse_field(fields.next(), number + 1)?;
            let extension = Self::parse_field(fields.next(), number + 1)?;
            if force == 0.0 && extension == 0.0 {
                // The origin is already seeded.
                continue;
            }
            if extension <= samples.last().unwrap().1 {
                return Err(CalibrationError::NotMonotonic { line: number + 1 });
            }
            samples.push((force, extension));
        }
        Ok(samples)
    }

    fn parse_field(field: Option<&str>, line: usize) -> Result<f64, CalibrationError> {
        let token = field.ok_or(CalibrationError::Parse {
            line,
            message: "expected two columns: force extension".to_string(),
        })?;
        token.parse::<f64>().map_err(|e| CalibrationError::Parse {
            line,
            message: format!("invalid number '{token}': {e}"),
        })
    }

    fn build(
        samples: &[(f64, f64)],
        accuracy: f64,
        strict: bool,
    ) -> Result<Self, CalibrationError> {
        if samples.len() < 2 {
            return Err(CalibrationError::Empty);
        }

        let min_force = samples.iter().map(|s| s.0).fold(f64::INFINITY, f64::min);
        let max_force = samples
            .iter()
            .map(|s| s.0)
            .fold(f64::NEG_INFINITY, f64::max);
        let min_extension = samples.iter().map(|s| s.1).fold(f64::INFINITY, f64::min);
        let max_extension = samples
            .iter()
            .map(|s| s.1)
            .fold(f64::NEG_INFINITY, f64::max);

        let entries = (max_extension / accuracy).floor() as usize;
        if entries == 0 {
            return Err(CalibrationError::Empty);
        }

        // Resample onto the uniform grid; each entry interpolates linearly
        // between the two bracketing input samples.
        let mut grid = Vec::with_capacity(entries);
        grid.push(0.0);
        let mut bracket = 0;
        for index in 1..entries {
            let target = index as f64 * accuracy;
            while samples[bracket + 1].1 <= target {
                bracket += 1;
            }
            let (f0, e0) = samples[bracket];
            let (f1, e1) = samples[bracket + 1];
            let factor = (target - e0) / (e1 - e0);
            grid.push(f0 + (f1 - f0) * factor);
        }

        Ok(Self {
            accuracy,
            strict,
            grid,
            min_force,
            max_force,
            min_extension,
            max_extension,
        })
    }

    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    /// Largest extension the resampled grid can answer for.
    pub fn max_tabulated_extension(&self) -> f64 {
        (self.grid.len() - 1) as f64 * self.accuracy
    }

    /// Observed extension range of the calibration input.
    pub fn extension_range(&self) -> (f64, f64) {
        (self.min_extension, self.max_extension)
    }

    /// Observed force range of the calibration input.
    pub fn force_range(&self) -> (f64, f64) {
        (self.min_force, self.max_force)
    }

    /// Converts an extension vector into the tabulated restoring force.
    ///
    /// A zero-length input maps to the zero vector. The scalar force is
    /// interpolated between the bracketing grid entries and applied along the
    /// unit direction of the input.
    ///
    /// # Errors
    ///
    /// Returns [`CalibrationError::ExtensionOutOfRange`] when the length
    /// exceeds the tabulated maximum and the table is strict; a non-strict
    /// table clamps to the last entry instead.
    pub fn force(&self, extension: &Vector3<f64>) -> Result<Vector3<f64>, CalibrationError> {
        let length = extension.norm();
        if length == 0.0 {
            return Ok(Vector3::zeros());
        }

        let x = length / self.accuracy;
        let down = x.floor() as usize;
        let up = x.ceil() as usize;

        let magnitude = if up >= self.grid.len() {
            if self.strict {
                return Err(CalibrationError::ExtensionOutOfRange {
                    length,
                    max: self.max_tabulated_extension(),
                });
            }
            *self.grid.last().unwrap()
        } else if up == down {
            self.grid[down]
        } else {
            self.grid[down] + (self.grid[up] - self.grid[down]) * (x - down as f64)
        };

        Ok(extension.normalize() * magnitude)
    }
}
