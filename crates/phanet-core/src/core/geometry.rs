use nalgebra::{Point3, Vector3};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("Box extent along axis {axis} must be positive, got {extent}")]
    NonPositiveExtent { axis: char, extent: f64 },
}

/// A rectangular simulation box with per-axis periodicity.
///
/// All distance bookkeeping during topology walks goes through
/// [`PeriodicBox::minimum_image`], so the rest of the library never folds
/// coordinates itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodicBox {
    extents: Vector3<f64>,
    periodic: [bool; 3],
}

impl PeriodicBox {
    /// Creates a box with the given edge lengths and periodicity flags.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::NonPositiveExtent`] if any edge length is not
    /// strictly positive.
    pub fn new(extents: Vector3<f64>, periodic: [bool; 3]) -> Result<Self, GeometryError> {
        for (i, axis) in ['x', 'y', 'z'].into_iter().enumerate() {
            if extents[i] <= 0.0 {
                return Err(GeometryError::NonPositiveExtent {
                    axis,
                    extent: extents[i],
                });
            }
        }
        Ok(Self { extents, periodic })
    }

    /// Creates a cubic box, periodic along all three axes.
    pub fn cubic(edge: f64) -> Result<Self, GeometryError> {
        Self::new(Vector3::new(edge, edge, edge), [true, true, true])
    }

    /// Returns the edge lengths of the box.
    pub fn extents(&self) -> Vector3<f64> {
        self.extents
    }

    /// Returns `true` if the given axis (0, 1, 2) is periodic.
    pub fn is_periodic(&self, axis: usize) -> bool {
        self.periodic[axis]
    }

    /// Returns the displacement from `from` to the nearest periodic image of `to`.
    ///
    /// Along non-periodic axes the plain difference passes through unchanged.
    pub fn minimum_image(&self, from: &Point3<f64>, to: &Point3<f64>) -> Vector3<f64> {
        let mut d = to - from;
        for axis in 0..3 {
            if self.periodic[axis] {
                let l = self.extents[axis];
                d[axis] -= l * (d[axis] / l).round();
            }
        }
        d
    }
}
