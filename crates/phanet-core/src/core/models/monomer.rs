use nalgebra::Point3;

/// Represents a single monomer of the polymer network.
///
/// Positions are continuous (off-lattice): the connectivity of a network is
/// typically generated on a lattice, but the force equilibration of crosslinks
/// happens in continuous space.
#[derive(Debug, Clone, PartialEq)]
pub struct Monomer {
    /// The 3D coordinates of the monomer.
    pub position: Point3<f64>,
    /// Whether the monomer may be displaced during relaxation.
    ///
    /// Pinned monomers (`movable == false`) act as fixed anchors, e.g. the
    /// far chain ends of an ideal reference star.
    pub movable: bool,
}

impl Monomer {
    /// Creates a movable monomer at the given position.
    pub fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            movable: true,
        }
    }

    /// Creates a pinned monomer that relaxation must not displace.
    pub fn pinned(position: Point3<f64>) -> Self {
        Self {
            position,
            movable: false,
        }
    }
}
