use super::graph::MonomerGraph;
use super::monomer::Monomer;
use crate::core::geometry::PeriodicBox;
use nalgebra::{Point3, Vector3};
use rand::Rng;

/// Builds an ideal reference star network: one central crosslink with `arms`
/// chains random-walked outward, each arm end pinned as a fixed anchor.
///
/// This is the reference configuration for equilibrating a single crosslink
/// against ideally relaxed strands: the anchors stand in for the surrounding
/// phantom network.
pub struct StarNetworkBuilder {
    arms: usize,
    monomers_per_arm: usize,
    bond_length: f64,
    pin_ends: bool,
}

impl StarNetworkBuilder {
    /// Creates a builder for a star of `arms` chains with `monomers_per_arm`
    /// monomers each.
    ///
    /// A star is only a crosslink for `arms > 2`; the builder does not
    /// enforce this, the topology walk simply finds no key otherwise.
    pub fn new(arms: usize, monomers_per_arm: usize) -> Self {
        Self {
            arms,
            monomers_per_arm,
            bond_length: 2.68,
            pin_ends: true,
        }
    }

    /// Overrides the step length of the arm random walks.
    pub fn bond_length(mut self, bond_length: f64) -> Self {
        self.bond_length = bond_length;
        self
    }

    /// Controls whether arm ends are pinned (anchors) or left dangling.
    pub fn pin_ends(mut self, pin: bool) -> Self {
        self.pin_ends = pin;
        self
    }

    /// Generates the network inside the given box.
    ///
    /// The hub starts at the box center; arm positions are raw (unwrapped)
    /// coordinates, so the minimum-image machinery sees genuine winding when
    /// a walk leaves the box.
    pub fn build(&self, pbox: &PeriodicBox, rng: &mut impl Rng) -> MonomerGraph {
        let center = Point3::from(pbox.extents() / 2.0);
        let mut graph =
            MonomerGraph::with_capacity(1 + self.arms * self.monomers_per_arm);
        let hub = graph.add_monomer(Monomer::new(center));

        for _ in 0..self.arms {
            let mut prev = hub;
            let mut position = center;
            for step in 0..self.monomers_per_arm {
                position += random_unit_vector(rng) * self.bond_length;
                let last = step + 1 == self.monomers_per_arm;
                let monomer = if last && self.pin_ends {
                    Monomer::pinned(position)
                } else {
                    Monomer::new(position)
                };
                let index = graph.add_monomer(monomer);
                graph.connect(prev, index).unwrap();
                prev = index;
            }
        }
        graph
    }
}

/// Draws a uniformly distributed unit vector (Marsaglia rejection).
fn random_unit_vector(rng: &mut impl Rng) -> Vector3<f64> {
    loop {
        let v = Vector3::new(
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
        );
        let norm_squared: f64 = v.norm_squared();
        if norm_squared > 1e-12 && norm_squared <= 1.0 {
            return v / norm_squared.sqrt();
        }
    }
}
