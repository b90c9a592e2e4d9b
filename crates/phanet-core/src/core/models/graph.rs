use super::monomer::Monomer;
use nalgebra::{Point3, Vector3};

/// Represents a bonded polymer network as a monomer graph.
///
/// This struct is the central data structure for network relaxation: nodes are
/// monomers addressed by contiguous `usize` indices, edges are covalent bonds.
/// It maintains a cached adjacency list so degree and neighbor queries are
/// constant time during topology walks.
#[derive(Debug, Clone, Default)]
pub struct MonomerGraph {
    /// Primary storage for monomers; the index into this vector is the monomer id.
    monomers: Vec<Monomer>,
    /// Cached adjacency list, indexed like `monomers`.
    adjacency: Vec<Vec<usize>>,
}

impl MonomerGraph {
    /// Creates a new, empty monomer graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty graph with capacity reserved for `n` monomers.
    pub fn with_capacity(n: usize) -> Self {
        Self {
            monomers: Vec::with_capacity(n),
            adjacency: Vec::with_capacity(n),
        }
    }

    /// Adds a monomer to the graph and returns its index.
    pub fn add_monomer(&mut self, monomer: Monomer) -> usize {
        self.monomers.push(monomer);
        self.adjacency.push(Vec::new());
        self.monomers.len() - 1
    }

    /// Returns the number of monomers in the graph.
    pub fn len(&self) -> usize {
        self.monomers.len()
    }

    /// Returns `true` if the graph holds no monomers.
    pub fn is_empty(&self) -> bool {
        self.monomers.is_empty()
    }

    /// Retrieves an immutable reference to a monomer by index.
    ///
    /// Returns `None` if the index is out of range.
    pub fn monomer(&self, index: usize) -> Option<&Monomer> {
        self.monomers.get(index)
    }

    /// Retrieves a mutable reference to a monomer by index.
    pub fn monomer_mut(&mut self, index: usize) -> Option<&mut Monomer> {
        self.monomers.get_mut(index)
    }

    /// Returns an iterator over all monomers with their indices.
    pub fn monomers_iter(&self) -> impl Iterator<Item = (usize, &Monomer)> {
        self.monomers.iter().enumerate()
    }

    /// Connects two monomers with a covalent bond.
    ///
    /// The bond is symmetric and the operation is idempotent; connecting an
    /// already-bonded pair succeeds without creating duplicates. Self-bonds
    /// are rejected.
    ///
    /// # Return
    ///
    /// Returns `Some(())` if both indices exist and `a != b`, otherwise `None`.
    pub fn connect(&mut self, a: usize, b: usize) -> Option<()> {
        if a == b || a >= self.monomers.len() || b >= self.monomers.len() {
            return None;
        }
        if self.adjacency[a].contains(&b) {
            // Bond already exists, operation is successful (idempotent)
            return Some(());
        }
        self.adjacency[a].push(b);
        self.adjacency[b].push(a);
        Some(())
    }

    /// Returns `true` if monomers `a` and `b` share a bond.
    pub fn are_connected(&self, a: usize, b: usize) -> bool {
        self.adjacency.get(a).is_some_and(|n| n.contains(&b))
    }

    /// Returns the bond count (degree) of a monomer, or `None` if the index
    /// is out of range.
    pub fn degree(&self, index: usize) -> Option<usize> {
        self.adjacency.get(index).map(|n| n.len())
    }

    /// Returns the bonded neighbors of a monomer, or `None` if the index is
    /// out of range.
    pub fn neighbors(&self, index: usize) -> Option<&[usize]> {
        self.adjacency.get(index).map(|n| n.as_slice())
    }

    /// Returns the `k`-th bonded neighbor of a monomer.
    pub fn neighbor(&self, index: usize, k: usize) -> Option<usize> {
        self.adjacency.get(index).and_then(|n| n.get(k)).copied()
    }

    /// Returns the position of a monomer, or `None` if the index is out of range.
    pub fn position(&self, index: usize) -> Option<Point3<f64>> {
        self.monomers.get(index).map(|m| m.position)
    }

    /// Overwrites the position of a monomer.
    pub fn set_position(&mut self, index: usize, position: Point3<f64>) -> Option<()> {
        self.monomers.get_mut(index).map(|m| m.position = position)
    }

    /// Adds a displacement to the stored position of a monomer.
    pub fn displace(&mut self, index: usize, shift: &Vector3<f64>) -> Option<()> {
        self.monomers.get_mut(index).map(|m| m.position += shift)
    }

    /// Returns `true` if the monomer is a crosslink, i.e. has more than two bonds.
    pub fn is_crosslink(&self, index: usize) -> bool {
        self.degree(index).is_some_and(|d| d > 2)
    }

    /// Returns the indices of all crosslinks, in ascending order.
    pub fn crosslink_ids(&self) -> Vec<usize> {
        (0..self.monomers.len())
            .filter(|&i| self.is_crosslink(i))
            .collect()
    }
}
