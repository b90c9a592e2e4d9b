use crate::core::geometry::PeriodicBox;
use crate::core::models::graph::MonomerGraph;
use nalgebra::{Point3, Vector3};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq)]
pub enum TopologyError {
    #[error("Crosslink id {id} does not exist in the topology table")]
    UnknownCrosslink { id: usize },

    #[error(
        "Chain walk starting at monomer {start} did not terminate; the network contains a cycle of two-functional monomers with no crosslink"
    )]
    NonTerminatingWalk { start: usize },
}

/// One topological neighbor of a crosslink.
///
/// `jump` is the periodic-image correction accumulated along the chain walk:
/// subtracting it from the raw position difference of the two endpoints
/// reproduces the physically unwrapped path, even when the walk winds across
/// a periodic boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborRecord {
    /// Index of the neighboring crosslink (or pinned anchor).
    pub id: usize,
    /// Number of bonds along the chain path to the neighbor.
    pub segments: u32,
    /// Periodic-image correction, in multiples of the box extents.
    pub jump: Vector3<f64>,
}

/// The crosslink connectivity table of a network.
///
/// Backed by a dense arena indexed by a compacted crosslink ordinal with an
/// id-to-ordinal side table, so neighbor lookups stay cache-friendly while the
/// public interface speaks monomer indices. The table is a snapshot: it is
/// rebuilt wholesale by [`NetworkTopologyBuilder::build`] whenever the
/// connectivity may have changed and is read-only in between.
#[derive(Debug, Clone, Default)]
pub struct NetworkTopology {
    /// Ordinal -> crosslink id.
    ids: Vec<usize>,
    /// Crosslink id -> ordinal.
    ordinals: HashMap<usize, usize>,
    /// Neighbor lists, indexed by ordinal.
    records: Vec<Vec<NeighborRecord>>,
}

impl NetworkTopology {
    /// Returns the neighbor records of a crosslink.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::UnknownCrosslink`] if `id` is not a key of the
    /// table; an unknown id never yields a silent empty list.
    pub fn neighbors(&self, id: usize) -> Result<&[NeighborRecord], TopologyError> {
        self.ordinals
            .get(&id)
            .map(|&ord| self.records[ord].as_slice())
            .ok_or(TopologyError::UnknownCrosslink { id })
    }

    /// Returns `true` if `id` is a key of the table.
    pub fn contains(&self, id: usize) -> bool {
        self.ordinals.contains_key(&id)
    }

    /// Returns the number of crosslinks in the table.
    pub fn crosslink_count(&self) -> usize {
        self.ids.len()
    }

    /// Returns the crosslink ids, in ascending order.
    pub fn crosslink_ids(&self) -> &[usize] {
        &self.ids
    }

    /// Returns an iterator over `(crosslink id, neighbor records)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[NeighborRecord])> {
        self.ids
            .iter()
            .zip(self.records.iter())
            .map(|(&id, records)| (id, records.as_slice()))
    }
}

/// Walks the monomer graph and produces the crosslink connectivity table.
///
/// For every crosslink the builder follows each bond stub through the run of
/// two-functional monomers behind it, counting segments and accumulating the
/// periodic-image jump, until the walk reaches the next crosslink.
pub struct NetworkTopologyBuilder<'a> {
    graph: &'a MonomerGraph,
    pbox: &'a PeriodicBox,
}

impl<'a> NetworkTopologyBuilder<'a> {
    pub fn new(graph: &'a MonomerGraph, pbox: &'a PeriodicBox) -> Self {
        Self { graph, pbox }
    }

    /// Builds the topology table from scratch.
    ///
    /// The build is idempotent and safe to repeat whenever connectivity
    /// changes; only monomers with more than two bonds become keys.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::NonTerminatingWalk`] if a walk takes more
    /// steps than the graph has monomers (a cycle of two-functional monomers
    /// that never reaches a crosslink).
    pub fn build(&self) -> Result<NetworkTopology, TopologyError> {
        let mut topology = NetworkTopology::default();

        for start in 0..self.graph.len() {
            if !self.graph.is_crosslink(start) {
                continue;
            }
            let mut records = Vec::new();
            for k in 0..self.graph.degree(start).unwrap() {
                let head = self.graph.neighbor(start, k).unwrap();
                if let Some(record) = self.walk(start, head)? {
                    records.push(record);
                }
            }
            let ordinal = topology.ids.len();
            topology.ids.push(start);
            topology.ordinals.insert(start, ordinal);
            topology.records.push(records);
        }

        debug!(
            crosslinks = topology.crosslink_count(),
            "crosslink topology table built"
        );
        Ok(topology)
    }

    /// Follows one bond stub of `start` until the walk leaves the run of
    /// two-functional monomers.
    ///
    /// Returns a record when the walk ends on a crosslink or on a pinned
    /// chain end (an anchor of the ideal reference network); a dangling
    /// unpinned end yields no record.
    fn walk(&self, start: usize, first: usize) -> Result<Option<NeighborRecord>, TopologyError> {
        let start_pos = self.graph.position(start).unwrap();
        let mut tail = start;
        let mut head = first;
        let mut segments = 1u32;
        let mut jump = self.winding(&start_pos, head);

        loop {
            let degree = self.graph.degree(head).unwrap();
            if degree > 2 {
                return Ok(Some(NeighborRecord {
                    id: head,
                    segments,
                    jump,
                }));
            }
            if degree < 2 {
                // Chain end: a pinned monomer anchors the segment, a loose
                // one dangles outside the elastically active network.
                if !self.graph.monomer(head).unwrap().movable {
                    return Ok(Some(NeighborRecord {
                        id: head,
                        segments,
                        jump,
                    }));
                }
                return Ok(None);
            }

            if segments as usize > self.graph.len() {
                return Err(TopologyError::NonTerminatingWalk { start });
            }

            // Advance to the unique neighbor of `head` that is not `tail`.
            let next = self
                .graph
                .neighbors(head)
                .unwrap()
                .iter()
                .copied()
                .find(|&n| n != tail)
                .unwrap();
            tail = head;
            head = next;
            segments += 1;
            jump = self.winding(&start_pos, head);
        }
    }

    /// Periodic-image correction of the walk at its current monomer: the
    /// minimum-image displacement from the fixed start minus the raw one.
    ///
    /// Zero while the walk stays inside the box; a (negated) multiple of the
    /// box extents once it has wound across a boundary. Re-derived at every
    /// step so that `position(start) - position(current) - jump` equals the
    /// minimum-image vector throughout the walk.
    fn winding(&self, start_pos: &Point3<f64>, current: usize) -> Vector3<f64> {
        let current_pos = self.graph.position(current).unwrap();
        self.pbox.minimum_image(start_pos, &current_pos) - (current_pos - start_pos)
    }
}
