use super::calibration::{CalibrationError, ForceExtensionTable, GaussianChain};
use super::error::EngineError;
use super::topology::NetworkTopology;
use crate::core::models::graph::MonomerGraph;
use nalgebra::Vector3;
use rand::Rng;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

/// How the move engine draws the monomer index for an unspecified move.
///
/// Drawing from the entire population follows the convention of local
/// Monte Carlo updaters; the relaxation is only meaningful for crosslinks,
/// so both behaviors stay available and callers choose explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionPolicy {
    /// Uniform over all monomers; drawing a non-crosslink yields a
    /// zero-shift move (a wasted relaxation step).
    AnyMonomer,
    /// Uniform over the keys of the topology table.
    #[default]
    CrosslinksOnly,
}

/// An ephemeral displacement proposal for one monomer.
///
/// Created per relaxation attempt, consumed when applied to the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct EquilibriumMove {
    index: usize,
    shift: Vector3<f64>,
}

impl EquilibriumMove {
    /// Index of the monomer the move targets.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The displacement toward force equilibrium.
    pub fn shift(&self) -> &Vector3<f64> {
        &self.shift
    }
}

/// The force-extension relation variant used to compute equilibrium shifts.
#[derive(Debug, Clone, PartialEq)]
pub enum MoveStrategy {
    /// Analytic Gaussian-chain relation with per-segment weighting.
    Gaussian,
    /// Tabulated non-linear relation; `None` until a calibration file has
    /// been loaded successfully.
    Tabulated { table: Option<ForceExtensionTable> },
}

/// Computes the displacement that nudges a crosslink toward the point where
/// the net entropic force of its chain segments vanishes.
///
/// The engine is a pure function of the current positions and the topology
/// snapshot, except for the random index selection, which takes an explicit
/// RNG handle. Move lifecycle: a `propose*` call creates the move, [`check`]
/// always accepts at this layer, [`apply`] lands the displacement.
///
/// [`check`]: EquilibriumMoveEngine::check
/// [`apply`]: EquilibriumMoveEngine::apply
#[derive(Debug, Clone)]
pub struct EquilibriumMoveEngine {
    strategy: MoveStrategy,
    selection: SelectionPolicy,
    chain: GaussianChain,
    accuracy: f64,
    strict: bool,
}

impl EquilibriumMoveEngine {
    /// Creates an engine using the analytic Gaussian-chain relation.
    pub fn gaussian(chain: GaussianChain, selection: SelectionPolicy) -> Self {
        Self {
            strategy: MoveStrategy::Gaussian,
            selection,
            chain,
            accuracy: super::calibration::DEFAULT_ACCURACY,
            strict: true,
        }
    }

    /// Creates an engine using the tabulated non-linear relation.
    ///
    /// The table starts out unbuilt; load a calibration curve with
    /// [`set_calibration_file`](Self::set_calibration_file) before proposing
    /// moves.
    pub fn tabulated(
        chain: GaussianChain,
        selection: SelectionPolicy,
        accuracy: f64,
        strict: bool,
    ) -> Self {
        Self {
            strategy: MoveStrategy::Tabulated { table: None },
            selection,
            chain,
            accuracy,
            strict,
        }
    }

    pub fn strategy(&self) -> &MoveStrategy {
        &self.strategy
    }

    pub fn selection(&self) -> SelectionPolicy {
        self.selection
    }

    /// Sets the relaxation parameter of the equivalent chain, recomputing its
    /// spring constant.
    pub fn set_relaxation(&mut self, relaxation: f64) {
        self.chain.set_relaxation(relaxation);
    }

    /// Loads (or reloads) the force-extension calibration curve.
    ///
    /// A missing file is reported as a warning and leaves the table unbuilt;
    /// proposing tabulated moves then fails with
    /// [`CalibrationError::TableUnavailable`]. Malformed files are hard
    /// errors. For a Gaussian engine the call is a no-op.
    pub fn set_calibration_file(&mut self, path: &Path) -> Result<(), EngineError> {
        let MoveStrategy::Tabulated { table } = &mut self.strategy else {
            warn!(
                path = %path.display(),
                "calibration file ignored: engine uses the Gaussian relation"
            );
            return Ok(());
        };
        if !path.exists() {
            warn!(
                path = %path.display(),
                "calibration file not found; force-extension table left unbuilt"
            );
            *table = None;
            return Ok(());
        }
        *table = Some(ForceExtensionTable::from_path(
            path,
            self.accuracy,
            self.strict,
        )?);
        Ok(())
    }

    /// Computes the equilibrium displacement for a crosslink.
    ///
    /// A crosslink with no neighbor records yields the zero vector. The index
    /// must be a key of the topology table; unknown ids are a hard error,
    /// never a silent zero.
    pub fn compute_shift(
        &self,
        index: usize,
        topology: &NetworkTopology,
        graph: &MonomerGraph,
    ) -> Result<Vector3<f64>, EngineError> {
        let neighbors = topology.neighbors(index)?;
        if neighbors.is_empty() {
            return Ok(Vector3::zeros());
        }
        let position = graph.position(index).ok_or(EngineError::InvalidIndex {
            index,
            len: graph.len(),
        })?;

        match &self.strategy {
            MoveStrategy::Gaussian => {
                // Average the per-segment entropic forces, then relax along
                // an equivalent chain whose segment count is the harmonic
                // combination of the strand lengths.
                let mut force = Vector3::zeros();
                let mut inverse_segments = 0.0;
                for record in neighbors {
                    let neighbor = graph.position(record.id).ok_or(EngineError::InvalidIndex {
                        index: record.id,
                        len: graph.len(),
                    })?;
                    let extension = position - neighbor - record.jump;
                    inverse_segments += 1.0 / record.segments as f64;
                    force += self.chain.segment_force(&extension, record.segments as f64);
                }
                force /= neighbors.len() as f64;
                let effective_segments = 1.0 / inverse_segments;
                Ok(self.chain.segment_extension(&force, effective_segments))
            }
            MoveStrategy::Tabulated { table } => {
                let table = table
                    .as_ref()
                    .ok_or(CalibrationError::TableUnavailable)
                    .map_err(EngineError::from)?;
                let mut force = Vector3::zeros();
                for record in neighbors {
                    let neighbor = graph.position(record.id).ok_or(EngineError::InvalidIndex {
                        index: record.id,
                        len: graph.len(),
                    })?;
                    let stretch = neighbor - position + record.jump;
                    force += table.force(&stretch)?;
                }
                force /= neighbors.len() as f64;
                Ok(self.chain.extension(&force))
            }
        }
    }

    /// Proposes a move for an index drawn according to the selection policy.
    pub fn propose(
        &self,
        graph: &MonomerGraph,
        topology: &NetworkTopology,
        rng: &mut impl Rng,
    ) -> Result<EquilibriumMove, EngineError> {
        let index = match self.selection {
            SelectionPolicy::AnyMonomer => {
                if graph.is_empty() {
                    return Err(EngineError::NoCrosslinks);
                }
                let index = rng.gen_range(0..graph.len());
                if !topology.contains(index) {
                    debug!(index, "drawn monomer is not a crosslink; zero-shift move");
                    return Ok(EquilibriumMove {
                        index,
                        shift: Vector3::zeros(),
                    });
                }
                index
            }
            SelectionPolicy::CrosslinksOnly => {
                let ids = topology.crosslink_ids();
                if ids.is_empty() {
                    return Err(EngineError::NoCrosslinks);
                }
                ids[rng.gen_range(0..ids.len())]
            }
        };
        let shift = self.compute_shift(index, topology, graph)?;
        Ok(EquilibriumMove { index, shift })
    }

    /// Proposes a move for an explicitly given index.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidIndex`] if the index is outside the node
    /// range, or a topology lookup error if it is not a crosslink.
    pub fn propose_at(
        &self,
        index: usize,
        graph: &MonomerGraph,
        topology: &NetworkTopology,
    ) -> Result<EquilibriumMove, EngineError> {
        if index >= graph.len() {
            return Err(EngineError::InvalidIndex {
                index,
                len: graph.len(),
            });
        }
        let shift = self.compute_shift(index, topology, graph)?;
        Ok(EquilibriumMove { index, shift })
    }

    /// Proposes a move with an externally supplied displacement.
    pub fn propose_directed(
        &self,
        index: usize,
        shift: Vector3<f64>,
        graph: &MonomerGraph,
    ) -> Result<EquilibriumMove, EngineError> {
        if index >= graph.len() {
            return Err(EngineError::InvalidIndex {
                index,
                len: graph.len(),
            });
        }
        Ok(EquilibriumMove { index, shift })
    }

    /// Checks whether the move is acceptable.
    ///
    /// Always true at this layer; the final accept/reject decision belongs to
    /// the driving loop.
    pub fn check(&self, _move: &EquilibriumMove) -> bool {
        true
    }

    /// Applies the move to the graph, adding the shift to the stored position.
    ///
    /// Pinned monomers are left untouched. Returns `true` if the position
    /// changed.
    pub fn apply(&self, proposal: &EquilibriumMove, graph: &mut MonomerGraph) -> bool {
        match graph.monomer(proposal.index) {
            Some(monomer) if monomer.movable => {
                graph.displace(proposal.index, &proposal.shift);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::PeriodicBox;
    use crate::core::models::monomer::Monomer;
    use crate::engine::topology::{NetworkTopologyBuilder, TopologyError};
    use nalgebra::Point3;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn open_box() -> PeriodicBox {
        PeriodicBox::new(Vector3::new(1e6, 1e6, 1e6), [true; 3]).unwrap()
    }

    /// A hub bonded directly to pinned anchors at the given positions.
    fn hub_with_anchors(hub: Point3<f64>, anchors: &[Point3<f64>]) -> (MonomerGraph, usize) {
        let mut graph = MonomerGraph::new();
        let hub_id = graph.add_monomer(Monomer::new(hub));
        for &p in anchors {
            let a = graph.add_monomer(Monomer::pinned(p));
            graph.connect(hub_id, a).unwrap();
        }
        (graph, hub_id)
    }

    fn linear_table() -> ForceExtensionTable {
        let samples: Vec<(f64, f64)> = (1..=100).map(|i| (i as f64 * 0.2, i as f64 * 0.1)).collect();
        ForceExtensionTable::from_samples(&samples, 0.1, true).unwrap()
    }

    fn tabulated_engine(table: ForceExtensionTable) -> EquilibriumMoveEngine {
        let mut engine = EquilibriumMoveEngine::tabulated(
            GaussianChain::new(1.0, 1.0),
            SelectionPolicy::CrosslinksOnly,
            0.1,
            true,
        );
        engine.strategy = MoveStrategy::Tabulated { table: Some(table) };
        engine
    }

    #[test]
    fn symmetric_neighbors_give_a_vanishing_shift() {
        let anchors = [
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(-1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, -1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(0.0, 0.0, -1.0),
        ];
        let (graph, hub) = hub_with_anchors(Point3::origin(), &anchors);
        let pbox = open_box();
        let topology = NetworkTopologyBuilder::new(&graph, &pbox).build().unwrap();

        let gaussian = EquilibriumMoveEngine::gaussian(
            GaussianChain::new(1.0, 1.0),
            SelectionPolicy::CrosslinksOnly,
        );
        let shift = gaussian.compute_shift(hub, &topology, &graph).unwrap();
        assert!(shift.norm() < 1e-12);

        let tabulated = tabulated_engine(linear_table());
        let shift = tabulated.compute_shift(hub, &topology, &graph).unwrap();
        assert!(shift.norm() < 1e-12);
    }

    #[test]
    fn gaussian_shift_points_toward_the_stretched_side() {
        let (graph, hub) = hub_with_anchors(
            Point3::new(1.0, 0.0, 0.0),
            &[
                Point3::origin(),
                Point3::new(4.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
            ],
        );
        let pbox = open_box();
        let topology = NetworkTopologyBuilder::new(&graph, &pbox).build().unwrap();
        let engine = EquilibriumMoveEngine::gaussian(
            GaussianChain::new(1.0, 1.0),
            SelectionPolicy::CrosslinksOnly,
        );

        let shift = engine.compute_shift(hub, &topology, &graph).unwrap();
        // The anchor at x = 4 is the farthest, so the hub is pulled in +x.
        assert!(shift.x > 0.0);
    }

    #[test]
    fn gaussian_shift_magnitude_matches_the_closed_form() {
        // Four one-segment anchors; the y pair cancels, so the mean force is
        // (1 - 3) * 3 / 4 along x and the effective segment count is 1/4.
        let (graph, hub) = hub_with_anchors(
            Point3::new(1.0, 0.0, 0.0),
            &[Point3::origin(), Point3::new(4.0, 0.0, 0.0)],
        );
        // Make the hub a crosslink with a third, force-neutral pair of arms.
        let mut graph = graph;
        let up = graph.add_monomer(Monomer::pinned(Point3::new(1.0, 1.0, 0.0)));
        let down = graph.add_monomer(Monomer::pinned(Point3::new(1.0, -1.0, 0.0)));
        graph.connect(hub, up).unwrap();
        graph.connect(hub, down).unwrap();

        let pbox = open_box();
        let topology = NetworkTopologyBuilder::new(&graph, &pbox).build().unwrap();
        let engine = EquilibriumMoveEngine::gaussian(
            GaussianChain::new(1.0, 1.0),
            SelectionPolicy::CrosslinksOnly,
        );
        let shift = engine.compute_shift(hub, &topology, &graph).unwrap();

        let mean_force = (1.0 - 3.0) * 3.0 / 4.0;
        let expected = -mean_force / 3.0 * (0.25f64).sqrt();
        assert!((shift.x - expected).abs() < 1e-12);
        assert!(shift.y.abs() < 1e-12);
    }

    #[test]
    fn empty_neighbor_list_yields_zero_shift() {
        // Three loose arms dangle off the hub; none produces a record.
        let mut graph = MonomerGraph::new();
        let hub = graph.add_monomer(Monomer::new(Point3::origin()));
        for dx in [1.0, -1.0, 2.0] {
            let arm = graph.add_monomer(Monomer::new(Point3::new(dx, 0.0, 0.0)));
            graph.connect(hub, arm).unwrap();
        }
        let pbox = open_box();
        let topology = NetworkTopologyBuilder::new(&graph, &pbox).build().unwrap();
        let engine = EquilibriumMoveEngine::gaussian(
            GaussianChain::new(1.0, 1.0),
            SelectionPolicy::CrosslinksOnly,
        );

        let shift = engine.compute_shift(hub, &topology, &graph).unwrap();
        assert_eq!(shift, Vector3::zeros());
    }

    #[test]
    fn unknown_crosslink_is_a_hard_error() {
        let (graph, _) = hub_with_anchors(
            Point3::origin(),
            &[
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(-1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
        );
        let pbox = open_box();
        let topology = NetworkTopologyBuilder::new(&graph, &pbox).build().unwrap();
        let engine = EquilibriumMoveEngine::gaussian(
            GaussianChain::new(1.0, 1.0),
            SelectionPolicy::CrosslinksOnly,
        );

        // Monomer 1 is an anchor, not a crosslink.
        let result = engine.compute_shift(1, &topology, &graph);
        assert!(matches!(
            result,
            Err(EngineError::Topology {
                source: TopologyError::UnknownCrosslink { id: 1 }
            })
        ));
    }

    #[test]
    fn propose_at_rejects_out_of_range_indices() {
        let (graph, _) = hub_with_anchors(
            Point3::origin(),
            &[
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(-1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
        );
        let pbox = open_box();
        let topology = NetworkTopologyBuilder::new(&graph, &pbox).build().unwrap();
        let engine = EquilibriumMoveEngine::gaussian(
            GaussianChain::new(1.0, 1.0),
            SelectionPolicy::CrosslinksOnly,
        );

        let result = engine.propose_at(99, &graph, &topology);
        assert!(matches!(
            result,
            Err(EngineError::InvalidIndex { index: 99, len: 4 })
        ));
    }

    #[test]
    fn crosslinks_only_policy_draws_topology_keys() {
        let (graph, hub) = hub_with_anchors(
            Point3::origin(),
            &[
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(-1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
        );
        let pbox = open_box();
        let topology = NetworkTopologyBuilder::new(&graph, &pbox).build().unwrap();
        let engine = EquilibriumMoveEngine::gaussian(
            GaussianChain::new(1.0, 1.0),
            SelectionPolicy::CrosslinksOnly,
        );

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let proposal = engine.propose(&graph, &topology, &mut rng).unwrap();
            assert_eq!(proposal.index(), hub);
        }
    }

    #[test]
    fn any_monomer_policy_wastes_steps_on_chain_monomers() {
        let (graph, hub) = hub_with_anchors(
            Point3::new(0.5, 0.0, 0.0),
            &[
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(-1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
        );
        let pbox = open_box();
        let topology = NetworkTopologyBuilder::new(&graph, &pbox).build().unwrap();
        let engine = EquilibriumMoveEngine::gaussian(
            GaussianChain::new(1.0, 1.0),
            SelectionPolicy::AnyMonomer,
        );

        let mut rng = StdRng::seed_from_u64(11);
        let mut non_crosslink_draws = 0;
        for _ in 0..40 {
            let proposal = engine.propose(&graph, &topology, &mut rng).unwrap();
            if proposal.index() != hub {
                non_crosslink_draws += 1;
                assert_eq!(*proposal.shift(), Vector3::zeros());
            }
        }
        assert!(non_crosslink_draws > 0);
    }

    #[test]
    fn tabulated_strategy_without_a_table_is_unavailable() {
        let (graph, hub) = hub_with_anchors(
            Point3::origin(),
            &[
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(-1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
        );
        let pbox = open_box();
        let topology = NetworkTopologyBuilder::new(&graph, &pbox).build().unwrap();
        let engine = EquilibriumMoveEngine::tabulated(
            GaussianChain::new(1.0, 1.0),
            SelectionPolicy::CrosslinksOnly,
            0.1,
            true,
        );

        let result = engine.compute_shift(hub, &topology, &graph);
        assert!(matches!(
            result,
            Err(EngineError::Calibration {
                source: CalibrationError::TableUnavailable
            })
        ));
    }

    #[test]
    fn missing_calibration_file_leaves_the_table_unbuilt() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = EquilibriumMoveEngine::tabulated(
            GaussianChain::new(1.0, 1.0),
            SelectionPolicy::CrosslinksOnly,
            0.1,
            true,
        );
        engine
            .set_calibration_file(&dir.path().join("absent.dat"))
            .unwrap();
        assert!(matches!(
            engine.strategy(),
            MoveStrategy::Tabulated { table: None }
        ));
    }

    #[test]
    fn calibration_file_round_trips_through_the_engine() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fe.dat");
        let mut content = String::from("# force extension\n");
        for i in 1..=100 {
            content.push_str(&format!("{} {}\n", i as f64 * 0.2, i as f64 * 0.1));
        }
        std::fs::write(&path, content).unwrap();

        let (graph, hub) = hub_with_anchors(
            Point3::new(0.5, 0.0, 0.0),
            &[
                Point3::origin(),
                Point3::new(2.0, 0.0, 0.0),
                Point3::new(0.5, 1.0, 0.0),
            ],
        );
        let pbox = open_box();
        let topology = NetworkTopologyBuilder::new(&graph, &pbox).build().unwrap();

        let mut engine = EquilibriumMoveEngine::tabulated(
            GaussianChain::new(1.0, 1.0),
            SelectionPolicy::CrosslinksOnly,
            0.1,
            true,
        );
        engine.set_calibration_file(&path).unwrap();

        let shift = engine.compute_shift(hub, &topology, &graph).unwrap();
        // The anchor at x = 2 pulls hardest.
        assert!(shift.x > 0.0);
    }

    #[test]
    fn apply_respects_the_movable_tag() {
        let mut graph = MonomerGraph::new();
        let free = graph.add_monomer(Monomer::new(Point3::origin()));
        let pinned = graph.add_monomer(Monomer::pinned(Point3::origin()));
        let engine = EquilibriumMoveEngine::gaussian(
            GaussianChain::new(1.0, 1.0),
            SelectionPolicy::CrosslinksOnly,
        );

        let shift = Vector3::new(1.0, 0.0, 0.0);
        let mv = engine.propose_directed(free, shift, &graph).unwrap();
        assert!(engine.check(&mv));
        assert!(engine.apply(&mv, &mut graph));
        assert_eq!(graph.position(free), Some(Point3::new(1.0, 0.0, 0.0)));

        let mv = engine.propose_directed(pinned, shift, &graph).unwrap();
        assert!(!engine.apply(&mv, &mut graph));
        assert_eq!(graph.position(pinned), Some(Point3::origin()));
    }
}
