use crate::core::geometry::PeriodicBox;
use crate::core::models::graph::MonomerGraph;
use crate::engine::calibration::GaussianChain;
use crate::engine::config::{RelaxationConfig, StrategyKind};
use crate::engine::error::EngineError;
use crate::engine::moves::EquilibriumMoveEngine;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::topology::{NetworkTopology, NetworkTopologyBuilder};
use rand::Rng;
use tracing::{info, instrument, warn};

/// Outcome of a relaxation run.
#[derive(Debug, Clone, PartialEq)]
pub struct RelaxationReport {
    /// Number of sweeps performed.
    pub sweeps: usize,
    /// Mean applied shift of the final sweep.
    pub mean_shift: f64,
}

/// Drives the network into force equilibrium.
///
/// The topology table is synchronized once up front, then the engine proposes
/// one move per crosslink per sweep, drawing indices according to the
/// configured selection policy. A sweep's mean applied shift falling below
/// `config.threshold` ends the run.
///
/// # Errors
///
/// Returns [`EngineError::Convergence`] if `config.max_sweeps` sweeps do not
/// reach the threshold, besides propagating topology, calibration, and
/// configuration failures.
#[instrument(skip_all, name = "relaxation_workflow")]
pub fn run(
    graph: &mut MonomerGraph,
    pbox: &PeriodicBox,
    config: &RelaxationConfig,
    rng: &mut impl Rng,
    reporter: &ProgressReporter,
) -> Result<(RelaxationReport, NetworkTopology), EngineError> {
    // === Phase 0: Synchronize the connectivity table ===
    reporter.report(Progress::PhaseStart {
        name: "Synchronization",
    });
    let topology = NetworkTopologyBuilder::new(graph, pbox).build()?;
    info!(
        crosslinks = topology.crosslink_count(),
        monomers = graph.len(),
        "topology table synchronized"
    );
    reporter.report(Progress::PhaseFinish);

    if topology.crosslink_count() == 0 {
        return Err(EngineError::NoCrosslinks);
    }

    // === Phase 1: Assemble the move engine ===
    let chain = GaussianChain::new(config.bond_length, config.relaxation);
    let engine = match config.strategy {
        StrategyKind::Gaussian => EquilibriumMoveEngine::gaussian(chain, config.selection),
        StrategyKind::Tabulated => {
            let mut engine = EquilibriumMoveEngine::tabulated(
                chain,
                config.selection,
                config.accuracy,
                config.strict_table,
            );
            match &config.calibration_file {
                Some(path) => engine.set_calibration_file(path)?,
                None => warn!("tabulated strategy configured without a calibration file"),
            }
            engine
        }
    };

    // === Phase 2: Sweep until the mean shift drops below the threshold ===
    reporter.report(Progress::PhaseStart { name: "Relaxation" });
    let moves_per_sweep = topology.crosslink_count();
    let mut mean_shift = f64::INFINITY;

    for sweep in 1..=config.max_sweeps {
        reporter.report(Progress::SweepStart {
            moves: moves_per_sweep as u64,
        });

        let mut applied_total = 0.0;
        for _ in 0..moves_per_sweep {
            let proposal = engine.propose(graph, &topology, rng)?;
            if !engine.check(&proposal) {
                continue;
            }
            let damped = engine.propose_directed(
                proposal.index(),
                proposal.shift() * config.damping,
                graph,
            )?;
            if engine.apply(&damped, graph) {
                applied_total += damped.shift().norm();
            }
        }

        mean_shift = applied_total / moves_per_sweep as f64;
        reporter.report(Progress::SweepFinish { mean_shift });

        if mean_shift < config.threshold {
            info!(sweep, mean_shift, "relaxation converged");
            reporter.report(Progress::PhaseFinish);
            return Ok((
                RelaxationReport {
                    sweeps: sweep,
                    mean_shift,
                },
                topology,
            ));
        }
    }

    warn!(
        max_sweeps = config.max_sweeps,
        mean_shift, "relaxation did not converge"
    );
    Err(EngineError::Convergence {
        sweeps: config.max_sweeps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::monomer::Monomer;
    use nalgebra::{Point3, Vector3};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn open_box() -> PeriodicBox {
        PeriodicBox::new(Vector3::new(1e6, 1e6, 1e6), [true; 3]).unwrap()
    }

    /// A hub displaced from the centroid of four pinned anchors.
    fn displaced_star(hub_at: Point3<f64>) -> (MonomerGraph, usize) {
        let mut graph = MonomerGraph::new();
        let hub = graph.add_monomer(Monomer::new(hub_at));
        let anchors = [
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(-1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, -1.0, 0.0),
        ];
        for p in anchors {
            let a = graph.add_monomer(Monomer::pinned(p));
            graph.connect(hub, a).unwrap();
        }
        (graph, hub)
    }

    fn tight_config() -> RelaxationConfig {
        RelaxationConfig::builder()
            .bond_length(1.0)
            .threshold(1e-9)
            .max_sweeps(500)
            .build()
            .unwrap()
    }

    #[test]
    fn stretched_star_relaxes_onto_the_anchor_centroid() {
        let (mut graph, hub) = displaced_star(Point3::new(2.0, 1.0, 0.5));
        let pbox = open_box();
        let mut rng = StdRng::seed_from_u64(3);
        let reporter = ProgressReporter::new();

        let (report, topology) =
            run(&mut graph, &pbox, &tight_config(), &mut rng, &reporter).unwrap();

        assert!(report.mean_shift < 1e-9);
        assert_eq!(topology.crosslink_count(), 1);
        let final_pos = graph.position(hub).unwrap();
        assert!((final_pos - Point3::origin()).norm() < 1e-6);
    }

    #[test]
    fn damping_still_converges() {
        let (mut graph, hub) = displaced_star(Point3::new(1.5, 0.0, 0.0));
        let pbox = open_box();
        let config = RelaxationConfig::builder()
            .bond_length(1.0)
            .threshold(1e-9)
            .damping(0.5)
            .max_sweeps(2_000)
            .build()
            .unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let reporter = ProgressReporter::new();

        run(&mut graph, &pbox, &config, &mut rng, &reporter).unwrap();
        assert!((graph.position(hub).unwrap() - Point3::origin()).norm() < 1e-6);
    }

    #[test]
    fn pinned_crosslink_does_not_move() {
        let (mut graph, hub) = displaced_star(Point3::new(2.0, 0.0, 0.0));
        graph.monomer_mut(hub).unwrap().movable = false;
        let pbox = open_box();
        let mut rng = StdRng::seed_from_u64(9);
        let reporter = ProgressReporter::new();

        let (report, _) = run(&mut graph, &pbox, &tight_config(), &mut rng, &reporter).unwrap();

        // Nothing can move, so the first sweep already measures zero shift.
        assert_eq!(report.sweeps, 1);
        assert_eq!(graph.position(hub), Some(Point3::new(2.0, 0.0, 0.0)));
    }

    #[test]
    fn unreachable_threshold_is_a_convergence_error() {
        let (mut graph, _) = displaced_star(Point3::new(2.0, 0.0, 0.0));
        let pbox = open_box();
        let config = RelaxationConfig::builder()
            .bond_length(1.0)
            .threshold(0.0)
            .max_sweeps(3)
            .build()
            .unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let reporter = ProgressReporter::new();

        let result = run(&mut graph, &pbox, &config, &mut rng, &reporter);
        assert!(matches!(
            result,
            Err(EngineError::Convergence { sweeps: 3 })
        ));
    }

    #[test]
    fn network_without_crosslinks_is_rejected() {
        let mut graph = MonomerGraph::new();
        let a = graph.add_monomer(Monomer::new(Point3::origin()));
        let b = graph.add_monomer(Monomer::new(Point3::new(1.0, 0.0, 0.0)));
        graph.connect(a, b).unwrap();

        let pbox = open_box();
        let mut rng = StdRng::seed_from_u64(2);
        let reporter = ProgressReporter::new();

        let result = run(&mut graph, &pbox, &tight_config(), &mut rng, &reporter);
        assert!(matches!(result, Err(EngineError::NoCrosslinks)));
    }

    #[test]
    fn progress_events_cover_both_phases() {
        use std::sync::Mutex;

        let (mut graph, _) = displaced_star(Point3::new(0.5, 0.0, 0.0));
        let pbox = open_box();
        let events = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|e| {
            events.lock().unwrap().push(format!("{e:?}"));
        }));
        let mut rng = StdRng::seed_from_u64(4);

        run(&mut graph, &pbox, &tight_config(), &mut rng, &reporter).unwrap();
        drop(reporter);

        let events = events.into_inner().unwrap();
        assert!(events.iter().any(|e| e.contains("Synchronization")));
        assert!(events.iter().any(|e| e.contains("Relaxation")));
        assert!(events.iter().any(|e| e.contains("SweepFinish")));
    }
}
