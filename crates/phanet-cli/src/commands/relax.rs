use crate::cli::RelaxArgs;
use crate::error::{CliError, Result};
use crate::ui::CliProgressHandler;
use phanet::core::geometry::PeriodicBox;
use phanet::core::io::report;
use phanet::core::models::builder::StarNetworkBuilder;
use phanet::engine::config::{RelaxationConfig, StrategyKind};
use phanet::engine::progress::ProgressReporter;
use phanet::workflows::relax;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fs::File;
use tracing::{info, warn};

/// Default convergence threshold on the mean shift per sweep.
const DEFAULT_THRESHOLD: f64 = 0.5;
/// Default relaxation parameter of the equivalent chain.
const DEFAULT_RELAXATION: f64 = 10.0;

pub fn run(args: RelaxArgs) -> Result<()> {
    let config = resolve_config(&args)?;
    info!("Relaxation configuration resolved: {:?}", &config);

    let pbox = PeriodicBox::cubic(args.box_edge)
        .map_err(|e| CliError::Argument(e.to_string()))?;

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    info!(
        functionality = args.functionality,
        segments = args.segments,
        "Generating ideal reference star network."
    );
    let mut graph = StarNetworkBuilder::new(args.functionality, 2 * args.segments + 1)
        .bond_length(config.bond_length)
        .build(&pbox, &mut rng);

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.callback());

    println!("Relaxing {} monomers toward force equilibrium...", graph.len());
    let (result, topology) = relax::run(&mut graph, &pbox, &config, &mut rng, &reporter)?;
    drop(reporter);

    println!(
        "Converged after {} sweep(s), final mean shift {:.6}.",
        result.sweeps, result.mean_shift
    );

    info!("Writing crosslink positions to {:?}", &args.output_positions);
    report::write_crosslink_positions(
        File::create(&args.output_positions)?,
        &graph,
        &topology,
    )?;

    info!("Writing chain stretches to {:?}", &args.output_stretches);
    report::write_chain_stretches(File::create(&args.output_stretches)?, &graph, &topology)?;

    println!(
        "Reports written to {} and {}.",
        args.output_positions.display(),
        args.output_stretches.display()
    );
    Ok(())
}

/// Merges the optional configuration file with the command-line overrides.
fn resolve_config(args: &RelaxArgs) -> Result<RelaxationConfig> {
    let mut config = match &args.config {
        Some(path) => RelaxationConfig::load(path)?,
        None => RelaxationConfig::builder()
            .threshold(DEFAULT_THRESHOLD)
            .relaxation(DEFAULT_RELAXATION)
            .strategy(if args.gauss {
                StrategyKind::Gaussian
            } else {
                StrategyKind::Tabulated
            })
            .build()?,
    };

    if args.gauss {
        config.strategy = StrategyKind::Gaussian;
    }
    if let Some(threshold) = args.threshold {
        config.threshold = threshold;
    }
    if let Some(relaxation) = args.relaxation {
        config.relaxation = relaxation;
    }
    if let Some(damping) = args.damping {
        config.damping = damping;
    }
    if let Some(max_sweeps) = args.max_sweeps {
        config.max_sweeps = max_sweeps;
    }
    if let Some(curve) = &args.fe_curve {
        config.calibration_file = Some(curve.clone());
    }

    match config.strategy {
        StrategyKind::Tabulated if config.calibration_file.is_none() => {
            Err(CliError::Argument(
                "the tabulated relation needs a calibration curve; pass --fe-curve or --gauss"
                    .to_string(),
            ))
        }
        StrategyKind::Gaussian if config.calibration_file.is_some() => {
            warn!("A calibration curve was given but the Gaussian relation is selected; ignoring it.");
            config.calibration_file = None;
            Ok(config)
        }
        _ => Ok(config),
    }
}
