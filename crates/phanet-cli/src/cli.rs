use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Toni Müller",
    version,
    about = "phanet CLI - Compute the force-balanced equilibrium positions of polymer network crosslinks in the phantom network approximation.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Relax an ideal reference star network into force equilibrium.
    Relax(RelaxArgs),
}

/// Arguments for the `relax` subcommand.
#[derive(Args, Debug)]
pub struct RelaxArgs {
    // --- Outputs ---
    /// Output file for the crosslink ids and their equilibrium positions.
    #[arg(short = 'o', long, value_name = "PATH", default_value = "CrosslinkPosition.csv")]
    pub output_positions: PathBuf,

    /// Output file for the chain extension distribution.
    #[arg(
        short = 'c',
        long,
        value_name = "PATH",
        default_value = "ChainExtensionDistribution.csv"
    )]
    pub output_stretches: PathBuf,

    // --- Configuration ---
    /// Path to a relaxation configuration file in TOML format.
    #[arg(short = 'C', long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the convergence threshold on the mean shift per sweep.
    #[arg(short = 't', long, value_name = "FLOAT")]
    pub threshold: Option<f64>,

    /// Force-extension calibration curve for the non-linear relation.
    #[arg(short = 'f', long = "fe-curve", value_name = "PATH")]
    pub fe_curve: Option<PathBuf>,

    /// Override the relaxation parameter of the equivalent chain.
    #[arg(short = 'r', long = "relax", value_name = "FLOAT")]
    pub relaxation: Option<f64>,

    /// Use the analytic Gaussian relation instead of a calibration curve.
    #[arg(short = 'g', long)]
    pub gauss: bool,

    /// Override the under-relaxation damping factor.
    #[arg(long, value_name = "FLOAT")]
    pub damping: Option<f64>,

    /// Override the maximum number of relaxation sweeps.
    #[arg(long, value_name = "INT")]
    pub max_sweeps: Option<usize>,

    // --- Network generation ---
    /// Number of segments per half-strand of the generated star.
    #[arg(short = 'n', long, value_name = "INT", default_value_t = 16)]
    pub segments: usize,

    /// Functionality (number of arms) of the generated star.
    #[arg(short = 's', long, value_name = "INT", default_value_t = 4)]
    pub functionality: usize,

    /// Edge length of the cubic periodic box.
    #[arg(short = 'b', long, value_name = "FLOAT", default_value_t = 256.0)]
    pub box_edge: f64,

    /// Seed for the random number generator (random when omitted).
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,
}
