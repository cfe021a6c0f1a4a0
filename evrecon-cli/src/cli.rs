//! Command-line arguments.

use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};
use evrecon::config::{
    AccumulatorConfig, SolverConfig, DEFAULT_C1, DEFAULT_C2, DEFAULT_FRAME_INTERVAL,
    DEFAULT_HEIGHT, DEFAULT_ITERATIONS, DEFAULT_LAMBDA, DEFAULT_LAMBDA_T, DEFAULT_WIDTH,
};
use evrecon::{EnergyModel, ReconstructionConfig};

/// Reconstruct intensity frames from an event-camera log.
#[derive(Debug, Parser)]
#[command(name = "evrecon")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Event log (CSV with timestamp, x, y and polarity columns)
    #[arg(value_name = "EVENTS_PATH")]
    pub events_path: PathBuf,

    /// Directory that receives one PNG per frame (created if missing)
    #[arg(value_name = "OUT_PATH")]
    pub out_path: PathBuf,

    /// Frame interval in milliseconds
    #[arg(short = 'f', long, default_value_t = DEFAULT_FRAME_INTERVAL)]
    pub frame_interval: u64,

    /// Sensor width in pixels
    #[arg(short = 'W', long, default_value_t = DEFAULT_WIDTH)]
    pub width: u16,

    /// Sensor height in pixels
    #[arg(short = 'H', long, default_value_t = DEFAULT_HEIGHT)]
    pub height: u16,

    /// Solver iterations per frame
    #[arg(long, default_value_t = DEFAULT_ITERATIONS)]
    pub iterations: usize,

    /// Weight of the spatial TV term
    #[arg(long, default_value_t = DEFAULT_LAMBDA)]
    pub lambda: f32,

    /// Weight of the temporal drift term
    #[arg(long, default_value_t = DEFAULT_LAMBDA_T)]
    pub lambda_t: f32,

    /// Positive contrast threshold
    #[arg(long, default_value_t = DEFAULT_C1)]
    pub c1: f32,

    /// Negative contrast threshold
    #[arg(long, default_value_t = DEFAULT_C2)]
    pub c2: f32,

    /// Data term of the solver
    #[arg(long, value_enum, default_value_t = EnergyArg::L2)]
    pub energy: EnergyArg,

    /// Worker threads for per-pixel work (default: one per core)
    #[arg(long)]
    pub threads: Option<usize>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Solver data-term selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum EnergyArg {
    /// Squared log-intensity error (default)
    L2,
    /// Absolute log-intensity error, robust to event bursts
    L1,
}

impl From<EnergyArg> for EnergyModel {
    fn from(arg: EnergyArg) -> Self {
        match arg {
            EnergyArg::L2 => EnergyModel::TvLogL2,
            EnergyArg::L1 => EnergyModel::TvLogL1,
        }
    }
}

impl Cli {
    /// Build the library configuration from the parsed flags.
    ///
    /// Values are not checked here; `Reconstructor::new` validates them.
    pub fn to_config(&self) -> ReconstructionConfig {
        let accumulator = AccumulatorConfig::default().with_thresholds(self.c1, self.c2);
        let solver = SolverConfig::default()
            .with_weights(self.lambda, self.lambda_t)
            .with_iterations(self.iterations)
            .with_energy(self.energy.into());

        let config = ReconstructionConfig::new()
            .with_dimensions(self.width, self.height)
            .with_frame_interval(self.frame_interval)
            .with_accumulator(accumulator)
            .with_solver(solver);

        match self.threads {
            Some(threads) => config.with_threads(threads),
            None => config,
        }
    }

    /// Log filter directive for the `-v` count.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
