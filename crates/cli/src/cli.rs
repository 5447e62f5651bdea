//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CARLA Obstacle - obstacle probe scenario runner
#[derive(Parser, Debug)]
#[command(
    name = "carla-obstacle",
    author,
    version,
    about = "Fixed-step obstacle detection scenarios",
    long_about = "Runs a scenario of world actors and attached sensors at a fixed time step.\n\n\
                  Obstacle probes sweep ahead of their parent every frame, collision \n\
                  sensors report contacts, GNSS sensors report fixes. Every reading is \n\
                  routed through the dispatcher to the configured sinks."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "CARLA_OBSTACLE_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "CARLA_OBSTACLE_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a scenario
    Run(RunArgs),

    /// Validate a scenario file without running it
    Validate(ValidateArgs),

    /// Display scenario information
    Info(InfoArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to scenario file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "scenario.toml",
        env = "CARLA_OBSTACLE_CONFIG"
    )]
    pub config: PathBuf,

    /// Frames to simulate; overrides `episode.frames` (0 = use the file)
    #[arg(long, default_value = "0", env = "CARLA_OBSTACLE_FRAMES")]
    pub frames: u64,

    /// Episode id assigned to the run
    #[arg(long, default_value = "1", env = "CARLA_OBSTACLE_EPISODE_ID")]
    pub episode_id: u64,

    /// Pace frames at the fixed time step instead of running flat out
    #[arg(long)]
    pub realtime: bool,

    /// Override `base_path` of every file sink
    #[arg(long, env = "CARLA_OBSTACLE_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,

    /// Capacity of the sensor stream between simulation and dispatcher
    #[arg(long, default_value = "256", env = "CARLA_OBSTACLE_BUFFER_SIZE")]
    pub buffer_size: usize,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "CARLA_OBSTACLE_METRICS_PORT")]
    pub metrics_port: u16,
}

#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to scenario file to validate
    #[arg(short, long, default_value = "scenario.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to scenario file
    #[arg(short, long, default_value = "scenario.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show sensor attributes
    #[arg(long)]
    pub sensors: bool,

    /// Show sink configuration
    #[arg(long)]
    pub sinks: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
