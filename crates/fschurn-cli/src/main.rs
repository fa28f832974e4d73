//! # fschurn CLI
//!
//! Exercises a filesystem by reading, rewriting and replacing the entries
//! of a content-addressable store, and by filling it with generated ones.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use fschurn_config::{
    init_logging, log_cli_info, parse_duration, Config, LogLevel, OperationWeights, SamplePolicy,
};
use fschurn_pipeline::{fill, FillPlan, Pipeline, Schedule, Seeds, StatvfsProbe};
use fschurn_store::ContentStore;

mod report;

/// Filesystem churn and integrity exerciser
#[derive(Parser, Debug)]
#[command(name = "fschurn")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Config file to use instead of ~/.fschurn/config.toml and ./.fschurn.toml
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Top-level random seed; the same seed replays the same choices
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Print the final report as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Read every file once and check its contents against its name
    Verify {
        #[arg(value_name = "ROOT")]
        root: PathBuf,

        /// Number of workers
        #[arg(short = 'n', long)]
        workers: Option<usize>,
    },

    /// Read random ranges of sampled files until the duration elapses
    ReadRandom {
        #[arg(value_name = "ROOT")]
        root: PathBuf,

        /// How long to run, e.g. 90s, 1.5h, 2h45m
        #[arg(value_parser = parse_duration)]
        duration: Duration,

        #[arg(short = 'n', long)]
        workers: Option<usize>,
    },

    /// Mix verifying reads, range reads and in-place rewrites
    ReadWrite {
        #[arg(value_name = "ROOT")]
        root: PathBuf,

        #[arg(value_parser = parse_duration)]
        duration: Duration,

        #[arg(short = 'n', long)]
        workers: Option<usize>,
    },

    /// All operations, including replacing files with new entries, weighted per config
    Churn {
        #[arg(value_name = "ROOT")]
        root: PathBuf,

        #[arg(value_parser = parse_duration)]
        duration: Duration,

        #[arg(short = 'n', long)]
        workers: Option<usize>,
    },

    /// Fill PERCENT of the free space with generated entries
    Fill {
        #[arg(value_name = "ROOT")]
        root: PathBuf,

        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        percent: u8,

        /// Number of concurrent writers
        #[arg(short = 'n', long)]
        workers: Option<usize>,

        /// Smallest generated file in bytes
        #[arg(long)]
        min_size: Option<u64>,

        /// Largest generated file in bytes
        #[arg(long)]
        max_size: Option<u64>,
    },

    /// Show the effective configuration as TOML
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(LogLevel::from_verbosity(cli.verbose));

    let mut config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    if cli.seed.is_some() {
        config.pipeline.seed = cli.seed;
    }

    let job = Job::from_command(cli.command, &mut config);
    config.validate().context("invalid configuration")?;

    let job = match job {
        Some(job) => job,
        None => {
            print!("{}", config.to_toml());
            return Ok(());
        }
    };
    ensure_root(job.root())?;

    let store = ContentStore::new(job.root(), config.store);
    match job {
        Job::Pipeline { schedule, .. } => {
            let pipeline = Pipeline::new(store, config.pipeline, schedule);
            match pipeline.run() {
                Ok(stats) if cli.json => println!("{}", serde_json::to_string_pretty(&stats)?),
                Ok(stats) => report::print_run_summary(&stats),
                Err(e) => tracing::error!(error = %e, "Run failed"),
            }
        }
        Job::Fill { percent, .. } => {
            let seeds = Seeds::from_config(config.pipeline.seed);
            log_cli_info!(seed = seeds.root(), "Using seed");
            let plan = FillPlan {
                percent,
                writers: config.pipeline.workers,
                sizes: config.generator.sizes,
            };
            match fill(&store, &plan, &StatvfsProbe, seeds) {
                Ok(report) if cli.json => println!("{}", serde_json::to_string_pretty(&report)?),
                Ok(report) => report::print_fill_summary(&report),
                Err(e) => tracing::error!(error = %e, "Fill failed"),
            }
        }
    }

    Ok(())
}

/// What a command resolved to once its flags are folded into the config.
#[derive(Debug)]
enum Job {
    Pipeline { root: PathBuf, schedule: Schedule },
    Fill { root: PathBuf, percent: u8 },
}

impl Job {
    /// Fold command-line overrides into `config`. `None` for commands that
    /// do not touch a store.
    fn from_command(command: Commands, config: &mut Config) -> Option<Job> {
        let pipeline = &mut config.pipeline;
        let (root, workers, job) = match command {
            Commands::Verify { root, workers } => {
                pipeline.sample = SamplePolicy::pass_through();
                pipeline.weights = OperationWeights::only_verify();
                (root.clone(), workers, Job::pipeline(root, Schedule::Once))
            }
            Commands::ReadRandom {
                root,
                duration,
                workers,
            } => {
                pipeline.weights = OperationWeights::only_range_read();
                (root.clone(), workers, Job::timed(root, duration))
            }
            Commands::ReadWrite {
                root,
                duration,
                workers,
            } => {
                pipeline.weights = OperationWeights::read_write();
                (root.clone(), workers, Job::timed(root, duration))
            }
            Commands::Churn {
                root,
                duration,
                workers,
            } => (root.clone(), workers, Job::timed(root, duration)),
            Commands::Fill {
                root,
                percent,
                workers,
                min_size,
                max_size,
            } => {
                let sizes = &mut config.generator.sizes;
                if let Some(min) = min_size {
                    sizes.min = min;
                }
                if let Some(max) = max_size {
                    sizes.max = max;
                }
                (root.clone(), workers, Job::Fill { root, percent })
            }
            Commands::Config => return None,
        };

        if let Some(workers) = workers {
            config.pipeline.workers = workers;
        }
        log_cli_info!(root = %root.display(), workers = config.pipeline.workers, "Resolved command");
        Some(job)
    }

    fn pipeline(root: PathBuf, schedule: Schedule) -> Job {
        Job::Pipeline { root, schedule }
    }

    fn timed(root: PathBuf, duration: Duration) -> Job {
        Job::pipeline(root, Schedule::for_duration(duration))
    }

    fn root(&self) -> &Path {
        match self {
            Job::Pipeline { root, .. } | Job::Fill { root, .. } => root,
        }
    }
}

fn ensure_root(root: &Path) -> Result<()> {
    if !root.is_dir() {
        bail!("{} is not a directory", root.display());
    }
    Ok(())
}
