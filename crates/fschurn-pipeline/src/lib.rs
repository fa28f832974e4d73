//! # fschurn-pipeline
//!
//! Concurrent filesystem exercise pipeline.
//!
//! ```text
//! traversal ──(cap 2)──▶ sampler ──(cap 2×workers)──▶ worker 0..n
//!                                                        │
//!                                                        ▼
//!                                                  ContentStore
//! ```
//!
//! The traversal runs on the calling thread, the sampler and each worker on
//! their own. Shutdown flows downstream: once the schedule ends the
//! traversal queue is closed, the sampler drains it and closes the worker
//! queue, and the workers drain that and exit. If every worker dies first,
//! the closure flows back upstream instead so no stage blocks forever.

pub mod generator;
pub mod ops;
pub mod progress;
pub mod queue;
pub mod sampler;
pub mod seeds;
pub mod space;
pub mod traversal;
pub mod worker;

pub use generator::{draw_size, fill, FillPlan, FillReport};
pub use ops::{ByteRange, Operation, OperationPicker, Outcome};
pub use progress::{Progress, RunStats};
pub use queue::{BoundedQueue, Closed, Consumer, Producer};
pub use sampler::Sampler;
pub use seeds::Seeds;
pub use space::{FixedSpace, SpaceProbe, StatvfsProbe};
pub use traversal::{feed, FeedReport, Schedule, Walk};
pub use worker::Worker;

use std::io;
use std::path::PathBuf;
use std::thread;
use std::time::Instant;

use fschurn_config::{ConfigError, PipelineConfig};
use fschurn_store::{ContentStore, StoreError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<ConfigError> for PipelineError {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::Invalid(msg) => PipelineError::Config(msg),
            other => PipelineError::Config(other.to_string()),
        }
    }
}

/// A configured run over one store root.
#[derive(Debug, Clone)]
pub struct Pipeline {
    store: ContentStore,
    config: PipelineConfig,
    schedule: Schedule,
}

impl Pipeline {
    pub fn new(store: ContentStore, config: PipelineConfig, schedule: Schedule) -> Self {
        Self {
            store,
            config,
            schedule,
        }
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    /// Run every stage to completion and return the final counters.
    ///
    /// Blocks until the traversal, the sampler and all workers have exited.
    /// Worker failures are counted in the stats, not returned as errors.
    pub fn run(&self) -> Result<RunStats, PipelineError> {
        self.config.validate()?;
        let picker = OperationPicker::new(&self.config.weights)?;
        if self.config.weights.write_new > 0 {
            self.store.prepare()?;
        }

        let seeds = Seeds::from_config(self.config.seed);
        let workers = self.config.workers;
        tracing::info!(
            root = %self.store.root().display(),
            workers,
            seed = seeds.root(),
            "Starting pipeline"
        );

        let started = Instant::now();
        let progress = Progress::default();
        let (paths_tx, paths_rx) =
            BoundedQueue::<PathBuf>::new(self.config.traversal_capacity).split();
        let (work_tx, work_rx) = BoundedQueue::<PathBuf>::new(self.config.worker_capacity()).split();

        let fed = thread::scope(|s| -> io::Result<FeedReport> {
            let progress = &progress;
            let picker = &picker;

            // Every endpoint is moved into the stage that owns it. A spawn
            // failure drops the rest, which unwinds the stages already running.
            for idx in 0..workers {
                let worker = Worker::new(idx, &self.store, picker, progress, seeds.worker(idx));
                let queue = work_rx.clone();
                thread::Builder::new()
                    .name(format!("worker-{:02}", idx))
                    .spawn_scoped(s, move || worker.run(queue))?;
            }
            work_rx.close();

            let sampler = Sampler::new(self.config.sample, seeds.sampler());
            let report_every = self.config.report_every;
            thread::Builder::new()
                .name("sampler".into())
                .spawn_scoped(s, move || sampler.run(paths_rx, work_tx, progress, report_every))?;

            let report = traversal::feed(self.store.root(), self.schedule, &paths_tx);
            paths_tx.close();
            Ok(report)
        })?;

        let stats = progress
            .snapshot()
            .with_feed(&fed)
            .with_elapsed(started.elapsed());

        tracing::info!(
            passes = stats.traversal_passes,
            files = stats.files_found,
            operations = stats.operations(),
            violations = stats.integrity_violations,
            failed_workers = stats.failed_workers,
            "Pipeline finished"
        );
        Ok(stats)
    }
}
