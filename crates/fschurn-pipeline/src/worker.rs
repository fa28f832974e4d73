//! Workers draining the sampled-path queue.

use std::path::PathBuf;

use fschurn_config::log_worker_error;
use fschurn_store::ContentStore;
use rand::Rng;

use crate::ops::{self, OpContext, OperationPicker};
use crate::progress::Progress;
use crate::queue::Consumer;

/// One consumer of the work queue, with its own generator.
pub struct Worker<'a, R> {
    index: usize,
    store: &'a ContentStore,
    picker: &'a OperationPicker,
    progress: &'a Progress,
    rng: R,
}

impl<'a, R: Rng> Worker<'a, R> {
    pub fn new(
        index: usize,
        store: &'a ContentStore,
        picker: &'a OperationPicker,
        progress: &'a Progress,
        rng: R,
    ) -> Self {
        Self {
            index,
            store,
            picker,
            progress,
            rng,
        }
    }

    /// Process paths until the queue is closed and drained.
    ///
    /// The first unexpected I/O error is logged and ends this worker; the
    /// remaining workers carry on. The worker owns its consumer handle, so
    /// once the last worker returns producers see the queue as closed.
    pub fn run(mut self, queue: Consumer<PathBuf>) {
        while let Some(path) = queue.pop() {
            let op = self.picker.pick(&mut self.rng);
            let mut ctx = OpContext {
                store: self.store,
                worker: self.index,
                rng: &mut self.rng,
            };

            match ops::execute(op, &path, &mut ctx) {
                Ok(outcome) => self.progress.record(op, &outcome),
                Err(e) => {
                    log_worker_error!(
                        worker = self.index,
                        op = %op,
                        path = %path.display(),
                        error = %e,
                        "Operation failed, stopping worker"
                    );
                    self.progress.record_worker_failure();
                    return;
                }
            }
        }
    }
}
