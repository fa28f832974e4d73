//! Admission and replication of discovered paths.
//!
//! Decouples "what exists" from "what gets exercised": a random subset of
//! paths is admitted, and each admitted path is handed to the workers a
//! few times to mimic hot files.

use std::path::PathBuf;

use fschurn_config::{log_sample_debug, log_sample_info, SamplePolicy};
use rand::Rng;

use crate::progress::Progress;
use crate::queue::{Consumer, Producer};

pub struct Sampler<R> {
    policy: SamplePolicy,
    rng: R,
}

impl<R: Rng> Sampler<R> {
    pub fn new(policy: SamplePolicy, rng: R) -> Self {
        Self { policy, rng }
    }

    /// How many times to emit the next path: 0 when it is not admitted,
    /// otherwise uniform in `1..=max_replicas`.
    pub fn replicas(&mut self) -> u32 {
        if !self.rng.gen_bool(self.policy.admit_probability) {
            return 0;
        }
        self.rng.gen_range(1..=self.policy.max_replicas)
    }

    /// Drain `input` into `output` until every upstream producer is gone.
    /// If every downstream consumer goes away first, stops and gives up
    /// `input` so the traversal stops too. Both ends are closed on return.
    pub fn run(
        mut self,
        input: Consumer<PathBuf>,
        output: Producer<PathBuf>,
        progress: &Progress,
        report_every: u64,
    ) {
        while let Some(path) = input.pop() {
            let copies = self.replicas();
            if copies == 0 {
                continue;
            }

            let mut delivered = true;
            for _ in 1..copies {
                delivered = delivered && output.push(path.clone()).is_ok();
            }
            if !delivered || output.push(path).is_err() {
                log_sample_debug!("Worker queue closed, stopping sampler");
                break;
            }

            let admitted = progress.record_admitted(copies);
            if report_every > 0 && admitted % report_every == 0 {
                log_sample_info!(files = admitted, "Sampling progress");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use crate::queue::BoundedQueue;
    use rand::SeedableRng;
    use std::thread;

    #[test]
    fn test_replicas_within_bounds() {
        let mut sampler = Sampler::new(SamplePolicy::default(), StdRng::seed_from_u64(3));
        let mut seen = [0u32; 4];
        for _ in 0..10_000 {
            let n = sampler.replicas();
            assert!(n <= 3);
            seen[n as usize] += 1;
        }
        // Every replica count shows up
        assert!(seen.iter().all(|c| *c > 0));
    }

    #[test]
    fn test_admission_rate_converges() {
        const DRAWS: u32 = 100_000;
        let mut sampler = Sampler::new(SamplePolicy::default(), StdRng::seed_from_u64(17));
        let admitted = (0..DRAWS).filter(|_| sampler.replicas() > 0).count();
        let rate = admitted as f64 / DRAWS as f64;
        // Standard deviation is ~0.0014 at this sample size
        assert!((rate - 0.25).abs() < 0.01, "admission rate {}", rate);
    }

    #[test]
    fn test_pass_through_emits_once() {
        let mut sampler = Sampler::new(SamplePolicy::pass_through(), StdRng::seed_from_u64(0));
        assert!((0..1000).all(|_| sampler.replicas() == 1));
    }

    #[test]
    fn test_run_closes_output_when_input_ends() {
        let (input_tx, input_rx) = BoundedQueue::new(8).split();
        let (output_tx, output_rx) = BoundedQueue::new(8).split();
        let progress = Progress::default();
        for i in 0..4 {
            input_tx.push(PathBuf::from(format!("/f{}", i))).unwrap();
        }
        input_tx.close();

        Sampler::new(SamplePolicy::pass_through(), StdRng::seed_from_u64(0))
            .run(input_rx, output_tx, &progress, 0);

        // pop ends once drained, so the output is closed
        let out: Vec<_> = std::iter::from_fn(|| output_rx.pop()).collect();
        assert_eq!(out.len(), 4);
        assert_eq!(out[0], PathBuf::from("/f0"));
        assert_eq!(progress.snapshot().admitted, 4);
    }

    #[test]
    fn test_replicas_are_consecutive_copies() {
        let policy = SamplePolicy {
            admit_probability: 1.0,
            max_replicas: 3,
        };
        let (input_tx, input_rx) = BoundedQueue::new(4).split();
        let (output_tx, output_rx) = BoundedQueue::new(64).split();
        input_tx.push(PathBuf::from("/hot")).unwrap();
        input_tx.close();

        Sampler::new(policy, StdRng::seed_from_u64(9)).run(
            input_rx,
            output_tx,
            &Progress::default(),
            0,
        );

        let out: Vec<_> = std::iter::from_fn(|| output_rx.pop()).collect();
        assert!((1..=3).contains(&out.len()));
        assert!(out.iter().all(|p| p == &PathBuf::from("/hot")));
    }

    #[test]
    fn test_closed_output_closes_input() {
        let (input_tx, input_rx) = BoundedQueue::new(2).split();
        let (output_tx, output_rx) = BoundedQueue::<PathBuf>::new(2).split();
        output_rx.close();

        let feeder = thread::spawn(move || {
            let mut pushed = 0;
            while input_tx.push(PathBuf::from("/x")).is_ok() {
                pushed += 1;
            }
            pushed
        });

        Sampler::new(SamplePolicy::pass_through(), StdRng::seed_from_u64(0)).run(
            input_rx,
            output_tx,
            &Progress::default(),
            0,
        );

        // The feeder only returns once its pushes start failing
        assert!(feeder.join().unwrap() >= 1);
    }
}
