//! Parallel execution of the orientation filter over independent windows

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread::{self, available_parallelism};

use log::{debug, info, warn};

use crate::error::{Error, Result};
use crate::filter::{OrientationFilter, OrientationSequence};
use crate::task::panic_message;
use crate::types::SwingWindow;

/// Runs one [`OrientationFilter`] over many windows on a pool of worker threads.
///
/// Workers pull window indices from a shared counter, so windows are picked
/// up in order but may finish in any order. Results are returned in input
/// order and each window's failure, a panic included, is isolated in its
/// own `Result`.
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use swing_fusion::{BatchRunner, FilterSettings, OrientationFilter, SwingWindow};
///
/// let filter = OrientationFilter::new(FilterSettings::default()).unwrap();
/// let window = SwingWindow::new(
///     vec![0.0, 0.01],
///     vec![Vector3::new(0.0, 0.0, -1.0); 2],
///     vec![Vector3::zeros(); 2],
///     0,
/// );
/// let results = BatchRunner::new(filter).with_workers(2).run(&[window.clone(), window]);
/// assert!(results.iter().all(|r| r.is_ok()));
/// ```
#[derive(Debug, Clone)]
pub struct BatchRunner {
    filter: OrientationFilter,
    num_workers: usize,
}

impl BatchRunner {
    /// Runner using every available core
    pub fn new(filter: OrientationFilter) -> Self {
        let num_workers = available_parallelism().map_or(1, |n| n.get());
        Self {
            filter,
            num_workers,
        }
    }

    /// Override the worker count (at least one worker is always used)
    pub fn with_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers.max(1);
        self
    }

    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    pub fn filter(&self) -> &OrientationFilter {
        &self.filter
    }

    /// Filter every window. Entry `i` of the output belongs to `windows[i]`.
    pub fn run(&self, windows: &[SwingWindow]) -> Vec<Result<OrientationSequence>> {
        self.run_each(windows, |window| self.filter.apply(window))
    }

    fn run_each<F>(&self, windows: &[SwingWindow], job: F) -> Vec<Result<OrientationSequence>>
    where
        F: Fn(&SwingWindow) -> Result<OrientationSequence> + Sync,
    {
        let num_workers = self.num_workers.min(windows.len()).max(1);
        info!(
            "filtering {} windows on {} workers",
            windows.len(),
            num_workers
        );

        let next_index = AtomicUsize::new(0);
        let (tx_result, rx_result) = mpsc::channel();
        let mut results: Vec<Option<Result<OrientationSequence>>> = vec![None; windows.len()];

        thread::scope(|scope| {
            let mut workers = Vec::with_capacity(num_workers);
            for worker_id in 0..num_workers {
                let tx_result = tx_result.clone();
                let next_index = &next_index;
                let job = &job;

                workers.push(scope.spawn(move || {
                    loop {
                        let index = next_index.fetch_add(1, Ordering::Relaxed);
                        if index >= windows.len() {
                            return;
                        }
                        let result = panic::catch_unwind(AssertUnwindSafe(|| job(&windows[index])))
                            .unwrap_or_else(|payload| {
                                Err(Error::TaskFailure(format!(
                                    "window {index} panicked: {}",
                                    panic_message(payload.as_ref())
                                )))
                            });
                        debug!("worker {worker_id} finished window {index}");
                        if tx_result.send((index, result)).is_err() {
                            return;
                        }
                    }
                }));
            }
            drop(tx_result);

            while let Ok((index, result)) = rx_result.recv() {
                if let Err(err) = &result {
                    warn!("window {index} failed: {err}");
                }
                results[index] = Some(result);
            }

            for worker in workers {
                if worker.join().is_err() {
                    warn!("filter worker panicked");
                }
            }
        });

        results
            .into_iter()
            .enumerate()
            .map(|(index, result)| {
                result.unwrap_or_else(|| {
                    Err(Error::TaskFailure(format!(
                        "window {index} was not completed by its worker"
                    )))
                })
            })
            .collect()
    }
}
