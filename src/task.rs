//! One-shot background jobs with explicit completion
//!
//! Long-running work (filtering a whole recording, handing rotation
//! sequences to a renderer) runs on its own thread. Submission returns
//! immediately. Completion always delivers a `Result`: a job that panics is
//! reported as [`Error::TaskFailure`] instead of leaving the caller waiting.
//! Jobs cannot be cancelled once started.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use log::{debug, error};

use crate::error::{Error, Result};

/// Handle to a job started with [`spawn`]
#[derive(Debug)]
pub struct TaskHandle<T> {
    rx_result: mpsc::Receiver<Result<T>>,
    thread: JoinHandle<()>,
}

impl<T> TaskHandle<T> {
    /// Block until the job completes
    pub fn wait(self) -> Result<T> {
        let result = self.rx_result.recv().unwrap_or_else(|_| {
            Err(Error::TaskFailure("task ended without reporting a result".into()))
        });
        // The job has already reported, joining only reaps the thread
        let _ = self.thread.join();
        result
    }

    /// Result if the job has completed, otherwise the handle back
    pub fn try_wait(self) -> core::result::Result<Result<T>, Self> {
        match self.rx_result.try_recv() {
            Ok(result) => {
                let _ = self.thread.join();
                Ok(result)
            }
            Err(mpsc::TryRecvError::Empty) => Err(self),
            Err(mpsc::TryRecvError::Disconnected) => Ok(Err(Error::TaskFailure(
                "task ended without reporting a result".into(),
            ))),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }
}

/// Run `job` on a new thread.
///
/// # Example
/// ```
/// use swing_fusion::task;
///
/// let handle = task::spawn("sum", || Ok((1..=10).sum::<u32>()));
/// assert_eq!(handle.wait().unwrap(), 55);
/// ```
pub fn spawn<T, F>(name: &str, job: F) -> TaskHandle<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let (tx_result, rx_result) = mpsc::channel();
    let name = name.to_owned();
    let thread = thread::spawn(move || {
        let result = run_guarded(&name, job);
        let _ = tx_result.send(result);
    });
    TaskHandle { rx_result, thread }
}

/// Run `job` on a new thread and pass its result to `on_complete` on that
/// same thread. The callback is invoked exactly once.
pub fn spawn_with_callback<T, F, C>(name: &str, job: F, on_complete: C) -> JoinHandle<()>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
    C: FnOnce(Result<T>) + Send + 'static,
{
    let name = name.to_owned();
    thread::spawn(move || on_complete(run_guarded(&name, job)))
}

fn run_guarded<T, F>(name: &str, job: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    debug!("task '{name}' started");
    let result = match panic::catch_unwind(AssertUnwindSafe(job)) {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            Err(Error::TaskFailure(format!("task '{name}' panicked: {message}")))
        }
    };
    match &result {
        Ok(_) => debug!("task '{name}' completed"),
        Err(err) => error!("task '{name}' failed: {err}"),
    }
    result
}

/// Text of a caught panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".into())
}
