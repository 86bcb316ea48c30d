use std::future::Future;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::DispatchError;

struct InFlight<T> {
    label: &'static str,
    handle: JoinHandle<T>,
}

/// Runs at most one background job at a time and hands its result back to the caller's loop.
///
/// Jobs run on the tokio runtime; results are only observed through [`Dispatcher::completion`],
/// so whoever owns the dispatcher applies them on its own task.
pub struct Dispatcher<T> {
    in_flight: Option<InFlight<T>>,
}

impl<T> Default for Dispatcher<T> {
    fn default() -> Self {
        Self { in_flight: None }
    }
}

impl<T: Send + 'static> Dispatcher<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Label of the running job, if any.
    pub fn running(&self) -> Option<&'static str> {
        self.in_flight.as_ref().map(|job| job.label)
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Starts `work` unless another job is still outstanding.
    pub fn submit<F>(&mut self, label: &'static str, work: F) -> Result<(), DispatchError>
    where
        F: Future<Output = T> + Send + 'static,
    {
        if let Some(running) = self.running() {
            return Err(DispatchError::Busy { running });
        }
        debug!(job = label, "background job started");
        self.in_flight = Some(InFlight {
            label,
            handle: tokio::spawn(work),
        });
        Ok(())
    }

    /// Waits for the outstanding job and frees the slot. Pends forever when idle.
    ///
    /// Cancel safe: dropping the future before it resolves leaves the job in flight.
    pub async fn completion(&mut self) -> Result<T, DispatchError> {
        let Some(job) = self.in_flight.as_mut() else {
            return std::future::pending().await;
        };
        let label = job.label;
        let joined = (&mut job.handle).await;
        self.in_flight = None;
        debug!(job = label, "background job finished");
        joined.map_err(|e| DispatchError::Crashed {
            job: label,
            message: e.to_string(),
        })
    }
}
