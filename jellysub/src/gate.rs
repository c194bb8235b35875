use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

use crate::error::{Error, Result};

/// Admission gate bounding the number of in-flight transcription jobs.
///
/// This is a counting limiter with immediate rejection: there is no queue,
/// a request either gets a permit or an [`Error::AtCapacity`]. The permit is
/// released when dropped, so the count returns to its pre-admission value on
/// every exit path of the job that holds it, panics included.
#[derive(Clone)]
pub struct JobGate {
    permits: Arc<Semaphore>,
    limit: usize,
}

impl JobGate {
    pub fn new(max_concurrent_jobs: usize) -> Self {
        let limit = max_concurrent_jobs.max(1);
        Self {
            permits: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    /// Admit a job if capacity allows, rejecting immediately otherwise.
    pub fn try_admit(&self) -> Result<JobPermit> {
        match Arc::clone(&self.permits).try_acquire_owned() {
            Ok(permit) => {
                debug!(
                    in_flight = self.limit - self.permits.available_permits(),
                    limit = self.limit,
                    "job admitted"
                );
                Ok(JobPermit { _permit: permit })
            }
            Err(_) => Err(Error::AtCapacity { limit: self.limit }),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    #[cfg(test)]
    fn available(&self) -> usize {
        self.permits.available_permits()
    }
}

/// Held for the lifetime of a running job; dropping it frees the slot.
#[derive(Debug)]
pub struct JobPermit {
    _permit: OwnedSemaphorePermit,
}
