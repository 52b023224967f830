//! Mutual exclusion for export jobs.
//!
//! Montage and clip export share the playback surface's time cursor and the
//! single clip recorder, so only one of them may run at a time. A second
//! request while a job holds the lock is rejected, not queued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{TagreelError, TagreelResult};

/// Shared busy flag gating entry into export jobs.
#[derive(Debug, Clone, Default)]
pub struct JobLock {
    busy: Arc<AtomicBool>,
}

/// Proof that the holder owns the export slot. Releases it on drop.
#[derive(Debug)]
pub struct JobGuard {
    busy: Arc<AtomicBool>,
    job: String,
}

impl JobLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for `job`, failing with [`TagreelError::Busy`] if
    /// another job is running.
    pub fn try_acquire(&self, job: impl Into<String>) -> TagreelResult<JobGuard> {
        let job = job.into();
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!(job = %job, "Rejected export request: another job is running");
            return Err(TagreelError::busy(format!(
                "Cannot start {job}: another export is already in progress"
            )));
        }

        tracing::debug!(job = %job, "Export lock acquired");
        Ok(JobGuard {
            busy: self.busy.clone(),
            job,
        })
    }

    /// Whether a job currently holds the lock.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl JobGuard {
    /// Name of the job holding the lock.
    pub fn job(&self) -> &str {
        &self.job
    }
}

impl Drop for JobGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
        tracing::debug!(job = %self.job, "Export lock released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_is_rejected() {
        let lock = JobLock::new();
        let guard = lock.try_acquire("montage").unwrap();
        assert!(lock.is_busy());
        assert_eq!(guard.job(), "montage");

        let err = lock.try_acquire("clip export").unwrap_err();
        assert!(matches!(err, TagreelError::Busy { .. }));
    }

    #[test]
    fn test_guard_releases_on_drop() {
        let lock = JobLock::new();
        {
            let _guard = lock.try_acquire("montage").unwrap();
        }
        assert!(!lock.is_busy());
        assert!(lock.try_acquire("clip export").is_ok());
    }

    #[test]
    fn test_clones_share_the_flag() {
        let lock = JobLock::new();
        let other = lock.clone();
        let _guard = lock.try_acquire("montage").unwrap();
        assert!(other.is_busy());
        assert!(other.try_acquire("montage").is_err());
    }
}
