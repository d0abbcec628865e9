//! Concurrency Limiter - bounded admission for in-flight requests
//!
//! A counting-permit gate over [`tokio::sync::Semaphore`]. The semaphore queues
//! waiters fairly, so every waiting task is eventually admitted.
//!
//! Permits are RAII guards: dropping a [`Permit`] releases it, so a task
//! returns its permit on every path, including failures and panics.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};

use crate::error::{BatchError, Result};

/// Caps the number of simultaneously held permits
#[derive(Debug, Clone)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    held: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl ConcurrencyLimiter {
    /// Limiter admitting at most `capacity` holders at once
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 || capacity > Semaphore::MAX_PERMITS {
            return Err(BatchError::InvalidConfig {
                message: format!(
                    "concurrency limit must be between 1 and {}, got {capacity}",
                    Semaphore::MAX_PERMITS
                ),
            });
        }

        Ok(Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            held: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Wait until a permit is free, then take it
    pub async fn acquire(&self) -> Result<Permit> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| BatchError::LimiterClosed)?;
        Ok(self.admit(permit))
    }

    /// Take a permit only if one is free right now
    pub fn try_acquire(&self) -> Result<Option<Permit>> {
        match Arc::clone(&self.semaphore).try_acquire_owned() {
            Ok(permit) => Ok(Some(self.admit(permit))),
            Err(TryAcquireError::NoPermits) => Ok(None),
            Err(TryAcquireError::Closed) => Err(BatchError::LimiterClosed),
        }
    }

    fn admit(&self, permit: OwnedSemaphorePermit) -> Permit {
        let now = self.held.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        Permit {
            _permit: permit,
            held: Arc::clone(&self.held),
        }
    }

    /// Maximum simultaneous holders
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Permits currently held
    pub fn in_flight(&self) -> usize {
        self.held.load(Ordering::SeqCst)
    }

    /// Highest number of permits ever held at once
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Permits free right now
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

/// A held admission slot; released on drop
#[derive(Debug)]
pub struct Permit {
    _permit: OwnedSemaphorePermit,
    held: Arc<AtomicUsize>,
}

impl Permit {
    /// Give the slot back explicitly (same as dropping)
    pub fn release(self) {}
}

impl Drop for Permit {
    fn drop(&mut self) {
        // Runs before the semaphore permit field is dropped, so `held` never
        // exceeds capacity.
        self.held.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_zero_capacity_rejected() {
        let err = ConcurrencyLimiter::new(0).unwrap_err();
        assert_eq!(err.code(), "BATCH-001");
    }

    #[tokio::test]
    async fn test_acquire_and_release() {
        let limiter = ConcurrencyLimiter::new(2).unwrap();
        let a = limiter.acquire().await.unwrap();
        let b = limiter.acquire().await.unwrap();
        assert_eq!(limiter.in_flight(), 2);
        assert_eq!(limiter.available(), 0);
        assert!(limiter.try_acquire().unwrap().is_none());

        a.release();
        assert_eq!(limiter.in_flight(), 1);
        assert_eq!(limiter.available(), 1);

        drop(b);
        assert_eq!(limiter.in_flight(), 0);
        assert_eq!(limiter.peak_in_flight(), 2);
    }

    #[tokio::test]
    async fn test_waiter_admitted_after_release() {
        let limiter = ConcurrencyLimiter::new(1).unwrap();
        let held = limiter.acquire().await.unwrap();

        let waiter = {
            let limiter = limiter.clone();
            tokio::spawn(async move {
                let _permit = limiter.acquire().await.unwrap();
                limiter.in_flight()
            })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        drop(held);
        let seen = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(seen, 1);
        assert_eq!(limiter.peak_in_flight(), 1);
    }

    #[tokio::test]
    async fn test_permit_released_when_task_panics() {
        let limiter = ConcurrencyLimiter::new(1).unwrap();
        let task = {
            let limiter = limiter.clone();
            tokio::spawn(async move {
                let _permit = limiter.acquire().await.unwrap();
                panic!("boom");
            })
        };
        assert!(task.await.unwrap_err().is_panic());
        assert_eq!(limiter.in_flight(), 0);
        assert!(limiter.try_acquire().unwrap().is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_cap_holds_under_contention() {
        let limiter = ConcurrencyLimiter::new(3).unwrap();
        let handles: Vec<_> = (0..50)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move {
                    let _permit = limiter.acquire().await.unwrap();
                    assert!(limiter.in_flight() <= 3);
                    tokio::time::sleep(Duration::from_millis(1)).await;
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }
        assert!(limiter.peak_in_flight() <= 3);
        assert_eq!(limiter.in_flight(), 0);
    }
}
