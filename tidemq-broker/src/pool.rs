//! Bounds the number of in-flight requests a remote store adapter may have.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::StoreError;

#[derive(Clone)]
pub struct ConnectionLimiter {
    slots: Option<Arc<Semaphore>>,
    wait: bool,
}

/// A borrowed connection slot. Returned to the limiter when dropped.
pub struct ConnectionSlot {
    _permit: Option<OwnedSemaphorePermit>,
}

impl ConnectionLimiter {
    pub fn new(max_active: usize, wait: bool) -> Self {
        let slots = (max_active > 0).then(|| Arc::new(Semaphore::new(max_active)));
        Self { slots, wait }
    }

    pub fn unlimited() -> Self {
        Self::new(0, false)
    }

    pub async fn acquire(&self) -> Result<ConnectionSlot, StoreError> {
        let Some(slots) = &self.slots else {
            return Ok(ConnectionSlot { _permit: None });
        };

        let permit = if self.wait {
            Arc::clone(slots)
                .acquire_owned()
                .await
                .map_err(|err| StoreError::Internal(err.to_string()))?
        } else {
            Arc::clone(slots)
                .try_acquire_owned()
                .map_err(|_| StoreError::PoolExhausted)?
        };

        Ok(ConnectionSlot {
            _permit: Some(permit),
        })
    }

    /// Free slots, or `None` when the limiter is unbounded.
    pub fn available(&self) -> Option<usize> {
        self.slots.as_ref().map(|slots| slots.available_permits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn fails_fast_when_saturated_without_wait() {
        let limiter = ConnectionLimiter::new(1, false);
        let held = limiter.acquire().await.unwrap();

        assert!(matches!(
            limiter.acquire().await,
            Err(StoreError::PoolExhausted)
        ));

        drop(held);
        assert_eq!(limiter.available(), Some(1));
        assert!(limiter.acquire().await.is_ok());
    }

    #[tokio::test]
    async fn waits_for_release_in_wait_mode() {
        let limiter = ConnectionLimiter::new(1, true);
        let held = limiter.acquire().await.unwrap();

        let waiter = {
            let limiter = limiter.clone();
            tokio::spawn(async move { limiter.acquire().await.map(|_| ()) })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(held);
        waiter.await.unwrap().unwrap();
        assert_eq!(limiter.available(), Some(1));
    }

    #[tokio::test]
    async fn unlimited_never_blocks() {
        let limiter = ConnectionLimiter::unlimited();
        let _a = limiter.acquire().await.unwrap();
        let _b = limiter.acquire().await.unwrap();
        assert_eq!(limiter.available(), None);
    }
}
