//! In-process exclusive lock.

use std::sync::Arc;

use async_trait::async_trait;
use tagline_ports::{ExclusiveLock, LockAcquisition, LockGuard, PortsError};
use tokio::sync::Mutex;

/// Exclusive lock shared by every clone of one [`MemoryLock`].
#[derive(Debug, Clone, Default)]
pub struct MemoryLock {
    inner: Arc<Mutex<()>>,
}

impl MemoryLock {
    /// Create an unlocked lock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether someone holds the lock right now.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.inner.try_lock().is_err()
    }
}

#[async_trait]
impl ExclusiveLock for MemoryLock {
    async fn try_acquire(&self) -> Result<LockAcquisition, PortsError> {
        match Arc::clone(&self.inner).try_lock_owned() {
            Ok(guard) => Ok(LockAcquisition::Acquired(LockGuard::new("memory", guard))),
            Err(_) => Ok(LockAcquisition::Contended),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn second_holder_is_refused_until_release() {
        let lock = MemoryLock::new();
        let first = lock.try_acquire().await.unwrap();
        assert!(matches!(first, LockAcquisition::Acquired(_)));
        assert!(lock.is_locked());

        let second = lock.clone().try_acquire().await.unwrap();
        assert!(matches!(second, LockAcquisition::Contended));

        drop(first);
        assert!(!lock.is_locked());
        assert!(matches!(
            lock.try_acquire().await.unwrap(),
            LockAcquisition::Acquired(_)
        ));
    }
}
