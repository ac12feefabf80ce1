//! Exclusive lock port.
//!
//! Serializes whole deployment and auto-migration passes across every engine
//! node that shares the store. The lock is scoped: holding a [`LockGuard`]
//! keeps it, dropping the guard releases it on every exit path.

use std::any::Any;
use std::fmt;

use async_trait::async_trait;

use crate::error::PortsError;

/// Proof that the exclusive lock is held. Releases the lock when dropped.
pub struct LockGuard {
    name: String,
    _held: Box<dyn Any + Send + Sync>,
}

impl LockGuard {
    /// Wrap a backend-specific guard whose `Drop` releases the lock.
    pub fn new(name: impl Into<String>, held: impl Any + Send + Sync) -> Self {
        Self {
            name: name.into(),
            _held: Box::new(held),
        }
    }

    /// Name of the held lock.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for LockGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockGuard")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        tracing::debug!(lock = %self.name, "released exclusive lock");
    }
}

/// Result of a single, non-blocking acquisition attempt.
#[derive(Debug)]
pub enum LockAcquisition {
    /// The lock is now held until the guard is dropped.
    Acquired(LockGuard),
    /// Another holder has it.
    Contended,
    /// The backend has no exclusive lock primitive.
    Unsupported,
}

/// Store-level exclusive lock, e.g. a dedicated lock row.
#[async_trait]
pub trait ExclusiveLock: Send + Sync {
    /// Try to take the lock without waiting.
    async fn try_acquire(&self) -> Result<LockAcquisition, PortsError>;
}

/// A lock for backends without one. Always reports
/// [`LockAcquisition::Unsupported`].
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLock;

#[async_trait]
impl ExclusiveLock for NoopLock {
    async fn try_acquire(&self) -> Result<LockAcquisition, PortsError> {
        Ok(LockAcquisition::Unsupported)
    }
}

/// Take the exclusive lock for one pass when `enabled`.
///
/// Returns `Ok(None)` when locking is disabled or the backend does not
/// support it; the caller then proceeds as the single writer. A contended
/// lock fails the pass with [`PortsError::LockUnavailable`].
pub async fn acquire_exclusive(
    lock: &dyn ExclusiveLock,
    enabled: bool,
) -> Result<Option<LockGuard>, PortsError> {
    if !enabled {
        return Ok(None);
    }
    match lock.try_acquire().await? {
        LockAcquisition::Acquired(guard) => {
            tracing::debug!(lock = %guard.name(), "acquired exclusive lock");
            Ok(Some(guard))
        }
        LockAcquisition::Unsupported => {
            tracing::warn!("exclusive lock not supported by backend, proceeding without it");
            Ok(None)
        }
        LockAcquisition::Contended => Err(PortsError::LockUnavailable {
            lock: "exclusive".to_owned(),
        }),
    }
}
