#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Tagline Ports
//!
//! Backend interface traits (ports) for tagged deployment and auto-migration.
//!
//! Follows the Ports & Drivers (hexagonal) pattern:
//!
//! - [`DefinitionStore`] -- queries over persisted definitions
//! - [`InstanceStore`] -- running instances and their definition binding
//! - [`ExclusiveLock`] -- store-level lock serializing whole passes
//!
//! All traits are `async_trait` and object-safe, suitable for use as
//! `Arc<dyn Trait>` behind dependency injection.

pub mod definition;
pub mod error;
pub mod instance;
pub mod lock;

pub use definition::DefinitionStore;
pub use error::PortsError;
pub use instance::InstanceStore;
pub use lock::{ExclusiveLock, LockAcquisition, LockGuard, NoopLock, acquire_exclusive};
