#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Tagline Memory Store Driver
//!
//! In-memory implementation of every Tagline port: [`DefinitionStore`],
//! [`InstanceStore`], [`ExclusiveLock`] and [`DeploymentSink`].
//!
//! Resources carry a small JSON manifest listing the definitions they declare
//! (see the `manifest` module) instead of full process models. Deployments
//! are filtered against earlier ones by SHA-256 content hash and each unit
//! commits atomically; a `(key, ordering)` collision rejects the whole unit.
//!
//! Suitable for tests and single-process setups where durability is not
//! required.
//!
//! [`DefinitionStore`]: tagline_ports::DefinitionStore
//! [`InstanceStore`]: tagline_ports::InstanceStore
//! [`ExclusiveLock`]: tagline_ports::ExclusiveLock
//! [`DeploymentSink`]: tagline_deploy::DeploymentSink

mod backend;
mod lock;
mod manifest;

pub use backend::MemoryBackend;
pub use lock::MemoryLock;
