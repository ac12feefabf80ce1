#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Tagline Migration
//!
//! Carries running instances forward across tagged definitions.
//!
//! A [`MigrationDescriptor`] says how instances of one key move from a source
//! tag to a target tag. The [`MigrationRegistry`] indexes descriptors by key,
//! the [`MigrationChainExecutor`] walks one instance along them hop by hop,
//! and the [`AutoMigrationDriver`] runs the executor for every eligible
//! instance of every deployed key under the exclusive lock.

pub mod action;
pub mod chain;
pub mod descriptor;
pub mod driver;
pub mod error;
pub mod registry;

pub use action::{MigrationAction, MigrationContext, RebindAction};
pub use chain::{AppliedHop, ChainError, ChainOutcome, MigrationChainExecutor};
pub use descriptor::MigrationDescriptor;
pub use driver::{AutoMigrationDriver, DriverOptions, MigrationReport};
pub use error::{BoxError, MigrationError};
pub use registry::MigrationRegistry;
