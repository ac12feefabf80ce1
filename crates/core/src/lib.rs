#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Tagline Core
//!
//! Core types shared by every Tagline crate.
//!
//! ## Key Components
//!
//! - **Identifiers**: [`DefinitionId`], [`InstanceId`], [`DeploymentId`], [`TenantId`]
//! - **Keys**: [`DefinitionKey`], the family name of a workflow
//! - **Version tags**: [`VersionTag`] and its total order ([`tag::compare`])
//! - **Records**: [`Definition`], [`RunningInstance`], [`OrderingValue`]

pub mod definition;
pub mod id;
pub mod tag;

mod keys;

pub use definition::{Definition, OrderingValue, RunningInstance};
pub use id::*;
pub use keys::*;
pub use tag::VersionTag;
