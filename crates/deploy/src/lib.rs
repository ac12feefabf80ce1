#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Tagline Deploy
//!
//! Deploys workflow resources grouped by the version tag in their file names
//! and gives every new definition an ordering value consistent with tag order.
//!
//! ## Key Components
//!
//! - [`ResourceVersionExtractor`] reads the tag out of a resource name
//! - [`VersionAllocator`] places a new definition among its neighbours
//! - [`DeploymentSink`] / [`DeploymentHooks`]: the pipeline port and its
//!   extension points
//! - [`VersionTagPolicy`] implements the hooks
//! - [`TaggedDeploymentCoordinator`] deploys a batch, one unit per tag

pub mod allocator;
pub mod coordinator;
pub mod error;
pub mod policy;
pub mod resource;
pub mod sink;

pub use allocator::{ORDERING_RESERVE, OrderedSlot, VersionAllocator};
pub use coordinator::{
    DeployOptions, DeploymentFailure, DeploymentReport, TaggedDeploymentCoordinator,
};
pub use error::DeployError;
pub use policy::VersionTagPolicy;
pub use resource::{DeploymentResource, ResourceVersionExtractor};
pub use sink::{
    DeclaredDefinition, DeployedUnit, DeploymentHooks, DeploymentSink, DeploymentUnit,
    OverriddenTag,
};
