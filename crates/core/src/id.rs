//! Unique identifiers for deployed definitions, running instances and deployments.
//!
//! Each identifier is a [`domain-key`](https://crates.io/crates/domain-key)
//! `Uuid<D>` wrapper parameterized by its own domain marker, so a
//! [`DefinitionId`] can never be passed where an [`InstanceId`] is expected.
//!
//! All ID types are `Copy` and support `v4()`, `nil()`, `parse(&str)`, serde
//! (as a UUID string), `Display`, `FromStr`, `Eq`, `Ord` and `Hash`.

use domain_key::define_uuid;

pub use domain_key::UuidParseError;

define_uuid!(pub DefinitionIdDomain => DefinitionId);
define_uuid!(pub InstanceIdDomain => InstanceId);
define_uuid!(pub DeploymentIdDomain => DeploymentId);
define_uuid!(pub TenantIdDomain => TenantId);
