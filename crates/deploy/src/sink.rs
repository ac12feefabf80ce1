//! The deployment pipeline port and its extension points.
//!
//! A [`DeploymentSink`] persists one [`DeploymentUnit`] atomically. While it
//! does, it calls back into [`DeploymentHooks`] at three fixed stages: after
//! reading each definition from its resource, when the definition needs an
//! ordering value, and after the definition is persisted.

use async_trait::async_trait;
use tagline_core::{Definition, DefinitionId, DefinitionKey, OrderingValue, TenantId, VersionTag};

use crate::error::DeployError;
use crate::resource::DeploymentResource;

/// One atomic deployment: all resources sharing a version tag.
#[derive(Debug, Clone)]
pub struct DeploymentUnit {
    /// Deployment name.
    pub name: String,
    /// Owning tenant.
    pub tenant_id: Option<TenantId>,
    /// Tag shared by every resource of the unit.
    pub version_tag: VersionTag,
    /// Resources to deploy.
    pub resources: Vec<DeploymentResource>,
    /// Skip resources whose content did not change since the last deployment
    /// of the same name.
    pub deploy_changed_only: bool,
}

/// A definition as read from a resource, before it is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredDefinition {
    /// Workflow family.
    pub key: DefinitionKey,
    /// Tag declared inside the definition itself.
    pub version_tag: VersionTag,
    /// The resource it was read from.
    pub resource_name: String,
}

/// Running instances left on an older definition of a tag that was just
/// deployed again.
///
/// They are not redirected to the new definition. They stay eligible for
/// migration to a strictly newer tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverriddenTag {
    /// Workflow family.
    pub key: DefinitionKey,
    /// The tag both definitions carry.
    pub version_tag: VersionTag,
    /// The older definition the instances are bound to.
    pub definition_id: DefinitionId,
    /// The newly persisted definition of the same tag.
    pub superseded_by: DefinitionId,
    /// How many running instances are bound to the older definition.
    pub instance_count: usize,
}

/// What a sink persisted for one unit.
#[derive(Debug, Clone, Default)]
pub struct DeployedUnit {
    /// Persisted definitions, in staging order.
    pub definitions: Vec<Definition>,
    /// Notices returned by [`DeploymentHooks::after_persist`].
    pub overridden: Vec<OverriddenTag>,
}

/// Policy plugged into the deployment pipeline.
#[async_trait]
pub trait DeploymentHooks: Send + Sync {
    /// Check a freshly read definition against the resource it came from.
    /// An error aborts the unit.
    fn validate(
        &self,
        unit_name: &str,
        resource: &DeploymentResource,
        declared: &DeclaredDefinition,
    ) -> Result<(), DeployError>;

    /// Ordering value for `declared`.
    ///
    /// `staged` holds the definitions this unit has already staged but not
    /// committed; they count as existing neighbours.
    async fn next_ordering(
        &self,
        declared: &DeclaredDefinition,
        staged: &[Definition],
    ) -> Result<OrderingValue, DeployError>;

    /// Called once per persisted definition. Advisory only: the returned
    /// notices end up in the unit's [`DeployedUnit`].
    async fn after_persist(&self, definition: &Definition) -> Vec<OverriddenTag>;
}

/// Persists deployment units.
#[async_trait]
pub trait DeploymentSink: Send + Sync {
    /// Deploy `unit`, returning the definitions it persisted together with
    /// the notices the hooks raised for them.
    ///
    /// Either every definition of the unit is persisted or none is.
    async fn deploy(
        &self,
        unit: DeploymentUnit,
        hooks: &dyn DeploymentHooks,
    ) -> Result<DeployedUnit, DeployError>;
}
