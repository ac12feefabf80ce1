//! The version tag policy: the [`DeploymentHooks`] that make deployment
//! tag-aware.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tagline_core::{Definition, DefinitionId, OrderingValue};
use tagline_ports::{DefinitionStore, InstanceStore};

use crate::allocator::{OrderedSlot, VersionAllocator};
use crate::error::DeployError;
use crate::resource::{DeploymentResource, ResourceVersionExtractor};
use crate::sink::{DeclaredDefinition, DeploymentHooks, OverriddenTag};

/// Tag validation, ordering allocation and overridden-tag detection.
pub struct VersionTagPolicy {
    definitions: Arc<dyn DefinitionStore>,
    instances: Arc<dyn InstanceStore>,
    extractor: ResourceVersionExtractor,
    allocator: VersionAllocator,
}

impl VersionTagPolicy {
    /// Create a policy reading neighbours and instances from the given stores.
    pub fn new(definitions: Arc<dyn DefinitionStore>, instances: Arc<dyn InstanceStore>) -> Self {
        Self {
            definitions,
            instances,
            extractor: ResourceVersionExtractor,
            allocator: VersionAllocator::new(),
        }
    }

    async fn detect_overridden(
        &self,
        definition: &Definition,
    ) -> Result<Vec<OverriddenTag>, DeployError> {
        let siblings: Vec<Definition> = self
            .definitions
            .list_by_key(&definition.key)
            .await?
            .into_iter()
            .filter(|other| other.id != definition.id && other.version_tag == definition.version_tag)
            .collect();
        if siblings.is_empty() {
            return Ok(Vec::new());
        }

        let mut bound: HashMap<DefinitionId, usize> = HashMap::new();
        for instance in self
            .instances
            .list_by_definition_key(&definition.key)
            .await?
        {
            *bound.entry(instance.definition_id).or_default() += 1;
        }

        let mut notices = Vec::new();
        for sibling in siblings {
            let Some(&instance_count) = bound.get(&sibling.id) else {
                continue;
            };
            tracing::warn!(
                key = %definition.key,
                version_tag = %definition.version_tag,
                definition = %sibling.id,
                superseded_by = %definition.id,
                instance_count,
                "running instances stay on an older definition of a re-deployed tag"
            );
            notices.push(OverriddenTag {
                key: definition.key.clone(),
                version_tag: definition.version_tag.clone(),
                definition_id: sibling.id,
                superseded_by: definition.id,
                instance_count,
            });
        }
        Ok(notices)
    }
}

impl std::fmt::Debug for VersionTagPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionTagPolicy")
            .field("allocator", &self.allocator)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl DeploymentHooks for VersionTagPolicy {
    fn validate(
        &self,
        unit_name: &str,
        resource: &DeploymentResource,
        declared: &DeclaredDefinition,
    ) -> Result<(), DeployError> {
        let resource_tag = self.extractor.extract(&resource.name)?;
        if resource_tag != declared.version_tag {
            return Err(DeployError::TagMismatch {
                deployment: unit_name.to_owned(),
                key: declared.key.clone(),
                definition_tag: declared.version_tag.clone(),
                resource: resource.name.clone(),
                resource_tag,
            });
        }
        Ok(())
    }

    async fn next_ordering(
        &self,
        declared: &DeclaredDefinition,
        staged: &[Definition],
    ) -> Result<OrderingValue, DeployError> {
        let persisted = self.definitions.list_by_key(&declared.key).await?;
        let mut seen = HashSet::new();
        let existing: Vec<OrderedSlot> = persisted
            .iter()
            .chain(staged.iter().filter(|d| d.key == declared.key))
            .filter(|d| seen.insert(d.id))
            .map(OrderedSlot::from)
            .collect();

        let ordering = self
            .allocator
            .allocate(&declared.version_tag, &existing)
            .inspect_err(|err| {
                tracing::warn!(key = %declared.key, error = %err, "ordering allocation failed");
            })?;
        tracing::debug!(
            key = %declared.key,
            version_tag = %declared.version_tag,
            %ordering,
            neighbours = existing.len(),
            "allocated ordering value"
        );
        Ok(ordering)
    }

    async fn after_persist(&self, definition: &Definition) -> Vec<OverriddenTag> {
        self.detect_overridden(definition).await.unwrap_or_else(|err| {
            tracing::warn!(
                definition = %definition.describe(),
                error = %err,
                "could not check for instances on overridden tag"
            );
            Vec::new()
        })
    }
}
