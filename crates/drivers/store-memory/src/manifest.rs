//! The JSON manifest a resource carries in place of a process model.
//!
//! ```json
//! {"definitions": [{"key": "invoice", "versionTag": "1.2.3"}]}
//! ```

use serde::Deserialize;
use tagline_core::{DefinitionKey, VersionTag};
use tagline_deploy::{DeclaredDefinition, DeployError, DeploymentResource};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Manifest {
    definitions: Vec<ManifestEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ManifestEntry {
    key: DefinitionKey,
    #[serde(default)]
    version_tag: VersionTag,
}

/// Read the definitions declared by `resource`.
pub(crate) fn declared_definitions(
    resource: &DeploymentResource,
) -> Result<Vec<DeclaredDefinition>, DeployError> {
    let manifest: Manifest =
        serde_json::from_slice(&resource.content).map_err(|err| DeployError::Resource {
            name: resource.name.clone(),
            reason: err.to_string(),
        })?;
    Ok(manifest
        .definitions
        .into_iter()
        .map(|entry| DeclaredDefinition {
            key: entry.key,
            version_tag: entry.version_tag,
            resource_name: resource.name.clone(),
        })
        .collect())
}
