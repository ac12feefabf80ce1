//! Deployed definitions and the instances bound to them.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{DefinitionId, DeploymentId, InstanceId, TenantId};
use crate::keys::DefinitionKey;
use crate::tag::VersionTag;

/// The integer that orders definitions of one key consistently with their tags.
///
/// Values are positive and never renumbered once persisted; new values are
/// always computed relative to existing neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderingValue(u32);

impl OrderingValue {
    /// Wrap a raw value. Returns `None` for zero, which means "unassigned".
    #[must_use]
    pub const fn new(value: u32) -> Option<Self> {
        if value == 0 { None } else { Some(Self(value)) }
    }

    /// The raw integer.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for OrderingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One persisted, versioned workflow definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    /// Unique identifier.
    pub id: DefinitionId,
    /// Workflow family this definition belongs to.
    pub key: DefinitionKey,
    /// Human-assigned version tag.
    #[serde(default)]
    pub version_tag: VersionTag,
    /// Position among all definitions of the same key.
    pub ordering: OrderingValue,
    /// The deployment that produced this definition.
    pub deployment_id: DeploymentId,
    /// Name of the resource the definition was read from.
    pub resource_name: String,
    /// Owning tenant, if the engine is multi-tenant.
    #[serde(default)]
    pub tenant_id: Option<TenantId>,
    /// When the definition was persisted.
    pub deployed_at: DateTime<Utc>,
}

impl Definition {
    /// Short `id#tag` rendering used in log lines.
    #[must_use]
    pub fn describe(&self) -> String {
        format!("{}#{}", self.id, self.version_tag)
    }
}

/// An in-flight execution bound to exactly one definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningInstance {
    /// Unique identifier.
    pub id: InstanceId,
    /// Key of the bound definition.
    pub definition_key: DefinitionKey,
    /// The definition currently executing this instance.
    pub definition_id: DefinitionId,
}
