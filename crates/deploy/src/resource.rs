//! Deployable resources and the version tag carried by their file names.
//!
//! The naming convention is `<base-name>[-<version>[-SNAPSHOT|-RELEASE]].<ext>`
//! where `<ext>` is one of `bpmn`, `bpmn20.xml` or `zip` and `<version>` is a
//! dotted numeric string. A name without a version token deploys untagged.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use tagline_core::VersionTag;

use crate::error::DeployError;

static RESOURCE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(.+?)(?:[a-zA-Z-]+-([0-9][0-9.]*?(-(SNAPSHOT|RELEASE))?))?\.(bpmn?|bpmn20\.xml?|zip)$",
    )
    .expect("resource name pattern is a valid regex")
});

/// A named resource submitted for deployment.
#[derive(Clone, PartialEq, Eq)]
pub struct DeploymentResource {
    /// File name, possibly with a directory path.
    pub name: String,
    /// Raw content.
    pub content: Vec<u8>,
}

impl DeploymentResource {
    /// Create a resource from a name and its bytes.
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

impl fmt::Debug for DeploymentResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeploymentResource")
            .field("name", &self.name)
            .field("len", &self.content.len())
            .finish()
    }
}

/// Reads the version tag out of a resource file name.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResourceVersionExtractor;

impl ResourceVersionExtractor {
    /// Extract the tag from `name`.
    ///
    /// Returns an absent tag for names without a version token and
    /// [`DeployError::MalformedResourceName`] for names outside the
    /// convention.
    pub fn extract(&self, name: &str) -> Result<VersionTag, DeployError> {
        let captures = RESOURCE_NAME
            .captures(name)
            .ok_or_else(|| DeployError::MalformedResourceName {
                name: name.to_owned(),
            })?;
        Ok(captures
            .get(2)
            .map_or_else(VersionTag::absent, |tag| VersionTag::new(tag.as_str())))
    }
}
