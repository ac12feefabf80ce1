//! Immutable index of migration descriptors, grouped by key.

use std::collections::{BTreeMap, HashSet};

use petgraph::graph::{DiGraph, NodeIndex};
use tagline_core::{DefinitionKey, VersionTag};

use crate::descriptor::MigrationDescriptor;
use crate::error::MigrationError;

/// Every registered migration, grouped by workflow key.
///
/// Built once and read-only afterwards; share it behind an `Arc`.
/// Construction rejects configurations the chain executor cannot run
/// deterministically: two descriptors leaving the same tag of one key, or
/// descriptors that lead back to a tag already visited.
#[derive(Debug, Default)]
pub struct MigrationRegistry {
    by_key: BTreeMap<DefinitionKey, Vec<MigrationDescriptor>>,
}

impl MigrationRegistry {
    /// Build the registry.
    pub fn new(
        descriptors: impl IntoIterator<Item = MigrationDescriptor>,
    ) -> Result<Self, MigrationError> {
        let mut by_key: BTreeMap<DefinitionKey, Vec<MigrationDescriptor>> = BTreeMap::new();
        for descriptor in descriptors {
            by_key
                .entry(descriptor.key().clone())
                .or_default()
                .push(descriptor);
        }

        for (key, descriptors) in &by_key {
            reject_duplicate_sources(key, descriptors)?;
            reject_cycles(key, descriptors)?;
        }

        let registry = Self { by_key };
        tracing::info!(
            keys = registry.by_key.len(),
            migrations = registry.len(),
            "migration registry built"
        );
        Ok(registry)
    }

    /// Migrations registered for `key`; empty when there are none.
    #[must_use]
    pub fn migrations_for(&self, key: &DefinitionKey) -> &[MigrationDescriptor] {
        self.by_key.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Keys with at least one migration, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &DefinitionKey> {
        self.by_key.keys()
    }

    /// Total number of descriptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_key.values().map(Vec::len).sum()
    }

    /// Whether no migration is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

fn reject_duplicate_sources(
    key: &DefinitionKey,
    descriptors: &[MigrationDescriptor],
) -> Result<(), MigrationError> {
    let mut sources = HashSet::new();
    for descriptor in descriptors {
        if !sources.insert(descriptor.source_tag()) {
            return Err(MigrationError::DuplicateSource {
                key: key.clone(),
                source_tag: descriptor.source_tag().clone(),
            });
        }
    }
    Ok(())
}

fn reject_cycles(
    key: &DefinitionKey,
    descriptors: &[MigrationDescriptor],
) -> Result<(), MigrationError> {
    let mut graph: DiGraph<&VersionTag, ()> = DiGraph::new();
    let mut index: BTreeMap<&VersionTag, NodeIndex> = BTreeMap::new();
    for tag in descriptors
        .iter()
        .flat_map(|d| [d.source_tag(), d.target_tag()])
    {
        index.entry(tag).or_insert_with(|| graph.add_node(tag));
    }
    for descriptor in descriptors {
        graph.add_edge(
            index[descriptor.source_tag()],
            index[descriptor.target_tag()],
            (),
        );
    }

    if petgraph::algo::is_cyclic_directed(&graph) {
        return Err(MigrationError::CycleDetected { key: key.clone() });
    }
    Ok(())
}
