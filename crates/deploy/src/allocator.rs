//! Ordering value allocation for newly deployed definitions.
//!
//! Ordering values of one key follow tag order, then deployment order within
//! a tag. Existing values are never renumbered: a new definition is placed
//! between its two neighbours in tag order, leaving a reserve block of
//! [`ORDERING_RESERVE`] above each tag group so later re-deploys can append.

use std::cmp::Ordering;

use tagline_core::{Definition, OrderingValue, VersionTag};

use crate::error::DeployError;

/// Size of the block reserved for each tag group.
pub const ORDERING_RESERVE: u32 = 1000;

/// An existing definition as the allocator sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedSlot {
    /// Version tag.
    pub tag: VersionTag,
    /// Ordering value; `0` when not assigned yet.
    pub ordering: u32,
}

impl OrderedSlot {
    /// Slot with an assigned ordering value.
    pub fn new(tag: impl Into<VersionTag>, ordering: u32) -> Self {
        Self {
            tag: tag.into(),
            ordering,
        }
    }
}

impl From<&Definition> for OrderedSlot {
    fn from(definition: &Definition) -> Self {
        Self {
            tag: definition.version_tag.clone(),
            ordering: definition.ordering.get(),
        }
    }
}

/// Computes ordering values consistent with version tag order.
#[derive(Debug, Clone, Copy)]
pub struct VersionAllocator {
    reserve: u32,
}

impl Default for VersionAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionAllocator {
    /// Allocator with the standard reserve of [`ORDERING_RESERVE`].
    #[must_use]
    pub const fn new() -> Self {
        Self {
            reserve: ORDERING_RESERVE,
        }
    }

    /// Allocate the ordering value for a new definition tagged `new_tag`,
    /// given every existing definition of the same key.
    ///
    /// `existing` must already be consistent: ordering values increase with
    /// tag order. Fails with [`DeployError::AllocationExhausted`] when the
    /// computed value does not fit strictly between the neighbours.
    pub fn allocate(
        &self,
        new_tag: &VersionTag,
        existing: &[OrderedSlot],
    ) -> Result<OrderingValue, DeployError> {
        let (left, right) = neighbours(new_tag, existing);
        let reserve = u64::from(self.reserve);

        let candidate = match (left, right) {
            (None, None) => reserve,
            (None, Some(right)) => u64::from(right.ordering) / 2,
            (Some(left), _) if left.tag == *new_tag => u64::from(left.ordering) + 1,
            (Some(left), None) => (u64::from(left.ordering) / reserve + 1) * reserve,
            (Some(left), Some(right)) => {
                u64::from(left.ordering) / 2 + u64::from(right.ordering) / 2
            }
        };

        let left = left.map(|slot| slot.ordering);
        let right = right.map(|slot| slot.ordering);
        let above_left = left.is_none_or(|l| candidate > u64::from(l));
        let below_right = right.is_none_or(|r| candidate < u64::from(r));

        u32::try_from(candidate)
            .ok()
            .filter(|_| above_left && below_right)
            .and_then(OrderingValue::new)
            .ok_or_else(|| DeployError::AllocationExhausted {
                tag: new_tag.clone(),
                left,
                candidate,
                right,
            })
    }
}

/// The existing slots immediately below and above `new_tag` once it is merged
/// into the sorted set.
///
/// Slots sort by tag, then by ordering value with unassigned (`0`) last. The
/// new entry is unassigned and sorts after every slot of its own tag,
/// unassigned ones included.
fn neighbours<'a>(
    new_tag: &VersionTag,
    existing: &'a [OrderedSlot],
) -> (Option<&'a OrderedSlot>, Option<&'a OrderedSlot>) {
    let mut sorted: Vec<&OrderedSlot> = existing.iter().collect();
    sorted.sort_by(|a, b| slot_order(a, b));

    let split = sorted.partition_point(|slot| slot.tag <= *new_tag);
    let left = split.checked_sub(1).and_then(|i| sorted.get(i)).copied();
    let right = sorted.get(split).copied();
    (left, right)
}

fn slot_order(a: &OrderedSlot, b: &OrderedSlot) -> Ordering {
    a.tag
        .cmp(&b.tag)
        .then_with(|| unassigned_last(a.ordering).cmp(&unassigned_last(b.ordering)))
}

fn unassigned_last(ordering: u32) -> (bool, u32) {
    (ordering == 0, ordering)
}
