//! # Boundary Crossing Detector
//!
//! Classifies a typed transition as trust-boundary-crossing.
//!
//! A transition `prev -> next` crosses a boundary iff some boundary group
//! contains both types and the two types differ. The answer depends only on
//! the type pair and the static group membership, never on walk history.

use crate::NodeTypeId;
use crate::schema::{BoundaryGroup, ResolvedSchema};

/// Pure classifier over the schema's boundary groups.
#[derive(Debug, Clone, Copy)]
pub struct BoundaryCrossingDetector<'a> {
    groups: &'a [BoundaryGroup],
}

impl<'a> BoundaryCrossingDetector<'a> {
    #[must_use]
    pub fn new(schema: &'a ResolvedSchema) -> Self {
        Self::from_groups(schema.boundary_groups())
    }

    #[must_use]
    pub fn from_groups(groups: &'a [BoundaryGroup]) -> Self {
        Self { groups }
    }

    /// Whether moving from a `prev`-typed node to a `next`-typed node crosses a boundary.
    #[must_use]
    pub fn crosses(&self, prev: NodeTypeId, next: NodeTypeId) -> bool {
        prev != next
            && self
                .groups
                .iter()
                .any(|group| group.contains(prev) && group.contains(next))
    }
}
