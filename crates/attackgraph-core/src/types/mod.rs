//! # Core Type Definitions
//!
//! This module contains the core types shared by every stage of the generator:
//! - Graph identifiers (`NodeId`, `NodeTypeId`, `RelationId`)
//! - Graph records (`Node`, `EdgeKey`, `EdgeRecord`, `Multiplicity`)
//! - Attack metadata (`AttackEdge`, `AttackInstance`)
//! - Error types (`AttackGraphError`)
//!
//! ## Determinism Guarantees
//!
//! All identifier and key types:
//! - Implement `Ord` for deterministic ordering in `BTreeMap`/`BTreeSet`
//! - Are resolved against the active schema before generation starts
//! - Use saturating arithmetic for counters to prevent overflow

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// GRAPH IDENTIFIERS
// =============================================================================

/// Unique identifier for a node in the generated graph.
///
/// Assigned from a monotonically increasing counter and never reused, so the
/// ids of a generated graph are exactly `0..N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl NodeId {
    /// Position of this node in dense per-node arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A node type tag: the index of the type in the schema's declared ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeTypeId(pub u32);

impl NodeTypeId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A relation type tag: the index of the relation in the schema's declared ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RelationId(pub u32);

impl RelationId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

// =============================================================================
// NODE
// =============================================================================

/// A node of the enterprise graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// The dense node identifier.
    pub id: NodeId,
    /// The schema type of this node.
    pub node_type: NodeTypeId,
    /// Whether the node belongs to at least one attack instance.
    pub is_attack: bool,
}

impl Node {
    /// Create a new benign node.
    #[must_use]
    pub const fn new(id: NodeId, node_type: NodeTypeId) -> Self {
        Self {
            id,
            node_type,
            is_attack: false,
        }
    }

    /// Flag the node as part of an attack. Never clears the flag.
    pub fn mark_attack(&mut self) {
        self.is_attack = true;
    }
}

// =============================================================================
// EDGES
// =============================================================================

/// Identity of an edge in the directed multigraph.
///
/// Distinct relations between the same ordered pair are distinct edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeKey {
    pub src: NodeId,
    pub dst: NodeId,
    pub relation: RelationId,
}

impl EdgeKey {
    #[must_use]
    pub const fn new(src: NodeId, dst: NodeId, relation: RelationId) -> Self {
        Self { src, dst, relation }
    }
}

/// Number of times an edge triple was emitted.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Multiplicity(pub u64);

impl Multiplicity {
    #[must_use]
    pub const fn new(count: u64) -> Self {
        Self(count)
    }

    /// Increment the count by 1 using saturating arithmetic.
    #[must_use]
    pub const fn increment(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

/// Attributes stored for one edge triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRecord {
    /// Whether the edge was emitted or labeled by an attack instance.
    pub is_attack: bool,
    /// How many emissions collapsed into this record.
    pub multiplicity: Multiplicity,
}

impl EdgeRecord {
    #[must_use]
    pub const fn new(is_attack: bool) -> Self {
        Self {
            is_attack,
            multiplicity: Multiplicity::new(1),
        }
    }

    /// Merge another emission of the same triple.
    ///
    /// The attack flag is OR-ed: a benign re-emission never clears it.
    pub fn merge(&mut self, is_attack: bool) {
        self.is_attack |= is_attack;
        self.multiplicity = self.multiplicity.increment();
    }
}

// =============================================================================
// ATTACK INSTANCES
// =============================================================================

/// One edge emitted by an attack walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AttackEdge {
    pub src: NodeId,
    pub dst: NodeId,
    pub relation: RelationId,
}

impl AttackEdge {
    #[must_use]
    pub const fn key(self) -> EdgeKey {
        EdgeKey::new(self.src, self.dst, self.relation)
    }
}

/// The record of one injected multi-hop attack path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackInstance {
    /// Id of the motif that produced this instance.
    pub motif_id: String,
    /// The entry node the walk started from.
    pub entry: NodeId,
    /// Visited nodes in order: the entry followed by every step target.
    /// Nodes may repeat.
    pub node_ids: Vec<NodeId>,
    /// Emitted edges in order.
    pub edges: Vec<AttackEdge>,
    /// Whether any emitted transition crossed a trust boundary.
    pub boundary_crossed: bool,
    /// Number of emitted edges.
    pub path_length: usize,
    /// Whether a filler edge was appended to reach a sensitive asset.
    pub forced_sensitive: bool,
    /// Whether a filler edge was appended to attempt a boundary crossing.
    pub forced_boundary: bool,
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur while configuring or running the generator.
///
/// - Schema problems are detected before generation starts
/// - Store invariant violations are fatal and never swallowed
/// - Use `Result<T, AttackGraphError>` for fallible operations
#[derive(Debug, Error)]
pub enum AttackGraphError {
    /// A node type name is not declared by the schema.
    #[error("Unknown node type '{name}' in {context}")]
    UnknownNodeType { name: String, context: String },

    /// A relation name is not declared by the schema.
    #[error("Unknown relation '{name}' in {context}")]
    UnknownRelation { name: String, context: String },

    /// A type or relation is declared twice, or a motif id is reused.
    #[error("Duplicate {kind} '{name}'")]
    Duplicate { kind: &'static str, name: String },

    /// A sampling step needs a node of a type with no configured instances.
    #[error("Node type '{node_type}' has no instances but is required by {context}")]
    EmptyPopulation { node_type: String, context: String },

    /// The schema declares no sensitive asset types.
    #[error("Schema '{0}' declares no sensitive asset types")]
    EmptySensitiveAssets(String),

    /// The schema declares no boundary groups.
    #[error("Schema '{0}' declares no boundary groups")]
    EmptyBoundaryDefinition(String),

    /// A boundary group has no member types.
    #[error("Boundary group '{0}' has no member types")]
    EmptyBoundaryGroup(String),

    /// The schema's motif catalog is empty.
    #[error("Schema '{0}' declares no attack motifs")]
    EmptyMotifCatalog(String),

    /// A numeric parameter is out of its valid range.
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// An edge referenced a node that does not exist. This is an engine bug.
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// An attack instance references an edge missing from the store.
    #[error("Edge not found: {0:?}")]
    EdgeNotFound(EdgeKey),

    /// A decoded dataset contradicts itself.
    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl AttackGraphError {
    /// Shorthand for [`AttackGraphError::InvalidParameter`].
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiplicity_saturating_increment() {
        let count = Multiplicity::new(u64::MAX);
        assert_eq!(count.increment().value(), u64::MAX);
    }

    #[test]
    fn edge_record_merge_never_clears_attack() {
        let mut record = EdgeRecord::new(true);
        record.merge(false);
        assert!(record.is_attack);
        assert_eq!(record.multiplicity.value(), 2);

        let mut benign = EdgeRecord::new(false);
        benign.merge(true);
        assert!(benign.is_attack);
    }

    #[test]
    fn node_mark_attack_is_sticky() {
        let mut node = Node::new(NodeId(3), NodeTypeId(1));
        assert!(!node.is_attack);
        node.mark_attack();
        node.mark_attack();
        assert!(node.is_attack);
    }

    #[test]
    fn edge_keys_order_by_src_dst_relation() {
        let mut keys = vec![
            EdgeKey::new(NodeId(1), NodeId(0), RelationId(0)),
            EdgeKey::new(NodeId(0), NodeId(2), RelationId(1)),
            EdgeKey::new(NodeId(0), NodeId(2), RelationId(0)),
        ];
        keys.sort();
        assert_eq!(keys[0], EdgeKey::new(NodeId(0), NodeId(2), RelationId(0)));
        assert_eq!(keys[2], EdgeKey::new(NodeId(1), NodeId(0), RelationId(0)));
    }

    #[test]
    fn error_messages_name_type_and_context() {
        let err = AttackGraphError::EmptyPopulation {
            node_type: "DC".to_string(),
            context: "motif 'A2' step 4".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("DC"));
        assert!(msg.contains("A2"));
    }
}
