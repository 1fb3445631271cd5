//! # attackgraph-core
//!
//! Seeded generator of labeled enterprise activity graphs with injected
//! multi-hop attack paths.
//!
//! A run turns a [`Schema`] and a seed into a directed multigraph of users,
//! hosts, services, processes and files, overlays attack walks taken from the
//! schema's motif catalog, labels the result and flattens it into a
//! [`TensorBundle`] for downstream anomaly-detection models.
//!
//! ## Pipeline
//!
//! ```text
//! Schema -> populate -> BenignTrafficGenerator -> AttackMotifEngine (xN)
//!        -> Labeler -> FeatureExporter -> TensorBundle
//! ```
//!
//! ## Constraints
//!
//! - Schema-agnostic: no node type or relation is named in code
//! - Deterministic: one seeded stream, `BTreeMap` ordering everywhere
//! - Fails before generation on any schema inconsistency
//! - Has NO async, NO network dependencies (pure Rust)

// =============================================================================
// MODULES
// =============================================================================

pub mod benign;
pub mod boundary;
pub mod config;
pub mod engine;
pub mod export;
pub mod formats;
pub mod generator;
pub mod graph;
pub mod labeler;
pub mod metrics;
pub mod primitives;
pub mod schema;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    AttackEdge, AttackGraphError, AttackInstance, EdgeKey, EdgeRecord, Multiplicity, Node, NodeId,
    NodeTypeId, RelationId,
};

// =============================================================================
// RE-EXPORTS: Schema & Configuration
// =============================================================================

pub use config::{GenerationConfig, InstanceRange};
pub use schema::{
    EdgeRule, MotifDefinition, PRESET_NAMES, RepeatRange, ResolvedSchema, Schema, SourceSelector,
    StepDefinition, preset,
};

// =============================================================================
// RE-EXPORTS: Generation Pipeline
// =============================================================================

pub use benign::BenignTrafficGenerator;
pub use boundary::BoundaryCrossingDetector;
pub use engine::AttackMotifEngine;
pub use export::{FeatureExporter, TensorBundle};
pub use generator::{GeneratedDataset, Generator};
pub use graph::{Graph, GraphStore, SerializableGraph};
pub use labeler::{LabelSummary, Labeler};
pub use metrics::{DegreeStats, GraphMetrics, TypeCount};

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

#[cfg(feature = "crypto-hash")]
pub use formats::dataset_digest;
pub use formats::{DatasetHeader, dataset_from_bytes, dataset_to_bytes, peek_header};
