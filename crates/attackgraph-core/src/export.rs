//! # Feature Export
//!
//! Flattens a labeled graph into the tensor bundle handed to model training.
//!
//! Node features are a placeholder signal: independent standard-normal draws,
//! not a function of graph structure. They come from the same stream as the
//! rest of the run, after injection, so the bundle is reproducible too.
//!
//! Type codes are tag indices in the schema's declared ordering. Rows follow
//! node id order; edge columns follow `(src, dst, relation)` order.

use crate::graph::{Graph, GraphStore};
use crate::schema::ResolvedSchema;
use crate::{AttackGraphError, AttackInstance};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};

// =============================================================================
// TENSOR BUNDLE
// =============================================================================

/// The flat numeric representation of one labeled graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensorBundle {
    /// Width of each feature row.
    pub feature_dimensions: usize,

    /// Row-major `nodes x feature_dimensions` matrix.
    pub node_features: Vec<f32>,

    /// Per-node type code.
    pub node_type: Vec<u32>,

    /// Per-node binary attack label.
    pub node_label: Vec<u8>,

    /// Directed edges as `[src, dst]`.
    pub edge_index: Vec<[u64; 2]>,

    /// Per-edge relation code.
    pub edge_type: Vec<u32>,

    /// Per-edge binary attack label.
    pub edge_label: Vec<u8>,

    /// Side-channel metadata for evaluation and debugging.
    pub attack_instances: Vec<AttackInstance>,

    /// Declared node type names; index = type code.
    pub node_type_names: Vec<String>,

    /// Declared relation names; index = relation code.
    pub relation_names: Vec<String>,

    /// Shared-vocabulary names aligned with `node_type_names`.
    pub canonical_node_types: Vec<String>,

    /// Shared-vocabulary names aligned with `relation_names`.
    pub canonical_relations: Vec<String>,
}

impl TensorBundle {
    #[must_use]
    pub fn num_nodes(&self) -> usize {
        self.node_type.len()
    }

    #[must_use]
    pub fn num_edges(&self) -> usize {
        self.edge_index.len()
    }

    /// Feature row of one node.
    #[must_use]
    pub fn feature_row(&self, node: usize) -> Option<&[f32]> {
        let start = node.checked_mul(self.feature_dimensions)?;
        let end = start.checked_add(self.feature_dimensions)?;
        self.node_features.get(start..end)
    }

    /// The edge index in `2 x E` coordinate layout: sources, then destinations.
    #[must_use]
    pub fn edge_index_coo(&self) -> [Vec<u64>; 2] {
        let sources = self.edge_index.iter().map(|e| e[0]).collect();
        let targets = self.edge_index.iter().map(|e| e[1]).collect();
        [sources, targets]
    }

    /// Check that every column has a consistent length and every type code
    /// falls inside its vocabulary.
    pub fn validate(&self) -> Result<(), AttackGraphError> {
        let nodes = self.num_nodes();
        let edges = self.num_edges();
        let expected_features = nodes.checked_mul(self.feature_dimensions);

        if expected_features != Some(self.node_features.len()) {
            return Err(AttackGraphError::SerializationError(
                "feature matrix does not match node count".to_string(),
            ));
        }
        if self.node_label.len() != nodes {
            return Err(AttackGraphError::SerializationError(
                "node labels do not match node count".to_string(),
            ));
        }
        if self.edge_type.len() != edges || self.edge_label.len() != edges {
            return Err(AttackGraphError::SerializationError(
                "edge columns do not match edge count".to_string(),
            ));
        }
        if self
            .edge_index
            .iter()
            .flatten()
            .any(|&id| id >= nodes as u64)
        {
            return Err(AttackGraphError::SerializationError(
                "edge index references a missing node".to_string(),
            ));
        }
        if let Some(code) = out_of_range(&self.node_type, self.node_type_names.len()) {
            return Err(AttackGraphError::SerializationError(format!(
                "node type code {code} is outside the {} declared node types",
                self.node_type_names.len()
            )));
        }
        if let Some(code) = out_of_range(&self.edge_type, self.relation_names.len()) {
            return Err(AttackGraphError::SerializationError(format!(
                "relation code {code} is outside the {} declared relations",
                self.relation_names.len()
            )));
        }
        Ok(())
    }

    /// Check that the bundle was exported from `graph`.
    pub fn check_against(&self, graph: &Graph) -> Result<(), AttackGraphError> {
        let nodes_match = self.num_nodes() == graph.node_count()
            && graph.nodes().zip(self.node_type.iter().zip(&self.node_label)).all(
                |(node, (&code, &label))| {
                    node.node_type.0 == code && u8::from(node.is_attack) == label
                },
            );
        if !nodes_match {
            return Err(AttackGraphError::InvalidDataset(
                "node columns do not match the graph".to_string(),
            ));
        }

        let edges_match = self.num_edges() == graph.edge_count()
            && graph.edges().zip(self.edge_index.iter()).enumerate().all(
                |(i, ((key, record), pair))| {
                    *pair == [key.src.0, key.dst.0]
                        && self.edge_type.get(i) == Some(&key.relation.0)
                        && self.edge_label.get(i) == Some(&u8::from(record.is_attack))
                },
            );
        if !edges_match {
            return Err(AttackGraphError::InvalidDataset(
                "edge columns do not match the graph".to_string(),
            ));
        }

        if self.attack_instances.as_slice() != graph.instances() {
            return Err(AttackGraphError::InvalidDataset(
                "attack instances do not match the graph".to_string(),
            ));
        }
        Ok(())
    }
}

fn out_of_range(codes: &[u32], len: usize) -> Option<u32> {
    codes.iter().copied().find(|&code| code as usize >= len)
}

// =============================================================================
// EXPORTER
// =============================================================================

/// The FeatureExporter reads a labeled graph without mutating it.
pub struct FeatureExporter;

impl FeatureExporter {
    /// Build the tensor bundle, drawing node features from `rng`.
    pub fn export<R: Rng + ?Sized>(
        graph: &Graph,
        schema: &ResolvedSchema,
        rng: &mut R,
    ) -> Result<TensorBundle, AttackGraphError> {
        let dims = schema.feature_dimensions();
        let node_total = graph.nodes().count();
        let capacity = node_total.checked_mul(dims).ok_or_else(|| {
            AttackGraphError::invalid("feature_dimensions", "feature matrix too large")
        })?;

        let mut node_features = Vec::with_capacity(capacity);
        let mut node_type = Vec::with_capacity(node_total);
        let mut node_label = Vec::with_capacity(node_total);
        for node in graph.nodes() {
            for _ in 0..dims {
                let value: f32 = StandardNormal.sample(rng);
                node_features.push(value);
            }
            node_type.push(node.node_type.0);
            node_label.push(u8::from(node.is_attack));
        }

        let mut edge_index = Vec::new();
        let mut edge_type = Vec::new();
        let mut edge_label = Vec::new();
        for (key, record) in graph.edges() {
            edge_index.push([key.src.0, key.dst.0]);
            edge_type.push(key.relation.0);
            edge_label.push(u8::from(record.is_attack));
        }

        Ok(TensorBundle {
            feature_dimensions: dims,
            node_features,
            node_type,
            node_label,
            edge_index,
            edge_type,
            edge_label,
            attack_instances: graph.instances().to_vec(),
            node_type_names: schema.node_types().to_vec(),
            relation_names: schema.relation_types().to_vec(),
            canonical_node_types: schema.canonical_node_types().to_vec(),
            canonical_relations: schema.canonical_relations().to_vec(),
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
