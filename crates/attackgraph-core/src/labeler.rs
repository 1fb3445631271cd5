//! # Labeler
//!
//! Propagates attack flags from committed instances onto the graph.
//!
//! Edges are labeled by their full `(src, dst, relation)` triple. A benign
//! edge that merely shares its endpoints with an attack edge stays benign.

use crate::graph::GraphStore;
use crate::{AttackGraphError, AttackInstance, EdgeKey, NodeId};
use std::collections::BTreeSet;

/// Counts produced by one labeling pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LabelSummary {
    /// Distinct nodes referenced by the instances.
    pub nodes_labeled: usize,
    /// Distinct edge triples referenced by the instances.
    pub edges_labeled: usize,
}

/// The Labeler sets attack flags. It never clears one.
pub struct Labeler;

impl Labeler {
    /// Label the graph from its own committed instances.
    pub fn apply<G: GraphStore>(graph: &mut G) -> Result<LabelSummary, AttackGraphError> {
        let (nodes, edges) = Self::collect(graph.instances());
        Self::mark(graph, &nodes, &edges)
    }

    /// Label the graph from an explicit instance list.
    pub fn apply_instances<G: GraphStore>(
        graph: &mut G,
        instances: &[AttackInstance],
    ) -> Result<LabelSummary, AttackGraphError> {
        let (nodes, edges) = Self::collect(instances);
        Self::mark(graph, &nodes, &edges)
    }

    fn collect(instances: &[AttackInstance]) -> (BTreeSet<NodeId>, BTreeSet<EdgeKey>) {
        let nodes = instances
            .iter()
            .flat_map(|i| i.node_ids.iter().copied())
            .collect();
        let edges = instances
            .iter()
            .flat_map(|i| i.edges.iter().map(|e| e.key()))
            .collect();
        (nodes, edges)
    }

    fn mark<G: GraphStore>(
        graph: &mut G,
        nodes: &BTreeSet<NodeId>,
        edges: &BTreeSet<EdgeKey>,
    ) -> Result<LabelSummary, AttackGraphError> {
        for &node in nodes {
            graph.mark_node_attack(node)?;
        }
        for &key in edges {
            if !graph.mark_edge_attack(key) {
                return Err(AttackGraphError::EdgeNotFound(key));
            }
        }
        Ok(LabelSummary {
            nodes_labeled: nodes.len(),
            edges_labeled: edges.len(),
        })
    }
}
