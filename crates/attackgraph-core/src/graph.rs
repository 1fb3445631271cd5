//! # Graph Store
//!
//! The in-memory directed multigraph the generator writes into.
//!
//! This module implements the `GraphStore` trait.
//! Edges live in a `BTreeMap` keyed by `(src, dst, relation)` so iteration
//! order is deterministic and distinct relations on one pair stay distinct.

use crate::{
    AttackGraphError, AttackInstance, EdgeKey, EdgeRecord, Node, NodeId, NodeTypeId, RelationId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// GRAPHSTORE TRAIT
// =============================================================================

/// The GraphStore trait defines the operations the generation stages need.
///
/// Node creation is infallible. Edge insertion fails on a dangling endpoint:
/// that can only happen through an engine bug and must never be swallowed.
pub trait GraphStore {
    /// Create a node of the given type and return its id.
    /// Ids come from a monotonically increasing counter.
    fn add_node(&mut self, node_type: NodeTypeId) -> NodeId;

    /// Insert an edge, or merge into the existing `(src, dst, relation)` edge.
    ///
    /// Merging ORs the attack flag, so it never turns true into false.
    fn add_edge(
        &mut self,
        src: NodeId,
        dst: NodeId,
        relation: RelationId,
        is_attack: bool,
    ) -> Result<(), AttackGraphError>;

    /// Ids of every node of `node_type`, in creation order.
    fn nodes_of_type(&self, node_type: NodeTypeId) -> &[NodeId];

    /// Lookup a node by id.
    fn lookup(&self, id: NodeId) -> Option<&Node>;

    /// Type of an existing node.
    fn node_type(&self, id: NodeId) -> Result<NodeTypeId, AttackGraphError> {
        self.lookup(id)
            .map(|n| n.node_type)
            .ok_or(AttackGraphError::NodeNotFound(id))
    }

    /// Number of distinct edges incident to a node (in + out).
    fn degree(&self, id: NodeId) -> Result<usize, AttackGraphError>;

    fn node_count(&self) -> usize;

    fn edge_count(&self) -> usize;

    /// Set the attack flag of a node. Never clears it.
    fn mark_node_attack(&mut self, id: NodeId) -> Result<(), AttackGraphError>;

    /// Set the attack flag of an edge. Returns false if the edge does not exist.
    fn mark_edge_attack(&mut self, key: EdgeKey) -> bool;

    /// Append a committed attack instance.
    fn record_instance(&mut self, instance: AttackInstance);

    /// All committed attack instances, in commit order.
    fn instances(&self) -> &[AttackInstance];
}

// =============================================================================
// GRAPH IMPLEMENTATION
// =============================================================================

/// The main Graph structure.
///
/// Node ids are dense, so nodes are stored by index.
/// Everything keyed uses `BTreeMap` for deterministic ordering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    /// Node storage, indexed by NodeId.
    nodes: Vec<Node>,

    /// Edge storage: (src, dst, relation) -> attributes.
    edges: BTreeMap<EdgeKey, EdgeRecord>,

    /// Type index: type -> ids in creation order (append-only).
    by_type: BTreeMap<NodeTypeId, Vec<NodeId>>,

    /// Incident distinct-edge count per node.
    degrees: Vec<usize>,

    /// Attack instances in commit order.
    instances: Vec<AttackInstance>,

    /// Next available NodeId
    next_node_id: u64,
}

impl Graph {
    /// Create a new empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Get all edges in `(src, dst, relation)` order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeKey, EdgeRecord)> + '_ {
        self.edges.iter().map(|(k, v)| (*k, *v))
    }

    /// Get the attributes of one edge.
    #[must_use]
    pub fn get_edge(&self, key: EdgeKey) -> Option<EdgeRecord> {
        self.edges.get(&key).copied()
    }

    /// Check if the graph contains an edge triple.
    #[must_use]
    pub fn contains_edge(&self, key: EdgeKey) -> bool {
        self.edges.contains_key(&key)
    }

    /// Get the next node ID that would be assigned.
    #[must_use]
    pub fn next_node_id(&self) -> u64 {
        self.next_node_id
    }

    /// Number of nodes flagged as attack.
    #[must_use]
    pub fn attack_node_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_attack).count()
    }

    /// Number of edges flagged as attack.
    #[must_use]
    pub fn attack_edge_count(&self) -> usize {
        self.edges.values().filter(|e| e.is_attack).count()
    }

    fn contains_node(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }
}

impl GraphStore for Graph {
    fn add_node(&mut self, node_type: NodeTypeId) -> NodeId {
        let id = NodeId(self.next_node_id);
        self.next_node_id = self.next_node_id.saturating_add(1);

        self.nodes.push(Node::new(id, node_type));
        self.degrees.push(0);
        self.by_type.entry(node_type).or_default().push(id);
        id
    }

    fn add_edge(
        &mut self,
        src: NodeId,
        dst: NodeId,
        relation: RelationId,
        is_attack: bool,
    ) -> Result<(), AttackGraphError> {
        for endpoint in [src, dst] {
            if !self.contains_node(endpoint) {
                return Err(AttackGraphError::NodeNotFound(endpoint));
            }
        }

        let key = EdgeKey::new(src, dst, relation);
        if let Some(record) = self.edges.get_mut(&key) {
            record.merge(is_attack);
            return Ok(());
        }

        self.edges.insert(key, EdgeRecord::new(is_attack));
        self.degrees[src.index()] = self.degrees[src.index()].saturating_add(1);
        self.degrees[dst.index()] = self.degrees[dst.index()].saturating_add(1);
        Ok(())
    }

    fn nodes_of_type(&self, node_type: NodeTypeId) -> &[NodeId] {
        self.by_type.get(&node_type).map_or(&[][..], Vec::as_slice)
    }

    fn lookup(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    fn degree(&self, id: NodeId) -> Result<usize, AttackGraphError> {
        self.degrees
            .get(id.index())
            .copied()
            .ok_or(AttackGraphError::NodeNotFound(id))
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn edge_count(&self) -> usize {
        self.edges.len()
    }

    fn mark_node_attack(&mut self, id: NodeId) -> Result<(), AttackGraphError> {
        let node = self
            .nodes
            .get_mut(id.index())
            .ok_or(AttackGraphError::NodeNotFound(id))?;
        node.mark_attack();
        Ok(())
    }

    fn mark_edge_attack(&mut self, key: EdgeKey) -> bool {
        match self.edges.get_mut(&key) {
            Some(record) => {
                record.is_attack = true;
                true
            }
            None => false,
        }
    }

    fn record_instance(&mut self, instance: AttackInstance) {
        self.instances.push(instance);
    }

    fn instances(&self) -> &[AttackInstance] {
        &self.instances
    }
}

// =============================================================================
// SERIALIZATION SUPPORT
// =============================================================================

/// Serializable representation of the graph for persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializableGraph {
    pub nodes: Vec<Node>,
    pub edges: Vec<(EdgeKey, EdgeRecord)>,
    pub instances: Vec<AttackInstance>,
    pub next_node_id: u64,
}

impl From<&Graph> for SerializableGraph {
    fn from(graph: &Graph) -> Self {
        Self {
            nodes: graph.nodes.clone(),
            edges: graph.edges().collect(),
            instances: graph.instances.clone(),
            next_node_id: graph.next_node_id,
        }
    }
}

impl TryFrom<SerializableGraph> for Graph {
    type Error = AttackGraphError;

    /// Rebuild a graph, rejecting non-dense ids, dangling edges and
    /// instances that reference nodes or edges the graph does not hold.
    fn try_from(sg: SerializableGraph) -> Result<Self, Self::Error> {
        let mut graph = Graph::new();

        for node in sg.nodes {
            if node.id.0 != graph.next_node_id {
                return Err(AttackGraphError::SerializationError(format!(
                    "node id {} is out of sequence",
                    node.id.0
                )));
            }
            let id = graph.add_node(node.node_type);
            if node.is_attack {
                graph.mark_node_attack(id)?;
            }
        }
        if sg.next_node_id != graph.next_node_id {
            return Err(AttackGraphError::SerializationError(
                "node counter does not match node list".to_string(),
            ));
        }

        for (key, record) in sg.edges {
            graph.add_edge(key.src, key.dst, key.relation, record.is_attack)?;
            if let Some(stored) = graph.edges.get_mut(&key) {
                stored.multiplicity = record.multiplicity;
            }
        }

        for instance in &sg.instances {
            for &node in instance.node_ids.iter().chain([&instance.entry]) {
                if !graph.contains_node(node) {
                    return Err(AttackGraphError::NodeNotFound(node));
                }
            }
            for edge in &instance.edges {
                if !graph.contains_edge(edge.key()) {
                    return Err(AttackGraphError::EdgeNotFound(edge.key()));
                }
            }
        }

        graph.instances = sg.instances;
        Ok(graph)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const USER: NodeTypeId = NodeTypeId(0);
    const HOST: NodeTypeId = NodeTypeId(1);
    const LOGIN: RelationId = RelationId(0);
    const NET: RelationId = RelationId(1);

    fn two_node_graph() -> (Graph, NodeId, NodeId) {
        let mut graph = Graph::new();
        let a = graph.add_node(USER);
        let b = graph.add_node(HOST);
        (graph, a, b)
    }

    #[test]
    fn node_ids_are_dense_and_monotone() {
        let mut graph = Graph::new();
        let ids: Vec<_> = (0..5).map(|i| graph.add_node(NodeTypeId(i % 2))).collect();
        assert_eq!(ids, (0..5).map(NodeId).collect::<Vec<_>>());
        assert_eq!(graph.next_node_id(), 5);
        assert_eq!(graph.node_count(), 5);
    }

    #[test]
    fn nodes_of_type_tracks_membership() {
        let mut graph = Graph::new();
        let u0 = graph.add_node(USER);
        let h0 = graph.add_node(HOST);
        let u1 = graph.add_node(USER);

        assert_eq!(graph.nodes_of_type(USER), &[u0, u1]);
        assert_eq!(graph.nodes_of_type(HOST), &[h0]);
        assert!(graph.nodes_of_type(NodeTypeId(9)).is_empty());
    }

    #[test]
    fn distinct_relations_are_distinct_edges() {
        let (mut graph, a, b) = two_node_graph();
        graph.add_edge(a, b, LOGIN, false).expect("edge");
        graph.add_edge(a, b, NET, false).expect("edge");

        assert_eq!(graph.edge_count(), 2);
        assert!(graph.contains_edge(EdgeKey::new(a, b, LOGIN)));
        assert!(graph.contains_edge(EdgeKey::new(a, b, NET)));
        assert!(!graph.contains_edge(EdgeKey::new(b, a, LOGIN)));
    }

    #[test]
    fn repeated_triple_merges_and_keeps_attack_flag() {
        let (mut graph, a, b) = two_node_graph();
        graph.add_edge(a, b, LOGIN, true).expect("edge");
        graph.add_edge(a, b, LOGIN, false).expect("edge");

        let record = graph.get_edge(EdgeKey::new(a, b, LOGIN)).expect("exists");
        assert!(record.is_attack);
        assert_eq!(record.multiplicity.value(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.degree(a).expect("degree"), 1);
    }

    #[test]
    fn dangling_edge_is_fatal() {
        let (mut graph, a, _) = two_node_graph();
        let result = graph.add_edge(a, NodeId(99), LOGIN, false);
        assert!(matches!(
            result,
            Err(AttackGraphError::NodeNotFound(NodeId(99)))
        ));
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn degree_counts_in_and_out() {
        let (mut graph, a, b) = two_node_graph();
        graph.add_edge(a, b, LOGIN, false).expect("edge");
        graph.add_edge(b, a, NET, false).expect("edge");
        graph.add_edge(a, a, NET, false).expect("edge");

        assert_eq!(graph.degree(a).expect("degree"), 4);
        assert_eq!(graph.degree(b).expect("degree"), 2);
        assert!(graph.degree(NodeId(7)).is_err());
    }

    #[test]
    fn mark_edge_attack_reports_missing_edges() {
        let (mut graph, a, b) = two_node_graph();
        graph.add_edge(a, b, LOGIN, false).expect("edge");

        assert!(graph.mark_edge_attack(EdgeKey::new(a, b, LOGIN)));
        assert!(!graph.mark_edge_attack(EdgeKey::new(a, b, NET)));
        assert_eq!(graph.attack_edge_count(), 1);
    }

    #[test]
    fn serialization_roundtrip() {
        let (mut graph, a, b) = two_node_graph();
        graph.add_edge(a, b, LOGIN, true).expect("edge");
        graph.add_edge(a, b, LOGIN, false).expect("edge");
        graph.add_edge(b, a, NET, false).expect("edge");
        graph.mark_node_attack(a).expect("mark");

        let serializable = SerializableGraph::from(&graph);
        let restored = Graph::try_from(serializable).expect("restore");

        assert_eq!(graph, restored);
    }

    #[test]
    fn restore_rejects_out_of_sequence_ids() {
        let (graph, _, _) = two_node_graph();
        let mut serializable = SerializableGraph::from(&graph);
        serializable.nodes[1].id = NodeId(5);
        assert!(Graph::try_from(serializable).is_err());
    }

    fn single_hop_instance(a: NodeId, b: NodeId) -> AttackInstance {
        AttackInstance {
            motif_id: "m".to_string(),
            entry: a,
            node_ids: vec![a, b],
            edges: vec![crate::AttackEdge {
                src: a,
                dst: b,
                relation: LOGIN,
            }],
            boundary_crossed: false,
            path_length: 1,
            forced_sensitive: false,
            forced_boundary: false,
        }
    }

    #[test]
    fn restore_rejects_instance_with_unknown_node() {
        let (mut graph, a, b) = two_node_graph();
        graph.add_edge(a, b, LOGIN, true).expect("edge");
        graph.record_instance(single_hop_instance(a, b));

        let mut serializable = SerializableGraph::from(&graph);
        serializable.instances[0].node_ids.push(NodeId(9_999_999));
        assert!(matches!(
            Graph::try_from(serializable),
            Err(AttackGraphError::NodeNotFound(NodeId(9_999_999)))
        ));
    }

    #[test]
    fn restore_rejects_instance_with_unknown_edge() {
        let (mut graph, a, b) = two_node_graph();
        graph.add_edge(a, b, LOGIN, true).expect("edge");
        graph.record_instance(single_hop_instance(a, b));

        let mut serializable = SerializableGraph::from(&graph);
        serializable.instances[0].edges[0].relation = NET;
        assert!(matches!(
            Graph::try_from(serializable),
            Err(AttackGraphError::EdgeNotFound(key)) if key == EdgeKey::new(a, b, NET)
        ));

        let valid = SerializableGraph::from(&graph);
        assert_eq!(Graph::try_from(valid).expect("restore"), graph);
    }
}
