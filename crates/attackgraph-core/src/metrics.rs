//! # Graph Metrics
//!
//! Distribution statistics of a generated graph. Pure computation; printing
//! belongs to the caller.

use crate::AttackGraphError;
use crate::generator::GeneratedDataset;
use crate::graph::{Graph, GraphStore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Count of one node type or relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeCount {
    pub name: String,
    pub count: usize,
}

/// Total-degree statistics over all nodes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DegreeStats {
    pub mean: f64,
    pub max: usize,
    pub min: usize,
}

/// Summary metrics for a graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphMetrics {
    /// Total number of nodes in the graph.
    pub node_count: usize,
    /// Total number of distinct edges in the graph.
    pub edge_count: usize,
    /// Nodes per type, in declared order. Types without nodes are listed with 0.
    pub node_types: Vec<TypeCount>,
    /// Edges per relation, in declared order.
    pub edge_types: Vec<TypeCount>,
    pub degree: DegreeStats,
    pub attack_node_count: usize,
    pub attack_edge_count: usize,
    pub instance_count: usize,
    pub boundary_crossed_count: usize,
    pub forced_sensitive_count: usize,
    pub forced_boundary_count: usize,
    /// Mean attack path length (0 without instances).
    pub mean_path_length: f64,
    /// Instances per motif id.
    pub motif_counts: BTreeMap<String, usize>,
}

impl GraphMetrics {
    /// Compute metrics, naming type codes with the given vocabularies.
    pub fn from_graph(
        graph: &Graph,
        node_type_names: &[String],
        relation_names: &[String],
    ) -> Result<Self, AttackGraphError> {
        let node_count = graph.node_count();
        let edge_count = graph.edge_count();

        let mut node_types = zeroed(node_type_names);
        for node in graph.nodes() {
            bump(&mut node_types, node.node_type.index(), "node type")?;
        }
        let mut edge_types = zeroed(relation_names);
        for (key, _) in graph.edges() {
            bump(&mut edge_types, key.relation.index(), "relation")?;
        }

        let mut degree = DegreeStats::default();
        if node_count > 0 {
            let mut total = 0usize;
            degree.min = usize::MAX;
            for node in graph.nodes() {
                let d = graph.degree(node.id)?;
                total = total.saturating_add(d);
                degree.max = degree.max.max(d);
                degree.min = degree.min.min(d);
            }
            degree.mean = total as f64 / node_count as f64;
        }

        let instances = graph.instances();
        let mut motif_counts = BTreeMap::new();
        for instance in instances {
            *motif_counts.entry(instance.motif_id.clone()).or_insert(0) += 1;
        }
        let total_path: usize = instances.iter().map(|i| i.path_length).sum();
        let mean_path_length = if instances.is_empty() {
            0.0
        } else {
            total_path as f64 / instances.len() as f64
        };

        Ok(Self {
            node_count,
            edge_count,
            node_types,
            edge_types,
            degree,
            attack_node_count: graph.attack_node_count(),
            attack_edge_count: graph.attack_edge_count(),
            instance_count: instances.len(),
            boundary_crossed_count: instances.iter().filter(|i| i.boundary_crossed).count(),
            forced_sensitive_count: instances.iter().filter(|i| i.forced_sensitive).count(),
            forced_boundary_count: instances.iter().filter(|i| i.forced_boundary).count(),
            mean_path_length,
            motif_counts,
        })
    }

    /// Compute metrics of a saved dataset.
    pub fn from_dataset(dataset: &GeneratedDataset) -> Result<Self, AttackGraphError> {
        let graph = dataset.to_graph()?;
        Self::from_graph(
            &graph,
            &dataset.bundle.node_type_names,
            &dataset.bundle.relation_names,
        )
    }

    /// Fraction of nodes flagged as attack.
    #[must_use]
    pub fn attack_node_ratio(&self) -> f64 {
        ratio(self.attack_node_count, self.node_count)
    }

    /// Fraction of edges flagged as attack.
    #[must_use]
    pub fn attack_edge_ratio(&self) -> f64 {
        ratio(self.attack_edge_count, self.edge_count)
    }
}

/// `part / whole`, or 0 when `whole` is 0.
#[must_use]
pub fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

fn zeroed(names: &[String]) -> Vec<TypeCount> {
    names
        .iter()
        .map(|name| TypeCount {
            name: name.clone(),
            count: 0,
        })
        .collect()
}

fn bump(counts: &mut [TypeCount], code: usize, kind: &str) -> Result<(), AttackGraphError> {
    let entry = counts.get_mut(code).ok_or_else(|| {
        AttackGraphError::SerializationError(format!("{} code {} has no name", kind, code))
    })?;
    entry.count += 1;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationConfig;
    use crate::generator::Generator;
    use crate::schema::preset;
    use crate::{NodeTypeId, RelationId};

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn empty_graph_metrics_are_zero() {
        let metrics = GraphMetrics::from_graph(&Graph::new(), &[], &[]).expect("metrics");
        assert_eq!(metrics.node_count, 0);
        assert_eq!(metrics.degree, DegreeStats::default());
        assert!(metrics.attack_node_ratio().abs() < f64::EPSILON);
        assert!(metrics.mean_path_length.abs() < f64::EPSILON);
    }

    #[test]
    fn distributions_follow_declared_order() {
        let mut graph = Graph::new();
        let a = graph.add_node(NodeTypeId(1));
        let b = graph.add_node(NodeTypeId(1));
        let c = graph.add_node(NodeTypeId(0));
        graph.add_edge(a, b, RelationId(0), false).expect("edge");
        graph.add_edge(b, c, RelationId(0), true).expect("edge");

        let metrics = GraphMetrics::from_graph(&graph, &names(&["X", "Y"]), &names(&["r", "s"]))
            .expect("metrics");

        assert_eq!(metrics.node_types[0].count, 1);
        assert_eq!(metrics.node_types[1].count, 2);
        assert_eq!(metrics.edge_types[0].count, 2);
        assert_eq!(metrics.edge_types[1].count, 0);
        assert_eq!(metrics.degree.max, 2);
        assert_eq!(metrics.degree.min, 1);
        assert_eq!(metrics.attack_edge_count, 1);
        assert!((metrics.attack_edge_ratio() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn unnamed_code_is_an_error() {
        let mut graph = Graph::new();
        graph.add_node(NodeTypeId(4));
        assert!(GraphMetrics::from_graph(&graph, &names(&["X"]), &[]).is_err());
    }

    #[test]
    fn dataset_metrics_count_instances() {
        let schema = preset("enterprise_a").expect("parse").expect("known");
        let dataset = Generator::new(&schema, GenerationConfig::with_seed(2))
            .expect("new")
            .run()
            .expect("run");
        let metrics = GraphMetrics::from_dataset(&dataset).expect("metrics");

        assert_eq!(metrics.node_count, 561);
        assert_eq!(metrics.instance_count, dataset.bundle.attack_instances.len());
        assert_eq!(
            metrics.motif_counts.values().sum::<usize>(),
            metrics.instance_count
        );
        assert!(metrics.mean_path_length >= 1.0);
        assert!(metrics.attack_node_count > 0);
    }
}
