//! # Benign Traffic Generator
//!
//! Wires non-malicious activity into a freshly populated graph.
//!
//! - Runs before any attack injection
//! - Rules are applied in schema order, each consuming the shared stream
//! - Never sets an attack flag
//! - Small or empty populations cap the sample size instead of failing

use crate::graph::GraphStore;
use crate::schema::{FanOutRule, ResolvedEdgeRule, ResolvedSchema, UniformPairRule};
use crate::{AttackGraphError, NodeId, NodeTypeId};
use rand::Rng;
use rand::seq::SliceRandom;
use rand_distr::{Distribution, Poisson};
use tracing::{debug, warn};

/// The BenignTrafficGenerator applies a schema's edge rules to a graph.
pub struct BenignTrafficGenerator;

impl BenignTrafficGenerator {
    /// Apply every edge rule of `schema` in order.
    ///
    /// Returns the number of edge emissions, counting re-emissions of an
    /// existing triple.
    pub fn wire<G: GraphStore, R: Rng + ?Sized>(
        graph: &mut G,
        schema: &ResolvedSchema,
        rng: &mut R,
    ) -> Result<usize, AttackGraphError> {
        let mut emitted = 0usize;
        for rule in schema.edge_rules() {
            let count = match rule {
                ResolvedEdgeRule::FanOut(rule) => Self::fan_out(graph, rule, rng)?,
                ResolvedEdgeRule::UniformPair(rule) => Self::uniform_pair(graph, rule, rng)?,
            };
            debug!(
                relation = schema.relation_name(rule.relation()),
                emitted = count,
                "benign rule applied"
            );
            emitted = emitted.saturating_add(count);
        }
        Ok(emitted)
    }

    /// Fan-out rule.
    ///
    /// Every source draws `k ~ Poisson(rate)` and links to `min(k, |pool|)`
    /// distinct targets sampled without replacement. With self-loop avoidance
    /// a sampled target equal to the source is dropped, not redrawn.
    pub fn fan_out<G: GraphStore, R: Rng + ?Sized>(
        graph: &mut G,
        rule: &FanOutRule,
        rng: &mut R,
    ) -> Result<usize, AttackGraphError> {
        let sources = collect_population(graph, &rule.source_types);
        let pool = collect_population(graph, &rule.target_types);

        if sources.is_empty() || pool.is_empty() {
            warn!(
                relation = rule.relation.0,
                sources = sources.len(),
                targets = pool.len(),
                "fan-out rule has an empty population, skipping"
            );
            return Ok(0);
        }

        // Poisson is undefined for a zero mean: such a rule emits nothing.
        if rule.rate <= 0.0 {
            return Ok(0);
        }
        let poisson = Poisson::new(rule.rate)
            .map_err(|e| AttackGraphError::invalid("rate", e.to_string()))?;

        let mut emitted = 0usize;
        for &src in &sources {
            let draw: f64 = poisson.sample(rng);
            let k = (draw as usize).min(pool.len());

            let targets: Vec<NodeId> = pool.choose_multiple(rng, k).copied().collect();
            for dst in targets {
                if rule.avoid_self_loops && dst == src {
                    continue;
                }
                graph.add_edge(src, dst, rule.relation, false)?;
                emitted += 1;
            }
        }
        Ok(emitted)
    }

    /// Uniform-pair rule.
    ///
    /// Each trial draws two nodes uniformly from the whole population and
    /// emits an edge only if they differ.
    pub fn uniform_pair<G: GraphStore, R: Rng + ?Sized>(
        graph: &mut G,
        rule: &UniformPairRule,
        rng: &mut R,
    ) -> Result<usize, AttackGraphError> {
        let population = graph.node_count() as u64;
        if population == 0 {
            warn!(relation = rule.relation.0, "uniform-pair rule on empty graph");
            return Ok(0);
        }

        let mut emitted = 0usize;
        for _ in 0..rule.trials {
            let src = NodeId(rng.gen_range(0..population));
            let dst = NodeId(rng.gen_range(0..population));
            if src != dst {
                graph.add_edge(src, dst, rule.relation, false)?;
                emitted += 1;
            }
        }
        Ok(emitted)
    }
}

/// Concatenate the populations of `types`, in the given order.
fn collect_population<G: GraphStore>(graph: &G, types: &[NodeTypeId]) -> Vec<NodeId> {
    types
        .iter()
        .flat_map(|&t| graph.nodes_of_type(t).iter().copied())
        .collect()
}
