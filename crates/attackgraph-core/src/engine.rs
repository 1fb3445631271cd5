//! # Attack Motif Engine
//!
//! Injects multi-hop attack paths into a wired graph.
//!
//! Each injection is a linear walk over one motif template:
//!
//! 1. Select a motif uniformly from the catalog
//! 2. Pick an entry node of the motif's entry type
//! 3. Walk the steps, flipping each optional step's coin and drawing repeat counts
//! 4. Force a step to a sensitive asset if none was visited
//! 5. Force one filler step if no transition crossed a trust boundary
//! 6. Commit the instance to the graph
//!
//! Every random choice comes from the caller's stream, in that order.

use crate::boundary::BoundaryCrossingDetector;
use crate::graph::GraphStore;
use crate::schema::{Motif, MotifStep, ResolvedSchema, SourceSelector};
use crate::{AttackEdge, AttackGraphError, AttackInstance, NodeId, NodeTypeId, RelationId};
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::debug;

// =============================================================================
// ENGINE
// =============================================================================

/// The AttackMotifEngine walks motif templates against a graph store.
pub struct AttackMotifEngine<'a> {
    schema: &'a ResolvedSchema,
    detector: BoundaryCrossingDetector<'a>,
    /// Sensitive types in tag order, for uniform selection.
    sensitive: Vec<NodeTypeId>,
}

impl<'a> AttackMotifEngine<'a> {
    #[must_use]
    pub fn new(schema: &'a ResolvedSchema) -> Self {
        Self {
            schema,
            detector: BoundaryCrossingDetector::new(schema),
            sensitive: schema.sensitive_types().iter().copied().collect(),
        }
    }

    /// Inject `count` attack instances. Returns the total number of attack edges emitted.
    pub fn inject<G: GraphStore, R: Rng + ?Sized>(
        &self,
        graph: &mut G,
        rng: &mut R,
        count: usize,
    ) -> Result<usize, AttackGraphError> {
        let mut emitted = 0usize;
        for _ in 0..count {
            let instance = self.inject_one(graph, rng)?;
            emitted = emitted.saturating_add(instance.path_length);
        }
        Ok(emitted)
    }

    /// Inject and commit a single attack instance.
    pub fn inject_one<G: GraphStore, R: Rng + ?Sized>(
        &self,
        graph: &mut G,
        rng: &mut R,
    ) -> Result<AttackInstance, AttackGraphError> {
        let motif = self
            .schema
            .motifs()
            .choose(rng)
            .ok_or_else(|| AttackGraphError::EmptyMotifCatalog(self.schema.name().to_string()))?;

        let entry = self.sample_node(graph, rng, motif.entry_type, || {
            format!("motif '{}' entry", motif.id)
        })?;
        let mut builder = InstanceBuilder::start(&self.detector, &motif.id, entry);

        self.walk(graph, rng, motif, &mut builder)?;
        self.enforce_sensitive(graph, rng, &mut builder)?;
        self.enforce_boundary(graph, rng, &mut builder)?;

        let instance = builder.finish();
        debug!(
            motif = %instance.motif_id,
            path_length = instance.path_length,
            boundary_crossed = instance.boundary_crossed,
            forced_sensitive = instance.forced_sensitive,
            forced_boundary = instance.forced_boundary,
            "attack instance committed"
        );
        graph.record_instance(instance.clone());
        Ok(instance)
    }

    /// Template walk with probabilistic skip and repeat.
    fn walk<G: GraphStore, R: Rng + ?Sized>(
        &self,
        graph: &mut G,
        rng: &mut R,
        motif: &Motif,
        builder: &mut InstanceBuilder<'_>,
    ) -> Result<(), AttackGraphError> {
        let mut current = builder.entry;
        let mut previous_taken = true;

        for (index, step) in motif.steps.iter().enumerate() {
            let taken = if step.requires_previous && !previous_taken {
                false
            } else {
                include_step(step, rng)
            };
            previous_taken = taken;
            if !taken {
                continue;
            }

            let repetitions = if step.repeat.is_once() {
                1
            } else {
                rng.gen_range(step.repeat.min..=step.repeat.max)
            };
            for _ in 0..repetitions {
                let src = match step.source {
                    SourceSelector::Current => current,
                    SourceSelector::Entry => builder.entry,
                };
                let dst = self.sample_node(graph, rng, step.target_type, || {
                    format!("motif '{}' step {}", motif.id, index + 1)
                })?;
                builder.record_step(graph, src, dst, step.relation)?;
                current = dst;
            }
        }
        Ok(())
    }

    /// Append a filler edge to a sensitive asset if the walk never reached one.
    fn enforce_sensitive<G: GraphStore, R: Rng + ?Sized>(
        &self,
        graph: &mut G,
        rng: &mut R,
        builder: &mut InstanceBuilder<'_>,
    ) -> Result<(), AttackGraphError> {
        for &node in &builder.node_ids {
            if self.schema.is_sensitive(graph.node_type(node)?) {
                return Ok(());
            }
        }

        let target_type = self.sensitive.choose(rng).copied().ok_or_else(|| {
            AttackGraphError::EmptySensitiveAssets(self.schema.name().to_string())
        })?;
        let target = self.sample_node(graph, rng, target_type, || {
            "sensitive-asset enforcement".to_string()
        })?;
        let src = builder.last_visited();

        debug!(
            motif = %builder.motif_id,
            target_type = self.schema.node_type_name(target_type),
            "forcing sensitive-asset step"
        );
        builder.record_step(graph, src, target, self.schema.fallback_relation())?;
        builder.forced_sensitive = true;
        Ok(())
    }

    /// Append one filler edge if no transition crossed a boundary.
    ///
    /// The forced transition is classified like any other; whatever the
    /// outcome, nothing further is forced.
    fn enforce_boundary<G: GraphStore, R: Rng + ?Sized>(
        &self,
        graph: &mut G,
        rng: &mut R,
        builder: &mut InstanceBuilder<'_>,
    ) -> Result<(), AttackGraphError> {
        if builder.boundary_crossed {
            return Ok(());
        }

        let target = match self.schema.boundary_fallback_type() {
            Some(node_type) => {
                self.sample_node(graph, rng, node_type, || "boundary enforcement".to_string())?
            }
            None => {
                let population = graph.node_count() as u64;
                if population == 0 {
                    return Err(AttackGraphError::invalid(
                        "boundary enforcement",
                        "graph has no nodes",
                    ));
                }
                NodeId(rng.gen_range(0..population))
            }
        };
        let src = builder.last_visited();

        builder.record_step(graph, src, target, self.schema.fallback_relation())?;
        builder.forced_boundary = true;
        debug!(
            motif = %builder.motif_id,
            crossed = builder.boundary_crossed,
            "forced boundary step"
        );
        Ok(())
    }

    /// Uniformly pick a node of `node_type`.
    fn sample_node<G: GraphStore, R: Rng + ?Sized>(
        &self,
        graph: &G,
        rng: &mut R,
        node_type: NodeTypeId,
        context: impl FnOnce() -> String,
    ) -> Result<NodeId, AttackGraphError> {
        graph
            .nodes_of_type(node_type)
            .choose(rng)
            .copied()
            .ok_or_else(|| AttackGraphError::EmptyPopulation {
                node_type: self.schema.node_type_name(node_type).to_string(),
                context: context(),
            })
    }
}

/// Flip the inclusion coin. Mandatory steps consume no draw.
fn include_step<R: Rng + ?Sized>(step: &MotifStep, rng: &mut R) -> bool {
    if step.is_optional() {
        rng.gen_bool(step.probability)
    } else {
        true
    }
}

// =============================================================================
// INSTANCE BUILDER
// =============================================================================

/// Mutable accumulator of one attack walk.
struct InstanceBuilder<'d> {
    detector: &'d BoundaryCrossingDetector<'d>,
    motif_id: String,
    entry: NodeId,
    node_ids: Vec<NodeId>,
    edges: Vec<AttackEdge>,
    boundary_crossed: bool,
    forced_sensitive: bool,
    forced_boundary: bool,
}

impl<'d> InstanceBuilder<'d> {
    fn start(detector: &'d BoundaryCrossingDetector<'d>, motif_id: &str, entry: NodeId) -> Self {
        Self {
            detector,
            motif_id: motif_id.to_string(),
            entry,
            node_ids: vec![entry],
            edges: Vec::new(),
            boundary_crossed: false,
            forced_sensitive: false,
            forced_boundary: false,
        }
    }

    /// Emit the attack edge, append it and its target, and reclassify.
    fn record_step<G: GraphStore>(
        &mut self,
        graph: &mut G,
        src: NodeId,
        dst: NodeId,
        relation: RelationId,
    ) -> Result<(), AttackGraphError> {
        graph.add_edge(src, dst, relation, true)?;
        self.edges.push(AttackEdge { src, dst, relation });
        self.node_ids.push(dst);

        if self
            .detector
            .crosses(graph.node_type(src)?, graph.node_type(dst)?)
        {
            self.boundary_crossed = true;
        }
        Ok(())
    }

    fn last_visited(&self) -> NodeId {
        self.node_ids.last().copied().unwrap_or(self.entry)
    }

    fn finish(self) -> AttackInstance {
        AttackInstance {
            motif_id: self.motif_id,
            entry: self.entry,
            path_length: self.edges.len(),
            node_ids: self.node_ids,
            edges: self.edges,
            boundary_crossed: self.boundary_crossed,
            forced_sensitive: self.forced_sensitive,
            forced_boundary: self.forced_boundary,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
