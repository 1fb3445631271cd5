//! Schema resolution.
//!
//! Turns the stringly-typed [`Schema`] into a [`ResolvedSchema`] whose node
//! types and relations are typed tags. Every configuration error is reported
//! here, before a single node is created.

use super::{EdgeRule, RepeatRange, Schema, SourceSelector};
use crate::primitives::{
    MAX_FEATURE_DIMENSIONS, MAX_NODE_COUNT, MAX_STEP_REPEAT, MAX_UNIFORM_TRIALS,
};
use crate::{AttackGraphError, NodeTypeId, RelationId};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// RESOLVED TYPES
// =============================================================================

/// A fan-out rule with resolved tags and rate.
#[derive(Debug, Clone, PartialEq)]
pub struct FanOutRule {
    pub relation: RelationId,
    pub source_types: Vec<NodeTypeId>,
    pub target_types: Vec<NodeTypeId>,
    /// Poisson mean, looked up from the schema's generation rates.
    pub rate: f64,
    pub avoid_self_loops: bool,
}

/// A uniform-pair rule with a resolved relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformPairRule {
    pub relation: RelationId,
    pub trials: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedEdgeRule {
    FanOut(FanOutRule),
    UniformPair(UniformPairRule),
}

impl ResolvedEdgeRule {
    #[must_use]
    pub fn relation(&self) -> RelationId {
        match self {
            ResolvedEdgeRule::FanOut(rule) => rule.relation,
            ResolvedEdgeRule::UniformPair(rule) => rule.relation,
        }
    }
}

/// A motif step with resolved tags.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotifStep {
    pub source: SourceSelector,
    pub target_type: NodeTypeId,
    pub relation: RelationId,
    pub probability: f64,
    pub repeat: RepeatRange,
    pub requires_previous: bool,
}

impl MotifStep {
    /// Whether the inclusion coin can come up tails.
    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.probability < 1.0
    }
}

/// A motif with resolved tags.
#[derive(Debug, Clone, PartialEq)]
pub struct Motif {
    pub id: String,
    pub entry_type: NodeTypeId,
    pub steps: Vec<MotifStep>,
}

/// A named trust zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryGroup {
    pub name: String,
    pub members: BTreeSet<NodeTypeId>,
}

impl BoundaryGroup {
    #[must_use]
    pub fn contains(&self, node_type: NodeTypeId) -> bool {
        self.members.contains(&node_type)
    }
}

/// A validated schema. Only obtainable through [`Schema::resolve`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSchema {
    name: String,
    node_types: Vec<String>,
    relation_types: Vec<String>,
    canonical_node_types: Vec<String>,
    canonical_relations: Vec<String>,
    node_counts: Vec<usize>,
    edge_rules: Vec<ResolvedEdgeRule>,
    motifs: Vec<Motif>,
    sensitive_types: BTreeSet<NodeTypeId>,
    boundary_groups: Vec<BoundaryGroup>,
    fallback_relation: RelationId,
    boundary_fallback_type: Option<NodeTypeId>,
    feature_dimensions: usize,
}

impl ResolvedSchema {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Node type names in declared order.
    #[must_use]
    pub fn node_types(&self) -> &[String] {
        &self.node_types
    }

    /// Relation names in declared order.
    #[must_use]
    pub fn relation_types(&self) -> &[String] {
        &self.relation_types
    }

    /// Canonical names aligned with [`Self::node_types`].
    #[must_use]
    pub fn canonical_node_types(&self) -> &[String] {
        &self.canonical_node_types
    }

    /// Canonical names aligned with [`Self::relation_types`].
    #[must_use]
    pub fn canonical_relations(&self) -> &[String] {
        &self.canonical_relations
    }

    /// All node type tags in declared order.
    pub fn node_type_ids(&self) -> impl Iterator<Item = NodeTypeId> + '_ {
        (0..self.node_types.len()).map(|i| NodeTypeId(i as u32))
    }

    #[must_use]
    pub fn node_type_name(&self, node_type: NodeTypeId) -> &str {
        self.node_types
            .get(node_type.index())
            .map_or("<unknown>", String::as_str)
    }

    #[must_use]
    pub fn relation_name(&self, relation: RelationId) -> &str {
        self.relation_types
            .get(relation.index())
            .map_or("<unknown>", String::as_str)
    }

    /// Configured population of a node type.
    #[must_use]
    pub fn node_count(&self, node_type: NodeTypeId) -> usize {
        self.node_counts.get(node_type.index()).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn total_nodes(&self) -> usize {
        self.node_counts.iter().sum()
    }

    #[must_use]
    pub fn edge_rules(&self) -> &[ResolvedEdgeRule] {
        &self.edge_rules
    }

    #[must_use]
    pub fn motifs(&self) -> &[Motif] {
        &self.motifs
    }

    #[must_use]
    pub fn sensitive_types(&self) -> &BTreeSet<NodeTypeId> {
        &self.sensitive_types
    }

    #[must_use]
    pub fn is_sensitive(&self, node_type: NodeTypeId) -> bool {
        self.sensitive_types.contains(&node_type)
    }

    #[must_use]
    pub fn boundary_groups(&self) -> &[BoundaryGroup] {
        &self.boundary_groups
    }

    #[must_use]
    pub fn fallback_relation(&self) -> RelationId {
        self.fallback_relation
    }

    #[must_use]
    pub fn boundary_fallback_type(&self) -> Option<NodeTypeId> {
        self.boundary_fallback_type
    }

    #[must_use]
    pub fn feature_dimensions(&self) -> usize {
        self.feature_dimensions
    }

    /// Validate `schema` and resolve all of its names.
    pub fn resolve(schema: &Schema) -> Result<Self, AttackGraphError> {
        let vocab = Vocabulary::build(schema)?;

        // Populations, in declared type order
        let mut node_counts = vec![0usize; schema.node_types.len()];
        for (name, &count) in &schema.node_counts {
            let id = vocab.node_type(name, || "node_counts".to_string())?;
            node_counts[id.index()] = count;
        }
        let total = node_counts.iter().fold(0usize, |acc, c| acc.saturating_add(*c));
        if total == 0 {
            return Err(AttackGraphError::invalid(
                "node_counts",
                "schema has no nodes",
            ));
        }
        if total > MAX_NODE_COUNT {
            return Err(AttackGraphError::invalid(
                "node_counts",
                format!("{} nodes exceeds maximum {}", total, MAX_NODE_COUNT),
            ));
        }
        let populated = |id: NodeTypeId, context: &dyn Fn() -> String| {
            if node_counts[id.index()] == 0 {
                Err(AttackGraphError::EmptyPopulation {
                    node_type: schema.node_types[id.index()].clone(),
                    context: context(),
                })
            } else {
                Ok(id)
            }
        };

        let canonical_node_types = canonical_names(
            &schema.node_types,
            &schema.canonical_node_map,
            |name| vocab.node_type(name, || "canonical_node_map".to_string()).map(|_| ()),
        )?;
        let canonical_relations = canonical_names(
            &schema.relation_types,
            &schema.canonical_relation_map,
            |name| {
                vocab
                    .relation(name, || "canonical_relation_map".to_string())
                    .map(|_| ())
            },
        )?;

        let edge_rules = schema
            .edge_rules
            .iter()
            .enumerate()
            .map(|(i, rule)| vocab.edge_rule(schema, i, rule))
            .collect::<Result<Vec<_>, _>>()?;

        // Motif catalog
        if schema.motifs.is_empty() {
            return Err(AttackGraphError::EmptyMotifCatalog(schema.name.clone()));
        }
        let mut motif_ids = BTreeSet::new();
        let mut motifs = Vec::with_capacity(schema.motifs.len());
        for def in &schema.motifs {
            if !motif_ids.insert(def.id.as_str()) {
                return Err(AttackGraphError::Duplicate {
                    kind: "motif id",
                    name: def.id.clone(),
                });
            }
            let entry_context = || format!("motif '{}' entry", def.id);
            let entry_type = vocab.node_type(&def.entry_type, entry_context)?;
            populated(entry_type, &entry_context)?;

            let mut steps = Vec::with_capacity(def.steps.len());
            for (n, step) in def.steps.iter().enumerate() {
                let context = || format!("motif '{}' step {}", def.id, n + 1);
                let target_type = vocab.node_type(&step.target_type, context)?;
                populated(target_type, &context)?;
                let relation = vocab.relation(&step.relation, context)?;
                if !(0.0..=1.0).contains(&step.probability) {
                    return Err(AttackGraphError::invalid(
                        context(),
                        format!("probability {} outside [0, 1]", step.probability),
                    ));
                }
                let RepeatRange { min, max } = step.repeat;
                if min == 0 || min > max || max > MAX_STEP_REPEAT {
                    return Err(AttackGraphError::invalid(
                        context(),
                        format!(
                            "repeat range {}..={} must satisfy 1 <= min <= max <= {}",
                            min, max, MAX_STEP_REPEAT
                        ),
                    ));
                }
                steps.push(MotifStep {
                    source: step.source,
                    target_type,
                    relation,
                    probability: step.probability,
                    repeat: step.repeat,
                    requires_previous: step.requires_previous,
                });
            }
            motifs.push(Motif {
                id: def.id.clone(),
                entry_type,
                steps,
            });
        }

        // Sensitive assets
        if schema.sensitive_asset_types.is_empty() {
            return Err(AttackGraphError::EmptySensitiveAssets(schema.name.clone()));
        }
        let mut sensitive_types = BTreeSet::new();
        for name in &schema.sensitive_asset_types {
            let context = || "sensitive_asset_types".to_string();
            let id = vocab.node_type(name, context)?;
            sensitive_types.insert(populated(id, &context)?);
        }

        // Boundary groups
        if schema.boundary_definition.is_empty() {
            return Err(AttackGraphError::EmptyBoundaryDefinition(
                schema.name.clone(),
            ));
        }
        let mut boundary_groups = Vec::with_capacity(schema.boundary_definition.len());
        for (group, members) in &schema.boundary_definition {
            if members.is_empty() {
                return Err(AttackGraphError::EmptyBoundaryGroup(group.clone()));
            }
            let members = members
                .iter()
                .map(|m| vocab.node_type(m, || format!("boundary group '{}'", group)))
                .collect::<Result<BTreeSet<_>, _>>()?;
            boundary_groups.push(BoundaryGroup {
                name: group.clone(),
                members,
            });
        }

        let fallback_relation =
            vocab.relation(&schema.fallback_relation, || "fallback_relation".to_string())?;
        let boundary_fallback_type = match &schema.boundary_fallback_type {
            Some(name) => {
                let context = || "boundary_fallback_type".to_string();
                let id = vocab.node_type(name, context)?;
                Some(populated(id, &context)?)
            }
            None => None,
        };

        if schema.feature_dimensions == 0 || schema.feature_dimensions > MAX_FEATURE_DIMENSIONS
        {
            return Err(AttackGraphError::invalid(
                "feature_dimensions",
                format!(
                    "{} outside 1..={}",
                    schema.feature_dimensions, MAX_FEATURE_DIMENSIONS
                ),
            ));
        }

        Ok(Self {
            name: schema.name.clone(),
            node_types: schema.node_types.clone(),
            relation_types: schema.relation_types.clone(),
            canonical_node_types,
            canonical_relations,
            node_counts,
            edge_rules,
            motifs,
            sensitive_types,
            boundary_groups,
            fallback_relation,
            boundary_fallback_type,
            feature_dimensions: schema.feature_dimensions,
        })
    }
}

// =============================================================================
// VOCABULARY
// =============================================================================

/// Name -> tag lookup for one schema.
struct Vocabulary<'a> {
    node_types: BTreeMap<&'a str, NodeTypeId>,
    relations: BTreeMap<&'a str, RelationId>,
}

impl<'a> Vocabulary<'a> {
    fn build(schema: &'a Schema) -> Result<Self, AttackGraphError> {
        if schema.node_types.is_empty() {
            return Err(AttackGraphError::invalid("node_types", "must not be empty"));
        }
        if schema.relation_types.is_empty() {
            return Err(AttackGraphError::invalid(
                "relation_types",
                "must not be empty",
            ));
        }
        let too_many = |field: &str| AttackGraphError::invalid(field, "too many declared types");

        let mut node_types = BTreeMap::new();
        for (i, name) in schema.node_types.iter().enumerate() {
            let tag = NodeTypeId(u32::try_from(i).map_err(|_| too_many("node_types"))?);
            if node_types.insert(name.as_str(), tag).is_some() {
                return Err(AttackGraphError::Duplicate {
                    kind: "node type",
                    name: name.clone(),
                });
            }
        }

        let mut relations = BTreeMap::new();
        for (i, name) in schema.relation_types.iter().enumerate() {
            let tag = RelationId(u32::try_from(i).map_err(|_| too_many("relation_types"))?);
            if relations.insert(name.as_str(), tag).is_some() {
                return Err(AttackGraphError::Duplicate {
                    kind: "relation",
                    name: name.clone(),
                });
            }
        }

        Ok(Self {
            node_types,
            relations,
        })
    }

    fn node_type(
        &self,
        name: &str,
        context: impl FnOnce() -> String,
    ) -> Result<NodeTypeId, AttackGraphError> {
        self.node_types
            .get(name)
            .copied()
            .ok_or_else(|| AttackGraphError::UnknownNodeType {
                name: name.to_string(),
                context: context(),
            })
    }

    fn relation(
        &self,
        name: &str,
        context: impl FnOnce() -> String,
    ) -> Result<RelationId, AttackGraphError> {
        self.relations
            .get(name)
            .copied()
            .ok_or_else(|| AttackGraphError::UnknownRelation {
                name: name.to_string(),
                context: context(),
            })
    }

    fn edge_rule(
        &self,
        schema: &Schema,
        index: usize,
        rule: &EdgeRule,
    ) -> Result<ResolvedEdgeRule, AttackGraphError> {
        let context = || format!("edge rule {} ({})", index + 1, rule.relation());
        match rule {
            EdgeRule::FanOut {
                relation,
                source_types,
                target_types,
                rate,
                avoid_self_loops,
            } => {
                let relation = self.relation(relation, context)?;
                let source_types = source_types
                    .iter()
                    .map(|t| self.node_type(t, context))
                    .collect::<Result<Vec<_>, _>>()?;
                let target_types = target_types
                    .iter()
                    .map(|t| self.node_type(t, context))
                    .collect::<Result<Vec<_>, _>>()?;
                if source_types.is_empty() || target_types.is_empty() {
                    return Err(AttackGraphError::invalid(
                        context(),
                        "source_types and target_types must not be empty",
                    ));
                }
                let value = schema.generation_rates.get(rate).copied().ok_or_else(|| {
                    AttackGraphError::invalid(
                        context(),
                        format!("unknown generation rate '{}'", rate),
                    )
                })?;
                if !value.is_finite() || value < 0.0 {
                    return Err(AttackGraphError::invalid(
                        rate.clone(),
                        format!("rate {} must be finite and non-negative", value),
                    ));
                }
                Ok(ResolvedEdgeRule::FanOut(FanOutRule {
                    relation,
                    source_types,
                    target_types,
                    rate: value,
                    avoid_self_loops: *avoid_self_loops,
                }))
            }
            EdgeRule::UniformPair { relation, trials } => {
                let relation = self.relation(relation, context)?;
                if *trials > MAX_UNIFORM_TRIALS {
                    return Err(AttackGraphError::invalid(
                        context(),
                        format!("{} trials exceeds maximum {}", trials, MAX_UNIFORM_TRIALS),
                    ));
                }
                Ok(ResolvedEdgeRule::UniformPair(UniformPairRule {
                    relation,
                    trials: *trials,
                }))
            }
        }
    }
}

/// Canonical names aligned with `declared`, falling back to the declared name.
fn canonical_names(
    declared: &[String],
    map: &BTreeMap<String, String>,
    check_key: impl Fn(&str) -> Result<(), AttackGraphError>,
) -> Result<Vec<String>, AttackGraphError> {
    for key in map.keys() {
        check_key(key)?;
    }
    Ok(declared
        .iter()
        .map(|name| map.get(name).unwrap_or(name).clone())
        .collect())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{MotifDefinition, StepDefinition};

    fn base_schema() -> Schema {
        Schema {
            name: "Tiny".to_string(),
            node_types: vec!["A".into(), "B".into(), "C".into()],
            relation_types: vec!["r1".into(), "r2".into()],
            sensitive_asset_types: vec!["C".into()],
            fallback_relation: "r2".into(),
            boundary_fallback_type: None,
            feature_dimensions: 4,
            canonical_node_map: BTreeMap::from([("A".to_string(), "User".to_string())]),
            canonical_relation_map: BTreeMap::new(),
            node_counts: BTreeMap::from([
                ("A".to_string(), 5),
                ("B".to_string(), 5),
                ("C".to_string(), 2),
            ]),
            generation_rates: BTreeMap::from([("ab".to_string(), 2.0)]),
            boundary_definition: BTreeMap::from([(
                "zone".to_string(),
                vec!["A".into(), "B".into(), "C".into()],
            )]),
            edge_rules: vec![EdgeRule::FanOut {
                relation: "r1".into(),
                source_types: vec!["A".into()],
                target_types: vec!["B".into()],
                rate: "ab".into(),
                avoid_self_loops: true,
            }],
            motifs: vec![MotifDefinition {
                id: "M".into(),
                entry_type: "A".into(),
                steps: vec![
                    StepDefinition::new("B", "r1"),
                    StepDefinition::new("C", "r2"),
                ],
            }],
        }
    }

    #[test]
    fn resolves_tags_in_declared_order() {
        let resolved = base_schema().resolve().expect("resolve");
        assert_eq!(resolved.node_type_name(NodeTypeId(2)), "C");
        assert_eq!(resolved.relation_name(RelationId(1)), "r2");
        assert_eq!(resolved.node_count(NodeTypeId(0)), 5);
        assert_eq!(resolved.total_nodes(), 12);
        assert!(resolved.is_sensitive(NodeTypeId(2)));
        assert_eq!(resolved.fallback_relation(), RelationId(1));
        assert_eq!(resolved.motifs()[0].steps[1].target_type, NodeTypeId(2));
    }

    #[test]
    fn canonical_names_fall_back_to_declared() {
        let resolved = base_schema().resolve().expect("resolve");
        assert_eq!(resolved.canonical_node_types(), &["User", "B", "C"]);
        assert_eq!(resolved.canonical_relations(), &["r1", "r2"]);
    }

    #[test]
    fn unknown_step_type_names_motif() {
        let mut schema = base_schema();
        schema.motifs[0].steps[1].target_type = "Z".into();
        let err = schema.resolve().expect_err("must fail");
        match err {
            AttackGraphError::UnknownNodeType { name, context } => {
                assert_eq!(name, "Z");
                assert_eq!(context, "motif 'M' step 2");
            }
            other => unreachable!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn unknown_step_relation_rejected() {
        let mut schema = base_schema();
        schema.motifs[0].steps[0].relation = "nope".into();
        assert!(matches!(
            schema.resolve(),
            Err(AttackGraphError::UnknownRelation { .. })
        ));
    }

    #[test]
    fn unknown_boundary_member_rejected() {
        let mut schema = base_schema();
        schema
            .boundary_definition
            .insert("dmz".into(), vec!["Ghost".into()]);
        let err = schema.resolve().expect_err("must fail");
        assert!(err.to_string().contains("Ghost"));
        assert!(err.to_string().contains("dmz"));
    }

    #[test]
    fn empty_population_step_rejected() {
        let mut schema = base_schema();
        schema.node_counts.insert("B".into(), 0);
        let err = schema.resolve().expect_err("must fail");
        match err {
            AttackGraphError::EmptyPopulation { node_type, context } => {
                assert_eq!(node_type, "B");
                assert_eq!(context, "motif 'M' step 1");
            }
            other => unreachable!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn degenerate_sets_rejected() {
        let mut schema = base_schema();
        schema.sensitive_asset_types.clear();
        assert!(matches!(
            schema.resolve(),
            Err(AttackGraphError::EmptySensitiveAssets(_))
        ));

        let mut schema = base_schema();
        schema.boundary_definition.clear();
        assert!(matches!(
            schema.resolve(),
            Err(AttackGraphError::EmptyBoundaryDefinition(_))
        ));

        let mut schema = base_schema();
        schema.boundary_definition.insert("void".into(), Vec::new());
        assert!(matches!(
            schema.resolve(),
            Err(AttackGraphError::EmptyBoundaryGroup(_))
        ));

        let mut schema = base_schema();
        schema.motifs.clear();
        assert!(matches!(
            schema.resolve(),
            Err(AttackGraphError::EmptyMotifCatalog(_))
        ));
    }

    #[test]
    fn invalid_step_parameters_rejected() {
        let mut schema = base_schema();
        schema.motifs[0].steps[0].probability = 1.5;
        assert!(matches!(
            schema.resolve(),
            Err(AttackGraphError::InvalidParameter { .. })
        ));

        let mut schema = base_schema();
        schema.motifs[0].steps[0].repeat = RepeatRange { min: 3, max: 2 };
        assert!(matches!(
            schema.resolve(),
            Err(AttackGraphError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn unknown_or_negative_rate_rejected() {
        let mut schema = base_schema();
        schema.generation_rates.clear();
        assert!(schema.resolve().is_err());

        let mut schema = base_schema();
        schema.generation_rates.insert("ab".into(), -1.0);
        assert!(schema.resolve().is_err());
    }

    #[test]
    fn duplicate_types_and_motifs_rejected() {
        let mut schema = base_schema();
        schema.node_types.push("A".into());
        assert!(matches!(
            schema.resolve(),
            Err(AttackGraphError::Duplicate { kind: "node type", .. })
        ));

        let mut schema = base_schema();
        let again = schema.motifs[0].clone();
        schema.motifs.push(again);
        assert!(matches!(
            schema.resolve(),
            Err(AttackGraphError::Duplicate { kind: "motif id", .. })
        ));
    }

    #[test]
    fn zero_feature_dimensions_rejected() {
        let mut schema = base_schema();
        schema.feature_dimensions = 0;
        assert!(schema.resolve().is_err());
    }

    #[test]
    fn unpopulated_boundary_fallback_rejected() {
        let mut schema = base_schema();
        schema.node_types.push("D".into());
        schema.boundary_fallback_type = Some("D".into());
        assert!(matches!(
            schema.resolve(),
            Err(AttackGraphError::EmptyPopulation { .. })
        ));
    }
}
