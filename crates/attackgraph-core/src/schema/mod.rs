//! # Schema
//!
//! The descriptor of one simulated enterprise topology.
//!
//! A [`Schema`] is plain data, loaded from TOML or built in code. Nothing in
//! the engine names a node type or relation: every name is read from here and
//! resolved into typed tags by [`Schema::resolve`] before generation starts.
//!
//! ```toml
//! name = "Example"
//! node_types = ["User", "Host"]
//! relation_types = ["login"]
//! sensitive_asset_types = ["Host"]
//! fallback_relation = "login"
//! feature_dimensions = 8
//!
//! [node_counts]
//! User = 4
//! Host = 6
//!
//! [boundary_definition]
//! user_to_host = ["User", "Host"]
//!
//! [[motifs]]
//! id = "M1"
//! entry_type = "User"
//!
//! [[motifs.steps]]
//! target_type = "Host"
//! relation = "login"
//! ```

mod presets;
mod resolved;

pub use presets::{PRESET_NAMES, preset};
pub use resolved::{
    BoundaryGroup, FanOutRule, Motif, MotifStep, ResolvedEdgeRule, ResolvedSchema,
    UniformPairRule,
};

use crate::AttackGraphError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// SCHEMA
// =============================================================================

/// Immutable descriptor of one enterprise topology variant.
///
/// Field order matters for TOML output: plain values first, then tables,
/// then arrays of tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Human-readable name of the enterprise.
    pub name: String,

    /// Node types in declared order. The order defines type codes.
    pub node_types: Vec<String>,

    /// Relation types in declared order. The order defines relation codes.
    pub relation_types: Vec<String>,

    /// Node types whose instances are high-value targets.
    #[serde(default)]
    pub sensitive_asset_types: Vec<String>,

    /// Relation used for the filler edges appended by enforcement steps.
    pub fallback_relation: String,

    /// Target type of the boundary-enforcement filler edge.
    /// When absent, the target is drawn from the whole population.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boundary_fallback_type: Option<String>,

    /// Width of the exported node feature matrix.
    pub feature_dimensions: usize,

    /// Node type -> shared cross-schema vocabulary.
    #[serde(default)]
    pub canonical_node_map: BTreeMap<String, String>,

    /// Relation -> shared cross-schema vocabulary.
    #[serde(default)]
    pub canonical_relation_map: BTreeMap<String, String>,

    /// Node type -> number of nodes. Missing types have no nodes.
    #[serde(default)]
    pub node_counts: BTreeMap<String, usize>,

    /// Named numeric parameters referenced by edge rules.
    #[serde(default)]
    pub generation_rates: BTreeMap<String, f64>,

    /// Trust zones: group name -> member node types.
    #[serde(default)]
    pub boundary_definition: BTreeMap<String, Vec<String>>,

    /// Benign traffic rules, applied in order.
    #[serde(default)]
    pub edge_rules: Vec<EdgeRule>,

    /// The attack motif catalog.
    #[serde(default)]
    pub motifs: Vec<MotifDefinition>,
}

impl Schema {
    /// Parse a schema from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, AttackGraphError> {
        toml::from_str(text).map_err(|e| AttackGraphError::SerializationError(e.to_string()))
    }

    /// Render the schema as TOML text.
    pub fn to_toml_string(&self) -> Result<String, AttackGraphError> {
        toml::to_string(self).map_err(|e| AttackGraphError::SerializationError(e.to_string()))
    }

    /// Validate the schema and resolve every name into a typed tag.
    pub fn resolve(&self) -> Result<ResolvedSchema, AttackGraphError> {
        ResolvedSchema::resolve(self)
    }

    /// Total configured node population.
    #[must_use]
    pub fn total_nodes(&self) -> usize {
        self.node_counts.values().copied().fold(0, usize::saturating_add)
    }
}

// =============================================================================
// BENIGN EDGE RULES
// =============================================================================

/// A benign traffic rule for one relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EdgeRule {
    /// Every source node draws a Poisson number of distinct targets.
    FanOut {
        relation: String,
        source_types: Vec<String>,
        target_types: Vec<String>,
        /// Name of the `generation_rates` entry used as the Poisson mean.
        rate: String,
        #[serde(default = "default_true")]
        avoid_self_loops: bool,
    },
    /// A fixed number of trials, each pairing two nodes from the whole population.
    UniformPair { relation: String, trials: u64 },
}

impl EdgeRule {
    /// The relation emitted by this rule.
    #[must_use]
    pub fn relation(&self) -> &str {
        match self {
            EdgeRule::FanOut { relation, .. } | EdgeRule::UniformPair { relation, .. } => {
                relation
            }
        }
    }
}

// =============================================================================
// MOTIFS
// =============================================================================

/// A named attack template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotifDefinition {
    pub id: String,
    /// Type of the node the walk starts from.
    pub entry_type: String,
    #[serde(default)]
    pub steps: Vec<StepDefinition>,
}

/// Which node a step's edge is emitted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceSelector {
    /// The walk's current position.
    #[default]
    Current,
    /// The walk's entry node.
    Entry,
}

/// Inclusive bounds on how many times a step is repeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepeatRange {
    pub min: usize,
    pub max: usize,
}

impl RepeatRange {
    pub const ONCE: Self = Self { min: 1, max: 1 };

    #[must_use]
    pub const fn is_once(&self) -> bool {
        self.min == 1 && self.max == 1
    }
}

impl Default for RepeatRange {
    fn default() -> Self {
        Self::ONCE
    }
}

/// One edge-emission step of a motif.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDefinition {
    #[serde(default)]
    pub source: SourceSelector,
    pub target_type: String,
    pub relation: String,
    /// Chance that the step is taken. `1.0` makes it mandatory.
    #[serde(default = "default_probability", skip_serializing_if = "is_mandatory")]
    pub probability: f64,
    /// Skip this step whenever the step before it was skipped.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub requires_previous: bool,
    #[serde(default, skip_serializing_if = "RepeatRange::is_once")]
    pub repeat: RepeatRange,
}

impl StepDefinition {
    /// A mandatory single step from the current position.
    pub fn new(target_type: impl Into<String>, relation: impl Into<String>) -> Self {
        Self {
            source: SourceSelector::Current,
            target_type: target_type.into(),
            relation: relation.into(),
            probability: 1.0,
            requires_previous: false,
            repeat: RepeatRange::ONCE,
        }
    }

    #[must_use]
    pub fn from_entry(mut self) -> Self {
        self.source = SourceSelector::Entry;
        self
    }

    #[must_use]
    pub fn with_probability(mut self, probability: f64) -> Self {
        self.probability = probability;
        self
    }

    #[must_use]
    pub fn with_repeat(mut self, min: usize, max: usize) -> Self {
        self.repeat = RepeatRange { min, max };
        self
    }

    #[must_use]
    pub fn requiring_previous(mut self) -> Self {
        self.requires_previous = true;
        self
    }
}

fn default_true() -> bool {
    true
}

fn default_probability() -> f64 {
    1.0
}

#[allow(clippy::float_cmp)]
fn is_mandatory(probability: &f64) -> bool {
    *probability == 1.0
}

// =============================================================================
// TESTS
// =============================================================================
