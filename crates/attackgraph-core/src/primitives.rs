//! # Generation Primitives
//!
//! Hardcoded runtime constants for the generator.
//!
//! These bound every configurable quantity so that a generation run is always
//! linear in nodes + edges + instances, whatever schema is supplied.

/// Default inclusive range for the number of attack instances per run.
pub const DEFAULT_MIN_ATTACK_INSTANCES: usize = 10;

/// See [`DEFAULT_MIN_ATTACK_INSTANCES`].
pub const DEFAULT_MAX_ATTACK_INSTANCES: usize = 20;

/// Upper bound for the configured attack-instance range.
pub const MAX_ATTACK_INSTANCES: usize = 10_000;

/// Maximum total node population of a schema.
pub const MAX_NODE_COUNT: usize = 1_000_000;

/// Maximum repetitions of a single motif step.
///
/// Repeats model bounded fan-out or chain extension, never unbounded walks.
pub const MAX_STEP_REPEAT: usize = 16;

/// Maximum number of trials of a uniform-pair rule.
pub const MAX_UNIFORM_TRIALS: u64 = 10_000_000;

/// Maximum feature dimensionality of the exported node matrix.
pub const MAX_FEATURE_DIMENSIONS: usize = 4096;

/// Magic bytes for the dataset binary format header.
pub const MAGIC_BYTES: &[u8; 4] = b"AGDS";

/// Current dataset format version.
///
/// Increment this when making breaking changes to the serialization format.
pub const FORMAT_VERSION: u8 = 1;
