//! Run configuration for the generator.

use crate::AttackGraphError;
use crate::primitives::{
    DEFAULT_MAX_ATTACK_INSTANCES, DEFAULT_MIN_ATTACK_INSTANCES, MAX_ATTACK_INSTANCES,
};
use serde::{Deserialize, Serialize};

/// Inclusive range the per-run attack-instance count is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceRange {
    pub min: usize,
    pub max: usize,
}

impl InstanceRange {
    #[must_use]
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    /// A range that always yields `count`.
    #[must_use]
    pub const fn exactly(count: usize) -> Self {
        Self::new(count, count)
    }
}

impl Default for InstanceRange {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_ATTACK_INSTANCES, DEFAULT_MAX_ATTACK_INSTANCES)
    }
}

/// Configuration of one generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Seed of the single random stream shared by every stage.
    pub seed: u64,

    /// Number of attack instances, drawn once before injection.
    #[serde(default)]
    pub attack_instances: InstanceRange,
}

impl GenerationConfig {
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_attack_instances(mut self, range: InstanceRange) -> Self {
        self.attack_instances = range;
        self
    }

    pub fn validate(&self) -> Result<(), AttackGraphError> {
        let InstanceRange { min, max } = self.attack_instances;
        if min > max {
            return Err(AttackGraphError::invalid(
                "attack_instances",
                format!("min {} is greater than max {}", min, max),
            ));
        }
        if max > MAX_ATTACK_INSTANCES {
            return Err(AttackGraphError::invalid(
                "attack_instances",
                format!("max {} exceeds limit {}", max, MAX_ATTACK_INSTANCES),
            ));
        }
        Ok(())
    }
}
