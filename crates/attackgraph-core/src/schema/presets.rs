//! Built-in enterprise schemas.
//!
//! Each preset is a differently shaped topology with its own type names,
//! mapped onto one shared canonical vocabulary so that models trained on one
//! enterprise can be evaluated on another.

use super::Schema;
use crate::AttackGraphError;

/// Names accepted by [`preset`].
pub const PRESET_NAMES: [&str; 3] = ["enterprise_a", "enterprise_b", "enterprise_c"];

const ENTERPRISE_A: &str = include_str!("../../schemas/enterprise_a.toml");
const ENTERPRISE_B: &str = include_str!("../../schemas/enterprise_b.toml");
const ENTERPRISE_C: &str = include_str!("../../schemas/enterprise_c.toml");

/// Load a built-in schema by name. Returns `Ok(None)` for unknown names.
pub fn preset(name: &str) -> Result<Option<Schema>, AttackGraphError> {
    let text = match name {
        "enterprise_a" => ENTERPRISE_A,
        "enterprise_b" => ENTERPRISE_B,
        "enterprise_c" => ENTERPRISE_C,
        _ => return Ok(None),
    };
    Schema::from_toml_str(text).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_preset_resolves() {
        for name in PRESET_NAMES {
            let schema = preset(name).expect("parse").expect("known preset");
            let resolved = schema.resolve().expect("preset must validate");
            assert_eq!(resolved.feature_dimensions(), 16);
            assert!(!resolved.motifs().is_empty());
        }
    }

    #[test]
    fn presets_share_canonical_vocabulary() {
        let mut vocabularies = Vec::new();
        for name in PRESET_NAMES {
            let resolved = preset(name)
                .expect("parse")
                .expect("known preset")
                .resolve()
                .expect("resolve");
            let mut canonical = resolved.canonical_node_types().to_vec();
            canonical.sort();
            canonical.dedup();
            vocabularies.push(canonical);
        }
        assert!(vocabularies.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn enterprise_a_matches_reference_population() {
        let schema = preset("enterprise_a").expect("parse").expect("known preset");
        assert_eq!(schema.total_nodes(), 561);
        assert_eq!(schema.motifs.len(), 3);
        assert_eq!(schema.boundary_fallback_type.as_deref(), Some("Server"));
    }

    #[test]
    fn unknown_preset_is_none() {
        assert!(preset("enterprise_z").expect("no parse needed").is_none());
    }
}
