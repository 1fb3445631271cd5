//! # Scenario Tests (T0-T4)
//!
//! End-to-end checks of the generation pipeline, tier by tier.
//!
//! ## Tiers
//! - T0: Schema validation
//! - T1: Population and benign wiring
//! - T2: Injection post-conditions
//! - T3: Reference scenarios
//! - T4: Labeling, export and persistence

use attackgraph_core::{
    AttackGraphError, GenerationConfig, Generator, GraphStore, InstanceRange, NodeTypeId, Schema,
    dataset_from_bytes, dataset_to_bytes, preset,
};

/// Three types, C sensitive, one motif walking A -> B -> C.
const THREE_TYPE_SCHEMA: &str = r#"
name = "ThreeType"
node_types = ["A", "B", "C"]
relation_types = ["R1", "R2", "R3"]
sensitive_asset_types = ["C"]
fallback_relation = "R3"
feature_dimensions = 8

[node_counts]
A = 5
B = 5
C = 2

[boundary_definition]
zone = ["A", "B", "C"]

[[motifs]]
id = "ABC"
entry_type = "A"

[[motifs.steps]]
target_type = "B"
relation = "R1"

[[motifs.steps]]
target_type = "C"
relation = "R2"
"#;

fn three_type() -> Schema {
    Schema::from_toml_str(THREE_TYPE_SCHEMA).expect("parse")
}

fn single_instance(seed: u64) -> GenerationConfig {
    GenerationConfig::with_seed(seed).with_attack_instances(InstanceRange::exactly(1))
}

// =============================================================================
// TIER T0: SCHEMA VALIDATION
// =============================================================================

mod t0_schema_validation {
    use super::*;

    /// T0.1: A motif naming an undeclared type aborts before generation.
    #[test]
    fn unknown_motif_type_names_type_and_motif() {
        let mut schema = three_type();
        schema.motifs[0].steps[1].target_type = "Vault".to_string();

        let err = Generator::new(&schema, single_instance(0))
            .err()
            .expect("must fail");
        let msg = err.to_string();
        assert!(msg.contains("Vault"));
        assert!(msg.contains("ABC"));
    }

    /// T0.2: A step into a zero-population type aborts.
    #[test]
    fn empty_population_aborts() {
        let mut schema = three_type();
        schema.node_counts.insert("B".to_string(), 0);

        let result = Generator::new(&schema, single_instance(0));
        assert!(matches!(
            result,
            Err(AttackGraphError::EmptyPopulation { .. })
        ));
    }

    /// T0.3: Empty sensitive or boundary sets are configuration errors.
    #[test]
    fn degenerate_sets_abort() {
        let mut schema = three_type();
        schema.sensitive_asset_types.clear();
        assert!(Generator::new(&schema, single_instance(0)).is_err());

        let mut schema = three_type();
        schema.boundary_definition.clear();
        assert!(matches!(
            Generator::new(&schema, single_instance(0)),
            Err(AttackGraphError::EmptyBoundaryDefinition(_))
        ));
    }

    /// T0.4: Unknown boundary members are rejected.
    #[test]
    fn unknown_boundary_member_aborts() {
        let mut schema = three_type();
        schema
            .boundary_definition
            .insert("dmz".to_string(), vec!["Proxy".to_string()]);
        assert!(matches!(
            Generator::new(&schema, single_instance(0)),
            Err(AttackGraphError::UnknownNodeType { .. })
        ));
    }
}

// =============================================================================
// TIER T1: POPULATION AND BENIGN WIRING
// =============================================================================

mod t1_population {
    use super::*;

    /// T1.1: Node ids are exactly 0..N.
    #[test]
    fn ids_are_dense() {
        let schema = preset("enterprise_b").expect("parse").expect("known");
        let graph = Generator::new(&schema, GenerationConfig::with_seed(8))
            .expect("new")
            .generate()
            .expect("generate");

        assert_eq!(graph.node_count(), schema.total_nodes());
        for (index, node) in graph.nodes().enumerate() {
            assert_eq!(node.id.index(), index);
        }
    }

    /// T1.2: Type membership matches configured counts.
    #[test]
    fn populations_match_counts() {
        let schema = preset("enterprise_c").expect("parse").expect("known");
        let mut generator = Generator::new(&schema, GenerationConfig::with_seed(1)).expect("new");
        let resolved = generator.schema().clone();
        let graph = generator.generate().expect("generate");

        for node_type in resolved.node_type_ids() {
            assert_eq!(
                graph.nodes_of_type(node_type).len(),
                resolved.node_count(node_type)
            );
        }
    }

    /// T1.3: Benign-only relations never carry attack flags.
    #[test]
    fn benign_edges_stay_benign() {
        let schema = preset("enterprise_a").expect("parse").expect("known");
        let graph = Generator::new(&schema, GenerationConfig::with_seed(4))
            .expect("new")
            .generate()
            .expect("generate");

        let attack_keys: std::collections::BTreeSet<_> = graph
            .instances()
            .iter()
            .flat_map(|i| i.edges.iter().map(|e| e.key()))
            .collect();
        for (key, record) in graph.edges() {
            assert_eq!(record.is_attack, attack_keys.contains(&key));
        }
    }
}

// =============================================================================
// TIER T2: INJECTION POST-CONDITIONS
// =============================================================================

mod t2_injection {
    use super::*;

    /// T2.1: Every instance reaches a sensitive asset and records its edges.
    #[test]
    fn every_instance_reaches_sensitive_asset() {
        for name in attackgraph_core::PRESET_NAMES {
            let schema = preset(name).expect("parse").expect("known");
            let mut generator =
                Generator::new(&schema, GenerationConfig::with_seed(31)).expect("new");
            let resolved = generator.schema().clone();
            let graph = generator.generate().expect("generate");

            for instance in graph.instances() {
                assert_eq!(instance.path_length, instance.edges.len());
                let reached = instance.node_ids.iter().any(|&n| {
                    resolved.is_sensitive(graph.node_type(n).expect("node"))
                });
                assert!(reached, "{} instance missed every sensitive asset", name);
                for edge in &instance.edges {
                    assert!(instance.node_ids.contains(&edge.dst));
                }
            }
        }
    }

    /// T2.2: An uncrossed instance always ends with the forced filler edge.
    #[test]
    fn uncrossed_instances_were_forced() {
        let schema = preset("enterprise_a").expect("parse").expect("known");
        for seed in 0..10 {
            let mut generator =
                Generator::new(&schema, GenerationConfig::with_seed(seed)).expect("new");
            let fallback = generator.schema().fallback_relation();
            let graph = generator.generate().expect("generate");

            for instance in graph.instances() {
                if !instance.boundary_crossed {
                    assert!(instance.forced_boundary);
                    let last = instance.edges.last().expect("forced edge");
                    assert_eq!(last.relation, fallback);
                }
            }
        }
    }
}

// =============================================================================
// TIER T3: REFERENCE SCENARIOS
// =============================================================================

mod t3_scenarios {
    use super::*;

    /// T3.1: A direct A -> B -> C walk needs no enforcement.
    #[test]
    fn direct_walk_to_sensitive_asset() {
        let schema = three_type();
        let mut generator = Generator::new(&schema, single_instance(42)).expect("new");
        let graph = generator.generate().expect("generate");

        assert_eq!(graph.instances().len(), 1);
        let instance = &graph.instances()[0];
        assert_eq!(graph.attack_edge_count(), 2);
        assert_eq!(graph.attack_node_count(), 3);
        assert_eq!(instance.path_length, 2);
        assert!(!instance.forced_sensitive);
        assert!(!instance.forced_boundary);
        assert!(instance.boundary_crossed);
    }

    /// T3.2: A walk that misses C is forced to it, and a boundary group
    /// that no transition can satisfy yields one forced, uncrossed filler.
    #[test]
    fn forced_sensitive_and_failed_boundary() {
        let mut schema = three_type();
        schema.motifs[0].steps.truncate(1);
        schema.boundary_definition.clear();
        schema
            .boundary_definition
            .insert("vault".to_string(), vec!["C".to_string()]);

        let mut generator = Generator::new(&schema, single_instance(42)).expect("new");
        let fallback = generator.schema().fallback_relation();
        let graph = generator.generate().expect("generate");
        let instance = &graph.instances()[0];

        // A -> B, forced B -> C, forced filler.
        assert_eq!(instance.path_length, 3);
        assert!(instance.forced_sensitive);
        assert!(instance.forced_boundary);
        assert!(!instance.boundary_crossed);

        let forced_sensitive = instance.edges[1];
        assert_eq!(forced_sensitive.relation, fallback);
        assert_eq!(
            graph.node_type(forced_sensitive.dst).expect("node"),
            NodeTypeId(2)
        );
        assert_eq!(instance.edges[2].src, forced_sensitive.dst);
    }

    /// T3.3: An empty boundary-group set is refused, not silently skipped.
    #[test]
    fn empty_boundary_groups_are_refused() {
        let mut schema = three_type();
        schema.motifs[0].steps.truncate(1);
        schema.boundary_definition.clear();
        assert!(Generator::new(&schema, single_instance(42)).is_err());
    }
}

// =============================================================================
// TIER T4: LABELING, EXPORT AND PERSISTENCE
// =============================================================================

mod t4_output {
    use super::*;

    /// T4.1: Labels in the bundle mirror the instance lists.
    #[test]
    fn bundle_labels_match_instances() {
        let schema = preset("enterprise_b").expect("parse").expect("known");
        let dataset = Generator::new(&schema, GenerationConfig::with_seed(6))
            .expect("new")
            .run()
            .expect("run");
        let bundle = &dataset.bundle;

        let attack_nodes: std::collections::BTreeSet<u64> = bundle
            .attack_instances
            .iter()
            .flat_map(|i| i.node_ids.iter().map(|n| n.0))
            .collect();
        for (index, &label) in bundle.node_label.iter().enumerate() {
            assert_eq!(label == 1, attack_nodes.contains(&(index as u64)));
        }
        assert_eq!(
            bundle.edge_label.iter().filter(|&&l| l == 1).count(),
            bundle
                .attack_instances
                .iter()
                .flat_map(|i| i.edges.iter().map(|e| e.key()))
                .collect::<std::collections::BTreeSet<_>>()
                .len()
        );
    }

    /// T4.2: A saved dataset loads back unchanged.
    #[test]
    fn dataset_file_roundtrip() {
        let schema = preset("enterprise_c").expect("parse").expect("known");
        let dataset = Generator::new(&schema, GenerationConfig::with_seed(12))
            .expect("new")
            .run()
            .expect("run");

        let bytes = dataset_to_bytes(&dataset).expect("serialize");
        let restored = dataset_from_bytes(&bytes).expect("deserialize");
        assert_eq!(dataset, restored);
    }
}
