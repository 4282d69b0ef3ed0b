//! Spec compilation tests: block locking, lowering, determinism and
//! advisory diagnostics.
mod common;
use blockflow::spec::{PortRef, RunResources};
use common::*;
use blockflow::prelude::*;
use serde_json::json;

#[cfg(test)]
mod locking_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_registered_block_is_locked_with_registry_digest() {
        let mut graph = PipelineGraph::new();
        graph.add_node(dataset_node());
        graph.add_node(NewNode::new(NodeKind::Objective, BlockRef::new("objectives.custom", "0.1.0")));

        let spec = Compiler::default().compile(&graph, &toy_registry());

        assert_eq!(spec.graph.nodes.len(), 2);
        assert_eq!(spec.locked_blocks.len(), 1);
        let locked = &spec.locked_blocks[0];
        assert_eq!(locked.block_id, "datasets.toy_av");
        assert_eq!(locked.version, "1.1.0");
        assert_eq!(locked.digest, "d1");
    }

    #[test]
    fn test_locked_blocks_are_unique_and_in_first_reference_order() {
        let mut graph = PipelineGraph::new();
        graph.add_node(encoder_node());
        graph.add_node(dataset_node());
        graph.add_node(encoder_node());
        graph.add_node(fusion_node());

        let spec = Compiler::default().compile(&graph, &full_registry());

        let locked: Vec<(&str, &str)> = spec
            .locked_blocks
            .iter()
            .map(|b| (b.block_id.as_str(), b.version.as_str()))
            .collect();
        assert_eq!(
            locked,
            vec![
                ("unimodals.linear", "1.0.2"),
                ("datasets.toy_av", "1.1.0"),
                ("fusions.concat", "1.0.0"),
            ]
        );
    }

    #[test]
    fn test_empty_graph_compiles() {
        let spec = Compiler::default().compile(&PipelineGraph::new(), &RegistryCache::new());
        assert!(spec.graph.nodes.is_empty());
        assert!(spec.graph.edges.is_empty());
        assert!(spec.locked_blocks.is_empty());
        assert_eq!(spec.spec_version, SPEC_VERSION);
    }
}

#[cfg(test)]
mod lowering_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_edges_lower_to_bare_port_names() {
        let (graph, ds, enc) = dataset_encoder_graph();

        let spec = Compiler::default().compile(&graph, &toy_registry());

        assert_eq!(spec.graph.edges.len(), 1);
        let edge = &spec.graph.edges[0];
        assert_eq!(edge.id, graph.edges()[0].id);
        assert_eq!(edge.from, PortRef::new(ds.as_str(), "batch"));
        assert_eq!(edge.to, PortRef::new(enc.as_str(), "batch"));
        assert_eq!(spec.graph.nodes, graph.nodes().to_vec());
    }

    #[test]
    fn test_wire_format_field_names() {
        let mut graph = PipelineGraph::new();
        graph.insert_node("n_ds", dataset_node().at(Position::new(40.0, 120.0))).unwrap();
        graph.insert_node("n_enc", encoder_node()).unwrap();
        graph.connect(&CandidateEdge::between("n_ds", "batch", "n_enc", "batch")).unwrap();

        let spec = Compiler::builder()
            .with_seed(42)
            .with_mode(RunMode::Async)
            .with_resources(RunResources {
                memory_mb: Some(512),
                ..Default::default()
            })
            .build()
            .compile_with_stamp(&graph, &toy_registry(), fixed_stamp());
        let wire = serde_json::to_value(&spec).expect("spec serializes");

        assert_eq!(wire["specVersion"], json!("0.1.0"));
        assert_eq!(wire["pipeline"]["id"], json!("pipe_0000abcd"));
        assert_eq!(wire["pipeline"]["name"], json!("MVP Pipeline"));
        assert_eq!(wire["pipeline"]["createdAt"], json!("2024-05-01T12:00:00Z"));
        assert_eq!(wire["graph"]["nodes"][0]["type"], json!("dataset"));
        assert_eq!(
            wire["graph"]["nodes"][0]["blockRef"],
            json!({"blockId": "datasets.toy_av", "version": "1.1.0"})
        );
        assert_eq!(wire["graph"]["nodes"][0]["ui"], json!({"x": 40.0, "y": 120.0}));
        assert_eq!(
            wire["graph"]["nodes"][0]["outputs"][0],
            json!({"name": "batch", "portType": "batch.multimodal.v1"})
        );
        assert_eq!(
            wire["graph"]["edges"][0],
            json!({
                "id": "e_n_ds_out:batch_n_enc_in:batch",
                "from": {"nodeId": "n_ds", "port": "batch"},
                "to": {"nodeId": "n_enc", "port": "batch"}
            })
        );
        assert_eq!(wire["lockedBlocks"][0]["digest"], json!("d1"));
        assert_eq!(
            wire["runConfig"],
            json!({"seed": 42, "mode": "async", "resources": {"memoryMB": 512}})
        );
    }
}

#[cfg(test)]
mod determinism_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_same_stamp_gives_identical_spec() {
        let graph = demo_graph(&full_registry());
        let registry = full_registry();
        let compiler = Compiler::builder().with_name("Toy A/V").with_seed(7).build();

        let first = compiler.compile_with_stamp(&graph, &registry, fixed_stamp());
        let second = compiler.compile_with_stamp(&graph, &registry, fixed_stamp());

        assert_eq!(first, second);
        assert_eq!(
            first.to_json_pretty().expect("renders"),
            second.to_json_pretty().expect("renders")
        );
    }

    #[test]
    fn test_repeated_compiles_differ_only_in_stamp() {
        let graph = demo_graph(&full_registry());
        let registry = full_registry();
        let compiler = Compiler::default();

        let first = compiler.compile(&graph, &registry);
        let second = compiler.compile(&graph, &registry);

        assert!(first.pipeline.id.starts_with("pipe_"));
        assert_eq!(first.graph, second.graph);
        assert_eq!(first.locked_blocks, second.locked_blocks);
        assert_eq!(first.run_config, second.run_config);
        assert_eq!(first.pipeline.name, second.pipeline.name);
    }

    #[test]
    fn test_compiled_spec_parses_back() {
        let graph = demo_graph(&full_registry());
        let spec = Compiler::default().compile_with_stamp(&graph, &full_registry(), fixed_stamp());

        let json = spec.to_json_pretty().expect("renders");
        let parsed = PipelineSpec::from_json(&json).expect("compiled spec is valid");

        assert_eq!(parsed, spec);
    }
}

#[cfg(test)]
mod diagnostic_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn findings(graph: &PipelineGraph, registry: &RegistryCache) -> Vec<Diagnostic> {
        Compiler::default().diagnose(graph, registry)
    }

    #[test]
    fn test_clean_template_has_only_registry_findings() {
        let graph = demo_graph(&full_registry());
        let found = findings(&graph, &full_registry());

        // The evaluator block is published as deprecated; everything else is wired.
        assert_eq!(
            found,
            vec![Diagnostic::Deprecated {
                block_id: "eval_scripts.basic".to_string(),
                version: "1.0.0".to_string(),
            }]
        );
    }

    #[test]
    fn test_unlocked_and_drifted_blocks() {
        let (graph, ds, enc) = dataset_encoder_graph();
        let registry = RegistryCache::from_versions(vec![BlockVersion::new(
            "datasets.toy_av",
            "1.2.0",
            "d2d2d2d2",
        )]);

        let found = findings(&graph, &registry);

        assert!(found.contains(&Diagnostic::VersionDrift {
            node_id: ds,
            placed: "1.1.0".to_string(),
            locked: "1.2.0".to_string(),
        }));
        assert!(found.contains(&Diagnostic::Unlocked {
            node_id: enc,
            block_id: "unimodals.linear".to_string(),
        }));
    }

    #[test]
    fn test_wiring_findings() {
        let mut graph = PipelineGraph::new();
        let ds = graph.add_node(dataset_node()).id.clone();
        let fusion = graph.add_node(fusion_node()).id.clone();
        let enc_a = graph.add_node(encoder_node()).id.clone();
        let enc_b = graph.add_node(encoder_node()).id.clone();
        graph.connect(&CandidateEdge::between(ds.as_str(), "batch", enc_a.as_str(), "batch")).unwrap();
        graph.connect(&CandidateEdge::between(ds.as_str(), "batch", enc_b.as_str(), "batch")).unwrap();
        graph.connect(&CandidateEdge::between(enc_a.as_str(), "embed", fusion.as_str(), "a")).unwrap();
        graph.connect(&CandidateEdge::between(enc_b.as_str(), "embed", fusion.as_str(), "a")).unwrap();

        let found = findings(&graph, &full_registry());

        assert!(found.contains(&Diagnostic::FanIn {
            node_id: fusion.clone(),
            port: "a".to_string(),
            sources: vec![enc_a, enc_b],
        }));
        assert!(found.contains(&Diagnostic::UnconnectedInput {
            node_id: fusion,
            port: "b".to_string(),
        }));
        assert!(!found.iter().any(|d| matches!(d, Diagnostic::Cycle { .. })));
    }

    #[test]
    fn test_cycle_is_reported_but_still_compiles() {
        let mut graph = PipelineGraph::new();
        let a = graph
            .add_node(encoder_node().with_outputs(vec![PortDecl::new("out", BATCH)]))
            .id
            .clone();
        let b = graph
            .add_node(encoder_node().with_outputs(vec![PortDecl::new("out", BATCH)]))
            .id
            .clone();
        graph.connect(&CandidateEdge::between(a.as_str(), "out", b.as_str(), "batch")).unwrap();
        graph.connect(&CandidateEdge::between(b.as_str(), "out", a.as_str(), "batch")).unwrap();

        let found = findings(&graph, &RegistryCache::new());
        assert!(found.iter().any(|d| matches!(d, Diagnostic::Cycle { .. })));

        let spec = Compiler::default().compile(&graph, &RegistryCache::new());
        assert_eq!(spec.graph.edges.len(), 2);
    }

    #[test]
    fn test_config_checked_against_locked_schema() {
        let mut graph = PipelineGraph::new();
        let trainer = graph
            .add_node(
                NewNode::new(
                    NodeKind::Trainer,
                    BlockRef::new("training_structures.sgd_classifier", "2.0.0"),
                )
                .with_config(
                    json!({"maxIter": "lots", "alpha": 0.01, "momentum": 0.9})
                        .as_object()
                        .cloned()
                        .unwrap_or_default(),
                ),
            )
            .id
            .clone();

        let found = findings(&graph, &full_registry());

        assert_eq!(
            found,
            vec![
                Diagnostic::ConfigTypeMismatch {
                    node_id: trainer.clone(),
                    key: "maxIter".to_string(),
                    expected: "integer".to_string(),
                },
                Diagnostic::UnknownConfigKey {
                    node_id: trainer,
                    key: "momentum".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_diagnostic_messages() {
        let drift = Diagnostic::VersionDrift {
            node_id: "n_ds".to_string(),
            placed: "1.0.0".to_string(),
            locked: "1.1.0".to_string(),
        };
        assert_eq!(
            drift.to_string(),
            "node 'n_ds': placed at version 1.0.0 but the registry locks 1.1.0"
        );
        let cycle = Diagnostic::Cycle {
            path: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(cycle.to_string(), "cycle: a -> b -> a");
    }
}
