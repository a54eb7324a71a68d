mod common;

use std::collections::HashMap;

use chant_core::build::build;
use chant_core::config::Config;
use chant_core::serialize::{DefaultSerializer, Serializer};

use common::ProjectFixture;

fn serializers(names: &[&str]) -> HashMap<String, Box<dyn Serializer>> {
    names
        .iter()
        .map(|n| (n.to_string(), Box::new(DefaultSerializer::new(*n)) as Box<dyn Serializer>))
        .collect()
}

#[test]
fn empty_project_builds_with_no_outputs_or_errors() {
    let fixture = ProjectFixture::new().unwrap();
    let result = build(fixture.root(), &Config::default(), &serializers(&[]));

    assert!(result.outputs.is_empty());
    assert!(result.entities.entities.is_empty());
    assert!(result.errors.is_empty());
    assert!(result.warnings.is_empty());
    assert_eq!(result.manifest.lexicons, Vec::<String>::new());
    assert_eq!(result.manifest.deploy_order, Vec::<String>::new());
}

#[test]
fn cross_lexicon_reference_auto_detects_one_output() {
    let fixture = ProjectFixture::new().unwrap();
    fixture
        .write_file(
            "bucket.chant.ts",
            "export const dataBucket = new alpha.Bucket({ name: \"data\" });",
        )
        .unwrap();
    fixture
        .write_file(
            "deploy.chant.ts",
            "export const deployAction = new beta.Workflow({ endpoint: dataBucket.endpoint });",
        )
        .unwrap();

    let result = build(fixture.root(), &Config::default(), &serializers(&["alpha", "beta"]));

    assert_eq!(result.manifest.outputs.len(), 1);
    let (name, entry) = result.manifest.outputs.iter().next().unwrap();
    assert_eq!(name, "dataBucket_endpoint");
    assert_eq!(entry.source, "alpha");
    assert_eq!(entry.entity, "dataBucket");
    assert_eq!(entry.attribute, "endpoint");
}

#[test]
fn two_lexicons_each_get_their_own_serialized_partition() {
    let fixture = ProjectFixture::new().unwrap();
    fixture
        .write_file(
            "bucket.chant.ts",
            "export const dataBucket = new alpha.Bucket({ name: \"data\" });",
        )
        .unwrap();
    fixture
        .write_file(
            "workflow.chant.ts",
            "export const deployAction = new beta.Workflow({ name: \"deploy\" });",
        )
        .unwrap();

    let result = build(fixture.root(), &Config::default(), &serializers(&["alpha", "beta"]));

    assert_eq!(result.outputs.len(), 2);
    assert!(result.outputs["alpha"].primary().contains("dataBucket"));
    assert!(!result.outputs["alpha"].primary().contains("deployAction"));
    assert!(result.outputs["beta"].primary().contains("deployAction"));
    assert!(!result.outputs["beta"].primary().contains("dataBucket"));
}

#[test]
fn missing_serializer_for_a_partition_warns_rather_than_errors() {
    let fixture = ProjectFixture::new().unwrap();
    fixture
        .write_file(
            "bucket.chant.ts",
            "export const dataBucket = new alpha.Bucket({});",
        )
        .unwrap();

    let result = build(fixture.root(), &Config::default(), &serializers(&[]));

    assert!(result.errors.is_empty());
    assert!(result
        .warnings
        .iter()
        .any(|w| w.contains("alpha")));
}

#[test]
fn child_project_nested_at_its_own_root_reports_circular_nested_stack() {
    let fixture = ProjectFixture::new().unwrap();
    fixture
        .write_file(
            "stack.chant.ts",
            "export const nested = new ChildProject({ path: \".\" });",
        )
        .unwrap();

    let result = build(fixture.root(), &Config::default(), &serializers(&[]));

    use chant_core::error::PipelineError;
    let has_nested_cycle = result.errors.iter().any(|e| match e {
        PipelineError::Build(be) => be.message.contains("Circular nested stack"),
        _ => false,
    });
    assert!(has_nested_cycle);
}

#[test]
fn child_project_into_a_distinct_subdirectory_builds_without_error() {
    let fixture = ProjectFixture::new().unwrap();
    fixture
        .write_file(
            "stack.chant.ts",
            "export const nested = new ChildProject({ path: \"./child\" });",
        )
        .unwrap();
    fixture
        .write_file(
            "child/resource.chant.ts",
            "export const innerBucket = new alpha.Bucket({ name: \"inner\" });",
        )
        .unwrap();

    let result = build(fixture.root(), &Config::default(), &serializers(&["alpha"]));

    use chant_core::error::PipelineError;
    let has_nested_cycle = result.errors.iter().any(|e| match e {
        PipelineError::Build(be) => be.message.contains("Circular nested stack"),
        _ => false,
    });
    assert!(!has_nested_cycle);

    let nested = result.entities.entities.get("nested").unwrap();
    let build_result = match &nested.kind {
        chant_core::model::DeclarableKind::ChildProject { build_result, .. } => build_result,
        other => panic!("expected ChildProject, got {other:?}"),
    };
    let child = build_result.as_ref().expect("child project should have been built");
    assert!(child.entities.entity_id("innerBucket").is_some());
    assert!(result.entities.entity_id("innerBucket").is_none());
}
