//! Build Driver (§4.3): discovery → topological sort → recursive
//! child-project builds → lexicon partitioning → cross-lexicon output
//! resolution → per-lexicon serialization → manifest.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::config::Config;
use crate::crossref;
use crate::discovery::discover;
use crate::error::{BuildError, PipelineError};
use crate::model::{Declarable, DeclarableKind, EntityGraph};
use crate::serialize::{SerializedArtifact, Serializer};

/// One entry of `manifest.outputs` (§6 "Manifest format").
#[derive(Debug, Clone, PartialEq)]
pub struct OutputManifestEntry {
    pub source: String,
    pub entity: String,
    pub attribute: String,
}

/// Build-time metadata describing lexicons, cross-outputs, and deploy
/// order (§3 "Manifest").
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    pub lexicons: Vec<String>,
    pub outputs: IndexMap<String, OutputManifestEntry>,
    pub deploy_order: Vec<String>,
}

/// The full result of building one project (§4.3 "Outputs").
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BuildResult {
    pub outputs: IndexMap<String, SerializedArtifact>,
    pub entities: EntityGraph,
    pub errors: Vec<PipelineError>,
    pub warnings: Vec<String>,
    pub manifest: Manifest,
    pub source_file_count: usize,
}

/// Build the project rooted at `root`, invoking `serializers` (keyed by
/// lexicon name) for every partition that has one registered.
pub fn build(root: &Path, config: &Config, serializers: &HashMap<String, Box<dyn Serializer>>) -> BuildResult {
    let mut stack = Vec::new();
    build_with_stack(root, config, serializers, &mut stack)
}

fn build_with_stack(
    root: &Path,
    config: &Config,
    serializers: &HashMap<String, Box<dyn Serializer>>,
    stack: &mut Vec<PathBuf>,
) -> BuildResult {
    let canonical_root = std::fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
    tracing::debug!(root = %canonical_root.display(), "starting build");

    let mut graph = discover(root, config);
    let source_file_count = graph.source_files.len();

    let mut errors: Vec<PipelineError> = graph.errors.drain(..).map(PipelineError::from).collect();
    let mut warnings = Vec::new();

    // Step 2: topological sort. A cycle is recorded as a BuildError but
    // discovery's entities are still usable for the rest of the pipeline.
    let dependencies = graph.dependencies.clone();
    if let Err(cycle) = crate::graph::topo_sort(dependencies) {
        tracing::warn!(?cycle, "circular dependency detected");
        errors.push(PipelineError::from(BuildError::circular_dependency(&cycle)));
    }

    // Step 3: recursively build every ChildProject entity.
    let child_project_names: Vec<String> = graph
        .entities
        .iter()
        .filter(|(_, d)| d.is_child_project())
        .map(|(name, _)| name.clone())
        .collect();

    for name in child_project_names {
        let child_path = {
            let Some(entity) = graph.entities.get(&name) else {
                continue;
            };
            let DeclarableKind::ChildProject { path, .. } = &entity.kind else {
                continue;
            };
            resolve_child_path(root, path)
        };
        let canonical_child = std::fs::canonicalize(&child_path).unwrap_or_else(|_| child_path.clone());

        if stack.contains(&canonical_child) || canonical_child == canonical_root {
            errors.push(PipelineError::from(BuildError::circular_nested_stack(&child_path)));
            continue;
        }

        stack.push(canonical_child.clone());
        let child_result = build_with_stack(&child_path, config, serializers, stack);
        stack.pop();

        errors.extend(child_result.errors.iter().cloned());
        if let Some(entity) = graph.entities.get_mut(&name) {
            if let DeclarableKind::ChildProject { build_result, .. } = &mut entity.kind {
                *build_result = Some(Box::new(child_result));
            }
        }
    }

    // Step 4: partition entities by lexicon, preserving first-seen order.
    let mut partitions: IndexMap<String, IndexMap<String, Declarable>> = IndexMap::new();
    for (name, entity) in &graph.entities {
        partitions
            .entry(entity.lexicon.clone())
            .or_default()
            .insert(name.clone(), entity.clone());
    }

    // Steps 5-7: explicit + auto-detected cross-lexicon outputs, merged.
    let explicit_outputs = crossref::collect_explicit_outputs(&graph);
    let auto_outputs = crossref::detect_auto_outputs(&graph);
    let merged_outputs = crossref::merge_outputs(explicit_outputs, auto_outputs);

    let mut outputs_by_lexicon: IndexMap<String, Vec<crate::model::LexiconOutput>> = IndexMap::new();
    for output in &merged_outputs {
        outputs_by_lexicon
            .entry(output.source_lexicon.clone())
            .or_default()
            .push(output.clone());
    }

    // Step 8: invoke each partition's registered serializer.
    let mut outputs = IndexMap::new();
    for (lexicon, entities) in &partitions {
        let Some(serializer) = serializers.get(lexicon) else {
            warnings.push(format!("no serializer registered for lexicon \"{lexicon}\""));
            continue;
        };
        let lexicon_outputs = outputs_by_lexicon.get(lexicon).cloned().unwrap_or_default();
        let artifact = serializer.serialize(entities, &lexicon_outputs);
        outputs.insert(lexicon.clone(), artifact);
    }

    // Step 9: manifest.
    let lexicons: Vec<String> = partitions.keys().cloned().collect();
    let mut manifest_outputs = IndexMap::new();
    for output in &merged_outputs {
        if let Some(entity_name) = graph.entity_name(output.source_entity) {
            manifest_outputs.insert(
                output.output_name.clone(),
                OutputManifestEntry {
                    source: output.source_lexicon.clone(),
                    entity: entity_name.to_string(),
                    attribute: output.source_attribute.clone(),
                },
            );
        }
    }
    let deploy_order = crossref::deploy_order(&lexicons, &merged_outputs);

    let manifest = Manifest {
        lexicons,
        outputs: manifest_outputs,
        deploy_order,
    };

    BuildResult {
        outputs,
        entities: graph,
        errors,
        warnings,
        manifest,
        source_file_count,
    }
}

fn resolve_child_path(root: &Path, child_path: &str) -> PathBuf {
    let candidate = Path::new(child_path);
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        root.join(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    use crate::serialize::DefaultSerializer;

    fn write(dir: &Path, relative: &str, content: &str) {
        let path = dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn serializers(names: &[&str]) -> HashMap<String, Box<dyn Serializer>> {
        names
            .iter()
            .map(|n| (n.to_string(), Box::new(DefaultSerializer::new(*n)) as Box<dyn Serializer>))
            .collect()
    }

    #[test]
    fn empty_project_has_no_outputs_entities_or_errors() {
        let dir = tempdir().unwrap();
        let result = build(dir.path(), &Config::default(), &serializers(&[]));
        assert!(result.outputs.is_empty());
        assert!(result.entities.entities.is_empty());
        assert!(result.errors.is_empty());
        assert_eq!(result.manifest.lexicons, Vec::<String>::new());
        assert_eq!(result.manifest.deploy_order, Vec::<String>::new());
    }

    #[test]
    fn two_entity_cycle_reports_circular_dependency() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "a.chant.ts",
            "export const a = new Grant({ target: b });",
        );
        write(
            dir.path(),
            "b.chant.ts",
            "export const b = new Grant({ target: a });",
        );

        let result = build(dir.path(), &Config::default(), &serializers(&["local"]));
        let has_cycle_error = result.errors.iter().any(|e| match e {
            PipelineError::Build(be) => be.message.contains("Circular dependency"),
            _ => false,
        });
        assert!(has_cycle_error);
    }

    #[test]
    fn two_lexicons_produce_two_serialized_partitions() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "bucket.chant.ts",
            "export const dataBucket = new alpha.Bucket({ name: \"data\" });",
        );
        write(
            dir.path(),
            "workflow.chant.ts",
            "export const deploy = new beta.Workflow({ name: \"deploy\" });",
        );

        let result = build(dir.path(), &Config::default(), &serializers(&["alpha", "beta"]));
        assert!(result.outputs.contains_key("alpha"));
        assert!(result.outputs.contains_key("beta"));
        assert!(result.outputs["alpha"].primary().contains("dataBucket"));
        assert!(!result.outputs["alpha"].primary().contains("deploy"));
    }

    #[test]
    fn missing_serializer_produces_warning_not_error() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "bucket.chant.ts",
            "export const dataBucket = new alpha.Bucket({});",
        );

        let result = build(dir.path(), &Config::default(), &serializers(&[]));
        assert!(result.errors.is_empty());
        assert!(!result.warnings.is_empty());
        assert!(!result.outputs.contains_key("alpha"));
    }
}
