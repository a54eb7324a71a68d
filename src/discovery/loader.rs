use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::ast::{as_new_expr, callee_ident_name};
use crate::config::Config;
use crate::error::DiscoveryError;
use crate::model::{AttrValue, Declarable, DeclarableKind, EntityGraph};

use super::barrel::{declared_export_names, references_barrel, Barrel};
use super::eval::eval_expr;
use super::parser::{parse_source, ParsedSource};
use super::scanner::scan_eligible_files;

/// Per-file intermediate state kept across the two-pass + barrel-replay
/// protocol (§4.1 "Load protocol").
struct LoadedFile {
    path: PathBuf,
    relative_path: String,
    source: String,
    parsed: ParsedSource,
}

/// Run discovery over `root`, producing the project's [`EntityGraph`]
/// (§4.1). See [`super::eval`] for why "loading a module" here means
/// statically interpreting its top-level const declarations rather than
/// executing arbitrary code.
pub fn discover(root: &Path, config: &Config) -> EntityGraph {
    let mut graph = EntityGraph::new();
    let files = scan_eligible_files(root, config);

    let mut loaded = Vec::new();
    for path in &files {
        let relative_path = path
            .strip_prefix(root)
            .unwrap_or(path)
            .to_string_lossy()
            .to_string();
        let source = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                graph.record_error(DiscoveryError::with_cause(
                    &relative_path,
                    "failed to read source file",
                    e,
                ));
                continue;
            }
        };
        match parse_source(&relative_path, source.clone()) {
            Ok(parsed) => {
                loaded.push(LoadedFile {
                    path: path.clone(),
                    relative_path,
                    source,
                    parsed,
                });
            }
            Err(err) => graph.record_error(err),
        }
    }

    // A ChildProject's own subdirectory is an independent project (§4.3
    // step 3), discovered and built in its own recursive call. Exclude it
    // from this project's scan so the same declarables aren't picked up
    // twice — once here, once by the recursive child build.
    let child_project_dirs = detect_child_project_dirs(root, &loaded);
    loaded.retain(|file| !is_under_any(&file.path, &child_project_dirs));

    for file in &loaded {
        graph.source_files.push(file.relative_path.clone());
    }

    // First pass (§4.1 step 2): attempt every file in lexicographic order.
    let mut pending: Vec<usize> = Vec::new();
    for (index, file) in loaded.iter().enumerate() {
        if !try_load_file(file, &mut graph) {
            pending.push(index);
        }
    }

    // Retry pass (§4.1 step 3): dependencies discovered in the first pass
    // may now resolve what failed before. A stable identity is reserved for
    // every still-pending declarable before retrying, so two declarables
    // that mutually reference each other (a two-entity cycle) resolve to
    // real EntityRefs on both sides instead of only ever forming one
    // direction of the edge depending on load order. Anything still
    // unresolved after this retry is an unresolvable reference, not a
    // transient ordering issue, and becomes a DiscoveryError.
    reserve_pending_identities(&pending, &loaded, &mut graph);
    for index in pending {
        let file = &loaded[index];
        if !try_load_file(file, &mut graph) {
            graph.record_error(DiscoveryError::new(
                &file.relative_path,
                "file references an identifier that never resolves to a known declarable",
            ));
        }
    }

    // Barrel-ref second pass (§4.1 step 4): files that textually reference
    // the barrel are re-executed so their values overwrite the earlier
    // (possibly stale) ones, while every other file keeps its original
    // identity.
    for file in &loaded {
        if references_barrel(&file.source) {
            try_load_file(file, &mut graph);
        }
    }

    extract_dependencies(&mut graph);
    graph
}

/// Build a [`Barrel`] of every declarable-carrying export across `root`,
/// independent of any single `discover` call — used by callers (and the
/// `stale-barrel-types`/`unresolvable-barrel-ref` rules) that need the
/// barrel's exported-names view without running a full build.
pub fn collect_barrel_exports(root: &Path, config: &Config) -> Barrel {
    let mut barrel = Barrel::new();
    for path in scan_eligible_files(root, config) {
        let Ok(source) = fs::read_to_string(&path) else {
            continue;
        };
        let relative_path = path.strip_prefix(root).unwrap_or(&path).to_string_lossy().to_string();
        if let Ok(parsed) = parse_source(&relative_path, source) {
            for name in declared_export_names(&parsed.module) {
                barrel.insert(name);
            }
        }
    }
    barrel
}

/// Process one file's top-level const declarations, inserting every
/// declarable-shaped one into `graph`. Returns `false` when the file
/// references an identifier not yet known and textually depends on the
/// barrel — signalling "load throws", per §4.1 step 2 — so the caller can
/// retry it later.
fn try_load_file(file: &LoadedFile, graph: &mut EntityGraph) -> bool {
    let consts = crate::ast::top_level_consts(&file.parsed.module);
    let mut ready = true;

    for item in &consts {
        if !item.exported {
            continue;
        }
        let Some(kind) = classify(item.init) else {
            continue;
        };

        // Only the constructor's *arguments* can reference another
        // declarable; the callee itself (e.g. `aws` in `new aws.Bucket`)
        // names a lexicon/type, not an entity, and must not be treated as
        // an unresolved dependency.
        let mut referenced = Vec::new();
        if let Some(new_expr) = as_new_expr(item.init) {
            for arg in new_expr.args.iter().flatten() {
                crate::ast::collect_idents(&arg.expr, &mut referenced);
            }
        }
        let unresolved = referenced
            .iter()
            .any(|name| !graph.entities.contains_key(name) && name.as_str() != item.name);
        if unresolved && graph.entity_id(item.name).is_none() {
            ready = false;
            continue;
        }

        let (lexicon, entity_type) = as_new_expr(item.init)
            .map(|new_expr| callee_type_info(&new_expr.callee))
            .unwrap_or_else(|| ("local".to_string(), "Unknown".to_string()));
        let mut declarable = Declarable::new(item.name, lexicon, entity_type, kind);
        if let Some(new_expr) = as_new_expr(item.init) {
            if let Some(first_arg) = new_expr.args.as_ref().and_then(|args| args.first()) {
                if let AttrValue::Object(fields) = eval_expr(&first_arg.expr, graph) {
                    declarable.attrs = fields;
                }
            }
        }
        let declared_path = declarable.attr("path").and_then(AttrValue::as_str).map(str::to_string);
        if let (DeclarableKind::ChildProject { path, .. }, Some(declared_path)) = (&mut declarable.kind, declared_path) {
            *path = declared_path;
        }
        declarable.span_lo = item.span.lo.0;
        declarable.span_hi = item.span.hi.0;

        graph.insert_entity(item.name.to_string(), declarable);
    }

    ready
}

/// Reserve a stable [`crate::model::EntityId`] for every still-pending
/// declarable that some *other* still-pending declarable actually
/// references, ahead of the retry pass. This is what lets two mutually
/// referencing declarables (a two-entity cycle) resolve to real
/// `EntityRef`s on both sides instead of only ever forming one direction of
/// the edge depending on load order.
///
/// Reservation is scoped to names another pending item references (rather
/// than every pending name unconditionally) so that a declarable whose
/// reference genuinely never resolves — nothing else depends on it, it
/// just names something that doesn't exist — doesn't leave behind an empty
/// stub entity once its own load is reported as a [`DiscoveryError`].
///
/// `EntityGraph::insert_entity` overwrites in place by key, so a
/// placeholder's id survives being replaced with the real declarable once
/// its attrs are evaluated.
fn reserve_pending_identities(indices: &[usize], loaded: &[LoadedFile], graph: &mut EntityGraph) {
    let mut referenced_by_pending: std::collections::HashSet<String> = std::collections::HashSet::new();
    for &index in indices {
        let file = &loaded[index];
        for item in crate::ast::top_level_consts(&file.parsed.module) {
            if !item.exported || classify(item.init).is_none() {
                continue;
            }
            if let Some(new_expr) = as_new_expr(item.init) {
                for arg in new_expr.args.iter().flatten() {
                    let mut idents = Vec::new();
                    crate::ast::collect_idents(&arg.expr, &mut idents);
                    referenced_by_pending.extend(idents);
                }
            }
        }
    }

    for &index in indices {
        let file = &loaded[index];
        for item in crate::ast::top_level_consts(&file.parsed.module) {
            if !item.exported
                || graph.entities.contains_key(item.name)
                || !referenced_by_pending.contains(item.name)
            {
                continue;
            }
            let Some(kind) = classify(item.init) else {
                continue;
            };
            let (lexicon, entity_type) = as_new_expr(item.init)
                .map(|new_expr| callee_type_info(&new_expr.callee))
                .unwrap_or_else(|| ("local".to_string(), "Unknown".to_string()));
            graph.insert_entity(item.name.to_string(), Declarable::new(item.name, lexicon, entity_type, kind));
        }
    }
}

/// Find every declared `ChildProject`'s resolved directory across `loaded`,
/// without relying on the full load protocol (dependency resolution isn't
/// needed to read a `path` literal). Used to exclude a child project's own
/// files from the *parent's* scan before discovery proper runs.
fn detect_child_project_dirs(root: &Path, loaded: &[LoadedFile]) -> Vec<PathBuf> {
    let empty_graph = EntityGraph::new();
    let mut dirs = Vec::new();

    for file in loaded {
        for item in crate::ast::top_level_consts(&file.parsed.module) {
            if !item.exported {
                continue;
            }
            if !matches!(classify(item.init), Some(DeclarableKind::ChildProject { .. })) {
                continue;
            }
            let Some(new_expr) = as_new_expr(item.init) else {
                continue;
            };
            let Some(first_arg) = new_expr.args.as_ref().and_then(|args| args.first()) else {
                continue;
            };
            let AttrValue::Object(fields) = eval_expr(&first_arg.expr, &empty_graph) else {
                continue;
            };
            if let Some(path) = fields.iter().find(|(k, _)| k == "path").and_then(|(_, v)| v.as_str()) {
                dirs.push(resolve_relative(root, path));
            }
        }
    }
    dirs
}

fn resolve_relative(root: &Path, child_path: &str) -> PathBuf {
    let candidate = Path::new(child_path);
    let joined = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        root.join(candidate)
    };
    normalize(&joined)
}

/// Lexically collapse `.`/`..` components without touching the filesystem
/// (unlike `canonicalize`, this doesn't require the path to exist yet).
fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            std::path::Component::CurDir => {}
            std::path::Component::ParentDir => {
                result.pop();
            }
            other => result.push(other.as_os_str()),
        }
    }
    result
}

fn is_under_any(path: &Path, dirs: &[PathBuf]) -> bool {
    let path = normalize(path);
    dirs.iter().any(|dir| path.starts_with(dir))
}

/// Derive `(lexicon, entityType)` from a `new` callee: `new aws.Bucket(...)`
/// is lexicon `"aws"`, type `"Bucket"`; a bare `new Bucket(...)` (no
/// namespace import) is lexicon `"local"`.
fn callee_type_info(callee: &swc_ecma_ast::Expr) -> (String, String) {
    match callee {
        swc_ecma_ast::Expr::Member(member) => {
            let lexicon = match member.obj.as_ref() {
                swc_ecma_ast::Expr::Ident(ident) => ident.sym.as_ref().to_string(),
                _ => "local".to_string(),
            };
            let entity_type = match &member.prop {
                swc_ecma_ast::MemberProp::Ident(prop) => prop.sym.as_ref().to_string(),
                _ => "Unknown".to_string(),
            };
            (lexicon, entity_type)
        }
        swc_ecma_ast::Expr::Ident(ident) => ("local".to_string(), ident.sym.as_ref().to_string()),
        _ => ("local".to_string(), "Unknown".to_string()),
    }
}

/// Classify a top-level const's initializer as a declarable kind, or
/// `None` if it isn't declarable at all (an ordinary constant).
fn classify(init: &swc_ecma_ast::Expr) -> Option<DeclarableKind> {
    let new_expr = as_new_expr(init)?;
    let type_name = callee_ident_name(&swc_ecma_ast::Callee::Expr(new_expr.callee.clone()))?;
    if type_name.ends_with("ChildProject") {
        return Some(DeclarableKind::ChildProject {
            path: String::new(),
            build_result: None,
        });
    }
    Some(DeclarableKind::Resource)
}

/// Walk every entity's attribute tree, recording `EntityRef`/`AttrRef`
/// targets as dependencies (§4.1 "Dependency extraction").
fn extract_dependencies(graph: &mut EntityGraph) {
    let snapshot: HashMap<String, Vec<(String, AttrValue)>> = graph
        .entities
        .iter()
        .map(|(name, d)| (name.clone(), d.attrs.clone()))
        .collect();

    for (name, attrs) in snapshot {
        let mut seen = std::collections::HashSet::new();
        for (_, value) in &attrs {
            walk_attr_value(value, graph, &name, &mut seen);
        }
    }
}

fn walk_attr_value(
    value: &AttrValue,
    graph: &mut EntityGraph,
    owner: &str,
    seen: &mut std::collections::HashSet<String>,
) {
    match value {
        AttrValue::EntityRef(id) => {
            if let Some(target_name) = graph.entity_name(*id) {
                if seen.insert(target_name.to_string()) {
                    graph.add_dependency(owner, target_name.to_string());
                }
            }
        }
        AttrValue::AttrRef(attr_ref) => {
            if let Some(target_name) = graph.entity_name(attr_ref.parent) {
                if seen.insert(target_name.to_string()) {
                    graph.add_dependency(owner, target_name.to_string());
                }
            }
        }
        AttrValue::List(items) => {
            for item in items {
                walk_attr_value(item, graph, owner, seen);
            }
        }
        AttrValue::Object(fields) => {
            for (_, field) in fields {
                walk_attr_value(field, graph, owner, seen);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write(dir: &Path, relative: &str, content: &str) {
        let path = dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn discovers_entities_and_their_dependencies() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "a.chant.ts",
            "export const dataBucket = new Bucket({ name: \"data\" });",
        );
        write(
            dir.path(),
            "b.chant.ts",
            "export const grant = new Grant({ target: dataBucket });",
        );

        let graph = discover(dir.path(), &Config::default());
        assert!(graph.errors.is_empty());
        assert!(graph.entity_id("dataBucket").is_some());
        assert!(graph.entity_id("grant").is_some());
        assert!(graph.dependencies["grant"].contains("dataBucket"));
    }

    #[test]
    fn empty_project_has_no_entities_or_errors() {
        let dir = tempdir().unwrap();
        let graph = discover(dir.path(), &Config::default());
        assert!(graph.entities.is_empty());
        assert!(graph.errors.is_empty());
    }

    #[test]
    fn mutually_referencing_entities_both_resolve_and_record_each_others_dependency() {
        let dir = tempdir().unwrap();
        write(dir.path(), "a.chant.ts", "export const a = new Grant({ target: b });");
        write(dir.path(), "b.chant.ts", "export const b = new Grant({ target: a });");

        let graph = discover(dir.path(), &Config::default());
        assert!(graph.errors.is_empty());
        assert!(graph.dependencies["a"].contains("b"));
        assert!(graph.dependencies["b"].contains("a"));
    }

    #[test]
    fn plain_forward_reference_without_barrel_syntax_still_resolves_after_retry() {
        let dir = tempdir().unwrap();
        write(dir.path(), "a.chant.ts", "export const grant = new Grant({ target: dataBucket });");
        write(dir.path(), "b.chant.ts", "export const dataBucket = new Bucket({});");

        let graph = discover(dir.path(), &Config::default());
        assert!(graph.errors.is_empty());
        assert!(graph.dependencies["grant"].contains("dataBucket"));
    }

    #[test]
    fn unresolvable_identifier_becomes_a_discovery_error() {
        let dir = tempdir().unwrap();
        write(dir.path(), "a.chant.ts", "export const grant = new Grant({ target: neverDeclared });");

        let graph = discover(dir.path(), &Config::default());
        assert_eq!(graph.errors.len(), 1);
        assert!(graph.entity_id("grant").is_none());
    }

    #[test]
    fn syntax_error_is_recorded_without_aborting_other_files() {
        let dir = tempdir().unwrap();
        write(dir.path(), "broken.chant.ts", "export const x = ;");
        write(
            dir.path(),
            "good.chant.ts",
            "export const dataBucket = new Bucket({});",
        );

        let graph = discover(dir.path(), &Config::default());
        assert_eq!(graph.errors.len(), 1);
        assert!(graph.entity_id("dataBucket").is_some());
    }
}
