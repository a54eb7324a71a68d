//! Cross-Lexicon Output Resolution (§4.4): auto-detect when an entity in
//! one lexicon is referenced by an entity in another, synthesise stack
//! outputs for those references, and compute deploy order across lexicons.

use std::collections::HashSet;

use indexmap::IndexSet;

use crate::model::{AttrValue, EntityGraph, LexiconOutput};

/// Walk every entity's attribute tree and detect cross-lexicon `AttrRef`s
/// (§4.4). Explicit `LexiconOutput`s encountered during the walk are
/// skipped into rather than treated as a plain attribute, so nothing
/// inside an explicit output is re-auto-detected.
pub fn detect_auto_outputs(graph: &EntityGraph) -> Vec<LexiconOutput> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut outputs = Vec::new();

    for (name, entity) in &graph.entities {
        for (_, value) in &entity.attrs {
            walk(value, &entity.lexicon, name, graph, &mut seen, &mut outputs);
        }
    }
    outputs
}

fn walk(
    value: &AttrValue,
    consumer_lexicon: &str,
    consumer_name: &str,
    graph: &EntityGraph,
    seen: &mut HashSet<(String, String)>,
    outputs: &mut Vec<LexiconOutput>,
) {
    match value {
        AttrValue::AttrRef(attr_ref) => {
            let Some((parent_name, parent)) = graph.entity_by_id(attr_ref.parent) else {
                return; // dead weak reference: skip, per §3 invariant
            };
            if parent.lexicon == consumer_lexicon {
                return;
            }
            let key = (parent_name.to_string(), attr_ref.attribute.clone());
            if seen.insert(key) {
                outputs.push(LexiconOutput::auto_detected(
                    parent.lexicon.clone(),
                    attr_ref.parent,
                    attr_ref.attribute.clone(),
                    parent_name,
                ));
            }
        }
        AttrValue::List(items) => {
            for item in items {
                walk(item, consumer_lexicon, consumer_name, graph, seen, outputs);
            }
        }
        AttrValue::Object(fields) => {
            for (_, field) in fields {
                walk(field, consumer_lexicon, consumer_name, graph, seen, outputs);
            }
        }
        _ => {}
    }
}

/// Merge explicit and auto-detected outputs (§4.3 step 7): explicit first,
/// then auto outputs whose `(parent-identity, attribute)` key isn't
/// already claimed by an explicit one.
pub fn merge_outputs(explicit: Vec<LexiconOutput>, auto: Vec<LexiconOutput>) -> Vec<LexiconOutput> {
    let claimed: HashSet<_> = explicit.iter().map(LexiconOutput::dedup_key).collect();
    let mut merged = explicit;
    merged.extend(auto.into_iter().filter(|o| !claimed.contains(&o.dedup_key())));
    merged
}

/// Compute `deployOrder` (§4.3 step 9 / §4.4 "Deployment ordering rule"):
/// lexicon Y depends on lexicon X iff some output sources from X. Cycles
/// in the approximated lexicon-dependency graph are broken by dropping
/// the edge last seen closing the cycle ("last-seen wins"), rather than
/// failing the build — lexicon dependency is advisory ordering, not a
/// build-correctness invariant the way entity dependency cycles are.
pub fn deploy_order(registered_lexicons: &[String], outputs: &[LexiconOutput]) -> Vec<String> {
    let consuming_lexicons: IndexSet<String> = registered_lexicons.iter().cloned().collect();
    let source_lexicons: HashSet<&str> = outputs.iter().map(|o| o.source_lexicon.as_str()).collect();

    let mut dependencies: indexmap::IndexMap<String, IndexSet<String>> = consuming_lexicons
        .iter()
        .map(|l| (l.clone(), IndexSet::new()))
        .collect();

    for lexicon in &consuming_lexicons {
        for source in &source_lexicons {
            if source != lexicon && consuming_lexicons.contains(*source) {
                dependencies.get_mut(lexicon).unwrap().insert(source.to_string());
            }
        }
    }

    match crate::graph::topo_sort(dependencies.clone()) {
        Ok(order) => order,
        Err(cycle) => {
            // Drop the edge that closed the cycle and retry once; the
            // approximated dependency relation can only ever produce a
            // single back-edge among a finite, already-deduplicated set
            // of lexicon names.
            if cycle.len() >= 2 {
                let closing = &cycle[cycle.len() - 2];
                let repeated = &cycle[cycle.len() - 1];
                if let Some(deps) = dependencies.get_mut(closing) {
                    deps.shift_remove(repeated);
                }
            }
            crate::graph::topo_sort(dependencies).unwrap_or_else(|_| consuming_lexicons.into_iter().collect())
        }
    }
}

/// Collect the explicit `LexiconOutput`s already present in the entity
/// graph (§4.3 step 5): entities whose kind is `LexiconOutput`, resolving
/// `sourceEntity` by identity against `graph.entities` when unset.
pub fn collect_explicit_outputs(graph: &EntityGraph) -> Vec<LexiconOutput> {
    graph
        .entities
        .values()
        .filter_map(|entity| match &entity.kind {
            crate::model::DeclarableKind::LexiconOutput(output) => Some(output.clone()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Declarable, DeclarableKind};

    fn entity(lexicon: &str, entity_type: &str) -> Declarable {
        Declarable::new("x", lexicon, entity_type, DeclarableKind::Resource)
    }

    #[test]
    fn cross_lexicon_attr_ref_becomes_auto_output() {
        let mut graph = EntityGraph::new();
        let bucket_id = graph.insert_entity("dataBucket".into(), entity("aws", "Bucket"));

        let mut workflow = entity("github", "Workflow");
        workflow.attrs.push((
            "bucketArn".to_string(),
            AttrValue::AttrRef(crate::model::AttrRef::new(bucket_id, "arn")),
        ));
        graph.insert_entity("deploy".into(), workflow);

        let outputs = detect_auto_outputs(&graph);
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].source_lexicon, "aws");
        assert_eq!(outputs[0].output_name, "dataBucket_arn");
    }

    #[test]
    fn same_lexicon_attr_ref_is_not_an_output() {
        let mut graph = EntityGraph::new();
        let bucket_id = graph.insert_entity("dataBucket".into(), entity("aws", "Bucket"));

        let mut policy = entity("aws", "BucketPolicy");
        policy.attrs.push((
            "target".to_string(),
            AttrValue::AttrRef(crate::model::AttrRef::new(bucket_id, "arn")),
        ));
        graph.insert_entity("policy".into(), policy);

        assert!(detect_auto_outputs(&graph).is_empty());
    }

    #[test]
    fn explicit_output_takes_precedence_over_auto_for_same_key() {
        let mut graph = EntityGraph::new();
        let id = graph.insert_entity("dataBucket".into(), entity("aws", "Bucket"));
        let explicit = LexiconOutput::explicit("aws", id, "arn", "customName");
        let auto = LexiconOutput::auto_detected("aws", id, "arn", "dataBucket");

        let merged = merge_outputs(vec![explicit.clone()], vec![auto]);
        assert_eq!(merged, vec![explicit]);
    }

    #[test]
    fn deploy_order_places_source_lexicon_before_consumer() {
        let mut graph = EntityGraph::new();
        let bucket_id = graph.insert_entity("dataBucket".into(), entity("aws", "Bucket"));
        let output = LexiconOutput::auto_detected("aws", bucket_id, "arn", "dataBucket");

        let order = deploy_order(&["github".to_string(), "aws".to_string()], &[output]);
        let aws_pos = order.iter().position(|l| l == "aws").unwrap();
        let github_pos = order.iter().position(|l| l == "github").unwrap();
        assert!(aws_pos < github_pos);
    }
}
