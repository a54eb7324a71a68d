use indexmap::{IndexMap, IndexSet};

use super::Declarable;
use crate::error::DiscoveryError;

/// A stable index into an [`EntityGraph`]'s entity arena.
///
/// Per the "weak references for AttrRef parents" design note: in a
/// language without GC-based weak references, an `AttrRef` stores an
/// `EntityId` rather than a pointer. The arena (the `entities` map) owns
/// the `Declarable`s for the duration of the build; dereferencing an
/// `EntityId` is a lookup that may simply fail to find the slot, which is
/// exactly what a dead weak reference would do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub(crate) u32);

/// The per-project output of discovery (§3 "Entity Graph").
///
/// `entities` and `dependencies` are `IndexMap`/`IndexSet` rather than the
/// standard hash collections specifically because §4.3's determinism
/// requirement ("All maps/sets are iterated in insertion order") and §5's
/// ordering guarantees ("Entity discovery order = deterministic file-name
/// order, then module-export iteration order") both depend on iteration
/// replaying insertion order, not hash order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityGraph {
    pub entities: IndexMap<String, Declarable>,
    pub dependencies: IndexMap<String, IndexSet<String>>,
    pub source_files: Vec<String>,
    pub errors: Vec<DiscoveryError>,
}

impl EntityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entity_id(&self, name: &str) -> Option<EntityId> {
        self.entities.get_index_of(name).map(|i| EntityId(i as u32))
    }

    pub fn entity_by_id(&self, id: EntityId) -> Option<(&str, &Declarable)> {
        self.entities
            .get_index(id.0 as usize)
            .map(|(name, d)| (name.as_str(), d))
    }

    pub fn entity_name(&self, id: EntityId) -> Option<&str> {
        self.entities.get_index(id.0 as usize).map(|(name, _)| name.as_str())
    }

    /// Insert or overwrite a discovered entity, recording its `EntityId`.
    ///
    /// Overwriting is legal and expected: the barrel-replay second pass
    /// (§4.1) re-executes files that depend on the barrel and their
    /// exports overwrite the first-pass values under the same key.
    pub fn insert_entity(&mut self, name: String, declarable: Declarable) -> EntityId {
        let (index, _) = self.entities.insert_full(name, declarable);
        EntityId(index as u32)
    }

    pub fn add_dependency(&mut self, from: &str, to: impl Into<String>) {
        self.dependencies
            .entry(from.to_string())
            .or_default()
            .insert(to.into());
    }

    pub fn record_error(&mut self, error: DiscoveryError) {
        self.errors.push(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AttrValue, Declarable, DeclarableKind};

    fn sample(name: &str) -> Declarable {
        Declarable::new(name, "alpha", "Alpha::Bucket", DeclarableKind::Resource)
    }

    #[test]
    fn entity_id_roundtrips_through_name() {
        let mut graph = EntityGraph::new();
        let id = graph.insert_entity("dataBucket".into(), sample("dataBucket"));
        assert_eq!(graph.entity_name(id), Some("dataBucket"));
        assert_eq!(graph.entity_id("dataBucket"), Some(id));
        assert_eq!(graph.entity_id("missing"), None);
    }

    #[test]
    fn overwrite_preserves_key_but_reindexes_value() {
        let mut graph = EntityGraph::new();
        graph.insert_entity("dataBucket".into(), sample("dataBucket"));
        let mut replacement = sample("dataBucket");
        replacement
            .attrs
            .push(("retryCount".to_string(), AttrValue::Number(3.0)));
        graph.insert_entity("dataBucket".into(), replacement);

        assert_eq!(graph.entities.len(), 1);
        assert_eq!(
            graph.entities.get("dataBucket").unwrap().attrs[0].0,
            "retryCount"
        );
    }

    #[test]
    fn dependencies_preserve_insertion_order() {
        let mut graph = EntityGraph::new();
        graph.add_dependency("c", "a");
        graph.add_dependency("c", "b");
        let deps: Vec<_> = graph.dependencies["c"].iter().cloned().collect();
        assert_eq!(deps, vec!["a".to_string(), "b".to_string()]);
    }
}
