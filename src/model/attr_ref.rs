use super::entity_graph::EntityId;

/// A symbolic reference to an attribute of another declarable (§3: "symbol
/// references produced when code accesses a property of an entity, e.g.
/// `bucket.arn`").
///
/// `parent` is an [`EntityId`] rather than a reference or `Rc` because the
/// referenced declarable may not have finished discovery yet (barrel
/// replay can reorder which file's export wins) and because the core has
/// no garbage collector to make a cyclic owning structure safe; see the
/// arena note on [`super::EntityGraph`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttrRef {
    pub parent: EntityId,
    pub attribute: String,
}

impl AttrRef {
    pub fn new(parent: EntityId, attribute: impl Into<String>) -> Self {
        Self {
            parent,
            attribute: attribute.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EntityGraph;

    #[test]
    fn equal_refs_compare_equal_regardless_of_attribute_string_source() {
        let mut graph = EntityGraph::new();
        let id = graph.insert_entity(
            "dataBucket".into(),
            crate::model::Declarable::new(
                "dataBucket",
                "aws",
                "Alpha::Bucket",
                crate::model::DeclarableKind::Resource,
            ),
        );
        let a = AttrRef::new(id, "arn");
        let b = AttrRef::new(id, String::from("arn"));
        assert_eq!(a, b);
    }
}
