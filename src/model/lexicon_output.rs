use super::entity_graph::EntityId;

/// A declarable of kind `DeclarableKind::LexiconOutput`: the in-graph
/// representation of a value destined for another lexicon's serialized
/// output, whether the user wrote it explicitly or the cross-lexicon
/// resolver synthesised it during auto-detection (§4.4).
///
/// `source_entity`/`source_attribute` identify the attribute this output
/// republishes; `output_name` is what the destination lexicon's
/// serializer writes it under, defaulting to
/// [`crate::utils::auto_output_name`] when the user didn't name it
/// explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct LexiconOutput {
    pub source_lexicon: String,
    pub source_entity: EntityId,
    pub source_attribute: String,
    pub output_name: String,
    /// `true` when this output was synthesised by auto-detection rather
    /// than declared directly in source; explicit declarations take
    /// precedence over auto-detected ones for the same
    /// `(parent-identity, attribute-name)` key (§4.4 step 3).
    pub auto_detected: bool,
}

impl LexiconOutput {
    pub fn explicit(
        source_lexicon: impl Into<String>,
        source_entity: EntityId,
        source_attribute: impl Into<String>,
        output_name: impl Into<String>,
    ) -> Self {
        Self {
            source_lexicon: source_lexicon.into(),
            source_entity,
            source_attribute: source_attribute.into(),
            output_name: output_name.into(),
            auto_detected: false,
        }
    }

    pub fn auto_detected(
        source_lexicon: impl Into<String>,
        source_entity: EntityId,
        source_attribute: impl Into<String>,
        entity_name: &str,
    ) -> Self {
        let attribute = source_attribute.into();
        let output_name = crate::utils::auto_output_name(entity_name, &attribute);
        Self {
            source_lexicon: source_lexicon.into(),
            source_entity,
            source_attribute: attribute,
            output_name,
            auto_detected: true,
        }
    }

    /// Key used by the cross-lexicon resolver for explicit-over-auto
    /// precedence and deduplication (§4.4 step 3: "`(parent-identity,
    /// attribute-name)`").
    pub fn dedup_key(&self) -> (EntityId, &str) {
        (self.source_entity, self.source_attribute.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Declarable, DeclarableKind, EntityGraph};

    #[test]
    fn explicit_beats_auto_detected_for_same_dedup_key() {
        let mut graph = EntityGraph::new();
        let id = graph.insert_entity(
            "dataBucket".into(),
            Declarable::new("dataBucket", "aws", "Alpha::Bucket", DeclarableKind::Resource),
        );

        let explicit = LexiconOutput::explicit("github", id, "arn", "bucketArn");
        let auto = LexiconOutput::auto_detected("github", id, "arn", "dataBucket");

        assert_eq!(explicit.dedup_key(), auto.dedup_key());
        assert!(!explicit.auto_detected);
        assert!(auto.auto_detected);
    }
}
