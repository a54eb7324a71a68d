use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde_json::{json, Value};

use crate::model::{AttrValue, Declarable, DeclarableKind, LexiconOutput};

use super::{SerializedArtifact, Serializer};

/// Plain JSON dump of a lexicon's partition: every resource-kind entity
/// keyed by name, property-kind entities inlined into their referencing
/// resource's attributes (they have no standalone representation), and
/// outputs listed under `"Outputs"`. Concrete lexicon plugins (AWS,
/// GitHub, …) are expected to provide a richer serializer; this one
/// exists so a project with no lexicon plugins configured still produces
/// a deterministic, inspectable artifact.
pub struct DefaultSerializer {
    name: String,
}

impl DefaultSerializer {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

fn attr_value_to_json(value: &AttrValue) -> Value {
    match value {
        AttrValue::Null => Value::Null,
        AttrValue::Bool(b) => json!(b),
        AttrValue::Number(n) => json!(n),
        AttrValue::String(s) => json!(s),
        AttrValue::EntityRef(_) => json!({ "Ref": "<entity>" }),
        AttrValue::AttrRef(attr_ref) => json!({ "GetAtt": attr_ref.attribute }),
        AttrValue::List(items) => Value::Array(items.iter().map(attr_value_to_json).collect()),
        AttrValue::Object(fields) => {
            let mut map = serde_json::Map::new();
            for (key, value) in fields {
                map.insert(key.clone(), attr_value_to_json(value));
            }
            Value::Object(map)
        }
    }
}

impl Serializer for DefaultSerializer {
    fn name(&self) -> &str {
        &self.name
    }

    fn rule_prefix(&self) -> &str {
        "DFT"
    }

    fn serialize(&self, entities: &IndexMap<String, Declarable>, outputs: &[LexiconOutput]) -> SerializedArtifact {
        let mut resources = BTreeMap::new();
        for (name, declarable) in entities {
            if matches!(declarable.kind, DeclarableKind::Property) {
                continue;
            }
            let mut attrs = serde_json::Map::new();
            for (key, value) in &declarable.attrs {
                attrs.insert(key.clone(), attr_value_to_json(value));
            }
            resources.insert(
                name.clone(),
                json!({
                    "Type": declarable.entity_type,
                    "Properties": attrs,
                }),
            );
        }

        let mut output_section = BTreeMap::new();
        for output in outputs {
            output_section.insert(
                output.output_name.clone(),
                json!({ "Value": { "Fn::GetAtt": [output.source_attribute] } }),
            );
        }

        let document = json!({
            "Resources": resources,
            "Outputs": output_section,
        });

        SerializedArtifact::Single(
            serde_json::to_string_pretty(&document).unwrap_or_else(|_| "{}".to_string()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EntityGraph;

    #[test]
    fn serializes_resources_and_omits_property_kind_entities() {
        let mut graph = EntityGraph::new();
        graph.insert_entity(
            "dataBucket".into(),
            Declarable::new("dataBucket", "aws", "AWS::S3::Bucket", DeclarableKind::Resource),
        );
        graph.insert_entity(
            "encryptionCfg".into(),
            Declarable::new("encryptionCfg", "aws", "AWS::S3::BucketEncryption", DeclarableKind::Property),
        );

        let serializer = DefaultSerializer::new("aws");
        let artifact = serializer.serialize(&graph.entities, &[]);
        let rendered = artifact.primary();
        assert!(rendered.contains("dataBucket"));
        assert!(!rendered.contains("encryptionCfg"));
    }
}
