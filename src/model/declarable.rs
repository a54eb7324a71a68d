use super::{AttrRef, LexiconOutput};
use super::entity_graph::EntityId;

/// The closed sum of declarable shapes the core understands natively, per
/// the "runtime reflection → typed variants" design note: `has a props
/// field` / `implements Declarable` checks in the source language become
/// an explicit tag here instead of a runtime marker lookup.
///
/// `Plugin` is the open extension escape for lexicon-defined kinds the
/// core has no opinion about; it still carries the declarable marker (by
/// virtue of being a `Declarable` at all) but the driver never special-
/// cases it the way it special-cases `ChildProject` or `LexiconOutput`.
#[derive(Debug, Clone, PartialEq)]
pub enum DeclarableKind {
    Resource,
    Property,
    /// A stack export declared directly by user code (as opposed to one
    /// synthesised by cross-lexicon auto-detection).
    StackOutput,
    ChildProject {
        /// Directory of the nested project, relative to the declaring
        /// file unless absolute.
        path: String,
        /// Filled in once the child has been recursively built (§4.3
        /// step 3). `None` until then, and left `None` on recursion
        /// failure.
        build_result: Option<Box<crate::build::BuildResult>>,
    },
    LexiconOutput(LexiconOutput),
    Plugin(String),
}

/// A value appearing in a declarable's attribute tree (§3: "Arbitrary
/// user-supplied attributes, which may themselves be declarables,
/// attribute references, intrinsics, or primitives").
///
/// `Object` is a `Vec<(String, AttrValue)>` rather than a map: attribute
/// trees are small, read far more than they're looked up by key, and
/// preserving literal declaration order matters for diagnostics that
/// point at "the inner object's start position" (§8 scenario 7).
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    /// A direct reference to another declarable by identity (e.g.
    /// `{ bucket: dataBucket }` where `dataBucket` is itself an exported
    /// declarable, not one of its attributes).
    EntityRef(EntityId),
    /// A symbolic attribute reference produced by accessing an intrinsic
    /// attribute of a declared entity (e.g. `bucket.arn`).
    AttrRef(AttrRef),
    List(Vec<AttrValue>),
    Object(Vec<(String, AttrValue)>),
}

impl AttrValue {
    pub fn as_object(&self) -> Option<&[(String, AttrValue)]> {
        match self {
            AttrValue::Object(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[AttrValue]> {
        match self {
            AttrValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::String(s) => Some(s),
            _ => None,
        }
    }
}

/// The primitive unit of the data model (§3). A `Declarable` is discovered
/// at module scope during [`crate::discovery`] and becomes frozen for the
/// duration of the build (§3 "Lifecycle").
#[derive(Debug, Clone, PartialEq)]
pub struct Declarable {
    pub lexicon: String,
    pub entity_type: String,
    pub kind: DeclarableKind,
    /// Declaration order is preserved for the same reason `AttrValue::Object`
    /// preserves it: diagnostics and the flat-declarations rule need to
    /// point at specific attributes by position.
    pub attrs: Vec<(String, AttrValue)>,
    /// Byte offset of the declaration's initializer in its source file,
    /// used by lint rules to anchor diagnostics (e.g. COR001 pointing "at
    /// the inner object's start position").
    pub span_lo: u32,
    pub span_hi: u32,
}

impl Declarable {
    pub fn new(
        _name: impl Into<String>,
        lexicon: impl Into<String>,
        entity_type: impl Into<String>,
        kind: DeclarableKind,
    ) -> Self {
        Self {
            lexicon: lexicon.into(),
            entity_type: entity_type.into(),
            kind,
            attrs: Vec::new(),
            span_lo: 0,
            span_hi: 0,
        }
    }

    pub fn is_property(&self) -> bool {
        matches!(self.kind, DeclarableKind::Property)
    }

    pub fn is_child_project(&self) -> bool {
        matches!(self.kind, DeclarableKind::ChildProject { .. })
    }

    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attr_lookup_returns_first_match() {
        let mut d = Declarable::new("dataBucket", "aws", "AWS::S3::Bucket", DeclarableKind::Resource);
        d.attrs.push(("encryption".to_string(), AttrValue::String("AES256".to_string())));
        assert_eq!(d.attr("encryption").and_then(AttrValue::as_str), Some("AES256"));
        assert_eq!(d.attr("missing"), None);
    }

    #[test]
    fn property_and_child_project_predicates() {
        let prop = Declarable::new("cfg", "aws", "AWS::S3::BucketEncryption", DeclarableKind::Property);
        assert!(prop.is_property());
        assert!(!prop.is_child_project());

        let child = Declarable::new(
            "nested",
            "aws",
            "chant::ChildProject",
            DeclarableKind::ChildProject { path: "./nested".into(), build_result: None },
        );
        assert!(child.is_child_project());
    }
}
