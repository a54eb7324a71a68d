//! Serializer Contract (§4.7): the core's main extensibility surface.
//! Concrete lexicon serializers (an AWS CloudFormation encoder, a GitHub
//! Actions encoder, …) are external collaborators per §1's scope cut;
//! this module defines the trait they implement and the one default
//! implementation the core ships for projects that don't need anything
//! fancier than a plain JSON dump.

mod default_serializer;

pub use default_serializer::DefaultSerializer;

use crate::model::{Declarable, LexiconOutput};

/// What a serializer produces: either a single string (most lexicons) or
/// a primary file plus named siblings (multi-file outputs, e.g. a
/// CloudFormation template plus a parameters file).
#[derive(Debug, Clone, PartialEq)]
pub enum SerializedArtifact {
    Single(String),
    Multi {
        primary: String,
        files: std::collections::BTreeMap<String, String>,
    },
}

impl SerializedArtifact {
    pub fn primary(&self) -> &str {
        match self {
            SerializedArtifact::Single(s) => s,
            SerializedArtifact::Multi { primary, .. } => primary,
        }
    }
}

/// A pluggable per-lexicon encoder (§4.7). Preconditions the build driver
/// guarantees before calling `serialize`:
/// - `entities` is already partitioned to this lexicon only.
/// - Property-kind entities are present for inlining.
/// - `outputs` carries every explicit and auto-detected output sourced
///   from this lexicon.
///
/// Implementations MUST be pure with respect to their inputs: no
/// filesystem side effects.
pub trait Serializer: Send + Sync {
    fn name(&self) -> &str;

    fn rule_prefix(&self) -> &str;

    fn serialize(
        &self,
        entities: &indexmap::IndexMap<String, Declarable>,
        outputs: &[LexiconOutput],
    ) -> SerializedArtifact;

    /// Project an output's value into whatever shape a *consuming*
    /// lexicon's template embeds it as (e.g. a CloudFormation `Fn::ImportValue`
    /// intrinsic). `None` means this serializer has no special
    /// cross-reference encoding and the raw output name should be used.
    fn serialize_cross_ref(&self, _output: &LexiconOutput) -> Option<serde_json::Value> {
        None
    }
}
