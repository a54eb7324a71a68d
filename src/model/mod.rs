//! The data model shared by every other component: [`Declarable`],
//! [`AttrRef`], [`LexiconOutput`], [`EntityGraph`] (§3).

mod attr_ref;
mod declarable;
mod entity_graph;
mod lexicon_output;

pub use attr_ref::AttrRef;
pub use declarable::{AttrValue, Declarable, DeclarableKind};
pub use entity_graph::{EntityGraph, EntityId};
pub use lexicon_output::LexiconOutput;
