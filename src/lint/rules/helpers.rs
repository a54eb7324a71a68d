//! Re-exports of the AST-walking helpers shared with [`crate::discovery`].

pub use crate::ast::*;
