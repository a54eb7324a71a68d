//! The static analysis engine (§4.5, §4.6): rule contract, catalog, and
//! the engine that resolves config and executes rules over parsed files.

mod diagnostic;
mod engine;
mod rule;
pub mod rules;

pub use diagnostic::{Diagnostic, Fix, FixKind, FixParams, RuleSeverity, SeverityOrOff};
pub use engine::{apply_text_fixes, write_file_fixes, LintEngine, LintTarget};
pub use rule::{LintContext, LintRule, RuleCategory};
