use std::collections::HashSet;

use swc_common::SourceMap;
use swc_ecma_ast::Module;

use super::diagnostic::{Diagnostic, RuleSeverity};

/// The four families the catalog groups rules into (§4.6 header row).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleCategory {
    Structural,
    Evaluability,
    Style,
    Correctness,
}

/// Everything a rule's `check` may consult (§4.5 "Rule contract"):
/// the parsed AST, the file path, an optional entities view, a lexicon
/// tag, an optional project barrel-exports set, and an optional project
/// scan. Only `module`/`file_path`/`source_map` are guaranteed present;
/// the rest are `None` when the caller runs the engine file-locally
/// (e.g. from an editor integration that hasn't done full discovery).
pub struct LintContext<'a> {
    pub module: &'a Module,
    pub file_path: &'a str,
    pub source_map: &'a SourceMap,
    pub lexicon: Option<&'a str>,
    pub barrel_exports: Option<&'a HashSet<String>>,
    pub project_scan: Option<&'a HashSet<String>>,
}

impl<'a> LintContext<'a> {
    pub fn new(module: &'a Module, file_path: &'a str, source_map: &'a SourceMap) -> Self {
        Self {
            module,
            file_path,
            source_map,
            lexicon: None,
            barrel_exports: None,
            project_scan: None,
        }
    }

    pub fn with_lexicon(mut self, lexicon: &'a str) -> Self {
        self.lexicon = Some(lexicon);
        self
    }

    pub fn with_barrel_exports(mut self, exports: &'a HashSet<String>) -> Self {
        self.barrel_exports = Some(exports);
        self
    }

    /// Translate a byte offset from the parser's span into 1-based
    /// `(line, column)`, per the diagnostic contract (§6).
    pub fn line_col(&self, byte_pos: swc_common::BytePos) -> (u32, u32) {
        let loc = self.source_map.lookup_char_pos(byte_pos);
        (loc.line as u32, loc.col.0 as u32 + 1)
    }
}

/// A single lint rule (§4.5 "Rule contract"): `{id, defaultSeverity,
/// category, check(ctx, options?) → [Diagnostic]}`.
pub trait LintRule: Send + Sync {
    fn id(&self) -> &'static str;

    fn default_severity(&self) -> RuleSeverity;

    fn category(&self) -> RuleCategory;

    /// `options` is whatever JSON value followed the severity in the
    /// config entry (`["warn", { "max": 4 }]`); rules that take no
    /// options ignore it.
    fn check(&self, ctx: &LintContext<'_>, options: Option<&serde_json::Value>) -> Vec<Diagnostic>;
}
