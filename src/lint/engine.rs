use std::collections::HashSet;
use std::path::Path;

use rayon::prelude::*;
use swc_common::SourceMap;
use swc_ecma_ast::Module;

use crate::config::{Config, RuleConfigEntry};

use super::diagnostic::{Diagnostic, FixKind};
use super::rule::{LintContext, LintRule};
use super::rules::core_rules;

/// One file queued for linting: its parsed module, path, and the lexicon
/// it belongs to (if the caller has already run discovery).
pub struct LintTarget<'a> {
    pub file_path: &'a str,
    pub module: &'a Module,
    pub source_map: &'a SourceMap,
    pub lexicon: Option<&'a str>,
    pub barrel_exports: Option<&'a HashSet<String>>,
}

/// Orchestrates rule resolution and execution (§4.5 "Configuration
/// resolution" + "Execute every effective rule"). Holds no state across
/// calls to [`LintEngine::run`], per §4.5 "Per-file state": "no state
/// persists between `runLint` calls by contract".
pub struct LintEngine {
    rules: Vec<Box<dyn LintRule>>,
}

impl LintEngine {
    /// Core rules only (§4.5 step 1, layer 1).
    pub fn new() -> Self {
        Self { rules: core_rules() }
    }

    /// Core rules with plugin/lexicon/project-local rules layered on top;
    /// later layers override earlier ones by rule id (§4.5 step 1).
    pub fn with_plugin_rules(plugin_rules: Vec<Box<dyn LintRule>>) -> Self {
        let mut rules = core_rules();
        for plugin_rule in plugin_rules {
            if let Some(slot) = rules.iter().position(|r| r.id() == plugin_rule.id()) {
                rules[slot] = plugin_rule;
            } else {
                rules.push(plugin_rule);
            }
        }
        Self { rules }
    }

    /// Run every effective rule against every target, per §4.5 steps 2-3.
    /// Targets may be linted in parallel (§5: "Lint of many files MAY
    /// proceed in parallel"); diagnostics are then restored to file-visit
    /// order to honor the ordering guarantee of §5.
    pub fn run(&self, config: &Config, targets: &[LintTarget<'_>]) -> Vec<Diagnostic> {
        targets
            .par_iter()
            .map(|target| self.run_one(config, target))
            .collect::<Vec<_>>()
            .into_iter()
            .flatten()
            .collect()
    }

    fn run_one(&self, config: &Config, target: &LintTarget<'_>) -> Vec<Diagnostic> {
        let relative_path = target.file_path;
        let effective = config.effective_rules(relative_path);

        let ctx = {
            let mut ctx = LintContext::new(target.module, target.file_path, target.source_map);
            if let Some(lexicon) = target.lexicon {
                ctx = ctx.with_lexicon(lexicon);
            }
            if let Some(exports) = target.barrel_exports {
                ctx = ctx.with_barrel_exports(exports);
            }
            ctx
        };

        let mut diagnostics = Vec::new();
        for rule in &self.rules {
            let entry = effective.get(rule.id());
            if matches!(entry, Some(e) if e.is_off()) {
                continue;
            }
            let severity = entry
                .and_then(RuleConfigEntry::severity)
                .unwrap_or_else(|| rule.default_severity());
            let options = entry.and_then(RuleConfigEntry::options);

            // A throwing rule (most plausibly a plugin/lexicon-contributed
            // one, per config.plugins) must not take the rest of the
            // catalog down with it (§7): contain the panic and report it as
            // a single synthetic diagnostic for that rule instead.
            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| rule.check(&ctx, options)));
            match outcome {
                Ok(produced) => {
                    for mut diagnostic in produced {
                        diagnostic.severity = severity;
                        diagnostics.push(diagnostic);
                    }
                }
                Err(payload) => {
                    let message = panic_message(&payload);
                    diagnostics.push(Diagnostic::new(
                        relative_path,
                        1,
                        1,
                        rule.id(),
                        super::diagnostic::RuleSeverity::Error,
                        format!("rule panicked: {message}"),
                    ));
                }
            }
        }
        diagnostics
    }
}

impl Default for LintEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Apply every `text-edit`/`write-file` fix attached to `diagnostics` for a
/// single file's source text (§4.5 "Fix application"). Fixes are applied
/// in descending `range[0]` order so earlier offsets remain valid;
/// overlapping fixes are the caller's responsibility to avoid, per the
/// non-overlapping assumption.
pub fn apply_text_fixes(source: &str, diagnostics: &[Diagnostic]) -> String {
    let mut edits: Vec<(u32, u32, &str)> = diagnostics
        .iter()
        .filter_map(|d| d.fix.as_ref())
        .filter(|f| f.kind == FixKind::TextEdit)
        .map(|f| (f.range.0, f.range.1, f.replacement.as_str()))
        .collect();
    edits.sort_by(|a, b| b.0.cmp(&a.0));

    let mut out = source.to_string();
    for (start, end, replacement) in edits {
        let start = start as usize;
        let end = end as usize;
        if start <= end && end <= out.len() {
            out.replace_range(start..end, replacement);
        }
    }
    out
}

/// `write-file` fixes produce standalone artifacts rather than edits to
/// the linted file itself; the caller writes each `(path, content)` pair.
pub fn write_file_fixes(diagnostics: &[Diagnostic]) -> Vec<(&Path, &str)> {
    diagnostics
        .iter()
        .filter_map(|d| d.fix.as_ref())
        .filter(|f| f.kind == FixKind::WriteFile)
        .filter_map(|f| f.params.as_ref())
        .map(|p| (Path::new(p.path.as_str()), p.content.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lint::diagnostic::{Fix, RuleSeverity};

    #[test]
    fn apply_text_fixes_applies_in_descending_order() {
        let source = "abcdef".to_string();
        let diagnostics = vec![
            Diagnostic::new("f.chant.ts", 1, 1, "COR012", RuleSeverity::Warning, "x")
                .with_fix(Fix::text_edit((0, 1), "Z")),
            Diagnostic::new("f.chant.ts", 1, 4, "COR012", RuleSeverity::Warning, "x")
                .with_fix(Fix::text_edit((3, 4), "Y")),
        ];
        let fixed = apply_text_fixes(&source, &diagnostics);
        assert_eq!(fixed, "ZbcYef");
    }

    #[test]
    fn engine_with_plugin_rules_overrides_core_rule_by_id() {
        struct AlwaysOffCor001;
        impl LintRule for AlwaysOffCor001 {
            fn id(&self) -> &'static str {
                "COR001"
            }
            fn default_severity(&self) -> super::super::diagnostic::RuleSeverity {
                super::super::diagnostic::RuleSeverity::Info
            }
            fn category(&self) -> super::super::rule::RuleCategory {
                super::super::rule::RuleCategory::Structural
            }
            fn check(&self, _ctx: &LintContext<'_>, _options: Option<&serde_json::Value>) -> Vec<Diagnostic> {
                Vec::new()
            }
        }

        let engine = LintEngine::with_plugin_rules(vec![Box::new(AlwaysOffCor001)]);
        assert_eq!(engine.rules.iter().filter(|r| r.id() == "COR001").count(), 1);
    }
}
