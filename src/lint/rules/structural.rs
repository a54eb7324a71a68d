//! Structural rules (COR family, §4.6): shape constraints on how
//! declarables, barrel imports, and composite factories may be written,
//! independent of whether the values inside them are statically evaluable.

use std::collections::HashSet;

use swc_common::Spanned;
use swc_ecma_ast::*;
use swc_ecma_visit::{Visit, VisitWith};

use crate::lint::diagnostic::{Diagnostic, Fix, RuleSeverity};
use crate::lint::rule::{LintContext, LintRule, RuleCategory};
use crate::utils::is_lower_camel_case;

use super::helpers::{as_new_expr, callee_ident_name, top_level_consts};

/// `flat-declarations` (COR001): inline object/array literals as property
/// values in a declarable constructor, outside a composite factory, must
/// instead be named exported consts.
pub struct FlatDeclarations;

impl LintRule for FlatDeclarations {
    fn id(&self) -> &'static str {
        "COR001"
    }
    fn default_severity(&self) -> RuleSeverity {
        RuleSeverity::Error
    }
    fn category(&self) -> RuleCategory {
        RuleCategory::Structural
    }

    fn check(&self, ctx: &LintContext<'_>, _options: Option<&serde_json::Value>) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for item in top_level_consts(ctx.module) {
            let Some(new_expr) = as_new_expr(item.init) else {
                continue;
            };
            let Some(args) = &new_expr.args else { continue };
            for arg in args {
                let Expr::Object(obj) = arg.expr.as_ref() else {
                    continue;
                };
                for prop in &obj.props {
                    let Prop::KeyValue(kv) = (match prop {
                        PropOrSpread::Prop(p) => p.as_ref(),
                        PropOrSpread::Spread(_) => continue,
                    }) else {
                        continue;
                    };
                    if matches!(kv.value.as_ref(), Expr::Object(_) | Expr::Array(_)) {
                        let (line, column) = ctx.line_col(kv.value.span().lo);
                        diagnostics.push(Diagnostic::new(
                            ctx.file_path,
                            line,
                            column,
                            self.id(),
                            self.default_severity(),
                            "inline object/array literal used as a declarable property value; extract it to a named exported const",
                        ));
                    }
                }
            }
        }
        diagnostics
    }
}

/// `barrel-import-style` (COR002): local barrel imports must be namespace
/// imports, not named.
pub struct BarrelImportStyle;

impl LintRule for BarrelImportStyle {
    fn id(&self) -> &'static str {
        "COR002"
    }
    fn default_severity(&self) -> RuleSeverity {
        RuleSeverity::Error
    }
    fn category(&self) -> RuleCategory {
        RuleCategory::Structural
    }

    fn check(&self, ctx: &LintContext<'_>, _options: Option<&serde_json::Value>) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for item in &ctx.module.body {
            let ModuleItem::ModuleDecl(ModuleDecl::Import(import)) = item else {
                continue;
            };
            let src = import.src.value.as_atom().map(|a| a.as_str()).unwrap_or("");
            if !src.ends_with('_') && !src.contains("/_") {
                continue;
            }
            for specifier in &import.specifiers {
                if let ImportSpecifier::Named(named) = specifier {
                    if named.is_type_only {
                        continue;
                    }
                    let (line, column) = ctx.line_col(named.span.lo);
                    diagnostics.push(Diagnostic::new(
                        ctx.file_path,
                        line,
                        column,
                        self.id(),
                        self.default_severity(),
                        "barrel imports must use `import * as _` namespace style, not named imports",
                    ));
                }
            }
        }
        diagnostics
    }
}

/// `no-string-ref` (COR003): forbid string-keyed `GetAtt`/`Ref` calls.
pub struct NoStringRef;

struct StringRefVisitor<'a> {
    file_path: &'a str,
    ctx: &'a LintContext<'a>,
    diagnostics: Vec<Diagnostic>,
}

impl Visit for StringRefVisitor<'_> {
    fn visit_call_expr(&mut self, call: &CallExpr) {
        if let Some(name) = callee_ident_name(&call.callee) {
            if (name == "GetAtt" || name == "Ref")
                && call.args.iter().any(|a| matches!(a.expr.as_ref(), Expr::Lit(Lit::Str(_))))
            {
                let (line, column) = self.ctx.line_col(call.span.lo);
                self.diagnostics.push(Diagnostic::new(
                    self.file_path,
                    line,
                    column,
                    "COR003",
                    RuleSeverity::Error,
                    format!("string-keyed `{name}(...)` is forbidden; use typed property access instead"),
                ));
            }
        }
        call.visit_children_with(self);
    }
}

impl LintRule for NoStringRef {
    fn id(&self) -> &'static str {
        "COR003"
    }
    fn default_severity(&self) -> RuleSeverity {
        RuleSeverity::Error
    }
    fn category(&self) -> RuleCategory {
        RuleCategory::Structural
    }

    fn check(&self, ctx: &LintContext<'_>, _options: Option<&serde_json::Value>) -> Vec<Diagnostic> {
        let mut visitor = StringRefVisitor {
            file_path: ctx.file_path,
            ctx,
            diagnostics: Vec::new(),
        };
        ctx.module.visit_with(&mut visitor);
        visitor.diagnostics
    }
}

/// `declarable-naming` (COR005): exported declarable instances must use
/// lower-camelCase.
pub struct DeclarableNaming;

impl LintRule for DeclarableNaming {
    fn id(&self) -> &'static str {
        "COR005"
    }
    fn default_severity(&self) -> RuleSeverity {
        RuleSeverity::Error
    }
    fn category(&self) -> RuleCategory {
        RuleCategory::Structural
    }

    fn check(&self, ctx: &LintContext<'_>, _options: Option<&serde_json::Value>) -> Vec<Diagnostic> {
        top_level_consts(ctx.module)
            .into_iter()
            .filter(|c| c.exported && as_new_expr(c.init).is_some())
            .filter(|c| !is_lower_camel_case(c.name))
            .map(|c| {
                let (line, column) = ctx.line_col(c.span.lo);
                Diagnostic::new(
                    ctx.file_path,
                    line,
                    column,
                    self.id(),
                    self.default_severity(),
                    format!("exported declarable `{}` must be named in lower-camelCase", c.name),
                )
            })
            .collect()
    }
}

/// `export-required` (COR008): every instantiation of a local declarable
/// class must be the initializer of an exported const.
pub struct ExportRequired;

impl LintRule for ExportRequired {
    fn id(&self) -> &'static str {
        "COR008"
    }
    fn default_severity(&self) -> RuleSeverity {
        RuleSeverity::Error
    }
    fn category(&self) -> RuleCategory {
        RuleCategory::Structural
    }

    fn check(&self, ctx: &LintContext<'_>, _options: Option<&serde_json::Value>) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for item in top_level_consts(ctx.module) {
            if !item.exported && as_new_expr(item.init).is_some() {
                let (line, column) = ctx.line_col(item.span.lo);
                diagnostics.push(Diagnostic::new(
                    ctx.file_path,
                    line,
                    column,
                    self.id(),
                    self.default_severity(),
                    format!("declarable `{}` must be the initializer of an exported const", item.name),
                ));
            }
        }
        // Bare `new X(...)` expression statements, never assigned at all.
        for item in &ctx.module.body {
            if let ModuleItem::Stmt(Stmt::Expr(expr_stmt)) = item {
                if as_new_expr(&expr_stmt.expr).is_some() {
                    let (line, column) = ctx.line_col(expr_stmt.span.lo);
                    diagnostics.push(Diagnostic::new(
                        ctx.file_path,
                        line,
                        column,
                        self.id(),
                        self.default_severity(),
                        "declarable instantiation must be the initializer of an exported const",
                    ));
                }
            }
        }
        diagnostics
    }
}

/// `file-declarable-limit` (COR009): at most N (default 8) declarable
/// instances per file.
pub struct FileDeclarableLimit;

impl LintRule for FileDeclarableLimit {
    fn id(&self) -> &'static str {
        "COR009"
    }
    fn default_severity(&self) -> RuleSeverity {
        RuleSeverity::Warning
    }
    fn category(&self) -> RuleCategory {
        RuleCategory::Structural
    }

    fn check(&self, ctx: &LintContext<'_>, options: Option<&serde_json::Value>) -> Vec<Diagnostic> {
        let max = options
            .and_then(|o| o.get("max"))
            .and_then(|v| v.as_u64())
            .unwrap_or(8) as usize;

        let count = top_level_consts(ctx.module)
            .iter()
            .filter(|c| as_new_expr(c.init).is_some())
            .count();

        if count > max {
            vec![Diagnostic::new(
                ctx.file_path,
                1,
                1,
                self.id(),
                self.default_severity(),
                format!("file declares {count} declarables, exceeding the limit of {max}"),
            )]
        } else {
            Vec::new()
        }
    }
}

/// `no-unused-declarable-import` (COR010): namespace imports from project
/// or lexicon packages must be referenced.
pub struct NoUnusedDeclarableImport;

struct UsedNamespaces<'a> {
    used: HashSet<&'a str>,
}

impl<'a> Visit for UsedNamespaces<'a> {
    fn visit_ident(&mut self, ident: &Ident) {
        self.used.insert(ident.sym.as_ref());
    }
}

impl LintRule for NoUnusedDeclarableImport {
    fn id(&self) -> &'static str {
        "COR010"
    }
    fn default_severity(&self) -> RuleSeverity {
        RuleSeverity::Warning
    }
    fn category(&self) -> RuleCategory {
        RuleCategory::Structural
    }

    fn check(&self, ctx: &LintContext<'_>, _options: Option<&serde_json::Value>) -> Vec<Diagnostic> {
        let mut used = UsedNamespaces { used: HashSet::new() };
        for item in &ctx.module.body {
            if let ModuleItem::Stmt(stmt) = item {
                stmt.visit_with(&mut used);
            }
            if let ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) = item {
                export.decl.visit_with(&mut used);
            }
        }

        let mut diagnostics = Vec::new();
        for item in &ctx.module.body {
            let ModuleItem::ModuleDecl(ModuleDecl::Import(import)) = item else {
                continue;
            };
            for specifier in &import.specifiers {
                if let ImportSpecifier::Namespace(ns) = specifier {
                    let name = ns.local.sym.as_ref();
                    if !used.used.contains(name) {
                        let (line, column) = ctx.line_col(ns.span.lo);
                        diagnostics.push(Diagnostic::new(
                            ctx.file_path,
                            line,
                            column,
                            self.id(),
                            self.default_severity(),
                            format!("namespace import `{name}` is never referenced"),
                        ));
                    }
                }
            }
        }
        diagnostics
    }
}

/// `no-cyclic-declarable-ref` (COR011): the per-file declarable reference
/// graph must be acyclic.
pub struct NoCyclicDeclarableRef;

impl LintRule for NoCyclicDeclarableRef {
    fn id(&self) -> &'static str {
        "COR011"
    }
    fn default_severity(&self) -> RuleSeverity {
        RuleSeverity::Error
    }
    fn category(&self) -> RuleCategory {
        RuleCategory::Structural
    }

    fn check(&self, ctx: &LintContext<'_>, _options: Option<&serde_json::Value>) -> Vec<Diagnostic> {
        let consts = top_level_consts(ctx.module);
        let names: HashSet<&str> = consts.iter().map(|c| c.name).collect();

        let mut graph: std::collections::HashMap<&str, Vec<String>> = std::collections::HashMap::new();
        for item in &consts {
            let mut referenced = Vec::new();
            super::helpers::collect_idents(item.init, &mut referenced);
            let referenced: Vec<String> = referenced
                .into_iter()
                .filter(|r| names.contains(r.as_str()) && r != item.name)
                .collect();
            graph.insert(item.name, referenced);
        }

        match crate::graph::topo_sort(graph.iter().map(|(k, v)| {
            (
                k.to_string(),
                v.iter().cloned().collect::<indexmap::IndexSet<_>>(),
            )
        })) {
            Ok(_) => Vec::new(),
            Err(cycle) => vec![Diagnostic::new(
                ctx.file_path,
                1,
                1,
                self.id(),
                self.default_severity(),
                format!("cyclic declarable reference: {}", cycle.join(" -> ")),
            )],
        }
    }
}

/// `no-redundant-type-import` (COR012): do not `import type { X }` from a
/// module already namespace-imported.
pub struct NoRedundantTypeImport;

impl LintRule for NoRedundantTypeImport {
    fn id(&self) -> &'static str {
        "COR012"
    }
    fn default_severity(&self) -> RuleSeverity {
        RuleSeverity::Warning
    }
    fn category(&self) -> RuleCategory {
        RuleCategory::Structural
    }

    fn check(&self, ctx: &LintContext<'_>, _options: Option<&serde_json::Value>) -> Vec<Diagnostic> {
        let namespace_sources: HashSet<&str> = ctx
            .module
            .body
            .iter()
            .filter_map(|item| match item {
                ModuleItem::ModuleDecl(ModuleDecl::Import(import))
                    if import
                        .specifiers
                        .iter()
                        .any(|s| matches!(s, ImportSpecifier::Namespace(_))) =>
                {
                    import.src.value.as_atom().map(|a| a.as_str())
                }
                _ => None,
            })
            .collect();

        let mut diagnostics = Vec::new();
        for item in &ctx.module.body {
            let ModuleItem::ModuleDecl(ModuleDecl::Import(import)) = item else {
                continue;
            };
            let is_redundant = import.type_only
                || import
                    .specifiers
                    .iter()
                    .all(|s| matches!(s, ImportSpecifier::Named(n) if n.is_type_only));
            if is_redundant
                && import
                    .src
                    .value
                    .as_atom()
                    .is_some_and(|a| namespace_sources.contains(a.as_str()))
            {
                let (line, column) = ctx.line_col(import.span.lo);
                diagnostics.push(Diagnostic::new(
                    ctx.file_path,
                    line,
                    column,
                    self.id(),
                    self.default_severity(),
                    format!(
                        "redundant type-only import from `{}`, already namespace-imported",
                        import.src.value.to_atom_lossy()
                    ),
                ).with_fix(Fix::text_edit((import.span.lo.0, import.span.hi.0), "")));
            }
        }
        diagnostics
    }
}

/// `single-concern-file` (COR013): a file SHOULD NOT mix resource-kind and
/// property-kind declarables.
pub struct SingleConcernFile;

const PROPERTY_SUFFIXES: &[&str] = &["Configuration", "Encryption", "Policy"];

impl LintRule for SingleConcernFile {
    fn id(&self) -> &'static str {
        "COR013"
    }
    fn default_severity(&self) -> RuleSeverity {
        RuleSeverity::Info
    }
    fn category(&self) -> RuleCategory {
        RuleCategory::Structural
    }

    fn check(&self, ctx: &LintContext<'_>, _options: Option<&serde_json::Value>) -> Vec<Diagnostic> {
        let mut saw_resource = false;
        let mut saw_property = false;
        for item in top_level_consts(ctx.module) {
            let Some(new_expr) = as_new_expr(item.init) else {
                continue;
            };
            let Some(type_name) = callee_ident_name(&Callee::Expr(new_expr.callee.clone())) else {
                continue;
            };
            if PROPERTY_SUFFIXES.iter().any(|s| type_name.ends_with(s)) {
                saw_property = true;
            } else {
                saw_resource = true;
            }
        }
        if saw_resource && saw_property {
            vec![Diagnostic::new(
                ctx.file_path,
                1,
                1,
                self.id(),
                self.default_severity(),
                "file mixes resource-kind and property-kind declarables; consider splitting",
            )]
        } else {
            Vec::new()
        }
    }
}

/// `no-redundant-value-cast` (COR015): forbid `as Value<T>` assertions.
pub struct NoRedundantValueCast;

struct ValueCastVisitor<'a> {
    file_path: &'a str,
    ctx: &'a LintContext<'a>,
    diagnostics: Vec<Diagnostic>,
}

impl Visit for ValueCastVisitor<'_> {
    fn visit_ts_as_expr(&mut self, as_expr: &TsAsExpr) {
        if let TsType::TsTypeRef(type_ref) = as_expr.type_ann.as_ref() {
            if let TsEntityName::Ident(ident) = &type_ref.type_name {
                if ident.sym.as_ref() == "Value" {
                    let (line, column) = self.ctx.line_col(as_expr.span.lo);
                    self.diagnostics.push(Diagnostic::new(
                        self.file_path,
                        line,
                        column,
                        "COR015",
                        RuleSeverity::Warning,
                        "redundant `as Value<T>` assertion",
                    ));
                }
            }
        }
        as_expr.visit_children_with(self);
    }
}

impl LintRule for NoRedundantValueCast {
    fn id(&self) -> &'static str {
        "COR015"
    }
    fn default_severity(&self) -> RuleSeverity {
        RuleSeverity::Warning
    }
    fn category(&self) -> RuleCategory {
        RuleCategory::Structural
    }

    fn check(&self, ctx: &LintContext<'_>, _options: Option<&serde_json::Value>) -> Vec<Diagnostic> {
        let mut visitor = ValueCastVisitor {
            file_path: ctx.file_path,
            ctx,
            diagnostics: Vec::new(),
        };
        ctx.module.visit_with(&mut visitor);
        visitor.diagnostics
    }
}

/// `stale-barrel-types` (COR016): the sibling `_.d.ts` must match the
/// regenerated barrel content.
pub struct StaleBarrelTypes;

impl LintRule for StaleBarrelTypes {
    fn id(&self) -> &'static str {
        "COR016"
    }
    fn default_severity(&self) -> RuleSeverity {
        RuleSeverity::Warning
    }
    fn category(&self) -> RuleCategory {
        RuleCategory::Structural
    }

    fn check(&self, ctx: &LintContext<'_>, _options: Option<&serde_json::Value>) -> Vec<Diagnostic> {
        let Some(exports) = ctx.barrel_exports else {
            return Vec::new();
        };
        let path = std::path::Path::new(ctx.file_path);
        if path.file_name().and_then(|n| n.to_str()) != Some(crate::discovery::barrel::BARREL_FILE_NAME) {
            return Vec::new();
        }
        let dts_path = path.with_file_name(crate::discovery::barrel::BARREL_DECLARATION_FILE_NAME);
        let fresh = crate::discovery::barrel::render_declaration(exports);
        let stale = match std::fs::read_to_string(&dts_path) {
            Ok(existing) => existing != fresh,
            Err(_) => true,
        };
        if stale {
            vec![Diagnostic::new(ctx.file_path, 1, 1, self.id(), self.default_severity(), "sibling _.d.ts is stale relative to the barrel's regenerated content")
                .with_fix(Fix::write_file(dts_path.to_string_lossy().to_string(), fresh))]
        } else {
            Vec::new()
        }
    }
}

/// `composite-name-match` (COR017): a `Composite<Props>(factory, "Name")`
/// literal-name argument must match the exported const name.
pub struct CompositeNameMatch;

impl LintRule for CompositeNameMatch {
    fn id(&self) -> &'static str {
        "COR017"
    }
    fn default_severity(&self) -> RuleSeverity {
        RuleSeverity::Error
    }
    fn category(&self) -> RuleCategory {
        RuleCategory::Structural
    }

    fn check(&self, ctx: &LintContext<'_>, _options: Option<&serde_json::Value>) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for item in top_level_consts(ctx.module) {
            let Expr::Call(call) = item.init else {
                continue;
            };
            if callee_ident_name(&call.callee) != Some("Composite") {
                continue;
            }
            let Some(name_arg) = call.args.get(1) else { continue };
            let Expr::Lit(Lit::Str(Str { value, .. })) = name_arg.expr.as_ref() else {
                continue;
            };
            if value.to_atom_lossy().as_str() != item.name {
                let (line, column) = ctx.line_col(call.span.lo);
                diagnostics.push(Diagnostic::new(
                    ctx.file_path,
                    line,
                    column,
                    self.id(),
                    self.default_severity(),
                    format!("Composite literal name \"{}\" does not match exported const `{}`", value.to_atom_lossy(), item.name),
                ));
            }
        }
        diagnostics
    }
}

/// `composite-prefer-lexicon-type` (COR018): fields of a Composite's props
/// interface should not duplicate lexicon types with local declarations.
pub struct CompositePreferLexiconType;

impl LintRule for CompositePreferLexiconType {
    fn id(&self) -> &'static str {
        "COR018"
    }
    fn default_severity(&self) -> RuleSeverity {
        RuleSeverity::Info
    }
    fn category(&self) -> RuleCategory {
        RuleCategory::Structural
    }

    fn check(&self, ctx: &LintContext<'_>, _options: Option<&serde_json::Value>) -> Vec<Diagnostic> {
        let local_types: HashSet<&str> = ctx
            .module
            .body
            .iter()
            .filter_map(|item| match item {
                ModuleItem::Stmt(Stmt::Decl(Decl::TsInterface(i))) => Some(i.id.sym.as_ref()),
                ModuleItem::Stmt(Stmt::Decl(Decl::TsTypeAlias(a))) => Some(a.id.sym.as_ref()),
                _ => None,
            })
            .collect();

        let mut diagnostics = Vec::new();
        for item in &ctx.module.body {
            let ModuleItem::Stmt(Stmt::Decl(Decl::TsInterface(interface))) = item else {
                continue;
            };
            if !interface.id.sym.as_ref().ends_with("Props") {
                continue;
            }
            for member in &interface.body.body {
                let TsTypeElement::TsPropertySignature(prop) = member else {
                    continue;
                };
                let Some(type_ann) = &prop.type_ann else { continue };
                if let TsType::TsTypeRef(type_ref) = type_ann.type_ann.as_ref() {
                    if let TsEntityName::Ident(ident) = &type_ref.type_name {
                        if local_types.contains(ident.sym.as_ref()) {
                            let (line, column) = ctx.line_col(prop.span.lo);
                            diagnostics.push(Diagnostic::new(
                                ctx.file_path,
                                line,
                                column,
                                self.id(),
                                self.default_severity(),
                                format!(
                                    "props field references local type `{}` that duplicates a lexicon type",
                                    ident.sym
                                ),
                            ));
                        }
                    }
                }
            }
        }
        diagnostics
    }
}
