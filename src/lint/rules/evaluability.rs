//! Evaluation/static-evaluability rules (EVL family, §4.6): constraints
//! that keep the source tree a pure declaration graph rather than a
//! general-purpose program, so the build driver never needs to execute
//! arbitrary user code to discover entities.

use swc_common::{Span, Spanned};
use swc_ecma_ast::*;
use swc_ecma_visit::{Visit, VisitWith};

use crate::lint::diagnostic::{Diagnostic, RuleSeverity};
use crate::lint::rule::{LintContext, LintRule, RuleCategory};

use super::helpers::{as_new_expr, callee_ident_name, collect_idents};

fn is_statically_evaluable(expr: &Expr) -> bool {
    match expr {
        Expr::Lit(_) | Expr::Ident(_) => true,
        Expr::Member(member) => is_statically_evaluable(&member.obj),
        Expr::Call(call) => callee_ident_name(&call.callee).is_some()
            && call.args.iter().all(|a| is_statically_evaluable(&a.expr)),
        Expr::Object(obj) => obj.props.iter().all(|p| match p {
            PropOrSpread::Prop(prop) => match prop.as_ref() {
                Prop::KeyValue(kv) => is_statically_evaluable(&kv.value),
                _ => true,
            },
            PropOrSpread::Spread(s) => is_statically_evaluable(&s.expr),
        }),
        Expr::Array(arr) => arr
            .elems
            .iter()
            .flatten()
            .all(|e| is_statically_evaluable(&e.expr)),
        Expr::Paren(p) => is_statically_evaluable(&p.expr),
        Expr::TsAs(a) => is_statically_evaluable(&a.expr),
        _ => false,
    }
}

/// `non-literal-expression` (EVL001): every expression reachable from a
/// resource constructor must be statically evaluable.
pub struct NonLiteralExpression;

impl LintRule for NonLiteralExpression {
    fn id(&self) -> &'static str {
        "EVL001"
    }
    fn default_severity(&self) -> RuleSeverity {
        RuleSeverity::Error
    }
    fn category(&self) -> RuleCategory {
        RuleCategory::Evaluability
    }

    fn check(&self, ctx: &LintContext<'_>, _options: Option<&serde_json::Value>) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for item in super::helpers::top_level_consts(ctx.module) {
            let Some(new_expr) = as_new_expr(item.init) else {
                continue;
            };
            let Some(args) = &new_expr.args else { continue };
            for arg in args {
                if !is_statically_evaluable(&arg.expr) {
                    let (line, column) = ctx.line_col(arg.expr.span().lo);
                    diagnostics.push(Diagnostic::new(
                        ctx.file_path,
                        line,
                        column,
                        self.id(),
                        self.default_severity(),
                        "expression reachable from a resource constructor is not statically evaluable",
                    ));
                }
            }
        }
        diagnostics
    }
}

/// `control-flow-resource` (EVL002): no control-flow constructs around
/// resource instantiation.
pub struct ControlFlowResource;

struct ControlFlowVisitor<'a> {
    file_path: &'a str,
    ctx: &'a LintContext<'a>,
    diagnostics: Vec<Diagnostic>,
}

impl ControlFlowVisitor<'_> {
    fn flag(&mut self, span: Span) {
        let (line, column) = self.ctx.line_col(span.lo);
        self.diagnostics.push(Diagnostic::new(
            self.file_path,
            line,
            column,
            "EVL002",
            RuleSeverity::Error,
            "control-flow construct wraps resource instantiation",
        ));
    }
}

struct ContainsNew(bool);
impl Visit for ContainsNew {
    fn visit_new_expr(&mut self, _n: &NewExpr) {
        self.0 = true;
    }
}

fn contains_new_expr<N: VisitWith<ContainsNew>>(node: &N) -> bool {
    let mut checker = ContainsNew(false);
    node.visit_with(&mut checker);
    checker.0
}

impl Visit for ControlFlowVisitor<'_> {
    fn visit_if_stmt(&mut self, stmt: &IfStmt) {
        if contains_new_expr(stmt.cons.as_ref()) {
            self.flag(stmt.span);
        }
        stmt.visit_children_with(self);
    }

    fn visit_for_stmt(&mut self, stmt: &ForStmt) {
        if contains_new_expr(stmt.body.as_ref()) {
            self.flag(stmt.span);
        }
        stmt.visit_children_with(self);
    }

    fn visit_while_stmt(&mut self, stmt: &WhileStmt) {
        if contains_new_expr(stmt.body.as_ref()) {
            self.flag(stmt.span);
        }
        stmt.visit_children_with(self);
    }
}

impl LintRule for ControlFlowResource {
    fn id(&self) -> &'static str {
        "EVL002"
    }
    fn default_severity(&self) -> RuleSeverity {
        RuleSeverity::Error
    }
    fn category(&self) -> RuleCategory {
        RuleCategory::Evaluability
    }

    fn check(&self, ctx: &LintContext<'_>, _options: Option<&serde_json::Value>) -> Vec<Diagnostic> {
        let mut visitor = ControlFlowVisitor {
            file_path: ctx.file_path,
            ctx,
            diagnostics: Vec::new(),
        };
        ctx.module.visit_with(&mut visitor);
        visitor.diagnostics
    }
}

/// `dynamic-property-access` (EVL003): computed property access must use
/// string or numeric literal keys.
pub struct DynamicPropertyAccess;

struct ComputedAccessVisitor<'a> {
    file_path: &'a str,
    ctx: &'a LintContext<'a>,
    diagnostics: Vec<Diagnostic>,
}

impl Visit for ComputedAccessVisitor<'_> {
    fn visit_member_expr(&mut self, member: &MemberExpr) {
        if let MemberProp::Computed(computed) = &member.prop {
            if !matches!(computed.expr.as_ref(), Expr::Lit(Lit::Str(_)) | Expr::Lit(Lit::Num(_))) {
                let (line, column) = self.ctx.line_col(computed.span.lo);
                self.diagnostics.push(Diagnostic::new(
                    self.file_path,
                    line,
                    column,
                    "EVL003",
                    RuleSeverity::Error,
                    "computed property access must use a string or numeric literal key",
                ));
            }
        }
        member.visit_children_with(self);
    }
}

impl LintRule for DynamicPropertyAccess {
    fn id(&self) -> &'static str {
        "EVL003"
    }
    fn default_severity(&self) -> RuleSeverity {
        RuleSeverity::Error
    }
    fn category(&self) -> RuleCategory {
        RuleCategory::Evaluability
    }

    fn check(&self, ctx: &LintContext<'_>, _options: Option<&serde_json::Value>) -> Vec<Diagnostic> {
        let mut visitor = ComputedAccessVisitor {
            file_path: ctx.file_path,
            ctx,
            diagnostics: Vec::new(),
        };
        ctx.module.visit_with(&mut visitor);
        visitor.diagnostics
    }
}

/// `spread-non-const` (EVL004): spread source must be traceable to a const
/// declaration or literal.
pub struct SpreadNonConst;

impl LintRule for SpreadNonConst {
    fn id(&self) -> &'static str {
        "EVL004"
    }
    fn default_severity(&self) -> RuleSeverity {
        RuleSeverity::Error
    }
    fn category(&self) -> RuleCategory {
        RuleCategory::Evaluability
    }

    fn check(&self, ctx: &LintContext<'_>, _options: Option<&serde_json::Value>) -> Vec<Diagnostic> {
        struct SpreadVisitor<'a> {
            file_path: &'a str,
            ctx: &'a LintContext<'a>,
            diagnostics: Vec<Diagnostic>,
        }
        impl Visit for SpreadVisitor<'_> {
            fn visit_spread_element(&mut self, spread: &SpreadElement) {
                let traceable = matches!(
                    spread.expr.as_ref(),
                    Expr::Ident(_) | Expr::Object(_) | Expr::Array(_)
                );
                if !traceable {
                    let (line, column) = self.ctx.line_col(spread.dot3_token.lo);
                    self.diagnostics.push(Diagnostic::new(
                        self.file_path,
                        line,
                        column,
                        "EVL004",
                        RuleSeverity::Error,
                        "spread source must be a const identifier or literal",
                    ));
                }
                spread.visit_children_with(self);
            }
        }
        let mut visitor = SpreadVisitor {
            file_path: ctx.file_path,
            ctx,
            diagnostics: Vec::new(),
        };
        ctx.module.visit_with(&mut visitor);
        visitor.diagnostics
    }
}

/// `resource-block-body` (EVL005): `resource(T, (p)=>expr)` callbacks must
/// have an expression body.
pub struct ResourceBlockBody;

impl LintRule for ResourceBlockBody {
    fn id(&self) -> &'static str {
        "EVL005"
    }
    fn default_severity(&self) -> RuleSeverity {
        RuleSeverity::Error
    }
    fn category(&self) -> RuleCategory {
        RuleCategory::Evaluability
    }

    fn check(&self, ctx: &LintContext<'_>, _options: Option<&serde_json::Value>) -> Vec<Diagnostic> {
        struct ResourceCallVisitor<'a> {
            file_path: &'a str,
            ctx: &'a LintContext<'a>,
            diagnostics: Vec<Diagnostic>,
        }
        impl Visit for ResourceCallVisitor<'_> {
            fn visit_call_expr(&mut self, call: &CallExpr) {
                if callee_ident_name(&call.callee) == Some("resource") {
                    if let Some(second) = call.args.get(1) {
                        if let Expr::Arrow(arrow) = second.expr.as_ref() {
                            if matches!(arrow.body.as_ref(), BlockStmtOrExpr::BlockStmt(_)) {
                                let (line, column) = self.ctx.line_col(arrow.span.lo);
                                self.diagnostics.push(Diagnostic::new(
                                    self.file_path,
                                    line,
                                    column,
                                    "EVL005",
                                    RuleSeverity::Error,
                                    "resource callback must have an expression body, not a block",
                                ));
                            }
                        }
                    }
                }
                call.visit_children_with(self);
            }
        }
        let mut visitor = ResourceCallVisitor {
            file_path: ctx.file_path,
            ctx,
            diagnostics: Vec::new(),
        };
        ctx.module.visit_with(&mut visitor);
        visitor.diagnostics
    }
}

/// `barrel-usage` (EVL006): the barrel factory call must be exactly
/// `export const $ = barrel(<moduleDirIntrinsic>)`.
pub struct BarrelUsage;

impl LintRule for BarrelUsage {
    fn id(&self) -> &'static str {
        "EVL006"
    }
    fn default_severity(&self) -> RuleSeverity {
        RuleSeverity::Error
    }
    fn category(&self) -> RuleCategory {
        RuleCategory::Evaluability
    }

    fn check(&self, ctx: &LintContext<'_>, _options: Option<&serde_json::Value>) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for item in super::helpers::top_level_consts(ctx.module) {
            if item.name != "$" {
                continue;
            }
            let malformed = match item.init {
                Expr::Call(call) => {
                    callee_ident_name(&call.callee) != Some("barrel") || call.args.len() != 1
                }
                _ => true,
            };
            if malformed {
                let (line, column) = ctx.line_col(item.span.lo);
                diagnostics.push(Diagnostic::new(
                    ctx.file_path,
                    line,
                    column,
                    self.id(),
                    self.default_severity(),
                    "barrel factory call must be exactly `export const $ = barrel(<dir>)`",
                ));
            }
        }
        diagnostics
    }
}

/// `invalid-siblings` (EVL007): inside a composite, access to sibling
/// members must reference a defined key of the return object.
pub struct InvalidSiblings;

impl LintRule for InvalidSiblings {
    fn id(&self) -> &'static str {
        "EVL007"
    }
    fn default_severity(&self) -> RuleSeverity {
        RuleSeverity::Error
    }
    fn category(&self) -> RuleCategory {
        RuleCategory::Evaluability
    }

    fn check(&self, ctx: &LintContext<'_>, _options: Option<&serde_json::Value>) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for item in super::helpers::top_level_consts(ctx.module) {
            let Expr::Call(call) = item.init else { continue };
            if callee_ident_name(&call.callee) != Some("Composite") {
                continue;
            }
            let Some(first) = call.args.first() else { continue };
            let Expr::Arrow(arrow) = first.expr.as_ref() else { continue };
            let BlockStmtOrExpr::Expr(body) = arrow.body.as_ref() else { continue };
            let Expr::Object(returned) = body.as_ref() else { continue };

            let defined_keys: std::collections::HashSet<&str> = returned
                .props
                .iter()
                .filter_map(|p| match p {
                    PropOrSpread::Prop(prop) => match prop.as_ref() {
                        Prop::KeyValue(kv) => match &kv.key {
                            PropName::Ident(id) => Some(id.sym.as_ref()),
                            PropName::Str(s) => s.value.as_atom().map(|a| a.as_str()),
                            _ => None,
                        },
                        Prop::Shorthand(id) => Some(id.sym.as_ref()),
                        _ => None,
                    },
                    _ => None,
                })
                .collect();

            struct SiblingVisitor<'a> {
                file_path: &'a str,
                ctx: &'a LintContext<'a>,
                defined_keys: std::collections::HashSet<&'a str>,
                this_name: &'a str,
                diagnostics: Vec<Diagnostic>,
            }
            impl Visit for SiblingVisitor<'_> {
                fn visit_member_expr(&mut self, member: &MemberExpr) {
                    if let Expr::Ident(obj) = member.obj.as_ref() {
                        if obj.sym.as_ref() == self.this_name {
                            if let MemberProp::Ident(prop) = &member.prop {
                                if !self.defined_keys.contains(prop.sym.as_ref()) {
                                    let (line, column) = self.ctx.line_col(member.span.lo);
                                    self.diagnostics.push(Diagnostic::new(
                                        self.file_path,
                                        line,
                                        column,
                                        "EVL007",
                                        RuleSeverity::Error,
                                        format!("`{}` is not a key of the composite's returned object", prop.sym),
                                    ));
                                }
                            }
                        }
                    }
                    member.visit_children_with(self);
                }
            }

            if let Some(Pat::Ident(self_param)) = arrow.params.first() {
                let mut visitor = SiblingVisitor {
                    file_path: ctx.file_path,
                    ctx,
                    defined_keys,
                    this_name: self_param.id.sym.as_ref(),
                    diagnostics: Vec::new(),
                };
                body.visit_with(&mut visitor);
                diagnostics.extend(visitor.diagnostics);
            }
        }
        diagnostics
    }
}

/// `unresolvable-barrel-ref` (EVL008): accessed barrel properties must
/// exist in the project's known barrel exports.
pub struct UnresolvableBarrelRef;

impl LintRule for UnresolvableBarrelRef {
    fn id(&self) -> &'static str {
        "EVL008"
    }
    fn default_severity(&self) -> RuleSeverity {
        RuleSeverity::Error
    }
    fn category(&self) -> RuleCategory {
        RuleCategory::Evaluability
    }

    fn check(&self, ctx: &LintContext<'_>, _options: Option<&serde_json::Value>) -> Vec<Diagnostic> {
        let Some(exports) = ctx.barrel_exports else {
            return Vec::new();
        };

        struct BarrelRefVisitor<'a> {
            file_path: &'a str,
            ctx: &'a LintContext<'a>,
            exports: &'a std::collections::HashSet<String>,
            diagnostics: Vec<Diagnostic>,
        }
        impl Visit for BarrelRefVisitor<'_> {
            fn visit_member_expr(&mut self, member: &MemberExpr) {
                if let Expr::Ident(obj) = member.obj.as_ref() {
                    if obj.sym.as_ref() == "$" {
                        if let MemberProp::Ident(prop) = &member.prop {
                            if !self.exports.contains(prop.sym.as_ref()) {
                                let (line, column) = self.ctx.line_col(member.span.lo);
                                self.diagnostics.push(Diagnostic::new(
                                    self.file_path,
                                    line,
                                    column,
                                    "EVL008",
                                    RuleSeverity::Error,
                                    format!("`$.{}` is not a known barrel export", prop.sym),
                                ));
                            }
                        }
                    }
                }
                member.visit_children_with(self);
            }
        }
        let mut visitor = BarrelRefVisitor {
            file_path: ctx.file_path,
            ctx,
            exports,
            diagnostics: Vec::new(),
        };
        ctx.module.visit_with(&mut visitor);
        visitor.diagnostics
    }
}

/// `composite-no-constant` (EVL009): inside a composite factory, any
/// object/array literal that references nothing from its enclosing scope
/// is extractable and must move to a separate file.
pub struct CompositeNoConstant;

impl LintRule for CompositeNoConstant {
    fn id(&self) -> &'static str {
        "EVL009"
    }
    fn default_severity(&self) -> RuleSeverity {
        RuleSeverity::Warning
    }
    fn category(&self) -> RuleCategory {
        RuleCategory::Evaluability
    }

    fn check(&self, ctx: &LintContext<'_>, _options: Option<&serde_json::Value>) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for item in super::helpers::top_level_consts(ctx.module) {
            let Expr::Call(call) = item.init else { continue };
            if callee_ident_name(&call.callee) != Some("Composite") {
                continue;
            }
            let Some(first) = call.args.first() else { continue };
            let Expr::Arrow(arrow) = first.expr.as_ref() else { continue };

            struct LiteralVisitor<'a> {
                file_path: &'a str,
                ctx: &'a LintContext<'a>,
                diagnostics: Vec<Diagnostic>,
            }
            impl Visit for LiteralVisitor<'_> {
                fn visit_object_lit(&mut self, obj: &ObjectLit) {
                    let mut idents = Vec::new();
                    collect_idents(&Expr::Object(obj.clone()), &mut idents);
                    if idents.is_empty() {
                        let (line, column) = self.ctx.line_col(obj.span.lo);
                        self.diagnostics.push(Diagnostic::new(
                            self.file_path,
                            line,
                            column,
                            "EVL009",
                            RuleSeverity::Warning,
                            "object literal references nothing from its enclosing scope; extract it to a separate file",
                        ));
                    }
                    obj.visit_children_with(self);
                }
            }
            let mut visitor = LiteralVisitor {
                file_path: ctx.file_path,
                ctx,
                diagnostics: Vec::new(),
            };
            arrow.body.visit_with(&mut visitor);
            diagnostics.extend(visitor.diagnostics);
        }
        diagnostics
    }
}

/// `composite-no-transform` (EVL010): data-transformation methods are
/// disallowed inside a composite factory.
pub struct CompositeNoTransform;

const TRANSFORM_METHODS: &[&str] = &[
    "map", "filter", "reduce", "flatMap", "forEach", "find", "some", "every", "sort", "reverse",
    "splice", "slice", "concat",
];

impl LintRule for CompositeNoTransform {
    fn id(&self) -> &'static str {
        "EVL010"
    }
    fn default_severity(&self) -> RuleSeverity {
        RuleSeverity::Error
    }
    fn category(&self) -> RuleCategory {
        RuleCategory::Evaluability
    }

    fn check(&self, ctx: &LintContext<'_>, _options: Option<&serde_json::Value>) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for item in super::helpers::top_level_consts(ctx.module) {
            let Expr::Call(call) = item.init else { continue };
            if callee_ident_name(&call.callee) != Some("Composite") {
                continue;
            }
            let Some(first) = call.args.first() else { continue };
            let Expr::Arrow(arrow) = first.expr.as_ref() else { continue };

            struct TransformVisitor<'a> {
                file_path: &'a str,
                ctx: &'a LintContext<'a>,
                diagnostics: Vec<Diagnostic>,
            }
            impl Visit for TransformVisitor<'_> {
                fn visit_call_expr(&mut self, call: &CallExpr) {
                    if let Callee::Expr(callee) = &call.callee {
                        if let Expr::Member(member) = callee.as_ref() {
                            if let MemberProp::Ident(prop) = &member.prop {
                                if TRANSFORM_METHODS.contains(&prop.sym.as_ref()) {
                                    let (line, column) = self.ctx.line_col(call.span.lo);
                                    self.diagnostics.push(Diagnostic::new(
                                        self.file_path,
                                        line,
                                        column,
                                        "EVL010",
                                        RuleSeverity::Error,
                                        format!("`.{}(...)` is a disallowed data-transformation call inside a composite factory", prop.sym),
                                    ));
                                }
                            }
                        }
                    }
                    call.visit_children_with(self);
                }
            }
            let mut visitor = TransformVisitor {
                file_path: ctx.file_path,
                ctx,
                diagnostics: Vec::new(),
            };
            arrow.body.visit_with(&mut visitor);
            diagnostics.extend(visitor.diagnostics);
        }
        diagnostics
    }
}
