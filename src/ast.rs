//! Shared AST-walking helpers, used by both [`crate::discovery`] (to
//! statically extract declarable-looking top-level consts in place of
//! executing module code) and [`crate::lint`] rules (to recognize the
//! same shapes for diagnostics).

use swc_common::Span;
use swc_ecma_ast::*;

/// A top-level `export const NAME = EXPR` declaration, with enough context
/// to decide whether `EXPR` is a declarable instantiation.
pub struct TopLevelConst<'a> {
    pub name: &'a str,
    pub init: &'a Expr,
    pub exported: bool,
    pub span: Span,
}

/// Walk a module's direct children, yielding every top-level `const`
/// binding whether or not it's exported. Rules that care about "is this
/// the initializer of an exported const" (COR008) compare against
/// `exported`; rules that only care about naming (COR005) filter it
/// themselves.
pub fn top_level_consts(module: &Module) -> Vec<TopLevelConst<'_>> {
    let mut out = Vec::new();
    for item in &module.body {
        let (decl, exported) = match item {
            ModuleItem::Stmt(Stmt::Decl(Decl::Var(var_decl))) => (var_decl.as_ref(), false),
            ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(ExportDecl {
                decl: Decl::Var(var_decl),
                ..
            })) => (var_decl.as_ref(), true),
            _ => continue,
        };
        if !matches!(decl.kind, VarDeclKind::Const) {
            continue;
        }
        for decl in &decl.decls {
            let Some(init) = &decl.init else { continue };
            let Pat::Ident(BindingIdent { id, .. }) = &decl.name else {
                continue;
            };
            out.push(TopLevelConst {
                name: id.sym.as_ref(),
                init,
                exported,
                span: decl.span,
            });
        }
    }
    out
}

/// Unwraps `as`/parenthesised wrappers to find the underlying `new X(...)`
/// call, if any — declarable instantiations are almost always written
/// bare but may be wrapped in a type assertion.
pub fn as_new_expr(expr: &Expr) -> Option<&NewExpr> {
    match expr {
        Expr::New(new_expr) => Some(new_expr),
        Expr::TsAs(TsAsExpr { expr, .. }) | Expr::Paren(ParenExpr { expr, .. }) => {
            as_new_expr(expr)
        }
        _ => None,
    }
}

/// The callee's identifier name for a `new X(...)` or `x(...)` call, if
/// the callee is a bare identifier.
pub fn callee_ident_name(callee: &Callee) -> Option<&str> {
    match callee {
        Callee::Expr(expr) => expr_ident_name(expr),
        _ => None,
    }
}

pub fn expr_ident_name(expr: &Expr) -> Option<&str> {
    match expr {
        Expr::Ident(ident) => Some(ident.sym.as_ref()),
        _ => None,
    }
}

/// Recursively collect every identifier referenced inside `expr`, used by
/// rules checking whether a literal is "extractable" (references nothing
/// from its enclosing scope).
pub fn collect_idents(expr: &Expr, out: &mut Vec<String>) {
    struct Collector<'b> {
        out: &'b mut Vec<String>,
    }
    impl swc_ecma_visit::Visit for Collector<'_> {
        fn visit_ident(&mut self, ident: &Ident) {
            self.out.push(ident.sym.as_ref().to_string());
        }
    }
    use swc_ecma_visit::VisitWith;
    let mut collector = Collector { out };
    expr.visit_with(&mut collector);
}
