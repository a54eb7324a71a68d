//! Translates a statically-evaluable AST expression into an [`AttrValue`]
//! tree, given the set of entity names already known to the graph.
//!
//! This is the load-time half of discovery's "Dependency extraction"
//! (§4.1): expressions that name a known declarable become `EntityRef`s or
//! `AttrRef`s (recorded as dependencies later); anything else that's still
//! statically evaluable becomes a primitive; anything else is dropped,
//! since the lint engine's `non-literal-expression` (EVL001) is the layer
//! responsible for rejecting non-evaluable code, not discovery.

use swc_ecma_ast::*;

use crate::model::{AttrRef, AttrValue, EntityGraph};

pub fn eval_expr(expr: &Expr, graph: &EntityGraph) -> AttrValue {
    match expr {
        Expr::Lit(Lit::Str(s)) => AttrValue::String(s.value.to_atom_lossy().to_string()),
        Expr::Lit(Lit::Num(n)) => AttrValue::Number(n.value),
        Expr::Lit(Lit::Bool(b)) => AttrValue::Bool(b.value),
        Expr::Lit(Lit::Null(_)) => AttrValue::Null,
        Expr::Ident(ident) => graph
            .entity_id(ident.sym.as_ref())
            .map(AttrValue::EntityRef)
            .unwrap_or(AttrValue::Null),
        Expr::Member(member) => eval_member(member, graph),
        Expr::Array(arr) => AttrValue::List(
            arr.elems
                .iter()
                .flatten()
                .map(|e| eval_expr(&e.expr, graph))
                .collect(),
        ),
        Expr::Object(obj) => AttrValue::Object(
            obj.props
                .iter()
                .filter_map(|p| match p {
                    PropOrSpread::Prop(prop) => match prop.as_ref() {
                        Prop::KeyValue(kv) => {
                            let key = prop_name(&kv.key)?;
                            Some((key, eval_expr(&kv.value, graph)))
                        }
                        _ => None,
                    },
                    PropOrSpread::Spread(_) => None,
                })
                .collect(),
        ),
        Expr::Paren(p) => eval_expr(&p.expr, graph),
        Expr::TsAs(a) => eval_expr(&a.expr, graph),
        _ => AttrValue::Null,
    }
}

fn eval_member(member: &MemberExpr, graph: &EntityGraph) -> AttrValue {
    let MemberProp::Ident(prop) = &member.prop else {
        return AttrValue::Null;
    };
    let Expr::Ident(obj_ident) = member.obj.as_ref() else {
        return AttrValue::Null;
    };
    let Some(parent) = graph.entity_id(obj_ident.sym.as_ref()) else {
        return AttrValue::Null;
    };
    // A literal attribute already present on the parent (e.g. `bucket.name`
    // where `name: "data"` was declared) resolves to that literal value
    // rather than a symbolic AttrRef; only truly intrinsic attributes
    // (not present in the parent's own declared attrs) become AttrRefs.
    if let Some((_, declarable)) = graph.entity_by_id(parent) {
        if let Some(literal) = declarable.attr(prop.sym.as_ref()) {
            if !matches!(literal, AttrValue::AttrRef(_) | AttrValue::EntityRef(_)) {
                return literal.clone();
            }
        }
    }
    AttrValue::AttrRef(AttrRef::new(parent, prop.sym.as_ref()))
}

fn prop_name(name: &PropName) -> Option<String> {
    match name {
        PropName::Ident(id) => Some(id.sym.as_ref().to_string()),
        PropName::Str(s) => Some(s.value.to_atom_lossy().to_string()),
        _ => None,
    }
}
