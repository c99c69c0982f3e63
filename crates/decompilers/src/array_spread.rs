use module_graph::ModuleGraph;
use plugin_core::{DecompilerPlugin, ModuleCtx, PluginImpl};
use swc_common::DUMMY_SP;
use swc_ecma_ast::{ArrayLit, Callee, Expr, ExprOrSpread, ModuleItem, Stmt};
use swc_ecma_visit::{VisitMut, VisitMutWith};

/// Recovers array-spread syntax from the Babel-transpiled concat/helper
/// shape (§4.7 rule 5): `[].concat(toConsumableArray(x), [y], z)` becomes
/// `[...x, y, z]`. Bails on the whole call, leaving it untouched, unless
/// every argument is one of the three recognized shapes - a half-recovered
/// spread would be harder to read than the original.
pub struct ArraySpreadRecoveryDecompiler;

impl PluginImpl for ArraySpreadRecoveryDecompiler {
    fn name(&self) -> &'static str {
        "array_spread_recovery_decompiler"
    }

    fn priority(&self) -> i32 {
        -70
    }

    fn on_stmts(&self, _graph: &ModuleGraph, _ctx: &mut ModuleCtx<'_>, stmts: &mut Vec<Stmt>) -> bool {
        let mut visitor = ArraySpreadVisitor { mutated: false };
        for stmt in stmts.iter_mut() {
            stmt.visit_mut_with(&mut visitor);
        }
        visitor.mutated
    }

    fn on_module_items(
        &self,
        _graph: &ModuleGraph,
        _ctx: &mut ModuleCtx<'_>,
        items: &mut Vec<ModuleItem>,
    ) -> bool {
        let mut visitor = ArraySpreadVisitor { mutated: false };
        for item in items.iter_mut() {
            item.visit_mut_with(&mut visitor);
        }
        visitor.mutated
    }
}

impl DecompilerPlugin for ArraySpreadRecoveryDecompiler {}

struct ArraySpreadVisitor {
    mutated: bool,
}

impl VisitMut for ArraySpreadVisitor {
    fn visit_mut_expr(&mut self, expr: &mut Expr) {
        expr.visit_mut_children_with(self);
        if let Some(elems) = try_recover_spread(expr) {
            *expr = Expr::Array(ArrayLit {
                span: DUMMY_SP,
                elems: elems.into_iter().map(Some).collect(),
            });
            self.mutated = true;
        }
    }
}

fn try_recover_spread(expr: &Expr) -> Option<Vec<ExprOrSpread>> {
    let Expr::Call(call) = expr else { return None };
    let Callee::Expr(callee) = &call.callee else {
        return None;
    };
    let Expr::Member(member) = &**callee else {
        return None;
    };
    if member.prop.as_ident()?.sym.as_str() != "concat" {
        return None;
    }
    let Expr::Array(receiver) = &*member.obj else {
        return None;
    };
    if !receiver.elems.is_empty() {
        return None;
    }

    let mut out = Vec::with_capacity(call.args.len());
    for arg in &call.args {
        if arg.spread.is_some() {
            out.push(arg.clone());
            continue;
        }
        match &*arg.expr {
            Expr::Call(inner) if is_to_array_helper_call(inner) => {
                let [inner_arg] = inner.args.as_slice() else {
                    return None;
                };
                if inner_arg.spread.is_some() {
                    return None;
                }
                out.push(ExprOrSpread {
                    spread: Some(DUMMY_SP),
                    expr: inner_arg.expr.clone(),
                });
            }
            Expr::Array(inner_arr) => {
                for elem in &inner_arr.elems {
                    out.push(elem.clone()?);
                }
            }
            _ => return None,
        }
    }
    Some(out)
}

fn is_to_array_helper_call(call: &swc_ecma_ast::CallExpr) -> bool {
    if call.args.len() != 1 {
        return false;
    }
    let Callee::Expr(callee) = &call.callee else {
        return false;
    };
    let Expr::Ident(ident) = &**callee else {
        return false;
    };
    let name = ident.sym.as_str();
    name.contains("toConsumableArray") || name.contains("toArray")
}
