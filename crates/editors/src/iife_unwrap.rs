use module_graph::ModuleGraph;
use plugin_core::{ModuleCtx, EditorPlugin, PluginImpl};
use swc_ecma_ast::{CallExpr, Callee, Expr, Function, ModuleItem, Stmt};

/// Unwraps the single common Metro IIFE shape at statement position:
/// `(function(){ ...body... })();` with no arguments and no captured return
/// value becomes `...body...` spliced directly into the surrounding list.
///
/// Only fires when the body has no top-level `return` - a `return` inside
/// the IIFE stops the IIFE, but would stop the *enclosing* function if the
/// wrapper were simply removed, so that shape is left untouched rather than
/// risking a behavior change.
pub struct IifeUnwrapEditor;

impl PluginImpl for IifeUnwrapEditor {
    fn name(&self) -> &'static str {
        "iife_unwrap_editor"
    }

    fn priority(&self) -> i32 {
        20
    }

    fn on_stmts(&self, _graph: &ModuleGraph, _ctx: &mut ModuleCtx<'_>, stmts: &mut Vec<Stmt>) -> bool {
        let mut mutated = false;
        let mut i = 0;
        while i < stmts.len() {
            match unwrappable_iife_body(&stmts[i]) {
                Some(body) if !contains_top_level_return(body) => {
                    let body_stmts = body.stmts.clone();
                    let n = body_stmts.len();
                    stmts.splice(i..i + 1, body_stmts);
                    mutated = true;
                    i += n;
                }
                _ => i += 1,
            }
        }
        mutated
    }

    fn on_module_items(
        &self,
        _graph: &ModuleGraph,
        _ctx: &mut ModuleCtx<'_>,
        items: &mut Vec<ModuleItem>,
    ) -> bool {
        let mut mutated = false;
        let mut i = 0;
        while i < items.len() {
            let body = match &items[i] {
                ModuleItem::Stmt(stmt) => unwrappable_iife_body(stmt),
                _ => None,
            };
            match body {
                Some(body) if !contains_top_level_return(body) => {
                    let body_stmts = body.stmts.clone();
                    let n = body_stmts.len();
                    items.splice(i..i + 1, body_stmts.into_iter().map(ModuleItem::Stmt));
                    mutated = true;
                    i += n;
                }
                _ => i += 1,
            }
        }
        mutated
    }
}

impl EditorPlugin for IifeUnwrapEditor {}

/// If `stmt` is an expression statement whose expression is a zero-argument
/// call of a parameterless function expression (optionally parenthesized),
/// returns the function's body.
fn unwrappable_iife_body(stmt: &Stmt) -> Option<&swc_ecma_ast::BlockStmt> {
    let Stmt::Expr(expr_stmt) = stmt else {
        return None;
    };
    let Expr::Call(CallExpr { callee, args, .. }) = &*expr_stmt.expr else {
        return None;
    };
    if !args.is_empty() {
        return None;
    }
    let Callee::Expr(callee_expr) = callee else {
        return None;
    };
    let func = unwrap_parens(callee_expr)?;
    let Expr::Fn(fn_expr) = func else {
        return None;
    };
    let Function { params, body, .. } = &*fn_expr.function;
    if !params.is_empty() {
        return None;
    }
    body.as_ref()
}

fn unwrap_parens(mut expr: &Expr) -> Option<&Expr> {
    while let Expr::Paren(paren) = expr {
        expr = &paren.expr;
    }
    Some(expr)
}

/// True if `block`'s own statement list contains a `return` - does not
/// descend into nested function bodies, since a `return` there belongs to
/// that nested function, not the IIFE being unwrapped.
fn contains_top_level_return(block: &swc_ecma_ast::BlockStmt) -> bool {
    block.stmts.iter().any(|s| matches!(s, Stmt::Return(_)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bundle_ast::{parse_program, print_module};
    use plugin_core::{PluginRegistry, Router};
    use pretty_assertions::assert_eq;

    fn run_editor(src: &str) -> String {
        let (cm, comments, mut module) = parse_program(
            "bundle.js",
            &format!("__d(function(g,r,id,ia,m,e,d){{ {src} }}, 0);"),
        )
        .unwrap();
        let (mut graph, _errors) =
            module_graph::ModuleGraph::from_bundle(&mut module, &cm).unwrap();
        let registry = PluginRegistry::builder().editor(IifeUnwrapEditor).build();
        let router = Router::new(&registry);
        let mut m = graph.take(0).unwrap();
        router
            .run_pass(&graph, &mut m, plugin_core::PassKind::Editor)
            .unwrap();
        print_module(&cm, &m.module_code, Some(&comments)).unwrap()
    }

    #[test]
    fn unwraps_simple_iife() {
        let out = run_editor("(function(){ foo(); bar(); })();");
        assert_eq!(out, "foo();\nbar();\n");
    }

    #[test]
    fn leaves_iife_with_top_level_return_untouched() {
        let out = run_editor("(function(){ if (a) return; foo(); })();");
        assert_eq!(out, "(function() {\n    if (a) return;\n    foo();\n})();\n");
    }

    #[test]
    fn leaves_iife_with_arguments_untouched() {
        let out = run_editor("(function(x){ foo(x); })(1);");
        assert!(out.contains("(function(x)"));
    }
}
