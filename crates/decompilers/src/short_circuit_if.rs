use module_graph::ModuleGraph;
use plugin_core::{DecompilerPlugin, ModuleCtx, PluginImpl};
use swc_ecma_ast::{BinaryOp, Expr, ExprStmt, IfStmt, ModuleItem, Stmt};

/// Recovers a guard `if` from the short-circuit-`&&` idiom minifiers emit in
/// its place (§4.7 rule 7): `cond && doThing();` becomes
/// `if (cond) doThing();`. Only fires at statement position - `&&` used for
/// its value (an assignment's right-hand side, a call argument, ...) is a
/// real expression and stays one.
pub struct ShortCircuitIfDecompiler;

impl PluginImpl for ShortCircuitIfDecompiler {
    fn name(&self) -> &'static str {
        "short_circuit_if_decompiler"
    }

    fn priority(&self) -> i32 {
        -50
    }

    fn on_stmts(&self, _graph: &ModuleGraph, _ctx: &mut ModuleCtx<'_>, stmts: &mut Vec<Stmt>) -> bool {
        let mut mutated = false;
        for stmt in stmts.iter_mut() {
            if let Some(rewritten) = try_rewrite(stmt) {
                *stmt = rewritten;
                mutated = true;
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
        for item in items.iter_mut() {
            let ModuleItem::Stmt(stmt) = item else { continue };
            if let Some(rewritten) = try_rewrite(stmt) {
                *item = ModuleItem::Stmt(rewritten);
                mutated = true;
            }
        }
        mutated
    }
}

impl DecompilerPlugin for ShortCircuitIfDecompiler {}

fn try_rewrite(stmt: &Stmt) -> Option<Stmt> {
    let Stmt::Expr(expr_stmt) = stmt else {
        return None;
    };
    let Expr::Bin(bin) = &*expr_stmt.expr else {
        return None;
    };
    if bin.op != BinaryOp::LogicalAnd {
        return None;
    }
    Some(Stmt::If(IfStmt {
        span: expr_stmt.span,
        test: bin.left.clone(),
        cons: Box::new(Stmt::Expr(ExprStmt {
            span: expr_stmt.span,
            expr: bin.right.clone(),
        })),
        alt: None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bundle_ast::{parse_program, print_module};
    use plugin_core::{PluginRegistry, Router};
    use pretty_assertions::assert_eq;

    fn run(src: &str) -> String {
        let (cm, comments, mut module) = parse_program(
            "bundle.js",
            &format!("__d(function(g,r,id,ia,m,e,d){{ {src} }}, 0);"),
        )
        .unwrap();
        let (mut graph, _errors) =
            module_graph::ModuleGraph::from_bundle(&mut module, &cm).unwrap();
        let registry = PluginRegistry::builder()
            .decompiler(ShortCircuitIfDecompiler)
            .build();
        let router = Router::new(&registry);
        let mut m = graph.take(0).unwrap();
        router
            .run_pass(&graph, &mut m, plugin_core::PassKind::Decompiler)
            .unwrap();
        print_module(&cm, &m.module_code, Some(&comments)).unwrap()
    }

    #[test]
    fn rewrites_statement_position_logical_and_to_if() {
        let out = run("cond && doThing();");
        assert_eq!(out, "if (cond) doThing();\n");
    }

    #[test]
    fn leaves_logical_and_used_as_a_value_untouched() {
        let out = run("var y = cond && doThing();");
        assert_eq!(out, "var y = cond && doThing();\n");
    }

    #[test]
    fn leaves_unrelated_statement_untouched() {
        let out = run("doThing();");
        assert_eq!(out, "doThing();\n");
    }
}
