use module_graph::ModuleGraph;
use plugin_core::{DecompilerPlugin, ModuleCtx, PluginImpl};
use swc_ecma_ast::{
    AssignTarget, Expr, ModuleItem, SimpleAssignTarget, Stmt,
};

use crate::synth::parse_item;

/// Recovers `export` syntax from the Metro/CommonJS exports convention
/// (§4.7 rule 3):
///
/// - `module.exports = E;` -> `export default E;`
/// - `exports.X = E;` -> `export { E as X };` when `E` is itself a bare
///   identifier (the only shape a named-export specifier can reference
///   without introducing a new binding), otherwise `export const X = E;`.
///
/// Only fires at the top level, which is where Metro always emits the
/// module's exports assignment.
pub struct ExportsRewriteDecompiler;

impl PluginImpl for ExportsRewriteDecompiler {
    fn name(&self) -> &'static str {
        "exports_rewrite_decompiler"
    }

    fn priority(&self) -> i32 {
        -90
    }

    fn on_module_items(
        &self,
        _graph: &ModuleGraph,
        ctx: &mut ModuleCtx<'_>,
        items: &mut Vec<ModuleItem>,
    ) -> bool {
        let mut mutated = false;
        for item in items.iter_mut() {
            if let Some(rewritten) = try_rewrite(ctx, item) {
                *item = rewritten;
                mutated = true;
            }
        }
        mutated
    }
}

impl DecompilerPlugin for ExportsRewriteDecompiler {}

fn try_rewrite(ctx: &ModuleCtx<'_>, item: &ModuleItem) -> Option<ModuleItem> {
    let ModuleItem::Stmt(Stmt::Expr(expr_stmt)) = item else {
        return None;
    };
    let Expr::Assign(assign) = &*expr_stmt.expr else {
        return None;
    };
    let AssignTarget::Simple(SimpleAssignTarget::Member(member)) = &assign.left else {
        return None;
    };
    let Expr::Ident(obj) = &*member.obj else {
        return None;
    };
    let prop_name = member.prop.as_ident()?.sym.as_str();

    if obj.sym == ctx.factory_params.module && prop_name == "exports" {
        let rendered = render_printable(&assign.right);
        return Some(parse_item(&format!("export default {rendered};")));
    }

    if obj.sym == ctx.factory_params.exports {
        return match &*assign.right {
            Expr::Ident(value_ident) => Some(parse_item(&format!(
                "export {{ {} as {} }};",
                value_ident.sym, prop_name
            ))),
            other => {
                let rendered = render_printable(other);
                Some(parse_item(&format!("export const {prop_name} = {rendered};")))
            }
        };
    }

    None
}

/// Renders an already-parsed expression back to source text so it can be
/// embedded in a synthesized `export ...` snippet. The expression came
/// from this same bundle's parse, so it always round-trips.
fn render_printable(expr: &Expr) -> String {
    use swc_ecma_ast::{ExprStmt, ModuleItem, Stmt};
    let wrapper = swc_ecma_ast::Module {
        span: swc_common::DUMMY_SP,
        shebang: None,
        body: vec![ModuleItem::Stmt(Stmt::Expr(ExprStmt {
            span: swc_common::DUMMY_SP,
            expr: Box::new(expr.clone()),
        }))],
    };
    let cm: swc_common::sync::Lrc<swc_common::SourceMap> = Default::default();
    let printed = bundle_ast::print_module(&cm, &wrapper, None).expect("expression must print");
    printed.trim_end().trim_end_matches(';').to_string()
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
            .decompiler(ExportsRewriteDecompiler)
            .build();
        let router = Router::new(&registry);
        let mut m = graph.take(0).unwrap();
        router
            .run_pass(&graph, &mut m, plugin_core::PassKind::Decompiler)
            .unwrap();
        print_module(&cm, &m.module_code, Some(&comments)).unwrap()
    }

    #[test]
    fn module_exports_becomes_export_default() {
        let out = run("m.exports = 42;");
        assert_eq!(out, "export default 42;\n");
    }

    #[test]
    fn exports_named_identifier_becomes_named_export() {
        let out = run("function Foo(){} e.Foo = Foo;");
        assert_eq!(out, "function Foo() {\n}\nexport { Foo as Foo };\n");
    }

    #[test]
    fn exports_non_identifier_becomes_export_const() {
        let out = run("e.Foo = 42;");
        assert_eq!(out, "export const Foo = 42;\n");
    }
}
