use module_graph::ModuleGraph;
use plugin_core::{DecompilerPlugin, ModuleCtx, PluginImpl};
use swc_ecma_ast::{Callee, Decl, Expr, ModuleItem, Stmt};

use crate::dep_resolve::{dependency_map_index, resolve_import_source};
use crate::synth::{parse_item, quote};

/// Recovers ES-module imports from the three Metro require-protocol calls
/// (§4.7 rules 1-2):
///
/// - `const X = require(dependencyMap[i])` -> `import X from '<src>'`
/// - `const X = importDefault(dependencyMap[i])` -> `import X from '<src>'`
/// - `const X = importAll(dependencyMap[i])` -> `import * as X from '<src>'`
///
/// Only fires at the top level of a module's statement list, which is
/// where Metro always emits these - a factory body that `require`s inside
/// a nested block is not a shape this bundler produces.
pub struct RequireToImportDecompiler;

enum Kind {
    Default,
    Namespace,
}

impl PluginImpl for RequireToImportDecompiler {
    fn name(&self) -> &'static str {
        "require_to_import_decompiler"
    }

    fn priority(&self) -> i32 {
        -100
    }

    fn on_module_items(
        &self,
        graph: &ModuleGraph,
        ctx: &mut ModuleCtx<'_>,
        items: &mut Vec<ModuleItem>,
    ) -> bool {
        let mut mutated = false;
        for item in items.iter_mut() {
            if let Some(rewritten) = try_rewrite(graph, ctx, item) {
                *item = rewritten;
                mutated = true;
            }
        }
        mutated
    }
}

impl DecompilerPlugin for RequireToImportDecompiler {}

fn try_rewrite(
    graph: &ModuleGraph,
    ctx: &ModuleCtx<'_>,
    item: &ModuleItem,
) -> Option<ModuleItem> {
    let ModuleItem::Stmt(Stmt::Decl(Decl::Var(var_decl))) = item else {
        return None;
    };
    let [decl] = var_decl.decls.as_slice() else {
        return None;
    };
    let local = decl.name.as_ident()?.id.sym.as_str();
    let Expr::Call(call) = decl.init.as_deref()? else {
        return None;
    };
    let Callee::Expr(callee) = &call.callee else {
        return None;
    };
    let Expr::Ident(callee_ident) = &**callee else {
        return None;
    };

    let kind = if callee_ident.sym == ctx.factory_params.require
        || callee_ident.sym == ctx.factory_params.import_default
    {
        Kind::Default
    } else if callee_ident.sym == ctx.factory_params.import_all {
        Kind::Namespace
    } else {
        return None;
    };

    let [arg] = call.args.as_slice() else {
        return None;
    };
    if arg.spread.is_some() {
        return None;
    }
    let dep_index = dependency_map_index(&arg.expr, &ctx.factory_params.dependency_map)?;
    let source = resolve_import_source(graph, ctx, dep_index)?;
    let quoted = quote(&source);

    let snippet = match kind {
        Kind::Default => format!("import {local} from {quoted};"),
        Kind::Namespace => format!("import * as {local} from {quoted};"),
    };
    Some(parse_item(&snippet))
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
            &format!(
                "__d(function(g,r,id,ia,m,e,d){{ m.exports=1; }}, 0);\
                 __d(function(g,r,id,ia,m,e,d){{ {src} }}, 1, [0]);"
            ),
        )
        .unwrap();
        let (mut graph, _errors) =
            module_graph::ModuleGraph::from_bundle(&mut module, &cm).unwrap();
        let registry = PluginRegistry::builder()
            .decompiler(RequireToImportDecompiler)
            .build();
        let router = Router::new(&registry);
        let mut m = graph.take(1).unwrap();
        router
            .run_pass(&graph, &mut m, plugin_core::PassKind::Decompiler)
            .unwrap();
        print_module(&cm, &m.module_code, Some(&comments)).unwrap()
    }

    #[test]
    fn rewrites_require_call_to_relative_path_import() {
        let out = run("const X = r(d[0]);");
        assert_eq!(out, "import X from './0';\n");
    }

    #[test]
    fn rewrites_import_all_to_namespace_import() {
        let out = run("const X = ia(d[0]);");
        assert_eq!(out, "import * as X from './0';\n");
    }

    #[test]
    fn leaves_unrelated_var_decl_untouched() {
        let out = run("const X = 1;");
        assert_eq!(out, "const X = 1;\n");
    }
}
