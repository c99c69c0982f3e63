use module_graph::ModuleGraph;
use plugin_core::{ModuleCtx, EditorPlugin, PluginImpl};
use swc_atoms::Atom;
use swc_ecma_ast::{Decl, Expr, Ident, ModuleItem, Stmt, VarDeclKind};
use swc_ecma_visit::{VisitMut, VisitMutWith};

/// Inlines the minified alias pattern `var _x = x; ...only uses of _x...`
/// by substituting `x` at every later read of `_x` within the same
/// statement list, then dropping the now-dead declaration.
///
/// Conservative by construction: it only fires when the declaration's
/// initializer is itself a bare identifier (a rename, not an arbitrary
/// expression), which is the only shape Metro's minifier produces for this
/// kind of alias.
pub struct TrivialAliasInlineEditor;

impl PluginImpl for TrivialAliasInlineEditor {
    fn name(&self) -> &'static str {
        "trivial_alias_inline_editor"
    }

    fn priority(&self) -> i32 {
        10
    }

    fn on_stmts(&self, _graph: &ModuleGraph, _ctx: &mut ModuleCtx<'_>, stmts: &mut Vec<Stmt>) -> bool {
        let mut mutated = false;
        let mut i = 0;
        while i < stmts.len() {
            let alias = trivial_alias_decl(&stmts[i]);
            let Some((alias_name, target_name)) = alias else {
                i += 1;
                continue;
            };

            let mut renamer = RenameIdent {
                from: alias_name.clone(),
                to: target_name,
                renamed: 0,
            };
            for stmt in &mut stmts[i + 1..] {
                stmt.visit_mut_with(&mut renamer);
            }

            if renamer.renamed > 0 {
                stmts.remove(i);
                mutated = true;
                // Don't advance `i`: the statement that slid into this
                // index might itself be another alias to inline.
            } else {
                i += 1;
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
            let alias = match &items[i] {
                ModuleItem::Stmt(stmt) => trivial_alias_decl(stmt),
                _ => None,
            };
            let Some((alias_name, target_name)) = alias else {
                i += 1;
                continue;
            };

            let mut renamer = RenameIdent {
                from: alias_name.clone(),
                to: target_name,
                renamed: 0,
            };
            for item in &mut items[i + 1..] {
                item.visit_mut_with(&mut renamer);
            }

            if renamer.renamed > 0 {
                items.remove(i);
                mutated = true;
                // Don't advance `i`: the item that slid into this index
                // might itself be another alias to inline.
            } else {
                i += 1;
            }
        }
        mutated
    }
}

impl EditorPlugin for TrivialAliasInlineEditor {}

/// If `stmt` is `var _x = x;` (a single declarator, bare-identifier
/// initializer), returns `(_x, x)`. Anything else - multiple declarators,
/// a non-identifier initializer, no initializer - returns `None`.
fn trivial_alias_decl(stmt: &Stmt) -> Option<(Atom, Atom)> {
    let Stmt::Decl(Decl::Var(var_decl)) = stmt else {
        return None;
    };
    if var_decl.kind != VarDeclKind::Var {
        return None;
    }
    let [decl] = var_decl.decls.as_slice() else {
        return None;
    };
    let name = decl.name.as_ident()?.id.sym.clone();
    let init = decl.init.as_deref()?;
    let Expr::Ident(target) = init else {
        return None;
    };
    if target.sym == name {
        return None;
    }
    Some((name, target.sym.clone()))
}

struct RenameIdent {
    from: Atom,
    to: Atom,
    renamed: usize,
}

impl VisitMut for RenameIdent {
    fn visit_mut_ident(&mut self, ident: &mut Ident) {
        if ident.sym == self.from {
            ident.sym = self.to.clone();
            self.renamed += 1;
        }
    }
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
        let registry = PluginRegistry::builder()
            .editor(TrivialAliasInlineEditor)
            .build();
        let router = Router::new(&registry);
        let mut m = graph.take(0).unwrap();
        router
            .run_pass(&graph, &mut m, plugin_core::PassKind::Editor)
            .unwrap();
        print_module(&cm, &m.module_code, Some(&comments)).unwrap()
    }

    #[test]
    fn inlines_single_use_alias() {
        let out = run_editor("var x = 1; var _x = x; foo(_x);");
        assert_eq!(out, "var x = 1;\nfoo(x);\n");
    }

    #[test]
    fn inlines_alias_used_more_than_once() {
        let out = run_editor("var x = 1; var _x = x; foo(_x); bar(_x);");
        assert_eq!(out, "var x = 1;\nfoo(x);\nbar(x);\n");
    }

    #[test]
    fn leaves_non_identifier_initializer_untouched() {
        let out = run_editor("var _x = foo(); bar(_x);");
        assert_eq!(out, "var _x = foo();\nbar(_x);\n");
    }

    #[test]
    fn leaves_unused_alias_untouched() {
        let out = run_editor("var x = 1; var _x = x;");
        assert_eq!(out, "var x = 1;\nvar _x = x;\n");
    }
}
