use module_graph::ModuleGraph;
use plugin_core::{ModuleCtx, EditorPlugin, PluginImpl};
use swc_ecma_ast::{Decl, ModuleItem, Stmt, VarDeclKind};

/// Merges adjacent `var` declarations into one:
/// `var a = 1; var b = 2;` becomes `var a = 1, b = 2;`. Only merges
/// statement-adjacent `var` decls (not `let`/`const`, which Metro's ES5
/// output never emits) so the rewrite can never reorder a temporal-dead-zone
/// initializer across a declaration it didn't originally follow.
pub struct ConsecutiveVarMergeEditor;

impl PluginImpl for ConsecutiveVarMergeEditor {
    fn name(&self) -> &'static str {
        "consecutive_var_merge_editor"
    }

    fn priority(&self) -> i32 {
        0
    }

    fn on_stmts(&self, _graph: &ModuleGraph, _ctx: &mut ModuleCtx<'_>, stmts: &mut Vec<Stmt>) -> bool {
        merge_consecutive_vars(stmts)
    }

    fn on_module_items(
        &self,
        _graph: &ModuleGraph,
        _ctx: &mut ModuleCtx<'_>,
        items: &mut Vec<ModuleItem>,
    ) -> bool {
        let mut mutated = false;
        let mut i = 0;
        while i + 1 < items.len() {
            let merged_decls = match (&items[i], &items[i + 1]) {
                (
                    ModuleItem::Stmt(Stmt::Decl(Decl::Var(first))),
                    ModuleItem::Stmt(Stmt::Decl(Decl::Var(second))),
                ) if first.kind == VarDeclKind::Var && second.kind == VarDeclKind::Var => {
                    Some(second.decls.clone())
                }
                _ => None,
            };

            if let Some(decls) = merged_decls {
                if let ModuleItem::Stmt(Stmt::Decl(Decl::Var(first))) = &mut items[i] {
                    first.decls.extend(decls);
                }
                items.remove(i + 1);
                mutated = true;
                continue;
            }
            i += 1;
        }
        mutated
    }
}

impl EditorPlugin for ConsecutiveVarMergeEditor {}

/// Shared merge logic for a `Vec<Stmt>` (nested blocks/function bodies);
/// the module's top-level item list runs the same rule through
/// `on_module_items` instead, since its elements are `ModuleItem`, not
/// `Stmt`.
fn merge_consecutive_vars(stmts: &mut Vec<Stmt>) -> bool {
    let mut mutated = false;
    let mut i = 0;
    while i + 1 < stmts.len() {
        let merged_decls = match (&stmts[i], &stmts[i + 1]) {
            (
                Stmt::Decl(Decl::Var(first)),
                Stmt::Decl(Decl::Var(second)),
            ) if first.kind == VarDeclKind::Var && second.kind == VarDeclKind::Var => {
                Some(second.decls.clone())
            }
            _ => None,
        };

        if let Some(decls) = merged_decls {
            if let Stmt::Decl(Decl::Var(first)) = &mut stmts[i] {
                first.decls.extend(decls);
            }
            stmts.remove(i + 1);
            mutated = true;
            // Re-examine position `i`: the statement after the removed
            // one might itself be another `var` to merge in.
            continue;
        }
        i += 1;
    }
    mutated
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
            .editor(ConsecutiveVarMergeEditor)
            .build();
        let router = Router::new(&registry);
        let mut m = graph.take(0).unwrap();
        router
            .run_pass(&graph, &mut m, plugin_core::PassKind::Editor)
            .unwrap();
        print_module(&cm, &m.module_code, Some(&comments)).unwrap()
    }

    #[test]
    fn merges_three_consecutive_var_decls() {
        let out = run_editor("var a = 1; var b = 2; var c = 3;");
        assert_eq!(out, "var a = 1, b = 2, c = 3;\n");
    }

    #[test]
    fn does_not_merge_across_an_unrelated_statement() {
        let out = run_editor("var a = 1; foo(); var b = 2;");
        assert_eq!(out, "var a = 1;\nfoo();\nvar b = 2;\n");
    }
}
