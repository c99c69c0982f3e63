use module_graph::ModuleGraph;
use plugin_core::{DecompilerPlugin, ModuleCtx, PluginImpl};
use swc_ecma_ast::{Expr, ExprStmt, ModuleItem, Stmt};

/// Splits a statement-position comma (sequence) expression into one
/// statement per operand (§4.7 rule 6): `a(), b(), c;` becomes three
/// separate statements. Only fires when the whole statement is a bare
/// sequence expression - a sequence nested inside a larger expression
/// (e.g. a `for` loop's update clause) is left for the reader, since
/// splitting it there would change what the code evaluates to.
pub struct SequenceSplitDecompiler;

impl PluginImpl for SequenceSplitDecompiler {
    fn name(&self) -> &'static str {
        "sequence_split_decompiler"
    }

    fn priority(&self) -> i32 {
        -60
    }

    fn on_stmts(&self, _graph: &ModuleGraph, _ctx: &mut ModuleCtx<'_>, stmts: &mut Vec<Stmt>) -> bool {
        let mut mutated = false;
        let mut i = 0;
        while i < stmts.len() {
            match split_sequence_stmt(&stmts[i]) {
                Some(split) => {
                    let n = split.len();
                    stmts.splice(i..i + 1, split);
                    mutated = true;
                    i += n;
                }
                None => i += 1,
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
            let ModuleItem::Stmt(stmt) = &items[i] else {
                i += 1;
                continue;
            };
            match split_sequence_stmt(stmt) {
                Some(split) => {
                    let n = split.len();
                    items.splice(i..i + 1, split.into_iter().map(ModuleItem::Stmt));
                    mutated = true;
                    i += n;
                }
                None => i += 1,
            }
        }
        mutated
    }
}

impl DecompilerPlugin for SequenceSplitDecompiler {}

fn split_sequence_stmt(stmt: &Stmt) -> Option<Vec<Stmt>> {
    let Stmt::Expr(expr_stmt) = stmt else {
        return None;
    };
    let Expr::Seq(seq) = &*expr_stmt.expr else {
        return None;
    };
    if seq.exprs.len() < 2 {
        return None;
    }
    Some(
        seq.exprs
            .iter()
            .map(|expr| {
                Stmt::Expr(ExprStmt {
                    span: expr_stmt.span,
                    expr: expr.clone(),
                })
            })
            .collect(),
    )
}
