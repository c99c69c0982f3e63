use bundle_ast::{NodeKind, NodeMut, NodePath};
use module_graph::ModuleGraph;
use swc_ecma_ast::{ModuleItem, Stmt};

use crate::context::ModuleCtx;

/// Shared shape every plugin implements, regardless of which pass family it
/// belongs to. `TaggerPlugin`/`EditorPlugin`/`DecompilerPlugin` are empty
/// marker traits over this one; `Plugin` tags a boxed `dyn PluginImpl` with
/// which family it came from so the router can group by pass without
/// needing three separate trait-object vtables per call site.
pub trait PluginImpl: Send + Sync {
    /// Used in performance reports and as the tie-break identity when two
    /// plugins are registered at the same priority.
    fn name(&self) -> &'static str;

    /// Lower runs first within a pass. Ties are broken by registration
    /// order (the registry uses a stable sort).
    fn priority(&self) -> i32 {
        0
    }

    /// Node kinds this plugin wants `on_node` called for. An empty slice
    /// means the plugin only implements the whole-module or container-level
    /// hooks below.
    fn node_kinds(&self) -> &'static [NodeKind] {
        &[]
    }

    /// Called for each node whose kind is in `node_kinds()`, in pre-order.
    /// Returns whether the node was mutated.
    fn on_node(
        &self,
        _graph: &ModuleGraph,
        _ctx: &mut ModuleCtx<'_>,
        _node: NodeMut<'_>,
        _path: &mut NodePath<'_>,
    ) -> bool {
        false
    }

    /// Called once per statement list in the module (function bodies,
    /// blocks). Editors use this for rewrites that add, remove, or merge
    /// statements rather than mutating one in place.
    fn on_stmts(&self, _graph: &ModuleGraph, _ctx: &mut ModuleCtx<'_>, _stmts: &mut Vec<Stmt>) -> bool {
        false
    }

    /// Called once for the module's top-level item list. Decompilers use
    /// this to turn a `Stmt` into a `ModuleDecl`.
    fn on_module_items(
        &self,
        _graph: &ModuleGraph,
        _ctx: &mut ModuleCtx<'_>,
        _items: &mut Vec<ModuleItem>,
    ) -> bool {
        false
    }

    /// Called once per traversal iteration, before node-level dispatch.
    /// Used by plugins whose interest is the module as a whole (e.g. an
    /// ignore-classification tagger keyed on `moduleName`) rather than any
    /// particular node shape.
    fn on_whole_module(&self, _graph: &ModuleGraph, _ctx: &mut ModuleCtx<'_>) -> bool {
        false
    }
}

pub trait TaggerPlugin: PluginImpl {}
pub trait EditorPlugin: PluginImpl {}
pub trait DecompilerPlugin: PluginImpl {}
