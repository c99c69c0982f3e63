//! Parsing, printing, and a mutable-traversal facade around the third-party
//! ECMAScript toolkit so that every other crate in the workspace sees a
//! small, closed set of node kinds instead of the full AST surface.
//!
//! The router (in `plugin_core`) dispatches per-node to plugins without
//! knowing the underlying visitor crate exists; this crate is the only place
//! that imports `swc_ecma_visit` directly.

use std::fmt;

use decompiler_errors::{DecompileError, Result};
use swc_common::comments::SingleThreadedComments;
use swc_common::sync::Lrc;
use swc_common::{FileName, SourceMap};
use swc_compiler_base::PrintArgs;
use swc_ecma_ast::{AssignExpr, CallExpr, Module, ModuleItem, Stmt, VarDecl};
use swc_ecma_parser::lexer::Lexer;
use swc_ecma_parser::{Capturing, Parser, StringInput, Syntax, TsSyntax};
use swc_ecma_visit::{VisitMut, VisitMutWith};

pub use swc_ecma_ast as ast;

/// Parse a single source file (either the whole bundle, on first load, or a
/// single module's working body, when re-parsing after printing) into an AST
/// plus the source map and comment store the printer needs to reproduce the
/// original text faithfully.
pub fn parse_program(
    source_name: &str,
    src: &str,
) -> Result<(Lrc<SourceMap>, SingleThreadedComments, Module)> {
    let cm = Lrc::<SourceMap>::default();
    let fname = Lrc::new(FileName::Custom(source_name.to_string()));
    let fm = cm.new_source_file(fname, src.to_string());
    let comments = SingleThreadedComments::default();

    let lexer = Lexer::new(
        Syntax::Typescript(TsSyntax {
            tsx: source_name.ends_with(".tsx") || source_name.ends_with(".jsx"),
            decorators: true,
            ..Default::default()
        }),
        Default::default(),
        StringInput::from(&*fm),
        Some(&comments),
    );
    let capturing = Capturing::new(lexer);
    let mut parser = Parser::new_from(capturing);

    let module = parser
        .parse_typescript_module()
        .map_err(|e| DecompileError::ParseError {
            source_name: source_name.to_string(),
            reason: format!("{e:?}"),
        })?;

    Ok((cm, comments, module))
}

/// Render a whole-bundle `Module` back to source text. Used for the
/// bundle-level parse round-trip (tests, and any tooling that wants to
/// re-emit the bundle shell itself rather than a single decompiled module).
pub fn print_module(
    cm: &Lrc<SourceMap>,
    module: &Module,
    comments: Option<&SingleThreadedComments>,
) -> Result<String> {
    let print_args = PrintArgs {
        comments: comments.map(|c| c as &dyn swc_common::comments::Comments),
        ..Default::default()
    };
    swc_compiler_base::print(cm.clone(), module, print_args)
        .map(|out| out.code)
        .map_err(|e| DecompileError::ParseError {
            source_name: "<print>".to_string(),
            reason: e.to_string(),
        })
}

/// The closed set of node kinds plugins may register interest in. Adding a
/// kind here means adding the matching `visit_mut_*` override below and the
/// matching `Dispatch` method; nothing else in the workspace reaches into
/// `swc_ecma_ast` node-by-node like this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Module,
    VarDecl,
    CallExpr,
    AssignExpr,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NodeKind::Module => "Module",
            NodeKind::VarDecl => "VarDecl",
            NodeKind::CallExpr => "CallExpr",
            NodeKind::AssignExpr => "AssignExpr",
        })
    }
}

/// A mutable reference to one AST node, narrowed to the kinds plugins care
/// about. Plugins match on this instead of the underlying `swc_ecma_ast`
/// enum so that widening the node set later doesn't ripple through every
/// plugin's match arms unless they actually need the new kind.
pub enum NodeMut<'a> {
    Module(&'a mut Module),
    VarDecl(&'a mut VarDecl),
    CallExpr(&'a mut CallExpr),
    AssignExpr(&'a mut AssignExpr),
}

impl<'a> NodeMut<'a> {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeMut::Module(_) => NodeKind::Module,
            NodeMut::VarDecl(_) => NodeKind::VarDecl,
            NodeMut::CallExpr(_) => NodeKind::CallExpr,
            NodeMut::AssignExpr(_) => NodeKind::AssignExpr,
        }
    }

    /// Reborrows the underlying mutable reference with a shorter lifetime,
    /// so the same node can be handed to several plugins in sequence - each
    /// sees the previous plugin's mutation, none can outlive the traversal
    /// step that produced it.
    pub fn reborrow(&mut self) -> NodeMut<'_> {
        match self {
            NodeMut::Module(m) => NodeMut::Module(&mut **m),
            NodeMut::VarDecl(v) => NodeMut::VarDecl(&mut **v),
            NodeMut::CallExpr(c) => NodeMut::CallExpr(&mut **c),
            NodeMut::AssignExpr(a) => NodeMut::AssignExpr(&mut **a),
        }
    }
}

/// A cursor handed to plugins alongside a `NodeMut`. Plugins call `skip()`
/// to stop the traversal descending into the node's children this pass -
/// used by decompilers that just rewrote a node into its final shape and
/// don't want an editor mistaking the replacement for fresh input.
#[derive(Default)]
pub struct NodePath<'a> {
    skip_children: bool,
    _marker: std::marker::PhantomData<&'a ()>,
}

impl<'a> NodePath<'a> {
    pub fn new() -> Self {
        Self {
            skip_children: false,
            _marker: std::marker::PhantomData,
        }
    }

    pub fn skip(&mut self) {
        self.skip_children = true;
    }

    pub fn should_skip(&self) -> bool {
        self.skip_children
    }
}

/// What a plugin pass implements against. The router drives a
/// `DispatchVisitor` wrapping one `&mut dyn Dispatch` per pass; everything
/// the pass does to the AST happens through these callbacks.
pub trait Dispatch {
    /// Called for every node kind in `NodeKind`, in pre-order. Return `true`
    /// if the node was mutated, so the router can detect a settled pass.
    fn on_node(&mut self, node: NodeMut<'_>, path: &mut NodePath<'_>) -> bool;

    /// Called once per statement list (function bodies, blocks, the module's
    /// top level is handled via `on_module_items` instead). Editors use this
    /// to merge, split, or drop statements - the container-level rewrites a
    /// single-node `on_node` callback can't express.
    fn on_stmts(&mut self, _stmts: &mut Vec<Stmt>) -> bool {
        false
    }

    /// Called once for the module's top-level item list. Decompilers use
    /// this to turn a `Stmt` into a `ModuleDecl` (`require(...)` into
    /// `import`, `module.exports =` into `export default`) since that's a
    /// change of list element type `VisitMut` can't express through a plain
    /// node-in-place mutation.
    fn on_module_items(&mut self, _items: &mut Vec<ModuleItem>) -> bool {
        false
    }
}

/// Drives a single `Dispatch` over an AST with `swc_ecma_visit::VisitMut`.
/// Tracks whether anything was mutated so the router can tell a settled
/// pass from one that still has work to do.
pub struct DispatchVisitor<'d> {
    dispatch: &'d mut dyn Dispatch,
    pub any_mutated: bool,
}

impl<'d> DispatchVisitor<'d> {
    pub fn new(dispatch: &'d mut dyn Dispatch) -> Self {
        Self {
            dispatch,
            any_mutated: false,
        }
    }

    /// Returns `true` if the plugin asked to skip this node's children.
    fn dispatch_node(&mut self, node: NodeMut<'_>) -> bool {
        let mut path = NodePath::new();
        if self.dispatch.on_node(node, &mut path) {
            self.any_mutated = true;
        }
        path.should_skip()
    }
}

impl VisitMut for DispatchVisitor<'_> {
    fn visit_mut_module(&mut self, module: &mut Module) {
        if !self.dispatch_node(NodeMut::Module(module)) {
            module.visit_mut_children_with(self);
        }
    }

    fn visit_mut_module_items(&mut self, items: &mut Vec<ModuleItem>) {
        if self.dispatch.on_module_items(items) {
            self.any_mutated = true;
        }
        items.visit_mut_children_with(self);
    }

    fn visit_mut_stmts(&mut self, stmts: &mut Vec<Stmt>) {
        if self.dispatch.on_stmts(stmts) {
            self.any_mutated = true;
        }
        stmts.visit_mut_children_with(self);
    }

    fn visit_mut_var_decl(&mut self, var_decl: &mut VarDecl) {
        if !self.dispatch_node(NodeMut::VarDecl(var_decl)) {
            var_decl.visit_mut_children_with(self);
        }
    }

    fn visit_mut_call_expr(&mut self, call_expr: &mut CallExpr) {
        if !self.dispatch_node(NodeMut::CallExpr(call_expr)) {
            call_expr.visit_mut_children_with(self);
        }
    }

    fn visit_mut_assign_expr(&mut self, assign_expr: &mut AssignExpr) {
        if !self.dispatch_node(NodeMut::AssignExpr(assign_expr)) {
            assign_expr.visit_mut_children_with(self);
        }
    }
}

/// Run one `Dispatch` pass over a module, returning whether anything in the
/// AST was mutated. The router calls this in a loop until it returns
/// `false`, or the fixpoint cap is hit.
pub fn run_dispatch(module: &mut Module, dispatch: &mut dyn Dispatch) -> bool {
    let mut visitor = DispatchVisitor::new(dispatch);
    module.visit_mut_with(&mut visitor);
    visitor.any_mutated
}
