//! Plugin capability traits and the router that drives tagger, editor, and
//! decompiler passes over a module's working AST to a fixed point.

mod context;
mod plugin;
mod registry;
mod router;

pub use bundle_ast::{NodeKind, NodeMut, NodePath};
pub use context::ModuleCtx;
pub use decompiler_errors::PassKind;
pub use plugin::{DecompilerPlugin, EditorPlugin, PluginImpl, TaggerPlugin};
pub use registry::{PluginRegistry, PluginRegistryBuilder};
pub use router::{PassOutcome, Router, MAX_FIXPOINT_ITERATIONS};

#[cfg(test)]
mod tests {
    use super::*;
    use bundle_ast::{NodeMut, NodePath};
    use module_graph::ModuleGraph;
    use pretty_assertions::assert_eq;

    fn build_graph(src: &str) -> ModuleGraph {
        let (cm, _comments, mut module) = bundle_ast::parse_program("bundle.js", src).unwrap();
        ModuleGraph::from_bundle(&mut module, &cm).unwrap().0
    }

    struct TagCallsAsSeen;
    impl PluginImpl for TagCallsAsSeen {
        fn name(&self) -> &'static str {
            "tag_calls_as_seen"
        }
        fn node_kinds(&self) -> &'static [NodeKind] {
            &[NodeKind::CallExpr]
        }
        fn on_node(
            &self,
            _graph: &ModuleGraph,
            ctx: &mut ModuleCtx<'_>,
            _node: NodeMut<'_>,
            _path: &mut NodePath<'_>,
        ) -> bool {
            if ctx.has_tag("seen-call") {
                false
            } else {
                ctx.tag("seen-call");
                true
            }
        }
    }
    impl TaggerPlugin for TagCallsAsSeen {}

    #[test]
    fn router_runs_tagger_to_fixpoint_and_reports_no_further_mutation() {
        let mut graph = build_graph(
            "__d(function(g,r,id,ia,m,e,d){ foo(); bar(); }, 0);",
        );
        let registry = PluginRegistry::builder().tagger(TagCallsAsSeen).build();
        let router = Router::new(&registry);

        let mut module = graph.take(0).unwrap();
        let outcome = router
            .run_pass(&graph, &mut module, PassKind::Tagger)
            .unwrap();
        assert!(outcome.mutated);
        assert!(module.has_tag("seen-call"));
        // Second run over the already-tagged module makes no further
        // changes, so the pass settles in a single iteration.
        assert_eq!(outcome.iterations, 1);
    }

    struct NeverSettles;
    impl PluginImpl for NeverSettles {
        fn name(&self) -> &'static str {
            "never_settles"
        }
        fn node_kinds(&self) -> &'static [NodeKind] {
            &[NodeKind::CallExpr]
        }
        fn on_node(
            &self,
            _graph: &ModuleGraph,
            _ctx: &mut ModuleCtx<'_>,
            _node: NodeMut<'_>,
            _path: &mut NodePath<'_>,
        ) -> bool {
            true
        }
    }
    impl TaggerPlugin for NeverSettles {}

    #[test]
    fn router_surfaces_fixpoint_exceeded() {
        let mut graph = build_graph("__d(function(g,r,id,ia,m,e,d){ foo(); }, 0);");
        let registry = PluginRegistry::builder().tagger(NeverSettles).build();
        let router = Router::new(&registry);

        let mut module = graph.take(0).unwrap();
        let err = router
            .run_pass(&graph, &mut module, PassKind::Tagger)
            .unwrap_err();
        assert!(matches!(
            err,
            decompiler_errors::DecompileError::FixpointExceeded { .. }
        ));
    }

    #[test]
    fn priority_ties_run_in_registration_order() {
        struct Recorder(&'static str, std::sync::Arc<std::sync::Mutex<Vec<&'static str>>>);
        impl PluginImpl for Recorder {
            fn name(&self) -> &'static str {
                self.0
            }
            fn node_kinds(&self) -> &'static [NodeKind] {
                &[NodeKind::CallExpr]
            }
            fn on_node(
                &self,
                _graph: &ModuleGraph,
                _ctx: &mut ModuleCtx<'_>,
                _node: NodeMut<'_>,
                _path: &mut NodePath<'_>,
            ) -> bool {
                self.1.lock().unwrap().push(self.0);
                false
            }
        }
        impl TaggerPlugin for Recorder {}

        let order = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let registry = PluginRegistry::builder()
            .tagger(Recorder("first", order.clone()))
            .tagger(Recorder("second", order.clone()))
            .build();
        let router = Router::new(&registry);
        let mut graph = build_graph("__d(function(g,r,id,ia,m,e,d){ foo(); }, 0);");
        let mut module = graph.take(0).unwrap();
        router
            .run_pass(&graph, &mut module, PassKind::Tagger)
            .unwrap();

        assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
    }
}
