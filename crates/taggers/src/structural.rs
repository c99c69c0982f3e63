use module_graph::ModuleGraph;
use plugin_core::{ModuleCtx, PluginImpl, TaggerPlugin};

/// Recognizes a bundled React or React Native core package by the set of
/// exported names its minified UMD/CJS build always carries, regardless of
/// identifier renaming.
pub struct ReactStructuralTagger;

impl PluginImpl for ReactStructuralTagger {
    fn name(&self) -> &'static str {
        "react_structural_tagger"
    }

    fn priority(&self) -> i32 {
        -90
    }

    fn on_whole_module(&self, _graph: &ModuleGraph, ctx: &mut ModuleCtx<'_>) -> bool {
        if *ctx.is_npm_module {
            return false;
        }
        let code = ctx.original_code;
        let is_react_native = code.contains("AppRegistry") && code.contains("NativeModules");
        let is_react =
            code.contains("isValidElement") && code.contains("createElement") && code.contains("Fragment");

        if is_react_native {
            ctx.tag_as_npm_module("react-native");
            true
        } else if is_react {
            ctx.tag_as_npm_module("react");
            true
        } else {
            false
        }
    }
}

impl TaggerPlugin for ReactStructuralTagger {}

/// Recognizes lodash's `isEqual` and `isFunction` dispatchers by the
/// distinctive internals of their minified implementations, per §4.6's
/// "structural tagger" example.
pub struct LodashStructuralTagger;

impl PluginImpl for LodashStructuralTagger {
    fn name(&self) -> &'static str {
        "lodash_structural_tagger"
    }

    fn priority(&self) -> i32 {
        -80
    }

    fn on_whole_module(&self, _graph: &ModuleGraph, ctx: &mut ModuleCtx<'_>) -> bool {
        if *ctx.is_npm_module {
            return false;
        }
        let code = ctx.original_code;
        let is_is_equal = code.contains("baseIsEqual") && code.contains("new Stack");
        let is_is_function =
            code.contains("[object Function]") && code.contains("[object GeneratorFunction]");

        if is_is_equal {
            ctx.tag_as_npm_module("lodash.isequal");
            true
        } else if is_is_function {
            ctx.tag_as_npm_module("lodash.isfunction");
            true
        } else {
            false
        }
    }
}

impl TaggerPlugin for LodashStructuralTagger {}

#[cfg(test)]
mod tests {
    use super::*;
    use bundle_ast::parse_program;
    use plugin_core::{PluginRegistry, Router};

    fn run(tagger_name: &str, code: &str) -> (bool, Option<String>) {
        let (cm, _comments, mut module) = parse_program(
            "bundle.js",
            &format!("__d(function(g,r,id,ia,m,e,d){{ {code} }}, 0);"),
        )
        .unwrap();
        let (mut graph, _errors) =
            module_graph::ModuleGraph::from_bundle(&mut module, &cm).unwrap();
        let builder = PluginRegistry::builder();
        let registry = match tagger_name {
            "react" => builder.tagger(ReactStructuralTagger).build(),
            "lodash" => builder.tagger(LodashStructuralTagger).build(),
            _ => unreachable!(),
        };
        let router = Router::new(&registry);
        let mut m = graph.take(0).unwrap();
        router
            .run_pass(&graph, &mut m, plugin_core::PassKind::Tagger)
            .unwrap();
        (m.is_npm_module, m.npm_module_name)
    }

    #[test]
    fn recognizes_react_core() {
        let (matched, name) = run(
            "react",
            "function createElement(){} function isValidElement(){} var Fragment = {};",
        );
        assert!(matched);
        assert_eq!(name.as_deref(), Some("react"));
    }

    #[test]
    fn recognizes_react_native_core() {
        let (matched, name) = run("react", "AppRegistry.registerComponent; NativeModules.foo;");
        assert!(matched);
        assert_eq!(name.as_deref(), Some("react-native"));
    }

    #[test]
    fn recognizes_lodash_is_equal() {
        let (matched, name) = run("lodash", "function baseIsEqual(a,b){ return new Stack(); }");
        assert!(matched);
        assert_eq!(name.as_deref(), Some("lodash.isequal"));
    }

    #[test]
    fn unrelated_module_is_untagged() {
        let (matched, _name) = run("react", "var a = 1;");
        assert!(!matched);
    }
}
