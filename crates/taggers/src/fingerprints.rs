use module_graph::ModuleGraph;
use plugin_core::{ModuleCtx, PluginImpl, TaggerPlugin};
use regex::Regex;

/// One row of the fingerprint catalog: a name for diagnostics, the package
/// name a match resolves to, and the regex matched against a module's
/// `originalCode`. Kept as data (not bespoke code per helper) so adding a
/// new minifier signature is a one-line addition to `catalog()`.
struct FingerprintEntry {
    helper_name: &'static str,
    regex: Regex,
}

/// Recognizes the minified shapes of the `@babel/runtime/helpers/*`
/// functions Metro bundles inline. A match sets `isNpmModule`/
/// `npmModuleName` to the helper's canonical import path, which both
/// ignores the module by default and gives decompilers (§4.7 rule 4) a
/// name to re-import when un-inlining a call site elsewhere.
pub struct BabelHelperFingerprintTagger {
    entries: Vec<FingerprintEntry>,
}

impl BabelHelperFingerprintTagger {
    pub fn new() -> Self {
        let raw: &[(&str, &str)] = &[
            (
                "toConsumableArray",
                r"\.exports\s*=\s*function\([A-Za-z_$][\w$]*\)\{return [A-Za-z_$][\w$]*\([A-Za-z_$][\w$]*\)\|\|[A-Za-z_$][\w$]*\([A-Za-z_$][\w$]*\)\|\|[A-Za-z_$][\w$]*\([A-Za-z_$][\w$]*\)\|\|[A-Za-z_$][\w$]*\(\);\}",
            ),
            (
                "slicedToArray",
                r"Invalid attempt to destructure non-iterable instance",
            ),
            ("objectSpread2", r"ownKeys\(Object\([A-Za-z_$][\w$]*\)"),
            (
                "interopRequireDefault",
                r"__esModule\s*\?\s*[A-Za-z_$][\w$]*\s*:\s*\{\s*(default|[\x27\x22]default[\x27\x22])",
            ),
            ("interopRequireWildcard", r"__esModule[\s\S]{0,200}WeakMap"),
            ("classCallCheck", r"Cannot call a class as a function"),
            (
                "createClass",
                r"enumerable[\s\S]{0,40}configurable[\s\S]{0,80}defineProperty",
            ),
            ("extends", r"Object\.assign[\s\S]{0,200}hasOwnProperty"),
        ];

        let entries = raw
            .iter()
            .map(|(helper_name, pattern)| FingerprintEntry {
                helper_name,
                regex: Regex::new(pattern).expect("fingerprint catalog regex must compile"),
            })
            .collect();

        Self { entries }
    }
}

impl Default for BabelHelperFingerprintTagger {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginImpl for BabelHelperFingerprintTagger {
    fn name(&self) -> &'static str {
        "babel_helper_fingerprint_tagger"
    }

    fn priority(&self) -> i32 {
        // Fingerprint taggers are cheap (a regex over originalCode) and run
        // before the structural taggers, per §4.6.
        -100
    }

    fn on_whole_module(&self, _graph: &ModuleGraph, ctx: &mut ModuleCtx<'_>) -> bool {
        if *ctx.is_npm_module {
            return false;
        }
        for entry in &self.entries {
            if entry.regex.is_match(ctx.original_code) {
                ctx.tag_as_npm_module(format!(
                    "@babel/runtime/helpers/{}",
                    entry.helper_name
                ));
                return true;
            }
        }
        false
    }
}

impl TaggerPlugin for BabelHelperFingerprintTagger {}

#[cfg(test)]
mod tests {
    use super::*;
    use bundle_ast::parse_program;
    use plugin_core::{PluginRegistry, Router};

    fn run_whole_module(code: &str) -> (bool, Option<String>) {
        let (cm, _comments, mut module) = parse_program(
            "bundle.js",
            &format!(
                "__d(function(g,r,id,ia,m,e,d){{ {} }}, 0);",
                code.replace('\n', " ")
            ),
        )
        .unwrap();
        let (mut graph, _errors) =
            module_graph::ModuleGraph::from_bundle(&mut module, &cm).unwrap();
        let registry = PluginRegistry::builder()
            .tagger(BabelHelperFingerprintTagger::new())
            .build();
        let router = Router::new(&registry);
        let mut m = graph.take(0).unwrap();
        router
            .run_pass(&graph, &mut m, plugin_core::PassKind::Tagger)
            .unwrap();
        (m.is_npm_module, m.npm_module_name)
    }

    #[test]
    fn recognizes_to_consumable_array_shape() {
        let (matched, name) =
            run_whole_module("_.exports=function(_){return _(_)||_(_)||_(_)||_();};");
        assert!(matched);
        assert_eq!(
            name.as_deref(),
            Some("@babel/runtime/helpers/toConsumableArray")
        );
    }

    #[test]
    fn recognizes_class_call_check_by_its_error_string() {
        let (matched, name) = run_whole_module(
            "if (!(this instanceof Foo)) { throw new TypeError('Cannot call a class as a function'); }",
        );
        assert!(matched);
        assert_eq!(
            name.as_deref(),
            Some("@babel/runtime/helpers/classCallCheck")
        );
    }

    #[test]
    fn non_matching_code_is_left_untagged() {
        let (matched, _name) = run_whole_module("var a = 1 + 2;");
        assert!(!matched);
    }
}
