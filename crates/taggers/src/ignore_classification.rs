use module_graph::ModuleGraph;
use plugin_core::{ModuleCtx, PluginImpl, TaggerPlugin};

/// Recognizes Metro's own polyfill/runtime modules - by `moduleName`
/// prefix, or by the factory body matching the known `require` shim - and
/// marks them ignored without marking them NPM (§4.6).
pub struct MetroInternalsTagger;

const RUNTIME_SHIM_MARKER: &str = "Requiring unknown module";

impl PluginImpl for MetroInternalsTagger {
    fn name(&self) -> &'static str {
        "metro_internals_tagger"
    }

    fn priority(&self) -> i32 {
        -70
    }

    fn on_whole_module(&self, _graph: &ModuleGraph, ctx: &mut ModuleCtx<'_>) -> bool {
        if *ctx.ignored {
            return false;
        }
        let name_matches = ctx
            .module_name
            .as_deref()
            .map(|name| name == "__prelude__" || name.starts_with("polyfills/"))
            .unwrap_or(false);
        let is_require_shim = ctx.original_code.contains(RUNTIME_SHIM_MARKER);

        if name_matches || is_require_shim {
            ctx.ignore();
            true
        } else {
            false
        }
    }
}

impl TaggerPlugin for MetroInternalsTagger {}

/// Dependency-aware tagger (§4.6): a single-dependency re-export barrel
/// (`module.exports = require(dependencyMap[0])`) inherits its one
/// dependency's NPM package name once that dependency is already tagged.
pub struct ReexportBarrelTagger;

impl PluginImpl for ReexportBarrelTagger {
    fn name(&self) -> &'static str {
        "reexport_barrel_tagger"
    }

    fn priority(&self) -> i32 {
        // Runs after the fingerprint/structural taggers so the dependency
        // it consults has already been tagged in this same pass iteration.
        -60
    }

    fn on_whole_module(&self, graph: &ModuleGraph, ctx: &mut ModuleCtx<'_>) -> bool {
        if *ctx.is_npm_module {
            return false;
        }
        let [Some(dep_id)] = ctx.dependencies else {
            return false;
        };
        let Some(dep) = graph.get(*dep_id) else {
            return false;
        };
        if !dep.is_npm_module {
            return false;
        }
        let Some(package_name) = dep.npm_module_name.clone() else {
            return false;
        };
        let looks_like_barrel =
            ctx.original_code.len() < 400 && ctx.original_code.contains("module.exports");
        if looks_like_barrel {
            ctx.tag_as_npm_module(package_name);
            true
        } else {
            false
        }
    }
}

impl TaggerPlugin for ReexportBarrelTagger {}
