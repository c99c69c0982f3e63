use ahashmap::{AHashMap, AHashSet};
use decompiler_errors::{DecompileError, Result};
use swc_atoms::Atom;
use swc_common::sync::Lrc;
use swc_common::{SourceMap, Spanned};
use swc_ecma_ast::{CallExpr, Callee, Expr};

use crate::module::Module;

/// A recoverable `MalformedRegistration` paired with the `file:line:col`
/// the offending `__d(...)` call starts at, so a caller's logger can point
/// a diagnosis at the exact bundle position (§4.10) without reaching into
/// `swc_common` itself.
#[derive(Debug)]
pub struct RegistrationDiagnostic {
    pub error: DecompileError,
    pub location: String,
}

/// Sparse `moduleId -> Module` index over a parsed bundle. Frozen once
/// built: nothing after `from_bundle` inserts or removes a module, only
/// per-module fields (tags, `ignored`, `moduleCode`, ...) mutate in place.
pub struct ModuleGraph {
    modules: AHashMap<u32, Module>,
    by_name: AHashMap<Atom, u32>,
    ascending_ids: Vec<u32>,
    reverse_deps: AHashMap<u32, AHashSet<u32>>,
}

impl ModuleGraph {
    /// Walks the bundle's top-level AST for `__d(...)` calls and builds the
    /// graph. Malformed registrations are collected and returned alongside
    /// the graph rather than aborting the whole bundle; a bundle with zero
    /// recognized modules is `NoModulesFound`.
    pub fn from_bundle(
        bundle: &mut swc_ecma_ast::Module,
        cm: &Lrc<SourceMap>,
    ) -> Result<(Self, Vec<RegistrationDiagnostic>)> {
        struct FindRegistrations<'a> {
            cm: &'a Lrc<SourceMap>,
            modules: Vec<Module>,
            errors: Vec<RegistrationDiagnostic>,
        }

        impl bundle_ast::Dispatch for FindRegistrations<'_> {
            fn on_node(
                &mut self,
                node: bundle_ast::NodeMut<'_>,
                path: &mut bundle_ast::NodePath<'_>,
            ) -> bool {
                let bundle_ast::NodeMut::CallExpr(call) = node else {
                    return false;
                };
                if !is_registration_call(call) {
                    return false;
                }
                // Well-formed bundles never nest `__d(...)` calls inside a
                // factory body; skip so we don't walk every factory twice.
                path.skip();
                let original_code = self
                    .cm
                    .span_to_snippet(call.span())
                    .unwrap_or_else(|_| "<unavailable>".to_string());
                match Module::from_call_expr(call, original_code) {
                    Ok(module) => self.modules.push(module),
                    Err(err) => {
                        let loc = self.cm.lookup_char_pos(call.span().lo);
                        self.errors.push(RegistrationDiagnostic {
                            error: err,
                            location: format!("{}:{}:{}", loc.file.name, loc.line, loc.col_display),
                        });
                    }
                }
                false
            }
        }

        let mut finder = FindRegistrations {
            cm,
            modules: Vec::new(),
            errors: Vec::new(),
        };
        bundle_ast::run_dispatch(bundle, &mut finder);

        if finder.modules.is_empty() {
            return Err(DecompileError::NoModulesFound);
        }

        let mut modules = AHashMap::default();
        let mut by_name = AHashMap::default();
        let mut ascending_ids = Vec::with_capacity(finder.modules.len());
        for module in finder.modules {
            ascending_ids.push(module.module_id);
            if let Some(name) = &module.module_name {
                by_name.insert(name.clone(), module.module_id);
            }
            modules.insert(module.module_id, module);
        }
        ascending_ids.sort_unstable();

        let mut graph = ModuleGraph {
            modules,
            by_name,
            ascending_ids,
            reverse_deps: AHashMap::default(),
        };
        graph.build_reverse_index();
        Ok((graph, finder.errors))
    }

    fn build_reverse_index(&mut self) {
        for id in &self.ascending_ids {
            let module = &self.modules[id];
            for dep in module.dependencies.iter().flatten() {
                self.reverse_deps.entry(*dep).or_default().insert(*id);
            }
        }
    }

    pub fn get(&self, module_id: u32) -> Option<&Module> {
        self.modules.get(&module_id)
    }

    pub fn get_mut(&mut self, module_id: u32) -> Option<&mut Module> {
        self.modules.get_mut(&module_id)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Module> {
        self.by_name.get(name).and_then(|id| self.modules.get(id))
    }

    /// Removes a module from the graph temporarily so a caller can hold a
    /// plain `&mut Module` for it alongside a `&ModuleGraph` view of every
    /// other module (needed by the router: a pass mutates one module's AST
    /// while plugins read already-settled tags off its dependencies). The
    /// id stays in `ascending_ids`/`reverse_deps`; pair with `put_back`.
    pub fn take(&mut self, module_id: u32) -> Option<Module> {
        self.modules.remove(&module_id)
    }

    /// Reinserts a module removed by `take`. Panics if `module.module_id`
    /// was never part of this graph - that would mean a caller is trying to
    /// smuggle in a module the graph never constructed.
    pub fn put_back(&mut self, module: Module) {
        assert!(
            self.ascending_ids.binary_search(&module.module_id).is_ok(),
            "put_back called with a moduleId not tracked by this graph"
        );
        self.modules.insert(module.module_id, module);
    }

    /// Iterates modules in ascending `moduleId` order, for deterministic
    /// output and deterministic timing reports.
    pub fn iter_ascending(&self) -> impl Iterator<Item = &Module> {
        self.ascending_ids.iter().map(move |id| &self.modules[id])
    }

    pub fn ascending_ids(&self) -> &[u32] {
        &self.ascending_ids
    }

    /// Modules that directly depend on `module_id`. Built once at
    /// construction; consumed by the ignore propagator.
    pub fn dependents_of(&self, module_id: u32) -> impl Iterator<Item = u32> + '_ {
        self.reverse_deps
            .get(&module_id)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Drops every module not reachable from `entry` through `dependencies`.
    /// In non-aggressive mode a missing dependency id is a hard
    /// `MissingDependency` error; in aggressive mode it's silently skipped.
    pub fn restrict_to_entry_closure(&mut self, entry: u32, aggressive: bool) -> Result<()> {
        if !self.modules.contains_key(&entry) {
            return Err(DecompileError::MissingDependency {
                module_id: entry,
                missing_dependency: entry,
                slot: 0,
            });
        }

        let mut reachable = AHashSet::default();
        let mut worklist = vec![entry];
        reachable.insert(entry);
        while let Some(id) = worklist.pop() {
            let Some(module) = self.modules.get(&id) else {
                continue;
            };
            for (slot, dep) in module.dependencies.iter().enumerate() {
                let Some(dep) = dep else { continue };
                if !self.modules.contains_key(dep) {
                    if aggressive {
                        continue;
                    }
                    return Err(DecompileError::MissingDependency {
                        module_id: id,
                        missing_dependency: *dep,
                        slot,
                    });
                }
                if reachable.insert(*dep) {
                    worklist.push(*dep);
                }
            }
        }

        self.modules.retain(|id, _| reachable.contains(id));
        self.by_name.retain(|_, id| reachable.contains(id));
        self.ascending_ids.retain(|id| reachable.contains(id));
        self.reverse_deps.retain(|id, deps| {
            deps.retain(|d| reachable.contains(d));
            reachable.contains(id)
        });
        Ok(())
    }
}

fn is_registration_call(call: &CallExpr) -> bool {
    matches!(
        &call.callee,
        Callee::Expr(expr) if matches!(&**expr, Expr::Ident(ident) if ident.sym == *"__d")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use bundle_ast::parse_program;
    use pretty_assertions::assert_eq;

    fn build(src: &str) -> (ModuleGraph, Vec<RegistrationDiagnostic>) {
        let (cm, _comments, mut module) = parse_program("bundle.js", src).unwrap();
        ModuleGraph::from_bundle(&mut module, &cm).unwrap()
    }

    #[test]
    fn finds_every_registration_in_ascending_order() {
        let (graph, errors) = build(
            "__d(function(g,r,id,ia,m,e,d){}, 2, [0,1]);\
             __d(function(g,r,id,ia,m,e,d){}, 0);\
             __d(function(g,r,id,ia,m,e,d){}, 1, [0]);",
        );
        assert!(errors.is_empty());
        let ids: Vec<u32> = graph.iter_ascending().map(|m| m.module_id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn empty_bundle_is_no_modules_found() {
        let (cm, _comments, mut module) = parse_program("bundle.js", "const a = 1;").unwrap();
        let result = ModuleGraph::from_bundle(&mut module, &cm);
        assert!(matches!(result, Err(DecompileError::NoModulesFound)));
    }

    #[test]
    fn malformed_registration_is_skipped_not_fatal_to_the_bundle() {
        let (graph, errors) = build(
            "__d(function(a,b){}, 0);\
             __d(function(g,r,id,ia,m,e,d){}, 1);",
        );
        assert_eq!(errors.len(), 1);
        assert!(!errors[0].error.is_fatal());
        assert!(errors[0].location.contains("bundle.js"));
        assert_eq!(graph.len(), 1);
        assert!(graph.get(1).is_some());
    }

    #[test]
    fn reverse_index_tracks_dependents() {
        let (graph, _errors) = build(
            "__d(function(g,r,id,ia,m,e,d){}, 0);\
             __d(function(g,r,id,ia,m,e,d){}, 1, [0]);\
             __d(function(g,r,id,ia,m,e,d){}, 2, [0]);",
        );
        let mut dependents: Vec<u32> = graph.dependents_of(0).collect();
        dependents.sort_unstable();
        assert_eq!(dependents, vec![1, 2]);
        assert_eq!(graph.dependents_of(1).count(), 0);
    }

    #[test]
    fn entry_closure_drops_unreachable_modules() {
        let (mut graph, _errors) = build(
            "__d(function(g,r,id,ia,m,e,d){}, 0);\
             __d(function(g,r,id,ia,m,e,d){}, 1, [0]);\
             __d(function(g,r,id,ia,m,e,d){}, 2);",
        );
        graph.restrict_to_entry_closure(1, false).unwrap();
        assert_eq!(graph.len(), 2);
        assert!(graph.get(0).is_some());
        assert!(graph.get(1).is_some());
        assert!(graph.get(2).is_none());
    }

    #[test]
    fn entry_closure_non_aggressive_errors_on_missing_dependency() {
        let (mut graph, _errors) = build(
            "__d(function(g,r,id,ia,m,e,d){}, 1, [99]);",
        );
        let err = graph.restrict_to_entry_closure(1, false).unwrap_err();
        assert!(matches!(err, DecompileError::MissingDependency { .. }));
    }

    #[test]
    fn entry_closure_aggressive_skips_missing_dependency() {
        let (mut graph, _errors) = build(
            "__d(function(g,r,id,ia,m,e,d){}, 1, [99]);",
        );
        graph.restrict_to_entry_closure(1, true).unwrap();
        assert_eq!(graph.len(), 1);
    }
}
