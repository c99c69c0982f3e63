use std::time::Instant;

use ahashmap::AHashMap;
use bundle_ast::{Dispatch, NodeKind, NodeMut, NodePath};
use decompiler_errors::{DecompileError, PassKind, Result};
use module_graph::ModuleGraph;
use swc_ecma_ast::{ModuleItem, Stmt};

use crate::context::{split_module, PluginTimings};
use crate::plugin::PluginImpl;
use crate::registry::PluginRegistry;

/// A router pass never reaches a fixed point within this many traversals is
/// treated as a bug in the pass's plugins, not a cost worth paying for.
pub const MAX_FIXPOINT_ITERATIONS: usize = 16;

#[derive(Debug, Default)]
pub struct PassOutcome {
    pub iterations: usize,
    pub mutated: bool,
    pub plugin_timings: PluginTimings,
}

struct PassDispatch<'m, 'g, 'p> {
    graph: &'g ModuleGraph,
    ctx: crate::context::ModuleCtx<'m>,
    by_kind: AHashMap<NodeKind, Vec<&'p dyn PluginImpl>>,
    whole_module: Vec<&'p dyn PluginImpl>,
    all_in_pass: Vec<&'p dyn PluginImpl>,
    timings: PluginTimings,
    any_mutated: bool,
}

impl Dispatch for PassDispatch<'_, '_, '_> {
    fn on_node(&mut self, mut node: NodeMut<'_>, path: &mut NodePath<'_>) -> bool {
        let kind = node.kind();
        let Some(plugins) = self.by_kind.get(&kind) else {
            return false;
        };
        let mut mutated = false;
        for plugin in plugins.iter() {
            let start = Instant::now();
            let changed = plugin.on_node(self.graph, &mut self.ctx, node.reborrow(), path);
            *self.timings.entry(plugin.name()).or_default() += start.elapsed();
            mutated |= changed;
            if path.should_skip() {
                break;
            }
        }
        if mutated {
            self.any_mutated = true;
        }
        mutated
    }

    fn on_stmts(&mut self, stmts: &mut Vec<Stmt>) -> bool {
        let mut mutated = false;
        for plugin in &self.all_in_pass {
            let start = Instant::now();
            let changed = plugin.on_stmts(self.graph, &mut self.ctx, stmts);
            *self.timings.entry(plugin.name()).or_default() += start.elapsed();
            mutated |= changed;
        }
        if mutated {
            self.any_mutated = true;
        }
        mutated
    }

    fn on_module_items(&mut self, items: &mut Vec<ModuleItem>) -> bool {
        let mut mutated = false;
        for plugin in &self.all_in_pass {
            let start = Instant::now();
            let changed = plugin.on_module_items(self.graph, &mut self.ctx, items);
            *self.timings.entry(plugin.name()).or_default() += start.elapsed();
            mutated |= changed;
        }
        if mutated {
            self.any_mutated = true;
        }
        mutated
    }
}

impl PassDispatch<'_, '_, '_> {
    fn run_whole_module(&mut self) -> bool {
        let mut mutated = false;
        for plugin in &self.whole_module {
            let start = Instant::now();
            let changed = plugin.on_whole_module(self.graph, &mut self.ctx);
            *self.timings.entry(plugin.name()).or_default() += start.elapsed();
            mutated |= changed;
        }
        mutated
    }
}

/// Drives one traversal of a module's working AST per pass, dispatching
/// each visited node to every plugin registered for it, re-running until no
/// plugin reports a change or the fixpoint cap is hit.
pub struct Router<'r> {
    registry: &'r PluginRegistry,
}

impl<'r> Router<'r> {
    pub fn new(registry: &'r PluginRegistry) -> Self {
        Self { registry }
    }

    /// Runs one pass to its fixed point against a single module, which must
    /// currently be removed from `graph` via `ModuleGraph::take` (the
    /// caller owns it for the duration; `graph` gives read-only access to
    /// every *other* module, e.g. for dependency tag lookups).
    pub fn run_pass(
        &self,
        graph: &ModuleGraph,
        module: &mut module_graph::Module,
        pass: PassKind,
    ) -> Result<PassOutcome> {
        let plugins: Vec<&dyn PluginImpl> = self.registry.for_pass(pass).collect();

        let mut by_kind: AHashMap<NodeKind, Vec<&dyn PluginImpl>> = AHashMap::default();
        let mut whole_module = Vec::new();
        for plugin in &plugins {
            if plugin.node_kinds().is_empty() {
                whole_module.push(*plugin);
            }
            for kind in plugin.node_kinds() {
                by_kind.entry(*kind).or_default().push(*plugin);
            }
        }

        let mut outcome = PassOutcome::default();
        // Only Tagger and Decompiler passes re-run to a fixed point (§4.5);
        // a single editor traversal per call keeps editors from fighting
        // each other into an infinite merge/split loop.
        let reruns = matches!(pass, PassKind::Tagger | PassKind::Decompiler);

        loop {
            outcome.iterations += 1;
            let (module_code, ctx) = split_module(module);
            let mut dispatch = PassDispatch {
                graph,
                ctx,
                by_kind: by_kind.clone(),
                whole_module: whole_module.clone(),
                all_in_pass: plugins.clone(),
                timings: PluginTimings::default(),
                any_mutated: false,
            };
            let whole_module_mutated = dispatch.run_whole_module();
            bundle_ast::run_dispatch(module_code, &mut dispatch);
            let iteration_mutated = whole_module_mutated || dispatch.any_mutated;

            for (name, time) in dispatch.timings {
                *outcome.plugin_timings.entry(name).or_default() += time;
            }
            if iteration_mutated {
                outcome.mutated = true;
            }

            if !iteration_mutated || !reruns {
                break;
            }
            if outcome.iterations >= MAX_FIXPOINT_ITERATIONS {
                return Err(DecompileError::FixpointExceeded {
                    module_id: module.module_id,
                    pass,
                    iterations: outcome.iterations,
                });
            }
        }

        Ok(outcome)
    }

    /// Runs `run_pass` for every module in the graph, in ascending
    /// `moduleId` order, for deterministic timing output.
    pub fn run_until_fixpoint(&self, graph: &mut ModuleGraph, pass: PassKind) -> Result<Vec<(u32, PassOutcome)>> {
        let ids: Vec<u32> = graph.ascending_ids().to_vec();
        let mut outcomes = Vec::with_capacity(ids.len());
        for id in ids {
            let mut module = graph
                .take(id)
                .expect("ascending_ids must only contain ids present in the graph");
            let result = self.run_pass(graph, &mut module, pass);
            graph.put_back(module);
            outcomes.push((id, result?));
        }
        Ok(outcomes)
    }
}
