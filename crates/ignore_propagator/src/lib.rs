//! Transitive-ignore propagation over a module graph (§4.8, C9): a module
//! with no consumers left to serve - because every consumer is ignored, or
//! because the only consumers left are modules it itself depends on (a
//! cycle) - becomes ignored too, and that can cascade.

use module_graph::ModuleGraph;

/// Whether `module_id` is a candidate for ignore propagation: not already
/// ignored, has at least one reverse dependent, and every reverse
/// dependent is either already ignored or is itself one of `module_id`'s
/// own dependencies (the cycle case - two modules that only reference each
/// other have no real external consumer left).
///
/// Exposed standalone so this predicate can be pinned down by a unit test
/// without needing a full graph fixture.
pub fn is_cyclically_ignorable(module_id: u32, graph: &ModuleGraph) -> bool {
    let Some(module) = graph.get(module_id) else {
        return false;
    };
    if module.ignored {
        return false;
    }

    let mut has_dependent = false;
    for dependent_id in graph.dependents_of(module_id) {
        has_dependent = true;
        let dependent_ignored = graph.get(dependent_id).map_or(true, |d| d.ignored);
        let is_cycle = module.dependencies.contains(&Some(dependent_id));
        if !dependent_ignored && !is_cycle {
            return false;
        }
    }
    has_dependent
}

/// Repeatedly marks every [`is_cyclically_ignorable`] module as ignored
/// until a pass marks nothing. Returns the total number of modules newly
/// ignored. Each round is computed against a snapshot of the graph before
/// any of that round's mutations apply, so two mutually-ignorable modules
/// in a cycle are dropped together rather than racing each other across
/// rounds.
pub fn propagate_ignores(graph: &mut ModuleGraph) -> usize {
    let mut total = 0;
    loop {
        let newly_ignorable: Vec<u32> = graph
            .ascending_ids()
            .iter()
            .copied()
            .filter(|id| is_cyclically_ignorable(*id, graph))
            .collect();
        if newly_ignorable.is_empty() {
            break;
        }
        for id in &newly_ignorable {
            if let Some(module) = graph.get_mut(*id) {
                module.ignore();
            }
        }
        total += newly_ignorable.len();
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use bundle_ast::parse_program;
    use pretty_assertions::assert_eq;

    fn build(src: &str) -> ModuleGraph {
        let (cm, _comments, mut module) = parse_program("bundle.js", src).unwrap();
        ModuleGraph::from_bundle(&mut module, &cm).unwrap().0
    }

    #[test]
    fn module_with_no_dependents_is_not_ignorable() {
        let graph = build("__d(function(g,r,id,ia,m,e,d){}, 0);");
        assert!(!is_cyclically_ignorable(0, &graph));
    }

    #[test]
    fn module_whose_only_dependent_is_already_ignored_is_ignorable() {
        let mut graph = build(
            "__d(function(g,r,id,ia,m,e,d){ r(d[0]); }, 0, [1]);\
             __d(function(g,r,id,ia,m,e,d){}, 1);",
        );
        graph.get_mut(0).unwrap().ignore();
        assert!(is_cyclically_ignorable(1, &graph));
    }

    #[test]
    fn module_with_a_live_external_consumer_is_not_ignorable() {
        let graph = build(
            "__d(function(g,r,id,ia,m,e,d){ r(d[0]); }, 0, [1]);\
             __d(function(g,r,id,ia,m,e,d){}, 1);",
        );
        assert!(!is_cyclically_ignorable(1, &graph));
    }

    #[test]
    fn mutually_dependent_pair_with_no_outside_consumer_is_cyclically_ignorable() {
        let graph = build(
            "__d(function(g,r,id,ia,m,e,d){ r(d[0]); }, 0, [1]);\
             __d(function(g,r,id,ia,m,e,d){ r(d[0]); }, 1, [0]);",
        );
        assert!(is_cyclically_ignorable(0, &graph));
        assert!(is_cyclically_ignorable(1, &graph));
    }

    #[test]
    fn propagate_ignores_cascades_through_a_chain() {
        let mut graph = build(
            "__d(function(g,r,id,ia,m,e,d){ r(d[0]); }, 0, [1]);\
             __d(function(g,r,id,ia,m,e,d){ r(d[0]); }, 1, [2]);\
             __d(function(g,r,id,ia,m,e,d){}, 2);",
        );
        graph.get_mut(0).unwrap().ignore();
        let newly_ignored = propagate_ignores(&mut graph);
        assert_eq!(newly_ignored, 2);
        assert!(graph.get(1).unwrap().ignored);
        assert!(graph.get(2).unwrap().ignored);
    }

    #[test]
    fn propagate_ignores_drops_a_mutual_cycle_with_no_outside_consumer() {
        let mut graph = build(
            "__d(function(g,r,id,ia,m,e,d){ r(d[0]); }, 0, [1]);\
             __d(function(g,r,id,ia,m,e,d){ r(d[0]); }, 1, [0]);",
        );
        let newly_ignored = propagate_ignores(&mut graph);
        assert_eq!(newly_ignored, 2);
        assert!(graph.get(0).unwrap().ignored);
        assert!(graph.get(1).unwrap().ignored);
    }

    #[test]
    fn propagate_ignores_is_a_no_op_when_nothing_is_ignorable() {
        let mut graph = build(
            "__d(function(g,r,id,ia,m,e,d){ r(d[0]); }, 0, [1]);\
             __d(function(g,r,id,ia,m,e,d){}, 1);",
        );
        assert_eq!(propagate_ignores(&mut graph), 0);
        assert!(!graph.get(1).unwrap().ignored);
    }
}
