use module_graph::ModuleGraph;
use plugin_core::ModuleCtx;
use swc_atoms::Atom;
use swc_ecma_ast::{ComputedPropName, Expr, Lit, MemberExpr, MemberProp};

/// If `expr` is `dependencyMap[i]` - a computed member access into the
/// current module's seventh factory parameter with a numeric literal
/// index - returns `i`. This is the only shape the Metro calling
/// convention ever produces for a dependency lookup.
pub fn dependency_map_index(expr: &Expr, dependency_map: &Atom) -> Option<usize> {
    let Expr::Member(MemberExpr { obj, prop, .. }) = expr else {
        return None;
    };
    let Expr::Ident(ident) = &**obj else {
        return None;
    };
    if ident.sym != *dependency_map {
        return None;
    }
    let MemberProp::Computed(ComputedPropName { expr, .. }) = prop else {
        return None;
    };
    match &**expr {
        Expr::Lit(Lit::Num(n)) => Some(n.value as usize),
        _ => None,
    }
}

/// The module specifier to print for an import of dependency slot
/// `dep_index`: the recognized NPM package name if that dependency is
/// tagged, otherwise a relative path built from its `moduleId` (§4.7 rule
/// 1). Returns `None` when the slot is elided or dangling - callers leave
/// the original require/import call untouched rather than guess.
pub fn resolve_import_source(
    graph: &ModuleGraph,
    ctx: &ModuleCtx<'_>,
    dep_index: usize,
) -> Option<String> {
    let dep_id = (*ctx.dependencies.get(dep_index)?)?;
    match graph.get(dep_id) {
        Some(dep) if dep.is_npm_module => dep.npm_module_name.clone(),
        Some(dep) => Some(format!("./{}", dep.module_id)),
        None => Some(format!("./{dep_id}")),
    }
}
