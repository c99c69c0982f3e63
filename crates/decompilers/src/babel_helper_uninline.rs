use module_graph::ModuleGraph;
use plugin_core::{DecompilerPlugin, ModuleCtx, PluginImpl};
use swc_ecma_ast::{Ident, ImportSpecifier, ModuleDecl, ModuleItem};
use swc_ecma_visit::{VisitMut, VisitMutWith};

/// Renames the local binding of an already-recovered `@babel/runtime/helpers/*`
/// import to the helper's canonical name (§4.7 rule 4), so that call sites
/// read `_toConsumableArray(x)` rather than whatever single-letter alias the
/// minifier originally picked. Runs after [`crate::require_import`] has
/// turned the `require(dependencyMap[i])` call into a proper `import`
/// declaration; this pass only has to deal with already-recovered imports,
/// never the raw call shape.
pub struct BabelHelperUninlineDecompiler;

impl PluginImpl for BabelHelperUninlineDecompiler {
    fn name(&self) -> &'static str {
        "babel_helper_uninline_decompiler"
    }

    fn priority(&self) -> i32 {
        -80
    }

    fn on_module_items(
        &self,
        _graph: &ModuleGraph,
        _ctx: &mut ModuleCtx<'_>,
        items: &mut Vec<ModuleItem>,
    ) -> bool {
        let mut mutated = false;
        let renames: Vec<(swc_atoms::Atom, swc_atoms::Atom)> = items
            .iter()
            .filter_map(|item| {
                let ModuleItem::ModuleDecl(ModuleDecl::Import(import_decl)) = item else {
                    return None;
                };
                let helper_name = import_decl.src.value.strip_prefix("@babel/runtime/helpers/")?;
                let canonical: swc_atoms::Atom = format!("_{helper_name}").into();
                let local = default_or_namespace_local(&import_decl.specifiers)?;
                if local.sym == canonical {
                    return None;
                }
                Some((local.sym.clone(), canonical))
            })
            .collect();

        for (from, to) in renames {
            let mut renamer = RenameIdent {
                from: from.clone(),
                to: to.clone(),
                renamed: 0,
            };
            for item in items.iter_mut() {
                item.visit_mut_with(&mut renamer);
            }
            if renamer.renamed > 0 {
                mutated = true;
            }
        }
        mutated
    }
}

impl DecompilerPlugin for BabelHelperUninlineDecompiler {}

fn default_or_namespace_local(specifiers: &[ImportSpecifier]) -> Option<&Ident> {
    specifiers.iter().find_map(|spec| match spec {
        ImportSpecifier::Default(default_spec) => Some(&default_spec.local),
        ImportSpecifier::Namespace(ns_spec) => Some(&ns_spec.local),
        ImportSpecifier::Named(_) => None,
    })
}

struct RenameIdent {
    from: swc_atoms::Atom,
    to: swc_atoms::Atom,
    renamed: usize,
}

impl VisitMut for RenameIdent {
    fn visit_mut_ident(&mut self, ident: &mut Ident) {
        if ident.sym == self.from {
            ident.sym = self.to.clone();
            self.renamed += 1;
        }
    }
}
