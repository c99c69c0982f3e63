use ahashmap::AHashMap;
use module_graph::{FactoryParams, Module, TagParameters};
use swc_atoms::Atom;

/// Everything a plugin may read or write about the module currently being
/// visited, minus its working AST - the AST itself arrives as the `NodeMut`
/// the router hands to `on_node`, or the `Vec<Stmt>`/`Vec<ModuleItem>`
/// handed to the container-level hooks. Splitting the two apart is what
/// lets the router hold `&mut module.module_code` for the traversal and
/// `&mut ModuleCtx` for everything else at the same time.
pub struct ModuleCtx<'m> {
    pub module_id: u32,
    pub module_name: Option<Atom>,
    pub dependencies: &'m [Option<u32>],
    pub factory_params: &'m FactoryParams,
    pub original_code: &'m str,
    pub tags: &'m mut Vec<Atom>,
    pub is_npm_module: &'m mut bool,
    pub npm_module_name: &'m mut Option<String>,
    pub ignored: &'m mut bool,
    pub tag_parameters: &'m mut TagParameters,
}

impl ModuleCtx<'_> {
    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|t| t.as_ref() == name)
    }

    pub fn tag(&mut self, name: impl Into<Atom>) {
        let name = name.into();
        if !self.tags.contains(&name) {
            self.tags.push(name);
        }
    }

    pub fn tag_as_npm_module(&mut self, package_name: impl Into<String>) {
        let package_name = package_name.into();
        *self.is_npm_module = true;
        *self.npm_module_name = Some(package_name.clone());
        self.tag(package_name);
        *self.ignored = true;
    }

    pub fn ignore(&mut self) {
        *self.ignored = true;
    }
}

/// Splits a `Module` into its working AST and everything else, as two
/// independent mutable/shared borrows the router can hold side by side.
pub fn split_module(module: &mut Module) -> (&mut swc_ecma_ast::Module, ModuleCtx<'_>) {
    let ctx = ModuleCtx {
        module_id: module.module_id,
        module_name: module.module_name.clone(),
        dependencies: &module.dependencies,
        factory_params: &module.factory_params,
        original_code: &module.original_code,
        tags: &mut module.tags,
        is_npm_module: &mut module.is_npm_module,
        npm_module_name: &mut module.npm_module_name,
        ignored: &mut module.ignored,
        tag_parameters: &mut module.tag_parameters,
    };
    (&mut module.module_code, ctx)
}

/// Timing accumulator for the optional performance report (§C11):
/// cumulative wall-clock time per plugin name, reset between passes.
pub type PluginTimings = AHashMap<&'static str, std::time::Duration>;
