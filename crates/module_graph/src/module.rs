use ahashmap::AHashMap;
use decompiler_errors::DecompileError;
use swc_atoms::Atom;
use swc_ecma_ast::{ArrayLit, CallExpr, Expr, ExprOrSpread, Lit, ModuleItem, Param, Pat};

/// The local names bound to the seven `__d(...)` factory parameters, learned
/// by position rather than by name - minified bundles rename all of them.
#[derive(Debug, Clone)]
pub struct FactoryParams {
    pub global: Atom,
    pub require: Atom,
    pub import_default: Atom,
    pub import_all: Atom,
    pub module: Atom,
    pub exports: Atom,
    pub dependency_map: Atom,
}

impl FactoryParams {
    fn from_idents(idents: [Atom; 7]) -> Self {
        let [global, require, import_default, import_all, module, exports, dependency_map] =
            idents;
        Self {
            global,
            require,
            import_default,
            import_all,
            module,
            exports,
            dependency_map,
        }
    }
}

/// Tagger-produced scratch data attached to a module under a tag name, so a
/// later decompiler pass can consume it without re-deriving it from the AST
/// (e.g. the identifiers a recognized lodash dispatcher branches on).
#[derive(Debug, Clone, Default)]
pub struct TagParameters(AHashMap<Atom, Vec<Atom>>);

impl TagParameters {
    pub fn set(&mut self, tag: impl Into<Atom>, idents: Vec<Atom>) {
        self.0.insert(tag.into(), idents);
    }

    pub fn get(&self, tag: &str) -> Option<&[Atom]> {
        self.0.get(tag).map(Vec::as_slice)
    }
}

/// One `__d(...)` registration: its dependencies, its original and working
/// ASTs, and the metadata taggers/editors/decompilers accumulate on it.
#[derive(Debug, Clone)]
pub struct Module {
    pub module_id: u32,
    pub module_name: Option<Atom>,
    /// `dependencies[i]` is `None` when the bundler left that dependency
    /// slot elided (no module depends on that position); see invariant 2.
    pub dependencies: Vec<Option<u32>>,
    pub original_code: String,
    pub factory_body: swc_ecma_ast::BlockStmt,
    pub module_code: swc_ecma_ast::Module,
    pub factory_params: FactoryParams,
    pub tags: Vec<Atom>,
    pub is_npm_module: bool,
    pub npm_module_name: Option<String>,
    pub ignored: bool,
    pub tag_parameters: TagParameters,
}

impl Module {
    /// Parses a `__d(...)` call expression into a `Module`. `original_code`
    /// is the already-rendered source text of the whole call, computed by
    /// the caller from the shared source map (this function never prints).
    pub fn from_call_expr(
        call: &CallExpr,
        original_code: String,
    ) -> Result<Self, DecompileError> {
        let malformed = |reason: &str, module_id: Option<u32>| DecompileError::MalformedRegistration {
            module_id,
            reason: reason.to_string(),
        };

        if call.args.len() < 2 || call.args.len() > 4 {
            return Err(malformed(
                &format!("expected 2 to 4 arguments, found {}", call.args.len()),
                None,
            ));
        }

        let factory_expr = &call.args[0].expr;
        let params = factory_params_of(factory_expr)
            .ok_or_else(|| malformed("factory argument is not a function with 7 simple identifier parameters", None))?;
        let factory_body = factory_body_of(factory_expr)
            .ok_or_else(|| malformed("factory function has no block body", None))?
            .clone();

        let module_id = as_num_literal(&call.args[1].expr)
            .ok_or_else(|| malformed("moduleId argument is not a numeric literal", None))?
            as u32;

        let dependencies = match call.args.get(2) {
            Some(arg) => parse_dependencies(&arg.expr)
                .ok_or_else(|| malformed("dependency map argument is not an array of numeric literals or holes", Some(module_id)))?,
            None => Vec::new(),
        };

        let module_name = match call.args.get(3) {
            Some(arg) => Some(
                as_str_literal(&arg.expr)
                    .ok_or_else(|| malformed("moduleName argument is not a string literal", Some(module_id)))?
                    .into(),
            ),
            None => None,
        };

        let module_code = swc_ecma_ast::Module {
            span: factory_body.span,
            body: factory_body
                .stmts
                .iter()
                .cloned()
                .map(ModuleItem::Stmt)
                .collect(),
            shebang: None,
        };

        Ok(Module {
            module_id,
            module_name,
            dependencies,
            original_code,
            factory_body,
            module_code,
            factory_params: params,
            tags: Vec::new(),
            is_npm_module: false,
            npm_module_name: None,
            ignored: false,
            tag_parameters: TagParameters::default(),
        })
    }

    pub fn tag(&mut self, name: impl Into<Atom>) {
        let name = name.into();
        if !self.tags.contains(&name) {
            self.tags.push(name);
        }
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|t| t.as_ref() == name)
    }

    pub fn tag_as_npm_module(&mut self, package_name: impl Into<String>) {
        let package_name = package_name.into();
        self.is_npm_module = true;
        self.npm_module_name = Some(package_name.clone());
        self.tag(package_name);
        self.ignored = true;
    }

    pub fn ignore(&mut self) {
        self.ignored = true;
    }
}

fn params_of(expr: &Expr) -> Option<Vec<Pat>> {
    match expr {
        Expr::Fn(f) => Some(f.function.params.iter().map(|p: &Param| p.pat.clone()).collect()),
        Expr::Arrow(a) => Some(a.params.clone()),
        _ => None,
    }
}

fn factory_params_of(expr: &Expr) -> Option<FactoryParams> {
    let params = params_of(expr)?;
    if params.len() != 7 {
        return None;
    }
    let mut idents = Vec::with_capacity(7);
    for pat in &params {
        match pat {
            Pat::Ident(binding) => idents.push(binding.id.sym.clone()),
            _ => return None,
        }
    }
    let idents: [Atom; 7] = idents.try_into().ok()?;
    Some(FactoryParams::from_idents(idents))
}

fn factory_body_of(expr: &Expr) -> Option<&swc_ecma_ast::BlockStmt> {
    match expr {
        Expr::Fn(f) => f.function.body.as_ref(),
        Expr::Arrow(a) => match a.body.as_ref() {
            swc_ecma_ast::BlockStmtOrExpr::BlockStmt(block) => Some(block),
            swc_ecma_ast::BlockStmtOrExpr::Expr(_) => None,
        },
        _ => None,
    }
}

fn as_num_literal(expr: &Expr) -> Option<f64> {
    match expr {
        Expr::Lit(Lit::Num(n)) => Some(n.value),
        _ => None,
    }
}

fn as_str_literal(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Lit(Lit::Str(s)) => Some(s.value.to_string()),
        _ => None,
    }
}

fn parse_dependencies(expr: &Expr) -> Option<Vec<Option<u32>>> {
    let Expr::Array(ArrayLit { elems, .. }) = expr else {
        return None;
    };
    elems
        .iter()
        .map(|elem: &Option<ExprOrSpread>| match elem {
            None => Some(None),
            Some(ExprOrSpread { spread: Some(_), .. }) => None,
            Some(ExprOrSpread { expr, spread: None }) => as_num_literal(expr).map(|n| Some(n as u32)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bundle_ast::parse_program;
    use swc_ecma_ast::{CallExpr, Expr, ExprStmt, ModuleItem, Stmt};

    fn parse_call(src: &str) -> CallExpr {
        let (_cm, _comments, module) = parse_program("bundle.js", src).unwrap();
        match &module.body[0] {
            ModuleItem::Stmt(Stmt::Expr(ExprStmt { expr, .. })) => match &**expr {
                Expr::Call(call) => call.clone(),
                other => panic!("expected call expression, got {other:?}"),
            },
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    #[test]
    fn parses_well_formed_registration() {
        let call = parse_call(
            "__d(function(g,r,id,ia,module,exports,d){module.exports = 1;}, 4, [1,2], \"moduleA\");",
        );
        let module = Module::from_call_expr(&call, "…".to_string()).unwrap();
        assert_eq!(module.module_id, 4);
        assert_eq!(module.dependencies, vec![Some(1), Some(2)]);
        assert_eq!(module.module_name.as_deref(), Some("moduleA"));
        assert!(!module.is_npm_module);
        assert!(!module.ignored);
    }

    #[test]
    fn registration_without_name_or_deps_is_fine() {
        let call = parse_call("__d(function(g,r,id,ia,module,exports,d){}, 0);");
        let module = Module::from_call_expr(&call, "…".to_string()).unwrap();
        assert_eq!(module.module_id, 0);
        assert!(module.dependencies.is_empty());
        assert!(module.module_name.is_none());
    }

    #[test]
    fn elided_dependency_slot_is_none() {
        let call = parse_call("__d(function(g,r,id,ia,module,exports,d){}, 0, [1,,3]);");
        let module = Module::from_call_expr(&call, "…".to_string()).unwrap();
        assert_eq!(module.dependencies, vec![Some(1), None, Some(3)]);
    }

    #[test]
    fn wrong_factory_arity_is_malformed() {
        let call = parse_call("__d(function(a,b){}, 0);");
        let err = Module::from_call_expr(&call, "…".to_string()).unwrap_err();
        assert!(!err.is_fatal());
    }

    #[test]
    fn non_numeric_module_id_is_malformed() {
        let call = parse_call("__d(function(g,r,id,ia,module,exports,d){}, \"oops\");");
        let err = Module::from_call_expr(&call, "…".to_string()).unwrap_err();
        assert!(!err.is_fatal());
    }

    #[test]
    fn tag_as_npm_module_sets_ignored_and_tags() {
        let call = parse_call("__d(function(g,r,id,ia,module,exports,d){}, 0);");
        let mut module = Module::from_call_expr(&call, "…".to_string()).unwrap();
        module.tag_as_npm_module("left-pad");
        assert!(module.is_npm_module);
        assert!(module.ignored);
        assert_eq!(module.npm_module_name.as_deref(), Some("left-pad"));
        assert!(module.has_tag("left-pad"));
    }
}
