use swc_ecma_ast::ModuleItem;

/// Parses a small, fully-formed snippet of synthesized source (an import
/// declaration, an export declaration, ...) and returns its single
/// top-level item. Decompilers use this instead of hand-assembling AST
/// nodes for the handful of shapes the third-party toolkit's own node
/// types are awkward to construct directly (import/export specifiers
/// carry span/context bookkeeping irrelevant to freshly synthesized code).
/// The snippet is always produced by this crate from already-validated
/// identifiers and string literals, so a parse failure here is a bug in
/// the caller, not bad input.
pub fn parse_item(snippet: &str) -> ModuleItem {
    let (_cm, _comments, module) = bundle_ast::parse_program("<synthesized>", snippet)
        .unwrap_or_else(|e| panic!("decompiler synthesized unparseable snippet {snippet:?}: {e}"));
    module
        .body
        .into_iter()
        .next()
        .unwrap_or_else(|| panic!("decompiler synthesized empty snippet {snippet:?}"))
}

/// Escapes a module specifier for embedding in a synthesized `'...'`
/// string literal. Import sources here are always either an NPM package
/// name or a `./<moduleId>` relative path, neither of which can contain a
/// quote, but this keeps the synthesis honest if that ever changes.
pub fn quote(specifier: &str) -> String {
    format!("'{}'", specifier.replace('\\', "\\\\").replace('\'', "\\'"))
}
