//! Structural rewrites that recover ES-module syntax and readable control
//! flow from the Metro calling convention (§4.7, C8). Decompilers run after
//! editors, to fixpoint: recovering an `import` can expose a fresh
//! trivial-alias or un-inlining opportunity for editors and earlier
//! decompilers to pick up on the next iteration.

mod array_spread;
mod babel_helper_uninline;
mod dep_resolve;
mod exports_rewrite;
mod require_import;
mod sequence_split;
mod short_circuit_if;
mod synth;

pub use array_spread::ArraySpreadRecoveryDecompiler;
pub use babel_helper_uninline::BabelHelperUninlineDecompiler;
pub use exports_rewrite::ExportsRewriteDecompiler;
pub use require_import::RequireToImportDecompiler;
pub use sequence_split::SequenceSplitDecompiler;
pub use short_circuit_if::ShortCircuitIfDecompiler;

pub fn register(builder: plugin_core::PluginRegistryBuilder) -> plugin_core::PluginRegistryBuilder {
    builder
        .decompiler(RequireToImportDecompiler)
        .decompiler(ExportsRewriteDecompiler)
        .decompiler(BabelHelperUninlineDecompiler)
        .decompiler(ArraySpreadRecoveryDecompiler)
        .decompiler(SequenceSplitDecompiler)
        .decompiler(ShortCircuitIfDecompiler)
}
