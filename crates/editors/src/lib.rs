//! Small, shape-preserving AST clean-ups run before the decompiler passes
//! (§4.7, C7): consecutive `var` merging, trivial-alias inlining, and IIFE
//! unwrapping. Editors make the tree easier for decompilers to pattern
//! match against; they never change what the code does.

mod alias_inline;
mod consecutive_var;
mod iife_unwrap;

pub use alias_inline::TrivialAliasInlineEditor;
pub use consecutive_var::ConsecutiveVarMergeEditor;
pub use iife_unwrap::IifeUnwrapEditor;

/// Registers the default editor catalog, in priority order, onto a
/// registry builder: merge `var`s first so later editors see fewer,
/// larger declarations, then inline aliases, then unwrap IIFEs last so an
/// alias that only existed to thread a value into one no longer blocks the
/// unwrap.
pub fn register(builder: plugin_core::PluginRegistryBuilder) -> plugin_core::PluginRegistryBuilder {
    builder
        .editor(ConsecutiveVarMergeEditor)
        .editor(TrivialAliasInlineEditor)
        .editor(IifeUnwrapEditor)
}
