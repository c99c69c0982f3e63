//! Concrete tagger plugins: NPM-module fingerprints, Babel-helper
//! fingerprints, React/lodash structural recognition, and Metro's own
//! ignore-classification.

mod fingerprints;
mod ignore_classification;
mod structural;

pub use fingerprints::BabelHelperFingerprintTagger;
pub use ignore_classification::{MetroInternalsTagger, ReexportBarrelTagger};
pub use structural::{LodashStructuralTagger, ReactStructuralTagger};

/// Registers the default tagger catalog, in priority order, onto a
/// registry builder. The fixed catalog is the "no dynamic plugin-loading"
/// design called for by §4.4: every tagger this implementation ships is
/// named here.
pub fn register(builder: plugin_core::PluginRegistryBuilder) -> plugin_core::PluginRegistryBuilder {
    builder
        .tagger(BabelHelperFingerprintTagger::new())
        .tagger(ReactStructuralTagger)
        .tagger(LodashStructuralTagger)
        .tagger(MetroInternalsTagger)
        .tagger(ReexportBarrelTagger)
}
