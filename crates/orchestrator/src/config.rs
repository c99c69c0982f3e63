use std::path::PathBuf;

/// The options surface from §6, modeled as a plain struct so the pipeline
/// is directly unit-testable by constructing this in-process - no argument
/// parsing required (§4.11). The CLI binary is the only thing that builds
/// one of these from `std::env::args`.
#[derive(Debug, Clone)]
pub struct Options {
    /// Path to the bundle file. Required.
    pub bundle_path: PathBuf,
    /// Output folder. Required.
    pub out_dir: PathBuf,
    /// Per-module folder for unbundled apps; its `.js` files are
    /// concatenated onto the main bundle before parsing.
    pub bundles_folder: Option<PathBuf>,
    /// Restrict decompilation to a module and its transitive dependencies.
    /// Also enables cache persistence (§6).
    pub entry: Option<u32>,
    /// Emit per-plugin timing.
    pub performance: bool,
    /// Print the final module dependency summary.
    pub verbose: bool,
    /// Emit modules tagged ignored.
    pub decompile_ignored: bool,
    /// Trust cached ignore/NPM flags; skip re-tagging their bodies.
    /// Requires a pre-existing cache.
    pub aggressive_cache: bool,
    /// Skip the external lint/format pass. The lint pass itself is an
    /// external collaborator (§1) this crate never invokes; the flag is
    /// carried through for CLI parity and future wiring.
    pub no_eslint: bool,
}

impl Options {
    pub fn new(bundle_path: impl Into<PathBuf>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            bundle_path: bundle_path.into(),
            out_dir: out_dir.into(),
            bundles_folder: None,
            entry: None,
            performance: false,
            verbose: false,
            decompile_ignored: false,
            aggressive_cache: false,
            no_eslint: false,
        }
    }

    /// Cache persistence is only active in `entry` mode, or when
    /// `aggressiveCache` was explicitly requested (which requires a
    /// pre-existing cache to do anything useful).
    pub fn cache_enabled(&self) -> bool {
        self.entry.is_some() || self.aggressive_cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_disabled_by_default() {
        let opts = Options::new("in.js", "out");
        assert!(!opts.cache_enabled());
    }

    #[test]
    fn entry_enables_cache() {
        let mut opts = Options::new("in.js", "out");
        opts.entry = Some(4);
        assert!(opts.cache_enabled());
    }

    #[test]
    fn aggressive_cache_enables_cache_without_entry() {
        let mut opts = Options::new("in.js", "out");
        opts.aggressive_cache = true;
        assert!(opts.cache_enabled());
    }
}
