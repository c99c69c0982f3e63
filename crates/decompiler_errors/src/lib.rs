//! Error taxonomy for the decompiler, shared by every crate in the
//! workspace so that a module-graph error and a router error can be
//! aggregated into the same `multi_err::MultiErr` without a translation
//! layer at each crate boundary.

use std::fmt;

/// Which plugin family a router pass belongs to. Lives here (rather than in
/// `plugin_core`) because both the router and the error taxonomy need it,
/// and `plugin_core` already depends on this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassKind {
    Tagger,
    Editor,
    Decompiler,
}

impl fmt::Display for PassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PassKind::Tagger => "tagger",
            PassKind::Editor => "editor",
            PassKind::Decompiler => "decompiler",
        })
    }
}

/// Errors the decompiler can raise.
///
/// `MalformedRegistration` and `CacheChecksumMismatch` are recoverable: the
/// caller logs them and continues (skipping the offending module, or
/// discarding the cache, respectively). Every other variant is fatal and
/// aborts the run - see `DecompileError::is_fatal`.
#[derive(thiserror::Error, Debug)]
pub enum DecompileError {
    /// A `__d(...)` call did not have the expected argument shape.
    /// Recoverable: the module is skipped, the rest of the bundle proceeds.
    #[error("malformed __d(...) registration{}: {reason}", .module_id.map(|id| format!(" (moduleId {id})")).unwrap_or_default())]
    MalformedRegistration {
        module_id: Option<u32>,
        reason: String,
    },

    /// `entry` mode (non-aggressive) found a dependency id with no
    /// corresponding module in the graph. Fatal.
    #[error("module {module_id} depends on missing module {missing_dependency} (dependency slot {slot})")]
    MissingDependency {
        module_id: u32,
        missing_dependency: u32,
        slot: usize,
    },

    /// The AST facade failed to parse the bundle, or a module's working
    /// AST failed to re-parse after printing. Fatal.
    #[error("parse error in {source_name}: {reason}")]
    ParseError { source_name: String, reason: String },

    /// A router pass did not reach a fixed point within the iteration cap.
    /// Fatal; includes enough detail to reproduce against a single module.
    #[error("{pass} pass on module {module_id} did not converge after {iterations} iterations")]
    FixpointExceeded {
        module_id: u32,
        pass: PassKind,
        iterations: usize,
    },

    /// The persisted cache's bundle digest didn't match the input bundle.
    /// Recoverable: the cache is discarded and the run proceeds cold.
    #[error("cache checksum mismatch: expected {expected}, found {found}")]
    CacheChecksumMismatch { expected: String, found: String },

    /// The bundle contained zero `__d(...)` registrations.
    #[error(
        "no modules found in bundle; likely causes: (1) the input is not a Metro bundle, \
         (2) the bundle was minified in a way that renamed `__d`, \
         (3) the wrong file was passed as `in`"
    )]
    NoModulesFound,
}

impl DecompileError {
    /// True when this error must abort the whole run. False for errors the
    /// orchestrator is expected to log and route around.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            DecompileError::MalformedRegistration { .. }
                | DecompileError::CacheChecksumMismatch { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, DecompileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_registration_is_recoverable() {
        let err = DecompileError::MalformedRegistration {
            module_id: Some(4),
            reason: "factory has 5 parameters, expected 7".into(),
        };
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("moduleId 4"));
    }

    #[test]
    fn cache_mismatch_is_recoverable() {
        let err = DecompileError::CacheChecksumMismatch {
            expected: "aaaa".into(),
            found: "bbbb".into(),
        };
        assert!(!err.is_fatal());
    }

    #[test]
    fn fixpoint_exceeded_is_fatal() {
        let err = DecompileError::FixpointExceeded {
            module_id: 1,
            pass: PassKind::Tagger,
            iterations: 16,
        };
        assert!(err.is_fatal());
        assert!(err.to_string().contains("tagger"));
    }

    #[test]
    fn no_modules_found_is_fatal_and_diagnostic() {
        let err = DecompileError::NoModulesFound;
        assert!(err.is_fatal());
        assert!(err.to_string().contains("likely causes"));
    }
}
