//! Checksum-guarded persistence of tagging metadata (§4.9, C10).
//!
//! The cache only ever stores the *output of the tagger pass* - tags,
//! `isNpmModule`/`npmModuleName`, `ignored` - plus enough of each module's
//! identity (`moduleId`, `originalCode`) to validate a reload against a
//! possibly-changed bundle. It never stores `moduleCode`: editors and
//! decompilers always re-run against a freshly parsed working AST, cache or
//! no cache.

use std::path::Path;

use decompiler_errors::{DecompileError, Result};
use module_graph::ModuleGraph;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Bumped whenever the shape of [`CachedModule`] changes, so a cache
/// written by a previous version of this tool is discarded rather than
/// misread as the current schema.
pub const SCHEMA_VERSION: &str = "1";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CachedModule {
    #[serde(rename = "moduleId")]
    pub module_id: u32,
    #[serde(rename = "originalCode")]
    pub original_code: String,
    pub tags: Vec<String>,
    #[serde(rename = "isNpmModule")]
    pub is_npm_module: bool,
    #[serde(rename = "npmModuleName")]
    pub npm_module_name: Option<String>,
    pub ignored: bool,
}

/// The on-disk document, written with `serde_json`'s pretty printer so a
/// stale-cache bug report can be diffed by eye.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheDocument {
    /// Schema version, see [`SCHEMA_VERSION`].
    pub checksum: String,
    /// SHA-256 digest (hex) of the full bundle text this cache was built
    /// from. `None` only for documents hand-constructed in tests.
    #[serde(rename = "inputChecksum", skip_serializing_if = "Option::is_none")]
    pub input_checksum: Option<String>,
    pub modules: Vec<CachedModule>,
}

/// SHA-256 digest of the bundle text, hex-encoded. Any collision-resistant
/// hash satisfies §4.9; SHA-256 is what this implementation picked.
pub fn digest_bundle(bundle_src: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bundle_src.as_bytes());
    hex::encode(hasher.finalize())
}

impl CacheDocument {
    /// Snapshots the tagger-produced fields of every module in the graph.
    pub fn capture(graph: &ModuleGraph, bundle_src: &str) -> Self {
        let modules = graph
            .iter_ascending()
            .map(|m| CachedModule {
                module_id: m.module_id,
                original_code: m.original_code.clone(),
                tags: m.tags.iter().map(|t| t.to_string()).collect(),
                is_npm_module: m.is_npm_module,
                npm_module_name: m.npm_module_name.clone(),
                ignored: m.ignored,
            })
            .collect();
        CacheDocument {
            checksum: SCHEMA_VERSION.to_string(),
            input_checksum: Some(digest_bundle(bundle_src)),
            modules,
        }
    }

    /// Re-applies this cache's tagger fields onto a freshly-constructed
    /// graph for the *same* bundle. Modules the cache doesn't know about
    /// (added to the bundle since the cache was written) are left alone;
    /// modules the graph doesn't have anymore are silently dropped.
    pub fn apply_to(&self, graph: &mut ModuleGraph) {
        for cached in &self.modules {
            let Some(module) = graph.get_mut(cached.module_id) else {
                continue;
            };
            for tag in &cached.tags {
                module.tag(tag.clone());
            }
            if cached.is_npm_module {
                module.is_npm_module = true;
                module.npm_module_name = cached.npm_module_name.clone();
            }
            if cached.ignored {
                module.ignored = true;
            }
        }
    }

    /// Writes this document as pretty-printed JSON to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(to_parse_error)?;
        std::fs::write(path, json).map_err(|e| DecompileError::ParseError {
            source_name: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Loads a cache document from `path` and validates it against
    /// `bundle_src`. Returns `Ok(None)` (not an error) when `path` doesn't
    /// exist - a missing cache is the normal cold-start case. Returns
    /// `Err(CacheChecksumMismatch)` (recoverable - the caller logs it and
    /// proceeds without a cache) when the schema version or bundle digest
    /// don't match.
    pub fn load(path: &Path, bundle_src: &str) -> Result<Option<Self>> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(DecompileError::ParseError {
                    source_name: path.display().to_string(),
                    reason: e.to_string(),
                })
            }
        };
        let doc: CacheDocument = serde_json::from_str(&raw).map_err(to_parse_error)?;

        if doc.checksum != SCHEMA_VERSION {
            return Err(DecompileError::CacheChecksumMismatch {
                expected: SCHEMA_VERSION.to_string(),
                found: doc.checksum,
            });
        }
        let expected_digest = digest_bundle(bundle_src);
        match &doc.input_checksum {
            Some(found) if *found == expected_digest => Ok(Some(doc)),
            Some(found) => Err(DecompileError::CacheChecksumMismatch {
                expected: expected_digest,
                found: found.clone(),
            }),
            None => Err(DecompileError::CacheChecksumMismatch {
                expected: expected_digest,
                found: "<missing>".to_string(),
            }),
        }
    }
}

fn to_parse_error(e: serde_json::Error) -> DecompileError {
    DecompileError::ParseError {
        source_name: "<cache>".to_string(),
        reason: e.to_string(),
    }
}

/// Builds the cache file path for a run: `<out>/<entry-or-null>.cache`
/// (§6).
pub fn cache_path(out_dir: &Path, entry: Option<u32>) -> std::path::PathBuf {
    let stem = entry.map(|e| e.to_string()).unwrap_or_else(|| "null".to_string());
    out_dir.join(format!("{stem}.cache"))
}
