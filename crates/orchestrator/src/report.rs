use std::time::Duration;

use ahashmap::AHashMap;
use decompiler_errors::PassKind;
use module_graph::RegistrationDiagnostic;

/// One emitted (or would-be-emitted) module, in the shape the CLI needs to
/// write a file and the `verbose` summary needs to describe it.
#[derive(Debug, Clone)]
pub struct EmittedModule {
    pub module_id: u32,
    pub module_name: Option<String>,
    pub dependencies: Vec<Option<u32>>,
    pub source: String,
    pub written: bool,
}

/// Cumulative wall-clock time per plugin, for one pass, across every
/// module the pass ran against (§4.5 point 4; reset between passes, so
/// this is keyed by pass rather than being one global total).
pub type PassTimings = AHashMap<PassKind, AHashMap<&'static str, Duration>>;

/// Everything a caller needs after a run: what survived, what didn't, and
/// the diagnostics the orchestrator accumulated rather than surfacing only
/// the first one (§4.12).
#[derive(Debug)]
pub struct RunSummary {
    pub modules_total: usize,
    pub modules_ignored: usize,
    pub modules_npm: usize,
    pub emitted: Vec<EmittedModule>,
    pub recoverable_errors: Vec<RegistrationDiagnostic>,
    pub cache_checksum_mismatch: bool,
    pub plugin_timings: PassTimings,
}

impl RunSummary {
    pub fn dependency_summary(&self) -> String {
        let mut lines = Vec::with_capacity(self.emitted.len());
        for module in &self.emitted {
            let deps: Vec<String> = module
                .dependencies
                .iter()
                .map(|d| d.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string()))
                .collect();
            lines.push(format!(
                "{}{}: [{}]",
                module.module_id,
                module
                    .module_name
                    .as_ref()
                    .map(|n| format!(" ({n})"))
                    .unwrap_or_default(),
                deps.join(", ")
            ));
        }
        lines.join("\n")
    }
}
