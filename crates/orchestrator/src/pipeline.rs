use std::path::Path;

use ahashmap::AHashMap;
use decompiler_errors::{DecompileError, PassKind, Result};
use logger::Logger;
use module_graph::ModuleGraph;
use plugin_core::{PluginRegistry, Router};

use crate::config::Options;
use crate::report::{EmittedModule, RunSummary};

/// Reads the bundle file, and - for unbundled apps - every `.js` file
/// under `bundles_folder`, concatenated onto it in directory order (§6).
fn read_bundle_source(opts: &Options) -> Result<String> {
    let read = |path: &Path| {
        std::fs::read_to_string(path).map_err(|e| DecompileError::ParseError {
            source_name: path.display().to_string(),
            reason: e.to_string(),
        })
    };

    let mut src = read(&opts.bundle_path)?;
    if let Some(folder) = &opts.bundles_folder {
        let mut entries: Vec<_> = std::fs::read_dir(folder)
            .map_err(|e| DecompileError::ParseError {
                source_name: folder.display().to_string(),
                reason: e.to_string(),
            })?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("js"))
            .collect();
        entries.sort();
        for path in entries {
            src.push('\n');
            src.push_str(&read(&path)?);
        }
    }
    Ok(src)
}

fn default_registry() -> PluginRegistry {
    let mut builder = PluginRegistry::builder();
    builder = taggers::register(builder);
    builder = editors::register(builder);
    builder = decompilers::register(builder);
    builder.build()
}

fn record_timings(
    timings: &mut AHashMap<PassKind, AHashMap<&'static str, std::time::Duration>>,
    pass: PassKind,
    outcomes: &[(u32, plugin_core::PassOutcome)],
) {
    let entry = timings.entry(pass).or_default();
    for (_, outcome) in outcomes {
        for (name, time) in &outcome.plugin_timings {
            *entry.entry(*name).or_default() += *time;
        }
    }
}

/// Runs the full pipeline described by the data-flow section of §2: parse,
/// build the graph, (optionally) load the cache, tag to fixpoint, prune
/// ignored modules, rewrite (editors then decompilers to fixpoint), print,
/// and persist. Directly unit-testable: construct an [`Options`] in
/// process, no argument parsing required.
pub fn run<L: Logger>(opts: &Options, logger: L) -> Result<RunSummary> {
    let bundle_src = read_bundle_source(opts)?;
    let (cm, comments, mut bundle_program) =
        bundle_ast::parse_program(&opts.bundle_path.display().to_string(), &bundle_src)?;

    let (mut graph, malformed) = ModuleGraph::from_bundle(&mut bundle_program, &cm)?;
    for diag in &malformed {
        logger.warn(format!("{}: {}", diag.location, diag.error));
    }

    let mut cache_checksum_mismatch = false;
    if opts.cache_enabled() {
        let cache_path = tag_cache::cache_path(&opts.out_dir, opts.entry);
        match tag_cache::CacheDocument::load(&cache_path, &bundle_src) {
            Ok(Some(doc)) => doc.apply_to(&mut graph),
            Ok(None) => {}
            Err(DecompileError::CacheChecksumMismatch { expected, found }) => {
                cache_checksum_mismatch = true;
                logger.warn(format!(
                    "cache checksum mismatch (expected {expected}, found {found}); \
                     discarding cache and running cold"
                ));
            }
            Err(e) => return Err(e),
        }
    }

    let registry = default_registry();
    let router = Router::new(&registry);
    let mut timings: AHashMap<PassKind, AHashMap<&'static str, std::time::Duration>> =
        AHashMap::default();

    // Skip re-tagging modules the cache already settled, when aggressive
    // mode was requested (§4.9): the tagger pass is idempotent, so this is
    // a throughput optimization, never a correctness requirement.
    let ids: Vec<u32> = graph.ascending_ids().to_vec();
    let mut tagger_outcomes = Vec::with_capacity(ids.len());
    for id in &ids {
        if opts.aggressive_cache && graph.get(*id).map_or(false, |m| m.ignored) {
            continue;
        }
        let mut module = graph.take(*id).expect("ascending_ids tracks only present ids");
        let outcome = router.run_pass(&graph, &mut module, PassKind::Tagger)?;
        graph.put_back(module);
        tagger_outcomes.push((*id, outcome));
    }
    record_timings(&mut timings, PassKind::Tagger, &tagger_outcomes);

    ignore_propagator::propagate_ignores(&mut graph);

    if let Some(entry) = opts.entry {
        graph.restrict_to_entry_closure(entry, opts.aggressive_cache)?;
    }

    let rewrite_ids: Vec<u32> = graph
        .ascending_ids()
        .iter()
        .copied()
        .filter(|id| {
            opts.decompile_ignored || graph.get(*id).map_or(false, |m| !m.ignored)
        })
        .collect();

    let mut editor_outcomes = Vec::with_capacity(rewrite_ids.len());
    let mut decompiler_outcomes = Vec::with_capacity(rewrite_ids.len());
    for id in &rewrite_ids {
        let mut module = graph.take(*id).expect("rewrite_ids tracks only present ids");
        let editor_outcome = router.run_pass(&graph, &mut module, PassKind::Editor)?;
        let decompiler_outcome = router.run_pass(&graph, &mut module, PassKind::Decompiler)?;
        graph.put_back(module);
        editor_outcomes.push((*id, editor_outcome));
        decompiler_outcomes.push((*id, decompiler_outcome));
    }
    record_timings(&mut timings, PassKind::Editor, &editor_outcomes);
    record_timings(&mut timings, PassKind::Decompiler, &decompiler_outcomes);

    let mut emitted = Vec::with_capacity(rewrite_ids.len());
    for id in &rewrite_ids {
        let module = graph.get(*id).expect("rewrite_ids tracks only present ids");
        let source = bundle_ast::print_module(&cm, &module.module_code, Some(&comments))?;
        let written = write_if_changed(&opts.out_dir, module.module_id, &source)?;
        emitted.push(EmittedModule {
            module_id: module.module_id,
            module_name: module.module_name.as_ref().map(|n| n.to_string()),
            dependencies: module.dependencies.clone(),
            source,
            written,
        });
    }

    if opts.cache_enabled() {
        let cache_path = tag_cache::cache_path(&opts.out_dir, opts.entry);
        std::fs::create_dir_all(&opts.out_dir).map_err(|e| DecompileError::ParseError {
            source_name: opts.out_dir.display().to_string(),
            reason: e.to_string(),
        })?;
        tag_cache::CacheDocument::capture(&graph, &bundle_src).save(&cache_path)?;
    }

    let modules_ignored = graph.iter_ascending().filter(|m| m.ignored).count();
    let modules_npm = graph.iter_ascending().filter(|m| m.is_npm_module).count();

    if opts.performance {
        for (pass, by_plugin) in &timings {
            for (name, time) in by_plugin {
                logger.log(format!("[{pass}] {name}: {time:?}"));
            }
        }
    }

    let summary = RunSummary {
        modules_total: graph.len(),
        modules_ignored,
        modules_npm,
        emitted,
        recoverable_errors: malformed,
        cache_checksum_mismatch,
        plugin_timings: timings,
    };

    if opts.verbose {
        logger.log(format!(
            "{} modules total, {} ignored, {} npm\n{}",
            summary.modules_total,
            summary.modules_ignored,
            summary.modules_npm,
            summary.dependency_summary()
        ));
    }

    Ok(summary)
}

/// Writes `source` to `<out_dir>/<module_id>.js` only if the file is
/// missing or its content differs, so unchanged files keep their mtime
/// (§6). Returns whether a write happened.
fn write_if_changed(out_dir: &Path, module_id: u32, source: &str) -> Result<bool> {
    std::fs::create_dir_all(out_dir).map_err(|e| DecompileError::ParseError {
        source_name: out_dir.display().to_string(),
        reason: e.to_string(),
    })?;
    let path = out_dir.join(format!("{module_id}.js"));
    if let Ok(existing) = std::fs::read_to_string(&path) {
        if existing == source {
            return Ok(false);
        }
    }
    std::fs::write(&path, source).map_err(|e| DecompileError::ParseError {
        source_name: path.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(true)
}
