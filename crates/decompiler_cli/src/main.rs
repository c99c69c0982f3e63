use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use logger::{Logger, StdioLogger};
use orchestrator::Options;

/// Command-line surface (§6): everything the pipeline needs to run, plus
/// the couple of throughput/verbosity knobs that don't change output
/// semantics.
#[derive(Parser, Debug)]
#[command(name = "decompile-bundle", about = "Decompiles a Metro/React Native bundle back into its source modules")]
struct CliArgs {
    /// Path to the bundle file to decompile.
    #[arg(long = "in")]
    input: PathBuf,

    /// Folder to write decompiled modules (and the tagger cache) into.
    #[arg(long = "out")]
    out: PathBuf,

    /// Per-module folder for unbundled apps, concatenated onto the bundle.
    #[arg(long = "bundles-folder")]
    bundles_folder: Option<PathBuf>,

    /// Restrict decompilation to one module and its transitive dependencies.
    #[arg(long)]
    entry: Option<u32>,

    /// Log cumulative per-plugin wall-clock time after the run.
    #[arg(long, default_value_t = false)]
    performance: bool,

    /// Log a per-module dependency summary after the run.
    #[arg(long, default_value_t = false)]
    verbose: bool,

    /// Emit modules tagged ignored instead of pruning them.
    #[arg(long = "decompile-ignored", default_value_t = false)]
    decompile_ignored: bool,

    /// Trust a pre-existing cache's ignore/NPM flags, skipping re-tagging.
    #[arg(long = "aggressive-cache", default_value_t = false)]
    aggressive_cache: bool,

    /// Skip the external lint/format pass this tool would otherwise hand
    /// emitted files to.
    #[arg(long = "no-eslint", default_value_t = false)]
    no_eslint: bool,
}

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let mut opts = Options::new(args.input, args.out);
    opts.bundles_folder = args.bundles_folder;
    opts.entry = args.entry;
    opts.performance = args.performance;
    opts.verbose = args.verbose;
    opts.decompile_ignored = args.decompile_ignored;
    opts.aggressive_cache = args.aggressive_cache;
    opts.no_eslint = args.no_eslint;

    let logger = StdioLogger::new();
    match orchestrator::run(&opts, &logger) {
        Ok(summary) => {
            (&logger).log(format!(
                "decompiled {} of {} modules ({} ignored, {} npm)",
                summary.emitted.len(),
                summary.modules_total,
                summary.modules_ignored,
                summary.modules_npm,
            ));
            if !summary.recoverable_errors.is_empty() {
                (&logger).warn(format!(
                    "{} malformed registration(s) skipped, see warnings above",
                    summary.recoverable_errors.len()
                ));
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            (&logger).error(err.to_string());
            ExitCode::FAILURE
        }
    }
}
