//! Drives the end-to-end decompile pipeline over `bundle_ast` through
//! `tag_cache`: parse the bundle, tag modules to a fixed point, propagate
//! ignores, restrict to an entry's closure when asked, rewrite surviving
//! modules (editors then decompilers to a fixed point), and persist both
//! the emitted `.js` files and the tagger cache.
//!
//! This crate owns the file I/O the CLI binary would otherwise have to
//! duplicate in every test: [`pipeline::run`] takes an in-process
//! [`config::Options`] and a [`logger::Logger`], so the whole pipeline is
//! exercised without spawning a process or parsing argv.

pub mod config;
pub mod pipeline;
pub mod report;

pub use config::Options;
pub use pipeline::run;
pub use report::{EmittedModule, RunSummary};
