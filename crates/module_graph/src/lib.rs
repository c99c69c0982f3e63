//! In-memory representation of one bundle's `__d(...)` registrations and the
//! dependency graph between them.

mod graph;
mod module;

pub use graph::{ModuleGraph, RegistrationDiagnostic};
pub use module::{FactoryParams, Module, TagParameters};
