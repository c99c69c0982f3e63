use decompiler_errors::PassKind;

use crate::plugin::{DecompilerPlugin, EditorPlugin, PluginImpl, TaggerPlugin};

struct PluginEntry {
    pass: PassKind,
    plugin: Box<dyn PluginImpl>,
}

/// Read-only, priority-sorted plugin table built once at startup. There is
/// no dynamic plugin-loading mechanism: the catalog is fixed code (§4.6-4.7
/// in the taggers/editors/decompilers crates), assembled here via the
/// builder.
pub struct PluginRegistry {
    entries: Vec<PluginEntry>,
}

impl PluginRegistry {
    pub fn builder() -> PluginRegistryBuilder {
        PluginRegistryBuilder {
            entries: Vec::new(),
        }
    }

    /// Plugins for one pass, in run order (ascending priority, ties broken
    /// by registration order).
    pub fn for_pass(&self, pass: PassKind) -> impl Iterator<Item = &dyn PluginImpl> {
        self.entries
            .iter()
            .filter(move |e| e.pass == pass)
            .map(|e| e.plugin.as_ref())
    }
}

pub struct PluginRegistryBuilder {
    entries: Vec<PluginEntry>,
}

impl PluginRegistryBuilder {
    pub fn tagger(mut self, plugin: impl TaggerPlugin + 'static) -> Self {
        self.entries.push(PluginEntry {
            pass: PassKind::Tagger,
            plugin: Box::new(plugin),
        });
        self
    }

    pub fn editor(mut self, plugin: impl EditorPlugin + 'static) -> Self {
        self.entries.push(PluginEntry {
            pass: PassKind::Editor,
            plugin: Box::new(plugin),
        });
        self
    }

    pub fn decompiler(mut self, plugin: impl DecompilerPlugin + 'static) -> Self {
        self.entries.push(PluginEntry {
            pass: PassKind::Decompiler,
            plugin: Box::new(plugin),
        });
        self
    }

    pub fn build(mut self) -> PluginRegistry {
        // Vec::sort_by_key is a stable sort: entries with equal priority
        // keep the order they were registered in, which is the documented
        // tagger tie-break rule (§4.6).
        self.entries.sort_by_key(|e| e.plugin.priority());
        PluginRegistry {
            entries: self.entries,
        }
    }
}
