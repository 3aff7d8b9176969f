use std::collections::HashMap;

use once_cell::sync::Lazy;

use super::families;

/// Record numbering space.
///
/// Each binary format family assigns its own meaning to type codes, so
/// the same numeric code can name different records in different
/// families without conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordFamily {
    /// PowerPoint document stream records
    Presentation,
    /// Office Drawing (Escher) records
    Drawing,
    /// Workbook BIFF records
    Biff,
    /// Embedded chart BIFF records
    Chart,
}

/// Structural classification of a record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RecordKind {
    /// Holds child records in its payload
    Container,
    /// Leaf record with an opaque or typed payload
    Atom,
    /// Not registered; payload is preserved verbatim
    #[default]
    Unknown,
}

struct Entry {
    kind: RecordKind,
    name: &'static str,
}

/// Table mapping (family, code) pairs to record kinds and display names.
///
/// Classification is total: codes without an entry are `Unknown`.
/// Registering the same (family, code) twice replaces the earlier entry,
/// so later tables can override builtin classifications.
pub struct Registry {
    entries: HashMap<(RecordFamily, u16), Entry>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register a record type. Last registration wins.
    pub fn register(&mut self, family: RecordFamily, code: u16, kind: RecordKind, name: &'static str) {
        self.entries.insert((family, code), Entry { kind, name });
    }

    /// Classify a record code within its family.
    pub fn classify(&self, family: RecordFamily, code: u16) -> RecordKind {
        self.entries
            .get(&(family, code))
            .map(|entry| entry.kind)
            .unwrap_or_default()
    }

    /// Display name for a registered code, for diagnostics.
    pub fn name(&self, family: RecordFamily, code: u16) -> Option<&'static str> {
        self.entries.get(&(family, code)).map(|entry| entry.name)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let mut registry = Registry::new();
    families::register_presentation(&mut registry);
    families::register_drawing(&mut registry);
    families::register_biff(&mut registry);
    families::register_chart(&mut registry);
    registry
});

/// The process-wide registry holding all builtin family tables.
pub fn registry() -> &'static Registry {
    &REGISTRY
}
