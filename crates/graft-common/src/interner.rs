//! String interning for identifier deduplication.
//!
//! Identifiers and qualified-name segments appear many times per unit; the
//! arena stores an `Atom` (a dense u32 handle) instead of an owned string.

use rustc_hash::FxHashMap;

/// Handle to an interned string. `Atom::NONE` is the absent sentinel.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Atom(pub u32);

impl Atom {
    pub const NONE: Atom = Atom(u32::MAX);

    #[inline]
    pub fn is_none(&self) -> bool {
        *self == Atom::NONE
    }

    #[inline]
    pub fn is_some(&self) -> bool {
        *self != Atom::NONE
    }
}

#[derive(Debug, Default)]
pub struct Interner {
    map: FxHashMap<String, Atom>,
    strings: Vec<String>,
}

impl Interner {
    pub fn new() -> Interner {
        Interner::default()
    }

    pub fn intern(&mut self, text: &str) -> Atom {
        if let Some(&atom) = self.map.get(text) {
            return atom;
        }
        let atom = Atom(self.strings.len() as u32);
        self.strings.push(text.to_string());
        self.map.insert(text.to_string(), atom);
        atom
    }

    /// Resolve an atom back to its text. Panics on `Atom::NONE`; callers
    /// check `is_some` first, same discipline as arena index lookups.
    pub fn resolve(&self, atom: Atom) -> &str {
        &self.strings[atom.0 as usize]
    }

    pub fn lookup(&self, text: &str) -> Option<Atom> {
        self.map.get(text).copied()
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}
