use std::collections::HashMap;
use std::collections::hash_map::Entry;

use super::RegistryEntry;

/// Joins organization names that share one OUI.
pub const ORGANIZATION_SEPARATOR: &str = " | ";

/// Normalized OUI prefix -> organization name(s).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OuiMap {
    entries: HashMap<String, String>,
}

impl OuiMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry. A prefix that is already present keeps its existing
    /// organization and gets the new one appended after the separator.
    pub fn insert(&mut self, entry: RegistryEntry) {
        match self.entries.entry(entry.oui) {
            Entry::Occupied(mut existing) => {
                let merged = existing.get_mut();
                merged.push_str(ORGANIZATION_SEPARATOR);
                merged.push_str(&entry.organization);
            }
            Entry::Vacant(slot) => {
                slot.insert(entry.organization);
            }
        }
    }

    #[cfg(test)]
    pub fn get(&self, oui: &str) -> Option<&str> {
        self.entries.get(oui).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<RegistryEntry> for OuiMap {
    fn from_iter<I: IntoIterator<Item = RegistryEntry>>(iter: I) -> Self {
        let mut map = Self::new();
        for entry in iter {
            map.insert(entry);
        }
        map
    }
}
