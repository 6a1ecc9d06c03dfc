//! OUI registry data model: raw registry rows, the merged prefix map, and the
//! textfile metric rendering.

pub mod map;
pub mod metric;

pub use map::OuiMap;

/// Hex digits in an IEEE MA-L assignment, e.g. `286FB9`.
pub const PREFIX_LEN: usize = 6;

/// One data row of the registry CSV after normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub oui: String,
    pub organization: String,
}

impl RegistryEntry {
    /// Build an entry from the raw assignment and organization columns.
    /// Returns None if the assignment does not have the expected length.
    pub fn from_columns(assignment: &str, organization: &str) -> Option<Self> {
        Some(Self {
            oui: normalize_prefix(assignment)?,
            organization: organization.trim().to_string(),
        })
    }
}

/// Convert "286FB9" -> "28:6f:b9"
pub fn normalize_prefix(assignment: &str) -> Option<String> {
    let lower: Vec<char> = assignment.to_lowercase().chars().collect();
    if lower.len() != PREFIX_LEN {
        return None;
    }

    let octets: Vec<String> = lower.chunks(2).map(|pair| pair.iter().collect()).collect();
    Some(octets.join(":"))
}
