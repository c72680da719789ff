//! Key normalization.

/// Character every whitespace character in a key is replaced with.
pub const SEPARATOR: char = '_';

/// Canonical form of a key.
///
/// Each whitespace character becomes [`SEPARATOR`], so `"new key"` and
/// `"new_key"` name the same entry. Applying it twice changes nothing.
pub fn normalize(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_whitespace() { SEPARATOR } else { c })
        .collect()
}
