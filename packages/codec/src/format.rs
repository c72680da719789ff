//! Format hints for snapshot encoding.

use std::fmt;

/// Names the wire format a codec produces.
///
/// MIME-type-like strings, so a codec can describe itself in errors and logs
/// without the store knowing anything about the encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Format(pub &'static str);

impl Format {
    /// JSON format (`application/json`)
    pub const JSON: Format = Format("application/json");

    /// A `Value` that was converted from a Rust type and never hit a codec.
    pub const VALUE: Format = Format("application/x-perdict-value");

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_are_distinct() {
        assert_eq!(Format::JSON.as_str(), "application/json");
        assert_ne!(Format::JSON, Format::VALUE);
    }

    #[test]
    fn display_impl() {
        assert_eq!(format!("{}", Format::JSON), "application/json");
        assert_eq!(format!("{}", Format("application/cbor")), "application/cbor");
    }
}
