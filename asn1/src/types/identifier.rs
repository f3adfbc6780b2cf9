use std::{
    fmt::Display,
    hash::{Hash, Hasher},
};

use unicode_normalization::UnicodeNormalization;

/// Name of a type, value or component as written in the source.
///
/// Two identifiers compare equal when their internal names match, so
/// `my-field` and `my\u{2011}field` (non breaking hyphen) are the same name.
#[derive(Debug, Clone)]
pub struct Identifier {
    /// The name as written in ASN.1, NFC normalised
    display: String,

    /// Name used for lookups and generated code, hyphens become `__`
    name: String,
}

impl Identifier {
    /// Create an identifier from its ASN.1 spelling
    pub fn new(asn: &str) -> Self {
        let display: String = asn.nfc().collect();
        let name = display.replace(['-', '\u{2011}'], "__");

        Identifier { display, name }
    }

    /// The name as it was written in the source
    pub fn display(&self) -> &str {
        &self.display
    }

    /// The internal name, used as the key of all name lookups
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name visible from TTCN-3, single underscores instead of hyphens
    pub fn ttcn_name(&self) -> String {
        self.display.replace(['-', '\u{2011}'], "_")
    }

    /// Can this identifier be written in TTCN-3 source?  TTCN-3 identifiers
    /// are restricted to ascii letters, digits and underscores, and must start
    /// with a letter.
    pub fn is_reachable_from_ttcn(&self) -> bool {
        let name = self.ttcn_name();
        let mut chars = name.chars();

        let Some(first) = chars.next() else {
            return false;
        };

        first.is_ascii_alphabetic() && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }
}

impl PartialEq for Identifier {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Identifier {}

impl Hash for Identifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hyphens_map_to_double_underscore() {
        let id = Identifier::new("my-field");
        assert_eq!(id.display(), "my-field");
        assert_eq!(id.name(), "my__field");
        assert_eq!(id.ttcn_name(), "my_field");
        assert_eq!(id, Identifier::new("my\u{2011}field"));
    }

    #[test]
    fn reachability() {
        assert!(Identifier::new("field1").is_reachable_from_ttcn());
        assert!(Identifier::new("a-b-c").is_reachable_from_ttcn());
        assert!(!Identifier::new("caf\u{e9}").is_reachable_from_ttcn());
        assert!(!Identifier::new("a$b").is_reachable_from_ttcn());
    }

    #[test]
    fn normalises_to_nfc() {
        let composed = Identifier::new("caf\u{e9}");
        let decomposed = Identifier::new("cafe\u{301}");
        assert_eq!(composed, decomposed);
        assert_eq!(decomposed.display(), "caf\u{e9}");
    }
}
