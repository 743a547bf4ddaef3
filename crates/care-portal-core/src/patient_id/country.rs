//! Country name to two-letter code resolution.

use std::collections::HashMap;

/// Names with an explicit code. Everything else uses the fallback.
const BUILTIN_CODES: &[(&str, &str)] = &[
    ("Nepal", "NP"),
    ("India", "IN"),
    ("United States", "US"),
];

/// Filler for fallback codes of one-character names.
const FALLBACK_PAD: char = 'X';

/// How a country code was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountryCode {
    /// Found in the mapping table
    Mapped(String),
    /// Uppercased first two characters of the name. Unrelated countries that
    /// share their first two letters collide.
    Fallback(String),
}

impl CountryCode {
    pub fn as_str(&self) -> &str {
        match self {
            CountryCode::Mapped(code) | CountryCode::Fallback(code) => code,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, CountryCode::Fallback(_))
    }
}

/// Mapping table from country names to identifier codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryCodes {
    codes: HashMap<String, String>,
}

impl Default for CountryCodes {
    fn default() -> Self {
        Self::builtin()
    }
}

impl CountryCodes {
    /// The built-in table.
    pub fn builtin() -> Self {
        Self {
            codes: BUILTIN_CODES
                .iter()
                .map(|(name, code)| (name.to_string(), code.to_string()))
                .collect(),
        }
    }

    /// Add or replace entries, e.g. from configuration.
    pub fn with_overrides<I, K, V>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, code) in overrides {
            self.insert(name, code);
        }
        self
    }

    /// Add or replace one entry. Codes are stored uppercased.
    pub fn insert(&mut self, name: impl Into<String>, code: impl Into<String>) {
        let name: String = name.into();
        self.codes
            .insert(name.trim().to_string(), code.into().to_uppercase());
    }

    /// Exact-name lookup without fallback.
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.codes.get(name.trim()).map(String::as_str)
    }

    /// Resolve a name, falling back to its first two characters (see [`fallback_code`]).
    pub fn resolve(&self, name: &str) -> CountryCode {
        match self.lookup(name) {
            Some(code) => CountryCode::Mapped(code.to_string()),
            None => {
                let fallback = fallback_code(name);
                tracing::warn!(
                    country = %name,
                    code = %fallback,
                    "Country not in code table, using first two letters"
                );
                CountryCode::Fallback(fallback)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// Uppercased first two characters of `name`, padded with `X` to two.
///
/// Every code is exactly two characters, so one country's `YYCC` prefix is
/// never a prefix of another country's identifiers.
fn fallback_code(name: &str) -> String {
    let mut code: String = name.trim().to_uppercase().chars().take(2).collect();
    while code.chars().count() < 2 {
        code.push(FALLBACK_PAD);
    }
    code
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_codes() {
        let codes = CountryCodes::builtin();
        assert_eq!(codes.resolve("Nepal"), CountryCode::Mapped("NP".into()));
        assert_eq!(codes.resolve("India").as_str(), "IN");
        assert_eq!(codes.resolve("United States").as_str(), "US");
        assert_eq!(codes.len(), 3);
    }

    #[test]
    fn test_fallback_first_two_letters() {
        let codes = CountryCodes::builtin();
        let code = codes.resolve("Germany");
        assert!(code.is_fallback());
        assert_eq!(code.as_str(), "GE");

        // Known ambiguity: Georgia collides with Germany
        assert_eq!(codes.resolve("Georgia").as_str(), "GE");
    }

    #[test]
    fn test_fallback_short_names() {
        let codes = CountryCodes::builtin();
        assert_eq!(codes.resolve("x").as_str(), "XX");
        assert_eq!(codes.resolve(" q ").as_str(), "QX");
        assert_eq!(codes.resolve("").as_str(), "XX");
        // Uppercasing can widen a character; the code still has two
        assert_eq!(codes.resolve("ßa").as_str(), "SS");
    }

    #[test]
    fn test_trimmed_lookup() {
        let codes = CountryCodes::builtin();
        assert_eq!(codes.resolve("  Nepal ").as_str(), "NP");
    }

    #[test]
    fn test_overrides() {
        let codes = CountryCodes::builtin().with_overrides([("Germany", "de"), ("Nepal", "NE")]);
        assert_eq!(codes.resolve("Germany"), CountryCode::Mapped("DE".into()));
        assert_eq!(codes.resolve("Nepal").as_str(), "NE");
        assert_eq!(codes.len(), 4);
    }
}
