//! Schema identifier sanitization
//!
//! Node labels and relationship types are interpolated into write statements
//! as identifiers; stores do not accept them as bound parameters. Every such
//! string passes through an allow-list first: ASCII letters, digits,
//! underscore and CJK unified ideographs. Anything else becomes `_`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

static DISALLOWED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9_\x{4e00}-\x{9fff}]").unwrap());

/// Identifier sanitization failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("Schema identifier is empty (raw value {raw:?})")]
    Empty { raw: String },
}

/// A label or relationship type that is safe to interpolate into a statement
///
/// The only way to build one is [`Identifier::sanitize`], so holding an
/// `Identifier` means the allow-list has been applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Replace every character outside the allow-list with `_`.
    ///
    /// Fails only when the input is empty.
    pub fn sanitize(raw: &str) -> Result<Self, IdentifierError> {
        let cleaned = DISALLOWED_RE.replace_all(raw, "_");
        if cleaned.is_empty() {
            return Err(IdentifierError::Empty {
                raw: raw.to_string(),
            });
        }
        Ok(Self(cleaned.into_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Whether a character survives sanitization unchanged
pub fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || ('\u{4e00}'..='\u{9fff}').contains(&c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_injection_attempt_is_neutralized() {
        let id = Identifier::sanitize("Foo`; DROP").unwrap();
        assert_eq!(id.as_str(), "Foo___DROP");

        let id = Identifier::sanitize("Label'}) DETACH DELETE n //").unwrap();
        assert!(id.as_str().chars().all(is_allowed));
        assert!(!id.as_str().contains('\''));
    }

    #[test]
    fn test_cjk_and_ascii_pass_through() {
        assert_eq!(Identifier::sanitize("药品_2").unwrap().as_str(), "药品_2");
        assert_eq!(
            Identifier::sanitize("BELONGS_TO").unwrap().as_str(),
            "BELONGS_TO"
        );
    }

    #[test]
    fn test_each_disallowed_char_becomes_one_underscore() {
        assert_eq!(Identifier::sanitize("a-b c").unwrap().as_str(), "a_b_c");
        assert_eq!(Identifier::sanitize("é").unwrap().as_str(), "_");
        assert_eq!(Identifier::sanitize("保险（团体）").unwrap().as_str(), "保险_团体_");
    }

    #[test]
    fn test_empty_identifier_is_an_error() {
        assert_eq!(
            Identifier::sanitize(""),
            Err(IdentifierError::Empty { raw: String::new() })
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn sanitized_output_uses_only_allowed_chars(raw in "\\PC{1,40}") {
            let id = Identifier::sanitize(&raw).unwrap();
            prop_assert!(id.as_str().chars().all(is_allowed));
            prop_assert!(!id.as_str().contains('`'));
            prop_assert!(!id.as_str().contains('"'));
            prop_assert!(!id.as_str().contains('\''));
            prop_assert_eq!(id.as_str().chars().count(), raw.chars().count());
        }

        #[test]
        fn sanitize_is_idempotent(raw in "\\PC{1,40}") {
            let once = Identifier::sanitize(&raw).unwrap();
            let twice = Identifier::sanitize(once.as_str()).unwrap();
            prop_assert_eq!(once, twice);
        }
    }
}
