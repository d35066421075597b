//! # Identity Newtypes
//!
//! `RecordName` is the human-chosen label a record is stored under. `Author`
//! identifies the principal that stored it. Keeping both as newtypes means a
//! record name cannot be passed where an author is expected.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CoreError;

/// Longest accepted record name, in characters.
pub const MAX_NAME_CHARS: usize = 256;

/// Author recorded when no wallet account is attached.
pub const PLACEHOLDER_AUTHOR: &str = "demo-user";

/// The label a file record is stored under.
///
/// Not derived from content. Storing again under the same name replaces the
/// record's digest in the local store.
///
/// [`RecordName::new()`] enforces the naming rules for new records. Decoding
/// only rejects blank names, so records written elsewhere (the contract
/// accepts any string) still load verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "String")]
pub struct RecordName(String);

impl RecordName {
    /// Validate and wrap a record name. Surrounding whitespace is trimmed.
    pub fn new(name: impl AsRef<str>) -> Result<Self, CoreError> {
        let trimmed = name.as_ref().trim();
        if trimmed.is_empty() {
            return Err(CoreError::InvalidName("name must not be empty".into()));
        }
        let chars = trimmed.chars().count();
        if chars > MAX_NAME_CHARS {
            return Err(CoreError::InvalidName(format!(
                "name too long: {chars} chars (max {MAX_NAME_CHARS})"
            )));
        }
        if trimmed.chars().any(char::is_control) {
            return Err(CoreError::InvalidName(format!(
                "name contains control characters: {trimmed:?}"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RecordName {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for RecordName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw.trim().is_empty() {
            return Err(D::Error::custom("record name must not be empty"));
        }
        Ok(Self(raw))
    }
}

impl From<RecordName> for String {
    fn from(name: RecordName) -> Self {
        name.0
    }
}

impl std::fmt::Display for RecordName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for RecordName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for RecordName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// The principal that stored a record: a wallet account address, or the
/// placeholder when running without one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Author(String);

impl Author {
    /// Wrap an account identifier. Blank input yields the placeholder.
    pub fn new(account: impl Into<String>) -> Self {
        let account = account.into();
        if account.trim().is_empty() {
            Self::placeholder()
        } else {
            Self(account.trim().to_string())
        }
    }

    /// The author recorded when no wallet is connected.
    pub fn placeholder() -> Self {
        Self(PLACEHOLDER_AUTHOR.to_string())
    }

    /// Whether this is the placeholder author.
    pub fn is_placeholder(&self) -> bool {
        self.0 == PLACEHOLDER_AUTHOR
    }

    /// The author as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for listings, e.g. `0xc6520b…6390b9`.
    pub fn abbreviated(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() <= 16 {
            return self.0.clone();
        }
        let head: String = chars[..8].iter().collect();
        let tail: String = chars[chars.len() - 6..].iter().collect();
        format!("{head}…{tail}")
    }
}

impl Default for Author {
    fn default() -> Self {
        Self::placeholder()
    }
}

impl std::fmt::Display for Author {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_trimmed() {
        let n = RecordName::new("  report.pdf ").unwrap();
        assert_eq!(n.as_str(), "report.pdf");
        assert_eq!(n, "report.pdf");
    }

    #[test]
    fn empty_name_rejected() {
        assert!(RecordName::new("").is_err());
        assert!(RecordName::new("   ").is_err());
    }

    #[test]
    fn overlong_name_rejected() {
        let long = "a".repeat(MAX_NAME_CHARS + 1);
        assert!(RecordName::new(long).is_err());
        assert!(RecordName::new("a".repeat(MAX_NAME_CHARS)).is_ok());
    }

    #[test]
    fn control_characters_rejected() {
        assert!(RecordName::new("bad\nname").is_err());
    }

    #[test]
    fn decoding_rejects_only_blank_names() {
        let ok: RecordName = serde_json::from_str("\"a.txt\"").unwrap();
        assert_eq!(ok, "a.txt");
        assert!(serde_json::from_str::<RecordName>("\"\"").is_err());
        assert!(serde_json::from_str::<RecordName>("\"  \"").is_err());
    }

    #[test]
    fn decoding_keeps_names_the_constructor_refuses() {
        let long = "n".repeat(MAX_NAME_CHARS + 40);
        let decoded: RecordName = serde_json::from_value(serde_json::json!(long.clone())).unwrap();
        assert_eq!(decoded.as_str(), long);

        let tabbed: RecordName = serde_json::from_str("\"col\\tsep \"").unwrap();
        assert_eq!(tabbed.as_str(), "col\tsep ");
    }

    #[test]
    fn blank_author_becomes_placeholder() {
        assert!(Author::new("").is_placeholder());
        assert!(Author::default().is_placeholder());
        assert_eq!(Author::placeholder().as_str(), "demo-user");
    }

    #[test]
    fn author_abbreviation() {
        let a = Author::new("0xc6520b2c175f13993261246861eee724db0ca45a17a14750285166298b6390b9");
        assert_eq!(a.abbreviated(), "0xc6520b…6390b9");
        assert_eq!(Author::new("short").abbreviated(), "short");
    }
}
