//! # File Record
//!
//! The stored tuple associating a name with a content digest, the author who
//! stored it, when it was stored, and how many times it has been verified.
//!
//! ## Field Names
//!
//! Serialized field names follow the ledger contract's `FileRecord` struct
//! (`file_name`, `file_hash`, `uploader`, `timestamp`, `verification_count`)
//! so the same type decodes view-function results and the local dataset.
//! `verification_count` accepts either a JSON integer or a decimal string.

use serde::{Deserialize, Deserializer, Serialize};

use crate::digest::FileDigest;
use crate::identity::{Author, RecordName};
use crate::temporal::Timestamp;

/// A stored file fingerprint and its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Label chosen at store time.
    #[serde(rename = "file_name")]
    pub name: RecordName,
    /// SHA-256 of the file content.
    #[serde(rename = "file_hash")]
    pub digest: FileDigest,
    /// Principal that stored the record.
    #[serde(rename = "uploader")]
    pub author: Author,
    /// When the record was created or last replaced.
    #[serde(rename = "timestamp")]
    pub stored_at: Timestamp,
    /// Number of successful content matches against this record.
    #[serde(deserialize_with = "lenient_u64")]
    pub verification_count: u64,
}

impl FileRecord {
    /// Create a fresh record with a zero verification count.
    pub fn new(name: RecordName, digest: FileDigest, author: Author, stored_at: Timestamp) -> Self {
        Self {
            name,
            digest,
            author,
            stored_at,
            verification_count: 0,
        }
    }

    /// Whether this record's content digest equals `digest`.
    pub fn matches_digest(&self, digest: &FileDigest) -> bool {
        self.digest == *digest
    }

    /// Replace digest, author and timestamp in place. The verification count
    /// is left as it is.
    pub fn replace_content(&mut self, digest: FileDigest, author: Author, stored_at: Timestamp) {
        self.digest = digest;
        self.author = author;
        self.stored_at = stored_at;
    }

    /// Increment the verification count by one.
    pub fn record_verification(&mut self) {
        self.verification_count = self.verification_count.saturating_add(1);
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CountRepr {
    Int(u64),
    Text(String),
}

fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    match CountRepr::deserialize(deserializer)? {
        CountRepr::Int(n) => Ok(n),
        CountRepr::Text(s) => s
            .trim()
            .parse::<u64>()
            .map_err(|e| serde::de::Error::custom(format!("invalid count {s:?}: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::sha256_digest;

    fn sample() -> FileRecord {
        FileRecord::new(
            RecordName::new("greeting.txt").unwrap(),
            sha256_digest(b"hello"),
            Author::placeholder(),
            Timestamp::from_epoch_secs(1_700_000_000).unwrap(),
        )
    }

    #[test]
    fn new_record_has_zero_count() {
        assert_eq!(sample().verification_count, 0);
    }

    #[test]
    fn matches_by_digest_only() {
        let r = sample();
        assert!(r.matches_digest(&sha256_digest(b"hello")));
        assert!(!r.matches_digest(&sha256_digest(b"hello\n")));
    }

    #[test]
    fn replace_content_keeps_count() {
        let mut r = sample();
        r.record_verification();
        r.record_verification();
        r.replace_content(
            sha256_digest(b"bye"),
            Author::new("0xabc"),
            Timestamp::from_epoch_secs(1_800_000_000).unwrap(),
        );
        assert_eq!(r.verification_count, 2);
        assert_eq!(r.digest, sha256_digest(b"bye"));
        assert_eq!(r.author.as_str(), "0xabc");
    }

    #[test]
    fn serializes_with_contract_field_names() {
        let v = serde_json::to_value(sample()).unwrap();
        assert_eq!(v["file_name"], "greeting.txt");
        assert_eq!(
            v["file_hash"],
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_eq!(v["uploader"], "demo-user");
        assert_eq!(v["timestamp"], 1_700_000_000);
        assert_eq!(v["verification_count"], 0);
    }

    #[test]
    fn decodes_ledger_view_shape() {
        let json = serde_json::json!({
            "file_name": "greeting.txt",
            "file_hash": "0x2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824",
            "uploader": "0xc6520b2c",
            "timestamp": "1700000000",
            "verification_count": "3"
        });
        let r: FileRecord = serde_json::from_value(json).unwrap();
        assert_eq!(r.digest, sha256_digest(b"hello"));
        assert_eq!(r.verification_count, 3);
        assert_eq!(r.stored_at.epoch_secs(), 1_700_000_000);
    }

    #[test]
    fn decodes_byte_array_digest() {
        let json = serde_json::json!({
            "file_name": "greeting.txt",
            "file_hash": sha256_digest(b"hello").to_vec(),
            "uploader": "demo-user",
            "timestamp": 1700000000,
            "verification_count": 0
        });
        let r: FileRecord = serde_json::from_value(json).unwrap();
        assert_eq!(r, sample());
    }

    #[test]
    fn rejects_corrupt_digest_length() {
        let json = serde_json::json!({
            "file_name": "x",
            "file_hash": [1, 2, 3],
            "uploader": "demo-user",
            "timestamp": 0,
            "verification_count": 0
        });
        assert!(serde_json::from_value::<FileRecord>(json).is_err());
    }
}
