//! # File Digest — Content Fingerprints
//!
//! Defines `FileDigest`, the 32-byte SHA-256 fingerprint that identifies a
//! file by content, and the functions that compute it.
//!
//! ## Encoding
//!
//! `to_hex()` renders lowercase hex, two characters per byte, with no
//! separator and no prefix. `to_prefixed_hex()` adds the `0x` scheme marker
//! used by ledger explorers and display layers.
//!
//! Decoding is deliberately lenient about presentation and strict about
//! content: `from_hex()` accepts an optional `0x`/`0X` prefix and either
//! letter case, but the decoded value must be exactly 32 bytes. Because
//! every comparison is made on decoded bytes, two renderings of the same
//! digest always compare equal.
//!
//! ## Serialization
//!
//! Serializes as an unprefixed lowercase hex string. Deserializes from either
//! a hex string (as returned by ledger view functions) or an array of byte
//! values (as written by the original browser storage).

use std::io::Read;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::CoreError;

/// Length of a SHA-256 digest in bytes.
pub const DIGEST_LEN: usize = 32;

/// Read buffer size for streaming digests.
pub const READ_CHUNK: usize = 64 * 1024;

/// A SHA-256 content digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileDigest([u8; DIGEST_LEN]);

impl FileDigest {
    /// Wrap raw digest bytes.
    pub fn new(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    /// Decode a digest from a byte slice.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DigestLength`] if the slice is not 32 bytes. A
    /// stored value of any other length is corrupt.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CoreError> {
        let arr: [u8; DIGEST_LEN] = bytes.try_into().map_err(|_| CoreError::DigestLength {
            expected: DIGEST_LEN,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }

    /// Decode a digest from hex, ignoring a leading `0x` and letter case.
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        let hex = strip_scheme(s.trim());
        if hex.len() % 2 != 0 {
            return Err(CoreError::DigestHex(format!(
                "odd number of hex characters ({})",
                hex.len()
            )));
        }
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(CoreError::DigestHex(format!(
                "non-hex character in {s:?}"
            )));
        }
        let bytes = (0..hex.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&hex[i..i + 2], 16))
            .collect::<Result<Vec<u8>, _>>()
            .map_err(|e| CoreError::DigestHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// The digest as an owned byte vector, the shape ledger entry functions
    /// take for `vector<u8>` arguments.
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    /// Render the digest as lowercase hex without a prefix.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Render the digest as lowercase hex with a `0x` prefix.
    pub fn to_prefixed_hex(&self) -> String {
        format!("0x{}", self.to_hex())
    }

    /// First `n` hex characters, for compact listings.
    pub fn short_hex(&self, n: usize) -> String {
        let hex = self.to_hex();
        hex[..n.min(hex.len())].to_string()
    }
}

impl std::fmt::Display for FileDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::str::FromStr for FileDigest {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for FileDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Representations a stored digest may arrive in.
#[derive(Deserialize)]
#[serde(untagged)]
enum DigestRepr {
    Hex(String),
    Bytes(Vec<u8>),
}

impl<'de> Deserialize<'de> for FileDigest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match DigestRepr::deserialize(deserializer)? {
            DigestRepr::Hex(s) => Self::from_hex(&s),
            DigestRepr::Bytes(b) => Self::from_slice(&b),
        }
        .map_err(serde::de::Error::custom)
    }
}

fn strip_scheme(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// Compute the SHA-256 digest of a byte sequence.
///
/// Pure function of content: the same bytes always produce the same digest,
/// regardless of file name, time, or environment. Empty input is valid.
pub fn sha256_digest(data: &[u8]) -> FileDigest {
    let hash = Sha256::digest(data);
    let mut bytes = [0u8; DIGEST_LEN];
    bytes.copy_from_slice(&hash);
    FileDigest(bytes)
}

/// Convenience wrapper around [`sha256_digest()`] returning unprefixed hex.
pub fn sha256_hex(data: &[u8]) -> String {
    sha256_digest(data).to_hex()
}

/// Incremental SHA-256 over content delivered in pieces.
#[derive(Clone, Default)]
pub struct DigestBuilder {
    hasher: Sha256,
}

impl DigestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, chunk: &[u8]) {
        self.hasher.update(chunk);
    }

    pub fn finish(self) -> FileDigest {
        let mut bytes = [0u8; DIGEST_LEN];
        bytes.copy_from_slice(&self.hasher.finalize());
        FileDigest(bytes)
    }
}

impl std::fmt::Debug for DigestBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DigestBuilder")
    }
}

/// Compute the SHA-256 digest of everything readable from `reader`.
///
/// Produces the same value as [`sha256_digest()`] over the full content.
pub fn sha256_reader<R: Read>(mut reader: R) -> Result<FileDigest, CoreError> {
    let mut builder = DigestBuilder::new();
    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        builder.update(&buf[..n]);
    }
    Ok(builder.finish())
}
