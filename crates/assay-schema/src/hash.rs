//! SHA-256 digests in the catalog's `sha256:<hex>` wire form.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Wire prefix of every catalog checksum.
pub const SHA256_PREFIX: &str = "sha256:";

/// Reasons a string is not a usable SHA-256 digest.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DigestError {
    /// The hex portion is not exactly 64 characters long.
    #[error("Invalid SHA256 digest: expected 64 hex characters, got {0}")]
    Length(usize),

    /// The hex portion contains a non-hex character.
    #[error("Invalid SHA256 digest: contains non-hex characters")]
    NonHex,

    /// The digest names a different algorithm (e.g. `sha512:`).
    #[error("Unsupported digest algorithm: {0}")]
    Algorithm(String),
}

/// A validated SHA256 digest (64 lowercase hex characters)
///
/// Serialized as `sha256:<hex>`, the form downstream installers consume.
/// Deserialization validates, so an invalid digest can never enter a
/// catalog.
///
/// ```
/// use assay_schema::Sha256Digest;
///
/// let hex = "A".repeat(64);
/// let digest = Sha256Digest::new(format!("sha256:{hex}")).unwrap();
/// assert_eq!(digest.as_str(), "a".repeat(64));
/// assert_eq!(digest.to_string(), format!("sha256:{}", "a".repeat(64)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sha256Digest(String);

impl Sha256Digest {
    /// Create a new `Sha256Digest`, validating the input.
    ///
    /// Accepts strings with or without a `sha256:` prefix and normalizes the
    /// hex to lowercase.
    ///
    /// # Errors
    ///
    /// Returns an error if the string names another algorithm or the hex
    /// portion is not exactly 64 ASCII hex characters.
    pub fn new(s: impl AsRef<str>) -> Result<Self, DigestError> {
        let s = s.as_ref().trim();
        let hex = match s.split_once(':') {
            Some((algo, hex)) if algo.eq_ignore_ascii_case("sha256") => hex,
            Some((algo, _)) => return Err(DigestError::Algorithm(algo.to_string())),
            None => s,
        };

        if hex.len() != 64 {
            return Err(DigestError::Length(hex.len()));
        }

        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DigestError::NonHex);
        }

        Ok(Self(hex.to_ascii_lowercase()))
    }

    /// The bare 64-character hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<[u8; 32]> for Sha256Digest {
    fn from(bytes: [u8; 32]) -> Self {
        Self(hex::encode(bytes))
    }
}

impl std::fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{SHA256_PREFIX}{}", self.0)
    }
}

impl std::str::FromStr for Sha256Digest {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for Sha256Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for Sha256Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Sha256Digest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}
