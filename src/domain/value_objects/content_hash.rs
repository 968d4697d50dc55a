use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// SHA-256 content digest of a raw image (32 bytes = 64 hex chars)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentHash(String);

impl ContentHash {
    /// Create from validated hex string
    pub fn from_hex(hex: String) -> Result<Self, DomainError> {
        if hex.len() != 64 {
            return Err(DomainError::ContentHashMismatch {
                expected: "64 hex characters".to_string(),
                actual: format!("{} characters", hex.len()),
            });
        }

        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DomainError::ContentHashMismatch {
                expected: "hex characters only".to_string(),
                actual: hex,
            });
        }

        Ok(Self(hex.to_lowercase()))
    }

    pub fn as_hex(&self) -> &str {
        &self.0
    }

    /// File name of the raw image stored under this digest
    pub fn raw_file_name(&self, extension: &str) -> String {
        format!("{}.{}", self.0, extension.to_ascii_lowercase())
    }
}

impl TryFrom<String> for ContentHash {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(value)
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> Self {
        hash.0
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ContentHash {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s.to_string())
    }
}
