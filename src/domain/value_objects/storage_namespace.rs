use serde::{Deserialize, Serialize};

/// Separate file namespaces for unmodified sources and composited output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageNamespace {
    /// Uploaded backgrounds, named by content digest
    Raw,
    /// Composited images, named by a fresh uuid
    Final,
}

impl StorageNamespace {
    pub fn dir_name(&self) -> &'static str {
        match self {
            StorageNamespace::Raw => "raw",
            StorageNamespace::Final => "final",
        }
    }
}

impl std::fmt::Display for StorageNamespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl std::str::FromStr for StorageNamespace {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "raw" => Ok(StorageNamespace::Raw),
            "final" => Ok(StorageNamespace::Final),
            _ => Err(format!("Invalid storage namespace: {}", s)),
        }
    }
}
