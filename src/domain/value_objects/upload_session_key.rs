use serde::{Deserialize, Serialize};

use super::RequesterId;
use crate::domain::errors::DomainError;

const MAX_FILE_NAME_LEN: usize = 200;

/// Key of one chunked upload: who is uploading and which file
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UploadSessionKey {
    requester: RequesterId,
    file_name: String,
}

impl UploadSessionKey {
    /// Build a key, refusing names that could escape the upload directory
    pub fn new(requester: RequesterId, file_name: &str) -> Result<Self, DomainError> {
        let name = file_name.trim();
        if name.is_empty()
            || name.len() > MAX_FILE_NAME_LEN
            || name.contains(['/', '\\', '\0'])
            || name.starts_with('.')
        {
            return Err(DomainError::InvalidFileName(file_name.to_string()));
        }

        Ok(Self {
            requester,
            file_name: name.to_string(),
        })
    }

    pub fn requester(&self) -> RequesterId {
        self.requester
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Lower-cased extension, if the name has one
    pub fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }
}

impl std::fmt::Display for UploadSessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.requester, self.file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn requester() -> RequesterId {
        RequesterId::new(Uuid::new_v4())
    }

    #[test]
    fn test_key_extension_is_lowercased() {
        let key = UploadSessionKey::new(requester(), "Beach.JPG").unwrap();
        assert_eq!(key.extension().as_deref(), Some("jpg"));
    }

    #[test]
    fn test_key_rejects_traversal() {
        assert!(UploadSessionKey::new(requester(), "../etc/passwd").is_err());
        assert!(UploadSessionKey::new(requester(), "a/b.png").is_err());
        assert!(UploadSessionKey::new(requester(), ".hidden").is_err());
        assert!(UploadSessionKey::new(requester(), "   ").is_err());
    }

    #[test]
    fn test_same_name_different_requesters_differ() {
        let a = UploadSessionKey::new(requester(), "x.png").unwrap();
        let b = UploadSessionKey::new(requester(), "x.png").unwrap();
        assert_ne!(a, b);
    }
}
