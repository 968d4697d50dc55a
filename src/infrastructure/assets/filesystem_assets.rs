use std::path::PathBuf;

use tracing::debug;

use crate::application::ports::{AssetError, AssetSource};

/// Normalize an asset reference to a `/`-separated relative path.
///
/// `.` segments are dropped; absolute paths and `..` segments are refused.
pub fn normalize_asset_path(reference: &str) -> Result<String, AssetError> {
    let s = reference.trim().replace('\\', "/");
    if s.starts_with('/') {
        return Err(AssetError::Rejected(reference.to_string()));
    }

    let mut parts = Vec::new();
    for part in s.split('/') {
        match part {
            "" | "." => continue,
            ".." => return Err(AssetError::Rejected(reference.to_string())),
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        return Err(AssetError::Rejected(reference.to_string()));
    }
    Ok(parts.join("/"))
}

/// Logos, border frames and fonts below one asset root
pub struct FilesystemAssets {
    root: PathBuf,
}

impl FilesystemAssets {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

impl AssetSource for FilesystemAssets {
    fn load(&self, reference: &str) -> Result<Vec<u8>, AssetError> {
        let relative = normalize_asset_path(reference)?;
        let path = self.root.join(&relative);
        debug!(asset = %relative, "loading asset");

        std::fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AssetError::NotFound(reference.to_string())
            } else {
                AssetError::Io {
                    reference: reference.to_string(),
                    source: e,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_asset_path("./logos//a.svg").unwrap(), "logos/a.svg");
        assert_eq!(normalize_asset_path("logos\\b.png").unwrap(), "logos/b.png");
        assert!(normalize_asset_path("../secret").is_err());
        assert!(normalize_asset_path("logos/../../x").is_err());
        assert!(normalize_asset_path("/etc/passwd").is_err());
        assert!(normalize_asset_path(" ./ ").is_err());
    }

    #[test]
    fn test_load_relative_to_root() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("logos")).unwrap();
        std::fs::write(dir.path().join("logos/a.svg"), b"<svg/>").unwrap();

        let assets = FilesystemAssets::new(dir.path().to_path_buf());

        assert_eq!(assets.load("logos/a.svg").unwrap(), b"<svg/>");
        assert!(matches!(assets.load("logos/b.svg"), Err(AssetError::NotFound(_))));
        assert!(matches!(assets.load("../a.svg"), Err(AssetError::Rejected(_))));
    }
}
