//! Static asset lookup across an ordered list of root directories.

use std::path::{Component, Path, PathBuf};

use tracing::debug;

/// Document served for `/`.
pub const ENTRY_DOCUMENT: &str = "index.html";

/// A resolved file and its content type.
#[derive(Debug)]
pub struct Asset {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

#[derive(thiserror::Error, Debug)]
pub enum AssetError {
    /// No root holds a regular file at this path.
    #[error("File not found: {0}")]
    NotFound(String),

    /// The file exists but could not be read.
    #[error("Failed to read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Converts a request path into a relative path, refusing anything that
/// could escape a root.
fn relative_path(path: &str) -> Option<PathBuf> {
    if path.contains('\\') || path.contains('\0') {
        return None;
    }

    let mut rel = PathBuf::new();
    for component in Path::new(path.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => rel.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    match rel.as_os_str().is_empty() {
        true => None,
        false => Some(rel),
    }
}

/// Serves files from a primary root, then from fallback roots in order.
///
/// Directories never resolve, so there is no listing and no implicit index
/// below the root document.
#[derive(Debug, Clone)]
pub struct AssetStore {
    roots: Vec<PathBuf>,
}

impl AssetStore {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Resolves the entry document.
    pub async fn entry(&self) -> Result<Asset, AssetError> {
        self.resolve(ENTRY_DOCUMENT).await
    }

    /// Resolves a request path to the first regular file found under the roots.
    pub async fn resolve(&self, path: &str) -> Result<Asset, AssetError> {
        let rel = relative_path(path).ok_or_else(|| AssetError::NotFound(path.to_string()))?;

        for root in &self.roots {
            let candidate = root.join(&rel);
            let is_file = tokio::fs::metadata(&candidate)
                .await
                .map(|meta| meta.is_file())
                .unwrap_or(false);
            if !is_file {
                continue;
            }

            let bytes = tokio::fs::read(&candidate).await.map_err(|source| AssetError::Read {
                path: candidate.display().to_string(),
                source,
            })?;
            let content_type = mime_guess::from_path(&candidate).first_or_octet_stream().to_string();

            debug!("Serving {} ({})", candidate.display(), content_type);
            return Ok(Asset { bytes, content_type });
        }

        Err(AssetError::NotFound(path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn store_with_files() -> (tempfile::TempDir, AssetStore) {
        let dir = tempfile::tempdir().unwrap();
        let primary = dir.path().join("app");
        fs::create_dir_all(primary.join("css")).unwrap();
        fs::write(primary.join("index.html"), "<h1>primary</h1>").unwrap();
        fs::write(primary.join("css/site.css"), "body {}").unwrap();
        fs::write(dir.path().join("shared.js"), "console.log(1)").unwrap();
        fs::write(dir.path().join("index.html"), "<h1>fallback</h1>").unwrap();

        let store = AssetStore::new(vec![primary, dir.path().to_path_buf()]);
        (dir, store)
    }

    #[test]
    fn relative_path_rejects_escapes() {
        assert_eq!(relative_path("css/site.css"), Some(PathBuf::from("css/site.css")));
        assert_eq!(relative_path("/./index.html"), Some(PathBuf::from("index.html")));
        assert_eq!(relative_path("../secret"), None);
        assert_eq!(relative_path("css/../../secret"), None);
        assert_eq!(relative_path("..\\secret"), None);
        assert_eq!(relative_path(""), None);
    }

    #[tokio::test]
    async fn primary_root_wins() {
        let (_dir, store) = store_with_files();
        let asset = store.entry().await.unwrap();
        assert_eq!(asset.bytes, b"<h1>primary</h1>");
        assert_eq!(asset.content_type, "text/html");
    }

    #[tokio::test]
    async fn falls_back_to_secondary_root() {
        let (_dir, store) = store_with_files();
        let asset = store.resolve("shared.js").await.unwrap();
        assert_eq!(asset.bytes, b"console.log(1)");
        assert!(asset.content_type.contains("javascript"));
    }

    #[tokio::test]
    async fn directories_and_missing_files_are_not_found() {
        let (_dir, store) = store_with_files();
        assert!(matches!(store.resolve("css").await, Err(AssetError::NotFound(_))));
        assert!(matches!(store.resolve("app").await, Err(AssetError::NotFound(_))));
        assert!(matches!(store.resolve("missing.png").await, Err(AssetError::NotFound(_))));
        assert!(matches!(store.resolve("../etc/passwd").await, Err(AssetError::NotFound(_))));
    }
}
