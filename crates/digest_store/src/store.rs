use std::{
    io,
    path::{Component, Path, PathBuf},
};

use crate::DocumentName;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Access denied: {0} resolves outside the document directory")]
    Forbidden(String),
    #[error("Document not found: {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// An opened document ready to be streamed back to a client
#[derive(Debug)]
pub struct StoredDocument {
    pub file_name: String,
    pub len: u64,
    pub file: tokio::fs::File,
}

/// Rendered documents kept in one directory on the local filesystem.
///
/// Documents outlive the request that produced them; nothing here removes
/// them.
#[derive(Debug, Clone)]
pub struct FsDocumentStore {
    root: PathBuf,
}

impl FsDocumentStore {
    /// Creates the output directory if needed and pins its canonical location
    pub async fn init(root: impl AsRef<Path>) -> io::Result<Self> {
        let root = root.as_ref();

        tokio::fs::create_dir_all(root)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, path = ?root, "Failed to create document directory"))?;

        let root = tokio::fs::canonicalize(root).await?;
        tracing::debug!(path = ?root, "Document store ready");

        Ok(FsDocumentStore { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location a document called `name` is written to
    pub fn document_path(&self, name: &DocumentName) -> PathBuf {
        self.root.join(name.file_name())
    }

    /// Resolves a client supplied file name to a document inside the root.
    ///
    /// Names with more than one component, parent or root components, or
    /// that resolve (through symlinks) outside the root are rejected as
    /// [`FetchError::Forbidden`] before anything is read.
    #[tracing::instrument(skip(self))]
    pub async fn resolve(&self, file_name: &str) -> Result<PathBuf, FetchError> {
        let requested = Path::new(file_name);
        let mut components = requested.components();

        let is_single_normal = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !is_single_normal {
            tracing::warn!(file_name, "Rejected document request with unsafe path");
            return Err(FetchError::Forbidden(file_name.to_string()));
        }

        let resolved = match tokio::fs::canonicalize(self.root.join(requested)).await {
            Ok(path) => path,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(FetchError::NotFound(file_name.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        if !resolved.starts_with(&self.root) {
            tracing::warn!(file_name, path = ?resolved, "Rejected document request escaping the root");
            return Err(FetchError::Forbidden(file_name.to_string()));
        }

        if !tokio::fs::metadata(&resolved).await?.is_file() {
            return Err(FetchError::NotFound(file_name.to_string()));
        }

        Ok(resolved)
    }

    /// Resolves and opens a document for reading
    pub async fn open(&self, file_name: &str) -> Result<StoredDocument, FetchError> {
        let path = self.resolve(file_name).await?;

        let file = tokio::fs::File::open(&path)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, path = ?path, "Failed to open document"))?;
        let len = file.metadata().await?.len();

        Ok(StoredDocument {
            file_name: file_name.to_string(),
            len,
            file,
        })
    }
}
