//! Download action.

use crate::config::FlipbookConfig;
use flipbook_engine::{DocumentSource, EngineError};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// A request to save the document under a suggested filename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadRequest {
    pub url: String,
    pub filename: String,
}

impl DownloadRequest {
    pub fn from_config(config: &FlipbookConfig) -> Self {
        Self { url: config.document_url.clone(), filename: config.download_filename() }
    }

    pub fn source(&self) -> DocumentSource {
        DocumentSource::parse(&self.url)
    }
}

/// Something that can carry out a [`DownloadRequest`].
///
/// Downloads are fire-and-forget: implementations report problems through
/// logging, never to the caller.
#[allow(async_fn_in_trait)]
pub trait Downloader {
    async fn download(&self, request: &DownloadRequest);
}

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid download filename: {0:?}")]
    InvalidFilename(String),
}

/// Saves downloads into a directory.
#[derive(Debug, Clone)]
pub struct DirectoryDownloader {
    target_dir: PathBuf,
}

impl DirectoryDownloader {
    pub fn new<P: AsRef<Path>>(target_dir: P) -> Self {
        Self { target_dir: target_dir.as_ref().to_path_buf() }
    }

    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    /// Copies the document into the target directory and returns the written path.
    ///
    /// Only the final component of the suggested filename is used.
    pub async fn save(&self, request: &DownloadRequest) -> Result<PathBuf, DownloadError> {
        let filename = Path::new(&request.filename)
            .file_name()
            .ok_or_else(|| DownloadError::InvalidFilename(request.filename.clone()))?;

        let bytes = request.source().fetch().await?;

        tokio::fs::create_dir_all(&self.target_dir).await?;
        let output = self.target_dir.join(filename);
        tokio::fs::write(&output, bytes).await?;

        Ok(output)
    }
}

impl Downloader for DirectoryDownloader {
    async fn download(&self, request: &DownloadRequest) {
        match self.save(request).await {
            Ok(path) => tracing::info!(path = %path.display(), "saved download"),
            Err(err) => tracing::warn!(error = %err, url = %request.url, "download failed"),
        }
    }
}
