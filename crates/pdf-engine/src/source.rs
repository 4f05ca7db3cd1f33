//! Document locations and byte fetching.

use crate::EngineError;
use std::path::{Path, PathBuf};

/// Where a document's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    Path(PathBuf),
    Url(String),
    Bytes(Vec<u8>),
}

impl DocumentSource {
    /// Interprets a configured document location.
    ///
    /// `http://` and `https://` locations stay URLs; `file://` URLs become
    /// percent-decoded paths. Anything else is a path taken verbatim,
    /// surrounding whitespace included.
    pub fn parse(location: &str) -> Self {
        let trimmed = location.trim();

        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            return Self::Url(trimmed.to_owned());
        }

        if let Some(path) = trimmed.strip_prefix("file://") {
            return Self::Path(PathBuf::from(percent_decode(path)));
        }

        Self::Path(PathBuf::from(location))
    }

    /// Human readable location, used in log lines and error messages.
    pub fn describe(&self) -> String {
        match self {
            Self::Path(path) => path.display().to_string(),
            Self::Url(url) => url.clone(),
            Self::Bytes(bytes) => format!("<{} bytes in memory>", bytes.len()),
        }
    }

    /// Last segment of the location, if it has one. URL segments are
    /// percent-decoded.
    pub fn file_name(&self) -> Option<String> {
        match self {
            Self::Path(path) => path.file_name().and_then(|name| name.to_str()).map(str::to_owned),
            Self::Url(url) => {
                let without_query = url.split(['?', '#']).next().unwrap_or(url);
                without_query
                    .rsplit('/')
                    .next()
                    .filter(|segment| !segment.is_empty() && !segment.contains(':'))
                    .map(percent_decode)
            }
            Self::Bytes(_) => None,
        }
    }

    pub async fn fetch(&self) -> Result<Vec<u8>, EngineError> {
        match self {
            Self::Path(path) => Ok(tokio::fs::read(path).await?),
            Self::Bytes(bytes) => Ok(bytes.clone()),
            Self::Url(url) => fetch_remote(url).await,
        }
    }
}

/// Decodes `%XX` escapes, keeping the input as-is when it does not decode to
/// UTF-8.
fn percent_decode(text: &str) -> String {
    urlencoding::decode(text).map(|decoded| decoded.into_owned()).unwrap_or_else(|_| text.to_owned())
}

impl From<PathBuf> for DocumentSource {
    fn from(value: PathBuf) -> Self {
        Self::Path(value)
    }
}

impl From<&Path> for DocumentSource {
    fn from(value: &Path) -> Self {
        Self::Path(value.to_path_buf())
    }
}

impl From<Vec<u8>> for DocumentSource {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

#[cfg(feature = "remote")]
async fn fetch_remote(url: &str) -> Result<Vec<u8>, EngineError> {
    let response = reqwest::get(url)
        .await
        .and_then(|response| response.error_for_status())
        .map_err(|err| EngineError::Fetch(format!("{url}: {err}")))?;

    let bytes = response.bytes().await.map_err(|err| EngineError::Fetch(format!("{url}: {err}")))?;

    Ok(bytes.to_vec())
}

#[cfg(not(feature = "remote"))]
async fn fetch_remote(url: &str) -> Result<Vec<u8>, EngineError> {
    Err(EngineError::UnsupportedSource(url.to_owned()))
}
