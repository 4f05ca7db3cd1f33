//! Viewer configuration.
//!
//! Replaces the hard-coded document path, download name and render scale of a
//! single-brochure viewer with values that can come from defaults, a TOML
//! file, environment variables or the host, in that order of precedence
//! (later wins).

use crate::flip::BookLayout;
use flipbook_engine::{DocumentSource, EngineResources};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_RENDER_SCALE: f32 = 1.6;
pub const DEFAULT_THUMBNAIL_LIMIT: usize = 10;
pub const DEFAULT_TITLE: &str = "Brochure";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FlipbookConfig {
    /// Location of the PDF: a path, a `file://` URL or an `http(s)://` URL
    #[serde(alias = "documentUrl")]
    pub document_url: String,

    /// Filename suggested for downloads; defaults to the URL's last segment
    #[serde(alias = "downloadFilename")]
    pub download_filename: Option<String>,

    /// Pixels per PDF point used when rasterizing pages
    #[serde(alias = "renderScale")]
    pub render_scale: f32,

    pub title: String,

    /// How many page numbers the thumbnail strip lists before summarizing
    #[serde(alias = "thumbnailLimit")]
    pub thumbnail_limit: usize,

    /// Directory holding the native rasterizer library
    #[serde(alias = "libraryDir")]
    pub library_dir: Option<PathBuf>,

    /// Directory holding character-map data
    #[serde(alias = "cmapDir")]
    pub cmap_dir: Option<PathBuf>,

    pub layout: BookLayout,
}

impl Default for FlipbookConfig {
    fn default() -> Self {
        Self {
            document_url: String::new(),
            download_filename: None,
            render_scale: DEFAULT_RENDER_SCALE,
            title: DEFAULT_TITLE.to_owned(),
            thumbnail_limit: DEFAULT_THUMBNAIL_LIMIT,
            library_dir: None,
            cmap_dir: None,
            layout: BookLayout::default(),
        }
    }
}

impl FlipbookConfig {
    pub fn new(document_url: impl Into<String>) -> Self {
        Self { document_url: document_url.into(), ..Self::default() }
    }

    pub fn with_download_filename(mut self, filename: impl Into<String>) -> Self {
        self.download_filename = Some(filename.into());
        self
    }

    pub fn with_render_scale(mut self, scale: f32) -> Self {
        self.render_scale = scale;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_thumbnail_limit(mut self, limit: usize) -> Self {
        self.thumbnail_limit = limit;
        self
    }

    pub fn with_cmap_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.cmap_dir = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_layout(mut self, layout: BookLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_library_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.library_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Loads configuration from a TOML file.
    ///
    /// ```toml
    /// document_url = "/static/brochure.pdf"
    /// download_filename = "Brochure.pdf"
    /// render_scale = 1.6
    /// title = "Company Brochure"
    /// ```
    ///
    /// Missing keys keep their defaults; unknown keys are ignored.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Applies environment overrides.
    ///
    /// - `FLIPBOOK_DOCUMENT_URL`
    /// - `FLIPBOOK_DOWNLOAD_FILENAME`
    /// - `FLIPBOOK_RENDER_SCALE`
    /// - `FLIPBOOK_TITLE`
    /// - `FLIPBOOK_LIBRARY_DIR`
    pub fn apply_env(mut self) -> Result<Self, ConfigError> {
        if let Ok(val) = std::env::var("FLIPBOOK_DOCUMENT_URL") {
            self.document_url = val;
        }

        if let Ok(val) = std::env::var("FLIPBOOK_DOWNLOAD_FILENAME") {
            self.download_filename = Some(val);
        }

        if let Ok(val) = std::env::var("FLIPBOOK_RENDER_SCALE") {
            self.render_scale = val.trim().parse::<f32>().map_err(|_| ConfigError::InvalidValue {
                key: "FLIPBOOK_RENDER_SCALE",
                reason: format!("not a number: {val}"),
            })?;
        }

        if let Ok(val) = std::env::var("FLIPBOOK_TITLE") {
            self.title = val;
        }

        if let Some(dir) = std::env::var_os("FLIPBOOK_LIBRARY_DIR") {
            self.library_dir = Some(PathBuf::from(dir));
        }

        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.document_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "document_url",
                reason: "must not be empty".to_owned(),
            });
        }

        if !self.render_scale.is_finite() || self.render_scale <= 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "render_scale",
                reason: format!("must be a positive number, got {}", self.render_scale),
            });
        }

        if matches!(self.download_filename.as_deref(), Some(name) if name.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                key: "download_filename",
                reason: "must not be empty".to_owned(),
            });
        }

        if self.thumbnail_limit == 0 {
            return Err(ConfigError::InvalidValue {
                key: "thumbnail_limit",
                reason: "must be at least 1".to_owned(),
            });
        }

        Ok(())
    }

    pub fn source(&self) -> DocumentSource {
        DocumentSource::parse(&self.document_url)
    }

    /// The configured download filename, or the document's own file name.
    pub fn download_filename(&self) -> String {
        self.download_filename
            .clone()
            .or_else(|| self.source().file_name())
            .unwrap_or_else(|| "document.pdf".to_owned())
    }

    pub fn resources(&self) -> EngineResources {
        EngineResources { library_dir: self.library_dir.clone(), cmap_dir: self.cmap_dir.clone() }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}
