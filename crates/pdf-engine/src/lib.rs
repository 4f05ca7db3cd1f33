use image::{ImageBuffer, Rgba};
use std::path::PathBuf;

mod data_uri;
mod inspect;
mod pdfium_backend;
mod source;

#[cfg(test)]
mod fixtures;

pub use data_uri::{decode_data_uri, encode_png_data_uri, PNG_DATA_URI_PREFIX};
pub use inspect::{inspect_pdf, inspect_source, DocumentInfo};
pub use pdfium_backend::PdfiumEngine;
pub use source::DocumentSource;

pub type RgbaImage = ImageBuffer<Rgba<u8>, Vec<u8>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentHandle(u64);

impl DocumentHandle {
    /// For engines implemented outside this crate.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width_pt: f32,
    pub height_pt: f32,
}

impl PageSize {
    /// Pixel dimensions of this page rendered at `scale` pixels per point.
    pub fn scaled(self, scale: f32) -> (u32, u32) {
        let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
        let width = (self.width_pt * scale).round().max(1.0) as u32;
        let height = (self.height_pt * scale).round().max(1.0) as u32;
        (width, height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderRequest {
    pub page_index: u32,
    pub scale: f32,
}

impl Default for RenderRequest {
    fn default() -> Self {
        Self { page_index: 0, scale: 1.0 }
    }
}

/// Resource locations an engine resolves lazily on first use.
///
/// These must be handed to [`RasterEngine::configure`] before the first
/// [`RasterEngine::open`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineResources {
    /// Directory holding the native rasterizer library, if not on the system path.
    pub library_dir: Option<PathBuf>,
    /// Directory holding character-map data for CJK font rendering.
    pub cmap_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenRequest {
    pub source: DocumentSource,
    pub cmap_dir: Option<PathBuf>,
}

impl OpenRequest {
    pub fn new(source: impl Into<DocumentSource>) -> Self {
        Self { source: source.into(), cmap_dir: None }
    }

    pub fn with_cmap_dir(mut self, cmap_dir: Option<PathBuf>) -> Self {
        self.cmap_dir = cmap_dir;
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF parse error: {0}")]
    Parse(#[from] lopdf::Error),
    #[error("failed to fetch document: {0}")]
    Fetch(String),
    #[error("unsupported document source: {0}")]
    UnsupportedSource(String),
    #[error("invalid handle {0}")]
    InvalidHandle(u64),
    #[error("page {page} out of range (page_count={page_count})")]
    PageOutOfRange { page: u32, page_count: u32 },
    #[error("encrypted PDFs are not supported")]
    EncryptedUnsupported,
    #[error("image encoding error: {0}")]
    Encode(String),
    #[error("backend error: {0}")]
    Backend(String),
}

/// A PDF rasterizer.
///
/// Opening and rendering are asynchronous so a host event loop can interleave
/// other work (and observe cancellation) between pages.
#[allow(async_fn_in_trait)]
pub trait RasterEngine {
    /// Whether this execution context can rasterize at all.
    ///
    /// Only meaningful after [`RasterEngine::configure`], which may bind the
    /// rasterizer from a configured location.
    fn is_available(&self) -> bool {
        true
    }

    fn configure(&mut self, resources: &EngineResources) -> Result<(), EngineError>;

    async fn open(&mut self, request: OpenRequest) -> Result<DocumentHandle, EngineError>;

    fn page_count(&self, handle: DocumentHandle) -> Result<u32, EngineError>;

    fn page_size(&self, handle: DocumentHandle, page_index: u32) -> Result<PageSize, EngineError>;

    async fn render_page(
        &self,
        handle: DocumentHandle,
        request: RenderRequest,
    ) -> Result<RgbaImage, EngineError>;

    fn close(&mut self, handle: DocumentHandle) -> Result<(), EngineError>;
}

/// The rasterizer hosts should use: PDFium, bound from the usual locations.
pub fn default_engine() -> PdfiumEngine {
    PdfiumEngine::new()
}
