//! Rasterization through PDFium.

use crate::{
    DocumentHandle, EngineError, EngineResources, OpenRequest, PageSize, RasterEngine,
    RenderRequest, RgbaImage,
};
use pdfium_render::prelude::*;
use std::collections::HashMap;
use std::path::Path;

struct LoadedDocument {
    bytes: Vec<u8>,
    page_sizes: Vec<PageSize>,
}

pub struct PdfiumEngine {
    pdfium: Option<Pdfium>,
    next_handle: u64,
    docs: HashMap<DocumentHandle, LoadedDocument>,
}

impl PdfiumEngine {
    /// Binds PDFium from the executable's directory, the working directory or
    /// the system library path, in that order.
    ///
    /// An engine that found no library reports itself unavailable instead of
    /// failing here.
    pub fn new() -> Self {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|path| path.parent().map(Path::to_path_buf));

        let bindings = exe_dir
            .as_deref()
            .and_then(|dir| bind_at(dir).ok())
            .or_else(|| bind_at(Path::new("./")).ok())
            .or_else(|| Pdfium::bind_to_system_library().ok());

        if bindings.is_none() {
            tracing::warn!("no PDFium library found; rasterization is unavailable");
        }

        Self { pdfium: bindings.map(Pdfium::new), next_handle: 0, docs: HashMap::new() }
    }

    fn pdfium(&self) -> Result<&Pdfium, EngineError> {
        self.pdfium
            .as_ref()
            .ok_or_else(|| EngineError::Backend("PDFium library is not bound".to_owned()))
    }

    fn loaded(&self, handle: DocumentHandle) -> Result<&LoadedDocument, EngineError> {
        self.docs.get(&handle).ok_or(EngineError::InvalidHandle(handle.raw()))
    }
}

impl Default for PdfiumEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn bind_at(dir: &Path) -> Result<Box<dyn PdfiumLibraryBindings>, PdfiumError> {
    Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
}

fn backend(err: PdfiumError) -> EngineError {
    EngineError::Backend(err.to_string())
}

impl RasterEngine for PdfiumEngine {
    fn is_available(&self) -> bool {
        self.pdfium.is_some()
    }

    fn configure(&mut self, resources: &EngineResources) -> Result<(), EngineError> {
        if let Some(dir) = resources.library_dir.as_deref() {
            let bindings = bind_at(dir).map_err(|err| {
                EngineError::Backend(format!(
                    "failed to bind PDFium in {}: {err}",
                    dir.display()
                ))
            })?;
            self.pdfium = Some(Pdfium::new(bindings));
        }

        // PDFium ships its own CJK tables; a cmap directory only matters to
        // engines that load them from disk.
        if let Some(cmap_dir) = resources.cmap_dir.as_deref() {
            tracing::debug!(cmap_dir = %cmap_dir.display(), "ignoring cmap directory for PDFium");
        }

        Ok(())
    }

    async fn open(&mut self, request: OpenRequest) -> Result<DocumentHandle, EngineError> {
        let bytes = request.source.fetch().await?;

        let page_sizes = {
            let document =
                self.pdfium()?.load_pdf_from_byte_slice(&bytes, None).map_err(backend)?;
            document
                .pages()
                .iter()
                .map(|page| PageSize { width_pt: page.width().value, height_pt: page.height().value })
                .collect::<Vec<_>>()
        };

        self.next_handle += 1;
        let handle = DocumentHandle(self.next_handle);
        self.docs.insert(handle, LoadedDocument { bytes, page_sizes });

        Ok(handle)
    }

    fn page_count(&self, handle: DocumentHandle) -> Result<u32, EngineError> {
        Ok(self.loaded(handle)?.page_sizes.len() as u32)
    }

    fn page_size(&self, handle: DocumentHandle, page_index: u32) -> Result<PageSize, EngineError> {
        let loaded = self.loaded(handle)?;
        loaded.page_sizes.get(page_index as usize).copied().ok_or(EngineError::PageOutOfRange {
            page: page_index,
            page_count: loaded.page_sizes.len() as u32,
        })
    }

    async fn render_page(
        &self,
        handle: DocumentHandle,
        request: RenderRequest,
    ) -> Result<RgbaImage, EngineError> {
        let loaded = self.loaded(handle)?;
        let (width, height) = self.page_size(handle, request.page_index)?.scaled(request.scale);

        let document =
            self.pdfium()?.load_pdf_from_byte_slice(&loaded.bytes, None).map_err(backend)?;
        let page = document.pages().get(request.page_index as u16).map_err(backend)?;

        let config = PdfRenderConfig::new()
            .set_target_width(width as i32)
            .set_target_height(height as i32)
            .render_form_data(true)
            .render_annotations(true);

        let bitmap = page.render_with_config(&config).map_err(backend)?;

        Ok(bitmap.as_image().into_rgba8())
    }

    fn close(&mut self, handle: DocumentHandle) -> Result<(), EngineError> {
        self.docs.remove(&handle).map(|_| ()).ok_or(EngineError::InvalidHandle(handle.raw()))
    }
}
