//! Scripted engine for pipeline tests.

use flipbook_engine::{
    DocumentHandle, EngineError, EngineResources, OpenRequest, PageSize, RasterEngine,
    RenderRequest, RgbaImage,
};
use image::Rgba;
use std::cell::RefCell;
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum EngineEvent {
    Configure,
    Open,
    Render(u32),
    Close,
}

/// Pauses the engine at one await point until the test releases it.
#[derive(Debug, Clone, Default)]
pub(crate) struct Gate {
    pub started: Arc<Notify>,
    pub release: Arc<Notify>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GatePoint {
    Open,
    Render(u32),
}

#[derive(Debug)]
pub(crate) struct ScriptedEngine {
    page_count: u32,
    page_size: PageSize,
    available: bool,
    fail_configure: bool,
    fail_open: bool,
    fail_render: Option<u32>,
    gate: Option<(GatePoint, Gate)>,
    events: RefCell<Vec<EngineEvent>>,
}

impl ScriptedEngine {
    pub fn with_pages(page_count: u32) -> Self {
        Self {
            page_count,
            page_size: PageSize { width_pt: 10.0, height_pt: 20.0 },
            available: true,
            fail_configure: false,
            fail_open: false,
            fail_render: None,
            gate: None,
            events: RefCell::new(Vec::new()),
        }
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn failing_configure(mut self) -> Self {
        self.fail_configure = true;
        self
    }

    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub fn failing_render(mut self, page_index: u32) -> Self {
        self.fail_render = Some(page_index);
        self
    }

    pub fn gated(mut self, point: GatePoint, gate: Gate) -> Self {
        self.gate = Some((point, gate));
        self
    }

    pub fn events(&self) -> Vec<EngineEvent> {
        self.events.borrow().clone()
    }

    pub fn rendered_pages(&self) -> Vec<u32> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                EngineEvent::Render(page) => Some(*page),
                _ => None,
            })
            .collect()
    }

    async fn pass(&self, point: GatePoint) {
        if let Some((gated_at, gate)) = &self.gate {
            if *gated_at == point {
                gate.started.notify_one();
                gate.release.notified().await;
            }
        }
    }
}

impl RasterEngine for ScriptedEngine {
    fn is_available(&self) -> bool {
        self.available
    }

    fn configure(&mut self, _resources: &EngineResources) -> Result<(), EngineError> {
        self.events.get_mut().push(EngineEvent::Configure);
        if self.fail_configure {
            return Err(EngineError::Backend("no rasterizer library in /opt/pdfium".to_owned()));
        }
        Ok(())
    }

    async fn open(&mut self, _request: OpenRequest) -> Result<DocumentHandle, EngineError> {
        self.events.get_mut().push(EngineEvent::Open);
        self.pass(GatePoint::Open).await;

        if self.fail_open {
            return Err(EngineError::Fetch("connection refused".to_owned()));
        }

        Ok(DocumentHandle::from_raw(1))
    }

    fn page_count(&self, _handle: DocumentHandle) -> Result<u32, EngineError> {
        Ok(self.page_count)
    }

    fn page_size(&self, _handle: DocumentHandle, page_index: u32) -> Result<PageSize, EngineError> {
        if page_index >= self.page_count {
            return Err(EngineError::PageOutOfRange { page: page_index, page_count: self.page_count });
        }
        Ok(self.page_size)
    }

    async fn render_page(
        &self,
        handle: DocumentHandle,
        request: RenderRequest,
    ) -> Result<RgbaImage, EngineError> {
        self.events.borrow_mut().push(EngineEvent::Render(request.page_index));
        self.pass(GatePoint::Render(request.page_index)).await;

        if self.fail_render == Some(request.page_index) {
            return Err(EngineError::Backend(format!("page {} is corrupt", request.page_index)));
        }

        let (width, height) = self.page_size(handle, request.page_index)?.scaled(request.scale);
        let shade = (request.page_index * 40 % 255) as u8;
        Ok(RgbaImage::from_pixel(width, height, Rgba([shade, shade, shade, 255])))
    }

    fn close(&mut self, _handle: DocumentHandle) -> Result<(), EngineError> {
        self.events.get_mut().push(EngineEvent::Close);
        Ok(())
    }
}
