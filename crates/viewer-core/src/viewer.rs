//! Viewer state and page navigation.

use crate::cancel::CancellationToken;
use crate::config::FlipbookConfig;
use crate::download::DownloadRequest;
use crate::loader::{load_book, LoadOutcome};
use flipbook_engine::RasterEngine;
use serde::Serialize;

/// One rasterized page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageImage {
    /// 1-based page number
    pub page_number: u32,
    pub width: u32,
    pub height: u32,
    /// `data:image/png;base64,...`
    pub data_uri: String,
}

/// Everything a mounted viewer knows.
///
/// Created on mount, written once by the loader and repeatedly by settle
/// notifications, dropped on unmount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerState {
    current_page: usize,
    total_pages: usize,
    loading: bool,
    pages: Vec<PageImage>,
}

impl Default for ViewerState {
    fn default() -> Self {
        Self { current_page: 0, total_pages: 0, loading: true, pages: Vec::new() }
    }
}

impl ViewerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 0-based index of the page the book has settled on
    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn pages(&self) -> &[PageImage] {
        &self.pages
    }

    pub fn is_first_page(&self) -> bool {
        self.current_page == 0
    }

    pub fn is_last_page(&self) -> bool {
        self.current_page + 1 >= self.total_pages
    }

    pub(crate) fn set_total_pages(&mut self, total: usize) {
        self.total_pages = total;
    }

    /// Publishes the complete page list and leaves the loading state.
    pub(crate) fn publish_pages(&mut self, pages: Vec<PageImage>) {
        self.total_pages = pages.len();
        self.pages = pages;
        self.loading = false;
    }

    /// Terminal state after a failed load: not loading, nothing to show.
    pub(crate) fn reset_after_failure(&mut self) {
        self.current_page = 0;
        self.total_pages = 0;
        self.pages.clear();
        self.loading = false;
    }

    pub(crate) fn settle_at(&mut self, index: usize) {
        self.current_page = index.min(self.total_pages.saturating_sub(1));
    }
}

/// The page-turn animation, seen from the viewer.
///
/// The controller owns the animation; the viewer only asks it to move and
/// learns where it ended up through [`FlipController::poll_settle`].
pub trait FlipController {
    /// Tells the book how many page surfaces it holds.
    fn set_pages(&mut self, count: usize);

    fn advance(&mut self);

    fn retreat(&mut self);

    fn jump_to(&mut self, index: usize);

    /// Next settled page index, if a flip completed since the last poll.
    fn poll_settle(&mut self) -> Option<usize>;
}

pub struct Viewer<C> {
    config: FlipbookConfig,
    state: ViewerState,
    controller: C,
}

impl<C: FlipController> Viewer<C> {
    pub fn new(config: FlipbookConfig, controller: C) -> Self {
        Self { config, state: ViewerState::new(), controller }
    }

    pub fn config(&self) -> &FlipbookConfig {
        &self.config
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn controller(&self) -> &C {
        &self.controller
    }

    /// Runs the load pipeline against this viewer's state.
    ///
    /// Cancelling `token` while this future is pending models unmounting:
    /// the state is left exactly as the last live step wrote it. Once the
    /// state has left loading, later calls do nothing.
    pub async fn mount<E: RasterEngine>(
        &mut self,
        engine: &mut E,
        token: &CancellationToken,
    ) -> LoadOutcome {
        if !self.state.is_loading() {
            tracing::debug!(document = %self.config.document_url, "viewer already loaded");
            return LoadOutcome::AlreadyLoaded;
        }

        let outcome = load_book(engine, &self.config, token, &mut self.state).await;

        if let LoadOutcome::Loaded { pages } = outcome {
            self.controller.set_pages(pages);
        }

        outcome
    }

    pub fn next(&mut self) {
        if self.state.is_last_page() {
            return;
        }
        self.controller.advance();
    }

    pub fn previous(&mut self) {
        if self.state.is_first_page() {
            return;
        }
        self.controller.retreat();
    }

    /// Flips to the 1-based page `page`, clamped into the document.
    pub fn jump(&mut self, page: i64) {
        let total = self.state.total_pages;
        if total == 0 {
            return;
        }

        let page = page.clamp(1, total as i64);
        self.controller.jump_to((page - 1) as usize);
    }

    /// Handles text typed into the page number field.
    ///
    /// Anything that does not parse as an integer is ignored.
    pub fn jump_input(&mut self, text: &str) {
        match text.trim().parse::<i64>() {
            Ok(page) => self.jump(page),
            Err(_) => tracing::debug!(input = text, "ignoring non-numeric page input"),
        }
    }

    /// Records the page the animation settled on.
    pub fn on_settle(&mut self, index: usize) {
        self.state.settle_at(index);
    }

    /// Drains pending settle notifications from the controller.
    pub fn sync(&mut self) {
        while let Some(index) = self.controller.poll_settle() {
            self.on_settle(index);
        }
    }

    pub fn download_request(&self) -> DownloadRequest {
        DownloadRequest::from_config(&self.config)
    }
}
