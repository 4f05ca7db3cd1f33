//! In-process page-flip book.

use crate::viewer::FlipController;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Book geometry and styling handed to the page-flip renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookLayout {
    pub width: u32,
    pub height: u32,
    pub min_width: u32,
    pub max_width: u32,
    pub min_height: u32,
    pub max_height: u32,
    pub max_shadow_opacity: f32,
    pub show_cover: bool,
    pub hard_pages: bool,
}

impl Default for BookLayout {
    fn default() -> Self {
        Self {
            width: 800,
            height: 1120,
            min_width: 315,
            max_width: 1200,
            min_height: 420,
            max_height: 1680,
            max_shadow_opacity: 0.5,
            show_cover: false,
            hard_pages: true,
        }
    }
}

impl BookLayout {
    /// Page size when stretched into a viewport, keeping the aspect ratio and
    /// staying within the min/max bounds.
    pub fn fit(&self, viewport_width: f32, viewport_height: f32) -> (u32, u32) {
        if viewport_width <= 0.0 || viewport_height <= 0.0 || self.width == 0 || self.height == 0 {
            return (self.width, self.height);
        }

        let width = self.width as f32;
        let height = self.height as f32;

        let lower = (self.min_width as f32 / width).max(self.min_height as f32 / height);
        let upper = (self.max_width as f32 / width).min(self.max_height as f32 / height);
        let scale = (viewport_width / width).min(viewport_height / height);
        let scale = if lower <= upper { scale.clamp(lower, upper) } else { upper };

        ((width * scale).round() as u32, (height * scale).round() as u32)
    }
}

/// A book that flips instantly and reports every completed flip.
#[derive(Debug, Default)]
pub struct PageFlip {
    page_count: usize,
    current: usize,
    settled: VecDeque<usize>,
}

impl PageFlip {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    fn flip(&mut self, target: usize) {
        if target == self.current {
            return;
        }
        self.current = target;
        self.settled.push_back(target);
    }
}

impl FlipController for PageFlip {
    fn set_pages(&mut self, count: usize) {
        self.page_count = count;
        self.current = self.current.min(count.saturating_sub(1));
    }

    fn advance(&mut self) {
        if self.current + 1 < self.page_count {
            self.flip(self.current + 1);
        }
    }

    fn retreat(&mut self) {
        if self.current > 0 {
            self.flip(self.current - 1);
        }
    }

    fn jump_to(&mut self, index: usize) {
        if self.page_count == 0 {
            return;
        }
        self.flip(index.min(self.page_count - 1));
    }

    fn poll_settle(&mut self) -> Option<usize> {
        self.settled.pop_front()
    }
}
