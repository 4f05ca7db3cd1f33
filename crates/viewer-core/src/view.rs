//! Presentation: what the viewer shows for a given state.
//!
//! A [`View`] is a pure projection of [`ViewerState`]; hosts serialize it or
//! print it, they never compute it themselves.

use crate::config::FlipbookConfig;
use crate::flip::BookLayout;
use crate::viewer::{FlipController, Viewer, ViewerState};
use serde::Serialize;
use std::fmt;

pub const DOWNLOAD_LABEL: &str = "Download";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum View {
    Loading(LoadingView),
    Ready(ReadyView),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadingView {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadyView {
    pub header: Header,
    pub navigation: Navigation,
    pub book: Book,
    pub thumbnails: ThumbnailStrip,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Header {
    pub title: String,
    pub download_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Navigation {
    pub previous_enabled: bool,
    pub next_enabled: bool,
    /// "Page {n} of {total}"
    pub counter: String,
    pub input: PageInput,
}

/// The numeric jump-to-page field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInput {
    pub min: usize,
    pub max: usize,
    pub value: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Book {
    pub layout: BookLayout,
    pub pages: Vec<BookPage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookPage {
    pub page_number: u32,
    pub alt: String,
    pub src: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThumbnailStrip {
    pub entries: Vec<Thumbnail>,
    /// "... and {n} more" when the document has more pages than entries
    pub overflow: Option<String>,
}

/// A clickable page number; clicking it jumps to `page_number`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Thumbnail {
    pub page_number: usize,
    pub active: bool,
}

impl View {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading(_))
    }

    pub fn as_ready(&self) -> Option<&ReadyView> {
        match self {
            Self::Ready(ready) => Some(ready),
            Self::Loading(_) => None,
        }
    }
}

pub fn render_view(config: &FlipbookConfig, state: &ViewerState) -> View {
    if state.is_loading() {
        return View::Loading(LoadingView { message: format!("Loading {}...", config.title) });
    }

    let current = state.current_page();
    let total = state.total_pages();

    let navigation = Navigation {
        previous_enabled: current > 0,
        next_enabled: current + 1 < total,
        counter: format!("Page {} of {}", current + 1, total),
        input: PageInput { min: 1, max: total, value: current + 1 },
    };

    let pages = state
        .pages()
        .iter()
        .map(|page| BookPage {
            page_number: page.page_number,
            alt: format!("Page {}", page.page_number),
            src: page.data_uri.clone(),
        })
        .collect();

    View::Ready(ReadyView {
        header: Header { title: config.title.clone(), download_label: DOWNLOAD_LABEL.to_owned() },
        navigation,
        book: Book { layout: config.layout, pages },
        thumbnails: thumbnail_strip(current, total, config.thumbnail_limit),
    })
}

pub fn thumbnail_strip(current_page: usize, total_pages: usize, limit: usize) -> ThumbnailStrip {
    let shown = total_pages.min(limit);

    let entries = (1..=shown)
        .map(|page_number| Thumbnail { page_number, active: current_page + 1 == page_number })
        .collect();

    let overflow = (total_pages > shown).then(|| format!("... and {} more", total_pages - shown));

    ThumbnailStrip { entries, overflow }
}

impl<C: FlipController> Viewer<C> {
    pub fn view(&self) -> View {
        render_view(self.config(), self.state())
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loading(loading) => writeln!(f, "{}", loading.message),
            Self::Ready(ready) => fmt::Display::fmt(ready, f),
        }
    }
}

impl fmt::Display for ReadyView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}  [{}]", self.header.title, self.header.download_label)?;

        let nav = &self.navigation;
        writeln!(
            f,
            "{}  {}  [{}]  {}",
            button("Previous", nav.previous_enabled),
            nav.counter,
            nav.input.value,
            button("Next", nav.next_enabled),
        )?;

        let layout = &self.book.layout;
        writeln!(f, "book: {} pages at {}x{}", self.book.pages.len(), layout.width, layout.height)?;

        let thumbnails: Vec<String> = self
            .thumbnails
            .entries
            .iter()
            .map(|thumb| {
                if thumb.active {
                    format!("*{}*", thumb.page_number)
                } else {
                    thumb.page_number.to_string()
                }
            })
            .collect();
        write!(f, "thumbnails: {}", thumbnails.join(" "))?;
        if let Some(overflow) = &self.thumbnails.overflow {
            write!(f, " {overflow}")?;
        }
        writeln!(f)
    }
}

fn button(label: &str, enabled: bool) -> String {
    if enabled {
        format!("[{label}]")
    } else {
        format!("({label})")
    }
}
