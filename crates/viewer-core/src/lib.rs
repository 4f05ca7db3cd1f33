//! Page-flip viewer for PDF documents.
//!
//! Mounting a [`Viewer`] runs the load pipeline once: the document is opened,
//! every page is rasterized into a PNG data URI, and the viewer switches from
//! its loading view to a ready view with navigation, a page-flip book and a
//! thumbnail strip.

pub mod cancel;
pub mod config;
pub mod download;
pub mod flip;
pub mod loader;
pub mod view;
pub mod viewer;

#[cfg(test)]
mod testing;

pub use cancel::{CancellationToken, DropGuard};
pub use config::{ConfigError, FlipbookConfig};
pub use download::{DirectoryDownloader, DownloadError, DownloadRequest, Downloader};
pub use flip::{BookLayout, PageFlip};
pub use loader::{load_book, LoadOutcome};
pub use view::{render_view, View};
pub use viewer::{FlipController, PageImage, Viewer, ViewerState};
