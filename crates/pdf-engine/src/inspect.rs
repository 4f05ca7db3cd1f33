//! Page geometry read from the document structure, without rasterizing.

use crate::{DocumentSource, EngineError, PageSize};
use lopdf::{Document, Object, ObjectId};

/// US Letter, for pages that declare no usable MediaBox anywhere in their
/// ancestry.
const FALLBACK_PAGE: PageSize = PageSize { width_pt: 612.0, height_pt: 792.0 };

/// Page trees deeper than this are treated as malformed.
const MAX_TREE_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentInfo {
    pub page_sizes: Vec<PageSize>,
}

impl DocumentInfo {
    pub fn page_count(&self) -> u32 {
        self.page_sizes.len() as u32
    }
}

pub async fn inspect_source(source: &DocumentSource) -> Result<DocumentInfo, EngineError> {
    let bytes = source.fetch().await?;
    inspect_pdf(&bytes)
}

/// Reads page count and per-page MediaBox sizes.
///
/// Documents that stay encrypted after loading are rejected.
pub fn inspect_pdf(bytes: &[u8]) -> Result<DocumentInfo, EngineError> {
    let doc = match Document::load_mem(bytes) {
        Ok(doc) => doc,
        Err(_) if declares_encryption(bytes) => return Err(EngineError::EncryptedUnsupported),
        Err(err) => return Err(err.into()),
    };

    if doc.trailer.get(b"Encrypt").is_ok() {
        return Err(EngineError::EncryptedUnsupported);
    }

    let page_sizes = doc.get_pages().into_values().map(|page_id| page_size(&doc, page_id)).collect();

    Ok(DocumentInfo { page_sizes })
}

fn declares_encryption(bytes: &[u8]) -> bool {
    const KEY: &[u8] = b"/Encrypt";
    bytes.windows(KEY.len()).any(|window| window == KEY)
}

/// MediaBox of the page, inherited from the nearest ancestor that has one.
fn page_size(doc: &Document, page_id: ObjectId) -> PageSize {
    let mut node = doc.get_dictionary(page_id).ok();

    for _ in 0..MAX_TREE_DEPTH {
        let Some(dict) = node else { break };

        if let Some(size) = dict.get(b"MediaBox").ok().and_then(|rect| rect_size(doc, rect)) {
            return size;
        }

        node = dict
            .get(b"Parent")
            .and_then(Object::as_reference)
            .and_then(|parent| doc.get_dictionary(parent))
            .ok();
    }

    FALLBACK_PAGE
}

fn rect_size(doc: &Document, rect: &Object) -> Option<PageSize> {
    let (_, rect) = doc.dereference(rect).ok()?;
    let coords = rect
        .as_array()
        .ok()?
        .iter()
        .map(|value| value.as_float().ok())
        .collect::<Option<Vec<f32>>>()?;

    let &[x0, y0, x1, y1] = coords.as_slice() else {
        return None;
    };

    Some(PageSize { width_pt: (x1 - x0).abs(), height_pt: (y1 - y0).abs() })
}
