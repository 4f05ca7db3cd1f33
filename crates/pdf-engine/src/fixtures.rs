//! Generated PDF documents for tests.

use lopdf::{dictionary, Document, Object, Stream};

/// Fills the lower-left quarter of a 200x300pt page with black.
pub(crate) const FILLED_LOWER_LEFT: &[u8] = b"0 0 0 rg\n0 0 100 150 re\nf\n";

/// A document of `page_count` 200x300pt pages, each drawing `content`.
pub(crate) fn sample_pdf(page_count: usize, content: Option<&[u8]>) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let content_id = content.map(|ops| doc.add_object(Stream::new(dictionary! {}, ops.to_vec())));

    let kids: Vec<Object> = (0..page_count)
        .map(|_| {
            let mut page = dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => media_box(200, 300),
            };
            if let Some(content_id) = content_id {
                page.set("Contents", content_id);
            }
            doc.add_object(page).into()
        })
        .collect();

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(page_count as i64),
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    save(doc)
}

pub(crate) fn media_box(width: i64, height: i64) -> Vec<Object> {
    vec![Object::Integer(0), Object::Integer(0), Object::Integer(width), Object::Integer(height)]
}

pub(crate) fn save(mut doc: Document) -> Vec<u8> {
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("fixture should serialize");
    bytes
}
