// SPDX-License-Identifier: MIT
//
// Shared test fixtures, also exported to dependent crates' tests through the
// `testing` feature.

use lopdf::{Document, Object, Stream, dictionary};

/// Build an in-memory PDF with `pages` empty letter-sized pages.
pub fn sample_document(pages: usize) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids: Vec<Object> = Vec::with_capacity(pages);
    for _ in 0..pages {
        let content_id = doc.add_object(Object::Stream(Stream::new(dictionary! {}, Vec::new())));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => Object::Reference(content_id),
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

/// One-page document encrypted with an empty user password (40-bit RC4).
pub fn encrypted_blank_password_pdf() -> &'static [u8] {
    include_bytes!("../fixtures/encrypted-blank-password.pdf")
}

/// One-page document locked with a non-empty user password (40-bit RC4).
pub fn encrypted_locked_pdf() -> &'static [u8] {
    include_bytes!("../fixtures/encrypted-locked.pdf")
}
