//! Builders for small in-memory PDFs used by unit tests.

use lopdf::{Dictionary, Document, Object, Stream, dictionary};

/// Build a document whose page `n` draws the text `"{label} page {n}"`.
///
/// Resources and MediaBox live on the page tree root so that pages only get
/// them through inheritance.
pub(crate) fn build_document(label: &str, pages: usize) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids = Vec::new();
    for n in 1..=pages {
        let text = format!("BT /F1 12 Tf 72 720 Td ({label} page {n}) Tj ET");
        let content_id = doc.add_object(Stream::new(Dictionary::new(), text.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    doc
}

/// Serialize `doc` to bytes.
pub(crate) fn save(mut doc: Document) -> Vec<u8> {
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// A valid one-page PDF.
pub(crate) fn pdf_bytes() -> Vec<u8> {
    pdf_bytes_with_pages(1)
}

/// A valid PDF with `pages` pages.
pub(crate) fn pdf_bytes_with_pages(pages: usize) -> Vec<u8> {
    labeled_pdf_bytes("Doc", pages)
}

/// A valid PDF whose pages are tagged with `label`.
pub(crate) fn labeled_pdf_bytes(label: &str, pages: usize) -> Vec<u8> {
    save(build_document(label, pages))
}

/// A PDF behind a standard security handler whose empty user password
/// does not open it.
pub(crate) fn encrypted_pdf_bytes(label: &str, pages: usize) -> Vec<u8> {
    let mut doc = build_document(label, pages);
    let encrypt_id = doc.add_object(dictionary! {
        "Filter" => "Standard",
        "V" => 1,
        "R" => 2,
        "Length" => 40,
        "O" => Object::String(vec![0x11; 32], lopdf::StringFormat::Hexadecimal),
        "U" => Object::String(vec![0x22; 32], lopdf::StringFormat::Hexadecimal),
        "P" => -4,
    });
    doc.trailer.set("Encrypt", encrypt_id);
    let id = Object::String(vec![0x5a; 16], lopdf::StringFormat::Hexadecimal);
    doc.trailer.set("ID", vec![id.clone(), id]);
    save(doc)
}

/// A PDF with its cross-reference table and trailer cut off.
pub(crate) fn without_xref(bytes: &[u8]) -> Vec<u8> {
    let cut = bytes
        .windows(5)
        .rposition(|w| w == b"\nxref")
        .map_or(bytes.len(), |pos| pos + 1);
    bytes[..cut].to_vec()
}

/// A PDF whose `startxref` points past the end of the file.
pub(crate) fn with_bad_startxref(bytes: &[u8]) -> Vec<u8> {
    let pos = bytes
        .windows(9)
        .rposition(|w| w == b"startxref")
        .unwrap();
    let mut damaged = bytes[..pos].to_vec();
    damaged.extend_from_slice(b"startxref\n99999999\n%%EOF\n");
    damaged
}

/// The text drawn on each page of `bytes`, in page order.
pub(crate) fn page_labels(bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(bytes).unwrap();
    doc.get_pages()
        .values()
        .map(|&page_id| {
            let content = doc.get_page_content(page_id).unwrap();
            let content = String::from_utf8_lossy(&content);
            let start = content.find('(').unwrap() + 1;
            let end = content[start..].find(')').unwrap() + start;
            content[start..end].to_string()
        })
        .collect()
}
