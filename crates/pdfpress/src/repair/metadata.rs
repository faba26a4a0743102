//! Document information dictionary handling for repaired documents.
//!
//! Only the Title and Author entries survive a repair. Dates are never
//! written so that repairing the same bytes twice yields the same output.

use lopdf::{Dictionary, Document, Object, StringFormat};

/// The Info entries carried over by a repair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentInfo {
    /// Document title.
    pub title: Option<String>,
    /// Document author.
    pub author: Option<String>,
}

impl DocumentInfo {
    /// Check if no entry is set.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.author.is_none()
    }
}

/// Manager for the Info dictionary.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataManager;

impl MetadataManager {
    /// Create a new metadata manager.
    pub fn new() -> Self {
        Self
    }

    /// Read Title and Author from the document's Info dictionary.
    ///
    /// Missing, unreadable or non-text entries come back as `None`.
    pub fn get_info(&self, doc: &Document) -> DocumentInfo {
        let Some(info_dict) = Self::info_dictionary(doc) else {
            return DocumentInfo::default();
        };

        DocumentInfo {
            title: Self::get_string_field(info_dict, b"Title"),
            author: Self::get_string_field(info_dict, b"Author"),
        }
    }

    /// Replace the Info dictionary with one holding only `info`.
    ///
    /// The previous Info object is removed. When `info` is empty the trailer
    /// ends up without an Info entry.
    pub fn replace_info(&self, doc: &mut Document, info: &DocumentInfo) {
        if let Ok(info_ref) = doc.trailer.get(b"Info").and_then(|i| i.as_reference()) {
            doc.objects.remove(&info_ref);
        }
        doc.trailer.remove(b"Info");

        if info.is_empty() {
            return;
        }

        let mut dict = Dictionary::new();
        if let Some(ref title) = info.title {
            dict.set(
                "Title",
                Object::String(title.as_bytes().to_vec(), StringFormat::Literal),
            );
        }
        if let Some(ref author) = info.author {
            dict.set(
                "Author",
                Object::String(author.as_bytes().to_vec(), StringFormat::Literal),
            );
        }

        let info_id = doc.add_object(dict);
        doc.trailer.set("Info", Object::Reference(info_id));
    }

    /// Check if a document has an Info dictionary.
    pub fn has_info(&self, doc: &Document) -> bool {
        doc.trailer.has(b"Info")
    }

    fn info_dictionary(doc: &Document) -> Option<&Dictionary> {
        match doc.trailer.get(b"Info").ok()? {
            Object::Reference(id) => doc.get_dictionary(*id).ok(),
            Object::Dictionary(dict) => Some(dict),
            _ => None,
        }
    }

    /// Extract a string field from a dictionary.
    fn get_string_field(dict: &Dictionary, key: &[u8]) -> Option<String> {
        dict.get(key).ok().and_then(|obj| {
            if let Object::String(bytes, _) = obj {
                String::from_utf8(bytes.clone()).ok()
            } else {
                None
            }
        })
    }
}
