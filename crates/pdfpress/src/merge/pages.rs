//! Page tree manipulation for assembly.
//!
//! This module handles page-level operations including:
//! - Pushing inheritable attributes down into each page
//! - Building a fresh page tree and catalog over a list of pages

use crate::error::{PdfPressError, Result};
use lopdf::{Document, Object, ObjectId, dictionary};

/// Page attributes a page may inherit from its ancestors.
pub const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic `Parent` chains in damaged files.
const MAX_TREE_DEPTH: usize = 64;

/// Page tree editor used by the merger.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageTree;

impl PageTree {
    /// Create a new page tree editor.
    pub fn new() -> Self {
        Self
    }

    /// Copy inherited attributes onto every page that lacks them.
    ///
    /// After this runs, each page carries its own Resources, MediaBox,
    /// CropBox and Rotate (where any ancestor defined them), so it can be
    /// re-parented under a different tree without changing its appearance.
    ///
    /// # Errors
    ///
    /// Returns an error if a page object is not a dictionary.
    pub fn push_down_inherited(&self, doc: &mut Document) -> Result<()> {
        let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();

        for page_id in page_ids {
            let inherited = self.inherited_attributes(doc, page_id);
            if inherited.is_empty() {
                continue;
            }

            let page = doc
                .get_object_mut(page_id)
                .and_then(Object::as_dict_mut)
                .map_err(|e| PdfPressError::other(format!("Failed to get page: {e}")))?;

            for (key, value) in inherited {
                page.set(key, value);
            }
        }

        Ok(())
    }

    /// Attributes the page lacks but one of its ancestors defines.
    fn inherited_attributes(&self, doc: &Document, page_id: ObjectId) -> Vec<(Vec<u8>, Object)> {
        let Ok(page) = doc.get_dictionary(page_id) else {
            return Vec::new();
        };

        let mut missing: Vec<&[u8]> = INHERITABLE_KEYS
            .iter()
            .copied()
            .filter(|key| !page.has(key))
            .collect();
        let mut found = Vec::new();

        let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
        let mut depth = 0;

        while let Some(parent_id) = parent {
            if missing.is_empty() || depth >= MAX_TREE_DEPTH {
                break;
            }
            let Ok(node) = doc.get_dictionary(parent_id) else {
                break;
            };

            missing.retain(|key| match node.get(key) {
                Ok(value) => {
                    found.push((key.to_vec(), value.clone()));
                    false
                }
                Err(_) => true,
            });

            parent = node.get(b"Parent").and_then(Object::as_reference).ok();
            depth += 1;
        }

        found
    }

    /// Install a new page tree root and catalog listing `kids` in order.
    ///
    /// Every kid is re-parented to the new root and the trailer's Root is
    /// pointed at the new catalog. Previous roots become unreachable.
    ///
    /// # Errors
    ///
    /// Returns an error if a kid is not a page dictionary.
    pub fn install_tree(&self, doc: &mut Document, kids: &[ObjectId]) -> Result<ObjectId> {
        let pages_id = doc.new_object_id();

        for &kid in kids {
            let page = doc
                .get_object_mut(kid)
                .and_then(Object::as_dict_mut)
                .map_err(|e| PdfPressError::other(format!("Page {kid:?} is not a dictionary: {e}")))?;
            page.set("Parent", Object::Reference(pages_id));
        }

        let kids_array: Vec<Object> = kids.iter().map(|&id| Object::Reference(id)).collect();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids_array,
                "Count" => kids.len() as i64,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", Object::Reference(catalog_id));

        Ok(pages_id)
    }

    /// Get the number of pages in a document.
    pub fn page_count(&self, doc: &Document) -> usize {
        doc.get_pages().len()
    }
}
