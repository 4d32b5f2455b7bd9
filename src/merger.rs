//! Page-order-preserving PDF concatenation using lopdf.

use crate::error::{Error, Result};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Merges the given PDF files into `output`, preserving input order and
/// per-input page count, and returns the total page count.
///
/// Every input document's objects are renumbered into one id space, then
/// a fresh catalog and page tree referencing all pages in order is built
/// on top. Nothing is transformed or dropped.
pub fn merge_documents(inputs: &[PathBuf], output: &Path) -> Result<usize> {
    if inputs.is_empty() {
        return Err(Error::MergeFailed("no documents to merge".to_string()));
    }

    let mut documents: Vec<Document> = Vec::with_capacity(inputs.len());
    for path in inputs {
        let doc = Document::load(path)
            .map_err(|e| Error::MergeFailed(format!("failed to load {}: {e}", path.display())))?;

        if doc.get_pages().is_empty() {
            return Err(Error::MergeFailed(format!(
                "{} has no pages",
                path.display()
            )));
        }

        documents.push(doc);
    }

    let mut max_id = 1;
    let mut page_ids: Vec<ObjectId> = Vec::new();
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for mut doc in documents {
        // Shift object ids so documents cannot collide
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        page_ids.extend(doc.get_pages().into_values());
        objects.extend(doc.objects);
    }

    let mut merged = Document::with_version("1.5");
    merged.objects.extend(objects);

    // new_object_id must allocate above everything just inserted
    merged.max_id = max_id - 1;

    let pages_id = merged.new_object_id();
    let kids: Vec<Object> = page_ids.iter().map(|&id| Object::Reference(id)).collect();

    let mut pages_dict = Dictionary::new();
    pages_dict.set("Type", Object::Name(b"Pages".to_vec()));
    pages_dict.set("Count", Object::Integer(page_ids.len() as i64));
    pages_dict.set("Kids", Object::Array(kids));

    let catalog_id = merged.new_object_id();
    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));

    merged.objects.insert(pages_id, Object::Dictionary(pages_dict));
    merged.objects.insert(catalog_id, Object::Dictionary(catalog));
    merged.trailer.set("Root", Object::Reference(catalog_id));

    for &page_id in &page_ids {
        if let Ok(page_object) = merged.get_object_mut(page_id) {
            if let Object::Dictionary(ref mut dict) = page_object {
                dict.set("Parent", Object::Reference(pages_id));
            }
        }
    }

    merged.compress();
    merged
        .save(output)
        .map_err(|e| Error::MergeFailed(format!("failed to save {}: {e}", output.display())))?;

    Ok(page_ids.len())
}

/// Page count of a single PDF file.
pub fn page_count(path: &Path) -> Result<usize> {
    let doc = Document::load(path)
        .map_err(|e| Error::MergeFailed(format!("failed to load {}: {e}", path.display())))?;
    Ok(doc.get_pages().len())
}
