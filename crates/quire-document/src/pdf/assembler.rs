// SPDX-License-Identifier: MIT
//
// Page assembler — accumulates pages from many source documents into one
// output PDF. The output document and its page tree are owned exclusively by
// the assembler for the lifetime of a job; appends are strictly sequential.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use lopdf::{Document, Object, ObjectId, dictionary};
use quire_core::error::{QuireError, Result};
use tracing::{debug, instrument, warn};

/// Builds one output PDF by re-homing pages from source documents.
///
/// Pages appear in the output in exactly the order they were appended. The
/// catalog and `/Pages` tree are materialized when the assembler is finished,
/// so an assembler that never received a page cannot produce an output file.
pub struct PageAssembler {
    document: Document,
    pages_id: ObjectId,
    page_ids: Vec<ObjectId>,
}

impl PageAssembler {
    pub fn new() -> Self {
        let mut document = Document::with_version("1.5");
        // Reserved up front so cloned pages can point their /Parent at it
        // before the page tree itself exists.
        let pages_id = document.new_object_id();
        Self {
            document,
            pages_id,
            page_ids: Vec::new(),
        }
    }

    /// Pages appended so far.
    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Append every page of `source`, in page order. Returns how many pages
    /// were appended.
    ///
    /// Objects shared between pages (fonts, images) are cloned once and
    /// referenced from every page that uses them.
    #[instrument(skip_all, fields(source_pages = source.get_pages().len()))]
    pub fn append_document(&mut self, source: &Document) -> Result<u32> {
        let pages = source.get_pages();
        let mut page_numbers: Vec<u32> = pages.keys().copied().collect();
        page_numbers.sort_unstable();

        let mut visited = HashMap::new();
        for page_number in &page_numbers {
            self.append_page_from(source, pages[page_number], &mut visited)?;
        }

        debug!(appended = page_numbers.len(), "Document appended");
        Ok(page_numbers.len() as u32)
    }

    /// Append a single page object (and everything it references) from
    /// `source`.
    pub fn append_page(&mut self, source: &Document, page_id: ObjectId) -> Result<()> {
        self.append_page_from(source, page_id, &mut HashMap::new())
    }

    fn append_page_from(
        &mut self,
        source: &Document,
        page_id: ObjectId,
        visited: &mut HashMap<ObjectId, ObjectId>,
    ) -> Result<()> {
        let new_id = match visited.get(&page_id) {
            // Already cloned as a dependency of an earlier page, e.g. the
            // target of a link annotation.
            Some(id) => *id,
            None => {
                let page_object = source.get_object(page_id).map_err(|err| {
                    QuireError::Pdf(format!("cannot read page object {:?}: {}", page_id, err))
                })?;
                let reserved = self.document.new_object_id();
                visited.insert(page_id, reserved);
                let cloned = clone_object(source, &mut self.document, visited, page_object)?;
                self.document.objects.insert(reserved, cloned);
                reserved
            }
        };

        // Re-home the page under the output's page tree.
        if let Ok(Object::Dictionary(page_dict)) = self.document.get_object_mut(new_id) {
            page_dict.set("Parent", Object::Reference(self.pages_id));
        }

        self.page_ids.push(new_id);
        Ok(())
    }

    /// Materialize the page tree and catalog, consuming the assembler.
    ///
    /// Fails with `NoPagesExtracted` if nothing was appended.
    pub fn finish(mut self) -> Result<Document> {
        if self.page_ids.is_empty() {
            return Err(QuireError::NoPagesExtracted);
        }

        let kids: Vec<Object> = self
            .page_ids
            .iter()
            .map(|id| Object::Reference(*id))
            .collect();
        let count = self.page_ids.len() as i64;

        self.document.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );

        let catalog_id = self.document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(self.pages_id),
        });
        self.document.trailer.set("Root", catalog_id);

        Ok(self.document)
    }

    /// Finish and serialize to bytes.
    pub fn finish_to_bytes(self) -> Result<Vec<u8>> {
        let mut document = self.finish()?;
        let mut output = Vec::new();
        document
            .save_to(&mut output)
            .map_err(|err| QuireError::Pdf(format!("failed to serialize output PDF: {}", err)))?;
        Ok(output)
    }

    /// Finish and write the output document to `path`.
    pub fn write_to_file(self, path: impl AsRef<Path>) -> Result<()> {
        let mut document = self.finish()?;
        let file = File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        document
            .save_to(&mut writer)
            .map_err(|err| QuireError::Pdf(format!("failed to write output PDF: {}", err)))?;
        Ok(())
    }
}

impl Default for PageAssembler {
    fn default() -> Self {
        Self::new()
    }
}

/// Deep-clone a single lopdf object from `source` into `target`, recursively
/// resolving references. `visited` maps source ids to their clones, so
/// back-references (an annotation's `/P` pointing at its own page) terminate
/// instead of recursing, and shared objects are cloned once. `/Parent`
/// entries are skipped; the caller re-points them at the output page tree.
fn clone_object(
    source: &Document,
    target: &mut Document,
    visited: &mut HashMap<ObjectId, ObjectId>,
    object: &Object,
) -> Result<Object> {
    match object {
        Object::Dictionary(dict) => {
            let mut new_dict = lopdf::Dictionary::new();
            for (key, value) in dict.iter() {
                if key == b"Parent" {
                    continue;
                }
                let cloned_value = clone_object(source, target, visited, value)?;
                new_dict.set(key.clone(), cloned_value);
            }
            Ok(Object::Dictionary(new_dict))
        }
        Object::Array(items) => {
            let mut new_items = Vec::with_capacity(items.len());
            for item in items {
                new_items.push(clone_object(source, target, visited, item)?);
            }
            Ok(Object::Array(new_items))
        }
        Object::Reference(ref_id) => {
            if let Some(existing) = visited.get(ref_id) {
                return Ok(Object::Reference(*existing));
            }
            match source.get_object(*ref_id) {
                Ok(referenced) => {
                    // Reserve the target id before descending so any cycle
                    // back to this object resolves to the reservation.
                    let new_id = target.new_object_id();
                    visited.insert(*ref_id, new_id);
                    let cloned = clone_object(source, target, visited, referenced)?;
                    target.objects.insert(new_id, cloned);
                    Ok(Object::Reference(new_id))
                }
                Err(err) => {
                    warn!(?ref_id, %err, "Cannot resolve reference, using Null");
                    Ok(Object::Null)
                }
            }
        }
        Object::Stream(stream) => {
            let mut new_dict = lopdf::Dictionary::new();
            for (key, value) in stream.dict.iter() {
                if key == b"Parent" {
                    continue;
                }
                let cloned_value = clone_object(source, target, visited, value)?;
                new_dict.set(key.clone(), cloned_value);
            }
            Ok(Object::Stream(lopdf::Stream::new(
                new_dict,
                stream.content.clone(),
            )))
        }
        // Boolean, Integer, Real, String, Name, Null are trivially cloneable.
        other => Ok(other.clone()),
    }
}
