//! Image embedding: resolve `${AnhN}` placeholders against uploaded photos.
//!
//! This is the second substitution pass, run over the exported bytes rather
//! than the remote document. Field placeholders (`$key`) and image
//! placeholders (`${AnhN}`) share a sigil but never a resolver: by the time
//! this stage runs, the field pass is long finished and only image tokens
//! remain.
//!
//! Slots are processed one at a time in slot order. Each slot scans the
//! document tree in a fixed order — standalone paragraphs first, then
//! tables by row and cell — and the first container holding the token wins;
//! the token is stripped and the photo is placed there at a fixed 3-inch
//! width. A token that appears nowhere does not lose the photo: it is
//! appended in a fresh trailing paragraph instead. The outcome per slot is
//! a tagged [`EmbedOutcome`], not a boolean, so tests can pin down where
//! each photo landed.

use crate::document::{Block, Document, InlineImage, Paragraph};
use crate::error::ReportError;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use tracing::debug;

/// Fixed number of photo slots per report.
pub const SLOT_COUNT: usize = 8;

/// The uploaded photos of one request, by slot. Empty slots are skipped.
#[derive(Debug, Clone, Default)]
pub struct SlotSet {
    slots: [Option<Vec<u8>>; SLOT_COUNT],
}

impl SlotSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Placeholder token of a slot (0-based index): `${Anh1}` … `${Anh8}`.
    pub fn placeholder(index: usize) -> String {
        format!("${{Anh{}}}", index + 1)
    }

    /// Fill a slot (0-based index) with image bytes.
    ///
    /// # Panics
    /// If `index` is not below [`SLOT_COUNT`].
    pub fn set(&mut self, index: usize, data: Vec<u8>) {
        self.slots[index] = Some(data);
    }

    /// Non-empty slots in slot order, as (token, bytes) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (String, &[u8])> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_deref().map(|data| (Self::placeholder(i), data)))
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    pub fn filled_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

/// Where a photo ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsertLocation {
    /// Index among the standalone paragraphs.
    Paragraph { index: usize },
    /// Table, row and cell indices in document order.
    Cell {
        table: usize,
        row: usize,
        cell: usize,
    },
}

/// Outcome of one slot: placed at its placeholder, or appended at the end
/// because the placeholder was absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmbedOutcome {
    Inserted(InsertLocation),
    Appended,
}

/// Embed every filled slot into the exported document bytes.
///
/// Returns the re-serialised document plus one outcome per filled slot, in
/// slot order. Any failure — unparseable bytes, an undecodable photo —
/// discards the partial result and returns an error.
pub fn embed_images(
    bytes: &[u8],
    slots: &SlotSet,
    width_emu: u32,
) -> Result<(Vec<u8>, Vec<EmbedOutcome>), ReportError> {
    let mut doc = Document::from_bytes(bytes)?;
    let mut outcomes = Vec::with_capacity(slots.filled_count());

    for (token, data) in slots.iter() {
        let image = sized_image(data, width_emu)?;
        let outcome = embed_one(&mut doc, &token, image);
        debug!(%token, ?outcome, "photo embedded");
        outcomes.push(outcome);
    }

    let out = doc.to_bytes()?;
    Ok((out, outcomes))
}

/// Place one photo at the first container holding `token`.
///
/// Scan order is fixed: standalone paragraphs in document order, then
/// tables, rows, cells. One insertion per slot — after the first hit the
/// scan stops, even if the token occurs again elsewhere. With no hit at
/// all, a fresh paragraph is appended at the end of the document.
fn embed_one(doc: &mut Document, token: &str, image: InlineImage) -> EmbedOutcome {
    let mut paragraph_index = 0;
    for block in &mut doc.blocks {
        if let Block::Paragraph(p) = block {
            if p.text.contains(token) {
                p.text = p.text.replace(token, "");
                p.images.push(image);
                return EmbedOutcome::Inserted(InsertLocation::Paragraph {
                    index: paragraph_index,
                });
            }
            paragraph_index += 1;
        }
    }

    let mut table_index = 0;
    for block in &mut doc.blocks {
        if let Block::Table(table) = block {
            for (row_index, row) in table.rows.iter_mut().enumerate() {
                for (cell_index, cell) in row.cells.iter_mut().enumerate() {
                    if cell.full_text().contains(token) {
                        let cleaned = cell.full_text().replace(token, "");
                        cell.set_text(cleaned);
                        cell.paragraphs[0].images.push(image);
                        return EmbedOutcome::Inserted(InsertLocation::Cell {
                            table: table_index,
                            row: row_index,
                            cell: cell_index,
                        });
                    }
                }
            }
            table_index += 1;
        }
    }

    doc.blocks.push(Block::Paragraph(Paragraph {
        text: String::new(),
        images: vec![image],
    }));
    EmbedOutcome::Appended
}

/// Build the inline image at the fixed width, height from the photo's own
/// aspect ratio.
fn sized_image(data: &[u8], width_emu: u32) -> Result<InlineImage, ReportError> {
    let (w, h) = image::ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| ReportError::EmbedFailed {
            detail: format!("unreadable image data: {e}"),
        })?
        .into_dimensions()
        .map_err(|e| ReportError::EmbedFailed {
            detail: format!("not a supported image: {e}"),
        })?;

    let height_emu = ((width_emu as u64) * (h as u64) / (w.max(1) as u64)) as u32;
    Ok(InlineImage {
        data: data.to_vec(),
        width_emu,
        height_emu,
    })
}
