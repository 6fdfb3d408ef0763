//! Portable report document model.
//!
//! The exported report is manipulated as a generic text-container tree:
//! a sequence of blocks, each either a standalone [`Paragraph`] or a
//! [`Table`] of rows of cells, where each cell again holds paragraphs.
//! Placeholder scans walk this tree depth-first; nothing in the pipeline
//! touches a vendor document object model.
//!
//! The tree round-trips through a flat XML wordprocessing subset (see
//! [`xml`]) so a document is always representable as standalone bytes:
//! inline images travel base64-encoded with explicit EMU extents.

mod xml;

use crate::error::ReportError;

/// English Metric Units per inch, the extent unit used by word-processing
/// formats.
pub const EMU_PER_INCH: u32 = 914_400;

/// Fixed physical width of an embedded photo: 3 inches.
pub const DEFAULT_IMAGE_WIDTH_EMU: u32 = 3 * EMU_PER_INCH;

/// An image placed inline at the end of a paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub data: Vec<u8>,
    pub width_emu: u32,
    pub height_emu: u32,
}

/// A run of text plus any inline images appended to it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Paragraph {
    pub text: String,
    pub images: Vec<InlineImage>,
}

impl Paragraph {
    pub fn text(text: impl Into<String>) -> Self {
        Paragraph {
            text: text.into(),
            images: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell {
    pub paragraphs: Vec<Paragraph>,
}

impl Cell {
    pub fn text(text: impl Into<String>) -> Self {
        Cell {
            paragraphs: vec![Paragraph::text(text)],
        }
    }

    /// The cell's visible text: paragraph texts joined with newlines.
    pub fn full_text(&self) -> String {
        self.paragraphs
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Replace the cell's whole content with a single text paragraph,
    /// discarding prior paragraphs and their images.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.paragraphs = vec![Paragraph::text(text)];
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub rows: Vec<Row>,
}

/// One document block in body order.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

/// The report document: blocks in body order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_paragraph(&mut self, paragraph: Paragraph) {
        self.blocks.push(Block::Paragraph(paragraph));
    }

    pub fn push_table(&mut self, table: Table) {
        self.blocks.push(Block::Table(table));
    }

    /// Standalone paragraphs (not the ones inside table cells), in order.
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Paragraph(p) => Some(p),
            Block::Table(_) => None,
        })
    }

    pub fn paragraph_count(&self) -> usize {
        self.paragraphs().count()
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Table(t) => Some(t),
            Block::Paragraph(_) => None,
        })
    }

    /// Replace every occurrence of `find` with `with` in every text
    /// container, depth-first: standalone paragraphs, then table rows,
    /// cells, and their paragraphs. Replace-all, case-sensitive, verbatim.
    pub fn replace_text(&mut self, find: &str, with: &str) {
        for block in &mut self.blocks {
            match block {
                Block::Paragraph(p) => {
                    if p.text.contains(find) {
                        p.text = p.text.replace(find, with);
                    }
                }
                Block::Table(table) => {
                    for row in &mut table.rows {
                        for cell in &mut row.cells {
                            for p in &mut cell.paragraphs {
                                if p.text.contains(find) {
                                    p.text = p.text.replace(find, with);
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    /// True when `token` occurs in any text container.
    pub fn contains_text(&self, token: &str) -> bool {
        self.blocks.iter().any(|block| match block {
            Block::Paragraph(p) => p.text.contains(token),
            Block::Table(table) => table
                .rows
                .iter()
                .flat_map(|r| &r.cells)
                .any(|c| c.full_text().contains(token)),
        })
    }

    /// Count of inline images anywhere in the document.
    pub fn image_count(&self) -> usize {
        self.blocks
            .iter()
            .map(|block| match block {
                Block::Paragraph(p) => p.images.len(),
                Block::Table(table) => table
                    .rows
                    .iter()
                    .flat_map(|r| &r.cells)
                    .flat_map(|c| &c.paragraphs)
                    .map(|p| p.images.len())
                    .sum(),
            })
            .sum()
    }

    /// Serialise to the flat XML byte form.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ReportError> {
        xml::serialize(self)
    }

    /// Parse the flat XML byte form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Document, ReportError> {
        xml::parse(bytes)
    }
}
