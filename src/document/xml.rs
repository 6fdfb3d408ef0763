//! Flat XML byte form of the report document.
//!
//! The element set is the minimal wordprocessing subset the pipeline needs:
//!
//! ```text
//! <document>
//!   <p>paragraph text<img w="2743200" h="914400">BASE64</img></p>
//!   <tbl><tr><tc><p>cell text</p></tc></tr></tbl>
//! </document>
//! ```
//!
//! Inline image payloads are base64-encoded element content with EMU extents
//! as attributes, so a serialised document is standalone. Nesting is strict:
//! `tc` only inside `tr` inside `tbl`, `img` only inside `p`. Anything else
//! is a parse error — exported bytes that do not follow this shape indicate
//! a broken export, not a recoverable document.

use crate::document::{Block, Cell, Document, InlineImage, Paragraph, Row, Table};
use crate::error::ReportError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

fn bad(detail: impl Into<String>) -> ReportError {
    ReportError::DocumentParse {
        detail: detail.into(),
    }
}

fn write_failed(e: impl std::fmt::Display) -> ReportError {
    ReportError::Internal(format!("document serialisation failed: {e}"))
}

// ── Serialise ────────────────────────────────────────────────────────────

pub(super) fn serialize(doc: &Document) -> Result<Vec<u8>, ReportError> {
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(write_failed)?;
    writer
        .write_event(Event::Start(BytesStart::new("document")))
        .map_err(write_failed)?;

    for block in &doc.blocks {
        match block {
            Block::Paragraph(p) => write_paragraph(&mut writer, p)?,
            Block::Table(table) => write_table(&mut writer, table)?,
        }
    }

    writer
        .write_event(Event::End(BytesEnd::new("document")))
        .map_err(write_failed)?;
    Ok(writer.into_inner())
}

fn write_paragraph(writer: &mut Writer<Vec<u8>>, p: &Paragraph) -> Result<(), ReportError> {
    writer
        .write_event(Event::Start(BytesStart::new("p")))
        .map_err(write_failed)?;
    if !p.text.is_empty() {
        writer
            .write_event(Event::Text(BytesText::new(&p.text)))
            .map_err(write_failed)?;
    }
    for image in &p.images {
        let mut start = BytesStart::new("img");
        start.push_attribute(("w", image.width_emu.to_string().as_str()));
        start.push_attribute(("h", image.height_emu.to_string().as_str()));
        writer
            .write_event(Event::Start(start))
            .map_err(write_failed)?;
        writer
            .write_event(Event::Text(BytesText::new(&BASE64.encode(&image.data))))
            .map_err(write_failed)?;
        writer
            .write_event(Event::End(BytesEnd::new("img")))
            .map_err(write_failed)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("p")))
        .map_err(write_failed)?;
    Ok(())
}

fn write_table(writer: &mut Writer<Vec<u8>>, table: &Table) -> Result<(), ReportError> {
    writer
        .write_event(Event::Start(BytesStart::new("tbl")))
        .map_err(write_failed)?;
    for row in &table.rows {
        writer
            .write_event(Event::Start(BytesStart::new("tr")))
            .map_err(write_failed)?;
        for cell in &row.cells {
            writer
                .write_event(Event::Start(BytesStart::new("tc")))
                .map_err(write_failed)?;
            for p in &cell.paragraphs {
                write_paragraph(writer, p)?;
            }
            writer
                .write_event(Event::End(BytesEnd::new("tc")))
                .map_err(write_failed)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new("tr")))
            .map_err(write_failed)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("tbl")))
        .map_err(write_failed)?;
    Ok(())
}

// ── Parse ────────────────────────────────────────────────────────────────

/// Open-image state: extents plus the base64 content accumulated so far.
struct PendingImage {
    width_emu: u32,
    height_emu: u32,
    b64: String,
}

pub(super) fn parse(bytes: &[u8]) -> Result<Document, ReportError> {
    let mut reader = Reader::from_reader(bytes);

    let mut doc = Document::new();
    let mut table: Option<Table> = None;
    let mut row: Option<Row> = None;
    let mut cell: Option<Cell> = None;
    let mut paragraph: Option<Paragraph> = None;
    let mut image: Option<PendingImage> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| bad(format!("XML error at byte {}: {e}", reader.buffer_position())))?;
        match event {
            Event::Start(e) => match e.name().as_ref() {
                b"document" => {}
                b"p" => {
                    if paragraph.is_some() {
                        return Err(bad("nested <p>"));
                    }
                    paragraph = Some(Paragraph::default());
                }
                b"tbl" => {
                    if table.is_some() || paragraph.is_some() {
                        return Err(bad("misplaced <tbl>"));
                    }
                    table = Some(Table::default());
                }
                b"tr" => {
                    if table.is_none() || row.is_some() {
                        return Err(bad("misplaced <tr>"));
                    }
                    row = Some(Row::default());
                }
                b"tc" => {
                    if row.is_none() || cell.is_some() {
                        return Err(bad("misplaced <tc>"));
                    }
                    cell = Some(Cell::default());
                }
                b"img" => {
                    if paragraph.is_none() {
                        return Err(bad("<img> outside <p>"));
                    }
                    image = Some(PendingImage {
                        width_emu: extent_attr(&e, "w")?,
                        height_emu: extent_attr(&e, "h")?,
                        b64: String::new(),
                    });
                }
                other => {
                    return Err(bad(format!(
                        "unexpected element <{}>",
                        String::from_utf8_lossy(other)
                    )))
                }
            },
            Event::Empty(e) => match e.name().as_ref() {
                // Self-closed containers are legal and empty.
                b"p" => {
                    place_paragraph(Paragraph::default(), &mut cell, &mut doc);
                }
                b"tc" => match row.as_mut() {
                    Some(r) => r.cells.push(Cell::default()),
                    None => return Err(bad("misplaced <tc/>")),
                },
                b"tr" => match table.as_mut() {
                    Some(t) => t.rows.push(Row::default()),
                    None => return Err(bad("misplaced <tr/>")),
                },
                b"img" => {
                    let p = paragraph.as_mut().ok_or_else(|| bad("<img/> outside <p>"))?;
                    p.images.push(InlineImage {
                        data: Vec::new(),
                        width_emu: extent_attr(&e, "w")?,
                        height_emu: extent_attr(&e, "h")?,
                    });
                }
                other => {
                    return Err(bad(format!(
                        "unexpected element <{}/>",
                        String::from_utf8_lossy(other)
                    )))
                }
            },
            Event::Text(e) => {
                let text = e
                    .unescape()
                    .map_err(|e| bad(format!("bad text content: {e}")))?;
                if let Some(img) = image.as_mut() {
                    img.b64.push_str(text.trim());
                } else if let Some(p) = paragraph.as_mut() {
                    p.text.push_str(&text);
                } else if !text.trim().is_empty() {
                    return Err(bad("text outside any paragraph"));
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"img" => {
                    let pending = image.take().ok_or_else(|| bad("stray </img>"))?;
                    let data = BASE64
                        .decode(pending.b64.as_bytes())
                        .map_err(|e| bad(format!("bad image payload: {e}")))?;
                    let p = paragraph
                        .as_mut()
                        .ok_or_else(|| bad("</img> outside <p>"))?;
                    p.images.push(InlineImage {
                        data,
                        width_emu: pending.width_emu,
                        height_emu: pending.height_emu,
                    });
                }
                b"p" => {
                    let p = paragraph.take().ok_or_else(|| bad("stray </p>"))?;
                    place_paragraph(p, &mut cell, &mut doc);
                }
                b"tc" => {
                    let c = cell.take().ok_or_else(|| bad("stray </tc>"))?;
                    row.as_mut().ok_or_else(|| bad("stray </tc>"))?.cells.push(c);
                }
                b"tr" => {
                    let r = row.take().ok_or_else(|| bad("stray </tr>"))?;
                    table.as_mut().ok_or_else(|| bad("stray </tr>"))?.rows.push(r);
                }
                b"tbl" => {
                    let t = table.take().ok_or_else(|| bad("stray </tbl>"))?;
                    doc.push_table(t);
                }
                b"document" => {}
                other => {
                    return Err(bad(format!(
                        "unexpected closing </{}>",
                        String::from_utf8_lossy(other)
                    )))
                }
            },
            Event::Eof => break,
            // Declarations, comments, processing instructions: no content.
            _ => {}
        }
    }

    if paragraph.is_some() || cell.is_some() || row.is_some() || table.is_some() {
        return Err(bad("unterminated element at end of input"));
    }
    Ok(doc)
}

/// Finished paragraphs land in the open cell if there is one, else in the
/// document body.
fn place_paragraph(p: Paragraph, cell: &mut Option<Cell>, doc: &mut Document) {
    match cell.as_mut() {
        Some(c) => c.paragraphs.push(p),
        None => doc.push_paragraph(p),
    }
}

fn extent_attr(e: &BytesStart<'_>, name: &str) -> Result<u32, ReportError> {
    let attr = e
        .try_get_attribute(name)
        .map_err(|e| bad(format!("bad <img> attribute: {e}")))?
        .ok_or_else(|| bad(format!("<img> missing '{name}' extent")))?;
    let value = attr
        .unescape_value()
        .map_err(|e| bad(format!("bad <img> attribute value: {e}")))?;
    value
        .parse::<u32>()
        .map_err(|_| bad(format!("<img> extent '{name}' is not a number: {value}")))
}
