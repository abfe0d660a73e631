use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use zip::ZipArchive;

use super::ExtractionError;

const DOCUMENT_PART: &str = "word/document.xml";

/// Extracts the body text of a DOCX document held in memory.
///
/// Paragraphs are separated by a blank line. Each table row becomes one
/// paragraph with its cells joined by ` | `.
pub fn extract_docx(bytes: &[u8]) -> Result<String, ExtractionError> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| ExtractionError::Docx(e.to_string()))?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| ExtractionError::Docx(format!("{DOCUMENT_PART}: {e}")))?
        .read_to_string(&mut xml)?;

    parse_document_xml(&xml)
}

#[derive(Default)]
struct BodyWalker {
    paragraphs: Vec<String>,
    current: String,
    in_text: bool,
    table_depth: usize,
    cell: String,
    row: Vec<String>,
}

impl BodyWalker {
    fn end_paragraph(&mut self) {
        let paragraph = std::mem::take(&mut self.current);
        if paragraph.trim().is_empty() {
            return;
        }
        if self.table_depth > 0 {
            if !self.cell.is_empty() {
                self.cell.push('\n');
            }
            self.cell.push_str(&paragraph);
        } else {
            self.paragraphs.push(paragraph);
        }
    }

    fn end_row(&mut self) {
        let row = std::mem::take(&mut self.row);
        if row.iter().any(|c| !c.trim().is_empty()) {
            self.paragraphs.push(row.join(" | "));
        }
    }

    fn push_text(&mut self, text: &str) {
        if self.in_text {
            self.current.push_str(text);
        }
    }
}

fn parse_document_xml(xml: &str) -> Result<String, ExtractionError> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut walker = BodyWalker::default();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"t" => walker.in_text = true,
                b"tbl" => walker.table_depth += 1,
                _ => {}
            },
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => walker.in_text = false,
                b"p" => walker.end_paragraph(),
                b"tc" => {
                    let cell = std::mem::take(&mut walker.cell);
                    walker.row.push(cell);
                }
                b"tr" => walker.end_row(),
                b"tbl" => walker.table_depth = walker.table_depth.saturating_sub(1),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tab" => walker.current.push('\t'),
                b"br" | b"cr" => walker.current.push('\n'),
                _ => {}
            },
            Ok(Event::Text(e)) => {
                let text = String::from_utf8_lossy(e.as_ref()).to_string();
                walker.push_text(&text);
            }
            Ok(Event::GeneralRef(e)) => {
                let resolved = match &*e {
                    b"amp" => Some('&'),
                    b"lt" => Some('<'),
                    b"gt" => Some('>'),
                    b"quot" => Some('"'),
                    b"apos" => Some('\''),
                    _ => e.resolve_char_ref().ok().flatten(),
                };
                if let Some(c) = resolved {
                    walker.push_text(c.encode_utf8(&mut [0u8; 4]));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractionError::Docx(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(walker.paragraphs.join("\n\n"))
}
