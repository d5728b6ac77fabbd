//! Text extraction from the supported resume formats
//!
//! Every extractor works on the in-memory bytes of a [`Document`], so no
//! scratch files are created. Dispatch is on the declared format only.

use crate::error::ExtractionError;
use crate::input::file_detector::DocumentFormat;
use crate::processing::document::Document;
use log::{debug, warn};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use std::panic::{self, AssertUnwindSafe};

type ExtractResult = std::result::Result<String, ExtractionError>;

pub trait FormatExtractor {
    fn extract(&self, bytes: &[u8]) -> ExtractResult;
}

pub struct PdfExtractor;

impl FormatExtractor for PdfExtractor {
    fn extract(&self, bytes: &[u8]) -> ExtractResult {
        // pdf-extract panics on some malformed streams instead of returning Err.
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem(bytes)
        }));

        match outcome {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(ExtractionError::Pdf(e.to_string())),
            Err(_) => Err(ExtractionError::Pdf("parser panicked on malformed input".to_string())),
        }
    }
}

pub struct DocxExtractor;

impl DocxExtractor {
    const BODY_PART: &'static str = "word/document.xml";

    fn read_body(bytes: &[u8]) -> ExtractResult {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| ExtractionError::Docx(format!("not a DOCX container: {}", e)))?;

        let mut part = archive
            .by_name(Self::BODY_PART)
            .map_err(|e| ExtractionError::Docx(format!("missing {}: {}", Self::BODY_PART, e)))?;

        let mut xml = String::new();
        part.read_to_string(&mut xml)
            .map_err(|e| ExtractionError::Docx(format!("unreadable {}: {}", Self::BODY_PART, e)))?;
        Ok(xml)
    }

    /// Paragraph texts in document order; runs are concatenated within a paragraph.
    fn paragraphs(xml: &str) -> std::result::Result<Vec<String>, ExtractionError> {
        let mut reader = Reader::from_str(xml);
        let mut paragraphs = Vec::new();
        let mut current = String::new();
        let mut paragraph_depth = 0usize;
        let mut in_run = false;
        let mut in_text = false;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => match e.local_name().as_ref() {
                    b"p" => {
                        if paragraph_depth == 0 {
                            current.clear();
                        }
                        paragraph_depth += 1;
                    }
                    b"r" => in_run = true,
                    b"t" => in_text = true,
                    _ => {}
                },
                Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                    b"p" if paragraph_depth == 0 => paragraphs.push(String::new()),
                    b"tab" if in_run => current.push('\t'),
                    b"br" | b"cr" if in_run => current.push('\n'),
                    _ => {}
                },
                Ok(Event::Text(t)) if in_text => {
                    let text = t
                        .unescape()
                        .map_err(|e| ExtractionError::Docx(format!("bad text node: {}", e)))?;
                    current.push_str(&text);
                }
                Ok(Event::End(e)) => match e.local_name().as_ref() {
                    b"t" => in_text = false,
                    b"r" => in_run = false,
                    b"p" => {
                        paragraph_depth = paragraph_depth.saturating_sub(1);
                        if paragraph_depth == 0 {
                            paragraphs.push(std::mem::take(&mut current));
                        }
                    }
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(ExtractionError::Docx(format!(
                        "malformed XML at byte {}: {}",
                        reader.buffer_position(),
                        e
                    )))
                }
                _ => {}
            }
        }

        Ok(paragraphs)
    }
}

impl FormatExtractor for DocxExtractor {
    fn extract(&self, bytes: &[u8]) -> ExtractResult {
        let xml = Self::read_body(bytes)?;
        Ok(Self::paragraphs(&xml)?.join("\n"))
    }
}

pub struct PlainTextExtractor;

impl FormatExtractor for PlainTextExtractor {
    fn extract(&self, bytes: &[u8]) -> ExtractResult {
        let text = std::str::from_utf8(bytes).map_err(|e| ExtractionError::Encoding(e.to_string()))?;
        Ok(text.trim_start_matches('\u{feff}').to_string())
    }
}

/// Routes a document to the extractor for its declared format.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextExtractor;

impl TextExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, document: &Document) -> ExtractResult {
        let bytes = document.bytes();
        match document.format() {
            DocumentFormat::Pdf => PdfExtractor.extract(bytes),
            DocumentFormat::Docx => DocxExtractor.extract(bytes),
            DocumentFormat::Text => PlainTextExtractor.extract(bytes),
            DocumentFormat::Unsupported(ext) => Err(ExtractionError::UnsupportedFormat(ext.clone())),
        }
    }

    /// Fail-soft variant: any failure is logged and becomes an empty string.
    pub fn extract_or_empty(&self, document: &Document) -> String {
        match self.extract(document) {
            Ok(text) => {
                debug!(
                    "Extracted {} characters from {} ({})",
                    text.chars().count(),
                    document.display_name(),
                    document.format()
                );
                text
            }
            Err(e) => {
                warn!("Text extraction failed for {}: {}", document.display_name(), e);
                String::new()
            }
        }
    }
}
