//! PDF text extraction with per-page offsets

use crate::error::{Error, Result};
use crate::types::Page;

/// Extracted document text, split per page with contiguous offsets
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    /// Pages in order, offsets running through the whole document
    pub pages: Vec<Page>,
    /// Concatenated text of all pages
    pub full_text: String,
    /// Page count as declared by the document
    pub total_pages: u32,
}

/// PDF text extractor
pub struct PdfExtractor;

impl PdfExtractor {
    /// Extract page texts from PDF bytes
    ///
    /// Page character offsets are contiguous across the document, so a
    /// chunk's `start_char`/`end_char` index into `full_text`.
    pub fn extract(filename: &str, data: &[u8]) -> Result<ExtractedDocument> {
        let raw_pages = pdf_extract::extract_text_from_mem_by_pages(data)
            .map_err(|e| Error::extraction(filename, format!("Failed to extract text: {}", e)))?;

        let mut pages = Vec::with_capacity(raw_pages.len());
        let mut full_text = String::new();
        let mut offset = 0;

        for (i, raw) in raw_pages.iter().enumerate() {
            let text = clean_page_text(raw);
            let page = Page::new(i as u32 + 1, text.clone(), offset);
            offset = page.end_char;
            full_text.push_str(&text);
            pages.push(page);
        }

        if full_text.trim().is_empty() {
            return Err(Error::extraction(
                filename,
                "No text content could be extracted; the PDF may be image-based or encrypted",
            ));
        }

        let total_pages = declared_page_count(data).unwrap_or(pages.len() as u32);
        if total_pages as usize != pages.len() {
            tracing::warn!(
                "{}: extracted {} pages but document declares {}",
                filename,
                pages.len(),
                total_pages
            );
        }

        Ok(ExtractedDocument {
            pages,
            full_text,
            total_pages,
        })
    }
}

/// Page count from the PDF catalog
fn declared_page_count(data: &[u8]) -> Option<u32> {
    let doc = lopdf::Document::load_mem(data).ok()?;
    let count = doc.get_pages().len() as u32;
    (count > 0).then_some(count)
}

/// Normalize extracted page text
///
/// Trims each line, drops empty lines (so paragraph boundaries collapse to
/// single newlines), and replaces the typographic characters PDF fonts tend
/// to emit.
fn clean_page_text(text: &str) -> String {
    let text = text
        .replace('\0', "")
        .replace('\u{2018}', "'")
        .replace('\u{2019}', "'")
        .replace('\u{201C}', "\"")
        .replace('\u{201D}', "\"")
        .replace('\u{2013}', "-")
        .replace('\u{2014}', "--")
        .replace('\u{00A0}', " ")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl");

    text.lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
