//! Paragraph-aware text chunking with page and position tracking
//!
//! Pages are chunked independently. Within a page, paragraphs are accumulated
//! into a buffer up to the target chunk size; when the buffer would overflow
//! it is emitted and the next buffer is seeded with the trailing overlap of
//! the emitted text. The chunk index is a single counter across all pages of
//! a document, never reset per page.

use regex::Regex;

use crate::config::ChunkingConfig;
use crate::types::{Chunk, Page, ParagraphRange};

/// Separator inserted between paragraphs inside a chunk buffer
const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Paragraph chunker with configurable size and overlap
pub struct Chunker {
    /// Target chunk size in characters
    chunk_size: usize,
    /// Overlap carried into the next chunk
    overlap: usize,
    /// Paragraph boundary pattern (one or more consecutive newlines)
    blank_lines: Regex,
}

/// A paragraph located within a page
struct Paragraph<'a> {
    /// 1-based paragraph number within the page
    number: u32,
    /// Byte offset of the trimmed text within the page
    offset: usize,
    /// Trimmed paragraph text
    text: &'a str,
}

impl Chunker {
    /// Create a new chunker
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size,
            overlap,
            blank_lines: Regex::new(r"\n+").expect("invalid paragraph pattern"),
        }
    }

    /// Create a chunker from configuration
    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Chunk a sequence of pages into positionally annotated chunks
    ///
    /// Empty input yields an empty sequence. A page with no non-blank
    /// paragraphs contributes zero chunks.
    pub fn chunk(&self, pages: &[Page]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut next_index = 0u32;

        for page in pages {
            self.chunk_page(page, &mut next_index, &mut chunks);
        }

        chunks
    }

    /// Chunk a single page, appending to `out`
    fn chunk_page(&self, page: &Page, next_index: &mut u32, out: &mut Vec<Chunk>) {
        let paragraphs = self.split_paragraphs(&page.text);
        if paragraphs.is_empty() {
            return;
        }

        let mut buffer = String::new();
        // Document-absolute offset where the buffer text begins
        let mut buffer_start = page.start_char;
        let mut first_paragraph = 0u32;
        let mut last_paragraph = 0u32;

        for paragraph in &paragraphs {
            if !buffer.is_empty() && buffer.len() + paragraph.text.len() > self.chunk_size {
                let emitted_end = self.emit(
                    page,
                    &buffer,
                    buffer_start,
                    first_paragraph,
                    last_paragraph,
                    next_index,
                    out,
                );

                // Seed the next buffer with the trailing overlap of the
                // emitted text, or start fresh when the chunk was too short
                // to carry any.
                if buffer.len() > self.overlap {
                    let tail = overlap_tail(&buffer, self.overlap);
                    buffer_start = emitted_end
                        .saturating_sub(tail.len())
                        .max(page.start_char);
                    let mut seeded = String::with_capacity(
                        tail.len() + PARAGRAPH_SEPARATOR.len() + paragraph.text.len(),
                    );
                    seeded.push_str(tail);
                    seeded.push_str(PARAGRAPH_SEPARATOR);
                    seeded.push_str(paragraph.text);
                    buffer = seeded;
                } else {
                    buffer = paragraph.text.to_string();
                    buffer_start = page.start_char + paragraph.offset;
                }
                first_paragraph = paragraph.number;
            } else if buffer.is_empty() {
                buffer = paragraph.text.to_string();
                buffer_start = page.start_char + paragraph.offset;
                first_paragraph = paragraph.number;
            } else {
                buffer.push_str(PARAGRAPH_SEPARATOR);
                buffer.push_str(paragraph.text);
            }
            last_paragraph = paragraph.number;
        }

        if !buffer.trim().is_empty() {
            self.emit(
                page,
                &buffer,
                buffer_start,
                first_paragraph,
                last_paragraph,
                next_index,
                out,
            );
        }
    }

    /// Emit the buffer as a chunk, returning its document-absolute end offset
    #[allow(clippy::too_many_arguments)]
    fn emit(
        &self,
        page: &Page,
        buffer: &str,
        buffer_start: usize,
        first_paragraph: u32,
        last_paragraph: u32,
        next_index: &mut u32,
        out: &mut Vec<Chunk>,
    ) -> usize {
        let text = buffer.trim();
        let start_char = buffer_start.max(page.start_char);
        // Offsets stay within the owning page even when overlap accounting
        // drifts past trimmed whitespace.
        let end_char = (start_char + text.len()).min(page.end_char).max(start_char);

        out.push(Chunk {
            chunk_index: *next_index,
            text: text.to_string(),
            page: page.page_number,
            paragraph_number: first_paragraph,
            paragraph_range: if first_paragraph == last_paragraph {
                ParagraphRange::single(first_paragraph)
            } else {
                ParagraphRange::new(first_paragraph, last_paragraph)
            },
            start_char,
            end_char,
            chunk_length: text.len(),
        });
        *next_index += 1;

        end_char
    }

    /// Split page text into trimmed, non-empty paragraphs with offsets
    fn split_paragraphs<'a>(&self, text: &'a str) -> Vec<Paragraph<'a>> {
        let mut paragraphs = Vec::new();
        let mut number = 0u32;
        let mut cursor = 0usize;

        for separator in self.blank_lines.find_iter(text) {
            push_paragraph(&text[cursor..separator.start()], cursor, &mut number, &mut paragraphs);
            cursor = separator.end();
        }
        push_paragraph(&text[cursor..], cursor, &mut number, &mut paragraphs);

        paragraphs
    }
}

/// Append a paragraph if it is non-empty after trimming
fn push_paragraph<'a>(
    segment: &'a str,
    segment_offset: usize,
    number: &mut u32,
    out: &mut Vec<Paragraph<'a>>,
) {
    let trimmed = segment.trim();
    if trimmed.is_empty() {
        return;
    }
    let leading = segment.len() - segment.trim_start().len();
    *number += 1;
    out.push(Paragraph {
        number: *number,
        offset: segment_offset + leading,
        text: trimmed,
    });
}

/// Trailing `overlap` bytes of `text`, nudged to a character boundary
fn overlap_tail(text: &str, overlap: usize) -> &str {
    let mut start = text.len().saturating_sub(overlap);
    while start > 0 && !text.is_char_boundary(start) {
        start -= 1;
    }
    &text[start..]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages_from(texts: &[&str]) -> Vec<Page> {
        let mut offset = 0;
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let page = Page::new(i as u32 + 1, *text, offset);
                offset = page.end_char;
                page
            })
            .collect()
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        let chunker = Chunker::new(1000, 200);
        assert!(chunker.chunk(&[]).is_empty());
    }

    #[test]
    fn blank_page_contributes_zero_chunks() {
        let chunker = Chunker::new(1000, 200);
        let pages = pages_from(&["\n\n   \n\n"]);
        assert!(chunker.chunk(&pages).is_empty());
    }

    #[test]
    fn two_short_paragraphs_become_one_chunk() {
        let chunker = Chunker::new(1000, 200);
        let pages = pages_from(&["Intro.\n\nBody text here."]);
        let chunks = chunker.chunk(&pages);

        assert_eq!(chunks.len(), 1);
        let chunk = &chunks[0];
        assert_eq!(chunk.chunk_index, 0);
        assert_eq!(chunk.page, 1);
        assert_eq!(chunk.paragraph_number, 1);
        assert_eq!(chunk.paragraph_range.to_string(), "1-2");
        assert_eq!(chunk.text, "Intro.\n\nBody text here.");
        assert_eq!(chunk.chunk_length, chunk.text.len());
    }

    #[test]
    fn oversized_paragraph_stands_alone() {
        let chunker = Chunker::new(100, 20);
        let big = "x".repeat(500);
        let text = format!("{}\n\nshort tail", big);
        let pages = pages_from(&[text.as_str()]);
        let chunks = chunker.chunk(&pages);

        assert_eq!(chunks[0].text, big);
        assert_eq!(chunks[0].paragraph_range.to_string(), "1");
        assert!(chunks.len() >= 2);
    }

    #[test]
    fn chunk_indices_increase_across_pages() {
        let chunker = Chunker::new(50, 10);
        let pages = pages_from(&[
            "First paragraph of page one.\n\nSecond paragraph of page one.",
            "First paragraph of page two.\n\nSecond paragraph of page two.",
        ]);
        let chunks = chunker.chunk(&pages);

        assert!(chunks.len() >= 2);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index, i as u32);
        }
        // Indices never reset at the page boundary
        let page_two_first = chunks.iter().find(|c| c.page == 2).unwrap();
        assert!(page_two_first.chunk_index > 0);
    }

    #[test]
    fn overlap_is_carried_into_the_next_chunk() {
        let chunker = Chunker::new(60, 20);
        let text = format!("{}\n\n{}", "a".repeat(50), "b".repeat(50));
        let pages = pages_from(&[text.as_str()]);
        let chunks = chunker.chunk(&pages);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "a".repeat(50));
        // Second chunk starts with the 20-char tail of the first
        assert!(chunks[1].text.starts_with(&"a".repeat(20)));
        assert!(chunks[1].text.ends_with(&"b".repeat(50)));
        assert_eq!(chunks[1].start_char, chunks[0].end_char - 20);
        assert_eq!(chunks[1].paragraph_range.to_string(), "2");
    }

    #[test]
    fn short_chunks_do_not_carry_overlap() {
        // Emitted chunk shorter than the overlap starts the next buffer fresh
        let chunker = Chunker::new(20, 100);
        let pages = pages_from(&["tiny one\n\nanother paragraph here"]);
        let chunks = chunker.chunk(&pages);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "tiny one");
        assert_eq!(chunks[1].text, "another paragraph here");
    }

    #[test]
    fn chunk_offsets_stay_within_page_bounds() {
        let chunker = Chunker::new(40, 10);
        let pages = pages_from(&[
            "Alpha paragraph text.\n\nBeta paragraph text.\n\nGamma paragraph text.",
            "Delta on page two.\n\nEpsilon on page two.",
        ]);
        let chunks = chunker.chunk(&pages);

        for chunk in &chunks {
            let page = &pages[chunk.page as usize - 1];
            assert!(chunk.start_char <= chunk.end_char);
            assert!(chunk.start_char >= page.start_char);
            assert!(chunk.end_char <= page.end_char);
        }
    }

    #[test]
    fn every_paragraph_appears_in_some_chunk() {
        let chunker = Chunker::new(80, 20);
        let paragraphs = [
            "The quick brown fox jumps over the lazy dog.",
            "Pack my box with five dozen liquor jugs.",
            "How vexingly quick daft zebras jump.",
            "Sphinx of black quartz, judge my vow.",
        ];
        let text = paragraphs.join("\n\n");
        let pages = pages_from(&[text.as_str()]);
        let chunks = chunker.chunk(&pages);

        let all = chunks
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        for paragraph in &paragraphs {
            assert!(all.contains(paragraph), "missing paragraph: {}", paragraph);
        }
    }
}
