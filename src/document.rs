//! Plain-text extraction from filing HTML.
//!
//! Used to assemble the narrative text handed to the LLM, and by tests to
//! check that annotation leaves the document's visible text intact.

use scraper::{ElementRef, Html, Selector};

fn text_content(elem: ElementRef<'_>) -> String {
    elem.text().collect::<Vec<_>>().join(" ")
}

fn compact_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whole-document visible text, whitespace-compacted. Head content (title,
/// styles) is excluded when the document has a body.
pub fn document_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let body = Selector::parse("body")
        .ok()
        .and_then(|sel| document.select(&sel).next());
    match body {
        Some(elem) => compact_ws(&text_content(elem)),
        None => compact_ws(&text_content(document.root_element())),
    }
}

/// Paragraph-level text blocks, for chunked prompt assembly. Falls back to
/// the whole document when the filing has no block structure.
pub fn document_blocks(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(block_sel) = Selector::parse("p, li, td, h1, h2, h3, h4") else {
        return vec![document_text(html)];
    };

    let mut blocks: Vec<String> = Vec::new();
    for elem in document.select(&block_sel) {
        // Skip containers whose block children will be visited on their own.
        if elem.select(&block_sel).next().is_some() {
            continue;
        }
        let text = compact_ws(&text_content(elem));
        if !text.is_empty() {
            blocks.push(text);
        }
    }

    if blocks.is_empty() {
        let whole = document_text(html);
        if whole.is_empty() {
            Vec::new()
        } else {
            vec![whole]
        }
    } else {
        blocks
    }
}
