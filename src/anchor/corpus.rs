//! Normalized search corpus with raw-offset provenance.
//!
//! The filing HTML is scanned once into its text-bearing segments, entities
//! are decoded, and whitespace runs collapse to single spaces. Every byte of
//! the normalized text remembers the raw byte range it came from, so a match
//! in the corpus maps straight back to splice points in the original
//! document. Element boundaries contribute a zero-width separator space:
//! zero-width bytes force fragment breaks so markers never cover markup.

use crate::error::{AnalysisError, Result};
use std::borrow::Cow;

/// Elements whose contents are raw text, never rendered filing prose.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "title", "textarea"];

pub(crate) struct Corpus {
    text: String,
    raw_start: Vec<usize>,
    raw_end: Vec<usize>,
}

impl Corpus {
    /// Builds the corpus in one pass over the document. The only failure is a
    /// document the scanner cannot finish (EOF inside a tag, comment, or
    /// raw-text element).
    pub(crate) fn build(html: &str) -> Result<Self> {
        let segments = scan_text_segments(html).map_err(AnalysisError::UnparsableDocument)?;

        let mut corpus = Corpus {
            text: String::new(),
            raw_start: Vec::new(),
            raw_end: Vec::new(),
        };
        let mut ws_range: Option<(usize, usize)> = None;
        let mut tag_break = false;

        for (seg_start, seg_end) in segments {
            let seg = &html[seg_start..seg_end];
            let mut j = 0;
            while j < seg.len() {
                let rest = &seg[j..];
                let (piece, piece_len): (Cow<'_, str>, usize) = if rest.starts_with('&') {
                    match decode_entity(rest) {
                        Some((decoded, len)) => (Cow::Owned(decoded), len),
                        None => (Cow::Borrowed("&"), 1),
                    }
                } else {
                    let Some(ch) = rest.chars().next() else { break };
                    (Cow::Borrowed(&rest[..ch.len_utf8()]), ch.len_utf8())
                };

                let raw_a = seg_start + j;
                let raw_b = raw_a + piece_len;
                if piece.chars().all(char::is_whitespace) {
                    ws_range = Some(match ws_range {
                        Some((a, _)) => (a, raw_b),
                        None => (raw_a, raw_b),
                    });
                } else {
                    corpus.push_separator(&mut ws_range, &mut tag_break, raw_a);
                    corpus.push_piece(&piece, raw_a, raw_b);
                }
                j += piece_len;
            }
            // Whitespace never bridges an element boundary; the boundary
            // itself becomes the separator.
            ws_range = None;
            tag_break = true;
        }

        Ok(corpus)
    }

    fn push_separator(
        &mut self,
        ws_range: &mut Option<(usize, usize)>,
        tag_break: &mut bool,
        next_raw: usize,
    ) {
        if !self.text.is_empty() {
            if *tag_break {
                self.text.push(' ');
                self.raw_start.push(next_raw);
                self.raw_end.push(next_raw);
            } else if let Some((a, b)) = *ws_range {
                self.text.push(' ');
                self.raw_start.push(a);
                self.raw_end.push(b);
            }
        }
        *ws_range = None;
        *tag_break = false;
    }

    fn push_piece(&mut self, piece: &str, raw_a: usize, raw_b: usize) {
        for _ in 0..piece.len() {
            self.raw_start.push(raw_a);
            self.raw_end.push(raw_b);
        }
        self.text.push_str(piece);
    }

    pub(crate) fn text(&self) -> &str {
        &self.text
    }

    /// First occurrence of `needle` at or after corpus byte `from`.
    pub(crate) fn find_from(&self, needle: &str, from: usize) -> Option<(usize, usize)> {
        if from > self.text.len() {
            return None;
        }
        self.text[from..]
            .find(needle)
            .map(|pos| (from + pos, from + pos + needle.len()))
    }

    /// Maps a corpus byte span back to raw byte ranges in the original HTML.
    /// A span crossing an element boundary yields one range per text run.
    pub(crate) fn fragments(&self, start: usize, end: usize) -> Vec<(usize, usize)> {
        let mut frags: Vec<(usize, usize)> = Vec::new();
        let mut cur: Option<(usize, usize)> = None;

        for i in start..end {
            let (a, b) = (self.raw_start[i], self.raw_end[i]);
            if a == b {
                // Zero-width separator: an element boundary sits here.
                if let Some(range) = cur.take() {
                    frags.push(range);
                }
                continue;
            }
            match cur {
                None => cur = Some((a, b)),
                Some((ca, cb)) => {
                    if a <= cb {
                        cur = Some((ca, cb.max(b)));
                    } else {
                        frags.push((ca, cb));
                        cur = Some((a, b));
                    }
                }
            }
        }
        if let Some(range) = cur {
            frags.push(range);
        }
        frags
    }
}

/// Normalizes a candidate quote the same way the corpus is normalized:
/// entities decoded, whitespace runs collapsed, ends trimmed.
pub(crate) fn normalize_text(text: &str) -> String {
    let decoded = html_escape::decode_html_entities(text);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decodes one leading `&...;` entity token. Returns `None` when the token is
/// not a recognized entity, in which case the `&` is literal text.
fn decode_entity(rest: &str) -> Option<(String, usize)> {
    // Byte-wise search: slicing a fixed window could split a multi-byte char.
    let semi = rest
        .as_bytes()
        .iter()
        .take(32)
        .position(|&b| b == b';')?;
    if semi < 2 {
        return None;
    }
    let token = &rest[..=semi];
    if !token[1..semi]
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '#')
    {
        return None;
    }
    let decoded = html_escape::decode_html_entities(token);
    if decoded == token {
        None
    } else {
        Some((decoded.into_owned(), semi + 1))
    }
}

/// Scans the document into text-bearing raw byte ranges, skipping tags,
/// comments, CDATA sections, and raw-text element contents.
fn scan_text_segments(html: &str) -> std::result::Result<Vec<(usize, usize)>, String> {
    let bytes = html.as_bytes();
    let lower = html.to_ascii_lowercase();
    let mut segments = Vec::new();
    let mut text_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'<' {
            i += 1;
            continue;
        }
        // A `<` not opening markup is literal text (e.g. "p < 0.05").
        let next = bytes.get(i + 1).copied();
        let opens_markup =
            matches!(next, Some(c) if c.is_ascii_alphabetic() || matches!(c, b'/' | b'!' | b'?'));
        if !opens_markup {
            i += 1;
            continue;
        }

        if i > text_start {
            segments.push((text_start, i));
        }

        if html[i..].starts_with("<!--") {
            match html[i + 4..].find("-->") {
                Some(pos) => i = i + 4 + pos + 3,
                None => return Err("unterminated comment".to_string()),
            }
        } else if html[i..].starts_with("<![CDATA[") {
            match html[i + 9..].find("]]>") {
                Some(pos) => i = i + 9 + pos + 3,
                None => return Err("unterminated CDATA section".to_string()),
            }
        } else {
            let tag = scan_tag(html, i)?;
            i = tag.end;
            if !tag.self_closing && RAW_TEXT_ELEMENTS.contains(&tag.name.as_str()) {
                i = skip_raw_text(html, &lower, i, &tag.name)?;
            }
        }
        text_start = i;
    }

    if bytes.len() > text_start {
        segments.push((text_start, bytes.len()));
    }
    Ok(segments)
}

struct ScannedTag {
    name: String,
    end: usize,
    self_closing: bool,
}

/// Scans one tag starting at the `<` at `start`. Quoted attribute values may
/// contain `>` without closing the tag.
fn scan_tag(html: &str, start: usize) -> std::result::Result<ScannedTag, String> {
    let bytes = html.as_bytes();
    let mut i = start + 1;
    if bytes.get(i) == Some(&b'/') {
        i += 1;
    }
    let name_start = i;
    while i < bytes.len() && bytes[i].is_ascii_alphanumeric() {
        i += 1;
    }
    let name = html[name_start..i].to_ascii_lowercase();

    let mut quote: Option<u8> = None;
    let mut last_meaningful = 0u8;
    while i < bytes.len() {
        let c = bytes[i];
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                b'"' | b'\'' => quote = Some(c),
                b'>' => {
                    return Ok(ScannedTag {
                        name,
                        end: i + 1,
                        self_closing: last_meaningful == b'/',
                    });
                }
                _ => {
                    if !c.is_ascii_whitespace() {
                        last_meaningful = c;
                    }
                }
            },
        }
        i += 1;
    }
    Err(format!("unterminated tag at byte {}", start))
}

/// Skips the raw-text contents and closing tag of `<script>`-like elements.
fn skip_raw_text(
    html: &str,
    lower: &str,
    from: usize,
    name: &str,
) -> std::result::Result<usize, String> {
    let close = format!("</{}", name);
    let mut search_from = from;
    loop {
        let Some(rel) = lower[search_from..].find(&close) else {
            return Err(format!("unterminated <{}> element", name));
        };
        let at = search_from + rel;
        let after = at + close.len();
        let boundary = html.as_bytes().get(after).copied();
        let is_close = matches!(boundary, None | Some(b'>') | Some(b'/'))
            || matches!(boundary, Some(c) if c.is_ascii_whitespace());
        if is_close {
            match html[after..].find('>') {
                Some(pos) => return Ok(after + pos + 1),
                None => return Err(format!("unterminated </{}> tag", name)),
            }
        }
        search_from = after;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corpus_strips_tags_and_collapses_whitespace() {
        let corpus =
            Corpus::build("<html><body><p>Revenue   increased\n 2%.</p></body></html>").unwrap();
        assert_eq!(corpus.text(), "Revenue increased 2%.");
    }

    #[test]
    fn test_corpus_decodes_entities() {
        let corpus = Corpus::build("<p>Johnson &amp; Johnson&nbsp;reported&#36;5</p>").unwrap();
        assert_eq!(corpus.text(), "Johnson & Johnson reported$5");
    }

    #[test]
    fn test_script_and_comment_contents_are_skipped() {
        let html = "<p>Before.</p><script>var x = '<p>nope</p>';</script><!-- hidden -->\
                    <style>p { color: red }</style><p>After.</p>";
        let corpus = Corpus::build(html).unwrap();
        assert_eq!(corpus.text(), "Before. After.");
    }

    #[test]
    fn test_literal_less_than_is_text() {
        let corpus = Corpus::build("<p>p < 0.05 is significant</p>").unwrap();
        assert_eq!(corpus.text(), "p < 0.05 is significant");
    }

    #[test]
    fn test_attribute_quoted_gt_does_not_close_tag() {
        let corpus = Corpus::build(r#"<p title="a > b">text</p>"#).unwrap();
        assert_eq!(corpus.text(), "text");
    }

    #[test]
    fn test_unterminated_tag_is_unparsable() {
        assert!(Corpus::build("<p>text<div class=").is_err());
        assert!(Corpus::build("<p>text<!-- no end").is_err());
        assert!(Corpus::build("<script>never closed").is_err());
    }

    #[test]
    fn test_fragments_split_at_element_boundaries() {
        let html = "<p>Results are exposed to <i>currency</i> swings.</p>";
        let corpus = Corpus::build(html).unwrap();
        let (start, end) = corpus
            .find_from("exposed to currency swings", 0)
            .expect("phrase should match across the inline tag");
        let frags = corpus.fragments(start, end);
        assert_eq!(frags.len(), 3);
        assert_eq!(&html[frags[0].0..frags[0].1], "exposed to");
        assert_eq!(&html[frags[1].0..frags[1].1], "currency");
        assert_eq!(&html[frags[2].0..frags[2].1], "swings");
    }

    #[test]
    fn test_fragment_of_single_run_is_contiguous() {
        let html = "<p>Revenue increased 2% to $7.8 billion.</p>";
        let corpus = Corpus::build(html).unwrap();
        let (start, end) = corpus.find_from("increased 2% to $7.8", 0).unwrap();
        let frags = corpus.fragments(start, end);
        assert_eq!(frags.len(), 1);
        assert_eq!(&html[frags[0].0..frags[0].1], "increased 2% to $7.8");
    }

    #[test]
    fn test_normalize_text_matches_corpus_conventions() {
        assert_eq!(
            normalize_text("  Johnson &amp;   Johnson\t reported "),
            "Johnson & Johnson reported"
        );
    }

    #[test]
    fn test_entity_span_maps_to_whole_entity() {
        let html = "<p>Cost &amp; margin</p>";
        let corpus = Corpus::build(html).unwrap();
        let (start, end) = corpus.find_from("Cost & margin", 0).unwrap();
        let frags = corpus.fragments(start, end);
        assert_eq!(frags, vec![(3, 20)]);
        assert_eq!(&html[3..20], "Cost &amp; margin");
    }
}
