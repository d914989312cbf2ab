//! Minimal, tolerant HTML fragment parser
//!
//! Single forward pass over the markup, building nodes directly into a
//! [`Document`] arena. The dialect is deliberately small: tags, quoted and
//! bare attributes, self-closing tags, comments, text. Attribute *names* may
//! contain brackets (`[initial-value]`) because bracketed attributes are part
//! of the input contract. No entity decoding.
//!
//! The parser recovers from stray closing tags; the only hard error is an
//! unterminated quoted attribute value.

use crate::dom::{Document, NodeId, VOID_TAGS};
use crate::error::GraftError;

/// Parse `markup` and append the resulting nodes under `parent`.
pub fn parse_fragment(doc: &mut Document, parent: NodeId, markup: &str) -> Result<(), GraftError> {
    let bytes = markup.as_bytes();
    let mut pos = 0;
    // open element stack; the fragment root is the permanent bottom entry
    let mut stack: Vec<(NodeId, String)> = vec![(parent, String::new())];

    while pos < bytes.len() {
        if bytes[pos] == b'<' {
            if markup[pos..].starts_with("<!--") {
                pos = match markup[pos..].find("-->") {
                    Some(end) => pos + end + 3,
                    None => bytes.len(),
                };
            } else if bytes.get(pos + 1) == Some(&b'/') {
                pos = parse_closing_tag(markup, pos, &mut stack);
            } else {
                pos = parse_opening_tag(doc, markup, pos, &mut stack)?;
            }
        } else {
            let end = markup[pos..]
                .find('<')
                .map(|i| pos + i)
                .unwrap_or(bytes.len());
            let text = &markup[pos..end];
            if !text.trim().is_empty() {
                let node = doc.create_text(text);
                let top = stack.last().expect("stack never empty").0;
                doc.append_child(top, node);
            }
            pos = end;
        }
    }
    Ok(())
}

fn is_name_byte(b: u8) -> bool {
    !matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'=' | b'>' | b'/' | b'"' | b'\'' | b'<')
}

fn skip_whitespace(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }
    pos
}

/// Parse `</tag>`, popping the stack down to the matching open element.
/// A closing tag with no matching open element is ignored.
fn parse_closing_tag(markup: &str, pos: usize, stack: &mut Vec<(NodeId, String)>) -> usize {
    let bytes = markup.as_bytes();
    let name_start = pos + 2;
    let mut cursor = name_start;
    while cursor < bytes.len() && is_name_byte(bytes[cursor]) {
        cursor += 1;
    }
    let name = markup[name_start..cursor].to_ascii_lowercase();
    let end = markup[cursor..]
        .find('>')
        .map(|i| cursor + i + 1)
        .unwrap_or(bytes.len());

    // stack[0] is the fragment root and never pops
    if let Some(open_at) = stack.iter().skip(1).rposition(|(_, tag)| *tag == name) {
        stack.truncate(open_at + 1);
    }
    end
}

fn parse_opening_tag(
    doc: &mut Document,
    markup: &str,
    pos: usize,
    stack: &mut Vec<(NodeId, String)>,
) -> Result<usize, GraftError> {
    let bytes = markup.as_bytes();
    let name_start = pos + 1;
    let mut cursor = name_start;
    while cursor < bytes.len() && is_name_byte(bytes[cursor]) && bytes[cursor] != b'[' {
        cursor += 1;
    }
    let tag = markup[name_start..cursor].to_ascii_lowercase();
    if tag.is_empty() {
        // lone '<' in text; treat the character as literal and move on
        let node = doc.create_text("<");
        let top = stack.last().expect("stack never empty").0;
        doc.append_child(top, node);
        return Ok(pos + 1);
    }

    let element = doc.create_element(&tag);
    let mut self_closing = false;

    loop {
        cursor = skip_whitespace(bytes, cursor);
        if cursor >= bytes.len() {
            break;
        }
        match bytes[cursor] {
            b'>' => {
                cursor += 1;
                break;
            }
            b'/' => {
                self_closing = true;
                cursor += 1;
            }
            _ => {
                let (attr_cursor, name, value) = parse_attribute(markup, cursor)?;
                cursor = attr_cursor;
                doc.set_attribute(element, name, value);
            }
        }
    }

    let top = stack.last().expect("stack never empty").0;
    doc.append_child(top, element);
    if !self_closing && !VOID_TAGS.contains(&tag.as_str()) {
        stack.push((element, tag));
    }
    Ok(cursor)
}

/// Parse one `name`, `name=value` or `name="value"` attribute.
fn parse_attribute(markup: &str, pos: usize) -> Result<(usize, String, String), GraftError> {
    let bytes = markup.as_bytes();
    let mut cursor = pos;
    // bracketed names like [initial-value] are legal here
    while cursor < bytes.len() && (is_name_byte(bytes[cursor]) || bytes[cursor] == b'[') {
        if bytes[cursor] == b'[' {
            match markup[cursor..].find(']') {
                Some(close) => cursor += close + 1,
                None => {
                    return Err(GraftError::HtmlParse {
                        position: cursor,
                        details: "unterminated '[' in attribute name".to_string(),
                    })
                }
            }
        } else {
            cursor += 1;
        }
    }
    let name = markup[pos..cursor].to_string();

    cursor = skip_whitespace(bytes, cursor);
    if bytes.get(cursor) != Some(&b'=') {
        return Ok((cursor, name, String::new()));
    }
    cursor = skip_whitespace(bytes, cursor + 1);

    match bytes.get(cursor) {
        Some(&quote @ (b'"' | b'\'')) => {
            let value_start = cursor + 1;
            match markup[value_start..].find(quote as char) {
                Some(len) => Ok((
                    value_start + len + 1,
                    name,
                    markup[value_start..value_start + len].to_string(),
                )),
                None => Err(GraftError::HtmlParse {
                    position: cursor,
                    details: format!("unterminated quoted value for attribute '{name}'"),
                }),
            }
        }
        _ => {
            let value_start = cursor;
            while cursor < bytes.len() && is_name_byte(bytes[cursor]) {
                cursor += 1;
            }
            Ok((cursor, name, markup[value_start..cursor].to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(markup: &str) -> String {
        let doc = Document::from_html(markup).unwrap();
        doc.inner_html(doc.root())
    }

    #[test]
    fn nested_elements() {
        assert_eq!(
            roundtrip("<div><span>a</span><span>b</span></div>"),
            "<div><span>a</span><span>b</span></div>"
        );
    }

    #[test]
    fn attributes_quoted_bare_and_flag() {
        let doc = Document::from_html(r#"<input phone-number with-spaces="false" tabindex=3>"#)
            .unwrap();
        let input = doc.children(doc.root())[0];
        assert!(doc.has_attribute(input, "phone-number"));
        assert_eq!(doc.attribute(input, "with-spaces"), Some("false"));
        assert_eq!(doc.attribute(input, "tabindex"), Some("3"));
    }

    #[test]
    fn bracketed_attribute_names() {
        let doc = Document::from_html(r#"<counter [initial-value]="10" step="2"></counter>"#)
            .unwrap();
        let counter = doc.children(doc.root())[0];
        assert_eq!(doc.attribute(counter, "[initial-value]"), Some("10"));
        assert_eq!(doc.attribute(counter, "step"), Some("2"));
    }

    #[test]
    fn void_and_self_closing_tags_take_no_children() {
        let doc = Document::from_html("<input><span>after</span><br/>tail").unwrap();
        let root = doc.root();
        assert_eq!(doc.children(root).len(), 4);
        assert_eq!(doc.tag(doc.children(root)[1]), Some("span"));
    }

    #[test]
    fn stray_closing_tag_is_ignored() {
        assert_eq!(roundtrip("</b><i>x</i>"), "<i>x</i>");
    }

    #[test]
    fn comment_is_skipped() {
        assert_eq!(roundtrip("<!-- note --><p>x</p>"), "<p>x</p>");
    }

    #[test]
    fn unterminated_quote_is_an_error() {
        let err = Document::from_html(r#"<div class="oops>"#).unwrap_err();
        assert!(err.to_string().contains("unterminated"));
    }

    #[test]
    fn whitespace_only_text_is_dropped() {
        assert_eq!(
            roundtrip("<div>\n  <b>x</b>\n</div>"),
            "<div><b>x</b></div>"
        );
    }
}
