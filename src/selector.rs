//! CSS-like selector parsing and matching
//!
//! Supports the subset the definition surface needs: `tag`, `#id`, `.class`,
//! `[attr]`, `[attr=value]`, and conjunctions of those (`div[chrono]`,
//! `input.phone`). Parsed once per definition at bootstrap.

use crate::dom::{Document, NodeId};
use crate::error::GraftError;

/// A parsed selector. All listed parts must match (conjunction).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, Option<String>)>,
}

impl Selector {
    /// Parse a selector string.
    pub fn parse(input: &str) -> Result<Self, GraftError> {
        let fail = |details: &str| GraftError::SelectorParse {
            selector: input.to_string(),
            details: details.to_string(),
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(fail("selector is empty"));
        }
        if trimmed.contains(char::is_whitespace) {
            return Err(fail("descendant combinators are not supported"));
        }

        let mut selector = Selector::default();
        let mut rest = trimmed;

        // leading bare tag name
        let tag_len = rest
            .find(['#', '.', '['])
            .unwrap_or(rest.len());
        if tag_len > 0 {
            selector.tag = Some(rest[..tag_len].to_ascii_lowercase());
            rest = &rest[tag_len..];
        }

        while !rest.is_empty() {
            let (head, tail) = rest.split_at(1);
            match head {
                "#" | "." => {
                    let len = tail.find(['#', '.', '[']).unwrap_or(tail.len());
                    if len == 0 {
                        return Err(fail("empty id or class part"));
                    }
                    let name = tail[..len].to_string();
                    if head == "#" {
                        selector.id = Some(name);
                    } else {
                        selector.classes.push(name);
                    }
                    rest = &tail[len..];
                }
                "[" => {
                    let close = tail.find(']').ok_or_else(|| fail("missing ']'"))?;
                    let body = &tail[..close];
                    if body.is_empty() {
                        return Err(fail("empty attribute part"));
                    }
                    match body.split_once('=') {
                        Some((name, value)) => {
                            let value = value.trim_matches(['"', '\'']);
                            selector
                                .attrs
                                .push((name.to_string(), Some(value.to_string())));
                        }
                        None => selector.attrs.push((body.to_string(), None)),
                    }
                    rest = &tail[close + 1..];
                }
                other => {
                    return Err(fail(&format!("unexpected '{other}'")));
                }
            }
        }

        Ok(selector)
    }

    /// Whether `node` satisfies every part of this selector.
    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        let Some(tag) = doc.tag(node) else {
            return false;
        };
        if let Some(want) = &self.tag {
            if want != tag {
                return false;
            }
        }
        if let Some(want) = &self.id {
            if doc.attribute(node, "id") != Some(want.as_str()) {
                return false;
            }
        }
        if !self.classes.is_empty() {
            let class_attr = doc.attribute(node, "class").unwrap_or("");
            let classes: Vec<&str> = class_attr.split_whitespace().collect();
            if !self.classes.iter().all(|c| classes.contains(&c.as_str())) {
                return false;
            }
        }
        for (name, expected) in &self.attrs {
            match (doc.attribute(node, name), expected) {
                (None, _) => return false,
                (Some(_), None) => {}
                (Some(actual), Some(want)) => {
                    if actual != want {
                        return false;
                    }
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_match(markup: &str, selector: &str) -> Option<String> {
        let doc = Document::from_html(markup).unwrap();
        let sel = Selector::parse(selector).unwrap();
        doc.query_selector_all(&sel)
            .first()
            .and_then(|n| doc.tag(*n))
            .map(str::to_string)
    }

    #[test]
    fn attr_presence_selector() {
        let html = r#"<input phone-number><input credit-card>"#;
        assert_eq!(first_match(html, "[phone-number]"), Some("input".into()));
        assert_eq!(first_match(html, "[missing]"), None);
    }

    #[test]
    fn tag_with_attr_conjunction() {
        let html = r#"<span chrono></span><div chrono></div>"#;
        let doc = Document::from_html(html).unwrap();
        let sel = Selector::parse("div[chrono]").unwrap();
        let matches = doc.query_selector_all(&sel);
        assert_eq!(matches.len(), 1);
        assert_eq!(doc.tag(matches[0]), Some("div"));
    }

    #[test]
    fn class_and_id_selectors() {
        let html = r#"<p class="phone big"></p><p id="main"></p>"#;
        assert_eq!(first_match(html, ".phone"), Some("p".into()));
        assert_eq!(first_match(html, "#main"), Some("p".into()));
        assert_eq!(first_match(html, ".other"), None);
    }

    #[test]
    fn attr_value_selector() {
        let html = r#"<div role="tab"></div><div role="panel"></div>"#;
        let doc = Document::from_html(html).unwrap();
        let sel = Selector::parse("[role=tab]").unwrap();
        assert_eq!(doc.query_selector_all(&sel).len(), 1);
    }

    #[test]
    fn custom_element_tag_selector() {
        let html = r#"<counter></counter><div></div>"#;
        assert_eq!(first_match(html, "counter"), Some("counter".into()));
    }

    #[test]
    fn parse_errors() {
        assert!(Selector::parse("").is_err());
        assert!(Selector::parse("div p").is_err());
        assert!(Selector::parse("[open").is_err());
        assert!(Selector::parse("div.").is_err());
    }
}
