//! Template compiler: interpolation + event-binding extraction
//!
//! Two independent textual passes. Interpolation runs first and substitutes
//! `{{ property }}` markers; event extraction then runs over the interpolated
//! output, rewriting `(event)="method"` fragments in opening tags into stable
//! generated `id` attributes and returning one descriptor per fragment.
//!
//! Compiled markup never exposes the event-binding syntax; only the generated
//! ids remain, used once per render to attach real listeners.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::warn;

use crate::error::GraftError;
use crate::value;

/// Listener to attach after the rendered markup is in the document.
/// Ephemeral: consumed right after rendering, then discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventBinding {
    pub element_id: String,
    pub event_name: String,
    pub method_name: String,
}

/// Generator for `event-listener-<N>` ids.
///
/// Monotonic across render passes, so an id is unique for the whole life of
/// an [`crate::App`], not just within one pass.
#[derive(Debug, Default)]
pub struct IdGenerator {
    next: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> String {
        self.next += 1;
        format!("event-listener-{}", self.next)
    }
}

/// Replace every `{{ property }}` marker with the instance's value for that
/// property. Whitespace inside the braces is trimmed; only simple property
/// names are accepted, not full expressions.
///
/// A property the instance does not expose renders as the empty string with
/// a warning. Unbalanced markers are a [`GraftError::TemplateParse`].
pub fn interpolate(
    template: &str,
    lookup: &dyn Fn(&str) -> Option<Value>,
) -> Result<String, GraftError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    let mut offset = 0;

    loop {
        let Some(open) = rest.find("{{") else {
            if let Some(stray) = rest.find("}}") {
                return Err(GraftError::TemplateParse {
                    position: offset + stray,
                    details: "'}}' without a matching '{{'".to_string(),
                });
            }
            out.push_str(rest);
            return Ok(out);
        };

        let literal = &rest[..open];
        if let Some(stray) = literal.find("}}") {
            return Err(GraftError::TemplateParse {
                position: offset + stray,
                details: "'}}' without a matching '{{'".to_string(),
            });
        }
        out.push_str(literal);

        let marker_start = open + 2;
        let Some(close) = rest[marker_start..].find("}}") else {
            return Err(GraftError::TemplateParse {
                position: offset + open,
                details: "'{{' without a matching '}}'".to_string(),
            });
        };
        let name = rest[marker_start..marker_start + close].trim();
        match lookup(name) {
            Some(v) => out.push_str(&value::display(&v)),
            None => {
                warn!(property = name, "interpolation of unknown property renders empty");
            }
        }

        let consumed = marker_start + close + 2;
        offset += consumed;
        rest = &rest[consumed..];
    }
}

// Opening tags; the event fragments themselves; and any fragment-looking
// attempt, used to detect malformed bindings the strict pattern missed.
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[A-Za-z][^>]*>").expect("static regex"));
static EVENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\(([A-Za-z][\w-]*)\)="([^"]+)""#).expect("static regex"));
static ATTEMPT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\([A-Za-z][\w-]*\)=").expect("static regex"));
static TAG_END_WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+(/?>)$").expect("static regex"));

/// Rewrite every opening tag containing `(event)="method"` fragments.
///
/// Each such tag gets one fresh id: the first fragment becomes
/// `id="event-listener-<N>"`, the remaining fragments are stripped (all
/// listeners of the tag share the generated id). Returns the rewritten
/// template plus one descriptor per fragment found.
pub fn extract_event_bindings(
    template: &str,
    ids: &mut IdGenerator,
) -> Result<(String, Vec<EventBinding>), GraftError> {
    let mut out = String::with_capacity(template.len());
    let mut bindings = Vec::new();
    let mut last_end = 0;

    for tag in TAG_RE.find_iter(template) {
        let tag_src = tag.as_str();
        let fragments: Vec<regex::Captures> = EVENT_RE.captures_iter(tag_src).collect();
        let attempts = ATTEMPT_RE.find_iter(tag_src).count();

        if attempts == 0 {
            continue;
        }
        if attempts != fragments.len() {
            return Err(GraftError::MalformedEventBinding {
                fragment: tag_src.to_string(),
            });
        }

        let id = ids.next_id();
        for captures in &fragments {
            bindings.push(EventBinding {
                element_id: id.clone(),
                event_name: captures[1].to_string(),
                method_name: captures[2].to_string(),
            });
        }

        let mut first = true;
        let rewritten = EVENT_RE.replace_all(tag_src, |_: &regex::Captures| {
            if first {
                first = false;
                format!(r#"id="{id}""#)
            } else {
                String::new()
            }
        });
        let rewritten = TAG_END_WS_RE.replace(rewritten.trim_end(), "$1");

        out.push_str(&template[last_end..tag.start()]);
        out.push_str(&rewritten);
        last_end = tag.end();
    }
    out.push_str(&template[last_end..]);

    Ok((out, bindings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn person_lookup(name: &str) -> Option<Value> {
        match name {
            "firstName" => Some(json!("Lior")),
            "lastName" => Some(json!("Chamla")),
            "count" => Some(json!(7)),
            _ => None,
        }
    }

    #[test]
    fn interpolation_substitutes_values() {
        let html = interpolate("<h3>{{ firstName }} {{ lastName }}</h3>", &person_lookup).unwrap();
        assert_eq!(html, "<h3>Lior Chamla</h3>");
    }

    #[test]
    fn interpolation_whitespace_is_trimmed() {
        assert_eq!(
            interpolate("{{count}} = {{   count   }}", &person_lookup).unwrap(),
            "7 = 7"
        );
    }

    #[test]
    fn interpolation_unknown_property_renders_empty() {
        assert_eq!(
            interpolate("<b>{{ nope }}</b>", &person_lookup).unwrap(),
            "<b></b>"
        );
    }

    #[test]
    fn interpolation_unbalanced_open_fails() {
        let err = interpolate("<b>{{ firstName </b>", &person_lookup).unwrap_err();
        assert!(matches!(err, GraftError::TemplateParse { .. }));
    }

    #[test]
    fn interpolation_stray_close_fails() {
        let err = interpolate("<b>firstName }}</b>", &person_lookup).unwrap_err();
        assert!(matches!(err, GraftError::TemplateParse { .. }));
    }

    #[test]
    fn single_event_fragment_becomes_id() {
        let mut ids = IdGenerator::new();
        let (html, bindings) =
            extract_event_bindings(r#"<button (click)="save">Go</button>"#, &mut ids).unwrap();

        assert_eq!(html, r#"<button id="event-listener-1">Go</button>"#);
        assert_eq!(
            bindings,
            vec![EventBinding {
                element_id: "event-listener-1".to_string(),
                event_name: "click".to_string(),
                method_name: "save".to_string(),
            }]
        );
    }

    #[test]
    fn multiple_fragments_share_one_id() {
        let mut ids = IdGenerator::new();
        let template = r#"<button (click)="onClick" (dblclick)="onDbl">Hi</button>"#;
        let (html, bindings) = extract_event_bindings(template, &mut ids).unwrap();

        assert_eq!(html, r#"<button id="event-listener-1">Hi</button>"#);
        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings[0].event_name, "click");
        assert_eq!(bindings[1].event_name, "dblclick");
        assert_eq!(bindings[0].element_id, bindings[1].element_id);
    }

    #[test]
    fn each_tag_gets_a_fresh_id() {
        let mut ids = IdGenerator::new();
        let template = r#"<a (click)="one">1</a><b (click)="two">2</b>"#;
        let (html, bindings) = extract_event_bindings(template, &mut ids).unwrap();

        assert_eq!(bindings[0].element_id, "event-listener-1");
        assert_eq!(bindings[1].element_id, "event-listener-2");
        assert!(html.contains(r#"<a id="event-listener-1">"#));
        assert!(html.contains(r#"<b id="event-listener-2">"#));
    }

    #[test]
    fn tags_without_fragments_are_untouched() {
        let mut ids = IdGenerator::new();
        let template = r#"<h3 class="title">Hello</h3>"#;
        let (html, bindings) = extract_event_bindings(template, &mut ids).unwrap();

        assert_eq!(html, template);
        assert!(bindings.is_empty());
    }

    #[test]
    fn fragment_without_method_name_fails() {
        let mut ids = IdGenerator::new();
        let err = extract_event_bindings(r#"<button (click)=save>Go</button>"#, &mut ids)
            .unwrap_err();
        assert!(matches!(err, GraftError::MalformedEventBinding { .. }));

        let err =
            extract_event_bindings(r#"<button (click)="">Go</button>"#, &mut ids).unwrap_err();
        assert!(matches!(err, GraftError::MalformedEventBinding { .. }));
    }

    #[test]
    fn ids_are_unique_across_passes() {
        let mut ids = IdGenerator::new();
        let (_, first) = extract_event_bindings(r#"<a (click)="x">1</a>"#, &mut ids).unwrap();
        let (_, second) = extract_event_bindings(r#"<a (click)="x">1</a>"#, &mut ids).unwrap();
        assert_ne!(first[0].element_id, second[0].element_id);
    }
}
