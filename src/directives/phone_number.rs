//! Phone-number input formatting
//!
//! Grafts onto `[phone-number]` inputs: every `input` event reformats the
//! field's value to ten digits grouped in pairs (grouping and border color
//! are attribute-configurable).

use std::rc::Rc;

use serde_json::{json, Value};

use crate::directive::{Directive, DirectiveContext};
use crate::error::GraftError;
use crate::registry::{Definition, Dep};
use crate::services::Formatter;
use crate::value;

pub struct PhoneNumber {
    formatter: Rc<Formatter>,
    with_spaces: bool,
    border_color: String,
}

impl PhoneNumber {
    pub fn new(formatter: Rc<Formatter>) -> Self {
        Self {
            formatter,
            with_spaces: true,
            border_color: "red".to_string(),
        }
    }
}

impl Directive for PhoneNumber {
    fn init(&mut self, ctx: &mut DirectiveContext<'_>) -> Result<(), GraftError> {
        ctx.dom
            .set_path(ctx.element, "style.borderColor", json!(self.border_color));
        Ok(())
    }

    fn property(&self, name: &str) -> Option<Value> {
        match name {
            "willHaveSpaces" => Some(json!(self.with_spaces)),
            "borderColor" => Some(json!(self.border_color)),
            _ => None,
        }
    }

    fn set_property(&mut self, name: &str, v: Value) -> bool {
        match name {
            "willHaveSpaces" => {
                if let Some(b) = value::as_bool(&v) {
                    self.with_spaces = b;
                }
                true
            }
            "borderColor" => {
                if let Some(s) = value::as_string(&v) {
                    self.border_color = s;
                }
                true
            }
            _ => false,
        }
    }

    fn call(
        &mut self,
        method: &str,
        args: &[Value],
        ctx: &mut DirectiveContext<'_>,
    ) -> Result<bool, GraftError> {
        match method {
            "formatPhoneNumber" => {
                let raw = args.first().and_then(value::as_string).unwrap_or_default();
                let formatted = self.formatter.format_number(&raw, 10, 2, self.with_spaces);
                ctx.dom.set_path(ctx.element, "value", json!(formatted));
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

pub fn definition() -> Definition {
    Definition::new(
        "phone-number",
        "[phone-number]",
        vec![Dep::Service("formatter".into())],
        |args| Ok(Box::new(PhoneNumber::new(args.service("formatter")?))),
    )
    .input("with-spaces", "willHaveSpaces")
    .input("border-color", "borderColor")
    .host_listener("input", "formatPhoneNumber", &["event.target.value"])
}
