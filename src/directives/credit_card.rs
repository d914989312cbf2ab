//! Credit-card input formatting and validation
//!
//! Grafts onto `[credit-card]` inputs: every `input` event reformats the
//! value to sixteen digits grouped in fours and colors the border green once
//! the number passes the Luhn check.

use std::rc::Rc;

use serde_json::{json, Value};

use crate::directive::{Directive, DirectiveContext};
use crate::error::GraftError;
use crate::registry::{Definition, Dep};
use crate::services::{CreditCardVerifier, Formatter};
use crate::value;

pub struct CreditCard {
    verifier: Rc<CreditCardVerifier>,
    formatter: Rc<Formatter>,
}

impl CreditCard {
    pub fn new(verifier: Rc<CreditCardVerifier>, formatter: Rc<Formatter>) -> Self {
        Self { verifier, formatter }
    }
}

impl Directive for CreditCard {
    fn init(&mut self, ctx: &mut DirectiveContext<'_>) -> Result<(), GraftError> {
        ctx.dom.set_path(ctx.element, "style.borderColor", json!("blue"));
        Ok(())
    }

    fn call(
        &mut self,
        method: &str,
        args: &[Value],
        ctx: &mut DirectiveContext<'_>,
    ) -> Result<bool, GraftError> {
        match method {
            "formatCreditCardNumber" => {
                let raw = args.first().and_then(value::as_string).unwrap_or_default();
                let formatted = self.formatter.format_number(&raw, 16, 4, true);
                let color = if self.verifier.is_valid(&formatted) {
                    "green"
                } else {
                    "blue"
                };
                ctx.dom.set_path(ctx.element, "value", json!(formatted));
                ctx.dom.set_path(ctx.element, "style.borderColor", json!(color));
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

pub fn definition() -> Definition {
    Definition::new(
        "credit-card",
        "[credit-card]",
        vec![
            Dep::Service("verifier".into()),
            Dep::Service("formatter".into()),
        ],
        |args| {
            Ok(Box::new(CreditCard::new(
                args.service("verifier")?,
                args.service("formatter")?,
            )))
        },
    )
    .host_listener("input", "formatCreditCardNumber", &["event.target.value"])
}
