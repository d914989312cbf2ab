//! Click counter component
//!
//! Renders its own template into `<counter>` hosts. `initial-value` and
//! `step` arrive as attribute inputs (bracketed for typed literals).

use serde_json::Value;

use crate::directive::{Directive, DirectiveContext};
use crate::error::GraftError;
use crate::registry::Definition;
use crate::value;

const TEMPLATE: &str = "\
<h2>{{ count }}</h2>\
<button (click)=\"increment\">+{{ step }}</button> \
<button (click)=\"decrement\">-{{ step }}</button>";

pub struct Counter {
    count: i64,
    step: i64,
}

impl Default for Counter {
    fn default() -> Self {
        Self { count: 0, step: 1 }
    }
}

impl Directive for Counter {
    fn property(&self, name: &str) -> Option<Value> {
        match name {
            "count" => Some(Value::from(self.count)),
            "step" => Some(Value::from(self.step)),
            _ => None,
        }
    }

    fn set_property(&mut self, name: &str, v: Value) -> bool {
        match name {
            "count" => {
                if let Some(n) = value::as_i64(&v) {
                    self.count = n;
                }
                true
            }
            "step" => {
                if let Some(n) = value::as_i64(&v) {
                    self.step = n;
                }
                true
            }
            _ => false,
        }
    }

    fn call(
        &mut self,
        method: &str,
        _args: &[Value],
        _ctx: &mut DirectiveContext<'_>,
    ) -> Result<bool, GraftError> {
        match method {
            "increment" => {
                self.count += self.step;
                Ok(true)
            }
            "decrement" => {
                self.count -= self.step;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

pub fn definition() -> Definition {
    Definition::new("counter", "counter", vec![], |_| {
        Ok(Box::<Counter>::default())
    })
    .template(TEMPLATE)
    .input("initial-value", "count")
    .input("step", "step")
}
