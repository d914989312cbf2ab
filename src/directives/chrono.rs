//! Elapsed-seconds counter bound to the host's text
//!
//! Grafts onto `div[chrono]`: a one-second interval increments a reactive
//! count whose value is host-bound to `textContent`. Clicking the element
//! pauses or resumes the interval.

use std::rc::Rc;

use serde_json::Value;

use crate::directive::{Directive, DirectiveContext, WatchSink};
use crate::error::GraftError;
use crate::reactive::Prop;
use crate::registry::Definition;
use crate::scheduler::TimerId;

const TICK_MS: u64 = 1000;

#[derive(Default)]
pub struct Chrono {
    count: Prop<i64>,
    timer: Option<TimerId>,
}

impl Chrono {
    fn start(&mut self, ctx: &mut DirectiveContext<'_>) {
        let count = self.count.clone();
        self.timer = Some(
            ctx.scheduler
                .set_interval(TICK_MS, Rc::new(move || count.update(|v| *v += 1))),
        );
    }
}

impl Directive for Chrono {
    fn init(&mut self, ctx: &mut DirectiveContext<'_>) -> Result<(), GraftError> {
        self.start(ctx);
        Ok(())
    }

    fn property(&self, name: &str) -> Option<Value> {
        match name {
            "count" => Some(Value::from(self.count.get())),
            _ => None,
        }
    }

    fn call(
        &mut self,
        method: &str,
        _args: &[Value],
        ctx: &mut DirectiveContext<'_>,
    ) -> Result<bool, GraftError> {
        match method {
            "toggle" => {
                match self.timer.take() {
                    Some(id) => ctx.scheduler.clear_interval(id),
                    None => self.start(ctx),
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn watch(&self, property: &str, sink: WatchSink) -> bool {
        match property {
            "count" => {
                self.count.subscribe(move |v| sink(&Value::from(*v)));
                true
            }
            _ => false,
        }
    }
}

pub fn definition() -> Definition {
    Definition::new("chrono", "div[chrono]", vec![], |_| {
        Ok(Box::<Chrono>::default())
    })
    .host_binding("textContent", "count")
    .host_listener("click", "toggle", &[])
}
