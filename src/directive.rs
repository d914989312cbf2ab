//! The behavior contract every directive and component implements
//!
//! The framework talks to instances exclusively through this trait: named
//! property reads/writes (inputs, interpolation, expression scopes), named
//! method calls (listeners) and named watch registration (host bindings).
//! Dispatch is by name because templates and definitions refer to members by
//! string; an instance answers `false` for a name it does not expose and the
//! orchestrator turns that into the right error for the declaration site.

use std::rc::Rc;

use serde_json::Value;

use crate::detector::ChangeDetector;
use crate::dom::{Document, NodeId};
use crate::error::GraftError;
use crate::scheduler::Scheduler;

/// Sink receiving the new value after every write to a watched property.
pub type WatchSink = Rc<dyn Fn(&Value)>;

/// Framework facilities handed to an instance during `init` and method calls.
///
/// Borrowed for the duration of one call only; anything an instance wants to
/// keep across calls (a prop, a detector handle) must be a cheap-clone handle
/// captured into the instance itself.
pub struct DirectiveContext<'a> {
    /// The element this instance is grafted onto.
    pub element: NodeId,
    pub dom: &'a mut Document,
    pub scheduler: &'a mut Scheduler,
    pub detector: &'a ChangeDetector,
}

pub trait Directive: 'static {
    /// Called once, after inputs are set and host bindings are wired.
    fn init(&mut self, ctx: &mut DirectiveContext<'_>) -> Result<(), GraftError> {
        let _ = ctx;
        Ok(())
    }

    /// Current value of a named property, if the instance exposes it.
    fn property(&self, name: &str) -> Option<Value> {
        let _ = name;
        None
    }

    /// Write a named property. `false` means the name is not exposed.
    fn set_property(&mut self, name: &str, value: Value) -> bool {
        let _ = (name, value);
        false
    }

    /// Invoke a named method. `Ok(false)` means the name is not exposed.
    fn call(
        &mut self,
        method: &str,
        args: &[Value],
        ctx: &mut DirectiveContext<'_>,
    ) -> Result<bool, GraftError>;

    /// Attach a sink to a named property's writes. `false` means the name is
    /// not exposed or not observable.
    fn watch(&self, property: &str, sink: WatchSink) -> bool {
        let _ = (property, sink);
        false
    }
}
