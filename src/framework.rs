//! Bootstrap orchestration, event dispatch and the task boundary
//!
//! [`App`] owns the document, the injector, the change detector and the
//! timer scheduler, and wires them together:
//!
//! - `bootstrap` grafts every declared definition onto its matching
//!   elements. One failing element never takes down the rest; it is logged
//!   and skipped.
//! - `dispatch` and `advance` are the only ways the outside world triggers
//!   instance code. Both are task boundaries: after the callbacks run, a
//!   digest flushes pending binding writes to the document. The digest runs
//!   even when a callback failed; the failure is reported afterwards.

use std::rc::Rc;

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::detector::ChangeDetector;
use crate::directive::{DirectiveContext, WatchSink};
use crate::dom::{Document, NodeId};
use crate::error::{FixSuggestion, GraftError};
use crate::expr::{Expr, Scope};
use crate::injector::Injector;
use crate::registry::AppModule;
use crate::scheduler::Scheduler;
use crate::selector::Selector;
use crate::template::{self, IdGenerator};

struct Instance {
    definition: usize,
    node: NodeId,
    directive: Box<dyn crate::directive::Directive>,
}

#[derive(Clone)]
enum ListenerAction {
    /// Declared host listener; params are evaluated against the dispatch scope.
    Host {
        instance: usize,
        method: String,
        params: Vec<Expr>,
    },
    /// Listener compiled out of a template; the method gets the raw event
    /// payload and the template re-renders after it returns.
    Template { instance: usize, method: String },
}

#[derive(Clone)]
struct ListenerEntry {
    node: NodeId,
    event: String,
    action: ListenerAction,
}

impl ListenerEntry {
    fn instance(&self) -> usize {
        match &self.action {
            ListenerAction::Host { instance, .. } | ListenerAction::Template { instance, .. } => {
                *instance
            }
        }
    }
}

/// Path-root lookup during host-listener parameter evaluation: `event` is
/// the payload, anything else is an instance property.
struct DispatchScope<'a> {
    event: &'a Value,
    directive: &'a dyn crate::directive::Directive,
}

impl Scope for DispatchScope<'_> {
    fn lookup(&self, root: &str) -> Option<Value> {
        if root == "event" {
            Some(self.event.clone())
        } else {
            self.directive.property(root)
        }
    }
}

/// One running application over one document.
pub struct App {
    dom: Document,
    detector: ChangeDetector,
    scheduler: Scheduler,
    injector: Injector,
    ids: IdGenerator,
    definitions: Vec<crate::registry::Definition>,
    instances: Vec<Instance>,
    listeners: Vec<ListenerEntry>,
}

impl App {
    pub fn new(dom: Document) -> Self {
        Self {
            dom,
            detector: ChangeDetector::new(),
            scheduler: Scheduler::new(),
            injector: Injector::new(),
            ids: IdGenerator::new(),
            definitions: Vec::new(),
            instances: Vec::new(),
            listeners: Vec::new(),
        }
    }

    pub fn from_html(markup: &str) -> Result<Self, GraftError> {
        Ok(Self::new(Document::from_html(markup)?))
    }

    pub fn document(&self) -> &Document {
        &self.dom
    }

    /// Mutable document access for the embedding application. Mutations made
    /// here bypass the binding queue; they are ordinary direct DOM writes.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.dom
    }

    pub fn detector(&self) -> &ChangeDetector {
        &self.detector
    }

    /// Number of successfully grafted instances.
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    // ─────────────────────────────────────────────────────────────
    // Bootstrap
    // ─────────────────────────────────────────────────────────────

    /// Graft every declaration of the module onto its matching elements,
    /// then digest once.
    ///
    /// Per-element isolation: a failing element (unresolved dependency, bad
    /// input literal, broken template) is logged and skipped, and neither
    /// its siblings nor the other declarations are affected.
    pub fn bootstrap(&mut self, module: AppModule) {
        self.injector.add_providers(module.providers);
        let base = self.definitions.len();
        self.definitions.extend(module.declarations);

        for di in base..self.definitions.len() {
            let selector = match Selector::parse(&self.definitions[di].selector) {
                Ok(selector) => selector,
                Err(error) => {
                    warn!(definition = %self.definitions[di].name, %error, "definition skipped");
                    continue;
                }
            };
            let matches = self.dom.query_selector_all(&selector);
            debug!(definition = %self.definitions[di].name, count = matches.len(), "selector matched");
            for node in matches {
                if let Err(error) = self.graft(di, node) {
                    warn!(definition = %self.definitions[di].name, node = %node, %error, "element skipped");
                    if let Some(fix) = error.fix_suggestion() {
                        info!(suggestion = fix);
                    }
                }
            }
        }
        self.detector.digest(&mut self.dom);
    }

    fn graft(&mut self, di: usize, node: NodeId) -> Result<(), GraftError> {
        let idx = self.instances.len();
        let result = self.graft_inner(di, node, idx);
        if result.is_err() {
            // roll back everything the failed graft registered
            self.instances.truncate(idx);
            self.listeners.retain(|l| l.instance() < idx);
        }
        result
    }

    fn graft_inner(&mut self, di: usize, node: NodeId, idx: usize) -> Result<(), GraftError> {
        // definitions hold Rc'd closures, so this clone is shallow
        let definition = self.definitions[di].clone();
        debug!(definition = %definition.name, node = %node, "grafting");

        let mut args = self.injector.resolve(&definition, node)?;
        let mut directive = (definition.construct)(&mut args)?;

        // inputs; the bracketed form is a literal, the plain form a raw
        // string, and the plain form wins when both are present
        for input in &definition.inputs {
            let bracketed = format!("[{}]", input.attr);
            if let Some(raw) = self.dom.attribute(node, &bracketed) {
                let value = Expr::parse_literal(raw)?;
                if !directive.set_property(&input.property, value) {
                    return Err(GraftError::UnknownProperty {
                        definition: definition.name.clone(),
                        property: input.property.clone(),
                    });
                }
            }
            if let Some(raw) = self.dom.attribute(node, &input.attr) {
                let value = Value::String(raw.to_string());
                if !directive.set_property(&input.property, value) {
                    return Err(GraftError::UnknownProperty {
                        definition: definition.name.clone(),
                        property: input.property.clone(),
                    });
                }
            }
        }

        // host bindings: every write to the watched property queues a DOM
        // write; the initial value is queued right away
        for binding in &definition.host_bindings {
            let detector = self.detector.clone();
            let path = binding.attr_path.clone();
            let sink: WatchSink = Rc::new(move |v: &Value| detector.record(node, path.clone(), v.clone()));
            if !directive.watch(&binding.property, sink) {
                return Err(GraftError::UnknownProperty {
                    definition: definition.name.clone(),
                    property: binding.property.clone(),
                });
            }
            if let Some(initial) = directive.property(&binding.property) {
                self.detector.record(node, binding.attr_path.clone(), initial);
            }
        }

        for listener in &definition.listeners {
            let params = listener
                .params
                .iter()
                .map(|p| Expr::parse(p))
                .collect::<Result<Vec<_>, _>>()?;
            self.listeners.push(ListenerEntry {
                node,
                event: listener.event.clone(),
                action: ListenerAction::Host {
                    instance: idx,
                    method: listener.method.clone(),
                    params,
                },
            });
        }

        let mut ctx = DirectiveContext {
            element: node,
            dom: &mut self.dom,
            scheduler: &mut self.scheduler,
            detector: &self.detector,
        };
        directive.init(&mut ctx)?;

        self.instances.push(Instance {
            definition: di,
            node,
            directive,
        });
        if definition.template.is_some() {
            self.render(idx)?;
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────
    // Rendering
    // ─────────────────────────────────────────────────────────────

    /// Compile the instance's template and install it as the host's content:
    /// interpolate, extract event bindings, replace inner HTML, attach
    /// listeners to the generated ids.
    fn render(&mut self, idx: usize) -> Result<(), GraftError> {
        let di = self.instances[idx].definition;
        let definition = self.definitions[di].clone();
        let Some(template_src) = definition.template.as_deref() else {
            return Ok(());
        };
        let node = self.instances[idx].node;

        let interpolated = {
            let directive = &self.instances[idx].directive;
            template::interpolate(template_src, &|name| directive.property(name))?
        };
        let (markup, bindings) = template::extract_event_bindings(&interpolated, &mut self.ids)?;
        self.dom.set_inner_html(node, &markup)?;

        let mut fresh = Vec::with_capacity(bindings.len());
        for binding in bindings {
            let target = self.dom.find_by_id(node, &binding.element_id).ok_or_else(|| {
                GraftError::MissingEventTarget {
                    id: binding.element_id.clone(),
                    definition: definition.name.clone(),
                }
            })?;
            fresh.push(ListenerEntry {
                node: target,
                event: binding.event_name,
                action: ListenerAction::Template {
                    instance: idx,
                    method: binding.method_name,
                },
            });
        }
        // the previous render's listeners point into markup that is gone
        self.listeners
            .retain(|l| !(l.instance() == idx && matches!(l.action, ListenerAction::Template { .. })));
        self.listeners.extend(fresh);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────
    // Task boundaries
    // ─────────────────────────────────────────────────────────────

    /// Deliver a DOM event to an element. This is a task boundary: every
    /// listener attached to the element for this event runs, then one digest
    /// flushes pending binding writes.
    ///
    /// A listener error stops further listeners but never the digest; the
    /// error is returned after the flush.
    pub fn dispatch(&mut self, node: NodeId, event: &str) -> Result<(), GraftError> {
        let payload = self.event_payload(node, event);
        let matched: Vec<ListenerEntry> = self
            .listeners
            .iter()
            .filter(|l| l.node == node && l.event == event)
            .cloned()
            .collect();
        debug!(node = %node, event, listeners = matched.len(), "dispatch");

        let mut outcome = Ok(());
        for entry in &matched {
            if let Err(error) = self.invoke(entry, &payload) {
                outcome = Err(error);
                break;
            }
        }
        self.detector.digest(&mut self.dom);
        outcome
    }

    /// Advance the virtual clock, firing every interval that comes due.
    /// Each firing is its own task: a digest follows each callback.
    pub fn advance(&mut self, ms: u64) {
        let target = self.scheduler.now_ms() + ms;
        while let Some(callback) = self.scheduler.pop_due(target) {
            callback();
            self.detector.digest(&mut self.dom);
        }
        self.scheduler.settle_at(target);
    }

    /// Run arbitrary embedder code as one task; a digest follows it.
    pub fn run_task<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let out = f(self);
        self.detector.digest(&mut self.dom);
        out
    }

    fn event_payload(&self, node: NodeId, event: &str) -> Value {
        json!({
            "type": event,
            "target": {
                "value": self.dom.get_path(node, "value"),
                "name": self.dom.get_path(node, "name"),
                "id": self.dom.get_path(node, "id"),
            },
        })
    }

    fn invoke(&mut self, entry: &ListenerEntry, payload: &Value) -> Result<(), GraftError> {
        match &entry.action {
            ListenerAction::Host {
                instance,
                method,
                params,
            } => {
                let args = {
                    let directive = self.instances[*instance].directive.as_ref();
                    let scope = DispatchScope {
                        event: payload,
                        directive,
                    };
                    params
                        .iter()
                        .map(|p| p.eval(&scope))
                        .collect::<Result<Vec<_>, _>>()?
                };
                self.call(*instance, method, &args)
            }
            ListenerAction::Template { instance, method } => {
                self.call(*instance, method, std::slice::from_ref(payload))?;
                self.render(*instance)
            }
        }
    }

    fn call(&mut self, idx: usize, method: &str, args: &[Value]) -> Result<(), GraftError> {
        let di = self.instances[idx].definition;
        let node = self.instances[idx].node;
        let handled = {
            let instance = &mut self.instances[idx];
            let mut ctx = DirectiveContext {
                element: node,
                dom: &mut self.dom,
                scheduler: &mut self.scheduler,
                detector: &self.detector,
            };
            instance.directive.call(method, args, &mut ctx)?
        };
        if handled {
            Ok(())
        } else {
            Err(GraftError::UnknownMethod {
                definition: self.definitions[di].name.clone(),
                method: method.to_string(),
            })
        }
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("definitions", &self.definitions.len())
            .field("instances", &self.instances.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directive::Directive;
    use crate::reactive::Prop;
    use crate::registry::{Definition, Dep, Provider};
    use crate::value;

    /// Minimal directive used throughout: a togglable flag projected onto
    /// the host's text.
    struct Toggle {
        on: Prop<bool>,
    }

    impl Toggle {
        fn new() -> Self {
            Self {
                on: Prop::new(false),
            }
        }
    }

    impl Directive for Toggle {
        fn property(&self, name: &str) -> Option<Value> {
            match name {
                "on" => Some(Value::Bool(self.on.get())),
                _ => None,
            }
        }

        fn set_property(&mut self, name: &str, v: Value) -> bool {
            match name {
                "on" => {
                    self.on.set(value::as_bool(&v).unwrap_or(false));
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
                "toggle" => {
                    self.on.update(|v| *v = !*v);
                    Ok(true)
                }
                _ => Ok(false),
            }
        }

        fn watch(&self, property: &str, sink: WatchSink) -> bool {
            match property {
                "on" => {
                    self.on.subscribe(move |v| sink(&Value::Bool(*v)));
                    true
                }
                _ => false,
            }
        }
    }

    fn toggle_definition() -> Definition {
        Definition::new("toggle", "[toggle]", vec![], |_| Ok(Box::new(Toggle::new())))
            .host_binding("textContent", "on")
            .host_listener("click", "toggle", &[])
    }

    fn first_match(app: &App, selector: &str) -> NodeId {
        let selector = Selector::parse(selector).unwrap();
        app.document().query_selector_all(&selector)[0]
    }

    #[test]
    fn bootstrap_projects_initial_host_binding() {
        let mut app = App::from_html(r#"<div toggle></div>"#).unwrap();
        app.bootstrap(AppModule {
            declarations: vec![toggle_definition()],
            providers: vec![],
        });

        let div = first_match(&app, "[toggle]");
        assert_eq!(app.document().text_content(div), "false");
    }

    #[test]
    fn dispatch_runs_listener_then_digests() {
        let mut app = App::from_html(r#"<div toggle></div>"#).unwrap();
        app.bootstrap(AppModule {
            declarations: vec![toggle_definition()],
            providers: vec![],
        });
        let div = first_match(&app, "[toggle]");

        app.dispatch(div, "click").unwrap();
        assert_eq!(app.document().text_content(div), "true");
        assert_eq!(app.detector().pending(), 0);

        app.dispatch(div, "click").unwrap();
        assert_eq!(app.document().text_content(div), "false");
    }

    #[test]
    fn dispatch_of_unbound_event_is_a_quiet_no_op() {
        let mut app = App::from_html(r#"<div toggle></div>"#).unwrap();
        app.bootstrap(AppModule {
            declarations: vec![toggle_definition()],
            providers: vec![],
        });
        let div = first_match(&app, "[toggle]");

        app.dispatch(div, "mouseover").unwrap();
        assert_eq!(app.document().text_content(div), "false");
    }

    #[test]
    fn failing_element_is_isolated() {
        // the second div asks for a service nobody provides
        let markup = r#"<div toggle></div><div needy></div><div toggle></div>"#;
        let mut app = App::from_html(markup).unwrap();

        struct Needy;
        impl Directive for Needy {
            fn call(
                &mut self,
                _m: &str,
                _a: &[Value],
                _c: &mut DirectiveContext<'_>,
            ) -> Result<bool, GraftError> {
                Ok(false)
            }
        }
        let needy = Definition::new(
            "needy",
            "[needy]",
            vec![Dep::Service("logger".into())],
            |args| {
                args.service::<()>("logger")?;
                Ok(Box::new(Needy))
            },
        );

        app.bootstrap(AppModule {
            declarations: vec![toggle_definition(), needy],
            providers: vec![],
        });

        assert_eq!(app.instance_count(), 2, "both toggles survive the failure");
    }

    #[test]
    fn unknown_method_propagates_after_digest() {
        let mut app = App::from_html(r#"<div toggle></div>"#).unwrap();
        let broken = toggle_definition().host_listener("dblclick", "missing", &[]);
        app.bootstrap(AppModule {
            declarations: vec![broken],
            providers: vec![],
        });
        let div = first_match(&app, "[toggle]");

        let err = app.dispatch(div, "dblclick").unwrap_err();
        assert!(matches!(err, GraftError::UnknownMethod { .. }));
        assert_eq!(app.detector().pending(), 0, "digest ran despite the error");
    }

    #[test]
    fn run_task_digests_embedder_writes() {
        let mut app = App::from_html(r#"<div toggle></div>"#).unwrap();
        app.bootstrap(AppModule {
            declarations: vec![toggle_definition()],
            providers: vec![],
        });
        let div = first_match(&app, "[toggle]");

        app.run_task(|app| {
            app.detector().record(div, "style.borderColor", json!("red"));
            assert_eq!(app.detector().pending(), 1, "write stays queued inside the task");
        });

        assert_eq!(app.detector().pending(), 0);
        assert_eq!(
            app.document().get_path(div, "style.borderColor"),
            json!("red")
        );
    }

    #[test]
    fn host_listener_params_reach_the_method() {
        struct Recorder {
            last: Prop<String>,
        }
        impl Directive for Recorder {
            fn property(&self, name: &str) -> Option<Value> {
                (name == "last").then(|| Value::String(self.last.get()))
            }
            fn call(
                &mut self,
                method: &str,
                args: &[Value],
                _ctx: &mut DirectiveContext<'_>,
            ) -> Result<bool, GraftError> {
                if method != "record" {
                    return Ok(false);
                }
                self.last.set(value::as_string(&args[0]).unwrap_or_default());
                Ok(true)
            }
            fn watch(&self, property: &str, sink: WatchSink) -> bool {
                if property != "last" {
                    return false;
                }
                self.last.subscribe(move |v| sink(&Value::String(v.clone())));
                true
            }
        }

        let definition = Definition::new("recorder", "input", vec![], |_| {
            Ok(Box::new(Recorder {
                last: Prop::new(String::new()),
            }))
        })
        .host_binding("lastSeen", "last")
        .host_listener("input", "record", &["event.target.value"]);

        let mut app = App::from_html(r#"<input name="phone">"#).unwrap();
        app.bootstrap(AppModule {
            declarations: vec![definition],
            providers: vec![],
        });
        let input = first_match(&app, "input");

        app.document_mut().set_path(input, "value", json!("0612"));
        app.dispatch(input, "input").unwrap();

        assert_eq!(app.document().get_path(input, "lastSeen"), json!("0612"));
    }

    #[test]
    fn local_provider_shadows_global_one() {
        use std::cell::Cell;

        struct Tag(&'static str);
        struct Sniffer;
        impl Directive for Sniffer {
            fn call(
                &mut self,
                _m: &str,
                _a: &[Value],
                _c: &mut DirectiveContext<'_>,
            ) -> Result<bool, GraftError> {
                Ok(false)
            }
        }

        let seen = Rc::new(Cell::new(""));
        let observed = Rc::clone(&seen);
        let definition = Definition::new(
            "sniffer",
            "span",
            vec![Dep::Service("tag".into())],
            move |args| {
                let tag = args.service::<Tag>("tag")?;
                observed.set(tag.0);
                Ok(Box::new(Sniffer))
            },
        )
        .provider(Provider::new("tag", || Tag("local")));

        let mut app = App::from_html("<span></span>").unwrap();
        app.bootstrap(AppModule {
            declarations: vec![definition],
            providers: vec![Provider::new("tag", || Tag("global"))],
        });

        assert_eq!(seen.get(), "local");
    }
}
