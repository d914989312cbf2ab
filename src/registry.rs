//! Definition metadata: the static declaration attached to a directive type
//!
//! A [`Definition`] carries everything the bootstrap orchestrator needs to
//! graft a directive onto matching elements: selector, declared constructor
//! dependencies, definition-local providers, optional template, host
//! bindings, attribute inputs and host listeners. Built once via the builder
//! methods, then treated as immutable.
//!
//! Constructor parameters are *declared* (`Dep::Element` / `Dep::Service`),
//! never introspected from source text.

use std::any::Any;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::directive::Directive;
use crate::dom::NodeId;
use crate::error::GraftError;

/// A constructed service instance, type-erased for the cache.
pub type Service = Rc<dyn Any>;

/// Factory producing a service instance.
pub type ServiceFactory = Rc<dyn Fn() -> Service>;

/// A named service factory, scoped either to one definition or globally.
#[derive(Clone)]
pub struct Provider {
    pub name: String,
    pub construct: ServiceFactory,
}

impl Provider {
    pub fn new<T: Any>(name: impl Into<String>, construct: impl Fn() -> T + 'static) -> Self {
        Self {
            name: name.into(),
            construct: Rc::new(move || Rc::new(construct()) as Service),
        }
    }
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider").field("name", &self.name).finish()
    }
}

/// One declared constructor dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dep {
    /// The DOM element the directive is grafted onto.
    Element,
    /// A service resolved by name.
    Service(String),
}

/// A declared host binding: instance property projected onto an element
/// attribute/property path.
#[derive(Debug, Clone)]
pub struct HostBindingSpec {
    pub attr_path: String,
    pub property: String,
}

/// A declared input: element attribute read into an instance property at
/// initialization. The same attribute wrapped in brackets (`[name]`) is
/// parsed as a literal value instead of a raw string.
#[derive(Debug, Clone)]
pub struct InputSpec {
    pub attr: String,
    pub property: String,
}

/// A declared host listener: DOM event wired to an instance method, with
/// parameter expressions evaluated against the triggering event.
#[derive(Debug, Clone)]
pub struct HostListenerSpec {
    pub event: String,
    pub method: String,
    pub params: Vec<String>,
}

/// Ordered, resolved constructor arguments handed to a definition's
/// constructor. Arguments are consumed front to back, in declaration order.
pub struct ConstructorArgs {
    definition: String,
    args: VecDeque<ResolvedDep>,
}

impl std::fmt::Debug for ConstructorArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstructorArgs")
            .field("definition", &self.definition)
            .field("args", &self.args.len())
            .finish()
    }
}

pub(crate) enum ResolvedDep {
    Element(NodeId),
    Service { name: String, instance: Service },
}

impl ConstructorArgs {
    pub(crate) fn new(definition: impl Into<String>, args: Vec<ResolvedDep>) -> Self {
        Self {
            definition: definition.into(),
            args: args.into(),
        }
    }

    /// Take the next argument as the host element.
    pub fn element(&mut self) -> Result<NodeId, GraftError> {
        match self.args.pop_front() {
            Some(ResolvedDep::Element(node)) => Ok(node),
            _ => Err(GraftError::ConstructorArity {
                definition: self.definition.clone(),
            }),
        }
    }

    /// Take the next argument as a service and downcast it.
    pub fn service<T: Any>(&mut self, name: &str) -> Result<Rc<T>, GraftError> {
        match self.args.pop_front() {
            Some(ResolvedDep::Service { name: got, instance }) if got == name => instance
                .downcast::<T>()
                .map_err(|_| GraftError::ServiceType {
                    definition: self.definition.clone(),
                    service: name.to_string(),
                    expected_type: std::any::type_name::<T>(),
                }),
            _ => Err(GraftError::ConstructorArity {
                definition: self.definition.clone(),
            }),
        }
    }
}

type ConstructFn = Rc<dyn Fn(&mut ConstructorArgs) -> Result<Box<dyn Directive>, GraftError>>;

/// The static registry entry for one directive/component type.
#[derive(Clone)]
pub struct Definition {
    pub name: String,
    pub selector: String,
    pub deps: Vec<Dep>,
    pub providers: Vec<Provider>,
    pub template: Option<String>,
    pub host_bindings: Vec<HostBindingSpec>,
    pub inputs: Vec<InputSpec>,
    pub listeners: Vec<HostListenerSpec>,
    pub(crate) construct: ConstructFn,
}

impl Definition {
    pub fn new(
        name: impl Into<String>,
        selector: impl Into<String>,
        deps: Vec<Dep>,
        construct: impl Fn(&mut ConstructorArgs) -> Result<Box<dyn Directive>, GraftError> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            selector: selector.into(),
            deps,
            providers: Vec::new(),
            template: None,
            host_bindings: Vec::new(),
            inputs: Vec::new(),
            listeners: Vec::new(),
            construct: Rc::new(construct),
        }
    }

    /// Add a definition-local provider (overrides the global one by name).
    pub fn provider(mut self, provider: Provider) -> Self {
        self.providers.push(provider);
        self
    }

    /// Attach a template; a definition with a template is a component.
    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn host_binding(mut self, attr_path: impl Into<String>, property: impl Into<String>) -> Self {
        self.host_bindings.push(HostBindingSpec {
            attr_path: attr_path.into(),
            property: property.into(),
        });
        self
    }

    pub fn input(mut self, attr: impl Into<String>, property: impl Into<String>) -> Self {
        self.inputs.push(InputSpec {
            attr: attr.into(),
            property: property.into(),
        });
        self
    }

    pub fn host_listener(
        mut self,
        event: impl Into<String>,
        method: impl Into<String>,
        params: &[&str],
    ) -> Self {
        self.listeners.push(HostListenerSpec {
            event: event.into(),
            method: method.into(),
            params: params.iter().map(|p| (*p).to_string()).collect(),
        });
        self
    }
}

impl std::fmt::Debug for Definition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Definition")
            .field("name", &self.name)
            .field("selector", &self.selector)
            .field("deps", &self.deps)
            .field("template", &self.template.is_some())
            .finish()
    }
}

/// What the embedding application hands to [`crate::App::bootstrap`].
#[derive(Debug, Default)]
pub struct AppModule {
    pub declarations: Vec<Definition>,
    pub providers: Vec<Provider>,
}
