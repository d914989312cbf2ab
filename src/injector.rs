//! Dependency resolution and the singleton cache
//!
//! Resolution order for a declared `Dep::Service(name)`:
//!
//! 1. a provider local to the requesting definition constructs a FRESH
//!    instance (never cached, never sharing the global one);
//! 2. the process-wide singleton cache returns the shared instance;
//! 3. a global provider constructs the instance once and caches it;
//! 4. otherwise resolution fails with the service and definition names.
//!
//! The cache lives for the lifetime of the [`Injector`], so repeated
//! bootstraps on the same app keep handing out the same singletons.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::dom::NodeId;
use crate::error::GraftError;
use crate::registry::{Definition, Dep, Provider, ResolvedDep, Service, ServiceFactory};

#[derive(Default)]
pub struct Injector {
    globals: HashMap<String, ServiceFactory>,
    singletons: HashMap<String, Service>,
}

impl Injector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register global providers. A repeated name replaces the factory but
    /// never evicts an already-constructed singleton.
    pub fn add_providers(&mut self, providers: Vec<Provider>) {
        for provider in providers {
            if self.globals.insert(provider.name.clone(), provider.construct).is_some() {
                warn!(service = %provider.name, "global provider replaced");
            }
        }
    }

    /// Resolve every declared dependency of `definition`, in order.
    pub fn resolve(
        &mut self,
        definition: &Definition,
        element: NodeId,
    ) -> Result<crate::registry::ConstructorArgs, GraftError> {
        let mut args = Vec::with_capacity(definition.deps.len());
        for dep in &definition.deps {
            let resolved = match dep {
                Dep::Element => ResolvedDep::Element(element),
                Dep::Service(name) => ResolvedDep::Service {
                    name: name.clone(),
                    instance: self.service(definition, name)?,
                },
            };
            args.push(resolved);
        }
        Ok(crate::registry::ConstructorArgs::new(&definition.name, args))
    }

    fn service(&mut self, definition: &Definition, name: &str) -> Result<Service, GraftError> {
        // local providers win and always construct fresh
        if let Some(local) = definition.providers.iter().find(|p| p.name == name) {
            debug!(service = name, definition = %definition.name, "local provider, fresh instance");
            return Ok((local.construct)());
        }
        if let Some(cached) = self.singletons.get(name) {
            debug!(service = name, "singleton cache hit");
            return Ok(cached.clone());
        }
        if let Some(factory) = self.globals.get(name) {
            debug!(service = name, "global provider, caching singleton");
            let instance = factory();
            self.singletons.insert(name.to_string(), instance.clone());
            return Ok(instance);
        }
        Err(GraftError::UnresolvedDependency {
            service: name.to_string(),
            definition: definition.name.clone(),
        })
    }
}

impl std::fmt::Debug for Injector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Injector")
            .field("globals", &self.globals.len())
            .field("singletons", &self.singletons.len())
            .finish()
    }
}
