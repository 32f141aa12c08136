//! Request factory registry
//!
//! Maps each [`RequestKind`] to the factory that builds its mutation. A
//! manager starts with the stock factories; callers may override a kind
//! (instrumented or alternative mutations) or remove it.

use std::collections::BTreeMap;
use std::rc::Rc;

use atelier_core::{build_mutation, AtelierError, Mutation, RequestKind, RequestParams, Result};

use crate::request::Request;

pub type RequestFactory = Rc<dyn Fn(RequestParams) -> Result<Box<dyn Mutation>>>;

#[derive(Clone, Default)]
pub struct RequestRegistry {
    factories: BTreeMap<RequestKind, RequestFactory>,
}

impl RequestRegistry {
    /// Registry with no kinds; every creation fails until kinds are registered
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry with the stock factory for every kind
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        for kind in RequestKind::ALL {
            registry.register(kind, |params| Ok(build_mutation(params)));
        }
        registry
    }

    /// Install or replace the factory for `kind`
    pub fn register<F>(&mut self, kind: RequestKind, factory: F)
    where
        F: Fn(RequestParams) -> Result<Box<dyn Mutation>> + 'static,
    {
        self.factories.insert(kind, Rc::new(factory));
    }

    pub fn unregister(&mut self, kind: RequestKind) -> bool {
        self.factories.remove(&kind).is_some()
    }

    pub fn contains(&self, kind: RequestKind) -> bool {
        self.factories.contains_key(&kind)
    }

    pub fn kinds(&self) -> Vec<RequestKind> {
        self.factories.keys().copied().collect()
    }

    pub(crate) fn factory(&self, kind: RequestKind) -> Result<RequestFactory> {
        self.factories
            .get(&kind)
            .cloned()
            .ok_or_else(|| AtelierError::UnknownRequestType {
                kind: kind.to_string(),
            })
    }

    /// Build a request through the registered factory
    ///
    /// # Errors
    ///
    /// `UnknownRequestType` when no factory is registered for the kind, or
    /// the factory's own error.
    pub fn create(&self, params: RequestParams) -> Result<Request> {
        let factory = self.factory(params.kind())?;
        let mutation = factory(params.clone())?;
        Ok(Request::new(params, mutation))
    }
}

impl std::fmt::Debug for RequestRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}
