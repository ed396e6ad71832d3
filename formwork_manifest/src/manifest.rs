// Copyright 2025 the Formwork Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public `Manifest` API, generic over the discovery cache.

use std::borrow::Cow;
use std::cell::{Cell, OnceCell};
use std::fmt;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::cache::{Cache, MemoryCache};
use crate::catalog::{Catalog, fingerprint};
use crate::component::{
    BuilderFactory, Component, ComponentError, ComponentResult, FnComponent, Roles,
    SanitizerFactory, ValidatorFactory,
};
use crate::context::Context;
use crate::environment::Environment;
use crate::error::ManifestError;

/// Default prefix for catalog cache keys.
pub const DEFAULT_CACHE_PREFIX: &str = "formwork:manifest:";

/// Registry of components, generic over the cache backing discovery.
///
/// ## Caching
///
/// In [`Environment::Production`] the discovered [`Catalog`] is memoized
/// in-process and written to the cache under a key derived from every
/// registered alias and its [`Component::revision`], so another manifest
/// sharing the same cache and the same components skips discovery, while
/// one whose components changed roles discovers afresh. In
/// [`Environment::Development`] discovery re-runs on every read.
///
/// Results of [`render`](Self::render), [`builder_factories`](Self::builder_factories),
/// [`validator_factories`](Self::validator_factories) and
/// [`is_component_schema_eligible`](Self::is_component_schema_eligible) do
/// not depend on whether a cached catalog was used.
pub struct ManifestGeneric<C: Cache> {
    components: IndexMap<String, Box<dyn Component>>,
    environment: Environment,
    cache: C,
    cache_prefix: String,
    memo: OnceCell<Catalog>,
    discoveries: Cell<usize>,
}

/// Manifest backed by a process-local [`MemoryCache`].
pub type Manifest = ManifestGeneric<MemoryCache>;

impl Default for Manifest {
    fn default() -> Self {
        Self::new()
    }
}

impl Manifest {
    /// Create a production manifest with a fresh memory cache.
    pub fn new() -> Self {
        Self::with_cache(Environment::Production, MemoryCache::new())
    }
}

impl<C: Cache> fmt::Debug for ManifestGeneric<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manifest")
            .field("aliases", &self.components.keys().collect::<Vec<_>>())
            .field("environment", &self.environment)
            .field("cache", &self.cache)
            .field("memoized", &self.memo.get().is_some())
            .finish_non_exhaustive()
    }
}

impl<C: Cache> ManifestGeneric<C> {
    /// Create an empty manifest over an explicit cache.
    pub fn with_cache(environment: Environment, cache: C) -> Self {
        Self {
            components: IndexMap::new(),
            environment,
            cache,
            cache_prefix: DEFAULT_CACHE_PREFIX.to_owned(),
            memo: OnceCell::new(),
            discoveries: Cell::new(0),
        }
    }

    /// Set the prefix used for cache keys.
    pub fn set_cache_prefix(&mut self, prefix: impl Into<String>) {
        self.cache_prefix = prefix.into();
        self.memo = OnceCell::new();
    }

    /// Environment the manifest was created for.
    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// The backing cache.
    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Register a render closure under `alias`.
    pub fn register(
        &mut self,
        alias: impl Into<String>,
        render: impl Fn(&Context) -> Result<ComponentResult, ComponentError> + Send + Sync + 'static,
    ) -> Result<(), ManifestError> {
        self.register_component(FnComponent::new(alias, render))
    }

    /// Register a component, replacing any previous one with the same alias.
    pub fn register_component(
        &mut self,
        component: impl Component + 'static,
    ) -> Result<(), ManifestError> {
        let alias = component.alias().to_owned();
        if alias.is_empty() {
            return Err(ManifestError::EmptyAlias);
        }
        if self.components.contains_key(&alias) {
            // Same alias set means same cache key; drop the stale entry.
            debug!(alias = %alias, "replacing registered component");
            self.cache.delete(&self.cache_key());
        }
        self.components.insert(alias, Box::new(component));
        self.memo = OnceCell::new();
        Ok(())
    }

    /// True if `alias` is registered.
    pub fn contains(&self, alias: &str) -> bool {
        self.components.contains_key(alias)
    }

    /// Registered aliases in registration order.
    pub fn aliases(&self) -> impl Iterator<Item = &str> + '_ {
        self.components.keys().map(String::as_str)
    }

    /// Look up a component.
    pub fn component(&self, alias: &str) -> Option<&dyn Component> {
        self.components.get(alias).map(|c| &**c)
    }

    /// Render `alias` with `context`.
    ///
    /// A normalizer, when the component has one, rewrites the context first.
    pub fn render(&self, alias: &str, context: &Context) -> Result<ComponentResult, ManifestError> {
        let component = self
            .component(alias)
            .ok_or_else(|| ManifestError::ComponentNotFound(alias.to_owned()))?;
        let context = match component.normalizer() {
            Some(normalize) => Cow::Owned(normalize(context.clone())),
            None => Cow::Borrowed(context),
        };
        component
            .render(&context)
            .map_err(|source| ManifestError::Render {
                alias: alias.to_owned(),
                source,
            })
    }

    /// Builder factory for `alias`.
    ///
    /// Fails with [`ManifestError::ComponentNotFound`] for unknown aliases and
    /// [`ManifestError::BuilderFactoryMissing`] for components without one.
    pub fn builder_factory(&self, alias: &str) -> Result<BuilderFactory, ManifestError> {
        let component = self
            .component(alias)
            .ok_or_else(|| ManifestError::ComponentNotFound(alias.to_owned()))?;
        if !self.catalog().roles(alias).contains(Roles::BUILDER) {
            return Err(ManifestError::BuilderFactoryMissing(alias.to_owned()));
        }
        component
            .builder()
            .ok_or_else(|| ManifestError::BuilderFactoryMissing(alias.to_owned()))
    }

    /// All builder factories, keyed by alias.
    pub fn builder_factories(&self) -> IndexMap<String, BuilderFactory> {
        self.collect_role(Roles::BUILDER, |c| c.builder())
    }

    /// All validator factories, keyed by alias.
    pub fn validator_factories(&self) -> IndexMap<String, ValidatorFactory> {
        self.collect_role(Roles::VALIDATOR, |c| c.validator())
    }

    /// All sanitizer factories, keyed by alias.
    pub fn sanitizer_factories(&self) -> IndexMap<String, SanitizerFactory> {
        self.collect_role(Roles::SANITIZER, |c| c.sanitizer())
    }

    /// True iff a validator factory is registered for `alias`.
    pub fn is_component_schema_eligible(&self, alias: &str) -> bool {
        self.contains(alias) && self.catalog().roles(alias).contains(Roles::VALIDATOR)
    }

    /// The discovered catalog, from memo or cache where the environment allows.
    pub fn catalog(&self) -> Cow<'_, Catalog> {
        if !self.environment.caches_discovery() {
            return Cow::Owned(self.discover());
        }
        Cow::Borrowed(self.memo.get_or_init(|| self.load_catalog()))
    }

    /// Drop the memoized catalog and its cache entry.
    pub fn clear_cache(&mut self) {
        self.cache.delete(&self.cache_key());
        self.memo = OnceCell::new();
    }

    /// Discover now and populate the memo and cache.
    pub fn warm_cache(&self) {
        let _ = self.catalog();
    }

    /// How many times discovery has actually run.
    pub fn discovery_runs(&self) -> usize {
        self.discoveries.get()
    }

    fn revisions(&self) -> impl Iterator<Item = (&str, u64)> + '_ {
        self.components
            .iter()
            .map(|(alias, c)| (alias.as_str(), c.revision()))
    }

    fn cache_key(&self) -> String {
        let fp = fingerprint(self.revisions());
        format!("{}catalog:{fp:016x}", self.cache_prefix)
    }

    fn discover(&self) -> Catalog {
        self.discoveries.set(self.discoveries.get() + 1);
        Catalog::discover(self.components.values().map(|c| &**c))
    }

    fn load_catalog(&self) -> Catalog {
        let key = self.cache_key();
        if let Some(raw) = self.cache.get(&key) {
            match serde_json::from_str::<Catalog>(&raw) {
                Ok(catalog) if catalog.matches(self.revisions()) => {
                    debug!(key = %key, "catalog cache hit");
                    return catalog;
                }
                Ok(_) => warn!(key = %key, "cached catalog does not match registered components"),
                Err(err) => warn!(key = %key, error = %err, "discarding unreadable cached catalog"),
            }
        }
        debug!(key = %key, "catalog cache miss");
        let catalog = self.discover();
        match serde_json::to_string(&catalog) {
            Ok(raw) => self.cache.set(&key, raw),
            Err(err) => warn!(key = %key, error = %err, "catalog not cached"),
        }
        catalog
    }

    fn collect_role<F>(
        &self,
        role: Roles,
        get: impl Fn(&dyn Component) -> Option<F>,
    ) -> IndexMap<String, F> {
        let catalog = self.catalog();
        let mut out = IndexMap::new();
        for (alias, component) in &self.components {
            if !catalog.roles(alias).contains(role) {
                continue;
            }
            match get(&**component) {
                Some(f) => {
                    out.insert(alias.clone(), f);
                }
                None => warn!(alias = %alias, ?role, "catalog lists a role the component lacks"),
            }
        }
        out
    }
}
