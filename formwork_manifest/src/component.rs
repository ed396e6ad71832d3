// Copyright 2025 the Formwork Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The component contract: render results, assets, roles, and factories.
//!
//! ## Overview
//!
//! A component is an atomic renderable type (a text input, a select, a
//! wrapper template) addressed by an alias. Implement [`Component`] directly,
//! or wrap closures with [`FnComponent`].
//!
//! Besides rendering, a component may play any of four auxiliary roles,
//! described by [`Roles`]: it can normalize its context, build the default
//! context for fluent field builders, and supply per-field validators and
//! sanitizers for the schema layer.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::Context;

bitflags::bitflags! {
    /// Auxiliary roles a component implements.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Roles: u8 {
        /// Rewrites the component context before render.
        const NORMALIZER = 0b0000_0001;
        /// Supplies the default context for fluent field builders.
        const BUILDER    = 0b0000_0010;
        /// Supplies a value validator; makes the component schema-eligible.
        const VALIDATOR  = 0b0000_0100;
        /// Supplies a value sanitizer.
        const SANITIZER  = 0b0000_1000;
    }
}

/// Diagnostic discriminator for what a component renders.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    /// An input bound to a stored value.
    #[default]
    Field,
    /// A submit or action control.
    Control,
    /// A structural template (root, section, group, field wrappers).
    Wrapper,
    /// Anything else.
    Other,
}

/// Kind of side-effect asset a render may require.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssetKind {
    /// A stylesheet.
    Style,
    /// A script.
    Script,
    /// Media library support.
    Media,
}

/// A style/script/media requirement emitted by a render.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetDescriptor {
    /// What the asset is.
    pub kind: AssetKind,
    /// Deduplication handle.
    pub handle: String,
    /// Source location; may be empty for media.
    pub src: String,
    /// Handles this asset depends on.
    pub deps: Vec<String>,
    /// Cache-busting version.
    pub version: Option<String>,
    /// Lifecycle hook to defer a style to; `None` means immediate.
    pub hook: Option<String>,
}

impl AssetDescriptor {
    /// A stylesheet requirement.
    pub fn style(handle: impl Into<String>, src: impl Into<String>) -> Self {
        Self::new(AssetKind::Style, handle, src)
    }

    /// A script requirement.
    pub fn script(handle: impl Into<String>, src: impl Into<String>) -> Self {
        Self::new(AssetKind::Script, handle, src)
    }

    /// A media library requirement.
    pub fn media(handle: impl Into<String>) -> Self {
        Self::new(AssetKind::Media, handle, "")
    }

    fn new(kind: AssetKind, handle: impl Into<String>, src: impl Into<String>) -> Self {
        Self {
            kind,
            handle: handle.into(),
            src: src.into(),
            deps: Vec::new(),
            version: None,
            hook: None,
        }
    }

    /// Add dependency handles.
    pub fn with_deps<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deps.extend(deps.into_iter().map(Into::into));
        self
    }

    /// Set the version string.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Defer to a lifecycle hook.
    pub fn deferred_to(mut self, hook: impl Into<String>) -> Self {
        self.hook = Some(hook.into());
        self
    }
}

/// Output of a component render.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ComponentResult {
    /// Rendered markup.
    pub markup: String,
    /// Assets the markup requires.
    pub assets: Vec<AssetDescriptor>,
    /// Optional diagnostic discriminator.
    pub kind: Option<ComponentKind>,
}

impl ComponentResult {
    /// A result carrying only markup.
    pub fn markup(markup: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
            ..Self::default()
        }
    }

    /// Attach an asset.
    pub fn with_asset(mut self, asset: AssetDescriptor) -> Self {
        self.assets.push(asset);
        self
    }

    /// Tag the result with a kind.
    pub fn with_kind(mut self, kind: ComponentKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

/// Failure reported by a component's own render function.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ComponentError(pub String);

/// Validates a submitted value; `Err` carries a user-facing message.
pub type Validator = Box<dyn Fn(&Value) -> Result<(), String> + Send + Sync>;
/// Cleans a submitted value.
pub type Sanitizer = Box<dyn Fn(&Value) -> Value + Send + Sync>;

/// Box a validating closure.
pub fn validator(f: impl Fn(&Value) -> Result<(), String> + Send + Sync + 'static) -> Validator {
    Box::new(f)
}

/// Box a sanitizing closure.
pub fn sanitizer(f: impl Fn(&Value) -> Value + Send + Sync + 'static) -> Sanitizer {
    Box::new(f)
}

/// Render function wrapped by [`FnComponent`].
pub type RenderFn = Arc<dyn Fn(&Context) -> Result<ComponentResult, ComponentError> + Send + Sync>;
/// Produces the default component context for a new field id.
pub type BuilderFactory = Arc<dyn Fn(&str) -> Context + Send + Sync>;
/// Produces a validator for a field, given its component context.
pub type ValidatorFactory = Arc<dyn Fn(&Context) -> Validator + Send + Sync>;
/// Produces a sanitizer for a field, given its component context.
pub type SanitizerFactory = Arc<dyn Fn(&Context) -> Sanitizer + Send + Sync>;
/// Rewrites a component context before render.
pub type NormalizerFactory = Arc<dyn Fn(Context) -> Context + Send + Sync>;

/// Metadata produced by discovering a component.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ComponentDescriptor {
    /// Roles the component implements.
    pub roles: Roles,
    /// Diagnostic kind.
    pub kind: ComponentKind,
}

/// A renderable component.
///
/// Only [`alias`](Component::alias) and [`render`](Component::render) are
/// required. [`describe`](Component::describe) derives roles from which
/// factory accessors return `Some`; override it when computing that is
/// expensive, since discovery results may be cached.
pub trait Component: Send + Sync {
    /// Alias the component is registered under.
    fn alias(&self) -> &str;

    /// Render markup for a context.
    fn render(&self, context: &Context) -> Result<ComponentResult, ComponentError>;

    /// Diagnostic kind.
    fn kind(&self) -> ComponentKind {
        ComponentKind::Field
    }

    /// Builder-role factory.
    fn builder(&self) -> Option<BuilderFactory> {
        None
    }

    /// Validator-role factory.
    fn validator(&self) -> Option<ValidatorFactory> {
        None
    }

    /// Sanitizer-role factory.
    fn sanitizer(&self) -> Option<SanitizerFactory> {
        None
    }

    /// Normalizer-role factory.
    fn normalizer(&self) -> Option<NormalizerFactory> {
        None
    }

    /// Discover the component's roles and kind.
    fn describe(&self) -> ComponentDescriptor {
        ComponentDescriptor {
            roles: accessor_roles(self),
            kind: self.kind(),
        }
    }

    /// Token that changes whenever [`describe`](Component::describe) would
    /// return something different.
    ///
    /// It is part of the catalog cache key, so a cached catalog is never
    /// served for a component whose roles or kind changed. The default is
    /// computed from the factory accessors and [`kind`](Component::kind)
    /// without calling `describe`. Components that override `describe`
    /// should override this too, usually with a version number.
    fn revision(&self) -> u64 {
        u64::from(accessor_roles(self).bits()) | ((self.kind() as u64) << 8)
    }
}

fn accessor_roles<C: Component + ?Sized>(component: &C) -> Roles {
    let mut roles = Roles::empty();
    roles.set(Roles::NORMALIZER, component.normalizer().is_some());
    roles.set(Roles::BUILDER, component.builder().is_some());
    roles.set(Roles::VALIDATOR, component.validator().is_some());
    roles.set(Roles::SANITIZER, component.sanitizer().is_some());
    roles
}

/// A [`Component`] assembled from closures.
#[derive(Clone)]
pub struct FnComponent {
    alias: String,
    kind: ComponentKind,
    render: RenderFn,
    builder: Option<BuilderFactory>,
    validator: Option<ValidatorFactory>,
    sanitizer: Option<SanitizerFactory>,
    normalizer: Option<NormalizerFactory>,
}

impl fmt::Debug for FnComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnComponent")
            .field("alias", &self.alias)
            .field("kind", &self.kind)
            .field("builder", &self.builder.is_some())
            .field("validator", &self.validator.is_some())
            .field("sanitizer", &self.sanitizer.is_some())
            .field("normalizer", &self.normalizer.is_some())
            .finish_non_exhaustive()
    }
}

impl FnComponent {
    /// Wrap a render closure.
    pub fn new(
        alias: impl Into<String>,
        render: impl Fn(&Context) -> Result<ComponentResult, ComponentError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            alias: alias.into(),
            kind: ComponentKind::Field,
            render: Arc::new(render),
            builder: None,
            validator: None,
            sanitizer: None,
            normalizer: None,
        }
    }

    /// Set the diagnostic kind.
    pub fn with_kind(mut self, kind: ComponentKind) -> Self {
        self.kind = kind;
        self
    }

    /// Attach a builder factory.
    pub fn with_builder(mut self, f: impl Fn(&str) -> Context + Send + Sync + 'static) -> Self {
        self.builder = Some(Arc::new(f));
        self
    }

    /// Attach a validator factory.
    pub fn with_validator(
        mut self,
        f: impl Fn(&Context) -> Validator + Send + Sync + 'static,
    ) -> Self {
        self.validator = Some(Arc::new(f));
        self
    }

    /// Attach a sanitizer factory.
    pub fn with_sanitizer(
        mut self,
        f: impl Fn(&Context) -> Sanitizer + Send + Sync + 'static,
    ) -> Self {
        self.sanitizer = Some(Arc::new(f));
        self
    }

    /// Attach a normalizer.
    pub fn with_normalizer(mut self, f: impl Fn(Context) -> Context + Send + Sync + 'static) -> Self {
        self.normalizer = Some(Arc::new(f));
        self
    }
}

impl Component for FnComponent {
    fn alias(&self) -> &str {
        &self.alias
    }

    fn render(&self, context: &Context) -> Result<ComponentResult, ComponentError> {
        (self.render)(context)
    }

    fn kind(&self) -> ComponentKind {
        self.kind
    }

    fn builder(&self) -> Option<BuilderFactory> {
        self.builder.clone()
    }

    fn validator(&self) -> Option<ValidatorFactory> {
        self.validator.clone()
    }

    fn sanitizer(&self) -> Option<SanitizerFactory> {
        self.sanitizer.clone()
    }

    fn normalizer(&self) -> Option<NormalizerFactory> {
        self.normalizer.clone()
    }
}
