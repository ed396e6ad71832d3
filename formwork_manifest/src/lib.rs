// Copyright 2025 the Formwork Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Formwork Manifest: the registry of renderable components.
//!
//! ## Overview
//!
//! A [`Manifest`] maps a component alias to a [`Component`]: a render
//! function plus optional builder, validator, sanitizer and normalizer
//! factories. Rendering an unknown alias fails loudly with
//! [`ManifestError::ComponentNotFound`]; asking for the builder factory of a
//! component that has none fails with [`ManifestError::BuilderFactoryMissing`].
//!
//! ## Discovery and caching
//!
//! Which components implement which [`Roles`] is discovered into a
//! [`Catalog`]. Discovery may be served from a [`Cache`] depending on the
//! [`Environment`]: production memoizes and writes through, development
//! always re-runs. The cache is purely an optimization; every read returns
//! the same answer with or without it, and after [`ManifestGeneric::clear_cache`].
//!
//! ## Example
//!
//! ```rust
//! use formwork_manifest::{ComponentResult, Context, FnComponent, Manifest, validator};
//!
//! let mut manifest = Manifest::new();
//! manifest
//!     .register_component(
//!         FnComponent::new("text", |ctx: &Context| {
//!             let name = ctx.get("name").and_then(|v| v.as_str()).unwrap_or_default();
//!             Ok(ComponentResult::markup(format!("<input type=\"text\" name=\"{name}\">")))
//!         })
//!         .with_validator(|_| validator(|v| if v.is_string() { Ok(()) } else { Err("expected text".into()) })),
//!     )
//!     .unwrap();
//!
//! let mut ctx = Context::new();
//! ctx.insert("name".into(), "title".into());
//! assert_eq!(manifest.render("text", &ctx).unwrap().markup, "<input type=\"text\" name=\"title\">");
//! assert!(manifest.is_component_schema_eligible("text"));
//! assert!(manifest.render("missing", &ctx).is_err());
//! ```

pub mod cache;
pub mod catalog;
pub mod component;
pub mod context;
pub mod environment;
pub mod error;
pub mod manifest;

pub use cache::{Cache, MemoryCache, NoCache};
pub use catalog::Catalog;
pub use component::{
    AssetDescriptor, AssetKind, BuilderFactory, Component, ComponentDescriptor, ComponentError,
    ComponentKind, ComponentResult, FnComponent, NormalizerFactory, RenderFn, Roles, Sanitizer,
    SanitizerFactory, Validator, ValidatorFactory, sanitizer, validator,
};
pub use context::{Callback, Context, merge_into};
pub use environment::Environment;
pub use error::ManifestError;
pub use manifest::{DEFAULT_CACHE_PREFIX, Manifest, ManifestGeneric};
