// Copyright 2025 the Formwork Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Formwork Render: composing and rendering forms.
//!
//! ## Overview
//!
//! This crate ties the lower layers together:
//!
//! - [`builder`]: fluent builders that emit builder events through the
//!   [`UpdateRouter`](formwork_router::UpdateRouter).
//! - [`compose`](crate::compose()): the composition boundary that absorbs
//!   build-callback failures into an error notice.
//! - [`session`]: the [`RenderSession`], which resolves templates, renders
//!   components, and collects assets.
//! - [`assets`]: the deduplicating [`AssetBucket`] and the [`AssetSink`]
//!   collaborator it flushes to.
//! - [`schema`]: validators and sanitizers derived from the composed fields.
//! - [`defaults`]: wrapper components for the library fallback templates.
//! - [`config`]: [`FormworkConfig`].
//!
//! ## Example
//!
//! ```rust
//! use formwork_manifest::{ComponentResult, Context, FnComponent, Manifest};
//! use formwork_render::{RenderSession, compose, register_default_templates};
//! use formwork_router::UpdateRouter;
//!
//! let mut manifest = Manifest::new();
//! register_default_templates(&mut manifest).unwrap();
//! manifest
//!     .register_component(
//!         FnComponent::new("text", |ctx: &Context| {
//!             let name = ctx.get("name").and_then(|v| v.as_str()).unwrap_or_default();
//!             Ok(ComponentResult::markup(format!(r#"<input name="{name}">"#)))
//!         })
//!         .with_builder(|_| Context::new()),
//!     )
//!     .unwrap();
//!
//! let composition = compose(&manifest, UpdateRouter::new(), |c| {
//!     let mut form = c.form("settings");
//!     let mut section = form.section("general")?.title("General")?;
//!     section.field("text", "site_name")?.label("Site name")?;
//!     Ok(())
//! });
//!
//! let state = composition.state().unwrap();
//! let mut session = RenderSession::new(&manifest, state);
//! let html = session.render_container("settings").unwrap();
//! assert!(html.contains(r#"<input name="site_name">"#));
//! assert!(html.contains("<h2>General</h2>"));
//!
//! let mut enqueued: Vec<formwork_manifest::AssetDescriptor> = Vec::new();
//! assert_eq!(session.enqueue_assets(&mut enqueued), 1);
//! assert_eq!(session.enqueue_assets(&mut enqueued), 0);
//! ```

pub mod assets;
pub mod builder;
pub mod compose;
pub mod config;
pub mod defaults;
pub mod error;
pub mod schema;
pub mod session;

pub use assets::{AssetBucket, AssetSink};
pub use builder::{
    Composer, FieldBuilder, FormBuilder, GroupBuilder, SectionBuilder, SubmitControlsBuilder,
};
pub use compose::{Composition, compose, error_notice};
pub use config::FormworkConfig;
pub use defaults::register_default_templates;
pub use error::{ComposeError, ConfigError, RenderError};
pub use schema::{SchemaBundle, Violation};
pub use session::RenderSession;
