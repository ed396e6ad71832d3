// Copyright 2025 the Formwork Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Formwork Router: builder events and the update router.
//!
//! ## Overview
//!
//! Builders never touch the form state directly. Each chained call emits a
//! [`BuilderEvent`], and the [`UpdateRouter`] hands it to the handler
//! registered for its [`EventKind`]. The standard handlers upsert into the
//! [`Store`](formwork_store::Store) or register overrides with the
//! [`TemplateResolver`](formwork_templates::TemplateResolver), both held in
//! a [`FormState`].
//!
//! Events that cross a serialization boundary arrive as `(name, data)`
//! pairs; [`decode`] and [`UpdateRouter::dispatch_raw`] accept that form.
//!
//! ## Errors
//!
//! Missing ids and non-map contexts fail with [`RouteError`]. Malformed but
//! recoverable items are logged with `tracing` and skipped.
//!
//! ```rust
//! use formwork_router::{FormState, UpdateRouter};
//! use formwork_store::SectionKey;
//! use serde_json::json;
//!
//! let router = UpdateRouter::new();
//! let mut state = FormState::new();
//! for (id, order) in [("A", 30), ("B", 10), ("C", 20)] {
//!     router
//!         .dispatch_raw(
//!             &mut state,
//!             "field",
//!             &json!({
//!                 "container_id": "settings",
//!                 "section_id": "general",
//!                 "field_data": {"id": id, "component": "text", "order": order}
//!             }),
//!         )
//!         .unwrap();
//! }
//! let section = SectionKey::new("settings", "general");
//! let ids: Vec<_> = state.store.fields(&section).iter().map(|f| f.id().to_owned()).collect();
//! assert_eq!(ids, ["B", "C", "A"]);
//! ```

pub mod decode;
pub mod error;
pub mod event;
pub mod router;

pub use decode::decode;
pub use error::RouteError;
pub use event::{BuilderEvent, EventKind, TemplatePayload};
pub use router::{Fallback, FallbackPolicy, FormState, Handler, UpdateRouter, apply};
