// Copyright 2025 the Formwork Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Formwork Store: the canonical ordered form tree.
//!
//! ## Overview
//!
//! The [`Store`] holds containers (pages or collections), their sections,
//! groups and fieldsets, fields, and per-container submit-control zones. It
//! is an arena of flat tables addressed by composite keys ([`SectionKey`],
//! [`GroupKey`], [`FieldKey`]) rather than nested maps.
//!
//! Entities are created by the first update that references them and
//! mutated by later updates with the same key. There is no deletion API.
//!
//! ## Ordering
//!
//! Every new entity takes the next value of an insertion counter. Render
//! order is `(order ascending, index ascending)`; elements without an order
//! sort as [`DEFAULT_ORDER`].
//!
//! ## Upserts
//!
//! - Section and group metadata: set fields overwrite, unset fields keep
//!   their previous values.
//! - Fields: keyed on id within the parent scope. An update keeps the
//!   original index, replaces label, component, context and hooks, and keeps
//!   the stored order unless the update carries one.
//!
//! ```rust
//! use formwork_store::{FieldSpec, SectionKey, Store};
//!
//! let mut store = Store::new();
//! let section = SectionKey::new("settings", "general");
//! for (id, order) in [("A", 30), ("B", 10), ("C", 20)] {
//!     store.upsert_field(&section, None, FieldSpec::new(id, "text").with_order(order)).unwrap();
//! }
//! let ids: Vec<_> = store.fields(&section).iter().map(|f| f.id().to_owned()).collect();
//! assert_eq!(ids, ["B", "C", "A"]);
//! ```

pub mod error;
pub mod store;
pub mod types;

pub use error::StoreError;
pub use store::{FieldMetadata, Store, Upsert};
pub use types::{
    DEFAULT_ORDER, Description, Field, FieldKey, FieldSpec, Group, GroupKey, GroupKind, GroupMeta,
    Ordered, Section, SectionKey, SectionMeta, SubmitControl, SubmitZone,
};
