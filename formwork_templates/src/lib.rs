// Copyright 2025 the Formwork Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Formwork Templates: which template renders which slot.
//!
//! ## Overview
//!
//! Every visual wrapper of a form (root, section, group, field, submit
//! controls) is a [`Slot`]. A [`TemplateResolver`] maps slots to template keys
//! through two override tiers:
//!
//! - form-wide defaults, shared by every element;
//! - per-element overrides, keyed by [`ElementType`] and element id.
//!
//! Resolution walks the element's ancestry from most to least specific and
//! stops at the first tier that names the slot. See [`resolver`] for the
//! exact precedence.
//!
//! ```rust
//! use formwork_templates::{ElementType, Slot, TemplateContext, TemplateResolver};
//!
//! let mut templates = TemplateResolver::new();
//! templates
//!     .set_form_defaults([(Slot::FieldWrapper, "default.field".to_owned())])
//!     .unwrap();
//! templates
//!     .set_overrides(ElementType::Field, "F", [(Slot::FieldWrapper, "custom.field".to_owned())])
//!     .unwrap();
//!
//! let f = TemplateContext::root("page").section("S").field("F");
//! let g = TemplateContext::root("page").section("S").field("G");
//! assert_eq!(templates.resolve_template(&Slot::FieldWrapper, &f).unwrap(), "custom.field");
//! assert_eq!(templates.resolve_template(&Slot::FieldWrapper, &g).unwrap(), "default.field");
//! ```

pub mod error;
pub mod resolver;
pub mod types;

pub use error::TemplateError;
pub use resolver::{Resolved, TemplateResolver};
pub use types::{ElementType, OverrideMap, Slot, TemplateContext, Tier, UnknownElementType};
