// Copyright 2025 the Formwork Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Routing errors.

use formwork_store::StoreError;
use formwork_templates::{TemplateError, UnknownElementType};

/// Errors raised while decoding or applying builder events.
///
/// Recoverable payload problems are logged and skipped instead; everything
/// here is a composition bug in calling code.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    /// A required identifier was absent or empty.
    #[error("`{event}` event is missing required identifier `{key}`")]
    MissingIdentifier {
        /// Event name.
        event: String,
        /// Missing key.
        key: &'static str,
    },
    /// The payload or a field's `component_context` was not a map.
    #[error("invalid context in `{event}` event: {reason}")]
    InvalidContext {
        /// Event name.
        event: String,
        /// What was wrong.
        reason: String,
    },
    /// A template override named an unknown element type.
    #[error(transparent)]
    ElementType(#[from] UnknownElementType),
    /// No fallback accepted an unrecognized event.
    #[error("unknown builder event `{0}`")]
    UnknownEvent(String),
    /// The state store rejected the update.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The template resolver rejected the update.
    #[error(transparent)]
    Template(#[from] TemplateError),
}
