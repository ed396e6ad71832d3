// Copyright 2025 the Formwork Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Template resolution errors.

/// Errors raised while registering or resolving template overrides.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// An override mapped a slot to an empty template key.
    #[error("empty template key for slot `{0}`")]
    EmptyTemplateKey(String),
    /// A required identifier was empty.
    #[error("missing required identifier `{0}`")]
    MissingIdentifier(&'static str),
    /// No tier and no library fallback supplied a template for the slot.
    #[error("no template for slot `{0}`")]
    NoTemplate(String),
}
