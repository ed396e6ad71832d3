// Copyright 2025 the Formwork Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Store errors.

/// Errors raised by [`Store`](crate::Store) mutations.
///
/// All of these indicate a composition bug in calling code.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A required identifier was empty.
    #[error("missing required identifier `{0}`")]
    MissingIdentifier(&'static str),
    /// A submit control failed validation.
    #[error("invalid submit control: {0}")]
    InvalidControl(String),
    /// A field-targeted helper named a field that does not exist.
    #[error("field not found: `{0}`")]
    FieldNotFound(String),
}
