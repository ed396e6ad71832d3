// Copyright 2025 the Formwork Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Manifest errors.

use crate::component::ComponentError;

/// Errors raised by the component manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// A component was registered with an empty alias.
    #[error("component alias must not be empty")]
    EmptyAlias,
    /// No component is registered under the alias.
    #[error("component not found: `{0}`")]
    ComponentNotFound(String),
    /// The component exists but has no builder factory.
    #[error("component `{0}` is registered but has no builder factory")]
    BuilderFactoryMissing(String),
    /// The component's render function failed.
    #[error("component `{alias}` failed to render: {source}")]
    Render {
        /// Alias that failed.
        alias: String,
        /// Underlying failure.
        #[source]
        source: ComponentError,
    },
}
