// Copyright 2025 the Formwork Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render, composition, and configuration errors.

use std::error::Error;

use formwork_manifest::ManifestError;
use formwork_manifest::environment::UnknownEnvironment;
use formwork_router::RouteError;
use formwork_templates::TemplateError;

/// Errors raised while rendering.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Template resolution failed.
    #[error(transparent)]
    Template(#[from] TemplateError),
    /// The manifest could not render a component.
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    /// The container has never been referenced by an update.
    #[error("unknown container `{0}`")]
    UnknownContainer(String),
}

/// Errors raised while composing a form.
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    /// A builder event was rejected.
    #[error(transparent)]
    Route(#[from] RouteError),
    /// A builder referenced a component it cannot use.
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    /// The caller's build callback failed.
    #[error("build callback failed: {0}")]
    Callback(#[source] Box<dyn Error + Send + Sync>),
    /// The caller's build callback panicked.
    #[error("build callback panicked: {0}")]
    Panicked(String),
}

impl ComposeError {
    /// A failure raised by caller code inside a build callback.
    ///
    /// Accepts a message or any error; an error is kept as the
    /// [`source`](Error::source) so its chain survives.
    pub fn callback(error: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        Self::Callback(error.into())
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration document is not valid JSON for [`FormworkConfig`](crate::FormworkConfig).
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
    /// An environment name was not recognized.
    #[error(transparent)]
    Environment(#[from] UnknownEnvironment),
}
