// Copyright 2025 the Formwork Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The composition boundary.
//!
//! [`compose`] runs a caller's build callback against a fresh [`Composer`].
//! A failure inside the callback does not propagate: an error or a panic is
//! logged with its chain and turned into [`Composition::Degraded`], which
//! renders an error notice in place of the form. This is the only place
//! errors are absorbed; everywhere else they reach the caller.

use std::any::Any;
use std::error::Error;
use std::panic::{AssertUnwindSafe, catch_unwind};

use formwork_manifest::{Cache, ManifestGeneric};
use formwork_router::{FormState, UpdateRouter};
use tracing::error;

use crate::builder::Composer;
use crate::defaults::escape;
use crate::error::{ComposeError, RenderError};
use crate::session::RenderSession;

/// Outcome of [`compose`].
#[derive(Debug)]
pub enum Composition {
    /// The build callback succeeded.
    Built(FormState),
    /// The build callback failed; render shows an error notice.
    Degraded {
        /// What went wrong.
        error: ComposeError,
    },
}

impl Composition {
    /// True if the form could not be built.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    /// Composed state, when the build succeeded.
    pub fn state(&self) -> Option<&FormState> {
        match self {
            Self::Built(state) => Some(state),
            Self::Degraded { .. } => None,
        }
    }

    /// Take the composed state, when the build succeeded.
    pub fn into_state(self) -> Option<FormState> {
        match self {
            Self::Built(state) => Some(state),
            Self::Degraded { .. } => None,
        }
    }

    /// Render a container, or the error notice when degraded.
    pub fn render<C: Cache>(
        &self,
        manifest: &ManifestGeneric<C>,
        container_id: &str,
    ) -> Result<String, RenderError> {
        match self {
            Self::Built(state) => RenderSession::new(manifest, state).render_container(container_id),
            Self::Degraded { error } => Ok(error_notice(error)),
        }
    }
}

/// Markup shown in place of a form that failed to build.
pub fn error_notice(error: &ComposeError) -> String {
    format!(
        r#"<div class="formwork-error" role="alert"><p>This form could not be built.</p><pre>{}</pre></div>"#,
        escape(&error.to_string())
    )
}

/// Build a form with `build`, absorbing callback failures.
///
/// A panic inside `build` is caught and reported as
/// [`ComposeError::Panicked`]; the partially composed state is discarded.
pub fn compose<C: Cache>(
    manifest: &ManifestGeneric<C>,
    router: UpdateRouter,
    build: impl FnOnce(&mut Composer<'_, C>) -> Result<(), ComposeError>,
) -> Composition {
    let mut composer = Composer::with_router(manifest, router);
    let outcome = catch_unwind(AssertUnwindSafe(|| build(&mut composer)))
        .unwrap_or_else(|payload| Err(ComposeError::Panicked(panic_message(&*payload))));
    match outcome {
        Ok(()) => Composition::Built(composer.into_state()),
        Err(err) => {
            let store = &composer.state().store;
            let chain: Vec<String> = std::iter::successors(err.source(), |e| (*e).source())
                .map(ToString::to_string)
                .collect();
            error!(
                error = %err,
                chain = ?chain,
                containers = ?store.containers().collect::<Vec<_>>(),
                fields = store.field_count(),
                "form composition failed; rendering error notice"
            );
            Composition::Degraded { error: err }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::register_default_templates;
    use formwork_manifest::{ComponentResult, Context, FnComponent, Manifest};
    use serde_json::json;

    fn manifest() -> Manifest {
        let mut m = Manifest::new();
        register_default_templates(&mut m).unwrap();
        m.register_component(
            FnComponent::new("text", |_: &Context| Ok(ComponentResult::markup("<input>")))
                .with_builder(|_| Context::new()),
        )
        .unwrap();
        m
    }

    #[test]
    fn successful_build_renders() {
        let m = manifest();
        let composition = compose(&m, UpdateRouter::new(), |c| {
            c.form("settings")
                .section("general")?
                .field("text", "site")?
                .label("Site")?;
            Ok(())
        });
        assert!(!composition.is_degraded());
        let html = composition.render(&m, "settings").unwrap();
        assert!(html.contains("<input>"));
    }

    #[test]
    fn callback_failure_degrades() {
        let m = manifest();
        let composition = compose(&m, UpdateRouter::new(), |c| {
            c.form("settings").section("general")?;
            Err(ComposeError::callback("options table unavailable"))
        });
        assert!(composition.is_degraded());
        assert!(composition.state().is_none());
        let html = composition.render(&m, "settings").unwrap();
        assert!(html.contains("options table unavailable"));
        assert!(html.starts_with(r#"<div class="formwork-error""#));
    }

    #[test]
    fn builder_errors_inside_callback_degrade() {
        let m = manifest();
        let composition = compose(&m, UpdateRouter::new(), |c| {
            c.dispatch_raw("field", &json!({"container_id": "settings"}))?;
            Ok(())
        });
        let Composition::Degraded { error } = composition else {
            panic!("expected degraded composition");
        };
        assert!(matches!(error, ComposeError::Route(_)));
    }

    #[test]
    fn panicking_callback_degrades() {
        let m = manifest();
        let composition = compose(&m, UpdateRouter::new(), |c| {
            c.form("settings").section("general")?;
            let options: Vec<&str> = Vec::new();
            assert!(!options.is_empty(), "no options for {}", "site");
            Ok(())
        });
        assert!(composition.is_degraded());
        let html = composition.render(&m, "settings").unwrap();
        assert!(html.contains("build callback panicked: no options for site"));

        let static_message = compose(&m, UpdateRouter::new(), |_| panic!("static message"));
        let Composition::Degraded { error } = static_message else {
            panic!("expected degraded composition");
        };
        assert!(matches!(&error, ComposeError::Panicked(message) if message == "static message"));
    }

    #[test]
    fn callback_error_keeps_its_source() {
        let m = manifest();
        let composition = compose(&m, UpdateRouter::new(), |_| {
            "twelve".parse::<u32>().map_err(ComposeError::callback)?;
            Ok(())
        });
        let Composition::Degraded { error } = composition else {
            panic!("expected degraded composition");
        };
        let source = error.source().expect("callback error has a source");
        assert!(source.downcast_ref::<std::num::ParseIntError>().is_some());
        assert!(error.to_string().starts_with("build callback failed: invalid digit"));
    }
}
