// Copyright 2025 the Formwork Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Router implementation.
//!
//! ## Overview
//!
//! Looks up a handler by exact [`EventKind`] and runs it against the
//! [`FormState`]. Every kind starts with a standard handler that applies the
//! event to the store or the template resolver; [`UpdateRouter::register`]
//! replaces one.
//!
//! ## Unknown events
//!
//! [`BuilderEvent::Other`] never reaches a kind handler. It goes to the
//! fallback installed with [`UpdateRouter::set_fallback`], or, when none is
//! installed, is handled according to the [`FallbackPolicy`]. No event is
//! dropped silently.

use std::collections::HashMap;
use std::fmt;

use formwork_store::Store;
use formwork_templates::{ElementType, TemplateResolver};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::decode::decode;
use crate::error::RouteError;
use crate::event::{BuilderEvent, EventKind, TemplatePayload};

/// Mutable state the standard handlers write into.
#[derive(Debug, Default)]
pub struct FormState {
    /// The form tree.
    pub store: Store,
    /// Template overrides.
    pub templates: TemplateResolver,
}

impl FormState {
    /// Empty state.
    pub fn new() -> Self {
        Self::default()
    }
}

/// What happens to unrecognized events when no fallback is installed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackPolicy {
    /// Log a warning and continue.
    #[default]
    Log,
    /// Fail with [`RouteError::UnknownEvent`].
    Reject,
}

/// A kind handler.
pub type Handler = Box<dyn Fn(&mut FormState, BuilderEvent) -> Result<(), RouteError>>;

/// The fallback handler, called with `(name, payload)`.
pub type Fallback = Box<dyn Fn(&str, &Value) -> Result<(), RouteError>>;

/// Dispatches builder events to per-kind handlers.
pub struct UpdateRouter {
    handlers: HashMap<EventKind, Handler>,
    fallback: Option<Fallback>,
    policy: FallbackPolicy,
}

impl fmt::Debug for UpdateRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateRouter")
            .field("handlers", &self.handlers.len())
            .field("fallback", &self.fallback.is_some())
            .field("policy", &self.policy)
            .finish()
    }
}

impl Default for UpdateRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl UpdateRouter {
    /// A router with the standard handler for every kind.
    pub fn new() -> Self {
        Self::with_policy(FallbackPolicy::default())
    }

    /// A router with the standard handlers and an unknown-event policy.
    pub fn with_policy(policy: FallbackPolicy) -> Self {
        let handlers = EventKind::ALL
            .into_iter()
            .map(|k| (k, Box::new(apply) as Handler))
            .collect();
        Self {
            handlers,
            fallback: None,
            policy,
        }
    }

    /// Replace the handler for one kind.
    pub fn register(
        &mut self,
        kind: EventKind,
        handler: impl Fn(&mut FormState, BuilderEvent) -> Result<(), RouteError> + 'static,
    ) {
        self.handlers.insert(kind, Box::new(handler));
    }

    /// Install a fallback for unrecognized events.
    pub fn set_fallback(
        &mut self,
        fallback: impl Fn(&str, &Value) -> Result<(), RouteError> + 'static,
    ) {
        self.fallback = Some(Box::new(fallback));
    }

    /// Remove the fallback; the policy applies again.
    pub fn clear_fallback(&mut self) {
        self.fallback = None;
    }

    /// Set the unknown-event policy.
    pub fn set_policy(&mut self, policy: FallbackPolicy) {
        self.policy = policy;
    }

    /// Current unknown-event policy.
    pub fn policy(&self) -> FallbackPolicy {
        self.policy
    }

    /// Route one event.
    pub fn dispatch(&self, state: &mut FormState, event: BuilderEvent) -> Result<(), RouteError> {
        let Some(kind) = event.kind() else {
            let BuilderEvent::Other { name, data } = event else {
                return Ok(());
            };
            return self.unknown(&name, &data);
        };
        debug!(event = kind.name(), "dispatch");
        match self.handlers.get(&kind) {
            Some(handler) => handler(state, event),
            None => apply(state, event),
        }
    }

    /// Decode a wire event and route it.
    pub fn dispatch_raw(
        &self,
        state: &mut FormState,
        name: &str,
        data: &Value,
    ) -> Result<(), RouteError> {
        self.dispatch(state, decode(name, data)?)
    }

    fn unknown(&self, name: &str, data: &Value) -> Result<(), RouteError> {
        if let Some(fallback) = &self.fallback {
            return fallback(name, data);
        }
        match self.policy {
            FallbackPolicy::Log => {
                warn!(event = name, "no handler for builder event");
                Ok(())
            }
            FallbackPolicy::Reject => Err(RouteError::UnknownEvent(name.to_owned())),
        }
    }
}

/// The standard handler: apply an event to the store or resolver.
pub fn apply(state: &mut FormState, event: BuilderEvent) -> Result<(), RouteError> {
    let FormState { store, templates } = state;
    match event {
        BuilderEvent::Section { key, meta } | BuilderEvent::SectionMetadata { key, meta } => {
            store.set_section(key, meta)?;
        }
        BuilderEvent::Field { section, field } => {
            store.upsert_field(&section, None, field)?;
        }
        BuilderEvent::Group { key, meta } | BuilderEvent::GroupMetadata { key, meta } => {
            store.set_group(key, meta)?;
        }
        BuilderEvent::GroupField { group, field } => {
            store.upsert_field(&group.section(), Some(&group.group_id), field)?;
        }
        BuilderEvent::TemplateOverride {
            element_type,
            element_id,
            payload,
        } => match payload {
            TemplatePayload::Overrides(o) => templates.set_overrides(element_type, &element_id, o)?,
            TemplatePayload::Callback(cb) if element_type == ElementType::Root => {
                templates.set_root_callback(&element_id, cb)?;
            }
            TemplatePayload::Callback(_) => {
                warn!(
                    element = element_type.as_str(),
                    %element_id,
                    "render callbacks are only honored for roots; skipped"
                );
            }
        },
        BuilderEvent::FormDefaultsOverride { overrides } => templates.set_form_defaults(overrides)?,
        BuilderEvent::SubmitControlsZone {
            container_id,
            zone_id,
            before,
            after,
        } => store.set_submit_zone(&container_id, &zone_id, before, after)?,
        BuilderEvent::SubmitControlsSet {
            container_id,
            zone_id,
            controls,
        } => store.set_submit_controls(&container_id, &zone_id, controls)?,
        BuilderEvent::SectionCleanup { section_id } => {
            if !store.cleanup_section(&section_id) {
                warn!(%section_id, "cleanup for a section that is not active");
            }
        }
        BuilderEvent::Other { name, .. } => {
            warn!(event = %name, "standard handler cannot apply a custom event");
        }
    }
    Ok(())
}
