// Copyright 2025 the Formwork Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fluent form builders.
//!
//! ## Overview
//!
//! A [`Composer`] owns the [`FormState`] and the [`UpdateRouter`]. Builders
//! borrow it and turn every chained call into a [`BuilderEvent`]:
//!
//! - [`FormBuilder`] for a container (page or collection),
//! - [`SectionBuilder`], [`GroupBuilder`] and [`FieldBuilder`] below it,
//! - [`SubmitControlsBuilder`] for the container's submit zone.
//!
//! Since events are upserts, repeating a chain leaves the form unchanged.
//! Setters consume the builder and hand it back, so chains read
//! `section.title("General")?.order(5)?`.
//!
//! ## Fields
//!
//! [`SectionBuilder::field`] and [`GroupBuilder::field`] look the component
//! alias up in the manifest. An unknown alias fails with
//! [`ManifestError::ComponentNotFound`](formwork_manifest::ManifestError::ComponentNotFound),
//! an alias without a builder factory with
//! [`ManifestError::BuilderFactoryMissing`](formwork_manifest::ManifestError::BuilderFactoryMissing).
//! The factory supplies the field's initial `component_context`.

use formwork_manifest::{Cache, Callback, Context, ManifestGeneric, MemoryCache, merge_into};
use formwork_router::{BuilderEvent, FormState, TemplatePayload, UpdateRouter};
use formwork_store::{
    Description, FieldSpec, GroupKey, GroupKind, GroupMeta, SectionKey, SectionMeta,
    SubmitControl,
};
use formwork_templates::{ElementType, Slot};
use serde_json::Value;

use crate::error::ComposeError;

/// Owns the form state while builders fill it.
pub struct Composer<'m, C: Cache = MemoryCache> {
    manifest: &'m ManifestGeneric<C>,
    router: UpdateRouter,
    state: FormState,
}

impl<C: Cache> core::fmt::Debug for Composer<'_, C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Composer")
            .field("router", &self.router)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<'m, C: Cache> Composer<'m, C> {
    /// A composer with the standard router.
    pub fn new(manifest: &'m ManifestGeneric<C>) -> Self {
        Self::with_router(manifest, UpdateRouter::new())
    }

    /// A composer dispatching through `router`.
    pub fn with_router(manifest: &'m ManifestGeneric<C>, router: UpdateRouter) -> Self {
        Self {
            manifest,
            router,
            state: FormState::new(),
        }
    }

    /// The component manifest.
    pub fn manifest(&self) -> &'m ManifestGeneric<C> {
        self.manifest
    }

    /// The router, for registering handlers or a fallback.
    pub fn router_mut(&mut self) -> &mut UpdateRouter {
        &mut self.router
    }

    /// State composed so far.
    pub fn state(&self) -> &FormState {
        &self.state
    }

    /// Finish and take the state.
    pub fn into_state(self) -> FormState {
        self.state
    }

    /// Route one event.
    pub fn dispatch(&mut self, event: BuilderEvent) -> Result<(), ComposeError> {
        self.router.dispatch(&mut self.state, event)?;
        Ok(())
    }

    /// Decode and route one wire event.
    pub fn dispatch_raw(&mut self, name: &str, data: &Value) -> Result<(), ComposeError> {
        self.router.dispatch_raw(&mut self.state, name, data)?;
        Ok(())
    }

    /// Set a form-wide default template for a slot.
    pub fn form_default(
        &mut self,
        slot: impl Into<Slot>,
        template: impl Into<String>,
    ) -> Result<&mut Self, ComposeError> {
        self.dispatch(BuilderEvent::FormDefaultsOverride {
            overrides: vec![(slot.into(), template.into())],
        })?;
        Ok(self)
    }

    /// Start building a container.
    pub fn form(&mut self, container_id: impl Into<String>) -> FormBuilder<'_, 'm, C> {
        FormBuilder {
            composer: self,
            container_id: container_id.into(),
        }
    }
}

fn template_event(
    element_type: ElementType,
    element_id: &str,
    slot: Slot,
    template: String,
) -> BuilderEvent {
    BuilderEvent::TemplateOverride {
        element_type,
        element_id: element_id.to_owned(),
        payload: TemplatePayload::Overrides(vec![(slot, template)]),
    }
}

/// Builds one container.
#[derive(Debug)]
pub struct FormBuilder<'c, 'm, C: Cache = MemoryCache> {
    composer: &'c mut Composer<'m, C>,
    container_id: String,
}

impl<'m, C: Cache> FormBuilder<'_, 'm, C> {
    /// Container id.
    pub fn id(&self) -> &str {
        &self.container_id
    }

    /// Add or revisit a section.
    pub fn section(
        &mut self,
        section_id: impl Into<String>,
    ) -> Result<SectionBuilder<'_, 'm, C>, ComposeError> {
        let key = SectionKey::new(self.container_id.clone(), section_id);
        self.composer.dispatch(BuilderEvent::Section {
            key: key.clone(),
            meta: SectionMeta::default(),
        })?;
        Ok(SectionBuilder {
            composer: &mut *self.composer,
            key,
        })
    }

    /// Configure the submit zone.
    pub fn submit_controls(
        &mut self,
        zone_id: impl Into<String>,
    ) -> Result<SubmitControlsBuilder<'_, 'm, C>, ComposeError> {
        let zone_id = zone_id.into();
        self.composer.dispatch(BuilderEvent::SubmitControlsZone {
            container_id: self.container_id.clone(),
            zone_id: zone_id.clone(),
            before: None,
            after: None,
        })?;
        Ok(SubmitControlsBuilder {
            composer: &mut *self.composer,
            container_id: self.container_id.clone(),
            zone_id,
        })
    }

    /// Override a template for this container.
    pub fn template(
        self,
        slot: impl Into<Slot>,
        template: impl Into<String>,
    ) -> Result<Self, ComposeError> {
        self.composer.dispatch(template_event(
            ElementType::Root,
            &self.container_id,
            slot.into(),
            template.into(),
        ))?;
        Ok(self)
    }

    /// Render the container with `callback` instead of the root wrapper template.
    pub fn render_with(self, callback: Callback) -> Result<Self, ComposeError> {
        self.composer.dispatch(BuilderEvent::TemplateOverride {
            element_type: ElementType::Root,
            element_id: self.container_id.clone(),
            payload: TemplatePayload::Callback(callback),
        })?;
        Ok(self)
    }
}

/// Builds one section.
#[derive(Debug)]
pub struct SectionBuilder<'c, 'm, C: Cache = MemoryCache> {
    composer: &'c mut Composer<'m, C>,
    key: SectionKey,
}

impl<'m, C: Cache> SectionBuilder<'_, 'm, C> {
    /// Section address.
    pub fn key(&self) -> &SectionKey {
        &self.key
    }

    fn meta(self, meta: SectionMeta) -> Result<Self, ComposeError> {
        self.composer.dispatch(BuilderEvent::SectionMetadata {
            key: self.key.clone(),
            meta,
        })?;
        Ok(self)
    }

    /// Set the heading.
    pub fn title(self, title: impl Into<String>) -> Result<Self, ComposeError> {
        self.meta(SectionMeta {
            title: Some(title.into()),
            ..SectionMeta::default()
        })
    }

    /// Set the description text or callback.
    pub fn description(self, description: impl Into<Description>) -> Result<Self, ComposeError> {
        self.meta(SectionMeta {
            description: Some(description.into()),
            ..SectionMeta::default()
        })
    }

    /// Set the sort order.
    pub fn order(self, order: i64) -> Result<Self, ComposeError> {
        self.meta(SectionMeta {
            order: Some(order),
            ..SectionMeta::default()
        })
    }

    /// Set the style token.
    pub fn style(self, style: impl Into<String>) -> Result<Self, ComposeError> {
        self.meta(SectionMeta {
            style: Some(style.into()),
            ..SectionMeta::default()
        })
    }

    /// Render `hook` before the section.
    pub fn before(self, hook: Callback) -> Result<Self, ComposeError> {
        self.meta(SectionMeta {
            before: Some(hook),
            ..SectionMeta::default()
        })
    }

    /// Render `hook` after the section.
    pub fn after(self, hook: Callback) -> Result<Self, ComposeError> {
        self.meta(SectionMeta {
            after: Some(hook),
            ..SectionMeta::default()
        })
    }

    /// Override a template for this section.
    pub fn template(
        self,
        slot: impl Into<Slot>,
        template: impl Into<String>,
    ) -> Result<Self, ComposeError> {
        self.composer.dispatch(template_event(
            ElementType::Section,
            &self.key.section_id,
            slot.into(),
            template.into(),
        ))?;
        Ok(self)
    }

    /// Add or revisit a field rendered by component `alias`.
    pub fn field(
        &mut self,
        alias: &str,
        field_id: impl Into<String>,
    ) -> Result<FieldBuilder<'_, 'm, C>, ComposeError> {
        FieldBuilder::start(&mut *self.composer, self.key.clone(), None, alias, field_id.into())
    }

    /// Add or revisit a plain group.
    pub fn group(
        &mut self,
        group_id: impl Into<String>,
    ) -> Result<GroupBuilder<'_, 'm, C>, ComposeError> {
        self.start_group(group_id.into(), GroupKind::Group)
    }

    /// Add or revisit a fieldset.
    pub fn fieldset(
        &mut self,
        group_id: impl Into<String>,
    ) -> Result<GroupBuilder<'_, 'm, C>, ComposeError> {
        self.start_group(group_id.into(), GroupKind::Fieldset)
    }

    fn start_group(
        &mut self,
        group_id: String,
        kind: GroupKind,
    ) -> Result<GroupBuilder<'_, 'm, C>, ComposeError> {
        let key = GroupKey::new(
            self.key.container_id.clone(),
            self.key.section_id.clone(),
            group_id,
        );
        self.composer.dispatch(BuilderEvent::Group {
            key: key.clone(),
            meta: GroupMeta {
                kind: Some(kind),
                ..GroupMeta::default()
            },
        })?;
        Ok(GroupBuilder {
            composer: &mut *self.composer,
            key,
        })
    }
}

/// Builds one group or fieldset.
#[derive(Debug)]
pub struct GroupBuilder<'c, 'm, C: Cache = MemoryCache> {
    composer: &'c mut Composer<'m, C>,
    key: GroupKey,
}

impl<'m, C: Cache> GroupBuilder<'_, 'm, C> {
    /// Group address.
    pub fn key(&self) -> &GroupKey {
        &self.key
    }

    fn meta(self, meta: GroupMeta) -> Result<Self, ComposeError> {
        self.composer.dispatch(BuilderEvent::GroupMetadata {
            key: self.key.clone(),
            meta,
        })?;
        Ok(self)
    }

    /// Set the heading or legend.
    pub fn title(self, title: impl Into<String>) -> Result<Self, ComposeError> {
        self.meta(GroupMeta {
            title: Some(title.into()),
            ..GroupMeta::default()
        })
    }

    /// Set the description text or callback.
    pub fn description(self, description: impl Into<Description>) -> Result<Self, ComposeError> {
        self.meta(GroupMeta {
            description: Some(description.into()),
            ..GroupMeta::default()
        })
    }

    /// Set the sort order.
    pub fn order(self, order: i64) -> Result<Self, ComposeError> {
        self.meta(GroupMeta {
            order: Some(order),
            ..GroupMeta::default()
        })
    }

    /// Set the style token.
    pub fn style(self, style: impl Into<String>) -> Result<Self, ComposeError> {
        self.meta(GroupMeta {
            style: Some(style.into()),
            ..GroupMeta::default()
        })
    }

    /// Mark the group as required.
    pub fn required(self, required: bool) -> Result<Self, ComposeError> {
        self.meta(GroupMeta {
            required: Some(required),
            ..GroupMeta::default()
        })
    }

    /// Fieldset `form` attribute.
    pub fn form(self, form: impl Into<String>) -> Result<Self, ComposeError> {
        self.meta(GroupMeta {
            form: Some(form.into()),
            ..GroupMeta::default()
        })
    }

    /// Fieldset `name` attribute.
    pub fn name(self, name: impl Into<String>) -> Result<Self, ComposeError> {
        self.meta(GroupMeta {
            name: Some(name.into()),
            ..GroupMeta::default()
        })
    }

    /// Fieldset `disabled` attribute.
    pub fn disabled(self, disabled: bool) -> Result<Self, ComposeError> {
        self.meta(GroupMeta {
            disabled: Some(disabled),
            ..GroupMeta::default()
        })
    }

    /// Render `hook` before the group.
    pub fn before(self, hook: Callback) -> Result<Self, ComposeError> {
        self.meta(GroupMeta {
            before: Some(hook),
            ..GroupMeta::default()
        })
    }

    /// Render `hook` after the group.
    pub fn after(self, hook: Callback) -> Result<Self, ComposeError> {
        self.meta(GroupMeta {
            after: Some(hook),
            ..GroupMeta::default()
        })
    }

    /// Override a template for this group.
    pub fn template(
        self,
        slot: impl Into<Slot>,
        template: impl Into<String>,
    ) -> Result<Self, ComposeError> {
        self.composer.dispatch(template_event(
            ElementType::Group,
            &self.key.group_id,
            slot.into(),
            template.into(),
        ))?;
        Ok(self)
    }

    /// Add or revisit a field inside the group.
    pub fn field(
        &mut self,
        alias: &str,
        field_id: impl Into<String>,
    ) -> Result<FieldBuilder<'_, 'm, C>, ComposeError> {
        let section = self.key.section();
        let group = Some(self.key.group_id.clone());
        FieldBuilder::start(&mut *self.composer, section, group, alias, field_id.into())
    }
}

/// Builds one field.
///
/// Every setter re-sends the whole field, so the stored record always
/// matches the builder.
#[derive(Debug)]
pub struct FieldBuilder<'c, 'm, C: Cache = MemoryCache> {
    composer: &'c mut Composer<'m, C>,
    section: SectionKey,
    group_id: Option<String>,
    spec: FieldSpec,
}

impl<'c, 'm, C: Cache> FieldBuilder<'c, 'm, C> {
    fn start(
        composer: &'c mut Composer<'m, C>,
        section: SectionKey,
        group_id: Option<String>,
        alias: &str,
        field_id: String,
    ) -> Result<Self, ComposeError> {
        let factory = composer.manifest.builder_factory(alias)?;
        let defaults = factory(&field_id);
        let builder = Self {
            composer,
            section,
            group_id,
            spec: FieldSpec::new(field_id, alias).with_context(defaults),
        };
        builder.emit()
    }

    fn emit(self) -> Result<Self, ComposeError> {
        let field = self.spec.clone();
        let event = match &self.group_id {
            Some(g) => BuilderEvent::GroupField {
                group: GroupKey::new(
                    self.section.container_id.clone(),
                    self.section.section_id.clone(),
                    g.clone(),
                ),
                field,
            },
            None => BuilderEvent::Field {
                section: self.section.clone(),
                field,
            },
        };
        self.composer.dispatch(event)?;
        Ok(self)
    }

    /// The field as last sent.
    pub fn spec(&self) -> &FieldSpec {
        &self.spec
    }

    /// Set the label.
    pub fn label(mut self, label: impl Into<String>) -> Result<Self, ComposeError> {
        self.spec.label = Some(label.into());
        self.emit()
    }

    /// Set the sort order.
    pub fn order(mut self, order: i64) -> Result<Self, ComposeError> {
        self.spec.order = Some(order);
        self.emit()
    }

    /// Set one component context key.
    pub fn context(
        mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Self, ComposeError> {
        self.spec.component_context.insert(key.into(), value.into());
        self.emit()
    }

    /// Merge several component context keys.
    pub fn apply_context(mut self, extra: &Context) -> Result<Self, ComposeError> {
        merge_into(&mut self.spec.component_context, extra);
        self.emit()
    }

    /// Render `hook` before the field.
    pub fn before(mut self, hook: Callback) -> Result<Self, ComposeError> {
        self.spec.before = Some(hook);
        self.emit()
    }

    /// Render `hook` after the field.
    pub fn after(mut self, hook: Callback) -> Result<Self, ComposeError> {
        self.spec.after = Some(hook);
        self.emit()
    }

    /// Override a template for this field.
    pub fn template(
        self,
        slot: impl Into<Slot>,
        template: impl Into<String>,
    ) -> Result<Self, ComposeError> {
        self.composer.dispatch(template_event(
            ElementType::Field,
            &self.spec.id,
            slot.into(),
            template.into(),
        ))?;
        Ok(self)
    }
}

/// Builds a container's submit zone.
#[derive(Debug)]
pub struct SubmitControlsBuilder<'c, 'm, C: Cache = MemoryCache> {
    composer: &'c mut Composer<'m, C>,
    container_id: String,
    zone_id: String,
}

impl<C: Cache> SubmitControlsBuilder<'_, '_, C> {
    fn zone(self, before: Option<Callback>, after: Option<Callback>) -> Result<Self, ComposeError> {
        self.composer.dispatch(BuilderEvent::SubmitControlsZone {
            container_id: self.container_id.clone(),
            zone_id: self.zone_id.clone(),
            before,
            after,
        })?;
        Ok(self)
    }

    /// Render `hook` before the controls.
    pub fn before(self, hook: Callback) -> Result<Self, ComposeError> {
        self.zone(Some(hook), None)
    }

    /// Render `hook` after the controls.
    pub fn after(self, hook: Callback) -> Result<Self, ComposeError> {
        self.zone(None, Some(hook))
    }

    /// Add or replace a control, matched by id.
    pub fn control(self, control: SubmitControl) -> Result<Self, ComposeError> {
        self.composer.dispatch(BuilderEvent::SubmitControlsSet {
            container_id: self.container_id.clone(),
            zone_id: self.zone_id.clone(),
            controls: vec![control],
        })?;
        Ok(self)
    }
}
