// Copyright 2025 the Formwork Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the store: composite keys, metadata records, and entities.

use std::fmt;

use formwork_manifest::{Callback, Context};

/// Sort key used when an element does not specify an order.
pub const DEFAULT_ORDER: i64 = 10;

/// Composite key of a section.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectionKey {
    /// Owning container (page or collection).
    pub container_id: String,
    /// Section id, unique within the container.
    pub section_id: String,
}

impl SectionKey {
    /// Build a key.
    pub fn new(container_id: impl Into<String>, section_id: impl Into<String>) -> Self {
        Self {
            container_id: container_id.into(),
            section_id: section_id.into(),
        }
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.container_id, self.section_id)
    }
}

/// Composite key of a group or fieldset.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey {
    /// Owning container.
    pub container_id: String,
    /// Owning section.
    pub section_id: String,
    /// Group id, unique within the section.
    pub group_id: String,
}

impl GroupKey {
    /// Build a key.
    pub fn new(
        container_id: impl Into<String>,
        section_id: impl Into<String>,
        group_id: impl Into<String>,
    ) -> Self {
        Self {
            container_id: container_id.into(),
            section_id: section_id.into(),
            group_id: group_id.into(),
        }
    }

    /// Key of the owning section.
    pub fn section(&self) -> SectionKey {
        SectionKey::new(&self.container_id, &self.section_id)
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.container_id, self.section_id, self.group_id)
    }
}

/// Composite key of a field; `group_id` is `None` for section-level fields.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldKey {
    /// Owning container.
    pub container_id: String,
    /// Owning section.
    pub section_id: String,
    /// Owning group, if any.
    pub group_id: Option<String>,
    /// Field id, unique within its parent scope.
    pub field_id: String,
}

impl FieldKey {
    /// Key of a field placed directly in a section.
    pub fn in_section(section: &SectionKey, field_id: impl Into<String>) -> Self {
        Self {
            container_id: section.container_id.clone(),
            section_id: section.section_id.clone(),
            group_id: None,
            field_id: field_id.into(),
        }
    }

    /// Key of a field placed in a group.
    pub fn in_group(group: &GroupKey, field_id: impl Into<String>) -> Self {
        Self {
            container_id: group.container_id.clone(),
            section_id: group.section_id.clone(),
            group_id: Some(group.group_id.clone()),
            field_id: field_id.into(),
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.container_id, self.section_id)?;
        if let Some(g) = &self.group_id {
            write!(f, "/{g}")?;
        }
        write!(f, "/{}", self.field_id)
    }
}

/// A description: literal text or a callback evaluated at render time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Description {
    /// Literal text.
    Text(String),
    /// Deferred text.
    Callback(Callback),
}

impl Description {
    /// Produce the description text.
    pub fn resolve(&self, context: &Context) -> String {
        match self {
            Self::Text(t) => t.clone(),
            Self::Callback(cb) => cb.call(context),
        }
    }
}

impl From<&str> for Description {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for Description {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// Section metadata.
///
/// Updates overwrite every field they set; fields left `None` keep their
/// previous value (see [`SectionMeta::overlay`]).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SectionMeta {
    /// Heading.
    pub title: Option<String>,
    /// Text under the heading.
    pub description: Option<Description>,
    /// Rendered before the section body.
    pub before: Option<Callback>,
    /// Rendered after the section body.
    pub after: Option<Callback>,
    /// User sort key.
    pub order: Option<i64>,
    /// Style token passed to the wrapper template.
    pub style: Option<String>,
}

impl SectionMeta {
    /// Apply an update; set fields win, unset fields are retained.
    pub fn overlay(&mut self, update: Self) {
        overlay(&mut self.title, update.title);
        overlay(&mut self.description, update.description);
        overlay(&mut self.before, update.before);
        overlay(&mut self.after, update.after);
        overlay(&mut self.order, update.order);
        overlay(&mut self.style, update.style);
    }
}

/// Discriminates plain groups from fieldsets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GroupKind {
    /// A plain visual group.
    #[default]
    Group,
    /// A `<fieldset>` with form attributes.
    Fieldset,
}

impl GroupKind {
    /// Wire name of the kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::Fieldset => "fieldset",
        }
    }
}

/// Group and fieldset metadata. Same overlay rules as [`SectionMeta`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GroupMeta {
    /// Heading.
    pub title: Option<String>,
    /// Text under the heading.
    pub description: Option<Description>,
    /// Rendered before the group body.
    pub before: Option<Callback>,
    /// Rendered after the group body.
    pub after: Option<Callback>,
    /// User sort key.
    pub order: Option<i64>,
    /// Style token.
    pub style: Option<String>,
    /// Whether the group as a whole is required.
    pub required: Option<bool>,
    /// Group or fieldset.
    pub kind: Option<GroupKind>,
    /// Fieldset `form` attribute.
    pub form: Option<String>,
    /// Fieldset `name` attribute.
    pub name: Option<String>,
    /// Fieldset `disabled` attribute.
    pub disabled: Option<bool>,
}

impl GroupMeta {
    /// Apply an update; set fields win, unset fields are retained.
    pub fn overlay(&mut self, update: Self) {
        overlay(&mut self.title, update.title);
        overlay(&mut self.description, update.description);
        overlay(&mut self.before, update.before);
        overlay(&mut self.after, update.after);
        overlay(&mut self.order, update.order);
        overlay(&mut self.style, update.style);
        overlay(&mut self.required, update.required);
        overlay(&mut self.kind, update.kind);
        overlay(&mut self.form, update.form);
        overlay(&mut self.name, update.name);
        overlay(&mut self.disabled, update.disabled);
    }
}

fn overlay<T>(slot: &mut Option<T>, update: Option<T>) {
    if update.is_some() {
        *slot = update;
    }
}

/// Field definition carried by field events.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field id.
    pub id: String,
    /// Visible label.
    pub label: Option<String>,
    /// Component alias resolved against the manifest at render time.
    pub component: String,
    /// Free-form component configuration.
    pub component_context: Context,
    /// User sort key; `None` keeps the stored order on update.
    pub order: Option<i64>,
    /// Rendered before the field.
    pub before: Option<Callback>,
    /// Rendered after the field.
    pub after: Option<Callback>,
}

impl FieldSpec {
    /// A field with an id and component alias.
    pub fn new(id: impl Into<String>, component: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            component: component.into(),
            ..Self::default()
        }
    }

    /// Set the label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the order.
    pub fn with_order(mut self, order: i64) -> Self {
        self.order = Some(order);
        self
    }

    /// Replace the component context.
    pub fn with_context(mut self, context: Context) -> Self {
        self.component_context = context;
        self
    }
}

/// A submit-area control.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubmitControl {
    /// Control id; must not be empty.
    pub id: String,
    /// Visible label; must not be empty.
    pub label: String,
    /// Component alias.
    pub component: String,
    /// Component configuration.
    pub context: Context,
    /// User sort key.
    pub order: Option<i64>,
}

impl SubmitControl {
    /// A control rendered by `component`.
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        component: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            component: component.into(),
            ..Self::default()
        }
    }

    /// Set the order.
    pub fn with_order(mut self, order: i64) -> Self {
        self.order = Some(order);
        self
    }

    /// Effective sort key.
    pub fn order(&self) -> i64 {
        self.order.unwrap_or(DEFAULT_ORDER)
    }
}

/// The submit-control zone of a container.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubmitZone {
    /// Zone id passed to the wrapper template.
    pub zone_id: String,
    /// Rendered before the controls.
    pub before: Option<Callback>,
    /// Rendered after the controls.
    pub after: Option<Callback>,
    /// Controls sorted by order, stable for ties.
    pub controls: Vec<SubmitControl>,
}

/// A stored section.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Section {
    /// Section key.
    pub key: SectionKey,
    /// Metadata.
    pub meta: SectionMeta,
    /// Insertion index; never reused.
    pub index: u64,
}

/// A stored group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Group {
    /// Group key.
    pub key: GroupKey,
    /// Metadata.
    pub meta: GroupMeta,
    /// Insertion index; never reused.
    pub index: u64,
}

impl Group {
    /// Effective kind.
    pub fn kind(&self) -> GroupKind {
        self.meta.kind.unwrap_or_default()
    }
}

/// A stored field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    /// Field key.
    pub key: FieldKey,
    /// Definition.
    pub spec: FieldSpec,
    /// Insertion index; kept across upserts.
    pub index: u64,
}

impl Field {
    /// Field id.
    pub fn id(&self) -> &str {
        &self.key.field_id
    }
}

/// Anything sorted by `(order, index)`.
pub trait Ordered {
    /// User order, or [`DEFAULT_ORDER`].
    fn order(&self) -> i64;
    /// Insertion index.
    fn index(&self) -> u64;
    /// Render sort key.
    fn sort_key(&self) -> (i64, u64) {
        (self.order(), self.index())
    }
}

impl Ordered for Section {
    fn order(&self) -> i64 {
        self.meta.order.unwrap_or(DEFAULT_ORDER)
    }
    fn index(&self) -> u64 {
        self.index
    }
}

impl Ordered for Group {
    fn order(&self) -> i64 {
        self.meta.order.unwrap_or(DEFAULT_ORDER)
    }
    fn index(&self) -> u64 {
        self.index
    }
}

impl Ordered for Field {
    fn order(&self) -> i64 {
        self.spec.order.unwrap_or(DEFAULT_ORDER)
    }
    fn index(&self) -> u64 {
        self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_overlay_keeps_unset_fields() {
        let mut meta = SectionMeta {
            title: Some("General".into()),
            description: Some("About".into()),
            order: Some(5),
            ..SectionMeta::default()
        };
        meta.overlay(SectionMeta {
            title: Some("Basics".into()),
            ..SectionMeta::default()
        });
        assert_eq!(meta.title.as_deref(), Some("Basics"));
        assert_eq!(meta.description, Some(Description::Text("About".into())));
        assert_eq!(meta.order, Some(5));
    }

    #[test]
    fn group_overlay_switches_kind() {
        let mut meta = GroupMeta::default();
        meta.overlay(GroupMeta {
            kind: Some(GroupKind::Fieldset),
            disabled: Some(true),
            ..GroupMeta::default()
        });
        assert_eq!(meta.kind, Some(GroupKind::Fieldset));
        assert_eq!(meta.disabled, Some(true));
        assert_eq!(GroupKind::Fieldset.as_str(), "fieldset");
    }

    #[test]
    fn keys_display_as_paths() {
        let s = SectionKey::new("page", "general");
        let g = GroupKey::new("page", "general", "colors");
        assert_eq!(FieldKey::in_section(&s, "title").to_string(), "page/general/title");
        assert_eq!(FieldKey::in_group(&g, "bg").to_string(), "page/general/colors/bg");
        assert_eq!(g.section(), s);
    }

    #[test]
    fn description_callback_resolves_lazily() {
        let d = Description::Callback(Callback::text("later"));
        assert_eq!(d.resolve(&Context::new()), "later");
    }
}
