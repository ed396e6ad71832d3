// Copyright 2025 the Formwork Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core store implementation: flat entity tables, upserts, ordered queries.

use formwork_manifest::{Callback, Context, merge_into};
use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use crate::error::StoreError;
use crate::types::{
    Field, FieldKey, FieldSpec, Group, GroupKey, GroupMeta, Ordered, Section, SectionKey,
    SectionMeta, SubmitControl, SubmitZone,
};

/// Whether an upsert created or updated an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Upsert {
    /// A new entity received the next insertion index.
    Inserted,
    /// An existing entity was updated in place.
    Updated,
}

/// A flattened field record for schema-deriving collaborators.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldMetadata {
    /// Owning container.
    pub container_id: String,
    /// Owning section.
    pub section_id: String,
    /// Owning group, if any.
    pub group_id: Option<String>,
    /// The field.
    pub field: Field,
    /// The owning group, if any.
    pub group: Option<Group>,
}

/// Canonical ordered tree of containers, sections, groups, fields, and
/// submit-control zones.
///
/// Entities live in flat tables addressed by composite keys. Each new entity
/// takes the next value of a single insertion counter, so indices strictly
/// increase within every scope and are never reused. Queries return entities
/// sorted by `(order, index)`.
#[derive(Debug, Default)]
pub struct Store {
    containers: IndexSet<String>,
    sections: IndexMap<SectionKey, Section>,
    groups: IndexMap<GroupKey, Group>,
    fields: IndexMap<FieldKey, Field>,
    submit: IndexMap<String, SubmitZone>,
    active_sections: IndexSet<String>,
    next_index: u64,
}

impl Store {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn take_index(&mut self) -> u64 {
        let i = self.next_index;
        self.next_index += 1;
        i
    }

    fn touch_container(&mut self, container_id: &str) {
        if !self.containers.contains(container_id) {
            self.containers.insert(container_id.to_owned());
        }
    }

    fn ensure_section(&mut self, key: &SectionKey) {
        self.touch_container(&key.container_id);
        if !self.sections.contains_key(key) {
            let index = self.take_index();
            self.sections.insert(
                key.clone(),
                Section {
                    key: key.clone(),
                    meta: SectionMeta::default(),
                    index,
                },
            );
        }
    }

    fn ensure_group(&mut self, key: &GroupKey) {
        self.ensure_section(&key.section());
        if !self.groups.contains_key(key) {
            let index = self.take_index();
            self.groups.insert(
                key.clone(),
                Group {
                    key: key.clone(),
                    meta: GroupMeta::default(),
                    index,
                },
            );
        }
    }

    // --- containers ---

    /// Container ids in first-seen order.
    pub fn containers(&self) -> impl Iterator<Item = &str> + '_ {
        self.containers.iter().map(String::as_str)
    }

    /// True if any update referenced the container.
    pub fn has_container(&self, container_id: &str) -> bool {
        self.containers.contains(container_id)
    }

    // --- sections ---

    /// Create or update a section; set metadata fields overwrite, unset ones are kept.
    pub fn set_section(&mut self, key: SectionKey, meta: SectionMeta) -> Result<Upsert, StoreError> {
        require(&key.container_id, "container_id")?;
        require(&key.section_id, "section_id")?;
        let outcome = if self.sections.contains_key(&key) {
            Upsert::Updated
        } else {
            Upsert::Inserted
        };
        self.ensure_section(&key);
        if let Some(section) = self.sections.get_mut(&key) {
            section.meta.overlay(meta);
        }
        self.active_sections.insert(key.section_id.clone());
        debug!(section = %key, ?outcome, "section upsert");
        Ok(outcome)
    }

    /// Look up a section.
    pub fn get_section(&self, key: &SectionKey) -> Option<&Section> {
        self.sections.get(key)
    }

    /// True if the section exists.
    pub fn has_section(&self, key: &SectionKey) -> bool {
        self.sections.contains_key(key)
    }

    /// Sections of a container in render order.
    pub fn sections(&self, container_id: &str) -> Vec<&Section> {
        sorted(
            self.sections
                .values()
                .filter(|s| s.key.container_id == container_id),
        )
    }

    // --- groups ---

    /// Create or update a group; the owning section is created if needed.
    pub fn set_group(&mut self, key: GroupKey, meta: GroupMeta) -> Result<Upsert, StoreError> {
        require(&key.container_id, "container_id")?;
        require(&key.section_id, "section_id")?;
        require(&key.group_id, "group_id")?;
        let outcome = if self.groups.contains_key(&key) {
            Upsert::Updated
        } else {
            Upsert::Inserted
        };
        self.ensure_group(&key);
        if let Some(group) = self.groups.get_mut(&key) {
            group.meta.overlay(meta);
        }
        debug!(group = %key, ?outcome, "group upsert");
        Ok(outcome)
    }

    /// Look up a group.
    pub fn get_group(&self, key: &GroupKey) -> Option<&Group> {
        self.groups.get(key)
    }

    /// True if the group exists.
    pub fn has_group(&self, key: &GroupKey) -> bool {
        self.groups.contains_key(key)
    }

    /// Groups of a section in render order.
    pub fn groups(&self, section: &SectionKey) -> Vec<&Group> {
        sorted(self.groups.values().filter(|g| {
            g.key.container_id == section.container_id && g.key.section_id == section.section_id
        }))
    }

    // --- fields ---

    /// Insert or update a field in a section (`group_id == None`) or group.
    ///
    /// An existing field with the same id keeps its insertion index; its
    /// label, component, context and hooks are replaced by `spec`, and its
    /// order is replaced only when `spec.order` is set.
    pub fn upsert_field(
        &mut self,
        section: &SectionKey,
        group_id: Option<&str>,
        spec: FieldSpec,
    ) -> Result<Upsert, StoreError> {
        require(&section.container_id, "container_id")?;
        require(&section.section_id, "section_id")?;
        require(&spec.id, "field_id")?;
        let key = match group_id {
            Some(g) => {
                require(g, "group_id")?;
                let gk = GroupKey::new(&section.container_id, &section.section_id, g);
                self.ensure_group(&gk);
                FieldKey::in_group(&gk, spec.id.clone())
            }
            None => {
                self.ensure_section(section);
                FieldKey::in_section(section, spec.id.clone())
            }
        };

        if let Some(existing) = self.fields.get_mut(&key) {
            let order = spec.order.or(existing.spec.order);
            existing.spec = FieldSpec { order, ..spec };
            debug!(field = %key, "field updated in place");
            return Ok(Upsert::Updated);
        }
        let index = self.take_index();
        debug!(field = %key, index, "field inserted");
        self.fields.insert(key.clone(), Field { key, spec, index });
        Ok(Upsert::Inserted)
    }

    /// Shallow-merge `extra` into an existing field's component context.
    pub fn apply_context(&mut self, key: &FieldKey, extra: &Context) -> Result<(), StoreError> {
        let field = self
            .fields
            .get_mut(key)
            .ok_or_else(|| StoreError::FieldNotFound(key.to_string()))?;
        merge_into(&mut field.spec.component_context, extra);
        Ok(())
    }

    /// Look up a field.
    pub fn get_field(&self, key: &FieldKey) -> Option<&Field> {
        self.fields.get(key)
    }

    /// True if the field exists.
    pub fn has_field(&self, key: &FieldKey) -> bool {
        self.fields.contains_key(key)
    }

    /// Section-level fields in render order.
    pub fn fields(&self, section: &SectionKey) -> Vec<&Field> {
        sorted(self.fields.values().filter(|f| {
            f.key.group_id.is_none()
                && f.key.container_id == section.container_id
                && f.key.section_id == section.section_id
        }))
    }

    /// Fields of a group in render order.
    pub fn group_fields(&self, group: &GroupKey) -> Vec<&Field> {
        sorted(self.fields.values().filter(|f| {
            f.key.group_id.as_deref() == Some(group.group_id.as_str())
                && f.key.container_id == group.container_id
                && f.key.section_id == group.section_id
        }))
    }

    /// Total number of fields.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Every field flattened with its ancestry, in render order.
    ///
    /// Containers come in first-seen order; within a section, direct fields
    /// precede grouped ones.
    pub fn registered_field_metadata(&self) -> Vec<FieldMetadata> {
        let mut out = Vec::with_capacity(self.fields.len());
        for container_id in &self.containers {
            for section in self.sections(container_id) {
                for field in self.fields(&section.key) {
                    out.push(FieldMetadata {
                        container_id: container_id.clone(),
                        section_id: section.key.section_id.clone(),
                        group_id: None,
                        field: field.clone(),
                        group: None,
                    });
                }
                for group in self.groups(&section.key) {
                    for field in self.group_fields(&group.key) {
                        out.push(FieldMetadata {
                            container_id: container_id.clone(),
                            section_id: section.key.section_id.clone(),
                            group_id: Some(group.key.group_id.clone()),
                            field: field.clone(),
                            group: Some(group.clone()),
                        });
                    }
                }
            }
        }
        out
    }

    // --- submit controls ---

    /// Create or update a container's submit zone; unset hooks are kept.
    pub fn set_submit_zone(
        &mut self,
        container_id: &str,
        zone_id: &str,
        before: Option<Callback>,
        after: Option<Callback>,
    ) -> Result<(), StoreError> {
        require(container_id, "container_id")?;
        require(zone_id, "zone_id")?;
        self.touch_container(container_id);
        let zone = self.submit.entry(container_id.to_owned()).or_default();
        zone_id.clone_into(&mut zone.zone_id);
        if before.is_some() {
            zone.before = before;
        }
        if after.is_some() {
            zone.after = after;
        }
        Ok(())
    }

    /// Upsert controls into a container's zone and re-sort by order.
    ///
    /// Controls are matched by id; existing ones are replaced in place and new
    /// ones appended before the stable sort, so equal orders keep their
    /// relative position. The batch is validated before anything changes;
    /// `container_id` and `zone_id` are required as for
    /// [`set_submit_zone`](Self::set_submit_zone).
    pub fn set_submit_controls(
        &mut self,
        container_id: &str,
        zone_id: &str,
        controls: Vec<SubmitControl>,
    ) -> Result<(), StoreError> {
        require(container_id, "container_id")?;
        require(zone_id, "zone_id")?;
        for c in &controls {
            if c.id.trim().is_empty() {
                return Err(StoreError::InvalidControl("control id must not be empty".into()));
            }
            if c.label.trim().is_empty() {
                return Err(StoreError::InvalidControl(format!(
                    "control `{}` has an empty label",
                    c.id
                )));
            }
        }
        self.touch_container(container_id);
        let zone = self.submit.entry(container_id.to_owned()).or_default();
        zone_id.clone_into(&mut zone.zone_id);
        for control in controls {
            match zone.controls.iter_mut().find(|c| c.id == control.id) {
                Some(slot) => *slot = control,
                None => zone.controls.push(control),
            }
        }
        zone.controls.sort_by_key(SubmitControl::order);
        Ok(())
    }

    /// The submit zone of a container.
    pub fn submit_zone(&self, container_id: &str) -> Option<&SubmitZone> {
        self.submit.get(container_id)
    }

    /// True if the container has at least one submit control.
    pub fn has_submit_controls(&self, container_id: &str) -> bool {
        self.submit
            .get(container_id)
            .is_some_and(|z| !z.controls.is_empty())
    }

    // --- active section bookkeeping ---

    /// Section ids touched by section updates and not yet cleaned up.
    pub fn active_sections(&self) -> impl Iterator<Item = &str> + '_ {
        self.active_sections.iter().map(String::as_str)
    }

    /// Forget an active section; returns false if it was not active.
    pub fn cleanup_section(&mut self, section_id: &str) -> bool {
        self.active_sections.shift_remove(section_id)
    }
}

fn require(id: &str, what: &'static str) -> Result<(), StoreError> {
    if id.trim().is_empty() {
        Err(StoreError::MissingIdentifier(what))
    } else {
        Ok(())
    }
}

fn sorted<'a, T: Ordered + 'a>(items: impl Iterator<Item = &'a T>) -> Vec<&'a T> {
    let mut v: Vec<&T> = items.collect();
    v.sort_by_key(|t| t.sort_key());
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key() -> SectionKey {
        SectionKey::new("page", "general")
    }

    fn ctx(pairs: &[(&str, serde_json::Value)]) -> Context {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.clone()))
            .collect()
    }

    fn ids(fields: &[&Field]) -> Vec<String> {
        fields.iter().map(|f| f.id().to_owned()).collect()
    }

    #[test]
    fn explicit_order_sorts_fields() {
        let mut s = Store::new();
        s.upsert_field(&key(), None, FieldSpec::new("A", "text").with_order(30))
            .unwrap();
        s.upsert_field(&key(), None, FieldSpec::new("B", "text").with_order(10))
            .unwrap();
        s.upsert_field(&key(), None, FieldSpec::new("C", "text").with_order(20))
            .unwrap();
        assert_eq!(ids(&s.fields(&key())), ["B", "C", "A"]);
    }

    #[test]
    fn omitted_order_keeps_registration_sequence() {
        let mut s = Store::new();
        for id in ["x", "y", "z"] {
            s.upsert_field(&key(), None, FieldSpec::new(id, "text"))
                .unwrap();
        }
        s.upsert_field(&key(), None, FieldSpec::new("first", "text").with_order(1))
            .unwrap();
        assert_eq!(ids(&s.fields(&key())), ["first", "x", "y", "z"]);
    }

    #[test]
    fn identical_upsert_is_idempotent() {
        let mut s = Store::new();
        let spec = FieldSpec::new("title", "text")
            .with_label("Title")
            .with_context(ctx(&[("size", json!(20))]));
        assert_eq!(
            s.upsert_field(&key(), None, spec.clone()).unwrap(),
            Upsert::Inserted
        );
        let before = s.fields(&key()).into_iter().cloned().collect::<Vec<_>>();
        assert_eq!(s.upsert_field(&key(), None, spec).unwrap(), Upsert::Updated);
        let after = s.fields(&key()).into_iter().cloned().collect::<Vec<_>>();
        assert_eq!(before, after);
    }

    #[test]
    fn new_context_replaces_content_in_place() {
        let mut s = Store::new();
        s.upsert_field(
            &key(),
            None,
            FieldSpec::new("a", "text").with_context(ctx(&[("x", json!(1)), ("y", json!(2))])),
        )
        .unwrap();
        s.upsert_field(&key(), None, FieldSpec::new("b", "text"))
            .unwrap();
        s.upsert_field(
            &key(),
            None,
            FieldSpec::new("a", "text").with_context(ctx(&[("z", json!(3))])),
        )
        .unwrap();
        let fields = s.fields(&key());
        assert_eq!(ids(&fields), ["a", "b"]);
        assert_eq!(fields[0].spec.component_context, ctx(&[("z", json!(3))]));
        assert_eq!(fields[0].index, 1);
    }

    // Content is replaced but a stored order survives an update that omits one.
    #[test]
    fn update_without_order_preserves_order() {
        let mut s = Store::new();
        s.upsert_field(&key(), None, FieldSpec::new("a", "text").with_order(50))
            .unwrap();
        s.upsert_field(&key(), None, FieldSpec::new("b", "text").with_order(20))
            .unwrap();
        s.upsert_field(
            &key(),
            None,
            FieldSpec::new("a", "select").with_label("Now a select"),
        )
        .unwrap();
        let fields = s.fields(&key());
        assert_eq!(ids(&fields), ["b", "a"]);
        assert_eq!(fields[1].spec.order, Some(50));
        assert_eq!(fields[1].spec.component, "select");

        s.upsert_field(&key(), None, FieldSpec::new("a", "select").with_order(1))
            .unwrap();
        assert_eq!(ids(&s.fields(&key())), ["a", "b"]);
    }

    #[test]
    fn apply_context_merges_keys() {
        let mut s = Store::new();
        s.upsert_field(
            &key(),
            None,
            FieldSpec::new("a", "text").with_context(ctx(&[("x", json!(1))])),
        )
        .unwrap();
        let fk = FieldKey::in_section(&key(), "a");
        s.apply_context(&fk, &ctx(&[("y", json!(2))])).unwrap();
        let f = s.get_field(&fk).unwrap();
        assert_eq!(f.spec.component_context, ctx(&[("x", json!(1)), ("y", json!(2))]));
        assert!(matches!(
            s.apply_context(&FieldKey::in_section(&key(), "nope"), &Context::new()),
            Err(StoreError::FieldNotFound(_))
        ));
    }

    #[test]
    fn missing_identifiers_are_rejected() {
        let mut s = Store::new();
        assert_eq!(
            s.upsert_field(&SectionKey::new("", "s"), None, FieldSpec::new("a", "t")),
            Err(StoreError::MissingIdentifier("container_id"))
        );
        assert_eq!(
            s.upsert_field(&key(), None, FieldSpec::new(" ", "t")),
            Err(StoreError::MissingIdentifier("field_id"))
        );
        assert_eq!(
            s.upsert_field(&key(), Some(""), FieldSpec::new("a", "t")),
            Err(StoreError::MissingIdentifier("group_id"))
        );
        assert_eq!(s.field_count(), 0);
    }

    #[test]
    fn field_event_creates_parents_implicitly() {
        let mut s = Store::new();
        s.upsert_field(&key(), Some("colors"), FieldSpec::new("bg", "color"))
            .unwrap();
        let gk = GroupKey::new("page", "general", "colors");
        assert!(s.has_container("page"));
        assert!(s.has_section(&key()));
        assert!(s.has_group(&gk));
        assert_eq!(ids(&s.group_fields(&gk)), ["bg"]);
        assert!(s.fields(&key()).is_empty());
    }

    #[test]
    fn indices_strictly_increase_and_are_not_reused() {
        let mut s = Store::new();
        s.set_section(key(), SectionMeta::default()).unwrap();
        s.upsert_field(&key(), None, FieldSpec::new("a", "t")).unwrap();
        s.upsert_field(&key(), None, FieldSpec::new("a", "t")).unwrap();
        s.upsert_field(&key(), None, FieldSpec::new("b", "t")).unwrap();
        let idx: Vec<u64> = s.fields(&key()).iter().map(|f| f.index).collect();
        assert_eq!(idx, [1, 2]);
        assert_eq!(s.get_section(&key()).unwrap().index, 0);
    }

    #[test]
    fn sections_sort_by_order_then_index() {
        let mut s = Store::new();
        s.set_section(SectionKey::new("p", "late"), SectionMeta::default())
            .unwrap();
        s.set_section(
            SectionKey::new("p", "early"),
            SectionMeta {
                order: Some(1),
                ..SectionMeta::default()
            },
        )
        .unwrap();
        s.set_section(SectionKey::new("q", "other"), SectionMeta::default())
            .unwrap();
        let order: Vec<&str> = s
            .sections("p")
            .iter()
            .map(|x| x.key.section_id.as_str())
            .collect();
        assert_eq!(order, ["early", "late"]);
        assert_eq!(s.containers().collect::<Vec<_>>(), ["p", "q"]);
    }

    #[test]
    fn submit_controls_upsert_and_sort_stably() {
        let mut s = Store::new();
        s.set_submit_zone("page", "footer", None, None).unwrap();
        s.set_submit_controls(
            "page",
            "footer",
            vec![
                SubmitControl::new("save", "Save", "button").with_order(20),
                SubmitControl::new("reset", "Reset", "button"),
                SubmitControl::new("preview", "Preview", "button"),
            ],
        )
        .unwrap();
        s.set_submit_controls(
            "page",
            "footer",
            vec![SubmitControl::new("reset", "Reset all", "button")],
        )
        .unwrap();
        let zone = s.submit_zone("page").unwrap();
        let ids: Vec<&str> = zone.controls.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["reset", "preview", "save"]);
        assert_eq!(zone.controls[0].label, "Reset all");
        assert_eq!(zone.zone_id, "footer");
        assert!(s.has_submit_controls("page"));
    }

    #[test]
    fn empty_control_label_is_rejected_without_partial_update() {
        let mut s = Store::new();
        let err = s
            .set_submit_controls(
                "page",
                "z",
                vec![
                    SubmitControl::new("ok", "Ok", "button"),
                    SubmitControl::new("bad", "", "button"),
                ],
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidControl(_)));
        assert!(!s.has_submit_controls("page"));
    }

    #[test]
    fn submit_controls_require_a_zone_id() {
        let mut s = Store::new();
        for zone_id in ["", "  "] {
            let err = s
                .set_submit_controls("page", zone_id, vec![SubmitControl::new("save", "Save", "button")])
                .unwrap_err();
            assert!(matches!(err, StoreError::MissingIdentifier("zone_id")));
        }
        assert!(s.submit_zone("page").is_none());
        assert_eq!(s.containers().count(), 0);

        s.set_submit_controls("page", "primary", vec![SubmitControl::new("save", "Save", "button")])
            .unwrap();
        s.set_submit_controls("page", "footer", Vec::new()).unwrap();
        assert_eq!(s.submit_zone("page").unwrap().zone_id, "footer");
    }

    #[test]
    fn cleanup_forgets_active_sections() {
        let mut s = Store::new();
        s.set_section(key(), SectionMeta::default()).unwrap();
        assert_eq!(s.active_sections().collect::<Vec<_>>(), ["general"]);
        assert!(s.cleanup_section("general"));
        assert!(!s.cleanup_section("general"));
        assert!(s.has_section(&key()));
    }

    #[test]
    fn metadata_flattens_in_render_order() {
        let mut s = Store::new();
        let gk = GroupKey::new("page", "general", "colors");
        s.set_group(gk.clone(), GroupMeta::default()).unwrap();
        s.upsert_field(&key(), Some("colors"), FieldSpec::new("bg", "color"))
            .unwrap();
        s.upsert_field(&key(), None, FieldSpec::new("title", "text"))
            .unwrap();
        let meta = s.registered_field_metadata();
        assert_eq!(meta.len(), 2);
        assert_eq!(meta[0].field.id(), "title");
        assert_eq!(meta[0].group_id, None);
        assert_eq!(meta[1].group_id.as_deref(), Some("colors"));
        assert_eq!(meta[1].group.as_ref().map(|g| g.key.clone()), Some(gk));
    }
}
