// Copyright 2025 the Formwork Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Resolver implementation.
//!
//! ## Precedence
//!
//! For a slot and an ancestry [`TemplateContext`], the first tier holding the
//! slot wins, most specific first:
//!
//! 1. field override for `field_id`
//! 2. group override for `group_id`
//! 3. section override for `section_id`
//! 4. root override for `root_id`
//! 5. form-wide default
//! 6. library fallback ([`Slot::fallback_key`])
//!
//! Tiers never merge. Within one element's record, later overrides replace
//! earlier ones slot by slot.
//!
//! ## Root callbacks
//!
//! A root may register a [`Callback`] instead of template keys. The resolver
//! only stores it; the render session checks [`TemplateResolver::root_callback`]
//! before resolving the root wrapper and runs the callback instead.

use std::collections::HashMap;

use formwork_manifest::Callback;
use indexmap::IndexMap;
use tracing::trace;

use crate::error::TemplateError;
use crate::types::{ElementType, OverrideMap, Slot, TemplateContext, Tier};

/// A resolved template key and the tier it came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resolved<'a> {
    /// Template key to look up in the component manifest.
    pub key: &'a str,
    /// Tier that supplied it.
    pub tier: Tier,
}

/// Two-tier template override store.
#[derive(Clone, Debug, Default)]
pub struct TemplateResolver {
    defaults: OverrideMap,
    elements: HashMap<(ElementType, String), OverrideMap>,
    root_callbacks: HashMap<String, Callback>,
}

impl TemplateResolver {
    /// Create an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge slot overrides into the form-wide defaults.
    ///
    /// The batch is validated first; an empty key rejects the whole batch.
    pub fn set_form_defaults(
        &mut self,
        overrides: impl IntoIterator<Item = (Slot, String)>,
    ) -> Result<(), TemplateError> {
        let batch = validated(overrides)?;
        self.defaults.extend(batch);
        Ok(())
    }

    /// Drop all form-wide defaults.
    pub fn clear_form_defaults(&mut self) {
        self.defaults.clear();
    }

    /// Form-wide defaults.
    pub fn form_defaults(&self) -> &OverrideMap {
        &self.defaults
    }

    /// Merge slot overrides into one element's record.
    pub fn set_overrides(
        &mut self,
        element_type: ElementType,
        element_id: &str,
        overrides: impl IntoIterator<Item = (Slot, String)>,
    ) -> Result<(), TemplateError> {
        require_id(element_id)?;
        let batch = validated(overrides)?;
        self.elements
            .entry((element_type, element_id.to_owned()))
            .or_default()
            .extend(batch);
        Ok(())
    }

    /// Remove one slot from an element's record.
    pub fn remove_override(&mut self, element_type: ElementType, element_id: &str, slot: &Slot) {
        let k = (element_type, element_id.to_owned());
        if let Some(map) = self.elements.get_mut(&k) {
            map.shift_remove(slot);
            if map.is_empty() {
                self.elements.remove(&k);
            }
        }
    }

    /// Register a custom render callback for a root.
    pub fn set_root_callback(
        &mut self,
        root_id: &str,
        callback: Callback,
    ) -> Result<(), TemplateError> {
        require_id(root_id)?;
        self.root_callbacks.insert(root_id.to_owned(), callback);
        Ok(())
    }

    /// Callback registered for a root, if any.
    pub fn root_callback(&self, root_id: &str) -> Option<&Callback> {
        self.root_callbacks.get(root_id)
    }

    /// Remove an element's overrides; for roots this also removes the callback.
    pub fn clear_overrides(&mut self, element_type: ElementType, element_id: &str) {
        self.elements.remove(&(element_type, element_id.to_owned()));
        if element_type == ElementType::Root {
            self.root_callbacks.remove(element_id);
        }
    }

    /// One element's override record.
    pub fn overrides(&self, element_type: ElementType, element_id: &str) -> Option<&OverrideMap> {
        self.elements.get(&(element_type, element_id.to_owned()))
    }

    /// Resolve a slot, reporting the tier.
    pub fn resolve(
        &self,
        slot: &Slot,
        context: &TemplateContext,
    ) -> Result<Resolved<'_>, TemplateError> {
        for (element_type, id) in context.chain() {
            let Some(id) = id else {
                continue;
            };
            if let Some(key) = self
                .elements
                .get(&(element_type, id.to_owned()))
                .and_then(|m| m.get(slot))
            {
                trace!(%slot, element = element_type.as_str(), id, key, "override tier matched");
                return Ok(Resolved {
                    key,
                    tier: element_type.into(),
                });
            }
        }
        if let Some(key) = self.defaults.get(slot) {
            return Ok(Resolved {
                key,
                tier: Tier::FormDefault,
            });
        }
        slot.fallback_key()
            .map(|key| Resolved {
                key,
                tier: Tier::Fallback,
            })
            .ok_or_else(|| TemplateError::NoTemplate(slot.to_string()))
    }

    /// Resolve a slot to its template key.
    pub fn resolve_template(
        &self,
        slot: &Slot,
        context: &TemplateContext,
    ) -> Result<&str, TemplateError> {
        self.resolve(slot, context).map(|r| r.key)
    }
}

fn require_id(id: &str) -> Result<(), TemplateError> {
    if id.trim().is_empty() {
        Err(TemplateError::MissingIdentifier("element_id"))
    } else {
        Ok(())
    }
}

fn validated(
    overrides: impl IntoIterator<Item = (Slot, String)>,
) -> Result<IndexMap<Slot, String>, TemplateError> {
    let batch: IndexMap<Slot, String> = overrides.into_iter().collect();
    if let Some((slot, _)) = batch.iter().find(|(_, key)| key.trim().is_empty()) {
        return Err(TemplateError::EmptyTemplateKey(slot.to_string()));
    }
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use formwork_manifest::Context;

    fn one(slot: Slot, key: &str) -> [(Slot, String); 1] {
        [(slot, key.to_owned())]
    }

    fn ctx() -> TemplateContext {
        TemplateContext::root("page").section("S").group("G").field("F")
    }

    #[test]
    fn field_default_and_other_field() {
        let mut r = TemplateResolver::new();
        r.set_form_defaults(one(Slot::FieldWrapper, "default.field"))
            .unwrap();
        r.set_overrides(ElementType::Field, "F", one(Slot::FieldWrapper, "custom.field"))
            .unwrap();

        let f = TemplateContext::default().section("S").field("F");
        let other = TemplateContext::default().section("S").field("other");
        assert_eq!(r.resolve_template(&Slot::FieldWrapper, &f).unwrap(), "custom.field");
        assert_eq!(r.resolve_template(&Slot::FieldWrapper, &other).unwrap(), "default.field");
    }

    #[test]
    fn precedence_falls_through_tier_by_tier() {
        let mut r = TemplateResolver::new();
        let slot = Slot::FieldWrapper;
        r.set_form_defaults(one(slot.clone(), "d")).unwrap();
        r.set_overrides(ElementType::Root, "page", one(slot.clone(), "r"))
            .unwrap();
        r.set_overrides(ElementType::Section, "S", one(slot.clone(), "s"))
            .unwrap();
        r.set_overrides(ElementType::Group, "G", one(slot.clone(), "g"))
            .unwrap();
        r.set_overrides(ElementType::Field, "F", one(slot.clone(), "f"))
            .unwrap();

        let steps = [
            (ElementType::Field, "F", "g", Tier::Group),
            (ElementType::Group, "G", "s", Tier::Section),
            (ElementType::Section, "S", "r", Tier::Root),
            (ElementType::Root, "page", "d", Tier::FormDefault),
        ];
        assert_eq!(
            r.resolve(&slot, &ctx()).unwrap(),
            Resolved {
                key: "f",
                tier: Tier::Field
            }
        );
        for (ty, id, key, tier) in steps {
            r.remove_override(ty, id, &slot);
            assert_eq!(r.resolve(&slot, &ctx()).unwrap(), Resolved { key, tier });
        }
        r.clear_form_defaults();
        assert_eq!(
            r.resolve(&slot, &ctx()).unwrap(),
            Resolved {
                key: "formwork/field",
                tier: Tier::Fallback
            }
        );
    }

    #[test]
    fn tiers_do_not_merge_across_slots() {
        let mut r = TemplateResolver::new();
        r.set_overrides(ElementType::Field, "F", one(Slot::FieldWrapper, "f"))
            .unwrap();
        r.set_form_defaults(one(Slot::SectionWrapper, "sec")).unwrap();
        assert_eq!(r.resolve_template(&Slot::SectionWrapper, &ctx()).unwrap(), "sec");
        assert_eq!(
            r.resolve_template(&Slot::GroupWrapper, &ctx()).unwrap(),
            "formwork/group"
        );
    }

    #[test]
    fn later_override_replaces_same_slot_only() {
        let mut r = TemplateResolver::new();
        r.set_overrides(
            ElementType::Section,
            "S",
            [
                (Slot::SectionWrapper, "a".to_owned()),
                (Slot::FieldWrapper, "b".to_owned()),
            ],
        )
        .unwrap();
        r.set_overrides(ElementType::Section, "S", one(Slot::SectionWrapper, "c"))
            .unwrap();
        let rec = r.overrides(ElementType::Section, "S").unwrap();
        assert_eq!(rec.get(&Slot::SectionWrapper).map(String::as_str), Some("c"));
        assert_eq!(rec.get(&Slot::FieldWrapper).map(String::as_str), Some("b"));
    }

    #[test]
    fn empty_key_rejects_batch() {
        let mut r = TemplateResolver::new();
        let err = r
            .set_overrides(
                ElementType::Field,
                "F",
                [
                    (Slot::FieldWrapper, "ok".to_owned()),
                    (Slot::GroupWrapper, " ".to_owned()),
                ],
            )
            .unwrap_err();
        assert_eq!(err, TemplateError::EmptyTemplateKey("group-wrapper".into()));
        assert!(r.overrides(ElementType::Field, "F").is_none());
        assert_eq!(
            r.set_overrides(ElementType::Field, "", one(Slot::FieldWrapper, "x")),
            Err(TemplateError::MissingIdentifier("element_id"))
        );
    }

    #[test]
    fn custom_slot_without_override_has_no_template() {
        let r = TemplateResolver::new();
        let slot = Slot::Custom("tabs".into());
        assert_eq!(
            r.resolve_template(&slot, &ctx()),
            Err(TemplateError::NoTemplate("tabs".into()))
        );
    }

    #[test]
    fn clearing_root_removes_callback_and_map() {
        let mut r = TemplateResolver::new();
        r.set_overrides(ElementType::Root, "page", one(Slot::RootWrapper, "x"))
            .unwrap();
        r.set_root_callback("page", Callback::text("<custom/>"))
            .unwrap();
        assert_eq!(
            r.root_callback("page").map(|c| c.call(&Context::new())),
            Some("<custom/>".to_owned())
        );
        r.clear_overrides(ElementType::Root, "page");
        assert!(r.root_callback("page").is_none());
        assert!(r.overrides(ElementType::Root, "page").is_none());
    }
}
