// Copyright 2025 the Formwork Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Builder events.
//!
//! One variant per recognized event name, each with a typed payload. Names
//! the library does not recognize travel as [`BuilderEvent::Other`] and are
//! routed to the fallback.

use core::fmt;

use formwork_manifest::Callback;
use formwork_store::{
    FieldSpec, GroupKey, GroupMeta, SectionKey, SectionMeta, SubmitControl,
};
use formwork_templates::{ElementType, Slot};
use serde_json::Value;

/// Recognized event names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// `section`
    Section,
    /// `section_metadata`
    SectionMetadata,
    /// `field`
    Field,
    /// `group`
    Group,
    /// `group_field`
    GroupField,
    /// `group_metadata`
    GroupMetadata,
    /// `template_override`
    TemplateOverride,
    /// `form_defaults_override`
    FormDefaultsOverride,
    /// `submit_controls_zone`
    SubmitControlsZone,
    /// `submit_controls_set`
    SubmitControlsSet,
    /// `section_cleanup`
    SectionCleanup,
}

impl EventKind {
    /// Every recognized kind.
    pub const ALL: [Self; 11] = [
        Self::Section,
        Self::SectionMetadata,
        Self::Field,
        Self::Group,
        Self::GroupField,
        Self::GroupMetadata,
        Self::TemplateOverride,
        Self::FormDefaultsOverride,
        Self::SubmitControlsZone,
        Self::SubmitControlsSet,
        Self::SectionCleanup,
    ];

    /// Wire name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Section => "section",
            Self::SectionMetadata => "section_metadata",
            Self::Field => "field",
            Self::Group => "group",
            Self::GroupField => "group_field",
            Self::GroupMetadata => "group_metadata",
            Self::TemplateOverride => "template_override",
            Self::FormDefaultsOverride => "form_defaults_override",
            Self::SubmitControlsZone => "submit_controls_zone",
            Self::SubmitControlsSet => "submit_controls_set",
            Self::SectionCleanup => "section_cleanup",
        }
    }

    /// Look up a kind by exact wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a template override registers for an element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TemplatePayload {
    /// Slot → template key entries.
    Overrides(Vec<(Slot, String)>),
    /// Custom root render callback.
    Callback(Callback),
}

/// A single update emitted by a builder.
#[derive(Clone, Debug, PartialEq)]
pub enum BuilderEvent {
    /// Create or update a section.
    Section {
        /// Section address.
        key: SectionKey,
        /// Metadata to overlay.
        meta: SectionMeta,
    },
    /// Update section metadata only.
    SectionMetadata {
        /// Section address.
        key: SectionKey,
        /// Metadata to overlay.
        meta: SectionMeta,
    },
    /// Upsert a field directly in a section.
    Field {
        /// Parent section.
        section: SectionKey,
        /// Field content.
        field: FieldSpec,
    },
    /// Create or update a group or fieldset.
    Group {
        /// Group address.
        key: GroupKey,
        /// Metadata to overlay.
        meta: GroupMeta,
    },
    /// Upsert a field inside a group.
    GroupField {
        /// Parent group.
        group: GroupKey,
        /// Field content.
        field: FieldSpec,
    },
    /// Update group metadata only.
    GroupMetadata {
        /// Group address.
        key: GroupKey,
        /// Metadata to overlay.
        meta: GroupMeta,
    },
    /// Register per-element template overrides or a root callback.
    TemplateOverride {
        /// Kind of element.
        element_type: ElementType,
        /// Element id.
        element_id: String,
        /// Overrides or callback.
        payload: TemplatePayload,
    },
    /// Register form-wide default templates.
    FormDefaultsOverride {
        /// Slot → template key entries.
        overrides: Vec<(Slot, String)>,
    },
    /// Configure a container's submit zone.
    SubmitControlsZone {
        /// Container id.
        container_id: String,
        /// Zone id.
        zone_id: String,
        /// Hook rendered before the controls.
        before: Option<Callback>,
        /// Hook rendered after the controls.
        after: Option<Callback>,
    },
    /// Upsert submit controls.
    SubmitControlsSet {
        /// Container id.
        container_id: String,
        /// Zone id.
        zone_id: String,
        /// Controls to upsert.
        controls: Vec<SubmitControl>,
    },
    /// Drop active-section bookkeeping.
    SectionCleanup {
        /// Section id.
        section_id: String,
    },
    /// An event name with no standard meaning.
    Other {
        /// Event name.
        name: String,
        /// Raw payload.
        data: Value,
    },
}

impl BuilderEvent {
    /// Kind of a recognized event; `None` for [`BuilderEvent::Other`].
    pub fn kind(&self) -> Option<EventKind> {
        Some(match self {
            Self::Section { .. } => EventKind::Section,
            Self::SectionMetadata { .. } => EventKind::SectionMetadata,
            Self::Field { .. } => EventKind::Field,
            Self::Group { .. } => EventKind::Group,
            Self::GroupField { .. } => EventKind::GroupField,
            Self::GroupMetadata { .. } => EventKind::GroupMetadata,
            Self::TemplateOverride { .. } => EventKind::TemplateOverride,
            Self::FormDefaultsOverride { .. } => EventKind::FormDefaultsOverride,
            Self::SubmitControlsZone { .. } => EventKind::SubmitControlsZone,
            Self::SubmitControlsSet { .. } => EventKind::SubmitControlsSet,
            Self::SectionCleanup { .. } => EventKind::SectionCleanup,
            Self::Other { .. } => return None,
        })
    }

    /// Wire name of the event.
    pub fn name(&self) -> &str {
        match self {
            Self::Other { name, .. } => name,
            _ => self.kind().map_or("", EventKind::name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for kind in EventKind::ALL {
            assert_eq!(EventKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(EventKind::from_name("Section"), None);
    }

    #[test]
    fn other_keeps_its_name() {
        let ev = BuilderEvent::Other {
            name: "custom_thing".into(),
            data: Value::Null,
        };
        assert_eq!(ev.kind(), None);
        assert_eq!(ev.name(), "custom_thing");
        let ev = BuilderEvent::SectionCleanup {
            section_id: "s".into(),
        };
        assert_eq!(ev.name(), "section_cleanup");
    }
}
