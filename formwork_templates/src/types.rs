// Copyright 2025 the Formwork Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Slots, element types, ancestry contexts, and resolution tiers.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;

/// A named template-resolution point.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slot {
    /// Outermost wrapper of a container.
    RootWrapper,
    /// Wrapper around one section.
    SectionWrapper,
    /// Wrapper around one group or fieldset.
    GroupWrapper,
    /// Wrapper around one field.
    FieldWrapper,
    /// Wrapper around the submit-control zone.
    SubmitControlsWrapper,
    /// Any other slot name; has no library fallback.
    Custom(String),
}

impl Slot {
    /// Wire name of the slot.
    pub fn as_str(&self) -> &str {
        match self {
            Self::RootWrapper => "root-wrapper",
            Self::SectionWrapper => "section-wrapper",
            Self::GroupWrapper => "group-wrapper",
            Self::FieldWrapper => "field-wrapper",
            Self::SubmitControlsWrapper => "submit-controls-wrapper",
            Self::Custom(name) => name,
        }
    }

    /// Library fallback template key, used when no tier matches.
    pub fn fallback_key(&self) -> Option<&'static str> {
        match self {
            Self::RootWrapper => Some("formwork/root"),
            Self::SectionWrapper => Some("formwork/section"),
            Self::GroupWrapper => Some("formwork/group"),
            Self::FieldWrapper => Some("formwork/field"),
            Self::SubmitControlsWrapper => Some("formwork/submit-controls"),
            Self::Custom(_) => None,
        }
    }
}

impl From<&str> for Slot {
    fn from(s: &str) -> Self {
        match s {
            "root-wrapper" => Self::RootWrapper,
            "section-wrapper" => Self::SectionWrapper,
            "group-wrapper" => Self::GroupWrapper,
            "field-wrapper" => Self::FieldWrapper,
            "submit-controls-wrapper" => Self::SubmitControlsWrapper,
            other => Self::Custom(other.to_owned()),
        }
    }
}

impl FromStr for Slot {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of element an override record belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementType {
    /// A container (page or collection).
    Root,
    /// A section.
    Section,
    /// A group or fieldset.
    Group,
    /// A field.
    Field,
}

impl ElementType {
    /// Wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Section => "section",
            Self::Group => "group",
            Self::Field => "field",
        }
    }
}

/// Error for unrecognized element type names.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown element type `{0}`")]
pub struct UnknownElementType(pub String);

impl FromStr for ElementType {
    type Err = UnknownElementType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "root" | "page" | "collection" => Ok(Self::Root),
            "section" => Ok(Self::Section),
            "group" | "fieldset" => Ok(Self::Group),
            "field" => Ok(Self::Field),
            other => Err(UnknownElementType(other.to_owned())),
        }
    }
}

/// Slot → template key map held by one tier entry.
pub type OverrideMap = IndexMap<Slot, String>;

/// Ancestry ids of the element being resolved.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TemplateContext {
    /// Container id.
    pub root_id: Option<String>,
    /// Section id.
    pub section_id: Option<String>,
    /// Group id.
    pub group_id: Option<String>,
    /// Field id.
    pub field_id: Option<String>,
}

impl TemplateContext {
    /// Context rooted at a container.
    pub fn root(root_id: impl Into<String>) -> Self {
        Self {
            root_id: Some(root_id.into()),
            ..Self::default()
        }
    }

    /// Narrow to a section.
    pub fn section(mut self, section_id: impl Into<String>) -> Self {
        self.section_id = Some(section_id.into());
        self
    }

    /// Narrow to a group.
    pub fn group(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    /// Narrow to a field.
    pub fn field(mut self, field_id: impl Into<String>) -> Self {
        self.field_id = Some(field_id.into());
        self
    }

    /// Ancestry ids, most specific first.
    pub fn chain(&self) -> [(ElementType, Option<&str>); 4] {
        [
            (ElementType::Field, self.field_id.as_deref()),
            (ElementType::Group, self.group_id.as_deref()),
            (ElementType::Section, self.section_id.as_deref()),
            (ElementType::Root, self.root_id.as_deref()),
        ]
    }
}

/// Precedence level a template key was resolved from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tier {
    /// Field-level override.
    Field,
    /// Group-level override.
    Group,
    /// Section-level override.
    Section,
    /// Root-level override.
    Root,
    /// Form-wide default.
    FormDefault,
    /// Library fallback.
    Fallback,
}

impl From<ElementType> for Tier {
    fn from(t: ElementType) -> Self {
        match t {
            ElementType::Field => Self::Field,
            ElementType::Group => Self::Group,
            ElementType::Section => Self::Section,
            ElementType::Root => Self::Root,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_names_round_trip() {
        for slot in [
            Slot::RootWrapper,
            Slot::SectionWrapper,
            Slot::GroupWrapper,
            Slot::FieldWrapper,
            Slot::SubmitControlsWrapper,
            Slot::Custom("tabs".into()),
        ] {
            assert_eq!(Slot::from(slot.as_str()), slot);
        }
        assert_eq!(Slot::Custom("tabs".into()).fallback_key(), None);
    }

    #[test]
    fn element_type_aliases() {
        assert_eq!("page".parse(), Ok(ElementType::Root));
        assert_eq!("fieldset".parse(), Ok(ElementType::Group));
        assert!("widget".parse::<ElementType>().is_err());
    }

    #[test]
    fn chain_is_most_specific_first() {
        let ctx = TemplateContext::root("p").section("s").field("f");
        let chain = ctx.chain();
        assert_eq!(chain[0], (ElementType::Field, Some("f")));
        assert_eq!(chain[1], (ElementType::Group, None));
        assert_eq!(chain[3], (ElementType::Root, Some("p")));
    }
}
