// Copyright 2025 the Formwork Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Wire decoding.
//!
//! Builders that cross a serialization boundary send events as
//! `(name, data)` with `data` a JSON object. [`decode`] turns that pair into
//! a [`BuilderEvent`].
//!
//! - Missing or empty ids (`container_id`, `section_id`, `group_id`, field
//!   `id`, `element_id`, `zone_id`) are fatal.
//! - A `component_context` that is not an object is fatal.
//! - Ill-typed optional attributes, non-string override values, and control
//!   entries that are not objects are logged and skipped.
//! - Callables cannot travel over the wire; hooks, description callbacks, and
//!   root callbacks are only available through typed events.

use formwork_manifest::Context;
use formwork_store::{
    Description, FieldSpec, GroupKey, GroupKind, GroupMeta, SectionKey, SectionMeta,
    SubmitControl,
};
use formwork_templates::{ElementType, Slot};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::RouteError;
use crate::event::{BuilderEvent, EventKind, TemplatePayload};

/// Decode a wire event.
///
/// Unrecognized names decode to [`BuilderEvent::Other`] with the payload
/// untouched.
pub fn decode(name: &str, data: &Value) -> Result<BuilderEvent, RouteError> {
    let Some(kind) = EventKind::from_name(name) else {
        return Ok(BuilderEvent::Other {
            name: name.to_owned(),
            data: data.clone(),
        });
    };
    let Some(obj) = data.as_object() else {
        return Err(RouteError::InvalidContext {
            event: name.to_owned(),
            reason: "payload must be an object".into(),
        });
    };
    let p = Payload { event: name, obj };

    Ok(match kind {
        EventKind::Section => BuilderEvent::Section {
            key: p.section_key()?,
            meta: section_meta(name, p.map("section_data")),
        },
        // Section metadata travels under `group_data`.
        EventKind::SectionMetadata => BuilderEvent::SectionMetadata {
            key: p.section_key()?,
            meta: section_meta(name, p.map("group_data")),
        },
        EventKind::Field => BuilderEvent::Field {
            section: p.section_key()?,
            field: field_spec(name, p.map("field_data"))?,
        },
        EventKind::Group => BuilderEvent::Group {
            key: p.group_key()?,
            meta: group_meta(name, p.map("group_data")),
        },
        EventKind::GroupField => BuilderEvent::GroupField {
            group: p.group_key()?,
            field: field_spec(name, p.map("field_data"))?,
        },
        EventKind::GroupMetadata => BuilderEvent::GroupMetadata {
            key: p.group_key()?,
            meta: group_meta(name, p.map("group_data")),
        },
        EventKind::TemplateOverride => {
            let element_type: ElementType = p.id("element_type")?.parse()?;
            let element_id = p.id("element_id")?;
            if obj.contains_key("callback") {
                warn!(event = name, %element_id, "callbacks cannot be decoded; ignored");
            }
            BuilderEvent::TemplateOverride {
                element_type,
                element_id,
                payload: TemplatePayload::Overrides(overrides(name, p.map("overrides"))),
            }
        }
        EventKind::FormDefaultsOverride => BuilderEvent::FormDefaultsOverride {
            overrides: overrides(name, p.map("overrides")),
        },
        EventKind::SubmitControlsZone => BuilderEvent::SubmitControlsZone {
            container_id: p.id("container_id")?,
            zone_id: p.id("zone_id")?,
            before: None,
            after: None,
        },
        EventKind::SubmitControlsSet => BuilderEvent::SubmitControlsSet {
            container_id: p.id("container_id")?,
            zone_id: p.id("zone_id")?,
            controls: controls(name, obj.get("controls"))?,
        },
        EventKind::SectionCleanup => BuilderEvent::SectionCleanup {
            section_id: p.id("section_id")?,
        },
    })
}

struct Payload<'a> {
    event: &'a str,
    obj: &'a Map<String, Value>,
}

impl<'a> Payload<'a> {
    fn id(&self, key: &'static str) -> Result<String, RouteError> {
        identifier(self.event, self.obj, key)
    }

    fn section_key(&self) -> Result<SectionKey, RouteError> {
        Ok(SectionKey::new(self.id("container_id")?, self.id("section_id")?))
    }

    fn group_key(&self) -> Result<GroupKey, RouteError> {
        Ok(GroupKey::new(
            self.id("container_id")?,
            self.id("section_id")?,
            self.id("group_id")?,
        ))
    }

    /// A nested object; absent or ill-typed values read as empty.
    fn map(&self, key: &str) -> Option<&'a Map<String, Value>> {
        match self.obj.get(key) {
            None | Some(Value::Null) => None,
            Some(Value::Object(m)) => Some(m),
            Some(_) => {
                warn!(event = self.event, key, "expected an object; ignored");
                None
            }
        }
    }
}

/// Ids may arrive as strings or integers.
fn identifier(
    event: &str,
    obj: &Map<String, Value>,
    key: &'static str,
) -> Result<String, RouteError> {
    let id = match obj.get(key) {
        Some(Value::String(s)) => s.trim().to_owned(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };
    if id.is_empty() {
        return Err(RouteError::MissingIdentifier {
            event: event.to_owned(),
            key,
        });
    }
    Ok(id)
}

fn string(event: &str, obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        _ => {
            warn!(event, key, "expected a string; ignored");
            None
        }
    }
}

fn integer(event: &str, obj: &Map<String, Value>, key: &str) -> Option<i64> {
    match obj.get(key)? {
        Value::Number(n) => n.as_i64().or_else(|| {
            warn!(event, key, "expected an integer; ignored");
            None
        }),
        Value::String(s) => s.trim().parse().ok().or_else(|| {
            warn!(event, key, "expected an integer; ignored");
            None
        }),
        Value::Null => None,
        _ => {
            warn!(event, key, "expected an integer; ignored");
            None
        }
    }
}

fn boolean(event: &str, obj: &Map<String, Value>, key: &str) -> Option<bool> {
    match obj.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::Null => None,
        _ => {
            warn!(event, key, "expected a boolean; ignored");
            None
        }
    }
}

fn section_meta(event: &str, data: Option<&Map<String, Value>>) -> SectionMeta {
    let Some(d) = data else {
        return SectionMeta::default();
    };
    SectionMeta {
        title: string(event, d, "title"),
        description: string(event, d, "description").map(Description::Text),
        order: integer(event, d, "order"),
        style: string(event, d, "style"),
        ..SectionMeta::default()
    }
}

fn group_meta(event: &str, data: Option<&Map<String, Value>>) -> GroupMeta {
    let Some(d) = data else {
        return GroupMeta::default();
    };
    let kind = string(event, d, "type").and_then(|t| match t.as_str() {
        "group" => Some(GroupKind::Group),
        "fieldset" => Some(GroupKind::Fieldset),
        other => {
            warn!(event, kind = other, "unknown group type; ignored");
            None
        }
    });
    GroupMeta {
        title: string(event, d, "title"),
        description: string(event, d, "description").map(Description::Text),
        order: integer(event, d, "order"),
        style: string(event, d, "style"),
        required: boolean(event, d, "required"),
        kind,
        form: string(event, d, "form"),
        name: string(event, d, "name"),
        disabled: boolean(event, d, "disabled"),
        ..GroupMeta::default()
    }
}

fn field_spec(event: &str, data: Option<&Map<String, Value>>) -> Result<FieldSpec, RouteError> {
    let empty = Map::new();
    let d = data.unwrap_or(&empty);
    let id = identifier(event, d, "id")?;
    let component = identifier(event, d, "component")?;
    let component_context = context(event, &id, d.get("component_context"))?;
    Ok(FieldSpec {
        label: string(event, d, "label"),
        order: integer(event, d, "order"),
        component_context,
        ..FieldSpec::new(id, component)
    })
}

fn context(event: &str, owner: &str, value: Option<&Value>) -> Result<Context, RouteError> {
    match value {
        None | Some(Value::Null) => Ok(Context::new()),
        Some(Value::Object(m)) => Ok(m.clone()),
        Some(_) => Err(RouteError::InvalidContext {
            event: event.to_owned(),
            reason: format!("context of `{owner}` must be an object"),
        }),
    }
}

fn overrides(event: &str, data: Option<&Map<String, Value>>) -> Vec<(Slot, String)> {
    let Some(d) = data else {
        return Vec::new();
    };
    d.iter()
        .filter_map(|(slot, key)| match key {
            Value::String(k) => Some((Slot::from(slot.as_str()), k.clone())),
            _ => {
                warn!(event, %slot, "template key must be a string; skipped");
                None
            }
        })
        .collect()
}

fn controls(event: &str, value: Option<&Value>) -> Result<Vec<SubmitControl>, RouteError> {
    let items = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => {
            warn!(event, "controls must be a list; ignored");
            return Ok(Vec::new());
        }
    };
    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let Some(c) = item.as_object() else {
            warn!(event, position = i, "control entry is not an object; skipped");
            continue;
        };
        let id = string(event, c, "id").unwrap_or_default();
        let mut control = SubmitControl::new(
            id.clone(),
            string(event, c, "label").unwrap_or_default(),
            string(event, c, "component").unwrap_or_default(),
        );
        control.context = context(event, &id, c.get("context"))?;
        control.order = integer(event, c, "order");
        out.push(control);
    }
    Ok(out)
}
