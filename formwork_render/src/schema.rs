// Copyright 2025 the Formwork Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-field validation and sanitization derived from the form tree.
//!
//! A [`SchemaBundle`] walks [`Store::registered_field_metadata`] and, for
//! every field whose component is schema-eligible, builds the component's
//! validator (and sanitizer, when it has one) from the field's
//! `component_context`. Rules are grouped by container: each container is
//! submitted on its own, and its values are keyed by field id, the same
//! shape the storage collaborator hands in.

use std::fmt;

use formwork_manifest::{Cache, Context, ManifestGeneric, Sanitizer, Validator};
use formwork_store::Store;
use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

/// One rejected value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    /// Field id.
    pub field_id: String,
    /// Validator message.
    pub message: String,
}

struct Rules {
    validator: Validator,
    sanitizer: Option<Sanitizer>,
}

#[derive(Default)]
struct ContainerSchema {
    fields: IndexMap<String, Rules>,
    plain: Vec<String>,
}

impl ContainerSchema {
    fn contains(&self, field_id: &str) -> bool {
        self.fields.contains_key(field_id) || self.plain.iter().any(|p| p == field_id)
    }
}

/// Validators and sanitizers for every schema-eligible field, per container.
#[derive(Default)]
pub struct SchemaBundle {
    containers: IndexMap<String, ContainerSchema>,
}

impl fmt::Debug for SchemaBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (id, schema) in &self.containers {
            map.entry(id, &schema.fields.keys().collect::<Vec<_>>());
        }
        map.finish()
    }
}

impl SchemaBundle {
    /// Derive rules for the fields in `store`.
    ///
    /// Fields whose component is not schema-eligible are kept as plain
    /// pass-through fields. Containers never share rules; within one
    /// container, a field id registered under two sections keeps the first.
    pub fn derive<C: Cache>(manifest: &ManifestGeneric<C>, store: &Store) -> Self {
        let validators = manifest.validator_factories();
        let sanitizers = manifest.sanitizer_factories();
        let mut bundle = Self::default();
        for meta in store.registered_field_metadata() {
            let spec = &meta.field.spec;
            let schema = bundle.containers.entry(meta.container_id).or_default();
            if schema.contains(&spec.id) {
                continue;
            }
            let validator = manifest
                .is_component_schema_eligible(&spec.component)
                .then(|| validators.get(&spec.component))
                .flatten();
            match validator {
                Some(make) => {
                    let rules = Rules {
                        validator: make(&spec.component_context),
                        sanitizer: sanitizers
                            .get(&spec.component)
                            .map(|make| make(&spec.component_context)),
                    };
                    schema.fields.insert(spec.id.clone(), rules);
                }
                None => schema.plain.push(spec.id.clone()),
            }
        }
        debug!(
            containers = bundle.containers.len(),
            validated = bundle.containers.values().map(|s| s.fields.len()).sum::<usize>(),
            "schema bundle derived"
        );
        bundle
    }

    /// Containers that have at least one field.
    pub fn containers(&self) -> impl Iterator<Item = &str> + '_ {
        self.containers.keys().map(String::as_str)
    }

    /// True if `field_id` is part of the container's schema.
    pub fn contains(&self, container_id: &str, field_id: &str) -> bool {
        self.containers
            .get(container_id)
            .is_some_and(|s| s.contains(field_id))
    }

    /// Ids of the container's fields that carry a validator.
    pub fn validated_fields(&self, container_id: &str) -> impl Iterator<Item = &str> + '_ {
        self.containers
            .get(container_id)
            .into_iter()
            .flat_map(|s| s.fields.keys().map(String::as_str))
    }

    /// Run every validator of the container; absent values are validated
    /// as `null`. A container without fields accepts anything.
    pub fn validate(&self, container_id: &str, values: &Context) -> Result<(), Vec<Violation>> {
        let Some(schema) = self.containers.get(container_id) else {
            return Ok(());
        };
        let violations: Vec<_> = schema
            .fields
            .iter()
            .filter_map(|(id, rules)| {
                let value = values.get(id).unwrap_or(&Value::Null);
                (rules.validator)(value).err().map(|message| Violation {
                    field_id: id.clone(),
                    message,
                })
            })
            .collect();
        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Keep only the container's fields, passing each through its sanitizer.
    pub fn sanitize(&self, container_id: &str, values: &Context) -> Context {
        let mut out = Context::new();
        let Some(schema) = self.containers.get(container_id) else {
            return out;
        };
        for (id, value) in values {
            if let Some(rules) = schema.fields.get(id) {
                let clean = match &rules.sanitizer {
                    Some(s) => s(value),
                    None => value.clone(),
                };
                out.insert(id.clone(), clean);
            } else if schema.plain.iter().any(|p| p == id) {
                out.insert(id.clone(), value.clone());
            }
        }
        out
    }
}
