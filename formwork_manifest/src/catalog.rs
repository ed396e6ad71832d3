// Copyright 2025 the Formwork Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Discovered component metadata.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::component::{Component, ComponentKind, Roles};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct CatalogEntry {
    roles: u8,
    kind: ComponentKind,
    revision: u64,
}

/// Roles and kinds of every registered component, keyed by alias.
///
/// This is what discovery produces and what the manifest caches. It is
/// serialized as JSON when written to a [`Cache`](crate::Cache).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    entries: BTreeMap<String, CatalogEntry>,
}

impl Catalog {
    /// Run discovery over a set of components.
    pub fn discover<'a>(components: impl IntoIterator<Item = &'a dyn Component>) -> Self {
        let entries = components
            .into_iter()
            .map(|c| {
                let d = c.describe();
                (
                    c.alias().to_owned(),
                    CatalogEntry {
                        roles: d.roles.bits(),
                        kind: d.kind,
                        revision: c.revision(),
                    },
                )
            })
            .collect();
        Self { entries }
    }

    /// Roles recorded for `alias`; empty if unknown.
    pub fn roles(&self, alias: &str) -> Roles {
        self.entries
            .get(alias)
            .map(|e| Roles::from_bits_truncate(e.roles))
            .unwrap_or_default()
    }

    /// Kind recorded for `alias`.
    pub fn kind(&self, alias: &str) -> Option<ComponentKind> {
        self.entries.get(alias).map(|e| e.kind)
    }

    /// Aliases implementing `role`, in alias order.
    pub fn aliases_with(&self, role: Roles) -> impl Iterator<Item = &str> + '_ {
        self.entries
            .iter()
            .filter(move |(_, e)| Roles::from_bits_truncate(e.roles).contains(role))
            .map(|(alias, _)| alias.as_str())
    }

    /// True if the catalog describes exactly these `(alias, revision)` pairs.
    pub fn matches<'a>(&self, components: impl IntoIterator<Item = (&'a str, u64)>) -> bool {
        let mut n = 0;
        for (alias, revision) in components {
            match self.entries.get(alias) {
                Some(e) if e.revision == revision => n += 1,
                _ => return false,
            }
        }
        n == self.entries.len()
    }

    /// Number of described components.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is described.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Order-independent fingerprint of `(alias, revision)` pairs.
///
/// The value is stable across builds and toolchains, so it can name entries
/// in persistent caches.
pub fn fingerprint<'a>(components: impl IntoIterator<Item = (&'a str, u64)>) -> u64 {
    let mut sorted: Vec<(&str, u64)> = components.into_iter().collect();
    sorted.sort_unstable();
    let mut bytes = Vec::new();
    for (alias, revision) in sorted {
        bytes.extend_from_slice(alias.as_bytes());
        // Aliases are UTF-8, so 0xff never occurs inside one.
        bytes.push(0xff);
        bytes.extend_from_slice(&revision.to_le_bytes());
    }
    fnv1a_64(&bytes)
}

/// 64-bit FNV-1a.
const fn fnv1a_64(bytes: &[u8]) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = FNV_OFFSET;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
        i += 1;
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentResult, FnComponent, validator};

    fn components() -> Vec<FnComponent> {
        vec![
            FnComponent::new("text", |_| Ok(ComponentResult::markup("t")))
                .with_validator(|_| validator(|_| Ok(()))),
            FnComponent::new("wrap", |_| Ok(ComponentResult::markup("w")))
                .with_kind(ComponentKind::Wrapper),
        ]
    }

    #[test]
    fn discover_records_roles_and_kinds() {
        let cs = components();
        let cat = Catalog::discover(cs.iter().map(|c| c as &dyn Component));
        assert_eq!(cat.len(), 2);
        assert_eq!(cat.roles("text"), Roles::VALIDATOR);
        assert_eq!(cat.roles("missing"), Roles::empty());
        assert_eq!(cat.kind("wrap"), Some(ComponentKind::Wrapper));
        assert_eq!(cat.aliases_with(Roles::VALIDATOR).collect::<Vec<_>>(), ["text"]);
    }

    #[test]
    fn json_round_trip_preserves_catalog() {
        let cs = components();
        let cat = Catalog::discover(cs.iter().map(|c| c as &dyn Component));
        let raw = serde_json::to_string(&cat).unwrap();
        let back: Catalog = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, cat);
    }

    #[test]
    fn matches_requires_identical_components() {
        let cs = components();
        let cat = Catalog::discover(cs.iter().map(|c| c as &dyn Component));
        let text = cs[0].revision();
        let wrap = cs[1].revision();
        assert!(cat.matches([("wrap", wrap), ("text", text)]));
        assert!(!cat.matches([("text", text)]));
        assert!(!cat.matches([("text", text), ("wrap", wrap), ("extra", 0)]));
        // Same aliases, but `text` lost its validator.
        let plain = FnComponent::new("text", |_| Ok(ComponentResult::markup("t")));
        assert_ne!(plain.revision(), text);
        assert!(!cat.matches([("text", plain.revision()), ("wrap", wrap)]));
    }

    #[test]
    fn fingerprint_ignores_order_and_tracks_revisions() {
        assert_eq!(fingerprint([("a", 1), ("b", 2)]), fingerprint([("b", 2), ("a", 1)]));
        assert_ne!(fingerprint([("a", 1), ("b", 2)]), fingerprint([("a", 1), ("c", 2)]));
        assert_ne!(fingerprint([("a", 1)]), fingerprint([("a", 5)]));
    }

    #[test]
    fn fnv1a_matches_reference_vectors() {
        assert_eq!(fnv1a_64(b""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(fnv1a_64(b"a"), 0xaf63_dc4c_8601_ec8c);
    }
}
