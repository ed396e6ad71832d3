// Copyright 2025 the Formwork Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Request-scoped asset bucket.
//!
//! Components return [`AssetDescriptor`]s alongside their markup. The bucket
//! keeps one descriptor per `(kind, handle)`; a later descriptor for the same
//! handle replaces the earlier one. Descriptors carrying a hook are tracked
//! apart from immediate ones and flushed separately, at the lifecycle point
//! the hook names.
//!
//! Flushing is idempotent: a handle handed to an [`AssetSink`] once is never
//! handed to it again by the same bucket.

use std::collections::HashSet;

use formwork_manifest::{AssetDescriptor, AssetKind};
use indexmap::IndexMap;
use tracing::debug;

/// The external collaborator that registers assets with the host.
pub trait AssetSink {
    /// Register one asset.
    fn enqueue(&mut self, asset: &AssetDescriptor);
}

impl AssetSink for Vec<AssetDescriptor> {
    fn enqueue(&mut self, asset: &AssetDescriptor) {
        self.push(asset.clone());
    }
}

impl<S: AssetSink + ?Sized> AssetSink for &mut S {
    fn enqueue(&mut self, asset: &AssetDescriptor) {
        (**self).enqueue(asset);
    }
}

type Handle = (AssetKind, String);

/// Deduplicated asset requirements collected during one render pass.
#[derive(Clone, Debug, Default)]
pub struct AssetBucket {
    immediate: IndexMap<Handle, AssetDescriptor>,
    deferred: IndexMap<String, IndexMap<Handle, AssetDescriptor>>,
    flushed: HashSet<Handle>,
    flushed_deferred: HashSet<(String, Handle)>,
}

impl AssetBucket {
    /// Empty bucket.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one descriptor; last write for a handle wins.
    pub fn add(&mut self, asset: AssetDescriptor) {
        let handle = (asset.kind, asset.handle.clone());
        match asset.hook.clone() {
            Some(hook) => {
                self.deferred.entry(hook).or_default().insert(handle, asset);
            }
            None => {
                self.immediate.insert(handle, asset);
            }
        }
    }

    /// Add every descriptor from a render result.
    pub fn extend(&mut self, assets: impl IntoIterator<Item = AssetDescriptor>) {
        for a in assets {
            self.add(a);
        }
    }

    /// Immediate assets in first-seen order.
    pub fn immediate(&self) -> impl Iterator<Item = &AssetDescriptor> + '_ {
        self.immediate.values()
    }

    /// Assets deferred to `hook`, in first-seen order.
    pub fn deferred(&self, hook: &str) -> impl Iterator<Item = &AssetDescriptor> + '_ {
        self.deferred.get(hook).into_iter().flat_map(IndexMap::values)
    }

    /// Hooks with deferred assets.
    pub fn hooks(&self) -> impl Iterator<Item = &str> + '_ {
        self.deferred.keys().map(String::as_str)
    }

    /// Every `(kind, handle)` held, immediate first.
    pub fn handles(&self) -> Vec<(AssetKind, &str)> {
        self.immediate
            .keys()
            .chain(self.deferred.values().flat_map(IndexMap::keys))
            .map(|(k, h)| (*k, h.as_str()))
            .collect()
    }

    /// Number of distinct descriptors.
    pub fn len(&self) -> usize {
        self.immediate.len() + self.deferred.values().map(IndexMap::len).sum::<usize>()
    }

    /// True if nothing was collected.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hand immediate assets not yet flushed to `sink`; returns how many.
    pub fn enqueue_assets(&mut self, mut sink: impl AssetSink) -> usize {
        let mut n = 0;
        for (handle, asset) in &self.immediate {
            if self.flushed.insert(handle.clone()) {
                sink.enqueue(asset);
                n += 1;
            }
        }
        debug!(count = n, "flushed immediate assets");
        n
    }

    /// Hand assets deferred to `hook` and not yet flushed to `sink`.
    pub fn enqueue_deferred(&mut self, hook: &str, mut sink: impl AssetSink) -> usize {
        let Some(assets) = self.deferred.get(hook) else {
            return 0;
        };
        let mut n = 0;
        for (handle, asset) in assets {
            if self.flushed_deferred.insert((hook.to_owned(), handle.clone())) {
                sink.enqueue(asset);
                n += 1;
            }
        }
        debug!(hook, count = n, "flushed deferred assets");
        n
    }
}
