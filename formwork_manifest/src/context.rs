// Copyright 2025 the Formwork Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render context maps and stored callables.

use std::fmt;
use std::sync::Arc;

/// Free-form key/value map handed to components and callbacks.
///
/// Values arrive from storage collaborators as plain JSON-like maps, so the
/// context is a [`serde_json::Map`].
pub type Context = serde_json::Map<String, serde_json::Value>;

/// A stored callable producing markup from a context.
///
/// Used for before/after hooks, description callbacks, and root render
/// callbacks. Two callbacks compare equal only when they share the same
/// allocation, so cloning a record keeps it equal to the original.
#[derive(Clone)]
pub struct Callback(Arc<dyn Fn(&Context) -> String + Send + Sync>);

impl Callback {
    /// Wrap a closure.
    pub fn new(f: impl Fn(&Context) -> String + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// A callback that always yields the same text.
    pub fn text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(move |_| text.clone())
    }

    /// Invoke the callback.
    pub fn call(&self, context: &Context) -> String {
        (self.0)(context)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback(..)")
    }
}

impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Callback {}

/// Shallow-merge `extra` into `base`; keys in `extra` win.
pub fn merge_into(base: &mut Context, extra: &Context) {
    for (k, v) in extra {
        base.insert(k.clone(), v.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn callback_equality_is_identity() {
        let a = Callback::text("x");
        let b = a.clone();
        let c = Callback::text("x");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.call(&Context::new()), "x");
    }

    #[test]
    fn merge_overwrites_shared_keys() {
        let mut base = Context::new();
        base.insert("a".into(), json!(1));
        base.insert("b".into(), json!(2));
        let mut extra = Context::new();
        extra.insert("b".into(), json!(3));
        merge_into(&mut base, &extra);
        assert_eq!(base.get("a"), Some(&json!(1)));
        assert_eq!(base.get("b"), Some(&json!(3)));
    }
}
