// Copyright 2025 the Formwork Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Library fallback templates.
//!
//! Every built-in [`Slot`] falls back to a `formwork/…` template key when no
//! override tier names it. [`register_default_templates`] registers plain
//! wrapper components under those keys. They read the keys a
//! [`RenderSession`](crate::RenderSession) puts into the render context:
//!
//! | Slot | Keys |
//! |---|---|
//! | root | `root_id`, `content` |
//! | section | `section_id`, `title`, `description`, `style`, `content` |
//! | group | `group_id`, `kind`, `title`, `description`, `required`, `form`, `name`, `disabled`, `content` |
//! | field | `field_id`, `label`, `description`, `content` |
//! | submit controls | `zone_id`, `content` |
//!
//! `content` is markup and is inserted as is; every other value is escaped.

use std::fmt::Write as _;

use formwork_manifest::{
    AssetDescriptor, Cache, ComponentError, ComponentKind, ComponentResult, Context, FnComponent,
    ManifestError, ManifestGeneric,
};
use formwork_templates::Slot;

/// Handle of the stylesheet the default root wrapper requires.
pub const STYLE_HANDLE: &str = "formwork";

/// Register wrapper components for every built-in slot's fallback key.
///
/// Existing registrations under those keys are replaced.
pub fn register_default_templates<C: Cache>(
    manifest: &mut ManifestGeneric<C>,
) -> Result<(), ManifestError> {
    let wrappers: [(Slot, fn(&Context) -> Result<ComponentResult, ComponentError>); 5] = [
        (Slot::RootWrapper, root),
        (Slot::SectionWrapper, section),
        (Slot::GroupWrapper, group),
        (Slot::FieldWrapper, field),
        (Slot::SubmitControlsWrapper, submit_controls),
    ];
    for (slot, render) in wrappers {
        if let Some(key) = slot.fallback_key() {
            manifest
                .register_component(FnComponent::new(key, render).with_kind(ComponentKind::Wrapper))?;
        }
    }
    Ok(())
}

fn root(ctx: &Context) -> Result<ComponentResult, ComponentError> {
    let markup = format!(
        r#"<div class="formwork" data-container="{}">{}</div>"#,
        escape(text(ctx, "root_id")),
        text(ctx, "content"),
    );
    Ok(ComponentResult::markup(markup)
        .with_kind(ComponentKind::Wrapper)
        .with_asset(AssetDescriptor::style(STYLE_HANDLE, "formwork.css")))
}

fn section(ctx: &Context) -> Result<ComponentResult, ComponentError> {
    let mut out = String::from(r#"<section class="formwork-section"#);
    if let Some(style) = nonempty(ctx, "style") {
        let _ = write!(out, " formwork-section--{}", escape(style));
    }
    let _ = write!(out, r#"" id="{}">"#, escape(text(ctx, "section_id")));
    heading(&mut out, "h2", ctx);
    out.push_str(text(ctx, "content"));
    out.push_str("</section>");
    Ok(ComponentResult::markup(out).with_kind(ComponentKind::Wrapper))
}

fn group(ctx: &Context) -> Result<ComponentResult, ComponentError> {
    let id = escape(text(ctx, "group_id"));
    let mut out = String::new();
    if text(ctx, "kind") == "fieldset" {
        let _ = write!(out, r#"<fieldset id="{id}""#);
        for attr in ["form", "name"] {
            if let Some(v) = nonempty(ctx, attr) {
                let _ = write!(out, r#" {attr}="{}""#, escape(v));
            }
        }
        if flag(ctx, "disabled") {
            out.push_str(" disabled");
        }
        out.push('>');
        if let Some(title) = nonempty(ctx, "title") {
            let _ = write!(out, "<legend>{}</legend>", escape(title));
        }
        description(&mut out, ctx);
        out.push_str(text(ctx, "content"));
        out.push_str("</fieldset>");
    } else {
        let required = if flag(ctx, "required") { " formwork-group--required" } else { "" };
        let _ = write!(out, r#"<div class="formwork-group{required}" id="{id}">"#);
        heading(&mut out, "h3", ctx);
        out.push_str(text(ctx, "content"));
        out.push_str("</div>");
    }
    Ok(ComponentResult::markup(out).with_kind(ComponentKind::Wrapper))
}

fn field(ctx: &Context) -> Result<ComponentResult, ComponentError> {
    let id = escape(text(ctx, "field_id"));
    let mut out = format!(r#"<div class="formwork-field" data-field="{id}">"#);
    if let Some(label) = nonempty(ctx, "label") {
        let _ = write!(out, r#"<label for="{id}">{}</label>"#, escape(label));
    }
    out.push_str(text(ctx, "content"));
    description(&mut out, ctx);
    out.push_str("</div>");
    Ok(ComponentResult::markup(out).with_kind(ComponentKind::Wrapper))
}

fn submit_controls(ctx: &Context) -> Result<ComponentResult, ComponentError> {
    let markup = format!(
        r#"<div class="formwork-submit" data-zone="{}">{}</div>"#,
        escape(text(ctx, "zone_id")),
        text(ctx, "content"),
    );
    Ok(ComponentResult::markup(markup).with_kind(ComponentKind::Wrapper))
}

fn heading(out: &mut String, tag: &str, ctx: &Context) {
    if let Some(title) = nonempty(ctx, "title") {
        let _ = write!(out, "<{tag}>{}</{tag}>", escape(title));
    }
    description(out, ctx);
}

fn description(out: &mut String, ctx: &Context) {
    if let Some(d) = nonempty(ctx, "description") {
        let _ = write!(out, r#"<p class="description">{}</p>"#, escape(d));
    }
}

fn text<'a>(ctx: &'a Context, key: &str) -> &'a str {
    ctx.get(key).and_then(|v| v.as_str()).unwrap_or_default()
}

fn nonempty<'a>(ctx: &'a Context, key: &str) -> Option<&'a str> {
    Some(text(ctx, key)).filter(|s| !s.is_empty())
}

fn flag(ctx: &Context, key: &str) -> bool {
    ctx.get(key).and_then(|v| v.as_bool()).unwrap_or(false)
}

/// Escape text for use in HTML content and double-quoted attributes.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use formwork_manifest::Manifest;
    use serde_json::json;

    fn ctx(v: serde_json::Value) -> Context {
        v.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn registers_every_fallback_key() {
        let mut m = Manifest::new();
        register_default_templates(&mut m).unwrap();
        for key in [
            "formwork/root",
            "formwork/section",
            "formwork/group",
            "formwork/field",
            "formwork/submit-controls",
        ] {
            assert!(m.contains(key), "{key}");
        }
    }

    #[test]
    fn field_wrapper_escapes_label_not_content() {
        let out = field(&ctx(json!({
            "field_id": "name",
            "label": "Name & title",
            "content": "<input id=\"name\">"
        })))
        .unwrap();
        assert_eq!(
            out.markup,
            r#"<div class="formwork-field" data-field="name"><label for="name">Name &amp; title</label><input id="name"></div>"#
        );
    }

    #[test]
    fn fieldset_carries_form_attributes() {
        let out = group(&ctx(json!({
            "group_id": "addr",
            "kind": "fieldset",
            "title": "Address",
            "name": "address",
            "disabled": true,
            "content": "x"
        })))
        .unwrap();
        assert_eq!(
            out.markup,
            r#"<fieldset id="addr" name="address" disabled><legend>Address</legend>x</fieldset>"#
        );
    }

    #[test]
    fn root_requires_stylesheet() {
        let out = root(&ctx(json!({"root_id": "settings", "content": ""}))).unwrap();
        assert_eq!(out.assets.len(), 1);
        assert_eq!(out.assets[0].handle, STYLE_HANDLE);
    }
}
