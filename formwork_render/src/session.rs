// Copyright 2025 the Formwork Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render session.
//!
//! ## Overview
//!
//! A [`RenderSession`] is one render pass over a composed [`FormState`]. It
//! resolves template keys, merges configuration with the element's ancestry
//! into a render context, hands that to the component [`Manifest`], and
//! collects the assets each render returns into an [`AssetBucket`].
//!
//! ## Render context
//!
//! [`RenderSession::render_element`] starts from the element configuration
//! and then sets `root_id`, `section_id`, `group_id` and `field_id` from the
//! ancestry, plus `slot`. Ancestry keys win over configuration keys of the
//! same name.
//!
//! ## Root callbacks
//!
//! When the root of the ancestry has a render callback, the `root-wrapper`
//! slot skips template resolution and returns the callback's output. No other
//! slot is intercepted.
//!
//! ## Memoization
//!
//! The [`SchemaBundle`] is derived on first use and kept for the life of the
//! session, until [`RenderSession::clear_schema_cache`].
//!
//! [`Manifest`]: formwork_manifest::Manifest

use std::cell::OnceCell;
use std::fmt;

use formwork_manifest::{Cache, Callback, Context, ManifestGeneric, MemoryCache};
use formwork_router::FormState;
use formwork_store::{Field, Group, Ordered, Section, SubmitZone};
use formwork_templates::{Slot, TemplateContext};
use serde_json::Value;
use tracing::trace;

use crate::assets::{AssetBucket, AssetSink};
use crate::error::RenderError;
use crate::schema::{SchemaBundle, Violation};

/// One render pass over a composed form.
pub struct RenderSession<'a, C: Cache = MemoryCache> {
    manifest: &'a ManifestGeneric<C>,
    state: &'a FormState,
    values: Context,
    assets: AssetBucket,
    schema: OnceCell<SchemaBundle>,
}

impl<C: Cache> fmt::Debug for RenderSession<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderSession")
            .field("values", &self.values.len())
            .field("assets", &self.assets)
            .field("schema_cached", &self.schema.get().is_some())
            .finish_non_exhaustive()
    }
}

impl<'a, C: Cache> RenderSession<'a, C> {
    /// Start a session over `state`.
    pub fn new(manifest: &'a ManifestGeneric<C>, state: &'a FormState) -> Self {
        Self {
            manifest,
            state,
            values: Context::new(),
            assets: AssetBucket::new(),
            schema: OnceCell::new(),
        }
    }

    /// Provide current field values, keyed by field id.
    pub fn with_values(mut self, values: Context) -> Self {
        self.values = values;
        self
    }

    /// Replace current field values.
    pub fn set_values(&mut self, values: Context) {
        self.values = values;
    }

    /// Current field values.
    pub fn values(&self) -> &Context {
        &self.values
    }

    /// Assets collected so far.
    pub fn assets(&self) -> &AssetBucket {
        &self.assets
    }

    /// Flush immediate assets to `sink`; idempotent.
    pub fn enqueue_assets(&mut self, sink: impl AssetSink) -> usize {
        self.assets.enqueue_assets(sink)
    }

    /// Flush assets deferred to `hook` to `sink`; idempotent.
    pub fn enqueue_deferred(&mut self, hook: &str, sink: impl AssetSink) -> usize {
        self.assets.enqueue_deferred(hook, sink)
    }

    /// Render one component and collect its assets.
    pub fn render_component(&mut self, alias: &str, context: &Context) -> Result<String, RenderError> {
        let result = self.manifest.render(alias, context)?;
        trace!(alias, kind = ?result.kind, assets = result.assets.len(), "component rendered");
        self.assets.extend(result.assets);
        Ok(result.markup)
    }

    /// Render the template resolved for `slot` in `context`.
    pub fn render_element(
        &mut self,
        slot: &Slot,
        config: &Context,
        context: &TemplateContext,
    ) -> Result<String, RenderError> {
        let render_ctx = render_context(config, slot, context);
        if *slot == Slot::RootWrapper {
            if let Some(callback) = self.root_callback(context) {
                trace!(root = ?context.root_id, "root callback intercepted render");
                return Ok(callback.call(&render_ctx));
            }
        }
        let state = self.state;
        let key = state.templates.resolve_template(slot, context)?;
        trace!(%slot, key, "template resolved");
        self.render_component(key, &render_ctx)
    }

    /// Render a whole container: sections, groups, fields, and submit controls.
    pub fn render_container(&mut self, container_id: &str) -> Result<String, RenderError> {
        let state = self.state;
        if !state.store.has_container(container_id) {
            return Err(RenderError::UnknownContainer(container_id.to_owned()));
        }
        let root = TemplateContext::root(container_id);
        let mut content = String::new();
        for section in state.store.sections(container_id) {
            content.push_str(&self.render_section(section, &root)?);
        }
        if let Some(zone) = state.store.submit_zone(container_id) {
            content.push_str(&self.render_submit_zone(zone, &root)?);
        }
        let mut config = Context::new();
        config.insert("content".into(), content.into());
        self.render_element(&Slot::RootWrapper, &config, &root)
    }

    /// The schema bundle for the composed form, derived once.
    pub fn schema(&self) -> &SchemaBundle {
        self.schema
            .get_or_init(|| SchemaBundle::derive(self.manifest, &self.state.store))
    }

    /// True if the schema bundle is memoized.
    pub fn is_schema_cached(&self) -> bool {
        self.schema.get().is_some()
    }

    /// Drop the memoized schema bundle.
    pub fn clear_schema_cache(&mut self) {
        self.schema = OnceCell::new();
    }

    /// Validate a container's submitted `values` against the schema bundle.
    pub fn validate(&self, container_id: &str, values: &Context) -> Result<(), Vec<Violation>> {
        self.schema().validate(container_id, values)
    }

    /// Sanitize a container's submitted `values` through the schema bundle.
    pub fn sanitize(&self, container_id: &str, values: &Context) -> Context {
        self.schema().sanitize(container_id, values)
    }

    fn root_callback(&self, context: &TemplateContext) -> Option<&'a Callback> {
        let state = self.state;
        context
            .root_id
            .as_deref()
            .and_then(|root| state.templates.root_callback(root))
    }

    fn render_section(&mut self, section: &Section, root: &TemplateContext) -> Result<String, RenderError> {
        let state = self.state;
        let ctx = root.clone().section(&section.key.section_id);
        let hook_ctx = render_context(&Context::new(), &Slot::SectionWrapper, &ctx);

        let fields = state.store.fields(&section.key);
        let groups = state.store.groups(&section.key);
        let mut items: Vec<((i64, u64), Item<'_>)> = fields
            .into_iter()
            .map(|f| (f.sort_key(), Item::Field(f)))
            .chain(groups.into_iter().map(|g| (g.sort_key(), Item::Group(g))))
            .collect();
        items.sort_by_key(|(k, _)| *k);

        let mut content = String::new();
        for (_, item) in items {
            let markup = match item {
                Item::Field(f) => self.render_field(f, &ctx)?,
                Item::Group(g) => self.render_group(g, &ctx)?,
            };
            content.push_str(&markup);
        }

        let meta = &section.meta;
        let mut config = Context::new();
        insert_opt(&mut config, "title", meta.title.as_deref());
        insert_opt(
            &mut config,
            "description",
            meta.description.as_ref().map(|d| d.resolve(&hook_ctx)).as_deref(),
        );
        insert_opt(&mut config, "style", meta.style.as_deref());
        config.insert("content".into(), content.into());
        let body = self.render_element(&Slot::SectionWrapper, &config, &ctx)?;
        Ok(hooked(meta.before.as_ref(), body, meta.after.as_ref(), &hook_ctx))
    }

    fn render_group(&mut self, group: &Group, parent: &TemplateContext) -> Result<String, RenderError> {
        let state = self.state;
        let ctx = parent.clone().group(&group.key.group_id);
        let hook_ctx = render_context(&Context::new(), &Slot::GroupWrapper, &ctx);

        let mut content = String::new();
        for field in state.store.group_fields(&group.key) {
            content.push_str(&self.render_field(field, &ctx)?);
        }

        let meta = &group.meta;
        let mut config = Context::new();
        config.insert("kind".into(), group.kind().as_str().into());
        insert_opt(&mut config, "title", meta.title.as_deref());
        insert_opt(
            &mut config,
            "description",
            meta.description.as_ref().map(|d| d.resolve(&hook_ctx)).as_deref(),
        );
        insert_opt(&mut config, "style", meta.style.as_deref());
        insert_opt(&mut config, "form", meta.form.as_deref());
        insert_opt(&mut config, "name", meta.name.as_deref());
        config.insert("required".into(), meta.required.unwrap_or(false).into());
        config.insert("disabled".into(), meta.disabled.unwrap_or(false).into());
        config.insert("content".into(), content.into());
        let body = self.render_element(&Slot::GroupWrapper, &config, &ctx)?;
        Ok(hooked(meta.before.as_ref(), body, meta.after.as_ref(), &hook_ctx))
    }

    fn render_field(&mut self, field: &Field, parent: &TemplateContext) -> Result<String, RenderError> {
        let spec = &field.spec;
        let ctx = parent.clone().field(&spec.id);
        let hook_ctx = render_context(&Context::new(), &Slot::FieldWrapper, &ctx);

        let mut component_ctx = spec.component_context.clone();
        for key in ["id", "name"] {
            component_ctx
                .entry(key)
                .or_insert_with(|| spec.id.as_str().into());
        }
        if let Some(label) = &spec.label {
            component_ctx
                .entry("label")
                .or_insert_with(|| label.as_str().into());
        }
        let value = self.values.get(&spec.id).cloned().unwrap_or(Value::Null);
        component_ctx.insert("value".into(), value);
        let content = self.render_component(&spec.component, &component_ctx)?;

        let mut config = Context::new();
        insert_opt(&mut config, "label", spec.label.as_deref());
        if let Some(d) = spec.component_context.get("description") {
            config.insert("description".into(), d.clone());
        }
        config.insert("component".into(), spec.component.as_str().into());
        config.insert("content".into(), content.into());
        let body = self.render_element(&Slot::FieldWrapper, &config, &ctx)?;
        Ok(hooked(spec.before.as_ref(), body, spec.after.as_ref(), &hook_ctx))
    }

    fn render_submit_zone(
        &mut self,
        zone: &SubmitZone,
        root: &TemplateContext,
    ) -> Result<String, RenderError> {
        let hook_ctx = render_context(&Context::new(), &Slot::SubmitControlsWrapper, root);
        let mut content = String::new();
        for control in &zone.controls {
            let mut ctx = control.context.clone();
            ctx.insert("id".into(), control.id.as_str().into());
            ctx.insert("label".into(), control.label.as_str().into());
            ctx.insert("zone_id".into(), zone.zone_id.as_str().into());
            content.push_str(&self.render_component(&control.component, &ctx)?);
        }
        let mut config = Context::new();
        config.insert("zone_id".into(), zone.zone_id.as_str().into());
        config.insert("content".into(), content.into());
        let body = self.render_element(&Slot::SubmitControlsWrapper, &config, root)?;
        Ok(hooked(zone.before.as_ref(), body, zone.after.as_ref(), &hook_ctx))
    }
}

enum Item<'s> {
    Field(&'s Field),
    Group(&'s Group),
}

fn render_context(config: &Context, slot: &Slot, context: &TemplateContext) -> Context {
    let mut out = config.clone();
    let ids = [
        ("root_id", &context.root_id),
        ("section_id", &context.section_id),
        ("group_id", &context.group_id),
        ("field_id", &context.field_id),
    ];
    for (key, id) in ids {
        if let Some(id) = id {
            out.insert(key.into(), id.as_str().into());
        }
    }
    out.insert("slot".into(), slot.as_str().into());
    out
}

fn insert_opt(config: &mut Context, key: &str, value: Option<&str>) {
    if let Some(v) = value {
        config.insert(key.into(), v.into());
    }
}

fn hooked(before: Option<&Callback>, body: String, after: Option<&Callback>, ctx: &Context) -> String {
    if before.is_none() && after.is_none() {
        return body;
    }
    let mut out = before.map(|cb| cb.call(ctx)).unwrap_or_default();
    out.push_str(&body);
    if let Some(cb) = after {
        out.push_str(&cb.call(ctx));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::register_default_templates;
    use formwork_manifest::{AssetDescriptor, ComponentResult, Manifest};
    use formwork_store::{FieldSpec, SectionKey, SectionMeta, SubmitControl};
    use formwork_templates::ElementType;
    use serde_json::json;

    fn manifest() -> Manifest {
        let mut m = Manifest::new();
        register_default_templates(&mut m).unwrap();
        m.register("text", |ctx| {
            let name = ctx.get("name").and_then(Value::as_str).unwrap_or_default();
            let value = ctx.get("value").and_then(Value::as_str).unwrap_or_default();
            Ok(ComponentResult::markup(format!(r#"<input name="{name}" value="{value}">"#))
                .with_asset(AssetDescriptor::script("formwork-text", "text.js")))
        })
        .unwrap();
        m.register("button", |ctx| {
            let label = ctx.get("label").and_then(Value::as_str).unwrap_or_default();
            Ok(ComponentResult::markup(format!("<button>{label}</button>")))
        })
        .unwrap();
        m.register("custom.field", |ctx| {
            let content = ctx.get("content").and_then(Value::as_str).unwrap_or_default();
            Ok(ComponentResult::markup(format!("[{content}]"))
                .with_asset(AssetDescriptor::style("custom", "custom.css").deferred_to("footer")))
        })
        .unwrap();
        m
    }

    fn state() -> FormState {
        let mut state = FormState::new();
        let s = SectionKey::new("settings", "general");
        state
            .store
            .set_section(
                s.clone(),
                SectionMeta {
                    title: Some("General".into()),
                    ..SectionMeta::default()
                },
            )
            .unwrap();
        state
            .store
            .upsert_field(&s, None, FieldSpec::new("b", "text").with_order(20))
            .unwrap();
        state
            .store
            .upsert_field(&s, None, FieldSpec::new("a", "text").with_order(10).with_label("A"))
            .unwrap();
        state
    }

    #[test]
    fn render_element_merges_ancestry() {
        let m = manifest();
        let st = state();
        let mut session = RenderSession::new(&m, &st);
        let mut config = Context::new();
        config.insert("name".into(), json!("q"));
        config.insert("section_id".into(), json!("ignored"));
        let out = session
            .render_element(
                &Slot::Custom("probe".into()),
                &config,
                &TemplateContext::root("settings").section("general"),
            )
            .unwrap_err();
        assert!(matches!(out, RenderError::Template(_)));

        let ctx = render_context(
            &config,
            &Slot::FieldWrapper,
            &TemplateContext::root("settings").section("general"),
        );
        assert_eq!(ctx.get("section_id"), Some(&json!("general")));
        assert_eq!(ctx.get("name"), Some(&json!("q")));
        assert_eq!(ctx.get("slot"), Some(&json!("field-wrapper")));
    }

    #[test]
    fn container_renders_in_order_with_values() {
        let m = manifest();
        let st = state();
        let mut values = Context::new();
        values.insert("a".into(), json!("x"));
        let mut session = RenderSession::new(&m, &st).with_values(values);
        let html = session.render_container("settings").unwrap();
        let a = html.find(r#"name="a" value="x""#).unwrap();
        let b = html.find(r#"name="b" value="""#).unwrap();
        assert!(a < b);
        assert!(html.starts_with(r#"<div class="formwork" data-container="settings">"#));
        assert!(html.contains("<h2>General</h2>"));
        assert!(html.contains(r#"<label for="a">A</label>"#));
        assert_eq!(
            session.assets().handles(),
            [
                (formwork_manifest::AssetKind::Script, "formwork-text"),
                (formwork_manifest::AssetKind::Style, "formwork"),
            ]
        );
    }

    #[test]
    fn rendering_twice_is_identical() {
        let m = manifest();
        let st = state();
        let mut session = RenderSession::new(&m, &st);
        let first = session.render_container("settings").unwrap();
        let handles: Vec<_> = session
            .assets()
            .handles()
            .into_iter()
            .map(|(k, h)| (k, h.to_owned()))
            .collect();
        let second = session.render_container("settings").unwrap();
        assert_eq!(first, second);
        let again: Vec<_> = session
            .assets()
            .handles()
            .into_iter()
            .map(|(k, h)| (k, h.to_owned()))
            .collect();
        assert_eq!(handles, again);
    }

    #[test]
    fn field_override_and_deferred_asset() {
        let m = manifest();
        let mut st = state();
        st.templates
            .set_overrides(ElementType::Field, "a", [(Slot::FieldWrapper, "custom.field".to_owned())])
            .unwrap();
        let mut session = RenderSession::new(&m, &st);
        let html = session.render_container("settings").unwrap();
        assert!(html.contains(r#"[<input name="a" value="">]"#));
        assert!(html.contains(r#"<div class="formwork-field" data-field="b">"#));
        assert_eq!(session.assets().deferred("footer").count(), 1);
        let mut sink: Vec<AssetDescriptor> = Vec::new();
        assert_eq!(session.enqueue_deferred("footer", &mut sink), 1);
        assert_eq!(session.enqueue_deferred("footer", &mut sink), 0);
    }

    #[test]
    fn root_callback_intercepts_root_only() {
        let m = manifest();
        let mut st = state();
        st.templates
            .set_root_callback(
                "settings",
                Callback::new(|ctx| {
                    let body = ctx.get("content").and_then(Value::as_str).unwrap_or_default();
                    format!("<main>{}</main>", body.len())
                }),
            )
            .unwrap();
        let mut session = RenderSession::new(&m, &st);
        let html = session.render_container("settings").unwrap();
        assert!(html.starts_with("<main>"));
        // Sections still resolve templates normally.
        let section = session
            .render_element(
                &Slot::SectionWrapper,
                &Context::new(),
                &TemplateContext::root("settings").section("general"),
            )
            .unwrap();
        assert!(section.starts_with("<section"));
    }

    #[test]
    fn unknown_component_fails_loudly() {
        let m = manifest();
        let mut st = state();
        st.store
            .upsert_field(
                &SectionKey::new("settings", "general"),
                None,
                FieldSpec::new("c", "color-picker"),
            )
            .unwrap();
        let mut session = RenderSession::new(&m, &st);
        let err = session.render_container("settings").unwrap_err();
        assert!(matches!(
            err,
            RenderError::Manifest(formwork_manifest::ManifestError::ComponentNotFound(ref a)) if a == "color-picker"
        ));
        assert!(matches!(
            session.render_container("nope"),
            Err(RenderError::UnknownContainer(_))
        ));
    }

    #[test]
    fn hooks_and_submit_controls() {
        let m = manifest();
        let mut st = state();
        st.store
            .set_submit_zone("settings", "primary", Some(Callback::text("<hr>")), None)
            .unwrap();
        st.store
            .set_submit_controls(
                "settings",
                "primary",
                vec![SubmitControl::new("save", "Save", "button")],
            )
            .unwrap();
        let mut session = RenderSession::new(&m, &st);
        let html = session.render_container("settings").unwrap();
        assert!(html.contains(
            r#"<hr><div class="formwork-submit" data-zone="primary"><button>Save</button></div>"#
        ));
    }

    #[test]
    fn schema_is_memoized_until_cleared() {
        let m = manifest();
        let st = state();
        let mut session = RenderSession::new(&m, &st);
        assert!(!session.is_schema_cached());
        let first: *const SchemaBundle = session.schema();
        assert!(std::ptr::eq(first, session.schema()));
        assert!(session.is_schema_cached());
        session.clear_schema_cache();
        assert!(!session.is_schema_cached());
        assert!(session.schema().contains("settings", "a"));
    }
}
