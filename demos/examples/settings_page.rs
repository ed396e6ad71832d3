// Copyright 2025 the Formwork Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Settings page.
//!
//! Builds a two-section settings form with the fluent builders, renders it,
//! validates a submission, and flushes the collected assets.
//!
//! Configuration comes from `FORMWORK_ENV`, `FORMWORK_UNKNOWN_EVENTS`, and
//! `FORMWORK_CACHE_PREFIX`; log output is controlled by `RUST_LOG`.
//!
//! Run:
//! - `cargo run -p formwork_demos --example settings_page`
//! - `RUST_LOG=formwork_render=trace cargo run -p formwork_demos --example settings_page`

use std::error::Error;

use formwork_manifest::{
    AssetDescriptor, ComponentResult, Context, FnComponent, sanitizer, validator,
};
use formwork_render::{FormworkConfig, RenderSession, compose, register_default_templates};
use formwork_store::SubmitControl;
use serde_json::{Value, json};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = FormworkConfig::from_env()?;
    let mut manifest = config.manifest();
    register_default_templates(&mut manifest)?;
    manifest.register_component(
        FnComponent::new("text", |ctx: &Context| {
            let name = ctx.get("name").and_then(Value::as_str).unwrap_or_default();
            let value = ctx.get("value").and_then(Value::as_str).unwrap_or_default();
            Ok(ComponentResult::markup(format!(
                r#"<input type="text" id="{name}" name="{name}" value="{value}">"#
            )))
        })
        .with_builder(|_| Context::new())
        .with_validator(|ctx: &Context| {
            let max = ctx.get("max_length").and_then(Value::as_u64).unwrap_or(u64::MAX);
            validator(move |v| match v {
                Value::Null => Ok(()),
                Value::String(s) if s.chars().count() as u64 <= max => Ok(()),
                _ => Err(format!("expected text of at most {max} characters")),
            })
        })
        .with_sanitizer(|_: &Context| {
            sanitizer(|v| match v {
                Value::String(s) => Value::from(s.trim()),
                other => other.clone(),
            })
        }),
    )?;
    manifest.register_component(
        FnComponent::new("toggle", |ctx: &Context| {
            let name = ctx.get("name").and_then(Value::as_str).unwrap_or_default();
            let checked = if ctx.get("value").and_then(Value::as_bool) == Some(true) {
                " checked"
            } else {
                ""
            };
            Ok(ComponentResult::markup(format!(
                r#"<input type="checkbox" id="{name}" name="{name}"{checked}>"#
            ))
            .with_asset(AssetDescriptor::script("formwork-toggle", "toggle.js").deferred_to("footer")))
        })
        .with_builder(|_| Context::new()),
    )?;
    manifest.register("button", |ctx| {
        let label = ctx.get("label").and_then(Value::as_str).unwrap_or_default();
        Ok(ComponentResult::markup(format!(r#"<button type="submit">{label}</button>"#)))
    })?;

    let composition = compose(&manifest, config.router(), |c| {
        let mut form = c.form("settings");
        {
            let mut general = form
                .section("general")?
                .title("General")?
                .description("Basic site information.")?
                .order(1)?;
            general
                .field("text", "site_name")?
                .label("Site name")?
                .context("max_length", json!(40))?;
            general.field("text", "tagline")?.label("Tagline")?;
        }
        {
            let mut privacy = form.section("privacy")?.title("Privacy")?.order(2)?;
            let mut tracking = privacy.fieldset("tracking")?.title("Tracking")?;
            tracking.field("toggle", "analytics")?.label("Enable analytics")?;
        }
        form.submit_controls("primary")?
            .control(SubmitControl::new("save", "Save changes", "button"))?;
        Ok(())
    });

    let Some(state) = composition.state() else {
        println!("{}", composition.render(&manifest, "settings")?);
        return Ok(());
    };

    let mut stored = Context::new();
    stored.insert("site_name".into(), json!("Formwork"));
    stored.insert("analytics".into(), json!(true));
    let mut session = RenderSession::new(&manifest, state).with_values(stored);

    let html = session.render_container("settings")?;
    info!(container = "settings", bytes = html.len(), assets = session.assets().len(), "rendered");
    println!("== Markup ==");
    println!("{html}");

    let submission = json!({
        "site_name": "  A site name that is far too long to fit the limit  ",
        "tagline": "  Forms without the boilerplate ",
        "injected": "<script>",
    });
    let submission = submission.as_object().cloned().unwrap_or_default();
    let clean = session.sanitize("settings", &submission);
    println!("\n== Sanitized ==\n{}", Value::Object(clean.clone()));
    match session.validate("settings", &clean) {
        Ok(()) => println!("valid"),
        Err(violations) => {
            for v in violations {
                println!("  {}: {}", v.field_id, v.message);
            }
        }
    }

    let mut head: Vec<AssetDescriptor> = Vec::new();
    let mut footer: Vec<AssetDescriptor> = Vec::new();
    session.enqueue_assets(&mut head);
    session.enqueue_deferred("footer", &mut footer);
    println!("\n== Assets ==");
    for (hook, assets) in [("head", &head), ("footer", &footer)] {
        for a in assets {
            println!("  {hook:<6} {:?} {} ({})", a.kind, a.handle, a.src);
        }
    }
    Ok(())
}
