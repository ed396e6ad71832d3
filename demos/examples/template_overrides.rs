// Copyright 2025 the Formwork Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Template overrides.
//!
//! Shows which tier supplies each wrapper template as overrides are layered
//! on: library fallback, form-wide default, section, and field. Ends with a
//! root render callback replacing the container wrapper.
//!
//! Run:
//! - `cargo run -p formwork_demos --example template_overrides`

use std::error::Error;

use formwork_manifest::{ComponentResult, Context, FnComponent, Manifest};
use formwork_render::{RenderSession, compose, register_default_templates};
use formwork_router::UpdateRouter;
use formwork_templates::{Slot, TemplateContext};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut manifest = Manifest::new();
    register_default_templates(&mut manifest)?;
    manifest.register_component(
        FnComponent::new("text", |ctx: &Context| {
            let name = ctx.get("name").and_then(Value::as_str).unwrap_or_default();
            Ok(ComponentResult::markup(format!(r#"<input name="{name}">"#)))
        })
        .with_builder(|_| Context::new()),
    )?;
    for key in ["compact.field", "wide.field"] {
        manifest.register(key, move |ctx| {
            let content = ctx.get("content").and_then(Value::as_str).unwrap_or_default();
            Ok(ComponentResult::markup(format!(r#"<div class="{key}">{content}</div>"#)))
        })?;
    }

    let composition = compose(&manifest, UpdateRouter::new(), |c| {
        c.form_default(Slot::FieldWrapper, "compact.field")?;
        let mut form = c.form("profile");
        {
            let mut about = form
                .section("about")?
                .template(Slot::FieldWrapper, "wide.field")?;
            about.field("text", "name")?;
            about
                .field("text", "bio")?
                .template(Slot::FieldWrapper, "formwork/field")?;
        }
        let mut contact = form.section("contact")?;
        contact.field("text", "email")?;
        Ok(())
    });
    let Some(state) = composition.state() else {
        println!("{}", composition.render(&manifest, "profile")?);
        return Ok(());
    };

    println!("== Field wrapper resolution ==");
    let root = TemplateContext::root("profile");
    for (section, field) in [("about", "name"), ("about", "bio"), ("contact", "email")] {
        let ctx = root.clone().section(section).field(field);
        let resolved = state.templates.resolve(&Slot::FieldWrapper, &ctx)?;
        println!("  {section}/{field:<6} {:<15} from {:?}", resolved.key, resolved.tier);
    }
    let resolved = state.templates.resolve(&Slot::SectionWrapper, &root.clone().section("about"))?;
    println!("  section wrapper  {:<15} from {:?}", resolved.key, resolved.tier);

    println!("\n== Markup ==");
    println!("{}", RenderSession::new(&manifest, state).render_container("profile")?);

    // A root callback replaces the container wrapper; inner slots still resolve.
    let composition = compose(&manifest, UpdateRouter::new(), |c| {
        let mut form = c.form("card");
        form.section("main")?.field("text", "title")?;
        form.render_with(formwork_manifest::Callback::new(|ctx: &Context| {
            let content = ctx.get("content").and_then(Value::as_str).unwrap_or_default();
            format!("<article>{content}</article>")
        }))?;
        Ok(())
    });
    println!("\n== Root callback ==");
    println!("{}", composition.render(&manifest, "card")?);
    Ok(())
}
