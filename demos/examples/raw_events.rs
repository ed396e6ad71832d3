// Copyright 2025 the Formwork Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Raw builder events.
//!
//! Feeds JSON wire events straight into an [`UpdateRouter`], the way a
//! builder on the other side of a serialization boundary would, then prints
//! the resulting store in render order.
//!
//! Run:
//! - `cargo run -p formwork_demos --example raw_events`
//! - `RUST_LOG=formwork_router=debug cargo run -p formwork_demos --example raw_events`

use std::cell::RefCell;
use std::rc::Rc;

use formwork_router::{EventKind, FallbackPolicy, FormState, RouteError, UpdateRouter, apply};
use formwork_store::SectionKey;
use serde_json::json;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), RouteError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut router = UpdateRouter::with_policy(FallbackPolicy::Reject);

    // Count field events, then defer to the standard handler.
    let seen = Rc::new(RefCell::new(0_usize));
    let counter = Rc::clone(&seen);
    router.register(EventKind::Field, move |state, event| {
        *counter.borrow_mut() += 1;
        apply(state, event)
    });

    let events = [
        ("section", json!({"container_id": "profile", "section_id": "about", "section_data": {"title": "About you", "order": 1}})),
        ("field", json!({"container_id": "profile", "section_id": "about", "field_data": {"id": "bio", "component": "textarea", "label": "Bio", "order": 20}})),
        ("field", json!({"container_id": "profile", "section_id": "about", "field_data": {"id": "name", "component": "text", "label": "Name", "order": "10"}})),
        ("group", json!({"container_id": "profile", "section_id": "about", "group_id": "links", "group_data": {"type": "fieldset", "title": "Links", "order": 15}})),
        ("group_field", json!({"container_id": "profile", "section_id": "about", "group_id": "links", "field_data": {"id": "website", "component": "url"}})),
        ("section_metadata", json!({"container_id": "profile", "section_id": "about", "group_data": {"description": "Shown on your public page."}})),
        ("section", json!({"container_id": "profile", "section_id": "scratch"})),
        ("section_cleanup", json!({"section_id": "scratch"})),
        ("template_override", json!({"element_type": "field", "element_id": "bio", "overrides": {"field-wrapper": "profile.wide-field"}})),
        ("submit_controls_set", json!({"container_id": "profile", "zone_id": "primary", "controls": [{"id": "save", "label": "Save", "component": "button"}]})),
    ];

    let mut state = FormState::new();
    for (name, data) in &events {
        router.dispatch_raw(&mut state, name, data)?;
    }

    // Unknown events are rejected under this policy until a fallback is set.
    let custom = json!({"tab": "advanced"});
    if let Err(err) = router.dispatch_raw(&mut state, "custom_tab", &custom) {
        println!("rejected: {err}");
    }
    router.set_fallback(|name, data| {
        println!("fallback handled `{name}`: {data}");
        Ok(())
    });
    router.dispatch_raw(&mut state, "custom_tab", &custom)?;

    println!("\n== Store ==");
    for section in state.store.sections("profile") {
        println!(
            "section {} ({})",
            section.key.section_id,
            section.meta.title.as_deref().unwrap_or("untitled")
        );
        let key = SectionKey::new("profile", section.key.section_id.clone());
        for field in state.store.fields(&key) {
            println!("  field {} -> {}", field.spec.id, field.spec.component);
        }
        for group in state.store.groups(&key) {
            println!("  {} {}", group.kind().as_str(), group.key.group_id);
            for field in state.store.group_fields(&group.key) {
                println!("    field {} -> {}", field.spec.id, field.spec.component);
            }
        }
    }
    println!("active sections: {:?}", state.store.active_sections().collect::<Vec<_>>());
    println!("field events seen: {}", seen.borrow());
    Ok(())
}
