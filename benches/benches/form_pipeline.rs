// Copyright 2025 the Formwork Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use formwork_manifest::{ComponentResult, Context, Manifest};
use formwork_render::{RenderSession, register_default_templates};
use formwork_router::{FormState, UpdateRouter};
use formwork_store::{FieldSpec, SectionKey, SectionMeta, Store};
use formwork_templates::{ElementType, Slot, TemplateContext, TemplateResolver};
use serde_json::{Value, json};

fn gen_fields(n: usize) -> Vec<FieldSpec> {
    (0..n)
        .map(|i| {
            // Reverse order so every insert lands ahead of earlier ones.
            let order = i64::try_from(n - i).unwrap_or(i64::MAX);
            FieldSpec::new(format!("field_{i}"), "text")
                .with_label(format!("Field {i}"))
                .with_order(order)
        })
        .collect()
}

fn populated(sections: usize, fields_per_section: usize) -> FormState {
    let mut state = FormState::new();
    for s in 0..sections {
        let key = SectionKey::new("bench", format!("section_{s}"));
        let meta = SectionMeta {
            title: Some(format!("Section {s}")),
            ..SectionMeta::default()
        };
        let _ = state.store.set_section(key.clone(), meta);
        for i in 0..fields_per_section {
            let spec = FieldSpec::new(format!("s{s}_field_{i}"), "text").with_label(format!("Field {i}"));
            let _ = state.store.upsert_field(&key, None, spec);
        }
    }
    state
}

fn manifest() -> Manifest {
    let mut m = Manifest::new();
    let _ = register_default_templates(&mut m);
    let _ = m.register("text", |ctx: &Context| {
        let name = ctx.get("name").and_then(Value::as_str).unwrap_or_default();
        Ok(ComponentResult::markup(format!(r#"<input name="{name}">"#)))
    });
    m
}

fn bench_store(c: &mut Criterion) {
    let mut group = c.benchmark_group("store");
    for &n in &[16usize, 128, 1024] {
        let fields = gen_fields(n);
        let key = SectionKey::new("bench", "main");
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("upsert_n{n}"), |b| {
            b.iter_batched(
                Store::new,
                |mut store| {
                    for spec in fields.iter().cloned() {
                        let _ = store.upsert_field(&key, None, spec);
                    }
                    black_box(store.fields(&key).len());
                },
                BatchSize::SmallInput,
            );
        });
        group.bench_function(format!("re_upsert_n{n}"), |b| {
            let mut store = Store::new();
            for spec in fields.iter().cloned() {
                let _ = store.upsert_field(&key, None, spec);
            }
            b.iter(|| {
                for spec in fields.iter().cloned() {
                    let _ = store.upsert_field(&key, None, spec.with_order(0));
                }
                black_box(store.field_count());
            });
        });
    }
    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");
    let mut resolver = TemplateResolver::new();
    let _ = resolver.set_form_defaults([(Slot::SectionWrapper, "bench.section".to_owned())]);
    for i in 0..256 {
        let id = format!("field_{i}");
        if i % 4 == 0 {
            let _ = resolver.set_overrides(
                ElementType::Field,
                &id,
                [(Slot::FieldWrapper, "bench.field".to_owned())],
            );
        }
    }
    let contexts: Vec<TemplateContext> = (0..256)
        .map(|i| {
            TemplateContext::root("bench")
                .section("main")
                .group("g")
                .field(format!("field_{i}"))
        })
        .collect();
    group.throughput(Throughput::Elements(contexts.len() as u64));
    for (name, slot) in [
        ("field_mixed", Slot::FieldWrapper),
        ("form_default", Slot::SectionWrapper),
        ("fallback", Slot::GroupWrapper),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| {
                let mut found = 0_usize;
                for ctx in &contexts {
                    if resolver.resolve_template(&slot, ctx).is_ok() {
                        found += 1;
                    }
                }
                black_box(found);
            });
        });
    }
    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    let m = manifest();
    for &(sections, fields) in &[(1usize, 16usize), (4, 64), (8, 256)] {
        let state = populated(sections, fields);
        group.throughput(Throughput::Elements((sections * fields) as u64));
        group.bench_function(format!("container_s{sections}_f{fields}"), |b| {
            b.iter(|| {
                let mut session = RenderSession::new(&m, &state);
                black_box(session.render_container("bench").map(|html| html.len()))
            });
        });
    }
    group.finish();
}

fn bench_dispatch_raw(c: &mut Criterion) {
    let mut group = c.benchmark_group("router");
    let router = UpdateRouter::new();
    let events: Vec<Value> = (0..256)
        .map(|i| {
            json!({
                "container_id": "bench",
                "section_id": "main",
                "field_data": {"id": format!("field_{i}"), "component": "text", "order": i}
            })
        })
        .collect();
    group.throughput(Throughput::Elements(events.len() as u64));
    group.bench_function("dispatch_raw_fields", |b| {
        b.iter_batched(
            FormState::new,
            |mut state| {
                for data in &events {
                    let _ = router.dispatch_raw(&mut state, "field", data);
                }
                black_box(state.store.field_count());
            },
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_store,
    bench_resolve,
    bench_render,
    bench_dispatch_raw,
);
criterion_main!(benches);
