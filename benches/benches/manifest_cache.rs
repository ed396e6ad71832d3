// Copyright 2025 the Formwork Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use formwork_manifest::{
    Cache, ComponentResult, Context, Environment, FnComponent, ManifestGeneric, MemoryCache,
    NoCache, validator,
};

fn populate<C: Cache>(m: &mut ManifestGeneric<C>, n: usize) {
    for i in 0..n {
        let mut component = FnComponent::new(format!("component_{i}"), |_: &Context| {
            Ok(ComponentResult::markup("<input>"))
        })
        .with_builder(|_| Context::new());
        if i % 2 == 0 {
            component = component.with_validator(|_: &Context| validator(|_| Ok(())));
        }
        let _ = m.register_component(component);
    }
}

fn bench_backend<C: Cache>(c: &mut Criterion, name: &str, make: impl Fn() -> ManifestGeneric<C>) {
    let mut group = c.benchmark_group(name);
    for &n in &[16usize, 128, 1024] {
        let mut m = make();
        populate(&mut m, n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("builder_factories_n{n}"), |b| {
            b.iter(|| black_box(m.builder_factories().len()));
        });
        group.bench_function(format!("schema_eligible_n{n}"), |b| {
            b.iter(|| {
                let eligible = (0..n)
                    .filter(|i| m.is_component_schema_eligible(&format!("component_{i}")))
                    .count();
                black_box(eligible)
            });
        });
        group.bench_function(format!("cold_catalog_n{n}"), |b| {
            b.iter_batched(
                || {
                    let mut m = make();
                    populate(&mut m, n);
                    m
                },
                |m| black_box(m.catalog().len()),
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_memory(c: &mut Criterion) {
    bench_backend(c, "memory_cache", || {
        ManifestGeneric::with_cache(Environment::Production, MemoryCache::new())
    });
}

fn bench_uncached(c: &mut Criterion) {
    bench_backend(c, "no_cache", || {
        ManifestGeneric::with_cache(Environment::Development, NoCache)
    });
}

criterion_group!(benches, bench_memory, bench_uncached);
criterion_main!(benches);
