//! Benchmarks for the instantiation hot paths.
//!
//! - cache hit vs. miss for `Template[args]`
//! - instance construction
//! - delegated attribute reads
//!
//! ## Profiling with Puffin
//!
//! ```bash
//! cargo bench --features profile-with-puffin
//! ```

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use templar::prelude::*;

#[cfg(feature = "profile-with-puffin")]
fn setup_profiler() {
    puffin::set_scopes_on(true);
}

#[cfg(not(feature = "profile-with-puffin"))]
fn setup_profiler() {}

#[cfg(feature = "profile-with-puffin")]
fn end_profiling_frame() {
    puffin::GlobalProfiler::lock().new_frame();
}

#[cfg(not(feature = "profile-with-puffin"))]
fn end_profiling_frame() {}

fn grid() -> TemplateRef {
    TemplateBuilder::new("Grid")
        .param("width", ParamKind::Int)
        .param_with_default("label", ParamKind::Str, "grid")
        .field("cell")
        .parent_property("area", |p| {
            let w = p.param("width").and_then(Value::as_int).unwrap_or(0);
            Ok(Value::from(w * w))
        })
        .build()
        .expect("Grid should build")
}

fn bench_instantiate(c: &mut Criterion) {
    setup_profiler();
    let template = grid();
    let mut group = c.benchmark_group("instantiate");

    group.bench_function("cache_hit", |b| {
        let cache = InstantiationCache::new();
        template.instantiate_in(&cache, Args::positional([8])).unwrap();
        b.iter(|| {
            let inst = template
                .instantiate_in(&cache, black_box(Args::positional([8])))
                .unwrap();
            end_profiling_frame();
            inst
        });
    });

    for count in [16i64, 256, 4096] {
        group.bench_with_input(BenchmarkId::new("cache_fill", count), &count, |b, &count| {
            b.iter(|| {
                let cache = InstantiationCache::new();
                for width in 0..count {
                    template.instantiate_in(&cache, Args::positional([width])).unwrap();
                }
                end_profiling_frame();
                black_box(cache.len())
            });
        });
    }

    group.finish();
}

fn bench_construct_and_read(c: &mut Criterion) {
    let template = grid();
    let cache = InstantiationCache::new();
    let inst = template.instantiate_in(&cache, Args::positional([8])).unwrap();
    let obj = inst.call(&[Value::from(1)]).unwrap();

    c.bench_function("construct_instance", |b| {
        b.iter(|| black_box(inst.call(black_box(&[Value::from(1)])).unwrap()))
    });
    c.bench_function("read_parameter_through_instance", |b| {
        b.iter(|| black_box(obj.get(black_box("width")).unwrap()))
    });
    c.bench_function("read_parent_property_through_instance", |b| {
        b.iter(|| black_box(obj.get(black_box("area")).unwrap().into_value().unwrap()))
    });
}

criterion_group!(benches, bench_instantiate, bench_construct_and_read);
criterion_main!(benches);
