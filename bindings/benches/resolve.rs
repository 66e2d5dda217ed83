//! Resolution hot-path benchmarks.
//!
//! Resolution cost is dominated by the linear table scan, so the cases
//! here pin the scan against a populated table, the frame bind/release
//! cycle, and routine lookup.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use bindings::{Runtime, VarRequest};

/// Runtime with `vars` globals already bound.
fn populated_runtime(vars: usize) -> Runtime {
    let mut rt = Runtime::new();
    for i in 0..vars {
        rt.resolve(&VarRequest::find(&format!("V{}", i), 0))
            .unwrap();
    }
    rt
}

fn bench_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolution");

    group.bench_function("global_hit_among_512", |b| {
        let mut rt = populated_runtime(512);
        b.iter(|| black_box(rt.resolve(&VarRequest::find("V300", 0)).unwrap()))
    });

    // a deep frame never finds a local, so the whole table is scanned
    group.bench_function("global_hit_from_deep_frame", |b| {
        let mut rt = populated_runtime(512);
        b.iter(|| black_box(rt.resolve(&VarRequest::find("V300", 5)).unwrap()))
    });

    group.bench_function("subscripted_hit", |b| {
        let mut rt = Runtime::new();
        rt.resolve(&VarRequest {
            indices: Some(&[10, 10]),
            ..VarRequest::declare("grid", 0)
        })
        .unwrap();
        let reference = VarRequest {
            indices: Some(&[5, 5]),
            ..VarRequest::find("grid", 0)
        };
        b.iter(|| black_box(rt.resolve(&reference).unwrap()))
    });

    group.finish();
}

fn bench_frames(c: &mut Criterion) {
    let mut group = c.benchmark_group("frames");

    group.bench_function("bind_and_release_8_locals", |b| {
        let mut rt = populated_runtime(64);
        let names = ["A", "B", "C", "D", "E", "F", "G", "H"];
        b.iter(|| {
            for name in names {
                rt.resolve(&VarRequest::local(name, 3)).unwrap();
            }
            rt.release_frame(3);
        })
    });

    group.finish();
}

fn bench_routines(c: &mut Criterion) {
    let mut group = c.benchmark_group("routines");

    let names: Vec<String> = (0..200).map(|i| format!("ROUTINE_{}", i)).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();

    group.bench_function("find_among_200", |b| {
        let mut rt = Runtime::new();
        // 200 names into 511 buckets always loses a few to collisions;
        // the lookup cost is what matters here
        let _ = rt.prepare_routines(&refs);
        b.iter(|| black_box(rt.find_routine("Routine_150 (")).unwrap())
    });

    group.bench_function("find_miss", |b| {
        let mut rt = Runtime::new();
        let _ = rt.prepare_routines(&refs);
        b.iter(|| black_box(rt.find_routine("absent").is_err()))
    });

    group.finish();
}

criterion_group!(benches, bench_resolution, bench_frames, bench_routines);
criterion_main!(benches);
