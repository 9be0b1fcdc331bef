//! Criterion benchmarks for the exporter.
//!
//! Measures interface resolution plus marshalling generation across
//! synthetic procedure sets of increasing size.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use typewire_codegen::{ExportOptions, Exporter};
use typewire_core::{ProcedureInfo, TypeDescriptor as T};

/// `count` procedures, each with its own nested record graph.
fn procedure_set(count: usize) -> Vec<ProcedureInfo> {
    let tag = T::generic_record("Tag", ["T"], [("name", T::string()), ("value", T::param("T"))]);
    (0..count)
        .map(|i| {
            let item = T::record(
                format!("Item{}", i),
                [
                    ("uid", T::string()),
                    ("dob", T::date()),
                    ("tags", T::list(T::instantiate(tag.clone(), vec![T::date_time()]))),
                    ("scores", T::mapping(T::int(), T::optional(T::date()))),
                ],
            );
            let params = T::record(
                format!("Query{}", i),
                [("page", T::int()), ("since", T::optional(T::date_time()))],
            );
            let page = T::record(
                format!("Page{}", i),
                [("has_next", T::bool()), ("data", T::list(item))],
            );
            ProcedureInfo::new(format!("Get{}", i), params, page)
        })
        .collect()
}

fn bench_export(c: &mut Criterion) {
    let exporter = Exporter::new(ExportOptions::default().with_url("/rpc"));
    let mut group = c.benchmark_group("export");
    for count in [1usize, 10, 100] {
        let procedures = procedure_set(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &procedures, |b, procedures| {
            b.iter(|| {
                let artifact = exporter.export(black_box(procedures)).expect("export");
                black_box(artifact.render())
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_export);
criterion_main!(benches);
