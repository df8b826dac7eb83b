//! Color difference, statistics and conversion benchmarks

use calverify_core::color::cct::robertson_cct;
use calverify_core::math::stats;
use calverify_core::{CatMatrix, D50, DeltaMethod, IctcpContext, Lab, LabWhite, RgbEncoding, RgbMatrixCache, Xyz, delta};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

/// Generate Lab pairs spread across the gamut
fn generate_lab_pairs(count: usize) -> Vec<(Lab, Lab)> {
    (0..count)
        .map(|i| {
            let t = i as f64 / count as f64;
            let reference = Lab::new(100.0 * t, 120.0 * t - 60.0, 60.0 - 120.0 * ((t * 3.0) % 1.0));
            let sample = Lab::new(
                reference.l + 1.5,
                reference.a - 2.0 * ((t * 7.0) % 1.0),
                reference.b + 0.75,
            );
            (reference, sample)
        })
        .collect()
}

fn bench_methods(c: &mut Criterion) {
    let mut group = c.benchmark_group("delta");
    let pairs = generate_lab_pairs(1024);
    group.throughput(Throughput::Elements(pairs.len() as u64));

    let methods = [
        DeltaMethod::Cie76,
        DeltaMethod::Cie94 { textiles: false },
        DeltaMethod::CMC11,
        DeltaMethod::CIE2000,
        DeltaMethod::Ictcp(IctcpContext::default()),
    ];
    for method in &methods {
        group.bench_with_input(BenchmarkId::new("method", method), method, |b, method| {
            b.iter(|| {
                pairs
                    .iter()
                    .map(|(r, s)| delta(black_box(*r), black_box(*s), method).e)
                    .sum::<f64>()
            })
        });
    }
    group.finish();
}

fn bench_stats(c: &mut Criterion) {
    let mut group = c.benchmark_group("stats");
    for size in [100usize, 10_000] {
        let values: Vec<f64> = (0..size).map(|i| ((i * 7919) % 1000) as f64 / 10.0).collect();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("median", size), &values, |b, v| {
            b.iter(|| stats::median(black_box(v.as_slice())))
        });
        group.bench_with_input(BenchmarkId::new("stddev", size), &values, |b, v| {
            b.iter(|| stats::stddev(black_box(v.as_slice())))
        });
    }
    group.finish();
}

fn bench_conversions(c: &mut Criterion) {
    let mut group = c.benchmark_group("convert");
    let labs: Vec<Lab> = generate_lab_pairs(1024).into_iter().map(|(r, _)| r).collect();
    let white = D50.scale(100.0);
    group.throughput(Throughput::Elements(labs.len() as u64));

    group.bench_function("lab_xyz_lab", |b| {
        b.iter(|| {
            labs.iter()
                .map(|lab| Lab::from_xyz(black_box(*lab).to_xyz(white), D50).l)
                .sum::<f64>()
        })
    });
    group.bench_function("lab_to_srgb", |b| {
        let mut cache = RgbMatrixCache::new();
        b.iter(|| {
            labs.iter()
                .map(|lab| {
                    cache.lab_to_srgb(black_box(*lab), LabWhite::ImplicitD50, RgbEncoding::bytes(), CatMatrix::Bradford)[0]
                })
                .sum::<f64>()
        })
    });
    group.bench_function("robertson_cct", |b| {
        let xyz: Vec<Xyz> = labs.iter().map(|lab| lab.to_xyz(white)).collect();
        b.iter(|| xyz.iter().filter_map(|x| robertson_cct(black_box(*x))).sum::<f64>())
    });
    group.finish();
}

criterion_group!(benches, bench_methods, bench_stats, bench_conversions);
criterion_main!(benches);
