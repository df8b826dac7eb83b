//! Report generation benchmarks

use calverify_core::Lab;
use calverify_report::{CriteriaSet, Dataset, EvaluationContext, Report};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

const PATCH_COUNTS: &[usize] = &[16, 256, 1024];

/// RGB ramp with a slightly shifted measurement
fn datasets(count: usize) -> (Dataset, Dataset) {
    let fields = ["RGB_R", "RGB_G", "RGB_B", "LAB_L", "LAB_A", "LAB_B"];
    let mut reference = Dataset::new(fields);
    let mut measured = Dataset::new(fields);
    for i in 0..count {
        let t = i as f64 / (count - 1) as f64;
        let rgb = [100.0 * t, 100.0 * (1.0 - t), 50.0];
        let lab = Lab::new(100.0 * t, 60.0 * t - 30.0, 20.0 - 40.0 * t);
        let shifted = Lab::new(lab.l + 0.4, lab.a - 0.3, lab.b + 0.2);
        for (dataset, lab) in [(&mut reference, lab), (&mut measured, shifted)] {
            let row = rgb.iter().chain(&lab.to_array()).map(|v| (*v).into()).collect();
            dataset.push_row(row).expect("row width");
        }
    }
    (reference, measured)
}

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("report");
    let set = CriteriaSet::builtin(None);
    let criteria = set.resolve("RGB").expect("built-in criteria");
    let ctx = EvaluationContext::default();

    for &count in PATCH_COUNTS {
        let (reference, measured) = datasets(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("generate", count), &count, |b, _| {
            b.iter(|| Report::generate(black_box(&reference), black_box(&measured), criteria, &ctx).map(|r| r.pass))
        });
    }
    group.finish();
}

fn bench_parse(c: &mut Criterion) {
    let (reference, _) = datasets(1024);
    let text = reference.to_cgats();
    c.bench_function("cgats_parse_1024", |b| b.iter(|| Dataset::parse(black_box(&text)).map(|d| d.len())));
}

criterion_group!(benches, bench_generate, bench_parse);
criterion_main!(benches);
