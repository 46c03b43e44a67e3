use criterion::{black_box, criterion_group, criterion_main, Criterion, BenchmarkId};
use gpmf_expose_rs::exposure_pipeline::exposure::{
    scan_exposure_difference, split_series_mut, ExposureEqualizer,
};
use gpmf_expose_rs::exposure_pipeline::gpmf::{exposure_payload, GpmfStream, FourCC};
use gpmf_expose_rs::exposure_pipeline::{ExposureComparisonPipeline, ExposureConfig, MemoryPayloadSource};
use gpmf_expose_rs::exposure_pipeline::exposure::SeriesLocation;

fn generate_payload(samples: usize, shutter: f32) -> Vec<u8> {
    let shutters: Vec<f32> = (0..samples)
        .map(|i| shutter * (1.0 + (i % 7) as f32 * 0.1))
        .collect();
    let gains: Vec<f32> = (0..samples).map(|i| 100.0 + (i % 5) as f32 * 50.0).collect();
    exposure_payload(&shutters, &gains)
}

fn locate(buffer: &[u8], key: FourCC) -> SeriesLocation {
    let mut cursor = GpmfStream::new(buffer).unwrap();
    assert!(cursor.find_next(key, 8));
    cursor.location().unwrap()
}

fn benchmark_scan_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan_by_samples");

    for samples in [16usize, 256, 4096] {
        let payload_a = generate_payload(samples, 0.01);
        let payload_b = generate_payload(samples, 0.04);
        let (shut_a, gain_a) = (locate(&payload_a, FourCC::SHUT), locate(&payload_a, FourCC::ISOG));
        let (shut_b, gain_b) = (locate(&payload_b, FourCC::SHUT), locate(&payload_b, FourCC::ISOG));

        group.bench_with_input(BenchmarkId::from_parameter(samples), &samples, |b, _| {
            b.iter(|| {
                scan_exposure_difference(
                    &shut_a.view(black_box(&payload_a)).unwrap(),
                    &gain_a.view(&payload_a).unwrap(),
                    &shut_b.view(black_box(&payload_b)).unwrap(),
                    &gain_b.view(&payload_b).unwrap(),
                )
            });
        });
    }

    group.finish();
}

fn benchmark_limit_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("limit_by_samples");
    let equalizer = ExposureEqualizer::new(1.0).unwrap();

    for samples in [16usize, 256, 4096] {
        let payload_a = generate_payload(samples, 0.01);
        let payload_b = generate_payload(samples, 0.04);
        let (shut_a, gain_a) = (locate(&payload_a, FourCC::SHUT), locate(&payload_a, FourCC::ISOG));
        let (shut_b, gain_b) = (locate(&payload_b, FourCC::SHUT), locate(&payload_b, FourCC::ISOG));

        group.bench_with_input(BenchmarkId::from_parameter(samples), &samples, |b, _| {
            b.iter(|| {
                let mut buffer_a = payload_a.clone();
                let mut buffer_b = payload_b.clone();
                let (mut sa, ga) = split_series_mut(&mut buffer_a, &shut_a, &gain_a).unwrap();
                let (mut sb, gb) = split_series_mut(&mut buffer_b, &shut_b, &gain_b).unwrap();
                black_box(equalizer.apply(&mut sa, &ga, &mut sb, &gb))
            });
        });
    }

    group.finish();
}

fn benchmark_pipeline(c: &mut Criterion) {
    let payloads_a: Vec<Vec<u8>> = (0..60).map(|_| generate_payload(24, 0.01)).collect();
    let payloads_b: Vec<Vec<u8>> = (0..60).map(|_| generate_payload(24, 0.04)).collect();
    let config = ExposureConfig::builder().limit_stops(Some(1.0)).build();
    let pipeline = ExposureComparisonPipeline::new(config);

    c.bench_function("compare_60_payloads", |b| {
        b.iter(|| {
            let mut source_a = MemoryPayloadSource::new(payloads_a.clone(), 60.0);
            let mut source_b = MemoryPayloadSource::new(payloads_b.clone(), 60.0);
            black_box(pipeline.compare(&mut source_a, &mut source_b).unwrap())
        });
    });
}

criterion_group!(
    benches,
    benchmark_scan_sizes,
    benchmark_limit_sizes,
    benchmark_pipeline
);
criterion_main!(benches);
