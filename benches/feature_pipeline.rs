use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use nina_emg::config::PipelineConfig;
use nina_emg::dataset::Recording;
use nina_emg::processing::features::{FeatureExtractor, FeatureKind};
use nina_emg::processing::filters::{butter, lfilter, BandType};
use nina_emg::processing::pca::Pca;
use nina_emg::processing::windowing::windowing;
use nina_emg::processing::{FilterSpec, SignalPipeline};
use ndarray::{Array1, Array2, Array3};

const SAMPLE_RATE: f64 = 2000.0;
const CHANNEL_COUNTS: &[usize] = &[1, 4, 12];
const WINDOW_LENGTHS: &[usize] = &[100, 200, 400];

fn synthetic_recording(samples: usize, channels: usize) -> Recording {
    let emg = Array2::from_shape_fn((samples, channels), |(i, c)| {
        let t = i as f64 / SAMPLE_RATE;
        (2.0 * std::f64::consts::PI * (40.0 + 10.0 * c as f64) * t).sin()
            + 0.3 * (2.0 * std::f64::consts::PI * 50.0 * t).sin()
    });
    let stimulus = Array1::from_shape_fn(samples, |i| (i / 2000 % 5) as i32);
    let repetition = Array1::from_shape_fn(samples, |i| (i / 10_000) as i32 + 1);
    Recording::new(emg, stimulus, repetition).unwrap()
}

fn benchmark_filtering(c: &mut Criterion) {
    let mut group = c.benchmark_group("filtering");
    let signal: Vec<f64> = (0..20_000).map(|i| (i as f64 * 0.05).sin()).collect();
    group.throughput(Throughput::Elements(signal.len() as u64));

    for &order in &[2usize, 4, 8] {
        let coefficients = butter(order, &[20.0, 450.0], BandType::Bandpass, SAMPLE_RATE).unwrap();
        group.bench_with_input(BenchmarkId::new("bandpass_lfilter", order), &order, |b, _| {
            b.iter(|| lfilter(&coefficients, black_box(&signal)).unwrap());
        });
    }

    group.bench_function("butter_design_order_8", |b| {
        b.iter(|| butter(black_box(8), &[20.0, 450.0], BandType::Bandpass, SAMPLE_RATE).unwrap());
    });

    group.finish();
}

fn benchmark_windowing(c: &mut Criterion) {
    let mut group = c.benchmark_group("windowing");

    for &channels in CHANNEL_COUNTS {
        let recording = synthetic_recording(40_000, channels);
        group.throughput(Throughput::Elements(recording.n_samples() as u64));
        group.bench_with_input(BenchmarkId::new("stride_20", channels), &recording, |b, rec| {
            b.iter(|| windowing(black_box(rec), Some(&[1, 3]), None, 400, 20).unwrap());
        });
    }

    group.finish();
}

fn benchmark_feature_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("feature_extraction");

    for &win_len in WINDOW_LENGTHS {
        let windows = Array3::from_shape_fn((100, win_len, 12), |(w, i, ch)| {
            ((w * 31 + i * 7 + ch) as f64 * 0.01).sin()
        });
        group.throughput(Throughput::Elements(100));

        let time_domain = FeatureExtractor::default();
        group.bench_with_input(BenchmarkId::new("time_domain", win_len), &windows, |b, w| {
            b.iter(|| time_domain.extract(black_box(w)).unwrap());
        });

        let spectral = FeatureExtractor::new(vec![FeatureKind::Fft, FeatureKind::Psd], 20).unwrap();
        group.bench_with_input(BenchmarkId::new("spectral", win_len), &windows, |b, w| {
            b.iter(|| spectral.extract(black_box(w)).unwrap());
        });
    }

    group.finish();
}

fn benchmark_pca(c: &mut Criterion) {
    let data = Array2::from_shape_fn((2000, 108), |(i, j)| ((i * 13 + j * 7) as f64 * 0.001).sin() * (j + 1) as f64);
    c.bench_function("pca_fit_108_features_10_components", |b| {
        b.iter(|| Pca::fit(black_box(&data), 10).unwrap());
    });
}

fn benchmark_pipeline(c: &mut Criterion) {
    let recording = synthetic_recording(40_000, 12);
    let mut config = PipelineConfig::default();
    config.normalization.train_repetitions = Some(vec![1, 3]);
    config.filter = Some(FilterSpec::bandpass(20.0, 450.0, 4));
    config.rectify = true;

    let mut pipeline = SignalPipeline::new(config).unwrap();
    c.bench_function("pipeline_40k_samples_12ch", |b| {
        b.iter(|| pipeline.process(black_box(&recording)).unwrap());
    });
}

criterion_group!(
    benches,
    benchmark_filtering,
    benchmark_windowing,
    benchmark_feature_extraction,
    benchmark_pca,
    benchmark_pipeline
);
criterion_main!(benches);
