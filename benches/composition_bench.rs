/// Composition and hashing benchmarks
/// Measures the stage pipeline on generated backgrounds and SHA-256 over uploads
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::runtime::Runtime;

use image_composer::application::composition::{
    crop_region, BackgroundSource, BorderKind, BorderSpec, CompositionContext, CompositionEngine,
    EngineSettings, OutputTargets, TracingObserver, DEFAULT_GRADIENT_FROM, DEFAULT_GRADIENT_TO,
};
use image_composer::infrastructure::assets::FilesystemAssets;
use image_composer::infrastructure::storage::ContentHasher;

fn gradient_context(dir: &TempDir, width: u32, height: u32) -> CompositionContext {
    CompositionContext {
        width,
        height,
        zoom: 1.0,
        offset: (0.0, 0.0),
        background: BackgroundSource::Gradient {
            from: DEFAULT_GRADIENT_FROM,
            to: DEFAULT_GRADIENT_TO,
        },
        border: BorderSpec {
            kind: BorderKind::Auto,
            ..BorderSpec::default()
        },
        copyright: None,
        logo: None,
        bars: Vec::new(),
        output: OutputTargets {
            final_dir: dir.path().to_path_buf(),
            final_thumb_dir: dir.path().join("thumbs"),
            raw_thumb: None,
        },
    }
}

fn composition_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("composition");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(20);

    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("thumbs")).unwrap();
    let engine = CompositionEngine::new(
        Arc::new(FilesystemAssets::new(dir.path().to_path_buf())),
        None,
        EngineSettings::default(),
    );

    for (width, height) in [(600u32, 314u32), (1200, 628), (2400, 1256)] {
        let ctx = gradient_context(&dir, width, height);
        group.throughput(Throughput::Elements((width * height) as u64));
        group.bench_with_input(
            BenchmarkId::new("gradient", format!("{}x{}", width, height)),
            &ctx,
            |b, ctx| {
                b.iter(|| {
                    let output = engine.compose(ctx, &TracingObserver).unwrap();
                    std::fs::remove_file(dir.path().join(&output.file_name)).ok();
                    std::fs::remove_file(dir.path().join("thumbs").join(&output.thumb_file_name))
                        .ok();
                })
            },
        );
    }

    group.bench_function("crop_region", |b| {
        b.iter(|| crop_region((6000, 4000), (1200, 628), 0.37, (-812.5, -230.25)))
    });

    group.finish();
}

fn hash_benchmarks(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("hash_computation");
    group.measurement_time(Duration::from_secs(10));

    for size in [64 * 1024, 1024 * 1024, 10 * 1024 * 1024] {
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("hash_bytes", size), &size, |b, &s| {
            let data = vec![0xA5u8; s];
            b.iter(|| ContentHasher::hash_bytes(&data).unwrap())
        });

        group.bench_with_input(BenchmarkId::new("hash_file", size), &size, |b, &s| {
            let temp_dir = TempDir::new().unwrap();
            let file_path = temp_dir.path().join("upload.bin");
            std::fs::write(&file_path, vec![0x5Au8; s]).unwrap();
            b.to_async(&rt)
                .iter(|| async { ContentHasher::hash_file(&file_path).await.unwrap() })
        });
    }

    group.finish();
}

criterion_group!(benches, composition_benchmarks, hash_benchmarks);
criterion_main!(benches);
