use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use imgbatch::{
    convert_batch_with_concurrency, ConversionOptions, EngineCodec, OutputFormat, QueuedImage,
};
use std::io::Cursor;

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    }));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

fn batch(count: usize, width: u32, height: u32) -> Vec<QueuedImage> {
    let bytes = png_bytes(width, height);
    (0..count)
        .map(|i| QueuedImage::from_bytes(format!("bench{i}.png"), bytes.clone()))
        .collect()
}

fn names_for(images: &[QueuedImage], format: OutputFormat) -> Vec<String> {
    images
        .iter()
        .enumerate()
        .map(|(i, img)| imgbatch::generate_file_name(img.name(), i, format, ""))
        .collect()
}

pub fn bench_single_conversion(c: &mut Criterion) {
    let codec = EngineCodec::new();
    let images = batch(1, 256, 256);

    let mut group = c.benchmark_group("single");
    for format in [OutputFormat::Webp, OutputFormat::Jpeg, OutputFormat::Png] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format.as_str()),
            &format,
            |b, &format| {
                let options = ConversionOptions::new(format, 80, 100);
                let names = names_for(&images, format);
                b.iter(|| {
                    convert_batch_with_concurrency(
                        &codec,
                        black_box(&images),
                        &options,
                        &names,
                        1,
                        None,
                    )
                    .unwrap()
                });
            },
        );
    }
    group.finish();
}

pub fn bench_batch_concurrency(c: &mut Criterion) {
    let codec = EngineCodec::new();
    let images = batch(16, 128, 128);
    let options = ConversionOptions::new(OutputFormat::Webp, 80, 50);
    let names = names_for(&images, OutputFormat::Webp);

    let mut group = c.benchmark_group("batch16");
    for concurrency in [1usize, 4, 16] {
        group.bench_with_input(
            BenchmarkId::from_parameter(concurrency),
            &concurrency,
            |b, &concurrency| {
                b.iter(|| {
                    convert_batch_with_concurrency(
                        &codec,
                        black_box(&images),
                        &options,
                        &names,
                        concurrency,
                        None,
                    )
                    .unwrap()
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_single_conversion, bench_batch_concurrency);
criterion_main!(benches);
