// tests/edge_cases.rs
//
// Boundary values, invalid inputs, and failure-path behavior.

use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use imgbatch::error::ImgBatchError;
use imgbatch::{
    convert_batch_with_concurrency, generate_file_name, inspect_header_from_bytes,
    ConversionOptions, EngineCodec, OutputFormat, QueuedImage,
};
use std::io::Cursor;

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([60, 120, 180])));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

fn names_for(images: &[QueuedImage], options: &ConversionOptions) -> Vec<String> {
    images
        .iter()
        .enumerate()
        .map(|(i, img)| generate_file_name(img.name(), i, options.format, &options.prefix))
        .collect()
}

#[test]
fn test_1x1_image_survives_minimum_resize() {
    let codec = EngineCodec::new();
    let images = vec![QueuedImage::from_bytes("dot.png", png_bytes(1, 1))];
    let options = ConversionOptions::new(OutputFormat::Png, 80, 1);
    let names = names_for(&images, &options);

    let results =
        convert_batch_with_concurrency(&codec, &images, &options, &names, 1, None).unwrap();
    assert!(results[0].succeeded());
    let decoded = image::load_from_memory(results[0].output().unwrap()).unwrap();
    assert_eq!(decoded.dimensions(), (1, 1));
}

#[test]
fn test_odd_dimensions_round_on_resize() {
    // 33% of 15 is 4.95 -> 5
    let codec = EngineCodec::new();
    let images = vec![QueuedImage::from_bytes("odd.png", png_bytes(15, 15))];
    let options = ConversionOptions::new(OutputFormat::Png, 80, 33);
    let names = names_for(&images, &options);

    let results =
        convert_batch_with_concurrency(&codec, &images, &options, &names, 1, None).unwrap();
    let decoded = image::load_from_memory(results[0].output().unwrap()).unwrap();
    assert_eq!(decoded.dimensions(), (5, 5));
}

#[test]
fn test_png_output_is_independent_of_quality() {
    let codec = EngineCodec::new();
    let images = vec![QueuedImage::from_bytes("q.png", png_bytes(24, 24))];
    let names = vec!["q.png".to_string()];

    let low = convert_batch_with_concurrency(
        &codec,
        &images,
        &ConversionOptions::new(OutputFormat::Png, 10, 100),
        &names,
        1,
        None,
    )
    .unwrap();
    let high = convert_batch_with_concurrency(
        &codec,
        &images,
        &ConversionOptions::new(OutputFormat::Png, 90, 100),
        &names,
        1,
        None,
    )
    .unwrap();

    assert_eq!(
        low[0].output().unwrap().as_slice(),
        high[0].output().unwrap().as_slice()
    );
}

#[test]
fn test_transparent_png_resizes_cleanly() {
    let codec = EngineCodec::new();
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(16, 16, Rgba([200, 100, 50, 0])));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    let images = vec![QueuedImage::from_bytes("alpha.png", buf)];
    let options = ConversionOptions::new(OutputFormat::Png, 80, 50);
    let names = names_for(&images, &options);

    let results =
        convert_batch_with_concurrency(&codec, &images, &options, &names, 1, None).unwrap();
    let decoded = image::load_from_memory(results[0].output().unwrap()).unwrap();
    assert_eq!(decoded.dimensions(), (8, 8));
}

#[test]
fn test_truncated_png_fails_cleanly() {
    let codec = EngineCodec::new();
    let mut bytes = png_bytes(32, 32);
    bytes.truncate(bytes.len() / 2);
    let images = vec![QueuedImage::from_bytes("cut.png", bytes)];
    let names = vec!["cut.webp".to_string()];

    let err = convert_batch_with_concurrency(
        &codec,
        &images,
        &ConversionOptions::default(),
        &names,
        1,
        None,
    )
    .unwrap_err();
    assert!(matches!(err, ImgBatchError::AllConversionsFailed { failed: 1 }));
}

#[test]
fn test_empty_bytes_fail_cleanly() {
    let codec = EngineCodec::new();
    let images = vec![QueuedImage::from_bytes("void.png", Vec::new())];
    let names = vec!["void.webp".to_string()];
    let err = convert_batch_with_concurrency(
        &codec,
        &images,
        &ConversionOptions::default(),
        &names,
        1,
        None,
    )
    .unwrap_err();
    assert!(matches!(err, ImgBatchError::AllConversionsFailed { failed: 1 }));
}

#[test]
fn test_quality_extremes_accepted_for_lossy_formats() {
    let codec = EngineCodec::new();
    let images = vec![QueuedImage::from_bytes("ext.png", png_bytes(32, 32))];
    let names = vec!["ext.jpg".to_string()];

    for quality in [0u8, 100u8] {
        let options = ConversionOptions::new(OutputFormat::Jpeg, quality, 100);
        let results =
            convert_batch_with_concurrency(&codec, &images, &options, &names, 1, None).unwrap();
        assert!(results[0].succeeded());
    }
}

#[test]
fn test_invalid_resize_percentage_rejected() {
    let codec = EngineCodec::new();
    let images = vec![QueuedImage::from_bytes("r.png", png_bytes(8, 8))];
    let names = vec!["r.webp".to_string()];

    for bad in [0u8, 101u8] {
        let options = ConversionOptions::new(OutputFormat::Webp, 80, bad);
        let err = convert_batch_with_concurrency(&codec, &images, &options, &names, 1, None)
            .unwrap_err();
        assert!(matches!(err, ImgBatchError::InvalidOptions { .. }));
    }
}

#[test]
fn test_inspect_rejects_dimensions_from_garbage_header() {
    assert!(inspect_header_from_bytes(&[0x89, 0x50, 0x4E, 0x47]).is_err());
}

#[test]
fn test_dotfile_name_strips_to_bare_extension() {
    // The leading dot is the extension separator here, matching the
    // strip-last-suffix rule rather than shell hidden-file conventions
    assert_eq!(
        generate_file_name(".bashrc", 0, OutputFormat::Webp, ""),
        ".webp"
    );
}

#[test]
fn test_savings_and_size_formatting() {
    use imgbatch::{calculate_savings, format_file_size};

    assert_eq!(calculate_savings(1000, 400), Some(60.0));
    assert_eq!(calculate_savings(1000, 1200), None);
    assert_eq!(calculate_savings(0, 10), None);

    assert_eq!(format_file_size(512), "512 B");
    assert_eq!(format_file_size(2048), "2.0 KB");
    assert_eq!(format_file_size(5 * 1024 * 1024), "5.0 MB");
}
