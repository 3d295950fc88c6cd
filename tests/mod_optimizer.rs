use base64::Engine as _;
use base64::engine::general_purpose;
use image::{ImageFormat, RgbImage};
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use visioncache::optimizer::{
    ImageOptimizer, OptimizeOptions, OptimizedImage, OutputFormat, calculate_size_reduction,
    probe_metadata,
};
use visioncache::types::ImageFile;

/// PNG of pseudo-random pixels; noise keeps the encoded size large.
fn noise_png(name: &str, width: u32, height: u32) -> ImageFile {
    let mut state: u32 = 0x9e37_79b9 ^ width.wrapping_mul(31).wrapping_add(height);
    let img = RgbImage::from_fn(width, height, |_, _| {
        state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        let [a, b, c, _] = state.to_le_bytes();
        image::Rgb([a, b, c])
    });
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    ImageFile::from_bytes(name, buf.into_inner())
}

async fn decoded_dims(file: &ImageFile) -> (u32, u32) {
    let bytes = file.read_bytes().await.unwrap();
    let img = image::load_from_memory(&bytes).unwrap();
    (img.width(), img.height())
}

#[tokio::test]
async fn small_files_pass_through_untouched() {
    let f = ImageFile::from_bytes("tiny.png", vec![7u8; 50 * 1024]);
    let out = ImageOptimizer::new().optimize_image(&f, &OptimizeOptions::default()).await.unwrap();
    assert_eq!(out.compression_ratio, 1.0);
    assert_eq!(out.original_size, out.optimized_size);
    assert_eq!(out.file.name(), "tiny.png");
    assert!(!out.was_transformed());
}

#[tokio::test]
async fn noop_options_pass_through() {
    let f = noise_png("big.png", 400, 400);
    let opts = OptimizeOptions { enable_resize: false, enable_compression: false, ..Default::default() };
    let out = ImageOptimizer::new().optimize_image(&f, &opts).await.unwrap();
    assert_eq!(out.compression_ratio, 1.0);
    assert_eq!(out.file.name(), "big.png");
}

#[tokio::test]
async fn landscape_resize_keeps_aspect_ratio() {
    let f = noise_png("wide.png", 1600, 800);
    assert!(f.size().await.unwrap() > 100 * 1024);
    let out = ImageOptimizer::new().optimize_image(&f, &OptimizeOptions::default()).await.unwrap();

    assert_eq!((out.width, out.height), (1024, 512));
    assert_eq!(decoded_dims(&out.file).await, (1024, 512));
    assert_eq!(out.file.name(), "wide.jpg");
    assert_eq!(out.file.mime_type(), "image/jpeg");
    assert!(out.optimized_size < out.original_size);
    let expected = out.optimized_size as f64 / out.original_size as f64;
    assert!((out.compression_ratio - expected).abs() < 1e-9);
}

#[tokio::test]
async fn portrait_resize_keeps_aspect_ratio() {
    let f = noise_png("tall.png", 600, 1200);
    let out = ImageOptimizer::new().optimize_image(&f, &OptimizeOptions::default()).await.unwrap();
    assert_eq!((out.width, out.height), (512, 1024));
}

#[tokio::test]
async fn in_bounds_image_is_only_recompressed() {
    let f = noise_png("square.png", 300, 300);
    let opts = OptimizeOptions { format: OutputFormat::Png, ..Default::default() };
    let out = ImageOptimizer::new().optimize_image(&f, &opts).await.unwrap();
    assert_eq!((out.width, out.height), (300, 300));
    assert_eq!(out.file.name(), "square.png");
    assert_eq!(decoded_dims(&out.file).await, (300, 300));
}

#[tokio::test]
async fn undecodable_large_file_is_an_error() {
    let f = ImageFile::from_bytes("broken.jpg", vec![0xAB; 200 * 1024]);
    assert!(ImageOptimizer::new().optimize_image(&f, &OptimizeOptions::default()).await.is_err());
}

#[tokio::test]
async fn batch_survives_bad_inputs_in_order() {
    let files = vec![
        noise_png("one.png", 500, 500),
        ImageFile::from_bytes("broken.jpg", vec![0xAB; 200 * 1024]),
        ImageFile::from_bytes("small.png", vec![1u8; 1024]),
    ];
    let calls = Arc::new(Mutex::new(Vec::new()));
    let sink = calls.clone();
    let out = ImageOptimizer::new()
        .optimize_images(&files, &OptimizeOptions::default(), move |done, total| {
            sink.lock().unwrap().push((done, total));
        })
        .await;

    assert_eq!(out.len(), 3);
    assert_eq!(out[0].file.name(), "one.jpg");
    assert_eq!(out[1].file.name(), "broken.jpg");
    assert_eq!(out[1].compression_ratio, 1.0);
    assert_eq!(out[1].original_size, 200 * 1024);
    assert_eq!(out[2].file.name(), "small.png");
    assert_eq!(*calls.lock().unwrap(), vec![(1, 3), (2, 3), (3, 3)]);
}

#[tokio::test]
async fn empty_batch_reports_nothing() {
    let mut calls = 0;
    let out = ImageOptimizer::new()
        .optimize_images(&[], &OptimizeOptions::default(), |_, _| calls += 1)
        .await;
    assert!(out.is_empty());
    assert_eq!(calls, 0);
}

#[tokio::test]
async fn thumbnail_is_jpeg_data_url_within_box() {
    let f = noise_png("photo.png", 300, 150);
    let url = ImageOptimizer::new().generate_thumbnail(&f, 150).await.unwrap();
    let payload = url.strip_prefix("data:image/jpeg;base64,").expect("jpeg data url");
    let bytes = general_purpose::STANDARD.decode(payload).unwrap();
    assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
    let thumb = image::load_from_memory(&bytes).unwrap();
    assert_eq!((thumb.width(), thumb.height()), (150, 75));
}

#[tokio::test]
async fn thumbnail_of_garbage_fails() {
    let f = ImageFile::from_bytes("x.png", b"nope".to_vec());
    assert!(ImageOptimizer::new().generate_thumbnail(&f, 64).await.is_err());
}

#[tokio::test]
async fn probe_reads_header_facts() {
    let f = noise_png("meta.png", 320, 240);
    let meta = probe_metadata(&f).await.unwrap();
    assert_eq!(meta.format, "png");
    assert_eq!((meta.width, meta.height), (320, 240));
    assert_eq!(meta.size_bytes, f.size().await.unwrap());
    assert_eq!(meta.filename, "meta.png");
}

#[test]
fn size_reduction_over_batch() {
    let make = |orig: u64, opt: u64| OptimizedImage {
        file: ImageFile::from_bytes("f.jpg", Vec::<u8>::new()),
        original_size: orig,
        optimized_size: opt,
        compression_ratio: opt as f64 / orig as f64,
        width: 1,
        height: 1,
    };
    let r = calculate_size_reduction(&[make(1000, 400), make(1000, 600)]);
    assert_eq!(r.original_total, 2000);
    assert_eq!(r.optimized_total, 1000);
    assert_eq!(r.reduction_bytes, 1000);
    assert!((r.reduction_percentage - 50.0).abs() < 1e-9);

    let empty = calculate_size_reduction(&[]);
    assert_eq!(empty.reduction_percentage, 0.0);
}
