use image::{Rgba, RgbaImage};
use visionboard::ops::segmentation::{FixedMaskSegmenter, empty_mask};
use visionboard::ops::pipeline::downscale_to_fit;
use visionboard::ops::{Background, BorderKeySegmenter, EffectPipeline, ImageEffect};

/// Colourful test card: a gradient with a saturated square in the middle.
fn test_card() -> RgbaImage {
    RgbaImage::from_fn(48, 32, |x, y| {
        if (16..32).contains(&x) && (8..24).contains(&y) {
            Rgba([220, 40, 60, 255])
        } else {
            Rgba([(x * 5) as u8, (y * 7) as u8, 128, 255])
        }
    })
}

/// Object on a flat white backdrop, for the built-in keyer.
fn subject_on_white() -> RgbaImage {
    RgbaImage::from_fn(40, 40, |x, y| {
        if (12..28).contains(&x) && (12..28).contains(&y) {
            Rgba([30, 90, 200, 255])
        } else {
            Rgba([255, 255, 255, 255])
        }
    })
}

#[test]
fn none_is_the_identity_at_any_intensity() {
    let img = test_card();
    for intensity in [0.0, 0.25, 0.5, 1.0] {
        assert_eq!(ImageEffect::None.apply(&img, intensity), img);
    }
}

#[test]
fn black_and_white_is_idempotent_at_full_intensity() {
    let once = ImageEffect::BlackAndWhite.apply(&test_card(), 1.0);
    let twice = ImageEffect::BlackAndWhite.apply(&once, 1.0);
    assert_eq!(once, twice);
    assert!(once.pixels().all(|p| p[0] == p[1] && p[1] == p[2]));
}

#[test]
fn empty_mask_falls_back_to_the_effected_image() {
    let img = test_card();
    let (w, h) = img.dimensions();
    let segmenter = FixedMaskSegmenter { mask: empty_mask(w, h) };
    let pipeline = EffectPipeline::new(ImageEffect::Sepia, 0.7, Background::Solid([0, 255, 0, 255]));

    let replaced = pipeline.render(&img, &segmenter);
    let plain = EffectPipeline::new(ImageEffect::Sepia, 0.7, Background::None).render(&img, &segmenter);
    assert_eq!(replaced, plain);
    assert_eq!(replaced, ImageEffect::Sepia.apply(&img, 0.7));
}

#[test]
fn solid_background_replaces_the_backdrop() {
    let img = subject_on_white();
    let segmenter = BorderKeySegmenter::default();
    let pipeline = EffectPipeline::new(ImageEffect::None, 0.5, Background::Solid([255, 0, 0, 255]));
    let out = pipeline.render(&img, &segmenter);

    assert_eq!(out.dimensions(), img.dimensions());
    assert_eq!(*out.get_pixel(1, 1), Rgba([255, 0, 0, 255]));
    let centre = out.get_pixel(20, 20);
    for (got, want) in centre.0.iter().zip([30u8, 90, 200, 255]) {
        assert!(got.abs_diff(want) <= 2, "centre {:?}", centre);
    }
}

#[test]
fn transparent_background_clears_the_backdrop() {
    let img = subject_on_white();
    let pipeline = EffectPipeline::new(ImageEffect::None, 0.5, Background::Transparent);
    let out = pipeline.render(&img, &BorderKeySegmenter::default());
    assert_eq!(out.get_pixel(0, 0)[3], 0);
    assert!(out.get_pixel(20, 20)[3] >= 250);
}

#[test]
fn commit_hands_the_render_to_the_callback() {
    let img = test_card();
    let segmenter = BorderKeySegmenter::default();
    let pipeline = EffectPipeline::new(ImageEffect::Contrast, 0.8, Background::None);
    let expected = pipeline.render(&img, &segmenter);

    let mut delivered = Vec::new();
    pipeline.commit(&img, &segmenter, |out| delivered.push(out));
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0], expected);
}

#[test]
fn preview_is_bounded_by_max_edge() {
    let img = RgbaImage::from_pixel(400, 100, Rgba([120, 120, 120, 255]));
    let pipeline = EffectPipeline::new(ImageEffect::Vintage, 0.6, Background::None);
    let preview = pipeline.preview(&img, &BorderKeySegmenter::default(), 100);
    assert_eq!(preview.dimensions(), (100, 25));
}

/// Mean absolute per-channel difference between two same-sized images.
fn mean_abs_diff(a: &RgbaImage, b: &RgbaImage) -> f32 {
    assert_eq!(a.dimensions(), b.dimensions());
    let total: u64 = a.as_raw().iter().zip(b.as_raw()).map(|(x, y)| x.abs_diff(*y) as u64).sum();
    total as f32 / a.as_raw().len() as f32
}

#[test]
fn blur_preview_matches_shrunken_commit() {
    let img = RgbaImage::from_fn(1024, 64, |x, _| {
        if x % 256 < 128 {
            Rgba([255, 255, 255, 255])
        } else {
            Rgba([0, 0, 0, 255])
        }
    });
    let pipeline = EffectPipeline::new(ImageEffect::Blur, 1.0, Background::None);
    let segmenter = BorderKeySegmenter::default();

    let preview = pipeline.preview(&img, &segmenter, 256);
    let committed = downscale_to_fit(&pipeline.render(&img, &segmenter), 256);
    assert!(mean_abs_diff(&preview, &committed) < 8.0);
}

#[test]
fn every_effect_keeps_dimensions() {
    let img = test_card();
    for effect in ImageEffect::ALL {
        let out = effect.apply(&img, effect.preview_intensity());
        assert_eq!(out.dimensions(), img.dimensions(), "{}", effect);
    }
}
