// ============================================================================
// EFFECT PIPELINE - one pointwise effect, then optional background replacement
// ============================================================================

use std::str::FromStr;

use image::{RgbaImage, imageops::FilterType};

use super::adjustments;
use super::background::{Background, composite};
use super::effects;
use super::filters;
use super::segmentation::{SubjectSegmenter, has_foreground};

/// Blur radius at full intensity.
pub const MAX_BLUR_RADIUS: f32 = 20.0;

/// Vignette radius as a fraction of the shorter image side.
const VIGNETTE_RADIUS_FRACTION: f32 = 0.7;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ImageEffect {
    #[default]
    None,
    Vintage,
    Blur,
    BlackAndWhite,
    Sepia,
    Vignette,
    Brightness,
    Contrast,
    Saturate,
}

impl ImageEffect {
    pub const ALL: [ImageEffect; 9] = [
        ImageEffect::None,
        ImageEffect::Vintage,
        ImageEffect::Blur,
        ImageEffect::BlackAndWhite,
        ImageEffect::Sepia,
        ImageEffect::Vignette,
        ImageEffect::Brightness,
        ImageEffect::Contrast,
        ImageEffect::Saturate,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            ImageEffect::None => "None",
            ImageEffect::Vintage => "Vintage",
            ImageEffect::Blur => "Blur",
            ImageEffect::BlackAndWhite => "B&W",
            ImageEffect::Sepia => "Sepia",
            ImageEffect::Vignette => "Vignette",
            ImageEffect::Brightness => "Bright",
            ImageEffect::Contrast => "Contrast",
            ImageEffect::Saturate => "Saturate",
        }
    }

    /// Name accepted on the command line.
    pub fn cli_name(&self) -> &'static str {
        match self {
            ImageEffect::None => "none",
            ImageEffect::Vintage => "vintage",
            ImageEffect::Blur => "blur",
            ImageEffect::BlackAndWhite => "bw",
            ImageEffect::Sepia => "sepia",
            ImageEffect::Vignette => "vignette",
            ImageEffect::Brightness => "brightness",
            ImageEffect::Contrast => "contrast",
            ImageEffect::Saturate => "saturate",
        }
    }

    /// Intensity used for the effect's thumbnail in the picker grid.
    pub fn preview_intensity(&self) -> f32 {
        match self {
            ImageEffect::None => 0.0,
            ImageEffect::Vintage => 0.7,
            ImageEffect::Blur => 0.3,
            ImageEffect::BlackAndWhite => 1.0,
            ImageEffect::Sepia => 0.7,
            ImageEffect::Vignette => 0.7,
            ImageEffect::Brightness | ImageEffect::Contrast | ImageEffect::Saturate => 0.5,
        }
    }

    /// Apply the effect at `intensity` (clamped to 0..1).
    pub fn apply(&self, img: &RgbaImage, intensity: f32) -> RgbaImage {
        self.apply_scaled(img, intensity, 1.0)
    }

    /// Apply to a copy of the photo resized by `pixel_scale`. Radii measured
    /// in pixels shrink with it so a small render looks like a shrunken
    /// full-size one.
    pub fn apply_scaled(&self, img: &RgbaImage, intensity: f32, pixel_scale: f32) -> RgbaImage {
        let i = if intensity.is_nan() { 0.0 } else { intensity.clamp(0.0, 1.0) };
        match self {
            ImageEffect::None => img.clone(),
            ImageEffect::Vintage => {
                let toned = adjustments::sepia(img, i * 0.8);
                let mono = adjustments::desaturate(img);
                adjustments::screen(&toned, &mono)
            }
            ImageEffect::Blur => filters::gaussian_blur(img, i * MAX_BLUR_RADIUS * pixel_scale),
            ImageEffect::BlackAndWhite => {
                // Below full strength this is a switch, not a blend.
                if i > 0.5 {
                    adjustments::desaturate(img)
                } else {
                    img.clone()
                }
            }
            ImageEffect::Sepia => adjustments::sepia(img, i),
            ImageEffect::Vignette => {
                let radius = img.width().min(img.height()) as f32 * VIGNETTE_RADIUS_FRACTION;
                effects::vignette(img, i, radius)
            }
            ImageEffect::Brightness => adjustments::brightness(img, (i - 0.5) * 2.0),
            ImageEffect::Contrast => adjustments::contrast(img, i * 2.0),
            ImageEffect::Saturate => adjustments::saturation(img, i * 2.0),
        }
    }
}

impl std::fmt::Display for ImageEffect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for ImageEffect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        ImageEffect::ALL
            .into_iter()
            .find(|e| e.cli_name() == key || e.display_name().to_lowercase() == key)
            .or(match key.as_str() {
                "blackandwhite" | "mono" => Some(ImageEffect::BlackAndWhite),
                _ => None,
            })
            .ok_or_else(|| {
                let names: Vec<&str> = ImageEffect::ALL.iter().map(|e| e.cli_name()).collect();
                format!("unknown effect '{}' (expected one of: {})", s, names.join(", "))
            })
    }
}

/// Segment `original`, build `background` at its extent and place `effected`
/// over it. Any failure returns `effected` unchanged.
pub fn replace_background(
    original: &RgbaImage,
    effected: &RgbaImage,
    background: Background,
    segmenter: &dyn SubjectSegmenter,
) -> RgbaImage {
    replace_background_scaled(original, effected, background, segmenter, 1.0)
}

fn replace_background_scaled(
    original: &RgbaImage,
    effected: &RgbaImage,
    background: Background,
    segmenter: &dyn SubjectSegmenter,
    pixel_scale: f32,
) -> RgbaImage {
    let Some(backdrop) = background.render_scaled(original, pixel_scale) else {
        return effected.clone();
    };
    let mask = match segmenter.segment(original) {
        Ok(mask) => mask,
        Err(e) => {
            log::info!("background replacement skipped: {}", e);
            return effected.clone();
        }
    };
    if !has_foreground(&mask) {
        log::info!("background replacement skipped: empty subject mask");
        return effected.clone();
    }
    composite(effected, &backdrop, &mask)
}

/// The user's choices in the effects modal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EffectPipeline {
    pub effect: ImageEffect,
    pub intensity: f32,
    pub background: Background,
}

impl Default for EffectPipeline {
    fn default() -> Self {
        Self {
            effect: ImageEffect::None,
            intensity: 0.5,
            background: Background::None,
        }
    }
}

impl EffectPipeline {
    pub fn new(effect: ImageEffect, intensity: f32, background: Background) -> Self {
        Self { effect, intensity, background }
    }

    /// Run the effect, then the background replacement.
    pub fn render(&self, original: &RgbaImage, segmenter: &dyn SubjectSegmenter) -> RgbaImage {
        self.render_scaled(original, segmenter, 1.0)
    }

    /// [`EffectPipeline::render`] for a copy of the photo resized by
    /// `pixel_scale` (see [`ImageEffect::apply_scaled`]).
    pub fn render_scaled(
        &self,
        image: &RgbaImage,
        segmenter: &dyn SubjectSegmenter,
        pixel_scale: f32,
    ) -> RgbaImage {
        let effected = self.effect.apply_scaled(image, self.intensity, pixel_scale);
        if !self.background.is_replacement() {
            return effected;
        }
        replace_background_scaled(image, &effected, self.background, segmenter, pixel_scale)
    }

    /// Render on a copy no larger than `max_edge` on its longer side. The
    /// result approximates the committed image shrunk to the same size.
    pub fn preview(&self, original: &RgbaImage, segmenter: &dyn SubjectSegmenter, max_edge: u32) -> RgbaImage {
        let small = downscale_to_fit(original, max_edge);
        self.render_scaled(&small, segmenter, pixel_scale(original, &small))
    }

    /// Produce the final image and hand it to `on_done`.
    pub fn commit<F>(&self, original: &RgbaImage, segmenter: &dyn SubjectSegmenter, on_done: F)
    where
        F: FnOnce(RgbaImage),
    {
        log::info!(
            "pipeline: {} @ {:.2}, background {} on {}x{}",
            self.effect,
            self.intensity,
            self.background,
            original.width(),
            original.height()
        );
        on_done(self.render(original, segmenter));
    }
}

/// Ratio of `small`'s longer side to `original`'s. 1.0 for empty images.
pub fn pixel_scale(original: &RgbaImage, small: &RgbaImage) -> f32 {
    let full = original.width().max(original.height());
    if full == 0 {
        return 1.0;
    }
    small.width().max(small.height()) as f32 / full as f32
}

/// Shrink `img` so its longer side is at most `max_edge`. Never upscales.
pub fn downscale_to_fit(img: &RgbaImage, max_edge: u32) -> RgbaImage {
    let (w, h) = img.dimensions();
    let longest = w.max(h);
    if max_edge == 0 || longest <= max_edge {
        return img.clone();
    }
    let k = max_edge as f32 / longest as f32;
    let nw = ((w as f32 * k).round() as u32).max(1);
    let nh = ((h as f32 * k).round() as u32).max(1);
    image::imageops::resize(img, nw, nh, FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn effect_names_parse() {
        assert_eq!("sepia".parse::<ImageEffect>(), Ok(ImageEffect::Sepia));
        assert_eq!("B&W".parse::<ImageEffect>(), Ok(ImageEffect::BlackAndWhite));
        assert_eq!("bright".parse::<ImageEffect>(), Ok(ImageEffect::Brightness));
        assert!("posterize".parse::<ImageEffect>().is_err());
    }

    #[test]
    fn bw_below_threshold_keeps_original() {
        let img = RgbaImage::from_pixel(3, 3, Rgba([200, 10, 10, 255]));
        assert_eq!(ImageEffect::BlackAndWhite.apply(&img, 0.4), img);
        assert_ne!(ImageEffect::BlackAndWhite.apply(&img, 0.6), img);
    }

    #[test]
    fn brightness_midpoint_is_neutral() {
        let img = RgbaImage::from_fn(4, 4, |x, y| Rgba([x as u8 * 40, y as u8 * 40, 90, 255]));
        assert_eq!(ImageEffect::Brightness.apply(&img, 0.5), img);
    }

    #[test]
    fn contrast_and_saturation_midpoints_are_neutral() {
        let img = RgbaImage::from_fn(4, 4, |x, y| Rgba([x as u8 * 60, 200 - y as u8 * 40, 30, 255]));
        assert_eq!(ImageEffect::Contrast.apply(&img, 0.5), img);
        assert_eq!(ImageEffect::Saturate.apply(&img, 0.5), img);
        assert_ne!(ImageEffect::Contrast.apply(&img, 1.0), img);
        assert_ne!(ImageEffect::Saturate.apply(&img, 0.0), img);
    }

    #[test]
    fn vignette_radius_follows_shorter_side() {
        let wide = RgbaImage::from_pixel(40, 20, Rgba([180, 180, 180, 255]));
        let tall = RgbaImage::from_pixel(20, 40, Rgba([180, 180, 180, 255]));
        let radius = 20.0 * VIGNETTE_RADIUS_FRACTION;
        for i in [0.3, 0.7, 1.0] {
            assert_eq!(ImageEffect::Vignette.apply(&wide, i), effects::vignette(&wide, i, radius));
            assert_eq!(ImageEffect::Vignette.apply(&tall, i), effects::vignette(&tall, i, radius));
        }
    }

    #[test]
    fn blur_radius_scales_with_pixels() {
        let img = RgbaImage::from_fn(32, 8, |x, _| Rgba([if x % 8 < 4 { 255 } else { 0 }, 0, 0, 255]));
        assert_eq!(
            ImageEffect::Blur.apply_scaled(&img, 0.5, 0.25),
            filters::gaussian_blur(&img, 0.5 * MAX_BLUR_RADIUS * 0.25)
        );
        assert_eq!(ImageEffect::Blur.apply(&img, 0.5), filters::gaussian_blur(&img, 0.5 * MAX_BLUR_RADIUS));
    }

    #[test]
    fn pixel_scale_is_longer_side_ratio() {
        assert_eq!(pixel_scale(&RgbaImage::new(400, 200), &RgbaImage::new(100, 50)), 0.25);
        assert_eq!(pixel_scale(&RgbaImage::new(0, 0), &RgbaImage::new(0, 0)), 1.0);
    }

    #[test]
    fn downscale_keeps_aspect() {
        let img = RgbaImage::new(400, 200);
        assert_eq!(downscale_to_fit(&img, 100).dimensions(), (100, 50));
        assert_eq!(downscale_to_fit(&img, 1000).dimensions(), (400, 200));
    }
}
