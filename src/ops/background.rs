// ============================================================================
// BACKGROUND REPLACEMENT - generated backdrops and subject compositing
// ============================================================================

use std::str::FromStr;

use image::{GrayImage, RgbaImage};

use super::effects;
use super::filters::gaussian_blur;
use super::segmentation::has_foreground;

/// Blur radius used for the "Blur" backdrop.
pub const BACKDROP_BLUR_SIGMA: f32 = 20.0;

const WHITE: [u8; 4] = [255, 255, 255, 255];
const GRID_LINE: [u8; 4] = [215, 215, 215, 255];
const DOT: [u8; 4] = [190, 190, 190, 255];
const NOISE_SEED: u32 = 0x5EED;

/// What replaces the background behind the segmented subject.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum Background {
    #[default]
    None,
    Solid([u8; 4]),
    /// Top-left `from` to bottom-right `to`.
    Gradient { from: [u8; 4], to: [u8; 4] },
    Blur,
    Grid,
    Dots,
    Noise,
    Transparent,
}

impl Background {
    /// Choices shown in the picker. Solid and gradient carry example colours.
    pub const PRESETS: [Background; 10] = [
        Background::None,
        Background::Solid([255, 255, 255, 255]),
        Background::Solid([20, 20, 20, 255]),
        Background::Solid([255, 136, 0, 255]),
        Background::Gradient { from: [94, 114, 235, 255], to: [255, 145, 144, 255] },
        Background::Blur,
        Background::Grid,
        Background::Dots,
        Background::Noise,
        Background::Transparent,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Background::None => "None",
            Background::Solid(_) => "Solid",
            Background::Gradient { .. } => "Gradient",
            Background::Blur => "Blur",
            Background::Grid => "Grid",
            Background::Dots => "Dots",
            Background::Noise => "Noise",
            Background::Transparent => "Transparent",
        }
    }

    /// Whether choosing this background requires a subject mask.
    pub fn is_replacement(&self) -> bool {
        !matches!(self, Background::None)
    }

    /// Render the backdrop at the extent of `original`. `None` for
    /// [`Background::None`]. The blur backdrop is derived from `original`;
    /// every other kind only uses its size.
    pub fn render(&self, original: &RgbaImage) -> Option<RgbaImage> {
        self.render_scaled(original, 1.0)
    }

    /// Like [`Background::render`] for a copy of the photo resized by
    /// `pixel_scale`. The blur backdrop shrinks its radius to match.
    pub fn render_scaled(&self, original: &RgbaImage, pixel_scale: f32) -> Option<RgbaImage> {
        let (w, h) = original.dimensions();
        let cell = (w.min(h) / 12).clamp(8, 50);
        let img = match *self {
            Background::None => return None,
            Background::Solid(c) => RgbaImage::from_pixel(w, h, image::Rgba(c)),
            Background::Gradient { from, to } => effects::render_gradient(w, h, from, to),
            Background::Blur => gaussian_blur(original, BACKDROP_BLUR_SIGMA * pixel_scale),
            Background::Grid => effects::render_grid(w, h, cell, 1, WHITE, GRID_LINE),
            Background::Dots => effects::render_dots(w, h, cell, cell as f32 * 0.15, WHITE, DOT),
            Background::Noise => effects::render_noise(w, h, [200, 200, 200, 255], 0.12, NOISE_SEED),
            Background::Transparent => RgbaImage::new(w, h),
        };
        Some(img)
    }
}

impl std::fmt::Display for Background {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Background::Solid(c) => write!(f, "solid:{}", hex_color(*c)),
            Background::Gradient { from, to } => {
                write!(f, "gradient:{}:{}", hex_color(*from), hex_color(*to))
            }
            other => write!(f, "{}", other.label().to_lowercase()),
        }
    }
}

fn hex_color(c: [u8; 4]) -> String {
    if c[3] == 255 {
        format!("#{:02x}{:02x}{:02x}", c[0], c[1], c[2])
    } else {
        format!("#{:02x}{:02x}{:02x}{:02x}", c[0], c[1], c[2], c[3])
    }
}

/// Parse `#rrggbb` or `#rrggbbaa` (leading `#` optional).
pub fn parse_hex_color(s: &str) -> Result<[u8; 4], String> {
    let hex = s.trim().trim_start_matches('#');
    if !hex.is_ascii() || (hex.len() != 6 && hex.len() != 8) {
        return Err(format!("invalid colour '{}': expected #rrggbb or #rrggbbaa", s));
    }
    let byte = |i: usize| {
        u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| format!("invalid colour '{}'", s))
    };
    let a = if hex.len() == 8 { byte(6)? } else { 255 };
    Ok([byte(0)?, byte(2)?, byte(4)?, a])
}

impl FromStr for Background {
    type Err = String;

    /// `none | solid:#rrggbb | gradient:#from:#to | blur | grid | dots | noise | transparent`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        let mut parts = lower.split(':');
        let head = parts.next().unwrap_or_default();
        let args: Vec<&str> = parts.collect();
        let bg = match (head, args.as_slice()) {
            ("none", []) => Background::None,
            ("solid", [c]) => Background::Solid(parse_hex_color(c)?),
            ("gradient", [a, b]) => Background::Gradient {
                from: parse_hex_color(a)?,
                to: parse_hex_color(b)?,
            },
            ("blur", []) => Background::Blur,
            ("grid", []) => Background::Grid,
            ("dots", []) => Background::Dots,
            ("noise", []) => Background::Noise,
            ("transparent", []) => Background::Transparent,
            _ => return Err(format!("unknown background '{}'", s)),
        };
        Ok(bg)
    }
}

/// Place `foreground` over `background` through a soft subject mask:
/// `out = m * fg + (1 - m) * bg` per channel, alpha included.
///
/// Returns `foreground` unchanged if the sizes disagree or the mask has no
/// subject pixels.
pub fn composite(foreground: &RgbaImage, background: &RgbaImage, mask: &GrayImage) -> RgbaImage {
    if foreground.dimensions() != background.dimensions() || foreground.dimensions() != mask.dimensions() {
        log::warn!(
            "composite skipped: sizes fg {:?} bg {:?} mask {:?}",
            foreground.dimensions(),
            background.dimensions(),
            mask.dimensions()
        );
        return foreground.clone();
    }
    if !has_foreground(mask) {
        return foreground.clone();
    }

    let mut out = foreground.clone();
    for ((dst, bg), m) in out.pixels_mut().zip(background.pixels()).zip(mask.pixels()) {
        let m = m[0];
        if m == 255 {
            continue;
        }
        let t = m as f32 / 255.0;
        for c in 0..4 {
            let v = dst[c] as f32 * t + bg[c] as f32 * (1.0 - t);
            dst[c] = v.round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgba};

    #[test]
    fn parses_cli_forms() {
        assert_eq!("none".parse::<Background>(), Ok(Background::None));
        assert_eq!("solid:#ff8800".parse::<Background>(), Ok(Background::Solid([255, 136, 0, 255])));
        assert_eq!(
            "gradient:#000000:#ffffff".parse::<Background>(),
            Ok(Background::Gradient { from: [0, 0, 0, 255], to: [255, 255, 255, 255] })
        );
        assert_eq!("Transparent".parse::<Background>(), Ok(Background::Transparent));
        assert!("solid".parse::<Background>().is_err());
        assert!("sparkles".parse::<Background>().is_err());
    }

    #[test]
    fn multibyte_colour_is_rejected() {
        assert!("solid:a\u{e9}\u{e9}\u{e9}b".parse::<Background>().is_err());
        assert!("gradient:#000000:\u{e9}\u{e9}\u{e9}".parse::<Background>().is_err());
        assert!(parse_hex_color("\u{e9}\u{e9}\u{e9}").is_err());
        assert!(parse_hex_color("#ff\u{e9}00").is_err());
    }

    #[test]
    fn display_parses_back() {
        for bg in Background::PRESETS {
            assert_eq!(bg.to_string().parse::<Background>(), Ok(bg));
        }
    }

    #[test]
    fn hard_mask_picks_per_pixel() {
        let fg = RgbaImage::from_pixel(2, 1, Rgba([255, 0, 0, 255]));
        let bg = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 255, 255]));
        let mask = GrayImage::from_fn(2, 1, |x, _| Luma([if x == 0 { 255 } else { 0 }]));
        let out = composite(&fg, &bg, &mask);
        assert_eq!(out.get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(out.get_pixel(1, 0).0, [0, 0, 255, 255]);
    }

    #[test]
    fn transparent_backdrop_is_clear() {
        let src = RgbaImage::from_pixel(3, 3, Rgba([9, 9, 9, 255]));
        let bg = Background::Transparent.render(&src).expect("backdrop");
        assert!(bg.pixels().all(|p| p[3] == 0));
        assert!(Background::None.render(&src).is_none());
    }
}
