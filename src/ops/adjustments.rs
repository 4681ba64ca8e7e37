// ============================================================================
// ADJUSTMENTS - pointwise colour operations on flat RGBA images
// ============================================================================
//
// Every operation takes the source image by reference and returns a new one.
// Alpha is carried through untouched. Rows are processed in parallel via rayon.
// ============================================================================

use image::RgbaImage;
use rayon::prelude::*;

/// BT.709 luminance weights.
const LUMA_R: f32 = 0.2126;
const LUMA_G: f32 = 0.7152;
const LUMA_B: f32 = 0.0722;

#[inline]
pub fn luminance(r: f32, g: f32, b: f32) -> f32 {
    LUMA_R * r + LUMA_G * g + LUMA_B * b
}

/// Apply a per-pixel transform. `transform` receives (r, g, b, a) as f32 in
/// 0..255 and returns the new (r, g, b, a).
pub fn apply_pixel_transform<F>(flat: &RgbaImage, transform: F) -> RgbaImage
where
    F: Fn(f32, f32, f32, f32) -> (f32, f32, f32, f32) + Sync,
{
    let w = flat.width() as usize;
    let h = flat.height() as usize;
    if w == 0 || h == 0 {
        return flat.clone();
    }

    let src_raw = flat.as_raw();
    let stride = w * 4;
    let mut dst_raw = vec![0u8; w * h * 4];

    dst_raw.par_chunks_mut(stride).enumerate().for_each(|(y, row_out)| {
        let row_in = &src_raw[y * stride..(y + 1) * stride];
        for x in 0..w {
            let pi = x * 4;
            let r = row_in[pi] as f32;
            let g = row_in[pi + 1] as f32;
            let b = row_in[pi + 2] as f32;
            let a = row_in[pi + 3] as f32;
            let (nr, ng, nb, na) = transform(r, g, b, a);
            row_out[pi]     = nr.round().clamp(0.0, 255.0) as u8;
            row_out[pi + 1] = ng.round().clamp(0.0, 255.0) as u8;
            row_out[pi + 2] = nb.round().clamp(0.0, 255.0) as u8;
            row_out[pi + 3] = na.round().clamp(0.0, 255.0) as u8;
        }
    });

    RgbaImage::from_raw(w as u32, h as u32, dst_raw).unwrap_or_else(|| flat.clone())
}

/// Combine two same-sized images pixel by pixel. Falls back to `bottom` when
/// the sizes differ.
pub fn apply_pixel_blend<F>(top: &RgbaImage, bottom: &RgbaImage, blend: F) -> RgbaImage
where
    F: Fn([f32; 4], [f32; 4]) -> [f32; 4] + Sync,
{
    if top.dimensions() != bottom.dimensions() {
        log::warn!(
            "blend skipped: size mismatch {:?} vs {:?}",
            top.dimensions(),
            bottom.dimensions()
        );
        return bottom.clone();
    }
    let w = top.width() as usize;
    let h = top.height() as usize;
    if w == 0 || h == 0 {
        return bottom.clone();
    }

    let top_raw = top.as_raw();
    let bot_raw = bottom.as_raw();
    let stride = w * 4;
    let mut dst_raw = vec![0u8; w * h * 4];

    dst_raw.par_chunks_mut(stride).enumerate().for_each(|(y, row_out)| {
        let t_row = &top_raw[y * stride..(y + 1) * stride];
        let b_row = &bot_raw[y * stride..(y + 1) * stride];
        for x in 0..w {
            let pi = x * 4;
            let t = [t_row[pi] as f32, t_row[pi + 1] as f32, t_row[pi + 2] as f32, t_row[pi + 3] as f32];
            let b = [b_row[pi] as f32, b_row[pi + 1] as f32, b_row[pi + 2] as f32, b_row[pi + 3] as f32];
            let out = blend(t, b);
            for c in 0..4 {
                row_out[pi + c] = out[c].round().clamp(0.0, 255.0) as u8;
            }
        }
    });

    RgbaImage::from_raw(w as u32, h as u32, dst_raw).unwrap_or_else(|| bottom.clone())
}

// ============================================================================
// TONE
// ============================================================================

/// Sepia tone. `amount` 0..1 mixes from the original (0) to full sepia (1).
pub fn sepia(flat: &RgbaImage, amount: f32) -> RgbaImage {
    let t = amount.clamp(0.0, 1.0);
    apply_pixel_transform(flat, move |r, g, b, a| {
        let sr = (0.393 * r + 0.769 * g + 0.189 * b).min(255.0);
        let sg = (0.349 * r + 0.686 * g + 0.168 * b).min(255.0);
        let sb = (0.272 * r + 0.534 * g + 0.131 * b).min(255.0);
        (
            r + (sr - r) * t,
            g + (sg - g) * t,
            b + (sb - b) * t,
            a,
        )
    })
}

/// Full desaturation to BT.709 luminance. A grey image maps to itself.
pub fn desaturate(flat: &RgbaImage) -> RgbaImage {
    apply_pixel_transform(flat, |r, g, b, a| {
        let v = luminance(r, g, b);
        (v, v, v, a)
    })
}

// ============================================================================
// COLOUR CONTROLS
// ============================================================================

/// Additive brightness. `offset` is -1..1 where ±1 shifts by a full channel.
pub fn brightness(flat: &RgbaImage, offset: f32) -> RgbaImage {
    let shift = offset.clamp(-1.0, 1.0) * 255.0;
    apply_pixel_transform(flat, move |r, g, b, a| (r + shift, g + shift, b + shift, a))
}

/// Contrast around mid-grey. `factor` 1.0 leaves the image unchanged.
pub fn contrast(flat: &RgbaImage, factor: f32) -> RgbaImage {
    let k = factor.max(0.0);
    apply_pixel_transform(flat, move |r, g, b, a| {
        (
            (r - 127.5) * k + 127.5,
            (g - 127.5) * k + 127.5,
            (b - 127.5) * k + 127.5,
            a,
        )
    })
}

/// Saturation relative to luminance. 0 = grey, 1 = unchanged, 2 = doubled.
pub fn saturation(flat: &RgbaImage, factor: f32) -> RgbaImage {
    let k = factor.max(0.0);
    apply_pixel_transform(flat, move |r, g, b, a| {
        let l = luminance(r, g, b);
        (l + (r - l) * k, l + (g - l) * k, l + (b - l) * k, a)
    })
}

// ============================================================================
// BLENDS
// ============================================================================

/// Screen blend of `top` over `bottom`. Alpha is taken from `bottom`.
pub fn screen(top: &RgbaImage, bottom: &RgbaImage) -> RgbaImage {
    apply_pixel_blend(top, bottom, |t, b| {
        [
            255.0 - (255.0 - t[0]) * (255.0 - b[0]) / 255.0,
            255.0 - (255.0 - t[1]) * (255.0 - b[1]) / 255.0,
            255.0 - (255.0 - t[2]) * (255.0 - b[2]) / 255.0,
            b[3],
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(c: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(4, 3, Rgba(c))
    }

    #[test]
    fn neutral_parameters_are_identity() {
        let img = RgbaImage::from_fn(8, 8, |x, y| Rgba([(x * 30) as u8, (y * 30) as u8, 77, 200]));
        assert_eq!(brightness(&img, 0.0), img);
        assert_eq!(contrast(&img, 1.0), img);
        assert_eq!(saturation(&img, 1.0), img);
        assert_eq!(sepia(&img, 0.0), img);
    }

    #[test]
    fn desaturate_keeps_alpha() {
        let out = desaturate(&solid([255, 0, 0, 90]));
        let p = out.get_pixel(0, 0);
        assert_eq!(p[0], p[1]);
        assert_eq!(p[1], p[2]);
        assert_eq!(p[3], 90);
    }

    #[test]
    fn screen_with_black_is_identity() {
        let img = solid([10, 120, 240, 255]);
        assert_eq!(screen(&solid([0, 0, 0, 255]), &img), img);
    }
}
