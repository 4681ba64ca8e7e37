// ============================================================================
// EFFECTS - position-dependent effects and generated patterns
// ============================================================================
//
//   - Stylize: Vignette
//   - Render:  Gradient, Grid, Dots, Noise, Checkerboard
//
// Renderers produce a fresh image of the requested extent; they are used to
// build replacement backgrounds.
// ============================================================================

use image::{Rgba, RgbaImage};
use rayon::prelude::*;

// ============================================================================
// SHARED HELPERS
// ============================================================================

/// Per-pixel transform that also receives the pixel coordinates.
fn apply_per_pixel<F>(flat: &RgbaImage, transform: F) -> RgbaImage
where
    F: Fn(u32, u32, f32, f32, f32, f32) -> (f32, f32, f32, f32) + Sync,
{
    let w = flat.width() as usize;
    let h = flat.height() as usize;
    if w == 0 || h == 0 {
        return flat.clone();
    }

    let src_raw = flat.as_raw();
    let stride = w * 4;
    let mut dst_raw = vec![0u8; w * h * 4];

    dst_raw
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row_out)| {
            let row_in = &src_raw[y * stride..(y + 1) * stride];
            for x in 0..w {
                let pi = x * 4;
                let r = row_in[pi] as f32;
                let g = row_in[pi + 1] as f32;
                let b = row_in[pi + 2] as f32;
                let a = row_in[pi + 3] as f32;
                let (nr, ng, nb, na) = transform(x as u32, y as u32, r, g, b, a);
                row_out[pi] = nr.round().clamp(0.0, 255.0) as u8;
                row_out[pi + 1] = ng.round().clamp(0.0, 255.0) as u8;
                row_out[pi + 2] = nb.round().clamp(0.0, 255.0) as u8;
                row_out[pi + 3] = na.round().clamp(0.0, 255.0) as u8;
            }
        });

    RgbaImage::from_raw(w as u32, h as u32, dst_raw).unwrap_or_else(|| flat.clone())
}

/// Generate an image from a coordinate function, rows in parallel.
fn render_pattern<F>(width: u32, height: u32, shade: F) -> RgbaImage
where
    F: Fn(u32, u32) -> [u8; 4] + Sync,
{
    let w = width as usize;
    let h = height as usize;
    if w == 0 || h == 0 {
        return RgbaImage::new(width, height);
    }
    let stride = w * 4;
    let mut raw = vec![0u8; w * h * 4];
    raw.par_chunks_mut(stride).enumerate().for_each(|(y, row)| {
        for x in 0..w {
            let px = shade(x as u32, y as u32);
            row[x * 4..x * 4 + 4].copy_from_slice(&px);
        }
    });
    RgbaImage::from_raw(width, height, raw).unwrap_or_else(|| RgbaImage::new(width, height))
}

/// Simple hash for deterministic noise.
#[inline]
fn hash_u32(mut x: u32) -> u32 {
    x = x.wrapping_mul(0x9E3779B9);
    x ^= x >> 16;
    x = x.wrapping_mul(0x85EBCA6B);
    x ^= x >> 13;
    x = x.wrapping_mul(0xC2B2AE35);
    x ^= x >> 16;
    x
}

/// Hash to f32 in [0, 1).
#[inline]
fn hash_f32(x: u32, y: u32, seed: u32) -> f32 {
    let h = hash_u32(
        x.wrapping_mul(374761393)
            .wrapping_add(y.wrapping_mul(668265263))
            .wrapping_add(seed),
    );
    (h & 0x00FFFFFF) as f32 / 16777216.0
}

#[inline]
fn lerp_color(a: [u8; 4], b: [u8; 4], t: f32) -> [u8; 4] {
    let mut out = [0u8; 4];
    for c in 0..4 {
        let v = a[c] as f32 + (b[c] as f32 - a[c] as f32) * t;
        out[c] = v.round().clamp(0.0, 255.0) as u8;
    }
    out
}

// ============================================================================
// STYLIZE
// ============================================================================

/// Radial darkening. Pixels at `radius` from the centre lose `intensity` of
/// their brightness; the falloff is quadratic and keeps going past the radius.
pub fn vignette(flat: &RgbaImage, intensity: f32, radius: f32) -> RgbaImage {
    let amount = intensity.clamp(0.0, 1.0);
    if amount == 0.0 || radius <= 0.0 {
        return flat.clone();
    }
    let cx = flat.width() as f32 / 2.0;
    let cy = flat.height() as f32 / 2.0;

    apply_per_pixel(flat, |x, y, r, g, b, a| {
        let dx = x as f32 + 0.5 - cx;
        let dy = y as f32 + 0.5 - cy;
        let dist = (dx * dx + dy * dy).sqrt() / radius;
        let vf = (1.0 - amount * dist * dist).clamp(0.0, 1.0);
        (r * vf, g * vf, b * vf, a)
    })
}

// ============================================================================
// RENDER
// ============================================================================

/// Linear gradient from the top-left corner (`from`) to the bottom-right
/// corner (`to`).
pub fn render_gradient(width: u32, height: u32, from: [u8; 4], to: [u8; 4]) -> RgbaImage {
    let sx = (width.max(2) - 1) as f32;
    let sy = (height.max(2) - 1) as f32;
    render_pattern(width, height, |x, y| {
        let t = (x as f32 / sx + y as f32 / sy) * 0.5;
        lerp_color(from, to, t.clamp(0.0, 1.0))
    })
}

/// Square grid lines on a flat base.
pub fn render_grid(width: u32, height: u32, cell: u32, line_width: u32, base: [u8; 4], line: [u8; 4]) -> RgbaImage {
    let cell = cell.max(2);
    let lw = line_width.max(1).min(cell - 1);
    render_pattern(width, height, |x, y| {
        if x % cell < lw || y % cell < lw { line } else { base }
    })
}

/// Round dots centred in each `pitch`-sized cell.
pub fn render_dots(width: u32, height: u32, pitch: u32, dot_radius: f32, base: [u8; 4], dot: [u8; 4]) -> RgbaImage {
    let pitch = pitch.max(2);
    let half = pitch as f32 / 2.0;
    render_pattern(width, height, |x, y| {
        let dx = (x % pitch) as f32 + 0.5 - half;
        let dy = (y % pitch) as f32 + 0.5 - half;
        let d = (dx * dx + dy * dy).sqrt();
        // One pixel of anti-aliasing at the rim.
        let cover = (dot_radius + 0.5 - d).clamp(0.0, 1.0);
        lerp_color(base, dot, cover)
    })
}

/// Monochrome value noise around `base`, ±`amount` (0..1) of full range.
pub fn render_noise(width: u32, height: u32, base: [u8; 4], amount: f32, seed: u32) -> RgbaImage {
    let strength = amount.clamp(0.0, 1.0) * 255.0;
    render_pattern(width, height, |x, y| {
        let n = (hash_f32(x, y, seed) * 2.0 - 1.0) * strength;
        [
            (base[0] as f32 + n).round().clamp(0.0, 255.0) as u8,
            (base[1] as f32 + n).round().clamp(0.0, 255.0) as u8,
            (base[2] as f32 + n).round().clamp(0.0, 255.0) as u8,
            base[3],
        ]
    })
}

/// Two-tone checkerboard, the usual stand-in for transparency.
pub fn render_checkerboard(width: u32, height: u32, cell: u32) -> RgbaImage {
    let cell = cell.max(1);
    let light = [255, 255, 255, 255];
    let dark = [204, 204, 204, 255];
    render_pattern(width, height, |x, y| {
        if ((x / cell) + (y / cell)) % 2 == 0 { light } else { dark }
    })
}

/// Draw `top` over a checkerboard, for previewing images with transparency.
pub fn over_checkerboard(top: &RgbaImage, cell: u32) -> RgbaImage {
    let board = render_checkerboard(top.width(), top.height(), cell);
    let mut out = board;
    for (dst, src) in out.pixels_mut().zip(top.pixels()) {
        let a = src[3] as f32 / 255.0;
        let blended = lerp_color(dst.0, [src[0], src[1], src[2], 255], a);
        *dst = Rgba(blended);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gradient_hits_both_corners() {
        let img = render_gradient(10, 6, [0, 0, 0, 255], [200, 100, 50, 255]);
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(img.get_pixel(9, 5).0, [200, 100, 50, 255]);
    }

    #[test]
    fn vignette_darkens_corners_more_than_centre() {
        let img = RgbaImage::from_pixel(40, 40, Rgba([200, 200, 200, 255]));
        let out = vignette(&img, 1.0, 28.0);
        let centre = out.get_pixel(20, 20)[0];
        let corner = out.get_pixel(0, 0)[0];
        assert!(corner < centre);
        assert!(centre >= 199);
    }

    #[test]
    fn noise_is_deterministic_per_seed() {
        assert_eq!(
            render_noise(8, 8, [128, 128, 128, 255], 0.2, 7),
            render_noise(8, 8, [128, 128, 128, 255], 0.2, 7)
        );
    }

    #[test]
    fn grid_has_lines_on_multiples() {
        let img = render_grid(20, 20, 10, 1, [255; 4], [0, 0, 0, 255]);
        assert_eq!(img.get_pixel(10, 3).0, [0, 0, 0, 255]);
        assert_eq!(img.get_pixel(5, 5).0, [255; 4]);
    }
}
