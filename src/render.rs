// ============================================================================
// BOARD SNAPSHOT - rasterize the whole board for export and sharing
// ============================================================================
//
// Items are drawn in render order (anchor last). Each item is first rendered
// upright at its scaled size, then stamped onto the snapshot through an
// inverse rotation about its centre with bilinear sampling.
// ============================================================================

use ab_glyph::FontArc;
use egui::{Pos2, Vec2};
use image::imageops::FilterType;
use image::{DynamicImage, Rgba, RgbaImage};
use rayon::prelude::*;

use crate::board::{BoardItem, BoardStore, ItemKind};
use crate::gesture::{DisplayTransform, render_order};
use crate::io::ExportError;
use crate::ops::text::{TextAlignment, default_font, rasterize_text_box};

const TEXT_FILL: [u8; 4] = [255, 250, 225, 255];
const PLACEHOLDER_FILL: [u8; 4] = [232, 232, 232, 255];
const FRAME_STROKE: [u8; 4] = [200, 200, 200, 255];
const TEXT_COLOR: [u8; 4] = [30, 30, 30, 255];
const GRID_COLOR: [u8; 4] = [0, 0, 0, 26];

#[derive(Clone, Debug)]
pub struct SnapshotOptions {
    /// Output size in pixels. `None` fits every item plus `margin`.
    pub size: Option<(u32, u32)>,
    pub margin: f32,
    pub background: [u8; 4],
    /// Grid spacing, or `None` for no grid.
    pub grid_step: Option<f32>,
    pub font_size: f32,
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        Self {
            size: None,
            margin: 24.0,
            background: [255, 255, 255, 255],
            grid_step: None,
            font_size: 16.0,
        }
    }
}

/// Render every item of `store` into one image. Board coordinates map 1:1 to
/// pixels. The top-left of the output is the board origin, or further up and
/// left when items sit at negative coordinates (see [`snapshot_origin`]).
pub fn render_board(store: &BoardStore, options: &SnapshotOptions) -> Result<RgbaImage, ExportError> {
    if store.is_empty() {
        return Err(ExportError::EmptyBoard);
    }
    let origin = snapshot_origin(store, options.margin);
    let (w, h) = match options.size {
        Some(size) => size,
        None => fitted_extent(store, options.margin),
    };
    if w == 0 || h == 0 {
        return Err(ExportError::EmptyBoard);
    }

    let mut canvas = RgbaImage::from_pixel(w, h, Rgba(options.background));
    if let Some(step) = options.grid_step {
        draw_grid(&mut canvas, step, origin);
    }

    let font = default_font();
    if font.is_none() {
        log::warn!("snapshot: no font available, text boxes render without text");
    }

    for id in render_order(store) {
        let Some(item) = store.get(id) else { continue };
        let transform = DisplayTransform::of(item);
        let tile = render_item(item, &transform, font.as_ref(), options.font_size);
        let placed = DisplayTransform {
            position: transform.position - origin.to_vec2(),
            ..transform
        };
        stamp(&mut canvas, &tile, &placed);
    }
    log::info!("snapshot: {} items into {}x{}", store.len(), w, h);
    Ok(canvas)
}

/// Min and max corners over every item's rotated frame. `None` when empty.
fn board_bounds(store: &BoardStore) -> Option<(Pos2, Pos2)> {
    let mut corners = store.items().flat_map(|item| DisplayTransform::of(item).corners());
    let first = corners.next()?;
    Some(corners.fold((first, first), |(lo, hi), c| (lo.min(c), hi.max(c))))
}

/// Board position drawn at the top-left pixel of a snapshot. This is the board
/// origin unless an item reaches into negative coordinates, in which case that
/// axis moves out to hold it plus `margin`, in whole pixels.
pub fn snapshot_origin(store: &BoardStore, margin: f32) -> Pos2 {
    let Some((lo, _)) = board_bounds(store) else {
        return Pos2::ZERO;
    };
    let axis = |v: f32| if v < 0.0 { (v - margin).floor() } else { 0.0 };
    Pos2::new(axis(lo.x), axis(lo.y))
}

/// Smallest extent, starting at [`snapshot_origin`], that holds every item's
/// rotated frame plus `margin`.
pub fn fitted_extent(store: &BoardStore, margin: f32) -> (u32, u32) {
    let origin = snapshot_origin(store, margin);
    let max = board_bounds(store).map_or(Pos2::ZERO, |(_, hi)| hi.max(Pos2::ZERO));
    let w = (max.x + margin - origin.x).ceil().max(1.0) as u32;
    let h = (max.y + margin - origin.y).ceil().max(1.0) as u32;
    (w, h)
}

/// Upright image of one item at its scaled size.
pub fn render_item(item: &BoardItem, transform: &DisplayTransform, font: Option<&FontArc>, font_size: f32) -> RgbaImage {
    let size = transform.scaled_size();
    let tw = size.x.round().max(1.0) as u32;
    let th = size.y.round().max(1.0) as u32;

    match item.kind {
        ItemKind::Image => match item.decode_image() {
            Some(img) => DynamicImage::ImageRgba8(img)
                .resize_to_fill(tw, th, FilterType::Triangle)
                .into_rgba8(),
            None => framed(tw, th, PLACEHOLDER_FILL),
        },
        ItemKind::Text => {
            let mut tile = framed(tw, th, TEXT_FILL);
            if let Some(font) = font {
                let label = rasterize_text_box(
                    font,
                    &item.text,
                    font_size * transform.scale,
                    tw,
                    th,
                    TEXT_COLOR,
                    TextAlignment::Center,
                );
                image::imageops::overlay(&mut tile, &label, 0, 0);
            }
            tile
        }
    }
}

fn framed(w: u32, h: u32, fill: [u8; 4]) -> RgbaImage {
    RgbaImage::from_fn(w, h, |x, y| {
        if x == 0 || y == 0 || x + 1 == w || y + 1 == h {
            Rgba(FRAME_STROKE)
        } else {
            Rgba(fill)
        }
    })
}

/// Grid lines fall on board coordinates that are multiples of `step`.
fn draw_grid(canvas: &mut RgbaImage, step: f32, origin: Pos2) {
    if step < 2.0 {
        return;
    }
    let step = step.round() as i64;
    let (ox, oy) = (origin.x as i64, origin.y as i64);
    for (x, y, px) in canvas.enumerate_pixels_mut() {
        if (x as i64 + ox).rem_euclid(step) == 0 || (y as i64 + oy).rem_euclid(step) == 0 {
            *px = alpha_blend(*px, Rgba(GRID_COLOR));
        }
    }
}

/// Draw `tile` (already at scaled size) rotated about the transform's centre.
fn stamp(canvas: &mut RgbaImage, tile: &RgbaImage, transform: &DisplayTransform) {
    let (cw, ch) = canvas.dimensions();
    let (tw, th) = tile.dimensions();
    let corners = transform.corners();
    let min = corners.iter().fold(Pos2::new(f32::MAX, f32::MAX), |a, c| a.min(*c));
    let max = corners.iter().fold(Pos2::new(f32::MIN, f32::MIN), |a, c| a.max(*c));

    let x0 = min.x.floor().max(0.0) as u32;
    let y0 = min.y.floor().max(0.0) as u32;
    let x1 = (max.x.ceil().max(0.0) as u32).min(cw);
    let y1 = (max.y.ceil().max(0.0) as u32).min(ch);
    if x0 >= x1 || y0 >= y1 {
        return;
    }

    let center = transform.center();
    let half = Vec2::new(tw as f32, th as f32) * 0.5;
    let (sin, cos) = (-transform.rotation.to_radians()).sin_cos();
    let stride = cw as usize * 4;

    let raw: &mut [u8] = canvas;
    raw.par_chunks_mut(stride)
        .enumerate()
        .skip(y0 as usize)
        .take((y1 - y0) as usize)
        .for_each(|(y, row)| {
            for x in x0..x1 {
                let dx = x as f32 + 0.5 - center.x;
                let dy = y as f32 + 0.5 - center.y;
                let lx = dx * cos - dy * sin + half.x;
                let ly = dx * sin + dy * cos + half.y;
                if lx < 0.0 || ly < 0.0 || lx >= tw as f32 || ly >= th as f32 {
                    continue;
                }
                let src = sample_bilinear(tile, lx - 0.5, ly - 0.5);
                let pi = x as usize * 4;
                let dst = Rgba([row[pi], row[pi + 1], row[pi + 2], row[pi + 3]]);
                let out = alpha_blend(dst, src);
                row[pi..pi + 4].copy_from_slice(&out.0);
            }
        });
}

/// Bilinear sample with clamp-to-edge.
#[inline]
fn sample_bilinear(img: &RgbaImage, x: f32, y: f32) -> Rgba<u8> {
    let (w, h) = img.dimensions();
    let x0 = x.floor() as i32;
    let y0 = y.floor() as i32;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let sample = |sx: i32, sy: i32| -> [f32; 4] {
        let cx = sx.clamp(0, w as i32 - 1) as u32;
        let cy = sy.clamp(0, h as i32 - 1) as u32;
        let p = img.get_pixel(cx, cy).0;
        [p[0] as f32, p[1] as f32, p[2] as f32, p[3] as f32]
    };

    let p00 = sample(x0, y0);
    let p10 = sample(x0 + 1, y0);
    let p01 = sample(x0, y0 + 1);
    let p11 = sample(x0 + 1, y0 + 1);

    let w00 = (1.0 - fx) * (1.0 - fy);
    let w10 = fx * (1.0 - fy);
    let w01 = (1.0 - fx) * fy;
    let w11 = fx * fy;

    let mut out = [0u8; 4];
    for c in 0..4 {
        let v = p00[c] * w00 + p10[c] * w10 + p01[c] * w01 + p11[c] * w11;
        out[c] = v.round().clamp(0.0, 255.0) as u8;
    }
    Rgba(out)
}

/// Source-over compositing.
fn alpha_blend(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    if src[3] == 0 {
        return dst;
    }
    if src[3] == 255 || dst[3] == 0 {
        return src;
    }
    let sa = src[3] as f32 / 255.0;
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a < 0.001 {
        return Rgba([0, 0, 0, 0]);
    }
    let inv = 1.0 / out_a;
    let ch = |c: usize| ((src[c] as f32 * sa + dst[c] as f32 * da * (1.0 - sa)) * inv).round().clamp(0.0, 255.0) as u8;
    Rgba([ch(0), ch(1), ch(2), (out_a * 255.0).round().clamp(0.0, 255.0) as u8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_board_is_an_error() {
        let store = BoardStore::new();
        assert!(matches!(render_board(&store, &SnapshotOptions::default()), Err(ExportError::EmptyBoard)));
    }

    #[test]
    fn blend_is_source_over() {
        let out = alpha_blend(Rgba([0, 0, 0, 255]), Rgba([255, 255, 255, 128]));
        assert_eq!(out[3], 255);
        assert!((out[0] as i32 - 128).abs() <= 1);
    }
}
