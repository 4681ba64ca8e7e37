// ============================================================================
// LIBRARY ELEMENTS - built-in decorative stickers
// ============================================================================
//
// Elements are drawn procedurally at a fixed native resolution, encoded to
// PNG, and placed on the board as ordinary image items.
// ============================================================================

use egui::Vec2;
use image::{Rgba, RgbaImage};

use crate::board::{BoardStore, ItemId};
use crate::io::{ExportError, encode_png};
use crate::ops::text::{TextAlignment, default_font, rasterize_text_box};

/// Where new elements land on the board.
pub const ELEMENT_POSITION: Vec2 = Vec2::new(150.0, 150.0);

/// Native size multiplier applied when placing an element.
pub const DEFAULT_ELEMENT_SCALE: f32 = 0.15;

/// Supersampling grid per axis for shape edges.
const SUBSAMPLES: u32 = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Element {
    Tape,
    Star,
    Vision,
}

impl Element {
    pub const ALL: [Element; 3] = [Element::Tape, Element::Star, Element::Vision];

    pub fn name(&self) -> &'static str {
        match self {
            Element::Tape => "tape",
            Element::Star => "star",
            Element::Vision => "vision",
        }
    }

    pub fn native_size(&self) -> (u32, u32) {
        match self {
            Element::Tape => (640, 200),
            Element::Star => (560, 560),
            Element::Vision => (960, 300),
        }
    }

    pub fn render(&self) -> RgbaImage {
        let (w, h) = self.native_size();
        match self {
            Element::Tape => render_tape(w, h),
            Element::Star => render_star(w, h),
            Element::Vision => render_banner(w, h, "VISION"),
        }
    }

    /// Frame size on the board for a given scale.
    pub fn board_size(&self, scale: f32) -> Vec2 {
        let (w, h) = self.native_size();
        Vec2::new(w as f32, h as f32) * scale
    }
}

/// Add `element` to the board at the standard spot.
pub fn place(store: &mut BoardStore, element: Element, scale: f32) -> Result<ItemId, ExportError> {
    let bytes = encode_png(&element.render())?;
    let id = store.add_image_at(bytes, ELEMENT_POSITION, element.board_size(scale));
    log::info!("placed element '{}' as {}", element.name(), id);
    Ok(id)
}

/// Fill an image by coverage of `inside`, sampled on a sub-pixel grid.
fn render_shape(w: u32, h: u32, color: [u8; 4], inside: impl Fn(f32, f32) -> bool) -> RgbaImage {
    let step = 1.0 / SUBSAMPLES as f32;
    let total = (SUBSAMPLES * SUBSAMPLES) as f32;
    RgbaImage::from_fn(w, h, |x, y| {
        let mut hits = 0u32;
        for sy in 0..SUBSAMPLES {
            for sx in 0..SUBSAMPLES {
                let px = x as f32 + (sx as f32 + 0.5) * step;
                let py = y as f32 + (sy as f32 + 0.5) * step;
                if inside(px, py) {
                    hits += 1;
                }
            }
        }
        let a = (color[3] as f32 * hits as f32 / total).round() as u8;
        Rgba([color[0], color[1], color[2], a])
    })
}

/// Even-odd point-in-polygon test.
fn point_in_polygon(poly: &[(f32, f32)], x: f32, y: f32) -> bool {
    let mut inside = false;
    let mut j = poly.len() - 1;
    for i in 0..poly.len() {
        let (xi, yi) = poly[i];
        let (xj, yj) = poly[j];
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Translucent masking tape with zig-zag torn ends.
fn render_tape(w: u32, h: u32) -> RgbaImage {
    let teeth = 6.0;
    let depth = w as f32 * 0.03;
    let tooth_h = h as f32 / teeth;
    let mut img = render_shape(w, h, [236, 214, 160, 200], |x, y| {
        let phase = (y / tooth_h).fract();
        let zig = depth * (1.0 - (phase * 2.0 - 1.0).abs());
        x >= zig && x <= w as f32 - zig
    });
    // Faint lengthwise fibres.
    for (x, y, px) in img.enumerate_pixels_mut() {
        if px[3] > 0 && (y % 9 == 0 || (x + y * 3) % 53 == 0) {
            px[0] = px[0].saturating_sub(14);
            px[1] = px[1].saturating_sub(14);
            px[2] = px[2].saturating_sub(10);
        }
    }
    img
}

/// Five-pointed gold star.
fn render_star(w: u32, h: u32) -> RgbaImage {
    let cx = w as f32 / 2.0;
    let cy = h as f32 / 2.0;
    let outer = w.min(h) as f32 * 0.48;
    let inner = outer * 0.4;
    let poly: Vec<(f32, f32)> = (0..10)
        .map(|i| {
            let r = if i % 2 == 0 { outer } else { inner };
            let a = (i as f32 * 36.0 - 90.0).to_radians();
            (cx + r * a.cos(), cy + r * a.sin())
        })
        .collect();
    render_shape(w, h, [255, 196, 37, 255], |x, y| point_in_polygon(&poly, x, y))
}

/// Rounded banner with a centred word.
fn render_banner(w: u32, h: u32, word: &str) -> RgbaImage {
    let radius = h as f32 * 0.3;
    let (fw, fh) = (w as f32, h as f32);
    let mut img = render_shape(w, h, [40, 44, 80, 255], |x, y| {
        let qx = (x - fw / 2.0).abs() - (fw / 2.0 - radius);
        let qy = (y - fh / 2.0).abs() - (fh / 2.0 - radius);
        let ox = qx.max(0.0);
        let oy = qy.max(0.0);
        (ox * ox + oy * oy).sqrt() <= radius
    });
    match default_font() {
        Some(font) => {
            let label = rasterize_text_box(&font, word, h as f32 * 0.55, w, h, [255, 255, 255, 255], TextAlignment::Center);
            image::imageops::overlay(&mut img, &label, 0, 0);
        }
        None => log::warn!("element banner drawn without text: font unavailable"),
    }
    img
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_is_opaque_at_centre_and_clear_at_corner() {
        let img = Element::Star.render();
        let (w, h) = img.dimensions();
        assert_eq!(img.get_pixel(w / 2, h / 2)[3], 255);
        assert_eq!(img.get_pixel(0, 0)[3], 0);
    }

    #[test]
    fn placing_uses_scaled_native_size() {
        let mut store = BoardStore::new();
        let id = place(&mut store, Element::Tape, 0.15).expect("place");
        let item = store.get(id).expect("item");
        assert_eq!(item.position, ELEMENT_POSITION);
        assert!((item.size - Vec2::new(96.0, 30.0)).length() < 1e-3);
        assert!(item.decode_image().is_some());
    }
}
