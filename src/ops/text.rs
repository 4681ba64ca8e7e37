use ab_glyph::{Font, FontArc, GlyphId, ScaleFont, point};
use image::RgbaImage;

/// Key of the proportional face bundled with egui.
const DEFAULT_FONT_KEY: &str = "Ubuntu-Light";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TextAlignment {
    Left,
    #[default]
    Center,
    Right,
}

/// The font egui draws text boxes with, so exports match the screen.
pub fn default_font() -> Option<FontArc> {
    let defs = egui::FontDefinitions::default();
    let data = defs.font_data.get(DEFAULT_FONT_KEY)?;
    FontArc::try_from_vec(data.font.to_vec()).ok()
}

/// Lay out a single line of text at x = 0. Returns positioned glyphs and the
/// total advance width.
pub fn layout_line(font: &FontArc, text: &str, font_size: f32) -> (Vec<(GlyphId, f32)>, f32) {
    let scaled = font.as_scaled(font_size);
    let mut glyphs = Vec::new();
    let mut cursor_x = 0.0f32;
    let mut last_glyph: Option<GlyphId> = None;

    for ch in text.chars() {
        let glyph_id = font.glyph_id(ch);
        if let Some(prev) = last_glyph {
            cursor_x += scaled.kern(prev, glyph_id);
        }
        glyphs.push((glyph_id, cursor_x));
        cursor_x += scaled.h_advance(glyph_id);
        last_glyph = Some(glyph_id);
    }
    (glyphs, cursor_x)
}

/// Greedy word wrap to `max_width`. Explicit newlines are kept; a single
/// word wider than the box stays on its own line.
pub fn wrap_lines(font: &FontArc, text: &str, font_size: f32, max_width: f32) -> Vec<String> {
    let mut out = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if line.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", line, word)
            };
            if !line.is_empty() && layout_line(font, &candidate, font_size).1 > max_width {
                out.push(std::mem::take(&mut line));
                line = word.to_string();
            } else {
                line = candidate;
            }
        }
        out.push(line);
    }
    out
}

/// Rasterize wrapped text into a transparent `width`×`height` image,
/// vertically centred. Glyphs outside the box are clipped.
pub fn rasterize_text_box(
    font: &FontArc,
    text: &str,
    font_size: f32,
    width: u32,
    height: u32,
    color: [u8; 4],
    alignment: TextAlignment,
) -> RgbaImage {
    let mut out = RgbaImage::new(width, height);
    if width == 0 || height == 0 || font_size <= 0.0 {
        return out;
    }
    let scaled = font.as_scaled(font_size);
    let ascent = scaled.ascent();
    let line_height = scaled.height() + scaled.line_gap();

    let pad = 6.0;
    let lines = wrap_lines(font, text, font_size, width as f32 - pad * 2.0);
    let block_h = line_height * lines.len() as f32;
    let top = ((height as f32 - block_h) * 0.5).max(0.0);

    let mut coverage = vec![0.0f32; (width * height) as usize];
    for (line_idx, line) in lines.iter().enumerate() {
        let (glyphs, line_w) = layout_line(font, line, font_size);
        let x0 = match alignment {
            TextAlignment::Left => pad,
            TextAlignment::Center => (width as f32 - line_w) * 0.5,
            TextAlignment::Right => width as f32 - pad - line_w,
        };
        let baseline = top + line_idx as f32 * line_height + ascent;
        for (glyph_id, gx) in glyphs {
            let glyph = glyph_id.with_scale_and_position(font_size, point(x0 + gx, baseline));
            let Some(outlined) = font.outline_glyph(glyph) else { continue };
            let b = outlined.px_bounds();
            outlined.draw(|px, py, cov| {
                let ix = b.min.x as i32 + px as i32;
                let iy = b.min.y as i32 + py as i32;
                if ix >= 0 && iy >= 0 && (ix as u32) < width && (iy as u32) < height {
                    let idx = iy as usize * width as usize + ix as usize;
                    coverage[idx] = coverage[idx].max(cov);
                }
            });
        }
    }

    for (px, cov) in out.pixels_mut().zip(coverage) {
        if cov > 0.001 {
            let a = (color[3] as f32 * cov.min(1.0)).round() as u8;
            *px = image::Rgba([color[0], color[1], color[2], a]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_font_loads_and_draws() {
        let font = default_font().expect("egui ships a default font");
        let img = rasterize_text_box(&font, "New Text Box", 18.0, 200, 100, [0, 0, 0, 255], TextAlignment::Center);
        assert!(img.pixels().any(|p| p[3] > 0));
        // Centred text leaves the corners empty.
        assert_eq!(img.get_pixel(0, 0)[3], 0);
    }

    #[test]
    fn long_text_wraps() {
        let font = default_font().expect("font");
        let lines = wrap_lines(&font, "one two three four five six seven", 18.0, 80.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.join(" "), "one two three four five six seven");
    }
}
