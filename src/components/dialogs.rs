use eframe::egui;
use egui::{Color32, Pos2, Rect, Rounding, Sense, Vec2};

/// Result of showing a modal for one frame.
#[derive(Clone, Debug, PartialEq)]
pub enum DialogResult<T> {
    /// Dialog is still open, no action needed this frame.
    Open,
    /// A parameter changed - caller may refresh a preview.
    Changed,
    /// User confirmed - contains the final values.
    Ok(T),
    /// User dismissed the dialog. Nothing is committed.
    Cancel,
}

// ============================================================================
// SHARED DIALOG STYLING HELPERS
// ============================================================================

/// Colors extracted from the current egui visuals for dialog rendering.
pub struct DialogColors {
    pub accent: Color32,
    pub accent_faint: Color32,
    pub text_muted: Color32,
}

impl DialogColors {
    pub fn from_ctx(ctx: &egui::Context) -> Self {
        let v = ctx.style().visuals.clone();
        let accent = v.selection.stroke.color;
        let alpha = if v.dark_mode { 35 } else { 25 };
        let text_muted = if v.dark_mode { Color32::from_gray(160) } else { v.weak_text_color() };
        Self {
            accent,
            accent_faint: Color32::from_rgba_unmultiplied(accent.r(), accent.g(), accent.b(), alpha),
            text_muted,
        }
    }
}

/// Paint the accent header bar with icon + title.
pub fn paint_dialog_header(ui: &mut egui::Ui, colors: &DialogColors, icon: &str, title: &str) {
    let available_width = ui.available_width();
    let header_height = 32.0;
    let (rect, _) = ui.allocate_exact_size(Vec2::new(available_width, header_height), Sense::hover());

    let painter = ui.painter();
    painter.rect_filled(rect, Rounding::ZERO, colors.accent_faint);
    painter.rect_filled(
        Rect::from_min_size(rect.min, Vec2::new(3.0, header_height)),
        Rounding::ZERO,
        colors.accent,
    );
    painter.text(
        Pos2::new(rect.min.x + 12.0, rect.center().y),
        egui::Align2::LEFT_CENTER,
        format!("{} {}", icon, title),
        egui::FontId::proportional(14.0),
        colors.accent,
    );
}

/// Styled section label (small caps feel).
pub fn section_label(ui: &mut egui::Ui, colors: &DialogColors, text: &str) {
    ui.add_space(6.0);
    ui.horizontal(|ui| {
        ui.add_space(2.0);
        ui.label(egui::RichText::new(text).size(11.0).color(colors.text_muted).strong());
    });
    ui.add_space(2.0);
}

/// Thin separator line using accent color (very faint).
pub fn accent_separator(ui: &mut egui::Ui, colors: &DialogColors) {
    let available_width = ui.available_width();
    let (rect, _) = ui.allocate_exact_size(Vec2::new(available_width, 1.0), Sense::hover());
    ui.painter().rect_filled(rect, 0.0, colors.accent_faint);
}

/// Styled confirm / Cancel footer. Returns (confirm_clicked, cancel_clicked).
pub fn dialog_footer(ui: &mut egui::Ui, colors: &DialogColors, confirm_label: &str, confirm_enabled: bool) -> (bool, bool) {
    let mut ok = false;
    let mut cancel = false;
    ui.add_space(4.0);
    accent_separator(ui, colors);
    ui.add_space(6.0);
    ui.horizontal(|ui| {
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button("Cancel").clicked() {
                cancel = true;
            }
            let btn = egui::Button::new(
                egui::RichText::new(format!("  {}  ", confirm_label)).color(Color32::WHITE).strong(),
            )
            .fill(colors.accent);
            if ui.add_enabled(confirm_enabled, btn).clicked() {
                ok = true;
            }
        });
    });
    (ok, cancel)
}

/// Upload an RGBA image as an egui texture.
pub fn load_texture(ctx: &egui::Context, name: &str, img: &image::RgbaImage) -> egui::TextureHandle {
    let size = [img.width() as usize, img.height() as usize];
    let color = egui::ColorImage::from_rgba_unmultiplied(size, img.as_raw());
    ctx.load_texture(name, color, egui::TextureOptions::LINEAR)
}

/// Largest size with the aspect of `content` that fits inside `bounds`.
pub fn fit_within(content: Vec2, bounds: Vec2) -> Vec2 {
    if content.x <= 0.0 || content.y <= 0.0 {
        return bounds;
    }
    let k = (bounds.x / content.x).min(bounds.y / content.y);
    content * k
}
