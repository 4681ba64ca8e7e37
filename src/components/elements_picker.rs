use eframe::egui;
use egui::{Color32, Sense, Vec2};

use visionboard::elements::Element;
use visionboard::ops::pipeline::downscale_to_fit;

use super::dialogs::{DialogColors, DialogResult, fit_within, load_texture, paint_dialog_header};

const THUMB_EDGE: u32 = 96;

/// Grid of built-in stickers. Picking one closes the picker.
#[derive(Default)]
pub struct ElementsPicker {
    thumbs: Vec<(Element, egui::TextureHandle)>,
}

impl ElementsPicker {
    pub fn show(&mut self, ctx: &egui::Context) -> DialogResult<Element> {
        if self.thumbs.is_empty() {
            self.thumbs = Element::ALL
                .iter()
                .map(|e| {
                    let img = downscale_to_fit(&e.render(), THUMB_EDGE);
                    (*e, load_texture(ctx, &format!("element_{}", e.name()), &img))
                })
                .collect();
        }

        let mut result = DialogResult::Open;
        let colors = DialogColors::from_ctx(ctx);

        egui::Window::new("dialog_elements")
            .title_bar(false)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, Vec2::ZERO)
            .show(ctx, |ui| {
                ui.set_width(360.0);
                paint_dialog_header(ui, &colors, "\u{2B50}", "Add Elements");
                ui.add_space(8.0);

                egui::Grid::new("elements_grid").num_columns(3).spacing([20.0, 20.0]).show(ui, |ui| {
                    for (element, tex) in &self.thumbs {
                        let resp = ui
                            .vertical_centered(|ui| {
                                let (rect, resp) = ui.allocate_exact_size(Vec2::splat(100.0), Sense::click());
                                let fill = if resp.hovered() { colors.accent_faint } else { Color32::from_black_alpha(10) };
                                ui.painter().rect_filled(rect, 8.0, fill);
                                let size = fit_within(tex.size_vec2(), rect.size() - Vec2::splat(12.0));
                                ui.painter().image(
                                    tex.id(),
                                    egui::Rect::from_center_size(rect.center(), size),
                                    egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                                    Color32::WHITE,
                                );
                                ui.label(egui::RichText::new(element.name()).size(11.0));
                                resp
                            })
                            .inner;
                        if resp.clicked() {
                            result = DialogResult::Ok(*element);
                        }
                    }
                    ui.end_row();
                });

                ui.add_space(8.0);
                if ui.button("Cancel").clicked() {
                    result = DialogResult::Cancel;
                }
            });

        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            result = DialogResult::Cancel;
        }
        result
    }
}
