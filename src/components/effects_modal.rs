// ============================================================================
// EFFECTS MODAL - choose an effect, its intensity and a background
// ============================================================================
//
// Previews run synchronously on a downscaled copy of the photo. The full
// resolution render happens only after "Done", on a worker thread owned by
// the app. Cancel drops everything.
// ============================================================================

use std::sync::Arc;

use eframe::egui;
use egui::{Color32, Rounding, Sense, Stroke, Vec2};
use image::RgbaImage;

use visionboard::ops::effects::over_checkerboard;
use visionboard::ops::pipeline::{downscale_to_fit, pixel_scale};
use visionboard::ops::{Background, BorderKeySegmenter, EffectPipeline, ImageEffect};

use super::dialogs::{
    DialogColors, DialogResult, dialog_footer, fit_within, load_texture, paint_dialog_header,
    section_label,
};

const THUMB_EDGE: u32 = 64;
const PREVIEW_HEIGHT: f32 = 300.0;
const CHECKER_CELL: u32 = 8;

/// The photo and the choices confirmed with "Done".
pub struct EffectsChoice {
    pub original: RgbaImage,
    pub pipeline: EffectPipeline,
}

pub struct EffectsModal {
    original: RgbaImage,
    preview_source: RgbaImage,
    segmenter: Arc<BorderKeySegmenter>,
    pipeline: EffectPipeline,
    thumbs: Vec<(ImageEffect, egui::TextureHandle)>,
    preview: Option<egui::TextureHandle>,
    /// `preview_source` size relative to `original`.
    preview_scale: f32,
    dirty: bool,
}

impl EffectsModal {
    pub fn new(original: RgbaImage, segmenter: Arc<BorderKeySegmenter>, preview_max_edge: u32) -> Self {
        let preview_source = downscale_to_fit(&original, preview_max_edge);
        let preview_scale = pixel_scale(&original, &preview_source);
        Self {
            original,
            preview_source,
            segmenter,
            pipeline: EffectPipeline::default(),
            thumbs: Vec::new(),
            preview: None,
            preview_scale,
            dirty: true,
        }
    }

    fn build_thumbs(&mut self, ctx: &egui::Context) {
        let small = downscale_to_fit(&self.preview_source, THUMB_EDGE);
        let scale = self.preview_scale * pixel_scale(&self.preview_source, &small);
        self.thumbs = ImageEffect::ALL
            .iter()
            .map(|effect| {
                let img = effect.apply_scaled(&small, effect.preview_intensity(), scale);
                (*effect, load_texture(ctx, &format!("effect_thumb_{}", effect.cli_name()), &img))
            })
            .collect();
    }

    fn refresh_preview(&mut self, ctx: &egui::Context) {
        let rendered = self
            .pipeline
            .render_scaled(&self.preview_source, self.segmenter.as_ref(), self.preview_scale);
        let shown = if self.pipeline.background == Background::Transparent {
            over_checkerboard(&rendered, CHECKER_CELL)
        } else {
            rendered
        };
        self.preview = Some(load_texture(ctx, "effects_preview", &shown));
        self.dirty = false;
    }

    pub fn show(&mut self, ctx: &egui::Context) -> DialogResult<EffectsChoice> {
        if self.thumbs.is_empty() {
            self.build_thumbs(ctx);
        }
        if self.dirty {
            self.refresh_preview(ctx);
        }

        let mut result = DialogResult::Open;
        let colors = DialogColors::from_ctx(ctx);

        egui::Window::new("dialog_edit_image")
            .title_bar(false)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, Vec2::ZERO)
            .show(ctx, |ui| {
                ui.set_width(380.0);
                paint_dialog_header(ui, &colors, "\u{2728}", "Edit Image");
                ui.add_space(6.0);

                // Preview
                let (rect, _) = ui.allocate_exact_size(Vec2::new(ui.available_width(), PREVIEW_HEIGHT), Sense::hover());
                ui.painter().rect_filled(rect, Rounding::same(12.0), Color32::from_black_alpha(13));
                if let Some(tex) = &self.preview {
                    let size = fit_within(tex.size_vec2(), rect.size() - Vec2::splat(8.0));
                    let img_rect = egui::Rect::from_center_size(rect.center(), size);
                    ui.painter().image(
                        tex.id(),
                        img_rect,
                        egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                        Color32::WHITE,
                    );
                }

                let mut changed = false;

                section_label(ui, &colors, "EFFECT");
                egui::Grid::new("effects_grid").num_columns(3).spacing([12.0, 12.0]).show(ui, |ui| {
                    for (i, (effect, tex)) in self.thumbs.iter().enumerate() {
                        let selected = self.pipeline.effect == *effect;
                        let cell = ui.vertical_centered(|ui| {
                            let (r, resp) = ui.allocate_exact_size(Vec2::splat(60.0), Sense::click());
                            ui.painter().image(
                                tex.id(),
                                r,
                                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                                Color32::WHITE,
                            );
                            if selected {
                                ui.painter().rect_stroke(r, Rounding::same(8.0), Stroke::new(3.0, colors.accent));
                            }
                            ui.label(egui::RichText::new(effect.display_name()).size(11.0));
                            resp
                        });
                        if cell.inner.clicked() && !selected {
                            self.pipeline.effect = *effect;
                            changed = true;
                        }
                        if i % 3 == 2 {
                            ui.end_row();
                        }
                    }
                });

                if self.pipeline.effect != ImageEffect::None {
                    section_label(ui, &colors, "INTENSITY");
                    let r = ui.add(egui::Slider::new(&mut self.pipeline.intensity, 0.0..=1.0).max_decimals(2));
                    // Re-render once the handle is let go.
                    if r.drag_released() || (r.changed() && !r.dragged()) {
                        changed = true;
                    }
                }

                section_label(ui, &colors, "BACKGROUND");
                ui.horizontal_wrapped(|ui| {
                    for bg in Background::PRESETS {
                        let selected = self.pipeline.background == bg;
                        let label = match bg {
                            Background::Solid(c) => {
                                egui::RichText::new("\u{25A0} Solid").color(Color32::from_rgb(c[0], c[1], c[2]))
                            }
                            other => egui::RichText::new(other.label()),
                        };
                        if ui.selectable_label(selected, label).clicked() && !selected {
                            self.pipeline.background = bg;
                            changed = true;
                        }
                    }
                });

                let (ok, cancel) = dialog_footer(ui, &colors, "Done", true);
                if changed {
                    self.dirty = true;
                    result = DialogResult::Changed;
                }
                if cancel {
                    result = DialogResult::Cancel;
                } else if ok {
                    result = DialogResult::Ok(EffectsChoice {
                        original: self.original.clone(),
                        pipeline: self.pipeline,
                    });
                }
            });

        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            result = DialogResult::Cancel;
        }
        result
    }
}
