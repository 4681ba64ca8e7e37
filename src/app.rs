use std::path::PathBuf;
use std::sync::{Arc, mpsc};

use eframe::egui;
use image::RgbaImage;

use visionboard::board::{BoardEvent, BoardStore, ItemId};
use visionboard::elements;
use visionboard::io::{copy_to_clipboard, encode_png, fit_size, load_image, pick_image_path, pick_save_path, save_png};
use visionboard::ops::BorderKeySegmenter;
use visionboard::render::{SnapshotOptions, render_board};
use visionboard::settings::AppSettings;

use crate::canvas::BoardCanvas;
use crate::components::dialogs::DialogResult;
use crate::components::effects_modal::{EffectsChoice, EffectsModal};
use crate::components::elements_picker::ElementsPicker;
use crate::components::share::{ShareAction, share_menu};

/// Seconds a status message stays on screen.
const STATUS_TTL: f64 = 4.0;

// ============================================================================
// BACKGROUND JOBS - full resolution renders and exports
// ============================================================================

/// Result delivered from a worker thread.
enum JobResult {
    /// Effects pipeline finished; `bytes` is the encoded PNG.
    ImageReady {
        target: Option<ItemId>,
        bytes: Vec<u8>,
        width: u32,
        height: u32,
    },
    ImageFailed(String),
    Exported(PathBuf),
    ExportFailed(String),
}

pub struct VisionBoardApp {
    store: BoardStore,
    events: mpsc::Receiver<BoardEvent>,
    canvas: BoardCanvas,
    settings: AppSettings,
    segmenter: Arc<BorderKeySegmenter>,

    effects: Option<EffectsModal>,
    /// Placeholder the photo in the effects modal is meant for.
    effects_target: Option<ItemId>,
    elements: Option<ElementsPicker>,

    job_sender: mpsc::Sender<JobResult>,
    job_receiver: mpsc::Receiver<JobResult>,
    pending_jobs: usize,

    status: Option<(String, f64)>,
}

impl VisionBoardApp {
    pub fn new(cc: &eframe::CreationContext<'_>, settings: AppSettings) -> Self {
        let mut store = BoardStore::new();
        let events = store.subscribe();
        let accent = cc.egui_ctx.style().visuals.selection.stroke.color;
        let segmenter = Arc::new(BorderKeySegmenter::new(settings.segmentation()));
        let (job_sender, job_receiver) = mpsc::channel();
        Self {
            store,
            events,
            canvas: BoardCanvas::new(accent),
            settings,
            segmenter,
            effects: None,
            effects_target: None,
            elements: None,
            job_sender,
            job_receiver,
            pending_jobs: 0,
            status: None,
        }
    }

    fn modal_open(&self) -> bool {
        self.effects.is_some() || self.elements.is_some()
    }

    fn set_status(&mut self, ctx: &egui::Context, msg: impl Into<String>) {
        let now = ctx.input(|i| i.time);
        self.status = Some((msg.into(), now + STATUS_TTL));
    }

    // ------------------------------------------------------------------
    // Adding items
    // ------------------------------------------------------------------

    /// Pick a photo and open the effects modal for it. `target` is the
    /// placeholder to fill, or `None` to add a new image item.
    fn begin_add_image(&mut self, ctx: &egui::Context, target: Option<ItemId>) {
        let Some(path) = pick_image_path(None) else { return };
        match load_image(&path) {
            Ok(img) => {
                log::info!("picked {} ({}x{})", path.display(), img.width(), img.height());
                self.open_effects(img, target);
            }
            Err(e) => {
                log::warn!("could not open {}: {}", path.display(), e);
                self.set_status(ctx, format!("Could not open image: {}", e));
            }
        }
    }

    fn open_effects(&mut self, img: RgbaImage, target: Option<ItemId>) {
        self.effects = Some(EffectsModal::new(img, Arc::clone(&self.segmenter), self.settings.preview_max_edge));
        self.effects_target = target;
    }

    /// Run the confirmed pipeline at full resolution on the thread pool.
    fn commit_effects(&mut self, ctx: &egui::Context, choice: EffectsChoice) {
        let target = self.effects_target.take();
        let tx = self.job_sender.clone();
        let segmenter = Arc::clone(&self.segmenter);
        let ctx = ctx.clone();
        self.pending_jobs += 1;
        rayon::spawn(move || {
            let EffectsChoice { original, pipeline } = choice;
            pipeline.commit(&original, segmenter.as_ref(), |img| {
                let (width, height) = img.dimensions();
                let msg = match encode_png(&img) {
                    Ok(bytes) => JobResult::ImageReady { target, bytes, width, height },
                    Err(e) => JobResult::ImageFailed(e.to_string()),
                };
                let _ = tx.send(msg);
            });
            ctx.request_repaint();
        });
    }

    fn place_image(&mut self, target: Option<ItemId>, bytes: Vec<u8>, width: u32, height: u32) {
        let size = fit_size(width, height, self.settings.import_max_edge);
        let existing = target.and_then(|id| self.store.get(id).cloned());
        match existing {
            Some(mut item) => {
                item.image_data = Some(bytes);
                item.size = size;
                self.store.update_item(item);
            }
            None => {
                self.store.add_image(bytes, size);
            }
        }
    }

    // ------------------------------------------------------------------
    // Sharing
    // ------------------------------------------------------------------

    fn snapshot(&self) -> Option<RgbaImage> {
        let options = SnapshotOptions {
            grid_step: self.settings.show_grid.then_some(self.settings.grid_step),
            ..SnapshotOptions::default()
        };
        match render_board(&self.store, &options) {
            Ok(img) => Some(img),
            Err(e) => {
                log::warn!("snapshot failed: {}", e);
                None
            }
        }
    }

    fn share(&mut self, ctx: &egui::Context, action: ShareAction) {
        let Some(img) = self.snapshot() else {
            self.set_status(ctx, "Nothing to share yet");
            return;
        };
        match action {
            ShareAction::CopyToClipboard => match copy_to_clipboard(&img) {
                Ok(()) => self.set_status(ctx, "Board copied to clipboard"),
                Err(e) => {
                    log::warn!("{}", e);
                    self.set_status(ctx, e.to_string());
                }
            },
            ShareAction::SavePng => {
                let Some(path) = pick_save_path(self.settings.export_dir(), "vision_board.png") else { return };
                if let Some(dir) = path.parent() {
                    self.settings.export_dir = dir.to_string_lossy().into_owned();
                    self.settings.save();
                }
                let tx = self.job_sender.clone();
                let ctx = ctx.clone();
                self.pending_jobs += 1;
                rayon::spawn(move || {
                    let msg = match save_png(&img, &path) {
                        Ok(()) => JobResult::Exported(path),
                        Err(e) => JobResult::ExportFailed(e.to_string()),
                    };
                    let _ = tx.send(msg);
                    ctx.request_repaint();
                });
            }
        }
    }

    // ------------------------------------------------------------------
    // Per-frame plumbing
    // ------------------------------------------------------------------

    fn poll_jobs(&mut self, ctx: &egui::Context) {
        while let Ok(result) = self.job_receiver.try_recv() {
            self.pending_jobs = self.pending_jobs.saturating_sub(1);
            match result {
                JobResult::ImageReady { target, bytes, width, height } => {
                    self.place_image(target, bytes, width, height);
                }
                JobResult::ImageFailed(e) => {
                    log::error!("effects pipeline failed: {}", e);
                    self.set_status(ctx, format!("Could not apply effects: {}", e));
                }
                JobResult::Exported(path) => {
                    log::info!("board saved to {}", path.display());
                    self.set_status(ctx, format!("Saved {}", path.display()));
                }
                JobResult::ExportFailed(e) => {
                    log::error!("board export failed: {}", e);
                    self.set_status(ctx, format!("Save failed: {}", e));
                }
            }
        }
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            log::debug!("board event on {}: {:?}", event.item_id(), event);
            self.canvas.on_event(&event);
        }
    }

    fn toolbar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let enabled = !self.modal_open();
                ui.add_enabled_ui(enabled, |ui| {
                    if ui.button("\u{1F4DD} Add Text").clicked() {
                        self.store.add_text();
                    }
                    if ui.button("\u{1F5BC} Add Image").clicked() {
                        self.begin_add_image(ctx, None);
                    }
                    if ui.button("\u{2B1C} Add Frame").clicked() {
                        self.store.add_image_placeholder();
                    }
                    if ui.button("\u{2B50} Elements").clicked() {
                        self.elements = Some(ElementsPicker::default());
                    }
                });

                ui.separator();
                if let Some(action) = share_menu(ui, enabled && !self.store.is_empty()) {
                    self.share(ctx, action);
                }

                ui.separator();
                if ui.checkbox(&mut self.settings.show_grid, "Grid").changed() {
                    self.settings.save();
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if self.pending_jobs > 0 {
                        ui.spinner();
                    }
                    let now = ui.input(|i| i.time);
                    if let Some((msg, until)) = &self.status {
                        if now < *until {
                            ui.label(msg.as_str());
                        }
                    }
                });
            });
        });
    }

    fn modals(&mut self, ctx: &egui::Context) {
        if let Some(modal) = self.effects.as_mut() {
            match modal.show(ctx) {
                DialogResult::Ok(choice) => {
                    self.effects = None;
                    self.commit_effects(ctx, choice);
                }
                DialogResult::Cancel => {
                    self.effects = None;
                    self.effects_target = None;
                }
                DialogResult::Open | DialogResult::Changed => {}
            }
        }

        if let Some(picker) = self.elements.as_mut() {
            match picker.show(ctx) {
                DialogResult::Ok(element) => {
                    self.elements = None;
                    if let Err(e) = elements::place(&mut self.store, element, self.settings.element_scale) {
                        log::error!("could not place element: {}", e);
                        self.set_status(ctx, e.to_string());
                    }
                }
                DialogResult::Cancel => self.elements = None,
                DialogResult::Open | DialogResult::Changed => {}
            }
        }
    }
}

impl eframe::App for VisionBoardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_jobs(ctx);

        self.toolbar(ctx);

        let interactive = !self.modal_open();
        let output = egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                self.canvas.show(
                    ui,
                    &mut self.store,
                    interactive,
                    self.settings.show_grid,
                    self.settings.grid_step,
                )
            })
            .inner;

        if let Some(id) = output.placeholder_clicked {
            self.begin_add_image(ctx, Some(id));
        }

        self.modals(ctx);
        self.drain_events();

        if let Some((_, until)) = self.status {
            if ctx.input(|i| i.time) >= until {
                self.status = None;
            } else {
                ctx.request_repaint_after(std::time::Duration::from_millis(250));
            }
        }
    }
}
