// ============================================================================
// BOARD CANVAS - draws the board and turns egui input into gestures
// ============================================================================
//
// `EguiGestures` is the egui-side `GestureAdapter`: pointer drags, two-finger
// touch and modifier + wheel are accumulated into cumulative deltas and queued
// as `GestureEvent`s. `BoardCanvas` pumps them through the shared
// `GestureResolver` once per frame, then paints every item with its display
// transform so live deltas are visible before they are committed.
// ============================================================================

use std::collections::{HashMap, HashSet};

use eframe::egui;
use egui::emath::Rot2;
use egui::{Color32, FontId, Pos2, Rect, Sense, Shape, Stroke, Vec2};

use visionboard::board::{BoardEvent, BoardItem, BoardStore, ItemId, ItemKind};
use visionboard::gesture::{
    DisplayTransform, GestureAdapter, GestureEvent, GestureKind, GestureResolver, render_order,
};

use crate::components::dialogs::load_texture;

const GRID_COLOR: Color32 = Color32::from_rgba_premultiplied(13, 13, 13, 26);
const TEXT_FILL: Color32 = Color32::from_rgba_premultiplied(51, 51, 0, 51);
const FRAME_STROKE: Color32 = Color32::GRAY;
const PLACEHOLDER_FILL: Color32 = Color32::from_rgb(225, 225, 225);
const TEXT_FONT_SIZE: f32 = 16.0;
/// Wheel gestures end once the wheel has been idle this long (seconds).
const WHEEL_IDLE_END: f64 = 0.25;
/// Degrees of rotation per point of shift + wheel scroll.
const WHEEL_ROTATE_RATE: f32 = 0.25;

// ============================================================================
// EGUI GESTURE ADAPTER
// ============================================================================

#[derive(Clone, Copy, Debug)]
struct TwoAxis {
    target: ItemId,
    magnification: f32,
    rotation: f32,
}

impl TwoAxis {
    fn new(target: ItemId) -> Self {
        Self { target, magnification: 1.0, rotation: 0.0 }
    }
}

#[derive(Default)]
pub struct EguiGestures {
    queue: Vec<GestureEvent>,
    drag: Option<(ItemId, Vec2)>,
    pinch: Option<TwoAxis>,
    wheel: Option<(TwoAxis, f64)>,
}

impl EguiGestures {
    pub fn begin_drag(&mut self, target: ItemId) {
        self.end_drag();
        self.drag = Some((target, Vec2::ZERO));
    }

    pub fn drag_by(&mut self, delta: Vec2) {
        if let Some((target, total)) = self.drag.as_mut() {
            *total += delta;
            self.queue.push(GestureEvent::changed(*target, GestureKind::Drag(*total)));
        }
    }

    pub fn end_drag(&mut self) {
        if let Some((target, total)) = self.drag.take() {
            self.queue.push(GestureEvent::ended(target, GestureKind::Drag(total)));
        }
    }

    pub fn dragging(&self) -> Option<ItemId> {
        self.drag.map(|(id, _)| id)
    }

    /// One frame of two-finger touch. `rotation_delta` is in radians as egui
    /// reports it.
    pub fn pinch(&mut self, target: ItemId, zoom_delta: f32, rotation_delta: f32) {
        if self.pinch.map(|p| p.target) != Some(target) {
            self.end_pinch();
            self.pinch = Some(TwoAxis::new(target));
        }
        if let Some(p) = self.pinch.as_mut() {
            p.magnification *= zoom_delta;
            p.rotation += rotation_delta.to_degrees();
            self.queue.push(GestureEvent::changed(p.target, GestureKind::Magnify(p.magnification)));
            self.queue.push(GestureEvent::changed(p.target, GestureKind::Rotate(p.rotation)));
        }
    }

    pub fn end_pinch(&mut self) {
        if let Some(p) = self.pinch.take() {
            self.queue.push(GestureEvent::ended(p.target, GestureKind::Magnify(p.magnification)));
            self.queue.push(GestureEvent::ended(p.target, GestureKind::Rotate(p.rotation)));
        }
    }

    pub fn pinching(&self) -> Option<ItemId> {
        self.pinch.map(|p| p.target)
    }

    /// Ctrl + wheel zoom and shift + wheel rotate. Both are ended by
    /// [`Self::tick`] once the wheel goes quiet.
    pub fn wheel(&mut self, target: ItemId, zoom_factor: f32, degrees: f32, now: f64) {
        let same = self.wheel.map(|(w, _)| w.target) == Some(target);
        if !same {
            self.end_wheel();
        }
        let mut state = match self.wheel {
            Some((w, _)) if same => w,
            _ => TwoAxis::new(target),
        };
        if zoom_factor != 1.0 {
            state.magnification *= zoom_factor;
            self.queue.push(GestureEvent::changed(target, GestureKind::Magnify(state.magnification)));
        }
        if degrees != 0.0 {
            state.rotation += degrees;
            self.queue.push(GestureEvent::changed(target, GestureKind::Rotate(state.rotation)));
        }
        self.wheel = Some((state, now));
    }

    pub fn tick(&mut self, now: f64) {
        if let Some((_, last)) = self.wheel {
            if now - last > WHEEL_IDLE_END {
                self.end_wheel();
            }
        }
    }

    fn end_wheel(&mut self) {
        if let Some((w, _)) = self.wheel.take() {
            if w.magnification != 1.0 {
                self.queue.push(GestureEvent::ended(w.target, GestureKind::Magnify(w.magnification)));
            }
            if w.rotation != 0.0 {
                self.queue.push(GestureEvent::ended(w.target, GestureKind::Rotate(w.rotation)));
            }
        }
    }

    pub fn has_wheel(&self) -> bool {
        self.wheel.is_some()
    }

    /// Forget everything in flight without ending it.
    pub fn reset(&mut self) {
        self.queue.clear();
        self.drag = None;
        self.pinch = None;
        self.wheel = None;
    }
}

impl GestureAdapter for EguiGestures {
    fn drain(&mut self) -> Vec<GestureEvent> {
        std::mem::take(&mut self.queue)
    }
}

// ============================================================================
// BOARD CANVAS
// ============================================================================

struct TextEditing {
    id: ItemId,
    buffer: String,
    focused: bool,
}

/// What happened on the canvas this frame that the app has to act on.
#[derive(Default)]
pub struct CanvasOutput {
    /// An empty image frame was clicked; the app should offer a photo for it.
    pub placeholder_clicked: Option<ItemId>,
}

pub struct BoardCanvas {
    resolver: GestureResolver,
    gestures: EguiGestures,
    textures: HashMap<ItemId, egui::TextureHandle>,
    undecodable: HashSet<ItemId>,
    editing: Option<TextEditing>,
    pan_offset: Vec2,
    accent: Color32,
}

impl BoardCanvas {
    pub fn new(accent: Color32) -> Self {
        Self {
            resolver: GestureResolver::new(),
            gestures: EguiGestures::default(),
            textures: HashMap::new(),
            undecodable: HashSet::new(),
            editing: None,
            pan_offset: Vec2::ZERO,
            accent,
        }
    }

    /// Keep caches in line with the store.
    pub fn on_event(&mut self, event: &BoardEvent) {
        if let BoardEvent::Replaced(id) = event {
            self.textures.remove(id);
            self.undecodable.remove(id);
        }
    }

    /// Draw the board. With `interactive` false (a modal is open) nothing on
    /// the canvas reacts to input.
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        store: &mut BoardStore,
        interactive: bool,
        show_grid: bool,
        grid_step: f32,
    ) -> CanvasOutput {
        let mut output = CanvasOutput::default();
        let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
        let rect = response.rect;
        painter.rect_filled(rect, 0.0, Color32::WHITE);

        // Middle mouse pans the view.
        if response.dragged() && ui.input(|i| i.pointer.middle_down()) {
            self.pan_offset += response.drag_delta();
        }
        let origin = rect.min + self.pan_offset;
        let to_canvas = |p: Pos2| (p - origin).to_pos2();

        if interactive {
            self.collect_input(ui, &response, store, to_canvas, &mut output);
        }
        self.resolver.pump(store, &mut self.gestures);
        if self.gestures.has_wheel() || self.gestures.dragging().is_some() {
            ui.ctx().request_repaint();
        }

        if show_grid {
            paint_grid(&painter, rect, origin, grid_step);
        }

        for id in render_order(store) {
            let Some(item) = store.get(id) else { continue };
            let transform = self.resolver.display_transform(item);
            self.paint_item(ui.ctx(), &painter, item, &transform, origin);
            if self.resolver.is_active(id) {
                let outline: Vec<Pos2> = transform.corners().iter().map(|c| origin + c.to_vec2()).collect();
                painter.add(Shape::closed_line(outline, Stroke::new(2.0, self.accent)));
            }
        }

        self.show_text_editor(ui, store, origin);
        output
    }

    fn collect_input(
        &mut self,
        ui: &egui::Ui,
        response: &egui::Response,
        store: &mut BoardStore,
        to_canvas: impl Fn(Pos2) -> Pos2,
        output: &mut CanvasOutput,
    ) {
        let now = ui.input(|i| i.time);

        if ui.input(|i| i.key_pressed(egui::Key::Escape)) {
            if self.editing.take().is_none() {
                self.gestures.reset();
                self.resolver.cancel_all();
            }
            return;
        }

        // Losing the window mid-gesture leaves no "ended" to commit with.
        if !ui.input(|i| i.focused) {
            self.gestures.reset();
            self.resolver.cancel_all();
            return;
        }

        // Two-finger touch takes over from a single-pointer drag.
        if let Some(touch) = ui.input(|i| i.multi_touch()) {
            if self.gestures.dragging().is_some() {
                self.gestures.end_drag();
            }
            let target = self
                .gestures
                .pinching()
                .or_else(|| self.resolver.hit_test(store, to_canvas(touch.start_pos)));
            if let Some(target) = target {
                self.gestures.pinch(target, touch.zoom_delta, touch.rotation_delta);
            }
            return;
        }
        self.gestures.end_pinch();

        let primary = ui.input(|i| i.pointer.primary_down() || i.pointer.primary_released());
        if response.drag_started() && primary {
            let origin = ui.input(|i| i.pointer.press_origin());
            if let Some(id) = origin.and_then(|p| self.resolver.hit_test(store, to_canvas(p))) {
                self.gestures.begin_drag(id);
            }
        }
        if response.dragged() && self.gestures.dragging().is_some() {
            self.gestures.drag_by(response.drag_delta());
        }
        if response.drag_released() {
            self.gestures.end_drag();
        }

        if response.double_clicked() {
            if let Some(id) = self.hovered_item(ui, store, &to_canvas) {
                if let Some(item) = store.get(id) {
                    if item.is_text() {
                        self.editing = Some(TextEditing { id, buffer: item.text.clone(), focused: false });
                    }
                }
            }
        } else if response.clicked() {
            if let Some(id) = self.hovered_item(ui, store, &to_canvas) {
                let empty_frame = store.get(id).map(|i| i.kind == ItemKind::Image && !i.has_image()).unwrap_or(false);
                if empty_frame {
                    output.placeholder_clicked = Some(id);
                }
            }
        }

        if response.hovered() {
            let (zoom, scroll, shift) = ui.input(|i| (i.zoom_delta(), i.scroll_delta, i.modifiers.shift));
            let degrees = if shift { (scroll.x + scroll.y) * WHEEL_ROTATE_RATE } else { 0.0 };
            if zoom != 1.0 || degrees != 0.0 {
                let target = self.hovered_item(ui, store, &to_canvas);
                if let Some(target) = target {
                    self.gestures.wheel(target, zoom, degrees, now);
                }
            }
        }
        self.gestures.tick(now);
    }

    fn hovered_item(&self, ui: &egui::Ui, store: &BoardStore, to_canvas: &impl Fn(Pos2) -> Pos2) -> Option<ItemId> {
        let pos = ui.input(|i| i.pointer.interact_pos())?;
        self.resolver.hit_test(store, to_canvas(pos))
    }

    fn paint_item(
        &mut self,
        ctx: &egui::Context,
        painter: &egui::Painter,
        item: &BoardItem,
        transform: &DisplayTransform,
        origin: Pos2,
    ) {
        let center = origin + transform.center().to_vec2();
        let size = transform.scaled_size();
        let angle = transform.rotation.to_radians();
        let corners: Vec<Pos2> = transform.corners().iter().map(|c| origin + c.to_vec2()).collect();

        match item.kind {
            ItemKind::Image => {
                if let Some(tex) = self.texture_for(ctx, item) {
                    let mut mesh = egui::Mesh::with_texture(tex.id());
                    mesh.add_rect_with_uv(
                        Rect::from_center_size(center, size),
                        Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                        Color32::WHITE,
                    );
                    mesh.rotate(Rot2::from_angle(angle), center);
                    painter.add(Shape::mesh(mesh));
                } else {
                    painter.add(Shape::convex_polygon(corners, PLACEHOLDER_FILL, Stroke::new(1.0, FRAME_STROKE)));
                    paint_rotated_text(painter, center, angle, "+ Photo", TEXT_FONT_SIZE * transform.scale, size.x, Color32::DARK_GRAY);
                }
            }
            ItemKind::Text => {
                painter.add(Shape::convex_polygon(corners, TEXT_FILL, Stroke::new(1.0, FRAME_STROKE)));
                let editing = self.editing.as_ref().map(|e| e.id) == Some(item.id());
                if !editing {
                    paint_rotated_text(painter, center, angle, &item.text, TEXT_FONT_SIZE * transform.scale, size.x, Color32::BLACK);
                }
            }
        }
    }

    fn texture_for(&mut self, ctx: &egui::Context, item: &BoardItem) -> Option<&egui::TextureHandle> {
        let id = item.id();
        if !item.has_image() || self.undecodable.contains(&id) {
            return None;
        }
        if !self.textures.contains_key(&id) {
            match item.decode_image() {
                Some(img) => {
                    let tex = load_texture(ctx, &format!("item_{}", id), &img);
                    self.textures.insert(id, tex);
                }
                None => {
                    self.undecodable.insert(id);
                    return None;
                }
            }
        }
        self.textures.get(&id)
    }

    /// Inline editor over the item being edited. Enter or clicking away
    /// commits, Esc discards.
    fn show_text_editor(&mut self, ui: &mut egui::Ui, store: &mut BoardStore, origin: Pos2) {
        let Some(mut editing) = self.editing.take() else { return };
        let Some(item) = store.get(editing.id) else { return };
        let transform = self.resolver.display_transform(item);
        let rect = Rect::from_center_size(origin + transform.center().to_vec2(), transform.scaled_size());

        let edit = egui::TextEdit::multiline(&mut editing.buffer)
            .font(FontId::proportional(TEXT_FONT_SIZE * transform.scale))
            .frame(true)
            .desired_width(rect.width());
        let response = ui.put(rect, edit);
        if !editing.focused {
            response.request_focus();
            editing.focused = true;
            self.editing = Some(editing);
            return;
        }

        let enter = ui.input(|i| i.key_pressed(egui::Key::Enter) && !i.modifiers.shift);
        if enter || response.lost_focus() || !response.has_focus() {
            let text = editing.buffer.trim_end_matches('\n').to_string();
            store.set_text(editing.id, text);
        } else {
            self.editing = Some(editing);
        }
    }
}

fn paint_grid(painter: &egui::Painter, rect: Rect, origin: Pos2, step: f32) {
    if step < 2.0 {
        return;
    }
    let stroke = Stroke::new(1.0, GRID_COLOR);
    let mut x = rect.min.x + (origin.x - rect.min.x).rem_euclid(step);
    while x < rect.max.x {
        painter.line_segment([Pos2::new(x, rect.min.y), Pos2::new(x, rect.max.y)], stroke);
        x += step;
    }
    let mut y = rect.min.y + (origin.y - rect.min.y).rem_euclid(step);
    while y < rect.max.y {
        painter.line_segment([Pos2::new(rect.min.x, y), Pos2::new(rect.max.x, y)], stroke);
        y += step;
    }
}

/// Text block centred on `center`, turned by `angle` radians around it.
fn paint_rotated_text(painter: &egui::Painter, center: Pos2, angle: f32, text: &str, size: f32, wrap: f32, color: Color32) {
    let galley = painter.layout(text.to_owned(), FontId::proportional(size.max(1.0)), color, wrap.max(1.0));
    let half = galley.size() * 0.5;
    let top_left = center + Rot2::from_angle(angle) * -half;
    let mut shape = egui::epaint::TextShape::new(top_left, galley);
    shape.angle = angle;
    painter.add(shape);
}

#[cfg(test)]
mod tests {
    use super::*;
    use visionboard::gesture::GesturePhase;

    #[test]
    fn drag_accumulates_and_ends_once() {
        let id = ItemId::new();
        let mut g = EguiGestures::default();
        g.begin_drag(id);
        g.drag_by(Vec2::new(5.0, 0.0));
        g.drag_by(Vec2::new(5.0, 2.0));
        g.end_drag();
        let events = g.drain();
        assert_eq!(events.len(), 3);
        assert_eq!(events[2], GestureEvent::ended(id, GestureKind::Drag(Vec2::new(10.0, 2.0))));
        assert!(g.drain().is_empty());
    }

    #[test]
    fn pinch_reports_degrees() {
        let id = ItemId::new();
        let mut g = EguiGestures::default();
        g.pinch(id, 2.0, std::f32::consts::FRAC_PI_2);
        g.end_pinch();
        let ended: Vec<_> = g.drain().into_iter().filter(|e| e.phase == GesturePhase::Ended).collect();
        assert_eq!(ended[0].kind, GestureKind::Magnify(2.0));
        match ended[1].kind {
            GestureKind::Rotate(d) => assert!((d - 90.0).abs() < 1e-3),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn wheel_ends_after_idle() {
        let id = ItemId::new();
        let mut g = EguiGestures::default();
        g.wheel(id, 1.1, 0.0, 0.0);
        g.tick(0.1);
        assert!(g.has_wheel());
        g.tick(0.5);
        assert!(!g.has_wheel());
        let last = g.drain().pop().expect("ended event");
        assert_eq!(last.phase, GesturePhase::Ended);
    }

    #[test]
    fn reset_drops_queued_events() {
        let id = ItemId::new();
        let mut g = EguiGestures::default();
        g.begin_drag(id);
        g.drag_by(Vec2::splat(3.0));
        g.reset();
        assert!(g.drain().is_empty());
        assert!(g.dragging().is_none());
    }
}
