// ============================================================================
// GESTURE RESOLVER - turns drag / magnify / rotate streams into store commits
// ============================================================================
//
// Input sources (egui pointer + touch, scripted sequences, ...) implement
// `GestureAdapter` and produce platform-neutral `GestureEvent`s. Deltas are
// cumulative since the gesture began. While a gesture is live its delta is
// only kept here for rendering; the single store write happens on `Ended`.
// ============================================================================

use std::collections::{HashMap, VecDeque};

use egui::{Pos2, Vec2};

use crate::board::{BoardItem, BoardStore, ItemId};

/// Interactive scale limits. The model itself stores any value.
pub const MIN_SCALE: f32 = 0.2;
pub const MAX_SCALE: f32 = 5.0;

pub fn clamp_scale(scale: f32) -> f32 {
    if scale.is_nan() {
        return 1.0;
    }
    scale.clamp(MIN_SCALE, MAX_SCALE)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GesturePhase {
    Changed,
    Ended,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GestureKind {
    /// Translation in canvas units since the drag began.
    Drag(Vec2),
    /// Multiplicative factor since the pinch began (1.0 = unchanged).
    Magnify(f32),
    /// Degrees since the rotation began.
    Rotate(f32),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureEvent {
    pub target: ItemId,
    pub kind: GestureKind,
    pub phase: GesturePhase,
}

impl GestureEvent {
    pub fn changed(target: ItemId, kind: GestureKind) -> Self {
        Self { target, kind, phase: GesturePhase::Changed }
    }

    pub fn ended(target: ItemId, kind: GestureKind) -> Self {
        Self { target, kind, phase: GesturePhase::Ended }
    }
}

/// A source of gesture events. Each platform input layer gets an adapter;
/// the resolution logic lives only in [`GestureResolver`].
pub trait GestureAdapter {
    /// Take every event produced since the last call, oldest first.
    fn drain(&mut self) -> Vec<GestureEvent>;
}

/// Adapter replaying a fixed sequence. Used for tests and demos.
#[derive(Default)]
pub struct ScriptedGestures {
    queue: VecDeque<GestureEvent>,
}

impl ScriptedGestures {
    pub fn new(events: impl IntoIterator<Item = GestureEvent>) -> Self {
        Self { queue: events.into_iter().collect() }
    }

    pub fn push(&mut self, event: GestureEvent) {
        self.queue.push_back(event);
    }
}

impl GestureAdapter for ScriptedGestures {
    fn drain(&mut self) -> Vec<GestureEvent> {
        self.queue.drain(..).collect()
    }
}

/// Uncommitted deltas for one item. Each gesture kind is tracked separately so
/// drag and rotate can run at the same time.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LiveDelta {
    pub translation: Option<Vec2>,
    pub magnification: Option<f32>,
    pub rotation: Option<f32>,
}

impl LiveDelta {
    fn is_idle(&self) -> bool {
        self.translation.is_none() && self.magnification.is_none() && self.rotation.is_none()
    }
}

/// What to draw for an item this frame: committed values plus live deltas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayTransform {
    pub position: Vec2,
    pub size: Vec2,
    pub scale: f32,
    pub rotation: f32,
}

impl DisplayTransform {
    pub fn of(item: &BoardItem) -> Self {
        Self {
            position: item.position,
            size: item.size,
            scale: item.scale,
            rotation: item.rotation,
        }
    }

    pub fn center(&self) -> Pos2 {
        (self.position + self.size * 0.5).to_pos2()
    }

    pub fn scaled_size(&self) -> Vec2 {
        self.size * self.scale
    }

    /// Whether `point` (canvas units) lies inside the rotated, scaled frame.
    pub fn contains(&self, point: Pos2) -> bool {
        let c = self.center();
        let d = point - c;
        let (sin, cos) = (-self.rotation.to_radians()).sin_cos();
        let local = Vec2::new(d.x * cos - d.y * sin, d.x * sin + d.y * cos);
        let half = self.scaled_size() * 0.5;
        local.x.abs() <= half.x && local.y.abs() <= half.y
    }

    /// Corners in canvas units, clockwise from top-left.
    pub fn corners(&self) -> [Pos2; 4] {
        let c = self.center();
        let half = self.scaled_size() * 0.5;
        let (sin, cos) = self.rotation.to_radians().sin_cos();
        let rot = |v: Vec2| c + Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos);
        [
            rot(Vec2::new(-half.x, -half.y)),
            rot(Vec2::new(half.x, -half.y)),
            rot(Vec2::new(half.x, half.y)),
            rot(Vec2::new(-half.x, half.y)),
        ]
    }
}

/// Insertion order with the anchor item moved to the end, so it is drawn on
/// top of everything else.
pub fn render_order(store: &BoardStore) -> Vec<ItemId> {
    let anchor = store.anchor_id();
    let mut order: Vec<ItemId> = store.ids().iter().copied().filter(|id| Some(*id) != anchor).collect();
    if let Some(anchor) = anchor {
        order.push(anchor);
    }
    order
}

#[derive(Default)]
pub struct GestureResolver {
    live: HashMap<ItemId, LiveDelta>,
}

impl GestureResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `item` may receive `kind` at all.
    fn accepts(store: &BoardStore, item: &BoardItem, kind: &GestureKind) -> bool {
        if store.anchor_id() == Some(item.id()) {
            return false;
        }
        !matches!(kind, GestureKind::Magnify(_)) || !item.is_text()
    }

    /// Feed one event. Returns `true` when it produced a store commit.
    pub fn apply(&mut self, store: &mut BoardStore, event: GestureEvent) -> bool {
        let Some(item) = store.get(event.target) else {
            self.live.remove(&event.target);
            return false;
        };
        if !Self::accepts(store, item, &event.kind) {
            return false;
        }

        match event.phase {
            GesturePhase::Changed => {
                let live = self.live.entry(event.target).or_default();
                match event.kind {
                    GestureKind::Drag(t) => live.translation = Some(t),
                    GestureKind::Magnify(f) => live.magnification = Some(f),
                    GestureKind::Rotate(d) => live.rotation = Some(d),
                }
                false
            }
            GesturePhase::Ended => {
                let id = event.target;
                let committed = match event.kind {
                    GestureKind::Drag(t) => {
                        let position = item.position + t;
                        store.move_item(id, position)
                    }
                    GestureKind::Magnify(f) => {
                        let scale = clamp_scale(item.scale * f);
                        store.scale_item(id, scale)
                    }
                    GestureKind::Rotate(d) => {
                        let degrees = item.rotation + d;
                        store.rotate_item(id, degrees)
                    }
                };
                self.clear_kind(id, &event.kind);
                committed
            }
        }
    }

    fn clear_kind(&mut self, id: ItemId, kind: &GestureKind) {
        if let Some(live) = self.live.get_mut(&id) {
            match kind {
                GestureKind::Drag(_) => live.translation = None,
                GestureKind::Magnify(_) => live.magnification = None,
                GestureKind::Rotate(_) => live.rotation = None,
            }
            if live.is_idle() {
                self.live.remove(&id);
            }
        }
    }

    /// Drain an adapter and apply everything it produced. Returns the number
    /// of store commits.
    pub fn pump(&mut self, store: &mut BoardStore, adapter: &mut dyn GestureAdapter) -> usize {
        adapter
            .drain()
            .into_iter()
            .filter(|event| self.apply(store, *event))
            .count()
    }

    /// Drop any live delta for `id` without committing it.
    pub fn cancel(&mut self, id: ItemId) {
        self.live.remove(&id);
    }

    pub fn cancel_all(&mut self) {
        self.live.clear();
    }

    pub fn is_active(&self, id: ItemId) -> bool {
        self.live.contains_key(&id)
    }

    /// Committed values with live deltas layered on top.
    pub fn display_transform(&self, item: &BoardItem) -> DisplayTransform {
        let mut t = DisplayTransform::of(item);
        if let Some(live) = self.live.get(&item.id()) {
            if let Some(d) = live.translation {
                t.position += d;
            }
            if let Some(f) = live.magnification {
                t.scale = clamp_scale(item.scale * f);
            }
            if let Some(r) = live.rotation {
                t.rotation += r;
            }
        }
        t
    }

    /// Topmost item under `point`, skipping the anchor item.
    pub fn hit_test(&self, store: &BoardStore, point: Pos2) -> Option<ItemId> {
        let anchor = store.anchor_id();
        render_order(store)
            .into_iter()
            .rev()
            .filter(|id| Some(*id) != anchor)
            .find(|id| {
                store
                    .get(*id)
                    .map(|item| self.display_transform(item).contains(point))
                    .unwrap_or(false)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn changed_events_do_not_touch_the_store() {
        let mut store = BoardStore::new();
        let id = store.add_text();
        let mut resolver = GestureResolver::new();
        resolver.apply(&mut store, GestureEvent::changed(id, GestureKind::Drag(Vec2::new(40.0, 0.0))));

        let item = store.get(id).cloned().expect("item");
        assert_eq!(item.position, Vec2::ZERO);
        assert_eq!(resolver.display_transform(&item).position, Vec2::new(40.0, 0.0));
    }

    #[test]
    fn rotated_frame_hit_test() {
        let t = DisplayTransform {
            position: Vec2::ZERO,
            size: Vec2::new(100.0, 10.0),
            scale: 1.0,
            rotation: 90.0,
        };
        // Centre (50, 5); rotated 90° the long axis is vertical.
        assert!(t.contains(Pos2::new(50.0, 50.0)));
        assert!(!t.contains(Pos2::new(95.0, 5.0)));
    }

    #[test]
    fn nan_scale_resets_to_identity() {
        assert_eq!(clamp_scale(f32::NAN), 1.0);
        assert_eq!(clamp_scale(0.01), MIN_SCALE);
    }
}
