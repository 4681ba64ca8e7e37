// ============================================================================
// BOARD STORE - single source of truth for the items on the board
// ============================================================================
//
// Items live in a map keyed by id; a separate order list keeps insertion order
// for rendering. Every mutation sends exactly one BoardEvent to each live
// subscriber. Lookups that miss are silent no-ops reported as `false`.
// ============================================================================

use std::collections::HashMap;
use std::sync::mpsc;

use egui::Vec2;

use super::item::{BoardItem, DEFAULT_TEXT, ItemId};

/// Change notification emitted after each store mutation.
#[derive(Clone, Debug, PartialEq)]
pub enum BoardEvent {
    Added(ItemId),
    Replaced(ItemId),
    Moved { id: ItemId, position: Vec2 },
    Resized { id: ItemId, size: Vec2 },
    Scaled { id: ItemId, scale: f32 },
    Rotated { id: ItemId, degrees: f32 },
    TextChanged(ItemId),
}

impl BoardEvent {
    pub fn item_id(&self) -> ItemId {
        match self {
            BoardEvent::Added(id) | BoardEvent::Replaced(id) | BoardEvent::TextChanged(id) => *id,
            BoardEvent::Moved { id, .. }
            | BoardEvent::Resized { id, .. }
            | BoardEvent::Scaled { id, .. }
            | BoardEvent::Rotated { id, .. } => *id,
        }
    }
}

#[derive(Default)]
pub struct BoardStore {
    items: HashMap<ItemId, BoardItem>,
    order: Vec<ItemId>,
    subscribers: Vec<mpsc::Sender<BoardEvent>>,
}

impl BoardStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. The receiver gets every event emitted from now on;
    /// dropping it unsubscribes on the next mutation.
    pub fn subscribe(&mut self) -> mpsc::Receiver<BoardEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    fn notify(&mut self, event: BoardEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    // -- Queries -------------------------------------------------------------

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, id: ItemId) -> Option<&BoardItem> {
        self.items.get(&id)
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.items.contains_key(&id)
    }

    /// Items in insertion order.
    pub fn items(&self) -> impl Iterator<Item = &BoardItem> + '_ {
        self.order.iter().filter_map(|id| self.items.get(id))
    }

    pub fn ids(&self) -> &[ItemId] {
        &self.order
    }

    /// The first image item that carries bytes. It acts as the board's
    /// reference layer: drawn on top and exempt from gestures.
    pub fn anchor_id(&self) -> Option<ItemId> {
        self.items().find(|item| item.has_image()).map(|item| item.id())
    }

    // -- Adds ----------------------------------------------------------------

    fn push(&mut self, item: BoardItem) -> ItemId {
        let id = item.id();
        log::debug!("board: add {} item {}", item.kind.label(), id);
        self.order.push(id);
        self.items.insert(id, item);
        self.notify(BoardEvent::Added(id));
        id
    }

    /// Append a text box with placeholder content at the default frame.
    pub fn add_text(&mut self) -> ItemId {
        self.push(BoardItem::new_text(DEFAULT_TEXT))
    }

    /// Append an image item at the default position.
    pub fn add_image(&mut self, bytes: Vec<u8>, size: Vec2) -> ItemId {
        self.push(BoardItem::new_image(bytes, size))
    }

    /// Append an image item at an explicit position (library elements).
    pub fn add_image_at(&mut self, bytes: Vec<u8>, position: Vec2, size: Vec2) -> ItemId {
        let mut item = BoardItem::new_image(bytes, size);
        item.position = position;
        self.push(item)
    }

    /// Append an empty image frame, filled in later through `update_item`.
    pub fn add_image_placeholder(&mut self) -> ItemId {
        self.push(BoardItem::new_image_placeholder())
    }

    // -- Mutations -----------------------------------------------------------

    fn with_item(&mut self, id: ItemId, op: &str, f: impl FnOnce(&mut BoardItem)) -> bool {
        match self.items.get_mut(&id) {
            Some(item) => {
                f(item);
                true
            }
            None => {
                log::debug!("board: {} ignored, no item {}", op, id);
                false
            }
        }
    }

    /// Replace the stored item that has the same id. Returns `false` (and
    /// changes nothing) when the id is unknown.
    pub fn update_item(&mut self, item: BoardItem) -> bool {
        let id = item.id();
        if !self.with_item(id, "update", |slot| *slot = item) {
            return false;
        }
        self.notify(BoardEvent::Replaced(id));
        true
    }

    pub fn move_item(&mut self, id: ItemId, position: Vec2) -> bool {
        if !self.with_item(id, "move", |item| item.position = position) {
            return false;
        }
        self.notify(BoardEvent::Moved { id, position });
        true
    }

    pub fn resize_item(&mut self, id: ItemId, size: Vec2) -> bool {
        if size.x <= 0.0 || size.y <= 0.0 {
            log::debug!("board: resize of {} to non-positive {:?} ignored", id, size);
            return false;
        }
        if !self.with_item(id, "resize", |item| item.size = size) {
            return false;
        }
        self.notify(BoardEvent::Resized { id, size });
        true
    }

    /// Overwrite the scale factor. No clamping; gesture commits clamp before
    /// calling this.
    pub fn scale_item(&mut self, id: ItemId, scale: f32) -> bool {
        if !self.with_item(id, "scale", |item| item.scale = scale) {
            return false;
        }
        self.notify(BoardEvent::Scaled { id, scale });
        true
    }

    /// Overwrite the rotation with an absolute angle in degrees.
    pub fn rotate_item(&mut self, id: ItemId, degrees: f32) -> bool {
        if !self.with_item(id, "rotate", |item| item.rotation = degrees) {
            return false;
        }
        self.notify(BoardEvent::Rotated { id, degrees });
        true
    }

    pub fn set_text(&mut self, id: ItemId, text: impl Into<String>) -> bool {
        let text = text.into();
        if !self.with_item(id, "set_text", |item| item.text = text) {
            return false;
        }
        self.notify(BoardEvent::TextChanged(id));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribers_get_one_event_per_mutation() {
        let mut store = BoardStore::new();
        let rx = store.subscribe();
        let id = store.add_text();
        store.move_item(id, Vec2::new(5.0, 6.0));
        store.rotate_item(id, 30.0);

        let events: Vec<BoardEvent> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                BoardEvent::Added(id),
                BoardEvent::Moved { id, position: Vec2::new(5.0, 6.0) },
                BoardEvent::Rotated { id, degrees: 30.0 },
            ]
        );
    }

    #[test]
    fn missed_lookup_emits_nothing() {
        let mut store = BoardStore::new();
        let rx = store.subscribe();
        assert!(!store.scale_item(ItemId::new(), 2.0));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn dropped_subscriber_is_pruned() {
        let mut store = BoardStore::new();
        let rx = store.subscribe();
        drop(rx);
        store.add_text();
        assert!(store.subscribers.is_empty());
    }

    #[test]
    fn non_positive_resize_is_rejected() {
        let mut store = BoardStore::new();
        let id = store.add_text();
        assert!(!store.resize_item(id, Vec2::new(0.0, 10.0)));
        assert_eq!(store.get(id).map(|i| i.size), Some(Vec2::new(200.0, 100.0)));
    }
}
