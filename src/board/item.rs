use egui::{Pos2, Vec2};
use image::RgbaImage;
use uuid::Uuid;

/// Placeholder content for freshly added text boxes.
pub const DEFAULT_TEXT: &str = "New Text Box";

/// Size given to items that don't specify one.
pub const DEFAULT_ITEM_SIZE: Vec2 = Vec2::new(200.0, 100.0);

/// Stable identity of a board item. Generated once, never reassigned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Text,
    Image,
}

impl ItemKind {
    pub fn label(&self) -> &'static str {
        match self {
            ItemKind::Text => "Text",
            ItemKind::Image => "Image",
        }
    }
}

/// One element placed on the board.
///
/// `text` is only read for [`ItemKind::Text`] and `image_data` only for
/// [`ItemKind::Image`]; both may be populated at once.
#[derive(Clone, Debug, PartialEq)]
pub struct BoardItem {
    id: ItemId,
    pub kind: ItemKind,
    pub text: String,
    /// Encoded image bytes (PNG when produced by this crate).
    pub image_data: Option<Vec<u8>>,
    /// Top-left corner, relative to the canvas origin.
    pub position: Vec2,
    pub size: Vec2,
    /// Multiplier on top of `size`. Unbounded here; interaction clamps it.
    pub scale: f32,
    /// Degrees, stored unbounded.
    pub rotation: f32,
}

impl BoardItem {
    pub fn new_text(text: impl Into<String>) -> Self {
        Self {
            id: ItemId::new(),
            kind: ItemKind::Text,
            text: text.into(),
            image_data: None,
            position: Vec2::ZERO,
            size: DEFAULT_ITEM_SIZE,
            scale: 1.0,
            rotation: 0.0,
        }
    }

    pub fn new_image(bytes: Vec<u8>, size: Vec2) -> Self {
        Self {
            id: ItemId::new(),
            kind: ItemKind::Image,
            text: String::new(),
            image_data: Some(bytes),
            position: Vec2::ZERO,
            size,
            scale: 1.0,
            rotation: 0.0,
        }
    }

    /// Image item without bytes yet. Renders as a placeholder the user can
    /// click to pick a photo.
    pub fn new_image_placeholder() -> Self {
        Self {
            image_data: None,
            ..Self::new_image(Vec::new(), DEFAULT_ITEM_SIZE)
        }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn is_text(&self) -> bool {
        self.kind == ItemKind::Text
    }

    /// Image-kind item that actually carries bytes.
    pub fn has_image(&self) -> bool {
        self.kind == ItemKind::Image && self.image_data.is_some()
    }

    /// Decode the image bytes. `None` for text items, missing bytes, or
    /// bytes that fail to decode; callers render a placeholder instead.
    pub fn decode_image(&self) -> Option<RgbaImage> {
        if self.kind != ItemKind::Image {
            return None;
        }
        let bytes = self.image_data.as_ref()?;
        match image::load_from_memory(bytes) {
            Ok(img) => Some(img.into_rgba8()),
            Err(e) => {
                log::warn!("item {}: undecodable image bytes: {}", self.id, e);
                None
            }
        }
    }

    /// Size after applying `scale`.
    pub fn scaled_size(&self) -> Vec2 {
        self.size * self.scale
    }

    /// Centre of the item's unscaled frame. Scale and rotation pivot here.
    pub fn center(&self) -> Pos2 {
        (self.position + self.size * 0.5).to_pos2()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_defaults_match_placeholder_box() {
        let item = BoardItem::new_text(DEFAULT_TEXT);
        assert_eq!(item.kind, ItemKind::Text);
        assert_eq!(item.size, Vec2::new(200.0, 100.0));
        assert_eq!(item.scale, 1.0);
        assert_eq!(item.rotation, 0.0);
        assert_eq!(item.position, Vec2::ZERO);
    }

    #[test]
    fn garbage_bytes_decode_to_none() {
        let item = BoardItem::new_image(vec![1, 2, 3, 4], Vec2::splat(10.0));
        assert!(item.has_image());
        assert!(item.decode_image().is_none());
    }

    #[test]
    fn text_item_never_decodes_even_with_bytes() {
        let mut item = BoardItem::new_text("hi");
        item.image_data = Some(vec![0; 8]);
        assert!(!item.has_image());
        assert!(item.decode_image().is_none());
    }
}
