use std::collections::HashSet;

use egui::Vec2;
use visionboard::board::{BoardItem, BoardStore, DEFAULT_ITEM_SIZE, DEFAULT_TEXT, ItemKind};

fn png_bytes() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(4, 4, image::Rgba([10, 20, 30, 255]));
    visionboard::io::encode_png(&img).expect("encode")
}

#[test]
fn every_added_item_gets_a_fresh_id() {
    let mut store = BoardStore::new();
    let mut seen = HashSet::new();
    for i in 0..50 {
        let id = if i % 3 == 0 {
            store.add_image(png_bytes(), Vec2::splat(20.0))
        } else if i % 3 == 1 {
            store.add_text()
        } else {
            store.add_image_placeholder()
        };
        assert!(seen.insert(id), "id {} handed out twice", id);
    }
    assert_eq!(store.len(), 50);
}

#[test]
fn unknown_id_leaves_the_board_untouched() {
    let mut store = BoardStore::new();
    store.add_text();
    store.add_image(png_bytes(), Vec2::new(50.0, 50.0));
    let events = store.subscribe();
    let before: Vec<BoardItem> = store.items().cloned().collect();

    let stranger = BoardItem::new_text("not on this board");
    let id = stranger.id();
    assert!(!store.update_item(stranger));
    assert!(!store.move_item(id, Vec2::new(10.0, 10.0)));
    assert!(!store.resize_item(id, Vec2::new(10.0, 10.0)));
    assert!(!store.scale_item(id, 3.0));
    assert!(!store.rotate_item(id, 30.0));
    assert!(!store.set_text(id, "hello"));

    let after: Vec<BoardItem> = store.items().cloned().collect();
    assert_eq!(before, after);
    assert!(events.try_recv().is_err());
}

#[test]
fn text_then_image_defaults() {
    let mut store = BoardStore::new();
    let text_id = store.add_text();
    assert_eq!(store.len(), 1);
    let text = store.get(text_id).expect("text item");
    assert_eq!(text.kind, ItemKind::Text);
    assert_eq!(text.text, DEFAULT_TEXT);
    assert_eq!(text.text, "New Text Box");
    assert_eq!(text.size, DEFAULT_ITEM_SIZE);
    assert_eq!(text.size, Vec2::new(200.0, 100.0));

    let bytes = png_bytes();
    let image_id = store.add_image(bytes.clone(), Vec2::new(50.0, 50.0));
    assert_eq!(store.len(), 2);
    assert_eq!(store.ids()[1], image_id);
    let image = store.get(image_id).expect("image item");
    assert_eq!(image.kind, ItemKind::Image);
    assert_eq!(image.image_data.as_deref(), Some(bytes.as_slice()));
    assert_eq!(image.size, Vec2::new(50.0, 50.0));
    assert_eq!(image.scale, 1.0);
    assert_eq!(image.rotation, 0.0);
}

#[test]
fn separate_rotation_commits_overwrite() {
    let mut store = BoardStore::new();
    let id = store.add_text();
    assert!(store.rotate_item(id, 45.0));
    assert!(store.rotate_item(id, 90.0));
    assert_eq!(store.get(id).map(|i| i.rotation), Some(90.0));
}

#[test]
fn placeholder_is_filled_through_update() {
    let mut store = BoardStore::new();
    let id = store.add_image_placeholder();
    assert_eq!(store.anchor_id(), None);

    let mut item = store.get(id).cloned().expect("placeholder");
    assert!(!item.has_image());
    item.image_data = Some(png_bytes());
    item.size = Vec2::new(300.0, 150.0);
    assert!(store.update_item(item));

    let filled = store.get(id).expect("filled");
    assert!(filled.has_image());
    assert_eq!(filled.size, Vec2::new(300.0, 150.0));
    assert_eq!(store.anchor_id(), Some(id));
}

#[test]
fn events_name_the_item_they_touch() {
    let mut store = BoardStore::new();
    let events = store.subscribe();
    let text = store.add_text();
    let photo = store.add_image(png_bytes(), Vec2::new(40.0, 40.0));
    store.move_item(photo, Vec2::new(5.0, 5.0));
    store.rotate_item(text, 15.0);
    store.set_text(text, "hello");

    let touched: Vec<_> = events.try_iter().map(|e| e.item_id()).collect();
    assert_eq!(touched, vec![text, photo, photo, text, text]);
}
