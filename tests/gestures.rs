use egui::{Pos2, Vec2};
use visionboard::board::BoardStore;
use visionboard::gesture::{
    GestureEvent, GestureKind, GestureResolver, MAX_SCALE, ScriptedGestures, render_order,
};

fn png_bytes() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(4, 4, image::Rgba([200, 100, 50, 255]));
    visionboard::io::encode_png(&img).expect("encode")
}

/// Board with an anchor photo followed by a second, movable photo.
fn board_with_two_photos() -> (BoardStore, visionboard::board::ItemId, visionboard::board::ItemId) {
    let mut store = BoardStore::new();
    let anchor = store.add_image(png_bytes(), Vec2::new(100.0, 100.0));
    let photo = store.add_image(png_bytes(), Vec2::new(100.0, 100.0));
    (store, anchor, photo)
}

#[test]
fn magnify_is_clamped_on_commit() {
    let (mut store, _, photo) = board_with_two_photos();
    let mut resolver = GestureResolver::new();
    resolver.apply(&mut store, GestureEvent::changed(photo, GestureKind::Magnify(100.0)));
    assert!(resolver.apply(&mut store, GestureEvent::ended(photo, GestureKind::Magnify(100.0))));
    assert_eq!(store.get(photo).map(|i| i.scale), Some(MAX_SCALE));
    assert_eq!(store.get(photo).map(|i| i.scale), Some(5.0));
}

#[test]
fn anchor_ignores_every_gesture() {
    let (mut store, anchor, _) = board_with_two_photos();
    let mut resolver = GestureResolver::new();
    let events = [
        GestureEvent::ended(anchor, GestureKind::Drag(Vec2::new(30.0, 30.0))),
        GestureEvent::ended(anchor, GestureKind::Rotate(45.0)),
        GestureEvent::ended(anchor, GestureKind::Magnify(2.0)),
    ];
    for e in events {
        assert!(!resolver.apply(&mut store, e));
    }
    let item = store.get(anchor).expect("anchor");
    assert_eq!(item.position, Vec2::ZERO);
    assert_eq!(item.rotation, 0.0);
    assert_eq!(item.scale, 1.0);
}

#[test]
fn text_cannot_be_magnified() {
    let mut store = BoardStore::new();
    let id = store.add_text();
    let mut resolver = GestureResolver::new();
    assert!(!resolver.apply(&mut store, GestureEvent::ended(id, GestureKind::Magnify(3.0))));
    assert_eq!(store.get(id).map(|i| i.scale), Some(1.0));
    // Rotation still works on text.
    assert!(resolver.apply(&mut store, GestureEvent::ended(id, GestureKind::Rotate(15.0))));
    assert_eq!(store.get(id).map(|i| i.rotation), Some(15.0));
}

#[test]
fn drag_and_rotate_run_together() {
    let mut store = BoardStore::new();
    let id = store.add_text();
    let mut resolver = GestureResolver::new();

    resolver.apply(&mut store, GestureEvent::changed(id, GestureKind::Drag(Vec2::new(20.0, 10.0))));
    resolver.apply(&mut store, GestureEvent::changed(id, GestureKind::Rotate(30.0)));
    let item = store.get(id).cloned().expect("item");
    let shown = resolver.display_transform(&item);
    assert_eq!(shown.position, Vec2::new(20.0, 10.0));
    assert_eq!(shown.rotation, 30.0);
    assert_eq!(item.position, Vec2::ZERO);

    assert!(resolver.apply(&mut store, GestureEvent::ended(id, GestureKind::Drag(Vec2::new(25.0, 10.0)))));
    assert!(resolver.is_active(id), "rotation is still live");
    assert!(resolver.apply(&mut store, GestureEvent::ended(id, GestureKind::Rotate(40.0))));
    assert!(!resolver.is_active(id));

    let item = store.get(id).expect("item");
    assert_eq!(item.position, Vec2::new(25.0, 10.0));
    assert_eq!(item.rotation, 40.0);
}

#[test]
fn second_rotation_builds_on_the_first_commit() {
    let mut store = BoardStore::new();
    let id = store.add_text();
    let mut resolver = GestureResolver::new();
    resolver.apply(&mut store, GestureEvent::ended(id, GestureKind::Rotate(45.0)));
    resolver.apply(&mut store, GestureEvent::ended(id, GestureKind::Rotate(45.0)));
    assert_eq!(store.get(id).map(|i| i.rotation), Some(90.0));
}

#[test]
fn scripted_sequence_commits_once_per_end() {
    let mut store = BoardStore::new();
    let id = store.add_text();
    let events = store.subscribe();
    let mut script = ScriptedGestures::new([
        GestureEvent::changed(id, GestureKind::Drag(Vec2::new(1.0, 0.0))),
        GestureEvent::changed(id, GestureKind::Drag(Vec2::new(5.0, 0.0))),
        GestureEvent::changed(id, GestureKind::Drag(Vec2::new(9.0, 0.0))),
        GestureEvent::ended(id, GestureKind::Drag(Vec2::new(10.0, 0.0))),
    ]);
    let mut resolver = GestureResolver::new();
    assert_eq!(resolver.pump(&mut store, &mut script), 1);
    assert_eq!(events.try_iter().count(), 1);
    assert_eq!(store.get(id).map(|i| i.position), Some(Vec2::new(10.0, 0.0)));
}

#[test]
fn cancel_drops_the_live_delta() {
    let mut store = BoardStore::new();
    let id = store.add_text();
    let mut resolver = GestureResolver::new();
    resolver.apply(&mut store, GestureEvent::changed(id, GestureKind::Drag(Vec2::new(50.0, 0.0))));
    resolver.cancel(id);
    let item = store.get(id).cloned().expect("item");
    assert_eq!(resolver.display_transform(&item).position, Vec2::ZERO);
}

#[test]
fn topmost_item_wins_and_anchor_is_skipped() {
    let (mut store, anchor, photo) = board_with_two_photos();
    let text = store.add_text();
    store.move_item(text, Vec2::new(50.0, 50.0));
    let resolver = GestureResolver::new();

    // The anchor is drawn on top of everything but lets hits through.
    assert_eq!(resolver.hit_test(&store, Pos2::new(10.0, 10.0)), Some(photo));
    assert_eq!(resolver.hit_test(&store, Pos2::new(60.0, 60.0)), Some(text));
    assert_eq!(resolver.hit_test(&store, Pos2::new(500.0, 500.0)), None);

    let order = render_order(&store);
    assert_eq!(order.last(), Some(&anchor));
    assert_eq!(order, vec![photo, text, anchor]);
}
