use egui::Vec2;
use image::{Rgba, RgbaImage};
use visionboard::board::BoardStore;
use visionboard::io::{encode_png, save_png};
use visionboard::render::{SnapshotOptions, render_board};

fn solid_png(color: [u8; 4]) -> Vec<u8> {
    encode_png(&RgbaImage::from_pixel(10, 10, Rgba(color))).expect("encode")
}

#[test]
fn snapshot_fits_items_and_paints_them() {
    let mut store = BoardStore::new();
    let id = store.add_image(solid_png([255, 0, 0, 255]), Vec2::new(60.0, 40.0));
    store.move_item(id, Vec2::new(10.0, 20.0));

    let img = render_board(&store, &SnapshotOptions::default()).expect("snapshot");
    assert_eq!(img.dimensions(), (70 + 24, 60 + 24));
    assert_eq!(*img.get_pixel(40, 40), Rgba([255, 0, 0, 255]));
    assert_eq!(*img.get_pixel(2, 2), Rgba([255, 255, 255, 255]));
}

#[test]
fn anchor_photo_is_drawn_last() {
    let mut store = BoardStore::new();
    store.add_image(solid_png([0, 0, 255, 255]), Vec2::new(50.0, 50.0));
    store.add_image(solid_png([0, 255, 0, 255]), Vec2::new(50.0, 50.0));

    let img = render_board(&store, &SnapshotOptions::default()).expect("snapshot");
    assert_eq!(*img.get_pixel(25, 25), Rgba([0, 0, 255, 255]));
}

#[test]
fn undecodable_image_renders_as_placeholder() {
    let mut store = BoardStore::new();
    store.add_image(vec![1, 2, 3, 4], Vec2::new(30.0, 30.0));
    let options = SnapshotOptions { size: Some((40, 40)), ..SnapshotOptions::default() };
    let img = render_board(&store, &options).expect("snapshot");
    assert_eq!(img.dimensions(), (40, 40));
    assert_ne!(*img.get_pixel(15, 15), Rgba([255, 255, 255, 255]));
}

#[test]
fn snapshot_saves_as_png() {
    let mut store = BoardStore::new();
    store.add_text();
    let img = render_board(&store, &SnapshotOptions::default()).expect("snapshot");

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("board.png");
    save_png(&img, &path).expect("save");
    let back = image::open(&path).expect("reopen").into_rgba8();
    assert_eq!(back.dimensions(), img.dimensions());
}

#[test]
fn items_left_of_and_above_the_origin_are_kept() {
    let mut store = BoardStore::new();
    store.add_image_at(solid_png([255, 0, 0, 255]), Vec2::new(-200.0, -150.0), Vec2::new(80.0, 80.0));
    store.add_image_at(solid_png([0, 255, 0, 255]), Vec2::new(300.0, 100.0), Vec2::new(40.0, 40.0));

    let options = SnapshotOptions { grid_step: Some(50.0), ..SnapshotOptions::default() };
    let img = render_board(&store, &options).expect("snapshot");
    assert_eq!(img.dimensions(), (224 + 340 + 24, 174 + 140 + 24));

    let count = |c: usize| img.pixels().filter(|p| p[c] > 200 && p[(c + 1) % 3] < 50).count();
    assert_eq!(count(0), 80 * 80);
    assert_eq!(count(1), 40 * 40);
    assert_eq!(*img.get_pixel(24, 24), Rgba([255, 0, 0, 255]));

    // Grid lines stay on board multiples of the step.
    assert_ne!(*img.get_pixel(224, 5), Rgba([255, 255, 255, 255]));
    assert_eq!(*img.get_pixel(225, 5), Rgba([255, 255, 255, 255]));
}
