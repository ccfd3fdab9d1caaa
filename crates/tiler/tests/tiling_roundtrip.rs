//! End-to-end tiling properties: reassembly, manifest consistency,
//! idempotence.

use chip_common::PaddingPolicy;
use tiler::{read_manifest, tile_scene, write_manifest, TileGrid};

#[test]
fn reassembling_tiles_reconstructs_the_raster() {
    let dir = tempfile::tempdir().unwrap();
    let img = test_utils::patterned_image(230, 170, test_utils::test_transform(230, 170));

    let entries = tile_scene(&img, "sceneA", dir.path(), 100, PaddingPolicy::Truncate).unwrap();

    // Rebuild the full image from the emitted PNGs by pixel offset.
    let mut rebuilt = vec![0u8; img.width * img.height];
    for entry in &entries {
        let tile = image::open(dir.path().join(&entry.path)).unwrap().into_luma8();
        assert_eq!(tile.width() as usize, entry.width_px);
        assert_eq!(tile.height() as usize, entry.height_px);
        let px_x = entry.col * 100;
        let px_y = entry.row * 100;
        for (x, y, pixel) in tile.enumerate_pixels() {
            rebuilt[(px_y + y as usize) * img.width + px_x + x as usize] = pixel.0[0];
        }
    }

    assert_eq!(rebuilt, img.pixels);
}

#[test]
fn padded_tiles_reconstruct_modulo_padding() {
    let dir = tempfile::tempdir().unwrap();
    let img = test_utils::patterned_image(150, 120, test_utils::test_transform(150, 120));

    let entries = tile_scene(&img, "sceneB", dir.path(), 100, PaddingPolicy::Pad).unwrap();
    assert_eq!(entries.len(), 4);
    assert!(entries.iter().all(|e| e.width_px == 100 && e.height_px == 100));

    let edge = image::open(dir.path().join("sceneB/sceneB_0_1.png"))
        .unwrap()
        .into_luma8();
    // In-raster pixels match the source; past-the-edge pixels are sentinel.
    assert_eq!(edge.get_pixel(0, 0).0[0], img.pixels[100]);
    assert_eq!(edge.get_pixel(49, 0).0[0], img.pixels[149]);
    assert_eq!(edge.get_pixel(50, 0).0[0], 0);
    assert_eq!(edge.get_pixel(99, 99).0[0], 0);
}

#[test]
fn manifest_round_trips_and_matches_tiles() {
    let dir = tempfile::tempdir().unwrap();
    let img = test_utils::patterned_image(300, 200, test_utils::test_transform(300, 200));

    let entries = tile_scene(&img, "sceneC", dir.path(), 100, PaddingPolicy::Pad).unwrap();
    let manifest_path = dir.path().join("manifest.jsonl");
    write_manifest(&entries, &manifest_path).unwrap();

    let read_back = read_manifest(&manifest_path).unwrap();
    assert_eq!(read_back, entries);

    // Every manifest entry points at an existing file whose footprint agrees
    // with recomputing the affine mapping from row/col.
    let grid = TileGrid::new(300, 200, 100, PaddingPolicy::Pad).unwrap();
    for entry in &read_back {
        assert!(dir.path().join(&entry.path).is_file());
        let tile = grid.tile(entry.row, entry.col).unwrap();
        let expected = tile.footprint(&img.transform);
        assert!((entry.west - expected.west).abs() < 1e-9);
        assert!((entry.south - expected.south).abs() < 1e-9);
        assert!((entry.east - expected.east).abs() < 1e-9);
        assert!((entry.north - expected.north).abs() < 1e-9);
    }
}

#[test]
fn rerun_produces_identical_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let img = test_utils::patterned_image(230, 170, test_utils::test_transform(230, 170));

    let first = tile_scene(&img, "sceneD", dir.path(), 100, PaddingPolicy::Truncate).unwrap();
    let first_bytes: Vec<Vec<u8>> = first
        .iter()
        .map(|e| std::fs::read(dir.path().join(&e.path)).unwrap())
        .collect();

    let second = tile_scene(&img, "sceneD", dir.path(), 100, PaddingPolicy::Truncate).unwrap();
    assert_eq!(first, second);
    for (entry, bytes) in second.iter().zip(&first_bytes) {
        assert_eq!(&std::fs::read(dir.path().join(&entry.path)).unwrap(), bytes);
    }
}
