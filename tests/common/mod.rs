#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use badge_sheet::model::{BadgeGeometry, Grid, PixelGeometry};
use image::{Rgba, RgbaImage};

pub const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
pub const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
pub const GREEN: Rgba<u8> = Rgba([0, 128, 0, 255]);
pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Scratch directory: tests/output/<name>/, emptied on each call.
pub fn output_dir(name: &str) -> PathBuf {
    let dir = PathBuf::from("tests/output").join(name);
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("create output dir");
    dir
}

pub fn solid(width: u32, height: u32, color: Rgba<u8>) -> RgbaImage {
    RgbaImage::from_pixel(width, height, color)
}

/// Pixel geometry at 1 px/mm, so millimetre and pixel figures coincide.
pub fn pixel_geometry(
    grid: Grid,
    page: (u32, u32),
    page_margin: u32,
    badge: BadgeGeometry,
    min_spacing: u32,
) -> PixelGeometry {
    PixelGeometry {
        px_per_mm: 1.0,
        badge,
        grid,
        page_width: page.0,
        page_height: page.1,
        page_margin,
        min_spacing,
        min_spacing_mm: min_spacing as f64,
        page_width_mm: page.0 as f32,
        page_height_mm: page.1 as f32,
    }
}

/// Channel-wise comparison with a tolerance for resampling rounding.
pub fn assert_close(actual: Rgba<u8>, expected: Rgba<u8>, tolerance: u8, what: &str) {
    let ok = actual
        .0
        .iter()
        .zip(expected.0.iter())
        .all(|(a, e)| a.abs_diff(*e) <= tolerance);
    assert!(ok, "{what}: got {actual:?}, expected {expected:?} (±{tolerance})");
}

/// Count page objects in a PDF produced by the crate.
pub fn pdf_page_count(bytes: &[u8]) -> usize {
    let text = String::from_utf8_lossy(bytes);
    text.matches("/Type /Page").count() - text.matches("/Type /Pages").count()
}
