mod common;

use std::collections::BTreeMap;
use std::path::Path;

use badge_sheet::Error;
use badge_sheet::badge::{color_disc, composite, composite_all, fuzzy_disc, load_source};
use badge_sheet::config::ImageSpec;
use badge_sheet::model::{BadgeColors, BadgeGeometry};
use image::{DynamicImage, Rgba, RgbaImage};

use common::{BLUE, GREEN, RED, WHITE, assert_close, solid};

const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

fn colors(background: Rgba<u8>) -> BadgeColors {
    BadgeColors {
        background,
        border: BLACK,
    }
}

fn bordered() -> BadgeGeometry {
    BadgeGeometry {
        image_diameter: 40,
        margin_width: 10,
        border_width: 3,
    }
}

#[test]
fn non_square_source_is_rejected() {
    let source = DynamicImage::ImageRgba8(solid(100, 80, RED));
    let err = composite(&source, Path::new("art/wide.png"), &bordered(), &colors(BLUE))
        .expect_err("non-square source must fail");
    match err {
        Error::Shape {
            path,
            width,
            height,
        } => {
            assert_eq!(path, Path::new("art/wide.png"));
            assert_eq!((width, height), (100, 80));
        }
        other => panic!("expected Shape error, got {other}"),
    }
}

#[test]
fn badge_has_full_width_and_layers() {
    let geometry = bordered();
    let source = DynamicImage::ImageRgba8(solid(100, 100, RED));
    let badge = composite(&source, Path::new("red.png"), &geometry, &colors(BLUE)).unwrap();

    let full = geometry.full_width();
    assert_eq!(full, 66);
    assert_eq!(badge.dimensions(), (full, full));

    // artwork in the middle
    assert_close(*badge.get_pixel(full / 2, full / 2), RED, 2, "centre");
    // margin ring, well away from any disc edge
    assert_close(*badge.get_pixel(full / 2, 8), BLUE, 2, "margin ring");
    // border ring above the margin disc
    let border = badge.get_pixel(full / 2, 2);
    assert!(border[0] < 5 && border[1] < 5 && border[2] < 5, "border: {border:?}");
    assert!(border[3] > 200, "border alpha: {border:?}");
    // outside the outer disc
    assert_eq!(badge.get_pixel(0, 0)[3], 0);
    assert_eq!(badge.get_pixel(full - 1, full - 1)[3], 0);
}

#[test]
fn zero_border_uses_background_disc_as_base() {
    let geometry = BadgeGeometry {
        image_diameter: 40,
        margin_width: 10,
        border_width: 0,
    };
    let source = DynamicImage::ImageRgba8(solid(64, 64, RED));
    let badge = composite(&source, Path::new("red.png"), &geometry, &colors(GREEN)).unwrap();

    assert_eq!(badge.dimensions(), (60, 60));
    assert_close(*badge.get_pixel(30, 5), GREEN, 2, "margin ring");
    assert_eq!(badge.get_pixel(0, 0)[3], 0);
}

#[test]
fn source_transparency_is_kept() {
    let source = DynamicImage::ImageRgba8(solid(50, 50, Rgba([255, 0, 0, 0])));
    let badge = composite(&source, Path::new("clear.png"), &bordered(), &colors(BLUE)).unwrap();
    // transparent artwork shows the background disc through it
    assert_close(*badge.get_pixel(33, 33), BLUE, 2, "centre");
}

#[test]
fn transparent_artwork_edges_keep_their_colour() {
    // opaque white left half, fully transparent black right half
    let source = DynamicImage::ImageRgba8(RgbaImage::from_fn(80, 80, |x, _| {
        if x < 40 { WHITE } else { Rgba([0, 0, 0, 0]) }
    }));
    let geometry = BadgeGeometry {
        image_diameter: 20,
        margin_width: 0,
        border_width: 0,
    };
    let badge = composite(&source, Path::new("half.png"), &geometry, &colors(WHITE)).unwrap();
    for x in 2..18 {
        assert_close(*badge.get_pixel(x, 10), WHITE, 1, &format!("row 10, x={x}"));
    }
}

#[test]
fn artwork_is_clipped_to_a_circle() {
    let geometry = BadgeGeometry {
        image_diameter: 40,
        margin_width: 0,
        border_width: 0,
    };
    let source = DynamicImage::ImageRgba8(solid(40, 40, RED));
    let badge = composite(&source, Path::new("red.png"), &geometry, &colors(BLUE)).unwrap();
    assert_eq!(badge.get_pixel(0, 0)[3], 0);
    assert_eq!(badge.get_pixel(39, 0)[3], 0);
    assert_close(*badge.get_pixel(20, 20), RED, 2, "centre");
}

#[test]
fn compositing_is_deterministic() {
    let source = DynamicImage::ImageRgba8(image::RgbaImage::from_fn(90, 90, |x, y| {
        Rgba([(x * 2) as u8, (y * 2) as u8, 128, 200])
    }));
    let a = composite(&source, Path::new("g.png"), &bordered(), &colors(GREEN)).unwrap();
    let b = composite(&source, Path::new("g.png"), &bordered(), &colors(GREEN)).unwrap();
    assert_eq!(a.as_raw(), b.as_raw());
}

#[test]
fn fuzzy_disc_is_soft_round_and_symmetric() {
    let mask = fuzzy_disc(32);
    assert_eq!(mask.dimensions(), (32, 32));
    assert_eq!(mask.get_pixel(16, 16)[0], 255);
    assert_eq!(mask.get_pixel(0, 0)[0], 0);

    // the edge is antialiased, not a hard step
    let edge: Vec<u8> = (0..32).map(|x| mask.get_pixel(x, 16)[0]).collect();
    assert!(edge.iter().any(|&v| v > 0 && v < 255), "no soft edge: {edge:?}");

    for y in 0..32 {
        for x in 0..32 {
            let v = mask.get_pixel(x, y)[0];
            assert!(v.abs_diff(mask.get_pixel(31 - x, y)[0]) <= 1, "mirror x at ({x}, {y})");
            assert!(v.abs_diff(mask.get_pixel(x, 31 - y)[0]) <= 1, "mirror y at ({x}, {y})");
        }
    }
}

#[test]
fn color_disc_keeps_colour_constant() {
    let disc = color_disc(24, GREEN);
    for px in disc.pixels() {
        assert_eq!(&px.0[..3], &GREEN.0[..3]);
    }
    assert_eq!(disc.get_pixel(12, 12)[3], 255);
    assert_eq!(disc.get_pixel(0, 0)[3], 0);
}

#[test]
fn missing_source_is_an_io_error() {
    let err = load_source(Path::new("tests/output/no-such-dir/missing.png")).unwrap_err();
    match err {
        Error::Io(e) => {
            assert_eq!(e.kind(), std::io::ErrorKind::NotFound);
            assert!(e.to_string().contains("missing.png"));
        }
        other => panic!("expected Io error, got {other}"),
    }
}

#[test]
fn corrupt_source_is_an_image_error() {
    let dir = common::output_dir("badge_corrupt");
    let path = dir.join("broken.png");
    std::fs::write(&path, b"\x89PNG\r\n\x1a\nnot really a png").unwrap();
    assert!(matches!(load_source(&path), Err(Error::Image { .. })));
}

#[test]
fn first_failing_key_is_reported() {
    let dir = common::output_dir("badge_error_order");
    solid(30, 20, RED).save(dir.join("wide.png")).unwrap();
    let images: BTreeMap<String, ImageSpec> = [
        ("a", dir.join("wide.png")),
        ("b", dir.join("missing.png")),
        ("c", dir.join("also-missing.png")),
    ]
    .into_iter()
    .map(|(key, filename)| {
        let spec = ImageSpec {
            filename,
            background: "white".to_string(),
        };
        (key.to_string(), spec)
    })
    .collect();

    for _ in 0..20 {
        match composite_all(&images, &bordered(), BLACK) {
            Err(Error::Shape { width, height, .. }) => assert_eq!((width, height), (30, 20)),
            other => panic!("expected Shape error for key a, got {other:?}"),
        }
    }
}
