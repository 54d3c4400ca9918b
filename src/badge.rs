use std::collections::BTreeMap;
use std::path::Path;

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, ImageReader, Luma, Rgba, RgbaImage};
use rayon::prelude::*;

use crate::config::{ImageSpec, parse_color};
use crate::error::Error;
use crate::model::{BadgeColors, BadgeGeometry, CompositedBadge, ImageKey};

// discs are drawn this many times larger, then downsampled for a soft edge
pub(crate) const SUPERSAMPLE: u32 = 4;

fn io_error(e: std::io::Error, path: &Path) -> Error {
    Error::Io(std::io::Error::new(
        e.kind(),
        format!("{}: {}", e, path.display()),
    ))
}

/// Decode an artwork file, guessing the format from its contents.
pub fn load_source(path: &Path) -> Result<DynamicImage, Error> {
    let reader = ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|e| io_error(e, path))?;
    reader.decode().map_err(|source| Error::Image {
        path: path.to_path_buf(),
        source,
    })
}

/// Coverage mask of a disc filling a `diameter`-sized square, with an antialiased edge.
pub fn fuzzy_disc(diameter: u32) -> GrayImage {
    let big = diameter * SUPERSAMPLE;
    let radius = big as f64 / 2.0;
    let crisp = GrayImage::from_fn(big, big, |x, y| {
        let dx = x as f64 + 0.5 - radius;
        let dy = y as f64 + 0.5 - radius;
        if dx * dx + dy * dy <= radius * radius {
            Luma([255])
        } else {
            Luma([0])
        }
    });
    imageops::resize(&crisp, diameter, diameter, FilterType::Lanczos3)
}

/// Solid disc of `color` on a transparent square. Colour channels stay constant
/// so the soft edge fades out without darkening.
pub fn color_disc(diameter: u32, color: Rgba<u8>) -> RgbaImage {
    let mask = fuzzy_disc(diameter);
    let [r, g, b, a] = color.0;
    RgbaImage::from_fn(diameter, diameter, |x, y| {
        let coverage = mask.get_pixel(x, y)[0] as u32;
        Rgba([r, g, b, ((coverage * a as u32 + 127) / 255) as u8])
    })
}

/// Clip `img` to `mask` without discarding transparency already in `img`.
fn clip_alpha(img: &mut RgbaImage, mask: &GrayImage) {
    for (px, m) in img.pixels_mut().zip(mask.pixels()) {
        px[3] = px[3].min(m[0]);
    }
}

fn premultiply(img: &mut RgbaImage) {
    for px in img.pixels_mut() {
        let a = px[3] as u32;
        for c in 0..3 {
            px[c] = ((px[c] as u32 * a + 127) / 255) as u8;
        }
    }
}

fn unpremultiply(img: &mut RgbaImage) {
    for px in img.pixels_mut() {
        let a = px[3] as u32;
        for c in 0..3 {
            px[c] = match a {
                0 => 0,
                _ => ((px[c] as u32 * 255 + a / 2) / a).min(255) as u8,
            };
        }
    }
}

/// Resample in premultiplied space so transparent pixels lend no colour to visible edges.
fn resize_premultiplied(mut source: RgbaImage, diameter: u32) -> RgbaImage {
    premultiply(&mut source);
    let mut out = imageops::resize(&source, diameter, diameter, FilterType::CatmullRom);
    unpremultiply(&mut out);
    out
}

/// Paste `top` at (x, y), using its own alpha as the blend mask on every channel.
fn paste_masked(base: &mut RgbaImage, top: &RgbaImage, x: u32, y: u32) {
    for (tx, ty, src) in top.enumerate_pixels() {
        let (bx, by) = (x + tx, y + ty);
        if bx >= base.width() || by >= base.height() {
            continue;
        }
        let a = src[3] as u32;
        let dst = base.get_pixel_mut(bx, by);
        for c in 0..4 {
            dst[c] = ((src[c] as u32 * a + dst[c] as u32 * (255 - a) + 127) / 255) as u8;
        }
    }
}

/// Build one badge: artwork clipped to a circle, over a coloured disc and optional border ring.
pub fn composite(
    source: &DynamicImage,
    origin: &Path,
    geometry: &BadgeGeometry,
    colors: &BadgeColors,
) -> Result<CompositedBadge, Error> {
    let (width, height) = (source.width(), source.height());
    if width != height {
        return Err(Error::Shape {
            path: origin.to_path_buf(),
            width,
            height,
        });
    }

    let diameter = geometry.image_diameter;
    let mut art = resize_premultiplied(source.to_rgba8(), diameter);
    clip_alpha(&mut art, &fuzzy_disc(diameter));

    let margin = color_disc(geometry.background_diameter(), colors.background);
    let mut base = if geometry.border_width > 0 {
        let mut border = color_disc(geometry.full_width(), colors.border);
        paste_masked(&mut border, &margin, geometry.border_width, geometry.border_width);
        border
    } else {
        margin
    };

    let full = geometry.full_width();
    let mut foreground = RgbaImage::new(full, full);
    let inset = geometry.inset() as i64;
    imageops::replace(&mut foreground, &art, inset, inset);
    imageops::overlay(&mut base, &foreground, 0, 0);
    Ok(base)
}

/// Composite every configured image. Sources are independent, so this runs in parallel;
/// any failure aborts the whole set, reported for the first failing key in key order.
pub fn composite_all(
    images: &BTreeMap<ImageKey, ImageSpec>,
    geometry: &BadgeGeometry,
    border: Rgba<u8>,
) -> Result<BTreeMap<ImageKey, CompositedBadge>, Error> {
    let results: Vec<Result<(ImageKey, CompositedBadge), Error>> = images
        .par_iter()
        .map(|(key, spec)| {
            let colors = BadgeColors {
                background: parse_color(&spec.background)?,
                border,
            };
            let source = load_source(&spec.filename)?;
            let badge = composite(&source, &spec.filename, geometry, &colors)?;
            log::debug!(
                "Composited {key} from {} ({}x{} source)",
                spec.filename.display(),
                source.width(),
                source.height()
            );
            Ok((key.clone(), badge))
        })
        .collect();
    results.into_iter().collect()
}

/// Write each badge to `<dir>/<key>.png`.
pub fn save_badges(badges: &BTreeMap<ImageKey, CompositedBadge>, dir: &Path) -> Result<(), Error> {
    std::fs::create_dir_all(dir).map_err(|e| io_error(e, dir))?;
    for (key, badge) in badges {
        let path = dir.join(format!("{key}.png"));
        badge.save(&path).map_err(|source| Error::Image { path, source })?;
    }
    Ok(())
}
