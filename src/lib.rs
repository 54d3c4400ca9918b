pub mod badge;
pub mod config;
mod error;
pub mod layout;
pub mod model;
mod pdf;

pub use config::Config;
pub use error::Error;
pub use pdf::write_document;

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

use image::RgbaImage;

use model::{CompositedBadge, ImageKey, PixelGeometry};

struct Sheet {
    geometry: PixelGeometry,
    badges: BTreeMap<ImageKey, CompositedBadge>,
    pages: Vec<RgbaImage>,
}

// geometry is checked before any image is touched
fn build_sheet(config: &Config) -> Result<Sheet, Error> {
    let geometry = config.pixel_geometry()?;
    let page_layout = layout::PageLayout::new(&geometry)?;

    log::info!("Processing images...");
    let badges = badge::composite_all(&config.images, &geometry.badge, config.border_color()?)?;
    let pages = layout::layout_pages(&badges, &page_layout, &config.output.pages)?;
    Ok(Sheet {
        geometry,
        badges,
        pages,
    })
}

/// Validate geometry, composite every badge, then lay out every page, in that order.
pub fn render_pages(config: &Config) -> Result<Vec<RgbaImage>, Error> {
    build_sheet(config).map(|sheet| sheet.pages)
}

/// Render the sheet described by `config_path` into a PDF at `output`.
/// When `badge_dir` is given, each composited badge is also saved there as `<key>.png`.
pub fn generate(config_path: &Path, output: &Path, badge_dir: Option<&Path>) -> Result<(), Error> {
    let t0 = Instant::now();

    log::info!("Loading config...");
    let config = Config::load(config_path)?;
    let t_config = t0.elapsed();

    let sheet = build_sheet(&config)?;
    if let Some(dir) = badge_dir {
        badge::save_badges(&sheet.badges, dir)?;
    }
    let t_render = t0.elapsed();

    log::info!("Writing pdf...");
    let bytes = write_document(
        &sheet.pages,
        sheet.geometry.page_width_mm,
        sheet.geometry.page_height_mm,
    );
    std::fs::write(output, &bytes).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", e, output.display()),
        ))
    })?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: config={:.1}ms, render={:.1}ms, write={:.1}ms, total={:.1}ms (output {} bytes)",
        t_config.as_secs_f64() * 1000.0,
        (t_render - t_config).as_secs_f64() * 1000.0,
        (t_total - t_render).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        bytes.len(),
    );

    Ok(())
}
