use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use image::Rgba;
use serde::Deserialize;

use crate::badge::SUPERSAMPLE;
use crate::error::Error;
use crate::model::{BadgeGeometry, Grid, ImageKey, PixelGeometry};

pub(crate) const MM_PER_INCH: f64 = 25.4;

const LETTER_WIDTH_MM: f64 = 8.5 * MM_PER_INCH;
const LETTER_HEIGHT_MM: f64 = 11.0 * MM_PER_INCH;

// largest raster side we allocate, including the supersampled badge disc
const MAX_RASTER_SIDE: u64 = 1 << 15;

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageSpec {
    pub filename: PathBuf,
    #[serde(alias = "background_color")]
    pub background: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputSpec {
    pub rows: u32,
    pub columns: u32,

    pub dpi: Option<f64>,
    pub px_per_mm: Option<f64>,

    pub image_diameter_mm: f64,
    pub margin_width_mm: f64,
    #[serde(default)]
    pub border_width_mm: f64,
    #[serde(default = "default_border_color")]
    pub border_color: String,
    pub min_spacing_mm: f64,
    pub page_margin_mm: f64,

    #[serde(default = "default_page_width")]
    pub page_width_mm: f64,
    #[serde(default = "default_page_height")]
    pub page_height_mm: f64,

    #[serde(default)]
    pub pages: Vec<Vec<ImageKey>>,
}

fn default_border_color() -> String {
    "#000000".to_string()
}

fn default_page_width() -> f64 {
    LETTER_WIDTH_MM
}

fn default_page_height() -> f64 {
    LETTER_HEIGHT_MM
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub images: BTreeMap<ImageKey, ImageSpec>,
    pub output: OutputSpec,
}

impl Config {
    /// Parse and validate a TOML document. Image filenames are kept as written.
    pub fn from_toml_str(text: &str) -> Result<Self, Error> {
        let config: Config = toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a config file; relative image filenames resolve against its directory.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {}", e, path.display()),
            ))
        })?;
        let mut config = Self::from_toml_str(&text)?;
        let base = path.parent().unwrap_or(Path::new(""));
        for spec in config.images.values_mut() {
            if spec.filename.is_relative() {
                spec.filename = base.join(&spec.filename);
            }
        }
        Ok(config)
    }

    fn validate(&self) -> Result<(), Error> {
        let out = &self.output;
        if out.rows == 0 || out.columns == 0 {
            return Err(Error::Config(format!(
                "grid must have at least one row and column (got {}x{})",
                out.rows, out.columns
            )));
        }

        let lengths = [
            ("image_diameter_mm", out.image_diameter_mm),
            ("margin_width_mm", out.margin_width_mm),
            ("border_width_mm", out.border_width_mm),
            ("min_spacing_mm", out.min_spacing_mm),
            ("page_margin_mm", out.page_margin_mm),
            ("page_width_mm", out.page_width_mm),
            ("page_height_mm", out.page_height_mm),
        ];
        for (name, value) in lengths {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::Config(format!("{name} must be >= 0 (got {value})")));
            }
        }

        let px_per_mm = self.px_per_mm()?;
        if mm_to_px(out.image_diameter_mm, px_per_mm) == 0 {
            return Err(Error::Config(format!(
                "image_diameter_mm {} is smaller than one pixel at {px_per_mm} px/mm",
                out.image_diameter_mm
            )));
        }

        let geometry = self.pixel_geometry()?;
        let badge = geometry.badge;
        let full_width =
            badge.image_diameter as u64 + 2 * (badge.margin_width as u64 + badge.border_width as u64);
        let rasters = [
            ("badge", full_width * SUPERSAMPLE as u64),
            ("page width", geometry.page_width as u64),
            ("page height", geometry.page_height as u64),
            ("page margin", geometry.page_margin as u64),
            ("min spacing", geometry.min_spacing as u64),
        ];
        for (name, px) in rasters {
            if px > MAX_RASTER_SIDE {
                return Err(Error::Config(format!(
                    "{name} is too large at {px_per_mm} px/mm ({px}px, limit {MAX_RASTER_SIDE}px)"
                )));
            }
        }

        parse_color(&out.border_color)?;
        for spec in self.images.values() {
            parse_color(&spec.background)?;
        }

        for (i, keys) in out.pages.iter().enumerate() {
            if let Some(key) = keys.iter().find(|k| !self.images.contains_key(*k)) {
                return Err(Error::MissingKey {
                    page: i + 1,
                    key: key.clone(),
                });
            }
        }
        Ok(())
    }

    /// Pixels per millimetre. A `dpi` setting is truncated to whole pixels per millimetre.
    pub fn px_per_mm(&self) -> Result<f64, Error> {
        let ppm = match (self.output.dpi, self.output.px_per_mm) {
            (Some(dpi), None) => (dpi / MM_PER_INCH).trunc(),
            (None, Some(ppm)) => ppm,
            (Some(_), Some(_)) => {
                return Err(Error::Config(
                    "set only one of output.dpi and output.px_per_mm".into(),
                ));
            }
            (None, None) => {
                return Err(Error::Config(
                    "missing resolution: set output.dpi or output.px_per_mm".into(),
                ));
            }
        };
        if !ppm.is_finite() || ppm <= 0.0 {
            return Err(Error::Config(format!(
                "resolution must be at least 1 px/mm (got {ppm})"
            )));
        }
        Ok(ppm)
    }

    pub fn border_color(&self) -> Result<Rgba<u8>, Error> {
        parse_color(&self.output.border_color)
    }

    pub fn pixel_geometry(&self) -> Result<PixelGeometry, Error> {
        let out = &self.output;
        let ppm = self.px_per_mm()?;
        Ok(PixelGeometry {
            px_per_mm: ppm,
            badge: BadgeGeometry {
                image_diameter: mm_to_px(out.image_diameter_mm, ppm),
                margin_width: mm_to_px(out.margin_width_mm, ppm),
                border_width: mm_to_px(out.border_width_mm, ppm),
            },
            grid: Grid {
                rows: out.rows,
                columns: out.columns,
            },
            page_width: mm_to_px(out.page_width_mm, ppm),
            page_height: mm_to_px(out.page_height_mm, ppm),
            page_margin: mm_to_px(out.page_margin_mm, ppm),
            min_spacing: mm_to_px(out.min_spacing_mm, ppm),
            min_spacing_mm: out.min_spacing_mm,
            page_width_mm: out.page_width_mm as f32,
            page_height_mm: out.page_height_mm as f32,
        })
    }
}

/// Millimetres to whole pixels, truncating toward zero.
pub fn mm_to_px(mm: f64, px_per_mm: f64) -> u32 {
    (mm * px_per_mm) as u32
}

fn hex_nibble(c: u8) -> Option<u8> {
    (c as char).to_digit(16).map(|d| d as u8)
}

fn parse_hex(hex: &str) -> Option<Rgba<u8>> {
    let bytes = hex.as_bytes();
    match bytes.len() {
        3 => {
            let mut out = [0u8, 0, 0, 255];
            for (i, &c) in bytes.iter().enumerate() {
                out[i] = hex_nibble(c)? * 17;
            }
            Some(Rgba(out))
        }
        6 | 8 => {
            let mut out = [0u8, 0, 0, 255];
            for (i, pair) in bytes.chunks(2).enumerate() {
                out[i] = hex_nibble(pair[0])? << 4 | hex_nibble(pair[1])?;
            }
            Some(Rgba(out))
        }
        _ => None,
    }
}

fn named_color(name: &str) -> Option<[u8; 3]> {
    Some(match name {
        "black" => [0, 0, 0],
        "white" => [255, 255, 255],
        "red" => [255, 0, 0],
        "lime" => [0, 255, 0],
        "green" => [0, 128, 0],
        "blue" => [0, 0, 255],
        "yellow" => [255, 255, 0],
        "cyan" | "aqua" => [0, 255, 255],
        "magenta" | "fuchsia" => [255, 0, 255],
        "gray" | "grey" => [128, 128, 128],
        "silver" => [192, 192, 192],
        "maroon" => [128, 0, 0],
        "olive" => [128, 128, 0],
        "navy" => [0, 0, 128],
        "purple" => [128, 0, 128],
        "teal" => [0, 128, 128],
        "orange" => [255, 165, 0],
        "pink" => [255, 192, 203],
        _ => return None,
    })
}

/// Parse `#rgb`, `#rrggbb`, `#rrggbbaa` or a basic CSS colour name.
pub fn parse_color(val: &str) -> Result<Rgba<u8>, Error> {
    let val = val.trim();
    let parsed = match val.strip_prefix('#') {
        Some(hex) => parse_hex(hex),
        None => named_color(&val.to_ascii_lowercase()).map(|[r, g, b]| Rgba([r, g, b, 255])),
    };
    parsed.ok_or_else(|| Error::Config(format!("invalid color: {val:?}")))
}
