use image::{Rgba, RgbaImage};

/// Name of a configured artwork entry, as referenced from page request lists.
pub type ImageKey = String;

/// A finished badge: a square RGBA raster of side `BadgeGeometry::full_width`.
pub type CompositedBadge = RgbaImage;

/// Pixel sizes of one badge. All badges in a run share a single geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BadgeGeometry {
    pub image_diameter: u32,
    pub margin_width: u32, // solid-colour ring around the artwork
    pub border_width: u32, // outer ring, 0 = no border layer
}

impl BadgeGeometry {
    /// Diameter of the solid background disc (artwork plus margin ring).
    pub fn background_diameter(&self) -> u32 {
        self.image_diameter + 2 * self.margin_width
    }

    pub fn full_width(&self) -> u32 {
        self.image_diameter + 2 * (self.margin_width + self.border_width)
    }

    /// Offset of the artwork's top-left corner inside the badge.
    pub fn inset(&self) -> u32 {
        self.margin_width + self.border_width
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BadgeColors {
    pub background: Rgba<u8>,
    pub border: Rgba<u8>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Grid {
    pub rows: u32,
    pub columns: u32,
}

impl Grid {
    pub fn capacity(&self) -> usize {
        self.rows as usize * self.columns as usize
    }
}

/// Every size the renderer needs, resolved from millimetres to pixels once.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelGeometry {
    pub px_per_mm: f64,
    pub badge: BadgeGeometry,
    pub grid: Grid,
    pub page_width: u32,
    pub page_height: u32,
    pub page_margin: u32,
    pub min_spacing: u32,
    pub min_spacing_mm: f64, // kept for error messages
    pub page_width_mm: f32,
    pub page_height_mm: f32,
}
