use std::collections::BTreeMap;

use image::{Rgba, RgbaImage, imageops};

use crate::error::Error;
use crate::model::{CompositedBadge, Grid, ImageKey, PixelGeometry};

const PAGE_FILL: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Split `n` into `groups` near-equal parts; the first `n % groups` parts get one extra.
///
/// `groups == 0` yields an empty list, and `groups > n` yields trailing zeros.
pub fn int_groups(n: usize, groups: usize) -> Vec<usize> {
    if groups == 0 {
        return Vec::new();
    }
    let (d, r) = (n / groups, n % groups);
    let mut out = vec![d + 1; r];
    out.resize(groups, d);
    out
}

/// Grid cell size and the offset that centres a badge inside its cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellGeometry {
    pub cell_width: u32,
    pub cell_height: u32,
    pub col_offset: u32,
    pub row_offset: u32,
}

#[derive(Clone, Debug)]
pub struct PageLayout {
    pub grid: Grid,
    pub page_width: u32,
    pub page_height: u32,
    pub full_width: u32,
    pub cells: CellGeometry,
}

impl PageLayout {
    /// Derive cell geometry and check badge clearance. Fails with `Error::Layout`
    /// when the tightest gap between neighbouring badges is below the minimum.
    pub fn new(geometry: &PixelGeometry) -> Result<Self, Error> {
        let grid = geometry.grid;
        let badge = geometry.badge;
        let full_width = badge.image_diameter as i64
            + 2 * (badge.margin_width as i64 + badge.border_width as i64);
        let margin = geometry.page_margin as i64;

        let cell_width = (geometry.page_width as i64 - 2 * margin) / grid.columns as i64;
        let cell_height = (geometry.page_height as i64 - 2 * margin) / grid.rows as i64;

        let worst_spacing = cell_width.min(cell_height) - full_width;
        if worst_spacing < geometry.min_spacing as i64 {
            return Err(Error::Layout {
                wanted_mm: geometry.min_spacing_mm,
                actual_mm: worst_spacing as f64 / geometry.px_per_mm,
            });
        }

        // worst_spacing >= 0 here, so every term below is non-negative
        let cells = CellGeometry {
            cell_width: cell_width as u32,
            cell_height: cell_height as u32,
            col_offset: ((cell_width - full_width) / 2 + margin) as u32,
            row_offset: ((cell_height - full_width) / 2 + margin) as u32,
        };
        log::debug!(
            "Grid {}x{}: cell={}x{}px, offset=({}, {})px, spacing={}px",
            grid.columns,
            grid.rows,
            cells.cell_width,
            cells.cell_height,
            cells.col_offset,
            cells.row_offset,
            worst_spacing,
        );

        Ok(Self {
            grid,
            page_width: geometry.page_width,
            page_height: geometry.page_height,
            full_width: full_width as u32,
            cells,
        })
    }

    /// Top-left pixel of the badge in grid cell (column, row).
    pub fn position(&self, column: u32, row: u32) -> (u32, u32) {
        (
            column * self.cells.cell_width + self.cells.col_offset,
            row * self.cells.cell_height + self.cells.row_offset,
        )
    }

    /// Render page `index` (0-based). Every cell is filled by spreading the
    /// requested keys as evenly as possible, in request order.
    pub fn render_page(
        &self,
        index: usize,
        keys: &[ImageKey],
        badges: &BTreeMap<ImageKey, CompositedBadge>,
    ) -> Result<RgbaImage, Error> {
        let capacity = self.grid.capacity();
        if keys.len() > capacity {
            return Err(Error::Capacity {
                page: index + 1,
                capacity,
                keys: keys.to_vec(),
            });
        }
        let placed = keys
            .iter()
            .map(|key| {
                badges.get(key).ok_or_else(|| Error::MissingKey {
                    page: index + 1,
                    key: key.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut page = RgbaImage::from_pixel(self.page_width, self.page_height, PAGE_FILL);
        let (mut column, mut row) = (0, 0);
        for (count, badge) in int_groups(capacity, placed.len()).into_iter().zip(placed) {
            for _ in 0..count {
                let (x, y) = self.position(column, row);
                imageops::overlay(&mut page, badge, x as i64, y as i64);

                column += 1;
                if column == self.grid.columns {
                    column = 0;
                    row += 1;
                }
            }
        }
        Ok(page)
    }
}

/// Render every requested page in order. Any bad page aborts the whole run.
pub fn layout_pages(
    badges: &BTreeMap<ImageKey, CompositedBadge>,
    layout: &PageLayout,
    pages: &[Vec<ImageKey>],
) -> Result<Vec<RgbaImage>, Error> {
    pages
        .iter()
        .enumerate()
        .map(|(i, keys)| {
            log::info!("Generating page {}/{}...", i + 1, pages.len());
            layout.render_page(i, keys, badges)
        })
        .collect()
}
