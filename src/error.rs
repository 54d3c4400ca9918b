use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot decode image {}: {source}", .path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("invalid config: {0}")]
    Config(String),
    #[error("{} is not square: ({width}, {height})", .path.display())]
    Shape {
        path: PathBuf,
        width: u32,
        height: u32,
    },
    #[error("page {page} references unknown image {key:?}")]
    MissingKey { page: usize, key: String },
    #[error("Buttons are too close together (want {wanted_mm}mm, got {actual_mm}mm)")]
    Layout { wanted_mm: f64, actual_mm: f64 },
    #[error("Too many buttons on page {page} (need <={capacity}, got {}): {keys:?}", .keys.len())]
    Capacity {
        page: usize,
        capacity: usize,
        keys: Vec<String>,
    },
}
