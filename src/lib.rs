//! Morse Prominence
//!
//! Computes topographic prominence from Digital Elevation Model (DEM) rasters.
//! The raster is turned into a 4-connected neighbor graph and the graph is
//! swept with a union-find to obtain its Morse persistence; the persistence
//! of each maximum is the prominence of that peak.
//!
//! ```no_run
//! use morse_prominence::{ElevationGrid, ProminenceCalculator, ProminenceConfig};
//!
//! let grid = ElevationGrid::load("dem.tif", 1)?;
//! let peaks = ProminenceCalculator::new(&grid).calculate(&ProminenceConfig::default())?;
//! for peak in peaks.iter().take(10) {
//!     println!("{}", peak);
//! }
//! # Ok::<(), morse_prominence::ProminenceError>(())
//! ```

pub mod config;
pub mod graph;
pub mod grid;
pub mod morse;
pub mod output;
pub mod peak;
pub mod prominence;
pub mod union_find;

pub use config::ProminenceConfig;
pub use graph::GridGraph;
pub use grid::{Cell, ElevationGrid, GeoTransform};
pub use morse::{persistence, Direction, FiltrationStep, MorseComplex, MorsePersistence};
pub use peak::Peak;
pub use prominence::ProminenceCalculator;

use thiserror::Error;

/// Errors that can occur during prominence calculation
#[derive(Debug, Error)]
pub enum ProminenceError {
    /// I/O error when reading or writing files
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TIFF decoding error.
    #[error("TIFF decode error: {0}")]
    TiffDecode(#[from] tiff::TiffError),

    /// JSON (de)serialization error for config files and reports.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid grid dimensions
    #[error("Invalid grid dimensions: {0}")]
    InvalidDimensions(String),

    /// Invalid elevation data
    #[error("Invalid elevation at row {row}, col {col}")]
    InvalidElevation {
        /// Row of the offending cell.
        row: usize,
        /// Column of the offending cell.
        col: usize,
    },

    /// Requested band does not exist in the raster.
    #[error("Band {band} out of range (raster has {available} band(s))")]
    InvalidBand {
        /// Requested 1-based band.
        band: usize,
        /// Number of bands in the raster.
        available: usize,
    },

    /// File extension is not one of the supported raster formats.
    #[error("Unsupported raster format: {0}")]
    UnsupportedFormat(String),

    /// A CSV cell could not be parsed as a number.
    #[error("Parse error on line {line}: {message}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// What went wrong.
        message: String,
    },

    /// Rejected configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for prominence calculations
pub type Result<T> = std::result::Result<T, ProminenceError>;
