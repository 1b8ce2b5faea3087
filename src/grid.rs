use crate::{ProminenceError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;
use tracing::{debug, info, warn};

/// A single raster cell. `index` is the flattened `x + width * y` position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub elevation: f64,
    pub row: usize,
    pub col: usize,
    pub index: usize,
}

impl Cell {
    pub fn new(elevation: f64, row: usize, col: usize, width: usize) -> Self {
        Cell {
            elevation,
            row,
            col,
            index: row * width + col,
        }
    }
}

/// Affine pixel-to-map transform read from GeoTIFF tiepoint and pixel scale tags.
///
/// Row 0 is the top (north) edge; rows grow downwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub origin_y: f64,
    pub pixel_width: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    /// Map coordinates of the center of a pixel.
    pub fn pixel_center(&self, row: usize, col: usize) -> (f64, f64) {
        (
            self.origin_x + (col as f64 + 0.5) * self.pixel_width,
            self.origin_y - (row as f64 + 0.5) * self.pixel_height,
        )
    }
}

/// Elevation raster in row-major order.
#[derive(Debug, Clone)]
pub struct ElevationGrid {
    data: Vec<f64>,
    pub width: usize,
    pub height: usize,
    geotransform: Option<GeoTransform>,
}

impl ElevationGrid {
    pub fn new(grid: Vec<Vec<f64>>) -> Result<Self> {
        let height = grid.len();
        if height == 0 {
            return Err(ProminenceError::InvalidDimensions("grid has no rows".into()));
        }

        let width = grid[0].len();
        if width == 0 {
            return Err(ProminenceError::InvalidDimensions("grid has no columns".into()));
        }

        if let Some(row) = grid.iter().position(|r| r.len() != width) {
            return Err(ProminenceError::InvalidDimensions(format!(
                "row {} has {} values, expected {}",
                row,
                grid[row].len(),
                width
            )));
        }

        Self::from_raw(width, height, grid.into_iter().flatten().collect())
    }

    /// Build a grid from row-major data.
    pub fn from_raw(width: usize, height: usize, data: Vec<f64>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(ProminenceError::InvalidDimensions(format!(
                "{} x {} grid is empty",
                width, height
            )));
        }
        if width.checked_mul(height) != Some(data.len()) {
            return Err(ProminenceError::InvalidDimensions(format!(
                "{} values do not fill a {} x {} grid",
                data.len(),
                width,
                height
            )));
        }
        if let Some(i) = data.iter().position(|v| !v.is_finite()) {
            return Err(ProminenceError::InvalidElevation {
                row: i / width,
                col: i % width,
            });
        }

        Ok(ElevationGrid {
            data,
            width,
            height,
            geotransform: None,
        })
    }

    pub fn with_geotransform(mut self, geotransform: GeoTransform) -> Self {
        self.geotransform = Some(geotransform);
        self
    }

    pub fn geotransform(&self) -> Option<&GeoTransform> {
        self.geotransform.as_ref()
    }

    /// Load a raster, picking the reader from the file extension.
    ///
    /// `band` is 1-based. CSV and raw binary rasters hold a single band.
    pub fn load<P: AsRef<Path>>(path: P, band: usize) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("tif") | Some("tiff") => Self::load_geotiff(path, band),
            Some("csv") => {
                Self::check_single_band(band)?;
                Self::load_csv(path)
            }
            Some("bin") | Some("raw") | Some("hgt") => {
                Self::check_single_band(band)?;
                Self::load_binary(path, None)
            }
            _ => Err(ProminenceError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Only band 1 exists in a single-band raster.
    pub fn check_single_band(band: usize) -> Result<()> {
        if band == 1 {
            Ok(())
        } else {
            Err(ProminenceError::InvalidBand { band, available: 1 })
        }
    }

    /// Load a headerless little-endian `i16` DEM.
    ///
    /// Without explicit dimensions they are guessed from the file size.
    pub fn load_binary<P: AsRef<Path>>(path: P, dimensions: Option<(usize, usize)>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading binary file: {}", path.display());
        let mut file = File::open(path)?;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;

        if buffer.len() % 2 != 0 {
            return Err(ProminenceError::InvalidDimensions(format!(
                "{} bytes is not a whole number of i16 samples",
                buffer.len()
            )));
        }
        let total_cells = buffer.len() / 2;

        let (width, height) = match dimensions {
            Some(dims) => dims,
            None => Self::detect_dimensions(total_cells)?,
        };
        if width.checked_mul(height) != Some(total_cells) {
            return Err(ProminenceError::InvalidDimensions(format!(
                "file holds {} cells, expected {} x {}",
                total_cells, width, height
            )));
        }

        // Voids (-32768) and other negatives are treated as sea level.
        let data = buffer
            .chunks_exact(2)
            .map(|chunk| i16::from_le_bytes([chunk[0], chunk[1]]).max(0) as f64)
            .collect();

        info!("Grid loaded: {} x {} ({} cells)", width, height, width * height);
        Self::from_raw(width, height, data)
    }

    fn detect_dimensions(total_cells: usize) -> Result<(usize, usize)> {
        let common_dims = [
            (4800, 6000), // SRTM30 tile
            (6000, 4800),
            (1200, 1200),
            (3601, 3601), // SRTM 1 arc-second
            (1201, 1201), // SRTM 3 arc-second
        ];

        for &(w, h) in &common_dims {
            if w * h == total_cells {
                return Ok((w, h));
            }
        }

        let side = (total_cells as f64).sqrt() as usize;
        if side > 0 && side * side == total_cells {
            return Ok((side, side));
        }

        Err(ProminenceError::InvalidDimensions(format!(
            "cannot infer dimensions of a {}-cell file, pass width and height",
            total_cells
        )))
    }

    /// Load comma-separated rows of elevations.
    pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading CSV file: {}", path.display());
        let text = std::io::read_to_string(BufReader::new(File::open(path)?))?;

        let mut grid = Vec::new();
        for (line_no, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let row = line
                .split(',')
                .map(|s| {
                    s.trim().parse::<f64>().map_err(|e| ProminenceError::Parse {
                        line: line_no + 1,
                        message: format!("{:?}: {}", s.trim(), e),
                    })
                })
                .collect::<Result<Vec<f64>>>()?;
            grid.push(row);
        }

        Self::new(grid)
    }

    /// Load one band (1-based) of a GeoTIFF.
    ///
    /// Cells equal to the GDAL no-data value are filled with the lowest valid
    /// elevation so they never form peaks of their own.
    pub fn load_geotiff<P: AsRef<Path>>(path: P, band: usize) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading GeoTIFF: {} (band {})", path.display(), band);
        let file = File::open(path)?;
        let mut decoder = Decoder::new(BufReader::new(file))?;

        let mut limits = Limits::default();
        limits.decoding_buffer_size = 1024 * 1024 * 1024; // 1 GB
        limits.intermediate_buffer_size = 1024 * 1024 * 1024;
        limits.ifd_value_size = 1024 * 1024 * 1024;
        decoder = decoder.with_limits(limits);

        let (width, height) = decoder.dimensions()?;
        let (width, height) = (width as usize, height as usize);

        let samples = decoder
            .get_tag_u32(Tag::SamplesPerPixel)
            .map(|s| s as usize)
            .unwrap_or(1);
        if band == 0 || band > samples {
            return Err(ProminenceError::InvalidBand {
                band,
                available: samples,
            });
        }
        if samples > 1 && decoder.get_tag_u32(Tag::PlanarConfiguration).unwrap_or(1) == 2 {
            return Err(ProminenceError::UnsupportedFormat(
                "planar multi-band GeoTIFF".into(),
            ));
        }

        let geotransform = Self::read_geotransform(&mut decoder);
        let nodata = decoder
            .get_tag_ascii_string(Tag::GdalNodata)
            .ok()
            .and_then(|s| s.trim().trim_end_matches('\0').parse::<f64>().ok());

        let interleaved = Self::decode_elevation_data(&mut decoder)?;
        if interleaved.len() != width * height * samples {
            return Err(ProminenceError::InvalidDimensions(format!(
                "decoded {} samples for a {} x {} x {} image",
                interleaved.len(),
                width,
                height,
                samples
            )));
        }

        let mut data: Vec<f64> = interleaved
            .into_iter()
            .skip(band - 1)
            .step_by(samples)
            .collect();

        let is_void = |v: f64| !v.is_finite() || nodata.map_or(false, |nd| (v - nd).abs() < 1e-6);
        let fill = data
            .iter()
            .copied()
            .filter(|&v| !is_void(v))
            .fold(f64::INFINITY, f64::min);
        if !fill.is_finite() {
            return Err(ProminenceError::InvalidDimensions(
                "raster band contains no valid elevations".into(),
            ));
        }
        let mut voids = 0usize;
        for value in data.iter_mut().filter(|v| is_void(**v)) {
            *value = fill;
            voids += 1;
        }
        if voids > 0 {
            warn!("Filled {} no-data cells with {}", voids, fill);
        }

        info!("Grid loaded: {} x {} ({} cells)", width, height, width * height);
        let grid = Self::from_raw(width, height, data)?;
        Ok(match geotransform {
            Some(gt) => grid.with_geotransform(gt),
            None => grid,
        })
    }

    fn read_geotransform<R: std::io::Read + std::io::Seek>(
        decoder: &mut Decoder<R>,
    ) -> Option<GeoTransform> {
        let tiepoint = decoder.get_tag_f64_vec(Tag::ModelTiepointTag).ok()?;
        let scale = decoder.get_tag_f64_vec(Tag::ModelPixelScaleTag).ok()?;
        if tiepoint.len() < 6 || scale.len() < 2 {
            debug!("GeoTIFF georeferencing tags are incomplete");
            return None;
        }

        // Tiepoint is [i, j, k, x, y, z]: pixel (i, j) maps to (x, y).
        Some(GeoTransform {
            origin_x: tiepoint[3] - tiepoint[0] * scale[0],
            origin_y: tiepoint[4] + tiepoint[1] * scale[1],
            pixel_width: scale[0],
            pixel_height: scale[1],
        })
    }

    fn decode_elevation_data<R: std::io::Read + std::io::Seek>(
        decoder: &mut Decoder<R>,
    ) -> Result<Vec<f64>> {
        let result = decoder.read_image()?;

        match result {
            DecodingResult::F32(data) => Ok(data.into_iter().map(|v| v as f64).collect()),
            DecodingResult::F64(data) => Ok(data),
            DecodingResult::I16(data) => Ok(data.into_iter().map(|v| v as f64).collect()),
            DecodingResult::I32(data) => Ok(data.into_iter().map(|v| v as f64).collect()),
            DecodingResult::U16(data) => Ok(data.into_iter().map(|v| v as f64).collect()),
            DecodingResult::U32(data) => Ok(data.into_iter().map(|v| v as f64).collect()),
            DecodingResult::U8(data) => Ok(data.into_iter().map(|v| v as f64).collect()),
            DecodingResult::I8(data) => Ok(data.into_iter().map(|v| v as f64).collect()),
            DecodingResult::U64(data) => Ok(data.into_iter().map(|v| v as f64).collect()),
            DecodingResult::I64(data) => Ok(data.into_iter().map(|v| v as f64).collect()),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.data
    }

    pub fn get_elevation(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.height && col < self.width {
            Some(self.data[row * self.width + col])
        } else {
            None
        }
    }

    pub fn index(&self, row: usize, col: usize) -> usize {
        row * self.width + col
    }

    pub fn index_to_coords(&self, index: usize) -> (usize, usize) {
        (index / self.width, index % self.width)
    }

    pub fn cell(&self, index: usize) -> Option<Cell> {
        let (row, col) = self.index_to_coords(index);
        self.get_elevation(row, col)
            .map(|elevation| Cell::new(elevation, row, col, self.width))
    }

    /// Left, right, up and down neighbors that lie inside the grid.
    pub fn get_neighbor_indices(&self, row: usize, col: usize) -> Vec<usize> {
        let mut neighbors = Vec::with_capacity(4);
        if col > 0 {
            neighbors.push(self.index(row, col - 1));
        }
        if col + 1 < self.width {
            neighbors.push(self.index(row, col + 1));
        }
        if row > 0 {
            neighbors.push(self.index(row - 1, col));
        }
        if row + 1 < self.height {
            neighbors.push(self.index(row + 1, col));
        }
        neighbors
    }

    pub fn is_on_boundary(&self, row: usize, col: usize) -> bool {
        row == 0 || row == self.height - 1 || col == 0 || col == self.width - 1
    }

    pub fn min_elevation(&self) -> f64 {
        self.data.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn max_elevation(&self) -> f64 {
        self.data.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("morse_prominence_grid_{}_{}", std::process::id(), name))
    }

    #[test]
    fn test_rejects_ragged_rows() {
        let result = ElevationGrid::new(vec![vec![1.0, 2.0], vec![3.0]]);
        assert!(matches!(result, Err(ProminenceError::InvalidDimensions(_))));
    }

    #[test]
    fn test_rejects_empty_and_nan() {
        assert!(ElevationGrid::new(vec![]).is_err());
        assert!(ElevationGrid::new(vec![vec![]]).is_err());
        let result = ElevationGrid::new(vec![vec![1.0, f64::NAN]]);
        assert!(matches!(
            result,
            Err(ProminenceError::InvalidElevation { row: 0, col: 1 })
        ));
    }

    #[test]
    fn test_index_layout() {
        let grid = ElevationGrid::new(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
        assert_eq!(grid.index(1, 2), 5);
        assert_eq!(grid.index_to_coords(4), (1, 1));
        assert_eq!(grid.get_elevation(1, 0), Some(4.0));
        assert_eq!(grid.get_elevation(2, 0), None);
        assert_eq!(grid.cell(5).map(|c| c.elevation), Some(6.0));
        assert_eq!(grid.min_elevation(), 1.0);
        assert_eq!(grid.max_elevation(), 6.0);
    }

    #[test]
    fn test_neighbors_are_four_connected() {
        let grid = ElevationGrid::from_raw(3, 3, vec![0.0; 9]).unwrap();
        let mut center = grid.get_neighbor_indices(1, 1);
        center.sort();
        assert_eq!(center, vec![1, 3, 5, 7]);
        assert_eq!(grid.get_neighbor_indices(0, 0).len(), 2);
        assert_eq!(grid.get_neighbor_indices(0, 1).len(), 3);
        assert!(grid.is_on_boundary(0, 1));
        assert!(!grid.is_on_boundary(1, 1));
    }

    #[test]
    fn test_pixel_center() {
        let gt = GeoTransform {
            origin_x: -123.0,
            origin_y: 48.0,
            pixel_width: 0.5,
            pixel_height: 0.25,
        };
        let (x, y) = gt.pixel_center(1, 2);
        assert_relative_eq!(x, -121.75);
        assert_relative_eq!(y, 47.625);
    }

    #[test]
    fn test_load_csv() {
        let path = temp_path("grid.csv");
        std::fs::write(&path, "1, 2, 3\n4,5,6\n\n").unwrap();
        let grid = ElevationGrid::load(&path, 1).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!((grid.width, grid.height), (3, 2));
        assert_eq!(grid.get_elevation(1, 2), Some(6.0));
    }

    #[test]
    fn test_load_csv_reports_bad_line() {
        let path = temp_path("bad.csv");
        std::fs::write(&path, "1,2\n3,x\n").unwrap();
        let result = ElevationGrid::load_csv(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(ProminenceError::Parse { line: 2, .. })));
    }

    #[test]
    fn test_load_binary_clamps_voids() {
        let path = temp_path("grid.bin");
        let values: [i16; 4] = [10, -32768, 300, 7];
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        std::fs::write(&path, bytes).unwrap();

        let grid = ElevationGrid::load_binary(&path, None).unwrap();
        let explicit = ElevationGrid::load_binary(&path, Some((4, 1))).unwrap();
        let wrong = ElevationGrid::load_binary(&path, Some((3, 1)));
        std::fs::remove_file(&path).ok();

        assert_eq!((grid.width, grid.height), (2, 2));
        assert_eq!(grid.values(), &[10.0, 0.0, 300.0, 7.0]);
        assert_eq!((explicit.width, explicit.height), (4, 1));
        assert!(matches!(wrong, Err(ProminenceError::InvalidDimensions(_))));
    }

    #[test]
    fn test_single_band_formats_reject_other_bands() {
        let path = temp_path("band.csv");
        std::fs::write(&path, "1,2\n3,4\n").unwrap();
        let band0 = ElevationGrid::load(&path, 0);
        let band2 = ElevationGrid::load(&path, 2);
        let band1 = ElevationGrid::load(&path, 1);
        std::fs::remove_file(&path).ok();

        assert!(matches!(band0, Err(ProminenceError::InvalidBand { band: 0, available: 1 })));
        assert!(matches!(band2, Err(ProminenceError::InvalidBand { band: 2, available: 1 })));
        assert!(band1.is_ok());

        let path = temp_path("band.bin");
        std::fs::write(&path, [1u8, 0, 2, 0, 3, 0, 4, 0]).unwrap();
        let result = ElevationGrid::load(&path, 3);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(ProminenceError::InvalidBand { band: 3, available: 1 })));
    }

    #[test]
    fn test_rejects_infinite_elevation() {
        let result = ElevationGrid::from_raw(2, 1, vec![f64::INFINITY, 1.0]);
        assert!(matches!(
            result,
            Err(ProminenceError::InvalidElevation { row: 0, col: 0 })
        ));
        assert!(ElevationGrid::new(vec![vec![1.0, f64::NEG_INFINITY]]).is_err());
    }

    #[test]
    fn test_overflowing_dimensions_are_rejected() {
        let path = temp_path("huge.bin");
        std::fs::write(&path, [1u8, 0, 2, 0]).unwrap();
        let result = ElevationGrid::load_binary(&path, Some((usize::MAX, 2)));
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(ProminenceError::InvalidDimensions(_))));

        let result = ElevationGrid::from_raw(usize::MAX, 3, vec![1.0]);
        assert!(matches!(result, Err(ProminenceError::InvalidDimensions(_))));
    }

    #[test]
    fn test_unknown_extension() {
        let result = ElevationGrid::load("dem.xyz", 1);
        assert!(matches!(result, Err(ProminenceError::UnsupportedFormat(_))));
    }
}
