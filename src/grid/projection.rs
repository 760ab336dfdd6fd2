use crate::error::{IceError, Result};
use crate::grid::Hemisphere;

const NSIDC_PIXEL_SIZE: f64 = 25_000.0;

const SOUTH_PROJ4: &str = "+proj=stere +lat_0=-90 +lat_ts=-70 +lon_0=0 +k=1 +x_0=0 +y_0=0 +a=6378273 +b=6356889.449 +units=m +no_defs";
const NORTH_PROJ4: &str = "+proj=stere +lat_0=90 +lat_ts=70 +lon_0=-45 +k=1 +x_0=0 +y_0=0 +a=6378273 +b=6356889.449 +units=m +no_defs";

/// Hemisphere-wide raster geometry shared by every grid of that hemisphere.
///
/// The origin is the outer top-left corner of the grid, pixel sizes are positive
/// and rows grow southward in projected y.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionMeta {
    pub proj4: String,
    pub origin_x: f64,
    pub origin_y: f64,
    pub pixel_x: f64,
    pub pixel_y: f64,
    pub standard_parallel: f64,
    pub rows: usize,
    pub cols: usize,
}

impl ProjectionMeta {
    /// NSIDC 25 km polar stereographic grid for the hemisphere.
    pub fn reference(hemisphere: Hemisphere) -> Self {
        match hemisphere {
            Hemisphere::South => Self {
                proj4: SOUTH_PROJ4.to_string(),
                origin_x: -3_950_000.0,
                origin_y: 4_350_000.0,
                pixel_x: NSIDC_PIXEL_SIZE,
                pixel_y: NSIDC_PIXEL_SIZE,
                standard_parallel: -70.0,
                rows: 332,
                cols: 316,
            },
            Hemisphere::North => Self {
                proj4: NORTH_PROJ4.to_string(),
                origin_x: -3_850_000.0,
                origin_y: 5_850_000.0,
                pixel_x: NSIDC_PIXEL_SIZE,
                pixel_y: NSIDC_PIXEL_SIZE,
                standard_parallel: 70.0,
                rows: 448,
                cols: 304,
            },
        }
    }

    /// Builds the metadata from the attributes of a gridded file's `projection` variable.
    ///
    /// `attr` returns the raw attribute text for a name such as `GeoTransform`. The
    /// GeoTransform only contributes the pixel sizes; the origin comes from the explicit
    /// grid boundary attributes, which name the corner unambiguously.
    pub fn from_attributes<F>(attr: F, rows: usize, cols: usize) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            attr(name).ok_or_else(|| {
                IceError::Decode(format!("projection attribute {name} is missing"))
            })
        };
        let number = |name: &str| -> Result<f64> {
            let raw = required(name)?;
            parse_number(name, &raw)
        };

        let transform = required("GeoTransform")?;
        let parts = transform
            .split_whitespace()
            .map(|p| parse_number("GeoTransform", p))
            .collect::<Result<Vec<f64>>>()?;
        if parts.len() != 6 {
            return Err(IceError::Decode(format!(
                "GeoTransform should have 6 elements, found {}",
                parts.len()
            )));
        }

        let meta = Self {
            proj4: required("proj4text")?,
            origin_x: number("grid_boundary_left_projected_x")?,
            origin_y: number("grid_boundary_top_projected_y")?,
            pixel_x: parts[1].abs(),
            pixel_y: parts[5].abs(),
            standard_parallel: number("standard_parallel")?,
            rows,
            cols,
        };

        if meta.pixel_x == 0.0 || meta.pixel_y == 0.0 || rows == 0 || cols == 0 {
            return Err(IceError::Decode(format!(
                "degenerate grid geometry: {}x{} cells of {}x{} m",
                rows, cols, meta.pixel_x, meta.pixel_y
            )));
        }

        Ok(meta)
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// GDAL-ordered affine transform, north-up.
    pub fn geo_transform(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_x,
            0.0,
            self.origin_y,
            0.0,
            -self.pixel_y,
        ]
    }

    /// Projected coordinates of the centre of a cell.
    pub fn cell_center(&self, row: usize, col: usize) -> (f64, f64) {
        (
            self.origin_x + (col as f64 + 0.5) * self.pixel_x,
            self.origin_y - (row as f64 + 0.5) * self.pixel_y,
        )
    }

    /// Fractional (col, row) position of a projected point.
    pub fn world_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.origin_x) / self.pixel_x,
            (self.origin_y - y) / self.pixel_y,
        )
    }

    /// Area of one cell in square kilometres.
    pub fn cell_area_km2(&self) -> f64 {
        self.pixel_x * self.pixel_y / 1.0e6
    }
}

fn parse_number(name: &str, raw: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .map_err(|e| IceError::Decode(format!("attribute {name} = {raw:?}: {e}")))
}
