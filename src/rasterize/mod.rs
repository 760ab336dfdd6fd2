//! Conversion of both source products onto a hemisphere's common grid.

use chrono::NaiveDateTime;
use std::path::Path;

use crate::config::AnalysisConfig;
use crate::error::{IceError, Result};
use crate::grid::{Grid, ProjectionMeta};
use crate::readers::{
    FileType, GriddedRaw, NcReader, PolygonFeature, ShapefileReader, reader_from_filetype,
};

pub mod gridded;
pub mod ice_code;
pub mod polygon;

pub use gridded::{clean_concentration, decode_time};
pub use ice_code::IceCode;

/// A cleaned concentration grid with the instant it describes.
#[derive(Debug, Clone)]
pub struct GriddedGrid {
    pub grid: Grid,
    pub timestamp: NaiveDateTime,
}

/// Stateless converter from source content to grids.
#[derive(Debug, Clone)]
pub struct Rasterizer {
    no_observation: f32,
}

impl Rasterizer {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            no_observation: config.no_observation,
        }
    }

    pub fn no_observation(&self) -> f32 {
        self.no_observation
    }

    /// Burns already reprojected polygon features onto the grid described by `meta`.
    pub fn rasterize_polygon(
        &self,
        features: &[PolygonFeature],
        meta: &ProjectionMeta,
    ) -> Result<Grid> {
        polygon::burn_features(features, meta, self.no_observation)
    }

    pub fn rasterize_gridded(&self, raw: GriddedRaw) -> Result<GriddedGrid> {
        let time_value = raw
            .time_value
            .ok_or_else(|| IceError::Decode("gridded source has no time coordinate".to_string()))?;
        let timestamp = decode_time(time_value, raw.time_units.as_deref())?;
        let grid = clean_concentration(raw.data, &raw.encoding)?;

        Ok(GriddedGrid { grid, timestamp })
    }

    /// Reads and rasterizes a zipped polygon archive.
    pub fn polygon_file(&self, path: &Path, meta: &ProjectionMeta) -> Result<Grid> {
        expect_file_type(path, FileType::ZippedShapefile)?;
        let features = ShapefileReader::new(path).read_features(meta)?;
        tracing::debug!(path = %path.display(), features = features.len(), "read polygon archive");
        self.rasterize_polygon(&features, meta)
    }

    /// Reads and cleans a gridded NetCDF file.
    pub fn gridded_file(&self, path: &Path) -> Result<GriddedGrid> {
        expect_file_type(path, FileType::NetCDF)?;
        let raw = NcReader::new(path).read_gridded()?;
        self.rasterize_gridded(raw)
    }
}

fn expect_file_type(path: &Path, expected: FileType) -> Result<()> {
    match reader_from_filetype(path) {
        Ok(found) if found == expected => Ok(()),
        _ => Err(IceError::Decode(format!(
            "{} is not a {:?} file",
            path.display(),
            expected
        ))),
    }
}
