//! On-disk store of derived grids, one artifact per (date, hemisphere, product).
//!
//! Artifacts are written to a temporary file in the destination directory and renamed
//! into place, so a reader only ever sees complete files.

use chrono::NaiveDate;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::{IceError, Result};
use crate::grid::{Grid, GridKey, Hemisphere, Product};
use crate::readers::GeoTiffReader;
use crate::readers::geotiff::write_grid;

const ARTIFACT_EXTENSION: &str = "tif";

#[derive(Debug, Clone)]
pub struct GridCache {
    root: PathBuf,
}

impl GridCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/<hemisphere>/cache/<product>`
    pub fn dir(&self, hemisphere: Hemisphere, product: Product) -> PathBuf {
        self.root
            .join(hemisphere.name())
            .join("cache")
            .join(product.code())
    }

    pub fn path(&self, key: &GridKey) -> PathBuf {
        self.dir(key.hemisphere, key.product)
            .join(format!("{}.{}", key.file_stem(), ARTIFACT_EXTENSION))
    }

    pub fn exists(&self, key: &GridKey) -> bool {
        self.path(key).is_file()
    }

    pub fn load(&self, key: &GridKey) -> Result<Grid> {
        let path = self.path(key);
        if !path.is_file() {
            return Err(IceError::NotFound(*key));
        }

        let reader = GeoTiffReader {
            file_name: path.clone(),
        };
        reader.read_grid().map_err(|e| match e {
            IceError::Decode(reason) => IceError::CacheCorruption { path, reason },
            other => other,
        })
    }

    pub fn store(&self, key: &GridKey, grid: &Grid) -> Result<()> {
        let path = self.path(key);
        let dir = self.dir(key.hemisphere, key.product);
        std::fs::create_dir_all(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            write_grid(&mut writer, grid)?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| IceError::Io(e.error))?;

        debug!(key = %key, path = %path.display(), "stored grid");
        Ok(())
    }

    /// Returns the cached grid, computing and storing it when absent.
    ///
    /// With `overwrite` the cached artifact is ignored and replaced. An artifact that
    /// fails to load is treated as absent and recomputed.
    pub fn get_or_compute<F>(&self, key: &GridKey, compute: F, overwrite: bool) -> Result<Grid>
    where
        F: FnOnce() -> Result<Grid>,
    {
        if !overwrite {
            match self.load(key) {
                Ok(grid) => return Ok(grid),
                Err(IceError::NotFound(_)) => {}
                Err(IceError::CacheCorruption { path, reason }) => {
                    warn!(key = %key, path = %path.display(), %reason, "recomputing corrupt cache artifact");
                }
                Err(e) => return Err(e),
            }
        }

        let grid = compute()?;
        self.store(key, &grid)?;
        Ok(grid)
    }

    /// Dates with an artifact for the hemisphere and product, in ascending order.
    pub fn cached_dates(&self, hemisphere: Hemisphere, product: Product) -> Result<Vec<NaiveDate>> {
        let dir = self.dir(hemisphere, product);
        let pattern = dir.join(format!("*_{}_{}.{}", hemisphere, product, ARTIFACT_EXTENSION));
        let pattern = pattern.to_string_lossy();

        let paths = glob::glob(&pattern)
            .map_err(|e| IceError::Precondition(format!("bad cache pattern {}: {}", pattern, e)))?;

        let mut dates: Vec<NaiveDate> = paths
            .filter_map(|entry| entry.ok())
            .filter_map(|path| {
                let stem = path.file_stem()?.to_str()?.to_string();
                NaiveDate::parse_from_str(stem.get(..8)?, "%Y%m%d").ok()
            })
            .collect();
        dates.sort();

        Ok(dates)
    }
}
