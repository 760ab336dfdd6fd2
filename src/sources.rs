//! Where source records and derived artifacts live on disk.
//!
//! The downloader is an external collaborator; this module only encodes the
//! deterministic file naming it agrees to, so ingestion can find (or fail to find)
//! the record for a date.

use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{IceError, Result};
use crate::grid::{Hemisphere, Product};

const GRIDDED_REMOTE: &str = "ftp://sidads.colorado.edu/pub/DATASETS/NOAA";
const POLYGON_REMOTE: &str = "ftp://sidads.colorado.edu/DATASETS/NOAA/G10017";

/// Naming scheme changes (and moves to the interim record) on this date.
fn gridded_cutoff() -> NaiveDate {
    NaiveDate::from_ymd_opt(2019, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// A raw input file for one date and hemisphere. Never modified after download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRecord {
    pub date: NaiveDate,
    pub hemisphere: Hemisphere,
    pub product: Product,
    pub path: PathBuf,
}

/// Upstream file name for a product on a date.
pub fn source_file_name(product: Product, date: NaiveDate, hemisphere: Hemisphere) -> String {
    let h = hemisphere.letter();
    match product {
        Product::Gridded if date < gridded_cutoff() => format!(
            "seaice_conc_daily_{h}h_f17_{}_v03r01.nc",
            date.format("%Y%m%d")
        ),
        Product::Gridded => format!(
            "seaice_conc_daily_icdr_{h}h_f18_{}_v01r00.nc",
            date.format("%Y%m%d")
        ),
        Product::Polygon => format!("nic_miz{}{h}c_pl_a.zip", date.format("%Y%j")),
    }
}

/// Remote location the downloader fetches the record from.
pub fn remote_url(product: Product, date: NaiveDate, hemisphere: Hemisphere) -> String {
    let year = date.format("%Y");
    let file = source_file_name(product, date, hemisphere);
    match product {
        Product::Gridded if date < gridded_cutoff() => {
            format!("{GRIDDED_REMOTE}/G02202_V3/{hemisphere}/daily/{year}/{file}")
        }
        Product::Gridded => format!("{GRIDDED_REMOTE}/G10016/{hemisphere}/daily/{year}/{file}"),
        Product::Polygon => format!("{POLYGON_REMOTE}/{hemisphere}/{year}/{file}"),
    }
}

/// Directory layout rooted at the data directory, for one hemisphere.
#[derive(Debug, Clone)]
pub struct SourceLayout {
    root: PathBuf,
    hemisphere: Hemisphere,
}

impl SourceLayout {
    pub fn new(root: impl AsRef<Path>, hemisphere: Hemisphere) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            hemisphere,
        }
    }

    pub fn hemisphere(&self) -> Hemisphere {
        self.hemisphere
    }

    /// `<root>/<hemisphere>/inputs/<product>`
    pub fn input_dir(&self, product: Product) -> PathBuf {
        self.root
            .join(self.hemisphere.name())
            .join("inputs")
            .join(product.code())
    }

    /// `<root>/<hemisphere>/outputs/<name>/csv`
    pub fn csv_dir(&self, name: &str) -> PathBuf {
        self.output_dir(name).join("csv")
    }

    fn output_dir(&self, name: &str) -> PathBuf {
        self.root
            .join(self.hemisphere.name())
            .join("outputs")
            .join(name)
    }

    /// Locates the source record for a date.
    ///
    /// Looks for the expected file directly in the input folder first, then anywhere
    /// below it. Fails with `SourceMissing` naming the expected direct path.
    pub fn locate(&self, product: Product, date: NaiveDate) -> Result<SourceRecord> {
        let dir = self.input_dir(product);
        let file_name = source_file_name(product, date, self.hemisphere);
        let direct = dir.join(&file_name);

        let path = if direct.is_file() {
            direct
        } else {
            search_file_recursively(&dir, &file_name)
                .ok_or(IceError::SourceMissing { path: direct })?
        };

        Ok(SourceRecord {
            date,
            hemisphere: self.hemisphere,
            product,
            path,
        })
    }
}

fn search_file_recursively(base_dir: &Path, filename: &str) -> Option<PathBuf> {
    if !base_dir.exists() {
        return None;
    }

    WalkDir::new(base_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .find(|entry| entry.file_type().is_file() && entry.file_name() == filename)
        .map(|entry| entry.into_path())
}
