use chrono::NaiveDate;
use ndarray::Array2;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

pub mod projection;
pub use projection::ProjectionMeta;

/// Concentration fractions in [0, 1], or the no-observation sentinel.
pub type Grid = Array2<f32>;

pub type BoolGrid = Array2<bool>;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Hemisphere {
    North,
    South,
}

impl Hemisphere {
    /// Single-letter code used in upstream file names.
    pub fn letter(&self) -> char {
        match self {
            Hemisphere::North => 'n',
            Hemisphere::South => 's',
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Hemisphere::North => "north",
            Hemisphere::South => "south",
        }
    }
}

impl fmt::Display for Hemisphere {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Hemisphere {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "north" | "arctic" => Ok(Hemisphere::North),
            "south" | "antarctic" => Ok(Hemisphere::South),
            other => Err(format!("hemisphere must be north or south, got {other:?}")),
        }
    }
}

/// The two products under comparison.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Product {
    /// Passive-microwave concentration record (NetCDF).
    Gridded,
    /// Analyst polygon product (zipped shapefile).
    Polygon,
}

impl Product {
    /// Short code used for directory and artifact names.
    pub fn code(&self) -> &'static str {
        match self {
            Product::Gridded => "cdr",
            Product::Polygon => "nic",
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Identifies exactly one cached grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridKey {
    pub date: NaiveDate,
    pub hemisphere: Hemisphere,
    pub product: Product,
}

impl GridKey {
    pub fn new(date: NaiveDate, hemisphere: Hemisphere, product: Product) -> Self {
        Self {
            date,
            hemisphere,
            product,
        }
    }

    /// `YYYYMMDD_<hemisphere>_<product>`
    pub fn file_stem(&self) -> String {
        format!(
            "{}_{}_{}",
            self.date.format("%Y%m%d"),
            self.hemisphere,
            self.product
        )
    }
}

impl fmt::Display for GridKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_stem())
    }
}
