use chrono::{Duration, NaiveDate};

use serde::Deserialize;
use serde::Deserializer;
use serde::de::Error;

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::grid::Hemisphere;
use crate::sources::SourceLayout;

pub mod analysis;
pub use analysis::{AnalysisConfig, FailedDatePolicy};

pub mod error;
pub use error::ConfigError;

/// Concentration thresholds swept when building the area statistics table.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct StatsConfig {
    pub thresh_lower: f64,
    pub thresh_upper: f64,
    pub thresh_interval: f64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            thresh_lower: 0.1,
            thresh_upper: 1.0,
            thresh_interval: 0.05,
        }
    }
}

/// Thresholds used for extent masks handed to the plotting layer.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct PlottingConfig {
    pub gridded_thresh: f32,
    pub polygon_thresh: f32,
}

impl Default for PlottingConfig {
    fn default() -> Self {
        Self {
            gridded_thresh: 0.8,
            polygon_thresh: 0.8,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    start_date: NaiveDate,
    end_date: NaiveDate,
    hemisphere: Hemisphere,
    data_dir: PathBuf,
    workers: Option<usize>,
    overwrite: bool,
    analysis: AnalysisConfig,
    stats: StatsConfig,
    plotting: PlottingConfig,
}

// Dates are parsed and ordered here, and the nested blocks validated, so a Config that
// exists is always usable by the pipeline.
impl<'de> Deserialize<'de> for Config {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct ConfigHelper {
            start_date: String,
            end_date: String,
            hemisphere: Hemisphere,
            data_dir: PathBuf,
            workers: Option<usize>,
            #[serde(default)]
            overwrite: bool,
            #[serde(default)]
            analysis: AnalysisConfig,
            #[serde(default)]
            stats: StatsConfig,
            #[serde(default)]
            plotting: PlottingConfig,
        }

        let helper = ConfigHelper::deserialize(deserializer)?;

        let start_date = NaiveDate::parse_from_str(&helper.start_date, "%Y-%m-%d")
            .map_err(|e| D::Error::custom(format!("Invalid start_date format: {}", e)))?;

        let end_date = NaiveDate::parse_from_str(&helper.end_date, "%Y-%m-%d")
            .map_err(|e| D::Error::custom(format!("Invalid end_date format: {}", e)))?;

        if start_date > end_date {
            return Err(D::Error::custom(ConfigError::DateOrder));
        }

        if helper.workers == Some(0) {
            return Err(D::Error::custom("workers must be at least 1"));
        }

        helper.analysis.validate().map_err(D::Error::custom)?;

        let stats = helper.stats;
        if !(stats.thresh_interval > 0.0) || stats.thresh_lower > stats.thresh_upper {
            return Err(D::Error::custom(format!(
                "Invalid stats thresholds: lower={}, upper={}, interval={}",
                stats.thresh_lower, stats.thresh_upper, stats.thresh_interval
            )));
        }

        Ok(Config {
            start_date,
            end_date,
            hemisphere: helper.hemisphere,
            data_dir: helper.data_dir,
            workers: helper.workers,
            overwrite: helper.overwrite,
            analysis: helper.analysis,
            stats,
            plotting: helper.plotting,
        })
    }
}

impl Config {
    pub fn new(
        start_date: NaiveDate,
        end_date: NaiveDate,
        hemisphere: Hemisphere,
        data_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            start_date,
            end_date,
            hemisphere,
            data_dir: data_dir.into(),
            workers: None,
            overwrite: false,
            analysis: AnalysisConfig::default(),
            stats: StatsConfig::default(),
            plotting: PlottingConfig::default(),
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let config: Config = serde_json::from_reader(reader)?;

        Ok(config)
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn hemisphere(&self) -> Hemisphere {
        self.hemisphere
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Worker pool size; defaults to the number of logical CPUs.
    pub fn workers(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get)
    }

    pub fn overwrite(&self) -> bool {
        self.overwrite
    }

    pub fn analysis(&self) -> &AnalysisConfig {
        &self.analysis
    }

    pub fn stats(&self) -> &StatsConfig {
        &self.stats
    }

    pub fn plotting(&self) -> &PlottingConfig {
        &self.plotting
    }

    pub fn layout(&self) -> SourceLayout {
        SourceLayout::new(&self.data_dir, self.hemisphere)
    }

    fn increment_date(&self, current_date: NaiveDate) -> Option<NaiveDate> {
        current_date.checked_add_signed(Duration::days(1))
    }
}

// Yields every day of the inclusive range.
impl Iterator for Config {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<Self::Item> {
        if self.start_date <= self.end_date {
            let current_date = self.start_date;
            self.start_date = self.increment_date(self.start_date)?;
            Some(current_date)
        } else {
            None
        }
    }
}
