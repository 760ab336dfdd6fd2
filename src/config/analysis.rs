use serde::Deserialize;

use crate::config::ConfigError;

/// Area of one 25 km x 25 km cell.
pub const CELL_AREA_KM2: f64 = 625.0;

/// Marks a cell outside the observed extent, distinct from 0% concentration.
pub const NO_OBSERVATION: f32 = -1.0;

/// Fraction of dates a cell must be iced on to count in the temporal median.
pub const MEDIAN_OCCURRENCE: f64 = 0.5;

/// What a date that could not be loaded contributes to a temporal median.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailedDatePolicy {
    /// Dropped from numerator and denominator.
    #[default]
    Exclude,
    /// Counted in the denominator as a date without ice.
    CountAsAbsent,
}

/// Constants shared by the rasterizer and aggregator.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    pub cell_area_km2: f64,
    pub no_observation: f32,
    pub median_occurrence: f64,
    pub failed_dates: FailedDatePolicy,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            cell_area_km2: CELL_AREA_KM2,
            no_observation: NO_OBSERVATION,
            median_occurrence: MEDIAN_OCCURRENCE,
            failed_dates: FailedDatePolicy::Exclude,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.cell_area_km2 > 0.0) {
            return Err(ConfigError::Analysis(format!(
                "cell_area_km2 must be positive, got {}",
                self.cell_area_km2
            )));
        }
        if !(0.0..=1.0).contains(&self.median_occurrence) {
            return Err(ConfigError::Analysis(format!(
                "median_occurrence must lie in [0, 1], got {}",
                self.median_occurrence
            )));
        }
        if self.no_observation >= 0.0 {
            return Err(ConfigError::Analysis(format!(
                "no_observation must be negative so it never collides with a concentration, got {}",
                self.no_observation
            )));
        }
        Ok(())
    }
}
