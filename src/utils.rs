use std::fmt;
use tracing::info;

use crate::grid::Grid;

/// Value statistics of a grid over its observed cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSummary {
    pub min: f32,
    pub max: f32,
    pub mean: f32,
    pub observed: usize,
    pub total: usize,
}

impl GridSummary {
    /// Cells equal to `no_observation` or NaN are left out of min, max and mean.
    pub fn from_grid(grid: &Grid, no_observation: f32) -> Self {
        let valid_values: Vec<f32> = grid
            .iter()
            .filter(|&&v| !v.is_nan() && v != no_observation)
            .cloned()
            .collect();

        let mean = if valid_values.is_empty() {
            f32::NAN
        } else {
            valid_values.iter().sum::<f32>() / valid_values.len() as f32
        };

        Self {
            min: valid_values.iter().fold(f32::INFINITY, |a, &b| a.min(b)),
            max: valid_values
                .iter()
                .fold(f32::NEG_INFINITY, |a, &b| a.max(b)),
            mean,
            observed: valid_values.len(),
            total: grid.len(),
        }
    }

    pub fn observed_percent(&self) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        100.0 * self.observed as f32 / self.total as f32
    }

    pub fn log(&self, label: &str) {
        info!(
            label,
            min = self.min,
            max = self.max,
            mean = self.mean,
            observed = self.observed,
            total = self.total,
            "grid summary"
        );
    }
}

impl fmt::Display for GridSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "min {:.2}, max {:.2}, mean {:.2}, observed {} / {} ({:.1}%)",
            self.min,
            self.max,
            self.mean,
            self.observed,
            self.total,
            self.observed_percent()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_summary_skips_unobserved() {
        let grid = array![[-1.0_f32, 0.2], [0.8, f32::NAN]];
        let summary = GridSummary::from_grid(&grid, -1.0);

        assert_eq!(summary.min, 0.2);
        assert_eq!(summary.max, 0.8);
        assert!((summary.mean - 0.5).abs() < 1e-6);
        assert_eq!(summary.observed, 2);
        assert_eq!(summary.total, 4);
        assert_eq!(
            summary.to_string(),
            "min 0.20, max 0.80, mean 0.50, observed 2 / 4 (50.0%)"
        );
    }

    #[test]
    fn test_summary_of_unobserved_grid() {
        let grid = array![[-1.0_f32, -1.0]];
        let summary = GridSummary::from_grid(&grid, -1.0);

        assert_eq!(summary.observed, 0);
        assert!(summary.mean.is_nan());
        assert_eq!(summary.observed_percent(), 0.0);
    }
}
