//! Statistics over cached grids: thresholds, temporal medians, areas and overlap.

use chrono::NaiveDate;
use tracing::warn;

use crate::cache::GridCache;
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::grid::{BoolGrid, Grid, GridKey};
use crate::ingest::GridSource;

pub mod area;
pub mod median;
pub mod overlap;
pub mod threshold;

pub use overlap::{CategoryGrid, OverlapCategory, OverlapCounts};
pub use threshold::{ConcentrationRange, ice_edge, threshold_mask};

/// Applies the analysis constants it was built with to grids.
#[derive(Debug, Clone)]
pub struct Aggregator {
    config: AnalysisConfig,
}

impl Aggregator {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn threshold_mask(&self, grid: &Grid, thresh: f32) -> BoolGrid {
        threshold::threshold_mask(grid, thresh, self.config.no_observation)
    }

    pub fn temporal_median_occurrence<I>(&self, grids: I, thresh: f32) -> Result<BoolGrid>
    where
        I: IntoIterator<Item = Result<Grid>>,
    {
        median::temporal_median_occurrence(
            grids,
            thresh,
            self.config.no_observation,
            self.config.median_occurrence,
            self.config.failed_dates,
        )
    }

    /// Median occurrence over `dates`, reading grids through the cache and filling gaps
    /// from `source`.
    pub fn median_over_dates(
        &self,
        cache: &GridCache,
        source: &dyn GridSource,
        dates: &[NaiveDate],
        thresh: f32,
    ) -> Result<BoolGrid> {
        let grids = dates.iter().map(|date| {
            let key = GridKey::new(*date, source.hemisphere(), source.product());
            cache
                .get_or_compute(&key, || source.compute(*date), false)
                .inspect_err(|e| warn!(date = %date, key = %key, error = %e, "grid unavailable"))
        });
        self.temporal_median_occurrence(grids, thresh)
    }

    /// Areas (km²) of the cells of each grid inside its range, counting only cells that
    /// `co_mask` observes (value >= 0).
    pub fn ice_area(
        &self,
        grid_a: &Grid,
        range_a: ConcentrationRange,
        grid_b: &Grid,
        range_b: ConcentrationRange,
        co_mask: &Grid,
    ) -> Result<(f64, f64)> {
        let (count_a, count_b) = area::count_in_range(grid_a, range_a, grid_b, range_b, co_mask)?;
        let cell_area = self.config.cell_area_km2;
        Ok((count_a as f64 * cell_area, count_b as f64 * cell_area))
    }

    /// Four-way agreement of two grids thresholded into their ranges.
    pub fn categorical_overlap(
        &self,
        grid_a: &Grid,
        range_a: ConcentrationRange,
        grid_b: &Grid,
        range_b: ConcentrationRange,
    ) -> Result<CategoryGrid> {
        range_a.validate()?;
        range_b.validate()?;
        threshold::ensure_same_shape(grid_a, grid_b, "product")?;

        let mask_a = threshold::range_mask(grid_a, range_a, self.config.no_observation);
        let mask_b = threshold::range_mask(grid_b, range_b, self.config.no_observation);
        Ok(overlap::classify_masks(&mask_a, &mask_b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FailedDatePolicy;
    use crate::error::IceError;
    use crate::grid::{Hemisphere, Product};
    use chrono::Datelike;
    use ndarray::{Array2, array};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    fn aggregator() -> Aggregator {
        Aggregator::new(&AnalysisConfig::default())
    }

    fn range(min: f32, max: f32) -> ConcentrationRange {
        ConcentrationRange { min, max }
    }

    #[test]
    fn test_area_of_four_cells() {
        let grid = array![[0.5_f32, 0.7, 0.2], [1.0, 0.9, 0.0]];
        let (area_a, area_b) = aggregator()
            .ice_area(&grid, range(0.5, 1.0), &grid, range(0.95, 1.0), &grid)
            .unwrap();

        assert_eq!(area_a, 2500.0);
        assert_eq!(area_b, 625.0);
    }

    #[test]
    fn test_sentinel_in_reference_excludes_cell_for_both() {
        let gridded = array![[0.9_f32, 0.9, 0.9]];
        let polygon = array![[0.8_f32, -1.0, 0.18]];

        let (area_a, area_b) = aggregator()
            .ice_area(&gridded, range(0.1, 1.0), &polygon, range(0.1, 1.0), &polygon)
            .unwrap();
        assert_eq!(area_a, 1250.0);
        assert_eq!(area_b, 1250.0);
    }

    #[test]
    fn test_inverted_range_fails_without_result() {
        let grid = array![[0.9_f32]];
        let agg = aggregator();

        assert!(matches!(
            agg.ice_area(&grid, range(0.1, 1.0), &grid, range(0.9, 0.2), &grid),
            Err(IceError::Precondition(_))
        ));
        assert!(matches!(
            agg.categorical_overlap(&grid, range(1.0, 0.0), &grid, range(0.0, 1.0)),
            Err(IceError::Precondition(_))
        ));
    }

    #[test]
    fn test_overlap_partitions_every_cell() {
        let gridded = array![[0.9_f32, 0.9, 0.1, 0.1, -1.0], [0.85, 0.3, 0.0, 1.0, 0.5]];
        let polygon = array![[0.8_f32, 0.18, 0.8, 0.18, -1.0], [-1.0, 0.8, 0.18, 0.8, 0.8]];

        let grid = aggregator()
            .categorical_overlap(&gridded, range(0.8, 1.0), &polygon, range(0.8, 1.0))
            .unwrap();
        let counts = OverlapCounts::from_grid(&grid);

        assert_eq!(grid.dim(), gridded.dim());
        assert_eq!(counts.total(), gridded.len());
        assert_eq!(grid[[0, 0]], OverlapCategory::Both);
        assert_eq!(grid[[0, 1]], OverlapCategory::OnlyA);
        assert_eq!(grid[[0, 2]], OverlapCategory::OnlyB);
        assert_eq!(grid[[0, 3]], OverlapCategory::Neither);
        assert_eq!(grid[[0, 4]], OverlapCategory::Neither);
        assert_eq!(grid[[1, 0]], OverlapCategory::OnlyA);
    }

    struct CountingSource {
        failing: NaiveDate,
        calls: AtomicUsize,
    }

    impl GridSource for CountingSource {
        fn product(&self) -> Product {
            Product::Gridded
        }

        fn hemisphere(&self) -> Hemisphere {
            Hemisphere::North
        }

        fn compute(&self, date: NaiveDate) -> Result<Grid> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if date == self.failing {
                return Err(IceError::Decode("truncated".to_string()));
            }
            let value = if date.day0() % 2 == 0 { 0.9 } else { 0.1 };
            Ok(Array2::from_elem((2, 2), value))
        }
    }

    #[test]
    fn test_median_over_dates_uses_cache_and_skips_failures() {
        let dir = tempdir().unwrap();
        let cache = GridCache::new(dir.path());
        let dates: Vec<NaiveDate> = (1..=4)
            .map(|d| NaiveDate::from_ymd_opt(2020, 1, d).unwrap())
            .collect();
        let source = CountingSource {
            failing: dates[2],
            calls: AtomicUsize::new(0),
        };

        // Jan 1 true, Jan 2 false, Jan 3 fails, Jan 4 false.
        let mask = aggregator()
            .median_over_dates(&cache, &source, &dates, 0.5)
            .unwrap();
        assert!(mask.iter().all(|v| !*v));
        assert_eq!(source.calls.load(Ordering::SeqCst), 4);

        aggregator()
            .median_over_dates(&cache, &source, &dates, 0.5)
            .unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 5);

        let lenient = Aggregator::new(&AnalysisConfig {
            failed_dates: FailedDatePolicy::Exclude,
            median_occurrence: 1.0 / 3.0,
            ..AnalysisConfig::default()
        });
        let mask = lenient
            .median_over_dates(&cache, &source, &dates, 0.5)
            .unwrap();
        assert!(mask.iter().all(|v| *v));
    }
}
