//! Area statistics and monthly medians comparing the two products.

use chrono::NaiveDate;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::aggregate::overlap::classify_masks;
use crate::aggregate::{Aggregator, CategoryGrid, ConcentrationRange, ice_edge};
use crate::cache::GridCache;
use crate::config::{PlottingConfig, StatsConfig};
use crate::date_gen::{DateGenerator, DateWindow};
use crate::error::{IceError, Result};
use crate::grid::{BoolGrid, GridKey, Hemisphere, Product};
use crate::ingest::GridSource;

/// Areas of both products at or above one concentration threshold on one date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsRow {
    pub date: NaiveDate,
    pub threshold: f64,
    pub gridded_area_km2: f64,
    pub polygon_area_km2: f64,
}

/// Thresholds from `thresh_lower` up to, but excluding, `thresh_upper`.
pub fn sweep_thresholds(config: &StatsConfig) -> Vec<f64> {
    if !(config.thresh_interval > 0.0) {
        return Vec::new();
    }
    let eps = config.thresh_interval * 1e-9;
    (0..)
        .map(|i| config.thresh_lower + i as f64 * config.thresh_interval)
        .take_while(|t| *t < config.thresh_upper - eps)
        .map(|t| (t * 1e6).round() / 1e6)
        .collect()
}

/// `stats_<lower%>_to_<upper%>_sic.csv`, percentages truncated toward zero.
pub fn stats_file_name(config: &StatsConfig) -> String {
    let percent = |fraction: f64| (fraction * 100.0).trunc() as i64;
    format!(
        "stats_{}_to_{}_sic.csv",
        percent(config.thresh_lower),
        percent(config.thresh_upper)
    )
}

/// Sweeps thresholds over every date with both products cached.
///
/// Area is counted between each threshold and full cover, on cells the polygon product
/// observes. Dates missing a grid, or whose grids disagree in shape, are logged and left out.
pub fn area_table(
    aggregator: &Aggregator,
    cache: &GridCache,
    hemisphere: Hemisphere,
    dates: &[NaiveDate],
    config: &StatsConfig,
) -> Result<Vec<StatsRow>> {
    let thresholds = sweep_thresholds(config);
    let ranges = thresholds
        .iter()
        .map(|t| ConcentrationRange::at_least(*t as f32))
        .collect::<Result<Vec<_>>>()?;

    let mut rows = Vec::new();
    for date in dates {
        match date_rows(aggregator, cache, hemisphere, *date, &thresholds, &ranges) {
            Ok(mut date_rows) => rows.append(&mut date_rows),
            Err(e) => warn!(date = %date, error = %e, "no statistics for date"),
        }
    }

    Ok(rows)
}

fn date_rows(
    aggregator: &Aggregator,
    cache: &GridCache,
    hemisphere: Hemisphere,
    date: NaiveDate,
    thresholds: &[f64],
    ranges: &[ConcentrationRange],
) -> Result<Vec<StatsRow>> {
    let gridded = cache.load(&GridKey::new(date, hemisphere, Product::Gridded))?;
    let polygon = cache.load(&GridKey::new(date, hemisphere, Product::Polygon))?;

    thresholds
        .iter()
        .zip(ranges)
        .map(|(threshold, range)| {
            let (gridded_area_km2, polygon_area_km2) =
                aggregator.ice_area(&gridded, *range, &polygon, *range, &polygon)?;
            Ok(StatsRow {
                date,
                threshold: *threshold,
                gridded_area_km2,
                polygon_area_km2,
            })
        })
        .collect()
}

pub fn write_csv(rows: &[StatsRow], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path).map_err(|e| IceError::Io(e.into()))?;
    for row in rows {
        writer.serialize(row).map_err(|e| IceError::Io(e.into()))?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = rows.len(), "wrote statistics");
    Ok(())
}

/// Builds the area table for `dates` and writes it into `csv_dir`.
pub fn write_area_table(
    aggregator: &Aggregator,
    cache: &GridCache,
    hemisphere: Hemisphere,
    dates: &[NaiveDate],
    config: &StatsConfig,
    csv_dir: &Path,
) -> Result<PathBuf> {
    let rows = area_table(aggregator, cache, hemisphere, dates, config)?;
    let path = csv_dir.join(stats_file_name(config));
    write_csv(&rows, &path)?;
    Ok(path)
}

/// Median extent of both products over one calendar month.
#[derive(Debug, Clone)]
pub struct MonthlyMedian {
    pub window: DateWindow,
    pub gridded: BoolGrid,
    pub polygon: BoolGrid,
    pub gridded_edge: BoolGrid,
    pub polygon_edge: BoolGrid,
    pub overlap: CategoryGrid,
}

pub fn monthly_median(
    aggregator: &Aggregator,
    cache: &GridCache,
    gridded: &dyn GridSource,
    polygon: &dyn GridSource,
    window: DateWindow,
    plotting: &PlottingConfig,
) -> Result<MonthlyMedian> {
    let dates = window.dates();
    let gridded_mask =
        aggregator.median_over_dates(cache, gridded, &dates, plotting.gridded_thresh)?;
    let polygon_mask =
        aggregator.median_over_dates(cache, polygon, &dates, plotting.polygon_thresh)?;

    if gridded_mask.dim() != polygon_mask.dim() {
        return Err(IceError::Precondition(format!(
            "median shapes differ: {:?} vs {:?}",
            gridded_mask.dim(),
            polygon_mask.dim()
        )));
    }

    Ok(MonthlyMedian {
        window,
        gridded_edge: ice_edge(&gridded_mask),
        polygon_edge: ice_edge(&polygon_mask),
        overlap: classify_masks(&gridded_mask, &polygon_mask),
        gridded: gridded_mask,
        polygon: polygon_mask,
    })
}

/// Monthly medians for every whole month between `start` and `end`.
///
/// A month that cannot be aggregated is logged and skipped.
pub fn monthly_medians(
    aggregator: &Aggregator,
    cache: &GridCache,
    gridded: &dyn GridSource,
    polygon: &dyn GridSource,
    start: NaiveDate,
    end: NaiveDate,
    plotting: &PlottingConfig,
) -> Vec<MonthlyMedian> {
    DateGenerator::new(start, end)
        .month_windows()
        .into_iter()
        .filter_map(|window| {
            monthly_median(aggregator, cache, gridded, polygon, window, plotting)
                .inspect_err(|e| {
                    warn!(start = %window.start, end = %window.end, error = %e, "no monthly median")
                })
                .ok()
        })
        .collect()
}
