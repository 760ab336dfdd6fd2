use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use icegrid::aggregate::OverlapCounts;
use icegrid::ingest::{GriddedSource, PolygonSource, derive_projection};
use icegrid::sources::SourceLayout;
use icegrid::stats::{monthly_medians, write_area_table};
use icegrid::utils::GridSummary;
use icegrid::{
    Aggregator, Config, GridCache, GridKey, IngestionPipeline, IngestionReport, ProjectionMeta,
    Rasterizer,
};

#[derive(Parser, Debug)]
#[command(name = "icegrid")]
#[command(about = "Rasterize, cache and compare daily sea-ice products")]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "./data/config/config.json")]
    config: String,

    /// Log level, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Ingest both products for the configured range
    #[arg(long)]
    ingest: bool,

    /// Write the area statistics table
    #[arg(long)]
    stats: bool,

    /// Compute monthly median extents
    #[arg(long)]
    median: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .context("Invalid log level")?;
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = Config::from_file(&args.config)
        .with_context(|| format!("Failed to load config {}", args.config))?;
    let hemisphere = config.hemisphere();
    info!(
        hemisphere = %hemisphere,
        start = %config.start_date(),
        end = %config.end_date(),
        "Starting sea ice grid processing"
    );

    let run_all = !(args.ingest || args.stats || args.median);
    let dates: Vec<NaiveDate> = config.clone().collect();
    let layout = config.layout();
    let cache = GridCache::new(config.data_dir());
    let rasterizer = Rasterizer::new(config.analysis());
    let aggregator = Aggregator::new(config.analysis());
    let pipeline = IngestionPipeline::new(cache.clone(), config.workers());

    let gridded = GriddedSource::new(layout.clone(), rasterizer.clone());
    if args.ingest || run_all {
        let report = pipeline.ingest_range(
            config.start_date(),
            config.end_date(),
            hemisphere,
            &gridded,
            config.overwrite(),
        )?;
        print_report(&report, &cache, config.analysis().no_observation);
    }

    let meta = projection_for(&layout, &dates);
    let polygon = PolygonSource::new(layout.clone(), rasterizer, meta);
    if args.ingest || run_all {
        let report = pipeline.ingest_range(
            config.start_date(),
            config.end_date(),
            hemisphere,
            &polygon,
            config.overwrite(),
        )?;
        print_report(&report, &cache, config.analysis().no_observation);
    }

    if args.stats || run_all {
        match write_area_table(
            &aggregator,
            &cache,
            hemisphere,
            &dates,
            config.stats(),
            &layout.csv_dir("combined"),
        ) {
            Ok(path) => info!(path = %path.display(), "Statistics written"),
            Err(e) => error!(error = %e, "Statistics failed"),
        }
    }

    if args.median || run_all {
        let medians = monthly_medians(
            &aggregator,
            &cache,
            &gridded,
            &polygon,
            config.start_date(),
            config.end_date(),
            config.plotting(),
        );
        for median in &medians {
            let counts = OverlapCounts::from_grid(&median.overlap);
            info!(
                start = %median.window.start,
                end = %median.window.end,
                both = counts.both,
                gridded_only = counts.only_a,
                polygon_only = counts.only_b,
                neither = counts.neither,
                gridded_edge = median.gridded_edge.iter().filter(|v| **v).count(),
                polygon_edge = median.polygon_edge.iter().filter(|v| **v).count(),
                "Monthly median extent"
            );
        }
        if medians.is_empty() {
            warn!("No whole month in range to compute a median for");
        }
    }

    Ok(())
}

/// Polygon grids follow the gridded product's geometry; the built-in grid is a fallback.
fn projection_for(layout: &SourceLayout, dates: &[NaiveDate]) -> ProjectionMeta {
    derive_projection(layout, dates).unwrap_or_else(|e| {
        warn!(error = %e, "Using reference grid for {}", layout.hemisphere());
        ProjectionMeta::reference(layout.hemisphere())
    })
}

fn print_report(report: &IngestionReport, cache: &GridCache, no_observation: f32) {
    println!("{}", report);

    let Some(date) = report.available_dates().first().copied() else {
        return;
    };
    let key = GridKey::new(date, report.hemisphere, report.product);
    match cache.load(&key) {
        Ok(grid) => GridSummary::from_grid(&grid, no_observation).log(&key.to_string()),
        Err(e) => warn!(key = %key, error = %e, "Could not summarise grid"),
    }
}
