//! Sea-ice grid ingestion, caching and temporal aggregation.
//!
//! Two daily products, a gridded passive-microwave concentration record and an analyst
//! polygon product, are rasterized onto a shared polar stereographic grid, cached per
//! date and compared through thresholded areas, monthly medians and overlap maps.

pub mod aggregate;
pub mod cache;
pub mod config;
pub mod date_gen;
pub mod error;
pub mod grid;
pub mod ingest;
pub mod rasterize;
pub mod readers;
pub mod sources;
pub mod stats;
pub mod utils;

pub use aggregate::{Aggregator, ConcentrationRange, OverlapCategory};
pub use cache::GridCache;
pub use config::{AnalysisConfig, Config, ConfigError};
pub use error::{IceError, Result};
pub use grid::{BoolGrid, Grid, GridKey, Hemisphere, Product, ProjectionMeta};
pub use ingest::{IngestionPipeline, IngestionReport};
pub use rasterize::Rasterizer;
