//! Batch conversion of source records into cached grids.

pub mod pipeline;
pub mod report;
pub mod source;

pub use pipeline::IngestionPipeline;
pub use report::{DateOutcome, DateResult, IngestionReport};
pub use source::{GridSource, GriddedSource, PolygonSource, derive_projection};
