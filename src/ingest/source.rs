use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::error::{IceError, Result};
use crate::grid::{Grid, Hemisphere, Product, ProjectionMeta};
use crate::rasterize::Rasterizer;
use crate::readers::NcReader;
use crate::sources::SourceLayout;

/// Produces the grid for one date of one product. Shared read-only between workers.
pub trait GridSource: Sync {
    fn product(&self) -> Product;
    fn hemisphere(&self) -> Hemisphere;
    fn compute(&self, date: NaiveDate) -> Result<Grid>;
}

/// Daily passive-microwave concentration files.
pub struct GriddedSource {
    layout: SourceLayout,
    rasterizer: Rasterizer,
}

impl GriddedSource {
    pub fn new(layout: SourceLayout, rasterizer: Rasterizer) -> Self {
        Self { layout, rasterizer }
    }
}

impl GridSource for GriddedSource {
    fn product(&self) -> Product {
        Product::Gridded
    }

    fn hemisphere(&self) -> Hemisphere {
        self.layout.hemisphere()
    }

    fn compute(&self, date: NaiveDate) -> Result<Grid> {
        let record = self.layout.locate(Product::Gridded, date)?;
        let gridded = self.rasterizer.gridded_file(&record.path)?;

        if gridded.timestamp.date() != date {
            warn!(
                date = %date,
                timestamp = %gridded.timestamp,
                path = %record.path.display(),
                "gridded file time coordinate does not match its name"
            );
        }

        Ok(gridded.grid)
    }
}

/// Daily analyst polygon archives, burned onto the hemisphere's gridded geometry.
pub struct PolygonSource {
    layout: SourceLayout,
    rasterizer: Rasterizer,
    meta: ProjectionMeta,
}

impl PolygonSource {
    pub fn new(layout: SourceLayout, rasterizer: Rasterizer, meta: ProjectionMeta) -> Self {
        Self {
            layout,
            rasterizer,
            meta,
        }
    }

    pub fn meta(&self) -> &ProjectionMeta {
        &self.meta
    }
}

impl GridSource for PolygonSource {
    fn product(&self) -> Product {
        Product::Polygon
    }

    fn hemisphere(&self) -> Hemisphere {
        self.layout.hemisphere()
    }

    fn compute(&self, date: NaiveDate) -> Result<Grid> {
        let record = self.layout.locate(Product::Polygon, date)?;
        self.rasterizer.polygon_file(&record.path, &self.meta)
    }
}

/// Reads the grid geometry from the first gridded source found among `dates`.
pub fn derive_projection(layout: &SourceLayout, dates: &[NaiveDate]) -> Result<ProjectionMeta> {
    for date in dates {
        let record = match layout.locate(Product::Gridded, *date) {
            Ok(record) => record,
            Err(e) => {
                debug!(date = %date, error = %e, "no gridded reference");
                continue;
            }
        };

        match NcReader::new(&record.path).read_projection() {
            Ok(meta) => {
                debug!(date = %date, path = %record.path.display(), "derived projection");
                return Ok(meta);
            }
            Err(e) => warn!(date = %date, error = %e, "unreadable gridded reference"),
        }
    }

    Err(IceError::Precondition(format!(
        "no readable {} gridded source to derive the grid projection from",
        layout.hemisphere()
    )))
}
