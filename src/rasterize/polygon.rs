use geo::BoundingRect;
use geo_types::{LineString, Polygon};
use ndarray::Array2;

use crate::error::Result;
use crate::grid::{Grid, ProjectionMeta};
use crate::rasterize::IceCode;
use crate::readers::PolygonFeature;

/// Burns features into a grid shaped and placed by `meta`.
///
/// A cell takes a feature's value when its centre lies inside the feature, using a
/// half-open rule on edges so polygons sharing an edge never both claim a cell.
/// Features are burned in order: where they overlap the later one wins. Labels are
/// all resolved before anything is burned, so an unknown label fails the whole grid.
pub fn burn_features(
    features: &[PolygonFeature],
    meta: &ProjectionMeta,
    no_observation: f32,
) -> Result<Grid> {
    let values = features
        .iter()
        .map(|f| IceCode::from_label(&f.label).map(|code| code.fraction()))
        .collect::<Result<Vec<f32>>>()?;

    let mut grid = Array2::from_elem(meta.shape(), no_observation);

    for (feature, value) in features.iter().zip(values) {
        for polygon in &feature.geometry {
            burn_polygon(&mut grid, polygon, meta, value);
        }
    }

    Ok(grid)
}

fn burn_polygon(grid: &mut Grid, polygon: &Polygon<f64>, meta: &ProjectionMeta, value: f32) {
    let Some(bounds) = polygon.bounding_rect() else {
        return;
    };
    let (rows, cols) = grid.dim();

    // Rows whose centre y falls within the polygon's vertical extent.
    let first_row = ((meta.origin_y - bounds.max().y) / meta.pixel_y - 0.5).ceil();
    let last_row = ((meta.origin_y - bounds.min().y) / meta.pixel_y - 0.5).floor();
    let first_row = first_row.max(0.0) as usize;
    if last_row < 0.0 {
        return;
    }
    let last_row = (last_row as usize).min(rows.saturating_sub(1));

    let rings: Vec<&LineString<f64>> = std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .collect();

    let mut crossings: Vec<f64> = Vec::new();
    for row in first_row..=last_row {
        let (_, yc) = meta.cell_center(row, 0);

        crossings.clear();
        for ring in &rings {
            for line in ring.lines() {
                let (a, b) = (line.start, line.end);
                if (a.y <= yc && yc < b.y) || (b.y <= yc && yc < a.y) {
                    crossings.push(a.x + (yc - a.y) * (b.x - a.x) / (b.y - a.y));
                }
            }
        }
        crossings.sort_by(f64::total_cmp);

        // Even-odd: consecutive crossings bound the inside spans, holes included.
        for span in crossings.chunks_exact(2) {
            let start = column_at(span[0], meta).clamp(0, cols as i64) as usize;
            let end = column_at(span[1], meta).clamp(0, cols as i64) as usize;
            for col in start..end {
                grid[[row, col]] = value;
            }
        }
    }
}

// First column whose centre x is at or right of `x`.
fn column_at(x: f64, meta: &ProjectionMeta) -> i64 {
    ((x - meta.origin_x) / meta.pixel_x - 0.5).ceil() as i64
}
