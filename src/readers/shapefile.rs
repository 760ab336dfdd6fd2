use crate::error::{IceError, Result};
use crate::grid::ProjectionMeta;
use gdal::Dataset;
use gdal::spatial_ref::{AxisMappingStrategy, CoordTransform, SpatialRef};
use gdal::vector::LayerAccess;
use geo_types::{Geometry, MultiPolygon};
use std::path::PathBuf;

/// Attribute holding the analyst's ice code.
pub const ICE_CODE_FIELD: &str = "ICECODE";

/// One analyst polygon in the target grid's projection.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonFeature {
    pub geometry: MultiPolygon<f64>,
    pub label: String,
}

/// Reads a zipped polygon product and reprojects it onto a hemisphere grid.
pub struct ShapefileReader {
    pub file_name: PathBuf,
}

impl ShapefileReader {
    pub fn new(file_name: impl Into<PathBuf>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }

    /// Features in file order, reprojected into `meta`'s coordinate system.
    pub fn read_features(&self, meta: &ProjectionMeta) -> Result<Vec<PolygonFeature>> {
        if !self.file_name.is_file() {
            return Err(IceError::SourceMissing {
                path: self.file_name.clone(),
            });
        }
        if self.file_name.extension().and_then(|e| e.to_str()) != Some("zip") {
            return Err(IceError::Decode(format!(
                "{} is not a zip archive",
                self.file_name.display()
            )));
        }

        let vsi_path = format!("/vsizip/{}", self.file_name.display());
        let dataset = Dataset::open(&vsi_path)
            .map_err(|e| IceError::Decode(format!("Failed to open {}: {}", vsi_path, e)))?;
        let mut layer = dataset.layer(0)?;

        let mut source_srs = layer
            .spatial_ref()
            .ok_or_else(|| IceError::Decode(format!("{} has no spatial reference", vsi_path)))?;
        let mut target_srs = SpatialRef::from_proj4(&meta.proj4)?;
        source_srs.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
        target_srs.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
        let transform = CoordTransform::new(&source_srs, &target_srs)?;

        let mut features = Vec::new();
        for (index, feature) in layer.features().enumerate() {
            let label = feature
                .field_as_string(feature.field_index(ICE_CODE_FIELD)?)?
                .ok_or_else(|| {
                    IceError::Decode(format!("feature {} has no {}", index, ICE_CODE_FIELD))
                })?;

            let Some(geometry) = feature.geometry() else {
                tracing::debug!(index, "skipping feature without geometry");
                continue;
            };

            let projected = geometry.transform(&transform)?;
            let geometry = into_multipolygon(projected.to_geo()?).ok_or_else(|| {
                IceError::Decode(format!("feature {} is not an areal geometry", index))
            })?;

            features.push(PolygonFeature { geometry, label });
        }

        Ok(features)
    }
}

/// Collects the areal parts of a geometry; `None` when it has none.
pub fn into_multipolygon(geometry: Geometry<f64>) -> Option<MultiPolygon<f64>> {
    match geometry {
        Geometry::Polygon(polygon) => Some(MultiPolygon(vec![polygon])),
        Geometry::MultiPolygon(multi) => Some(multi),
        Geometry::GeometryCollection(collection) => {
            let polygons: Vec<_> = collection
                .into_iter()
                .filter_map(into_multipolygon)
                .flat_map(|multi| multi.0)
                .collect();
            (!polygons.is_empty()).then_some(MultiPolygon(polygons))
        }
        _ => None,
    }
}
