use super::Data;
use crate::error::{IceError, Result};
use crate::grid::ProjectionMeta;
use gdal::{Dataset, Metadata};
use std::path::PathBuf;

/// Concentration variable of the passive-microwave record.
pub const CONCENTRATION_VARIABLE: &str = "seaice_conc_cdr";

const PROJECTION_VARIABLE: &str = "projection";

/// How raw band values map to physical concentrations.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BandEncoding {
    pub fill_value: Option<f64>,
    pub valid_range: Option<(f64, f64)>,
    pub scale: Option<f64>,
    pub offset: Option<f64>,
}

/// Undecoded content of one gridded file.
#[derive(Debug, Clone)]
pub struct GriddedRaw {
    pub data: Data,
    pub encoding: BandEncoding,
    pub time_value: Option<f64>,
    pub time_units: Option<String>,
}

pub struct NcReader {
    pub file_name: PathBuf,
    pub variable: String,
}

impl NcReader {
    pub fn new(file_name: impl Into<PathBuf>) -> Self {
        Self {
            file_name: file_name.into(),
            variable: CONCENTRATION_VARIABLE.to_string(),
        }
    }

    // GDAL addresses a single NetCDF variable through a subdataset name.
    fn gdal_path(&self) -> String {
        format!(
            "NETCDF:\"{}\":{}",
            self.file_name.display(),
            self.variable
        )
    }

    fn open(&self) -> Result<Dataset> {
        if !self.file_name.is_file() {
            return Err(IceError::SourceMissing {
                path: self.file_name.clone(),
            });
        }
        Dataset::open(self.gdal_path()).map_err(|e| {
            IceError::Decode(format!(
                "Failed to open {} in {}: {}",
                self.variable,
                self.file_name.display(),
                e
            ))
        })
    }

    /// Reads band values together with what is needed to clean and date them.
    pub fn read_gridded(&self) -> Result<GriddedRaw> {
        let dataset = self.open()?;
        gridded_from_dataset(&dataset, &self.variable)
    }

    /// Extracts the hemisphere's grid geometry from the `projection` variable.
    pub fn read_projection(&self) -> Result<ProjectionMeta> {
        let dataset = self.open()?;
        projection_from_dataset(&dataset)
    }
}

fn gridded_from_dataset(dataset: &Dataset, variable: &str) -> Result<GriddedRaw> {
    let data = read_single_band(dataset)?;

    let band = dataset.rasterband(1)?;
    let encoding = BandEncoding {
        fill_value: band.no_data_value(),
        valid_range: dataset
            .metadata_item(&format!("{}#valid_range", variable), "")
            .and_then(|raw| parse_range(&raw)),
        scale: band.scale(),
        offset: band.offset(),
    };

    let time_value = match band.metadata_item("NETCDF_DIM_time", "") {
        Some(raw) => Some(raw.trim().parse::<f64>().map_err(|e| {
            IceError::Decode(format!("time coordinate {:?}: {}", raw, e))
        })?),
        None => None,
    };

    Ok(GriddedRaw {
        data,
        encoding,
        time_value,
        time_units: dataset.metadata_item("time#units", ""),
    })
}

// Attributes GDAL did not surface are filled from the dataset's own transform and
// spatial reference.
fn projection_from_dataset(dataset: &Dataset) -> Result<ProjectionMeta> {
    let (cols, rows) = dataset.raster_size();
    let transform = dataset.geo_transform().ok();
    let proj4 = dataset
        .spatial_ref()
        .ok()
        .and_then(|srs| srs.to_proj4().ok());

    let lookup = |name: &str| -> Option<String> {
        if let Some(value) = dataset.metadata_item(&format!("{PROJECTION_VARIABLE}#{name}"), "") {
            return Some(value);
        }
        match name {
            "GeoTransform" => transform.map(|gt| {
                gt.iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(" ")
            }),
            "grid_boundary_left_projected_x" => transform.map(|gt| gt[0].to_string()),
            "grid_boundary_top_projected_y" => transform.map(|gt| gt[3].to_string()),
            "proj4text" => proj4.clone(),
            "standard_parallel" => proj4.as_deref().and_then(|p| proj4_parameter(p, "lat_ts")),
            _ => None,
        }
    };

    ProjectionMeta::from_attributes(lookup, rows, cols)
}

// Singleton time dimensions collapse to one band; anything else cannot be squeezed.
fn read_single_band(dataset: &Dataset) -> Result<Data> {
    let count = dataset.raster_count();
    if count != 1 {
        return Err(IceError::Decode(format!(
            "expected a single time step, found {} bands",
            count
        )));
    }

    let band = dataset.rasterband(1)?;
    let (width, height) = band.size();
    let buffer = band.read_as::<f32>((0, 0), (width, height), (width, height), None)?;

    Ok(Data {
        width: width as u32,
        height: height as u32,
        buffer: buffer.data().to_vec(),
    })
}

/// Parses GDAL's rendering of a two-element attribute, e.g. `{0,100}`.
fn parse_range(raw: &str) -> Option<(f64, f64)> {
    let inner = raw.trim().trim_start_matches('{').trim_end_matches('}');
    let mut parts = inner.split(',').map(|p| p.trim().parse::<f64>());
    match (parts.next(), parts.next(), parts.next()) {
        (Some(Ok(lo)), Some(Ok(hi)), None) => Some((lo, hi)),
        _ => None,
    }
}

fn proj4_parameter(proj4: &str, key: &str) -> Option<String> {
    let prefix = format!("+{key}=");
    proj4
        .split_whitespace()
        .find_map(|token| token.strip_prefix(prefix.as_str()))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Hemisphere;
    use gdal::DriverManager;
    use gdal::raster::Buffer;
    use gdal::spatial_ref::SpatialRef;

    // In-memory stand-in for one time step of the concentration variable, carrying the
    // attributes GDAL's netCDF driver surfaces as metadata.
    fn concentration_dataset() -> Dataset {
        let driver = DriverManager::get_driver_by_name("MEM").unwrap();
        let mut dataset = driver.create_with_band_type::<f32, _>("", 3, 2, 1).unwrap();
        dataset
            .set_geo_transform(&[-3_950_000.0, 25_000.0, 0.0, 4_350_000.0, 0.0, -25_000.0])
            .unwrap();
        let srs = SpatialRef::from_proj4(&ProjectionMeta::reference(Hemisphere::South).proj4)
            .unwrap();
        dataset.set_spatial_ref(&srs).unwrap();
        dataset
            .set_metadata_item("seaice_conc_cdr#valid_range", "{0,100}", "")
            .unwrap();
        dataset
            .set_metadata_item("time#units", "days since 1601-01-01 00:00:00", "")
            .unwrap();
        dataset
            .set_metadata_item("projection#standard_parallel", "-70", "")
            .unwrap();

        {
            let mut band = dataset.rasterband(1).unwrap();
            let mut buffer = Buffer::new((3, 2), vec![0.0, 15.0, 80.0, 100.0, 251.0, 255.0]);
            band.write((0, 0), (3, 2), &mut buffer).unwrap();
            band.set_no_data_value(Some(255.0)).unwrap();
            band.set_scale(0.01).unwrap();
            band.set_offset(0.0).unwrap();
            band.set_metadata_item("NETCDF_DIM_time", "152263", "").unwrap();
        }

        dataset
    }

    #[test]
    fn test_parse_range() {
        assert_eq!(parse_range("{0,100}"), Some((0.0, 100.0)));
        assert_eq!(parse_range(" { 0.0 , 1.0 } "), Some((0.0, 1.0)));
        assert_eq!(parse_range("{0}"), None);
        assert_eq!(parse_range("{0,1,2}"), None);
    }

    #[test]
    fn test_proj4_parameter() {
        let proj4 = "+proj=stere +lat_0=-90 +lat_ts=-70 +lon_0=0 +units=m";
        assert_eq!(proj4_parameter(proj4, "lat_ts").as_deref(), Some("-70"));
        assert_eq!(proj4_parameter(proj4, "lat_1"), None);
    }

    #[test]
    fn test_gdal_path_names_variable() {
        let reader = NcReader::new("/data/south/inputs/cdr/file.nc");
        assert_eq!(
            reader.gdal_path(),
            "NETCDF:\"/data/south/inputs/cdr/file.nc\":seaice_conc_cdr"
        );
    }

    #[test]
    fn test_gridded_attributes_read_from_dataset() {
        let dataset = concentration_dataset();
        let raw = gridded_from_dataset(&dataset, CONCENTRATION_VARIABLE).unwrap();

        assert_eq!((raw.data.width, raw.data.height), (3, 2));
        assert_eq!(raw.data.buffer[1], 15.0);
        assert_eq!(raw.encoding.fill_value, Some(255.0));
        assert_eq!(raw.encoding.valid_range, Some((0.0, 100.0)));
        assert_eq!(raw.encoding.scale, Some(0.01));
        assert_eq!(raw.time_value, Some(152_263.0));
        assert_eq!(
            raw.time_units.as_deref(),
            Some("days since 1601-01-01 00:00:00")
        );

        let grid = crate::rasterize::clean_concentration(raw.data, &raw.encoding).unwrap();
        assert!((grid[[0, 1]] - 0.15).abs() < 1e-6);
        assert!((grid[[1, 0]] - 1.0).abs() < 1e-6);
        assert_eq!(grid[[1, 1]], 0.0);
        assert_eq!(grid[[1, 2]], 0.0);
    }

    #[test]
    fn test_projection_falls_back_to_dataset_geometry() {
        let dataset = concentration_dataset();
        let meta = projection_from_dataset(&dataset).unwrap();

        assert_eq!(meta.shape(), (2, 3));
        assert_eq!(meta.origin_x, -3_950_000.0);
        assert_eq!(meta.origin_y, 4_350_000.0);
        assert_eq!((meta.pixel_x, meta.pixel_y), (25_000.0, 25_000.0));
        assert_eq!(meta.standard_parallel, -70.0);
        assert!(meta.proj4.contains("+proj=stere"));
    }

    #[test]
    fn test_projection_attributes_take_precedence() {
        let mut dataset = concentration_dataset();
        dataset
            .set_metadata_item("projection#grid_boundary_left_projected_x", "-3937500", "")
            .unwrap();
        dataset
            .set_metadata_item("projection#proj4text", "+proj=stere +lat_0=-90", "")
            .unwrap();

        let meta = projection_from_dataset(&dataset).unwrap();
        assert_eq!(meta.origin_x, -3_937_500.0);
        assert_eq!(meta.proj4, "+proj=stere +lat_0=-90");
    }

    #[test]
    fn test_multiple_time_steps_rejected() {
        let driver = DriverManager::get_driver_by_name("MEM").unwrap();
        let dataset = driver.create_with_band_type::<f32, _>("", 2, 2, 3).unwrap();
        assert!(matches!(
            read_single_band(&dataset),
            Err(IceError::Decode(msg)) if msg.contains("3 bands")
        ));
    }

    #[test]
    fn test_missing_file_is_source_missing() {
        let reader = NcReader::new("/nonexistent/seaice.nc");
        assert!(matches!(
            reader.read_gridded(),
            Err(IceError::SourceMissing { .. })
        ));
        assert!(matches!(
            reader.read_projection(),
            Err(IceError::SourceMissing { .. })
        ));
    }
}
