pub mod geotiff;
pub mod nc;
pub mod shapefile;
pub mod types;
pub mod utils;

pub use geotiff::GeoTiffReader;
pub use nc::{BandEncoding, GriddedRaw, NcReader};
pub use shapefile::{PolygonFeature, ShapefileReader};
pub use types::{Data, DataReader, FileError, FileType};
pub use utils::reader_from_filetype;
