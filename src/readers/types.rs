use ndarray::Array2;

use crate::error::{IceError, Result};

pub trait DataReader {
    fn read_data(&self) -> Result<Data>;
}

#[derive(Debug)]
pub enum FileError {
    UnknownFileType,
}

/// A dense row-major raster as read from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct Data {
    pub width: u32,
    pub height: u32,
    pub buffer: Vec<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    GeoTiff,
    NetCDF,
    ZippedShapefile,
}

impl Data {
    pub fn into_array(self) -> Result<Array2<f32>> {
        let shape = (self.height as usize, self.width as usize);
        Array2::from_shape_vec(shape, self.buffer)
            .map_err(|e| IceError::Decode(format!("buffer does not fit {:?}: {}", shape, e)))
    }
}
