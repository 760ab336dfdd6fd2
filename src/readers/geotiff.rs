use super::{Data, DataReader};
use crate::error::{IceError, Result};
use crate::grid::Grid;
use std::fs::File;
use std::io::{BufReader, Seek, Write};
use std::path::PathBuf;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::{TiffEncoder, colortype};

/// Single-band float TIFF, the on-disk form of a cached grid.
pub struct GeoTiffReader {
    pub file_name: PathBuf,
}

impl DataReader for GeoTiffReader {
    fn read_data(&self) -> Result<Data> {
        let file = File::open(&self.file_name)?;

        let reader = BufReader::new(file);

        let mut decoder = Decoder::new(reader)
            .map_err(|e| IceError::Decode(format!("Failed to decode TIFF: {}", e)))?;

        let (width, height) = decoder
            .dimensions()
            .map_err(|e| IceError::Decode(format!("Failed to get dimensions: {}", e)))?;

        let image_data: Vec<f32> = match decoder
            .read_image()
            .map_err(|e| IceError::Decode(format!("Failed to read image: {}", e)))?
        {
            DecodingResult::U8(data) => data.iter().map(|&x| x as f32).collect(),
            DecodingResult::U16(data) => data.iter().map(|&x| x as f32).collect(),
            DecodingResult::F32(data) => data,
            DecodingResult::F64(data) => data.iter().map(|&x| x as f32).collect(),
            _ => return Err(IceError::Decode("Unsupported pixel format".to_string())),
        };

        if image_data.len() != width as usize * height as usize {
            return Err(IceError::Decode(format!(
                "expected {}x{} pixels, found {}",
                width,
                height,
                image_data.len()
            )));
        }

        Ok(Data {
            width,
            height,
            buffer: image_data,
        })
    }
}

impl GeoTiffReader {
    pub fn read_grid(&self) -> Result<Grid> {
        self.read_data()?.into_array()
    }
}

/// Encodes a grid as a 32-bit float grayscale TIFF.
pub fn write_grid<W: Write + Seek>(writer: W, grid: &Grid) -> Result<()> {
    let (rows, cols) = grid.dim();
    let width = u32::try_from(cols)
        .map_err(|_| IceError::Precondition(format!("{} columns exceed TIFF limits", cols)))?;
    let height = u32::try_from(rows)
        .map_err(|_| IceError::Precondition(format!("{} rows exceed TIFF limits", rows)))?;

    // Standard layout guarantees row-major order for the slice.
    let owned;
    let data = match grid.as_slice() {
        Some(slice) => slice,
        None => {
            owned = grid.iter().copied().collect::<Vec<f32>>();
            &owned
        }
    };

    let mut encoder = TiffEncoder::new(writer)
        .map_err(|e| IceError::Decode(format!("Failed to start TIFF: {}", e)))?;
    encoder
        .write_image::<colortype::Gray32Float>(width, height, data)
        .map_err(|e| IceError::Decode(format!("Failed to write TIFF: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use tempfile::tempdir;

    #[test]
    fn test_written_grid_reads_back_with_sentinel() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("grid.tif");
        let grid = array![[-1.0_f32, 0.0, 0.18], [0.8, 1.0, -1.0]];

        write_grid(File::create(&path).unwrap(), &grid).unwrap();

        let reader = GeoTiffReader { file_name: path };
        assert_eq!(reader.read_grid().unwrap(), grid);
    }

    #[test]
    fn test_transposed_view_is_written_in_logical_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.tif");
        let grid = array![[1.0_f32, 2.0], [3.0, 4.0], [5.0, 6.0]];
        let transposed = grid.t().to_owned();
        assert!(transposed.as_slice().is_none());

        write_grid(File::create(&path).unwrap(), &transposed).unwrap();

        let reader = GeoTiffReader { file_name: path };
        assert_eq!(reader.read_grid().unwrap(), transposed);
    }

    #[test]
    fn test_garbage_is_decode_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.tif");
        std::fs::write(&path, b"not a tiff at all").unwrap();

        let reader = GeoTiffReader { file_name: path };
        assert!(matches!(reader.read_data(), Err(IceError::Decode(_))));
    }
}
