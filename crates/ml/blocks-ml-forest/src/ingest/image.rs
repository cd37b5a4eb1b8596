//! The greyscale image buffer ingestion hands to [`crate::image::ImageOracleTable`].

use ndarray::Array2;

use crate::error::{Error, Result};

/// A thin owned greyscale image buffer, backed by an `ndarray::Array2<u8>`
/// in (row, col) order. `stride` may exceed `width` to describe row-padded
/// source buffers; padding is dropped when building the array so the rest
/// of the crate never has to think about it again.
#[derive(Clone, Debug)]
pub struct GreyImage {
    pixels: Array2<u8>,
}

impl GreyImage {
    pub fn new(width: usize, height: usize, stride: usize, bytes: Vec<u8>) -> Result<Self> {
        if stride < width {
            return Err(Error::MalformedInput(format!(
                "stride {stride} shorter than width {width}"
            )));
        }
        if bytes.len() < stride * height {
            return Err(Error::MalformedInput(format!(
                "buffer has {} bytes, need at least {}",
                bytes.len(),
                stride * height
            )));
        }

        let packed: Vec<u8> = if stride == width {
            bytes
        } else {
            (0..height)
                .flat_map(|row| bytes[row * stride..row * stride + width].iter().copied())
                .collect()
        };

        let pixels = Array2::from_shape_vec((height, width), packed)
            .map_err(|e| Error::MalformedInput(format!("image buffer shape mismatch: {e}")))?;

        Ok(Self { pixels })
    }

    /// Build from a tightly packed `width * height` buffer (stride == width).
    pub fn from_packed(width: usize, height: usize, bytes: Vec<u8>) -> Result<Self> {
        Self::new(width, height, width, bytes)
    }

    pub fn width(&self) -> usize {
        self.pixels.ncols()
    }

    pub fn height(&self) -> usize {
        self.pixels.nrows()
    }

    pub fn pixel(&self, x: usize, y: usize) -> f64 {
        self.pixels[[y, x]] as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_packed_reads_pixels_row_major() {
        let img = GreyImage::from_packed(2, 2, vec![10, 20, 30, 40]).unwrap();
        assert_eq!(img.pixel(0, 0), 10.0);
        assert_eq!(img.pixel(1, 0), 20.0);
        assert_eq!(img.pixel(0, 1), 30.0);
        assert_eq!(img.pixel(1, 1), 40.0);
    }

    #[test]
    fn strided_rows_drop_the_padding() {
        // width=2, stride=3: one padding byte per row.
        let img = GreyImage::new(2, 2, 3, vec![10, 20, 0, 30, 40, 0]).unwrap();
        assert_eq!(img.pixel(0, 0), 10.0);
        assert_eq!(img.pixel(1, 0), 20.0);
        assert_eq!(img.pixel(0, 1), 30.0);
        assert_eq!(img.pixel(1, 1), 40.0);
    }

    #[test]
    fn rejects_undersized_buffers() {
        assert!(GreyImage::from_packed(2, 2, vec![1, 2, 3]).is_err());
    }

    #[test]
    fn rejects_stride_shorter_than_width() {
        assert!(GreyImage::new(4, 1, 2, vec![0, 0]).is_err());
    }
}
