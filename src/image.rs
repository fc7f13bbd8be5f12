use crate::codec::{bytes_per_pixel, decode_pixel, quantize, Pixel};
use crate::error::{Error, Result};
use crate::format::PixelFormat;

/// A 2D image whose texels are kept at the precision of `format`.
///
/// Row 0 is the first row in memory, which is also grid row 0 of the draw.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    format: PixelFormat,
    width: u32,
    height: u32,
    data: Vec<Pixel>,
}

impl PixelBuffer {
    pub fn new(format: PixelFormat, width: u32, height: u32) -> Self {
        Self {
            format,
            width,
            height,
            data: vec![Pixel::zero(format); (width as usize) * (height as usize)],
        }
    }

    /// Decodes tightly packed rows produced by a texture readback.
    pub fn from_bytes(format: PixelFormat, width: u32, height: u32, bytes: &[u8]) -> Result<Self> {
        let texel_size = bytes_per_pixel(format);
        let expected_len = texel_size * (width as usize) * (height as usize);
        if bytes.len() < expected_len {
            return Err(Error::Readback(format!(
                "{format} image of {width}x{height} needs {expected_len} bytes, got {}",
                bytes.len()
            )));
        }

        let data = bytes[..expected_len]
            .chunks_exact(texel_size)
            .map(|texel| decode_pixel(format, texel))
            .collect();

        Ok(Self {
            format,
            width,
            height,
            data,
        })
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.data
    }

    pub fn get(&self, x: u32, y: u32) -> Pixel {
        self.data[self.index(x, y)]
    }

    /// Stores `pixel` rounded through this buffer's format.
    pub fn set(&mut self, x: u32, y: u32, pixel: Pixel) {
        let index = self.index(x, y);
        self.data[index] = quantize(self.format, pixel);
    }

    /// Re-quantizes every texel into `format`, the way a readback with a
    /// different transfer format would.
    pub fn convert(&self, format: PixelFormat) -> PixelBuffer {
        PixelBuffer {
            format,
            width: self.width,
            height: self.height,
            data: self
                .data
                .iter()
                .map(|pixel| quantize(format, *pixel))
                .collect(),
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height);
        (y as usize) * (self.width as usize) + (x as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_quantizes_to_buffer_format() {
        let mut buffer = PixelBuffer::new(PixelFormat::Rgba8Unorm, 2, 2);
        buffer.set(1, 0, Pixel::Float([0.5, 1.5, -1.0, 0.25]));
        assert_eq!(
            buffer.get(1, 0),
            Pixel::Float([128.0 / 255.0, 1.0, 0.0, 64.0 / 255.0])
        );
        assert_eq!(buffer.get(0, 1), Pixel::Float([0.0; 4]));
    }

    #[test]
    fn from_bytes_rejects_short_input() {
        let result = PixelBuffer::from_bytes(PixelFormat::R32Uint, 4, 4, &[0u8; 60]);
        assert!(matches!(result, Err(Error::Readback(_))));
    }

    #[test]
    fn from_bytes_decodes_rows_in_order() {
        let bytes: Vec<u8> = [1u32, 2, 3, 4]
            .iter()
            .flat_map(|value| value.to_le_bytes())
            .collect();
        let buffer = PixelBuffer::from_bytes(PixelFormat::R32Uint, 2, 2, &bytes).unwrap();
        assert_eq!(buffer.get(0, 1), Pixel::Uint([3, 0, 0, 1]));
        assert_eq!(buffer.get(1, 1), Pixel::Uint([4, 0, 0, 1]));
    }

    #[test]
    fn convert_to_8bit_readback_rounds() {
        let mut buffer = PixelBuffer::new(PixelFormat::Rgb10a2Unorm, 1, 1);
        buffer.set(0, 0, Pixel::Float([1.0 / 1023.0, 0.5, 1.0, 1.0]));
        let read = buffer.convert(PixelFormat::Rgba8Unorm);
        assert_eq!(read.get(0, 0), Pixel::Float([0.0, 128.0 / 255.0, 1.0, 1.0]));
    }
}
