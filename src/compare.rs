use crate::codec::Pixel;
use crate::error::{Error, Result};
use crate::format::{ChannelClass, ChannelEncoding, PixelFormat};
use crate::image::PixelBuffer;
use crate::output::Precision;

/// Per-channel acceptance threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ComparisonThreshold {
    /// Maximum distance between the bit patterns of two floats.
    FloatUlp([u32; 4]),
    /// Maximum absolute difference of normalized values.
    Float([f32; 4]),
    /// Maximum absolute difference of integer values.
    Integer([u32; 4]),
}

impl ComparisonThreshold {
    /// False for channels the threshold accepts any value in.
    pub fn is_written(&self, channel: usize) -> bool {
        match self {
            ComparisonThreshold::FloatUlp(limits) | ComparisonThreshold::Integer(limits) => {
                limits[channel] != u32::MAX
            }
            ComparisonThreshold::Float(limits) => limits[channel] < 2.0,
        }
    }
}

/// ULP threshold inherent to the storage encoding of a float format.
pub fn float_format_ulp_threshold(encoding: ChannelEncoding) -> [u32; 4] {
    match encoding {
        ChannelEncoding::Float16 => [(1 << 13) + 4; 4],
        ChannelEncoding::UfloatR11G11B10 => [(1 << 17) + 4, (1 << 17) + 4, (1 << 18) + 4, 4],
        _ => [4; 4],
    }
}

/// Extra ULPs allowed by the output's declared precision.
pub fn precision_ulp_threshold(precision: Precision) -> u32 {
    match precision {
        Precision::Lowp => 1 << 21,
        Precision::Mediump => 1 << 13,
        Precision::Highp => 0,
    }
}

/// Builds the threshold for an attachment of `format` written by an output of
/// `precision` that writes `written_channels` channels. Channels past
/// `written_channels` hold undefined values and accept anything.
pub fn compute_threshold(
    format: PixelFormat,
    precision: Precision,
    written_channels: usize,
) -> Result<ComparisonThreshold> {
    match format.channel_class() {
        ChannelClass::FloatingPoint => {
            let format_threshold = float_format_ulp_threshold(format.encoding());
            let precision_threshold = precision_ulp_threshold(precision);
            let mut threshold = [u32::MAX; 4];
            for c in 0..written_channels.min(4) {
                threshold[c] = format_threshold[c].max(precision_threshold);
            }
            Ok(ComparisonThreshold::FloatUlp(threshold))
        }
        ChannelClass::UnsignedFixedPoint => {
            // Readback only carries 8 bits per channel.
            let bits = format.bit_depth();
            let mut threshold = [2.0; 4];
            for c in 0..written_channels.min(4) {
                let readback_bits = bits[c].min(8);
                threshold[c] = 1.0 / ((1u32 << readback_bits) - 1) as f32;
            }
            Ok(ComparisonThreshold::Float(threshold))
        }
        ChannelClass::SignedInteger | ChannelClass::UnsignedInteger => {
            let mut threshold = [u32::MAX; 4];
            for value in threshold.iter_mut().take(written_channels.min(4)) {
                *value = 0;
            }
            Ok(ComparisonThreshold::Integer(threshold))
        }
        class => Err(Error::UnsupportedChannelClass(class)),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonResult {
    pub name: String,
    pub mismatched_pixels: usize,
    pub total_pixels: usize,
    /// Coordinates of the first pixel over the threshold, in row-major order.
    pub first_mismatch: Option<(u32, u32)>,
    /// Largest per-channel difference seen, in the threshold's unit.
    pub max_difference: [f64; 4],
    pub threshold: ComparisonThreshold,
}

impl ComparisonResult {
    pub fn is_ok(&self) -> bool {
        self.mismatched_pixels == 0
    }
}

/// Distance between two floats counted in representable values. Values of
/// opposite sign are measured through zero.
pub fn ulp_distance(a: f32, b: f32) -> u32 {
    fn ordered(value: f32) -> i64 {
        let bits = value.to_bits() as i32 as i64;
        if bits < 0 {
            i32::MIN as i64 - bits
        } else {
            bits
        }
    }
    let distance = (ordered(a) - ordered(b)).unsigned_abs();
    distance.min(u32::MAX as u64) as u32
}

/// Compares `result` against `reference`, pixel by pixel.
pub fn compare_images(
    name: &str,
    reference: &PixelBuffer,
    result: &PixelBuffer,
    threshold: ComparisonThreshold,
) -> Result<ComparisonResult> {
    if reference.size() != result.size() {
        return Err(Error::SizeMismatch {
            expected: reference.size(),
            actual: result.size(),
        });
    }

    let mut mismatched_pixels = 0;
    let mut first_mismatch = None;
    let mut max_difference = [0.0f64; 4];

    for (index, (expected, actual)) in reference.pixels().iter().zip(result.pixels()).enumerate() {
        let mut pixel_ok = true;
        for c in 0..4 {
            let (difference, limit) = match threshold {
                ComparisonThreshold::FloatUlp(limits) => (
                    ulp_distance(expected.as_float()[c], actual.as_float()[c]) as f64,
                    limits[c] as f64,
                ),
                ComparisonThreshold::Float(limits) => (
                    (expected.as_float()[c] - actual.as_float()[c]).abs() as f64,
                    limits[c] as f64,
                ),
                ComparisonThreshold::Integer(limits) => (
                    integer_difference(expected, actual, c) as f64,
                    limits[c] as f64,
                ),
            };

            if difference > limit {
                pixel_ok = false;
            }
            if threshold.is_written(c) {
                max_difference[c] = max_difference[c].max(difference);
            }
        }
        if !pixel_ok {
            mismatched_pixels += 1;
            if first_mismatch.is_none() {
                let width = reference.width() as usize;
                first_mismatch = Some(((index % width) as u32, (index / width) as u32));
            }
        }
    }

    Ok(ComparisonResult {
        name: name.to_string(),
        mismatched_pixels,
        total_pixels: reference.pixels().len(),
        first_mismatch,
        max_difference,
        threshold,
    })
}

/// Absolute difference of one integer channel, saturated to `u32`.
fn integer_difference(expected: &Pixel, actual: &Pixel, channel: usize) -> u32 {
    let difference = match (expected, actual) {
        (Pixel::Uint(a), Pixel::Uint(b)) => (a[channel] as i64 - b[channel] as i64).unsigned_abs(),
        _ => (expected.as_int()[channel] as i64 - actual.as_int()[channel] as i64).unsigned_abs(),
    };
    difference.min(u32::MAX as u64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_images_pass_for_every_class() {
        for format in PixelFormat::ALL {
            let mut image = PixelBuffer::new(format.read_format(), 4, 4);
            image.set(1, 2, Pixel::Float([0.5, 0.25, 1.0, 0.0]));
            image.set(3, 3, Pixel::Int([7, -3, 1, 2]));
            let threshold = compute_threshold(format, Precision::Highp, format.channel_count()).unwrap();
            let result = compare_images(format.name(), &image, &image, threshold).unwrap();
            assert!(result.is_ok(), "{format}");
            assert_eq!(result.mismatched_pixels, 0);
        }
    }

    #[test]
    fn precision_never_tightens_float_threshold() {
        for format in [PixelFormat::Rgba32Float, PixelFormat::Rgba16Float, PixelFormat::Rg11b10Float] {
            let thresholds: Vec<_> = [Precision::Lowp, Precision::Mediump, Precision::Highp]
                .iter()
                .map(|precision| match compute_threshold(format, *precision, 3).unwrap() {
                    ComparisonThreshold::FloatUlp(threshold) => threshold,
                    other => panic!("unexpected threshold {other:?}"),
                })
                .collect();
            for c in 0..4 {
                assert!(thresholds[0][c] >= thresholds[1][c]);
                assert!(thresholds[1][c] >= thresholds[2][c]);
            }
        }
    }

    #[test]
    fn unwritten_channels_accept_anything() {
        let reference = PixelBuffer::new(PixelFormat::Rgba32Uint, 2, 2);
        let mut result = reference.clone();
        result.set(0, 0, Pixel::Uint([0, 0, u32::MAX, 12345]));
        let threshold = compute_threshold(PixelFormat::Rgba32Uint, Precision::Highp, 2).unwrap();
        assert!(compare_images("uint", &reference, &result, threshold).unwrap().is_ok());

        let reference = PixelBuffer::new(PixelFormat::Rgba8Unorm, 2, 2);
        let mut result = reference.clone();
        result.set(1, 1, Pixel::Float([0.0, 1.0, 1.0, 1.0]));
        let threshold = compute_threshold(PixelFormat::Rgba8Unorm, Precision::Highp, 1).unwrap();
        assert!(compare_images("fixed", &reference, &result, threshold).unwrap().is_ok());

        let reference = PixelBuffer::new(PixelFormat::Rgba32Float, 2, 2);
        let mut result = reference.clone();
        result.set(1, 0, Pixel::Float([0.0, f32::MAX, -1e30, f32::MIN]));
        let threshold = compute_threshold(PixelFormat::Rgba32Float, Precision::Highp, 1).unwrap();
        assert!(compare_images("float", &reference, &result, threshold).unwrap().is_ok());
    }

    #[test]
    fn written_channel_differences_are_detected() {
        let reference = PixelBuffer::new(PixelFormat::Rgba32Sint, 3, 1);
        let mut result = reference.clone();
        result.set(2, 0, Pixel::Int([0, 1, 0, 0]));
        let threshold = compute_threshold(PixelFormat::Rgba32Sint, Precision::Highp, 4).unwrap();
        let comparison = compare_images("int", &reference, &result, threshold).unwrap();
        assert_eq!(comparison.mismatched_pixels, 1);
        assert_eq!(comparison.first_mismatch, Some((2, 0)));
        assert!(!comparison.is_ok());
    }

    #[test]
    fn fixed_point_threshold_is_capped_at_8_bits() {
        let threshold = compute_threshold(PixelFormat::Rgb10a2Unorm, Precision::Mediump, 4).unwrap();
        assert_eq!(
            threshold,
            ComparisonThreshold::Float([1.0 / 255.0, 1.0 / 255.0, 1.0 / 255.0, 1.0 / 3.0])
        );
    }

    #[test]
    fn mismatched_sizes_are_an_error() {
        let a = PixelBuffer::new(PixelFormat::R32Float, 2, 2);
        let b = PixelBuffer::new(PixelFormat::R32Float, 2, 3);
        let threshold = ComparisonThreshold::FloatUlp([0; 4]);
        assert!(matches!(
            compare_images("size", &a, &b, threshold),
            Err(Error::SizeMismatch { .. })
        ));
    }

    #[test]
    fn ulp_distance_crosses_zero() {
        assert_eq!(ulp_distance(1.0, 1.0), 0);
        assert_eq!(ulp_distance(0.0, -0.0), 0);
        assert_eq!(ulp_distance(f32::from_bits(1), -f32::from_bits(1)), 2);
        assert_eq!(ulp_distance(1.0, f32::from_bits(1.0f32.to_bits() + 3)), 3);
    }
}
