//! Property-based invariant tests for the software oracle.
//!
//! Verifies:
//! 1. Grid: index count always equals `(w-1)*(h-1)*6`, indices stay in range
//! 2. Values: generated inputs stay inside format and precision ranges
//! 3. Reference: interpolated values never leave the hull of the cell corners
//! 4. Reference: rendering the same input twice gives the same image
//! 5. Comparator: lower precision never tightens a float threshold
//! 6. Comparator: identical images pass for every format and channel count
//! 7. Comparator: unwritten channels accept arbitrary values
//! 8. Comparator: a written channel over the threshold fails exactly that pixel
//! 9. Pipeline: a reference stored through the attachment and read formats
//!    passes its own threshold

use fragcheck::codec::Pixel;
use fragcheck::compare::{compare_images, compute_threshold, ComparisonThreshold};
use fragcheck::reference::{interpolate_cell, render_reference};
use fragcheck::values::{generate_inputs, InputValues};
use fragcheck::{
    AttachmentSpec, ChannelClass, FragmentOutputDecl, FragmentOutputSpec, OutputType, PixelBuffer,
    PixelFormat, Precision, ScalarKind, VertexGrid,
};
use proptest::prelude::*;

// ── Strategy helpers ──────────────────────────────────────────────────

fn arb_format() -> impl Strategy<Value = PixelFormat> {
    (0..PixelFormat::ALL.len()).prop_map(|index| PixelFormat::ALL[index])
}

fn arb_float_format() -> impl Strategy<Value = PixelFormat> {
    arb_format().prop_filter("floating point", |format| {
        format.channel_class() == ChannelClass::FloatingPoint
    })
}

fn arb_precision() -> impl Strategy<Value = Precision> {
    prop_oneof![
        Just(Precision::Lowp),
        Just(Precision::Mediump),
        Just(Precision::Highp),
    ]
}

fn arb_corner() -> impl Strategy<Value = [f32; 4]> {
    prop::array::uniform4(-1.0e4f32..1.0e4)
}

/// Single-output spec writing `components` channels to `format`.
fn single_output(
    format: PixelFormat,
    precision: Precision,
    components: usize,
    size: u32,
) -> FragmentOutputSpec {
    let kind = match format.channel_class() {
        ChannelClass::SignedInteger => ScalarKind::Int,
        ChannelClass::UnsignedInteger => ScalarKind::Uint,
        _ => ScalarKind::Float,
    };
    FragmentOutputSpec::new(
        vec![Some(AttachmentSpec::new(format, size, size))],
        vec![FragmentOutputDecl::new(
            OutputType::from_parts(kind, components),
            precision,
            0,
        )],
    )
}

fn pixel_with(format: PixelFormat, values: [u32; 4]) -> Pixel {
    match format.channel_class() {
        ChannelClass::SignedInteger => Pixel::Int(values.map(|value| value as i32)),
        ChannelClass::UnsignedInteger => Pixel::Uint(values),
        _ => Pixel::Float(values.map(|value| (value % 1000) as f32 / 1000.0)),
    }
}

// ── Grid ──────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn grid_index_count_matches_cells(width in 1u32..4096, height in 1u32..4096) {
        let grid = VertexGrid::for_size(width, height);
        prop_assert_eq!(
            grid.indices().len(),
            ((grid.width() - 1) * (grid.height() - 1) * 6) as usize
        );
        let vertex_count = grid.vertex_count();
        prop_assert!(grid.indices().iter().all(|index| (*index as usize) < vertex_count));
    }
}

// ── Values ────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn generated_values_fit_the_attachment(
        format in arb_format(),
        precision in arb_precision(),
        components in 1usize..=4,
        size in 8u32..80,
    ) {
        let spec = single_output(format, precision, components, size);
        let grid = VertexGrid::for_size(size, size);
        let inputs = generate_inputs(&grid, &spec).unwrap();
        prop_assert_eq!(inputs.len(), 1);
        let input = &inputs[0];
        prop_assert_eq!(input.values.len(), grid.vertex_count() * components);

        let (format_min, format_max) = format.value_range();
        match &input.values {
            InputValues::Float(values) => {
                for (index, value) in values.iter().enumerate() {
                    let channel = index % components;
                    prop_assert!(value.is_finite());
                    prop_assert!(*value >= format_min[channel] && *value <= format_max[channel],
                        "{} channel {} value {} outside [{}, {}]",
                        format, channel, value, format_min[channel], format_max[channel]);
                }
            }
            InputValues::Int(values) => {
                for (index, value) in values.iter().enumerate() {
                    let channel = index % components;
                    prop_assert!(*value as f32 >= format_min[channel]);
                    prop_assert!(*value as f32 <= format_max[channel]);
                }
            }
            InputValues::Uint(values) => {
                for (index, value) in values.iter().enumerate() {
                    let channel = index % components;
                    prop_assert!(*value as f32 <= format_max[channel]);
                }
            }
        }
    }
}

// ── Reference ─────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn interpolation_stays_within_corner_hull(
        v00 in arb_corner(),
        v10 in arb_corner(),
        v01 in arb_corner(),
        v11 in arb_corner(),
        xf in 0.0f32..=1.0,
        yf in 0.0f32..=1.0,
    ) {
        let value = interpolate_cell(v00, v10, v01, v11, xf, yf);
        for c in 0..4 {
            let corners = [v00[c], v10[c], v01[c], v11[c]];
            let min = corners.iter().cloned().fold(f32::INFINITY, f32::min);
            let max = corners.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
            let slack = 1e-3 * (1.0 + max.abs().max(min.abs()));
            prop_assert!(value[c] >= min - slack && value[c] <= max + slack);
        }
    }

    #[test]
    fn reference_is_deterministic(
        format in arb_format(),
        precision in arb_precision(),
        components in 1usize..=4,
        size in 8u32..48,
    ) {
        let spec = single_output(format, precision, components, size);
        let grid = VertexGrid::for_size(size, size);
        let inputs = generate_inputs(&grid, &spec).unwrap();

        let mut first = PixelBuffer::new(format.reference_format(), size, size);
        let mut second = PixelBuffer::new(format.reference_format(), size, size);
        render_reference(&mut first, &grid, &inputs[0], format.is_srgb());
        render_reference(&mut second, &grid, &inputs[0], format.is_srgb());
        prop_assert_eq!(first, second);
    }
}

// ── Comparator ────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn lower_precision_never_tightens_threshold(
        format in arb_float_format(),
        written in 0usize..=4,
    ) {
        let ulps = |precision| match compute_threshold(format, precision, written).unwrap() {
            ComparisonThreshold::FloatUlp(ulps) => ulps,
            other => panic!("unexpected {other:?}"),
        };
        let lowp = ulps(Precision::Lowp);
        let mediump = ulps(Precision::Mediump);
        let highp = ulps(Precision::Highp);
        for c in 0..4 {
            prop_assert!(lowp[c] >= mediump[c]);
            prop_assert!(mediump[c] >= highp[c]);
        }
    }

    #[test]
    fn identical_images_always_pass(
        format in arb_format(),
        precision in arb_precision(),
        written in 0usize..=4,
        values in prop::collection::vec(prop::array::uniform4(any::<u32>()), 16),
    ) {
        let mut image = PixelBuffer::new(format.read_format(), 4, 4);
        for (index, value) in values.iter().enumerate() {
            image.set(index as u32 % 4, index as u32 / 4, pixel_with(format, *value));
        }
        let threshold = compute_threshold(format, precision, written).unwrap();
        let result = compare_images("identical", &image, &image, threshold).unwrap();
        prop_assert!(result.is_ok());
    }

    #[test]
    fn unwritten_channels_accept_anything(
        format in arb_format(),
        written in 0usize..4,
        noise in prop::array::uniform4(any::<u32>()),
    ) {
        let reference = PixelBuffer::new(format.read_format(), 2, 2);
        let mut result = reference.clone();

        let perturbed = match (reference.get(1, 1), pixel_with(format, noise)) {
            (Pixel::Float(mut base), Pixel::Float(noise)) => {
                base[written..].copy_from_slice(&noise[written..]);
                Pixel::Float(base)
            }
            (Pixel::Int(mut base), Pixel::Int(noise)) => {
                base[written..].copy_from_slice(&noise[written..]);
                Pixel::Int(base)
            }
            (Pixel::Uint(mut base), Pixel::Uint(noise)) => {
                base[written..].copy_from_slice(&noise[written..]);
                Pixel::Uint(base)
            }
            (base, _) => base,
        };
        result.set(1, 1, perturbed);

        let threshold = compute_threshold(format, Precision::Highp, written).unwrap();
        prop_assert!(compare_images("unwritten", &reference, &result, threshold).unwrap().is_ok());
    }
}

// ── Mismatch detection and readback pipeline ──────────────────────────

/// A value past every threshold of `format`'s class, starting from zero.
fn over_threshold(format: PixelFormat) -> Pixel {
    match format.channel_class() {
        ChannelClass::SignedInteger => Pixel::Int([1; 4]),
        ChannelClass::UnsignedInteger => Pixel::Uint([1; 4]),
        _ => Pixel::Float([1.0; 4]),
    }
}

proptest! {
    #[test]
    fn written_channel_over_threshold_is_detected(
        format in arb_format(),
        precision in arb_precision(),
        written in 1usize..=4,
        channel in 0usize..4,
        x in 0u32..4,
        y in 0u32..4,
    ) {
        let written = written.min(format.channel_count());
        let channel = channel % written;

        let reference = PixelBuffer::new(format.read_format(), 4, 4);
        let mut result = reference.clone();
        let perturbed = match (reference.get(x, y), over_threshold(format)) {
            (Pixel::Float(mut base), Pixel::Float(over)) => {
                base[channel] = over[channel];
                Pixel::Float(base)
            }
            (Pixel::Int(mut base), Pixel::Int(over)) => {
                base[channel] = over[channel];
                Pixel::Int(base)
            }
            (Pixel::Uint(mut base), Pixel::Uint(over)) => {
                base[channel] = over[channel];
                Pixel::Uint(base)
            }
            (base, _) => base,
        };
        result.set(x, y, perturbed);

        let threshold = compute_threshold(format, precision, written).unwrap();
        let comparison = compare_images("over", &reference, &result, threshold).unwrap();
        prop_assert_eq!(comparison.mismatched_pixels, 1);
        prop_assert_eq!(comparison.first_mismatch, Some((x, y)));
        prop_assert!(!comparison.is_ok());
    }

    #[test]
    fn ideal_readback_passes_its_threshold(
        format in arb_format(),
        precision in arb_precision(),
        components in 1usize..=4,
        size in 8u32..48,
    ) {
        let spec = single_output(format, precision, components, size);
        let grid = VertexGrid::for_size(size, size);
        let inputs = generate_inputs(&grid, &spec).unwrap();

        let mut reference = PixelBuffer::new(format.reference_format(), size, size);
        render_reference(&mut reference, &grid, &inputs[0], format.is_srgb());

        // Stored in the attachment, then transferred in the read format.
        let rendered = reference.convert(format).convert(format.read_format());

        let written = components.min(format.channel_count());
        let threshold = compute_threshold(format, precision, written).unwrap();
        let comparison = compare_images("ideal", &reference, &rendered, threshold).unwrap();
        prop_assert!(
            comparison.is_ok(),
            "{} {:?} x{}: {} mismatches, first {:?}, max {:?}",
            format, precision, components,
            comparison.mismatched_pixels, comparison.first_mismatch, comparison.max_difference
        );
    }
}
