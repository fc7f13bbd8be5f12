use crate::codec::Pixel;
use crate::error::{Error, Result};
use crate::grid::VertexGrid;
use crate::output::{FragmentOutputSpec, OutputType, Precision, ScalarKind};

/// Component permutations applied round-robin across generated inputs.
pub const SWIZZLES: [[usize; 4]; 8] = [
    [0, 1, 2, 3],
    [1, 2, 3, 0],
    [2, 3, 0, 1],
    [3, 0, 1, 2],
    [3, 2, 1, 0],
    [2, 1, 0, 3],
    [1, 0, 3, 2],
    [0, 3, 2, 1],
];

pub fn swizzle<T: Copy>(values: [T; 4], input_index: usize) -> [T; 4] {
    let swizzle = SWIZZLES[input_index % SWIZZLES.len()];
    [
        values[swizzle[0]],
        values[swizzle[1]],
        values[swizzle[2]],
        values[swizzle[3]],
    ]
}

pub fn float_range(precision: Precision) -> (f32, f32) {
    match precision {
        Precision::Lowp => (-2.0, 2.0),
        Precision::Mediump => (-16000.0, 16000.0),
        Precision::Highp => (-1e35, 1e35),
    }
}

pub fn int_range(precision: Precision) -> (i32, i32) {
    match precision {
        Precision::Lowp => (i8::MIN as i32, i8::MAX as i32),
        Precision::Mediump => (i16::MIN as i32, i16::MAX as i32),
        Precision::Highp => (i32::MIN, i32::MAX),
    }
}

pub fn uint_range(precision: Precision) -> (u32, u32) {
    match precision {
        Precision::Lowp => (0, u8::MAX as u32),
        Precision::Mediump => (0, u16::MAX as u32),
        Precision::Highp => (0, u32::MAX),
    }
}

/// Signed range of a channel with `bits` bits; `(0, 0)` for an absent channel.
pub fn int_format_range(bits: u32) -> (i64, i64) {
    if bits == 0 {
        return (0, 0);
    }
    (-(1i64 << (bits - 1)), (1i64 << (bits - 1)) - 1)
}

/// Unsigned range of a channel with `bits` bits; `(0, 0)` for an absent channel.
pub fn uint_format_range(bits: u32) -> (u64, u64) {
    if bits == 0 {
        return (0, 0);
    }
    (0, (1u64 << bits) - 1)
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputValues {
    Float(Vec<f32>),
    Int(Vec<i32>),
    Uint(Vec<u32>),
}

impl InputValues {
    pub fn len(&self) -> usize {
        match self {
            InputValues::Float(values) => values.len(),
            InputValues::Int(values) => values.len(),
            InputValues::Uint(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw little-endian words, as uploaded into the vertex buffer.
    pub fn word(&self, index: usize) -> u32 {
        match self {
            InputValues::Float(values) => values[index].to_bits(),
            InputValues::Int(values) => values[index] as u32,
            InputValues::Uint(values) => values[index],
        }
    }
}

/// Vertex input feeding one attachment location.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedInput {
    /// Attachment location written by this input.
    pub location: u32,
    pub ty: OutputType,
    pub precision: Precision,
    pub values: InputValues,
}

impl GeneratedInput {
    pub fn component_count(&self) -> usize {
        self.ty.component_count()
    }

    /// Value of vertex `vertex`, widened to four components. Missing
    /// components read as `(0, 0, 0, 1)`.
    pub fn vertex_value(&self, vertex: usize) -> Pixel {
        let components = self.component_count();
        let base = vertex * components;
        match &self.values {
            InputValues::Float(values) => {
                let mut out = [0.0, 0.0, 0.0, 1.0];
                out[..components].copy_from_slice(&values[base..base + components]);
                Pixel::Float(out)
            }
            InputValues::Int(values) => {
                let mut out = [0, 0, 0, 1];
                out[..components].copy_from_slice(&values[base..base + components]);
                Pixel::Int(out)
            }
            InputValues::Uint(values) => {
                let mut out = [0, 0, 0, 1];
                out[..components].copy_from_slice(&values[base..base + components]);
                Pixel::Uint(out)
            }
        }
    }
}

/// Generates one input per output location, in declaration order. Each input
/// sweeps linearly across the grid between the bounds the output precision
/// and the attachment format share.
pub fn generate_inputs(grid: &VertexGrid, spec: &FragmentOutputSpec) -> Result<Vec<GeneratedInput>> {
    let mut inputs = Vec::new();

    for output in &spec.outputs {
        for location in output.locations() {
            let attachment = spec.attachment(location).ok_or_else(|| {
                Error::InvalidOutput(format!("no attachment at location {location}"))
            })?;
            let input_index = inputs.len();
            let format = attachment.format;

            let values = match output.ty.scalar_kind() {
                ScalarKind::Float => {
                    let (precision_min, precision_max) = float_range(output.precision);
                    let (format_min, format_max) = format.value_range();
                    let min = format_min.map(|value| value.max(precision_min));
                    let max = format_max.map(|value| value.min(precision_max));
                    InputValues::Float(generate_float_values(
                        grid,
                        output.ty.component_count(),
                        input_index,
                        min,
                        max,
                    ))
                }
                ScalarKind::Int => {
                    let (precision_min, precision_max) = int_range(output.precision);
                    let bits = format.bit_depth();
                    let mut min = [0; 4];
                    let mut max = [0; 4];
                    for channel in 0..4 {
                        let (format_min, format_max) = int_format_range(bits[channel]);
                        min[channel] = format_min.max(precision_min as i64) as i32;
                        max[channel] = format_max.min(precision_max as i64) as i32;
                    }
                    InputValues::Int(generate_int_values(
                        grid,
                        output.ty.component_count(),
                        input_index,
                        min,
                        max,
                    ))
                }
                ScalarKind::Uint => {
                    let (precision_min, precision_max) = uint_range(output.precision);
                    let bits = format.bit_depth();
                    let mut min = [0; 4];
                    let mut max = [0; 4];
                    for channel in 0..4 {
                        let (format_min, format_max) = uint_format_range(bits[channel]);
                        min[channel] = format_min.max(precision_min as u64) as u32;
                        max[channel] = format_max.min(precision_max as u64) as u32;
                    }
                    debug_assert!(min.iter().all(|value| *value == 0));
                    InputValues::Uint(generate_uint_values(
                        grid,
                        output.ty.component_count(),
                        input_index,
                        min,
                        max,
                    ))
                }
            };

            inputs.push(GeneratedInput {
                location,
                ty: output.ty,
                precision: output.precision,
                values,
            });
        }
    }

    Ok(inputs)
}

pub fn generate_float_values(
    grid: &VertexGrid,
    components: usize,
    input_index: usize,
    min: [f32; 4],
    max: [f32; 4],
) -> Vec<f32> {
    let (width, height) = (grid.width(), grid.height());
    let mut values = Vec::with_capacity(grid.vertex_count() * components);

    for y in 0..height {
        for x in 0..width {
            let xf = x as f32 / (width - 1) as f32;
            let yf = y as f32 / (height - 1) as f32;
            let factor = swizzle([xf, yf, 1.0 - xf, 1.0 - yf], input_index);
            for c in 0..components {
                let value = min[c] + (max[c] - min[c]) * factor[c];
                values.push(value.clamp(min[c], max[c]));
            }
        }
    }

    values
}

pub fn generate_int_values(
    grid: &VertexGrid,
    components: usize,
    input_index: usize,
    min: [i32; 4],
    max: [i32; 4],
) -> Vec<i32> {
    let (width, height) = (grid.width() as i64, grid.height() as i64);
    let divisor = swizzle([width - 1, height - 1, width - 1, height - 1], input_index);
    let mut step = [0i64; 4];
    for c in 0..4 {
        step[c] = (max[c] as i64 - min[c] as i64) / divisor[c];
    }

    let mut values = Vec::with_capacity(grid.vertex_count() * components);
    for y in 0..height {
        for x in 0..width {
            let steps = swizzle([x, y, width - 1 - x, height - 1 - y], input_index);
            for c in 0..components {
                values.push((min[c] as i64 + step[c] * steps[c]) as i32);
            }
        }
    }

    values
}

pub fn generate_uint_values(
    grid: &VertexGrid,
    components: usize,
    input_index: usize,
    min: [u32; 4],
    max: [u32; 4],
) -> Vec<u32> {
    let (width, height) = (grid.width() as u64, grid.height() as u64);
    let divisor = swizzle([width - 1, height - 1, width - 1, height - 1], input_index);
    let mut step = [0u64; 4];
    for c in 0..4 {
        step[c] = (max[c] as u64 - min[c] as u64) / divisor[c];
    }

    let mut values = Vec::with_capacity(grid.vertex_count() * components);
    for y in 0..height {
        for x in 0..width {
            let steps = swizzle([x, y, width - 1 - x, height - 1 - y], input_index);
            for c in 0..components {
                values.push((min[c] as u64 + step[c] * steps[c]) as u32);
            }
        }
    }

    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::PixelFormat;
    use crate::output::{AttachmentSpec, FragmentOutputDecl};

    fn single_output_spec(format: PixelFormat, ty: OutputType, precision: Precision) -> FragmentOutputSpec {
        FragmentOutputSpec::new(
            vec![Some(AttachmentSpec::new(format, 64, 64))],
            vec![FragmentOutputDecl::new(ty, precision, 0)],
        )
    }

    #[test]
    fn mediump_float_into_rgba8_stays_within_unorm_range() {
        let grid = VertexGrid::for_size(64, 64);
        let spec = single_output_spec(PixelFormat::Rgba8Unorm, OutputType::Vec4, Precision::Mediump);
        let inputs = generate_inputs(&grid, &spec).unwrap();
        assert_eq!(inputs.len(), 1);

        let InputValues::Float(values) = &inputs[0].values else {
            panic!("expected float inputs");
        };
        assert_eq!(values.len(), 81 * 4);
        assert!(values.iter().all(|value| (0.0..=1.0).contains(value)));
        assert!(values.contains(&0.0));
        assert!(values.contains(&1.0));
    }

    #[test]
    fn int_values_respect_format_bit_depth() {
        let grid = VertexGrid::for_size(64, 64);
        let spec = single_output_spec(PixelFormat::Rgba8Sint, OutputType::IVec4, Precision::Highp);
        let inputs = generate_inputs(&grid, &spec).unwrap();
        let InputValues::Int(values) = &inputs[0].values else {
            panic!("expected int inputs");
        };
        assert!(values.iter().all(|value| (-128..=127).contains(value)));
        assert_eq!(values.iter().min(), Some(&-128));
    }

    #[test]
    fn uint_values_start_at_zero_and_fit_format() {
        let grid = VertexGrid::for_size(64, 64);
        let spec = single_output_spec(PixelFormat::Rgb10a2Uint, OutputType::UVec4, Precision::Highp);
        let inputs = generate_inputs(&grid, &spec).unwrap();
        let InputValues::Uint(values) = &inputs[0].values else {
            panic!("expected uint inputs");
        };
        assert_eq!(values.iter().min(), Some(&0));
        for vertex in values.chunks_exact(4) {
            assert!(vertex[..3].iter().all(|value| *value <= 1023));
            assert!(vertex[3] <= 3);
        }
    }

    #[test]
    fn absent_channels_are_constant_zero() {
        let grid = VertexGrid::for_size(16, 16);
        let spec = single_output_spec(PixelFormat::R32Sint, OutputType::IVec2, Precision::Highp);
        let inputs = generate_inputs(&grid, &spec).unwrap();
        for vertex in 0..grid.vertex_count() {
            assert_eq!(inputs[0].vertex_value(vertex).as_int()[1], 0);
        }
    }

    #[test]
    fn inputs_sharing_a_format_are_decorrelated() {
        let grid = VertexGrid::for_size(32, 32);
        let spec = FragmentOutputSpec::new(
            vec![Some(AttachmentSpec::new(PixelFormat::Rgba32Float, 32, 32)); 2],
            vec![FragmentOutputDecl::array(OutputType::Vec4, Precision::Highp, 0, 2)],
        );
        let inputs = generate_inputs(&grid, &spec).unwrap();
        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs[1].location, 1);
        assert_ne!(inputs[0].values, inputs[1].values);
    }

    #[test]
    fn swizzles_are_permutations() {
        for swizzle in SWIZZLES {
            let mut sorted = swizzle;
            sorted.sort_unstable();
            assert_eq!(sorted, [0, 1, 2, 3]);
        }
    }

    #[test]
    fn format_ranges() {
        assert_eq!(int_format_range(0), (0, 0));
        assert_eq!(int_format_range(8), (-128, 127));
        assert_eq!(uint_format_range(2), (0, 3));
        assert_eq!(uint_format_range(32), (0, u32::MAX as u64));
    }
}
